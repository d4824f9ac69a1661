//! Scalar and 2-D minimization routines used by the aimpoint solver.
//!
//! The 1-D path is the classic bracket-then-refine pair: golden-ratio
//! expansion with parabolic extrapolation to bracket a minimum, then Brent's
//! method (parabolic interpolation with golden-section fallback) to refine
//! it. The 2-D path is a box-constrained gradient descent with forward
//! finite-difference gradients and backtracking line search.

/// Golden ratio used to expand bracketing intervals.
const GOLD: f64 = 1.618034;
/// Maximum parabolic-extrapolation magnification per bracketing step.
const GLIMIT: f64 = 100.0;
/// Guard against division by zero in the parabolic fit.
const TINY: f64 = 1e-20;

/// Golden section fraction for Brent's method.
const CGOLD: f64 = 0.3819660;
/// Absolute tolerance floor for Brent's method.
const ZEPS: f64 = 1e-10;
const BRENT_MAX_ITERS: usize = 100;

/// A bracketing triplet `ax < bx < cx` (or reversed) with `f(bx)` below both
/// endpoint values.
#[derive(Debug, Clone, Copy)]
pub struct Bracket {
    pub ax: f64,
    pub bx: f64,
    pub cx: f64,
    pub fa: f64,
    pub fb: f64,
    pub fc: f64,
}

/// Expand an initial guess interval `(ax, bx)` downhill until a minimum is
/// bracketed.
pub fn bracket_minimum<F: FnMut(f64) -> f64>(ax: f64, bx: f64, f: &mut F) -> Bracket {
    let (mut ax, mut bx) = (ax, bx);
    let mut fa = f(ax);
    let mut fb = f(bx);
    if fb > fa {
        std::mem::swap(&mut ax, &mut bx);
        std::mem::swap(&mut fa, &mut fb);
    }
    let mut cx = bx + GOLD * (bx - ax);
    let mut fc = f(cx);

    while fb > fc {
        let r = (bx - ax) * (fb - fc);
        let q = (bx - cx) * (fb - fa);
        let denom = 2.0 * (q - r).abs().max(TINY) * (q - r).signum();
        let mut u = bx - ((bx - cx) * q - (bx - ax) * r) / denom;
        let ulim = bx + GLIMIT * (cx - bx);
        let mut fu;

        if (bx - u) * (u - cx) > 0.0 {
            // parabolic candidate between b and c
            fu = f(u);
            if fu < fc {
                ax = bx;
                fa = fb;
                bx = u;
                fb = fu;
                continue;
            } else if fu > fb {
                cx = u;
                fc = fu;
                continue;
            }
            u = cx + GOLD * (cx - bx);
            fu = f(u);
        } else if (cx - u) * (u - ulim) > 0.0 {
            // parabolic candidate beyond c but within the limit
            fu = f(u);
            if fu < fc {
                bx = cx;
                cx = u;
                u = cx + GOLD * (cx - bx);
                fb = fc;
                fc = fu;
                fu = f(u);
            }
        } else if (u - ulim) * (ulim - cx) >= 0.0 {
            u = ulim;
            fu = f(u);
        } else {
            u = cx + GOLD * (cx - bx);
            fu = f(u);
        }

        ax = bx;
        bx = cx;
        cx = u;
        fa = fb;
        fb = fc;
        fc = fu;
    }

    Bracket {
        ax,
        bx,
        cx,
        fa,
        fb,
        fc,
    }
}

/// Result of a Brent refinement.
#[derive(Debug, Clone, Copy)]
pub struct BrentResult {
    pub xmin: f64,
    pub fmin: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Brent's method: refine a bracketed minimum to fractional tolerance `tol`.
pub fn brent_minimize<F: FnMut(f64) -> f64>(
    bracket: &Bracket,
    tol: f64,
    f: &mut F,
) -> BrentResult {
    let mut a = bracket.ax.min(bracket.cx);
    let mut b = bracket.ax.max(bracket.cx);

    let mut x = bracket.bx;
    let mut w = bracket.bx;
    let mut v = bracket.bx;
    let mut fx = bracket.fb;
    let mut fw = fx;
    let mut fv = fx;
    let mut e: f64 = 0.0;
    let mut d: f64 = 0.0;

    for iteration in 0..BRENT_MAX_ITERS {
        let xm = 0.5 * (a + b);
        let tol1 = tol * x.abs() + ZEPS;
        let tol2 = 2.0 * tol1;
        if (x - xm).abs() <= tol2 - 0.5 * (b - a) {
            return BrentResult {
                xmin: x,
                fmin: fx,
                iterations: iteration,
                converged: true,
            };
        }

        if e.abs() > tol1 {
            // try a parabolic fit through x, v, w
            let r = (x - w) * (fx - fv);
            let mut q = (x - v) * (fx - fw);
            let mut p = (x - v) * q - (x - w) * r;
            q = 2.0 * (q - r);
            if q > 0.0 {
                p = -p;
            }
            q = q.abs();
            let e_prev = e;
            e = d;
            if p.abs() >= (0.5 * q * e_prev).abs() || p <= q * (a - x) || p >= q * (b - x) {
                // fit rejected: golden section into the larger segment
                e = if x >= xm { a - x } else { b - x };
                d = CGOLD * e;
            } else {
                d = p / q;
                let u = x + d;
                if u - a < tol2 || b - u < tol2 {
                    d = tol1.copysign(xm - x);
                }
            }
        } else {
            e = if x >= xm { a - x } else { b - x };
            d = CGOLD * e;
        }

        let u = if d.abs() >= tol1 {
            x + d
        } else {
            x + tol1.copysign(d)
        };
        let fu = f(u);

        if fu <= fx {
            if u >= x {
                a = x;
            } else {
                b = x;
            }
            v = w;
            fv = fw;
            w = x;
            fw = fx;
            x = u;
            fx = fu;
        } else {
            if u < x {
                a = u;
            } else {
                b = u;
            }
            if fu <= fw || w == x {
                v = w;
                fv = fw;
                w = u;
                fw = fu;
            } else if fu <= fv || v == x || v == w {
                v = u;
                fv = fu;
            }
        }
    }

    BrentResult {
        xmin: x,
        fmin: fx,
        iterations: BRENT_MAX_ITERS,
        converged: false,
    }
}

/// Box-constrained gradient descent over two variables with forward
/// finite-difference gradients and a backtracking line search.
///
/// Raw finite-difference gradients of a flight-miss objective can be very
/// large near the start; `grad_scale` divides them down before stepping.
#[derive(Debug, Clone)]
pub struct ConstrainedDescent {
    pub lower: [f64; 2],
    pub upper: [f64; 2],
    /// Forward finite-difference step
    pub fd_step: f64,
    /// Divisor applied to raw gradients before stepping
    pub grad_scale: f64,
    /// Relative improvement below which the search stops
    pub ftol: f64,
    pub max_iters: usize,
}

impl ConstrainedDescent {
    fn clamp(&self, x: [f64; 2]) -> [f64; 2] {
        [
            x[0].clamp(self.lower[0], self.upper[0]),
            x[1].clamp(self.lower[1], self.upper[1]),
        ]
    }

    /// Minimize `f` from `start`, returning the best point and value found.
    pub fn minimize<F: FnMut([f64; 2]) -> f64>(
        &self,
        start: [f64; 2],
        f: &mut F,
    ) -> ([f64; 2], f64) {
        let mut x = self.clamp(start);
        let mut fx = f(x);

        for _ in 0..self.max_iters {
            let mut grad = [0.0; 2];
            for i in 0..2 {
                let mut probe = x;
                probe[i] += self.fd_step;
                grad[i] = (f(self.clamp(probe)) - fx) / self.fd_step / self.grad_scale;
            }

            let mut step = 1.0;
            let mut improved = None;
            for _ in 0..24 {
                let candidate =
                    self.clamp([x[0] - step * grad[0], x[1] - step * grad[1]]);
                let fc = f(candidate);
                if fc < fx {
                    improved = Some((candidate, fc));
                    break;
                }
                step *= 0.5;
            }

            let (next, f_next) = match improved {
                Some(found) => found,
                None => break,
            };
            let gain = fx - f_next;
            x = next;
            fx = f_next;
            if gain < self.ftol * fx.abs().max(1.0) {
                break;
            }
        }

        (x, fx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_bracket_contains_parabola_minimum() {
        let mut f = |x: f64| (x - 3.0) * (x - 3.0);
        let bracket = bracket_minimum(0.0, 1.0, &mut f);
        let lo = bracket.ax.min(bracket.cx);
        let hi = bracket.ax.max(bracket.cx);
        assert!(lo < 3.0 && 3.0 < hi, "bracket [{lo}, {hi}]");
        assert!(bracket.fb < bracket.fa);
        assert!(bracket.fb < bracket.fc);
    }

    #[test]
    fn test_brent_refines_parabola() {
        let mut f = |x: f64| (x - 3.0) * (x - 3.0) + 1.0;
        let bracket = bracket_minimum(0.0, 1.0, &mut f);
        let result = brent_minimize(&bracket, 1e-8, &mut f);
        assert!(result.converged);
        assert_relative_eq!(result.xmin, 3.0, epsilon = 1e-5);
        assert_relative_eq!(result.fmin, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_brent_nonquadratic() {
        // minimum of x^4 - 2 x^2 on the positive side is at x = 1
        let mut f = |x: f64| x.powi(4) - 2.0 * x * x;
        let bracket = bracket_minimum(0.4, 0.6, &mut f);
        let result = brent_minimize(&bracket, 1e-8, &mut f);
        assert!(result.converged);
        assert_relative_eq!(result.xmin.abs(), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_descent_finds_quadratic_minimum() {
        let descent = ConstrainedDescent {
            lower: [-1.0, -1.0],
            upper: [1.0, 1.0],
            fd_step: 1e-7,
            grad_scale: 1.0,
            ftol: 1e-12,
            max_iters: 200,
        };
        let mut f = |x: [f64; 2]| (x[0] - 0.3).powi(2) + (x[1] + 0.2).powi(2);
        let (x, fx) = descent.minimize([0.0, 0.0], &mut f);
        assert_relative_eq!(x[0], 0.3, epsilon = 1e-3);
        assert_relative_eq!(x[1], -0.2, epsilon = 1e-3);
        assert!(fx < 1e-6);
    }

    #[test]
    fn test_descent_respects_bounds() {
        let descent = ConstrainedDescent {
            lower: [-0.5, -0.5],
            upper: [0.5, 0.5],
            fd_step: 1e-7,
            grad_scale: 1.0,
            ftol: 1e-12,
            max_iters: 200,
        };
        // unconstrained minimum at (2, 0) lies outside the box
        let mut f = |x: [f64; 2]| (x[0] - 2.0).powi(2) + x[1].powi(2);
        let (x, _) = descent.minimize([0.0, 0.0], &mut f);
        assert_relative_eq!(x[0], 0.5, epsilon = 1e-6);
        assert_relative_eq!(x[1], 0.0, epsilon = 1e-3);
    }
}
