//! Coordinate utilities: spherical/Cartesian conversions for Earth-centered
//! positions and vectors. Pure functions, no state.
//!
//! Spherical coordinates are ordered `[r, longitude, latitude]` in meters and
//! radians.

use nalgebra::Vector3;

use crate::constants::EARTH_RADIUS_M;

/// Altitude of a point above the spherical Earth surface (m).
pub fn altitude(pos: &Vector3<f64>) -> f64 {
    pos.norm() - EARTH_RADIUS_M
}

/// Convert Cartesian coordinates to spherical `[r, lon, lat]`.
pub fn cart_to_spher(cart: &Vector3<f64>) -> Vector3<f64> {
    let r = cart.norm();
    let lon = cart.y.atan2(cart.x);
    let lat = (cart.z / (cart.x * cart.x + cart.y * cart.y).sqrt()).atan();
    Vector3::new(r, lon, lat)
}

/// Convert spherical `[r, lon, lat]` coordinates to Cartesian.
pub fn spher_to_cart(spher: &Vector3<f64>) -> Vector3<f64> {
    let (r, lon, lat) = (spher.x, spher.y, spher.z);
    Vector3::new(
        r * lon.cos() * lat.cos(),
        r * lon.sin() * lat.cos(),
        r * lat.sin(),
    )
}

/// Convert a radially-directed spherical vector of magnitude `mag` at the
/// angular position `(lon, lat)` into a Cartesian vector.
///
/// This is the direction a thrust vector steered by `(theta_long, theta_lat)`
/// points in the launch frame.
pub fn spher_vec_to_cart(mag: f64, lon: f64, lat: f64) -> Vector3<f64> {
    Vector3::new(
        mag * lon.cos() * lat.cos(),
        mag * lon.sin() * lat.cos(),
        mag * lat.sin(),
    )
}

/// Rotate a local wind vector (meridional = north, zonal = east,
/// vertical = up) at the given Cartesian position into Earth-centered
/// Cartesian components.
pub fn local_wind_to_cart(
    meridional: f64,
    zonal: f64,
    vertical: f64,
    pos: &Vector3<f64>,
) -> Vector3<f64> {
    let spher = cart_to_spher(pos);
    let (lon, lat) = (spher.y, spher.z);

    let up = Vector3::new(lon.cos() * lat.cos(), lon.sin() * lat.cos(), lat.sin());
    let east = Vector3::new(-lon.sin(), lon.cos(), 0.0);
    let north = Vector3::new(
        -lon.cos() * lat.sin(),
        -lon.sin() * lat.sin(),
        lat.cos(),
    );

    north * meridional + east * zonal + up * vertical
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_altitude_at_surface() {
        let pos = Vector3::new(EARTH_RADIUS_M, 0.0, 0.0);
        assert_relative_eq!(altitude(&pos), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_spher_cart_round_trip() {
        let spher = Vector3::new(EARTH_RADIUS_M + 100e3, 0.7, -0.3);
        let cart = spher_to_cart(&spher);
        let back = cart_to_spher(&cart);
        assert_relative_eq!(back.x, spher.x, epsilon = 1e-6);
        assert_relative_eq!(back.y, spher.y, epsilon = 1e-12);
        assert_relative_eq!(back.z, spher.z, epsilon = 1e-12);
    }

    #[test]
    fn test_spher_vec_along_axes() {
        let x = spher_vec_to_cart(1.0, 0.0, 0.0);
        assert_relative_eq!(x.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(x.y, 0.0, epsilon = 1e-12);

        let z = spher_vec_to_cart(1.0, 0.0, PI / 2.0);
        assert_relative_eq!(z.z, 1.0, epsilon = 1e-12);
        assert_relative_eq!(z.x, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_local_wind_at_equator_prime_meridian() {
        // At (R, 0, 0): up = +x, east = +y, north = +z
        let pos = Vector3::new(EARTH_RADIUS_M, 0.0, 0.0);
        let wind = local_wind_to_cart(1.0, 2.0, 3.0, &pos);
        assert_relative_eq!(wind.x, 3.0, epsilon = 1e-9);
        assert_relative_eq!(wind.y, 2.0, epsilon = 1e-9);
        assert_relative_eq!(wind.z, 1.0, epsilon = 1e-9);
    }
}
