//! Informational entry point; the real command-line interface lives in the
//! `reentry` binary.

fn main() {
    println!("Reentry Engine v0.1.0");
    println!();
    println!("Monte Carlo flight simulator for ballistic and maneuverable");
    println!("reentry vehicles.");
    println!();
    println!("Use the `reentry` binary to run simulations:");
    println!("  reentry run --config run.toml");
    println!("  reentry aim --config run.toml --lat 12.5 --lon -30.0");
}
