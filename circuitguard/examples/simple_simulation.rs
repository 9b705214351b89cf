//! Simple simulation example: load a circuit file and print which loads are powered.

use circuitguard::prelude::*;
use std::collections::HashMap;
use std::path::Path;

fn main() -> Result<(), CircuitGuardError> {
    let mut args = std::env::args().skip(1);
    let path = args
        .next()
        .unwrap_or_else(|| "tests/fixtures/lamp_circuit.json".to_string());
    let path = Path::new(&path);

    if !path.exists() {
        eprintln!("File not found: {}", path.display());
        eprintln!("Usage: cargo run --example simple_simulation [circuit.json] [STATE=BOOL]...");
        std::process::exit(1);
    }

    let overrides: HashMap<String, bool> = args
        .filter_map(|raw| circuitguard::parse_override(&raw))
        .collect();

    let result = CircuitGuardCore::simulate_file(path, &overrides)?;

    println!("Simulation of: {}", result.circuit_name);
    println!("Powered: {}/{}", result.powered_count(), result.results.len());
    println!();

    for receptor in &result.results {
        if receptor.is_powered {
            println!("  [ON ] {}", receptor.receptor_name);
        } else {
            println!("  [OFF] {}", receptor.receptor_name);
            if let Some(ref cutoff) = receptor.cutoff_point {
                println!("        cut at {}: {}", cutoff.link_name, cutoff.reason);
            }
        }
    }

    Ok(())
}
