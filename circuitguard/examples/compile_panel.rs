//! Compile a component list into a circuit and print the result as JSON.

use circuitguard::prelude::*;
use std::path::Path;

fn main() -> Result<(), CircuitGuardError> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "tests/fixtures/panel_components.json".to_string());

    let result = CircuitGuardCore::compile_file(Path::new(&path), &CompileOptions::default())?;

    for message in result.error_messages() {
        eprintln!("warning: {}", message);
    }

    match result.circuit_input {
        Some(input) if result.success => {
            let circuit = input.into_circuit();
            println!("{}", serde_json::to_string_pretty(&circuit)?);
            println!(
                "fingerprint: {}",
                CircuitGuardCore::fingerprint_file(Path::new(&path))?
            );
            Ok(())
        }
        _ => {
            eprintln!("Compilation failed.");
            std::process::exit(1);
        }
    }
}
