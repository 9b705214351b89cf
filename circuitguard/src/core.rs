//! Core file-based API shared by the CLI and library users.
//! The engine functions themselves are pure; this layer only adds reading
//! and decoding of JSON documents.

use std::collections::HashMap;
use std::path::Path;

use crate::compiler::{
    build_circuit_from_parsed, BuildIssue, BuildResult, CompileOptions, ComponentsDocument,
    ParsedSchematic,
};
use crate::fingerprint::compute_fingerprint;
use crate::model::schema::{Circuit, CircuitError};
use crate::model::storage::{StorageError, StoredCircuit};
use crate::simulation::{simulate_circuit, SimulationResult};

#[derive(Debug, thiserror::Error)]
pub enum CircuitGuardError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid circuit: {0}")]
    InvalidCircuit(#[from] CircuitError),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Build failed: {}", format_issues(.0))]
    Build(Vec<BuildIssue>),
}

fn format_issues(issues: &[BuildIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Decode a circuit file, which is either a plain circuit or a persisted row.
///
/// Rows are recognized by their `nodesJson` column so that decoding errors
/// name the offending field of the layout actually used.
fn decode_circuit(raw: &str) -> Result<Circuit, CircuitGuardError> {
    let value: serde_json::Value = serde_json::from_str(raw)?;
    if value.get("nodesJson").is_some() {
        let row: StoredCircuit = serde_json::from_value(value)?;
        return Ok(row.into_circuit()?);
    }
    Ok(serde_json::from_value(value)?)
}

/// Parse a `STATE=BOOL` override. Accepts true/false, on/off, 1/0.
pub fn parse_override(raw: &str) -> Option<(String, bool)> {
    let (id, value) = raw.split_once('=')?;
    let value = match value.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "1" | "active" => true,
        "false" | "off" | "0" | "inactive" => false,
        _ => return None,
    };
    let id = id.trim();
    if id.is_empty() {
        return None;
    }
    Some((id.to_string(), value))
}

/// Core API used by the CLI.
pub struct CircuitGuardCore;

impl CircuitGuardCore {
    /// Load a circuit from a JSON file, validating its invariants.
    pub fn load_circuit(path: &Path) -> Result<Circuit, CircuitGuardError> {
        let raw = std::fs::read_to_string(path)?;
        let circuit = decode_circuit(&raw)?;
        circuit.validate()?;
        tracing::debug!(
            path = %path.display(),
            nodes = circuit.nodes.len(),
            links = circuit.links.len(),
            "circuit loaded"
        );
        Ok(circuit)
    }

    /// Load a component list, in either the flagged or the extracted layout.
    pub fn load_components(path: &Path) -> Result<ParsedSchematic, CircuitGuardError> {
        let raw = std::fs::read_to_string(path)?;
        let doc: ComponentsDocument = serde_json::from_str(&raw)?;
        Ok(doc.into())
    }

    /// Compile a component file. Soft errors are returned in the result.
    pub fn compile_file(
        path: &Path,
        options: &CompileOptions,
    ) -> Result<BuildResult, CircuitGuardError> {
        let parsed = Self::load_components(path)?;
        Ok(build_circuit_from_parsed(&parsed, options))
    }

    /// Compile a component file straight into a circuit, failing on hard errors.
    pub fn compile_to_circuit(
        path: &Path,
        options: &CompileOptions,
    ) -> Result<(Circuit, Vec<BuildIssue>), CircuitGuardError> {
        let result = Self::compile_file(path, options)?;
        match result.circuit_input {
            Some(input) if result.success => Ok((input.into_circuit(), result.errors)),
            _ => Err(CircuitGuardError::Build(result.errors)),
        }
    }

    /// Simulate a circuit file under optional state overrides.
    pub fn simulate_file(
        path: &Path,
        overrides: &HashMap<String, bool>,
    ) -> Result<SimulationResult, CircuitGuardError> {
        let circuit = Self::load_circuit(path)?;
        Ok(simulate_circuit(&circuit, Some(overrides)))
    }

    /// Fingerprint of a component file.
    pub fn fingerprint_file(path: &Path) -> Result<String, CircuitGuardError> {
        let parsed = Self::load_components(path)?;
        Ok(compute_fingerprint(&parsed.components))
    }
}
