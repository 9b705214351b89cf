//! Simulation Service
//!
//! Runs the continuity analysis for every receptor of a circuit under one
//! state assignment. A run is stateless: stored state values are shadowed
//! by the caller's overrides, never modified.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::analyzer::continuity::find_path;
use crate::analyzer::cutoff::{describe_cutoff, CutoffPoint};
use crate::model::graph::build_graph;
use crate::model::schema::{Circuit, ControlState, StateAssignment};

/// Outcome for a single receptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceptorResult {
    pub receptor_id: String,
    pub receptor_name: String,
    pub is_powered: bool,
    /// Link ids from source to neutral, present only when powered
    pub active_path: Option<Vec<String>>,
    pub cutoff_point: Option<CutoffPoint>,
}

/// Full result of one simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub circuit_id: String,
    pub circuit_name: String,
    /// States as used by this run, overrides applied
    pub states: Vec<ControlState>,
    pub results: Vec<ReceptorResult>,
    pub timestamp: DateTime<Utc>,
}

impl SimulationResult {
    pub fn powered_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_powered).count()
    }

    pub fn unpowered(&self) -> impl Iterator<Item = &ReceptorResult> {
        self.results.iter().filter(|r| !r.is_powered)
    }

    pub fn all_powered(&self) -> bool {
        self.results.iter().all(|r| r.is_powered)
    }

    pub fn receptor(&self, receptor_id: &str) -> Option<&ReceptorResult> {
        self.results.iter().find(|r| r.receptor_id == receptor_id)
    }
}

/// Simulate a circuit, optionally overriding stored state values.
///
/// Overrides for state ids the circuit does not declare are ignored.
pub fn simulate_circuit(
    circuit: &Circuit,
    overrides: Option<&HashMap<String, bool>>,
) -> SimulationResult {
    let states = resolve_states(circuit, overrides);
    let assignment: StateAssignment = states
        .iter()
        .map(|s| (s.id.clone(), s.is_active))
        .collect();

    let graph = build_graph(circuit);
    let no_exclusions: HashSet<&str> = HashSet::new();
    let without_neutral: HashSet<&str> = [circuit.neutral_node_id.as_str()].into_iter().collect();

    let results: Vec<ReceptorResult> = circuit
        .receptor_node_ids
        .iter()
        .map(|receptor_id| {
            let to_receptor = find_path(
                &graph,
                &circuit.source_node_id,
                receptor_id,
                &assignment,
                &without_neutral,
            );
            let to_neutral = find_path(
                &graph,
                receptor_id,
                &circuit.neutral_node_id,
                &assignment,
                &no_exclusions,
            );

            let is_powered = to_receptor.found && to_neutral.found;
            let receptor_name = circuit
                .node(receptor_id)
                .map(|n| n.name.clone())
                .unwrap_or_else(|| receptor_id.clone());

            if is_powered {
                tracing::debug!(receptor = %receptor_id, "receptor powered");
                let mut path = to_receptor.path;
                path.extend(to_neutral.path);
                return ReceptorResult {
                    receptor_id: receptor_id.clone(),
                    receptor_name,
                    is_powered,
                    active_path: Some(path),
                    cutoff_point: None,
                };
            }

            let cutoff_point = to_receptor
                .cutoff_link_id
                .or(to_neutral.cutoff_link_id)
                .and_then(|link_id| describe_cutoff(circuit, &link_id, &assignment));

            tracing::debug!(
                receptor = %receptor_id,
                cutoff = ?cutoff_point.as_ref().map(|c| c.link_id.as_str()),
                "receptor not powered"
            );

            ReceptorResult {
                receptor_id: receptor_id.clone(),
                receptor_name,
                is_powered,
                active_path: None,
                cutoff_point,
            }
        })
        .collect();

    let powered = results.iter().filter(|r| r.is_powered).count();
    tracing::info!(
        circuit = %circuit.id,
        receptors = results.len(),
        powered,
        "simulation complete"
    );

    SimulationResult {
        circuit_id: circuit.id.clone(),
        circuit_name: circuit.name.clone(),
        states,
        results,
        timestamp: Utc::now(),
    }
}

fn resolve_states(
    circuit: &Circuit,
    overrides: Option<&HashMap<String, bool>>,
) -> Vec<ControlState> {
    if let Some(overrides) = overrides {
        for id in overrides.keys() {
            if circuit.state(id).is_none() {
                tracing::debug!(state = %id, "ignoring override for unknown state");
            }
        }
    }

    circuit
        .states
        .iter()
        .map(|state| ControlState {
            is_active: overrides
                .and_then(|o| o.get(&state.id).copied())
                .unwrap_or(state.is_active),
            ..state.clone()
        })
        .collect()
}
