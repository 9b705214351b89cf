//! Cutoff Reporting
//!
//! Turns a diagnosed link id into a `CutoffPoint` that can be shown to an
//! operator.

use serde::{Deserialize, Serialize};

use crate::model::schema::{state_value, Circuit, LinkBehavior, StateAssignment};

/// Human readable description of where continuity is broken
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CutoffPoint {
    pub link_id: String,
    pub link_name: String,
    pub reason: String,
}

/// Describe why `link_id` blocks current under `states`.
///
/// Returns `None` when the link does not exist in the circuit.
pub fn describe_cutoff(
    circuit: &Circuit,
    link_id: &str,
    states: &StateAssignment,
) -> Option<CutoffPoint> {
    let link = circuit.link(link_id)?;

    let state_name = |state_id: &str| {
        circuit
            .state(state_id)
            .map(|s| s.name.clone())
            .unwrap_or_else(|| state_id.to_string())
    };

    let reason = match &link.behavior {
        LinkBehavior::AlwaysConducting => {
            format!("Cable {} is disconnected", link.name)
        }
        LinkBehavior::NormallyOpen { state_id } if !state_value(states, state_id) => {
            format!("{} is open: the contact is not engaged", state_name(state_id))
        }
        LinkBehavior::NormallyClosed { state_id } if state_value(states, state_id) => {
            format!("{} has tripped: the contact is open", state_name(state_id))
        }
        LinkBehavior::NormallyOpen { state_id } | LinkBehavior::NormallyClosed { state_id } => {
            tracing::warn!(
                link = %link.id,
                state = %state_id,
                "cutoff reported on a link that conducts under the current states"
            );
            format!("No continuity through {}", link.name)
        }
    };

    Some(CutoffPoint {
        link_id: link.id.clone(),
        link_name: link.name.clone(),
        reason,
    })
}
