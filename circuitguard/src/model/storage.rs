//! Persisted row shape of a circuit.
//!
//! Storage layers keep the node, link and state lists as JSON-encoded
//! columns. `StoredCircuit` is that row; converting back into a `Circuit`
//! decodes each column and reports which one was malformed.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::schema::Circuit;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("malformed {column}: {source}")]
    Column {
        column: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCircuit {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub nodes_json: String,
    pub links_json: String,
    pub states_json: String,
    pub receptor_node_ids: Vec<String>,
    pub source_node_id: String,
    pub neutral_node_id: String,
    /// Fingerprint of the component list the circuit was compiled from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
}

impl StoredCircuit {
    pub fn from_circuit(circuit: &Circuit) -> Result<Self, StorageError> {
        Ok(Self {
            id: circuit.id.clone(),
            name: circuit.name.clone(),
            description: circuit.description.clone(),
            nodes_json: encode("nodesJson", &circuit.nodes)?,
            links_json: encode("linksJson", &circuit.links)?,
            states_json: encode("statesJson", &circuit.states)?,
            receptor_node_ids: circuit.receptor_node_ids.clone(),
            source_node_id: circuit.source_node_id.clone(),
            neutral_node_id: circuit.neutral_node_id.clone(),
            fingerprint: None,
        })
    }

    pub fn with_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.fingerprint = Some(fingerprint.into());
        self
    }

    pub fn into_circuit(self) -> Result<Circuit, StorageError> {
        Ok(Circuit {
            nodes: decode("nodesJson", &self.nodes_json)?,
            links: decode("linksJson", &self.links_json)?,
            states: decode("statesJson", &self.states_json)?,
            id: self.id,
            name: self.name,
            description: self.description,
            source_node_id: self.source_node_id,
            neutral_node_id: self.neutral_node_id,
            receptor_node_ids: self.receptor_node_ids,
        })
    }
}

fn encode<T: Serialize>(column: &'static str, value: &T) -> Result<String, StorageError> {
    serde_json::to_string(value).map_err(|source| StorageError::Column { column, source })
}

fn decode<T: for<'de> Deserialize<'de>>(column: &'static str, raw: &str) -> Result<T, StorageError> {
    serde_json::from_str(raw).map_err(|source| StorageError::Column { column, source })
}
