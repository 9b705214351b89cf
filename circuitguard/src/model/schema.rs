//! Circuit Data Model
//!
//! Value types describing an electrical installation as a graph of nodes
//! joined by links whose conductivity depends on operator-controlled states.
//! A `Circuit` is an immutable snapshot; simulations read it but never write
//! to it.

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::Bfs;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use uuid::Uuid;

/// Role of a node in the installation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    /// The phase feed, root of every forward path
    Source,
    /// A point between two protective devices
    Intermediate,
    /// An end load (lighting circuit, sockets, ...)
    Receptor,
    /// The return bus
    Neutral,
}

/// A connection point in the circuit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
}

impl Node {
    pub fn new(id: impl Into<String>, name: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            node_type,
        }
    }
}

/// Operator-toggleable position of one protective device.
///
/// For devices wired through `normally_closed` links, `is_active == true`
/// means the device has tripped or been opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlState {
    pub id: String,
    pub name: String,
    pub is_active: bool,
}

impl ControlState {
    pub fn new(id: impl Into<String>, name: impl Into<String>, is_active: bool) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_active,
        }
    }
}

/// How a link's conductivity depends on the control states
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LinkBehavior {
    /// Plain wire, always conducts
    AlwaysConducting,
    /// Conducts only while the referenced state is active
    NormallyOpen {
        #[serde(rename = "stateId")]
        state_id: String,
    },
    /// Conducts only while the referenced state is not active
    NormallyClosed {
        #[serde(rename = "stateId")]
        state_id: String,
    },
}

impl LinkBehavior {
    pub fn normally_open(state_id: impl Into<String>) -> Self {
        LinkBehavior::NormallyOpen {
            state_id: state_id.into(),
        }
    }

    pub fn normally_closed(state_id: impl Into<String>) -> Self {
        LinkBehavior::NormallyClosed {
            state_id: state_id.into(),
        }
    }

    /// The control state this behavior depends on, if any
    pub fn state_id(&self) -> Option<&str> {
        match self {
            LinkBehavior::AlwaysConducting => None,
            LinkBehavior::NormallyOpen { state_id } | LinkBehavior::NormallyClosed { state_id } => {
                Some(state_id)
            }
        }
    }

    /// Evaluate conductivity under a state assignment.
    ///
    /// States missing from the assignment read as inactive.
    pub fn is_conducting(&self, states: &StateAssignment) -> bool {
        match self {
            LinkBehavior::AlwaysConducting => true,
            LinkBehavior::NormallyOpen { state_id } => state_value(states, state_id),
            LinkBehavior::NormallyClosed { state_id } => !state_value(states, state_id),
        }
    }
}

/// Resolved state values keyed by state id
pub type StateAssignment = HashMap<String, bool>;

pub(crate) fn state_value(states: &StateAssignment, state_id: &str) -> bool {
    states.get(state_id).copied().unwrap_or(false)
}

/// A bidirectional wire segment between two nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub id: String,
    pub name: String,
    pub from_node_id: String,
    pub to_node_id: String,
    pub behavior: LinkBehavior,
}

impl Link {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        from_node_id: impl Into<String>,
        to_node_id: impl Into<String>,
        behavior: LinkBehavior,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            from_node_id: from_node_id.into(),
            to_node_id: to_node_id.into(),
            behavior,
        }
    }
}

/// Invariant violations reported by [`Circuit::validate`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CircuitError {
    #[error("duplicate node id: {0}")]
    DuplicateNode(String),

    #[error("duplicate link id: {0}")]
    DuplicateLink(String),

    #[error("duplicate state id: {0}")]
    DuplicateState(String),

    #[error("link {link_id} references unknown state {state_id}")]
    UnknownState { link_id: String, state_id: String },

    #[error("link {link_id} references unknown node {node_id}")]
    DanglingLink { link_id: String, node_id: String },

    #[error("source node {0} does not exist")]
    MissingSource(String),

    #[error("neutral node {0} does not exist")]
    MissingNeutral(String),

    #[error("receptor node {0} does not exist")]
    MissingReceptor(String),
}

/// A circuit as produced by the compiler, before an id is assigned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitInput {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
    pub states: Vec<ControlState>,
    pub source_node_id: String,
    pub neutral_node_id: String,
    pub receptor_node_ids: Vec<String>,
}

impl CircuitInput {
    /// Turn the input into a circuit with a freshly generated id
    pub fn into_circuit(self) -> Circuit {
        self.into_circuit_with_id(Uuid::new_v4().to_string())
    }

    pub fn into_circuit_with_id(self, id: impl Into<String>) -> Circuit {
        Circuit {
            id: id.into(),
            name: self.name,
            description: self.description,
            nodes: self.nodes,
            links: self.links,
            states: self.states,
            source_node_id: self.source_node_id,
            neutral_node_id: self.neutral_node_id,
            receptor_node_ids: self.receptor_node_ids,
        }
    }
}

/// A complete installation model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Circuit {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
    pub states: Vec<ControlState>,
    pub source_node_id: String,
    pub neutral_node_id: String,
    pub receptor_node_ids: Vec<String>,
}

impl Circuit {
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn link(&self, id: &str) -> Option<&Link> {
        self.links.iter().find(|l| l.id == id)
    }

    pub fn state(&self, id: &str) -> Option<&ControlState> {
        self.states.iter().find(|s| s.id == id)
    }

    /// Stored state values, keyed by state id
    pub fn stored_assignment(&self) -> StateAssignment {
        self.states
            .iter()
            .map(|s| (s.id.clone(), s.is_active))
            .collect()
    }

    /// Check the structural invariants of the circuit.
    ///
    /// Returns the first violation found. Simulation does not depend on
    /// this check; an invalid circuit simply yields unpowered receptors.
    pub fn validate(&self) -> Result<(), CircuitError> {
        let mut node_ids = HashSet::new();
        for node in &self.nodes {
            if !node_ids.insert(node.id.as_str()) {
                return Err(CircuitError::DuplicateNode(node.id.clone()));
            }
        }

        let mut state_ids = HashSet::new();
        for state in &self.states {
            if !state_ids.insert(state.id.as_str()) {
                return Err(CircuitError::DuplicateState(state.id.clone()));
            }
        }

        let mut link_ids = HashSet::new();
        for link in &self.links {
            if !link_ids.insert(link.id.as_str()) {
                return Err(CircuitError::DuplicateLink(link.id.clone()));
            }
            for endpoint in [&link.from_node_id, &link.to_node_id] {
                if !node_ids.contains(endpoint.as_str()) {
                    return Err(CircuitError::DanglingLink {
                        link_id: link.id.clone(),
                        node_id: endpoint.clone(),
                    });
                }
            }
            if let Some(state_id) = link.behavior.state_id() {
                if !state_ids.contains(state_id) {
                    return Err(CircuitError::UnknownState {
                        link_id: link.id.clone(),
                        state_id: state_id.to_string(),
                    });
                }
            }
        }

        if !node_ids.contains(self.source_node_id.as_str()) {
            return Err(CircuitError::MissingSource(self.source_node_id.clone()));
        }
        if !node_ids.contains(self.neutral_node_id.as_str()) {
            return Err(CircuitError::MissingNeutral(self.neutral_node_id.clone()));
        }
        for receptor in &self.receptor_node_ids {
            if !node_ids.contains(receptor.as_str()) {
                return Err(CircuitError::MissingReceptor(receptor.clone()));
            }
        }

        Ok(())
    }

    /// Structural statistics, ignoring link conductivity
    pub fn stats(&self) -> CircuitStats {
        let mut graph: UnGraph<&str, &str> = UnGraph::new_undirected();
        let mut indices: HashMap<&str, NodeIndex> = HashMap::new();

        for node in &self.nodes {
            let idx = graph.add_node(node.id.as_str());
            indices.insert(node.id.as_str(), idx);
        }
        for link in &self.links {
            let (Some(&a), Some(&b)) = (
                indices.get(link.from_node_id.as_str()),
                indices.get(link.to_node_id.as_str()),
            ) else {
                continue;
            };
            graph.add_edge(a, b, link.id.as_str());
        }

        let mut reachable = HashSet::new();
        if let Some(&source) = indices.get(self.source_node_id.as_str()) {
            let mut bfs = Bfs::new(&graph, source);
            while let Some(idx) = bfs.next(&graph) {
                reachable.insert(idx);
            }
        }

        let isolated_node_ids = self
            .nodes
            .iter()
            .filter(|n| {
                indices
                    .get(n.id.as_str())
                    .map(|idx| !reachable.contains(idx))
                    .unwrap_or(true)
            })
            .map(|n| n.id.clone())
            .collect();

        CircuitStats {
            node_count: self.nodes.len(),
            link_count: self.links.len(),
            state_count: self.states.len(),
            receptor_count: self.receptor_node_ids.len(),
            connected_groups: petgraph::algo::connected_components(&graph),
            isolated_node_ids,
        }
    }
}

/// Statistics about a circuit's topology
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitStats {
    pub node_count: usize,
    pub link_count: usize,
    pub state_count: usize,
    pub receptor_count: usize,
    /// Number of structurally connected node groups
    pub connected_groups: usize,
    /// Nodes with no structural path to the source
    pub isolated_node_ids: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lamp_circuit() -> Circuit {
        CircuitInput {
            name: "Lamp".to_string(),
            description: None,
            nodes: vec![
                Node::new("phase", "Phase", NodeType::Source),
                Node::new("lamp", "Lamp", NodeType::Receptor),
                Node::new("neutral", "Neutral", NodeType::Neutral),
            ],
            links: vec![
                Link::new("l1", "Breaker", "phase", "lamp", LinkBehavior::normally_closed("breaker")),
                Link::new("l2", "Return", "lamp", "neutral", LinkBehavior::AlwaysConducting),
            ],
            states: vec![ControlState::new("breaker", "Breaker", false)],
            source_node_id: "phase".to_string(),
            neutral_node_id: "neutral".to_string(),
            receptor_node_ids: vec!["lamp".to_string()],
        }
        .into_circuit_with_id("c1")
    }

    #[test]
    fn test_behavior_predicates() {
        let mut states = StateAssignment::new();
        assert!(LinkBehavior::AlwaysConducting.is_conducting(&states));
        assert!(!LinkBehavior::normally_open("s").is_conducting(&states));
        assert!(LinkBehavior::normally_closed("s").is_conducting(&states));

        states.insert("s".to_string(), true);
        assert!(LinkBehavior::normally_open("s").is_conducting(&states));
        assert!(!LinkBehavior::normally_closed("s").is_conducting(&states));
    }

    #[test]
    fn test_behavior_serialization() {
        let json = serde_json::to_value(LinkBehavior::normally_closed("q1")).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "normally_closed", "stateId": "q1" }));

        let json = serde_json::to_value(LinkBehavior::AlwaysConducting).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "always_conducting" }));
    }

    #[test]
    fn test_circuit_json_field_names() {
        let json = serde_json::to_value(lamp_circuit()).unwrap();
        assert_eq!(json["sourceNodeId"], "phase");
        assert_eq!(json["links"][0]["fromNodeId"], "phase");
        assert_eq!(json["states"][0]["isActive"], false);
        assert_eq!(json["nodes"][1]["type"], "receptor");
    }

    #[test]
    fn test_validate_ok() {
        assert_eq!(lamp_circuit().validate(), Ok(()));
    }

    #[test]
    fn test_validate_unknown_state() {
        let mut circuit = lamp_circuit();
        circuit.links[0].behavior = LinkBehavior::normally_open("missing");
        assert_eq!(
            circuit.validate(),
            Err(CircuitError::UnknownState {
                link_id: "l1".to_string(),
                state_id: "missing".to_string(),
            })
        );
    }

    #[test]
    fn test_validate_duplicate_link() {
        let mut circuit = lamp_circuit();
        let copy = circuit.links[1].clone();
        circuit.links.push(copy);
        assert_eq!(circuit.validate(), Err(CircuitError::DuplicateLink("l2".to_string())));
    }

    #[test]
    fn test_validate_duplicate_node() {
        let mut circuit = lamp_circuit();
        circuit.nodes.push(Node::new("lamp", "Second lamp", NodeType::Receptor));
        assert_eq!(circuit.validate(), Err(CircuitError::DuplicateNode("lamp".to_string())));
    }

    #[test]
    fn test_validate_duplicate_state() {
        let mut circuit = lamp_circuit();
        circuit.states.push(ControlState::new("breaker", "Breaker again", true));
        assert_eq!(
            circuit.validate(),
            Err(CircuitError::DuplicateState("breaker".to_string()))
        );
    }

    #[test]
    fn test_validate_dangling_link() {
        let mut circuit = lamp_circuit();
        circuit.links[1].to_node_id = "nowhere".to_string();
        assert_eq!(
            circuit.validate(),
            Err(CircuitError::DanglingLink {
                link_id: "l2".to_string(),
                node_id: "nowhere".to_string(),
            })
        );
    }

    #[test]
    fn test_validate_missing_source() {
        let mut circuit = lamp_circuit();
        circuit.source_node_id = "mains".to_string();
        assert_eq!(circuit.validate(), Err(CircuitError::MissingSource("mains".to_string())));
    }

    #[test]
    fn test_validate_missing_neutral() {
        let mut circuit = lamp_circuit();
        circuit.neutral_node_id = "earth".to_string();
        assert_eq!(circuit.validate(), Err(CircuitError::MissingNeutral("earth".to_string())));
    }

    #[test]
    fn test_validate_missing_receptor() {
        let mut circuit = lamp_circuit();
        circuit.receptor_node_ids.push("ghost".to_string());
        assert_eq!(circuit.validate(), Err(CircuitError::MissingReceptor("ghost".to_string())));
    }

    #[test]
    fn test_parallel_links_are_valid() {
        let mut circuit = lamp_circuit();
        circuit.links.push(Link::new(
            "l3",
            "Bypass",
            "phase",
            "lamp",
            LinkBehavior::AlwaysConducting,
        ));
        assert!(circuit.validate().is_ok());
    }

    #[test]
    fn test_stats_isolated_nodes() {
        let mut circuit = lamp_circuit();
        circuit.nodes.push(Node::new("spare", "Spare", NodeType::Intermediate));

        let stats = circuit.stats();
        assert_eq!(stats.node_count, 4);
        assert_eq!(stats.link_count, 2);
        assert_eq!(stats.connected_groups, 2);
        assert_eq!(stats.isolated_node_ids, vec!["spare".to_string()]);
    }

    #[test]
    fn test_into_circuit_generates_id() {
        let a = lamp_circuit();
        let input = CircuitInput {
            name: a.name.clone(),
            description: None,
            nodes: a.nodes.clone(),
            links: a.links.clone(),
            states: a.states.clone(),
            source_node_id: a.source_node_id.clone(),
            neutral_node_id: a.neutral_node_id.clone(),
            receptor_node_ids: a.receptor_node_ids.clone(),
        };
        let b = input.clone().into_circuit();
        let c = input.into_circuit();
        assert_ne!(b.id, c.id);
        assert!(Uuid::parse_str(&b.id).is_ok());
    }
}
