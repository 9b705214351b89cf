//! Adjacency Graph
//!
//! Borrowed, bidirectional view over a circuit's links. The graph is built
//! fresh for every simulation and holds references into the circuit, so it
//! never outlives the snapshot it was built from.

use std::collections::HashMap;

use super::schema::{Circuit, LinkBehavior, StateAssignment};

/// One traversable direction of a link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdjacencyEntry<'a> {
    pub link_id: &'a str,
    pub link_name: &'a str,
    pub target_node_id: &'a str,
    pub behavior: &'a LinkBehavior,
}

impl AdjacencyEntry<'_> {
    pub fn is_conducting(&self, states: &StateAssignment) -> bool {
        self.behavior.is_conducting(states)
    }
}

/// Node id -> outgoing entries, in link declaration order
#[derive(Debug, Clone, Default)]
pub struct Adjacency<'a> {
    edges: HashMap<&'a str, Vec<AdjacencyEntry<'a>>>,
}

impl<'a> Adjacency<'a> {
    /// Entries leaving `node_id`; empty for unknown nodes
    pub fn neighbors(&self, node_id: &str) -> &[AdjacencyEntry<'a>] {
        self.edges.get(node_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn node_count(&self) -> usize {
        self.edges.len()
    }

    /// Total number of directed entries (twice the link count)
    pub fn entry_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }

    fn insert(&mut self, from: &'a str, entry: AdjacencyEntry<'a>) {
        self.edges.entry(from).or_default().push(entry);
    }
}

/// Build the adjacency structure for a circuit.
///
/// Every link contributes one entry in each direction, both sharing the
/// link's behavior.
pub fn build_graph(circuit: &Circuit) -> Adjacency<'_> {
    let mut adjacency = Adjacency::default();

    for link in &circuit.links {
        adjacency.insert(
            &link.from_node_id,
            AdjacencyEntry {
                link_id: &link.id,
                link_name: &link.name,
                target_node_id: &link.to_node_id,
                behavior: &link.behavior,
            },
        );
        adjacency.insert(
            &link.to_node_id,
            AdjacencyEntry {
                link_id: &link.id,
                link_name: &link.name,
                target_node_id: &link.from_node_id,
                behavior: &link.behavior,
            },
        );
    }

    adjacency
}
