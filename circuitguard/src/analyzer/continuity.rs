//! Continuity Analyzer
//!
//! Breadth-first search for a conducting path between two nodes. When no
//! conducting path exists, a second structural search (conductivity
//! ignored) locates the first open link between the two points, which is
//! reported as the cutoff.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};

use crate::model::graph::{Adjacency, AdjacencyEntry};
use crate::model::schema::StateAssignment;

/// Outcome of a continuity search
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathResult {
    pub found: bool,
    /// Traversed link ids, source to target
    pub path: Vec<String>,
    /// Link diagnosed as breaking continuity, when the target was unreached
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cutoff_link_id: Option<String>,
}

/// Parent pointer: node -> (previous node, entry used to get here)
type ParentMap<'n, 'a> = HashMap<&'n str, (&'n str, AdjacencyEntry<'a>)>;

/// Search for a conducting path from `source_id` to `target_id`.
///
/// Nodes in `excluded` are never entered. Never fails: an unreachable
/// target is reported as `found: false` with the best cutoff diagnosis.
pub fn find_path(
    adjacency: &Adjacency<'_>,
    source_id: &str,
    target_id: &str,
    states: &StateAssignment,
    excluded: &HashSet<&str>,
) -> PathResult {
    let mut visited: HashSet<&str> = HashSet::new();
    let mut parents: ParentMap<'_, '_> = HashMap::new();
    let mut queue: VecDeque<&str> = VecDeque::new();
    let mut first_blocked: Option<&str> = None;

    visited.insert(source_id);
    queue.push_back(source_id);

    while let Some(current) = queue.pop_front() {
        if current == target_id {
            return PathResult {
                found: true,
                path: trace_entries(&parents, source_id, current)
                    .into_iter()
                    .map(|entry| entry.link_id.to_string())
                    .collect(),
                cutoff_link_id: None,
            };
        }

        for entry in adjacency.neighbors(current) {
            if excluded.contains(entry.target_node_id) || visited.contains(entry.target_node_id) {
                continue;
            }
            if !entry.is_conducting(states) {
                first_blocked.get_or_insert(entry.link_id);
                continue;
            }
            visited.insert(entry.target_node_id);
            parents.insert(entry.target_node_id, (current, *entry));
            queue.push_back(entry.target_node_id);
        }
    }

    let cutoff = structural_cutoff(adjacency, source_id, target_id, states, excluded)
        .or(first_blocked)
        .map(str::to_string);

    PathResult {
        found: false,
        path: Vec::new(),
        cutoff_link_id: cutoff,
    }
}

/// First non-conducting link on any structural path from source to target
fn structural_cutoff<'a>(
    adjacency: &Adjacency<'a>,
    source_id: &str,
    target_id: &str,
    states: &StateAssignment,
    excluded: &HashSet<&str>,
) -> Option<&'a str> {
    let mut visited: HashSet<&str> = HashSet::new();
    let mut parents: ParentMap<'_, 'a> = HashMap::new();
    let mut queue: VecDeque<&str> = VecDeque::new();

    visited.insert(source_id);
    queue.push_back(source_id);

    while let Some(current) = queue.pop_front() {
        if current == target_id {
            return trace_entries(&parents, source_id, current)
                .into_iter()
                .find(|entry| !entry.is_conducting(states))
                .map(|entry| entry.link_id);
        }

        for entry in adjacency.neighbors(current) {
            if excluded.contains(entry.target_node_id) || visited.contains(entry.target_node_id) {
                continue;
            }
            visited.insert(entry.target_node_id);
            parents.insert(entry.target_node_id, (current, *entry));
            queue.push_back(entry.target_node_id);
        }
    }

    None
}

/// Walk parent pointers back from `end` and return the entries in forward order
fn trace_entries<'n, 'a>(
    parents: &ParentMap<'n, 'a>,
    source_id: &str,
    end: &'n str,
) -> Vec<AdjacencyEntry<'a>> {
    let mut entries = Vec::new();
    let mut node = end;
    while node != source_id {
        let Some(&(previous, entry)) = parents.get(node) else {
            break;
        };
        entries.push(entry);
        node = previous;
    }
    entries.reverse();
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::graph::build_graph;
    use crate::model::schema::{Circuit, CircuitInput, ControlState, Link, LinkBehavior, Node, NodeType};

    /// source -(nc breaker)- b -(no switch)- s -(wire)- lamp -(wire)- neutral
    fn chain() -> Circuit {
        CircuitInput {
            name: "Chain".to_string(),
            description: None,
            nodes: vec![
                Node::new("source", "Phase", NodeType::Source),
                Node::new("b", "Breaker out", NodeType::Intermediate),
                Node::new("s", "Switch out", NodeType::Intermediate),
                Node::new("lamp", "Lamp", NodeType::Receptor),
                Node::new("neutral", "Neutral", NodeType::Neutral),
            ],
            links: vec![
                Link::new("l-breaker", "Breaker", "source", "b", LinkBehavior::normally_closed("breaker")),
                Link::new("l-switch", "Switch", "b", "s", LinkBehavior::normally_open("switch")),
                Link::new("l-lamp", "Lamp feed", "s", "lamp", LinkBehavior::AlwaysConducting),
                Link::new("l-return", "Return", "lamp", "neutral", LinkBehavior::AlwaysConducting),
            ],
            states: vec![
                ControlState::new("breaker", "Breaker", false),
                ControlState::new("switch", "Switch", false),
            ],
            source_node_id: "source".to_string(),
            neutral_node_id: "neutral".to_string(),
            receptor_node_ids: vec!["lamp".to_string()],
        }
        .into_circuit_with_id("chain")
    }

    fn assignment(pairs: &[(&str, bool)]) -> StateAssignment {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_path_found_when_all_conducting() {
        let circuit = chain();
        let graph = build_graph(&circuit);
        let states = assignment(&[("switch", true)]);

        let result = find_path(&graph, "source", "lamp", &states, &HashSet::new());
        assert!(result.found);
        assert_eq!(result.path, vec!["l-breaker", "l-switch", "l-lamp"]);
        assert_eq!(result.cutoff_link_id, None);
    }

    #[test]
    fn test_source_equals_target() {
        let circuit = chain();
        let graph = build_graph(&circuit);

        let result = find_path(&graph, "lamp", "lamp", &StateAssignment::new(), &HashSet::new());
        assert!(result.found);
        assert!(result.path.is_empty());
    }

    #[test]
    fn test_cutoff_is_first_open_link_on_structural_path() {
        let circuit = chain();
        let graph = build_graph(&circuit);
        let states = assignment(&[("breaker", true), ("switch", false)]);

        let result = find_path(&graph, "source", "lamp", &states, &HashSet::new());
        assert!(!result.found);
        assert!(result.path.is_empty());
        assert_eq!(result.cutoff_link_id.as_deref(), Some("l-breaker"));
    }

    #[test]
    fn test_cutoff_downstream_of_conducting_segment() {
        let circuit = chain();
        let graph = build_graph(&circuit);

        let result = find_path(&graph, "source", "lamp", &StateAssignment::new(), &HashSet::new());
        assert!(!result.found);
        assert_eq!(result.cutoff_link_id.as_deref(), Some("l-switch"));
    }

    #[test]
    fn test_excluded_node_never_entered() {
        let mut circuit = chain();
        // Alternate route through the neutral bus
        circuit.links.push(Link::new(
            "l-sneak",
            "Sneak",
            "source",
            "neutral",
            LinkBehavior::AlwaysConducting,
        ));
        let graph = build_graph(&circuit);
        let states = StateAssignment::new();

        let open = find_path(&graph, "source", "lamp", &states, &HashSet::new());
        assert!(open.found);
        assert!(open.path.contains(&"l-sneak".to_string()));

        let excluded: HashSet<&str> = ["neutral"].into_iter().collect();
        let guarded = find_path(&graph, "source", "lamp", &states, &excluded);
        assert!(!guarded.found);
        assert!(!guarded.path.contains(&"l-sneak".to_string()));
        assert!(!guarded.path.contains(&"l-return".to_string()));
        assert_eq!(guarded.cutoff_link_id.as_deref(), Some("l-switch"));
    }

    #[test]
    fn test_excluded_node_bypassed_by_other_route() {
        let mut circuit = chain();
        circuit.links.push(Link::new(
            "l-sneak",
            "Sneak",
            "source",
            "neutral",
            LinkBehavior::AlwaysConducting,
        ));
        let graph = build_graph(&circuit);
        let states = assignment(&[("switch", true)]);

        // Through the neutral bus the lamp is two hops away
        let open = find_path(&graph, "source", "lamp", &states, &HashSet::new());
        assert_eq!(open.path, vec!["l-sneak", "l-return"]);

        let excluded: HashSet<&str> = ["neutral"].into_iter().collect();
        let guarded = find_path(&graph, "source", "lamp", &states, &excluded);
        assert!(guarded.found);
        assert_eq!(guarded.path, vec!["l-breaker", "l-switch", "l-lamp"]);
        for link_id in &guarded.path {
            let link = circuit.link(link_id).unwrap();
            assert_ne!(link.from_node_id, "neutral");
            assert_ne!(link.to_node_id, "neutral");
        }
    }

    #[test]
    fn test_unreachable_target_falls_back_to_heuristic() {
        let mut circuit = chain();
        circuit.nodes.push(Node::new("island", "Island", NodeType::Receptor));
        let graph = build_graph(&circuit);

        let result = find_path(&graph, "source", "island", &StateAssignment::new(), &HashSet::new());
        assert!(!result.found);
        // No structural path: first blocked link seen while scanning
        assert_eq!(result.cutoff_link_id.as_deref(), Some("l-switch"));
    }

    #[test]
    fn test_unknown_source_yields_no_cutoff() {
        let circuit = chain();
        let graph = build_graph(&circuit);

        let result = find_path(&graph, "ghost", "lamp", &StateAssignment::new(), &HashSet::new());
        assert_eq!(result, PathResult::default());
    }

    #[test]
    fn test_shortest_conducting_route_preferred() {
        let mut circuit = chain();
        circuit.links.push(Link::new(
            "l-direct",
            "Direct",
            "source",
            "lamp",
            LinkBehavior::normally_open("switch"),
        ));
        let graph = build_graph(&circuit);

        let closed = find_path(&graph, "source", "lamp", &assignment(&[("switch", true)]), &HashSet::new());
        assert_eq!(closed.path, vec!["l-direct"]);
    }
}
