//! Circuit Compiler
//!
//! Builds a circuit graph from the flat device list of a distribution panel.
//! The hierarchy is fixed: main breaker, then differentials, then final
//! circuits. Each device becomes a node, a control state and a
//! `normally_closed` link from its parent; every final circuit also gets an
//! always-conducting return to the neutral.
//!
//! All generated states start inactive. Because device links are normally
//! closed, an inactive state conducts: a freshly compiled panel is fully
//! powered, and activating a state models that device tripping.

pub mod components;

use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

use crate::model::schema::{CircuitInput, ControlState, Link, LinkBehavior, Node, NodeType};

pub use components::{
    ComponentKind, ComponentsDocument, ExtractedComponent, ParsedComponent, ParsedSchematic,
};

pub const SOURCE_NODE_ID: &str = "source";
pub const NEUTRAL_NODE_ID: &str = "neutral";

/// Problems found while compiling.
///
/// `NoComponents` and `NoReceptors` make the build fail; the others are
/// reported as warnings next to a usable circuit.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(into = "String")]
pub enum BuildIssue {
    #[error("no components to build a circuit from")]
    NoComponents,

    #[error("no main breaker found; differentials are fed directly from the source")]
    MissingMainBreaker,

    #[error("component {repere}: parent {parent} not found, component skipped")]
    UnresolvedParent { repere: String, parent: String },

    #[error("component {0} could not be classified as breaker, differential or final circuit")]
    Orphan(String),

    #[error("component {0} appears more than once, duplicate skipped")]
    DuplicateRepere(String),

    #[error("no final circuits found; the circuit has no receptors")]
    NoReceptors,
}

impl BuildIssue {
    /// Whether this issue prevents a circuit from being produced
    pub fn is_fatal(&self) -> bool {
        matches!(self, BuildIssue::NoComponents | BuildIssue::NoReceptors)
    }
}

impl From<BuildIssue> for String {
    fn from(issue: BuildIssue) -> Self {
        issue.to_string()
    }
}

/// Outcome of a compile
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub circuit_input: Option<CircuitInput>,
    pub errors: Vec<BuildIssue>,
}

impl BuildResult {
    fn failed(errors: Vec<BuildIssue>) -> Self {
        Self {
            success: false,
            circuit_input: None,
            errors,
        }
    }

    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &BuildIssue> {
        self.errors.iter().filter(|e| !e.is_fatal())
    }
}

/// Naming for the compiled circuit
#[derive(Clone, Debug)]
pub struct CompileOptions {
    pub name: String,
    pub description: Option<String>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            name: "Imported panel".to_string(),
            description: None,
        }
    }
}

/// Device tier after classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tier {
    Differential,
    FinalCircuit,
    Orphan,
}

fn classify(component: &ParsedComponent) -> Tier {
    let has_parent = component.parent_repere.is_some();
    if component.is_differential || (!component.is_final_circuit && !has_parent) {
        Tier::Differential
    } else if component.is_final_circuit || (has_parent && !component.is_main_breaker) {
        Tier::FinalCircuit
    } else {
        Tier::Orphan
    }
}

fn node_id(repere: &str) -> String {
    format!("node-{}", repere)
}

fn state_id(repere: &str) -> String {
    format!("state-{}", repere)
}

fn link_id(repere: &str) -> String {
    format!("link-{}", repere)
}

/// Accumulates nodes, links and states while compiling
struct PanelBuilder {
    nodes: Vec<Node>,
    links: Vec<Link>,
    states: Vec<ControlState>,
    receptors: Vec<String>,
    /// repere -> node id, for parent resolution
    device_nodes: HashMap<String, String>,
}

impl PanelBuilder {
    fn new() -> Self {
        Self {
            nodes: vec![
                Node::new(SOURCE_NODE_ID, "Phase", NodeType::Source),
                Node::new(NEUTRAL_NODE_ID, "Neutral", NodeType::Neutral),
            ],
            links: Vec::new(),
            states: Vec::new(),
            receptors: Vec::new(),
            device_nodes: HashMap::new(),
        }
    }

    fn is_known(&self, repere: &str) -> bool {
        self.device_nodes.contains_key(repere) || self.receptors.contains(&node_id(repere))
    }

    /// Add a device node fed from `parent_node` through a normally closed link
    fn add_device(&mut self, component: &ParsedComponent, node_type: NodeType, parent_node: &str) -> String {
        let node = node_id(&component.repere);
        let state = state_id(&component.repere);
        let label = component.label();

        self.nodes.push(Node::new(node.clone(), label.clone(), node_type));
        self.states.push(ControlState::new(
            state.clone(),
            format!("{} ({})", component.repere, component.protection.trim()),
            false,
        ));
        self.links.push(Link::new(
            link_id(&component.repere),
            label,
            parent_node,
            node.clone(),
            LinkBehavior::normally_closed(state),
        ));
        node
    }

    fn add_receptor(&mut self, component: &ParsedComponent, parent_node: &str) {
        let node = self.add_device(component, NodeType::Receptor, parent_node);
        self.links.push(Link::new(
            format!("{}-neutral", link_id(&component.repere)),
            format!("{} return", component.repere),
            node.clone(),
            NEUTRAL_NODE_ID,
            LinkBehavior::AlwaysConducting,
        ));
        self.receptors.push(node);
    }
}

/// Compile a parsed device list into a circuit.
///
/// Hard failures (`success: false`) only occur for an empty list or when no
/// receptor could be produced; everything else degrades into a warning.
pub fn build_circuit_from_parsed(parsed: &ParsedSchematic, options: &CompileOptions) -> BuildResult {
    let components = &parsed.components;
    if components.is_empty() {
        return BuildResult::failed(vec![BuildIssue::NoComponents]);
    }

    let mut errors = Vec::new();
    let mut builder = PanelBuilder::new();

    let main_index = components.iter().position(|c| c.is_main_breaker);
    let upstream = match main_index {
        Some(index) => {
            let main = &components[index];
            tracing::debug!(repere = %main.repere, "main breaker");
            let node = builder.add_device(main, NodeType::Intermediate, SOURCE_NODE_ID);
            builder.device_nodes.insert(main.repere.clone(), node.clone());
            node
        }
        None => {
            errors.push(BuildIssue::MissingMainBreaker);
            SOURCE_NODE_ID.to_string()
        }
    };

    let mut differentials = Vec::new();
    let mut finals = Vec::new();
    for (index, component) in components.iter().enumerate() {
        if Some(index) == main_index {
            continue;
        }
        match classify(component) {
            Tier::Differential => differentials.push(component),
            Tier::FinalCircuit => finals.push(component),
            Tier::Orphan => errors.push(BuildIssue::Orphan(component.repere.clone())),
        }
    }
    tracing::debug!(
        differentials = differentials.len(),
        finals = finals.len(),
        "components classified"
    );

    for differential in differentials {
        if builder.is_known(&differential.repere) {
            errors.push(BuildIssue::DuplicateRepere(differential.repere.clone()));
            continue;
        }
        let node = builder.add_device(differential, NodeType::Intermediate, &upstream);
        builder.device_nodes.insert(differential.repere.clone(), node);
    }

    for final_circuit in finals {
        if builder.is_known(&final_circuit.repere) {
            errors.push(BuildIssue::DuplicateRepere(final_circuit.repere.clone()));
            continue;
        }
        let parent = match &final_circuit.parent_repere {
            Some(parent) => match builder.device_nodes.get(parent) {
                Some(node) => node.clone(),
                None => {
                    errors.push(BuildIssue::UnresolvedParent {
                        repere: final_circuit.repere.clone(),
                        parent: parent.clone(),
                    });
                    continue;
                }
            },
            None => upstream.clone(),
        };
        builder.add_receptor(final_circuit, &parent);
    }

    for issue in &errors {
        tracing::warn!("{}", issue);
    }

    if builder.receptors.is_empty() {
        errors.push(BuildIssue::NoReceptors);
        return BuildResult::failed(errors);
    }

    tracing::info!(
        receptors = builder.receptors.len(),
        links = builder.links.len(),
        warnings = errors.len(),
        "circuit compiled"
    );

    BuildResult {
        success: true,
        circuit_input: Some(CircuitInput {
            name: options.name.clone(),
            description: options.description.clone(),
            nodes: builder.nodes,
            links: builder.links,
            states: builder.states,
            source_node_id: SOURCE_NODE_ID.to_string(),
            neutral_node_id: NEUTRAL_NODE_ID.to_string(),
            receptor_node_ids: builder.receptors,
        }),
        errors,
    }
}
