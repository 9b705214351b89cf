//! CircuitGuard - continuity checking for electrical panel schematics
//!
//! This library models an electrical installation (protective devices,
//! wiring, end loads) as a graph whose links conduct depending on the
//! position of breakers and switches. For every end load it answers "is it
//! powered?" and, when it is not, which device breaks continuity.
//!
//! # Quick Start
//!
//! ```no_run
//! use circuitguard::prelude::*;
//!
//! let parsed = ParsedSchematic::new(vec![
//!     ParsedComponent::new("Q1", "Main breaker", "63A").main_breaker(),
//!     ParsedComponent::new("Q2", "RCD", "40A / 30mA").differential(),
//!     ParsedComponent::new("Q2.1", "Lighting", "10A").with_parent("Q2"),
//! ]);
//!
//! let build = build_circuit_from_parsed(&parsed, &CompileOptions::default());
//! let circuit = build.circuit_input.unwrap().into_circuit();
//!
//! let result = simulate_circuit(&circuit, None);
//! for receptor in &result.results {
//!     println!("{}: powered = {}", receptor.receptor_name, receptor.is_powered);
//! }
//! ```
//!
//! # Entry points
//!
//! - [`build_circuit_from_parsed`]: device list to circuit graph
//! - [`simulate_circuit`]: per-receptor continuity and cutoff diagnosis
//! - [`compute_fingerprint`]: structural identity of a device list

pub mod analyzer;
pub mod compiler;
pub mod core;
pub mod fingerprint;
pub mod model;
pub mod simulation;

// Re-export main types
pub use analyzer::{describe_cutoff, find_path, CutoffPoint, PathResult};
pub use compiler::{
    build_circuit_from_parsed, BuildIssue, BuildResult, CompileOptions, ComponentKind,
    ExtractedComponent, ParsedComponent, ParsedSchematic,
};
pub use crate::core::{parse_override, CircuitGuardCore, CircuitGuardError};
pub use fingerprint::{compute_fingerprint, same_structure, Fingerprint};
pub use model::{
    build_graph, Circuit, CircuitError, CircuitInput, CircuitStats, ControlState, Link,
    LinkBehavior, Node, NodeType, StateAssignment, StoredCircuit,
};
pub use simulation::{simulate_circuit, ReceptorResult, SimulationResult};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        build_circuit_from_parsed, compute_fingerprint, simulate_circuit, Circuit,
        CircuitGuardCore, CircuitGuardError, CompileOptions, ControlState, Link, LinkBehavior,
        Node, NodeType, ParsedComponent, ParsedSchematic, ReceptorResult, SimulationResult,
    };
}
