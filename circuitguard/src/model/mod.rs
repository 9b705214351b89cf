//! Circuit Model
//!
//! Data types for an electrical installation, the adjacency view used by
//! the continuity analyzer, and the persisted row shape.

pub mod graph;
pub mod schema;
pub mod storage;

pub use graph::{build_graph, Adjacency, AdjacencyEntry};
pub use schema::*;
pub use storage::{StorageError, StoredCircuit};
