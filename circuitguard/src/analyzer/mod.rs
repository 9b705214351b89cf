//! Continuity analysis and cutoff diagnosis.

pub mod continuity;
pub mod cutoff;

pub use continuity::{find_path, PathResult};
pub use cutoff::{describe_cutoff, CutoffPoint};
