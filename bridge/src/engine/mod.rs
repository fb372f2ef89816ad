//! The runtime half of the crate (spec §4.5-§4.7): turns a loaded [`crate::program::Program`]
//! into a live [`ExecutionTree`] that a host pushes arguments into and reads field values back
//! out of.

mod execution_tree;
mod shadow;
mod wire_eval;

pub use execution_tree::{ExecutionTree, Scope};
pub use shadow::Shadow;
