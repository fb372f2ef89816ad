//! Built-in tool library (spec §4.6/§7): `httpCall` plus small pure `std.*` helpers, behind a
//! shared `Tool` trait, adapted from the teacher's `tools/trait.rs` + `tools/registry.rs` split.

mod http_call;
mod registry;
mod std_tools;
mod r#trait;

pub use http_call::{CachedResponse, HttpCallTool};
pub use r#trait::Tool;
pub use registry::ToolRegistry;
pub use std_tools::{FindObjectTool, LowerCaseTool, PickFirstTool, ToArrayTool, UpperCaseTool};
