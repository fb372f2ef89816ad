//! # Bridge
//!
//! A declarative DSL and execution engine that binds schema fields to HTTP endpoints and
//! in-process functions ("tools"), wired together through a dataflow graph rather than hand
//! written resolver code.
//!
//! ## Design principles
//!
//! - **One DSL, one AST**: `const`/`tool`/`define`/`bridge` blocks all share the same `Body`
//!   grammar — handles, wires, and at most one array-mapping block.
//! - **Lazy, deduped execution**: an [`ExecutionTree`] dispatches a tool or define instance only
//!   when something pulls on it, and only once per request even under diamond-shaped fan-in.
//! - **Pluggable everywhere a host might differ**: tool registry, cache store, and logger are
//!   all traits; the built-in implementations are defaults, not the only option.
//!
//! ## Main modules
//!
//! - [`lexer`] / [`token`]: tokenizes Bridge DSL source.
//! - [`ast`]: [`NodeRef`], [`Wire`], [`Body`], [`Bridge`], [`ToolDef`], [`DefineDef`],
//!   [`Instruction`] — the shared grammar every block type parses into.
//! - [`parser`]: [`parser::parse`] — DSL text to `Instruction[]`.
//! - [`resolve`]: [`EffectiveTool`] — applies `extends` chains and validates handle uniqueness.
//! - [`program`]: [`Program`] — a fully loaded, ready-to-execute instruction set.
//! - [`engine`]: [`ExecutionTree`], [`Shadow`] — the async orchestrator that walks a bridge's
//!   body, dispatching and memoizing tool/define instances per request.
//! - [`tools`]: [`Tool`] trait, [`ToolRegistry`], built-ins (`httpCall`, `std.*`).
//! - [`cache`]: [`Cache`] trait behind the built-in `httpCall` tool; [`InMemoryCache`].
//! - [`transform`]: [`BridgeTransform`] — the host-facing entry point that resolves a bridged
//!   root field or reports a call-through.
//! - [`serializer`]: [`serializer::serialize_program`] — the inverse of [`parser::parse`].
//! - [`trace`]: [`TraceCollector`], [`Trace`], [`TraceLevel`] — per-request tool invocation
//!   tracing.
//! - [`logger`]: [`Logger`] trait the engine logs through instead of calling `tracing` directly.
//! - [`error`]: [`ParseError`], [`ResolveError`], [`EngineError`], [`LoadError`].
//!
//! Key types are re-exported at crate root: `use bridge::{Program, ExecutionTree, BridgeTransform};`.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use bridge::{BridgeTransform, InstructionSource, TransformOptions};
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let instructions = InstructionSource::from_text(
//!     r#"
//!     bridge Query.greeting {
//!         output.text <- input.name || "world"
//!     }
//!     "#,
//! )
//! .unwrap();
//! let transform = BridgeTransform::new(instructions, TransformOptions::default());
//! let resolution = transform.resolve_root("Query", "greeting", json!({}), json!({})).await.unwrap();
//! # let _ = resolution;
//! # }
//! ```

pub mod ast;
pub mod cache;
pub mod engine;
pub mod error;
pub mod lexer;
pub mod logger;
pub mod parser;
pub mod program;
pub mod resolve;
pub mod serializer;
pub mod token;
pub mod tools;
pub mod trace;
pub mod transform;
pub mod value;

pub use ast::{Bridge, ConstDef, DefineDef, Instruction, NodeRef, ToolDef, Wire};
pub use cache::{Cache, CacheError, InMemoryCache};
pub use engine::{ExecutionTree, Shadow};
pub use error::{EngineError, LoadError, ParseError, ResolveError};
pub use logger::Logger;
pub use program::Program;
pub use resolve::EffectiveTool;
pub use serializer::serialize_program;
pub use tools::{Tool, ToolRegistry};
pub use trace::{Trace, TraceCollector, TraceLevel};
pub use transform::{apply_tracing, bridge_traces, BridgeTransform, FieldResolution, InstructionSource, TransformOptions, TracingSink};
