//! Host-facing entry point (spec §4.7, §6 `bridgeTransform`): builds one [`ExecutionTree`] per
//! request and resolves a bridged root field to a complete value, or reports that the field
//! isn't bridged so the host can fall back to its own resolver.
//!
//! The spec's two-step resolver wrapping — return an opaque tree from the root resolver, then
//! have every sub-field resolver call `response(path, isList)` against it — assumes a host schema
//! type this corpus has nothing to wrap (no GraphQL crate appears anywhere in it). Point 3
//! collapses here into the same call as points 1-2: `ExecutionTree::execute_field` already
//! builds a bridge's whole output object in one pass, so there is no sub-field resolver to stand
//! in for (see DESIGN.md, "Transform layer").

use std::sync::Arc;

use serde_json::Value;

use crate::ast::Instruction;
use crate::engine::ExecutionTree;
use crate::error::{EngineError, LoadError};
use crate::logger::{Logger, TracingLogger};
use crate::program::Program;
use crate::tools::ToolRegistry;
use crate::trace::{Trace, TraceCollector, TraceLevel};

/// Either a fixed, already-loaded instruction set or a per-request callable — the spec's
/// `instructionsOrSelector`, "either an array or a callable `(context) → Instruction[]` invoked
/// per request."
pub enum InstructionSource {
    Fixed(Arc<Program>),
    Selector(Box<dyn Fn(&Value) -> Result<Vec<Instruction>, LoadError> + Send + Sync>),
}

impl InstructionSource {
    pub fn from_text(source: &str) -> Result<Self, LoadError> {
        Ok(InstructionSource::Fixed(Arc::new(Program::load(source)?)))
    }

    pub fn from_instructions(instructions: Vec<Instruction>) -> Result<Self, LoadError> {
        Ok(InstructionSource::Fixed(Arc::new(Program::from_instructions(instructions)?)))
    }

    pub fn selector<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Result<Vec<Instruction>, LoadError> + Send + Sync + 'static,
    {
        InstructionSource::Selector(Box::new(f))
    }

    fn resolve(&self, context: &Value) -> Result<Arc<Program>, LoadError> {
        match self {
            InstructionSource::Fixed(program) => Ok(program.clone()),
            InstructionSource::Selector(select) => Ok(Arc::new(Program::from_instructions(select(context)?)?)),
        }
    }
}

/// `options = { tools?, contextMapper?, trace?, logger? }` from the spec's `bridgeTransform`
/// signature.
pub struct TransformOptions {
    pub tools: Arc<ToolRegistry>,
    pub context_mapper: Option<Box<dyn Fn(Value) -> Value + Send + Sync>>,
    pub trace: TraceLevel,
    pub logger: Arc<dyn Logger>,
}

impl Default for TransformOptions {
    fn default() -> Self {
        TransformOptions {
            tools: Arc::new(ToolRegistry::new()),
            context_mapper: None,
            trace: TraceLevel::Off,
            logger: Arc::new(TracingLogger),
        }
    }
}

/// The outcome of wrapping one root-field resolver call.
pub enum FieldResolution {
    /// No `Bridge` instruction matches `(type_name, field)`; the host's original resolver runs
    /// unchanged (spec §4.7 point 1, "opt-out").
    CallThrough,
    Resolved { value: Result<Value, EngineError>, traces: Vec<Trace> },
}

/// The `bridgeTransform(schema, instructionsOrSelector, options)` equivalent: not a schema
/// wrapper (there's no host schema type to wrap), just the runtime state `resolve_root` needs
/// on every request.
pub struct BridgeTransform {
    instructions: InstructionSource,
    options: TransformOptions,
}

impl BridgeTransform {
    pub fn new(instructions: InstructionSource, options: TransformOptions) -> Self {
        BridgeTransform { instructions, options }
    }

    /// Resolves one root field end to end (spec §4.7 points 1-2): look up the bridge, build an
    /// `ExecutionTree`, push `args`, run forced wires as part of the same evaluation, and resolve
    /// the field's value.
    pub async fn resolve_root(
        &self,
        type_name: &str,
        field: &str,
        args: Value,
        context: Value,
    ) -> Result<FieldResolution, LoadError> {
        let program = self.instructions.resolve(&context)?;
        if program.bridge(type_name, field).is_none() {
            return Ok(FieldResolution::CallThrough);
        }

        let context = match &self.options.context_mapper {
            Some(mapper) => mapper(context),
            None => context,
        };

        let trace = Arc::new(TraceCollector::new(self.options.trace));
        let tree = ExecutionTree::new(program, self.options.tools.clone(), self.options.logger.clone(), trace.clone());
        tree.push(args);
        tree.set_context(context);

        let value = tree.execute_field(type_name, field).await;
        Ok(FieldResolution::Resolved { value, traces: trace.traces() })
    }
}

/// `getBridgeTraces(context)`: pulls the traces a resolved field accumulated.
pub fn bridge_traces(resolution: &FieldResolution) -> &[Trace] {
    match resolution {
        FieldResolution::CallThrough => &[],
        FieldResolution::Resolved { traces, .. } => traces,
    }
}

/// `useBridgeTracing()`: a host plugin factory that copies `collector.traces` into the host's
/// response extensions under the key `traces`. Host-agnostic equivalent — implement this for
/// whatever extension mechanism the host exposes, then call `apply_tracing` after each resolved
/// field.
pub trait TracingSink: Send + Sync {
    fn record_traces(&self, traces: &[Trace]);
}

pub fn apply_tracing(sink: &dyn TracingSink, resolution: &FieldResolution) {
    sink.record_traces(bridge_traces(resolution));
}
