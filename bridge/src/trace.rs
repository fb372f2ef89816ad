//! Per-request tool-invocation tracing (spec §4.7): "If a trace level is configured
//! (`off`/`basic`/`full`), a `TraceCollector` accumulates one record per tool invocation."

use std::sync::Mutex;

use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TraceLevel {
    #[default]
    Off,
    Basic,
    Full,
}

/// One tool invocation record. `input`/`output` are only populated at `TraceLevel::Full`.
#[derive(Debug, Clone, Serialize)]
pub struct Trace {
    pub tool: String,
    pub r#fn: Option<String>,
    pub started_at_ms: i64,
    pub duration_ms: u64,
    pub error: Option<String>,
    pub input: Option<Value>,
    pub output: Option<Value>,
}

/// Accumulates [`Trace`] records for one request. Cheap to clone (shares the inner `Mutex`'d
/// `Vec` via `Arc` at the `ExecutionTree` level); collection is a no-op at `TraceLevel::Off`.
#[derive(Debug, Default)]
pub struct TraceCollector {
    level: TraceLevel,
    traces: Mutex<Vec<Trace>>,
}

impl TraceCollector {
    pub fn new(level: TraceLevel) -> Self {
        TraceCollector { level, traces: Mutex::new(Vec::new()) }
    }

    pub fn level(&self) -> TraceLevel {
        self.level
    }

    /// Records one invocation. `input`/`output` are dropped unless the collector is at
    /// `TraceLevel::Full`; nothing is recorded at all at `TraceLevel::Off`.
    pub fn record(
        &self,
        tool: impl Into<String>,
        r#fn: Option<String>,
        started_at_ms: i64,
        duration_ms: u64,
        error: Option<String>,
        input: Option<Value>,
        output: Option<Value>,
    ) {
        if self.level == TraceLevel::Off {
            return;
        }
        let (input, output) = if self.level == TraceLevel::Full { (input, output) } else { (None, None) };
        self.traces
            .lock()
            .expect("trace collector lock poisoned")
            .push(Trace { tool: tool.into(), r#fn, started_at_ms, duration_ms, error, input, output });
    }

    pub fn traces(&self) -> Vec<Trace> {
        self.traces.lock().expect("trace collector lock poisoned").clone()
    }
}
