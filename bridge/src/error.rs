//! Error types for every fallible boundary in the engine, one `thiserror` enum per subsystem
//! (spec §7), matching the teacher's `CompilationError`/`CacheError`/`AgentError` split rather
//! than a single catch-all error type.

use thiserror::Error;

/// A load-time parse failure (spec §4.2/§6). Halts load; never recovered from inside the
/// engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{line}:{column}: {message}")]
pub struct ParseError {
    pub line: u32,
    pub column: u32,
    pub message: String,
}

impl ParseError {
    pub fn new(line: u32, column: u32, message: impl Into<String>) -> Self {
        ParseError { line, column, message: message.into() }
    }
}

/// Failures raised while materializing a tool's effective wire set (spec §4.3).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("duplicate handle name in effective tool: {0}")]
    DuplicateHandle(String),
    #[error("reference to undeclared handle: {0}")]
    UndeclaredHandle(String),
    #[error("tool '{0}' extends unknown tool '{1}'")]
    UnknownParent(String, String),
    #[error("extends chain for tool '{0}' contains a cycle")]
    InheritanceCycle(String),
    #[error("bridge references unknown define '{0}'")]
    UnknownDefine(String),
}

/// Runtime resolution failures (spec §7 "Resolution error"): the error type threaded through
/// wire evaluation and, absent a `??` fallback, surfaced to the host per field nullability.
#[derive(Debug, Error, Clone)]
pub enum EngineError {
    #[error("tool not found: {0}")]
    ToolNotFound(String),
    #[error("tool '{tool}' failed: {message}")]
    ToolFailed { tool: String, message: String },
    #[error("path '{path}' missing on non-nullable value")]
    PathMissing { path: String },
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: &'static str, found: String },
    #[error("http error: {0}")]
    Http(String),
    #[error("cache error: {0}")]
    Cache(String),
    #[error("execution cancelled")]
    Cancelled,
}

impl From<crate::cache::CacheError> for EngineError {
    fn from(e: crate::cache::CacheError) -> Self {
        EngineError::Cache(e.to_string())
    }
}

/// Everything that can go wrong turning DSL text into a runnable [`crate::program::Program`]
/// (spec §6 "load"): tokenizing/parsing, then inheritance + handle-uniqueness resolution.
#[derive(Debug, Error, Clone)]
pub enum LoadError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_display_includes_position() {
        let e = ParseError::new(3, 7, "duplicate handle \"h\"");
        assert_eq!(e.to_string(), "3:7: duplicate handle \"h\"");
    }

    #[test]
    fn resolve_error_display_variants() {
        assert_eq!(
            ResolveError::DuplicateHandle("h".into()).to_string(),
            "duplicate handle name in effective tool: h"
        );
        assert_eq!(
            ResolveError::UnknownParent("child".into(), "parent".into()).to_string(),
            "tool 'child' extends unknown tool 'parent'"
        );
    }

    #[test]
    fn engine_error_display_variants() {
        assert_eq!(EngineError::ToolNotFound("geocode".into()).to_string(), "tool not found: geocode");
        assert_eq!(
            EngineError::ToolFailed { tool: "geocode".into(), message: "timeout".into() }.to_string(),
            "tool 'geocode' failed: timeout"
        );
        assert_eq!(EngineError::Cancelled.to_string(), "execution cancelled");
    }
}
