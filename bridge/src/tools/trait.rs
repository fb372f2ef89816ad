use async_trait::async_trait;
use serde_json::Value;

use crate::error::EngineError;

/// A callable the engine can dispatch a wired-together input object to. Unlike the spec's
/// literal "map in, map out" wording, scenario 1 (plain-string passthrough through
/// `std.upperCase`) shows the domain is the open value type, not strictly an object — so `input`
/// and the return type are both `Value` (spec §9 "Dynamic typing").
///
/// Pure helpers (`upperCase`, `pickFirst`, ...) and the caching `httpCall` client implement the
/// same trait; the engine never distinguishes them beyond this boundary (spec §4.6 "Suspension
/// points ... pure built-in tools may execute synchronously").
#[async_trait]
pub trait Tool: Send + Sync {
    /// Invokes the tool against its already-merged input object (or scalar, for passthrough).
    async fn call(&self, input: Value) -> Result<Value, EngineError>;
}
