//! Name resolution for tool handles (spec §4.6): "tool names with dots are looked up either as
//! nested namespaces (`{std: {upperCase}}`) or as flat dotted keys (`"hereapi.geocode"`); the
//! resolver tries flat first, then nested." Adapted from the teacher's `tools/registry.rs`
//! (`ToolRegistry` storing `Box<dyn Tool>` by name), generalized to a two-tier lookup.

use std::collections::HashMap;
use std::sync::Arc;

use super::Tool;

/// Holds every tool reachable by name: built-ins (`httpCall`, `std.upperCase`, ...) and whatever
/// a host registers for its own domain (`hereapi.geocode`).
#[derive(Default, Clone)]
pub struct ToolRegistry {
    flat: HashMap<String, Arc<dyn Tool>>,
    namespaced: HashMap<String, HashMap<String, Arc<dyn Tool>>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        ToolRegistry { flat: HashMap::new(), namespaced: HashMap::new() }
    }

    /// Registers a tool under a single flat dotted key, e.g. `"httpCall"` or
    /// `"hereapi.geocode"`.
    pub fn register(&mut self, name: impl Into<String>, tool: Arc<dyn Tool>) {
        self.flat.insert(name.into(), tool);
    }

    /// Registers a tool inside a namespace, e.g. `register_namespaced("std", "upperCase", ...)`
    /// for `std.upperCase`.
    pub fn register_namespaced(&mut self, namespace: impl Into<String>, name: impl Into<String>, tool: Arc<dyn Tool>) {
        self.namespaced.entry(namespace.into()).or_default().insert(name.into(), tool);
    }

    /// Resolves a dotted tool name, trying the flat table first, then splitting at the first
    /// `.` and consulting the namespaced table.
    pub fn resolve(&self, name: &str) -> Option<Arc<dyn Tool>> {
        if let Some(tool) = self.flat.get(name) {
            return Some(tool.clone());
        }
        let (namespace, rest) = name.split_once('.')?;
        self.namespaced.get(namespace)?.get(rest).cloned()
    }

    /// The built-in registry: `httpCall` plus the `std.*` pure helpers (spec §4.6).
    pub fn with_builtins(cache: Arc<dyn crate::cache::Cache<String, super::http_call::CachedResponse>>) -> Self {
        let mut registry = ToolRegistry::new();
        registry.register("httpCall", Arc::new(super::HttpCallTool::new(cache)));
        registry.register_namespaced("std", "upperCase", Arc::new(super::UpperCaseTool));
        registry.register_namespaced("std", "lowerCase", Arc::new(super::LowerCaseTool));
        registry.register_namespaced("std", "findObject", Arc::new(super::FindObjectTool));
        registry.register_namespaced("std", "pickFirst", Arc::new(super::PickFirstTool));
        registry.register_namespaced("std", "toArray", Arc::new(super::ToArrayTool));
        registry
    }
}
