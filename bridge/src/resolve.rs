//! Tool inheritance resolution (spec §4.3): walks a `ToolDef`'s `extends` chain root-first and
//! materializes its effective wire set using full target-path override — the historical bug
//! being fixed here replaced only the first matching wire; this replaces *all* of them.

use std::collections::{HashMap, HashSet};

use crate::ast::{Body, ToolDef, Wire};
use crate::error::ResolveError;

/// A `ToolDef` after inheritance has been fully applied: its final `wires`/`handles` are ready
/// for the engine to schedule without any further knowledge of `extends`.
#[derive(Debug, Clone)]
pub struct EffectiveTool {
    pub name: String,
    pub r#fn: Option<String>,
    pub body: Body,
}

/// Resolves every `ToolDef` in `tools` (keyed by name) against its `extends` chain.
pub fn resolve_all(tools: &HashMap<String, ToolDef>) -> Result<HashMap<String, EffectiveTool>, ResolveError> {
    let mut out = HashMap::new();
    for name in tools.keys() {
        let resolved = resolve_one(name, tools, &mut Vec::new())?;
        out.insert(name.clone(), resolved);
    }
    Ok(out)
}

fn resolve_one(
    name: &str,
    tools: &HashMap<String, ToolDef>,
    visiting: &mut Vec<String>,
) -> Result<EffectiveTool, ResolveError> {
    if visiting.iter().any(|v| v == name) {
        return Err(ResolveError::InheritanceCycle(name.to_string()));
    }
    let def = tools
        .get(name)
        .ok_or_else(|| ResolveError::UnknownParent(name.to_string(), name.to_string()))?;

    visiting.push(name.to_string());
    let mut chain_wires: Vec<Wire> = Vec::new();
    let mut chain_handles = Vec::new();

    if let Some(parent) = &def.extends {
        if !tools.contains_key(parent) {
            return Err(ResolveError::UnknownParent(name.to_string(), parent.clone()));
        }
        let parent_resolved = resolve_one(parent, tools, visiting)?;
        chain_wires = parent_resolved.body.wires;
        chain_handles = parent_resolved.body.handles;
    }
    visiting.pop();

    // Full target-path override: for every descendant wire, drop *all* accumulator wires
    // sharing its target key, then append (spec I4 / §4.3).
    for wire in &def.body.wires {
        let key = wire.target_key();
        chain_wires.retain(|w| w.target_key() != key);
        chain_wires.push(wire.clone());
    }
    chain_handles.extend(def.body.handles.iter().cloned());

    check_duplicate_handles(&chain_handles)?;

    let mut body = def.body.clone();
    body.wires = chain_wires;
    body.handles = chain_handles;

    Ok(EffectiveTool { name: name.to_string(), r#fn: def.r#fn.clone(), body })
}

/// Every NodeRef inside a body resolves to exactly one declared handle (spec I1); a body with
/// two handles sharing an alias is rejected outright, matching seed scenario 6 (`with input as
/// h` followed by `with const as h`).
pub fn check_duplicate_handles(handles: &[crate::ast::HandleBinding]) -> Result<(), ResolveError> {
    let mut seen = HashSet::new();
    for h in handles {
        if !seen.insert(h.alias.clone()) {
            return Err(ResolveError::DuplicateHandle(h.alias.clone()));
        }
    }
    Ok(())
}
