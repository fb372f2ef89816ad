//! Loads parsed DSL text into a runnable program: resolves tool inheritance, validates handle
//! uniqueness on every body (not just tool `extends` chains), and disambiguates `with <name>`
//! handles between a `ToolDef` and a `DefineDef` sharing the same syntax (spec §4.1 point 1:
//! "`<source>` is one of the reserved names or a dotted tool name or a `define` name" — nothing
//! in the grammar itself tells them apart, so this is decided once every top-level name is
//! known, after parsing).

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use crate::ast::{
    Body, Bridge, ConstDef, DefineDef, FallbackExpr, FallbackOp, HandleSource, Instruction, ModuleRef, NodeRef,
    SourceExpr, ToolDef, Wire, TOOL_TYPE,
};
use crate::error::LoadError;
use crate::parser;
use crate::resolve::{self, EffectiveTool};

/// A fully loaded, ready-to-execute program: every `ToolDef` has its `extends` chain applied,
/// every body's handle aliases are confirmed unique, and every `with` handle is tagged as
/// addressing a tool or a define.
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub bridges: HashMap<(String, String), Bridge>,
    pub tools: HashMap<String, EffectiveTool>,
    pub defines: HashMap<String, DefineDef>,
    pub consts: HashMap<String, Value>,
}

impl Program {
    pub fn load(source: &str) -> Result<Program, LoadError> {
        let instructions = parser::parse(source)?;
        Program::from_instructions(instructions)
    }

    /// Builds a program from an already-parsed instruction set, running the same
    /// reclassify/resolve/validate pipeline `load` runs on freshly parsed text. Used by
    /// `transform.rs` for the `instructionsOrSelector` callable variant, which hands back
    /// instructions a host built in memory rather than DSL source.
    pub fn from_instructions(mut instructions: Vec<Instruction>) -> Result<Program, LoadError> {
        reclassify_defines(&mut instructions);

        let mut tool_defs = HashMap::new();
        let mut defines = HashMap::new();
        let mut consts = HashMap::new();
        let mut bridges = HashMap::new();

        for instruction in instructions {
            match instruction {
                Instruction::Tool(t) => {
                    tool_defs.insert(t.name.clone(), t);
                }
                Instruction::Define(d) => {
                    defines.insert(d.name.clone(), d);
                }
                Instruction::Const(c) => {
                    consts.insert(c.name.clone(), c.value);
                }
                Instruction::Bridge(b) => {
                    bridges.insert((b.r#type.clone(), b.field.clone()), b);
                }
            }
        }

        let tools = resolve::resolve_all(&tool_defs)?;
        for bridge in bridges.values() {
            resolve::check_duplicate_handles(&bridge.body.handles)?;
        }
        for define in defines.values() {
            resolve::check_duplicate_handles(&define.body.handles)?;
        }

        Ok(Program { bridges, tools, defines, consts })
    }

    pub fn bridge(&self, type_name: &str, field: &str) -> Option<&Bridge> {
        self.bridges.get(&(type_name.to_string(), field.to_string()))
    }
}

/// Every `with <name>` handle parses as a tool reference by default (see `parser.rs`); this
/// retags the ones whose name only matches a declared `define`, plus every `NodeRef` elsewhere
/// in the same body that addresses that handle's `(name, instance)`.
fn reclassify_defines(instructions: &mut [Instruction]) {
    let tool_names: HashSet<String> = instructions.iter().filter_map(Instruction::as_tool).map(|t| t.name.clone()).collect();
    let define_names: HashSet<String> =
        instructions.iter().filter_map(Instruction::as_define).map(|d| d.name.clone()).collect();

    for instruction in instructions.iter_mut() {
        let body = match instruction {
            Instruction::Bridge(b) => &mut b.body,
            Instruction::Tool(t) => &mut t.body,
            Instruction::Define(d) => &mut d.body,
            Instruction::Const(_) => continue,
        };
        reclassify_body(body, &tool_names, &define_names);
    }
}

fn reclassify_body(body: &mut Body, tool_names: &HashSet<String>, define_names: &HashSet<String>) {
    let mut promote: HashSet<(String, u32)> = HashSet::new();
    for h in &body.handles {
        if let HandleSource::Tool { name, instance, module: ModuleRef::SelfModule } = &h.source {
            if !tool_names.contains(name) && define_names.contains(name) {
                promote.insert((name.clone(), *instance));
            }
        }
    }
    if promote.is_empty() {
        return;
    }

    for h in &mut body.handles {
        let matches = matches!(&h.source, HandleSource::Tool { name, instance, .. } if promote.contains(&(name.clone(), *instance)));
        if matches {
            if let HandleSource::Tool { name, instance, .. } = h.source.clone() {
                h.source = HandleSource::Define { name, instance };
            }
        }
    }

    for wire in &mut body.wires {
        rewrite_ref(wire.to_mut(), &promote);
        if let Wire::Pull { from, fallbacks, .. } = wire {
            rewrite_source_expr(from, &promote);
            for op in fallbacks.iter_mut() {
                if let FallbackOp::ErrorRecover(FallbackExpr::Ref(inner)) = op {
                    rewrite_source_expr(inner, &promote);
                }
            }
        }
    }
}

fn rewrite_ref(node: &mut NodeRef, promote: &HashSet<(String, u32)>) {
    if node.r#type == TOOL_TYPE {
        if let Some(instance) = node.instance {
            if promote.contains(&(node.field.clone(), instance)) {
                node.r#type = NodeRef::DEFINE_TYPE.to_string();
            }
        }
    }
}

fn rewrite_source_expr(expr: &mut SourceExpr, promote: &HashSet<(String, u32)>) {
    match expr {
        SourceExpr::Ref(node) => rewrite_ref(node, promote),
        SourceExpr::Pipe { base, .. } => rewrite_source_expr(base, promote),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_handle_referencing_a_define_is_reclassified() {
        let source = r#"
            define enrich {
                output.tag = "x"
            }
            bridge Query.field {
                with enrich as e
                output.tag <- e.tag
            }
        "#;
        let program = Program::load(source).unwrap();
        let bridge = program.bridge("Query", "field").unwrap();
        let handle = bridge.body.handles.iter().find(|h| h.alias == "e").unwrap();
        assert!(matches!(handle.source, HandleSource::Define { .. }));

        let wire = bridge.body.wires.iter().find(|w| w.target_key() == "tag").unwrap();
        if let Wire::Pull { from: SourceExpr::Ref(node), .. } = wire {
            assert_eq!(node.r#type, NodeRef::DEFINE_TYPE);
        } else {
            panic!("expected pull wire");
        }
    }

    #[test]
    fn with_handle_referencing_a_real_tool_stays_a_tool() {
        let source = r#"
            tool geocode {
                output.lat = 1
            }
            bridge Query.field with geocode
        "#;
        let program = Program::load(source).unwrap();
        let bridge = program.bridge("Query", "field").unwrap();
        let handle = &bridge.body.handles[0];
        assert!(matches!(handle.source, HandleSource::Tool { .. }));
    }

    #[test]
    fn duplicate_handle_across_whole_body_is_rejected() {
        let source = r#"
            bridge Query.field {
                with input as h
                with const as h
            }
        "#;
        let err = Program::load(source).unwrap_err();
        assert!(matches!(err, LoadError::Resolve(_)));
    }
}
