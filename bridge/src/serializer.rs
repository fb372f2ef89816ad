//! Inverse of the parser (spec §4.8): turns an already-loaded instruction set back into Bridge
//! DSL text. Always emits the brace form, even for instructions that happen to round-trip
//! through the legacy blank-line form on the way in (spec's own open question defers lossless
//! indentation round-trip; see DESIGN.md).
//!
//! Array-mapping blocks are reconstructed straight from `Body::array_mappings`: each entry
//! already carries its own target wire's key, its iterator alias, and its nested `Body`, so
//! reconstructing `target <- source[] as alias { ... }` is a direct recursive walk rather than
//! having to re-derive block membership from a flattened wire list.

use serde_json::Value;

use crate::ast::{
    Body, Bridge, ConstDef, DefineDef, FallbackExpr, FallbackOp, HandleBinding, HandleSource, Instruction, ModuleRef,
    NodeRef, SourceExpr, ToolDef, Wire, TOOL_TYPE, TRUNK_CONST, TRUNK_CONTEXT, TRUNK_INPUT, TRUNK_OUTPUT,
};

pub fn serialize_program(instructions: &[Instruction]) -> String {
    let mut out = String::from("version 1.0\n\n");

    for c in instructions.iter().filter_map(Instruction::as_const) {
        out.push_str(&serialize_const(c));
    }
    for t in instructions.iter().filter_map(Instruction::as_tool) {
        out.push_str(&serialize_tool(t));
    }
    for d in instructions.iter().filter_map(Instruction::as_define) {
        out.push_str(&serialize_define(d));
    }
    for b in instructions.iter().filter_map(Instruction::as_bridge) {
        out.push_str(&serialize_bridge(b));
    }
    out
}

fn serialize_const(c: &ConstDef) -> String {
    format!("const {} = {}\n\n", c.name, format_literal(&c.value))
}

fn serialize_tool(t: &ToolDef) -> String {
    let mut out = format!("tool {}", t.name);
    if let Some(parent) = &t.extends {
        out.push_str(&format!(" extends {parent}"));
    }
    out.push_str(" {\n");
    if let Some(native) = &t.r#fn {
        out.push_str(&format!("    fn {native}\n"));
    } else {
        out.push_str(&serialize_body(&t.body));
    }
    out.push_str("}\n\n");
    out
}

fn serialize_define(d: &DefineDef) -> String {
    format!("define {} {{\n{}}}\n\n", d.name, serialize_body(&d.body))
}

fn serialize_bridge(b: &Bridge) -> String {
    format!("bridge {}.{} {{\n{}}}\n\n", b.r#type, b.field, serialize_body(&b.body))
}

fn serialize_body(body: &Body) -> String {
    serialize_body_at(body, 1)
}

fn serialize_body_at(body: &Body, depth: usize) -> String {
    let pad = "    ".repeat(depth);
    let mut out = String::new();

    for handle in &body.handles {
        if let Some(line) = serialize_handle(handle) {
            out.push_str(&pad);
            out.push_str(&line);
            out.push('\n');
        }
    }

    let mapped_keys: std::collections::HashSet<&str> =
        body.array_mappings.iter().map(|m| m.target_key.as_str()).collect();

    for wire in &body.wires {
        if mapped_keys.contains(wire.target_key().as_str()) {
            continue;
        }
        out.push_str(&pad);
        out.push_str(&serialize_wire(body, wire));
        out.push('\n');
    }

    for mapping in &body.array_mappings {
        let Some(root_wire) = body.wires.iter().find(|w| w.target_key() == mapping.target_key) else {
            continue;
        };
        out.push_str(&pad);
        out.push_str(&serialize_wire(body, root_wire));
        out.push_str(&format!("[] as {} {{\n", mapping.alias));
        out.push_str(&serialize_body_at(&mapping.body, depth + 1));
        out.push_str(&pad);
        out.push_str("}\n");
    }

    out
}

fn serialize_handle(h: &HandleBinding) -> Option<String> {
    let (source_name, module) = match &h.source {
        HandleSource::Tool { name, module, .. } => (name.clone(), module.clone()),
        HandleSource::Define { name, .. } => (name.clone(), ModuleRef::SelfModule),
        HandleSource::Trunk(kind) => (kind.to_string(), ModuleRef::SelfModule),
        // Iterator aliases are never declared via `with`; they live only inside the
        // reconstructed array-mapping block itself.
        HandleSource::Element => return None,
    };
    let mut line = format!("with {source_name}");
    if h.alias != source_name {
        line.push_str(&format!(" as {}", h.alias));
    }
    if let ModuleRef::Named(m) = module {
        line.push_str(&format!(" from {m}"));
    }
    Some(line)
}

fn serialize_wire(body: &Body, wire: &Wire) -> String {
    match wire {
        Wire::Constant { value, to } => format!("{} = {}", serialize_node(body, to), format_literal(value)),
        Wire::Pull { from, to, force, fallbacks } => {
            let arrow = if *force { "<-!" } else { "<-" };
            format!(
                "{} {} {}{}",
                serialize_node(body, to),
                arrow,
                serialize_source_expr(body, from),
                serialize_fallbacks(body, fallbacks)
            )
        }
    }
}

fn serialize_source_expr(body: &Body, expr: &SourceExpr) -> String {
    match expr {
        SourceExpr::Ref(node) => serialize_node(body, node),
        SourceExpr::Pipe { hops, base } => {
            let prefix: Vec<&str> = hops.iter().map(|h| h.handle.as_str()).collect();
            format!("{}:{}", prefix.join(":"), serialize_source_expr(body, base))
        }
    }
}

fn serialize_fallbacks(body: &Body, fallbacks: &[FallbackOp]) -> String {
    let mut out = String::new();
    for op in fallbacks {
        match op {
            FallbackOp::NullCoalesce(lit) => {
                out.push_str(" || ");
                out.push_str(&format_literal(lit));
            }
            FallbackOp::ErrorRecover(expr) => {
                out.push_str(" ?? ");
                match expr {
                    FallbackExpr::Literal(lit) => out.push_str(&format_literal(lit)),
                    FallbackExpr::Ref(inner) => out.push_str(&serialize_source_expr(body, inner)),
                }
            }
        }
    }
    out
}

/// Reserved trunk names always round-trip through their literal keyword rather than through any
/// handle alias that happens to be bound to the same trunk (`with input as h` and bare `input`
/// parse to the identical `NodeRef`, so either spelling is equally correct; the keyword form
/// needs no handle lookup).
fn serialize_node(body: &Body, node: &NodeRef) -> String {
    let head = if let Some(alias) = &node.element {
        alias.clone()
    } else {
        match node.r#type.as_str() {
            TRUNK_INPUT => "input".to_string(),
            TRUNK_CONTEXT => "context".to_string(),
            TRUNK_CONST => "const".to_string(),
            TRUNK_OUTPUT => "output".to_string(),
            _ => alias_for(body, node).unwrap_or_else(|| node.field.clone()),
        }
    };
    let mut out = head;
    for seg in &node.path {
        out.push('.');
        out.push_str(&seg.to_string());
    }
    out
}

fn alias_for(body: &Body, node: &NodeRef) -> Option<String> {
    body.handles
        .iter()
        .find(|h| match &h.source {
            HandleSource::Tool { name, instance, .. } => {
                node.r#type == TOOL_TYPE && &node.field == name && node.instance == Some(*instance)
            }
            HandleSource::Define { name, instance } => {
                node.r#type == NodeRef::DEFINE_TYPE && &node.field == name && node.instance == Some(*instance)
            }
            HandleSource::Trunk(_) | HandleSource::Element => false,
        })
        .map(|h| h.alias.clone())
}

fn format_literal(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => format_string(s),
        Value::Array(items) => {
            format!("[{}]", items.iter().map(format_literal).collect::<Vec<_>>().join(", "))
        }
        Value::Object(map) => {
            let entries: Vec<String> = map.iter().map(|(k, v)| format!("{k}: {}", format_literal(v))).collect();
            format!("{{{}}}", entries.join(", "))
        }
    }
}

fn format_string(s: &str) -> String {
    if is_bare_path(s) || is_bare_identifier(s) {
        s.to_string()
    } else {
        quote(s)
    }
}

fn is_bare_path(s: &str) -> bool {
    s.starts_with('/') && !s.chars().any(|c| c.is_whitespace() || matches!(c, '{' | '}' | ',' | '(' | ')'))
}

fn is_bare_identifier(s: &str) -> bool {
    if s.is_empty() || s == "true" || s == "false" || s == "null" {
        return false;
    }
    let mut chars = s.chars();
    let first = chars.next().unwrap();
    (first.is_alphabetic() || first == '_') && chars.all(|c| c.is_alphanumeric() || c == '_')
}

fn quote(s: &str) -> String {
    let escaped = s.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n").replace('\t', "\\t");
    format!("\"{escaped}\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;
    use serde_json::json;

    #[test]
    fn round_trips_constant_and_pull_wires() {
        let source = r#"
            const greeting = "hi"
            bridge Query.echo {
                with input as i
                output.name <- i.name || "anon"
            }
        "#;
        let first = parser::parse(source).unwrap();
        let text = serialize_program(&first);
        let second = parser::parse(&text).unwrap();
        assert_eq!(format!("{first:?}"), format!("{second:?}"));
    }

    #[test]
    fn round_trips_tool_inheritance_and_native_fn() {
        let source = r#"
            tool base {
                baseUrl = "https://api.example.com"
            }
            tool upper {
                fn std.upperCase
            }
            bridge Query.go with upper
        "#;
        let first = parser::parse(source).unwrap();
        let text = serialize_program(&first);
        let second = parser::parse(&text).unwrap();
        assert_eq!(format!("{first:?}"), format!("{second:?}"));
    }

    #[test]
    fn round_trips_array_mapping_block() {
        let source = r#"
            bridge Query.listings {
                with input as i
                output.listings <- i.properties[] as p {
                    address <- p.streetAddress
                    price <- p.priceInCents
                }
            }
        "#;
        let first = parser::parse(source).unwrap();
        let text = serialize_program(&first);
        let second = parser::parse(&text).unwrap();
        assert_eq!(format!("{first:?}"), format!("{second:?}"));
    }

    /// **Scenario**: shadow scope — a mapping block nested inside another mapping's block
    /// round-trips as two properly-nested `[] as alias { ... }` blocks, not a flattened one.
    #[test]
    fn round_trips_nested_array_mapping_block() {
        let source = r#"
            bridge Query.groups {
                with input as i
                output.groups <- i.groups[] as g {
                    items <- g.items[] as it {
                        name <- it.name
                    }
                }
            }
        "#;
        let first = parser::parse(source).unwrap();
        let text = serialize_program(&first);
        let second = parser::parse(&text).unwrap();
        assert_eq!(format!("{first:?}"), format!("{second:?}"));
    }

    #[test]
    fn formats_literals_quoting_only_when_needed() {
        assert_eq!(format_literal(&json!("hello")), "hello");
        assert_eq!(format_literal(&json!("hello world")), "\"hello world\"");
        assert_eq!(format_literal(&json!("true")), "\"true\"");
        assert_eq!(format_literal(&json!(true)), "true");
        assert_eq!(format_literal(&json!(35000000)), "35000000");
        assert_eq!(format_literal(&json!("/users/{id}")), "/users/{id}");
    }
}
