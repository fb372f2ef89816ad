//! The async orchestrator (spec §4.5/§4.6/§6): walks a bridge's body on demand, dispatching
//! tool/define instances lazily and deduplicating diamond-shaped dependencies per request via a
//! shared promise table, the way the teacher's `StateGraph` runtime memoizes node evaluation
//! futures across concurrent readers of the same state.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::future::{BoxFuture, FutureExt, Shared};
use serde_json::Value;

use crate::ast::{
    Body, HandleSource, NodeRef, PipeHop, SourceExpr, Wire, TOOL_TYPE, TRUNK_CONST, TRUNK_CONTEXT, TRUNK_INPUT,
    TRUNK_OUTPUT,
};
use crate::error::EngineError;
use crate::logger::Logger;
use crate::program::Program;
use crate::tools::ToolRegistry;
use crate::trace::TraceCollector;
use crate::value;

use super::shadow::Shadow;
use super::wire_eval;

/// `(field, instance, shadow index path)`. Module is not part of the key: cross-module tool
/// dispatch isn't exercised by anything this engine needs to run, so names are resolved within
/// the single loaded program. The index path is every ancestor mapping level's element index,
/// outermost first (empty at the root scope); it keeps per-element dependency dispatch (a tool
/// invoked from inside an array-mapping block) from colliding across elements — including across
/// different elements of an *outer* block when mappings nest — while still deduping true diamond
/// dependencies at any one shadow depth.
type MemoKey = (String, u32, Vec<usize>);
type SharedResult = Shared<BoxFuture<'static, Result<Value, EngineError>>>;

/// Everything a node evaluation needs beyond `ExecutionTree` itself: which body's handles/wires
/// are in scope, what that body's own input trunk resolves to, and the active array-mapping
/// shadow (if any).
#[derive(Clone)]
pub struct Scope {
    pub input: Value,
    pub shadow: Arc<Shadow>,
    pub body: Arc<Body>,
}

impl Scope {
    fn root(body: Arc<Body>, input: Value) -> Self {
        Scope { input, shadow: Arc::new(Shadow::Root), body }
    }
}

pub struct ExecutionTree {
    program: Arc<Program>,
    tools: Arc<ToolRegistry>,
    logger: Arc<dyn Logger>,
    trace: Arc<TraceCollector>,
    input: Mutex<Value>,
    context: Mutex<Value>,
    memo: DashMap<MemoKey, SharedResult>,
}

impl ExecutionTree {
    pub fn new(program: Arc<Program>, tools: Arc<ToolRegistry>, logger: Arc<dyn Logger>, trace: Arc<TraceCollector>) -> Arc<Self> {
        Arc::new(ExecutionTree {
            program,
            tools,
            logger,
            trace,
            input: Mutex::new(Value::Object(Default::default())),
            context: Mutex::new(Value::Object(Default::default())),
            memo: DashMap::new(),
        })
    }

    /// Sets the request's root input trunk (the bridge `ROOT`'s `input`, spec §4.5).
    pub fn push(&self, args: Value) {
        *self.input.lock().expect("input lock poisoned") = args;
    }

    pub fn set_context(&self, context: Value) {
        *self.context.lock().expect("context lock poisoned") = context;
    }

    pub fn traces(&self) -> Vec<crate::trace::Trace> {
        self.trace.traces()
    }

    /// Evaluates one schema field's bridge end to end.
    pub async fn execute_field(self: Arc<Self>, type_name: &str, field: &str) -> Result<Value, EngineError> {
        let bridge = self
            .program
            .bridge(type_name, field)
            .cloned()
            .ok_or_else(|| EngineError::ToolNotFound(format!("{type_name}.{field}")))?;
        let root_input = self.input.lock().expect("input lock poisoned").clone();
        let body = Arc::new(bridge.body);
        let scope = Scope::root(body.clone(), root_input);

        if let Some(alias) = &bridge.passthrough {
            let handle = body
                .handles
                .iter()
                .find(|h| &h.alias == alias)
                .ok_or_else(|| EngineError::ToolNotFound(alias.clone()))?;
            let node = handle_source_node(&handle.source);
            return self.eval_node(&node, scope).await;
        }

        self.eval_body_output(scope).await
    }

    /// Builds a body's own output object: plain field wires plus zero or more array-mapping
    /// blocks, each recursed into as its own `Body` subtree rather than a flattened wire list, so
    /// a block nested inside another resolves against its own handles and shadow level (spec
    /// §4.4 "shadow scope chain"). Also fires every forced dependency in the body regardless of
    /// whether the output needs it (spec §4.5 "forced wires").
    ///
    /// Self-recursive (an array mapping's element body is evaluated by calling this again), so
    /// the future is boxed the same way `eval_source_expr` is: a directly self-recursive `async
    /// fn` has no statically known size.
    fn eval_body_output(self: Arc<Self>, scope: Scope) -> BoxFuture<'static, Result<Value, EngineError>> {
        async move {
            let (own_wires, by_dependency) = wire_eval::partition_wires(&scope.body);

            for (key, wires) in &by_dependency {
                if wires.iter().any(|w| w.is_forced()) {
                    let tree = self.clone();
                    let key = key.clone();
                    let scope = scope.clone();
                    tokio::spawn(async move {
                        if let Err(e) = tree.clone().dispatch_dependency(&key.0, &key.1, key.2, scope).await {
                            tree.logger.error(&format!("forced dependency {}.{}#{} failed: {e}", key.0, key.1, key.2));
                        }
                    });
                }
            }

            let mapped_keys: HashSet<&str> =
                scope.body.array_mappings.iter().map(|m| m.target_key.as_str()).collect();

            let mut output = Value::Object(Default::default());

            for wire in &own_wires {
                if mapped_keys.contains(wire.target_key().as_str()) {
                    continue;
                }
                let value = self.clone().eval_wire(wire, scope.clone()).await?;
                wire_eval::merge_into(&mut output, &wire.to().path, value);
            }

            for mapping in &scope.body.array_mappings {
                let Some(root_wire) = own_wires.iter().find(|w| w.target_key() == mapping.target_key) else {
                    continue;
                };
                let source = self.clone().eval_wire(root_wire, scope.clone()).await?;
                let items = source.as_array().cloned().unwrap_or_default();
                let element_body = Arc::new((*mapping.body).clone());
                let mut mapped = Vec::with_capacity(items.len());
                for (index, item) in items.into_iter().enumerate() {
                    let child_shadow = scope.shadow.push(mapping.alias.clone(), item, index);
                    let child_scope = Scope { input: scope.input.clone(), shadow: child_shadow, body: element_body.clone() };
                    mapped.push(self.clone().eval_body_output(child_scope).await?);
                }
                wire_eval::merge_into(&mut output, &root_wire.to().path, Value::Array(mapped));
            }

            Ok(output)
        }
        .boxed()
    }

    async fn eval_wire(self: Arc<Self>, wire: &Wire, scope: Scope) -> Result<Value, EngineError> {
        match wire {
            Wire::Constant { value, .. } => Ok(value.clone()),
            Wire::Pull { from, fallbacks, .. } => {
                let outcome = self.clone().eval_source_expr(from.clone(), scope.clone()).await;
                let tree = self.clone();
                wire_eval::apply_fallbacks(outcome, fallbacks, move |expr| {
                    let tree = tree.clone();
                    let expr = expr.clone();
                    let scope = scope.clone();
                    async move { tree.eval_source_expr(expr, scope).await }
                })
                .await
            }
        }
    }

    /// Owned-`Arc<Self>`-by-value recursion so the boxed future is `'static`: needed both to
    /// break the mutual recursion with `eval_node`/`dispatch_dependency` and because pipe hops
    /// and forced dispatch already require `'static` futures elsewhere in this module.
    fn eval_source_expr(self: Arc<Self>, expr: SourceExpr, scope: Scope) -> BoxFuture<'static, Result<Value, EngineError>> {
        async move {
            match expr {
                SourceExpr::Ref(node) => self.eval_node(&node, scope).await,
                SourceExpr::Pipe { hops, base } => {
                    let mut value = self.clone().eval_source_expr(*base, scope).await?;
                    for hop in hops {
                        value = self.clone().run_pipe_hop(&hop, value).await?;
                    }
                    Ok(value)
                }
            }
        }
        .boxed()
    }

    /// A pipe hop dispatches its named tool directly against the upstream value as its sole
    /// input, bypassing that tool's own wire-based argument construction entirely (DESIGN.md,
    /// "pipe semantics").
    async fn run_pipe_hop(self: Arc<Self>, hop: &PipeHop, input: Value) -> Result<Value, EngineError> {
        self.run_tool(&hop.handle, input).await
    }

    async fn eval_node(self: Arc<Self>, node: &NodeRef, scope: Scope) -> Result<Value, EngineError> {
        if let Some(alias) = &node.element {
            return match scope.shadow.resolve(alias) {
                Some(value) => Ok(value::get_path(value, &node.path).cloned().unwrap_or(Value::Null)),
                None => Err(EngineError::PathMissing { path: format!("<element:{alias}>") }),
            };
        }

        match node.r#type.as_str() {
            TRUNK_INPUT => Ok(value::get_path(&scope.input, &node.path).cloned().unwrap_or(Value::Null)),
            TRUNK_CONTEXT => {
                let context = self.context.lock().expect("context lock poisoned").clone();
                Ok(value::get_path(&context, &node.path).cloned().unwrap_or(Value::Null))
            }
            TRUNK_CONST => {
                let Some(first) = node.path.first() else { return Ok(Value::Null) };
                let name = first.to_string();
                let base = self.program.consts.get(&name).cloned().unwrap_or(Value::Null);
                Ok(value::get_path(&base, &node.path[1..]).cloned().unwrap_or(Value::Null))
            }
            TRUNK_OUTPUT => Ok(Value::Null),
            _ => {
                let Some(instance) = node.instance else { return Ok(Value::Null) };
                let value = self.clone().dispatch_dependency(&node.r#type, &node.field, instance, scope).await?;
                Ok(value::get_path(&value, &node.path).cloned().unwrap_or(Value::Null))
            }
        }
    }

    /// Resolves one dependency (a tool or define instance) the way the calling body wires it up,
    /// deduping concurrent/repeat requests for the same `(field, instance)` at the same shadow
    /// depth behind a shared future (spec §4.6 "diamond dependencies run once").
    async fn dispatch_dependency(
        self: Arc<Self>,
        node_type: &str,
        field: &str,
        instance: u32,
        scope: Scope,
    ) -> Result<Value, EngineError> {
        let memo_key: MemoKey = (field.to_string(), instance, scope.shadow.index_path());

        // Clone the shared future out and drop the dashmap `Ref` before awaiting it: holding a
        // shard read-lock across an `.await` would deadlock against another task's `.entry(...)`
        // write on the same shard under the multi-threaded runtime.
        let hit = self.memo.get(&memo_key).map(|r| r.value().clone());
        if let Some(fut) = hit {
            return fut.await;
        }

        let (_, by_dependency) = wire_eval::partition_wires(&scope.body);
        let arg_wires = by_dependency
            .get(&(node_type.to_string(), field.to_string(), instance))
            .cloned()
            .unwrap_or_default();
        let mut input = Value::Object(Default::default());
        for wire in arg_wires {
            let value = self.clone().eval_wire(wire, scope.clone()).await?;
            wire_eval::merge_into(&mut input, &wire.to().path, value);
        }

        let tree = self.clone();
        let node_type_owned = node_type.to_string();
        let field_owned = field.to_string();
        let future = async move { tree.run_dependency(&node_type_owned, &field_owned, input).await }.boxed().shared();

        let shared = match self.memo.entry(memo_key) {
            Entry::Occupied(existing) => existing.get().clone(),
            Entry::Vacant(slot) => {
                slot.insert(future.clone());
                future
            }
        };
        shared.await
    }

    async fn run_dependency(self: Arc<Self>, node_type: &str, field: &str, input: Value) -> Result<Value, EngineError> {
        if node_type == TOOL_TYPE {
            self.run_tool(field, input).await
        } else {
            self.run_define(field, input).await
        }
    }

    async fn run_tool(self: Arc<Self>, name: &str, input: Value) -> Result<Value, EngineError> {
        let started = chrono::Utc::now();
        let effective = self.program.tools.get(name).cloned();
        let native_fn = effective.as_ref().and_then(|t| t.r#fn.clone());

        let result = if let Some(native) = &native_fn {
            match self.tools.resolve(native) {
                Some(tool) => tool.call(input.clone()).await,
                None => Err(EngineError::ToolNotFound(native.clone())),
            }
        } else if let Some(effective) = &effective {
            let body = Arc::new(effective.body.clone());
            self.clone().eval_body_output(Scope::root(body, input.clone())).await
        } else {
            match self.tools.resolve(name) {
                Some(tool) => tool.call(input.clone()).await,
                None => Err(EngineError::ToolNotFound(name.to_string())),
            }
        };

        let duration_ms = (chrono::Utc::now() - started).num_milliseconds().max(0) as u64;
        self.trace.record(
            name,
            native_fn,
            started.timestamp_millis(),
            duration_ms,
            result.as_ref().err().map(|e| e.to_string()),
            Some(input),
            result.as_ref().ok().cloned(),
        );
        if let Err(e) = &result {
            self.logger.warn(&format!("tool '{name}' failed: {e}"));
        }
        result
    }

    async fn run_define(self: Arc<Self>, name: &str, input: Value) -> Result<Value, EngineError> {
        let define = self
            .program
            .defines
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::ToolNotFound(name.to_string()))?;
        let body = Arc::new(define.body);
        self.eval_body_output(Scope::root(body, input)).await
    }
}

fn handle_source_node(source: &HandleSource) -> NodeRef {
    match source {
        HandleSource::Tool { name, instance, .. } => NodeRef::tool(name.clone(), *instance, vec![]),
        HandleSource::Define { name, instance } => NodeRef::define(name.clone(), *instance, vec![]),
        HandleSource::Trunk(kind) => NodeRef::trunk(kind, vec![]),
        HandleSource::Element => unreachable!("an array-mapping iterator alias is never a bridge's passthrough handle"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::NoopLogger;
    use crate::program::Program;
    use crate::tools::ToolRegistry;
    use crate::trace::TraceLevel;
    use serde_json::json;

    fn tree(source: &str) -> Arc<ExecutionTree> {
        let program = Arc::new(Program::load(source).unwrap());
        let mut registry = ToolRegistry::new();
        registry.register_namespaced("std", "upperCase", std::sync::Arc::new(crate::tools::UpperCaseTool));
        ExecutionTree::new(program, Arc::new(registry), Arc::new(NoopLogger), Arc::new(TraceCollector::new(TraceLevel::Off)))
    }

    #[tokio::test]
    async fn constant_wire_resolves_directly() {
        let tree = tree(
            r#"
            bridge Query.greeting {
                output.text = "hi"
            }
            "#,
        );
        let result = tree.execute_field("Query", "greeting").await.unwrap();
        assert_eq!(result, json!({"text": "hi"}));
    }

    #[tokio::test]
    async fn input_trunk_round_trips_through_pull_wire() {
        let tree = tree(
            r#"
            bridge Query.echo {
                output.name <- input.name
            }
            "#,
        );
        tree.push(json!({"name": "Ada"}));
        let result = tree.execute_field("Query", "echo").await.unwrap();
        assert_eq!(result, json!({"name": "Ada"}));
    }

    #[tokio::test]
    async fn null_coalesce_fallback_applies_on_missing_input() {
        let tree = tree(
            r#"
            bridge Query.echo {
                output.name <- input.name || "anon"
            }
            "#,
        );
        tree.push(json!({}));
        let result = tree.execute_field("Query", "echo").await.unwrap();
        assert_eq!(result, json!({"name": "anon"}));
    }

    /// **Scenario**: passthrough — `bridge Query.format with std.upperCase` fed `"hello"`
    /// returns `"HELLO"` directly, with no output-object wrapping.
    #[tokio::test]
    async fn passthrough_bridge_returns_tool_output_directly() {
        let tree = tree("bridge Query.format with std.upperCase");
        tree.push(json!("hello"));
        let result = tree.execute_field("Query", "format").await.unwrap();
        assert_eq!(result, json!("HELLO"));
    }

    /// **Scenario**: array mapping — an upstream `properties` array maps to `listings` with a
    /// renamed field (`address`) and a passed-through one (`price`).
    #[tokio::test]
    async fn array_mapping_produces_one_object_per_element() {
        let tree = tree(
            r#"
            bridge Query.listings {
                with input as i
                output.listings <- i.properties[] as p {
                    address <- p.streetAddress
                    price <- p.priceInCents
                }
            }
            "#,
        );
        tree.push(json!({
            "properties": [
                {"streetAddress": "123 Main", "priceInCents": 35000000},
                {"streetAddress": "456 Oak", "priceInCents": 42000000},
            ]
        }));
        let result = tree.execute_field("Query", "listings").await.unwrap();
        assert_eq!(
            result,
            json!({"listings": [
                {"address": "123 Main", "price": 35000000},
                {"address": "456 Oak", "price": 42000000},
            ]})
        );
    }

    /// **Scenario**: forced side-effect — `audit.action <-! i.query` runs even though nothing
    /// in `output` demands it, and its failure doesn't stop `title` from resolving.
    #[tokio::test]
    async fn forced_wire_runs_without_being_demanded_by_output() {
        let tree = tree(
            r#"
            tool audit { fn std.upperCase }
            bridge Query.search {
                with input as i
                audit.action <-! i.query
                output.title <- i.query
            }
            "#,
        );
        tree.push(json!({"query": "X"}));
        let result = tree.execute_field("Query", "search").await.unwrap();
        assert_eq!(result, json!({"title": "X"}));
    }

    /// **Scenario**: shadow scope (spec §4.4/§8) — a mapping block nested inside another's block
    /// resolves the inner element by its own alias, still reaches the outer element by walking up
    /// the shadow chain, and still reaches `context` from the innermost body. 2 outer groups of
    /// 3 inner items each, so a flattened/single-level implementation would either error out or
    /// produce the wrong element per item.
    #[tokio::test]
    async fn nested_array_mapping_resolves_shadow_scope_chain() {
        let tree = tree(
            r#"
            bridge Query.groups {
                with input as i
                output.groups <- i.groups[] as g {
                    label <- g.label
                    items <- g.items[] as it {
                        name <- it.name
                        groupLabel <- g.label
                        tag <- context.tag
                    }
                }
            }
            "#,
        );
        tree.set_context(json!({"tag": "prod"}));
        tree.push(json!({
            "groups": [
                {
                    "label": "fruit",
                    "items": [{"name": "apple"}, {"name": "pear"}, {"name": "plum"}]
                },
                {
                    "label": "veg",
                    "items": [{"name": "leek"}, {"name": "kale"}, {"name": "yam"}]
                }
            ]
        }));
        let result = tree.execute_field("Query", "groups").await.unwrap();
        assert_eq!(
            result,
            json!({"groups": [
                {"label": "fruit", "items": [
                    {"name": "apple", "groupLabel": "fruit", "tag": "prod"},
                    {"name": "pear", "groupLabel": "fruit", "tag": "prod"},
                    {"name": "plum", "groupLabel": "fruit", "tag": "prod"},
                ]},
                {"label": "veg", "items": [
                    {"name": "leek", "groupLabel": "veg", "tag": "prod"},
                    {"name": "kale", "groupLabel": "veg", "tag": "prod"},
                    {"name": "yam", "groupLabel": "veg", "tag": "prod"},
                ]},
            ]})
        );
    }

    #[tokio::test]
    async fn diamond_dependency_runs_tool_once() {
        let tree = tree(
            r#"
            tool counter { fn std.upperCase }
            bridge Query.dup {
                with counter as c
                c.value <- input.name
                output.a <- c
                output.b <- c
            }
            "#,
        );
        tree.push(json!({"name": "ada"}));
        let result = tree.execute_field("Query", "dup").await.unwrap();
        assert_eq!(result["a"], result["b"]);
    }
}
