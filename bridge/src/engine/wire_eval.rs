//! Pure, synchronous wire bookkeeping shared by `execution_tree.rs`: grouping a body's wires by
//! what they feed (spec §4.5 "Tool input construction") and applying a wire's fallback chain
//! (spec §4.5/§8 "Fallback operators") once its source expression has been evaluated.

use std::collections::HashMap;
use std::future::Future;

use serde_json::Value;

use crate::ast::{Body, FallbackExpr, FallbackOp, PathSegment, SourceExpr, Wire, TRUNK_OUTPUT};
use crate::error::EngineError;
use crate::value::{is_nullish, set_path};

/// Splits a body's wires into the ones that build its own output trunk and the ones that build
/// the input of one of its dependencies, grouped by `(type, field, instance)`. A wire targets a
/// dependency whenever its `to` addresses a tool/define handle rather than `output.*`.
pub fn partition_wires(body: &Body) -> (Vec<&Wire>, HashMap<(String, String, u32), Vec<&Wire>>) {
    let mut own_output = Vec::new();
    let mut by_dependency: HashMap<(String, String, u32), Vec<&Wire>> = HashMap::new();

    for wire in &body.wires {
        let to = wire.to();
        if to.r#type == TRUNK_OUTPUT {
            own_output.push(wire);
        } else if let Some(instance) = to.instance {
            by_dependency.entry((to.r#type.clone(), to.field.clone(), instance)).or_default().push(wire);
        }
    }

    (own_output, by_dependency)
}

pub fn merge_into(target: &mut Value, path: &[PathSegment], value: Value) {
    set_path(target, path, value);
}

/// Applies a wire's fallback chain to the outcome of evaluating its source expression.
/// `eval_ref` re-enters source-expression evaluation for an `?? <ref>` recovery arm.
pub async fn apply_fallbacks<F, Fut>(
    mut outcome: Result<Value, EngineError>,
    fallbacks: &[FallbackOp],
    mut eval_ref: F,
) -> Result<Value, EngineError>
where
    F: FnMut(&SourceExpr) -> Fut,
    Fut: Future<Output = Result<Value, EngineError>>,
{
    for op in fallbacks {
        match op {
            FallbackOp::NullCoalesce(lit) => {
                if let Ok(value) = &outcome {
                    if is_nullish(value) {
                        outcome = Ok(lit.clone());
                    }
                }
            }
            FallbackOp::ErrorRecover(expr) => {
                if outcome.is_err() {
                    outcome = match expr {
                        FallbackExpr::Literal(lit) => Ok(lit.clone()),
                        FallbackExpr::Ref(inner) => eval_ref(inner).await,
                    };
                }
            }
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{HandleBinding, HandleSource, NodeRef};
    use serde_json::json;

    fn pull(to: NodeRef) -> Wire {
        Wire::Pull { from: SourceExpr::Ref(NodeRef::trunk("input", vec![])), to, force: false, fallbacks: vec![] }
    }

    #[test]
    fn partitions_output_and_dependency_wires() {
        let mut body = Body::default();
        body.handles.push(HandleBinding { alias: "g".into(), source: HandleSource::Tool { name: "geocode".into(), instance: 1, module: crate::ast::ModuleRef::SelfModule } });
        body.wires.push(pull(NodeRef::trunk(TRUNK_OUTPUT, vec![PathSegment::name("lat")])));
        body.wires.push(pull(NodeRef::tool("geocode", 1, vec![PathSegment::name("query")])));

        let (own, by_dep) = partition_wires(&body);
        assert_eq!(own.len(), 1);
        assert_eq!(by_dep.len(), 1);
        assert_eq!(by_dep[&("tool".to_string(), "geocode".to_string(), 1)].len(), 1);
    }

    #[tokio::test]
    async fn null_coalesce_substitutes_only_on_null() {
        let fallbacks = vec![FallbackOp::NullCoalesce(json!("fallback"))];
        let out = apply_fallbacks(Ok(Value::Null), &fallbacks, |_| async { unreachable!() }).await;
        assert_eq!(out.unwrap(), json!("fallback"));

        let fallbacks = vec![FallbackOp::NullCoalesce(json!("fallback"))];
        let out = apply_fallbacks(Ok(json!(0)), &fallbacks, |_| async { unreachable!() }).await;
        assert_eq!(out.unwrap(), json!(0));
    }

    #[tokio::test]
    async fn error_recover_runs_only_on_error() {
        let fallbacks = vec![FallbackOp::ErrorRecover(FallbackExpr::Literal(json!("recovered")))];
        let out = apply_fallbacks(Err(EngineError::Cancelled), &fallbacks, |_| async { unreachable!() }).await;
        assert_eq!(out.unwrap(), json!("recovered"));

        let fallbacks = vec![FallbackOp::ErrorRecover(FallbackExpr::Literal(json!("recovered")))];
        let out = apply_fallbacks(Ok(json!("fine")), &fallbacks, |_| async { unreachable!() }).await;
        assert_eq!(out.unwrap(), json!("fine"));
    }
}
