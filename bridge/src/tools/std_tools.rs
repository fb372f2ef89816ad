//! Pure `std.*` helpers (spec §4.6): no I/O, safe to execute synchronously, but implemented
//! against the same async `Tool` trait as `httpCall` so the engine never special-cases them.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::EngineError;

use super::Tool;

fn expect_str(input: &Value) -> Result<&str, EngineError> {
    if let Some(s) = input.as_str() {
        return Ok(s);
    }
    if let Some(s) = input.get("value").and_then(Value::as_str) {
        return Ok(s);
    }
    Err(EngineError::TypeMismatch { expected: "string", found: describe(input) })
}

fn describe(v: &Value) -> String {
    match v {
        Value::Null => "null".to_string(),
        Value::Bool(_) => "bool".to_string(),
        Value::Number(_) => "number".to_string(),
        Value::String(_) => "string".to_string(),
        Value::Array(_) => "array".to_string(),
        Value::Object(_) => "object".to_string(),
    }
}

pub struct UpperCaseTool;

#[async_trait]
impl Tool for UpperCaseTool {
    async fn call(&self, input: Value) -> Result<Value, EngineError> {
        Ok(Value::String(expect_str(&input)?.to_uppercase()))
    }
}

pub struct LowerCaseTool;

#[async_trait]
impl Tool for LowerCaseTool {
    async fn call(&self, input: Value) -> Result<Value, EngineError> {
        Ok(Value::String(expect_str(&input)?.to_lowercase()))
    }
}

/// Linear scan returning the first element of `input.items` matching every key of `input`
/// other than `items` itself.
pub struct FindObjectTool;

#[async_trait]
impl Tool for FindObjectTool {
    async fn call(&self, input: Value) -> Result<Value, EngineError> {
        let obj = input.as_object().ok_or_else(|| EngineError::TypeMismatch {
            expected: "object with an `items` array",
            found: describe(&input),
        })?;
        let items = obj
            .get("items")
            .and_then(Value::as_array)
            .ok_or_else(|| EngineError::TypeMismatch { expected: "array at `items`", found: describe(&input) })?;
        let criteria: Vec<(&String, &Value)> = obj.iter().filter(|(k, _)| k.as_str() != "items").collect();

        let found = items.iter().find(|item| {
            criteria.iter().all(|(k, v)| item.get(k.as_str()).map(|found| found == *v).unwrap_or(false))
        });
        Ok(found.cloned().unwrap_or(Value::Null))
    }
}

/// First element of `input.items` (or bare `input` when it is itself an array). With
/// `input.strict == true`, an empty or multi-element array raises `EngineError::ToolFailed`
/// rather than silently picking one.
pub struct PickFirstTool;

#[async_trait]
impl Tool for PickFirstTool {
    async fn call(&self, input: Value) -> Result<Value, EngineError> {
        let (items, strict) = match &input {
            Value::Array(items) => (items.clone(), false),
            Value::Object(obj) => {
                let items = obj
                    .get("items")
                    .and_then(Value::as_array)
                    .ok_or_else(|| EngineError::TypeMismatch { expected: "array at `items`", found: describe(&input) })?
                    .clone();
                let strict = obj.get("strict").and_then(Value::as_bool).unwrap_or(false);
                (items, strict)
            }
            other => return Err(EngineError::TypeMismatch { expected: "array", found: describe(other) }),
        };

        if strict && items.is_empty() {
            return Err(EngineError::ToolFailed { tool: "std.pickFirst".into(), message: "empty array".into() });
        }
        if strict && items.len() > 1 {
            return Err(EngineError::ToolFailed {
                tool: "std.pickFirst".into(),
                message: format!("expected exactly one element, found {}", items.len()),
            });
        }
        Ok(items.into_iter().next().unwrap_or(Value::Null))
    }
}

/// Wraps a non-array input in a one-element array; arrays pass through unchanged.
pub struct ToArrayTool;

#[async_trait]
impl Tool for ToArrayTool {
    async fn call(&self, input: Value) -> Result<Value, EngineError> {
        match input {
            Value::Array(_) => Ok(input),
            other => Ok(Value::Array(vec![other])),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn upper_case_on_bare_string() {
        assert_eq!(UpperCaseTool.call(json!("hello")).await.unwrap(), json!("HELLO"));
    }

    #[tokio::test]
    async fn lower_case_on_wrapped_value() {
        assert_eq!(LowerCaseTool.call(json!({"value": "HELLO"})).await.unwrap(), json!("hello"));
    }

    #[tokio::test]
    async fn find_object_matches_all_extra_keys() {
        let input = json!({
            "items": [{"city": "Berlin", "beds": 3}, {"city": "Berlin", "beds": 4}],
            "city": "Berlin",
            "beds": 4,
        });
        assert_eq!(FindObjectTool.call(input).await.unwrap(), json!({"city": "Berlin", "beds": 4}));
    }

    #[tokio::test]
    async fn find_object_no_match_is_null() {
        let input = json!({"items": [{"city": "Berlin"}], "city": "Paris"});
        assert_eq!(FindObjectTool.call(input).await.unwrap(), Value::Null);
    }

    #[tokio::test]
    async fn pick_first_non_strict_returns_first() {
        assert_eq!(PickFirstTool.call(json!([1, 2, 3])).await.unwrap(), json!(1));
    }

    #[tokio::test]
    async fn pick_first_strict_rejects_empty() {
        let err = PickFirstTool.call(json!({"items": [], "strict": true})).await.unwrap_err();
        assert!(matches!(err, EngineError::ToolFailed { .. }));
    }

    #[tokio::test]
    async fn pick_first_strict_rejects_multiple() {
        let err = PickFirstTool.call(json!({"items": [1, 2], "strict": true})).await.unwrap_err();
        assert!(matches!(err, EngineError::ToolFailed { .. }));
    }

    #[tokio::test]
    async fn to_array_wraps_scalar() {
        assert_eq!(ToArrayTool.call(json!(5)).await.unwrap(), json!([5]));
    }

    #[tokio::test]
    async fn to_array_passes_through_array() {
        assert_eq!(ToArrayTool.call(json!([1, 2])).await.unwrap(), json!([1, 2]));
    }
}
