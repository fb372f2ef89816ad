//! The built-in caching HTTP client (spec §4.6), grounded on the teacher's `WebFetcherTool`
//! (`graphweave/src/tools/web/mod.rs`) for the `reqwest::Client` usage pattern, generalized from
//! GET/POST-only to the full shorthand-argument + TTL-caching contract the DSL needs.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::cache::Cache;
use crate::error::EngineError;

use super::Tool;

/// What the cache stores under a request's key: just the decoded JSON body. Headers/status are
/// not replayed on a cache hit (the spec's cache contract only concerns itself with the body).
pub type CachedResponse = Value;

const RESERVED_KEYS: &[&str] = &["baseUrl", "method", "path", "headers", "cache"];

pub struct HttpCallTool {
    client: reqwest::Client,
    cache: Arc<dyn Cache<String, CachedResponse>>,
}

impl HttpCallTool {
    pub fn new(cache: Arc<dyn Cache<String, CachedResponse>>) -> Self {
        HttpCallTool { client: reqwest::Client::new(), cache }
    }

    pub fn with_client(client: reqwest::Client, cache: Arc<dyn Cache<String, CachedResponse>>) -> Self {
        HttpCallTool { client, cache }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum CacheMode {
    Bypass,
    Auto,
    ExplicitSeconds(u64),
}

fn parse_cache_mode(input: &Value) -> CacheMode {
    match input.get("cache") {
        None => CacheMode::ExplicitSeconds(0),
        Some(Value::String(s)) if s == "auto" => CacheMode::Auto,
        Some(Value::String(s)) if s == "0" => CacheMode::Bypass,
        Some(Value::String(s)) => s.parse::<u64>().map(CacheMode::ExplicitSeconds).unwrap_or(CacheMode::ExplicitSeconds(0)),
        Some(Value::Number(n)) if n.as_u64() == Some(0) => CacheMode::Bypass,
        Some(Value::Number(n)) => CacheMode::ExplicitSeconds(n.as_u64().unwrap_or(0)),
        Some(_) => CacheMode::ExplicitSeconds(0),
    }
}

fn value_to_query_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

fn shorthand_entries(input: &Value) -> Vec<(&String, &Value)> {
    input
        .as_object()
        .into_iter()
        .flat_map(|obj| obj.iter())
        .filter(|(k, v)| !RESERVED_KEYS.contains(&k.as_str()) && !v.is_null())
        .collect()
}

/// Parses `Cache-Control: max-age=10, no-cache` style headers (spec §4.6 TTL derivation).
fn ttl_from_headers(headers: &HeaderMap) -> u64 {
    if let Some(cc) = headers.get(reqwest::header::CACHE_CONTROL).and_then(|v| v.to_str().ok()) {
        let directives: BTreeMap<String, Option<u64>> = cc
            .split(',')
            .filter_map(|part| {
                let part = part.trim();
                let (name, value) = match part.split_once('=') {
                    Some((n, v)) => (n.trim().to_lowercase(), v.trim().parse::<u64>().ok()),
                    None => (part.to_lowercase(), None),
                };
                Some((name, value))
            })
            .collect();

        if directives.contains_key("no-store") || directives.contains_key("no-cache") {
            return 0;
        }
        if let Some(Some(seconds)) = directives.get("s-maxage") {
            return *seconds;
        }
        if let Some(Some(seconds)) = directives.get("max-age") {
            return *seconds;
        }
    }

    if let Some(expires) = headers.get(reqwest::header::EXPIRES).and_then(|v| v.to_str().ok()) {
        if let Ok(at) = chrono::DateTime::parse_from_rfc2822(expires) {
            let now = chrono::Utc::now();
            let seconds = (at.with_timezone(&chrono::Utc) - now).num_seconds();
            return seconds.max(0) as u64;
        }
    }

    0
}

#[async_trait]
impl Tool for HttpCallTool {
    async fn call(&self, input: Value) -> Result<Value, EngineError> {
        let base_url = input
            .get("baseUrl")
            .and_then(Value::as_str)
            .ok_or_else(|| EngineError::ToolFailed { tool: "httpCall".into(), message: "missing baseUrl".into() })?;
        let method = input.get("method").and_then(Value::as_str).unwrap_or("GET").to_uppercase();
        let path = input.get("path").and_then(Value::as_str).unwrap_or("");

        let mut full_url = format!("{}{}", base_url.trim_end_matches('/'), path);
        let shorthand = shorthand_entries(&input);
        let is_body_method = matches!(method.as_str(), "POST" | "PUT" | "PATCH" | "DELETE");

        let mut body_str = String::new();
        let mut request = match method.as_str() {
            "POST" => self.client.post(&full_url),
            "PUT" => self.client.put(&full_url),
            "PATCH" => self.client.patch(&full_url),
            "DELETE" => self.client.delete(&full_url),
            _ => self.client.get(&full_url),
        };

        if !is_body_method && !shorthand.is_empty() {
            let query: Vec<(String, String)> =
                shorthand.iter().map(|(k, v)| ((*k).clone(), value_to_query_string(v))).collect();
            request = request.query(&query);
            let qs = query.iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join("&");
            full_url = format!("{full_url}?{qs}");
        } else if is_body_method && !shorthand.is_empty() {
            let mut map = Map::new();
            for (k, v) in &shorthand {
                map.insert((*k).clone(), (*v).clone());
            }
            body_str = serde_json::to_string(&map).unwrap_or_default();
            request = request.json(&map);
        }

        if let Some(headers) = input.get("headers").and_then(Value::as_object) {
            let has_content_type = headers.keys().any(|k| k.eq_ignore_ascii_case("content-type"));
            for (k, v) in headers {
                if let Some(s) = v.as_str() {
                    request = request.header(k.as_str(), s);
                }
            }
            if is_body_method && !body_str.is_empty() && !has_content_type {
                request = request.header("Content-Type", "application/json");
            }
        } else if is_body_method && !body_str.is_empty() {
            request = request.header("Content-Type", "application/json");
        }

        let cache_mode = parse_cache_mode(&input);
        let cache_key = format!("{method} {full_url}{body_str}");

        if cache_mode != CacheMode::Bypass {
            if let Some(cached) = self.cache.get(&cache_key).await? {
                return Ok(cached);
            }
        }

        let response = request.send().await.map_err(|e| EngineError::Http(e.to_string()))?;
        if !response.status().is_success() {
            return Err(EngineError::Http(format!("request failed with status: {}", response.status())));
        }

        let ttl_seconds = match cache_mode {
            CacheMode::Bypass => 0,
            CacheMode::Auto => ttl_from_headers(response.headers()),
            CacheMode::ExplicitSeconds(s) => s,
        };
        let body: Value = response.json().await.map_err(|e| EngineError::Http(e.to_string()))?;

        if cache_mode != CacheMode::Bypass && ttl_seconds > 0 {
            self.cache.set(cache_key, body.clone(), Some(Duration::from_secs(ttl_seconds))).await?;
        }

        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderMap, HeaderValue};

    #[test]
    fn cache_mode_parses_auto_and_explicit_and_bypass() {
        assert_eq!(parse_cache_mode(&serde_json::json!({"cache": "auto"})), CacheMode::Auto);
        assert_eq!(parse_cache_mode(&serde_json::json!({"cache": "0"})), CacheMode::Bypass);
        assert_eq!(parse_cache_mode(&serde_json::json!({"cache": 10})), CacheMode::ExplicitSeconds(10));
        assert_eq!(parse_cache_mode(&serde_json::json!({})), CacheMode::ExplicitSeconds(0));
    }

    #[test]
    fn ttl_from_headers_respects_no_store() {
        let mut headers = HeaderMap::new();
        headers.insert(reqwest::header::CACHE_CONTROL, HeaderValue::from_static("no-store, max-age=10"));
        assert_eq!(ttl_from_headers(&headers), 0);
    }

    #[test]
    fn ttl_from_headers_prefers_s_maxage() {
        let mut headers = HeaderMap::new();
        headers.insert(reqwest::header::CACHE_CONTROL, HeaderValue::from_static("max-age=5, s-maxage=30"));
        assert_eq!(ttl_from_headers(&headers), 30);
    }

    #[test]
    fn ttl_from_headers_falls_back_to_max_age() {
        let mut headers = HeaderMap::new();
        headers.insert(reqwest::header::CACHE_CONTROL, HeaderValue::from_static("max-age=10"));
        assert_eq!(ttl_from_headers(&headers), 10);
    }

    #[test]
    fn ttl_from_headers_with_no_directives_is_zero() {
        assert_eq!(ttl_from_headers(&HeaderMap::new()), 0);
    }

    #[test]
    fn shorthand_drops_null_and_reserved_keys() {
        let input = serde_json::json!({
            "baseUrl": "https://api.example.com",
            "method": "GET",
            "city": "Berlin",
            "limit": null,
        });
        let entries = shorthand_entries(&input);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, "city");
    }
}
