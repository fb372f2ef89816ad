//! Load engine tunables from XDG `config.toml` and project `.env`, then apply to the process
//! environment with priority: **existing env > .env > XDG**.
//!
//! The bridge engine itself takes no configuration object through its public API beyond
//! `bridgeTransform`'s `options` — this crate exists for the handful of process-wide knobs an
//! operator wants to set once per deployment (HTTP cache capacity, default cache TTL, request
//! timeout) rather than thread through every call site.

mod dotenv;
mod xdg_toml;

use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("xdg config path: {0}")]
    XdgPath(String),
    #[error("read xdg config: {0}")]
    XdgRead(std::io::Error),
    #[error("parse xdg toml: {0}")]
    XdgParse(#[from] toml::de::Error),
    #[error("read .env: {0}")]
    DotenvRead(std::io::Error),
}

/// Loads config from XDG `config.toml` and optional project `.env`, then sets environment
/// variables only for keys that are **not** already set (so existing env has highest priority).
///
/// Order of precedence when a key is missing in the process environment:
/// 1. Value from project `.env` (current directory or `override_dir` if given)
/// 2. Value from `$XDG_CONFIG_HOME/<app_name>/config.toml` `[env]` table
pub fn load_and_apply(app_name: &str, override_dir: Option<&Path>) -> Result<(), LoadError> {
    let xdg_map = xdg_toml::load_env_map(app_name)?;
    let dotenv_map = dotenv::load_env_map(override_dir).map_err(LoadError::DotenvRead)?;

    let mut keys: std::collections::HashSet<String> = xdg_map.keys().cloned().collect();
    keys.extend(dotenv_map.keys().cloned());

    for key in keys {
        if std::env::var(&key).is_ok() {
            continue;
        }
        let value = dotenv_map.get(&key).or_else(|| xdg_map.get(&key)).cloned();
        if let Some(v) = value {
            std::env::set_var(&key, v);
        }
    }

    Ok(())
}

/// Process-wide knobs for the built-in `httpCall` tool and the engine's tool-invocation
/// scheduler. Read once at startup via [`EngineTunables::from_env`]; not part of the
/// `Bridge` DSL itself.
#[derive(Debug, Clone)]
pub struct EngineTunables {
    /// Capacity of the default in-memory HTTP cache store (entry count).
    pub http_cache_capacity: usize,
    /// TTL used when `httpCall`'s `cache` input is omitted entirely (the DSL default is
    /// `"auto"`, so this only applies when a tool author skips the key altogether).
    pub http_cache_default_ttl: Duration,
    /// Timeout applied to the underlying `reqwest::Client` used by `httpCall`.
    pub http_request_timeout: Duration,
}

impl Default for EngineTunables {
    fn default() -> Self {
        Self {
            http_cache_capacity: 1024,
            http_cache_default_ttl: Duration::from_secs(0),
            http_request_timeout: Duration::from_secs(30),
        }
    }
}

impl EngineTunables {
    /// Reads `BRIDGE_HTTP_CACHE_CAPACITY`, `BRIDGE_HTTP_CACHE_DEFAULT_TTL_SECS`, and
    /// `BRIDGE_HTTP_REQUEST_TIMEOUT_MS` from the process environment, falling back to
    /// [`EngineTunables::default`] for any variable that is unset or fails to parse.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            http_cache_capacity: env_usize("BRIDGE_HTTP_CACHE_CAPACITY")
                .unwrap_or(defaults.http_cache_capacity),
            http_cache_default_ttl: env_usize("BRIDGE_HTTP_CACHE_DEFAULT_TTL_SECS")
                .map(|s| Duration::from_secs(s as u64))
                .unwrap_or(defaults.http_cache_default_ttl),
            http_request_timeout: env_usize("BRIDGE_HTTP_REQUEST_TIMEOUT_MS")
                .map(|ms| Duration::from_millis(ms as u64))
                .unwrap_or(defaults.http_request_timeout),
        }
    }
}

fn env_usize(key: &str) -> Option<usize> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn restore_var(key: &str, prev: Option<String>) {
        match prev {
            Some(v) => env::set_var(key, v),
            None => env::remove_var(key),
        }
    }

    #[test]
    fn existing_env_wins() {
        env::set_var("CONFIG_TEST_EXISTING", "from_env");
        let _ = load_and_apply("bridge", None);
        assert_eq!(env::var("CONFIG_TEST_EXISTING").as_deref(), Ok("from_env"));
        env::remove_var("CONFIG_TEST_EXISTING");
    }

    #[test]
    fn load_and_apply_no_config_ok() {
        let r = load_and_apply("config-crate-nonexistent-app-xyz", None::<&std::path::Path>);
        assert!(r.is_ok());
    }

    #[test]
    fn dotenv_overrides_xdg() {
        let xdg_dir = tempfile::tempdir().unwrap();
        let app_dir = xdg_dir.path().join("bridge");
        std::fs::create_dir_all(&app_dir).unwrap();
        std::fs::write(
            app_dir.join("config.toml"),
            "[env]\nCONFIG_TEST_PRIORITY = \"from_xdg\"\n",
        )
        .unwrap();

        let dotenv_dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dotenv_dir.path().join(".env"),
            "CONFIG_TEST_PRIORITY=from_dotenv\n",
        )
        .unwrap();

        let prev_xdg = env::var("XDG_CONFIG_HOME").ok();
        env::set_var("XDG_CONFIG_HOME", xdg_dir.path());
        env::remove_var("CONFIG_TEST_PRIORITY");

        let _ = load_and_apply("bridge", Some(dotenv_dir.path()));
        let val = env::var("CONFIG_TEST_PRIORITY").unwrap();
        env::remove_var("CONFIG_TEST_PRIORITY");
        restore_var("XDG_CONFIG_HOME", prev_xdg);

        assert_eq!(val, "from_dotenv");
    }

    #[test]
    fn engine_tunables_defaults_when_env_unset() {
        env::remove_var("BRIDGE_HTTP_CACHE_CAPACITY");
        let t = EngineTunables::from_env();
        assert_eq!(t.http_cache_capacity, 1024);
    }

    #[test]
    fn engine_tunables_reads_env() {
        env::set_var("BRIDGE_HTTP_CACHE_CAPACITY", "256");
        let t = EngineTunables::from_env();
        env::remove_var("BRIDGE_HTTP_CACHE_CAPACITY");
        assert_eq!(t.http_cache_capacity, 256);
    }
}
