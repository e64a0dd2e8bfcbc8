//! Process settings read from the environment (after `.env` is loaded).

use crate::error::ConfigError;
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_SCHEMA: &str = "storefront";
pub const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// PostgreSQL URL. None: records live in memory for the life of the process.
    pub database_url: Option<String>,
    pub bind_addr: SocketAddr,
    /// Schema holding one table per collection.
    pub schema: String,
    /// Catalog JSON replacing the built-in resources.
    pub resources_path: Option<PathBuf>,
    /// Reject filters with unrecognized operators instead of treating them as matches.
    pub strict_filter_ops: bool,
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            database_url: None,
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            schema: DEFAULT_SCHEMA.into(),
            resources_path: None,
            strict_filter_ops: false,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_raw = non_empty("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into());
        let bind_addr: SocketAddr = bind_raw
            .parse()
            .map_err(|e| ConfigError::Load(format!("BIND_ADDR '{}': {}", bind_raw, e)))?;

        let strict_filter_ops = match non_empty("STRICT_FILTER_OPS") {
            None => false,
            Some(v) => parse_bool(&v).ok_or_else(|| ConfigError::Load(format!("STRICT_FILTER_OPS '{}': expected true or false", v)))?,
        };

        let max_body_bytes = match non_empty("MAX_BODY_BYTES") {
            None => DEFAULT_MAX_BODY_BYTES,
            Some(v) => v
                .parse()
                .map_err(|e| ConfigError::Load(format!("MAX_BODY_BYTES '{}': {}", v, e)))?,
        };

        Ok(ServerConfig {
            database_url: non_empty("DATABASE_URL"),
            bind_addr,
            schema: non_empty("STOREFRONT_SCHEMA").unwrap_or_else(|| DEFAULT_SCHEMA.into()),
            resources_path: non_empty("RESOURCES_PATH").map(PathBuf::from),
            strict_filter_ops,
            max_body_bytes,
        })
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k: &str| map.get(k).cloned()
    }

    #[test]
    fn defaults_without_env() {
        let cfg = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert!(cfg.database_url.is_none());
        assert_eq!(cfg.bind_addr.port(), 3000);
        assert_eq!(cfg.schema, DEFAULT_SCHEMA);
        assert!(!cfg.strict_filter_ops);
    }

    #[test]
    fn reads_overrides() {
        let cfg = ServerConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/cuahang"),
            ("BIND_ADDR", "127.0.0.1:8080"),
            ("STRICT_FILTER_OPS", "true"),
            ("RESOURCES_PATH", "  "),
        ]))
        .unwrap();
        assert_eq!(cfg.database_url.as_deref(), Some("postgres://localhost/cuahang"));
        assert_eq!(cfg.bind_addr.port(), 8080);
        assert!(cfg.strict_filter_ops);
        assert!(cfg.resources_path.is_none());
    }

    #[test]
    fn rejects_bad_values() {
        assert!(ServerConfig::from_lookup(lookup(&[("BIND_ADDR", "nowhere")])).is_err());
        assert!(ServerConfig::from_lookup(lookup(&[("STRICT_FILTER_OPS", "maybe")])).is_err());
    }
}
