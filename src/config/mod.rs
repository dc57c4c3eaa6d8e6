use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::error;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_API_KEY: &str = "supersecret";
const DEFAULT_TOKEN_TTL_MINUTES: u64 = 30;

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

// ─── ObservabilityConfig ─────────────────────────────────────────────────────

/// Observability configuration (`[observability]` in config.toml).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log SQLite queries that exceed this threshold (milliseconds). Default: 100.
    /// Set to 0 to disable slow query logging.
    pub slow_query_threshold_ms: u64,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            slow_query_threshold_ms: 100,
        }
    }
}

// ─── TOML config file ────────────────────────────────────────────────────────

/// `{data_dir}/config.toml` — all fields are optional overrides.
/// Priority: CLI / env var  >  TOML  >  built-in default.
#[derive(Deserialize, Default)]
struct TomlConfig {
    /// HTTP server port (default: 8000).
    port: Option<u16>,
    /// Bind address (default: "127.0.0.1"; use "0.0.0.0" for LAN access).
    bind_address: Option<String>,
    /// Log level filter string, e.g. "debug", "info,edistat=trace" (default: "info").
    log: Option<String>,
    /// Log output format: "pretty" (default, human-readable) | "json" (structured for log aggregators).
    log_format: Option<String>,
    /// Shared API key expected in the `X-API-Key` header. Override this in
    /// any deployment — the built-in default is for local development only.
    api_key: Option<String>,
    /// Bearer token lifetime in minutes (default: 30).
    token_ttl_minutes: Option<u64>,
    /// Observability configuration (`[observability]`).
    observability: Option<ObservabilityConfig>,
}

fn load_toml(data_dir: &Path) -> Option<TomlConfig> {
    let path = data_dir.join("config.toml");
    let contents = std::fs::read_to_string(&path).ok()?;
    match toml::from_str::<TomlConfig>(&contents) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            error!(path = %path.display(), err = %e, "failed to parse config.toml — using defaults");
            None
        }
    }
}

// ─── ServerConfig ────────────────────────────────────────────────────────────

/// Resolved server configuration.
///
/// Built once at startup and shared by reference (inside `AppContext`) with
/// every request handler — never stored as ambient global state.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub bind_address: String,
    pub data_dir: PathBuf,
    pub log: String,
    pub log_format: String,
    pub api_key: String,
    pub token_ttl_minutes: u64,
    pub observability: ObservabilityConfig,
}

impl ServerConfig {
    /// Resolve the configuration from CLI/env overrides layered over
    /// `{data_dir}/config.toml` layered over built-in defaults.
    pub fn new(
        port: Option<u16>,
        data_dir: Option<PathBuf>,
        log: Option<String>,
        bind_address: Option<String>,
        api_key: Option<String>,
    ) -> Self {
        let data_dir = data_dir.unwrap_or_else(default_data_dir);
        let toml = load_toml(&data_dir).unwrap_or_default();

        Self {
            port: port.or(toml.port).unwrap_or(DEFAULT_PORT),
            bind_address: bind_address
                .or(toml.bind_address)
                .unwrap_or_else(default_bind_address),
            log: log.or(toml.log).unwrap_or_else(|| "info".to_string()),
            log_format: toml.log_format.unwrap_or_else(|| "pretty".to_string()),
            api_key: api_key
                .or(toml.api_key)
                .unwrap_or_else(|| DEFAULT_API_KEY.to_string()),
            token_ttl_minutes: toml.token_ttl_minutes.unwrap_or(DEFAULT_TOKEN_TTL_MINUTES),
            observability: toml.observability.unwrap_or_default(),
            data_dir,
        }
    }
}

fn default_data_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".edistat")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_toml() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = ServerConfig::new(None, Some(dir.path().to_path_buf()), None, None, None);
        assert_eq!(cfg.port, DEFAULT_PORT);
        assert_eq!(cfg.bind_address, "127.0.0.1");
        assert_eq!(cfg.api_key, DEFAULT_API_KEY);
        assert_eq!(cfg.token_ttl_minutes, 30);
        assert_eq!(cfg.observability.slow_query_threshold_ms, 100);
    }

    #[test]
    fn toml_overrides_defaults_and_cli_overrides_toml() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.toml"),
            "port = 9100\napi_key = \"k1\"\ntoken_ttl_minutes = 5\n",
        )
        .unwrap();

        let cfg = ServerConfig::new(None, Some(dir.path().to_path_buf()), None, None, None);
        assert_eq!(cfg.port, 9100);
        assert_eq!(cfg.api_key, "k1");
        assert_eq!(cfg.token_ttl_minutes, 5);

        let cfg = ServerConfig::new(
            Some(9200),
            Some(dir.path().to_path_buf()),
            None,
            None,
            Some("k2".to_string()),
        );
        assert_eq!(cfg.port, 9200);
        assert_eq!(cfg.api_key, "k2");
    }

    #[test]
    fn malformed_toml_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.toml"), "port = \"not a number").unwrap();
        let cfg = ServerConfig::new(None, Some(dir.path().to_path_buf()), None, None, None);
        assert_eq!(cfg.port, DEFAULT_PORT);
    }
}
