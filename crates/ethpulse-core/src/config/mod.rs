//! Application configuration with layered loading.
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded in this order (later overrides earlier):
//!
//! 1. **Compiled defaults**: Hardcoded in struct `Default` implementations
//! 2. **Config file**: TOML file specified by `ETHPULSE_CONFIG` env var
//! 3. **Environment variables**: `ETHPULSE__*` env vars override specific fields
//!
//! # Configuration Sections
//!
//! - [`ServerConfig`]: HTTP server settings (bind address, concurrency)
//! - [`UpstreamConfig`]: Blockchain RPC credentials, network selector, timeouts
//! - [`IngestConfig`]: Fetch interval and pending stack capacity / resume threshold
//! - [`StoreConfig`]: Durable store location
//! - [`QueryConfig`]: Default and maximum row limits
//! - [`Nl2SqlConfig`]: Server-wide LLM provider defaults
//! - [`AuthConfig`]: Session credential encryption
//! - [`LoggingConfig`]: Log level and format
//!
//! # Example
//!
//! ```toml
//! [upstream]
//! network = "mainnet"
//! api_keys = ["key-one", "key-two"]
//!
//! [ingest]
//! stack_capacity = 1000
//! resume_threshold = 800
//! ```

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, path::Path, time::Duration};

/// Minimum length of the session credential encryption key.
pub const MIN_ENCRYPTION_KEY_LEN: usize = 32;

/// HTTP server configuration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// IP address to bind the server to. Defaults to `127.0.0.1`.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Port number to listen on. Defaults to `3001`.
    pub bind_port: u16,

    /// Maximum number of concurrently served requests. Defaults to `256`.
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_max_concurrent_requests() -> usize {
    256
}

/// Upstream blockchain RPC provider configuration.
///
/// Each API key becomes one credential in the rotation pool. The endpoint URL for a key is
/// produced by substituting `{network}` and `{key}` in `url_template`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Network selector substituted into the URL template. Defaults to `"mainnet"`.
    pub network: String,

    /// Ordered credential list. Must not be empty.
    #[serde(default)]
    pub api_keys: Vec<String>,

    /// Endpoint template. Must contain `{key}`.
    pub url_template: String,

    /// Per-request timeout in seconds. Defaults to `10`.
    pub timeout_seconds: u64,

    /// Delay between rotation attempts in milliseconds. Defaults to `250`.
    pub retry_delay_ms: u64,
}

/// Ingestion loop and pending stack configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Whether the ingestion loop runs at all. Defaults to `true`.
    pub enabled: bool,

    /// Tick interval in milliseconds. Defaults to `12000` (one mainnet slot).
    pub fetch_interval_ms: u64,

    /// Maximum pending stack length; reaching it suspends ingestion. Defaults to `1000`.
    pub stack_capacity: usize,

    /// Pops that leave fewer than this many entries resume ingestion. Defaults to `800`.
    pub resume_threshold: usize,

    /// Keep transaction calldata in the store instead of eliding it. Defaults to `false`.
    pub store_input_data: bool,
}

/// Durable store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// `SQLite` database URL. Defaults to `sqlite://./db/transactions.db`.
    pub database_url: String,

    /// Connection pool size. Forced to `1` for in-memory databases. Defaults to `4`.
    pub max_connections: u32,
}

/// Row limits for query endpoints and the legacy pending feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Limit used when a request omits one. Defaults to `100`.
    pub default_limit: i64,

    /// Upper bound for any requested limit. Defaults to `1000`.
    pub max_limit: i64,

    /// Default `n` for `/pending-queue`. Defaults to `10`.
    pub pending_default: i64,

    /// Upper bound for `n` on `/pending-queue`. Defaults to `100`.
    pub pending_max: i64,
}

/// Natural-language to SQL translation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Nl2SqlConfig {
    /// Provider used when a request carries no session credential (`openai`, `claude`,
    /// `gemini`, `groq`).
    #[serde(default)]
    pub default_provider: Option<String>,

    /// Server-wide credential for `default_provider`.
    #[serde(default)]
    pub default_api_key: Option<String>,

    /// Model override for `default_provider`.
    #[serde(default)]
    pub default_model: Option<String>,

    /// Per-request timeout in seconds. Defaults to `20`.
    #[serde(default = "default_llm_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Base URL overrides keyed by provider name.
    #[serde(default)]
    pub endpoints: HashMap<String, String>,
}

fn default_llm_timeout_seconds() -> u64 {
    20
}

/// Session credential storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Encryption key for stored provider credentials. At least 32 characters. When absent an
    /// ephemeral key is generated at startup.
    #[serde(default)]
    pub encryption_key: Option<String>,

    /// Idle sessions older than this are purged. Defaults to `86400`.
    pub session_ttl_seconds: u64,

    /// Interval of the purge task in seconds. Defaults to `300`.
    pub purge_interval_seconds: u64,
}

/// Application logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (e.g., "trace", "debug", "info", "warn", "error"). Defaults to `"info"`.
    pub level: String,

    /// Output format: `"json"` or `"pretty"`. Defaults to `"pretty"`.
    pub format: String,
}

/// Prometheus metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Whether `/metrics` is served. Defaults to `true`.
    pub enabled: bool,
}

/// Root application configuration containing all subsystem settings.
///
/// Loaded with the `ETHPULSE` prefix for environment overrides using `__` as a separator,
/// e.g. `ETHPULSE__INGEST__STACK_CAPACITY=5000` or `ETHPULSE__UPSTREAM__API_KEYS=a,b,c`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub upstream: UpstreamConfig,

    #[serde(default)]
    pub ingest: IngestConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub query: QueryConfig,

    #[serde(default)]
    pub nl2sql: Nl2SqlConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind_address: "127.0.0.1".to_string(), bind_port: 3001, max_concurrent_requests: 256 }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            network: "mainnet".to_string(),
            api_keys: Vec::new(),
            url_template: "https://eth-{network}.g.alchemy.com/v2/{key}".to_string(),
            timeout_seconds: 10,
            retry_delay_ms: 250,
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            fetch_interval_ms: 12_000,
            stack_capacity: 1000,
            resume_threshold: 800,
            store_input_data: false,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        let path = std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join("db")
            .join("transactions.db");

        Self { database_url: format!("sqlite://{}", path.display()), max_connections: 4 }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self { default_limit: 100, max_limit: 1000, pending_default: 10, pending_max: 100 }
    }
}

impl Default for Nl2SqlConfig {
    fn default() -> Self {
        Self {
            default_provider: None,
            default_api_key: None,
            default_model: None,
            timeout_seconds: default_llm_timeout_seconds(),
            endpoints: HashMap::new(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { encryption_key: None, session_ttl_seconds: 86_400, purge_interval_seconds: 300 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "pretty".to_string() }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file with environment variable overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read, parsed, or deserialized.
    pub fn from_file<P: AsRef<Path>>(config_path: P) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let config_builder = Config::builder()
            .set_default("server.bind_address", defaults.server.bind_address)?
            .set_default("server.bind_port", i64::from(defaults.server.bind_port))?
            .set_default("server.max_concurrent_requests", 256)?
            .set_default("upstream.network", defaults.upstream.network)?
            .set_default("upstream.api_keys", Vec::<String>::new())?
            .set_default("upstream.url_template", defaults.upstream.url_template)?
            .set_default("upstream.timeout_seconds", 10)?
            .set_default("upstream.retry_delay_ms", 250)?
            .set_default("ingest.enabled", true)?
            .set_default("ingest.fetch_interval_ms", 12_000)?
            .set_default("ingest.stack_capacity", 1000)?
            .set_default("ingest.resume_threshold", 800)?
            .set_default("ingest.store_input_data", false)?
            .set_default("store.database_url", defaults.store.database_url)?
            .set_default("store.max_connections", 4)?
            .set_default("query.default_limit", 100)?
            .set_default("query.max_limit", 1000)?
            .set_default("query.pending_default", 10)?
            .set_default("query.pending_max", 100)?
            .set_default("nl2sql.timeout_seconds", 20)?
            .set_default("auth.session_ttl_seconds", 86_400)?
            .set_default("auth.purge_interval_seconds", 300)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .set_default("metrics.enabled", true)?
            .add_source(File::with_name(&config_path.as_ref().to_string_lossy()).required(false))
            .add_source(
                Environment::with_prefix("ETHPULSE")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("upstream.api_keys")
                    .try_parsing(true),
            )
            .build()?;

        config_builder.try_deserialize()
    }

    /// Loads configuration from `config/config.toml` with fallback to defaults.
    ///
    /// The config file path can be overridden using the `ETHPULSE_CONFIG` environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration cannot be loaded or parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("ETHPULSE_CONFIG").unwrap_or_else(|_| "config/config.toml".to_string());
        Self::from_file(&config_path)
    }

    /// Returns the parsed socket address for the HTTP server.
    ///
    /// # Errors
    ///
    /// Returns an error string if the address cannot be parsed.
    pub fn socket_addr(&self) -> Result<std::net::SocketAddr, String> {
        format!("{}:{}", self.server.bind_address, self.server.bind_port)
            .parse()
            .map_err(|_| {
                format!(
                    "Invalid socket address: {}:{}",
                    self.server.bind_address, self.server.bind_port
                )
            })
    }

    #[must_use]
    pub fn fetch_interval(&self) -> Duration {
        Duration::from_millis(self.ingest.fetch_interval_ms)
    }

    #[must_use]
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream.timeout_seconds)
    }

    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.upstream.retry_delay_ms)
    }

    /// Validates the configuration for correctness and consistency.
    ///
    /// A missing blockchain credential is reported here and is fatal at startup.
    ///
    /// # Errors
    ///
    /// Returns a descriptive error string if validation fails.
    pub fn validate(&self) -> Result<(), String> {
        if self.upstream.api_keys.iter().all(|k| k.trim().is_empty()) {
            return Err("No upstream API key configured (upstream.api_keys)".to_string());
        }

        if !self.upstream.url_template.contains("{key}") {
            return Err("upstream.url_template must contain {key}".to_string());
        }

        if self.upstream.timeout_seconds == 0 {
            return Err("Upstream timeout must be greater than 0".to_string());
        }

        if self.ingest.fetch_interval_ms == 0 {
            return Err("Fetch interval must be greater than 0".to_string());
        }

        if self.ingest.stack_capacity == 0 {
            return Err("Stack capacity must be greater than 0".to_string());
        }

        if self.ingest.resume_threshold == 0 ||
            self.ingest.resume_threshold >= self.ingest.stack_capacity
        {
            return Err(format!(
                "Resume threshold must be in 1..{} (got {})",
                self.ingest.stack_capacity, self.ingest.resume_threshold
            ));
        }

        if self.query.default_limit <= 0 || self.query.max_limit <= 0 {
            return Err("Query limits must be greater than 0".to_string());
        }

        if self.query.default_limit > self.query.max_limit {
            return Err("Default query limit cannot exceed the maximum".to_string());
        }

        if self.query.pending_default <= 0 || self.query.pending_max <= 0 {
            return Err("Pending queue limits must be greater than 0".to_string());
        }

        if let Some(ref key) = self.auth.encryption_key {
            if key.len() < MIN_ENCRYPTION_KEY_LEN {
                return Err(format!(
                    "Encryption key must be at least {MIN_ENCRYPTION_KEY_LEN} characters"
                ));
            }
        }

        if self.auth.session_ttl_seconds == 0 || self.auth.purge_interval_seconds == 0 {
            return Err("Session TTL and purge interval must be greater than 0".to_string());
        }

        if self.server.max_concurrent_requests == 0 {
            return Err("Max concurrent requests must be greater than 0".to_string());
        }

        if !["json", "pretty"].contains(&self.logging.format.as_str()) {
            return Err("Logging format must be 'json' or 'pretty'".to_string());
        }

        Ok(())
    }

    /// Clamps a caller-supplied row limit into `1..=max_limit`, using the default when absent.
    #[must_use]
    pub fn clamp_limit(&self, requested: Option<i64>) -> i64 {
        match requested {
            Some(limit) if limit > 0 => limit.min(self.query.max_limit),
            _ => self.query.default_limit,
        }
    }
}
