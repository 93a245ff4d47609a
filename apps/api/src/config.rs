//! # Server Configuration
//!
//! Configuration management for the HTTP server.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     KASIR_PORT=9000                                                    │
//! │     KASIR_DB_PATH=/var/lib/kasir/kasir.db                              │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     $KASIR_CONFIG, or ./kasir.toml                                     │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     0.0.0.0:8080, ./kasir.db                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # kasir.toml
//! [server]
//! bind_addr = "0.0.0.0"
//! port = 8080
//!
//! [database]
//! path = "./kasir.db"
//! max_connections = 5
//! min_connections = 1
//! connect_timeout_secs = 30
//! busy_timeout_secs = 5
//!
//! [checkout]
//! timeout_secs = 10
//!
//! [log]
//! filter = "info,kasir=debug,sqlx=warn"
//! json = false
//! ```

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use kasir_db::DbConfig;

/// Config file read when neither an explicit path nor `KASIR_CONFIG` is given.
pub const DEFAULT_CONFIG_FILE: &str = "kasir.toml";

// =============================================================================
// Errors
// =============================================================================

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Server Settings
// =============================================================================

/// Listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (default: 0.0.0.0 for all interfaces).
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// TCP port. 0 asks the OS for a free port.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_addr: default_bind_addr(),
            port: default_port(),
        }
    }
}

// =============================================================================
// Database Settings
// =============================================================================

/// SQLite pool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite file, created on first start.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Pool acquire timeout (seconds).
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// How long a writer waits for SQLite's lock (seconds).
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_secs: u64,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./kasir.db")
}

fn default_max_connections() -> u32 {
    5
}

fn default_min_connections() -> u32 {
    1
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_busy_timeout() -> u64 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            path: default_db_path(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            busy_timeout_secs: default_busy_timeout(),
        }
    }
}

// =============================================================================
// Checkout Settings
// =============================================================================

/// Checkout engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutConfig {
    /// Upper bound on one checkout, lock wait included (seconds).
    #[serde(default = "default_checkout_timeout")]
    pub timeout_secs: u64,
}

fn default_checkout_timeout() -> u64 {
    10
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        CheckoutConfig {
            timeout_secs: default_checkout_timeout(),
        }
    }
}

// =============================================================================
// Log Settings
// =============================================================================

/// Logging settings. `RUST_LOG`, when set, wins over `filter`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_filter")]
    pub filter: String,

    /// Emit one JSON object per line instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

fn default_log_filter() -> String {
    "info,kasir=debug,sqlx=warn".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            filter: default_log_filter(),
            json: false,
        }
    }
}

// =============================================================================
// App Configuration
// =============================================================================

/// Where the configuration came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// The config file that was looked up.
    pub path: PathBuf,

    /// True if `path` existed and was parsed.
    pub from_file: bool,

    /// `KASIR_*` variables that replaced a setting.
    pub overridden: Vec<&'static str>,

    /// `KASIR_*` variables whose value could not be parsed.
    pub ignored: Vec<(&'static str, String)>,
}

impl LoadReport {
    /// Logs the report. Call once tracing is initialized.
    pub fn log(&self) {
        if self.from_file {
            info!(path = ?self.path, "Loaded config from file");
        } else {
            debug!(path = ?self.path, "Config file not found, using defaults");
        }

        for var in &self.overridden {
            debug!(var, "Setting overridden from environment");
        }

        for (var, value) in &self.ignored {
            warn!(var, value = %value, "Ignoring invalid environment value");
        }
    }
}

/// Complete server configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub checkout: CheckoutConfig,

    #[serde(default)]
    pub log: LogConfig,
}

impl AppConfig {
    /// Loads configuration from file and environment.
    ///
    /// ## Loading Order
    /// 1. Start with defaults
    /// 2. Load from TOML file if it exists
    /// 3. Override with environment variables
    /// 4. Validate
    ///
    /// Runs before tracing is initialized, so what happened is returned as a
    /// [`LoadReport`] for the caller to log.
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<(Self, LoadReport)> {
        let path = config_path
            .or_else(|| std::env::var_os("KASIR_CONFIG").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        let from_file = path.exists();
        let mut config = if from_file {
            Self::from_file(&path)?
        } else {
            Self::default()
        };

        let mut report = config.apply_overrides(|key| std::env::var(key).ok());
        report.path = path;
        report.from_file = from_file;

        config.validate()?;

        Ok((config, report))
    }

    /// Parses a TOML file. Missing sections and keys take their defaults.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    /// Parses TOML text.
    pub fn from_toml(contents: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Applies `KASIR_*` overrides read through `lookup`.
    ///
    /// Unparseable values leave the setting unchanged and are listed in the
    /// returned report.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> LoadReport {
        let mut report = LoadReport::default();

        if let Some(addr) = lookup("KASIR_BIND_ADDR") {
            self.server.bind_addr = addr;
            report.overridden.push("KASIR_BIND_ADDR");
        }

        if let Some(port) = lookup("KASIR_PORT") {
            match port.parse::<u16>() {
                Ok(p) => {
                    self.server.port = p;
                    report.overridden.push("KASIR_PORT");
                }
                Err(_) => report.ignored.push(("KASIR_PORT", port)),
            }
        }

        if let Some(path) = lookup("KASIR_DB_PATH") {
            self.database.path = PathBuf::from(path);
            report.overridden.push("KASIR_DB_PATH");
        }

        if let Some(max) = lookup("KASIR_DB_MAX_CONNECTIONS") {
            match max.parse::<u32>() {
                Ok(m) => {
                    self.database.max_connections = m;
                    report.overridden.push("KASIR_DB_MAX_CONNECTIONS");
                }
                Err(_) => report.ignored.push(("KASIR_DB_MAX_CONNECTIONS", max)),
            }
        }

        if let Some(secs) = lookup("KASIR_CHECKOUT_TIMEOUT_SECS") {
            match secs.parse::<u64>() {
                Ok(s) => {
                    self.checkout.timeout_secs = s;
                    report.overridden.push("KASIR_CHECKOUT_TIMEOUT_SECS");
                }
                Err(_) => report.ignored.push(("KASIR_CHECKOUT_TIMEOUT_SECS", secs)),
            }
        }

        if let Some(json) = lookup("KASIR_LOG_JSON") {
            let parsed = match json.to_lowercase().as_str() {
                "1" | "true" | "yes" => Some(true),
                "0" | "false" | "no" => Some(false),
                _ => None,
            };
            match parsed {
                Some(on) => {
                    self.log.json = on;
                    report.overridden.push("KASIR_LOG_JSON");
                }
                None => report.ignored.push(("KASIR_LOG_JSON", json)),
            }
        }

        report
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        self.socket_addr()?;

        if self.database.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("database.path must not be empty".into()));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::Invalid(format!(
                "database.min_connections ({}) exceeds max_connections ({})",
                self.database.min_connections, self.database.max_connections
            )));
        }

        if self.database.busy_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "database.busy_timeout_secs must be greater than 0".into(),
            ));
        }

        if self.checkout.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "checkout.timeout_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Returns the listener address.
    pub fn socket_addr(&self) -> ConfigResult<SocketAddr> {
        let ip: IpAddr = self.server.bind_addr.parse().map_err(|_| {
            ConfigError::Invalid(format!(
                "server.bind_addr is not an IP address: '{}'",
                self.server.bind_addr
            ))
        })?;
        Ok(SocketAddr::new(ip, self.server.port))
    }

    /// Builds the database configuration.
    pub fn to_db_config(&self) -> DbConfig {
        DbConfig::new(self.database.path.clone())
            .max_connections(self.database.max_connections)
            .min_connections(self.database.min_connections)
            .connect_timeout(Duration::from_secs(self.database.connect_timeout_secs))
            .busy_timeout(Duration::from_secs(self.database.busy_timeout_secs))
            .checkout_timeout(Duration::from_secs(self.checkout.timeout_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.path, PathBuf::from("./kasir.db"));
        assert_eq!(config.checkout.timeout_secs, 10);
        assert!(!config.log.json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [server]
            port = 9000

            [checkout]
            timeout_secs = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.bind_addr, "0.0.0.0");
        assert_eq!(config.checkout.timeout_secs, 3);
        assert_eq!(config.database.busy_timeout_secs, 5);
    }

    #[test]
    fn test_malformed_toml_is_rejected() {
        let err = AppConfig::from_toml("[server]\nport = \"eighty\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_env_overrides_win() {
        let mut config = AppConfig::from_toml("[server]\nport = 9000").unwrap();
        let report = config.apply_overrides(lookup_from(&[
            ("KASIR_PORT", "7000"),
            ("KASIR_BIND_ADDR", "127.0.0.1"),
            ("KASIR_DB_PATH", "/tmp/kasir-test.db"),
            ("KASIR_DB_MAX_CONNECTIONS", "8"),
            ("KASIR_CHECKOUT_TIMEOUT_SECS", "2"),
            ("KASIR_LOG_JSON", "true"),
        ]));

        assert_eq!(config.server.port, 7000);
        assert_eq!(config.server.bind_addr, "127.0.0.1");
        assert_eq!(config.database.path, PathBuf::from("/tmp/kasir-test.db"));
        assert_eq!(config.database.max_connections, 8);
        assert_eq!(config.checkout.timeout_secs, 2);
        assert!(config.log.json);
        assert_eq!(report.overridden.len(), 6);
        assert!(report.ignored.is_empty());
    }

    #[test]
    fn test_invalid_env_values_are_ignored() {
        let mut config = AppConfig::default();
        let report = config.apply_overrides(lookup_from(&[
            ("KASIR_PORT", "not-a-port"),
            ("KASIR_LOG_JSON", "maybe"),
            ("KASIR_DB_PATH", "/tmp/kasir-test.db"),
        ]));
        assert_eq!(config.server.port, 8080);
        assert!(!config.log.json);

        // reported for logging once tracing is up
        assert_eq!(
            report.ignored,
            vec![
                ("KASIR_PORT", "not-a-port".to_string()),
                ("KASIR_LOG_JSON", "maybe".to_string()),
            ]
        );
        assert_eq!(report.overridden, vec!["KASIR_DB_PATH"]);
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();

        config.server.bind_addr = "localhost".to_string();
        assert!(config.validate().is_err());
        config.server.bind_addr = "127.0.0.1".to_string();
        assert!(config.validate().is_ok());

        config.database.max_connections = 0;
        assert!(config.validate().is_err());
        config.database.max_connections = 2;
        config.database.min_connections = 3;
        assert!(config.validate().is_err());
        config.database.min_connections = 1;

        config.checkout.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_to_db_config() {
        let mut config = AppConfig::default();
        config.database.busy_timeout_secs = 7;
        config.checkout.timeout_secs = 4;

        let db = config.to_db_config();
        assert_eq!(db.busy_timeout, Duration::from_secs(7));
        assert_eq!(db.checkout_timeout, Duration::from_secs(4));
        assert_eq!(db.max_connections, 5);
    }

    #[test]
    fn test_socket_addr() {
        let mut config = AppConfig::default();
        config.server.bind_addr = "::1".to_string();
        config.server.port = 0;
        let addr = config.socket_addr().unwrap();
        assert!(addr.is_ipv6());
        assert_eq!(addr.port(), 0);
    }
}
