//! Server configuration.
//!
//! Layered with the `config` crate, later layers win:
//!
//! ```text
//!   built-in defaults
//!        │
//!        ▼
//!   tally.toml  (path from TALLY_CONFIG, default ./tally.toml, optional)
//!        │
//!        ▼
//!   TALLY__SECTION__KEY environment variables
//!        (TALLY__SERVER__PORT=9000, TALLY__AUTH__JWT_SECRET=...)
//! ```

use std::env;
use std::path::{Path, PathBuf};

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

/// Variable naming the config file.
pub const CONFIG_PATH_VAR: &str = "TALLY_CONFIG";

pub const DEFAULT_CONFIG_PATH: &str = "./tally.toml";

/// Development secret. Deployments override it through the file or
/// `TALLY__AUTH__JWT_SECRET`.
const DEV_JWT_SECRET: &str = "tally-dev-secret-change-in-production";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub scan: ScanConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origins allowed by CORS. Empty allows any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file, created on first start.
    pub path: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// Fixed session length; tokens are not refreshed.
    pub session_ttl_secs: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    pub cooldown_ms: i64,
    /// Scans kept for pollers.
    pub buffer_size: usize,
}

/// Printed on receipts and report headers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
}

impl AppConfig {
    /// Loads defaults, the optional config file and `TALLY__*` variables.
    pub fn load() -> Result<Self, ConfigError> {
        let path = env::var(CONFIG_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

        let builder = Self::defaults()?
            .add_source(File::from(path.as_path()).required(false))
            .add_source(
                Environment::with_prefix("TALLY")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors_origins")
                    .try_parsing(true),
            );

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overlaid with a TOML document. Used by tests and tooling.
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = Self::defaults()?
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        let builder = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("database.path", "./tally.db")?
            .set_default("database.max_connections", 5)?
            .set_default("auth.jwt_secret", DEV_JWT_SECRET)?
            .set_default("auth.session_ttl_secs", 8 * 60 * 60)?
            .set_default("scan.cooldown_ms", tally_core::scan::DEFAULT_COOLDOWN_MS)?
            .set_default("scan.buffer_size", 100)?
            .set_default("store.name", "Tally Store")?;
        Ok(builder)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("auth.jwt_secret".to_string()));
        }
        if self.auth.session_ttl_secs <= 0 {
            return Err(ConfigError::InvalidValue("auth.session_ttl_secs".to_string()));
        }
        if self.scan.buffer_size == 0 {
            return Err(ConfigError::InvalidValue("scan.buffer_size".to_string()));
        }
        if self.scan.cooldown_ms < 0 {
            return Err(ConfigError::InvalidValue("scan.cooldown_ms".to_string()));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::InvalidValue("database.max_connections".to_string()));
        }
        Ok(())
    }

    /// `host:port` for the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn database_path(&self) -> &Path {
        Path::new(&self.database.path)
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.auth.jwt_secret == DEV_JWT_SECRET
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                cors_origins: Vec::new(),
            },
            database: DatabaseConfig {
                path: "./tally.db".to_string(),
                max_connections: 5,
            },
            auth: AuthConfig {
                jwt_secret: DEV_JWT_SECRET.to_string(),
                session_ttl_secs: 8 * 60 * 60,
            },
            scan: ScanConfig {
                cooldown_ms: tally_core::scan::DEFAULT_COOLDOWN_MS,
                buffer_size: 100,
            },
            store: StoreConfig {
                name: "Tally Store".to_string(),
                address: None,
            },
        }
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}
