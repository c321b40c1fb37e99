//! Server configuration
//!
//! Values come from, in increasing precedence: built-in defaults, an optional
//! TOML file, then command-line flags (which fall back to environment
//! variables, see [`crate::cli`]).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("unsupported rule store '{0}' (expected .json, .yaml, .yml, .db, .sqlite or .sqlite3)")]
    UnsupportedStore(String),

    #[error("invalid environment '{0}'")]
    InvalidEnvironment(String),
}

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    /// Production logs are emitted as JSON
    pub fn json_logs(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Staging => write!(f, "staging"),
            Environment::Production => write!(f, "production"),
        }
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "staging" | "stage" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(ConfigError::InvalidEnvironment(s.to_string())),
        }
    }
}

/// Where projects and rules are read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreKind {
    /// Built-in sample data
    Fixtures,
    /// JSON or YAML seed file loaded into memory
    SeedFile(PathBuf),
    /// SQLite database file
    Sqlite(PathBuf),
}

impl StoreKind {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "json" | "yaml" | "yml" => Ok(StoreKind::SeedFile(path.to_path_buf())),
            "db" | "sqlite" | "sqlite3" => Ok(StoreKind::Sqlite(path.to_path_buf())),
            _ => Err(ConfigError::UnsupportedStore(path.display().to_string())),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    18080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_project_id() -> String {
    rule_mcp_core::detector::DEFAULT_PROJECT_ID.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    pub log_level: String,
    /// Seed file or SQLite database; built-in fixtures when unset
    pub rule_store: Option<PathBuf>,
    pub default_project_id: String,
    /// Compiled pattern cache capacity, 0 disables caching
    pub pattern_cache_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: Environment::default(),
            log_level: default_log_level(),
            rule_store: None,
            default_project_id: default_project_id(),
            pattern_cache_size: 0,
        }
    }
}

impl ServerConfig {
    /// Load from a TOML file. Missing keys keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Defaults, or the given file when present
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn store_kind(&self) -> Result<StoreKind, ConfigError> {
        match &self.rule_store {
            Some(path) => StoreKind::from_path(path),
            None => Ok(StoreKind::Fixtures),
        }
    }
}
