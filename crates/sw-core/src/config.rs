//! Configuration types and parsing for stepwise.yml

use crate::error::{CoreError, CoreResult};
use crate::ledger_table::LedgerTable;
use crate::parser::DEFAULT_COMMENT_MARKER;
use crate::splitter::DEFAULT_BATCH_SEPARATOR;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file names looked up in a project directory, in order.
pub const CONFIG_FILE_NAMES: &[&str] = &["stepwise.yml", "stepwise.yaml"];

/// Main project configuration from stepwise.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Directory holding migration scripts, relative to the project root
    #[serde(default = "default_migrations_dir")]
    pub migrations_dir: String,

    /// Table recording applied migrations
    #[serde(default)]
    pub ledger_table: LedgerTable,

    /// Per-statement timeout in seconds
    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,

    /// Line that separates batches inside a migration
    #[serde(default = "default_batch_separator")]
    pub batch_separator: String,

    /// Line-comment marker of the SQL dialect
    #[serde(default = "default_comment_marker")]
    pub comment_marker: String,

    /// Database connection configuration
    #[serde(default)]
    pub database: DatabaseConfig,
}

/// Database type selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DbType {
    /// DuckDB (default)
    #[default]
    DuckDb,
}

impl std::fmt::Display for DbType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DbType::DuckDb => write!(f, "duckdb"),
        }
    }
}

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Database type
    #[serde(rename = "type", default)]
    pub db_type: DbType,

    /// Database path (file-based or :memory:)
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            db_type: DbType::default(),
            path: default_db_path(),
        }
    }
}

const DEFAULT_DB_PATH: &str = "stepwise.duckdb";

/// Default per-statement timeout; DDL on large tables can be slow.
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 600;

fn default_migrations_dir() -> String {
    "migrations".to_string()
}

fn default_command_timeout_secs() -> u64 {
    DEFAULT_COMMAND_TIMEOUT_SECS
}

fn default_batch_separator() -> String {
    DEFAULT_BATCH_SEPARATOR.to_string()
}

fn default_comment_marker() -> String {
    DEFAULT_COMMENT_MARKER.to_string()
}

fn default_db_path() -> String {
    DEFAULT_DB_PATH.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            migrations_dir: default_migrations_dir(),
            ledger_table: LedgerTable::default(),
            command_timeout_secs: DEFAULT_COMMAND_TIMEOUT_SECS,
            batch_separator: default_batch_separator(),
            comment_marker: default_comment_marker(),
            database: DatabaseConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_yaml(&content)
    }

    /// Parse and validate configuration from YAML text
    pub fn from_yaml(content: &str) -> CoreResult<Self> {
        let config: Config = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a project directory
    /// Looks for stepwise.yml or stepwise.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.exists())
            .map(|path| Self::load(&path))
            .unwrap_or_else(|| {
                Err(CoreError::ConfigNotFound {
                    path: dir.join(CONFIG_FILE_NAMES[0]).display().to_string(),
                })
            })
    }

    /// Validate the configuration
    fn validate(&self) -> CoreResult<()> {
        if self.migrations_dir.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "migrations_dir cannot be empty".to_string(),
            });
        }

        if self.command_timeout_secs == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "command_timeout_secs must be greater than zero".to_string(),
            });
        }

        let separator = self.batch_separator.as_str();
        if separator.is_empty() || separator.chars().any(char::is_whitespace) {
            return Err(CoreError::ConfigInvalid {
                message: format!(
                    "batch_separator '{separator}' must be a single non-empty token"
                ),
            });
        }

        if self.comment_marker.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "comment_marker cannot be empty".to_string(),
            });
        }

        if self.database.path.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "database.path cannot be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Per-statement timeout as a [`Duration`]
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    /// Get the absolute migrations directory relative to a project root
    pub fn migrations_dir_absolute(&self, root: &Path) -> PathBuf {
        root.join(&self.migrations_dir)
    }

    /// Resolve the database path against a project root.
    ///
    /// `:memory:` and absolute paths are returned unchanged.
    pub fn database_path_absolute(&self, root: &Path) -> String {
        let path = self.database.path.as_str();
        if path == ":memory:" || Path::new(path).is_absolute() {
            path.to_string()
        } else {
            root.join(path).display().to_string()
        }
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
