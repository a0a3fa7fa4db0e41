//! # Folio Configuration
//!
//! File + environment configuration for processes that embed the Folio core.
//!
//! ## Configuration Sources (later overrides earlier)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Defaults (this file)                                               │
//! │  2. Config file                                                        │
//! │     explicit path, or the platform config dir:                         │
//! │     ~/.config/folio/folio.toml (Linux)                                 │
//! │     ~/Library/Application Support/com.folio.folio/folio.toml (macOS)   │
//! │  3. Environment variables (FOLIO_*)                                    │
//! │  4. validate()                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example Config File
//! ```toml
//! [database]
//! path = "/var/lib/folio/folio.db"
//! max_connections = 8
//! busy_timeout_ms = 5000
//!
//! [logging]
//! filter = "info,folio=debug,sqlx=warn"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::pool::DbConfig;

const CONFIG_FILE_NAME: &str = "folio.toml";
const DATABASE_FILE_NAME: &str = "folio.db";

// =============================================================================
// Sections
// =============================================================================

/// `[database]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file path. Defaults to the platform data directory.
    #[serde(default)]
    pub path: Option<PathBuf>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// How long a writer waits for SQLite's write lock before giving up.
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_ms: u64,

    #[serde(default = "default_true")]
    pub run_migrations: bool,
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
    5_000
}

fn default_true() -> bool {
    true
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: None,
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            busy_timeout_ms: default_busy_timeout(),
            run_migrations: true,
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// `tracing_subscriber::EnvFilter` directive. `RUST_LOG` wins when set.
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_filter() -> String {
    "info,folio=debug,sqlx=warn".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            filter: default_filter(),
        }
    }
}

// =============================================================================
// FolioConfig
// =============================================================================

/// Complete configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FolioConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl FolioConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// A missing file is not an error; defaults are used instead.
    pub fn load(config_path: Option<PathBuf>) -> DbResult<Self> {
        let mut config = match config_path.or_else(Self::default_config_path) {
            Some(path) if path.exists() => {
                info!(?path, "Loading folio config from file");
                Self::from_file(&path)?
            }
            Some(path) => {
                debug!(?path, "Config file not found, using defaults");
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Parses a TOML config file without applying overrides.
    pub fn from_file(path: &Path) -> DbResult<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| DbError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml(&contents)
    }

    /// Parses TOML text without applying overrides.
    pub fn from_toml(contents: &str) -> DbResult<Self> {
        toml::from_str(contents).map_err(|e| DbError::Config(e.to_string()))
    }

    /// Validates the configuration.
    pub fn validate(&self) -> DbResult<()> {
        let db = &self.database;

        if db.max_connections == 0 {
            return Err(DbError::Config(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        if db.min_connections > db.max_connections {
            return Err(DbError::Config(format!(
                "database.min_connections ({}) exceeds max_connections ({})",
                db.min_connections, db.max_connections
            )));
        }

        if let Some(path) = &db.path {
            if path.as_os_str().is_empty() {
                return Err(DbError::Config("database.path must not be empty".into()));
            }
        }

        Ok(())
    }

    /// Builds the pool configuration, resolving the default database path.
    pub fn db_config(&self) -> DbResult<DbConfig> {
        let db = &self.database;
        let path = match &db.path {
            Some(path) => path.clone(),
            None => Self::default_database_path().ok_or_else(|| {
                DbError::Config("No database path configured and no data directory available".into())
            })?,
        };

        Ok(DbConfig::new(path)
            .max_connections(db.max_connections)
            .min_connections(db.min_connections)
            .connect_timeout(Duration::from_secs(db.connect_timeout_secs))
            .busy_timeout(Duration::from_millis(db.busy_timeout_ms))
            .run_migrations(db.run_migrations))
    }

    /// Applies `FOLIO_*` environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("FOLIO_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = Some(PathBuf::from(path));
        }

        if let Ok(max) = std::env::var("FOLIO_DB_MAX_CONNECTIONS") {
            match max.parse() {
                Ok(max) => self.database.max_connections = max,
                Err(_) => warn!(value = %max, "Ignoring invalid FOLIO_DB_MAX_CONNECTIONS"),
            }
        }

        if let Ok(ms) = std::env::var("FOLIO_DB_BUSY_TIMEOUT_MS") {
            match ms.parse() {
                Ok(ms) => self.database.busy_timeout_ms = ms,
                Err(_) => warn!(value = %ms, "Ignoring invalid FOLIO_DB_BUSY_TIMEOUT_MS"),
            }
        }

        if let Ok(filter) = std::env::var("FOLIO_LOG") {
            self.logging.filter = filter;
        }
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("com", "folio", "folio")
    }

    fn default_config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Platform data directory location of the database file.
    pub fn default_database_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.data_dir().join(DATABASE_FILE_NAME))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FolioConfig::default();
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.database.busy_timeout_ms, 5_000);
        assert!(config.database.run_migrations);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_file() {
        let config = FolioConfig::from_toml(
            r#"
            [database]
            path = "/tmp/folio-test.db"
            max_connections = 8
            "#,
        )
        .unwrap();

        assert_eq!(config.database.path, Some(PathBuf::from("/tmp/folio-test.db")));
        assert_eq!(config.database.max_connections, 8);
        assert_eq!(config.database.min_connections, 1);
        assert_eq!(config.logging.filter, "info,folio=debug,sqlx=warn");

        let db = config.db_config().unwrap();
        assert_eq!(db.database_path, PathBuf::from("/tmp/folio-test.db"));
        assert_eq!(db.max_connections, 8);
    }

    #[test]
    fn test_config_validation() {
        let mut config = FolioConfig::default();
        config.database.max_connections = 0;
        assert!(matches!(config.validate(), Err(DbError::Config(_))));

        let mut config = FolioConfig::default();
        config.database.min_connections = 10;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            FolioConfig::from_toml("[database]\nmax_connections = \"many\""),
            Err(DbError::Config(_))
        ));
    }

    #[test]
    fn test_load_from_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[database]\nbusy_timeout_ms = 250\n").unwrap();

        let config = FolioConfig::from_file(&path).unwrap();
        assert_eq!(config.database.busy_timeout_ms, 250);
    }
}
