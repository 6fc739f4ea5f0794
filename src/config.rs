use clap::Parser;
use std::time::Duration;

use crate::SqlWeaveError;

const JOURNAL_MODES: &[&str] = &["DELETE", "TRUNCATE", "PERSIST", "MEMORY", "WAL", "OFF"];
const SYNCHRONOUS_MODES: &[&str] = &["OFF", "NORMAL", "FULL", "EXTRA"];

#[derive(Parser, Debug, Clone)]
#[command(name = "sqlweave")]
#[command(about = "sqlweave - session pooling and typed SQL expression trees on top of SQLite", long_about = None)]
pub struct Config {
    #[arg(short, long, default_value = "sqlweave.db", env = "SQLWEAVE_DATABASE")]
    pub database: String,

    #[arg(long, env = "SQLWEAVE_IN_MEMORY", help = "Use in-memory SQLite databases (each connection gets its own)")]
    pub in_memory: bool,

    #[arg(long, default_value = "info", env = "SQLWEAVE_LOG_LEVEL")]
    pub log_level: String,

    // Session configuration
    #[arg(long, default_value = "64", env = "SQLWEAVE_FINDER_PRUNE_THRESHOLD", help = "Number of per-context session observations kept before expired ones are pruned")]
    pub finder_prune_threshold: usize,

    #[arg(long, default_value = "5000", env = "SQLWEAVE_BUSY_TIMEOUT_MS", help = "SQLite busy timeout for new connections in milliseconds")]
    pub busy_timeout_ms: u64,

    // SQLite PRAGMA settings
    #[arg(long, default_value = "WAL", env = "SQLWEAVE_JOURNAL_MODE", help = "SQLite journal mode (WAL, DELETE, TRUNCATE, etc.)")]
    pub pragma_journal_mode: String,

    #[arg(long, default_value = "NORMAL", env = "SQLWEAVE_SYNCHRONOUS", help = "SQLite synchronous mode (NORMAL, FULL, OFF)")]
    pub pragma_synchronous: String,

    #[arg(long, default_value = "-64000", env = "SQLWEAVE_CACHE_SIZE", help = "SQLite page cache size (negative for KB, positive for pages)")]
    pub pragma_cache_size: i32,
}

impl Config {
    /// Get a configuration instance with all values resolved from CLI args and environment variables
    pub fn load() -> Self {
        Config::parse()
    }

    /// Check values clap cannot check on its own
    pub fn validate(&self) -> Result<(), SqlWeaveError> {
        let journal_mode = self.pragma_journal_mode.to_uppercase();
        if !JOURNAL_MODES.contains(&journal_mode.as_str()) {
            return Err(SqlWeaveError::Config(format!(
                "unknown journal mode '{}'", self.pragma_journal_mode
            )));
        }

        let synchronous = self.pragma_synchronous.to_uppercase();
        if !SYNCHRONOUS_MODES.contains(&synchronous.as_str()) {
            return Err(SqlWeaveError::Config(format!(
                "unknown synchronous mode '{}'", self.pragma_synchronous
            )));
        }

        if self.finder_prune_threshold == 0 {
            return Err(SqlWeaveError::Config(
                "finder prune threshold must be at least 1".to_string(),
            ));
        }

        if !self.in_memory && self.database.trim().is_empty() {
            return Err(SqlWeaveError::Config("database path is empty".to_string()));
        }

        Ok(())
    }

    /// Get the busy timeout as Duration
    pub fn busy_timeout_duration(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    /// Path handed to SQLite, honoring the in-memory flag
    pub fn database_target(&self) -> &str {
        if self.in_memory {
            ":memory:"
        } else {
            &self.database
        }
    }
}

// Global configuration instance
lazy_static::lazy_static! {
    pub static ref CONFIG: Config = Config::load();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["sqlweave"]).unwrap();
        assert_eq!(config.database, "sqlweave.db");
        assert_eq!(config.pragma_journal_mode, "WAL");
        assert_eq!(config.busy_timeout_duration(), Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_in_memory_target() {
        let config = Config::try_parse_from(["sqlweave", "--in-memory"]).unwrap();
        assert_eq!(config.database_target(), ":memory:");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = Config::try_parse_from(["sqlweave", "--pragma-journal-mode", "sideways"]).unwrap();
        assert!(matches!(config.validate(), Err(SqlWeaveError::Config(_))));

        let config = Config::try_parse_from(["sqlweave", "--finder-prune-threshold", "0"]).unwrap();
        assert!(config.validate().is_err());

        let config = Config::try_parse_from(["sqlweave", "--pragma-synchronous", "full"]).unwrap();
        assert!(config.validate().is_ok());
    }
}
