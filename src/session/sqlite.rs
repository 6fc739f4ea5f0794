use std::time::Duration;

use rusqlite::{Connection, OpenFlags};
use tracing::debug;

use crate::config::Config;
use crate::session::pool::{ConnectionFactory, Session};
use crate::sql::Dialect;
use crate::types::Value;
use crate::{Result, SqlWeaveError};

/// Opens SQLite connections with the configured pragmas applied
#[derive(Debug, Clone)]
pub struct SqliteConnectionFactory {
    target: String,
    busy_timeout: Duration,
    pragma_sql: String,
}

impl SqliteConnectionFactory {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            busy_timeout: Duration::from_secs(5),
            pragma_sql: "PRAGMA temp_store = MEMORY;".to_string(),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(":memory:")
    }

    /// Factory for the database named in `config`, after validating its pragma values
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let pragma_sql = format!(
            "PRAGMA journal_mode = {};
             PRAGMA synchronous = {};
             PRAGMA cache_size = {};
             PRAGMA temp_store = MEMORY;",
            config.pragma_journal_mode, config.pragma_synchronous, config.pragma_cache_size
        );

        Ok(Self {
            target: config.database_target().to_string(),
            busy_timeout: config.busy_timeout_duration(),
            pragma_sql,
        })
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    fn open(&self) -> rusqlite::Result<Connection> {
        let conn = if self.target == ":memory:" {
            Connection::open_in_memory()?
        } else {
            let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX
                | OpenFlags::SQLITE_OPEN_URI;
            Connection::open_with_flags(&self.target, flags)?
        };

        conn.busy_timeout(self.busy_timeout)?;
        conn.execute_batch(&self.pragma_sql)?;
        Ok(conn)
    }
}

impl ConnectionFactory for SqliteConnectionFactory {
    type Connection = Connection;

    fn connect(&self) -> Result<Connection> {
        debug!("Opening SQLite connection to {}", self.target);
        self.open()
            .map_err(|e| SqlWeaveError::connection(self.target.clone(), e))
    }

    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }
}

/// Statement helpers for sessions backed by SQLite
impl Session<Connection> {
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.with_connection(|conn| conn.execute_batch(sql))
            .map_err(SqlWeaveError::Sqlite)
    }

    pub fn execute(&self, sql: &str) -> Result<usize> {
        self.with_connection(|conn| conn.execute(sql, []))
            .map_err(SqlWeaveError::Sqlite)
    }

    /// Run a query and collect every row as owned values
    pub fn query_rows(&self, sql: &str) -> Result<Vec<Vec<Value>>> {
        self.with_connection(|conn| -> rusqlite::Result<Vec<Vec<Value>>> {
            let mut stmt = conn.prepare(sql)?;
            let column_count = stmt.column_count();
            let rows = stmt.query_map([], |row| {
                let mut values = Vec::with_capacity(column_count);
                for i in 0..column_count {
                    values.push(Value::from_sqlite(row.get_ref(i)?));
                }
                Ok(values)
            })?;

            let mut result = Vec::new();
            for row in rows {
                result.push(row?);
            }
            Ok(result)
        })
        .map_err(SqlWeaveError::Sqlite)
    }

    /// First column of every row
    pub fn query_column(&self, sql: &str) -> Result<Vec<Value>> {
        Ok(self
            .query_rows(sql)?
            .into_iter()
            .filter_map(|row| row.into_iter().next())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::pool::SessionPool;
    use clap::Parser;

    #[test]
    fn test_in_memory_session_round_trip() {
        let pool = SessionPool::new(SqliteConnectionFactory::in_memory());
        let session = pool.get().unwrap();

        session.execute_batch("CREATE TABLE t (id INTEGER, name TEXT)").unwrap();
        assert_eq!(session.execute("INSERT INTO t VALUES (1, 'a'), (2, NULL)").unwrap(), 2);

        let rows = session.query_rows("SELECT id, name FROM t ORDER BY id").unwrap();
        assert_eq!(rows, vec![
            vec![Value::Integer(1), Value::Text("a".into())],
            vec![Value::Integer(2), Value::Null],
        ]);
    }

    #[test]
    fn test_unreachable_path_is_a_connection_error() {
        let factory = SqliteConnectionFactory::new("/nonexistent-dir-for-sqlweave/db.sqlite");
        let err = factory.connect().unwrap_err();
        assert!(err.is_connection_failure());
        assert!(err.to_string().contains("/nonexistent-dir-for-sqlweave/db.sqlite"));
    }

    #[test]
    fn test_from_config_applies_pragmas() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pragmas.db");
        let config = Config::try_parse_from([
            "sqlweave",
            "--database",
            path.to_str().unwrap(),
            "--pragma-journal-mode",
            "WAL",
        ])
        .unwrap();

        let pool = SessionPool::new(SqliteConnectionFactory::from_config(&config).unwrap());
        let session = pool.get().unwrap();
        let mode = session.query_column("PRAGMA journal_mode").unwrap();
        assert_eq!(mode, vec![Value::Text("wal".into())]);
    }

    #[test]
    fn test_from_config_rejects_unknown_pragma_values() {
        let mut config = Config::try_parse_from(["sqlweave", "--in-memory"]).unwrap();
        config.pragma_journal_mode = "WAL; DROP TABLE users".to_string();

        let err = SqliteConnectionFactory::from_config(&config).unwrap_err();
        assert!(matches!(err, SqlWeaveError::Config(_)));
        assert_eq!(err.sqlstate(), "F0000");
    }
}
