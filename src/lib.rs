pub mod config;
pub mod exprn;
pub mod session;
pub mod sql;
pub mod types;

use thiserror::Error;

pub use exprn::{ColumnId, ColumnIdSet, ColumnRef, Expressionist, Relation, Table};
pub use session::{ContextKey, Database, Session, SessionPool};
pub use sql::{Dialect, SqlBuffer, SqlWriter};

#[derive(Error, Debug)]
pub enum SqlWeaveError {
    #[error("Failed to establish connection to {target}: {source}")]
    Connection {
        target: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("SQL parse error: {0}")]
    SqlParse(#[from] sqlparser::parser::ParserError),

    #[error("Invalid expression: {0}")]
    InvalidExpression(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, SqlWeaveError>;

impl SqlWeaveError {
    /// Wrap a backend failure that prevented a physical connection from opening.
    pub fn connection<E>(target: impl Into<String>, source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        SqlWeaveError::Connection {
            target: target.into(),
            source: source.into(),
        }
    }

    /// Get the PostgreSQL SQLSTATE code for this error
    pub fn sqlstate(&self) -> &str {
        match self {
            SqlWeaveError::Connection { .. } => "08001", // sqlclient_unable_to_establish_sqlconnection
            SqlWeaveError::Sqlite(_) => "58000", // system_error
            SqlWeaveError::SqlParse(_) => "42601", // syntax_error
            SqlWeaveError::InvalidExpression(_) => "42000", // syntax_error_or_access_rule_violation
            SqlWeaveError::Config(_) => "F0000", // config_file_error
        }
    }

    pub fn is_connection_failure(&self) -> bool {
        matches!(self, SqlWeaveError::Connection { .. })
    }
}
