use tracing::{debug, info};

use crate::config::Config;
use crate::session::context_cache::{ContextKey, SessionFinder};
use crate::session::pool::{ConnectionFactory, PoolStats, Session, SessionPool};
use crate::session::sqlite::SqliteConnectionFactory;
use crate::sql::Dialect;
use crate::types::ColumnType;
use crate::Result;

pub const DEFAULT_FINDER_PRUNE_THRESHOLD: usize = 64;

/// Entry point for obtaining sessions.
///
/// Repeated calls from the same execution context share one session for as
/// long as somebody still holds it, so nested units of work see the same
/// connection and transaction scope.
pub struct Database<F: ConnectionFactory> {
    sessions: SessionPool<F>,
    finder: SessionFinder<F::Connection>,
    dialect: Dialect,
}

impl<F: ConnectionFactory> Database<F> {
    pub fn new(factory: F) -> Self {
        Self::with_prune_threshold(factory, DEFAULT_FINDER_PRUNE_THRESHOLD)
    }

    pub fn with_prune_threshold(factory: F, prune_threshold: usize) -> Self {
        let dialect = factory.dialect();
        Self {
            sessions: SessionPool::new(factory),
            finder: SessionFinder::new(prune_threshold),
            dialect,
        }
    }

    /// Session for the calling thread
    pub fn get_session(&self) -> Result<Session<F::Connection>> {
        self.get_session_for(&ContextKey::current_thread())
    }

    pub fn get_session_for(&self, context: &ContextKey) -> Result<Session<F::Connection>> {
        if let Some(session) = self.finder.find(context) {
            debug!("Reusing session on connection {} for {}", session.connection_id(), context);
            return Ok(session);
        }

        let session = self.sessions.get()?;
        self.finder.observe(*context, &session);
        debug!("Issued session on connection {} to {}", session.connection_id(), context);
        Ok(session)
    }

    /// True if the calling thread's current session is `session`
    pub fn is_using_session(&self, session: &Session<F::Connection>) -> bool {
        self.is_using_session_for(&ContextKey::current_thread(), session)
    }

    pub fn is_using_session_for(&self, context: &ContextKey, session: &Session<F::Connection>) -> bool {
        self.finder.is_observing(context, session)
    }

    /// Stop reusing every existing physical connection, e.g. after a fork or a schema change
    pub fn discard_connections(&self) {
        info!("Discarding all pooled connections");
        self.sessions.reset();
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Column type the backend hands back for a column declared as `declared`
    pub fn retrievable_column_type(&self, declared: ColumnType) -> ColumnType {
        declared
    }

    pub fn max_column_name_length(&self) -> Option<usize> {
        self.dialect.max_identifier_length()
    }

    pub fn pool(&self) -> &SessionPool<F> {
        &self.sessions
    }

    pub fn pool_stats(&self) -> PoolStats {
        self.sessions.stats()
    }
}

impl Database<SqliteConnectionFactory> {
    /// Database backed by the SQLite file (or in-memory databases) named in `config`
    pub fn open(config: &Config) -> Result<Self> {
        let factory = SqliteConnectionFactory::from_config(config)?;
        info!("Opening database {}", config.database_target());
        Ok(Self::with_prune_threshold(factory, config.finder_prune_threshold))
    }
}
