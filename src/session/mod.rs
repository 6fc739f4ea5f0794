// Module for session management
pub mod context_cache;
pub mod database;
pub mod pool;
pub mod sqlite;

pub use context_cache::{ContextKey, SessionFinder};
pub use database::{Database, DEFAULT_FINDER_PRUNE_THRESHOLD};
pub use pool::{ConnectionFactory, PoolStats, Session, SessionPool, WeakSession};
pub use sqlite::SqliteConnectionFactory;
