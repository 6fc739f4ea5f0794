use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use sqlweave::config::CONFIG;
use sqlweave::exprn::{column, in_query, Select, Table};
use sqlweave::sql::to_sql;
use sqlweave::Database;

fn main() -> Result<()> {
    let config = &*CONFIG;
    config.validate()?;

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .init();

    info!("sqlweave v{}", env!("CARGO_PKG_VERSION"));

    let db = Database::open(config)
        .map_err(|e| anyhow::anyhow!("Failed to open database: {}", e))?;

    let session = db.get_session()?;
    let version = session.query_column("SELECT sqlite_version()")?;
    info!("Connected to SQLite {:?} on connection {}", version.first(), session.connection_id());

    // A nested request on the same thread shares the session
    let nested = db.get_session()?;
    info!("Nested request shares session: {}", db.is_using_session(&nested));
    drop(nested);

    let sqlite_master = Table::new("sqlite_master", &["name", "type", "tbl_name"])?;
    let tables = Table::aliased("sqlite_master", "t", &["name", "type"])?;
    let predicate = in_query(
        column(&sqlite_master.column("tbl_name")?),
        Box::new(Select::new(tables.clone(), column(&tables.column("name")?))),
    );
    let sql = format!(
        "SELECT \"sqlite_master\".\"name\" FROM \"sqlite_master\" WHERE {}",
        to_sql(predicate.as_ref(), db.dialect())
    );
    db.dialect().check_syntax(&sql)?;
    let objects = session.query_column(&sql)?;
    info!("{} schema objects belong to tables", objects.len());

    drop(session);
    let stats = db.pool_stats();
    info!(
        "Pool: {} idle, {} opened, {} reused, epoch {}",
        stats.idle, stats.opened, stats.reused, stats.epoch
    );

    Ok(())
}
