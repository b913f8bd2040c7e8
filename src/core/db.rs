use crate::core::broker::DbBroker;
use crate::core::error;
use crate::core::migration;
use rusqlite::Connection;
use std::fs;
use std::path::Path;
use std::time::Duration;

pub fn db_connect(db_path: &Path, busy_timeout_secs: u64) -> Result<Connection, error::MyappError> {
    let conn = Connection::open(db_path)?;
    configure(&conn, busy_timeout_secs)?;
    Ok(conn)
}

/// In-memory connection with the same pragmas as a file connection (minus WAL).
pub fn db_connect_in_memory() -> Result<Connection, error::MyappError> {
    let conn = Connection::open_in_memory()?;
    conn.execute("PRAGMA foreign_keys=ON;", [])?;
    Ok(conn)
}

fn configure(conn: &Connection, busy_timeout_secs: u64) -> Result<(), error::MyappError> {
    conn.busy_timeout(Duration::from_secs(busy_timeout_secs))?;
    conn.query_row("PRAGMA journal_mode=WAL;", [], |_| Ok(()))?;
    // Cascades depend on this; SQLite ships with it off.
    conn.execute("PRAGMA foreign_keys=ON;", [])?;
    Ok(())
}

/// Create the database file if needed and bring it up to the latest migration.
pub fn initialize_db(broker: &DbBroker) -> Result<Vec<&'static str>, error::MyappError> {
    if let Some(parent) = broker.db_path().parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(error::MyappError::IoError)?;
        }
    }

    broker.with_conn("migrate", |conn| migration::migrate(conn))
}
