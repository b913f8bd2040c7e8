//! Entity definitions: fields, validation, string forms and CRUD.
//!
//! Every CRUD function takes a plain `&rusqlite::Connection`; the CLI wraps
//! them in `DbBroker::with_conn`.

pub mod blog;
pub mod dog;
pub mod fields;
pub mod fruit;
pub mod membership;
pub mod person;

use crate::core::error::MyappError;
use rusqlite::{Connection, Row};

pub(crate) fn collect_rows<T>(
    conn: &Connection,
    sql: &str,
    args: impl rusqlite::Params,
    map: impl FnMut(&Row<'_>) -> rusqlite::Result<T>,
) -> Result<Vec<T>, MyappError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(args, map)?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}
