//! Forward-only schema migrations.
//!
//! Each migration is a block of embedded SQL. Applied migrations are recorded
//! in the `myapp_migrations` ledger, one row per name, in the same transaction
//! as the DDL, so a failed migration leaves neither schema nor ledger changed.

use crate::core::error::MyappError;
use crate::core::schemas;
use rusqlite::{Connection, params};
use serde::Serialize;
use std::collections::HashSet;

/// Migration definition
pub struct Migration {
    /// Ledger name, e.g. `0004_fruit`
    pub name: &'static str,
    /// Human-readable description
    pub description: &'static str,
    pub sql: &'static str,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MigrationStatus {
    pub name: &'static str,
    pub description: &'static str,
    pub applied: bool,
}

/// All migrations in application order.
pub fn all_migrations() -> Vec<Migration> {
    vec![
        Migration {
            name: "0001_initial",
            description: "Create person, famous person, group, membership, blog, author and entry tables",
            sql: schemas::MIGRATION_0001_INITIAL,
        },
        Migration {
            name: "0002_dog",
            description: "Create dog table with JSON data column",
            sql: schemas::MIGRATION_0002_DOG,
        },
        Migration {
            name: "0003_alter_person_options_alter_person_table",
            description: "Order persons by age descending and rename table to person",
            sql: schemas::MIGRATION_0003_PERSON_TABLE,
        },
        Migration {
            name: "0004_fruit",
            description: "Create fruit table keyed by name",
            sql: schemas::MIGRATION_0004_FRUIT,
        },
    ]
}

fn ensure_ledger(conn: &Connection) -> Result<(), MyappError> {
    conn.execute(schemas::MIGRATIONS_DB_SCHEMA, [])?;
    Ok(())
}

/// Names of migrations recorded as applied, in application order.
pub fn applied_migrations(conn: &Connection) -> Result<Vec<String>, MyappError> {
    ensure_ledger(conn)?;
    let mut stmt = conn.prepare("SELECT name FROM myapp_migrations WHERE app = ?1 ORDER BY id")?;
    let rows = stmt.query_map(params![schemas::APP_LABEL], |row| row.get(0))?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Apply every pending migration. Returns the names applied by this call.
pub fn migrate(conn: &Connection) -> Result<Vec<&'static str>, MyappError> {
    let done: HashSet<String> = applied_migrations(conn)?.into_iter().collect();
    let mut applied = Vec::new();

    for migration in all_migrations() {
        if done.contains(migration.name) {
            continue;
        }
        apply(conn, &migration)?;
        tracing::info!(migration = migration.name, "applied migration");
        applied.push(migration.name);
    }

    if applied.is_empty() {
        tracing::debug!("no migrations to apply");
    }
    Ok(applied)
}

fn apply(conn: &Connection, migration: &Migration) -> Result<(), MyappError> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(migration.sql)
        .map_err(|source| MyappError::MigrationError {
            name: migration.name,
            source,
        })?;
    tx.execute(
        "INSERT INTO myapp_migrations(app, name, applied) VALUES(?1, ?2, ?3)",
        params![
            schemas::APP_LABEL,
            migration.name,
            chrono::Utc::now().to_rfc3339()
        ],
    )?;
    tx.commit()?;
    Ok(())
}

pub fn show_migrations(conn: &Connection) -> Result<Vec<MigrationStatus>, MyappError> {
    let done: HashSet<String> = applied_migrations(conn)?.into_iter().collect();
    Ok(all_migrations()
        .into_iter()
        .map(|m| MigrationStatus {
            name: m.name,
            description: m.description,
            applied: done.contains(m.name),
        })
        .collect())
}

/// SQL of a single migration, looked up by full name or by its number prefix (`0004`).
pub fn sql_for(name: &str) -> Result<&'static str, MyappError> {
    all_migrations()
        .into_iter()
        .find(|m| m.name == name || m.name.split('_').next() == Some(name))
        .map(|m| m.sql)
        .ok_or_else(|| MyappError::NotFound(format!("migration '{}'", name)))
}
