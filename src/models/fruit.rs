//! Fruit, keyed by its name rather than a surrogate id.
//!
//! `price` may be left blank at validation time but the column is NOT NULL,
//! so a blank price is rejected by the database on write.

use crate::core::broker::DbBroker;
use crate::core::error::MyappError;
use crate::core::output::{self, OutputFormat};
use crate::core::time::command_envelope;
use crate::models::{collect_rows, fields};
use clap::{Parser, Subcommand};
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const NAME_MAX: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFruit {
    pub name: String,
    pub price: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fruit {
    pub name: String,
    pub price: i64,
}

impl NewFruit {
    pub fn validate(&self) -> Result<(), MyappError> {
        fields::required_text("name", &self.name, NAME_MAX)
    }
}

impl Fruit {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Fruit {
            name: row.get(0)?,
            price: row.get(1)?,
        })
    }
}

impl fmt::Display for Fruit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fruit object ({})", self.name)
    }
}

pub fn create_fruit(conn: &Connection, new: &NewFruit) -> Result<Fruit, MyappError> {
    new.validate()?;
    conn.execute(
        "INSERT INTO fruit(name, price) VALUES(?1, ?2)",
        params![new.name, new.price],
    )?;
    tracing::debug!(name = %new.name, "created fruit");
    // The insert above cannot succeed with a NULL price.
    let price = new.price.unwrap_or_default();
    Ok(Fruit {
        name: new.name.clone(),
        price,
    })
}

pub fn get_fruit(conn: &Connection, name: &str) -> Result<Option<Fruit>, MyappError> {
    let fruit = conn
        .query_row(
            "SELECT name, price FROM fruit WHERE name = ?1",
            params![name],
            Fruit::from_row,
        )
        .optional()?;
    Ok(fruit)
}

pub fn list_fruits(conn: &Connection) -> Result<Vec<Fruit>, MyappError> {
    collect_rows(
        conn,
        "SELECT name, price FROM fruit ORDER BY name",
        [],
        Fruit::from_row,
    )
}

pub fn update_fruit_price(conn: &Connection, name: &str, price: Option<i64>) -> Result<(), MyappError> {
    let changed = conn.execute(
        "UPDATE fruit SET price = ?1 WHERE name = ?2",
        params![price, name],
    )?;
    if changed == 0 {
        return Err(MyappError::NotFound(format!("fruit '{}'", name)));
    }
    Ok(())
}

pub fn delete_fruit(conn: &Connection, name: &str) -> Result<bool, MyappError> {
    let changed = conn.execute("DELETE FROM fruit WHERE name = ?1", params![name])?;
    Ok(changed > 0)
}

#[derive(Parser, Debug)]
#[clap(name = "fruit", about = "Manage fruit.")]
pub struct FruitCli {
    #[clap(long, global = true, value_enum, default_value = "text")]
    format: OutputFormat,
    #[clap(subcommand)]
    command: FruitCommand,
}

#[derive(Subcommand, Debug)]
pub enum FruitCommand {
    /// Add a fruit. Omitting --price is accepted here and refused by the database.
    Add {
        #[clap(long)]
        name: String,
        #[clap(long)]
        price: Option<i64>,
    },
    /// List fruit by name.
    List,
    /// Change a fruit's price.
    Price {
        #[clap(long)]
        name: String,
        #[clap(long)]
        price: i64,
    },
    /// Delete a fruit.
    Delete {
        #[clap(long)]
        name: String,
    },
}

pub fn run_fruit_cli(broker: &DbBroker, cli: FruitCli) -> Result<(), MyappError> {
    let (out, lines) = match cli.command {
        FruitCommand::Add { name, price } => {
            let new = NewFruit { name, price };
            let fruit = broker.with_conn("fruit.add", |conn| create_fruit(conn, &new))?;
            let line = format!("Added {} at {}", fruit, fruit.price);
            (
                command_envelope("fruit.add", "ok", serde_json::json!({ "item": fruit })),
                vec![line],
            )
        }
        FruitCommand::List => {
            let items = broker.with_conn("fruit.list", list_fruits)?;
            let lines = items
                .iter()
                .map(|f| format!("{:<20} {}", f.name, f.price))
                .collect();
            (
                command_envelope("fruit.list", "ok", serde_json::json!({ "items": items })),
                lines,
            )
        }
        FruitCommand::Price { name, price } => {
            broker.with_conn("fruit.price", |conn| {
                update_fruit_price(conn, &name, Some(price))
            })?;
            (
                command_envelope(
                    "fruit.price",
                    "ok",
                    serde_json::json!({ "name": name, "price": price }),
                ),
                vec![format!("{} now costs {}", name, price)],
            )
        }
        FruitCommand::Delete { name } => {
            let deleted = broker.with_conn("fruit.delete", |conn| delete_fruit(conn, &name))?;
            if !deleted {
                return Err(MyappError::NotFound(format!("fruit '{}'", name)));
            }
            (
                command_envelope("fruit.delete", "ok", serde_json::json!({ "name": name })),
                vec![format!("Deleted fruit {}", name)],
            )
        }
    };
    output::emit(cli.format, &out, &lines)
}
