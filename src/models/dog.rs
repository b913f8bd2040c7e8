use crate::core::broker::DbBroker;
use crate::core::error::MyappError;
use crate::core::output::{self, OutputFormat};
use crate::core::time::command_envelope;
use crate::models::{collect_rows, fields};
use clap::{Parser, Subcommand};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

pub const NAME_MAX: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDog {
    pub name: String,
    pub data: Option<JsonValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dog {
    pub id: i64,
    pub name: String,
    pub data: Option<JsonValue>,
}

impl NewDog {
    pub fn validate(&self) -> Result<(), MyappError> {
        fields::required_text("name", &self.name, NAME_MAX)
    }
}

impl fmt::Display for Dog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

fn encode_data(data: Option<&JsonValue>) -> Result<Option<String>, MyappError> {
    Ok(data.map(serde_json::to_string).transpose()?)
}

impl Dog {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let raw: Option<String> = row.get(2)?;
        let data = raw
            .map(|s| serde_json::from_str(&s))
            .transpose()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;
        Ok(Dog {
            id: row.get(0)?,
            name: row.get(1)?,
            data,
        })
    }
}

pub fn create_dog(conn: &Connection, new: &NewDog) -> Result<Dog, MyappError> {
    new.validate()?;
    conn.execute(
        "INSERT INTO dog(name, data) VALUES(?1, ?2)",
        params![new.name, encode_data(new.data.as_ref())?],
    )?;
    let id = conn.last_insert_rowid();
    tracing::debug!(id, "created dog");
    Ok(Dog {
        id,
        name: new.name.clone(),
        data: new.data.clone(),
    })
}

pub fn get_dog(conn: &Connection, id: i64) -> Result<Option<Dog>, MyappError> {
    let dog = conn
        .query_row(
            "SELECT id, name, data FROM dog WHERE id = ?1",
            params![id],
            Dog::from_row,
        )
        .optional()?;
    Ok(dog)
}

/// All dogs by name.
pub fn list_dogs(conn: &Connection) -> Result<Vec<Dog>, MyappError> {
    collect_rows(
        conn,
        "SELECT id, name, data FROM dog ORDER BY name ASC, id ASC",
        [],
        Dog::from_row,
    )
}

/// Dogs whose document has `key` at the top level equal to `value`.
///
/// Values must agree on JSON type as well as content, so `true` never matches
/// `1` and a string holding JSON never matches the document it spells. The key
/// is compared with the decoded label, not spliced into a path.
pub fn dogs_with(conn: &Connection, key: &str, value: &JsonValue) -> Result<Vec<Dog>, MyappError> {
    collect_rows(
        conn,
        "SELECT id, name, data FROM dog
         WHERE data IS NOT NULL AND json_type(data) = 'object' AND EXISTS (
             SELECT 1 FROM json_each(dog.data) AS field
             WHERE field.key = ?1
               AND field.type = json_type(?2)
               AND CASE WHEN field.type IN ('object', 'array')
                        THEN json(field.value) = json(?2)
                        ELSE field.atom IS json_extract(?2, '$')
                   END
         )
         ORDER BY name ASC, id ASC",
        params![key, serde_json::to_string(value)?],
        Dog::from_row,
    )
}

pub fn update_dog(conn: &Connection, dog: &Dog) -> Result<(), MyappError> {
    NewDog {
        name: dog.name.clone(),
        data: None,
    }
    .validate()?;
    let changed = conn.execute(
        "UPDATE dog SET name = ?1, data = ?2 WHERE id = ?3",
        params![dog.name, encode_data(dog.data.as_ref())?, dog.id],
    )?;
    if changed == 0 {
        return Err(MyappError::NotFound(format!("dog {}", dog.id)));
    }
    Ok(())
}

pub fn delete_dog(conn: &Connection, id: i64) -> Result<bool, MyappError> {
    let changed = conn.execute("DELETE FROM dog WHERE id = ?1", params![id])?;
    Ok(changed > 0)
}

#[derive(Parser, Debug)]
#[clap(name = "dog", about = "Manage dogs.")]
pub struct DogCli {
    #[clap(long, global = true, value_enum, default_value = "text")]
    format: OutputFormat,
    #[clap(subcommand)]
    command: DogCommand,
}

#[derive(Subcommand, Debug)]
pub enum DogCommand {
    /// Add a dog.
    Add {
        #[clap(long)]
        name: String,
        /// JSON document, e.g. '{"breed": "collie"}'.
        #[clap(long)]
        data: Option<String>,
    },
    /// List dogs by name.
    List,
    /// Show one dog.
    Get {
        #[clap(long)]
        id: i64,
    },
    /// Delete a dog.
    Delete {
        #[clap(long)]
        id: i64,
    },
}

pub fn run_dog_cli(broker: &DbBroker, cli: DogCli) -> Result<(), MyappError> {
    let (out, lines) = match cli.command {
        DogCommand::Add { name, data } => {
            let data = data.as_deref().map(serde_json::from_str::<JsonValue>).transpose()?;
            let new = NewDog { name, data };
            let dog = broker.with_conn("dog.add", |conn| create_dog(conn, &new))?;
            let line = format!("Added dog #{}: {}", dog.id, dog);
            (
                command_envelope("dog.add", "ok", serde_json::json!({ "item": dog })),
                vec![line],
            )
        }
        DogCommand::List => {
            let items = broker.with_conn("dog.list", list_dogs)?;
            let lines = items.iter().map(|d| output::row(d.id, &d.name)).collect();
            (
                command_envelope("dog.list", "ok", serde_json::json!({ "items": items })),
                lines,
            )
        }
        DogCommand::Get { id } => {
            let dog = broker
                .with_conn("dog.get", |conn| get_dog(conn, id))?
                .ok_or_else(|| MyappError::NotFound(format!("dog {}", id)))?;
            let data = match &dog.data {
                Some(d) => serde_json::to_string(d)?,
                None => "-".to_string(),
            };
            let lines = vec![dog.to_string(), format!("data: {}", data)];
            (
                command_envelope("dog.get", "ok", serde_json::json!({ "item": dog })),
                lines,
            )
        }
        DogCommand::Delete { id } => {
            let deleted = broker.with_conn("dog.delete", |conn| delete_dog(conn, id))?;
            if !deleted {
                return Err(MyappError::NotFound(format!("dog {}", id)));
            }
            (
                command_envelope("dog.delete", "ok", serde_json::json!({ "id": id })),
                vec![format!("Deleted dog #{}", id)],
            )
        }
    };
    output::emit(cli.format, &out, &lines)
}
