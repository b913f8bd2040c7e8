use crate::core::broker::DbBroker;
use crate::core::error::MyappError;
use crate::core::output::{self, OutputFormat};
use crate::core::schemas;
use crate::core::time::command_envelope;
use crate::models::{collect_rows, fields};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const FIRST_NAME_MAX: usize = 30;
pub const LAST_NAME_MAX: usize = 30;

/// Births before this date are pre-boomers.
pub const BOOM_START: NaiveDate = match NaiveDate::from_ymd_opt(1945, 8, 1) {
    Some(d) => d,
    None => panic!("invalid boom start"),
};
/// Births on or after this date are post-boomers.
pub const BOOM_END: NaiveDate = match NaiveDate::from_ymd_opt(1965, 1, 1) {
    Some(d) => d,
    None => panic!("invalid boom end"),
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
    #[serde(rename = "O")]
    Other,
}

impl Gender {
    pub const ALL: [Gender; 3] = [Gender::Male, Gender::Female, Gender::Other];

    pub fn code(self) -> &'static str {
        match self {
            Gender::Male => "M",
            Gender::Female => "F",
            Gender::Other => "O",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        }
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Gender::ALL
            .into_iter()
            .find(|g| g.code() == s)
            .ok_or_else(|| format!("Invalid gender: {}. Must be one of: M, F, O", s))
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Medal {
    Gold,
    Silver,
    Bronze,
}

impl Medal {
    pub const ALL: [Medal; 3] = [Medal::Gold, Medal::Silver, Medal::Bronze];
    pub const MAX_LENGTH: usize = 10;

    pub fn code(self) -> &'static str {
        match self {
            Medal::Gold => "GOLD",
            Medal::Silver => "SILVER",
            Medal::Bronze => "BRONZE",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Medal::Gold => "Gold",
            Medal::Silver => "Silver",
            Medal::Bronze => "Bronze",
        }
    }

    /// Stored form of an optional medal; no medal is the empty string.
    pub fn stored(medal: Option<Medal>) -> &'static str {
        medal.map(Medal::code).unwrap_or("")
    }
}

impl FromStr for Medal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Medal::ALL
            .into_iter()
            .find(|m| m.code() == s)
            .ok_or_else(|| format!("Invalid medal: {}. Must be one of: GOLD, SILVER, BRONZE", s))
    }
}

impl ToSql for Gender {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.code()))
    }
}

impl FromSql for Gender {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub enum BoomerStatus {
    PreBoomer,
    BabyBoomer,
    PostBoomer,
}

impl BoomerStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BoomerStatus::PreBoomer => "Pre-boomer",
            BoomerStatus::BabyBoomer => "Baby boomer",
            BoomerStatus::PostBoomer => "Post-boomer",
        }
    }

    pub fn for_birth_date(birth_date: NaiveDate) -> Self {
        if birth_date < BOOM_START {
            BoomerStatus::PreBoomer
        } else if birth_date < BOOM_END {
            BoomerStatus::BabyBoomer
        } else {
            BoomerStatus::PostBoomer
        }
    }
}

impl fmt::Display for BoomerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPerson {
    pub first_name: String,
    pub last_name: String,
    pub age: i64,
    pub birth_date: Option<NaiveDate>,
    pub gender: Gender,
    pub medal: Option<Medal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub age: i64,
    pub birth_date: Option<NaiveDate>,
    pub gender: Gender,
    pub medal: Option<Medal>,
}

impl NewPerson {
    pub fn validate(&self) -> Result<(), MyappError> {
        fields::required_text("first_name", &self.first_name, FIRST_NAME_MAX)?;
        fields::required_text("last_name", &self.last_name, LAST_NAME_MAX)?;
        Ok(())
    }
}

impl Person {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Classifies by birth date. A person without one is an error, never a default.
    pub fn baby_boomer_status(&self) -> Result<BoomerStatus, MyappError> {
        self.birth_date
            .map(BoomerStatus::for_birth_date)
            .ok_or(MyappError::MissingBirthDate)
    }

    fn fields(&self) -> NewPerson {
        NewPerson {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            age: self.age,
            birth_date: self.birth_date,
            gender: self.gender,
            medal: self.medal,
        }
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let medal: String = row.get(6)?;
        let medal = if medal.is_empty() {
            None
        } else {
            Some(medal.parse().map_err(|e: String| {
                rusqlite::Error::FromSqlConversionFailure(
                    6,
                    rusqlite::types::Type::Text,
                    e.into(),
                )
            })?)
        };
        Ok(Person {
            id: row.get(0)?,
            first_name: row.get(1)?,
            last_name: row.get(2)?,
            age: row.get(3)?,
            birth_date: row.get(4)?,
            gender: row.get(5)?,
            medal,
        })
    }
}

impl fmt::Display for Person {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {}",
            self.first_name,
            self.last_name,
            self.age,
            self.gender.code(),
            Medal::stored(self.medal)
        )
    }
}

const SELECT_PERSON: &str =
    "SELECT id, first_name, last_name, age, birth_date, gender, medal FROM person";

pub fn create_person(conn: &Connection, new: &NewPerson) -> Result<Person, MyappError> {
    new.validate()?;
    conn.execute(
        "INSERT INTO person(first_name, last_name, age, birth_date, gender, medal)
         VALUES(?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            new.first_name,
            new.last_name,
            new.age,
            new.birth_date,
            new.gender,
            Medal::stored(new.medal)
        ],
    )?;
    let id = conn.last_insert_rowid();
    tracing::debug!(table = schemas::PERSON_TABLE, id, "created person");
    Ok(Person {
        id,
        first_name: new.first_name.clone(),
        last_name: new.last_name.clone(),
        age: new.age,
        birth_date: new.birth_date,
        gender: new.gender,
        medal: new.medal,
    })
}

pub fn get_person(conn: &Connection, id: i64) -> Result<Option<Person>, MyappError> {
    let person = conn
        .query_row(
            &format!("{} WHERE id = ?1", SELECT_PERSON),
            params![id],
            Person::from_row,
        )
        .optional()?;
    Ok(person)
}

/// All persons, oldest first.
pub fn list_persons(conn: &Connection) -> Result<Vec<Person>, MyappError> {
    collect_rows(
        conn,
        &format!("{} ORDER BY age DESC, id ASC", SELECT_PERSON),
        [],
        Person::from_row,
    )
}

pub fn update_person(conn: &Connection, person: &Person) -> Result<(), MyappError> {
    person.fields().validate()?;
    let changed = conn.execute(
        "UPDATE person SET first_name = ?1, last_name = ?2, age = ?3, birth_date = ?4,
         gender = ?5, medal = ?6 WHERE id = ?7",
        params![
            person.first_name,
            person.last_name,
            person.age,
            person.birth_date,
            person.gender,
            Medal::stored(person.medal),
            person.id
        ],
    )?;
    if changed == 0 {
        return Err(MyappError::NotFound(format!("person {}", person.id)));
    }
    Ok(())
}

pub fn delete_person(conn: &Connection, id: i64) -> Result<bool, MyappError> {
    let changed = conn.execute("DELETE FROM person WHERE id = ?1", params![id])?;
    Ok(changed > 0)
}

#[derive(Parser, Debug)]
#[clap(name = "person", about = "Manage persons.")]
pub struct PersonCli {
    #[clap(long, global = true, value_enum, default_value = "text")]
    format: OutputFormat,
    #[clap(subcommand)]
    command: PersonCommand,
}

#[derive(Subcommand, Debug)]
pub enum PersonCommand {
    /// Add a person.
    Add {
        #[clap(long)]
        first_name: String,
        #[clap(long)]
        last_name: String,
        #[clap(long)]
        age: i64,
        /// Birth date as YYYY-MM-DD.
        #[clap(long)]
        birth_date: Option<NaiveDate>,
        /// M, F or O.
        #[clap(long)]
        gender: Gender,
        /// GOLD, SILVER or BRONZE.
        #[clap(long)]
        medal: Option<Medal>,
    },
    /// List persons, oldest first.
    List,
    /// Show one person.
    Get {
        #[clap(long)]
        id: i64,
    },
    /// Show a person's baby boomer status.
    Status {
        #[clap(long)]
        id: i64,
    },
    /// Delete a person.
    Delete {
        #[clap(long)]
        id: i64,
    },
}

fn require_person(conn: &Connection, id: i64) -> Result<Person, MyappError> {
    get_person(conn, id)?.ok_or_else(|| MyappError::NotFound(format!("person {}", id)))
}

pub fn run_person_cli(broker: &DbBroker, cli: PersonCli) -> Result<(), MyappError> {
    let (out, lines) = match cli.command {
        PersonCommand::Add {
            first_name,
            last_name,
            age,
            birth_date,
            gender,
            medal,
        } => {
            let new = NewPerson {
                first_name,
                last_name,
                age,
                birth_date,
                gender,
                medal,
            };
            let person = broker.with_conn("person.add", |conn| create_person(conn, &new))?;
            let line = format!("Added person #{}: {}", person.id, person.full_name());
            (
                command_envelope("person.add", "ok", serde_json::json!({ "item": person })),
                vec![line],
            )
        }
        PersonCommand::List => {
            let items = broker.with_conn("person.list", list_persons)?;
            let lines = items
                .iter()
                .map(|p| output::row(p.id, &p.to_string()))
                .collect();
            (
                command_envelope("person.list", "ok", serde_json::json!({ "items": items })),
                lines,
            )
        }
        PersonCommand::Get { id } => {
            let person = broker.with_conn("person.get", |conn| require_person(conn, id))?;
            let lines = vec![
                format!("{} ({})", person.full_name(), person.gender.label()),
                format!("age: {}", person.age),
                format!(
                    "birth_date: {}",
                    person
                        .birth_date
                        .map(|d| d.to_string())
                        .unwrap_or_else(|| "-".to_string())
                ),
                format!("medal: {}", person.medal.map(Medal::label).unwrap_or("-")),
            ];
            (
                command_envelope("person.get", "ok", serde_json::json!({ "item": person })),
                lines,
            )
        }
        PersonCommand::Status { id } => {
            let person = broker.with_conn("person.status", |conn| require_person(conn, id))?;
            let status = person.baby_boomer_status()?;
            (
                command_envelope(
                    "person.status",
                    "ok",
                    serde_json::json!({ "id": id, "full_name": person.full_name(), "baby_boomer_status": status.as_str() }),
                ),
                vec![format!("{}: {}", person.full_name(), status)],
            )
        }
        PersonCommand::Delete { id } => {
            let deleted = broker.with_conn("person.delete", |conn| delete_person(conn, id))?;
            if !deleted {
                return Err(MyappError::NotFound(format!("person {}", id)));
            }
            (
                command_envelope("person.delete", "ok", serde_json::json!({ "id": id })),
                vec![format!("Deleted person #{}", id)],
            )
        }
    };
    output::emit(cli.format, &out, &lines)
}
