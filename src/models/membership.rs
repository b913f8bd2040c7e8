//! Famous persons, groups and the membership join between them.
//!
//! Memberships cascade away with either side; deleting a group never touches
//! the persons that belonged to it.

use crate::core::broker::DbBroker;
use crate::core::error::MyappError;
use crate::core::output::{self, OutputFormat};
use crate::core::time::command_envelope;
use crate::models::{collect_rows, fields};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const NAME_MAX: usize = 128;
pub const INVITE_REASON_MAX: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamousPerson {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMembership {
    pub person_id: i64,
    pub group_id: i64,
    pub date_joined: NaiveDate,
    pub invite_reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub id: i64,
    pub person_id: i64,
    pub group_id: i64,
    pub date_joined: NaiveDate,
    pub invite_reason: String,
}

/// A membership loaded together with both sides of the join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MembershipDetail {
    pub membership: Membership,
    pub person: FamousPerson,
    pub group: Group,
}

impl fmt::Display for FamousPerson {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl fmt::Display for MembershipDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in {}", self.person, self.group)
    }
}

impl NewMembership {
    pub fn validate(&self) -> Result<(), MyappError> {
        fields::required_text("invite_reason", &self.invite_reason, INVITE_REASON_MAX)
    }
}

fn named_from_row(row: &Row<'_>) -> rusqlite::Result<(i64, String)> {
    Ok((row.get(0)?, row.get(1)?))
}

fn membership_from_row(row: &Row<'_>) -> rusqlite::Result<Membership> {
    Ok(Membership {
        id: row.get(0)?,
        person_id: row.get(1)?,
        group_id: row.get(2)?,
        date_joined: row.get(3)?,
        invite_reason: row.get(4)?,
    })
}

pub fn create_famous_person(conn: &Connection, name: &str) -> Result<FamousPerson, MyappError> {
    fields::required_text("name", name, NAME_MAX)?;
    conn.execute(
        "INSERT INTO myapp_famousperson(name) VALUES(?1)",
        params![name],
    )?;
    Ok(FamousPerson {
        id: conn.last_insert_rowid(),
        name: name.to_string(),
    })
}

pub fn get_famous_person(conn: &Connection, id: i64) -> Result<Option<FamousPerson>, MyappError> {
    let found = conn
        .query_row(
            "SELECT id, name FROM myapp_famousperson WHERE id = ?1",
            params![id],
            named_from_row,
        )
        .optional()?;
    Ok(found.map(|(id, name)| FamousPerson { id, name }))
}

pub fn list_famous_persons(conn: &Connection) -> Result<Vec<FamousPerson>, MyappError> {
    collect_rows(
        conn,
        "SELECT id, name FROM myapp_famousperson ORDER BY id",
        [],
        |row| named_from_row(row).map(|(id, name)| FamousPerson { id, name }),
    )
}

pub fn rename_famous_person(conn: &Connection, id: i64, name: &str) -> Result<(), MyappError> {
    fields::required_text("name", name, NAME_MAX)?;
    let changed = conn.execute(
        "UPDATE myapp_famousperson SET name = ?1 WHERE id = ?2",
        params![name, id],
    )?;
    if changed == 0 {
        return Err(MyappError::NotFound(format!("famous person {}", id)));
    }
    Ok(())
}

pub fn delete_famous_person(conn: &Connection, id: i64) -> Result<bool, MyappError> {
    let changed = conn.execute(
        "DELETE FROM myapp_famousperson WHERE id = ?1",
        params![id],
    )?;
    Ok(changed > 0)
}

pub fn create_group(conn: &Connection, name: &str) -> Result<Group, MyappError> {
    fields::required_text("name", name, NAME_MAX)?;
    conn.execute("INSERT INTO myapp_group(name) VALUES(?1)", params![name])?;
    Ok(Group {
        id: conn.last_insert_rowid(),
        name: name.to_string(),
    })
}

pub fn get_group(conn: &Connection, id: i64) -> Result<Option<Group>, MyappError> {
    let found = conn
        .query_row(
            "SELECT id, name FROM myapp_group WHERE id = ?1",
            params![id],
            named_from_row,
        )
        .optional()?;
    Ok(found.map(|(id, name)| Group { id, name }))
}

pub fn list_groups(conn: &Connection) -> Result<Vec<Group>, MyappError> {
    collect_rows(conn, "SELECT id, name FROM myapp_group ORDER BY id", [], |row| {
        named_from_row(row).map(|(id, name)| Group { id, name })
    })
}

pub fn rename_group(conn: &Connection, id: i64, name: &str) -> Result<(), MyappError> {
    fields::required_text("name", name, NAME_MAX)?;
    let changed = conn.execute(
        "UPDATE myapp_group SET name = ?1 WHERE id = ?2",
        params![name, id],
    )?;
    if changed == 0 {
        return Err(MyappError::NotFound(format!("group {}", id)));
    }
    Ok(())
}

pub fn delete_group(conn: &Connection, id: i64) -> Result<bool, MyappError> {
    let changed = conn.execute("DELETE FROM myapp_group WHERE id = ?1", params![id])?;
    Ok(changed > 0)
}

pub fn add_membership(conn: &Connection, new: &NewMembership) -> Result<Membership, MyappError> {
    new.validate()?;
    conn.execute(
        "INSERT INTO myapp_membership(person_id, group_id, date_joined, invite_reason)
         VALUES(?1, ?2, ?3, ?4)",
        params![new.person_id, new.group_id, new.date_joined, new.invite_reason],
    )?;
    let id = conn.last_insert_rowid();
    tracing::debug!(id, person_id = new.person_id, group_id = new.group_id, "added membership");
    Ok(Membership {
        id,
        person_id: new.person_id,
        group_id: new.group_id,
        date_joined: new.date_joined,
        invite_reason: new.invite_reason.clone(),
    })
}

pub fn list_memberships(conn: &Connection) -> Result<Vec<Membership>, MyappError> {
    collect_rows(
        conn,
        "SELECT id, person_id, group_id, date_joined, invite_reason
         FROM myapp_membership ORDER BY id",
        [],
        membership_from_row,
    )
}

pub fn get_membership(conn: &Connection, id: i64) -> Result<Option<Membership>, MyappError> {
    let membership = conn
        .query_row(
            "SELECT id, person_id, group_id, date_joined, invite_reason
             FROM myapp_membership WHERE id = ?1",
            params![id],
            membership_from_row,
        )
        .optional()?;
    Ok(membership)
}

/// Rewrites every column of the membership, including which person and group it joins.
pub fn update_membership(conn: &Connection, membership: &Membership) -> Result<(), MyappError> {
    NewMembership {
        person_id: membership.person_id,
        group_id: membership.group_id,
        date_joined: membership.date_joined,
        invite_reason: membership.invite_reason.clone(),
    }
    .validate()?;
    let changed = conn.execute(
        "UPDATE myapp_membership SET person_id = ?1, group_id = ?2, date_joined = ?3,
         invite_reason = ?4 WHERE id = ?5",
        params![
            membership.person_id,
            membership.group_id,
            membership.date_joined,
            membership.invite_reason,
            membership.id
        ],
    )?;
    if changed == 0 {
        return Err(MyappError::NotFound(format!("membership {}", membership.id)));
    }
    Ok(())
}

pub fn get_membership_detail(
    conn: &Connection,
    id: i64,
) -> Result<Option<MembershipDetail>, MyappError> {
    let detail = conn
        .query_row(
            "SELECT m.id, m.person_id, m.group_id, m.date_joined, m.invite_reason, p.name, g.name
             FROM myapp_membership m
             JOIN myapp_famousperson p ON p.id = m.person_id
             JOIN myapp_group g ON g.id = m.group_id
             WHERE m.id = ?1",
            params![id],
            |row| {
                let membership = membership_from_row(row)?;
                Ok(MembershipDetail {
                    person: FamousPerson {
                        id: membership.person_id,
                        name: row.get(5)?,
                    },
                    group: Group {
                        id: membership.group_id,
                        name: row.get(6)?,
                    },
                    membership,
                })
            },
        )
        .optional()?;
    Ok(detail)
}

pub fn delete_membership(conn: &Connection, id: i64) -> Result<bool, MyappError> {
    let changed = conn.execute("DELETE FROM myapp_membership WHERE id = ?1", params![id])?;
    Ok(changed > 0)
}

/// Persons belonging to a group, in membership order.
pub fn group_members(conn: &Connection, group_id: i64) -> Result<Vec<FamousPerson>, MyappError> {
    collect_rows(
        conn,
        "SELECT p.id, p.name FROM myapp_famousperson p
         JOIN myapp_membership m ON m.person_id = p.id
         WHERE m.group_id = ?1 ORDER BY m.id",
        params![group_id],
        |row| named_from_row(row).map(|(id, name)| FamousPerson { id, name }),
    )
}

pub fn person_groups(conn: &Connection, person_id: i64) -> Result<Vec<Group>, MyappError> {
    collect_rows(
        conn,
        "SELECT g.id, g.name FROM myapp_group g
         JOIN myapp_membership m ON m.group_id = g.id
         WHERE m.person_id = ?1 ORDER BY m.id",
        params![person_id],
        |row| named_from_row(row).map(|(id, name)| Group { id, name }),
    )
}

#[derive(Parser, Debug)]
#[clap(name = "group", about = "Manage famous persons, groups and memberships.")]
pub struct GroupCli {
    #[clap(long, global = true, value_enum, default_value = "text")]
    format: OutputFormat,
    #[clap(subcommand)]
    command: GroupCommand,
}

#[derive(Subcommand, Debug)]
pub enum GroupCommand {
    /// Add a group.
    Add {
        #[clap(long)]
        name: String,
    },
    /// List groups.
    List,
    /// Delete a group and its memberships.
    Delete {
        #[clap(long)]
        id: i64,
    },
    /// Add a famous person.
    AddPerson {
        #[clap(long)]
        name: String,
    },
    /// List famous persons.
    Persons,
    /// Delete a famous person and their memberships.
    DeletePerson {
        #[clap(long)]
        id: i64,
    },
    /// Put a famous person in a group.
    Join {
        #[clap(long)]
        person: i64,
        #[clap(long)]
        group: i64,
        /// Join date as YYYY-MM-DD.
        #[clap(long)]
        date_joined: NaiveDate,
        #[clap(long)]
        invite_reason: String,
    },
    /// List the members of a group.
    Members {
        #[clap(long)]
        id: i64,
    },
}

pub fn run_group_cli(broker: &DbBroker, cli: GroupCli) -> Result<(), MyappError> {
    let (out, lines) = match cli.command {
        GroupCommand::Add { name } => {
            let group = broker.with_conn("group.add", |conn| create_group(conn, &name))?;
            let line = format!("Added group #{}: {}", group.id, group);
            (
                command_envelope("group.add", "ok", serde_json::json!({ "item": group })),
                vec![line],
            )
        }
        GroupCommand::List => {
            let items = broker.with_conn("group.list", list_groups)?;
            let lines = items.iter().map(|g| output::row(g.id, &g.name)).collect();
            (
                command_envelope("group.list", "ok", serde_json::json!({ "items": items })),
                lines,
            )
        }
        GroupCommand::Delete { id } => {
            let deleted = broker.with_conn("group.delete", |conn| delete_group(conn, id))?;
            if !deleted {
                return Err(MyappError::NotFound(format!("group {}", id)));
            }
            (
                command_envelope("group.delete", "ok", serde_json::json!({ "id": id })),
                vec![format!("Deleted group #{}", id)],
            )
        }
        GroupCommand::AddPerson { name } => {
            let person =
                broker.with_conn("group.add_person", |conn| create_famous_person(conn, &name))?;
            let line = format!("Added famous person #{}: {}", person.id, person);
            (
                command_envelope("group.add_person", "ok", serde_json::json!({ "item": person })),
                vec![line],
            )
        }
        GroupCommand::Persons => {
            let items = broker.with_conn("group.persons", list_famous_persons)?;
            let lines = items.iter().map(|p| output::row(p.id, &p.name)).collect();
            (
                command_envelope("group.persons", "ok", serde_json::json!({ "items": items })),
                lines,
            )
        }
        GroupCommand::DeletePerson { id } => {
            let deleted =
                broker.with_conn("group.delete_person", |conn| delete_famous_person(conn, id))?;
            if !deleted {
                return Err(MyappError::NotFound(format!("famous person {}", id)));
            }
            (
                command_envelope("group.delete_person", "ok", serde_json::json!({ "id": id })),
                vec![format!("Deleted famous person #{}", id)],
            )
        }
        GroupCommand::Join {
            person,
            group,
            date_joined,
            invite_reason,
        } => {
            let new = NewMembership {
                person_id: person,
                group_id: group,
                date_joined,
                invite_reason,
            };
            let detail = broker.with_conn("group.join", |conn| {
                let m = add_membership(conn, &new)?;
                get_membership_detail(conn, m.id)?
                    .ok_or_else(|| MyappError::NotFound(format!("membership {}", m.id)))
            })?;
            let line = detail.to_string();
            (
                command_envelope("group.join", "ok", serde_json::json!({ "item": detail })),
                vec![line],
            )
        }
        GroupCommand::Members { id } => {
            let items = broker.with_conn("group.members", |conn| {
                if get_group(conn, id)?.is_none() {
                    return Err(MyappError::NotFound(format!("group {}", id)));
                }
                group_members(conn, id)
            })?;
            let lines = items.iter().map(|p| output::row(p.id, &p.name)).collect();
            (
                command_envelope(
                    "group.members",
                    "ok",
                    serde_json::json!({ "group_id": id, "items": items }),
                ),
                lines,
            )
        }
    };
    output::emit(cli.format, &out, &lines)
}
