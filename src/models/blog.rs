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

pub const BLOG_NAME_MAX: usize = 100;
pub const AUTHOR_NAME_MAX: usize = 50;
pub const HEADLINE_MAX: usize = 255;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blog {
    pub id: i64,
    pub name: String,
    pub tagline: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: i64,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEntry {
    pub blog_id: i64,
    pub headline: String,
    pub body_text: String,
    pub pub_date: NaiveDate,
    pub mod_date: NaiveDate,
    pub n_comments: i64,
    pub n_pingbacks: i64,
    pub rating: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: i64,
    pub blog_id: i64,
    pub headline: String,
    pub body_text: String,
    pub pub_date: NaiveDate,
    pub mod_date: NaiveDate,
    pub n_comments: i64,
    pub n_pingbacks: i64,
    pub rating: i64,
}

impl fmt::Display for Blog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.headline)
    }
}

fn validate_blog(name: &str, tagline: &str) -> Result<(), MyappError> {
    fields::required_text("name", name, BLOG_NAME_MAX)?;
    if tagline.is_empty() {
        return Err(MyappError::validation("tagline", "This field cannot be blank."));
    }
    Ok(())
}

fn validate_author(name: &str, email: &str) -> Result<(), MyappError> {
    fields::required_text("name", name, AUTHOR_NAME_MAX)?;
    fields::email("email", email)
}

impl NewEntry {
    pub fn validate(&self) -> Result<(), MyappError> {
        fields::required_text("headline", &self.headline, HEADLINE_MAX)?;
        if self.body_text.is_empty() {
            return Err(MyappError::validation("body_text", "This field cannot be blank."));
        }
        Ok(())
    }
}

impl Entry {
    fn fields(&self) -> NewEntry {
        NewEntry {
            blog_id: self.blog_id,
            headline: self.headline.clone(),
            body_text: self.body_text.clone(),
            pub_date: self.pub_date,
            mod_date: self.mod_date,
            n_comments: self.n_comments,
            n_pingbacks: self.n_pingbacks,
            rating: self.rating,
        }
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Entry {
            id: row.get(0)?,
            blog_id: row.get(1)?,
            headline: row.get(2)?,
            body_text: row.get(3)?,
            pub_date: row.get(4)?,
            mod_date: row.get(5)?,
            n_comments: row.get(6)?,
            n_pingbacks: row.get(7)?,
            rating: row.get(8)?,
        })
    }
}

const SELECT_ENTRY: &str = "SELECT e.id, e.blog_id, e.headline, e.body_text, e.pub_date, e.mod_date,
        e.n_comments, e.n_pingbacks, e.rating FROM myapp_entry e";

fn blog_from_row(row: &Row<'_>) -> rusqlite::Result<Blog> {
    Ok(Blog {
        id: row.get(0)?,
        name: row.get(1)?,
        tagline: row.get(2)?,
    })
}

fn author_from_row(row: &Row<'_>) -> rusqlite::Result<Author> {
    Ok(Author {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
    })
}

pub fn create_blog(conn: &Connection, name: &str, tagline: &str) -> Result<Blog, MyappError> {
    validate_blog(name, tagline)?;
    conn.execute(
        "INSERT INTO myapp_blog(name, tagline) VALUES(?1, ?2)",
        params![name, tagline],
    )?;
    Ok(Blog {
        id: conn.last_insert_rowid(),
        name: name.to_string(),
        tagline: tagline.to_string(),
    })
}

pub fn get_blog(conn: &Connection, id: i64) -> Result<Option<Blog>, MyappError> {
    let blog = conn
        .query_row(
            "SELECT id, name, tagline FROM myapp_blog WHERE id = ?1",
            params![id],
            blog_from_row,
        )
        .optional()?;
    Ok(blog)
}

pub fn list_blogs(conn: &Connection) -> Result<Vec<Blog>, MyappError> {
    collect_rows(
        conn,
        "SELECT id, name, tagline FROM myapp_blog ORDER BY id",
        [],
        blog_from_row,
    )
}

pub fn update_blog(conn: &Connection, blog: &Blog) -> Result<(), MyappError> {
    validate_blog(&blog.name, &blog.tagline)?;
    let changed = conn.execute(
        "UPDATE myapp_blog SET name = ?1, tagline = ?2 WHERE id = ?3",
        params![blog.name, blog.tagline, blog.id],
    )?;
    if changed == 0 {
        return Err(MyappError::NotFound(format!("blog {}", blog.id)));
    }
    Ok(())
}

/// Deletes the blog, its entries and their author links.
pub fn delete_blog(conn: &Connection, id: i64) -> Result<bool, MyappError> {
    let changed = conn.execute("DELETE FROM myapp_blog WHERE id = ?1", params![id])?;
    Ok(changed > 0)
}

pub fn create_author(conn: &Connection, name: &str, email: &str) -> Result<Author, MyappError> {
    validate_author(name, email)?;
    conn.execute(
        "INSERT INTO myapp_author(name, email) VALUES(?1, ?2)",
        params![name, email],
    )?;
    Ok(Author {
        id: conn.last_insert_rowid(),
        name: name.to_string(),
        email: email.to_string(),
    })
}

pub fn get_author(conn: &Connection, id: i64) -> Result<Option<Author>, MyappError> {
    let author = conn
        .query_row(
            "SELECT id, name, email FROM myapp_author WHERE id = ?1",
            params![id],
            author_from_row,
        )
        .optional()?;
    Ok(author)
}

pub fn list_authors(conn: &Connection) -> Result<Vec<Author>, MyappError> {
    collect_rows(
        conn,
        "SELECT id, name, email FROM myapp_author ORDER BY id",
        [],
        author_from_row,
    )
}

pub fn update_author(conn: &Connection, author: &Author) -> Result<(), MyappError> {
    validate_author(&author.name, &author.email)?;
    let changed = conn.execute(
        "UPDATE myapp_author SET name = ?1, email = ?2 WHERE id = ?3",
        params![author.name, author.email, author.id],
    )?;
    if changed == 0 {
        return Err(MyappError::NotFound(format!("author {}", author.id)));
    }
    Ok(())
}

pub fn delete_author(conn: &Connection, id: i64) -> Result<bool, MyappError> {
    let changed = conn.execute("DELETE FROM myapp_author WHERE id = ?1", params![id])?;
    Ok(changed > 0)
}

pub fn create_entry(conn: &Connection, new: &NewEntry) -> Result<Entry, MyappError> {
    new.validate()?;
    conn.execute(
        "INSERT INTO myapp_entry(blog_id, headline, body_text, pub_date, mod_date,
         n_comments, n_pingbacks, rating)
         VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            new.blog_id,
            new.headline,
            new.body_text,
            new.pub_date,
            new.mod_date,
            new.n_comments,
            new.n_pingbacks,
            new.rating
        ],
    )?;
    let id = conn.last_insert_rowid();
    tracing::debug!(id, blog_id = new.blog_id, "created entry");
    Ok(Entry {
        id,
        blog_id: new.blog_id,
        headline: new.headline.clone(),
        body_text: new.body_text.clone(),
        pub_date: new.pub_date,
        mod_date: new.mod_date,
        n_comments: new.n_comments,
        n_pingbacks: new.n_pingbacks,
        rating: new.rating,
    })
}

pub fn get_entry(conn: &Connection, id: i64) -> Result<Option<Entry>, MyappError> {
    let entry = conn
        .query_row(
            &format!("{} WHERE e.id = ?1", SELECT_ENTRY),
            params![id],
            Entry::from_row,
        )
        .optional()?;
    Ok(entry)
}

pub fn list_entries(conn: &Connection) -> Result<Vec<Entry>, MyappError> {
    collect_rows(
        conn,
        &format!("{} ORDER BY e.id", SELECT_ENTRY),
        [],
        Entry::from_row,
    )
}

pub fn blog_entries(conn: &Connection, blog_id: i64) -> Result<Vec<Entry>, MyappError> {
    collect_rows(
        conn,
        &format!("{} WHERE e.blog_id = ?1 ORDER BY e.id", SELECT_ENTRY),
        params![blog_id],
        Entry::from_row,
    )
}

pub fn update_entry(conn: &Connection, entry: &Entry) -> Result<(), MyappError> {
    entry.fields().validate()?;
    let changed = conn.execute(
        "UPDATE myapp_entry SET blog_id = ?1, headline = ?2, body_text = ?3, pub_date = ?4,
         mod_date = ?5, n_comments = ?6, n_pingbacks = ?7, rating = ?8 WHERE id = ?9",
        params![
            entry.blog_id,
            entry.headline,
            entry.body_text,
            entry.pub_date,
            entry.mod_date,
            entry.n_comments,
            entry.n_pingbacks,
            entry.rating,
            entry.id
        ],
    )?;
    if changed == 0 {
        return Err(MyappError::NotFound(format!("entry {}", entry.id)));
    }
    Ok(())
}

pub fn delete_entry(conn: &Connection, id: i64) -> Result<bool, MyappError> {
    let changed = conn.execute("DELETE FROM myapp_entry WHERE id = ?1", params![id])?;
    Ok(changed > 0)
}

/// Links an author to an entry. Linking the same pair twice is a no-op.
pub fn add_entry_author(conn: &Connection, entry_id: i64, author_id: i64) -> Result<(), MyappError> {
    conn.execute(
        "INSERT OR IGNORE INTO myapp_entry_authors(entry_id, author_id) VALUES(?1, ?2)",
        params![entry_id, author_id],
    )?;
    Ok(())
}

pub fn remove_entry_author(
    conn: &Connection,
    entry_id: i64,
    author_id: i64,
) -> Result<bool, MyappError> {
    let changed = conn.execute(
        "DELETE FROM myapp_entry_authors WHERE entry_id = ?1 AND author_id = ?2",
        params![entry_id, author_id],
    )?;
    Ok(changed > 0)
}

pub fn entry_authors(conn: &Connection, entry_id: i64) -> Result<Vec<Author>, MyappError> {
    collect_rows(
        conn,
        "SELECT a.id, a.name, a.email FROM myapp_author a
         JOIN myapp_entry_authors ea ON ea.author_id = a.id
         WHERE ea.entry_id = ?1 ORDER BY a.id",
        params![entry_id],
        author_from_row,
    )
}

pub fn author_entries(conn: &Connection, author_id: i64) -> Result<Vec<Entry>, MyappError> {
    collect_rows(
        conn,
        &format!(
            "{} JOIN myapp_entry_authors ea ON ea.entry_id = e.id
             WHERE ea.author_id = ?1 ORDER BY e.id",
            SELECT_ENTRY
        ),
        params![author_id],
        Entry::from_row,
    )
}

#[derive(Parser, Debug)]
#[clap(name = "blog", about = "Manage blogs, authors and entries.")]
pub struct BlogCli {
    #[clap(long, global = true, value_enum, default_value = "text")]
    format: OutputFormat,
    #[clap(subcommand)]
    command: BlogCommand,
}

#[derive(Subcommand, Debug)]
pub enum BlogCommand {
    /// Add a blog.
    Add {
        #[clap(long)]
        name: String,
        #[clap(long)]
        tagline: String,
    },
    /// List blogs.
    List,
    /// Delete a blog with all of its entries.
    Delete {
        #[clap(long)]
        id: i64,
    },
    /// Add an author.
    AddAuthor {
        #[clap(long)]
        name: String,
        #[clap(long)]
        email: String,
    },
    /// List authors.
    Authors,
    /// Post an entry to a blog.
    Post {
        #[clap(long)]
        blog: i64,
        #[clap(long)]
        headline: String,
        #[clap(long)]
        body: String,
        /// Publication date as YYYY-MM-DD.
        #[clap(long)]
        pub_date: NaiveDate,
        /// Defaults to the publication date.
        #[clap(long)]
        mod_date: Option<NaiveDate>,
        #[clap(long = "author")]
        authors: Vec<i64>,
        #[clap(long, default_value_t = 0)]
        rating: i64,
    },
    /// List the entries of a blog.
    Entries {
        #[clap(long)]
        id: i64,
    },
}

pub fn run_blog_cli(broker: &DbBroker, cli: BlogCli) -> Result<(), MyappError> {
    let (out, lines) = match cli.command {
        BlogCommand::Add { name, tagline } => {
            let blog = broker.with_conn("blog.add", |conn| create_blog(conn, &name, &tagline))?;
            let line = format!("Added blog #{}: {}", blog.id, blog);
            (
                command_envelope("blog.add", "ok", serde_json::json!({ "item": blog })),
                vec![line],
            )
        }
        BlogCommand::List => {
            let items = broker.with_conn("blog.list", list_blogs)?;
            let lines = items
                .iter()
                .map(|b| output::row(b.id, &format!("{} - {}", b, output::compact_line(&b.tagline, 60))))
                .collect();
            (
                command_envelope("blog.list", "ok", serde_json::json!({ "items": items })),
                lines,
            )
        }
        BlogCommand::Delete { id } => {
            let deleted = broker.with_conn("blog.delete", |conn| delete_blog(conn, id))?;
            if !deleted {
                return Err(MyappError::NotFound(format!("blog {}", id)));
            }
            (
                command_envelope("blog.delete", "ok", serde_json::json!({ "id": id })),
                vec![format!("Deleted blog #{}", id)],
            )
        }
        BlogCommand::AddAuthor { name, email } => {
            let author =
                broker.with_conn("blog.add_author", |conn| create_author(conn, &name, &email))?;
            let line = format!("Added author #{}: {} <{}>", author.id, author, author.email);
            (
                command_envelope("blog.add_author", "ok", serde_json::json!({ "item": author })),
                vec![line],
            )
        }
        BlogCommand::Authors => {
            let items = broker.with_conn("blog.authors", list_authors)?;
            let lines = items
                .iter()
                .map(|a| output::row(a.id, &format!("{} <{}>", a, a.email)))
                .collect();
            (
                command_envelope("blog.authors", "ok", serde_json::json!({ "items": items })),
                lines,
            )
        }
        BlogCommand::Post {
            blog,
            headline,
            body,
            pub_date,
            mod_date,
            authors,
            rating,
        } => {
            let new = NewEntry {
                blog_id: blog,
                headline,
                body_text: body,
                pub_date,
                mod_date: mod_date.unwrap_or(pub_date),
                n_comments: 0,
                n_pingbacks: 0,
                rating,
            };
            let entry = broker.with_conn("blog.post", |conn| {
                let tx = conn.unchecked_transaction()?;
                let entry = create_entry(&tx, &new)?;
                for author_id in &authors {
                    add_entry_author(&tx, entry.id, *author_id)?;
                }
                tx.commit()?;
                Ok(entry)
            })?;
            let line = format!("Posted entry #{}: {}", entry.id, entry);
            (
                command_envelope(
                    "blog.post",
                    "ok",
                    serde_json::json!({ "item": entry, "authors": authors }),
                ),
                vec![line],
            )
        }
        BlogCommand::Entries { id } => {
            let items = broker.with_conn("blog.entries", |conn| {
                if get_blog(conn, id)?.is_none() {
                    return Err(MyappError::NotFound(format!("blog {}", id)));
                }
                blog_entries(conn, id)
            })?;
            let lines = items
                .iter()
                .map(|e| output::row(e.id, &format!("{} ({})", e, e.pub_date)))
                .collect();
            (
                command_envelope(
                    "blog.entries",
                    "ok",
                    serde_json::json!({ "blog_id": id, "items": items }),
                ),
                lines,
            )
        }
    };
    output::emit(cli.format, &out, &lines)
}
