//! myapp: relational models on SQLite.
//!
//! The crate declares a handful of entities, persists them through
//! `rusqlite`, and ships the forward-only migration history that produces
//! their tables.
//!
//! # Entities
//!
//! - `person`: Person with gender/medal choice sets, ordered by age descending
//! - `fruit`: Fruit keyed by name, price NOT NULL
//! - `membership`: FamousPerson, Group and the Membership join
//! - `blog`: Blog, Author and Entry (entries cascade with their blog)
//! - `dog`: Dog with an optional JSON document, ordered by name
//!
//! # Persisted schema
//!
//! Person, Fruit and Dog pin their table names (`person`, `fruit`, `dog`).
//! The rest use the `myapp_<model>` default. Applied migrations are
//! recorded in `myapp_migrations`.
//!
//! # Examples
//!
//! ```bash
//! myapp migrate
//! myapp person add --first-name Jane --last-name Doe --age 30 --gender F
//! myapp person list
//! myapp fruit add --name Apple --price 120
//! myapp sqlmigrate 0004
//! ```
//!
//! # Crate Structure
//!
//! - [`core`]: database access, errors, config, migrations
//! - [`models`]: entity definitions and CRUD

pub mod core;
pub mod models;

use crate::core::{
    broker::DbBroker,
    config::AppConfig,
    error::MyappError,
    migration,
    output::{self, OutputFormat},
    time::command_envelope,
};
use crate::models::{blog, dog, fruit, membership, person};

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "myapp",
    version = env!("CARGO_PKG_VERSION"),
    about = "People, fruit, groups, blogs and dogs on SQLite"
)]
pub struct Cli {
    /// Database file (overrides myapp.toml).
    #[clap(long, global = true)]
    pub db: Option<PathBuf>,
    /// Config file (defaults to ./myapp.toml when present).
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,
    /// Log debug output to stderr.
    #[clap(short, long, global = true)]
    pub verbose: bool,
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(clap::Args, Debug)]
pub struct MigrationCli {
    #[clap(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Apply pending migrations.
    Migrate(MigrationCli),
    /// List migrations and whether each is applied.
    Showmigrations(MigrationCli),
    /// Print the SQL of one migration.
    Sqlmigrate {
        /// Migration name or number, e.g. 0004_fruit or 0004.
        name: String,
    },
    /// Persons
    Person(person::PersonCli),
    /// Fruit
    Fruit(fruit::FruitCli),
    /// Famous persons, groups and memberships
    Group(membership::GroupCli),
    /// Blogs, authors and entries
    Blog(blog::BlogCli),
    /// Dogs
    Dog(dog::DogCli),
}

impl Cli {
    /// True for commands that can run against an unmigrated database.
    fn skips_auto_migrate(&self) -> bool {
        matches!(
            self.command,
            Command::Migrate(_) | Command::Showmigrations(_) | Command::Sqlmigrate { .. }
        )
    }
}

pub fn run(cli: Cli, config: AppConfig) -> Result<(), MyappError> {
    let db_path = cli.db.clone().unwrap_or(config.database.path.clone());
    let broker = DbBroker::new(&db_path, config.database.busy_timeout_secs);
    tracing::debug!(db = %db_path.display(), "using database");

    if !cli.skips_auto_migrate() {
        let applied = crate::core::db::initialize_db(&broker)?;
        if !applied.is_empty() {
            tracing::info!(count = applied.len(), "applied pending migrations");
        }
    }

    match cli.command {
        Command::Migrate(args) => run_migrate(&broker, args.format),
        Command::Showmigrations(args) => run_showmigrations(&broker, args.format),
        Command::Sqlmigrate { name } => {
            println!("{}", migration::sql_for(&name)?.trim_end());
            Ok(())
        }
        Command::Person(sub) => person::run_person_cli(&broker, sub),
        Command::Fruit(sub) => fruit::run_fruit_cli(&broker, sub),
        Command::Group(sub) => membership::run_group_cli(&broker, sub),
        Command::Blog(sub) => blog::run_blog_cli(&broker, sub),
        Command::Dog(sub) => dog::run_dog_cli(&broker, sub),
    }
}

fn run_migrate(broker: &DbBroker, format: OutputFormat) -> Result<(), MyappError> {
    let applied = crate::core::db::initialize_db(broker)?;
    let lines = if applied.is_empty() {
        vec![format!("  {} No migrations to apply.", "▸".bright_cyan())]
    } else {
        let mut lines: Vec<String> = applied
            .iter()
            .map(|name| format!("  {} Applying myapp.{}... {}", "●".bright_cyan(), name, "OK".bright_green()))
            .collect();
        lines.push(format!(
            "  {} {} migration(s) applied",
            "✓".bright_green(),
            applied.len()
        ));
        lines
    };
    let out = command_envelope("migrate", "ok", serde_json::json!({ "applied": applied }));
    output::emit(format, &out, &lines)
}

fn run_showmigrations(broker: &DbBroker, format: OutputFormat) -> Result<(), MyappError> {
    let statuses = broker.with_conn("showmigrations", migration::show_migrations)?;
    let mut lines = vec![crate::core::schemas::APP_LABEL.bold().to_string()];
    lines.extend(statuses.iter().map(|s| {
        let mark = if s.applied { "X" } else { " " };
        format!(" [{}] {}", mark, s.name)
    }));
    let out = command_envelope(
        "showmigrations",
        "ok",
        serde_json::json!({ "migrations": statuses }),
    );
    output::emit(format, &out, &lines)
}
