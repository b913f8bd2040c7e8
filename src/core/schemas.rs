//! Table names and embedded migration SQL for the `myapp` schema.
//!
//! Models without an explicit table name get `<app_label>_<model>`; Person,
//! Fruit and Dog pin theirs.

pub const APP_LABEL: &str = "myapp";

pub const PERSON_TABLE: &str = "person";
pub const FRUIT_TABLE: &str = "fruit";
pub const DOG_TABLE: &str = "dog";
pub const FAMOUS_PERSON_TABLE: &str = "myapp_famousperson";
pub const GROUP_TABLE: &str = "myapp_group";
pub const MEMBERSHIP_TABLE: &str = "myapp_membership";
pub const BLOG_TABLE: &str = "myapp_blog";
pub const AUTHOR_TABLE: &str = "myapp_author";
pub const ENTRY_TABLE: &str = "myapp_entry";
pub const ENTRY_AUTHORS_TABLE: &str = "myapp_entry_authors";

pub const MIGRATIONS_TABLE: &str = "myapp_migrations";

pub const MIGRATIONS_DB_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS myapp_migrations (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        app TEXT NOT NULL,
        name TEXT NOT NULL,
        applied TEXT NOT NULL,
        UNIQUE(app, name)
    )
";

pub const MIGRATION_0001_INITIAL: &str = include_str!("../../migrations/0001_initial.sql");
pub const MIGRATION_0002_DOG: &str = include_str!("../../migrations/0002_dog.sql");
pub const MIGRATION_0003_PERSON_TABLE: &str =
    include_str!("../../migrations/0003_alter_person_options_alter_person_table.sql");
pub const MIGRATION_0004_FRUIT: &str = include_str!("../../migrations/0004_fruit.sql");

/// Framework-default table name for a model, e.g. `FamousPerson` -> `myapp_famousperson`.
pub fn default_table_name(model: &str) -> String {
    format!("{}_{}", APP_LABEL, model.to_lowercase())
}
