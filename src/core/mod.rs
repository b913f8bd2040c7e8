//! Database plumbing shared by every model: connections, the access broker,
//! errors, configuration, the schema catalog and migrations.

pub mod broker;
pub mod config;
pub mod db;
pub mod error;
pub mod migration;
pub mod output;
pub mod schemas;
pub mod time;
