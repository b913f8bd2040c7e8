use crate::core::db;
use crate::core::error;
use crate::core::time;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const AUDIT_LOG_NAME: &str = "broker.events.jsonl";

/// Single entry point for database access.
/// Calls are serialized in-process and each one leaves an audit line.
pub struct DbBroker {
    db_path: PathBuf,
    busy_timeout_secs: u64,
    audit_log_path: PathBuf,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BrokerEvent {
    pub ts: String,
    pub event_id: String,
    pub op: String,
    pub db_id: String,
    pub status: String,
}

impl DbBroker {
    pub fn new(db_path: &Path, busy_timeout_secs: u64) -> Self {
        let audit_log_path = db_path
            .parent()
            .map(|p| p.join(AUDIT_LOG_NAME))
            .unwrap_or_else(|| PathBuf::from(AUDIT_LOG_NAME));
        Self {
            db_path: db_path.to_path_buf(),
            busy_timeout_secs,
            audit_log_path,
        }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn audit_log_path(&self) -> &Path {
        &self.audit_log_path
    }

    /// Execute a closure with a serialized connection to the database.
    pub fn with_conn<F, R>(&self, op_name: &str, f: F) -> Result<R, error::MyappError>
    where
        F: FnOnce(&Connection) -> Result<R, error::MyappError>,
    {
        static DB_LOCK: Mutex<()> = Mutex::new(());
        let _lock = DB_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let db_id = self
            .db_path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        let conn = db::db_connect(&self.db_path, self.busy_timeout_secs)?;

        let result = f(&conn);

        let status = match &result {
            Ok(_) => {
                tracing::debug!(op = op_name, db = %db_id, "broker op ok");
                "success"
            }
            Err(e) => {
                tracing::warn!(op = op_name, db = %db_id, error = %e, "broker op failed");
                "error"
            }
        };
        // The closure's work is already committed; an audit failure must not mask it.
        if let Err(e) = self.log_event(op_name, &db_id, status) {
            tracing::warn!(
                op = op_name,
                path = %self.audit_log_path.display(),
                error = %e,
                "failed to append audit event"
            );
        }

        result
    }

    fn log_event(&self, op: &str, db_id: &str, status: &str) -> Result<(), error::MyappError> {
        let ev = BrokerEvent {
            ts: time::now_epoch_z(),
            event_id: time::new_event_id(),
            op: op.to_string(),
            db_id: db_id.to_string(),
            status: status.to_string(),
        };

        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.audit_log_path)
            .map_err(error::MyappError::IoError)?;

        writeln!(f, "{}", serde_json::to_string(&ev)?).map_err(error::MyappError::IoError)?;
        Ok(())
    }
}
