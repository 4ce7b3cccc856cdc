use crate::schema::MIG_0001_RUNS;
use anyhow::Result;
use rusqlite::Connection;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConnectionError {
    #[error("connection string is empty")]
    Empty,
    #[error("unsupported warehouse scheme '{0}' (expected sqlite)")]
    UnsupportedScheme(String),
}

/// Where the warehouse lives, parsed from a connection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionTarget {
    File(PathBuf),
    Memory,
}

impl ConnectionTarget {
    /// Accepts `sqlite://<path>`, `sqlite:<path>`, `sqlite::memory:` or a bare path.
    pub fn parse(s: &str) -> Result<Self, ConnectionError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ConnectionError::Empty);
        }
        if s == "sqlite::memory:" || s == ":memory:" {
            return Ok(ConnectionTarget::Memory);
        }
        let path = if let Some(rest) = s.strip_prefix("sqlite://") {
            rest
        } else if let Some(rest) = s.strip_prefix("sqlite:") {
            rest
        } else if let Some((scheme, _)) = s.split_once("://") {
            return Err(ConnectionError::UnsupportedScheme(scheme.to_string()));
        } else {
            s
        };
        // Drop URL-style options such as `?mode=rwc`.
        let path = path.split('?').next().unwrap_or_default();
        if path.is_empty() {
            return Err(ConnectionError::Empty);
        }
        Ok(ConnectionTarget::File(PathBuf::from(path)))
    }
}

pub struct Warehouse {
    pub conn: Connection,
}

impl Warehouse {
    pub fn connect(target: &ConnectionTarget) -> Result<Self> {
        let conn = match target {
            ConnectionTarget::File(path) => {
                let conn = Connection::open(path)?;
                conn.pragma_update_and_check(None, "journal_mode", "WAL", |r| r.get::<_, String>(0))?;
                conn
            }
            ConnectionTarget::Memory => Connection::open_in_memory()?,
        };
        apply_pragmas(&conn)?;
        migrate(&conn)?;
        Ok(Warehouse { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::connect(&ConnectionTarget::Memory)
    }
}

fn apply_pragmas(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    Ok(())
}

fn migrate(conn: &Connection) -> Result<()> {
    // naive: if the ledger doesn't exist, apply 0001
    let exists: i64 = conn.query_row(
        "SELECT COUNT(1) FROM sqlite_master WHERE type='table' AND name='etl_runs'",
        [],
        |r| r.get(0),
    )?;
    if exists == 0 {
        conn.execute_batch(MIG_0001_RUNS)?;
    }
    Ok(())
}
