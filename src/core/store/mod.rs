//! SQLite-backed relational store
//!
//! Holds the project category tree, projects, parts, the project/part
//! association registry, project runs and instance settings.
//!
//! Referential integrity is enforced by SQLite itself: foreign keys are
//! switched on for every connection and all child tables cascade on delete.
//! The association registry additionally carries a UNIQUE(project, part)
//! constraint, so deduplication does not depend on callers racing politely.

mod categories;
mod parts;
mod project_parts;
mod projects;
mod runs;
mod schema;
mod settings;
mod types;

pub use settings::INSTANCE_SETTING_KEY;
pub use types::*;

use std::path::Path;

use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use thiserror::Error;
use tracing::debug;

use crate::core::identity::EntityId;

/// Current schema version; a database written by another version is refused
pub const SCHEMA_VERSION: i32 = 1;

/// Date format used for stored dates
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Errors raised by the store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("referenced {entity} does not exist: {id}")]
    Reference { entity: &'static str, id: String },

    #[error("foreign key violation: {0}")]
    ForeignKey(String),

    #[error("moving category {category} under {parent} would create a cycle")]
    Cycle { category: EntityId, parent: EntityId },

    #[error("quantity must be a positive integer, got {0}")]
    InvalidQuantity(i64),

    #[error("{0}")]
    Validation(String),

    #[error("a {entity} named '{name}' already exists at this level")]
    Duplicate { entity: &'static str, name: String },

    #[error("database schema version {found} does not match expected version {expected}")]
    SchemaMismatch { found: i32, expected: i32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = StoreError> = std::result::Result<T, E>;

impl StoreError {
    /// Map a raw SQLite error, turning foreign key failures into [`StoreError::ForeignKey`]
    pub(crate) fn from_sqlite(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, msg)
                if e.code == ErrorCode::ConstraintViolation
                    && e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
            {
                StoreError::ForeignKey(msg.clone().unwrap_or_else(|| "constraint failed".into()))
            }
            _ => StoreError::Sqlite(err),
        }
    }

    /// True when the underlying failure is a UNIQUE constraint violation
    pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
        matches!(
            err,
            rusqlite::Error::SqliteFailure(e, _)
                if e.code == ErrorCode::ConstraintViolation
                    && e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
        )
    }
}

/// The relational store backed by SQLite
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open or create the database at `path`
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        debug!(path = %path.display(), "opening store");
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::from_connection(conn)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let mut store = Self { conn };

        match store.schema_version()? {
            None => store.init_schema()?,
            Some(SCHEMA_VERSION) => {}
            Some(found) => {
                return Err(StoreError::SchemaMismatch {
                    found,
                    expected: SCHEMA_VERSION,
                })
            }
        }

        Ok(store)
    }

    fn schema_version(&self) -> Result<Option<i32>> {
        let has_table: bool = self.conn.query_row(
            "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type = 'table' AND name = 'schema_version'",
            [],
            |row| row.get(0),
        )?;
        if !has_table {
            return Ok(None);
        }

        Ok(self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .optional()?)
    }

    /// Row counts and file size
    pub fn statistics(&self) -> Result<StoreStats> {
        let count = |table: &str| -> Result<usize> {
            let n: i64 = self
                .conn
                .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                    row.get(0)
                })?;
            Ok(n as usize)
        };

        let page_count: i64 = self
            .conn
            .query_row("PRAGMA page_count", [], |row| row.get(0))?;
        let page_size: i64 = self
            .conn
            .query_row("PRAGMA page_size", [], |row| row.get(0))?;

        Ok(StoreStats {
            categories: count("project_categories")?,
            projects: count("projects")?,
            parts: count("parts")?,
            project_parts: count("project_parts")?,
            runs: count("project_runs")?,
            db_size_bytes: (page_count * page_size) as u64,
        })
    }
}

/// Check that a row with the given id exists in `table`
fn row_exists(conn: &Connection, table: &str, id: &EntityId) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            &format!("SELECT 1 FROM {} WHERE id = ?1", table),
            params![id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

fn require_quantity(quantity: u32) -> Result<()> {
    if quantity == 0 {
        return Err(StoreError::InvalidQuantity(0));
    }
    Ok(())
}

fn parse_date(idx: usize, value: String) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(&value, DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::identity::EntityPrefix;
    use tempfile::tempdir;

    #[test]
    fn test_open_creates_empty_store() {
        let tmp = tempdir().unwrap();
        let store = Store::open(&tmp.path().join(".itree/inventory.db")).unwrap();

        let stats = store.statistics().unwrap();
        assert_eq!(stats.categories, 0);
        assert_eq!(stats.projects, 0);
        assert_eq!(stats.project_parts, 0);
        assert!(stats.db_size_bytes > 0);
    }

    #[test]
    fn test_reopen_keeps_data() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("inventory.db");
        {
            let mut store = Store::open(&path).unwrap();
            store.create_part("Resistor", "").unwrap();
        }
        let store = Store::open(&path).unwrap();
        assert_eq!(store.list_parts().unwrap().len(), 1);
    }

    #[test]
    fn test_schema_mismatch_is_refused() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("inventory.db");
        {
            let store = Store::open(&path).unwrap();
            store
                .conn
                .execute("UPDATE schema_version SET version = 99", [])
                .unwrap();
        }
        let err = Store::open(&path).err().unwrap();
        assert!(matches!(
            err,
            StoreError::SchemaMismatch {
                found: 99,
                expected: SCHEMA_VERSION
            }
        ));
    }

    #[test]
    fn test_foreign_keys_enforced_by_database() {
        let store = Store::open_in_memory().unwrap();
        let missing = EntityId::new(EntityPrefix::Cat);
        let err = store
            .conn
            .execute(
                "INSERT INTO projects (id, name, description, category_id) VALUES (?1, 'x', '', ?2)",
                params![EntityId::new(EntityPrefix::Prj), missing],
            )
            .unwrap_err();

        assert!(matches!(
            StoreError::from_sqlite(err),
            StoreError::ForeignKey(_)
        ));
    }
}
