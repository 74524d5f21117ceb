//! Database module for helloivy
//!
//! Append-only persistence for contact form entries.

mod schema;

pub use schema::*;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Invalid timestamp in row {id}: {value}")]
    BadTimestamp { id: String, value: String },
}

pub type DbResult<T> = Result<T, DbError>;

/// Thread-safe database handle
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn run_migrations(&self) -> DbResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Insert a new entry stamped with the current time
    pub fn add_entry(&self, entry: &NewContact) -> DbResult<ContactEntry> {
        self.add_entry_at(entry, Utc::now())
    }

    /// Insert a new entry with an explicit creation time
    pub fn add_entry_at(
        &self,
        entry: &NewContact,
        created_at: DateTime<Utc>,
    ) -> DbResult<ContactEntry> {
        let conn = self.conn.lock().unwrap();
        let id = uuid::Uuid::new_v4().to_string();
        // Stored with microsecond precision; return what a later read sees
        let created_at = created_at.trunc_subsecs(6);

        // Fixed-width UTC timestamps so text ordering matches time ordering
        conn.execute(
            "INSERT INTO contact_entries (id, name, email, message, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                id,
                entry.name,
                entry.email,
                entry.message,
                created_at.to_rfc3339_opts(SecondsFormat::Micros, true)
            ],
        )?;

        Ok(ContactEntry {
            id,
            name: entry.name.clone(),
            email: entry.email.clone(),
            message: entry.message.clone(),
            created_at,
        })
    }

    /// All entries, newest first
    pub fn list_entries(&self) -> DbResult<Vec<ContactEntry>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, name, email, message, created_at
             FROM contact_entries
             ORDER BY created_at DESC",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        rows.map(|row| -> DbResult<ContactEntry> {
            let (id, name, email, message, created_at) = row?;
            let created_at = parse_datetime(&created_at).ok_or_else(|| DbError::BadTimestamp {
                id: id.clone(),
                value: created_at.clone(),
            })?;
            Ok(ContactEntry {
                id,
                name,
                email,
                message,
                created_at,
            })
        })
        .collect()
    }
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn contact(name: &str) -> NewContact {
        NewContact {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            message: format!("Hello from {name}"),
        }
    }

    #[test]
    fn test_add_and_list_entry() {
        let db = Database::open_in_memory().unwrap();

        let entry = db.add_entry(&contact("Ada")).unwrap();
        assert_eq!(entry.name, "Ada");
        assert_eq!(entry.email, "ada@example.com");
        assert!(!entry.id.is_empty());

        let entries = db.list_entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, entry.id);
        assert_eq!(entries[0].message, "Hello from Ada");
    }

    #[test]
    fn test_list_is_newest_first() {
        let db = Database::open_in_memory().unwrap();
        let t1 = Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap();
        let t3 = Utc.with_ymd_and_hms(2025, 1, 2, 8, 30, 0).unwrap();

        // Insert out of order; listing must not depend on insertion order
        db.add_entry_at(&contact("Second"), t2).unwrap();
        db.add_entry_at(&contact("Third"), t3).unwrap();
        db.add_entry_at(&contact("First"), t1).unwrap();

        let entries = db.list_entries().unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Third", "Second", "First"]);
        assert_eq!(entries[0].created_at, t3);
        assert_eq!(entries[2].created_at, t1);
    }

    #[test]
    fn test_entries_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contacts.db");

        {
            let db = Database::open(&path).unwrap();
            db.add_entry(&contact("Grace")).unwrap();
        }

        let db = Database::open(&path).unwrap();
        let entries = db.list_entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "Grace");
    }
}
