//! The storage module provides SQLite-backed stores for user accounts,
//! per-user summary history and login sessions.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, ErrorCode, OptionalExtension, params};
use std::convert::TryFrom;
use std::sync::{Arc, Mutex};

/// Storage provides database operations for accounts, summaries and sessions.
pub struct Storage {
    /// The underlying SQLite connection wrapped in Arc<Mutex<>> to make it thread-safe
    conn: Arc<Mutex<Connection>>,
}

impl Storage {
    /// Creates a new Storage instance with a database at the specified path.
    ///
    /// # Arguments
    ///
    /// * `database_path` - Path where the database file should be created or opened,
    ///   `:memory:` for a throwaway database
    ///
    /// # Errors
    ///
    /// Returns an error if database creation fails
    pub fn new(database_path: &str) -> Result<Self> {
        let conn = Connection::open(database_path)
            .context(format!("Unable to open database {database_path}"))?;

        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Initializes the database schema if it doesn't exist.
    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                salt TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS summaries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL,
                source_type TEXT NOT NULL,
                source_value TEXT NOT NULL,
                summary TEXT NOT NULL,
                created_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS summaries_by_user ON summaries (username, created_at);
            CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                username TEXT NOT NULL,
                context TEXT NOT NULL,
                last_seen INTEGER NOT NULL
            );",
        )?;

        Ok(())
    }

    /// Returns whether an account with `username` exists.
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned
    pub fn user_exists(&self, username: &str) -> Result<bool> {
        Ok(self.get_credentials(username)?.is_some())
    }

    /// Gets the stored password hash and salt of an account.
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned
    pub fn get_credentials(&self, username: &str) -> Result<Option<Credentials>> {
        let conn = self.conn.lock().expect("Storage mutex poisoned");
        let mut stmt = conn.prepare("SELECT password_hash, salt FROM users WHERE username = ?1")?;
        let credentials: Result<Option<Credentials>, rusqlite::Error> = stmt
            .query_row([username], |row| {
                Ok(Credentials {
                    password_hash: row.get(0)?,
                    salt: row.get(1)?,
                })
            })
            .optional();

        credentials.map_err(|e| e.into())
    }

    /// Creates an account.
    ///
    /// # Returns
    ///
    /// Returns `false` if the username is already taken
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned
    pub fn insert_user(&self, username: &str, credentials: &Credentials) -> Result<bool> {
        let conn = self.conn.lock().expect("Storage mutex poisoned");
        let inserted = conn.execute(
            "INSERT INTO users (username, password_hash, salt) VALUES (?1, ?2, ?3)",
            params![username, credentials.password_hash, credentials.salt],
        );

        match inserted {
            Ok(_) => Ok(true),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Ok(false)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Replaces the password of an account.
    ///
    /// # Returns
    ///
    /// Returns `false` if no such account exists
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned
    pub fn update_credentials(&self, username: &str, credentials: &Credentials) -> Result<bool> {
        let conn = self.conn.lock().expect("Storage mutex poisoned");
        let updated = conn.execute(
            "UPDATE users SET password_hash = ?1, salt = ?2 WHERE username = ?3",
            params![credentials.password_hash, credentials.salt, username],
        )?;

        Ok(updated > 0)
    }

    /// Appends a summary to its owner's history.
    ///
    /// # Returns
    ///
    /// Returns the id of the new history entry
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned
    pub fn append_summary(&self, summary: &NewSummary) -> Result<i64> {
        let conn = self.conn.lock().expect("Storage mutex poisoned");
        conn.execute(
            "INSERT INTO summaries (username, source_type, source_value, summary, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                summary.username,
                summary.source_type,
                summary.source_value,
                summary.summary,
                Utc::now().timestamp_millis(),
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// Lists a user's summaries, most recent first.
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned
    pub fn list_summaries(&self, username: &str) -> Result<Vec<SummaryRecord>> {
        let conn = self.conn.lock().expect("Storage mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, username, source_type, source_value, summary, created_at FROM summaries
             WHERE username = ?1 ORDER BY created_at DESC, id DESC",
        )?;
        let rows: Result<Vec<SummaryRow>, rusqlite::Error> =
            stmt.query_map([username], SummaryRow::from_row)?.collect();

        rows?.into_iter().map(SummaryRecord::try_from).collect()
    }

    /// Gets one of a user's summaries by id.
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned
    pub fn get_summary(&self, username: &str, id: i64) -> Result<Option<SummaryRecord>> {
        let conn = self.conn.lock().expect("Storage mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, username, source_type, source_value, summary, created_at FROM summaries
             WHERE id = ?1 AND username = ?2",
        )?;
        let row = stmt
            .query_row(params![id, username], SummaryRow::from_row)
            .optional()
            .map_err(|e| anyhow::anyhow!("Unable to fetch summary row: {e}"))?;

        row.map(SummaryRecord::try_from).transpose()
    }

    /// Removes one of a user's summaries.
    ///
    /// # Returns
    ///
    /// Returns `false` if the user has no summary with that id
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned
    pub fn delete_summary(&self, username: &str, id: i64) -> Result<bool> {
        let conn = self.conn.lock().expect("Storage mutex poisoned");
        let deleted = conn.execute(
            "DELETE FROM summaries WHERE id = ?1 AND username = ?2",
            params![id, username],
        )?;
        Ok(deleted > 0)
    }

    /// Inserts or replaces a session row.
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned
    pub fn upsert_session(&self, session: &SessionRow) -> Result<()> {
        let conn = self.conn.lock().expect("Storage mutex poisoned");
        conn.execute(
            "INSERT OR REPLACE INTO sessions (id, username, context, last_seen) VALUES (?1, ?2, ?3, ?4)",
            params![
                session.id,
                session.username,
                session.context,
                session.last_seen.timestamp()
            ],
        )?;

        Ok(())
    }

    /// Gets a session row by id.
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned
    pub fn get_session(&self, id: &str) -> Result<Option<SessionRow>> {
        let conn = self.conn.lock().expect("Storage mutex poisoned");
        let mut stmt =
            conn.prepare("SELECT id, username, context, last_seen FROM sessions WHERE id = ?1")?;
        let row: Option<(String, String, String, i64)> = stmt
            .query_row([id], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
            })
            .optional()?;

        row.map(|(id, username, context, last_seen)| -> Result<SessionRow> {
            Ok(SessionRow {
                id,
                username,
                context,
                last_seen: DateTime::from_timestamp(last_seen, 0)
                    .context("Unable to initialize last_seen from database")?,
            })
        })
        .transpose()
    }

    /// Removes a session.
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned
    pub fn delete_session(&self, id: &str) -> Result<bool> {
        let conn = self.conn.lock().expect("Storage mutex poisoned");
        let deleted = conn.execute("DELETE FROM sessions WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    /// Removes every session last seen before `cutoff`.
    ///
    /// # Returns
    ///
    /// Returns the number of sessions removed
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned
    pub fn delete_sessions_before(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let conn = self.conn.lock().expect("Storage mutex poisoned");
        let deleted = conn.execute(
            "DELETE FROM sessions WHERE last_seen < ?1",
            params![cutoff.timestamp()],
        )?;
        Ok(deleted)
    }
}

/// Salted password hash of an account.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credentials {
    pub password_hash: String,
    pub salt: String,
}

/// A summary about to be stored.
#[derive(Debug)]
pub struct NewSummary {
    pub username: String,
    pub source_type: String,
    pub source_value: String,
    pub summary: String,
}

/// Represents a summary row stored in the database
#[derive(Debug)]
struct SummaryRow {
    id: i64,
    username: String,
    source_type: String,
    source_value: String,
    summary: String,
    created_at: i64,
}

impl SummaryRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(SummaryRow {
            id: row.get(0)?,
            username: row.get(1)?,
            source_type: row.get(2)?,
            source_value: row.get(3)?,
            summary: row.get(4)?,
            created_at: row.get(5)?,
        })
    }
}

/// Represents a summary history entry
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SummaryRecord {
    pub id: i64,
    pub username: String,
    pub source_type: String,
    pub source_value: String,
    pub summary: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<SummaryRow> for SummaryRecord {
    type Error = anyhow::Error;

    fn try_from(row: SummaryRow) -> Result<Self> {
        Ok(SummaryRecord {
            id: row.id,
            username: row.username,
            source_type: row.source_type,
            source_value: row.source_value,
            summary: row.summary,
            created_at: DateTime::from_timestamp_millis(row.created_at)
                .context("Unable to initialize created_at from database")?,
        })
    }
}

/// Represents a session stored in the database; `context` is JSON.
#[derive(Clone, Debug)]
pub struct SessionRow {
    pub id: String,
    pub username: String,
    pub context: String,
    pub last_seen: DateTime<Utc>,
}
