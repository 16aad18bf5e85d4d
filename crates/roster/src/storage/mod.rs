//! Storage layer for roster.
//!
//! This module provides `SQLite`-based persistent storage for user records.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::user::{NewUser, User};

const USER_COLUMNS: &str = "id, email, first_name, last_name, created_at, updated_at";

/// Storage engine for users.
///
/// Emails are unique; every lookup is by exact email match.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    /// Initializes the schema if this is a new database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        migrations::initialize_schema(&conn)?;

        info!("Database opened successfully at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Insert a new user.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateEmail`] if the email is taken, or an error if
    /// the database operation fails.
    pub fn insert(&self, user: &NewUser) -> Result<User> {
        if self.exists_by_email(&user.email)? {
            debug!("Rejecting duplicate email {}", user.email);
            return Err(Error::duplicate_email(&user.email));
        }

        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            r"
            INSERT INTO users (email, first_name, last_name, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?4)
            ",
            params![user.email, user.first_name, user.last_name, now],
        )?;

        let id = self.conn.last_insert_rowid();
        debug!("Inserted user {} with id {}", user.email, id);

        self.get(id)?
            .ok_or_else(|| Error::internal(format!("user {id} vanished after insert")))
    }

    fn exists_by_email(&self, email: &str) -> Result<bool> {
        let count: i32 = self.conn.query_row(
            "SELECT COUNT(*) FROM users WHERE email = ?1",
            [email],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Get a user by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get(&self, id: i64) -> Result<Option<User>> {
        let user = self
            .conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                [id],
                Self::row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    /// Get a user by email.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = self
            .conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
                [email],
                Self::row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    /// All users in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list(&self) -> Result<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id ASC"))?;

        let users = stmt
            .query_map([], Self::row_to_user)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(users)
    }

    /// Replace a user's first and last name.
    ///
    /// Returns the updated user, or `None` if no user has this email.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn update_names(
        &self,
        email: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<Option<User>> {
        let now = Utc::now().to_rfc3339();
        let affected = self.conn.execute(
            r"
            UPDATE users SET first_name = ?2, last_name = ?3, updated_at = ?4
            WHERE email = ?1
            ",
            params![email, first_name, last_name, now],
        )?;

        if affected == 0 {
            return Ok(None);
        }
        debug!("Updated names for {}", email);
        self.get_by_email(email)
    }

    /// Delete a user by email.
    ///
    /// Returns `true` if a user was deleted, `false` if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete_by_email(&self, email: &str) -> Result<bool> {
        let affected = self
            .conn
            .execute("DELETE FROM users WHERE email = ?1", [email])?;
        if affected > 0 {
            info!("Deleted user {}", email);
        }
        Ok(affected > 0)
    }

    /// Count stored users.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let total_users = self.count()?;

        let newest: Option<String> = self
            .conn
            .query_row(
                "SELECT created_at FROM users ORDER BY id DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        let newest_user = newest.and_then(|s| parse_timestamp(&s));

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StorageStats {
            total_users,
            newest_user,
            db_size_bytes,
            schema_version: migrations::schema_version(&self.conn)?,
        })
    }

    fn row_to_user(row: &rusqlite::Row) -> rusqlite::Result<User> {
        let created_at: String = row.get(4)?;
        let updated_at: String = row.get(5)?;

        Ok(User {
            id: row.get(0)?,
            email: row.get(1)?,
            first_name: row.get(2)?,
            last_name: row.get(3)?,
            created_at: parse_timestamp(&created_at).unwrap_or_else(|| {
                warn!("Unparseable created_at {:?}, using now", created_at);
                Utc::now()
            }),
            updated_at: parse_timestamp(&updated_at).unwrap_or_else(|| {
                warn!("Unparseable updated_at {:?}, using now", updated_at);
                Utc::now()
            }),
        })
    }
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Statistics about the storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageStats {
    /// Total number of users stored.
    pub total_users: i64,
    /// Creation time of the most recently added user.
    pub newest_user: Option<DateTime<Utc>>,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
    /// Schema version recorded in the database.
    pub schema_version: i32,
}
