//! Error types for roster.
//!
//! This module defines all error types used throughout the roster crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

/// Field name to message, for rejected request arguments.
pub type FieldErrors = BTreeMap<String, String>;

/// The main error type for roster operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === User Errors ===
    /// No user is stored under the given email.
    #[error("user not found: {email}")]
    UserNotFound {
        /// The email that was looked up.
        email: String,
    },

    /// A user with the given email already exists.
    #[error("a user with email {email} already exists")]
    DuplicateEmail {
        /// The conflicting email.
        email: String,
    },

    /// One or more request arguments were missing or invalid.
    #[error("invalid arguments: {}", format_field_errors(.0))]
    InvalidArguments(FieldErrors),

    /// The request body could not be decoded.
    #[error("malformed request body: {0}")]
    MalformedBody(String),

    // === Server Errors ===
    /// The HTTP server failed to bind or serve.
    #[error("server error on {addr}: {source}")]
    Serve {
        /// Address the server was listening on.
        addr: String,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for roster operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

fn format_field_errors(errors: &FieldErrors) -> String {
    errors
        .iter()
        .map(|(field, message)| format!("{field}: {message}"))
        .collect::<Vec<_>>()
        .join("; ")
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a user-not-found error.
    #[must_use]
    pub fn user_not_found(email: impl Into<String>) -> Self {
        Self::UserNotFound {
            email: email.into(),
        }
    }

    /// Create a duplicate-email error.
    #[must_use]
    pub fn duplicate_email(email: impl Into<String>) -> Self {
        Self::DuplicateEmail {
            email: email.into(),
        }
    }

    /// Check if this error means the requested user does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::UserNotFound { .. })
    }

    /// Check if this error is a uniqueness conflict.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::DuplicateEmail { .. })
    }

    /// Check if this error was caused by the caller's input.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::UserNotFound { .. }
                | Self::DuplicateEmail { .. }
                | Self::InvalidArguments(_)
                | Self::MalformedBody(_)
        )
    }
}
