//! User records.
//!
//! A [`User`] is what storage hands back; a [`NewUser`] is a validated set of
//! fields that has not been stored yet.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A stored user.
///
/// Only `id`, `email`, `first_name` and `last_name` are serialized; the
/// timestamps stay internal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    /// Identifier assigned by storage.
    pub id: i64,
    /// Unique email address.
    pub email: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// When the user was created.
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
    /// When the user was last modified.
    #[serde(skip)]
    pub updated_at: DateTime<Utc>,
}

impl std::fmt::Display for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "User: {}, {} has email: {}",
            self.last_name, self.first_name, self.email
        )
    }
}

/// Validated fields for a user that is about to be stored or updated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    /// Email address.
    pub email: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
}
