//! Request argument parsing and validation.
//!
//! Arguments arrive as optional strings from a JSON body, a form body or the
//! query string. [`Validator`] turns them into a [`NewUser`] or a map of
//! per-field messages.

use std::fmt;

use regex::Regex;
use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;

use crate::config::ValidationConfig;
use crate::error::{Error, FieldErrors, Result};
use crate::user::NewUser;

/// Raw user arguments as received from a client.
///
/// Numbers and booleans are taken as their text, so `{"first_name": 5}`
/// reads as `"5"`. Arrays and objects are rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UserArgs {
    /// Email address.
    #[serde(deserialize_with = "scalar_string")]
    pub email: Option<String>,
    /// Given name.
    #[serde(deserialize_with = "scalar_string")]
    pub first_name: Option<String>,
    /// Family name.
    #[serde(deserialize_with = "scalar_string")]
    pub last_name: Option<String>,
}

fn scalar_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct ScalarVisitor;

    impl<'de> Visitor<'de> for ScalarVisitor {
        type Value = Option<String>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a string, number or boolean")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<Self::Value, E> {
            Ok(Some(v))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_none<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D2>(self, deserializer: D2) -> std::result::Result<Self::Value, D2::Error>
        where
            D2: Deserializer<'de>,
        {
            deserializer.deserialize_any(self)
        }
    }

    deserializer.deserialize_any(ScalarVisitor)
}

impl UserArgs {
    /// Build arguments with every field present.
    #[must_use]
    pub fn new(
        email: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            email: Some(email.into()),
            first_name: Some(first_name.into()),
            last_name: Some(last_name.into()),
        }
    }

    /// Fill any missing field from `other`.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self {
            email: self.email.or(other.email),
            first_name: self.first_name.or(other.first_name),
            last_name: self.last_name.or(other.last_name),
        }
    }
}

/// A validated argument and its user-facing label.
struct Field {
    name: &'static str,
    label: &'static str,
    blank: &'static str,
}

const EMAIL: Field = Field {
    name: "email",
    label: "Email",
    blank: "Email can't be blank",
};

const FIRST_NAME: Field = Field {
    name: "first_name",
    label: "Forename",
    blank: "Forename can't be blank",
};

const LAST_NAME: Field = Field {
    name: "last_name",
    label: "Surname",
    blank: "Surname can't be blank",
};

/// Validates [`UserArgs`] against the configured rules.
#[derive(Debug, Clone)]
pub struct Validator {
    max_field_length: usize,
    email_pattern: Regex,
}

impl Validator {
    /// Compile a validator from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the email pattern is not a valid regex.
    pub fn from_config(config: &ValidationConfig) -> Result<Self> {
        let email_pattern =
            Regex::new(&config.email_pattern).map_err(|e| Error::ConfigValidation {
                message: format!("invalid regex pattern: {e}"),
            })?;
        Ok(Self {
            max_field_length: config.max_field_length,
            email_pattern,
        })
    }

    /// Check every field, collecting all problems before failing.
    ///
    /// Values are trimmed; a field that is absent or only whitespace counts
    /// as blank.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArguments`] listing each rejected field.
    pub fn validate(&self, args: &UserArgs) -> Result<NewUser> {
        let mut errors = FieldErrors::new();

        let email = self.check(&EMAIL, args.email.as_deref(), &mut errors);
        let first_name = self.check(&FIRST_NAME, args.first_name.as_deref(), &mut errors);
        let last_name = self.check(&LAST_NAME, args.last_name.as_deref(), &mut errors);

        if let Some(email) = email {
            if !self.email_pattern.is_match(email) {
                errors.insert(
                    EMAIL.name.to_string(),
                    "Email is not a valid address".to_string(),
                );
            }
        }

        match (email, first_name, last_name) {
            (Some(email), Some(first_name), Some(last_name)) if errors.is_empty() => {
                Ok(NewUser {
                    email: email.to_string(),
                    first_name: first_name.to_string(),
                    last_name: last_name.to_string(),
                })
            }
            _ => Err(Error::InvalidArguments(errors)),
        }
    }

    fn check<'a>(
        &self,
        field: &Field,
        value: Option<&'a str>,
        errors: &mut FieldErrors,
    ) -> Option<&'a str> {
        let value = value.map(str::trim).filter(|v| !v.is_empty());
        let Some(value) = value else {
            errors.insert(field.name.to_string(), field.blank.to_string());
            return None;
        };

        if value.chars().count() > self.max_field_length {
            errors.insert(
                field.name.to_string(),
                format!(
                    "{} must be at most {} characters",
                    field.label, self.max_field_length
                ),
            );
            return None;
        }

        Some(value)
    }
}
