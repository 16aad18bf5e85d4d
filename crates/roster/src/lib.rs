//! `roster` - A small user directory with a JSON REST API
//!
//! This library provides `SQLite`-backed storage for user records and a tide
//! application exposing create, list, read, update and delete over HTTP.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod args;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod server;
pub mod storage;
pub mod user;

pub use args::{UserArgs, Validator};
pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use storage::{Storage, StorageStats};
pub use user::{NewUser, User};
