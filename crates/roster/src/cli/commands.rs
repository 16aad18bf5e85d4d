//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::net::IpAddr;
use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Serve command arguments.
#[derive(Debug, Args)]
pub struct ServeCommand {
    /// Address to bind (overrides configuration)
    #[arg(long)]
    pub host: Option<IpAddr>,

    /// Port to listen on (overrides configuration)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Include error details in server error responses
    #[arg(long)]
    pub debug: bool,
}

/// User management commands.
#[derive(Debug, Subcommand)]
pub enum UsersCommand {
    /// List every user
    List {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show one user
    Show {
        /// Email of the user
        email: String,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Add a user
    Add {
        /// Email address
        email: String,
        /// First name
        first_name: String,
        /// Last name
        last_name: String,
    },

    /// Change a user's first and last name
    Rename {
        /// Email of the user
        email: String,
        /// New first name
        first_name: String,
        /// New last name
        last_name: String,
    },

    /// Remove a user
    Remove {
        /// Email of the user
        email: String,
    },
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}
