//! Command-line interface for roster.
//!
//! This module provides the CLI structure for the `roster` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{ConfigCommand, ServeCommand, StatusCommand, UsersCommand};

/// roster - A small user directory with a JSON REST API
///
/// Stores users (email, first name, last name) in SQLite and serves them
/// over HTTP. The `users` commands work on the same database directly.
#[derive(Debug, Parser)]
#[command(name = "roster")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP server
    Serve(ServeCommand),

    /// Manage users
    #[command(subcommand)]
    Users(UsersCommand),

    /// Show database status
    Status(StatusCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::Verbosity;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_cli_name() {
        assert_eq!(Cli::command().get_name(), "roster");
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity() {
        assert_eq!(parse(&["roster", "status"]).verbosity(), Verbosity::Normal);
        assert_eq!(parse(&["roster", "-q", "status"]).verbosity(), Verbosity::Quiet);
        assert_eq!(parse(&["roster", "-v", "status"]).verbosity(), Verbosity::Verbose);
        assert_eq!(parse(&["roster", "-vv", "status"]).verbosity(), Verbosity::Trace);
    }

    #[test]
    fn test_parse_serve() {
        let cli = parse(&["roster", "serve", "--port", "8080", "--host", "0.0.0.0"]);
        match cli.command {
            Command::Serve(cmd) => {
                assert_eq!(cmd.port, Some(8080));
                assert_eq!(cmd.host, Some("0.0.0.0".parse().unwrap()));
                assert!(!cmd.debug);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_serve_rejects_bad_host() {
        assert!(Cli::try_parse_from(["roster", "serve", "--host", "not-an-ip"]).is_err());
    }

    #[test]
    fn test_parse_users_add() {
        let cli = parse(&["roster", "users", "add", "ada@example.com", "Ada", "Lovelace"]);
        assert!(matches!(
            cli.command,
            Command::Users(UsersCommand::Add { ref email, .. }) if email == "ada@example.com"
        ));
    }

    #[test]
    fn test_parse_users_rename_requires_names() {
        assert!(Cli::try_parse_from(["roster", "users", "rename", "ada@example.com"]).is_err());
    }

    #[test]
    fn test_parse_with_config() {
        let cli = parse(&["roster", "-c", "/custom/config.toml", "status"]);
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
    }

    #[test]
    fn test_parse_config_validate() {
        let cli = parse(&["roster", "config", "validate", "--file", "x.toml"]);
        assert!(matches!(
            cli.command,
            Command::Config(ConfigCommand::Validate { file: Some(_) })
        ));
    }
}
