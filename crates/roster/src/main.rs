//! `roster` - CLI for the roster user directory
//!
//! This binary runs the HTTP server and provides direct access to the user
//! database for administration.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::PathBuf;

use clap::Parser;

use roster::cli::{Cli, Command, ConfigCommand, ServeCommand, UsersCommand};
use roster::{init_logging, Config, Error, Storage, User, UserArgs, Validator};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    // Checking a file must not depend on the active config loading cleanly.
    if let Command::Config(ConfigCommand::Validate { file }) = &cli.command {
        return validate_config(file.clone().or_else(|| cli.config.clone()));
    }

    let config = Config::load_from(cli.config.clone())?;

    match cli.command {
        Command::Serve(serve_cmd) => handle_serve(config, &serve_cmd),
        Command::Users(users_cmd) => handle_users(&config, users_cmd),
        Command::Status(status_cmd) => handle_status(&config, status_cmd.json),
        Command::Config(config_cmd) => handle_config(&config, config_cmd),
    }
}

fn handle_serve(mut config: Config, cmd: &ServeCommand) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(host) = cmd.host {
        config.server.host = host;
    }
    if let Some(port) = cmd.port {
        config.server.port = port;
    }
    if cmd.debug {
        config.server.debug = true;
    }
    config.validate()?;

    async_std::task::block_on(roster::server::serve(&config))?;
    Ok(())
}

fn handle_users(config: &Config, cmd: UsersCommand) -> Result<(), Box<dyn std::error::Error>> {
    let storage = Storage::open(config.database_path())?;
    let validator = Validator::from_config(&config.validation)?;

    match cmd {
        UsersCommand::List { json } => {
            let users = storage.list()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&users)?);
            } else if users.is_empty() {
                println!("No users.");
            } else {
                println!("{:<6} {:<32} {:<20} {:<20}", "ID", "EMAIL", "FIRST", "LAST");
                for user in &users {
                    println!(
                        "{:<6} {:<32} {:<20} {:<20}",
                        user.id, user.email, user.first_name, user.last_name
                    );
                }
            }
        }
        UsersCommand::Show { email, json } => {
            let user = storage
                .get_by_email(&email)?
                .ok_or_else(|| Error::user_not_found(&email))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&user)?);
            } else {
                print_user(&user);
            }
        }
        UsersCommand::Add {
            email,
            first_name,
            last_name,
        } => {
            let new_user = validator.validate(&UserArgs::new(email, first_name, last_name))?;
            let user = storage.insert(&new_user)?;
            println!("Added {user}");
        }
        UsersCommand::Rename {
            email,
            first_name,
            last_name,
        } => {
            let fields =
                validator.validate(&UserArgs::new(email.clone(), first_name, last_name))?;
            let user = storage
                .update_names(&email, &fields.first_name, &fields.last_name)?
                .ok_or_else(|| Error::user_not_found(&email))?;
            println!("Updated {user}");
        }
        UsersCommand::Remove { email } => {
            if !storage.delete_by_email(&email)? {
                return Err(Error::user_not_found(&email).into());
            }
            println!("Removed {email}");
        }
    }
    Ok(())
}

fn print_user(user: &User) {
    println!("{user}");
    println!("  ID:       {}", user.id);
    println!("  Created:  {}", user.created_at.to_rfc3339());
    println!("  Updated:  {}", user.updated_at.to_rfc3339());
}

fn handle_status(config: &Config, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let storage = Storage::open(config.database_path())?;
    let stats = storage.stats()?;

    if json {
        let status = serde_json::json!({
            "database_path": config.database_path(),
            "total_users": stats.total_users,
            "newest_user": stats.newest_user.map(|t| t.to_rfc3339()),
            "db_size_bytes": stats.db_size_bytes,
            "schema_version": stats.schema_version,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("roster status");
        println!("-------------");
        println!("Database:       {}", config.database_path().display());
        println!("Users:          {}", stats.total_users);
        if let Some(newest) = stats.newest_user {
            println!("Newest user:    {}", newest.to_rfc3339());
        }
        println!("Size (bytes):   {}", stats.db_size_bytes);
        println!("Schema version: {}", stats.schema_version);
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!();
                println!("[Server]");
                println!("  Address:            {}", config.bind_addr());
                println!("  Debug:              {}", config.server.debug);
                println!();
                println!("[Validation]");
                println!(
                    "  Max field length:   {}",
                    config.validation.max_field_length
                );
                println!("  Email pattern:      {}", config.validation.email_pattern);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => validate_config(file)?,
    }
    Ok(())
}

fn validate_config(file: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let path = file.unwrap_or_else(Config::default_config_path);
    println!("Validating configuration: {}", path.display());
    if let Err(e) = Config::load_from(Some(path)) {
        println!("Configuration error: {e}");
        return Err(e.into());
    }
    println!("Configuration is valid.");
    Ok(())
}
