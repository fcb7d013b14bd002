//! Hrtaj CLI - database migrations and owner bootstrap.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! hrtaj-cli migrate
//!
//! # Create the first owner account
//! HRTAJ_OWNER_PASSWORD='...' hrtaj-cli owner create -e owner@example.com -n "Owner Name"
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `owner create` - Create an owner account

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use secrecy::SecretString;

mod commands;

#[derive(Parser)]
#[command(name = "hrtaj-cli")]
#[command(author, version, about = "Hrtaj CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage owner accounts
    Owner {
        #[command(subcommand)]
        action: OwnerAction,
    },
}

#[derive(Subcommand)]
enum OwnerAction {
    /// Create an owner account
    Create {
        /// Owner email address
        #[arg(short, long)]
        email: String,

        /// Owner display name
        #[arg(short, long)]
        name: Option<String>,

        /// Account password
        #[arg(long, env = "HRTAJ_OWNER_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Owner { action } => match action {
            OwnerAction::Create {
                email,
                name,
                password,
            } => {
                let password = SecretString::from(password);
                commands::owner::create(&email, &password, name).await?;
            }
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_owner_create_parses() {
        let cli = Cli::try_parse_from([
            "hrtaj-cli",
            "owner",
            "create",
            "-e",
            "owner@example.com",
            "--password",
            "long enough secret",
        ]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Owner {
                action: OwnerAction::Create { name: None, .. }
            })
        ));
    }
}
