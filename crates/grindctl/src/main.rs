//! Grindmode Control - CLI client for the grindd focus-mode service
//!
//! Client commands (`status`, `grind`, `check`) need no credentials. Admin
//! commands send the shared secret as a bearer token.

mod client;
mod commands;
mod errors;
mod output;

use clap::{Parser, Subcommand};
use client::{GrindClient, DEFAULT_SERVER};
use errors::{ClientError, EXIT_GENERAL_ERROR, EXIT_SUCCESS};

#[derive(Parser)]
#[command(name = "grindctl")]
#[command(about = "Grindmode - shared focus mode control", long_about = None)]
#[command(version)]
struct Cli {
    /// Base URL of the grindd server
    #[arg(long, global = true, env = "GRIND_SERVER", default_value = DEFAULT_SERVER)]
    server: String,

    /// Admin secret, required by `admin` commands
    #[arg(long, global = true, env = "GRIND_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the current mode, expiry and whitelist
    Status,

    /// Start grind mode yourself (cannot be undone from the client)
    Grind {
        /// Duration in hours; 0 or omitted means indefinite
        #[arg(long)]
        hours: Option<i64>,
    },

    /// Check whether a URL or host is reachable right now
    Check {
        /// URL or bare host name
        target: String,
    },

    /// Admin operations (need --token)
    Admin {
        #[command(subcommand)]
        action: AdminCommand,
    },
}

#[derive(Subcommand)]
enum AdminCommand {
    /// Switch to chill mode
    Chill,

    /// Switch to grind mode, overriding any client-initiated period
    Grind {
        /// Duration in hours; 0 means indefinite
        #[arg(long, default_value_t = 0)]
        hours: i64,
    },

    /// Edit the whitelist
    Whitelist {
        #[command(subcommand)]
        action: WhitelistCommand,
    },
}

#[derive(Subcommand)]
enum WhitelistCommand {
    /// Replace the whole whitelist
    Set {
        /// Domains to allow during grind mode
        domains: Vec<String>,
    },

    /// Add one domain
    Add { domain: String },

    /// Remove one domain
    Remove { domain: String },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let code = match run(cli).await {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            e.downcast_ref::<ClientError>()
                .map(ClientError::exit_code)
                .unwrap_or(EXIT_GENERAL_ERROR)
        }
    };

    std::process::exit(code);
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let client = GrindClient::new(&cli.server, cli.token)?;

    match cli.command {
        Commands::Status => commands::status(&client).await,
        Commands::Grind { hours } => commands::grind(&client, hours).await,
        Commands::Check { target } => commands::check(&client, &target).await,
        Commands::Admin { action } => match action {
            AdminCommand::Chill => commands::admin_chill(&client).await,
            AdminCommand::Grind { hours } => commands::admin_grind(&client, hours).await,
            AdminCommand::Whitelist { action } => match action {
                WhitelistCommand::Set { domains } => {
                    commands::whitelist_set(&client, domains).await
                }
                WhitelistCommand::Add { domain } => {
                    commands::whitelist_add(&client, &domain).await
                }
                WhitelistCommand::Remove { domain } => {
                    commands::whitelist_remove(&client, &domain).await
                }
            },
        },
    }
}
