// SPDX-FileCopyrightText: 2026 Plounix Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plounix - memory and context tooling for the Fili assistant.
//!
//! This is the binary entry point for inspecting and maintaining the
//! memory store.

mod commands;
mod doctor;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use plounix_config::PlounixConfig;

/// Plounix - cross-session memory for the Fili assistant.
#[derive(Parser, Debug)]
#[command(name = "plounix", version, about, long_about = None)]
struct Cli {
    /// Load configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the facts the rule-based extractor finds in one turn, as JSON.
    Extract {
        user_message: String,
        assistant_reply: String,
    },
    /// Extract facts from one turn and save them for a user.
    Remember {
        #[arg(long)]
        user: String,
        #[arg(long)]
        session: String,
        user_message: String,
        assistant_reply: String,
    },
    /// Print the prompt that would be sent to the oracle for a message.
    Context {
        #[arg(long)]
        user: String,
        #[arg(long, default_value = "cli")]
        session: String,
        message: String,
    },
    /// Inspect and maintain stored memory facts.
    Memory {
        #[command(subcommand)]
        action: MemoryCommands,
    },
    /// Run diagnostic checks against the configuration and database.
    Doctor {
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
}

#[derive(Subcommand, Debug)]
enum MemoryCommands {
    /// List a user's live facts in ranking order.
    List {
        #[arg(long)]
        user: String,
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
    /// Show one fact by key.
    Get {
        #[arg(long)]
        user: String,
        #[arg(long)]
        key: String,
    },
    /// Give a fact a time-to-live in days.
    Expire {
        #[arg(long)]
        user: String,
        #[arg(long)]
        key: String,
        #[arg(long)]
        days: i64,
    },
    /// Delete every fact of a user. Irreversible.
    Clear {
        #[arg(long)]
        user: String,
        /// Confirm the deletion.
        #[arg(long)]
        yes: bool,
    },
    /// Delete facts whose expiry has passed.
    Prune,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => plounix_config::load_and_validate_path(path),
        None => plounix_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            plounix_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.agent.log_level);

    if let Err(e) = run(cli.command, &config).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(command: Commands, config: &PlounixConfig) -> Result<(), plounix_core::PlounixError> {
    match command {
        Commands::Extract {
            user_message,
            assistant_reply,
        } => commands::extract(&user_message, &assistant_reply),
        Commands::Remember {
            user,
            session,
            user_message,
            assistant_reply,
        } => commands::remember(config, &user, &session, &user_message, &assistant_reply).await,
        Commands::Context {
            user,
            session,
            message,
        } => commands::context(config, &user, &session, &message).await,
        Commands::Memory { action } => match action {
            MemoryCommands::List { user, limit } => commands::list(config, &user, limit).await,
            MemoryCommands::Get { user, key } => commands::get(config, &user, &key).await,
            MemoryCommands::Expire { user, key, days } => {
                commands::expire(config, &user, &key, days).await
            }
            MemoryCommands::Clear { user, yes } => commands::clear(config, &user, yes).await,
            MemoryCommands::Prune => commands::prune(config).await,
        },
        Commands::Doctor { plain } => doctor::run_doctor(config, plain).await,
    }
}

/// Initialize the tracing subscriber. `RUST_LOG` overrides the configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("plounix={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
