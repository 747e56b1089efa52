//! A un Clic la CLI - database migrations, catalog seeding and maintenance.
//!
//! # Usage
//!
//! ```bash
//! # Apply storefront migrations
//! aun-cli migrate
//!
//! # Load subcategories and products from YAML
//! aun-cli seed --file data/catalog.yaml
//!
//! # Check a seed file without touching the database
//! aun-cli seed --file data/catalog.yaml --dry-run
//!
//! # Delete expired sessions
//! aun-cli sessions prune
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "aun-cli")]
#[command(author, version, about = "A un Clic la CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate,
    /// Seed the catalog from a YAML file
    Seed {
        /// Path to the YAML file
        #[arg(short, long)]
        file: String,

        /// Validate the file and stop before connecting
        #[arg(long)]
        dry_run: bool,
    },
    /// Session store maintenance
    Sessions {
        #[command(subcommand)]
        action: SessionAction,
    },
}

#[derive(Subcommand)]
enum SessionAction {
    /// Delete sessions past their expiry date
    Prune,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::storefront().await?,
        Commands::Seed { file, dry_run } => commands::seed::catalog(&file, dry_run).await?,
        Commands::Sessions { action } => match action {
            SessionAction::Prune => commands::sessions::prune().await?,
        },
    }
    Ok(())
}
