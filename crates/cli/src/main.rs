//! Emporium CLI - database migrations and catalogue seeding.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! emporium-cli migrate
//!
//! # Load products from a YAML catalogue
//! emporium-cli seed products --file catalogue.yaml
//! ```
//!
//! Both commands read `EMPORIUM_DATABASE_URL` (or `DATABASE_URL`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "emporium-cli")]
#[command(author, version, about = "Emporium CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate,
    /// Seed the document store
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Upsert catalogue products from a YAML file
    Products {
        /// Path to the YAML catalogue
        #[arg(short, long)]
        file: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
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
        Commands::Migrate => commands::migrate::storefront().await?,
        Commands::Seed { target } => match target {
            SeedTarget::Products { file } => commands::seed::products(&file).await?,
        },
    }
    Ok(())
}
