//! Part Fruit CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! pf-cli migrate
//!
//! # Seed an empty store with the embedded catalog, or with a YAML file
//! pf-cli seed
//! pf-cli seed --file seed/catalog.yaml
//!
//! # Create admin user
//! pf-cli admin create -u admin -p 'secret'
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed` - Insert the default admin and catalog into an empty store
//! - `admin create` - Create admin users
//!
//! All commands read `STOREFRONT_DATABASE_URL` (or `DATABASE_URL`) like the server,
//! from the environment or a `.env` file.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "pf-cli")]
#[command(author, version, about = "Part Fruit CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed an empty store
    Seed {
        /// YAML catalog replacing the embedded one
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Manage admin users
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin user
    Create {
        /// Login name
        #[arg(short, long)]
        username: String,

        /// Password
        #[arg(short, long)]
        password: String,
    },
}

#[tokio::main]
async fn main() {
    // Load .env before tracing so RUST_LOG from it applies
    dotenvy::dotenv().ok();
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
        Commands::Seed { file } => commands::seed::run(file.as_deref()).await?,
        Commands::Admin { action } => match action {
            AdminAction::Create { username, password } => {
                commands::admin::create_user(&username, &password).await?;
            }
        },
    }
    Ok(())
}
