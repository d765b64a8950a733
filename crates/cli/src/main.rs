//! Shopvely CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! shopvely migrate
//!
//! # Create a staff account
//! shopvely admin create -u admin -e admin@example.com -p 'a long password'
//!
//! # Insert demo products into an empty catalog
//! shopvely seed
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `admin create` - Create staff users
//! - `seed` - Seed the catalog with demo products

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "shopvely")]
#[command(author, version, about = "Shopvely CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage staff users
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Insert demo products if the catalog is empty
    Seed,
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new staff user
    Create {
        /// Login name
        #[arg(short, long)]
        username: String,

        /// Email address
        #[arg(short, long)]
        email: Option<String>,

        /// Password (at least 8 characters)
        #[arg(short, long)]
        password: String,
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
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Create {
                username,
                email,
                password,
            } => {
                commands::admin::create_user(&username, email.as_deref(), &password).await?;
            }
        },
        Commands::Seed => commands::seed::products().await?,
    }
    Ok(())
}
