//! Storerate CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! storerate-cli migrate
//!
//! # Create an admin account (public registration cannot)
//! STORERATE_ADMIN_PASSWORD='Str0ng!Pass' \
//!     storerate-cli admin create -e admin@example.com -n "Admin Name" -a "1 Main St"
//!
//! # Load demo stores, owners and ratings
//! storerate-cli seed
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `admin create` - Create admin accounts
//! - `seed` - Seed the database with demo data

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "storerate-cli")]
#[command(author, version, about = "Storerate CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage admin accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Seed the database with demo owners, stores and ratings
    Seed,
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin account
    Create {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Admin display name
        #[arg(short, long)]
        name: String,

        /// Admin postal address
        #[arg(short, long, default_value = "")]
        address: String,

        /// Admin password (8-16 chars, one uppercase, one of !@#$%^&*)
        #[arg(long, env = "STORERATE_ADMIN_PASSWORD", hide_env_values = true)]
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
                email,
                name,
                address,
                password,
            } => {
                commands::admin::create_user(&email, &name, &address, password).await?;
            }
        },
        Commands::Seed => commands::seed::demo_data().await?,
    }
    Ok(())
}
