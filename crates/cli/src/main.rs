//! Zypso Mart CLI - catalog seeding, sales reports and shop controls.
//!
//! # Usage
//!
//! ```bash
//! # Load categories and products from a YAML file
//! zypso-cli seed catalog.yaml
//!
//! # Revenue and units sold over delivered orders
//! zypso-cli report --start 2024-05-01 --end 2024-05-31
//!
//! # Close the shop until tomorrow morning, then reopen it
//! zypso-cli shop close --next-open 2024-05-02T03:30:00Z
//! zypso-cli shop open
//! ```
//!
//! Uses the same `ZYPSO_BACKEND` / `FIREBASE_*` environment as the admin.

#![cfg_attr(not(test), forbid(unsafe_code))]

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};

use zypso_admin::config::AdminConfig;

mod commands;

#[derive(Parser)]
#[command(name = "zypso-cli")]
#[command(author, version, about = "Zypso Mart CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed categories and products from a YAML file
    Seed {
        /// Path to the YAML file
        file: String,
    },
    /// Print revenue and units sold over delivered orders
    Report {
        /// First day, inclusive (YYYY-MM-DD)
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Last day, inclusive (YYYY-MM-DD)
        #[arg(long)]
        end: Option<NaiveDate>,
    },
    /// Open or close the shop
    Shop {
        #[command(subcommand)]
        action: ShopAction,
    },
}

#[derive(Subcommand)]
enum ShopAction {
    /// Reopen the shop and clear the next opening time
    Open,
    /// Close the shop
    Close {
        /// When the shop reopens (RFC 3339), shown on the closed overlay
        #[arg(long)]
        next_open: Option<DateTime<Utc>>,
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
    let config = AdminConfig::from_env()?;
    let backend = config.backend.connect();
    let store = backend.store.as_ref();
    tracing::debug!(backend = config.backend.name(), "Backend connected");

    match cli.command {
        Commands::Seed { file } => commands::seed::from_file(store, &file).await?,
        Commands::Report { start, end } => {
            commands::report::print(store, start, end, &config.clock).await?;
        }
        Commands::Shop { action } => match action {
            ShopAction::Open => commands::shop::open(store).await?,
            ShopAction::Close { next_open } => commands::shop::close(store, next_open).await?,
        },
    }
    Ok(())
}
