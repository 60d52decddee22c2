//! Shopfront CLI - catalog browsing, seed validation and a checkout demo.
//!
//! # Usage
//!
//! ```bash
//! # Browse the public catalog
//! shopfront catalog list --category electronics
//! shopfront catalog show 3
//! shopfront catalog categories
//!
//! # Validate a catalog seed file
//! shopfront seed data/catalog.yaml
//!
//! # Walk through sign-in, cart and checkout against in-memory services
//! shopfront demo
//! shopfront demo --seed data/catalog.yaml --fail-first-checkout
//! ```
//!
//! # Commands
//!
//! - `catalog` - Read products and categories from the catalog API
//! - `seed` - Validate a seed file and dry-run loading it
//! - `demo` - Run the checkout walkthrough

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use shopfront::config::ShopConfig;

mod commands;

#[derive(Parser)]
#[command(name = "shopfront")]
#[command(author, version, about = "Shopfront CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse the product catalog
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
    /// Validate a catalog seed file
    Seed {
        /// Path to the YAML seed file
        file: String,
    },
    /// Run the checkout walkthrough
    Demo {
        /// Seed file to use instead of the bundled catalog
        #[arg(short, long)]
        seed: Option<String>,

        /// Take the store offline for the first checkout attempt
        #[arg(long)]
        fail_first_checkout: bool,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// List products
    List {
        /// Only list products in this category
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Show one product
    Show {
        /// Product ID
        id: String,
    },
    /// List category names
    Categories,
}

#[tokio::main]
#[allow(clippy::print_stderr)]
async fn main() {
    let cli = Cli::parse();

    let config = match ShopConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            // Tracing is not up yet
            eprintln!("Invalid configuration: {e}");
            std::process::exit(2);
        }
    };

    let _sentry_guard = match shopfront::telemetry::init(&config.telemetry) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            None
        }
    };

    let result: Result<(), Box<dyn std::error::Error>> = run(cli, &config).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &ShopConfig) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Catalog { action } => match action {
            CatalogAction::List { category } => {
                commands::catalog::list(config, category.as_deref()).await?;
            }
            CatalogAction::Show { id } => commands::catalog::show(config, &id).await?,
            CatalogAction::Categories => commands::catalog::categories(config).await?,
        },
        Commands::Seed { file } => commands::seed::check(&file, config).await?,
        Commands::Demo {
            seed,
            fail_first_checkout,
        } => {
            commands::demo::run(
                config,
                commands::demo::DemoOptions {
                    seed_path: seed.as_deref(),
                    fail_first_checkout,
                },
            )
            .await?;
        }
    }
    Ok(())
}
