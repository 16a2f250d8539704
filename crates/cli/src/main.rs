//! Go Marketplace CLI - Inspect and edit the saved cart.
//!
//! # Usage
//!
//! ```bash
//! # Show the cart
//! gm-cart list
//!
//! # Add a product (adds one more unit if it is already in the cart)
//! gm-cart add --id 1 --title "Cadeira Rivatti" --image-url https://cdn.example/1.png --price 1400
//!
//! # Change quantities
//! gm-cart increment 1
//! gm-cart decrement 1
//!
//! # Total units in the cart
//! gm-cart count
//!
//! # Use another data directory
//! gm-cart --data-dir /tmp/cart list
//! ```
//!
//! Configuration comes from `CART_*` environment variables (see
//! `go_marketplace_cart::config`); `--data-dir` overrides `CART_DATA_DIR`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use go_marketplace_cart::CartConfig;
use go_marketplace_core::{Price, ProductId};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::CommandError;

#[derive(Parser)]
#[command(name = "gm-cart")]
#[command(author, version, about = "Go Marketplace cart tools")]
struct Cli {
    /// Directory holding the saved cart (overrides `CART_DATA_DIR`)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show every line in the cart
    List,
    /// Add one unit of a product
    Add {
        /// Product ID
        #[arg(long)]
        id: String,

        /// Display title
        #[arg(long)]
        title: String,

        /// Product image URL
        #[arg(long)]
        image_url: String,

        /// Unit price (e.g. 19.99)
        #[arg(long)]
        price: Price,
    },
    /// Add one unit to a product already in the cart
    Increment {
        /// Product ID
        id: String,
    },
    /// Remove one unit, dropping the line at zero
    Decrement {
        /// Product ID
        id: String,
    },
    /// Show the total number of units in the cart
    Count,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &CartConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    sentry_level_filter(*metadata.level())
}

fn sentry_level_filter(level: tracing::Level) -> sentry_tracing::EventFilter {
    match level {
        tracing::Level::ERROR => sentry_tracing::EventFilter::Event,
        tracing::Level::WARN | tracing::Level::INFO | tracing::Level::DEBUG => {
            sentry_tracing::EventFilter::Breadcrumb
        }
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing() {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "go_marketplace_cart=info,go_marketplace_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match CartConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing();
            tracing::error!("Invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(data_dir) = cli.data_dir.clone() {
        config.data_dir = data_dir;
    }

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);
    init_tracing();

    match run(cli.command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Command failed: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands, config: &CartConfig) -> Result<(), CommandError> {
    let cart = commands::cart::open(config).await?;

    match command {
        Commands::List => commands::cart::list(&cart),
        Commands::Add {
            id,
            title,
            image_url,
            price,
        } => commands::cart::add(&cart, ProductId::new(id), title, image_url, price).await?,
        Commands::Increment { id } => {
            commands::cart::increment(&cart, &ProductId::new(id)).await?;
        }
        Commands::Decrement { id } => {
            commands::cart::decrement(&cart, &ProductId::new(id)).await?;
        }
        Commands::Count => commands::cart::count(&cart),
    }
    Ok(())
}
