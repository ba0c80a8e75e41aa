//! Manipi CLI - drive a cart session from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Anonymous session backed by a cookie-jar file
//! manipi-cli add 42
//! manipi-cli add 42 --variant 7
//! manipi-cli show
//! manipi-cli remove 42
//! manipi-cli clear
//!
//! # Authenticated session against the backend (MANIPI_API_BASE_URL)
//! manipi-cli --authenticated --csrf-token <token> add 42
//! ```
//!
//! # Commands
//!
//! - `add` / `remove` / `delete` - Mutate the cart
//! - `show` - Print the cart's lines and aggregate
//! - `clear` - Empty the anonymous cart

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "manipi-cli")]
#[command(author, version, about = "Manipi cart tools")]
struct Cli {
    /// Mirror mutations to the backend instead of the local cookie file
    #[arg(long)]
    authenticated: bool,

    /// Anti-forgery token for authenticated mutations (falls back to the
    /// `csrftoken` entry in the cookie jar)
    #[arg(long)]
    csrf_token: Option<String>,

    /// Cookie jar file for anonymous sessions
    #[arg(long, default_value = ".manipi-cookies.json")]
    cookies: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add one unit of a product
    Add {
        /// Product ID as rendered in the page markup
        product_id: String,

        /// Variant ID, for products sold in variants
        #[arg(short, long)]
        variant: Option<String>,
    },
    /// Remove one unit of a product
    Remove {
        product_id: String,

        #[arg(short, long)]
        variant: Option<String>,
    },
    /// Delete a product's line entirely
    Delete {
        product_id: String,

        #[arg(short, long)]
        variant: Option<String>,
    },
    /// Print the cart's lines and aggregate
    Show,
    /// Empty the anonymous cart
    Clear,
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
    let session = commands::CartSession::open(
        cli.authenticated,
        cli.csrf_token.as_deref(),
        cli.cookies,
    )?;

    match cli.command {
        Commands::Add {
            product_id,
            variant,
        } => session.add(&product_id, variant.as_deref()).await?,
        Commands::Remove {
            product_id,
            variant,
        } => session.remove(&product_id, variant.as_deref()).await?,
        Commands::Delete {
            product_id,
            variant,
        } => session.delete(&product_id, variant.as_deref()).await?,
        Commands::Show => session.show(),
        Commands::Clear => session.clear(),
    }
    Ok(())
}
