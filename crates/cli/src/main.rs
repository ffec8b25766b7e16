//! Floating Cart CLI - Inspect and edit the locally stored cart.
//!
//! # Usage
//!
//! ```bash
//! # Show the cart
//! fcart show
//! fcart show --json
//!
//! # Add a product (or one more unit of it)
//! fcart add --id p1 --title Shoe --image-url https://cdn.example.com/shoe.png --price 50
//!
//! # Change quantities
//! fcart increment p1
//! fcart decrement p1
//! fcart remove p1
//! fcart clear
//! ```
//!
//! # Commands
//!
//! Every command loads the stored cart, applies at most one change, and waits
//! for the change to be written before exiting. Storage location and key come
//! from `FLOATING_CART_*` environment variables (see `floating_cart_store::config`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "fcart")]
#[command(author, version, about = "Floating Cart command-line tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the cart contents
    Show {
        /// Print the stored JSON layout instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Add one unit of a product
    Add {
        /// Product ID
        #[arg(long)]
        id: String,

        /// Product title
        #[arg(long)]
        title: String,

        /// Product image URL
        #[arg(long)]
        image_url: String,

        /// Unit price (e.g. 19.99)
        #[arg(long)]
        price: String,
    },
    /// Add one unit to an existing line
    Increment {
        /// Product ID
        id: String,
    },
    /// Remove one unit from a line, dropping it at zero
    Decrement {
        /// Product ID
        id: String,
    },
    /// Drop a line whatever its quantity
    Remove {
        /// Product ID
        id: String,
    },
    /// Empty the cart
    Clear,
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so `show` output stays clean.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "floating_cart_store=info,floating_cart_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let cart = commands::cart::open().await?;

    match cli.command {
        Commands::Show { json } => commands::cart::show(&cart, json)?,
        Commands::Add {
            id,
            title,
            image_url,
            price,
        } => commands::cart::add(&cart, &id, title, image_url, &price).await?,
        Commands::Increment { id } => commands::cart::increment(&cart, &id).await?,
        Commands::Decrement { id } => commands::cart::decrement(&cart, &id).await?,
        Commands::Remove { id } => commands::cart::remove(&cart, &id).await?,
        Commands::Clear => commands::cart::clear(&cart).await?,
    }
    Ok(())
}
