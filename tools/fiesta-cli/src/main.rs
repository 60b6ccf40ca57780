//! Fiesta CLI - browse the party-rental catalog, fill a cart and check out.
//!
//! Commands:
//! - `fiesta catalog` - List or show products
//! - `fiesta products` - Create, update and delete products (administrators)
//! - `fiesta cart` - Add, remove and change cart lines
//! - `fiesta checkout` - Pay now, reserve, or handle a payment return
//! - `fiesta orders` - Order history and status changes
//! - `fiesta auth` - Register, sign in and sign out
//! - `fiesta config` - Manage configuration

mod commands;
mod config;
mod context;
mod logging;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{AuthArgs, CartArgs, CatalogArgs, CheckoutArgs, ConfigArgs, OrdersArgs, ProductsArgs};

/// Fiesta CLI - party-rental storefront from the terminal
#[derive(Parser)]
#[command(name = "fiesta")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse products
    Catalog(CatalogArgs),

    /// Manage products (administrators)
    Products(ProductsArgs),

    /// Show and edit the cart
    Cart(CartArgs),

    /// Check out the cart
    Checkout(CheckoutArgs),

    /// Order history
    Orders(OrdersArgs),

    /// Sign in and out
    Auth(AuthArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let output = output::Output::new(cli.verbose, cli.json);
    let ctx = context::Context::load(cli.config.as_deref(), output)?;
    logging::init_tracing(&ctx.config.logging, cli.verbose);

    let result = match cli.command {
        Commands::Catalog(args) => commands::catalog::run(args, &ctx).await,
        Commands::Products(args) => commands::products::run(args, &ctx).await,
        Commands::Cart(args) => commands::cart::run(args, &ctx).await,
        Commands::Checkout(args) => commands::checkout::run(args, &ctx).await,
        Commands::Orders(args) => commands::orders::run(args, &ctx).await,
        Commands::Auth(args) => commands::auth::run(args, &ctx).await,
        Commands::Config(args) => commands::config::run(args, &ctx).await,
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
