//! CLI command implementations.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod orders;
pub mod products;

use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};
use rust_decimal::Decimal;

/// Arguments for the catalog command.
#[derive(Args)]
pub struct CatalogArgs {
    #[command(subcommand)]
    pub command: Option<CatalogCommand>,
}

#[derive(Subcommand)]
pub enum CatalogCommand {
    /// List products by name.
    List,
    /// Show one product.
    Show {
        /// Product id.
        id: String,
    },
}

/// Arguments for the products command (administrators).
#[derive(Args)]
pub struct ProductsArgs {
    #[command(subcommand)]
    pub command: ProductsCommand,
}

/// Product fields shared by create and update.
#[derive(Args, Clone)]
pub struct ProductFields {
    /// Display name.
    #[arg(long)]
    pub name: String,

    /// Long description.
    #[arg(long)]
    pub description: String,

    /// Unit price, e.g. 12.50.
    #[arg(long, value_parser = parse_decimal)]
    pub price: Decimal,

    /// Units available.
    #[arg(long, default_value = "0")]
    pub stock: i64,

    /// Image URL.
    #[arg(long)]
    pub image: Option<String>,
}

#[derive(Subcommand)]
pub enum ProductsCommand {
    /// Add a product.
    Create(ProductFields),
    /// Replace a product's fields.
    Update {
        /// Product id.
        id: String,
        #[command(flatten)]
        fields: ProductFields,
    },
    /// Remove a product.
    Delete {
        /// Product id.
        id: String,
        /// Skip confirmation.
        #[arg(short, long)]
        yes: bool,
    },
}

/// Arguments for the cart command.
#[derive(Args)]
pub struct CartArgs {
    #[command(subcommand)]
    pub command: Option<CartCommand>,
}

#[derive(Subcommand)]
pub enum CartCommand {
    /// Show the cart.
    Show,
    /// Add a product, merging with an existing line.
    Add {
        /// Product id.
        id: String,
        /// Units to add.
        #[arg(short, long, default_value = "1")]
        quantity: u32,
    },
    /// Remove a product's line.
    Remove {
        /// Product id.
        id: String,
    },
    /// Set a line's quantity; zero or less removes it.
    Set {
        /// Product id.
        id: String,
        /// New quantity.
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Empty the cart.
    Clear,
}

/// Arguments for the checkout command.
#[derive(Args)]
pub struct CheckoutArgs {
    #[command(subcommand)]
    pub command: CheckoutCommand,
}

#[derive(Subcommand)]
pub enum CheckoutCommand {
    /// Pay now through the hosted payment page.
    Pay,
    /// Reserve now and pay later.
    Reserve(ReserveArgs),
    /// Handle the payment provider's return URL.
    Return {
        /// Full return URL or its query string.
        url: String,
    },
}

#[derive(Args)]
pub struct ReserveArgs {
    /// Contact name.
    #[arg(long)]
    pub name: Option<String>,

    /// Contact email.
    #[arg(long)]
    pub email: Option<String>,

    /// Contact phone.
    #[arg(long)]
    pub phone: Option<String>,

    /// Notes for the store.
    #[arg(long)]
    pub notes: Option<String>,

    /// Never prompt for missing fields.
    #[arg(long)]
    pub no_input: bool,
}

/// Arguments for the orders command.
#[derive(Args)]
pub struct OrdersArgs {
    #[command(subcommand)]
    pub command: Option<OrdersCommand>,
}

#[derive(Subcommand)]
pub enum OrdersCommand {
    /// List orders, newest first.
    List {
        /// Every customer's orders (administrators).
        #[arg(long)]
        all: bool,
    },
    /// Change an order's status (administrators).
    SetStatus {
        /// Order id.
        id: String,
        /// pending, reserved, completed or cancelled.
        status: String,
    },
}

/// Arguments for the auth command.
#[derive(Args)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommand,
}

#[derive(Subcommand)]
pub enum AuthCommand {
    /// Register a user in the local directory.
    Register {
        /// Email address.
        email: String,
        /// Display name.
        #[arg(long)]
        name: Option<String>,
        /// Grant administrator privilege.
        #[arg(long)]
        admin: bool,
    },
    /// Sign in.
    SignIn {
        /// Email address.
        email: String,
    },
    /// Sign out.
    SignOut,
    /// Show who is signed in.
    Whoami,
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration.
    Show,
    /// Set one value in the config file, e.g. `checkout.allow_guest_checkout true`.
    Set {
        /// Dotted key.
        key: String,
        /// New value.
        value: String,
    },
    /// Initialize a new config file.
    Init {
        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },
    /// Validate the config file.
    Validate,
}

fn parse_decimal(value: &str) -> Result<Decimal> {
    value
        .trim()
        .parse::<Decimal>()
        .with_context(|| format!("'{}' is not a decimal amount", value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal(" 12.50 ").unwrap(), Decimal::new(1250, 2));
        assert!(parse_decimal("twelve").is_err());
    }
}
