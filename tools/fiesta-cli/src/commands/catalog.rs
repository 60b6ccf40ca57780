//! Browse the product catalog.

use anyhow::Result;
use fiesta_commerce::catalog::Product;
use fiesta_commerce::ids::ProductId;

use super::{CatalogArgs, CatalogCommand};
use crate::context::Context;
use crate::output::short_id;

/// Run the catalog command.
pub async fn run(args: CatalogArgs, ctx: &Context) -> Result<()> {
    let store = ctx.storefront()?;
    match args.command.unwrap_or(CatalogCommand::List) {
        CatalogCommand::List => {
            let spinner = ctx.output.spinner("Loading products...");
            let products = store.catalog.list_products().await;
            spinner.finish_and_clear();
            list(&products?, ctx);
        }
        CatalogCommand::Show { id } => {
            let product = store.catalog.get_product(&ProductId::new(id)).await?;
            show(&product, ctx);
        }
    }
    Ok(())
}

fn list(products: &[Product], ctx: &Context) {
    if ctx.output.is_json() {
        ctx.output.json(&products);
        return;
    }

    ctx.output.header(&format!("Products ({})", products.len()));
    if products.is_empty() {
        ctx.output.info("No products yet.");
        return;
    }
    ctx.output.table_row(&["ID", "NAME", "PRICE", "STOCK"], &[8, 28, 12, 6]);
    for product in products {
        let stock = if product.in_stock() {
            product.stock.to_string()
        } else {
            "out".to_string()
        };
        ctx.output.table_row(
            &[
                short_id(product.id.as_str()),
                &product.name,
                &ctx.output.money(product.price),
                &stock,
            ],
            &[8, 28, 12, 6],
        );
    }
}

fn show(product: &Product, ctx: &Context) {
    if ctx.output.is_json() {
        ctx.output.json(product);
        return;
    }

    ctx.output.header(&product.name);
    ctx.output.kv("id", product.id.as_str());
    ctx.output.kv("price", &ctx.output.money(product.price));
    ctx.output.kv("stock", &product.stock.to_string());
    ctx.output.kv("image", product.image_or_placeholder());
    if let Some(created) = product.created_at {
        ctx.output.kv("added", &created.format("%Y-%m-%d").to_string());
    }
    if !product.description.is_empty() {
        ctx.output.info("");
        ctx.output.info(&product.description);
    }
}
