//! Cart commands.

use anyhow::Result;
use fiesta_commerce::cart::CartStore;
use fiesta_commerce::ids::ProductId;
use serde_json::json;

use super::{CartArgs, CartCommand};
use crate::context::Context;

/// Run the cart command.
pub async fn run(args: CartArgs, ctx: &Context) -> Result<()> {
    let store = ctx.storefront()?;
    let cart = &store.cart;

    match args.command.unwrap_or(CartCommand::Show) {
        CartCommand::Show => {}
        CartCommand::Add { id, quantity } => {
            let product = store.catalog.get_product(&ProductId::new(id)).await?;
            if !product.in_stock() {
                ctx.output.warn(&format!("{} is out of stock", product.name));
            }
            cart.add_item(product.snapshot(), quantity)?;
            ctx.output
                .success(&format!("Added {} × {}", quantity, product.name));
        }
        CartCommand::Remove { id } => {
            cart.remove_item(&ProductId::new(id))?;
        }
        CartCommand::Set { id, quantity } => {
            let id = ProductId::new(id);
            if cart.snapshot().get(&id).is_none() {
                ctx.output.warn(&format!("{} is not in the cart", id));
            }
            cart.update_quantity(&id, quantity)?;
        }
        CartCommand::Clear => {
            cart.clear()?;
            ctx.output.success("Cart emptied");
        }
    }

    show(cart, ctx);
    Ok(())
}

fn show(cart: &CartStore, ctx: &Context) {
    let snapshot = cart.snapshot();
    if ctx.output.is_json() {
        ctx.output.json(&json!({
            "items": snapshot.items(),
            "total_items": snapshot.total_item_count(),
            "total_price": snapshot.total_price().to_string(),
        }));
        return;
    }

    ctx.output
        .header(&format!("Cart ({} items)", snapshot.total_item_count()));
    if snapshot.is_empty() {
        ctx.output.info("Your cart is empty.");
        return;
    }

    for item in snapshot.items() {
        ctx.output.table_row(
            &[
                &format!("{} ×", item.quantity),
                &item.name,
                &ctx.output.money(item.unit_price),
                &ctx.output.money(item.line_total()),
            ],
            &[5, 28, 12, 12],
        );
    }
    ctx.output.kv("total", &ctx.output.money(snapshot.total_price()));
}
