//! Order history and administration.

use anyhow::Result;
use fiesta_commerce::checkout::{OrderStatus, OrderSummary};
use fiesta_commerce::ids::OrderId;

use super::{OrdersArgs, OrdersCommand};
use crate::context::Context;
use crate::output::{short_id, status_badge};

/// Run the orders command.
pub async fn run(args: OrdersArgs, ctx: &Context) -> Result<()> {
    let store = ctx.storefront()?;

    match args.command.unwrap_or(OrdersCommand::List { all: false }) {
        OrdersCommand::List { all } => {
            let spinner = ctx.output.spinner("Loading orders...");
            let orders = if all {
                store.orders.list_all_orders().await
            } else {
                store.orders.list_my_orders().await
            };
            spinner.finish_and_clear();
            list(&orders?, ctx);
        }
        OrdersCommand::SetStatus { id, status } => {
            let status: OrderStatus = status.parse()?;
            let order = store.orders.set_status(&OrderId::new(id), status).await?;
            if ctx.output.is_json() {
                ctx.output.json(&order);
            }
            ctx.output
                .success(&format!("Order {} is now {}", short_id(order.id.as_str()), order.status));
        }
    }
    Ok(())
}

fn list(orders: &[OrderSummary], ctx: &Context) {
    if ctx.output.is_json() {
        ctx.output.json(&orders);
        return;
    }

    ctx.output.header(&format!("Orders ({})", orders.len()));
    if orders.is_empty() {
        ctx.output.info("No orders yet.");
        return;
    }

    for summary in orders {
        let order = &summary.order;
        ctx.output.table_row(
            &[
                short_id(order.id.as_str()),
                &order.created_at.format("%Y-%m-%d %H:%M").to_string(),
                &status_badge(order.status),
                &ctx.output.money(order.total_amount),
                order.contact_name.as_deref().unwrap_or(""),
            ],
            &[8, 16, 10, 12, 20],
        );
        for line in &summary.lines {
            ctx.output
                .list_item(&format!("{} × {}", line.quantity, line.product_name));
        }
        if !summary.is_consistent() {
            ctx.output.warn(&format!(
                "order {} total differs from its lines ({})",
                short_id(order.id.as_str()),
                ctx.output.money(summary.line_total())
            ));
        }
    }
}
