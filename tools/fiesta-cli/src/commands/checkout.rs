//! Checkout commands.
//!
//! Each invocation starts a fresh checkout attempt against the persisted
//! cart; the pay-now return is handled by a separate `checkout return`.

use anyhow::Result;
use dialoguer::Input;
use fiesta_commerce::checkout::{
    CheckoutError, CheckoutOrchestrator, CheckoutReturn, ReservationField, ReservationRequest,
};

use super::{CheckoutArgs, CheckoutCommand, ReserveArgs};
use crate::context::Context;

/// Run the checkout command.
pub async fn run(args: CheckoutArgs, ctx: &Context) -> Result<()> {
    let store = ctx.storefront()?;
    let checkout = &store.checkout;

    match args.command {
        CheckoutCommand::Pay => pay(checkout, ctx).await,
        CheckoutCommand::Reserve(reserve_args) => reserve(checkout, reserve_args, ctx).await,
        CheckoutCommand::Return { url } => {
            let ret = CheckoutReturn::parse(&url);
            let cleared = checkout.handle_return(&ret).map_err(|e| fail(ctx, e))?;
            if ctx.output.is_json() {
                ctx.output.json(&serde_json::json!({
                    "success": ret.success,
                    "session_id": ret.session_id,
                    "cart_cleared": cleared,
                }));
            } else if cleared {
                ctx.output.success("Payment confirmed. Thank you for your order!");
            } else {
                ctx.output.warn("Payment was not completed. Your cart is unchanged.");
            }
            Ok(())
        }
    }
}

async fn pay(checkout: &CheckoutOrchestrator, ctx: &Context) -> Result<()> {
    start(checkout, ctx).await?;

    let spinner = ctx.output.spinner("Creating payment session...");
    let redirect = checkout.choose_pay_now().await;
    spinner.finish_and_clear();
    let redirect = redirect.map_err(|e| fail(ctx, e))?;

    if ctx.output.is_json() {
        ctx.output.json(&redirect);
        return Ok(());
    }
    ctx.output.success("Payment session ready");
    ctx.output.kv("open", &redirect.url);
    if let Some(order) = &redirect.order_id {
        ctx.output.kv("order", order.as_str());
    }
    ctx.output
        .info("After paying, run `fiesta checkout return <url>` with the page you land on.");
    Ok(())
}

async fn reserve(checkout: &CheckoutOrchestrator, args: ReserveArgs, ctx: &Context) -> Result<()> {
    start(checkout, ctx).await?;
    checkout.choose_reserve().map_err(|e| fail(ctx, e))?;

    let interactive = !args.no_input && !ctx.output.is_json();
    let mut request = ReservationRequest {
        contact_name: args.name.unwrap_or_default(),
        contact_email: args.email.unwrap_or_default(),
        contact_phone: args.phone.unwrap_or_default(),
        notes: args.notes.filter(|n| !n.trim().is_empty()),
    };
    if interactive {
        for field in request.missing_fields() {
            let value: String = Input::new().with_prompt(field.label()).interact_text()?;
            match field {
                ReservationField::ContactName => request.contact_name = value,
                ReservationField::ContactEmail => request.contact_email = value,
                ReservationField::ContactPhone => request.contact_phone = value,
            }
        }
    }

    let spinner = ctx.output.spinner("Recording reservation...");
    let summary = checkout.submit_reservation(request).await;
    spinner.finish_and_clear();
    let summary = summary.map_err(|e| fail(ctx, e))?;

    if ctx.output.is_json() {
        ctx.output.json(&summary);
        return Ok(());
    }
    ctx.output.success("Reservation recorded");
    ctx.output.kv("order", summary.order.id.as_str());
    ctx.output.kv("items", &summary.item_count().to_string());
    ctx.output.kv("total", &ctx.output.money(summary.order.total_amount));
    Ok(())
}

async fn start(checkout: &CheckoutOrchestrator, ctx: &Context) -> Result<()> {
    let spinner = ctx.output.spinner("Checking sign-in...");
    let started = checkout.begin().await;
    spinner.finish_and_clear();
    started.map(|_| ()).map_err(|e| fail(ctx, e))
}

/// The shopper-facing message. The detail goes to the log.
fn fail(ctx: &Context, e: CheckoutError) -> anyhow::Error {
    tracing::warn!(error = %e, retryable = e.is_retryable(), "checkout failed");
    ctx.output.debug(&e.to_string());
    if e.requires_sign_in() {
        ctx.output.info("Sign in with `fiesta auth sign-in <email>` and try again.");
    }
    anyhow::anyhow!(e.user_message())
}
