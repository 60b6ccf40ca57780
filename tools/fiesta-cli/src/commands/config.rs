//! Configuration management commands.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context as _, Result};
use fiesta_commerce::Currency;
use serde::de::DeserializeOwned;

use super::{ConfigArgs, ConfigCommand};
use crate::config::{generate_default_config, CliConfig, CONFIG_NAMES};
use crate::context::Context;

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(ctx),
        ConfigCommand::Set { key, value } => set_config(&key, &value, ctx),
        ConfigCommand::Init { force } => init_config(force, ctx),
        ConfigCommand::Validate => validate_config(ctx),
    }
}

fn show_config(ctx: &Context) -> Result<()> {
    if ctx.output.is_json() {
        ctx.output.json(&ctx.config);
        return Ok(());
    }

    ctx.output.header("Current Configuration");
    match &ctx.config_path {
        Some(path) => ctx.output.kv("file", &path.display().to_string()),
        None => ctx.output.kv("file", "(defaults)"),
    }

    let backend = &ctx.config.backend;
    ctx.output.info("");
    ctx.output.info("[backend]");
    ctx.output.kv("mode", backend.mode.as_str());
    ctx.output.kv("data_dir", &backend.data_dir);
    if let Some(url) = &backend.base_url {
        ctx.output.kv("base_url", url);
    }
    if backend.api_key.is_some() {
        ctx.output.kv("api_key", "(set)");
    }
    ctx.output
        .kv("atomic_reservations", &backend.atomic_reservations.to_string());

    let checkout = &ctx.config.checkout;
    ctx.output.info("");
    ctx.output.info("[checkout]");
    ctx.output.kv("return_url", &checkout.return_url);
    ctx.output
        .kv("allow_guest_checkout", &checkout.allow_guest_checkout.to_string());
    ctx.output.kv(
        "partial_write_policy",
        &format!("{:?}", checkout.partial_write_policy),
    );
    ctx.output.kv("currency", checkout.currency.code());

    ctx.output.info("");
    ctx.output.info("[cart]");
    ctx.output.kv("store_path", &ctx.config.cart.store_path);
    if let Some(session) = &ctx.config.cart.session {
        ctx.output.kv("session", session);
    }

    ctx.output.info("");
    ctx.output.info("[logging]");
    ctx.output.kv("level", &ctx.config.logging.level);
    ctx.output
        .kv("format", &format!("{:?}", ctx.config.logging.format).to_lowercase());

    Ok(())
}

fn set_config(key: &str, value: &str, ctx: &Context) -> Result<()> {
    let path = match &ctx.config_path {
        Some(path) => path.clone(),
        None => bail!("No config file found. Run `fiesta config init` first."),
    };
    let path = path.to_string_lossy().into_owned();

    let mut config = CliConfig::load(&path)?;
    set_config_value(&mut config, key, value)?;
    config.save(&path)?;

    ctx.output.success(&format!("Set {} = {}", key, value));
    Ok(())
}

fn init_config(force: bool, ctx: &Context) -> Result<()> {
    let config_path: PathBuf = ctx.cwd.join(CONFIG_NAMES[0]);

    if config_path.exists() && !force {
        bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, generate_default_config())
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    ctx.output.success(&format!("Created: {}", config_path.display()));
    Ok(())
}

fn validate_config(ctx: &Context) -> Result<()> {
    ctx.output.header("Validating configuration");

    let (errors, warnings) = ctx.config.check();
    if errors.is_empty() && warnings.is_empty() {
        ctx.output.success("Configuration is valid");
        return Ok(());
    }

    for error in &errors {
        ctx.output.error(&format!("Error: {}", error));
    }
    for warning in &warnings {
        ctx.output.warn(&format!("Warning: {}", warning));
    }

    if !errors.is_empty() {
        bail!("Configuration has {} error(s)", errors.len());
    }

    ctx.output.success("Configuration is valid (with warnings)");
    Ok(())
}

fn set_config_value(config: &mut CliConfig, key: &str, value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').collect();

    match parts.as_slice() {
        ["backend", "mode"] => config.backend.mode = enum_value(value)?,
        ["backend", "data_dir"] => config.backend.data_dir = value.to_string(),
        ["backend", "base_url"] => config.backend.base_url = Some(value.to_string()),
        ["backend", "api_key"] => config.backend.api_key = Some(value.to_string()),
        ["backend", "atomic_reservations"] => config.backend.atomic_reservations = value.parse()?,
        ["checkout", "return_url"] => config.checkout.return_url = value.to_string(),
        ["checkout", "allow_guest_checkout"] => {
            config.checkout.allow_guest_checkout = value.parse()?
        }
        ["checkout", "partial_write_policy"] => {
            config.checkout.partial_write_policy = enum_value(value)?
        }
        ["checkout", "currency"] => config.checkout.currency = value.parse::<Currency>()?,
        ["cart", "store_path"] => config.cart.store_path = value.to_string(),
        ["cart", "session"] => config.cart.session = Some(value.to_string()),
        ["logging", "level"] => config.logging.level = value.to_string(),
        ["logging", "format"] => config.logging.format = enum_value(value)?,
        _ => bail!("Unknown config key: {}", key),
    }

    Ok(())
}

/// Parse a snake_case enum value the same way the config file does.
fn enum_value<T: DeserializeOwned>(value: &str) -> Result<T> {
    serde_json::from_value(serde_json::Value::String(value.to_string()))
        .with_context(|| format!("'{}' is not an accepted value", value))
}
