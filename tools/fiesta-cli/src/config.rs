//! CLI configuration.

use anyhow::{Context, Result};
use fiesta_commerce::checkout::CheckoutConfig;
use serde::{Deserialize, Serialize};

/// Names looked up, in order, from the working directory upwards.
pub const CONFIG_NAMES: [&str; 3] = ["fiesta.toml", ".fiesta.toml", "fiesta.json"];

/// CLI configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub backend: BackendConfig,

    /// Passed to the checkout orchestrator as-is.
    #[serde(default)]
    pub checkout: CheckoutConfig,

    #[serde(default)]
    pub cart: CartConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CliConfig {
    /// Load config from a file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        if path.ends_with(".json") {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path))
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path))
        }
    }

    /// Save config to a file.
    pub fn save(&self, path: &str) -> Result<()> {
        let content = if path.ends_with(".json") {
            serde_json::to_string_pretty(self)?
        } else {
            toml::to_string_pretty(self)?
        };

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path))
    }

    /// Problems that make the config unusable, then ones worth a warning.
    pub fn check(&self) -> (Vec<String>, Vec<String>) {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if self.backend.mode == BackendMode::Remote {
            if self.backend.base_url.as_deref().map_or(true, str::is_empty) {
                errors.push("backend.base_url is required in remote mode".to_string());
            }
            if self.backend.api_key.as_deref().map_or(true, str::is_empty) {
                errors.push("backend.api_key is required in remote mode".to_string());
            }
        }
        if let Some(url) = &self.backend.base_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                errors.push(format!("backend.base_url '{}' must be an http(s) URL", url));
            }
        }

        let return_url = &self.checkout.return_url;
        if !return_url.starts_with("http://") && !return_url.starts_with("https://") {
            errors.push(format!("checkout.return_url '{}' must be an http(s) URL", return_url));
        } else if return_url.contains('?') {
            warnings.push("checkout.return_url should not carry a query string".to_string());
        }
        if self.checkout.allow_guest_checkout {
            warnings.push("checkout.allow_guest_checkout lets anonymous visitors order".to_string());
        }

        if self.cart.store_path.trim().is_empty() {
            errors.push("cart.store_path must not be empty".to_string());
        }
        if self
            .logging
            .level
            .parse::<tracing_subscriber::filter::LevelFilter>()
            .is_err()
        {
            errors.push(format!("logging.level '{}' is not a log level", self.logging.level));
        }

        (errors, warnings)
    }
}

/// Where products and orders live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendMode {
    /// Files under `data_dir`, with a sandbox payment gateway.
    #[default]
    Local,
    /// The hosted data platform at `base_url`.
    Remote,
}

impl BackendMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendMode::Local => "local",
            BackendMode::Remote => "remote",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub mode: BackendMode,

    /// Local mode: directory holding products, orders and users.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Remote mode: platform URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Remote mode: public API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Write a reservation and its lines in one call.
    #[serde(default = "default_true")]
    pub atomic_reservations: bool,
}

fn default_data_dir() -> String {
    ".fiesta/data".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            mode: BackendMode::Local,
            data_dir: default_data_dir(),
            base_url: None,
            api_key: None,
            atomic_reservations: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartConfig {
    /// Directory holding the cart and sign-in of this terminal session.
    #[serde(default = "default_store_path")]
    pub store_path: String,

    /// Fixed browsing-session id. Generated and remembered when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
}

fn default_store_path() -> String {
    ".fiesta/session".to_string()
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            session: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `FIESTA_LOG` is unset.
    #[serde(default = "default_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

fn default_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::Pretty,
        }
    }
}

/// Generate a default fiesta.toml config file.
pub fn generate_default_config() -> String {
    r#"# Fiesta storefront configuration

[backend]
# "local" keeps everything under data_dir; "remote" talks to the hosted platform
mode = "local"
data_dir = ".fiesta/data"
atomic_reservations = true
# base_url = "https://your-project.example.co"
# api_key = "public-anon-key"

[checkout]
return_url = "http://localhost:8080/checkout-success"
allow_guest_checkout = false
# "compensate" deletes a half-written order, "mark_cancelled" keeps it as cancelled
partial_write_policy = "compensate"
currency = "USD"

[cart]
store_path = ".fiesta/session"
# session = "sess_fixed"

[logging]
# overridden by the FIESTA_LOG environment variable
level = "warn"
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fiesta_commerce::checkout::PartialWritePolicy;

    #[test]
    fn test_generated_config_parses_to_defaults() {
        let config: CliConfig = toml::from_str(&generate_default_config()).unwrap();
        let (errors, warnings) = config.check();

        assert!(errors.is_empty(), "{errors:?}");
        assert!(warnings.is_empty(), "{warnings:?}");
        assert_eq!(config.backend.mode, BackendMode::Local);
        assert_eq!(config.checkout, CheckoutConfig::default());
        assert_eq!(config.cart.store_path, ".fiesta/session");
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: CliConfig = toml::from_str("").unwrap();
        assert_eq!(config.backend.data_dir, ".fiesta/data");
        assert!(config.backend.atomic_reservations);
        assert!(!config.checkout.allow_guest_checkout);
    }

    #[test]
    fn test_partial_sections() {
        let config: CliConfig = toml::from_str(
            r#"
            [checkout]
            partial_write_policy = "mark_cancelled"

            [logging]
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.checkout.partial_write_policy, PartialWritePolicy::MarkCancelled);
        assert_eq!(config.checkout.return_url, fiesta_commerce::checkout::DEFAULT_RETURN_URL);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_remote_mode_requires_credentials() {
        let config: CliConfig = toml::from_str("[backend]\nmode = \"remote\"").unwrap();
        let (errors, _) = config.check();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_bad_values_are_reported() {
        let mut config = CliConfig::default();
        config.checkout.return_url = "checkout-success".to_string();
        config.logging.level = "loud".to_string();
        let (errors, _) = config.check();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fiesta.toml");
        let path = path.to_str().unwrap();

        let mut config = CliConfig::default();
        config.cart.session = Some("sess_fixed".to_string());
        config.save(path).unwrap();

        let loaded = CliConfig::load(path).unwrap();
        assert_eq!(loaded.cart.session.as_deref(), Some("sess_fixed"));
    }
}
