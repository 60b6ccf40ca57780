//! CLI execution context.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context as _, Result};
use fiesta_auth::SessionIdentity;
use fiesta_cache::{Cache, SessionId};
use fiesta_commerce::cart::CartStore;
use fiesta_commerce::catalog::CatalogService;
use fiesta_commerce::checkout::CheckoutOrchestrator;
use fiesta_commerce::orders::OrderService;
use fiesta_commerce::ports::IdentityProvider;

use crate::config::{BackendMode, CliConfig, CONFIG_NAMES};
use crate::output::Output;

/// Key under which the generated browsing-session id is remembered.
const SESSION_KEY: &str = "cli:session";

/// Execution context for CLI commands.
pub struct Context {
    /// CLI configuration.
    pub config: CliConfig,
    /// Where the configuration was loaded from, if anywhere.
    pub config_path: Option<PathBuf>,
    /// Output handler.
    pub output: Output,
    /// Working directory.
    pub cwd: PathBuf,
}

impl Context {
    /// Load context from config file.
    pub fn load(config_path: Option<&str>, output: Output) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let (config, config_path) = if let Some(path) = config_path {
            (CliConfig::load(path)?, Some(PathBuf::from(path)))
        } else {
            match Self::find_config(&cwd) {
                Some((config, path)) => (config, Some(path)),
                None => (CliConfig::default(), None),
            }
        };

        let output = output.with_currency(config.checkout.currency);
        Ok(Self {
            config,
            config_path,
            output,
            cwd,
        })
    }

    /// Find config file in directory tree.
    fn find_config(start: &Path) -> Option<(CliConfig, PathBuf)> {
        let mut current = start.to_path_buf();
        loop {
            for name in &CONFIG_NAMES {
                let config_path = current.join(name);
                if config_path.exists() {
                    if let Ok(config) = CliConfig::load(config_path.to_str()?) {
                        return Some((config, config_path));
                    }
                }
            }

            if !current.pop() {
                break;
            }
        }

        None
    }

    /// Resolve a path relative to the working directory.
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        if PathBuf::from(path).is_absolute() {
            PathBuf::from(path)
        } else {
            self.cwd.join(path)
        }
    }

    /// The cache holding this terminal's cart and sign-in.
    pub fn session_cache(&self) -> Result<Cache> {
        let dir = self.resolve_path(&self.config.cart.store_path);
        Cache::open_dir(&dir).with_context(|| format!("Failed to open session store {}", dir.display()))
    }

    /// The configured browsing-session id, or one generated on first use and remembered.
    pub fn session_id(&self, cache: &Cache) -> Result<SessionId> {
        if let Some(id) = &self.config.cart.session {
            return Ok(SessionId::new(id.clone()));
        }
        if let Some(id) = cache.get::<String>(SESSION_KEY)? {
            return Ok(SessionId::new(id));
        }
        let id = SessionId::generate();
        cache.set(SESSION_KEY, &id.as_str())?;
        tracing::debug!(session = %id, "new browsing session");
        Ok(id)
    }

    /// Open the cart and wire every service to the configured backend.
    pub fn storefront(&self) -> Result<Storefront> {
        let session_cache = self.session_cache()?;
        let session_id = self.session_id(&session_cache)?;
        let cart = Arc::new(
            CartStore::open(session_cache.clone(), session_id.clone())
                .context("Failed to open cart")?,
        );

        match self.config.backend.mode {
            BackendMode::Local => self.local_storefront(cart, session_id),
            BackendMode::Remote => self.remote_storefront(cart, session_cache, session_id),
        }
    }

    fn local_storefront(&self, cart: Arc<CartStore>, session_id: SessionId) -> Result<Storefront> {
        use fiesta_commerce::backend::LocalBackend;

        let dir = self.resolve_path(&self.config.backend.data_dir);
        let data = Cache::open_dir(&dir)
            .with_context(|| format!("Failed to open data directory {}", dir.display()))?;
        let backend = Arc::new(
            LocalBackend::new(data.clone()).with_atomic_writes(self.config.backend.atomic_reservations),
        );
        let sessions = SessionIdentity::new(data, session_id);
        let identity: Arc<dyn IdentityProvider> = Arc::new(sessions.clone());

        Ok(Storefront {
            catalog: CatalogService::new(backend.clone(), backend.clone(), identity.clone()),
            orders: OrderService::new(backend.clone(), backend.clone(), identity.clone()),
            checkout: CheckoutOrchestrator::new(
                cart.clone(),
                identity.clone(),
                backend.clone(),
                backend,
                self.config.checkout.clone(),
            ),
            cart,
            identity,
            sessions,
            mode: BackendMode::Local,
        })
    }

    #[cfg(feature = "remote")]
    fn remote_storefront(
        &self,
        cart: Arc<CartStore>,
        session_cache: Cache,
        session_id: SessionId,
    ) -> Result<Storefront> {
        use fiesta_auth::RemoteIdentity;
        use fiesta_commerce::backend::RestBackend;

        let (base_url, api_key) = self.remote_credentials()?;
        let sessions = SessionIdentity::new(session_cache, session_id);
        let token = sessions.current_session()?.map(|s| s.access_token);

        let mut backend = RestBackend::new(base_url.clone(), api_key.clone())
            .with_reservation_rpc(self.config.backend.atomic_reservations);
        let mut remote = RemoteIdentity::new(base_url, api_key);
        if let Some(token) = token {
            backend = backend.with_access_token(token.clone());
            remote = remote.with_access_token(token);
        }
        let backend = Arc::new(backend);
        let identity: Arc<dyn IdentityProvider> = Arc::new(remote);

        Ok(Storefront {
            catalog: CatalogService::new(backend.clone(), backend.clone(), identity.clone()),
            orders: OrderService::new(backend.clone(), backend.clone(), identity.clone()),
            checkout: CheckoutOrchestrator::new(
                cart.clone(),
                identity.clone(),
                backend.clone(),
                backend,
                self.config.checkout.clone(),
            ),
            cart,
            identity,
            sessions,
            mode: BackendMode::Remote,
        })
    }

    #[cfg(not(feature = "remote"))]
    fn remote_storefront(
        &self,
        _cart: Arc<CartStore>,
        _session_cache: Cache,
        _session_id: SessionId,
    ) -> Result<Storefront> {
        bail!("backend.mode = \"remote\" needs a build with the `remote` feature")
    }

    /// Base URL and API key for remote mode.
    #[cfg(feature = "remote")]
    pub fn remote_credentials(&self) -> Result<(String, String)> {
        let backend = &self.config.backend;
        match (&backend.base_url, &backend.api_key) {
            (Some(url), Some(key)) if !url.is_empty() && !key.is_empty() => {
                Ok((url.clone(), key.clone()))
            }
            _ => bail!("backend.base_url and backend.api_key are required in remote mode"),
        }
    }
}

/// Every service one command may need, wired to one backend.
pub struct Storefront {
    pub cart: Arc<CartStore>,
    pub identity: Arc<dyn IdentityProvider>,
    /// Stored sign-in for this browsing session. In local mode it is also the identity provider.
    pub sessions: SessionIdentity,
    pub catalog: CatalogService,
    pub orders: OrderService,
    pub checkout: CheckoutOrchestrator,
    pub mode: BackendMode,
}
