//! Portal configuration.
//!
//! Everything has a default that matches a local development setup, so
//! `PortalConfig::default()` works out of the box against a backend on
//! `127.0.0.1:5000`. Deployments override through environment variables
//! ([`PortalConfig::from_env`]) or the builder.

use std::path::PathBuf;
use std::time::Duration;

use portal_routing::{AppTable, Topology};
use portal_session::SessionConfig;

use crate::PortalError;

/// Base URL of the backend API.
pub const ENV_API_URL: &str = "PORTAL_API_URL";
/// `dev` / `multi-origin` or `prod` / `single-path`.
pub const ENV_TOPOLOGY: &str = "PORTAL_TOPOLOGY";
/// Public origin of the production deployment.
pub const ENV_PROD_ORIGIN: &str = "PORTAL_PROD_ORIGIN";
/// Where the fallback token is persisted. Unset keeps it in memory.
pub const ENV_TOKEN_PATH: &str = "PORTAL_TOKEN_PATH";

/// Settings for one portal instance.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// Base URL of the backend API, e.g. `http://127.0.0.1:5000/api`.
    pub api_base_url: String,

    pub topology: Topology,

    /// Role → application table.
    pub apps: AppTable,

    /// Upper bound on one provider token fetch.
    pub provider_token_timeout: Duration,

    /// File holding the fallback token. `None` keeps it in memory only.
    pub token_path: Option<PathBuf>,
}

impl Default for PortalConfig {
    fn default() -> Self {
        let session = SessionConfig::default();
        Self {
            api_base_url: session.api_base_url,
            topology: Topology::default(),
            apps: AppTable::default(),
            provider_token_timeout: session.provider_token_timeout,
            token_path: None,
        }
    }
}

impl PortalConfig {
    /// Reads overrides from the process environment.
    ///
    /// # Errors
    /// [`PortalError::Config`] if `PORTAL_TOPOLOGY` has an unknown value.
    pub fn from_env() -> Result<Self, PortalError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through
    /// `lookup`. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, PortalError> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(url) = get(ENV_API_URL) {
            config.api_base_url = url.trim().to_string();
        }
        if let Some(topology) = get(ENV_TOPOLOGY) {
            config.topology = topology
                .parse()
                .map_err(|e| PortalError::Config(format!("{ENV_TOPOLOGY}: {e}")))?;
        }
        if let Some(origin) = get(ENV_PROD_ORIGIN) {
            config.apps.prod_origin = Some(origin.trim().to_string());
        }
        if let Some(path) = get(ENV_TOKEN_PATH) {
            config.token_path = Some(PathBuf::from(path));
        }

        tracing::debug!(
            api = %config.api_base_url,
            topology = %config.topology,
            persistent_token = config.token_path.is_some(),
            "portal configuration loaded"
        );
        Ok(config)
    }

    /// The session layer's view of this configuration.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            api_base_url: self.api_base_url.clone(),
            provider_token_timeout: self.provider_token_timeout,
            ..SessionConfig::default()
        }
    }
}
