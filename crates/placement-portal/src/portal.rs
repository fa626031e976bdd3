//! The `Portal` builder and facade.
//!
//! This is the entry point for embedding the identity layer. It ties the
//! layers together: transport → session (engine + interceptor) → routing.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use portal_identity::Credentials;
use portal_routing::{
    AppTable, ConflictAction, ConflictResolution, Location, Outcome, RedirectDecision,
    RouteGuard, SessionConflict, Topology, show_chrome,
};
use portal_session::{
    AuthInterceptor, ExternalProvider, FileTokenStore, LoginOutcome, MemoryTokenStore,
    Reconciliation, SessionContext, SessionEngine, SessionError, SessionState, TokenStore,
};
use portal_transport::{HttpTransport, ReqwestTransport};
use tokio::sync::watch;

use crate::{PortalConfig, PortalError};

/// How many redirects [`Portal::follow`] performs before giving up.
pub const MAX_REDIRECTS: usize = 8;

// ---------------------------------------------------------------------------
// ConfiguredTokenStore
// ---------------------------------------------------------------------------

/// The token store picked by [`PortalConfig::token_path`].
#[derive(Debug)]
pub enum ConfiguredTokenStore {
    Memory(MemoryTokenStore),
    File(FileTokenStore),
}

impl ConfiguredTokenStore {
    pub fn from_path(path: Option<PathBuf>) -> Self {
        match path {
            Some(path) => Self::File(FileTokenStore::new(path)),
            None => Self::Memory(MemoryTokenStore::new()),
        }
    }
}

impl TokenStore for ConfiguredTokenStore {
    fn get(&self) -> Option<String> {
        match self {
            Self::Memory(store) => store.get(),
            Self::File(store) => store.get(),
        }
    }

    fn set(&self, token: &str) -> Result<(), SessionError> {
        match self {
            Self::Memory(store) => store.set(token),
            Self::File(store) => store.set(token),
        }
    }

    fn clear(&self) {
        match self {
            Self::Memory(store) => store.clear(),
            Self::File(store) => store.clear(),
        }
    }
}

// ---------------------------------------------------------------------------
// PortalBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring a [`Portal`].
///
/// # Example
///
/// ```rust,ignore
/// use placement_portal::prelude::*;
///
/// let portal = PortalBuilder::new()
///     .config(PortalConfig::from_env()?)
///     .topology(Topology::SinglePath)
///     .build(my_provider);
/// portal.reconcile().await;
/// ```
pub struct PortalBuilder {
    config: PortalConfig,
}

impl PortalBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: PortalConfig::default(),
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: PortalConfig) -> Self {
        self.config = config;
        self
    }

    pub fn api_base_url(mut self, url: &str) -> Self {
        self.config.api_base_url = url.to_string();
        self
    }

    pub fn topology(mut self, topology: Topology) -> Self {
        self.config.topology = topology;
        self
    }

    pub fn apps(mut self, apps: AppTable) -> Self {
        self.config.apps = apps;
        self
    }

    pub fn provider_token_timeout(mut self, timeout: Duration) -> Self {
        self.config.provider_token_timeout = timeout;
        self
    }

    /// Persists the fallback token at `path`.
    pub fn token_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.token_path = Some(path.into());
        self
    }

    /// Builds a portal that talks to the backend over `reqwest` and keeps
    /// the fallback token where the configuration says.
    pub fn build<P: ExternalProvider>(
        self,
        provider: P,
    ) -> Portal<P, ConfiguredTokenStore, ReqwestTransport> {
        let tokens = ConfiguredTokenStore::from_path(self.config.token_path.clone());
        self.build_with(
            Arc::new(provider),
            Arc::new(tokens),
            Arc::new(ReqwestTransport::new()),
        )
    }

    /// Builds a portal from explicit parts. Tests use this with fakes.
    pub fn build_with<P, S, T>(self, provider: Arc<P>, tokens: Arc<S>, transport: Arc<T>) -> Portal<P, S, T>
    where
        P: ExternalProvider,
        S: TokenStore,
        T: HttpTransport,
    {
        let config = self.config;
        let ctx = SessionContext::new(provider, tokens);
        let engine = SessionEngine::new(ctx.clone(), Arc::clone(&transport), config.session_config());
        let http = AuthInterceptor::new(ctx, transport, config.provider_token_timeout);
        let guard = RouteGuard::new(config.topology, config.apps.clone());

        tracing::info!(
            api = %config.api_base_url,
            topology = %config.topology,
            "portal initialized"
        );

        Portal {
            engine,
            http,
            guard,
            config,
        }
    }
}

impl Default for PortalBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Portal
// ---------------------------------------------------------------------------

/// The result of following redirects from a starting location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    /// Where navigation stopped.
    pub location: Location,
    /// The guard's decision there. A `Redirect` here means the redirect
    /// limit was hit.
    pub outcome: Outcome,
    /// Every redirect taken, in order.
    pub redirects: Vec<RedirectDecision>,
}

impl Navigation {
    pub fn left_instance(&self) -> bool {
        self.redirects.iter().any(RedirectDecision::is_cross_origin)
    }
}

/// The assembled identity layer: session engine, request signing, and
/// route guard sharing one session context.
pub struct Portal<P, S, T> {
    engine: SessionEngine<P, S, Arc<T>>,
    http: AuthInterceptor<P, S, Arc<T>>,
    guard: RouteGuard,
    config: PortalConfig,
}

impl<P, S, T> Portal<P, S, T>
where
    P: ExternalProvider,
    S: TokenStore,
    T: HttpTransport,
{
    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    pub fn engine(&self) -> &SessionEngine<P, S, Arc<T>> {
        &self.engine
    }

    /// The authorized request channel. Every request sent through it gets
    /// the right bearer token.
    pub fn http(&self) -> &AuthInterceptor<P, S, Arc<T>> {
        &self.http
    }

    pub fn guard(&self) -> &RouteGuard {
        &self.guard
    }

    pub fn state(&self) -> SessionState {
        self.engine.state()
    }

    /// A receiver woken on every session change.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.engine.context().subscribe()
    }

    /// Re-evaluates the session. Call on start-up and whenever the
    /// provider reports a change.
    pub async fn reconcile(&self) -> Reconciliation {
        self.engine.reconcile().await
    }

    /// Signs in with email and password.
    ///
    /// # Errors
    /// [`PortalError::Session`] wrapping
    /// [`SessionError::LoginFailed`]; see [`PortalError::login_message`].
    pub async fn login(
        &self,
        credentials: &Credentials,
        remember_me: bool,
    ) -> Result<LoginOutcome, PortalError> {
        Ok(self.engine.login(credentials, remember_me).await?)
    }

    /// Signs out everywhere. The local session is gone before the returned
    /// future is first polled.
    pub fn sign_out(&self) -> impl Future<Output = Result<(), PortalError>> + Send + use<P, S, T> {
        let pending = self.engine.sign_out();
        async move { pending.await.map_err(PortalError::from) }
    }

    /// The guard's decision for `location`, without following redirects.
    pub fn evaluate(&self, location: &Location) -> Outcome {
        self.guard.evaluate(&self.engine.state(), location)
    }

    /// Evaluates `start` and follows redirects until the guard renders,
    /// waits, or shows a conflict.
    pub fn follow(&self, start: Location) -> Navigation {
        let state = self.engine.state();
        let mut location = start;
        let mut redirects = Vec::new();

        loop {
            let outcome = self.guard.evaluate(&state, &location);
            let Outcome::Redirect(decision) = &outcome else {
                return Navigation {
                    location,
                    outcome,
                    redirects,
                };
            };
            if redirects.len() >= MAX_REDIRECTS {
                tracing::warn!(location = %location, "redirect limit reached");
                return Navigation {
                    location,
                    outcome,
                    redirects,
                };
            }
            location = decision.target(&location);
            redirects.push(decision.clone());
        }
    }

    /// Parses `url` and [`follow`](Self::follow)s it.
    ///
    /// # Errors
    /// [`PortalError::Routing`] if `url` isn't an absolute URL.
    pub fn navigate(&self, url: &str) -> Result<Navigation, PortalError> {
        Ok(self.follow(Location::parse(url)?))
    }

    /// Carries out a conflict screen action.
    pub async fn resolve_conflict(
        &self,
        conflict: &SessionConflict,
        action: ConflictAction,
    ) -> ConflictResolution {
        conflict.resolve(action, &self.engine).await
    }

    /// Whether the signed-in navigation bar belongs on `location`.
    pub fn show_chrome(&self, location: &Location) -> bool {
        let state = self.engine.state();
        show_chrome(
            location.path(),
            state.identity.as_ref(),
            self.guard.instance_role(location),
        )
    }
}
