//! The session reconciliation engine: turns provider state and the stored
//! token into exactly one [`Identity`] (or none).
//!
//! This is the central piece of the session layer. It's responsible for:
//! - Deciding which credential to trust ([`resolve`])
//! - Hydrating the identity from the backend profile
//! - Degrading gracefully when the provider or backend misbehaves
//! - Clearing the local token when it's invalid or superseded
//! - Sign-out and the two login paths
//!
//! # When to call `reconcile()`
//!
//! Whenever an input may have changed: the provider finished booting,
//! the provider's session flag flipped, or the stored token changed.
//! Calling it with unchanged inputs is cheap and makes no network calls.
//!
//! # Ordering
//!
//! Each run is tagged with a generation number when it starts. If a
//! newer run or a sign-out begins before it finishes, its result is
//! dropped on completion (last writer by start order, not by completion
//! order).

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use portal_identity::{Credentials, Identity, ProviderUser, normalize, provider_fallback};
use portal_transport::HttpTransport;

use crate::backend::token_preview;
use crate::{
    AuthSource, BackendClient, ExternalProvider, ReconcileInputs, SessionConfig, SessionContext,
    SessionError, SessionState, SignInOutcome, TokenStore, resolve,
};

/// What a call to [`SessionEngine::reconcile`] did.
#[derive(Debug, Clone, PartialEq)]
pub enum Reconciliation {
    /// The provider is still booting (or its user is still loading).
    /// Nothing changed; `loading` stays as it was.
    Deferred,

    /// Inputs are identical to the previous run. Nothing was fetched.
    Unchanged,

    /// A decision was published. `None` means signed out.
    Committed(Option<Identity>),

    /// A newer run or a sign-out started while this one was in flight;
    /// its result was discarded.
    Superseded,
}

/// How a successful [`SessionEngine::login`] signed the user in.
#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    /// The provider accepted the credentials. The identity is whatever
    /// the follow-up reconciliation produced.
    Provider(Option<Identity>),

    /// The backend accepted the credentials and issued a local token.
    Local(Identity),
}

impl LoginOutcome {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            LoginOutcome::Provider(identity) => identity.as_ref(),
            LoginOutcome::Local(identity) => Some(identity),
        }
    }
}

/// Owns the session state's write side.
///
/// ## Lifecycle
///
/// ```text
///            reconcile()                     reconcile()
/// [Loading] ────────────→ [SignedIn(id)] ──────────────→ [SignedIn(id')]
///     │                        │   ▲
///     │ reconcile()   sign_out()│   │ login() / reconcile()
///     ▼                        ▼   │
/// [Anonymous] ←────────────────────┘
/// ```
pub struct SessionEngine<P, S, T> {
    ctx: SessionContext<P, S>,
    backend: BackendClient<T>,

    /// Inputs of the last run that started (or the post-state of the last
    /// run that committed). Used to skip redundant runs.
    last_inputs: Mutex<Option<ReconcileInputs>>,
}

impl<P, S, T> SessionEngine<P, S, T>
where
    P: ExternalProvider,
    S: TokenStore,
    T: HttpTransport,
{
    /// Creates an engine over `ctx`, calling the backend through
    /// `transport`.
    pub fn new(ctx: SessionContext<P, S>, transport: T, config: SessionConfig) -> Self {
        Self {
            ctx,
            backend: BackendClient::new(transport, config),
            last_inputs: Mutex::new(None),
        }
    }

    pub fn context(&self) -> &SessionContext<P, S> {
        &self.ctx
    }

    pub fn config(&self) -> &SessionConfig {
        self.backend.config()
    }

    pub fn state(&self) -> SessionState {
        self.ctx.state()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.ctx.identity()
    }

    // =====================================================================
    // Reconciliation
    // =====================================================================

    /// Re-evaluates the session from the current provider state and the
    /// stored token. See the module docs for when to call this.
    pub async fn reconcile(&self) -> Reconciliation {
        let snapshot = self.ctx.provider().snapshot();
        let local_token = self.ctx.tokens().get();

        let inputs = ReconcileInputs::new(&snapshot, local_token.as_deref());
        if !self.start_if_changed(inputs) {
            return Reconciliation::Unchanged;
        }

        self.ctx.set_provider_ready(snapshot.ready);

        let Some(source) = resolve(&snapshot, local_token.as_deref()) else {
            tracing::debug!(
                ready = snapshot.ready,
                active = snapshot.active,
                "identity provider not settled, deferring reconciliation"
            );
            return Reconciliation::Deferred;
        };

        let generation = self.ctx.begin();

        let (identity, clear_local) = match source {
            AuthSource::ExternalProvider(user) => self.hydrate_from_provider(&user).await,
            AuthSource::LocalToken(token) => {
                (self.hydrate_from_local(&token, generation).await, false)
            }
            AuthSource::Anonymous => (None, false),
        };

        let next = SessionState::settled(identity.clone(), snapshot.ready);
        if !self.ctx.commit(generation, next) {
            tracing::debug!(generation, "reconciliation superseded, result discarded");
            return Reconciliation::Superseded;
        }

        if clear_local && self.ctx.tokens().get().is_some() {
            // The provider session wins; the fallback isn't kept alongside it.
            tracing::info!("provider session active, clearing local token");
            self.ctx.tokens().clear();
        }

        // Record the post-state so the token we just cleared doesn't look
        // like a new input and trigger a duplicate run.
        let settled = ReconcileInputs::new(&snapshot, self.ctx.tokens().get().as_deref());
        *self.inputs() = Some(settled);

        match &identity {
            Some(id) => tracing::info!(role = %id.role, id = %id.id, "session reconciled"),
            None => tracing::info!("session reconciled: anonymous"),
        }
        Reconciliation::Committed(identity)
    }

    /// Provider path. Returns the identity and whether the local token
    /// should be cleared (only after a successful backend profile).
    ///
    /// Never returns `None` for the identity: losing the token or the
    /// backend profile degrades to provider-derived fields instead of
    /// signing the user out.
    async fn hydrate_from_provider(&self, user: &ProviderUser) -> (Option<Identity>, bool) {
        let fallback = provider_fallback(user);

        let Some(token) = self.provider_token().await else {
            return (normalize(None, Some(&fallback)), false);
        };

        match self.backend.fetch_profile(&token).await {
            Ok(profile) => (normalize(Some(&profile), Some(&fallback)), true),
            Err(e) => {
                tracing::warn!(error = %e, "backend profile unavailable, using provider identity");
                (normalize(None, Some(&fallback)), false)
            }
        }
    }

    /// Local-token path. An invalid token is cleared, not retried.
    async fn hydrate_from_local(&self, token: &str, generation: u64) -> Option<Identity> {
        match self.backend.fetch_profile(token).await {
            Ok(profile) => normalize(Some(&profile), None),
            Err(e) => {
                tracing::info!(
                    token = %token_preview(token),
                    error = %e,
                    "stored token rejected, clearing local session"
                );
                // Don't clobber a token written by a newer login while we
                // were waiting on the backend.
                if self.ctx.is_current(generation)
                    && self.ctx.tokens().get().as_deref() == Some(token)
                {
                    self.ctx.tokens().clear();
                }
                None
            }
        }
    }

    /// Fetches a provider token, bounded by the configured timeout.
    /// Every failure mode is logged and collapses to `None`.
    async fn provider_token(&self) -> Option<String> {
        let timeout = self.config().provider_token_timeout;
        match tokio::time::timeout(timeout, self.ctx.provider().get_token()).await {
            Ok(Ok(Some(token))) if !token.is_empty() => Some(token),
            Ok(Ok(_)) => {
                tracing::warn!("identity provider returned no token, using provider identity");
                None
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "identity provider token fetch failed, using provider identity");
                None
            }
            Err(_) => {
                tracing::warn!(?timeout, "identity provider token fetch timed out, using provider identity");
                None
            }
        }
    }

    // =====================================================================
    // Sign-out
    // =====================================================================

    /// Signs out of every source.
    ///
    /// The local part happens before this returns the future: the token
    /// is cleared, the state is reset to signed-out, and every in-flight
    /// reconciliation is invalidated. Awaiting the returned future only
    /// waits for the provider's own sign-out call.
    ///
    /// # Errors
    /// [`SessionError::Provider`] if the provider's sign-out fails. The
    /// local session is already gone either way.
    pub fn sign_out(
        &self,
    ) -> impl Future<Output = Result<(), SessionError>> + Send + use<P, S, T> {
        let provider = Arc::clone(self.ctx.provider());
        let had_provider_session = provider.is_ready() && provider.has_active_session();

        self.ctx.tokens().clear();
        self.ctx.reset();
        *self.inputs() = None;

        tracing::info!(had_provider_session, "signed out");

        async move {
            if had_provider_session {
                provider.sign_out().await?;
            }
            Ok(())
        }
    }

    // =====================================================================
    // Login
    // =====================================================================

    /// Signs in with email and password.
    ///
    /// Tries the provider first. If the provider doesn't know the account
    /// (see [`ProviderError::allows_local_fallback`](crate::ProviderError::allows_local_fallback)),
    /// or can't do password sign-in, falls back to the backend's login
    /// endpoint and stores the token it returns.
    ///
    /// # Errors
    /// [`SessionError::LoginFailed`] with a user-facing message. The
    /// session state is left as it was.
    pub async fn login(
        &self,
        credentials: &Credentials,
        remember_me: bool,
    ) -> Result<LoginOutcome, SessionError> {
        let provider = self.ctx.provider();
        if provider.is_ready() {
            match provider.sign_in(credentials).await {
                Ok(SignInOutcome::Complete) => {
                    tracing::info!(email = %credentials.email, "signed in through identity provider");
                    let identity = match self.reconcile().await {
                        Reconciliation::Committed(identity) => identity,
                        _ => self.ctx.identity(),
                    };
                    return Ok(LoginOutcome::Provider(identity));
                }
                Ok(SignInOutcome::Incomplete(status)) => {
                    tracing::warn!(%status, "provider sign-in incomplete");
                    return Err(SessionError::LoginFailed("Login incomplete".into()));
                }
                Ok(SignInOutcome::Unsupported) => {}
                Err(e) if e.allows_local_fallback() => {
                    tracing::debug!(error = %e, "provider does not know this account, trying local login");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "provider sign-in failed");
                    return Err(SessionError::LoginFailed(e.message));
                }
            }
        }

        self.local_login(credentials, remember_me).await
    }

    async fn local_login(
        &self,
        credentials: &Credentials,
        remember_me: bool,
    ) -> Result<LoginOutcome, SessionError> {
        let response = match self.backend.login(credentials, remember_me).await {
            Ok(response) => response,
            Err(e) => {
                let message = match e {
                    SessionError::Rejected { message, .. } => message,
                    other => other.to_string(),
                };
                tracing::warn!(email = %credentials.email, %message, "local login failed");
                self.ctx.tokens().clear();
                return Err(SessionError::LoginFailed(message));
            }
        };

        let Some(identity) = normalize(response.user.as_ref(), None) else {
            tracing::warn!("login response carried no user");
            return Err(SessionError::LoginFailed("Login failed".into()));
        };

        if let Some(token) = response.token.as_deref().filter(|t| !t.is_empty()) {
            if let Err(e) = self.ctx.tokens().set(token) {
                // The in-memory session still works; it just won't
                // survive a restart.
                tracing::error!(error = %e, "unable to persist local token");
            }
        }

        let snapshot = self.ctx.provider().snapshot();
        let generation = self.ctx.begin();
        self.ctx.commit(
            generation,
            SessionState::settled(Some(identity.clone()), snapshot.ready),
        );
        *self.inputs() = Some(ReconcileInputs::new(
            &snapshot,
            self.ctx.tokens().get().as_deref(),
        ));

        tracing::info!(role = %identity.role, id = %identity.id, "signed in with local token");
        Ok(LoginOutcome::Local(identity))
    }

    // =====================================================================
    // Helpers
    // =====================================================================

    fn inputs(&self) -> MutexGuard<'_, Option<ReconcileInputs>> {
        // Never held across an await; a poisoned value is still valid.
        self.last_inputs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Records `inputs` as the current run's and returns `true`, unless
    /// they equal the previous run's.
    fn start_if_changed(&self, inputs: ReconcileInputs) -> bool {
        let mut last = self.inputs();
        if last.as_ref() == Some(&inputs) {
            return false;
        }
        *last = Some(inputs);
        true
    }
}
