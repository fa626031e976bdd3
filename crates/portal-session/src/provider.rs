//! The external identity provider, seen as an opaque capability.
//!
//! The portal doesn't implement OIDC, SAML, or any hosted sign-in
//! ceremony itself. A hosted provider (Clerk, Auth0, Firebase Auth, ...)
//! does that, and the portal only needs to ask it a handful of questions:
//!
//! - Has it finished booting? ([`is_ready`](ExternalProvider::is_ready))
//! - Is somebody signed in? ([`has_active_session`](ExternalProvider::has_active_session))
//! - Who? ([`user`](ExternalProvider::user))
//! - Give me a bearer token for the backend ([`get_token`](ExternalProvider::get_token))
//! - Sign them out ([`sign_out`](ExternalProvider::sign_out))
//!
//! Implement [`ExternalProvider`] with your provider's SDK; use a scripted
//! fake in tests.

use std::future::Future;

use portal_identity::{Credentials, ProviderUser};

/// An error reported by the external identity provider.
///
/// Providers report failures in their own vocabulary. The portal keeps
/// the three pieces it makes decisions on: an HTTP-like status, a
/// machine-readable code, and the human message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ProviderError {
    pub status: Option<u16>,
    pub code: Option<String>,
    pub message: String,
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            code: None,
            message: message.into(),
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Whether a rejected password sign-in should be retried against the
    /// backend's own login endpoint.
    ///
    /// Accounts that only exist in the backend (seeded demo users, users
    /// created before the provider was introduced) are unknown to the
    /// provider. The provider reports them as "not found" or "wrong
    /// password", which is exactly when the local login path applies.
    pub fn allows_local_fallback(&self) -> bool {
        if matches!(self.status, Some(422) | Some(404)) {
            return true;
        }
        if matches!(
            self.code.as_deref(),
            Some("form_identifier_not_found") | Some("form_password_incorrect")
        ) {
            return true;
        }
        if self.status == Some(400)
            && self.message.to_lowercase().contains("verification strategy")
        {
            return true;
        }
        self.message.contains("Couldn't find your account")
    }
}

/// Result of a password sign-in attempt against the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInOutcome {
    /// The provider now holds an active session.
    Complete,

    /// The provider needs more steps (second factor, email
    /// verification, ...). Carries the provider's status string.
    Incomplete(String),

    /// This provider doesn't do password sign-in at all.
    Unsupported,
}

/// A point-in-time view of the provider, taken once per reconciliation.
///
/// Reading the three signals together means one reconciliation run never
/// mixes "ready" from before a sign-out with "user" from after it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderSnapshot {
    pub ready: bool,
    pub active: bool,
    pub user: Option<ProviderUser>,
}

/// The capability surface of a hosted identity provider.
///
/// # Trait bounds
///
/// - `Send + Sync + 'static` → one provider handle is shared by the
///   reconciliation engine and the request interceptor for the lifetime
///   of the application.
/// - Async methods return `Send` futures so they can run inside spawned
///   tasks.
pub trait ExternalProvider: Send + Sync + 'static {
    /// Whether the provider finished its own initialization.
    ///
    /// Until this is `true`, "no active session" means "don't know yet",
    /// not "signed out".
    fn is_ready(&self) -> bool;

    /// Whether the provider holds a signed-in session.
    fn has_active_session(&self) -> bool;

    /// The signed-in user's profile. `None` while signed out, and
    /// possibly `None` for a moment after sign-in while it loads.
    fn user(&self) -> Option<ProviderUser>;

    /// Fetches a short-lived bearer token for the backend.
    ///
    /// # Returns
    /// - `Ok(Some(token))` → attach this to backend requests
    /// - `Ok(None)` → the provider has no token to give right now
    /// - `Err(ProviderError)` → the fetch itself failed
    fn get_token(
        &self,
    ) -> impl Future<Output = Result<Option<String>, ProviderError>> + Send;

    /// Ends the provider session.
    fn sign_out(&self) -> impl Future<Output = Result<(), ProviderError>> + Send;

    /// Attempts a password sign-in.
    ///
    /// The default reports [`SignInOutcome::Unsupported`], which sends
    /// every login to the backend's own endpoint.
    fn sign_in(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<SignInOutcome, ProviderError>> + Send {
        let _ = credentials;
        async { Ok(SignInOutcome::Unsupported) }
    }

    /// Reads readiness, session flag, and user together.
    fn snapshot(&self) -> ProviderSnapshot {
        ProviderSnapshot {
            ready: self.is_ready(),
            active: self.has_active_session(),
            user: self.user(),
        }
    }
}
