//! Session types: the process-wide session snapshot and its configuration.

use std::time::Duration;

use portal_identity::Identity;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Where the backend lives and how long to wait on the provider.
///
/// Defaults match a local development backend.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Base URL of the backend API, without a trailing slash.
    pub api_base_url: String,

    /// Path of the profile endpoint, relative to `api_base_url`.
    pub profile_path: String,

    /// Path of the local login endpoint, relative to `api_base_url`.
    pub login_path: String,

    /// Upper bound on one provider token fetch. A fetch that takes longer
    /// counts as failed.
    pub provider_token_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:5000/api".to_string(),
            profile_path: "/auth/profile".to_string(),
            login_path: "/auth/login".to_string(),
            provider_token_timeout: Duration::from_secs(10),
        }
    }
}

impl SessionConfig {
    /// Joins `api_base_url` and `path` with exactly one slash.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// What the rest of the application knows about the current session.
///
/// ```text
///   Loading ──(reconcile)──→ SignedIn(identity)
///      │                         │
///      └──────(reconcile)──→ Anonymous ←──(sign_out)──┘
/// ```
///
/// - `loading` stays `true` until the first reconciliation decides
///   something. Guards render a placeholder while it is set.
/// - `identity` is `None` when nobody is signed in.
/// - `provider_ready` mirrors the provider's readiness at the last run.
///
/// Only the reconciliation engine writes this; everyone else reads a
/// complete copy.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub identity: Option<Identity>,
    pub loading: bool,
    pub provider_ready: bool,
}

impl Default for SessionState {
    /// The state at application start.
    fn default() -> Self {
        Self {
            identity: None,
            loading: true,
            provider_ready: false,
        }
    }
}

impl SessionState {
    /// A settled state: reconciliation decided, with or without a user.
    pub fn settled(identity: Option<Identity>, provider_ready: bool) -> Self {
        Self {
            identity,
            loading: false,
            provider_ready,
        }
    }

    /// The state right after an explicit sign-out.
    pub fn signed_out(provider_ready: bool) -> Self {
        Self::settled(None, provider_ready)
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }
}
