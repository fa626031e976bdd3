//! Which credential a reconciliation run should trust.
//!
//! Two sources can claim a user: the external provider and the local
//! fallback token. The precedence between them is a pure function of
//! what the provider reports and what the token store holds, so it lives
//! here, separate from any I/O.

use portal_identity::ProviderUser;

use crate::ProviderSnapshot;

/// The authentication source a reconciliation run will use.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthSource {
    /// The provider holds a session for this user. The local token, if
    /// any, is ignored.
    ExternalProvider(ProviderUser),

    /// No provider session, but a locally issued token is stored.
    LocalToken(String),

    /// Nobody is signed in.
    Anonymous,
}

/// Decides which source to trust.
///
/// Returns `None` while the decision has to wait:
/// - the provider hasn't finished booting (its "no session" would be
///   premature and would wrongly push the user to the fallback token or
///   to the login screen), or
/// - the provider reports a session but its user object hasn't loaded.
///
/// The local token only ever applies when the provider is ready AND
/// reports no session. It is a pre-provider fallback, never a retry path.
pub fn resolve(provider: &ProviderSnapshot, local_token: Option<&str>) -> Option<AuthSource> {
    if !provider.ready {
        return None;
    }

    if provider.active {
        return provider.user.clone().map(AuthSource::ExternalProvider);
    }

    match local_token {
        Some(token) if !token.is_empty() => Some(AuthSource::LocalToken(token.to_string())),
        _ => Some(AuthSource::Anonymous),
    }
}

/// Everything a reconciliation run depends on.
///
/// Two runs with equal inputs produce the same result, so the engine
/// skips a run whose inputs equal the previous run's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileInputs {
    pub provider_ready: bool,
    pub provider_active: bool,
    pub provider_user_id: Option<String>,
    pub local_token: Option<String>,
}

impl ReconcileInputs {
    pub fn new(provider: &ProviderSnapshot, local_token: Option<&str>) -> Self {
        Self {
            provider_ready: provider.ready,
            provider_active: provider.active,
            provider_user_id: provider.user.as_ref().map(|u| u.id.clone()),
            local_token: local_token.map(str::to_string),
        }
    }
}
