//! Unified error type for the placement portal.

use portal_identity::IdentityError;
use portal_routing::RoutingError;
use portal_session::SessionError;
use portal_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `placement-portal` facade you deal with this single
/// error type instead of importing errors from each sub-crate. The
/// `#[from]` attribute on each variant generates the `From` impls, so `?`
/// converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum PortalError {
    /// A transport-level error (no response, timeout).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// An identity-level error (bad wire data, unknown role).
    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// A session-level error (login failed, storage, provider).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A routing-level error (bad location, malformed origin).
    #[error(transparent)]
    Routing(#[from] RoutingError),

    /// The configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl PortalError {
    /// The message to show on a login form, if this is a login failure.
    pub fn login_message(&self) -> Option<&str> {
        match self {
            Self::Session(SessionError::LoginFailed(message)) => Some(message),
            _ => None,
        }
    }
}
