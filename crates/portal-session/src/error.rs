//! Error types for the session layer.

use portal_identity::IdentityError;
use portal_transport::TransportError;

use crate::ProviderError;

/// Errors that can occur during session management.
///
/// Most of these never reach the user: reconciliation recovers from
/// provider and backend failures by degrading (see the engine docs). Only
/// [`SessionError::LoginFailed`] is meant to be displayed.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The external identity provider failed (token fetch, sign-in,
    /// sign-out).
    #[error("identity provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The request never got a response.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A response body had the wrong shape.
    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// The backend answered with a non-2xx status.
    ///
    /// `message` is the backend's `{ "error": ... }` text when it sent one.
    #[error("backend rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The backend answered 2xx but the body had no user record.
    #[error("profile response did not contain a user")]
    MissingUser,

    /// The persisted token could not be read or written.
    #[error("token storage failed: {0}")]
    Storage(#[source] std::io::Error),

    /// A login attempt failed. The message is user-facing and is shown
    /// verbatim (e.g. "Invalid credentials").
    #[error("{0}")]
    LoginFailed(String),
}
