//! Error types for the routing layer.

use portal_identity::Role;

/// Errors that can occur while building routing inputs.
///
/// The guard itself never fails: a broken redirect target is logged and
/// turned into "go to `/`". These errors surface where input is parsed
/// (locations, configuration).
#[derive(Debug, thiserror::Error)]
pub enum RoutingError {
    /// A location string is not an absolute URL.
    #[error("invalid location {input:?}: {source}")]
    InvalidLocation {
        input: String,
        #[source]
        source: url::ParseError,
    },

    /// A role's configured origin can't be used as a redirect target.
    #[error("malformed origin {origin:?} for {role}")]
    MalformedOrigin { role: Role, origin: String },

    /// The application table has no entry for this role.
    #[error("no application configured for {0}")]
    MissingApp(Role),
}
