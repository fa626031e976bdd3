//! Error types for the identity layer.
//!
//! Each crate in the portal defines its own error enum. An
//! `IdentityError` always means a problem with data shape (a JSON body
//! that doesn't parse, a role string that isn't one of the four roles),
//! never a network or storage problem.

/// Errors that can occur while decoding or validating identity data.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// Serializing a request body failed.
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// A response body was not the JSON shape we expected.
    ///
    /// Common causes: an HTML error page from a proxy, a truncated body,
    /// or a backend that changed its response format.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// A role string that is not one of `student`, `mentor`, `admin`,
    /// `recruiter`.
    ///
    /// Only strict parsing ([`Role::from_str`](std::str::FromStr)) returns
    /// this. Identity normalization never fails on a role; it falls back
    /// to `student` instead.
    #[error("unknown role: {0:?}")]
    UnknownRole(String),
}
