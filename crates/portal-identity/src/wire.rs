//! JSON bodies exchanged with the backend's auth endpoints.
//!
//! ```text
//! GET  /auth/profile   → { "user": { "id", "email", "name"?, "role"?, ... } }
//! POST /auth/login     ← { "email", "password", "rememberMe" }
//!                      → { "token", "user" }  |  { "error": "..." }
//! ```
//!
//! User records stay as [`RawFields`] on purpose: normalization decides
//! what they mean, and every unknown field is passed through.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::{IdentityError, RawFields};

/// Email + password, as typed into a login form.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Hand-written so passwords never end up in logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Response of `GET /auth/profile`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileResponse {
    #[serde(default)]
    pub user: Option<RawFields>,
}

/// Body of `POST /auth/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(rename = "rememberMe")]
    pub remember_me: bool,
}

impl LoginRequest {
    pub fn new(credentials: &Credentials, remember_me: bool) -> Self {
        Self {
            email: credentials.email.clone(),
            password: credentials.password.clone(),
            remember_me,
        }
    }
}

/// Successful response of `POST /auth/login`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<RawFields>,
}

/// Error body returned by the backend on any failed request.
///
/// The message is meant for humans and is shown to the user verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Serializes a request body to JSON bytes.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, IdentityError> {
    serde_json::to_vec(value).map_err(IdentityError::Encode)
}

/// Parses a JSON response body.
pub fn decode<T: DeserializeOwned>(data: &[u8]) -> Result<T, IdentityError> {
    serde_json::from_slice(data).map_err(IdentityError::Decode)
}
