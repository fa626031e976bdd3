//! Request and response values moved by an [`HttpTransport`](crate::HttpTransport).

use std::time::Duration;

use http::header::AUTHORIZATION;
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::TransportError;

/// Formats a bearer credential header value.
pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

/// An outgoing HTTP request.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<serde_json::Value>,
    pub timeout: Option<Duration>,
}

impl Request {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            body: None,
            timeout: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    /// Attaches a JSON body.
    ///
    /// # Errors
    /// Returns [`TransportError::Json`] if `body` cannot be represented
    /// as JSON (e.g. a map with non-string keys).
    pub fn with_json<T: Serialize>(mut self, body: &T) -> Result<Self, TransportError> {
        self.body = Some(serde_json::to_value(body).map_err(TransportError::Json)?);
        Ok(self)
    }

    /// Sets `Authorization: Bearer <token>`, replacing any existing value.
    ///
    /// # Errors
    /// Returns [`TransportError::InvalidRequest`] if the token contains
    /// characters that are not allowed in a header.
    pub fn with_bearer(mut self, token: &str) -> Result<Self, TransportError> {
        self.set_bearer(token)?;
        Ok(self)
    }

    /// In-place form of [`with_bearer`](Self::with_bearer).
    pub fn set_bearer(&mut self, token: &str) -> Result<(), TransportError> {
        let value = HeaderValue::from_str(&bearer(token))
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
        self.headers.insert(AUTHORIZATION, value);
        Ok(())
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Whether a caller already attached an `Authorization` header.
    pub fn has_authorization(&self) -> bool {
        self.headers.contains_key(AUTHORIZATION)
    }

    /// The token of a `Bearer` authorization header, if present.
    pub fn bearer_token(&self) -> Option<&str> {
        self.headers
            .get(AUTHORIZATION)?
            .to_str()
            .ok()?
            .strip_prefix("Bearer ")
    }
}

/// A response as delivered by the transport, status unchecked.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Builds a response whose body is `value` serialized as JSON.
    pub fn json<T: Serialize>(status: StatusCode, value: &T) -> Result<Self, TransportError> {
        let body = serde_json::to_vec(value).map_err(TransportError::Json)?;
        Ok(Self::new(status, body))
    }

    /// `true` for any 2xx status.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Parses the body as JSON.
    pub fn decode_json<T: DeserializeOwned>(&self) -> Result<T, TransportError> {
        serde_json::from_slice(&self.body).map_err(TransportError::Json)
    }
}
