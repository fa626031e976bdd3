//! HTTP transport abstraction for the placement portal.
//!
//! Provides the [`HttpTransport`] trait that every outgoing backend call
//! goes through, plus the [`Request`] / [`Response`] pair it moves.
//! Keeping the network behind a trait lets the session layer wrap it
//! (request signing) and lets tests swap it for a recording fake.
//!
//! # Feature Flags
//!
//! - `reqwest` (default) → [`ReqwestTransport`], backed by `reqwest`

mod error;
mod request;
#[cfg(feature = "reqwest")]
mod reqwest_transport;

pub use error::TransportError;
pub use request::{Request, Response, bearer};
#[cfg(feature = "reqwest")]
pub use reqwest_transport::ReqwestTransport;

use std::future::Future;
use std::sync::Arc;

/// Sends one HTTP request and returns the response.
///
/// # Trait bounds
///
/// - `Send + Sync + 'static` → one transport is shared by the
///   reconciliation engine, the request interceptor, and any number of
///   concurrent callers.
/// - The returned future is `Send` so callers can `tokio::spawn` it.
pub trait HttpTransport: Send + Sync + 'static {
    /// Executes the request.
    ///
    /// # Returns
    /// - `Ok(Response)` → a response arrived, whatever its status
    /// - `Err(TransportError)` → nothing usable came back
    fn execute(
        &self,
        request: Request,
    ) -> impl Future<Output = Result<Response, TransportError>> + Send;
}

/// A shared transport is still a transport.
impl<T: HttpTransport> HttpTransport for Arc<T> {
    fn execute(
        &self,
        request: Request,
    ) -> impl Future<Output = Result<Response, TransportError>> + Send {
        (**self).execute(request)
    }
}
