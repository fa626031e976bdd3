/// Errors that can occur in the transport layer.
///
/// A non-2xx response is NOT a transport error: the transport delivered
/// a response, and the caller decides what the status means.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The request could not be built (bad URL, bad header value).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The request was sent but no response came back (DNS, refused
    /// connection, reset, TLS failure).
    #[error("network error: {0}")]
    Network(String),

    /// No response within the request's timeout.
    #[error("request timed out")]
    Timeout,

    /// A response body could not be serialized or parsed as JSON.
    #[error("body is not valid JSON: {0}")]
    Json(#[source] serde_json::Error),
}
