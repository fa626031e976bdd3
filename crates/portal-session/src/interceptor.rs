//! Request signing: attach exactly one credential to every outgoing call.
//!
//! [`AuthInterceptor`] wraps any [`HttpTransport`] and decides, per
//! request at dispatch time, which bearer token to attach:
//!
//! 1. The caller already set `Authorization` → leave it alone.
//! 2. The provider reports an active session → fetch its token (bounded
//!    by a timeout) and attach it when non-empty.
//! 3. Otherwise (or if step 2 produced nothing) → the stored local token.
//! 4. Otherwise → send unauthenticated.
//!
//! A failed provider token fetch is logged and falls through to step 3.
//! During a provider hiccup the local token may still be valid, and an
//! unauthenticated request lets the backend answer 401 on its own terms.

use std::time::Duration;

use portal_transport::{HttpTransport, Request, Response, TransportError};

use crate::{ExternalProvider, SessionContext, TokenStore};

/// An [`HttpTransport`] that signs requests before handing them to
/// `inner`.
///
/// Cheap to share: each request's token decision is independent, so
/// concurrent requests never wait on each other beyond their own token
/// fetch.
pub struct AuthInterceptor<P, S, T> {
    ctx: SessionContext<P, S>,
    inner: T,
    token_timeout: Duration,
}

impl<P, S, T> AuthInterceptor<P, S, T>
where
    P: ExternalProvider,
    S: TokenStore,
    T: HttpTransport,
{
    pub fn new(ctx: SessionContext<P, S>, inner: T, token_timeout: Duration) -> Self {
        Self {
            ctx,
            inner,
            token_timeout,
        }
    }

    /// Applies the credential policy to `request` without sending it.
    pub async fn authorize(&self, mut request: Request) -> Request {
        if request.has_authorization() {
            return request;
        }

        let provider = self.ctx.provider();
        if provider.is_ready() && provider.has_active_session() {
            match tokio::time::timeout(self.token_timeout, provider.get_token()).await {
                Ok(Ok(Some(token))) if !token.is_empty() => match request.set_bearer(&token) {
                    Ok(()) => return request,
                    Err(e) => tracing::warn!(error = %e, "provider token is not a valid header value"),
                },
                Ok(Ok(_)) => {
                    tracing::debug!(url = %request.url, "provider returned no token for request");
                }
                Ok(Err(e)) => {
                    tracing::warn!(url = %request.url, error = %e, "failed to get provider token for request");
                }
                Err(_) => {
                    tracing::warn!(url = %request.url, "provider token fetch timed out");
                }
            }
        }

        if let Some(token) = self.ctx.tokens().get().filter(|t| !t.is_empty()) {
            if let Err(e) = request.set_bearer(&token) {
                tracing::warn!(error = %e, "stored token is not a valid header value");
            }
        }

        request
    }

    pub fn context(&self) -> &SessionContext<P, S> {
        &self.ctx
    }
}

impl<P, S, T> HttpTransport for AuthInterceptor<P, S, T>
where
    P: ExternalProvider,
    S: TokenStore,
    T: HttpTransport,
{
    async fn execute(&self, request: Request) -> Result<Response, TransportError> {
        let request = self.authorize(request).await;
        self.inner.execute(request).await
    }
}
