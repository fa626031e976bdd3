//! Calls to the backend's auth endpoints.

use portal_identity::{
    Credentials, ErrorBody, LoginRequest, LoginResponse, ProfileResponse, RawFields,
};
use portal_transport::{HttpTransport, Request, Response};

use crate::{SessionConfig, SessionError};

/// Thin client for `GET /auth/profile` and `POST /auth/login`.
///
/// Profile fetches always carry the token they are given explicitly. The
/// reconciliation engine uses this to call the backend with a token it
/// just obtained, without depending on what the interceptor would pick.
pub struct BackendClient<T> {
    transport: T,
    config: SessionConfig,
}

impl<T: HttpTransport> BackendClient<T> {
    pub fn new(transport: T, config: SessionConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Fetches the user's backend profile with `token` as bearer.
    ///
    /// # Errors
    /// - [`SessionError::Transport`] → no response
    /// - [`SessionError::Rejected`] → any non-2xx status
    /// - [`SessionError::Identity`] / [`SessionError::MissingUser`] → a
    ///   2xx with an unusable body
    pub async fn fetch_profile(&self, token: &str) -> Result<RawFields, SessionError> {
        let url = self.config.endpoint(&self.config.profile_path);
        let request = Request::get(url).with_bearer(token)?;

        tracing::debug!(token = %token_preview(token), "fetching backend profile");
        let response = self.transport.execute(request).await?;
        if !response.is_success() {
            return Err(rejection(&response));
        }

        let profile: ProfileResponse = portal_identity::decode(&response.body)?;
        profile.user.ok_or(SessionError::MissingUser)
    }

    /// Signs in against the backend's own credential store.
    pub async fn login(
        &self,
        credentials: &Credentials,
        remember_me: bool,
    ) -> Result<LoginResponse, SessionError> {
        let url = self.config.endpoint(&self.config.login_path);
        let request =
            Request::post(url).with_json(&LoginRequest::new(credentials, remember_me))?;

        let response = self.transport.execute(request).await?;
        if !response.is_success() {
            return Err(rejection(&response));
        }
        Ok(portal_identity::decode(&response.body)?)
    }
}

/// Turns a non-2xx response into [`SessionError::Rejected`], keeping the
/// backend's `{ "error": ... }` message when there is one.
fn rejection(response: &Response) -> SessionError {
    let status = response.status.as_u16();
    let message = portal_identity::decode::<ErrorBody>(&response.body)
        .map(|body| body.error)
        .unwrap_or_else(|_| format!("Request failed with status code {status}"));
    SessionError::Rejected { status, message }
}

/// First few characters of a token, for logs.
pub(crate) fn token_preview(token: &str) -> String {
    let prefix: String = token.chars().take(8).collect();
    format!("{prefix}…")
}
