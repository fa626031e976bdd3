//! Scripted fakes shared by the session integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use http::StatusCode;
use portal_identity::{Credentials, LoginRequest, ProviderUser};
use portal_session::{ExternalProvider, ProviderError, ProviderSnapshot, SignInOutcome};
use portal_transport::{HttpTransport, Request, Response, TransportError};
use serde_json::{Value, json};
use tokio::sync::Notify;

// ---------------------------------------------------------------------------
// FakeProvider
// ---------------------------------------------------------------------------

/// How `get_token` answers.
#[derive(Debug, Clone)]
pub enum TokenReply {
    Token(String),
    Empty,
    Fail,
    /// Never resolves; only the caller's timeout ends the wait.
    Hang,
}

/// An identity provider whose every answer is set by the test.
pub struct FakeProvider {
    snapshot: Mutex<ProviderSnapshot>,
    token: Mutex<TokenReply>,
    sign_in: Mutex<Option<(Result<SignInOutcome, ProviderError>, Option<ProviderUser>)>>,
    hold_sign_out: AtomicBool,
    pub sign_out_release: Notify,
    pub sign_out_calls: AtomicUsize,
    pub token_calls: AtomicUsize,
}

impl FakeProvider {
    fn with_snapshot(snapshot: ProviderSnapshot) -> Arc<Self> {
        Arc::new(Self {
            snapshot: Mutex::new(snapshot),
            token: Mutex::new(TokenReply::Empty),
            sign_in: Mutex::new(None),
            hold_sign_out: AtomicBool::new(false),
            sign_out_release: Notify::new(),
            sign_out_calls: AtomicUsize::new(0),
            token_calls: AtomicUsize::new(0),
        })
    }

    /// Still initializing.
    pub fn booting() -> Arc<Self> {
        Self::with_snapshot(ProviderSnapshot::default())
    }

    /// Ready, nobody signed in.
    pub fn signed_out() -> Arc<Self> {
        Self::with_snapshot(ProviderSnapshot {
            ready: true,
            active: false,
            user: None,
        })
    }

    /// Ready, `user` signed in, handing out `token`.
    pub fn signed_in(user: ProviderUser, token: &str) -> Arc<Self> {
        let provider = Self::with_snapshot(ProviderSnapshot {
            ready: true,
            active: true,
            user: Some(user),
        });
        provider.set_token(TokenReply::Token(token.into()));
        provider
    }

    pub fn set_ready(&self, ready: bool) {
        self.snapshot.lock().unwrap().ready = ready;
    }

    pub fn set_session(&self, user: Option<ProviderUser>) {
        let mut snap = self.snapshot.lock().unwrap();
        snap.active = user.is_some();
        snap.user = user;
    }

    /// Session flag set, user object not loaded yet.
    pub fn set_active_without_user(&self) {
        let mut snap = self.snapshot.lock().unwrap();
        snap.active = true;
        snap.user = None;
    }

    pub fn set_token(&self, reply: TokenReply) {
        *self.token.lock().unwrap() = reply;
    }

    /// The next `sign_in` returns `result`; on `Complete` the provider
    /// becomes signed in as `user`.
    pub fn script_sign_in(
        &self,
        result: Result<SignInOutcome, ProviderError>,
        user: Option<ProviderUser>,
    ) {
        *self.sign_in.lock().unwrap() = Some((result, user));
    }

    /// Makes `sign_out` wait for `sign_out_release`.
    pub fn hold_sign_out(&self) {
        self.hold_sign_out.store(true, Ordering::SeqCst);
    }

    pub fn sign_out_count(&self) -> usize {
        self.sign_out_calls.load(Ordering::SeqCst)
    }

    pub fn token_count(&self) -> usize {
        self.token_calls.load(Ordering::SeqCst)
    }
}

impl ExternalProvider for FakeProvider {
    fn is_ready(&self) -> bool {
        self.snapshot.lock().unwrap().ready
    }

    fn has_active_session(&self) -> bool {
        self.snapshot.lock().unwrap().active
    }

    fn user(&self) -> Option<ProviderUser> {
        self.snapshot.lock().unwrap().user.clone()
    }

    async fn get_token(&self) -> Result<Option<String>, ProviderError> {
        self.token_calls.fetch_add(1, Ordering::SeqCst);
        let reply = self.token.lock().unwrap().clone();
        match reply {
            TokenReply::Token(token) => Ok(Some(token)),
            TokenReply::Empty => Ok(None),
            TokenReply::Fail => Err(ProviderError::new("token endpoint unavailable")),
            TokenReply::Hang => std::future::pending().await,
        }
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        if self.hold_sign_out.load(Ordering::SeqCst) {
            self.sign_out_release.notified().await;
        }
        self.set_session(None);
        Ok(())
    }

    async fn sign_in(&self, _credentials: &Credentials) -> Result<SignInOutcome, ProviderError> {
        let scripted = self.sign_in.lock().unwrap().take();
        let Some((result, user)) = scripted else {
            return Ok(SignInOutcome::Unsupported);
        };
        if matches!(result, Ok(SignInOutcome::Complete)) {
            self.set_session(user);
        }
        result
    }
}

pub fn provider_user(id: &str, email: &str, role: Option<&str>) -> ProviderUser {
    let mut user = ProviderUser {
        id: id.into(),
        primary_email: Some(email.into()),
        first_name: Some("Asha".into()),
        last_name: Some("Rao".into()),
        ..ProviderUser::default()
    };
    if let Some(role) = role {
        user.public_metadata.insert("role".into(), json!(role));
    }
    user
}

// ---------------------------------------------------------------------------
// FakeBackend
// ---------------------------------------------------------------------------

struct Account {
    password: String,
    token: String,
    user: Value,
}

/// An in-memory backend answering `/auth/profile` and `/auth/login`.
///
/// Records every request it receives.
#[derive(Default)]
pub struct FakeBackend {
    profiles: Mutex<HashMap<String, Value>>,
    accounts: Mutex<HashMap<String, Account>>,
    requests: Mutex<Vec<Request>>,
    hold: Mutex<Option<Arc<Notify>>>,
    offline: AtomicBool,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// `GET /auth/profile` with bearer `token` returns `user`.
    pub fn with_profile(&self, token: &str, user: Value) -> &Self {
        self.profiles.lock().unwrap().insert(token.into(), user);
        self
    }

    /// `POST /auth/login` with these credentials returns `token` + `user`.
    pub fn with_account(&self, email: &str, password: &str, token: &str, user: Value) -> &Self {
        self.accounts.lock().unwrap().insert(
            email.into(),
            Account {
                password: password.into(),
                token: token.into(),
                user,
            },
        );
        self
    }

    /// Every request from now on waits until the returned handle is
    /// notified once per request.
    pub fn hold_requests(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.hold.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub fn release_holds(&self) {
        *self.hold.lock().unwrap() = None;
    }

    /// Requests fail with a network error.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub fn profile_calls(&self) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.url.ends_with("/auth/profile"))
            .count()
    }

    pub fn login_calls(&self) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.url.ends_with("/auth/login"))
            .count()
    }

    fn answer(&self, request: &Request) -> Result<Response, TransportError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(TransportError::Network("connection refused".into()));
        }

        if request.url.ends_with("/auth/profile") {
            let user = request
                .bearer_token()
                .and_then(|token| self.profiles.lock().unwrap().get(token).cloned());
            return match user {
                Some(user) => Response::json(StatusCode::OK, &json!({ "user": user })),
                None => Response::json(StatusCode::UNAUTHORIZED, &json!({ "error": "Invalid token" })),
            };
        }

        if request.url.ends_with("/auth/login") {
            let body: LoginRequest = request
                .body
                .clone()
                .and_then(|b| serde_json::from_value(b).ok())
                .ok_or_else(|| TransportError::InvalidRequest("missing login body".into()))?;
            let accounts = self.accounts.lock().unwrap();
            return match accounts.get(&body.email) {
                Some(acct) if acct.password == body.password => Response::json(
                    StatusCode::OK,
                    &json!({ "token": acct.token, "user": acct.user }),
                ),
                _ => Response::json(
                    StatusCode::UNAUTHORIZED,
                    &json!({ "error": "Invalid credentials" }),
                ),
            };
        }

        Ok(Response::new(StatusCode::NOT_FOUND, "not found"))
    }
}

impl HttpTransport for FakeBackend {
    async fn execute(&self, request: Request) -> Result<Response, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        let gate = self.hold.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.answer(&request)
    }
}
