//! Session reconciliation for the placement portal.
//!
//! This crate decides who the current user is and keeps every outgoing
//! backend request signed with the right credential:
//!
//! 1. **Provider capability**: what the hosted identity provider can tell
//!    us ([`ExternalProvider`])
//! 2. **Token storage**: the locally issued fallback token
//!    ([`TokenStore`], [`FileTokenStore`], [`MemoryTokenStore`])
//! 3. **Reconciliation**: merging the two into one [`Identity`]
//!    ([`SessionEngine`])
//! 4. **Request signing**: attaching one bearer token per request
//!    ([`AuthInterceptor`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Routing Layer (above)   ← reads SessionState to guard routes
//!     ↕
//! Session Layer (this crate)  ← owns SessionState, signs requests
//!     ↕
//! Identity + Transport (below)  ← Identity normalization, HTTP calls
//! ```
//!
//! [`Identity`]: portal_identity::Identity

#![allow(async_fn_in_trait)]

mod backend;
mod context;
mod engine;
mod error;
mod interceptor;
mod provider;
mod source;
mod state;
mod store;

pub use backend::BackendClient;
pub use context::SessionContext;
pub use engine::{LoginOutcome, Reconciliation, SessionEngine};
pub use error::SessionError;
pub use interceptor::AuthInterceptor;
pub use provider::{ExternalProvider, ProviderError, ProviderSnapshot, SignInOutcome};
pub use source::{AuthSource, ReconcileInputs, resolve};
pub use state::{SessionConfig, SessionState};
pub use store::{FileTokenStore, MemoryTokenStore, TOKEN_STORAGE_KEY, TokenRecord, TokenStore};
