//! The explicit session context shared by the engine, the interceptor,
//! and the route guard.
//!
//! Instead of ambient globals, the application builds one
//! [`SessionContext`] at start-up and hands clones of it to whoever needs
//! it. Tests build their own with fake providers and stores.
//!
//! # Single writer, many readers
//!
//! `SessionState` is published through a `tokio::sync::watch` channel.
//! Readers always see a complete value (the channel swaps whole values),
//! and can `subscribe()` to be woken on change. Only crate-internal code
//! (the engine) can publish.
//!
//! # Generations
//!
//! Every reconciliation run and every sign-out bumps a generation
//! counter. A run may only publish its result if no newer run or sign-out
//! started since it began, so a slow, stale run can never resurrect an
//! identity after sign-out.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use portal_identity::Identity;
use tokio::sync::watch;

use crate::{ExternalProvider, SessionState, TokenStore};

/// Shared handles to the provider, the token store, and the session state.
pub struct SessionContext<P, S> {
    provider: Arc<P>,
    tokens: Arc<S>,
    state: Arc<watch::Sender<SessionState>>,
    generation: Arc<AtomicU64>,
}

// Manual impl: deriving Clone would require `P: Clone + S: Clone`, but we
// only clone the `Arc`s.
impl<P, S> Clone for SessionContext<P, S> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            tokens: Arc::clone(&self.tokens),
            state: Arc::clone(&self.state),
            generation: Arc::clone(&self.generation),
        }
    }
}

impl<P: ExternalProvider, S: TokenStore> SessionContext<P, S> {
    /// Creates a context in the initial (loading) state.
    pub fn new(provider: Arc<P>, tokens: Arc<S>) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self {
            provider,
            tokens,
            state: Arc::new(state),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }

    pub fn tokens(&self) -> &Arc<S> {
        &self.tokens
    }

    /// A copy of the current session state.
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// A receiver that is notified whenever the state changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.state.borrow().identity.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    // -- Writer side (engine only) ----------------------------------------

    /// Starts a new generation and returns its number. Any result tagged
    /// with an older number will be discarded.
    pub(crate) fn begin(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub(crate) fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Publishes `next` if `generation` is still the newest.
    ///
    /// The generation check runs inside the channel's write lock, the same
    /// lock `reset()` publishes under, so a commit racing a sign-out either
    /// lands before the reset (and is overwritten) or is dropped.
    pub(crate) fn commit(&self, generation: u64, next: SessionState) -> bool {
        let mut accepted = false;
        self.state.send_if_modified(|state| {
            if !self.is_current(generation) {
                return false;
            }
            accepted = true;
            let changed = *state != next;
            *state = next;
            changed
        });
        accepted
    }

    /// Only updates the readiness flag, leaving identity and loading alone.
    pub(crate) fn set_provider_ready(&self, ready: bool) {
        self.state.send_if_modified(|state| {
            if state.provider_ready == ready {
                return false;
            }
            state.provider_ready = ready;
            true
        });
    }

    /// Invalidates every in-flight run and publishes the signed-out state.
    pub(crate) fn reset(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let ready = self.state.borrow().provider_ready;
        self.state.send_replace(SessionState::signed_out(ready));
    }
}
