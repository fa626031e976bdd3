//! The session conflict screen: signed in as one role, asking for another
//! role's login page.
//!
//! Two ways out:
//! - **Continue**: go to `/`, which sends the user to their own dashboard.
//!   Nothing changes.
//! - **Switch**: sign out everywhere, then evaluate the same location
//!   again. With nobody signed in it now renders the requested login form.

use portal_identity::{Identity, Role};
use portal_session::{ExternalProvider, SessionEngine, TokenStore};
use portal_transport::HttpTransport;

use crate::RedirectDecision;

/// The two buttons on the conflict screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictAction {
    Continue,
    Switch,
}

/// What the host application should do after an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictResolution {
    Navigate(RedirectDecision),
    /// Stay at the current location and evaluate it again.
    Reevaluate,
}

/// A signed-in `current` role asked for `target`'s login entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConflict {
    pub current: Role,
    pub target: Role,
    /// Shown as "Signed in as ...".
    pub email: String,
}

impl SessionConflict {
    pub fn new(identity: &Identity, target: Role) -> Self {
        Self {
            current: identity.role,
            target,
            email: identity.email.clone(),
        }
    }

    /// e.g. "Continue to Mentor Dashboard".
    pub fn continue_label(&self) -> String {
        format!("Continue to {} Dashboard", self.current.display_name())
    }

    /// e.g. "Logout & Switch to Recruiter".
    pub fn switch_label(&self) -> String {
        format!("Logout & Switch to {}", self.target.display_name())
    }

    pub fn message(&self) -> String {
        format!(
            "You are currently logged in as a {}. To access the {} portal, you need to switch accounts.",
            self.current.display_name(),
            self.target.display_name()
        )
    }

    /// Carries out `action`.
    ///
    /// Switch signs out through `engine`. The local session is gone as
    /// soon as sign-out starts, so a provider failure is only logged.
    pub async fn resolve<P, S, T>(
        &self,
        action: ConflictAction,
        engine: &SessionEngine<P, S, T>,
    ) -> ConflictResolution
    where
        P: ExternalProvider,
        S: TokenStore,
        T: HttpTransport,
    {
        match action {
            ConflictAction::Continue => {
                tracing::info!(current = %self.current, target = %self.target, "conflict: continuing");
                ConflictResolution::Navigate(RedirectDecision::root())
            }
            ConflictAction::Switch => {
                tracing::info!(current = %self.current, target = %self.target, "conflict: switching accounts");
                if let Err(e) = engine.sign_out().await {
                    tracing::warn!(error = %e, "provider sign-out failed during account switch");
                }
                ConflictResolution::Reevaluate
            }
        }
    }
}
