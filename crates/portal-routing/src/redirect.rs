//! Where to send an authenticated user who is in the wrong place.

use portal_identity::Identity;
use url::Url;

use crate::{AppTable, Location, Topology};

/// A navigation the guard asks the host application to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectDecision {
    /// Navigate within the current instance to this path.
    InApp(String),

    /// Leave this instance for another origin (development only).
    CrossOrigin(Url),
}

impl RedirectDecision {
    /// Go back to the root of the current instance.
    pub fn root() -> Self {
        Self::InApp("/".to_string())
    }

    /// The location this decision leads to, starting from `current`.
    pub fn target(&self, current: &Location) -> Location {
        match self {
            Self::InApp(path) => current.with_path(path),
            Self::CrossOrigin(url) => Location::from(url.clone()),
        }
    }

    pub fn is_cross_origin(&self) -> bool {
        matches!(self, Self::CrossOrigin(_))
    }
}

/// Sends `identity` to its own role's landing page.
///
/// - `SinglePath`: always an in-app navigation to the landing path.
/// - `MultiOrigin`: a cross-origin navigation to the role's instance,
///   unless `current` already is that instance (same scheme, host and
///   port), in which case it's in-app.
///
/// A missing or malformed table entry is logged and resolves to `/`.
pub fn resolve_redirect(
    identity: &Identity,
    topology: Topology,
    apps: &AppTable,
    current: &Location,
) -> RedirectDecision {
    let role = identity.role;
    let Some(app) = apps.get(role) else {
        tracing::error!(%role, "no application configured for role, redirecting to root");
        return RedirectDecision::root();
    };

    match topology {
        Topology::SinglePath => RedirectDecision::InApp(app.landing_path()),
        Topology::MultiOrigin => match app.dev_landing_url() {
            Ok(target) if target.origin() == current.url().origin() => {
                RedirectDecision::InApp(target.path().to_string())
            }
            Ok(target) => {
                tracing::debug!(%role, %target, "redirecting to role instance");
                RedirectDecision::CrossOrigin(target)
            }
            Err(e) => {
                tracing::error!(error = %e, "invalid redirect target, redirecting to root");
                RedirectDecision::root()
            }
        },
    }
}
