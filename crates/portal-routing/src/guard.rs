//! The route guard: given the session and a location, decide what to show.
//!
//! # Decision order
//!
//! ```text
//! loading?  ── yes ──→ Pending
//!    │ no
//!    ▼
//! classify(path)
//!    ├─ Home          → home_route()
//!    ├─ Login         → login form for this instance, or redirect home
//!    ├─ RoleLogin(B)  → login form for B, or Conflict(A → B), or redirect
//!    ├─ Guarded(R)    → GuardState decides: render / login / redirect
//!    ├─ Public        → render
//!    └─ Unknown       → redirect to /
//! ```
//!
//! The guard is pure: it reads a [`SessionState`] snapshot and never
//! performs I/O. The host application performs the returned navigation.

use portal_identity::{Identity, Role};
use portal_session::SessionState;

use crate::routes::{PublicPage, Route, classify, instance_role};
use crate::{AppTable, Location, RedirectDecision, SessionConflict, Topology, resolve_redirect};

// ---------------------------------------------------------------------------
// GuardState
// ---------------------------------------------------------------------------

/// How an identity relates to a role-guarded view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Unauthenticated,
    AuthenticatedMatchingRole,
    AuthenticatedMismatchedRole,
}

impl GuardState {
    /// Compares `identity` with the role a view requires.
    ///
    /// In `MultiOrigin` the instance must also be the user's own: a user
    /// on another role's instance is mismatched even if the view's role
    /// happens to be theirs.
    pub fn classify(
        identity: Option<&Identity>,
        required: Role,
        instance: Role,
        topology: Topology,
    ) -> Self {
        let Some(identity) = identity else {
            return Self::Unauthenticated;
        };
        if topology.is_multi_origin() && identity.role != instance {
            return Self::AuthenticatedMismatchedRole;
        }
        if identity.role != required {
            return Self::AuthenticatedMismatchedRole;
        }
        Self::AuthenticatedMatchingRole
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// A page the host application should render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Page {
    /// The public student landing page.
    Landing,
    /// The login form for a role.
    LoginForm(Role),
    /// A role-guarded view, at `path`.
    View { role: Role, path: String },
    Public(PublicPage),
}

/// The guard's decision for one location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Reconciliation hasn't finished. Show a placeholder.
    Pending,
    Render(Page),
    Redirect(RedirectDecision),
    Conflict(SessionConflict),
}

// ---------------------------------------------------------------------------
// RouteGuard
// ---------------------------------------------------------------------------

/// Evaluates locations against the route table for one deployment.
#[derive(Debug, Clone, Default)]
pub struct RouteGuard {
    topology: Topology,
    apps: AppTable,
}

impl RouteGuard {
    pub fn new(topology: Topology, apps: AppTable) -> Self {
        Self { topology, apps }
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn apps(&self) -> &AppTable {
        &self.apps
    }

    /// The role of the instance serving `location`.
    pub fn instance_role(&self, location: &Location) -> Role {
        instance_role(location, self.topology, &self.apps)
    }

    /// Decides what to do with `location` given `state`.
    pub fn evaluate(&self, state: &SessionState, location: &Location) -> Outcome {
        if state.loading {
            return Outcome::Pending;
        }

        let identity = state.identity.as_ref();
        let instance = self.instance_role(location);
        let route = classify(location.path());

        let outcome = match route {
            Route::Home => self.home_route(identity, instance, location),
            Route::Login => match identity {
                None => Outcome::Render(Page::LoginForm(instance)),
                Some(identity) => self.redirect(identity, location),
            },
            Route::RoleLogin(target) => match identity {
                None => Outcome::Render(Page::LoginForm(target)),
                Some(identity) if identity.role == target => self.redirect(identity, location),
                Some(identity) => Outcome::Conflict(SessionConflict::new(identity, target)),
            },
            Route::Guarded(required) => self.guarded(identity, required, instance, location),
            Route::Public(page) => Outcome::Render(Page::Public(page)),
            Route::Unknown => Outcome::Redirect(RedirectDecision::root()),
        };

        tracing::debug!(
            path = location.path(),
            %instance,
            ?route,
            ?outcome,
            "route evaluated"
        );
        outcome
    }

    /// The root path.
    ///
    /// The student instance has a public landing page. Other instances
    /// send signed-in users to their dashboard and everyone else to the
    /// instance's login form.
    ///
    /// In `SinglePath` the root has no role prefix, so the shared process
    /// acts as the signed-in user's own instance (student when anonymous).
    pub fn home_route(
        &self,
        identity: Option<&Identity>,
        instance: Role,
        location: &Location,
    ) -> Outcome {
        let instance = match (self.topology, identity) {
            (Topology::SinglePath, Some(identity)) => identity.role,
            _ => instance,
        };
        if instance == Role::Student {
            return Outcome::Render(Page::Landing);
        }
        match identity {
            Some(identity) => self.redirect(identity, location),
            None => Outcome::Redirect(RedirectDecision::InApp(instance.login_path())),
        }
    }

    fn guarded(
        &self,
        identity: Option<&Identity>,
        required: Role,
        instance: Role,
        location: &Location,
    ) -> Outcome {
        // Development instances only mount their own role's views.
        if self.topology.is_multi_origin() && required != instance {
            return Outcome::Redirect(RedirectDecision::root());
        }

        match GuardState::classify(identity, required, instance, self.topology) {
            GuardState::Unauthenticated => {
                Outcome::Redirect(RedirectDecision::InApp(required.login_path()))
            }
            GuardState::AuthenticatedMatchingRole => Outcome::Render(Page::View {
                role: required,
                path: location.path().to_string(),
            }),
            GuardState::AuthenticatedMismatchedRole => match identity {
                Some(identity) => self.redirect(identity, location),
                None => Outcome::Redirect(RedirectDecision::root()),
            },
        }
    }

    fn redirect(&self, identity: &Identity, location: &Location) -> Outcome {
        Outcome::Redirect(resolve_redirect(identity, self.topology, &self.apps, location))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(role: Role) -> Identity {
        Identity {
            id: format!("{role}-1"),
            external_id: None,
            email: format!("{role}@x.edu"),
            name: "Test User".into(),
            role,
            raw: Default::default(),
        }
    }

    fn signed_in(role: Role) -> SessionState {
        SessionState::settled(Some(identity(role)), true)
    }

    fn at(url: &str) -> Location {
        Location::parse(url).unwrap()
    }

    fn prod() -> RouteGuard {
        RouteGuard::new(Topology::SinglePath, AppTable::default())
    }

    fn dev() -> RouteGuard {
        RouteGuard::new(Topology::MultiOrigin, AppTable::default())
    }

    #[test]
    fn test_guard_state_classify() {
        let admin = identity(Role::Admin);
        assert_eq!(
            GuardState::classify(None, Role::Admin, Role::Admin, Topology::SinglePath),
            GuardState::Unauthenticated
        );
        assert_eq!(
            GuardState::classify(Some(&admin), Role::Admin, Role::Student, Topology::SinglePath),
            GuardState::AuthenticatedMatchingRole
        );
        assert_eq!(
            GuardState::classify(Some(&admin), Role::Admin, Role::Student, Topology::MultiOrigin),
            GuardState::AuthenticatedMismatchedRole
        );
        assert_eq!(
            GuardState::classify(Some(&admin), Role::Mentor, Role::Mentor, Topology::SinglePath),
            GuardState::AuthenticatedMismatchedRole
        );
    }

    #[test]
    fn test_evaluate_loading_is_always_pending() {
        let loading = SessionState::default();
        for path in ["/", "/login", "/admin/login", "/admin/dashboard", "/nope", "/resume/view/1"] {
            let outcome = prod().evaluate(&loading, &at(&format!("https://p.edu{path}")));
            assert_eq!(outcome, Outcome::Pending, "path {path}");
        }
    }

    #[test]
    fn test_evaluate_unauthenticated_guarded_redirects_to_role_login() {
        let outcome = prod().evaluate(
            &SessionState::signed_out(true),
            &at("https://p.edu/admin/dashboard"),
        );
        assert_eq!(
            outcome,
            Outcome::Redirect(RedirectDecision::InApp("/admin/login".into()))
        );
    }

    #[test]
    fn test_evaluate_every_role_renders_own_view_and_never_others() {
        for role in Role::ALL {
            let state = signed_in(role);
            for view in Role::ALL {
                let loc = at(&format!("https://p.edu{}", view.landing_path()));
                let outcome = prod().evaluate(&state, &loc);
                if view == role {
                    assert!(matches!(outcome, Outcome::Render(Page::View { role: r, .. }) if r == role));
                } else {
                    assert_eq!(
                        outcome,
                        Outcome::Redirect(RedirectDecision::InApp(role.landing_path())),
                        "{role} visiting {view}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_evaluate_dev_wrong_instance_redirects_cross_origin() {
        // Student signed in, on the admin instance, asking for a student
        // view: the admin instance doesn't mount it.
        let outcome = dev().evaluate(
            &signed_in(Role::Student),
            &at("http://localhost:5174/admin/dashboard"),
        );
        let Outcome::Redirect(RedirectDecision::CrossOrigin(url)) = outcome else {
            panic!("expected cross-origin redirect, got {outcome:?}");
        };
        assert_eq!(url.as_str(), "http://localhost:5173/student/dashboard");
    }

    #[test]
    fn test_evaluate_dev_foreign_view_is_unknown_route() {
        let outcome = dev().evaluate(
            &signed_in(Role::Admin),
            &at("http://localhost:5174/student/dashboard"),
        );
        assert_eq!(outcome, Outcome::Redirect(RedirectDecision::root()));
    }

    #[test]
    fn test_evaluate_generic_login_uses_instance_role() {
        let outcome = dev().evaluate(
            &SessionState::signed_out(true),
            &at("http://localhost:5176/login"),
        );
        assert_eq!(outcome, Outcome::Render(Page::LoginForm(Role::Mentor)));
    }

    #[test]
    fn test_evaluate_generic_login_signed_in_redirects_home() {
        let outcome = prod().evaluate(&signed_in(Role::Recruiter), &at("https://p.edu/login"));
        assert_eq!(
            outcome,
            Outcome::Redirect(RedirectDecision::InApp("/recruiter/dashboard".into()))
        );
    }

    #[test]
    fn test_evaluate_role_login_conflict_and_same_role() {
        let mentor = signed_in(Role::Mentor);

        let conflict = prod().evaluate(&mentor, &at("https://p.edu/recruiter/login"));
        let Outcome::Conflict(conflict) = conflict else {
            panic!("expected conflict, got {conflict:?}");
        };
        assert_eq!(conflict.current, Role::Mentor);
        assert_eq!(conflict.target, Role::Recruiter);

        let same = prod().evaluate(&mentor, &at("https://p.edu/mentor/login"));
        assert_eq!(
            same,
            Outcome::Redirect(RedirectDecision::InApp("/mentor/dashboard".into()))
        );
    }

    #[test]
    fn test_evaluate_role_login_unauthenticated_renders_form() {
        let outcome = prod().evaluate(&SessionState::signed_out(true), &at("https://p.edu/admin/login"));
        assert_eq!(outcome, Outcome::Render(Page::LoginForm(Role::Admin)));
    }

    #[test]
    fn test_home_route_student_instance_is_landing() {
        let guard = dev();
        let loc = at("http://localhost:5173/");
        assert_eq!(guard.evaluate(&signed_in(Role::Admin), &loc), Outcome::Render(Page::Landing));
        assert_eq!(
            guard.evaluate(&SessionState::signed_out(true), &loc),
            Outcome::Render(Page::Landing)
        );
    }

    #[test]
    fn test_home_route_single_path_follows_signed_in_role() {
        let root = at("https://p.edu/");
        assert_eq!(
            prod().evaluate(&signed_in(Role::Mentor), &root),
            Outcome::Redirect(RedirectDecision::InApp("/mentor/dashboard".into()))
        );
        assert_eq!(prod().evaluate(&signed_in(Role::Student), &root), Outcome::Render(Page::Landing));
        assert_eq!(
            prod().evaluate(&SessionState::signed_out(true), &root),
            Outcome::Render(Page::Landing)
        );
    }

    #[test]
    fn test_home_route_other_instance_unauthenticated_goes_to_login() {
        let outcome = dev().evaluate(&SessionState::signed_out(true), &at("http://localhost:5175/"));
        assert_eq!(
            outcome,
            Outcome::Redirect(RedirectDecision::InApp("/recruiter/login".into()))
        );
    }

    #[test]
    fn test_home_route_other_instance_authenticated_redirects() {
        let outcome = dev().evaluate(&signed_in(Role::Admin), &at("http://localhost:5174/"));
        assert_eq!(
            outcome,
            Outcome::Redirect(RedirectDecision::InApp("/admin/dashboard".into()))
        );
    }

    #[test]
    fn test_evaluate_public_pages_render_for_anyone() {
        let guard = dev();
        for state in [SessionState::signed_out(true), signed_in(Role::Recruiter)] {
            assert_eq!(
                guard.evaluate(&state, &at("http://localhost:5174/mentor/evaluate/ipp1")),
                Outcome::Render(Page::Public(PublicPage::MentorEvaluation))
            );
        }
    }

    #[test]
    fn test_evaluate_unknown_route_goes_to_root() {
        let outcome = prod().evaluate(&signed_in(Role::Student), &at("https://p.edu/nowhere"));
        assert_eq!(outcome, Outcome::Redirect(RedirectDecision::root()));
    }
}
