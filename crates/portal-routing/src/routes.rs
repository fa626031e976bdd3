//! The portal's static route table.
//!
//! Every path falls into exactly one [`Route`]:
//!
//! ```text
//! /                                  → Home
//! /login                             → Login (form for this instance's role)
//! /{role}/login                      → RoleLogin(role)
//! /mentor/evaluate/:id               → Public
//! /mentor/evaluation-success         → Public
//! /resume/view/:id                   → Public
//! /{role}/<anything else>            → Guarded(role)
//! /ai-interview, /ai-interview/...   → Guarded(student)
//! everything else                    → Unknown (sent to /)
//! ```
//!
//! Public pages are checked before guarded ones, so the evaluation pages
//! under `/mentor` stay reachable for company mentors without an account.

use portal_identity::{Identity, Role};

use crate::{AppTable, Location, Topology};

/// Pages anyone can open, signed in or not, on any instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicPage {
    /// `/mentor/evaluate/:id`: a company mentor grading an internship.
    MentorEvaluation,
    /// `/mentor/evaluation-success`
    EvaluationSuccess,
    /// `/resume/view/:id`: a shared resume.
    ResumeView,
}

/// What a path refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    Login,
    RoleLogin(Role),
    Guarded(Role),
    Public(PublicPage),
    Unknown,
}

/// Classifies `path`. A trailing slash is ignored.
pub fn classify(path: &str) -> Route {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return Route::Home;
    }

    let segments: Vec<&str> = trimmed.trim_start_matches('/').split('/').collect();
    match segments.as_slice() {
        ["login"] => Route::Login,
        ["mentor", "evaluate", id] if !id.is_empty() => Route::Public(PublicPage::MentorEvaluation),
        ["mentor", "evaluation-success"] => Route::Public(PublicPage::EvaluationSuccess),
        ["resume", "view", id] if !id.is_empty() => Route::Public(PublicPage::ResumeView),
        ["ai-interview", ..] => Route::Guarded(Role::Student),
        [prefix, "login"] => match prefix.parse::<Role>() {
            Ok(role) if role.as_str() == *prefix => Route::RoleLogin(role),
            _ => Route::Unknown,
        },
        [prefix, rest @ ..] if !rest.is_empty() && rest.iter().all(|s| !s.is_empty()) => {
            // Only exact lower-case prefixes; `/Admin/...` is not a route.
            match prefix.parse::<Role>() {
                Ok(role) if role.as_str() == *prefix => Route::Guarded(role),
                _ => Route::Unknown,
            }
        }
        _ => Route::Unknown,
    }
}

/// Which role's application instance is serving `location`.
///
/// In `MultiOrigin` the port decides, through the app table. An unknown
/// port, and every `SinglePath` location, falls back to the path prefix.
pub fn instance_role(location: &Location, topology: Topology, apps: &AppTable) -> Role {
    if topology.is_multi_origin() {
        if let Some(role) = location.port().and_then(|port| apps.role_for_port(port)) {
            return role;
        }
        tracing::debug!(location = %location, "port not in app table, detecting instance by path");
    }
    apps.role_for_path(location.path())
}

/// Whether the signed-in navigation bar is shown.
///
/// Hidden when nobody is signed in, on the student landing page, and on
/// the public mentor evaluation pages.
pub fn show_chrome(path: &str, identity: Option<&Identity>, instance: Role) -> bool {
    if identity.is_none() {
        return false;
    }
    let landing = classify(path) == Route::Home && instance == Role::Student;
    let public_mentor = matches!(
        classify(path),
        Route::Public(PublicPage::MentorEvaluation | PublicPage::EvaluationSuccess)
    );
    !landing && !public_mentor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_entry_points() {
        assert_eq!(classify("/"), Route::Home);
        assert_eq!(classify(""), Route::Home);
        assert_eq!(classify("/login"), Route::Login);
        assert_eq!(classify("/login/"), Route::Login);
        assert_eq!(classify("/admin/login"), Route::RoleLogin(Role::Admin));
        assert_eq!(classify("/student/login"), Route::RoleLogin(Role::Student));
    }

    #[test]
    fn test_classify_guarded_views() {
        assert_eq!(classify("/student/dashboard"), Route::Guarded(Role::Student));
        assert_eq!(classify("/admin/students/42/resumes"), Route::Guarded(Role::Admin));
        assert_eq!(classify("/recruiter/ipp/9"), Route::Guarded(Role::Recruiter));
        assert_eq!(classify("/mentor/calendar"), Route::Guarded(Role::Mentor));
        assert_eq!(classify("/ai-interview"), Route::Guarded(Role::Student));
        assert_eq!(classify("/ai-interview/feedback/3"), Route::Guarded(Role::Student));
    }

    #[test]
    fn test_classify_public_pages_beat_mentor_guard() {
        assert_eq!(
            classify("/mentor/evaluate/ipp-77"),
            Route::Public(PublicPage::MentorEvaluation)
        );
        assert_eq!(
            classify("/mentor/evaluation-success"),
            Route::Public(PublicPage::EvaluationSuccess)
        );
        assert_eq!(classify("/resume/view/abc"), Route::Public(PublicPage::ResumeView));
    }

    #[test]
    fn test_classify_unknown_paths() {
        assert_eq!(classify("/admin"), Route::Unknown);
        assert_eq!(classify("/Admin/dashboard"), Route::Unknown);
        assert_eq!(classify("/faculty/dashboard"), Route::Unknown);
        assert_eq!(classify("/resume/view"), Route::Unknown);
        assert_eq!(classify("/admin//x"), Route::Unknown);
        assert_eq!(classify("/super/login"), Route::Unknown);
    }

    #[test]
    fn test_instance_role_multi_origin_uses_port() {
        let apps = AppTable::default();
        let loc = Location::parse("http://localhost:5175/").unwrap();
        assert_eq!(instance_role(&loc, Topology::MultiOrigin, &apps), Role::Recruiter);

        // Port wins over path in development.
        let loc = Location::parse("http://localhost:5173/admin/login").unwrap();
        assert_eq!(instance_role(&loc, Topology::MultiOrigin, &apps), Role::Student);
    }

    #[test]
    fn test_instance_role_unknown_port_falls_back_to_path() {
        let apps = AppTable::default();
        let loc = Location::parse("http://localhost:9999/mentor/login").unwrap();
        assert_eq!(instance_role(&loc, Topology::MultiOrigin, &apps), Role::Mentor);
    }

    #[test]
    fn test_instance_role_single_path_uses_prefix() {
        let apps = AppTable::default();
        let admin = Location::parse("https://portal.example.edu/admin/dashboard").unwrap();
        let root = Location::parse("https://portal.example.edu/").unwrap();
        assert_eq!(instance_role(&admin, Topology::SinglePath, &apps), Role::Admin);
        assert_eq!(instance_role(&root, Topology::SinglePath, &apps), Role::Student);
    }
}
