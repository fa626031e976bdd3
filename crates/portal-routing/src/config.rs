//! Deployment topology and the role → application table.

use std::fmt;
use std::str::FromStr;

use portal_identity::Role;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::RoutingError;

// ---------------------------------------------------------------------------
// Topology
// ---------------------------------------------------------------------------

/// How the four role applications are deployed.
///
/// - **MultiOrigin**: one process per role, told apart by network port
///   (local development). Moving to another role's application is a
///   full cross-origin navigation.
/// - **SinglePath**: one process serving every role, told apart by URL
///   path prefix (production). Moving between roles is an in-app
///   navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Topology {
    #[default]
    MultiOrigin,
    SinglePath,
}

impl Topology {
    pub fn is_multi_origin(&self) -> bool {
        matches!(self, Self::MultiOrigin)
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MultiOrigin => write!(f, "multi-origin"),
            Self::SinglePath => write!(f, "single-path"),
        }
    }
}

/// Accepts the canonical names plus the `dev`/`prod` shorthands used in
/// environment variables.
impl FromStr for Topology {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "multi-origin" | "dev" | "development" => Ok(Self::MultiOrigin),
            "single-path" | "prod" | "production" => Ok(Self::SinglePath),
            other => Err(format!("unknown topology {other:?}")),
        }
    }
}

// ---------------------------------------------------------------------------
// AppDescriptor
// ---------------------------------------------------------------------------

/// Where one role's application lives in each topology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppDescriptor {
    pub role: Role,

    /// Origin of the role's own process in development, with port
    /// (`http://localhost:5174`).
    pub dev_origin: String,

    /// Path prefix of the role inside the shared production process
    /// (`/admin`).
    pub prod_path: String,
}

impl AppDescriptor {
    /// The default descriptor for `role` in local development.
    pub fn local(role: Role, port: u16) -> Self {
        Self {
            role,
            dev_origin: format!("http://localhost:{port}"),
            prod_path: role.path_prefix(),
        }
    }

    /// The landing page path, `{prod_path}/dashboard`.
    pub fn landing_path(&self) -> String {
        format!("{}/dashboard", self.prod_path.trim_end_matches('/'))
    }

    /// The parsed development origin.
    ///
    /// # Errors
    /// [`RoutingError::MalformedOrigin`] if `dev_origin` isn't an
    /// absolute URL with a host.
    pub fn dev_url(&self) -> Result<Url, RoutingError> {
        let malformed = || RoutingError::MalformedOrigin {
            role: self.role,
            origin: self.dev_origin.clone(),
        };
        let url = Url::parse(&self.dev_origin).map_err(|_| malformed())?;
        if !url.has_host() {
            return Err(malformed());
        }
        Ok(url)
    }

    /// The development port, if the origin parses.
    pub fn dev_port(&self) -> Option<u16> {
        self.dev_url().ok()?.port_or_known_default()
    }

    /// Development origin joined with the landing path.
    pub fn dev_landing_url(&self) -> Result<Url, RoutingError> {
        let mut url = self.dev_url()?;
        url.set_path(&self.landing_path());
        Ok(url)
    }
}

// ---------------------------------------------------------------------------
// AppTable
// ---------------------------------------------------------------------------

/// The static role → application table.
///
/// Deserializes from configuration, e.g.:
///
/// ```json
/// { "apps": [ { "role": "admin", "dev_origin": "http://localhost:5174", "prod_path": "/admin" } ] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppTable {
    /// Public origin of the production deployment, when known. Only used
    /// to print absolute links; production redirects are path-only.
    #[serde(default)]
    pub prod_origin: Option<String>,

    pub apps: Vec<AppDescriptor>,
}

impl Default for AppTable {
    /// The local development ports: student 5173, admin 5174,
    /// recruiter 5175, mentor 5176.
    fn default() -> Self {
        Self {
            prod_origin: None,
            apps: vec![
                AppDescriptor::local(Role::Student, 5173),
                AppDescriptor::local(Role::Admin, 5174),
                AppDescriptor::local(Role::Recruiter, 5175),
                AppDescriptor::local(Role::Mentor, 5176),
            ],
        }
    }
}

impl AppTable {
    pub fn get(&self, role: Role) -> Option<&AppDescriptor> {
        self.apps.iter().find(|app| app.role == role)
    }

    /// Like [`get`](Self::get), but a missing role is an error.
    pub fn require(&self, role: Role) -> Result<&AppDescriptor, RoutingError> {
        self.get(role).ok_or(RoutingError::MissingApp(role))
    }

    /// The role whose development origin listens on `port`.
    pub fn role_for_port(&self, port: u16) -> Option<Role> {
        self.apps
            .iter()
            .find(|app| app.dev_port() == Some(port))
            .map(|app| app.role)
    }

    /// The role whose production prefix `path` falls under.
    ///
    /// Matches whole segments (`/admin` and `/admin/x`, not
    /// `/administrator`). Student owns everything else.
    pub fn role_for_path(&self, path: &str) -> Role {
        self.apps
            .iter()
            .filter(|app| app.role != Role::Student)
            .find(|app| {
                let prefix = app.prod_path.trim_end_matches('/');
                !prefix.is_empty()
                    && (path == prefix
                        || path
                            .strip_prefix(prefix)
                            .is_some_and(|rest| rest.starts_with('/')))
            })
            .map(|app| app.role)
            .unwrap_or(Role::Student)
    }

    /// Absolute landing URL for `role` in `topology`, for display.
    ///
    /// # Errors
    /// - [`RoutingError::MissingApp`] if `role` has no entry.
    /// - [`RoutingError::MalformedOrigin`] if the relevant origin is
    ///   unusable, or `SinglePath` has no `prod_origin`.
    pub fn landing_url(&self, role: Role, topology: Topology) -> Result<Url, RoutingError> {
        let app = self.require(role)?;
        match topology {
            Topology::MultiOrigin => app.dev_landing_url(),
            Topology::SinglePath => {
                let origin = self.prod_origin.as_deref().unwrap_or_default();
                let mut url = Url::parse(origin).map_err(|_| RoutingError::MalformedOrigin {
                    role,
                    origin: origin.to_string(),
                })?;
                url.set_path(&app.landing_path());
                Ok(url)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_table_default_dev_ports() {
        let table = AppTable::default();
        assert_eq!(table.role_for_port(5173), Some(Role::Student));
        assert_eq!(table.role_for_port(5174), Some(Role::Admin));
        assert_eq!(table.role_for_port(5175), Some(Role::Recruiter));
        assert_eq!(table.role_for_port(5176), Some(Role::Mentor));
        assert_eq!(table.role_for_port(8080), None);
    }

    #[test]
    fn test_app_table_role_for_path_matches_whole_segments() {
        let table = AppTable::default();
        assert_eq!(table.role_for_path("/admin"), Role::Admin);
        assert_eq!(table.role_for_path("/admin/students/4"), Role::Admin);
        assert_eq!(table.role_for_path("/mentor/dashboard"), Role::Mentor);
        assert_eq!(table.role_for_path("/administrator"), Role::Student);
        assert_eq!(table.role_for_path("/"), Role::Student);
        assert_eq!(table.role_for_path("/ai-interview"), Role::Student);
    }

    #[test]
    fn test_app_descriptor_dev_landing_url() {
        let app = AppDescriptor::local(Role::Recruiter, 5175);
        assert_eq!(
            app.dev_landing_url().unwrap().as_str(),
            "http://localhost:5175/recruiter/dashboard"
        );
    }

    #[test]
    fn test_app_descriptor_malformed_origin_is_error() {
        let app = AppDescriptor {
            role: Role::Admin,
            dev_origin: "localhost:5174".into(),
            prod_path: "/admin".into(),
        };
        assert!(matches!(
            app.dev_landing_url(),
            Err(RoutingError::MalformedOrigin { role: Role::Admin, .. })
        ));
        assert_eq!(app.dev_port(), None);
    }

    #[test]
    fn test_landing_url_single_path_uses_prod_origin() {
        let table = AppTable {
            prod_origin: Some("https://placements.example.edu".into()),
            ..AppTable::default()
        };
        assert_eq!(
            table.landing_url(Role::Mentor, Topology::SinglePath).unwrap().as_str(),
            "https://placements.example.edu/mentor/dashboard"
        );
        assert!(AppTable::default().landing_url(Role::Mentor, Topology::SinglePath).is_err());
    }

    #[test]
    fn test_app_table_deserializes_from_json() {
        let json = r#"{
            "apps": [
                { "role": "student", "dev_origin": "http://127.0.0.1:3000", "prod_path": "/student" },
                { "role": "admin", "dev_origin": "http://127.0.0.1:3001", "prod_path": "/staff" }
            ]
        }"#;
        let table: AppTable = serde_json::from_str(json).unwrap();
        assert_eq!(table.role_for_port(3001), Some(Role::Admin));
        assert_eq!(table.role_for_path("/staff/x"), Role::Admin);
        assert_eq!(table.get(Role::Admin).unwrap().landing_path(), "/staff/dashboard");
        assert!(table.get(Role::Mentor).is_none());
    }

    #[test]
    fn test_topology_from_str_accepts_shorthands() {
        assert_eq!("dev".parse::<Topology>(), Ok(Topology::MultiOrigin));
        assert_eq!("PROD".parse::<Topology>(), Ok(Topology::SinglePath));
        assert_eq!("single-path".parse::<Topology>(), Ok(Topology::SinglePath));
        assert!("staging".parse::<Topology>().is_err());
        assert_eq!(Topology::MultiOrigin.to_string(), "multi-origin");
    }
}
