//! Core identity types shared by every layer of the portal.
//!
//! There are three shapes here:
//!
//! - [`Role`] → which of the four portals a user belongs to.
//! - [`ProviderUser`] → the user record as the external identity provider
//!   reports it (before any merging).
//! - [`Identity`] → the canonical, normalized record that guards and
//!   request signing consume. Only [`normalize`](crate::normalize) builds it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::IdentityError;

/// Unmodified source fields, merged from the provider and the backend.
///
/// `serde_json::Map` keeps whatever the backend sent (profile picture,
/// company, department, ...) without this crate having to know about it.
pub type RawFields = serde_json::Map<String, serde_json::Value>;

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// The four portal roles.
///
/// Each role has its own application instance, its own login entry point
/// (`/{role}/login`) and its own landing page (`/{role}/dashboard`).
///
/// `#[serde(rename_all = "lowercase")]` matches the wire format: the
/// backend sends `"recruiter"`, not `"Recruiter"`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The default role. Also used for any unrecognized role string.
    #[default]
    Student,
    Mentor,
    Admin,
    Recruiter,
}

impl Role {
    /// Every role, in a stable order. Handy for building tables and for
    /// tests that must hold "for all roles".
    pub const ALL: [Role; 4] =
        [Role::Student, Role::Mentor, Role::Admin, Role::Recruiter];

    /// Parses a role the way identity normalization does: trimmed,
    /// case-insensitive, and anything unrecognized becomes `Student`.
    ///
    /// Use this for data coming from the outside world. Use
    /// [`FromStr`] when an unknown role should be an error (configuration).
    pub fn parse_lenient(value: &str) -> Role {
        match value.trim().to_ascii_lowercase().as_str() {
            "mentor" => Role::Mentor,
            "admin" => Role::Admin,
            "recruiter" => Role::Recruiter,
            "student" => Role::Student,
            other => {
                if !other.is_empty() {
                    tracing::debug!(role = other, "unrecognized role, treating as student");
                }
                Role::Student
            }
        }
    }

    /// The lower-case wire name (`"student"`, `"mentor"`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Mentor => "mentor",
            Role::Admin => "admin",
            Role::Recruiter => "recruiter",
        }
    }

    /// The capitalized name shown to users ("Continue to Mentor Dashboard").
    pub fn display_name(&self) -> &'static str {
        match self {
            Role::Student => "Student",
            Role::Mentor => "Mentor",
            Role::Admin => "Admin",
            Role::Recruiter => "Recruiter",
        }
    }

    /// The URL path prefix owned by this role, e.g. `/admin`.
    pub fn path_prefix(&self) -> String {
        format!("/{}", self.as_str())
    }

    /// The role's default landing page, e.g. `/admin/dashboard`.
    pub fn landing_path(&self) -> String {
        format!("/{}/dashboard", self.as_str())
    }

    /// The role's explicit login entry point, e.g. `/admin/login`.
    pub fn login_path(&self) -> String {
        format!("/{}/login", self.as_str())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strict parsing: unknown roles are an error.
impl FromStr for Role {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "mentor" => Ok(Role::Mentor),
            "admin" => Ok(Role::Admin),
            "recruiter" => Ok(Role::Recruiter),
            _ => Err(IdentityError::UnknownRole(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// ProviderUser
// ---------------------------------------------------------------------------

/// The user profile object exposed by the external identity provider.
///
/// Only the fields the portal reads are modeled. `public_metadata` is the
/// provider's free-form bag; the portal looks for a `role` key in it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderUser {
    /// The provider's stable user id.
    pub id: String,

    /// The address the user marked as primary, if any.
    #[serde(default)]
    pub primary_email: Option<String>,

    /// Every address on the account, in provider order.
    #[serde(default)]
    pub email_addresses: Vec<String>,

    #[serde(default)]
    pub first_name: Option<String>,

    #[serde(default)]
    pub last_name: Option<String>,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub public_metadata: RawFields,
}

impl ProviderUser {
    /// Primary email, falling back to the first listed address.
    pub fn email(&self) -> Option<&str> {
        self.primary_email
            .as_deref()
            .or_else(|| self.email_addresses.first().map(String::as_str))
    }

    /// The `role` entry of the public metadata bag, when it is a string.
    pub fn metadata_role(&self) -> Option<&str> {
        self.public_metadata.get("role").and_then(|v| v.as_str())
    }
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// The canonical "current user", produced once per reconciliation cycle.
///
/// Invariants (established by [`normalize`](crate::normalize), relied on by
/// every consumer):
/// - `name` is trimmed and never empty.
/// - `role` is always one of the four roles; unknown values became
///   `Student`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    /// Stable identifier from whichever source resolved first.
    pub id: String,

    /// The external identity provider's id, when that provider is active.
    pub external_id: Option<String>,

    /// Empty when neither source knew an address.
    pub email: String,

    pub name: String,

    pub role: Role,

    /// The merged source fields, passed through untouched.
    pub raw: RawFields,
}

impl Identity {
    /// Looks up a pass-through field such as `profilePicture` or `company`.
    pub fn field(&self, key: &str) -> Option<&serde_json::Value> {
        self.raw.get(key)
    }
}
