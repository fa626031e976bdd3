//! Identity normalization: turning one or two loosely-shaped records into
//! a single [`Identity`].
//!
//! Two sources can describe the same person:
//!
//! 1. The external identity provider ([`ProviderUser`]) → always has an id,
//!    usually an email and a name, sometimes a `role` in its metadata.
//! 2. The backend's own profile (`GET /auth/profile`) → the authoritative
//!    record, with whatever extra fields the backend stores.
//!
//! The backend record wins field-by-field; the provider record fills the
//! gaps. All fallback logic lives here so no consumer ever has to guess a
//! missing name or role.

use serde_json::Value;

use crate::{Identity, ProviderUser, RawFields, Role};

/// Name used when no source provides anything better.
const DEFAULT_NAME: &str = "Student";

/// Builds the provider-derived fallback record for a provider user.
///
/// The record uses the backend's field names (`id`, `email`, `name`,
/// `role`) so it can be merged under a backend profile. `externalId` keeps
/// the provider id even when the backend supplies its own `id`.
pub fn provider_fallback(user: &ProviderUser) -> RawFields {
    let mut fields = RawFields::new();
    fields.insert("id".into(), Value::String(user.id.clone()));
    fields.insert("externalId".into(), Value::String(user.id.clone()));

    let email = user.email();
    if let Some(email) = email {
        fields.insert("email".into(), Value::String(email.to_string()));
    }

    let name = derive_display_name(
        user.first_name.as_deref(),
        user.last_name.as_deref(),
        user.username.as_deref(),
        email,
    );
    fields.insert("name".into(), Value::String(name));

    if let Some(role) = user.metadata_role() {
        fields.insert("role".into(), Value::String(role.to_string()));
    }

    fields
}

/// Derives a display name with a fixed precedence:
/// `first + " " + last` → `username` → email local part → `"Student"`.
///
/// Blank parts are skipped, so a user with only a last name still gets it.
pub fn derive_display_name(
    first: Option<&str>,
    last: Option<&str>,
    username: Option<&str>,
    email: Option<&str>,
) -> String {
    let full: Vec<&str> = [first, last]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();
    if !full.is_empty() {
        return full.join(" ");
    }

    let local_part = email.and_then(|e| e.trim().split('@').next());
    [username, local_part]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .unwrap_or(DEFAULT_NAME)
        .to_string()
}

/// Merges a backend profile over a provider fallback and normalizes the
/// result.
///
/// Returns `None` only when both inputs are `None`. Otherwise the result
/// always satisfies the [`Identity`] invariants:
/// - `role` comes from the merged `role` field, lower-cased; missing or
///   unrecognized values become [`Role::Student`].
/// - `name` is the merged `name` (trimmed), else the local part of the
///   email, else `"Student"`.
pub fn normalize(
    profile: Option<&RawFields>,
    fallback: Option<&RawFields>,
) -> Option<Identity> {
    if profile.is_none() && fallback.is_none() {
        return None;
    }

    let mut merged = fallback.cloned().unwrap_or_default();
    if let Some(profile) = profile {
        // Later keys win, same as an object spread.
        for (key, value) in profile {
            merged.insert(key.clone(), value.clone());
        }
    }

    let role = string_field(&merged, "role")
        .map(Role::parse_lenient)
        .unwrap_or_default();

    let email = string_field(&merged, "email")
        .map(|e| e.trim().to_string())
        .unwrap_or_default();

    let name = string_field(&merged, "name")
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .or_else(|| {
            email
                .split('@')
                .next()
                .filter(|local| !local.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| DEFAULT_NAME.to_string());

    let external_id = id_field(&merged, "externalId")
        .or_else(|| id_field(&merged, "clerkId"));

    // MongoDB-backed profiles sometimes only carry `_id`.
    let id = id_field(&merged, "id")
        .or_else(|| id_field(&merged, "_id"))
        .or_else(|| external_id.clone())
        .unwrap_or_else(|| email.clone());

    Some(Identity {
        id,
        external_id,
        email,
        name,
        role,
        raw: merged,
    })
}

fn string_field<'a>(fields: &'a RawFields, key: &str) -> Option<&'a str> {
    fields.get(key).and_then(Value::as_str)
}

/// Ids arrive as strings from most sources, as numbers from some
/// seeded test accounts.
fn id_field(fields: &RawFields, key: &str) -> Option<String> {
    match fields.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn fields(value: serde_json::Value) -> RawFields {
        match value {
            Value::Object(map) => map,
            _ => panic!("test fixture must be an object"),
        }
    }

    fn provider_user() -> ProviderUser {
        ProviderUser {
            id: "user_2abc".into(),
            primary_email: Some("priya@campus.edu".into()),
            first_name: Some(" Priya ".into()),
            last_name: Some("Sharma".into()),
            ..ProviderUser::default()
        }
    }

    // =====================================================================
    // derive_display_name()
    // =====================================================================

    #[test]
    fn test_derive_display_name_prefers_first_and_last() {
        let name = derive_display_name(
            Some("Ada"),
            Some("Lovelace"),
            Some("ada"),
            Some("ada@campus.edu"),
        );
        assert_eq!(name, "Ada Lovelace");
    }

    #[test]
    fn test_derive_display_name_skips_blank_parts() {
        let name = derive_display_name(Some("  "), Some("Lovelace"), None, None);
        assert_eq!(name, "Lovelace");
    }

    #[test]
    fn test_derive_display_name_falls_through_to_username_then_email() {
        assert_eq!(
            derive_display_name(None, None, Some("ada99"), Some("a@x.io")),
            "ada99"
        );
        assert_eq!(derive_display_name(None, None, None, Some("a@x.io")), "a");
        assert_eq!(derive_display_name(None, None, None, None), "Student");
    }

    // =====================================================================
    // provider_fallback()
    // =====================================================================

    #[test]
    fn test_provider_fallback_carries_id_email_and_name() {
        let fallback = provider_fallback(&provider_user());

        assert_eq!(fallback["id"], json!("user_2abc"));
        assert_eq!(fallback["externalId"], json!("user_2abc"));
        assert_eq!(fallback["email"], json!("priya@campus.edu"));
        assert_eq!(fallback["name"], json!("Priya Sharma"));
        assert!(!fallback.contains_key("role"));
    }

    #[test]
    fn test_provider_fallback_includes_metadata_role() {
        let mut user = provider_user();
        user.public_metadata.insert("role".into(), json!("Recruiter"));

        let fallback = provider_fallback(&user);

        assert_eq!(fallback["role"], json!("Recruiter"));
    }

    // =====================================================================
    // normalize()
    // =====================================================================

    #[test]
    fn test_normalize_both_none_returns_none() {
        assert!(normalize(None, None).is_none());
    }

    #[test]
    fn test_normalize_profile_overrides_fallback() {
        let fallback = provider_fallback(&provider_user());
        let profile = fields(json!({
            "id": "65f0c0ffee",
            "email": "priya@campus.edu",
            "name": "Priya S.",
            "role": "MENTOR",
            "department": "CSE",
        }));

        let identity = normalize(Some(&profile), Some(&fallback)).unwrap();

        assert_eq!(identity.id, "65f0c0ffee");
        assert_eq!(identity.external_id.as_deref(), Some("user_2abc"));
        assert_eq!(identity.name, "Priya S.");
        assert_eq!(identity.role, Role::Mentor);
        assert_eq!(identity.field("department"), Some(&json!("CSE")));
    }

    #[test]
    fn test_normalize_missing_role_defaults_to_student() {
        let profile = fields(json!({ "id": "1", "email": "x@campus.edu" }));

        let identity = normalize(Some(&profile), None).unwrap();

        assert_eq!(identity.role, Role::Student);
    }

    #[test]
    fn test_normalize_unknown_role_defaults_to_student() {
        let profile = fields(json!({ "id": "1", "role": "placement-cell" }));

        let identity = normalize(Some(&profile), None).unwrap();

        assert_eq!(identity.role, Role::Student);
    }

    #[test]
    fn test_normalize_missing_name_uses_email_local_part() {
        let profile = fields(json!({ "id": "1", "email": "rahul.k@campus.edu" }));

        let identity = normalize(Some(&profile), None).unwrap();

        assert_eq!(identity.name, "rahul.k");
    }

    #[test]
    fn test_normalize_blank_name_and_no_email_uses_default() {
        let profile = fields(json!({ "id": "1", "name": "   " }));

        let identity = normalize(Some(&profile), None).unwrap();

        assert_eq!(identity.name, "Student");
        assert_eq!(identity.email, "");
    }

    #[test]
    fn test_normalize_mongo_style_id_and_numeric_ids() {
        let mongo = fields(json!({ "_id": "64aa", "email": "m@campus.edu" }));
        assert_eq!(normalize(Some(&mongo), None).unwrap().id, "64aa");

        let numeric = fields(json!({ "id": 17 }));
        assert_eq!(normalize(Some(&numeric), None).unwrap().id, "17");
    }

    #[test]
    fn test_normalize_fallback_only_keeps_provider_identity() {
        let fallback = provider_fallback(&provider_user());

        let identity = normalize(None, Some(&fallback)).unwrap();

        assert_eq!(identity.id, "user_2abc");
        assert_eq!(identity.name, "Priya Sharma");
        assert_eq!(identity.role, Role::Student);
    }

    #[test]
    fn test_normalize_email_only_provider_user_uses_local_part() {
        let user = ProviderUser {
            id: "user_1".into(),
            primary_email: Some("jane.doe@campus.edu".into()),
            ..ProviderUser::default()
        };

        let identity = normalize(None, Some(&provider_fallback(&user))).unwrap();

        assert_eq!(identity.name, "jane.doe");
        assert_eq!(identity.email, "jane.doe@campus.edu");
    }

    #[test]
    fn test_normalize_is_deterministic() {
        let fallback = provider_fallback(&provider_user());
        let profile = fields(json!({ "id": "9", "role": "admin" }));

        let a = normalize(Some(&profile), Some(&fallback));
        let b = normalize(Some(&profile), Some(&fallback));

        assert_eq!(a, b);
    }
}
