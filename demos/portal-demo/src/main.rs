use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use http::StatusCode;
use placement_portal::prelude::*;
use placement_portal::transport::TransportError;
use serde_json::{Value, json};

// ---------------------------------------------------------------------------
// In-process provider and backend
// ---------------------------------------------------------------------------

/// A provider that boots instantly and never holds a session, so every
/// login goes to the backend's own endpoint.
#[derive(Default)]
struct OfflineProvider {
    booted: AtomicBool,
}

impl ExternalProvider for OfflineProvider {
    fn is_ready(&self) -> bool {
        self.booted.load(Ordering::SeqCst)
    }

    fn has_active_session(&self) -> bool {
        false
    }

    fn user(&self) -> Option<ProviderUser> {
        None
    }

    async fn get_token(&self) -> Result<Option<String>, ProviderError> {
        Ok(None)
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}

/// Seeded accounts: `(email, password, token, user)`.
struct DemoBackend {
    accounts: Vec<(&'static str, &'static str, &'static str, Value)>,
    calls: Mutex<u32>,
}

impl DemoBackend {
    fn seeded() -> Self {
        Self {
            accounts: vec![
                ("asha@college.edu", "student123", "tok-student",
                 json!({ "id": "s-1", "email": "asha@college.edu", "name": "Asha Rao", "role": "student" })),
                ("iyer@college.edu", "mentor123", "tok-mentor",
                 json!({ "id": "m-1", "email": "iyer@college.edu", "name": "Meera Iyer", "role": "mentor" })),
                ("hr@acme.com", "recruiter123", "tok-recruiter",
                 json!({ "id": "r-1", "email": "hr@acme.com", "name": "Acme HR", "role": "recruiter" })),
            ],
            calls: Mutex::new(0),
        }
    }

    fn user_for_token(&self, token: &str) -> Option<&Value> {
        self.accounts.iter().find(|a| a.2 == token).map(|a| &a.3)
    }
}

impl HttpTransport for DemoBackend {
    async fn execute(&self, request: Request) -> Result<Response, TransportError> {
        if let Ok(mut calls) = self.calls.lock() {
            *calls += 1;
        }
        tracing::debug!(method = %request.method, url = %request.url, "demo backend request");

        if request.url.ends_with("/auth/login") {
            let body = request.body.unwrap_or_default();
            let account = self
                .accounts
                .iter()
                .find(|a| body["email"] == a.0 && body["password"] == a.1);
            return match account {
                Some((_, _, token, user)) => {
                    Response::json(StatusCode::OK, &json!({ "token": token, "user": user }))
                }
                None => Response::json(
                    StatusCode::UNAUTHORIZED,
                    &json!({ "error": "Invalid credentials" }),
                ),
            };
        }

        match request.bearer_token().and_then(|t| self.user_for_token(t)) {
            Some(user) => Response::json(StatusCode::OK, &json!({ "user": user })),
            None => Response::json(StatusCode::UNAUTHORIZED, &json!({ "error": "Invalid token" })),
        }
    }
}

// ---------------------------------------------------------------------------
// Walkthrough
// ---------------------------------------------------------------------------

type DemoPortal = Portal<OfflineProvider, ConfiguredTokenStore, DemoBackend>;

fn demo_portal(config: PortalConfig) -> (DemoPortal, Arc<OfflineProvider>) {
    let provider = Arc::new(OfflineProvider::default());
    let tokens = ConfiguredTokenStore::from_path(config.token_path.clone());
    let portal = PortalBuilder::new().config(config).build_with(
        Arc::clone(&provider),
        Arc::new(tokens),
        Arc::new(DemoBackend::seeded()),
    );
    (portal, provider)
}

fn base_url(portal: &DemoPortal, role: Role) -> String {
    let config = portal.config();
    if config.topology.is_multi_origin() {
        let port = config.apps.get(role).and_then(AppDescriptor::dev_port).unwrap_or(5173);
        format!("http://localhost:{port}")
    } else {
        config
            .apps
            .prod_origin
            .clone()
            .unwrap_or_else(|| "https://portal.example.edu".to_string())
    }
}

fn show(portal: &DemoPortal, label: &str, url: &str) -> Result<Navigation, PortalError> {
    let nav = portal.navigate(url)?;
    println!("{label}");
    println!("  open      {url}");
    for hop in &nav.redirects {
        println!("  redirect  {hop:?}");
    }
    println!("  at        {}", nav.location);
    println!("  outcome   {:?}", nav.outcome);
    Ok(nav)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing("portal_demo=info,placement_portal=info,portal_session=info");

    let config = PortalConfig::from_env()?;
    eprintln!("placement portal demo ({} topology)", config.topology);

    let (portal, provider) = demo_portal(config);
    println!("before provider boot: {:?}", portal.reconcile().await);
    provider.booted.store(true, Ordering::SeqCst);
    println!("after provider boot:  {:?}", portal.reconcile().await);

    let admin = base_url(&portal, Role::Admin);
    let recruiter = base_url(&portal, Role::Recruiter);
    let student = base_url(&portal, Role::Student);

    show(&portal, "signed out, admin dashboard", &format!("{admin}/admin/dashboard"))?;

    match portal.login(&Credentials::new("iyer@college.edu", "wrong"), false).await {
        Ok(_) => println!("unexpected login success"),
        Err(e) => println!("bad password: {}", e.login_message().unwrap_or("error")),
    }

    let outcome = portal.login(&Credentials::new("iyer@college.edu", "mentor123"), true).await?;
    if let Some(identity) = outcome.identity() {
        println!("signed in: {} <{}> as {}", identity.name, identity.email, identity.role);
    }

    let nav = show(&portal, "mentor opens recruiter login", &format!("{recruiter}/recruiter/login"))?;
    if let Outcome::Conflict(conflict) = &nav.outcome {
        println!("  conflict  {}", conflict.message());
        println!("  buttons   [{}] [{}]", conflict.continue_label(), conflict.switch_label());

        if let ConflictResolution::Navigate(decision) =
            portal.resolve_conflict(conflict, ConflictAction::Continue).await
        {
            let after = portal.follow(decision.target(&nav.location));
            println!("  continue  {} → {:?}", after.location, after.outcome);
        }
    }

    show(&portal, "mentor opens student home", &format!("{student}/"))?;

    portal.sign_out().await?;
    show(&portal, "after sign-out, mentor dashboard", &format!("{}/mentor/dashboard", base_url(&portal, Role::Mentor)))?;

    Ok(())
}
