//! # Placement Portal
//!
//! Identity reconciliation and session orchestration for a campus
//! placement portal with four role applications (student, mentor, admin,
//! recruiter) sharing one backend.
//!
//! The portal unifies two authentication sources (a hosted identity
//! provider and a locally issued fallback token) into one
//! [`Identity`](portal_identity::Identity), signs every backend request
//! with the right token, and routes users to the correct role
//! application.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use placement_portal::prelude::*;
//!
//! // Implement ExternalProvider for your identity provider, then:
//! // let portal = PortalBuilder::new()
//! //     .config(PortalConfig::from_env()?)
//! //     .build(my_provider);
//! // portal.reconcile().await;
//! // let nav = portal.navigate("http://localhost:5174/")?;
//! ```

mod config;
mod error;
mod portal;
mod telemetry;

pub use config::{ENV_API_URL, ENV_PROD_ORIGIN, ENV_TOKEN_PATH, ENV_TOPOLOGY, PortalConfig};
pub use error::PortalError;
pub use portal::{ConfiguredTokenStore, MAX_REDIRECTS, Navigation, Portal, PortalBuilder};
pub use telemetry::init_tracing;

pub use portal_identity as identity;
pub use portal_routing as routing;
pub use portal_session as session;
pub use portal_transport as transport;

/// Everything needed to embed the portal.
pub mod prelude {
    pub use crate::{
        ConfiguredTokenStore, Navigation, Portal, PortalBuilder, PortalConfig, PortalError,
        init_tracing,
    };
    pub use portal_identity::{Credentials, Identity, ProviderUser, Role};
    pub use portal_routing::{
        AppDescriptor, AppTable, ConflictAction, ConflictResolution, Location, Outcome, Page,
        PublicPage, RedirectDecision, RouteGuard, SessionConflict, Topology,
    };
    pub use portal_session::{
        ExternalProvider, FileTokenStore, LoginOutcome, MemoryTokenStore, ProviderError,
        Reconciliation, SessionState, SignInOutcome, TokenStore,
    };
    pub use portal_transport::{HttpTransport, ReqwestTransport, Request, Response};
}
