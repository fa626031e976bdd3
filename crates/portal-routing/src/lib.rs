//! Routing for the placement portal: who may see which page, and where to
//! send them otherwise.
//!
//! Four role applications (student, mentor, admin, recruiter) share one
//! backend. In development each runs on its own port; in production one
//! process serves them all under path prefixes. This crate hides that
//! difference behind a [`Topology`] value.
//!
//! # Key types
//!
//! - [`RouteGuard`]: evaluates a [`Location`] against the session
//! - [`Outcome`]: render, redirect, conflict, or wait
//! - [`resolve_redirect`]: pure "send this user home" decision
//! - [`SessionConflict`]: signed in as A, asked for B's login page
//! - [`AppTable`]: role → origin / path prefix


mod config;
mod conflict;
mod error;
mod guard;
mod location;
mod redirect;
pub mod routes;

pub use config::{AppDescriptor, AppTable, Topology};
pub use conflict::{ConflictAction, ConflictResolution, SessionConflict};
pub use error::RoutingError;
pub use guard::{GuardState, Outcome, Page, RouteGuard};
pub use location::Location;
pub use redirect::{RedirectDecision, resolve_redirect};
pub use routes::{PublicPage, Route, classify, instance_role, show_chrome};
