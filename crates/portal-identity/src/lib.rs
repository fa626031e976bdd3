//! Identity model for the placement portal.
//!
//! This crate defines what "who is signed in" means, independent of where
//! that information came from:
//!
//! - **Types** ([`Role`], [`Identity`], [`ProviderUser`]) → the canonical
//!   shapes every other layer consumes.
//! - **Normalization** ([`normalize`], [`provider_fallback`]) → merging an
//!   external-provider record and a backend profile into one [`Identity`].
//! - **Wire** ([`ProfileResponse`], [`LoginRequest`], [`LoginResponse`]) →
//!   the JSON bodies exchanged with the backend.
//!
//! # Architecture
//!
//! ```text
//! Routing (guards, redirects)     ← reads Identity.role
//!     ↕
//! Session (reconciliation)        ← produces Identity via normalize()
//!     ↕
//! Identity (this crate)           ← no I/O, pure data + rules
//! ```

mod error;
mod normalize;
mod types;
mod wire;

pub use error::IdentityError;
pub use normalize::{derive_display_name, normalize, provider_fallback};
pub use types::{Identity, ProviderUser, RawFields, Role};
pub use wire::{
    Credentials, ErrorBody, LoginRequest, LoginResponse, ProfileResponse,
    decode, encode,
};
