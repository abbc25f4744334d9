//! # REDCap integration core
//!
//! Shared state for forwarding REDCap project events to the Management
//! Portal: one OAuth2 client-credentials token with single-flight refresh,
//! and a routing table from REDCap instances to Management Portal projects.
//!
//! Modules:
//! - `config`: configuration document, location and validation
//! - `cache`: access token state and the token cache
//! - `sources`: the authority client
//! - `routing`: source instance keys and the resolver
//! - `lifecycle`: start and stop hooks

pub mod cache;
pub mod config;
pub mod error;
pub mod helpers;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod server;
pub mod sources;
pub mod utils;

#[cfg(test)]
mod tests;

pub use crate::config::snapshot::ConfigurationSnapshot;
pub use crate::error::{StartupError, TokenUnavailableError, UnknownInstanceError};
pub use crate::lifecycle::Integration;
