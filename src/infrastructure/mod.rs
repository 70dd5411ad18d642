//! Infrastructure layer
//!
//! This module contains the integrations with the outside world: the
//! Buildah binary, the rootless storage setup, registry credentials
//! and logging.

pub mod auth;
pub mod buildah;
mod logging;
pub mod rootless;

pub use auth::CredentialMode;
pub use logging::init_logging;
