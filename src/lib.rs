//! # drone-buildah - Rootless container image builds for Drone CI
//!
//! drone-buildah is a Drone plugin that builds container images with
//! [Buildah](https://buildah.io) and pushes them to a registry, all
//! without elevated privileges. It prepares a vfs-backed storage
//! configuration and the registry credentials, then drives the Buildah
//! binary through a fixed sequence of steps.
//!
//! ## How a run works
//!
//! 1. A storage configuration is written under the user's config
//!    directory and exported to every spawned command.
//! 2. Credentials are materialized: an auth config file, a registry
//!    login, or neither (guest mode).
//! 3. Proxy settings from the environment are injected as build args.
//! 4. The step sequence is planned: version, info, cache pulls, the
//!    build, tag and push per tag, optional image removal.
//! 5. Steps run in order. Cache pulls and the removal are best-effort;
//!    everything else aborts the run on failure.
//!
//! ## Documentation
//!
//! - [GitHub Repository](https://github.com/drone-plugins/drone-buildah)
//!
//! ## License
//!
//! Licensed under either of
//! - Apache License, Version 2.0 ([LICENSE-APACHE](LICENSE-APACHE) or <https://www.apache.org/licenses/LICENSE-2.0>)
//! - MIT license ([LICENSE-MIT](LICENSE-MIT) or <https://opensource.org/licenses/MIT>)
//!
//! at your option.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod executor;
pub mod infrastructure;
pub mod plugin;

// Re-export commonly used types
pub use executor::{EnvOverlay, OutcomePolicy, Step};
pub use infrastructure::CredentialMode;
pub use plugin::{Build, Login, Plugin, PluginError, PluginResult};

/// Version of the drone-buildah crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
