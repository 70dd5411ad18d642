//! drone-buildah - Drone plugin for rootless Buildah image builds
//!
//! Builds a container image with Buildah and pushes its tags to a
//! registry, entirely without elevated privileges. Configuration
//! arrives as `PLUGIN_*` environment variables the way Drone passes
//! plugin settings; every setting also exists as a long flag for local
//! use.
//!
//! ## Pipeline usage
//!
//! ```yaml
//! steps:
//!   - name: publish
//!     image: drone-plugins/drone-buildah
//!     settings:
//!       repo: registry.example.com/app
//!       tags: latest,v1
//!       username:
//!         from_secret: docker_username
//!       password:
//!         from_secret: docker_password
//! ```
//!
//! ## Local usage
//!
//! ```bash
//! drone-buildah --repo registry.example.com/app --tags latest --dry-run
//! ```
//!
//! Logging defaults to `info` and follows `RUST_LOG` when set.

use std::process::ExitCode;

mod cli;

fn main() -> ExitCode {
    drone_buildah::infrastructure::init_logging("info");

    match cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
