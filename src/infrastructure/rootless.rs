//! Rootless storage preparation
//!
//! Buildah needs a storage backend that works without elevated
//! privileges. The plugin writes a vfs storage configuration under the
//! user's configuration directory and exports the selector variables
//! through an [`EnvOverlay`] instead of mutating its own environment.

use std::fs::DirBuilder;
use std::io::Write;
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt};
use std::path::{Path, PathBuf};

use nix::unistd::Uid;

use crate::executor::environment::EnvOverlay;
use crate::plugin::errors::{PluginError, PluginResult};

use super::buildah::STORAGE_DRIVER;

/// File name of the storage configuration inside the config directory.
pub const STORAGE_CONF_FILE: &str = "storage.conf";

const STORAGE_DRIVER_VAR: &str = "STORAGE_DRIVER";
const ISOLATION_VAR: &str = "BUILDAH_ISOLATION";
const STORAGE_CONF_VAR: &str = "CONTAINERS_STORAGE_CONF";
const ROOTLESS_ISOLATION: &str = "rootless";

/// Directory the plugin writes its configuration files into.
///
/// # Errors
///
/// Returns [`PluginError::NoConfigDir`] when no user configuration
/// directory can be resolved.
pub fn config_dir() -> PluginResult<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join("containers"))
        .ok_or(PluginError::NoConfigDir)
}

/// Writes the storage configuration into `dir` and returns the overlay
/// that points Buildah at it.
///
/// The run and graph roots are placed under `/tmp`, keyed by the real
/// user id, so parallel builds by different users never collide.
///
/// # Errors
///
/// Returns [`PluginError::Setup`] when the directory or the
/// configuration file cannot be created.
pub fn prepare(dir: &Path) -> PluginResult<EnvOverlay> {
    DirBuilder::new()
        .recursive(true)
        .mode(0o700)
        .create(dir)
        .map_err(|e| PluginError::Setup {
            context: format!("Error creating storage config directory {}", dir.display()),
            error: e.to_string(),
        })?;

    let path = dir.join(STORAGE_CONF_FILE);
    let contents = storage_conf(Uid::current());
    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(&path)
        .map_err(|e| PluginError::Setup {
            context: format!("Error writing {STORAGE_CONF_FILE}"),
            error: e.to_string(),
        })?;
    file.write_all(contents.as_bytes())
        .map_err(|e| PluginError::Setup {
            context: format!("Error writing {STORAGE_CONF_FILE}"),
            error: e.to_string(),
        })?;

    let mut overlay = EnvOverlay::new();
    overlay.set(STORAGE_DRIVER_VAR, STORAGE_DRIVER);
    overlay.set(ISOLATION_VAR, ROOTLESS_ISOLATION);
    overlay.set(STORAGE_CONF_VAR, path.to_string_lossy());

    tracing::debug!(path = %path.display(), "Storage configuration written");

    Ok(overlay)
}

fn storage_conf(uid: Uid) -> String {
    format!(
        "[storage]\n\
         driver = \"{STORAGE_DRIVER}\"\n\
         runroot = \"/tmp/buildah-run-{uid}\"\n\
         graphroot = \"/tmp/buildah-graph-{uid}\"\n"
    )
}
