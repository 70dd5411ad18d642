//! Registry credential handling
//!
//! Two credential paths exist: a pre-rendered auth config written to
//! disk for Buildah to pick up, and a username/password login executed
//! against the registry. Runs without either proceed in guest mode.

use std::collections::HashMap;
use std::io::Write;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::executor::environment::EnvOverlay;
use crate::plugin::errors::{PluginError, PluginResult};
use crate::plugin::types::Login;

use super::buildah;

/// File name of the auth configuration inside the config directory.
pub const AUTH_FILE: &str = "auth.json";

const AUTH_FILE_VAR: &str = "REGISTRY_AUTH_FILE";

/// Credential material available to a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialMode {
    /// Username and password are supplied; a login is performed.
    Password,
    /// A pre-rendered auth config is written for Buildah to use.
    ConfigFile,
    /// No credentials at all; pulls are anonymous.
    Guest,
}

/// Minimal shape probe for the auth config blob. Unknown fields are
/// accepted so credential helpers and other extensions pass through.
#[derive(Debug, Deserialize)]
struct AuthConfig {
    #[serde(default)]
    auths: HashMap<String, serde_json::Value>,
}

/// Classifies the supplied credentials. A password takes precedence
/// over an auth config when both are present.
#[must_use]
pub fn credential_mode(login: &Login) -> CredentialMode {
    if login.has_password() {
        CredentialMode::Password
    } else if login.has_auth_config() {
        CredentialMode::ConfigFile
    } else {
        CredentialMode::Guest
    }
}

/// Logs the credential mode this run operates in.
pub fn report_mode(login: &Login) {
    match credential_mode(login) {
        CredentialMode::Password => tracing::info!("Registry credentials detected"),
        CredentialMode::ConfigFile => tracing::info!("Registry credentials file detected"),
        CredentialMode::Guest => {
            tracing::info!("No registry credentials provided. Guest mode enabled");
        }
    }
}

/// Validates the auth config blob and writes it verbatim into `dir`,
/// pointing Buildah at it through the overlay.
///
/// # Errors
///
/// Returns [`PluginError::InvalidAuthConfig`] when the blob is not
/// valid JSON and [`PluginError::Setup`] when the file cannot be
/// written.
pub fn write_auth_file(
    login: &Login,
    dir: &Path,
    overlay: &mut EnvOverlay,
) -> PluginResult<PathBuf> {
    let parsed: AuthConfig = serde_json::from_str(&login.config)?;
    if parsed.auths.is_empty() {
        tracing::warn!("Auth config contains no registry entries");
    }

    let path = dir.join(AUTH_FILE);
    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(&path)
        .map_err(|e| PluginError::Setup {
            context: format!("Error writing {AUTH_FILE}"),
            error: e.to_string(),
        })?;
    file.write_all(login.config.as_bytes())
        .map_err(|e| PluginError::Setup {
            context: format!("Error writing {AUTH_FILE}"),
            error: e.to_string(),
        })?;

    overlay.set(AUTH_FILE_VAR, path.to_string_lossy());
    tracing::info!(path = %path.display(), "Registry auth config written");

    Ok(path)
}

/// Runs the registry login before any build step.
///
/// The login arguments carry the password, so this step is never
/// echoed the way sequenced steps are.
///
/// # Errors
///
/// Returns [`PluginError::AuthFailed`] when the registry rejects the
/// credentials and [`PluginError::Spawn`] when the binary cannot be
/// started.
pub fn authenticate(login: &Login, overlay: &EnvOverlay) -> PluginResult<()> {
    tracing::info!(
        registry = %login.registry,
        username = %login.username,
        "Authenticating against the registry"
    );
    match buildah::login(login).run(overlay) {
        Err(PluginError::CommandFailed { code, .. }) => Err(PluginError::AuthFailed {
            registry: login.registry.clone(),
            code,
        }),
        result => result,
    }
}
