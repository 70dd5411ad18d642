//! Configuration records for a single plugin invocation
//!
//! These records are assembled once from the CLI and environment surface
//! and stay immutable for the rest of the run, except for the build-arg
//! list which grows when proxy settings are injected.

use std::fmt;

/// Registry credentials and the optional pre-rendered auth config.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Login {
    /// Registry address the credentials apply to.
    pub registry: String,
    /// Registry username.
    pub username: String,
    /// Registry password or access token.
    pub password: String,
    /// Registry email. Accepted for secret parity with other CI plugins
    /// but never passed to the login command.
    pub email: String,
    /// Raw auth config blob, written to disk verbatim when present.
    pub config: String,
}

impl Login {
    /// Returns true when a password-based login should be attempted.
    #[must_use]
    pub fn has_password(&self) -> bool {
        !self.password.is_empty()
    }

    /// Returns true when an auth config blob should be written to disk.
    #[must_use]
    pub fn has_auth_config(&self) -> bool {
        !self.config.is_empty()
    }
}

// Manual Debug so secrets never end up in logs or panic messages.
impl fmt::Debug for Login {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Login")
            .field("registry", &self.registry)
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .field("email", &self.email)
            .field("config", &"[redacted]")
            .finish()
    }
}

/// Parameters for one image build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct Build {
    /// Git remote URL, recorded in the source label.
    pub remote: String,
    /// Name the image is built under, usually the commit SHA.
    pub name: String,
    /// Dockerfile path, relative to the build context.
    pub dockerfile: String,
    /// Build context directory.
    pub context: String,
    /// Tags applied to the built image and pushed to the registry.
    pub tags: Vec<String>,
    /// Explicit `key=value` build arguments.
    pub args: Vec<String>,
    /// Names of environment variables promoted to build arguments.
    pub args_from_env: Vec<String>,
    /// Target build stage in a multi-stage Dockerfile.
    pub target: String,
    /// Squash the image layers into one.
    pub squash: bool,
    /// Always refresh base images before building.
    pub pull: bool,
    /// Images used to seed the layer cache.
    pub cache_from: Vec<String>,
    /// Compress the build context before sending it.
    pub compress: bool,
    /// Repository the tags are created under.
    pub repo: String,
    /// Additional label-schema entries, namespaced during auto-labeling.
    pub label_schema: Vec<String>,
    /// Generate the standard OCI image labels.
    pub auto_label: bool,
    /// Labels applied verbatim.
    pub labels: Vec<String>,
    /// CI link for the commit or build, recorded in the url label.
    pub link: String,
    /// Disable the layer cache for this build.
    pub no_cache: bool,
    /// Extra host-to-IP mappings for build-time containers.
    pub add_host: Vec<String>,
    /// Suppress build output.
    pub quiet: bool,
    /// Cache individual layers during the build.
    pub layers: bool,
    /// Local directory for the S3 layer cache.
    pub s3_cache_dir: String,
    /// Bucket backing the S3 layer cache.
    pub s3_bucket: String,
    /// Endpoint of the S3 service holding the layer cache.
    pub s3_endpoint: String,
    /// Region of the S3 service holding the layer cache.
    pub s3_region: String,
    /// Access key for the S3 layer cache.
    pub s3_key: String,
    /// Secret key for the S3 layer cache.
    pub s3_secret: String,
    /// Use TLS when talking to the S3 service.
    pub s3_use_ssl: bool,
}

/// Everything one plugin run needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plugin {
    /// Registry credentials.
    pub login: Login,
    /// Build parameters.
    pub build: Build,
    /// Build and tag, but skip every push.
    pub skip_push: bool,
    /// Remove the built image once the run is done.
    pub cleanup: bool,
}
