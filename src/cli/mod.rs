//! CLI and environment surface of the plugin
//!
//! Drone passes every setting as a `PLUGIN_*` environment variable, so
//! each flag here is bound to one. The flags themselves exist for
//! local runs and for documentation; in CI the process is started with
//! no arguments at all.

use anyhow::Result;
use clap::{ArgAction, Parser};

use drone_buildah::executor;
use drone_buildah::plugin::types::{Build, Login, Plugin};

/// CLI arguments for drone-buildah
#[derive(Parser, Debug)]
#[command(name = "drone-buildah")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Build and tag the image but skip every push
    #[arg(long, env = "PLUGIN_DRY_RUN", action = ArgAction::Set, num_args = 0..=1, default_missing_value = "true", default_value_t = false)]
    dry_run: bool,

    /// Git remote URL, recorded in the source label
    #[arg(long = "remote.url", env = "DRONE_REMOTE_URL")]
    remote_url: Option<String>,

    /// Commit SHA the image is built and named after
    #[arg(long = "commit.sha", env = "DRONE_COMMIT_SHA", default_value = "00000000")]
    commit_sha: String,

    /// Link to the commit or build, recorded in the url label
    #[arg(long = "commit.link", env = "DRONE_COMMIT_LINK")]
    commit_link: Option<String>,

    /// Dockerfile to build
    #[arg(long, env = "PLUGIN_DOCKERFILE", default_value = "Dockerfile")]
    dockerfile: String,

    /// Build context directory
    #[arg(long, env = "PLUGIN_CONTEXT", default_value = ".")]
    context: String,

    /// Comma-separated tags applied to the image
    #[arg(long, env = "PLUGIN_TAGS", value_delimiter = ',', default_value = "latest")]
    tags: Vec<String>,

    /// Comma-separated key=value build arguments
    #[arg(long, env = "PLUGIN_BUILD_ARGS", value_delimiter = ',')]
    args: Vec<String>,

    /// Comma-separated environment variable names promoted to build arguments
    #[arg(long, env = "PLUGIN_BUILD_ARGS_FROM_ENV", value_delimiter = ',')]
    args_from_env: Vec<String>,

    /// Target build stage in a multi-stage Dockerfile
    #[arg(long, env = "PLUGIN_TARGET")]
    target: Option<String>,

    /// Squash the image layers into one
    #[arg(long, env = "PLUGIN_SQUASH", action = ArgAction::Set, num_args = 0..=1, default_missing_value = "true", default_value_t = false)]
    squash: bool,

    /// Refresh base images before building
    #[arg(long = "pull-image", env = "PLUGIN_PULL_IMAGE", action = ArgAction::Set, num_args = 0..=1, default_missing_value = "true", default_value_t = true)]
    pull_image: bool,

    /// Compress the build context
    #[arg(long, env = "PLUGIN_COMPRESS", action = ArgAction::Set, num_args = 0..=1, default_missing_value = "true", default_value_t = false)]
    compress: bool,

    /// Disable the layer cache
    #[arg(long, env = "PLUGIN_NO_CACHE", action = ArgAction::Set, num_args = 0..=1, default_missing_value = "true", default_value_t = false)]
    no_cache: bool,

    /// Comma-separated images used to seed the layer cache
    #[arg(long, env = "PLUGIN_CACHE_FROM", value_delimiter = ',')]
    cache_from: Vec<String>,

    /// Repository the tags are created under
    #[arg(long, env = "PLUGIN_REPO")]
    repo: Option<String>,

    /// Comma-separated labels applied verbatim
    #[arg(long, env = "PLUGIN_CUSTOM_LABELS", value_delimiter = ',')]
    custom_labels: Vec<String>,

    /// Comma-separated label-schema entries, namespaced when auto-labeling
    #[arg(long, env = "PLUGIN_LABEL_SCHEMA", value_delimiter = ',')]
    label_schema: Vec<String>,

    /// Generate the standard OCI image labels
    #[arg(long, env = "PLUGIN_AUTO_LABEL", action = ArgAction::Set, num_args = 0..=1, default_missing_value = "true", default_value_t = false)]
    auto_label: bool,

    /// Comma-separated host:ip mappings for build-time containers
    #[arg(long, env = "PLUGIN_ADD_HOST", value_delimiter = ',')]
    add_host: Vec<String>,

    /// Suppress build output
    #[arg(long, env = "PLUGIN_QUIET", action = ArgAction::Set, num_args = 0..=1, default_missing_value = "true", default_value_t = false)]
    quiet: bool,

    /// Cache individual layers during the build
    #[arg(long, env = "PLUGIN_LAYERS", action = ArgAction::Set, num_args = 0..=1, default_missing_value = "true", default_value_t = false)]
    layers: bool,

    /// Local directory for the S3 layer cache
    #[arg(long, env = "PLUGIN_S3_CACHE_DIR")]
    s3_cache_dir: Option<String>,

    /// Bucket backing the S3 layer cache
    #[arg(long, env = "PLUGIN_S3_BUCKET")]
    s3_bucket: Option<String>,

    /// Endpoint of the S3 service holding the layer cache
    #[arg(long, env = "PLUGIN_S3_ENDPOINT")]
    s3_endpoint: Option<String>,

    /// Region of the S3 service holding the layer cache
    #[arg(long, env = "PLUGIN_S3_REGION")]
    s3_region: Option<String>,

    /// Access key for the S3 layer cache
    #[arg(long, env = "PLUGIN_S3_KEY")]
    s3_key: Option<String>,

    /// Secret key for the S3 layer cache
    #[arg(long, env = "PLUGIN_S3_SECRET")]
    s3_secret: Option<String>,

    /// Use TLS when talking to the S3 service
    #[arg(long, env = "PLUGIN_S3_USE_SSL", action = ArgAction::Set, num_args = 0..=1, default_missing_value = "true", default_value_t = false)]
    s3_use_ssl: bool,

    /// Registry the image is pushed to
    #[arg(long, env = "PLUGIN_REGISTRY")]
    registry: Option<String>,

    /// Registry username
    #[arg(long, env = "PLUGIN_USERNAME")]
    username: Option<String>,

    /// Registry password or access token
    #[arg(long, env = "PLUGIN_PASSWORD")]
    password: Option<String>,

    /// Registry email
    #[arg(long, env = "PLUGIN_EMAIL")]
    email: Option<String>,

    /// Pre-rendered registry auth config, written to disk verbatim
    #[arg(long, env = "PLUGIN_CONFIG")]
    config: Option<String>,

    /// Remove the built image when the run is done
    #[arg(long, env = "PLUGIN_PURGE", action = ArgAction::Set, num_args = 0..=1, default_missing_value = "true", default_value_t = true)]
    purge: bool,
}

impl Args {
    /// Folds the parsed surface into the plugin configuration. Registry
    /// secrets honor the conventional `DOCKER_*` fallbacks.
    fn into_plugin(self) -> Plugin {
        Plugin {
            login: Login {
                registry: fallback(self.registry, "DOCKER_REGISTRY")
                    .unwrap_or_else(|| "docker.io".to_string()),
                username: fallback(self.username, "DOCKER_USERNAME").unwrap_or_default(),
                password: fallback(self.password, "DOCKER_PASSWORD").unwrap_or_default(),
                email: fallback(self.email, "DOCKER_EMAIL").unwrap_or_default(),
                config: fallback(self.config, "DOCKER_PLUGIN_CONFIG").unwrap_or_default(),
            },
            build: Build {
                remote: self.remote_url.unwrap_or_default(),
                name: self.commit_sha,
                dockerfile: self.dockerfile,
                context: self.context,
                tags: self.tags,
                args: self.args,
                args_from_env: self.args_from_env,
                target: self.target.unwrap_or_default(),
                squash: self.squash,
                pull: self.pull_image,
                cache_from: self.cache_from,
                compress: self.compress,
                repo: self.repo.unwrap_or_default(),
                label_schema: self.label_schema,
                auto_label: self.auto_label,
                labels: self.custom_labels,
                link: self.commit_link.unwrap_or_default(),
                no_cache: self.no_cache,
                add_host: self.add_host,
                quiet: self.quiet,
                layers: self.layers,
                s3_cache_dir: self.s3_cache_dir.unwrap_or_default(),
                s3_bucket: self.s3_bucket.unwrap_or_default(),
                s3_endpoint: self.s3_endpoint.unwrap_or_default(),
                s3_region: self.s3_region.unwrap_or_default(),
                s3_key: self.s3_key.unwrap_or_default(),
                s3_secret: self.s3_secret.unwrap_or_default(),
                s3_use_ssl: self.s3_use_ssl,
            },
            skip_push: self.dry_run,
            cleanup: self.purge,
        }
    }
}

/// Prefers the parsed value, then the fallback environment variable.
fn fallback(primary: Option<String>, var: &str) -> Option<String> {
    primary.or_else(|| std::env::var(var).ok())
}

/// Parses the configuration surface and executes the run.
pub fn run() -> Result<()> {
    let args = Args::parse();
    let mut plugin = args.into_plugin();
    tracing::debug!(?plugin, "Configuration assembled");
    executor::run(&mut plugin)?;
    Ok(())
}
