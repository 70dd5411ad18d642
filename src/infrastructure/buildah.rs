//! Buildah invocations
//!
//! Constructors for every Buildah step the plugin can plan, plus the
//! pure mapping from a [`Build`] record to the `bud` argument list.

use std::collections::HashMap;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::executor::step::{OutcomePolicy, Step};
use crate::plugin::proxy;
use crate::plugin::types::{Build, Login};

/// Name of the Buildah binary, resolved through `PATH`.
pub const BUILDAH: &str = "buildah";

/// Storage driver used for every storage-touching invocation.
pub const STORAGE_DRIVER: &str = "vfs";

/// Namespace prefix for generated image labels.
const LABEL_PREFIX: &str = "org.opencontainers.image";

/// Sanity check that the binary is present and runnable.
#[must_use]
pub fn version() -> Step {
    Step::new(
        "version check",
        BUILDAH,
        vec!["version".to_string()],
        OutcomePolicy::Fatal,
    )
}

/// Environment report, useful when debugging rootless storage issues.
#[must_use]
pub fn info() -> Step {
    Step::new(
        "info check",
        BUILDAH,
        vec!["info".to_string()],
        OutcomePolicy::Fatal,
    )
}

/// Best-effort pull of a cache image. Failures are tolerated since the
/// build works without a warm cache.
#[must_use]
pub fn pull(image: &str) -> Step {
    Step::new(
        format!("pull of cache image {image}"),
        BUILDAH,
        vec![
            "pull".to_string(),
            "--storage-driver".to_string(),
            STORAGE_DRIVER.to_string(),
            image.to_string(),
        ],
        OutcomePolicy::Tolerant,
    )
}

/// The image build itself.
#[must_use]
pub fn bud(build: &Build, env: &HashMap<String, String>) -> Step {
    Step::new(
        "build",
        BUILDAH,
        bud_args(build, env, Utc::now()),
        OutcomePolicy::Fatal,
    )
}

/// Tags the built image as `repo:tag`.
#[must_use]
pub fn tag(build: &Build, tag: &str) -> Step {
    let target = format!("{}:{tag}", build.repo);
    Step::new(
        format!("tag {target}"),
        BUILDAH,
        vec!["tag".to_string(), build.name.clone(), target],
        OutcomePolicy::Fatal,
    )
}

/// Pushes one tagged image to the registry.
#[must_use]
pub fn push(build: &Build, tag: &str) -> Step {
    let target = format!("{}:{tag}", build.repo);
    Step::new(
        format!("push of {target}"),
        BUILDAH,
        vec!["push".to_string(), target],
        OutcomePolicy::Fatal,
    )
}

/// Removes the built image from local storage. Tolerated on failure so
/// a missing image never fails an otherwise green run.
#[must_use]
pub fn rmi(name: &str) -> Step {
    Step::new(
        format!("removal of image {name}"),
        BUILDAH,
        vec!["rmi".to_string(), name.to_string()],
        OutcomePolicy::Tolerant,
    )
}

/// Registry login with username and password.
///
/// The caller must never echo this step's arguments.
#[must_use]
pub fn login(login: &Login) -> Step {
    Step::new(
        "registry login",
        BUILDAH,
        vec![
            "login".to_string(),
            "-u".to_string(),
            login.username.clone(),
            "-p".to_string(),
            login.password.clone(),
            login.registry.clone(),
        ],
        OutcomePolicy::Fatal,
    )
}

/// Maps a [`Build`] record to the ordered `bud` argument list.
///
/// The list always starts with the storage-driver selector, the `bud`
/// subcommand and the Dockerfile flag, and always ends with the image
/// name and the context path. Everything in between is conditional on
/// the build configuration. Build arguments promoted from the
/// environment are emitted before the explicitly configured ones.
#[must_use]
pub fn bud_args(
    build: &Build,
    env: &HashMap<String, String>,
    created: DateTime<Utc>,
) -> Vec<String> {
    let mut args = vec![
        "--storage-driver".to_string(),
        STORAGE_DRIVER.to_string(),
        "bud".to_string(),
        "-f".to_string(),
        build.dockerfile.clone(),
        "--format".to_string(),
        "docker".to_string(),
    ];

    if build.squash {
        args.push("--squash".to_string());
    }
    if build.compress {
        args.push("--compress".to_string());
    }
    if build.pull {
        args.push("--pull=true".to_string());
    }
    if build.no_cache {
        args.push("--no-cache".to_string());
    }

    for image in &build.cache_from {
        args.push("--cache-from".to_string());
        args.push(image.clone());
    }

    // Promotions are checked against the full list so an explicit arg
    // keeps blocking its environment counterpart, but they are emitted
    // ahead of the explicit ones.
    let mut pool = build.args.clone();
    let explicit = pool.len();
    for name in &build.args_from_env {
        proxy::append_env_arg(&mut pool, name, env);
    }
    for arg in pool[explicit..].iter().chain(&pool[..explicit]) {
        args.push("--build-arg".to_string());
        args.push(arg.clone());
    }

    for host in &build.add_host {
        args.push("--add-host".to_string());
        args.push(host.clone());
    }

    if !build.target.is_empty() {
        args.push("--target".to_string());
        args.push(build.target.clone());
    }
    if build.quiet {
        args.push("--quiet".to_string());
    }

    if build.layers {
        args.push("--layers=true".to_string());
        if !build.s3_cache_dir.is_empty() {
            args.push("--s3-local-cache-dir".to_string());
            args.push(build.s3_cache_dir.clone());
            if !build.s3_bucket.is_empty() {
                args.push("--s3-bucket".to_string());
                args.push(build.s3_bucket.clone());
            }
            if !build.s3_endpoint.is_empty() {
                args.push("--s3-endpoint".to_string());
                args.push(build.s3_endpoint.clone());
            }
            if !build.s3_region.is_empty() {
                args.push("--s3-region".to_string());
                args.push(build.s3_region.clone());
            }
            if !build.s3_key.is_empty() {
                args.push("--s3-key".to_string());
                args.push(build.s3_key.clone());
            }
            if !build.s3_secret.is_empty() {
                args.push("--s3-secret".to_string());
                args.push(build.s3_secret.clone());
            }
            if build.s3_use_ssl {
                args.push("--s3-use-ssl=true".to_string());
            }
        }
    }

    if build.auto_label {
        for label in auto_labels(build, created) {
            args.push("--label".to_string());
            args.push(format!("{LABEL_PREFIX}.{label}"));
        }
    }

    for label in &build.labels {
        args.push("--label".to_string());
        args.push(label.clone());
    }

    args.push("-t".to_string());
    args.push(build.name.clone());
    args.push(build.context.clone());

    args
}

/// The four standard labels plus any configured label-schema entries,
/// all still unprefixed.
fn auto_labels(build: &Build, created: DateTime<Utc>) -> Vec<String> {
    let mut labels = vec![
        format!(
            "created={}",
            created.to_rfc3339_opts(SecondsFormat::Secs, true)
        ),
        format!("revision={}", build.name),
        format!("source={}", build.remote),
        format!("url={}", build.link),
    ];
    labels.extend(build.label_schema.iter().cloned());
    labels
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn fixed_created() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap()
    }

    fn base_build() -> Build {
        Build {
            name: "c0ffee".to_string(),
            dockerfile: "Dockerfile".to_string(),
            context: ".".to_string(),
            repo: "registry.example.com/app".to_string(),
            ..Build::default()
        }
    }

    fn no_env() -> HashMap<String, String> {
        HashMap::new()
    }

    /// Values following each `--label` occurrence.
    fn labels_of(args: &[String]) -> Vec<&str> {
        values_after(args, "--label")
    }

    /// Values following each occurrence of a repeated flag.
    fn values_after<'a>(args: &'a [String], flag: &str) -> Vec<&'a str> {
        args.iter()
            .enumerate()
            .filter(|(_, a)| *a == flag)
            .map(|(i, _)| args[i + 1].as_str())
            .collect()
    }

    #[test]
    fn test_bud_args_minimal_build() {
        let args = bud_args(&base_build(), &no_env(), fixed_created());
        assert_eq!(
            args,
            vec![
                "--storage-driver",
                "vfs",
                "bud",
                "-f",
                "Dockerfile",
                "--format",
                "docker",
                "-t",
                "c0ffee",
                ".",
            ]
        );
    }

    #[test]
    fn test_bud_args_conditional_single_flags() {
        let build = Build {
            squash: true,
            compress: true,
            pull: true,
            no_cache: true,
            quiet: true,
            ..base_build()
        };
        let args = bud_args(&build, &no_env(), fixed_created());

        let at = |flag: &str| args.iter().position(|a| a == flag).unwrap();
        assert!(at("--squash") < at("--compress"));
        assert!(at("--compress") < at("--pull=true"));
        assert!(at("--pull=true") < at("--no-cache"));
        assert!(at("--no-cache") < at("--quiet"));
    }

    #[test]
    fn test_bud_args_cache_from_pairs_in_supplied_order() {
        let build = Build {
            cache_from: vec!["repo:a".to_string(), "repo:b".to_string()],
            ..base_build()
        };
        let args = bud_args(&build, &no_env(), fixed_created());
        assert_eq!(values_after(&args, "--cache-from"), vec!["repo:a", "repo:b"]);
    }

    #[test]
    fn test_bud_args_env_derived_args_come_before_explicit_ones() {
        let build = Build {
            args: vec!["EXPLICIT=1".to_string()],
            args_from_env: vec!["MY_TOKEN".to_string()],
            ..base_build()
        };
        let env: HashMap<String, String> =
            [("MY_TOKEN".to_string(), "abc".to_string())].into();

        let args = bud_args(&build, &env, fixed_created());
        assert_eq!(
            values_after(&args, "--build-arg"),
            vec!["my_token=abc", "MY_TOKEN=abc", "EXPLICIT=1"]
        );
    }

    #[test]
    fn test_bud_args_explicit_arg_blocks_env_promotion() {
        let build = Build {
            args: vec!["MY_TOKEN=pinned".to_string()],
            args_from_env: vec!["MY_TOKEN".to_string()],
            ..base_build()
        };
        let env: HashMap<String, String> =
            [("MY_TOKEN".to_string(), "abc".to_string())].into();

        let args = bud_args(&build, &env, fixed_created());
        assert_eq!(values_after(&args, "--build-arg"), vec!["MY_TOKEN=pinned"]);
    }

    #[test]
    fn test_bud_args_target_only_when_set() {
        let args = bud_args(&base_build(), &no_env(), fixed_created());
        assert!(!args.contains(&"--target".to_string()));

        let build = Build {
            target: "runtime".to_string(),
            ..base_build()
        };
        let args = bud_args(&build, &no_env(), fixed_created());
        assert_eq!(values_after(&args, "--target"), vec!["runtime"]);
    }

    #[test]
    fn test_bud_args_s3_cache_block_requires_layers_and_directory() {
        let mut build = Build {
            s3_cache_dir: "/cache".to_string(),
            s3_bucket: "bucket".to_string(),
            s3_use_ssl: true,
            ..base_build()
        };
        let args = bud_args(&build, &no_env(), fixed_created());
        assert!(!args.contains(&"--s3-local-cache-dir".to_string()));

        build.layers = true;
        let args = bud_args(&build, &no_env(), fixed_created());
        assert!(args.contains(&"--layers=true".to_string()));
        assert_eq!(values_after(&args, "--s3-local-cache-dir"), vec!["/cache"]);
        assert_eq!(values_after(&args, "--s3-bucket"), vec!["bucket"]);
        assert!(args.contains(&"--s3-use-ssl=true".to_string()));
        assert!(!args.contains(&"--s3-endpoint".to_string()));

        build.s3_cache_dir = String::new();
        let args = bud_args(&build, &no_env(), fixed_created());
        assert!(args.contains(&"--layers=true".to_string()));
        assert!(!args.contains(&"--s3-bucket".to_string()));
    }

    #[test]
    fn test_auto_labels_prefix_base_and_schema_entries_only() {
        let build = Build {
            remote: "https://git.example.com/app.git".to_string(),
            link: "https://ci.example.com/builds/42".to_string(),
            auto_label: true,
            label_schema: vec!["vendor=acme".to_string()],
            labels: vec!["plain=1".to_string()],
            ..base_build()
        };
        let args = bud_args(&build, &no_env(), fixed_created());

        let labels = labels_of(&args);
        assert_eq!(
            labels,
            vec![
                "org.opencontainers.image.created=2026-01-02T03:04:05Z",
                "org.opencontainers.image.revision=c0ffee",
                "org.opencontainers.image.source=https://git.example.com/app.git",
                "org.opencontainers.image.url=https://ci.example.com/builds/42",
                "org.opencontainers.image.vendor=acme",
                "plain=1",
            ]
        );
    }

    #[test]
    fn test_explicit_labels_survive_without_auto_label() {
        let build = Build {
            labels: vec!["team=platform".to_string()],
            label_schema: vec!["vendor=acme".to_string()],
            ..base_build()
        };
        let args = bud_args(&build, &no_env(), fixed_created());
        assert_eq!(labels_of(&args), vec!["team=platform"]);
    }

    #[test]
    fn test_version_and_info_steps() {
        assert_eq!(version().args(), ["version"]);
        assert_eq!(version().policy(), OutcomePolicy::Fatal);
        assert_eq!(info().args(), ["info"]);
        assert_eq!(info().policy(), OutcomePolicy::Fatal);
    }

    #[test]
    fn test_pull_step_is_tolerant_and_driver_pinned() {
        let step = pull("repo:cache");
        assert_eq!(step.args(), ["pull", "--storage-driver", "vfs", "repo:cache"]);
        assert_eq!(step.policy(), OutcomePolicy::Tolerant);
    }

    #[test]
    fn test_tag_and_push_steps_address_the_repo() {
        let build = base_build();
        let tag_step = tag(&build, "v1");
        assert_eq!(
            tag_step.args(),
            ["tag", "c0ffee", "registry.example.com/app:v1"]
        );
        assert_eq!(tag_step.policy(), OutcomePolicy::Fatal);

        let push_step = push(&build, "v1");
        assert_eq!(push_step.args(), ["push", "registry.example.com/app:v1"]);
        assert_eq!(push_step.policy(), OutcomePolicy::Fatal);
    }

    #[test]
    fn test_rmi_step_is_tolerant() {
        let step = rmi("c0ffee");
        assert_eq!(step.args(), ["rmi", "c0ffee"]);
        assert_eq!(step.policy(), OutcomePolicy::Tolerant);
    }

    #[test]
    fn test_login_step_carries_credentials_but_no_email() {
        let step = login(&Login {
            registry: "registry.example.com".to_string(),
            username: "bot".to_string(),
            password: "s3cret".to_string(),
            email: "bot@example.com".to_string(),
            config: String::new(),
        });
        assert_eq!(
            step.args(),
            ["login", "-u", "bot", "-p", "s3cret", "registry.example.com"]
        );
        assert_eq!(step.policy(), OutcomePolicy::Fatal);
    }

    fn arb_token() -> impl Strategy<Value = String> {
        "[a-z0-9:./_-]{1,12}"
    }

    fn arb_build() -> impl Strategy<Value = Build> {
        (
            (
                arb_token(),
                arb_token(),
                arb_token(),
                prop_oneof![Just(String::new()), arb_token()],
                arb_token(),
            ),
            (
                proptest::collection::vec(arb_token(), 0..3),
                proptest::collection::vec(arb_token(), 0..3),
                proptest::collection::vec(arb_token(), 0..3),
                proptest::collection::vec(arb_token(), 0..3),
            ),
            (
                any::<bool>(),
                any::<bool>(),
                any::<bool>(),
                any::<bool>(),
                any::<bool>(),
                any::<bool>(),
                any::<bool>(),
            ),
        )
            .prop_map(
                |(
                    (name, dockerfile, context, target, repo),
                    (args, cache_from, labels, label_schema),
                    (squash, compress, pull, no_cache, quiet, layers, auto_label),
                )| Build {
                    name,
                    dockerfile,
                    context,
                    target,
                    repo,
                    args,
                    cache_from,
                    labels,
                    label_schema,
                    squash,
                    compress,
                    pull,
                    no_cache,
                    quiet,
                    layers,
                    auto_label,
                    ..Build::default()
                },
            )
    }

    proptest! {
        #[test]
        fn test_bud_args_always_keep_prefix_and_context_position(build in arb_build()) {
            let args = bud_args(&build, &HashMap::new(), Utc::now());

            prop_assert_eq!(&args[0], "--storage-driver");
            prop_assert_eq!(&args[1], "vfs");
            prop_assert_eq!(&args[2], "bud");
            prop_assert_eq!(&args[3], "-f");
            prop_assert_eq!(&args[4], &build.dockerfile);
            prop_assert_eq!(args.last().unwrap(), &build.context);
            prop_assert_eq!(&args[args.len() - 2], &build.name);
            prop_assert_eq!(&args[args.len() - 3], "-t");
        }
    }
}
