//! Build sequence planning and execution
//!
//! One run is a fixed, ordered list of steps planned up front from the
//! plugin configuration and then executed strictly in order. Tolerant
//! step failures are logged and skipped; any other failure aborts the
//! run with the first error.

use std::collections::HashMap;

use crate::executor::environment::EnvOverlay;
use crate::executor::step::{OutcomePolicy, Step};
use crate::infrastructure::{auth, buildah, rootless};
use crate::plugin::errors::PluginResult;
use crate::plugin::proxy;
use crate::plugin::types::Plugin;

/// Executes one full plugin run.
///
/// Phases: prepare the rootless storage, materialize credentials,
/// inject proxy build args, plan the step sequence, run it.
///
/// # Errors
///
/// Returns the first fatal error encountered in any phase.
pub fn run(plugin: &mut Plugin) -> PluginResult<()> {
    let dir = rootless::config_dir()?;
    let mut overlay = rootless::prepare(&dir)?;

    if plugin.login.has_auth_config() {
        auth::write_auth_file(&plugin.login, &dir, &mut overlay)?;
    }
    if plugin.login.has_password() {
        auth::authenticate(&plugin.login, &overlay)?;
    }
    auth::report_mode(&plugin.login);

    let env: HashMap<String, String> = std::env::vars().collect();
    proxy::inject_proxy_args(&mut plugin.build, &env);

    let steps = plan(plugin, &env);
    run_steps(&steps, &overlay)
}

/// Plans the full step sequence for one configuration.
///
/// Order: version check, info check, one pull per cache image, the
/// build, then per tag a tag step followed by a push step unless
/// pushes are skipped, and finally the image removal when cleanup is
/// requested.
#[must_use]
pub fn plan(plugin: &Plugin, env: &HashMap<String, String>) -> Vec<Step> {
    let mut steps = vec![buildah::version(), buildah::info()];

    for image in &plugin.build.cache_from {
        steps.push(buildah::pull(image));
    }

    steps.push(buildah::bud(&plugin.build, env));

    for tag in &plugin.build.tags {
        steps.push(buildah::tag(&plugin.build, tag));
        if !plugin.skip_push {
            steps.push(buildah::push(&plugin.build, tag));
        }
    }

    if plugin.cleanup {
        steps.push(buildah::rmi(&plugin.build.name));
    }

    steps
}

/// Runs steps in order, echoing each command line first.
fn run_steps(steps: &[Step], overlay: &EnvOverlay) -> PluginResult<()> {
    for step in steps {
        println!("+ {}", step.command_line());
        match step.run(overlay) {
            Ok(()) => {}
            Err(err) => match step.policy() {
                OutcomePolicy::Tolerant => {
                    tracing::warn!(step = %step.label(), error = %err, "Step failed. Ignoring");
                }
                OutcomePolicy::Fatal => return Err(err),
            },
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::errors::PluginError;
    use crate::plugin::types::Build;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn sample_plugin() -> Plugin {
        Plugin {
            build: Build {
                name: "c0ffee".to_string(),
                dockerfile: "Dockerfile".to_string(),
                context: ".".to_string(),
                repo: "registry.example.com/app".to_string(),
                tags: vec!["v1".to_string(), "v2".to_string()],
                cache_from: vec!["app:cache-a".to_string(), "app:cache-b".to_string()],
                ..Build::default()
            },
            skip_push: false,
            cleanup: true,
            ..Plugin::default()
        }
    }

    fn labels(steps: &[Step]) -> Vec<&str> {
        steps.iter().map(Step::label).collect()
    }

    #[test]
    fn test_plan_follows_the_fixed_sequence() {
        let steps = plan(&sample_plugin(), &HashMap::new());
        assert_eq!(
            labels(&steps),
            vec![
                "version check",
                "info check",
                "pull of cache image app:cache-a",
                "pull of cache image app:cache-b",
                "build",
                "tag registry.example.com/app:v1",
                "push of registry.example.com/app:v1",
                "tag registry.example.com/app:v2",
                "push of registry.example.com/app:v2",
                "removal of image c0ffee",
            ]
        );
    }

    #[test]
    fn test_plan_skips_pushes_in_dry_run() {
        let plugin = Plugin {
            skip_push: true,
            ..sample_plugin()
        };
        let steps = plan(&plugin, &HashMap::new());
        assert!(labels(&steps).iter().all(|l| !l.starts_with("push")));
        assert_eq!(
            labels(&steps)
                .iter()
                .filter(|l| l.starts_with("tag"))
                .count(),
            2
        );
    }

    #[test]
    fn test_plan_without_cleanup_keeps_the_image() {
        let plugin = Plugin {
            cleanup: false,
            ..sample_plugin()
        };
        let steps = plan(&plugin, &HashMap::new());
        assert!(labels(&steps).iter().all(|l| !l.starts_with("removal")));
    }

    #[test]
    fn test_plan_policies_match_step_tolerance() {
        let steps = plan(&sample_plugin(), &HashMap::new());
        let tolerant: Vec<&str> = steps
            .iter()
            .filter(|s| s.policy() == OutcomePolicy::Tolerant)
            .map(Step::label)
            .collect();
        assert_eq!(
            tolerant,
            vec![
                "pull of cache image app:cache-a",
                "pull of cache image app:cache-b",
                "removal of image c0ffee",
            ]
        );
    }

    #[test]
    fn test_run_steps_continues_past_a_tolerant_failure() {
        let steps = vec![
            Step::new("warm-up", "false", Vec::new(), OutcomePolicy::Tolerant),
            Step::new("main", "true", Vec::new(), OutcomePolicy::Fatal),
        ];
        assert!(run_steps(&steps, &EnvOverlay::new()).is_ok());
    }

    #[test]
    fn test_run_steps_aborts_on_a_fatal_failure() {
        let tmp = TempDir::new().unwrap();
        let marker = tmp.path().join("ran");
        let steps = vec![
            Step::new("main", "false", Vec::new(), OutcomePolicy::Fatal),
            Step::new(
                "after",
                "touch",
                vec![marker.to_string_lossy().into_owned()],
                OutcomePolicy::Fatal,
            ),
        ];

        let err = run_steps(&steps, &EnvOverlay::new()).unwrap_err();

        assert_eq!(
            err,
            PluginError::CommandFailed {
                step: "main".to_string(),
                code: 1,
            }
        );
        assert!(!marker.exists());
    }
}
