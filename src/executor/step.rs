//! Tagged build steps
//!
//! Every external invocation the plugin makes is planned as a [`Step`]
//! before anything runs. A step carries a human-readable label for
//! error reporting, the full argument list and an outcome policy that
//! tells the sequencer whether a failure aborts the run.

use std::process::{Command, Stdio};

use super::environment::EnvOverlay;
use crate::plugin::errors::{PluginError, PluginResult};

/// How a step failure affects the rest of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomePolicy {
    /// Failure aborts the run.
    Fatal,
    /// Failure is logged and the run continues.
    Tolerant,
}

/// One planned invocation of an external binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    label: String,
    program: String,
    args: Vec<String>,
    policy: OutcomePolicy,
}

impl Step {
    /// Creates a step from its label, program, arguments and policy.
    #[must_use]
    pub fn new(
        label: impl Into<String>,
        program: impl Into<String>,
        args: Vec<String>,
        policy: OutcomePolicy,
    ) -> Self {
        Self {
            label: label.into(),
            program: program.into(),
            args,
            policy,
        }
    }

    /// Label used in logs and error messages.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Arguments passed to the program, in order.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Outcome policy applied when the step fails.
    #[must_use]
    pub fn policy(&self) -> OutcomePolicy {
        self.policy
    }

    /// Command line as echoed before execution.
    #[must_use]
    pub fn command_line(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }

    /// Runs the step to completion with the overlay applied.
    ///
    /// Output streams are inherited so the build logs show up directly
    /// in the CI output.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::Spawn`] when the binary cannot be started
    /// and [`PluginError::CommandFailed`] on a non-zero exit status.
    pub fn run(&self, overlay: &EnvOverlay) -> PluginResult<()> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd.stdout(Stdio::inherit());
        cmd.stderr(Stdio::inherit());
        overlay.apply(&mut cmd);

        let status = cmd.status().map_err(|e| PluginError::Spawn {
            step: self.label.clone(),
            error: e.to_string(),
        })?;

        if !status.success() {
            return Err(PluginError::CommandFailed {
                step: self.label.clone(),
                code: status.code().unwrap_or(-1),
            });
        }

        Ok(())
    }
}
