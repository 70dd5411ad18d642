//! Explicit environment overlay for spawned commands
//!
//! The rootless setup used to rely on mutating the process environment,
//! which made the sequencer impossible to exercise without touching
//! global state. The overlay carries the same variables as plain data
//! and applies them to each spawned command instead.

use std::process::Command;

/// Ordered set of environment variable assignments applied to every
/// command the plugin spawns.
///
/// Later assignments to the same name replace earlier ones, so the
/// overlay can be built up incrementally during the preparation phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverlay {
    vars: Vec<(String, String)>,
}

impl EnvOverlay {
    /// Creates an empty overlay.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a variable, replacing any previous assignment with the same name.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if let Some(entry) = self.vars.iter_mut().find(|(n, _)| *n == name) {
            entry.1 = value;
        } else {
            self.vars.push((name, value));
        }
    }

    /// Returns the assigned value for `name`, if any.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Applies every assignment to the command about to be spawned.
    pub fn apply(&self, cmd: &mut Command) {
        cmd.envs(self.vars.iter().map(|(n, v)| (n.as_str(), v.as_str())));
    }

    /// Iterates over the assignments in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}
