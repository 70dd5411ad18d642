//! Step execution layer
//!
//! This module contains the pieces that actually run external
//! commands: the environment overlay, the tagged steps and the
//! sequencer that drives a whole plugin run.

pub mod environment;
pub mod sequencer;
pub mod step;

pub use environment::EnvOverlay;
pub use sequencer::{plan, run};
pub use step::{OutcomePolicy, Step};
