//! Plugin configuration model and domain logic

pub mod errors;
pub mod proxy;
pub mod types;

pub use errors::{PluginError, PluginResult};
pub use types::{Build, Login, Plugin};
