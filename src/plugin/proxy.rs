//! Proxy and environment-sourced build arguments
//!
//! Corporate proxies expect `http_proxy` style settings to reach the
//! build containers, so the plugin forwards them as build arguments.
//! The same mechanism promotes explicitly named environment variables
//! into build arguments.

use std::collections::HashMap;

use super::types::Build;

/// Proxy variables forwarded into every build, in injection order.
const PROXY_KEYS: [&str; 3] = ["http_proxy", "https_proxy", "no_proxy"];

/// Appends a build argument for each proxy variable present in `env`.
///
/// Running this twice leaves the argument list unchanged the second
/// time, since an existing argument for a key blocks re-insertion.
pub fn inject_proxy_args(build: &mut Build, env: &HashMap<String, String>) {
    for key in PROXY_KEYS {
        append_env_arg(&mut build.args, key, env);
    }
}

/// Appends `key=value` build arguments resolved from the environment.
///
/// The exact-case variable is consulted first, then the upper-case
/// form. When a non-empty value is found and no existing argument
/// already starts with the key (compared case-insensitively), both the
/// lower-case and upper-case spellings of the pair are appended.
pub fn append_env_arg(args: &mut Vec<String>, key: &str, env: &HashMap<String, String>) {
    let Some(value) = env_value(key, env) else {
        return;
    };
    if has_arg_for(args, key) {
        return;
    }
    args.push(format!("{}={value}", key.to_lowercase()));
    args.push(format!("{}={value}", key.to_uppercase()));
}

/// Looks up `key`, falling back to its upper-case form. Empty values
/// count as unset.
fn env_value<'a>(key: &str, env: &'a HashMap<String, String>) -> Option<&'a str> {
    match env.get(key) {
        Some(value) if !value.is_empty() => Some(value.as_str()),
        _ => env
            .get(&key.to_uppercase())
            .map(String::as_str)
            .filter(|value| !value.is_empty()),
    }
}

/// Case-insensitive prefix check against the stored arguments.
fn has_arg_for(args: &[String], key: &str) -> bool {
    let key = key.to_lowercase();
    args.iter().any(|arg| arg.to_lowercase().starts_with(&key))
}
