//!
//! Utility functions shared by configuration and the gates.
//!
//! This module provides:
//! - [`replace_handlebars_with_env`] - Template substitution for environment variables
//! - [`RouteOverride`] / [`resolve_route_override`] - First-match-wins path prefix lookup
//! - [`generate_request_id`] - Short random request identifiers
//! - [`shorten_path`] - Path truncation for access log lines
//!

use {
    regex::{Captures, Regex},
    std::{env, sync::LazyLock},
    uuid::Uuid,
};

static HANDLEBAR_REGEXP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([A-Z0-9_]+)\s*\}\}").unwrap());

/// Length of the identifiers produced by [`generate_request_id`].
pub const REQUEST_ID_LEN: usize = 8;

/// Replaces `{{ VAR_NAME }}` placeholders with the value of the environment
/// variable. Missing variables are substituted with an empty string.
pub fn replace_handlebars_with_env(input: &str) -> String {
    HANDLEBAR_REGEXP
        .replace_all(input, |caps: &Captures| {
            let var_name = &caps[1];
            env::var(var_name).unwrap_or_else(|_| {
                tracing::warn!(
                    variable = %var_name,
                    "Environment variable not found, substituting with empty string"
                );
                String::new()
            })
        })
        .to_string()
}

/// A configuration entry that applies to every path starting with a prefix.
pub trait RouteOverride {
    fn prefix(&self) -> &str;
}

/// Returns the first override whose prefix matches `path`.
///
/// Overrides are evaluated in declaration order, never sorted, so a broad
/// prefix listed first shadows narrower ones listed after it.
pub fn resolve_route_override<'a, O: RouteOverride>(overrides: &'a [O], path: &str) -> Option<&'a O> {
    overrides.iter().find(|o| path.starts_with(o.prefix()))
}

/// Generates an 8 character lower-case hexadecimal request identifier.
pub fn generate_request_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(REQUEST_ID_LEN);
    id
}

/// Shortens `path` to at most `max` characters, replacing the tail with `…`.
pub fn shorten_path(path: &str, max: usize) -> String {
    if path.chars().count() <= max {
        return path.to_string();
    }
    let mut shortened: String = path.chars().take(max.saturating_sub(1)).collect();
    shortened.push('…');
    shortened
}
