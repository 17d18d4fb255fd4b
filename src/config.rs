//! Crate configuration
//!
//! One struct constructed at startup and passed into the pieces that need it,
//! instead of process-wide defaults.

use std::env::var;

/// Recognized options for the mapping system
#[derive(Clone, Debug)]
pub struct Config {
    /// Charset assumed for titles when none is specified
    pub default_charset: String,

    /// Whether mapping autogeneration is offered at all
    pub autogen_enabled: bool,

    /// Substitute for code points no transliteration is known for
    pub placeholder_char: char,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_charset: String::from("utf-8"),
            autogen_enabled: true,
            placeholder_char: '?',
        }
    }
}

impl Config {
    /// Read the configuration from `URIMAP_*` environment variables
    ///
    /// Unset or empty variables keep their defaults
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            default_charset: env_var_or_else("URIMAP_DEFAULT_CHARSET", || {
                defaults.default_charset.clone()
            }),
            autogen_enabled: env_var_or_else("URIMAP_AUTOGEN", || String::from("true")) != "false",
            placeholder_char: env_var_or_else("URIMAP_PLACEHOLDER", || String::from("?"))
                .chars()
                .next()
                .unwrap_or(defaults.placeholder_char),
        }
    }
}

/// Get the value of ENV var, or a default
///
/// Only when:
/// - It is set
/// - It is not empty
fn env_var_or_else(var_name: &'static str, or_else: impl Fn() -> String) -> String {
    if let Ok(value) = var(var_name) {
        if !value.is_empty() {
            return value;
        }
    }

    or_else()
}
