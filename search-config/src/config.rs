//! Configuration types for the search configuration registry.

use std::env;

use search_config_shared::{MatchMode, DEFAULT_SEARCH_FIELD_NAMES};
use tracing::warn;

/// Environment variable holding the default match mode.
pub const MATCH_MODE_ENV: &str = "SEARCH_DEFAULT_MATCH_MODE";

/// Environment variable holding the comma-separated fallback field names.
pub const FIELD_NAMES_ENV: &str = "SEARCH_DEFAULT_FIELDS";

/// Registry-wide defaults shared by every entity configuration.
///
/// Entity configurations read these through their back-reference to the registry:
/// `match_mode` applies to declarations made without an explicit mode, and
/// `field_names` drives the fallback for entities with no declarations at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchDefaults {
    /// Match mode for fields declared without one. Defaults to `Contains`.
    pub match_mode: MatchMode,

    /// Ordered fallback field names. Defaults to `Name`, `Title`, `Description`.
    pub field_names: Vec<String>,
}

impl Default for SearchDefaults {
    fn default() -> Self {
        Self {
            match_mode: MatchMode::default(),
            field_names: DEFAULT_SEARCH_FIELD_NAMES
                .iter()
                .map(|name| name.to_string())
                .collect(),
        }
    }
}

impl SearchDefaults {
    /// Load defaults from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `SEARCH_DEFAULT_MATCH_MODE`: Match mode name (default: contains)
    /// - `SEARCH_DEFAULT_FIELDS`: Comma-separated fallback field names (default: Name,Title,Description)
    ///
    /// Invalid values are logged and replaced by the built-in defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load defaults through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut defaults = Self::default();

        if let Some(raw) = lookup(MATCH_MODE_ENV) {
            match raw.parse::<MatchMode>() {
                Ok(mode) => defaults.match_mode = mode,
                Err(e) => warn!(
                    error = %e,
                    fallback = %defaults.match_mode,
                    "Invalid {}, using fallback",
                    MATCH_MODE_ENV
                ),
            }
        }

        if let Some(raw) = lookup(FIELD_NAMES_ENV) {
            let names: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect();

            if names.is_empty() {
                warn!("{} is empty, using built-in field names", FIELD_NAMES_ENV);
            } else {
                defaults.field_names = names;
            }
        }

        defaults
    }

    /// Set the default match mode.
    pub fn with_match_mode(mut self, match_mode: MatchMode) -> Self {
        self.match_mode = match_mode;
        self
    }

    /// Replace the fallback field names.
    pub fn with_field_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.field_names = names.into_iter().map(Into::into).collect();
        self
    }
}
