//! Registration lifetimes.

use std::env;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use tracing::warn;

/// Environment variable selecting the lifetime of the search registry.
pub const LIFETIME_ENV: &str = "SEARCH_REGISTRATION_LIFETIME";

/// How many instances of a registered service exist and how long each lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ServiceLifetime {
    /// One instance for the provider and every scope created from it.
    #[default]
    Singleton,
    /// One instance per scope. The root provider acts as its own scope.
    Scoped,
    /// A new instance on every resolution.
    Transient,
}

/// Error returned when a string does not name a known [`ServiceLifetime`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown service lifetime: {0}")]
pub struct ParseServiceLifetimeError(pub String);

impl ServiceLifetime {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceLifetime::Singleton => "singleton",
            ServiceLifetime::Scoped => "scoped",
            ServiceLifetime::Transient => "transient",
        }
    }

    /// Parse the lifetime from `SEARCH_REGISTRATION_LIFETIME`.
    ///
    /// Valid values: "singleton", "scoped" or "transient" (case-insensitive).
    /// Defaults to singleton if not set or invalid.
    pub fn from_env() -> Self {
        match env::var(LIFETIME_ENV) {
            Ok(raw) => raw.parse().unwrap_or_else(|e: ParseServiceLifetimeError| {
                warn!(error = %e, "Invalid {}, defaulting to 'singleton'", LIFETIME_ENV);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }
}

impl fmt::Display for ServiceLifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ServiceLifetime {
    type Err = ParseServiceLifetimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "singleton" => Ok(Self::Singleton),
            "scoped" => Ok(Self::Scoped),
            "transient" => Ok(Self::Transient),
            _ => Err(ParseServiceLifetimeError(s.to_string())),
        }
    }
}
