//! Match mode types for searchable fields.
//!
//! A match mode is a policy value describing how a search term should be compared
//! against a field's value. Evaluating the policy is left to the query layer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Defines how a search term is compared against a field value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// The field value must equal the term exactly.
    Exact,

    /// The field value must contain the term.
    /// This is the default mode.
    #[default]
    Contains,

    /// The field value must start with the term.
    StartsWith,

    /// The field value must equal the term, ignoring case.
    CaseInsensitive,

    /// The field value must approximately match the term.
    Fuzzy,
}

/// Error returned when a string does not name a known [`MatchMode`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown match mode: {0}")]
pub struct ParseMatchModeError(pub String);

impl MatchMode {
    /// All match modes, in declaration order.
    pub const ALL: [MatchMode; 5] = [
        MatchMode::Exact,
        MatchMode::Contains,
        MatchMode::StartsWith,
        MatchMode::CaseInsensitive,
        MatchMode::Fuzzy,
    ];

    /// Returns the canonical snake_case name of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchMode::Exact => "exact",
            MatchMode::Contains => "contains",
            MatchMode::StartsWith => "starts_with",
            MatchMode::CaseInsensitive => "case_insensitive",
            MatchMode::Fuzzy => "fuzzy",
        }
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MatchMode {
    type Err = ParseMatchModeError;

    /// Parses a match mode name.
    ///
    /// Matching ignores case, surrounding whitespace and the choice of `-` or `_`
    /// as word separator, so `"Starts-With"` and `"starts_with"` are equivalent.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "exact" => Ok(MatchMode::Exact),
            "contains" => Ok(MatchMode::Contains),
            "starts_with" | "startswith" | "prefix" => Ok(MatchMode::StartsWith),
            "case_insensitive" | "caseinsensitive" | "ignore_case" => {
                Ok(MatchMode::CaseInsensitive)
            }
            "fuzzy" => Ok(MatchMode::Fuzzy),
            _ => Err(ParseMatchModeError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_contains() {
        assert_eq!(MatchMode::default(), MatchMode::Contains);
    }

    #[test]
    fn test_display_matches_as_str() {
        for mode in MatchMode::ALL {
            assert_eq!(mode.to_string(), mode.as_str());
        }
    }

    #[test]
    fn test_from_str_accepts_canonical_names() {
        for mode in MatchMode::ALL {
            assert_eq!(mode.as_str().parse::<MatchMode>(), Ok(mode));
        }
    }

    #[test]
    fn test_from_str_is_lenient() {
        assert_eq!("Starts-With".parse(), Ok(MatchMode::StartsWith));
        assert_eq!("  EXACT ".parse(), Ok(MatchMode::Exact));
        assert_eq!("ignore-case".parse(), Ok(MatchMode::CaseInsensitive));
    }

    #[test]
    fn test_from_str_rejects_unknown() {
        let err = "regex".parse::<MatchMode>().unwrap_err();
        assert_eq!(err, ParseMatchModeError("regex".to_string()));
        assert_eq!(err.to_string(), "Unknown match mode: regex");
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&MatchMode::CaseInsensitive).unwrap();
        assert_eq!(json, "\"case_insensitive\"");

        let mode: MatchMode = serde_json::from_str("\"starts_with\"").unwrap();
        assert_eq!(mode, MatchMode::StartsWith);
    }
}
