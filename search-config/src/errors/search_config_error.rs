//! Search configuration error types.
//!
//! Every error is a configuration mistake surfaced at declaration time, during
//! application startup. None of them are retryable.

use search_config_shared::MemberKind;
use thiserror::Error;

/// Errors raised while declaring searchable fields on an entity configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchConfigError {
    /// The declared member does not exist on the entity type.
    #[error("Invalid member declaration: {entity} has no member named '{member}'")]
    UnknownMember { entity: &'static str, member: String },

    /// The declared member exists but its kind cannot be matched against a search term.
    #[error("Invalid member declaration: {entity}.{member} is a {kind} member and cannot be searched")]
    UnmatchableMember {
        entity: &'static str,
        member: &'static str,
        kind: MemberKind,
    },

    /// The declared weight is zero.
    #[error("Invalid member declaration: weight for {entity}.{member} must be at least 1")]
    InvalidWeight {
        entity: &'static str,
        member: &'static str,
    },

    /// The registry was sealed before the declaration was made.
    #[error("Search configuration is sealed: cannot declare fields on {entity}")]
    Sealed { entity: &'static str },
}

impl SearchConfigError {
    /// Create an unknown member error.
    pub fn unknown_member(entity: &'static str, member: impl Into<String>) -> Self {
        Self::UnknownMember {
            entity,
            member: member.into(),
        }
    }

    /// Create an unmatchable member error.
    pub fn unmatchable_member(entity: &'static str, member: &'static str, kind: MemberKind) -> Self {
        Self::UnmatchableMember {
            entity,
            member,
            kind,
        }
    }

    /// Create an invalid weight error.
    pub fn invalid_weight(entity: &'static str, member: &'static str) -> Self {
        Self::InvalidWeight { entity, member }
    }

    /// Create a sealed registry error.
    pub fn sealed(entity: &'static str) -> Self {
        Self::Sealed { entity }
    }

    /// Returns true for errors caused by the declared member itself, as opposed to
    /// the registry state.
    pub fn is_invalid_member_declaration(&self) -> bool {
        !matches!(self, Self::Sealed { .. })
    }

    /// Name of the entity type the failed declaration targeted.
    pub fn entity(&self) -> &'static str {
        match self {
            Self::UnknownMember { entity, .. }
            | Self::UnmatchableMember { entity, .. }
            | Self::InvalidWeight { entity, .. }
            | Self::Sealed { entity } => entity,
        }
    }
}
