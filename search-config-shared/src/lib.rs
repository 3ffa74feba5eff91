//! # Search Config Shared
//!
//! This crate defines the plain data types shared across the search configuration
//! crates: how an entity type describes its members, how a field is matched, and
//! the effective field descriptors handed to query-building code.

pub mod types;

pub use types::match_mode::{MatchMode, ParseMatchModeError};
pub use types::member::{Member, MemberKind, Searchable};
pub use types::search_field::{SearchField, DEFAULT_FIELD_WEIGHT, DEFAULT_SEARCH_FIELD_NAMES};
