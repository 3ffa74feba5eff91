//! Effective search field descriptors.
//!
//! This module defines the descriptor returned to query-building code and the
//! built-in fallback field names.

use serde::Serialize;

use super::match_mode::MatchMode;
use super::member::MemberKind;

/// Field names searched when an entity type has no explicit declarations.
///
/// Names that the entity type does not expose are skipped.
pub const DEFAULT_SEARCH_FIELD_NAMES: [&str; 3] = ["Name", "Title", "Description"];

/// Weight given to a field when none is declared.
pub const DEFAULT_FIELD_WEIGHT: u16 = 1;

/// A searchable field as seen by the query layer.
///
/// # Fields
///
/// - `name`: Canonical member name, as declared by the entity type
/// - `kind`: Value kind of the member
/// - `match_mode`: How a search term is compared against the value
/// - `weight`: Relative priority among the entity's fields (at least 1)
/// - `explicit`: False when the field comes from the default field fallback
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct SearchField {
    pub name: &'static str,
    pub kind: MemberKind,
    pub match_mode: MatchMode,
    pub weight: u16,
    pub explicit: bool,
}
