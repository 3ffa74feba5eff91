//! This module defines the core data structures shared by the search configuration crates.
//! It re-exports the member reflection types and the field descriptor types.

pub mod match_mode;
pub mod member;
pub mod search_field;

pub use match_mode::MatchMode;
pub use member::{Member, MemberKind, Searchable};
pub use search_field::SearchField;
