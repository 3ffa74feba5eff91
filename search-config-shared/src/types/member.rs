//! Member reflection types for searchable entities.
//!
//! Entity types describe their members statically through the [`Searchable`] trait,
//! so declarations can be validated against a fixed member table instead of runtime
//! reflection.

use serde::Serialize;

/// The value kind of an entity member.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    Text,
    Integer,
    Float,
    Boolean,
    DateTime,
    Uuid,
    /// Raw bytes. Never matchable.
    Binary,
    /// A nested structure or collection. Never matchable.
    Nested,
}

impl MemberKind {
    /// Returns true if values of this kind can be compared against a search term.
    pub fn is_matchable(&self) -> bool {
        !matches!(self, MemberKind::Binary | MemberKind::Nested)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MemberKind::Text => "text",
            MemberKind::Integer => "integer",
            MemberKind::Float => "float",
            MemberKind::Boolean => "boolean",
            MemberKind::DateTime => "date_time",
            MemberKind::Uuid => "uuid",
            MemberKind::Binary => "binary",
            MemberKind::Nested => "nested",
        }
    }
}

impl std::fmt::Display for MemberKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A named member of an entity type.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
pub struct Member {
    pub name: &'static str,
    pub kind: MemberKind,
}

impl Member {
    pub const fn new(name: &'static str, kind: MemberKind) -> Self {
        Self { name, kind }
    }

    /// Shorthand for a [`MemberKind::Text`] member.
    pub const fn text(name: &'static str) -> Self {
        Self::new(name, MemberKind::Text)
    }

    /// Returns true if `name` refers to this member.
    ///
    /// Member names are compared ASCII case-insensitively, so `"name"` refers to a
    /// member declared as `"Name"`.
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name.trim())
    }
}

/// Static member table for an entity type.
///
/// Implement this for every type that should be configurable for search.
///
/// # Example
///
/// ```
/// use search_config_shared::{Member, MemberKind, Searchable};
///
/// struct Customer;
///
/// impl Searchable for Customer {
///     fn members() -> &'static [Member] {
///         const MEMBERS: &[Member] = &[
///             Member::text("Name"),
///             Member::text("Email"),
///             Member::new("Age", MemberKind::Integer),
///         ];
///         MEMBERS
///     }
/// }
///
/// assert_eq!(Customer::entity_name(), "Customer");
/// assert!(Customer::member("email").is_some());
/// ```
pub trait Searchable: Send + Sync + 'static {
    /// Every member the type exposes, in declaration order.
    fn members() -> &'static [Member];

    /// Short name of the type, without module path or generic arguments.
    fn entity_name() -> &'static str {
        short_type_name(std::any::type_name::<Self>())
    }

    /// Looks up a member by name, ignoring ASCII case. The first match wins.
    fn member(name: &str) -> Option<&'static Member> {
        Self::members().iter().find(|member| member.is_named(name))
    }
}

fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
