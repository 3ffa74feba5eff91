//! Serializable views of the registry contents.

use search_config_shared::SearchField;
use serde::Serialize;

/// The effective search configuration of one entity type.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EntitySnapshot {
    /// Short name of the entity type.
    pub entity: &'static str,
    /// False when `fields` comes from the default field fallback.
    pub explicit: bool,
    pub fields: Vec<SearchField>,
}
