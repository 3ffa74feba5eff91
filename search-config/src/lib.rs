//! # Search Config
//!
//! This crate provides the type-indexed registry that lets a host application
//! declare, per entity type, which fields are searchable and how they are matched,
//! then retrieve that configuration at query time.
//!
//! ## Modules
//!
//! - [`registry`]: The registry, one configuration per entity type
//! - [`entity`]: Per-entity field declarations and the default field fallback
//! - [`config`]: Registry-wide defaults, loadable from the environment
//! - [`errors`]: Declaration errors
//! - [`types`]: Serializable snapshots of the registry contents

pub mod config;
pub mod entity;
pub mod errors;
pub mod registry;
pub mod types;

pub use config::SearchDefaults;
pub use entity::{EntitySearchConfiguration, FieldOptions};
pub use errors::SearchConfigError;
pub use registry::SearchConfigurationOptions;
pub use types::EntitySnapshot;

pub use search_config_shared::{
    MatchMode, Member, MemberKind, SearchField, Searchable, DEFAULT_SEARCH_FIELD_NAMES,
};
