//! Error types for the search configuration registry.
//!
//! This module provides the error type raised while declaring searchable fields.

mod search_config_error;

pub use search_config_error::SearchConfigError;
