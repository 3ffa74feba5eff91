//! Configuration module for the search registry host integration.
//! Registers the search configuration registry on a service collection and
//! retrieves it again.
mod search;

pub use search::{search_options, SearchServiceCollectionExt, REGISTRATION_ENTRY_POINT};
