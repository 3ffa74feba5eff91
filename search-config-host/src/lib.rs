//! # Search Config Host
//!
//! Host integration for the search configuration registry: a small service
//! container with singleton, scoped and transient lifetimes, the entry points that
//! register [`SearchConfigurationOptions`](search_config::SearchConfigurationOptions)
//! on it, and the retrieval helper downstream code uses to get the registry back.
//!
//! ## Modules
//!
//! - [`container`]: Service collection, provider, scopes and the factory resolver
//! - [`config`]: Search registry registration and retrieval
//! - [`lifetime`]: Registration lifetimes
//! - [`errors`]: Error types for registration and resolution

pub mod config;
pub mod container;
pub mod errors;
pub mod lifetime;

pub use config::{search_options, SearchServiceCollectionExt, REGISTRATION_ENTRY_POINT};
pub use container::{Resolve, ServiceCollection, ServiceProvider, ServiceResolver, ServiceScope};
pub use errors::HostError;
pub use lifetime::{ServiceLifetime, LIFETIME_ENV};
