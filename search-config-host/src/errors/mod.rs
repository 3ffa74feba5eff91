//! Error types for the service container and search registration.

use search_config::SearchConfigError;
use thiserror::Error;

/// Errors that can occur while registering or resolving services.
#[derive(Error, Debug)]
pub enum HostError {
    /// No registration exists for the requested service.
    #[error("No {service} is registered; call {hint} during startup")]
    MissingRegistration {
        service: &'static str,
        hint: &'static str,
    },

    /// A factory resolved a service that was already being created on the same chain,
    /// or that another resolution waiting on this one is creating.
    #[error("Circular dependency while resolving services: {chain}")]
    CircularDependency { chain: String },

    /// A singleton factory resolved a scoped service.
    #[error("Singleton {dependent} cannot depend on scoped service {service}")]
    CaptiveDependency {
        dependent: &'static str,
        service: &'static str,
    },

    /// The search configuration initializer rejected a declaration.
    #[error("Search configuration error: {0}")]
    Initialization(#[from] SearchConfigError),

    /// A service factory failed for another reason.
    #[error("Service factory error: {0}")]
    Factory(String),

    /// Failed to serialize a configuration snapshot.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl HostError {
    /// Create a missing registration error.
    pub fn missing_registration(service: &'static str, hint: &'static str) -> Self {
        Self::MissingRegistration { service, hint }
    }

    /// Create a circular dependency error from the chain of service names.
    pub fn circular_dependency(chain: &[&'static str]) -> Self {
        Self::CircularDependency {
            chain: chain.join(" -> "),
        }
    }

    /// Create a captive dependency error.
    pub fn captive_dependency(dependent: &'static str, service: &'static str) -> Self {
        Self::CaptiveDependency { dependent, service }
    }

    /// Create a factory error.
    pub fn factory(msg: impl Into<String>) -> Self {
        Self::Factory(msg.into())
    }
}
