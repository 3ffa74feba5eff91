//! Registration and retrieval of the search configuration registry.

use std::sync::Arc;

use search_config::{SearchConfigError, SearchConfigurationOptions, SearchDefaults};
use tracing::info;

use crate::container::{Resolve, ServiceCollection, ServiceResolver};
use crate::errors::HostError;
use crate::lifetime::ServiceLifetime;

/// Name of the registration call, reported when the registry is missing.
pub const REGISTRATION_ENTRY_POINT: &str = "configure_search";

const SERVICE_NAME: &str = "SearchConfigurationOptions";

type OptionsInitializer =
    Box<dyn Fn(&SearchConfigurationOptions) -> Result<(), SearchConfigError> + Send + Sync>;
type ServicesInitializer = Box<
    dyn Fn(&SearchConfigurationOptions, &ServiceResolver<'_>) -> Result<(), HostError>
        + Send
        + Sync,
>;

/// Host-supplied startup code run against each new registry.
enum Initializer {
    None,
    Options(OptionsInitializer),
    WithServices(ServicesInitializer),
}

/// Registers [`SearchConfigurationOptions`] on a [`ServiceCollection`].
///
/// Every registry produced by the registration is created empty, handed to the
/// initializer, then sealed before any consumer sees it. The lifetime decides how
/// many registries exist:
///
/// - `Singleton`: one registry for the provider and all of its scopes
/// - `Scoped`: one registry per scope
/// - `Transient`: a new registry on every resolution
///
/// Registry defaults come from a registered [`SearchDefaults`] service if there is
/// one, and from the environment otherwise.
///
/// # Example
///
/// ```
/// use search_config::{MatchMode, Member, Searchable};
/// use search_config_host::{search_options, SearchServiceCollectionExt, ServiceCollection, ServiceLifetime};
///
/// struct Customer;
///
/// impl Searchable for Customer {
///     fn members() -> &'static [Member] {
///         const MEMBERS: &[Member] = &[Member::text("Name"), Member::text("Email")];
///         MEMBERS
///     }
/// }
///
/// let mut services = ServiceCollection::new();
/// services.configure_search(ServiceLifetime::Singleton, |options| {
///     options
///         .entity::<Customer>()
///         .declare("Name")?
///         .declare_with("Email", MatchMode::Contains)?;
///     Ok(())
/// });
///
/// let provider = services.build();
/// let options = search_options(&provider).unwrap();
/// assert_eq!(options.entity::<Customer>().searchable_fields().len(), 2);
/// ```
pub trait SearchServiceCollectionExt {
    /// Register an unconfigured registry. Every entity uses the default field fallback.
    fn add_search(&mut self, lifetime: ServiceLifetime) -> &mut Self;

    /// Register a registry and run `configure` on every new instance.
    fn configure_search<F>(&mut self, lifetime: ServiceLifetime, configure: F) -> &mut Self
    where
        F: Fn(&SearchConfigurationOptions) -> Result<(), SearchConfigError>
            + Send
            + Sync
            + 'static;

    /// Register a registry and run `configure` on every new instance, with access
    /// to the other registered services.
    fn configure_search_with_services<F>(
        &mut self,
        lifetime: ServiceLifetime,
        configure: F,
    ) -> &mut Self
    where
        F: Fn(&SearchConfigurationOptions, &ServiceResolver<'_>) -> Result<(), HostError>
            + Send
            + Sync
            + 'static;
}

impl SearchServiceCollectionExt for ServiceCollection {
    fn add_search(&mut self, lifetime: ServiceLifetime) -> &mut Self {
        register_search(self, lifetime, Initializer::None)
    }

    fn configure_search<F>(&mut self, lifetime: ServiceLifetime, configure: F) -> &mut Self
    where
        F: Fn(&SearchConfigurationOptions) -> Result<(), SearchConfigError>
            + Send
            + Sync
            + 'static,
    {
        register_search(self, lifetime, Initializer::Options(Box::new(configure)))
    }

    fn configure_search_with_services<F>(
        &mut self,
        lifetime: ServiceLifetime,
        configure: F,
    ) -> &mut Self
    where
        F: Fn(&SearchConfigurationOptions, &ServiceResolver<'_>) -> Result<(), HostError>
            + Send
            + Sync
            + 'static,
    {
        register_search(self, lifetime, Initializer::WithServices(Box::new(configure)))
    }
}

/// The single registration path behind every entry point. The requested lifetime is
/// passed through to the collection unchanged.
fn register_search(
    services: &mut ServiceCollection,
    lifetime: ServiceLifetime,
    initializer: Initializer,
) -> &mut ServiceCollection {
    services.add(lifetime, move |resolver| {
        let defaults = match resolver.get::<SearchDefaults>()? {
            Some(defaults) => defaults.as_ref().clone(),
            None => SearchDefaults::from_env(),
        };
        let options = SearchConfigurationOptions::with_defaults(defaults);

        match &initializer {
            Initializer::None => {}
            Initializer::Options(configure) => configure(&options)?,
            Initializer::WithServices(configure) => configure(&options, resolver)?,
        }
        options.seal();

        info!(
            %lifetime,
            entities = options.len(),
            "Search configuration initialized"
        );

        Ok(options)
    })
}

/// Retrieve the registered search configuration registry.
///
/// # Returns
///
/// * `Ok(Arc<SearchConfigurationOptions>)` - The registry for this provider or scope
/// * `Err(HostError::MissingRegistration)` - If no registry was ever registered
/// * `Err(HostError)` - If creating the registry failed
pub fn search_options<R: Resolve>(services: &R) -> Result<Arc<SearchConfigurationOptions>, HostError> {
    services
        .get::<SearchConfigurationOptions>()?
        .ok_or_else(|| HostError::missing_registration(SERVICE_NAME, REGISTRATION_ENTRY_POINT))
}
