//! Type-indexed registry of entity search configurations.
//!
//! The registry owns exactly one [`EntitySearchConfiguration`] per entity type.
//! Configurations are created lazily on first request and never removed or
//! replaced, so every caller asking for the same type shares the same instance.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use search_config_shared::{Searchable, DEFAULT_SEARCH_FIELD_NAMES};
use tracing::{debug, info};

use crate::config::SearchDefaults;
use crate::entity::EntitySearchConfiguration;
use crate::types::EntitySnapshot;

type ErasedConfiguration = Arc<dyn Any + Send + Sync>;

/// A type-erased configuration together with the means to inspect it.
struct Entry {
    entity: &'static str,
    configuration: ErasedConfiguration,
    snapshot: fn(&(dyn Any + Send + Sync)) -> Option<EntitySnapshot>,
}

impl Entry {
    fn new<T: Searchable>(configuration: EntitySearchConfiguration<T>) -> Self {
        Self {
            entity: T::entity_name(),
            configuration: Arc::new(configuration),
            snapshot: snapshot_of::<T>,
        }
    }
}

fn snapshot_of<T: Searchable>(configuration: &(dyn Any + Send + Sync)) -> Option<EntitySnapshot> {
    configuration
        .downcast_ref::<EntitySearchConfiguration<T>>()
        .map(EntitySearchConfiguration::<T>::snapshot)
}

/// Settings shared by a registry and every configuration it created.
///
/// Configurations hold this strongly, so defaults and the sealed flag stay in effect
/// after the last registry handle is dropped. It never owns configurations.
pub(crate) struct RegistrySettings {
    pub(crate) defaults: SearchDefaults,
    sealed: RwLock<bool>,
}

impl RegistrySettings {
    fn new(defaults: SearchDefaults) -> Self {
        Self {
            defaults,
            sealed: RwLock::new(false),
        }
    }

    pub(crate) fn is_sealed(&self) -> bool {
        *self.read_sealed()
    }

    /// Shared guard on the sealed flag.
    ///
    /// Declarations hold it while they check the flag and land, so [`seal`](Self::seal)
    /// returns only after every in-flight declaration has finished.
    pub(crate) fn read_sealed(&self) -> RwLockReadGuard<'_, bool> {
        self.sealed.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set the sealed flag. Returns false if it was already set.
    fn seal(&self) -> bool {
        let mut sealed = self.sealed.write().unwrap_or_else(PoisonError::into_inner);
        !std::mem::replace(&mut *sealed, true)
    }
}

struct RegistryState {
    settings: Arc<RegistrySettings>,
    entities: RwLock<HashMap<TypeId, Entry>>,
}

impl RegistryState {
    fn read_entities(&self) -> RwLockReadGuard<'_, HashMap<TypeId, Entry>> {
        self.entities.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_entities(&self) -> RwLockWriteGuard<'_, HashMap<TypeId, Entry>> {
        self.entities.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Registry of per-entity search configuration.
///
/// The registry is a cheap handle: clones share the same underlying entities, so a
/// single instance can be handed to every consumer. Host code calls
/// [`entity`](Self::entity) for each type it wants searchable during startup and
/// chains declarations on the returned configuration. Query-building code later
/// retrieves the same configuration through the same call.
///
/// # Configuration phase
///
/// Declarations are expected to happen during startup, before the registry is
/// shared with query-serving code. [`seal`](Self::seal) ends that phase: any later
/// declaration fails with [`SearchConfigError::Sealed`](crate::SearchConfigError::Sealed).
///
/// # Example
///
/// ```
/// use search_config::{MatchMode, SearchConfigurationOptions};
/// use search_config_shared::{Member, Searchable};
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
/// # fn main() -> Result<(), search_config::SearchConfigError> {
/// let options = SearchConfigurationOptions::new();
/// options
///     .entity::<Customer>()
///     .declare("Name")?
///     .declare_with("Email", MatchMode::Contains)?;
/// options.seal();
///
/// let fields = options.entity::<Customer>().searchable_fields();
/// assert_eq!(fields.len(), 2);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SearchConfigurationOptions {
    state: Arc<RegistryState>,
}

impl SearchConfigurationOptions {
    /// Create an empty registry with built-in defaults.
    pub fn new() -> Self {
        Self::with_defaults(SearchDefaults::default())
    }

    /// Create an empty registry with custom defaults.
    pub fn with_defaults(defaults: SearchDefaults) -> Self {
        Self {
            state: Arc::new(RegistryState {
                settings: Arc::new(RegistrySettings::new(defaults)),
                entities: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Get the configuration for entity type `T`, creating it on first request.
    ///
    /// Lookups of existing configurations only take a shared read lock. Creation
    /// takes the write lock and re-checks the slot, so concurrent first requests for
    /// the same type all receive the one instance that was inserted.
    pub fn entity<T: Searchable>(&self) -> Arc<EntitySearchConfiguration<T>> {
        let key = TypeId::of::<T>();

        if let Some(entry) = self.state.read_entities().get(&key) {
            return downcast::<T>(&entry.configuration);
        }

        let mut entities = self.state.write_entities();
        let entry = entities.entry(key).or_insert_with(|| {
            debug!(entity = T::entity_name(), "Creating search configuration");
            Entry::new(EntitySearchConfiguration::<T>::new(Arc::clone(
                &self.state.settings,
            )))
        });

        downcast::<T>(&entry.configuration)
    }

    /// Built-in fallback field names: `Name`, `Title`, `Description`.
    pub fn default_search_field_names() -> &'static [&'static str] {
        &DEFAULT_SEARCH_FIELD_NAMES
    }

    /// Registry-wide defaults in effect for this registry.
    pub fn defaults(&self) -> &SearchDefaults {
        &self.state.settings.defaults
    }

    /// Returns true if a configuration for `T` has been created.
    pub fn contains<T: Searchable>(&self) -> bool {
        self.state.read_entities().contains_key(&TypeId::of::<T>())
    }

    /// Number of entity types with a configuration.
    pub fn len(&self) -> usize {
        self.state.read_entities().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Names of every configured entity type, sorted.
    pub fn entity_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self
            .state
            .read_entities()
            .values()
            .map(|entry| entry.entity)
            .collect();
        names.sort_unstable();
        names
    }

    /// End the configuration phase. Sealing an already sealed registry does nothing.
    ///
    /// Waits for declarations already in progress, so no declaration lands after
    /// this returns.
    pub fn seal(&self) {
        if self.state.settings.seal() {
            info!(entities = self.len(), "Search configuration sealed");
        }
    }

    pub fn is_sealed(&self) -> bool {
        self.state.settings.is_sealed()
    }

    /// Effective fields of every configured entity, ordered by entity name.
    pub fn snapshot(&self) -> Vec<EntitySnapshot> {
        let mut snapshots: Vec<_> = self
            .state
            .read_entities()
            .values()
            .filter_map(|entry| (entry.snapshot)(entry.configuration.as_ref()))
            .collect();
        snapshots.sort_by(|a, b| a.entity.cmp(b.entity));
        snapshots
    }

    /// Returns true if both handles refer to the same registry.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}

impl Default for SearchConfigurationOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SearchConfigurationOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchConfigurationOptions")
            .field("entities", &self.entity_names())
            .field("sealed", &self.is_sealed())
            .field("defaults", &self.state.settings.defaults)
            .finish()
    }
}

/// Restore the concrete configuration type of an entry.
///
/// Entries under `TypeId::of::<T>()` are only ever inserted by
/// [`SearchConfigurationOptions::entity::<T>`], so the downcast cannot fail.
fn downcast<T: Searchable>(configuration: &ErasedConfiguration) -> Arc<EntitySearchConfiguration<T>> {
    match Arc::clone(configuration).downcast::<EntitySearchConfiguration<T>>() {
        Ok(configuration) => configuration,
        Err(_) => unreachable!(
            "search configuration for {} stored under a foreign TypeId",
            T::entity_name()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use search_config_shared::{MatchMode, Member};

    struct Customer;

    impl Searchable for Customer {
        fn members() -> &'static [Member] {
            const MEMBERS: &[Member] = &[Member::text("Name"), Member::text("Email")];
            MEMBERS
        }
    }

    struct Product;

    impl Searchable for Product {
        fn members() -> &'static [Member] {
            const MEMBERS: &[Member] = &[Member::text("Title"), Member::text("Sku")];
            MEMBERS
        }
    }

    #[test]
    fn test_new_registry_is_empty() {
        let options = SearchConfigurationOptions::new();
        assert!(options.is_empty());
        assert!(!options.is_sealed());
        assert!(!options.contains::<Customer>());
    }

    #[test]
    fn test_entity_returns_same_instance() {
        let options = SearchConfigurationOptions::new();
        let first = options.entity::<Customer>();
        let second = options.entity::<Customer>();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(options.len(), 1);
    }

    #[test]
    fn test_distinct_types_get_distinct_entries() {
        let options = SearchConfigurationOptions::new();
        options.entity::<Customer>();
        options.entity::<Product>();

        assert_eq!(options.len(), 2);
        assert_eq!(options.entity_names(), vec!["Customer", "Product"]);
    }

    #[test]
    fn test_clones_share_entities() {
        let options = SearchConfigurationOptions::new();
        let clone = options.clone();
        let from_clone = clone.entity::<Customer>();

        assert!(options.ptr_eq(&clone));
        assert!(Arc::ptr_eq(&from_clone, &options.entity::<Customer>()));
    }

    #[test]
    fn test_separate_registries_do_not_share() {
        let a = SearchConfigurationOptions::new();
        let b = SearchConfigurationOptions::new();

        assert!(!a.ptr_eq(&b));
        assert!(!Arc::ptr_eq(&a.entity::<Customer>(), &b.entity::<Customer>()));
    }

    #[test]
    fn test_default_search_field_names() {
        assert_eq!(
            SearchConfigurationOptions::default_search_field_names(),
            &["Name", "Title", "Description"]
        );
    }

    #[test]
    fn test_seal_is_idempotent() {
        let options = SearchConfigurationOptions::new();
        options.seal();
        options.seal();
        assert!(options.is_sealed());
    }

    #[test]
    fn test_snapshot_is_sorted_by_entity() {
        let options = SearchConfigurationOptions::new();
        options
            .entity::<Product>()
            .declare_with("Sku", MatchMode::Exact)
            .unwrap();
        options.entity::<Customer>();

        let snapshot = options.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].entity, "Customer");
        assert!(!snapshot[0].explicit);
        assert_eq!(snapshot[1].entity, "Product");
        assert!(snapshot[1].explicit);
        assert_eq!(snapshot[1].fields[0].name, "Sku");
    }

    #[test]
    fn test_debug_lists_entities() {
        let options = SearchConfigurationOptions::new();
        options.entity::<Customer>();
        let debug = format!("{:?}", options);
        assert!(debug.contains("Customer"));
        assert!(debug.contains("sealed: false"));
    }
}
