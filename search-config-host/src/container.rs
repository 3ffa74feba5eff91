//! A minimal service container.
//!
//! Services are registered on a [`ServiceCollection`] with a [`ServiceLifetime`] and
//! a fallible factory, then resolved from the [`ServiceProvider`] built from it or
//! from any [`ServiceScope`] created by that provider.
//!
//! Every cached instance lives in its own slot, so a singleton or scoped service is
//! created exactly once even when first requested from several threads. A slot is
//! marked with the resolution creating it and no lock is held while its factory
//! runs. Resolutions that wait on each other's slots are tracked provider-wide, so
//! a dependency cycle split across threads fails instead of blocking.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use tracing::{debug, trace};

use crate::errors::HostError;
use crate::lifetime::ServiceLifetime;

type Instance = Arc<dyn Any + Send + Sync>;
type Factory = Arc<dyn Fn(&ServiceResolver<'_>) -> Result<Instance, HostError> + Send + Sync>;
type Slots = HashMap<TypeId, Slot>;

/// Identifies one top-level resolution and every nested resolution it triggers.
type ResolutionId = u64;

static NEXT_RESOLUTION: AtomicU64 = AtomicU64::new(1);

#[derive(Default)]
enum SlotState {
    #[default]
    Empty,
    Creating(ResolutionId),
    Ready(Instance),
}

#[derive(Default)]
struct Slot {
    state: Mutex<SlotState>,
    settled: Condvar,
}

impl Slot {
    fn lock(&self) -> MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Resets a slot left in the creating state when its factory fails or panics.
struct CreationGuard<'a> {
    slot: &'a Slot,
    instance: Option<Instance>,
}

impl Drop for CreationGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.slot.lock();
        *state = match self.instance.take() {
            Some(instance) => SlotState::Ready(instance),
            None => SlotState::Empty,
        };
        drop(state);
        self.slot.settled.notify_all();
    }
}

struct Registration {
    name: &'static str,
    lifetime: ServiceLifetime,
    factory: Factory,
}

/// Registration table used to build a [`ServiceProvider`].
#[derive(Default)]
pub struct ServiceCollection {
    registrations: HashMap<TypeId, Registration>,
}

impl ServiceCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a service of type `S` with the given lifetime.
    ///
    /// Registering the same type again replaces the previous registration.
    pub fn add<S, F>(&mut self, lifetime: ServiceLifetime, factory: F) -> &mut Self
    where
        S: Send + Sync + 'static,
        F: Fn(&ServiceResolver<'_>) -> Result<S, HostError> + Send + Sync + 'static,
    {
        let factory: Factory = Arc::new(
            move |resolver: &ServiceResolver<'_>| -> Result<Instance, HostError> {
                let instance: Instance = Arc::new(factory(resolver)?);
                Ok(instance)
            },
        );
        self.insert::<S>(lifetime, factory)
    }

    pub fn add_singleton<S, F>(&mut self, factory: F) -> &mut Self
    where
        S: Send + Sync + 'static,
        F: Fn(&ServiceResolver<'_>) -> Result<S, HostError> + Send + Sync + 'static,
    {
        self.add(ServiceLifetime::Singleton, factory)
    }

    pub fn add_scoped<S, F>(&mut self, factory: F) -> &mut Self
    where
        S: Send + Sync + 'static,
        F: Fn(&ServiceResolver<'_>) -> Result<S, HostError> + Send + Sync + 'static,
    {
        self.add(ServiceLifetime::Scoped, factory)
    }

    pub fn add_transient<S, F>(&mut self, factory: F) -> &mut Self
    where
        S: Send + Sync + 'static,
        F: Fn(&ServiceResolver<'_>) -> Result<S, HostError> + Send + Sync + 'static,
    {
        self.add(ServiceLifetime::Transient, factory)
    }

    /// Register an already constructed singleton.
    pub fn add_instance<S>(&mut self, instance: S) -> &mut Self
    where
        S: Send + Sync + 'static,
    {
        let instance: Instance = Arc::new(instance);
        let factory: Factory = Arc::new(
            move |_: &ServiceResolver<'_>| -> Result<Instance, HostError> {
                Ok(Arc::clone(&instance))
            },
        );
        self.insert::<S>(ServiceLifetime::Singleton, factory)
    }

    pub fn contains<S: 'static>(&self) -> bool {
        self.registrations.contains_key(&TypeId::of::<S>())
    }

    /// Lifetime `S` is registered with, if it is registered.
    pub fn lifetime_of<S: 'static>(&self) -> Option<ServiceLifetime> {
        self.registrations
            .get(&TypeId::of::<S>())
            .map(|registration| registration.lifetime)
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Freeze the registrations into a provider.
    pub fn build(self) -> ServiceProvider {
        let singletons = slots_for(&self.registrations, ServiceLifetime::Singleton);
        let state = Arc::new(ProviderState {
            registrations: self.registrations,
            singletons,
            waits: Mutex::new(HashMap::new()),
        });

        debug!(
            services = state.registrations.len(),
            "Service provider built"
        );

        ServiceProvider {
            root: Arc::new(slots_for(&state.registrations, ServiceLifetime::Scoped)),
            state,
        }
    }

    fn insert<S: 'static>(&mut self, lifetime: ServiceLifetime, factory: Factory) -> &mut Self {
        let name = std::any::type_name::<S>();
        let registration = Registration {
            name,
            lifetime,
            factory,
        };

        if self
            .registrations
            .insert(TypeId::of::<S>(), registration)
            .is_some()
        {
            debug!(service = name, %lifetime, "Replaced service registration");
        } else {
            trace!(service = name, %lifetime, "Registered service");
        }

        self
    }
}

impl fmt::Debug for ServiceCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut services: Vec<_> = self
            .registrations
            .values()
            .map(|registration| (registration.name, registration.lifetime))
            .collect();
        services.sort_unstable_by_key(|(name, _)| *name);

        f.debug_struct("ServiceCollection")
            .field("services", &services)
            .finish()
    }
}

fn slots_for(registrations: &HashMap<TypeId, Registration>, lifetime: ServiceLifetime) -> Slots {
    registrations
        .iter()
        .filter(|(_, registration)| registration.lifetime == lifetime)
        .map(|(key, _)| (*key, Slot::default()))
        .collect()
}

struct ProviderState {
    registrations: HashMap<TypeId, Registration>,
    singletons: Slots,
    /// Which resolution each blocked resolution is waiting for.
    waits: Mutex<HashMap<ResolutionId, ResolutionId>>,
}

impl ProviderState {
    fn lock_waits(&self) -> MutexGuard<'_, HashMap<ResolutionId, ResolutionId>> {
        self.waits.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Returns true if `from` is, directly or transitively, waiting for `target`.
fn waits_for(
    waits: &HashMap<ResolutionId, ResolutionId>,
    from: ResolutionId,
    target: ResolutionId,
) -> bool {
    let mut current = from;
    for _ in 0..=waits.len() {
        if current == target {
            return true;
        }
        match waits.get(&current) {
            Some(next) => current = *next,
            None => return false,
        }
    }
    false
}

/// Anything services can be resolved from.
pub trait Resolve {
    /// Resolve `S`, or `Ok(None)` if it is not registered.
    fn get<S: Send + Sync + 'static>(&self) -> Result<Option<Arc<S>>, HostError>;

    /// Resolve `S`, failing with [`HostError::MissingRegistration`] if it is not registered.
    fn get_required<S: Send + Sync + 'static>(&self) -> Result<Arc<S>, HostError> {
        self.get::<S>()?.ok_or_else(|| {
            HostError::missing_registration(std::any::type_name::<S>(), "ServiceCollection::add")
        })
    }
}

/// Root service provider.
///
/// Owns the singleton instances. The provider is also a scope of its own, so
/// scoped services resolved directly from it are shared by every root resolution.
#[derive(Clone)]
pub struct ServiceProvider {
    state: Arc<ProviderState>,
    root: Arc<Slots>,
}

impl ServiceProvider {
    /// Create a new scope. Scoped services resolved from it live as long as the scope.
    pub fn create_scope(&self) -> ServiceScope {
        ServiceScope {
            state: Arc::clone(&self.state),
            slots: slots_for(&self.state.registrations, ServiceLifetime::Scoped),
        }
    }
}

impl Resolve for ServiceProvider {
    fn get<S: Send + Sync + 'static>(&self) -> Result<Option<Arc<S>>, HostError> {
        ServiceResolver::new(&self.state, &self.root).get::<S>()
    }
}

impl fmt::Debug for ServiceProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceProvider")
            .field("services", &self.state.registrations.len())
            .finish()
    }
}

/// A resolution scope created by [`ServiceProvider::create_scope`].
pub struct ServiceScope {
    state: Arc<ProviderState>,
    slots: Slots,
}

impl Resolve for ServiceScope {
    fn get<S: Send + Sync + 'static>(&self) -> Result<Option<Arc<S>>, HostError> {
        ServiceResolver::new(&self.state, &self.slots).get::<S>()
    }
}

impl fmt::Debug for ServiceScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceScope")
            .field("scoped_services", &self.slots.len())
            .finish()
    }
}

/// Resolver handed to service factories.
///
/// Tracks the chain of services currently being created so that a factory that
/// depends on itself fails with [`HostError::CircularDependency`] instead of
/// waiting on its own slot, and so that a singleton cannot capture a scoped
/// service.
pub struct ServiceResolver<'a> {
    state: &'a ProviderState,
    scope: &'a Slots,
    id: ResolutionId,
    chain: RefCell<Vec<(TypeId, &'a Registration)>>,
}

impl<'a> ServiceResolver<'a> {
    fn new(state: &'a ProviderState, scope: &'a Slots) -> Self {
        Self {
            state,
            scope,
            id: NEXT_RESOLUTION.fetch_add(1, Ordering::Relaxed),
            chain: RefCell::new(Vec::new()),
        }
    }

    fn resolve(&self, key: TypeId) -> Result<Option<Instance>, HostError> {
        let Some(registration) = self.state.registrations.get(&key) else {
            return Ok(None);
        };

        if self.chain.borrow().iter().any(|(k, _)| *k == key) {
            return Err(self.circular(registration));
        }

        if registration.lifetime == ServiceLifetime::Scoped {
            let chain = self.chain.borrow();
            let singleton = chain
                .iter()
                .find(|(_, r)| r.lifetime == ServiceLifetime::Singleton);
            if let Some((_, dependent)) = singleton {
                return Err(HostError::captive_dependency(dependent.name, registration.name));
            }
        }

        let instance = match registration.lifetime {
            ServiceLifetime::Transient => self.create(key, registration)?,
            ServiceLifetime::Singleton => self.cached(&self.state.singletons, key, registration)?,
            ServiceLifetime::Scoped => self.cached(self.scope, key, registration)?,
        };

        Ok(Some(instance))
    }

    fn cached(
        &self,
        slots: &Slots,
        key: TypeId,
        registration: &'a Registration,
    ) -> Result<Instance, HostError> {
        let Some(slot) = slots.get(&key) else {
            return self.create(key, registration);
        };

        let mut state = slot.lock();
        loop {
            let owner = match &*state {
                SlotState::Ready(instance) => return Ok(Arc::clone(instance)),
                SlotState::Empty => break,
                SlotState::Creating(owner) => *owner,
            };

            {
                let mut waits = self.state.lock_waits();
                if waits_for(&waits, owner, self.id) {
                    return Err(self.circular(registration));
                }
                waits.insert(self.id, owner);
            }
            state = slot
                .settled
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
            self.state.lock_waits().remove(&self.id);
        }

        *state = SlotState::Creating(self.id);
        drop(state);

        let mut guard = CreationGuard {
            slot,
            instance: None,
        };
        let instance = self.create(key, registration)?;
        guard.instance = Some(Arc::clone(&instance));
        Ok(instance)
    }

    fn create(&self, key: TypeId, registration: &'a Registration) -> Result<Instance, HostError> {
        self.chain.borrow_mut().push((key, registration));
        let result = (registration.factory)(self);
        self.chain.borrow_mut().pop();

        if result.is_ok() {
            trace!(
                service = registration.name,
                lifetime = %registration.lifetime,
                "Created service instance"
            );
        }

        result
    }

    fn circular(&self, registration: &Registration) -> HostError {
        let mut names: Vec<_> = self.chain.borrow().iter().map(|(_, r)| r.name).collect();
        names.push(registration.name);
        HostError::circular_dependency(&names)
    }
}

impl Resolve for ServiceResolver<'_> {
    fn get<S: Send + Sync + 'static>(&self) -> Result<Option<Arc<S>>, HostError> {
        Ok(self.resolve(TypeId::of::<S>())?.map(downcast::<S>))
    }
}

/// Restore the concrete type of a resolved instance.
///
/// Registrations under `TypeId::of::<S>()` are only created by the typed
/// `ServiceCollection` methods for the same `S`, so the downcast cannot fail.
fn downcast<S: Send + Sync + 'static>(instance: Instance) -> Arc<S> {
    match instance.downcast::<S>() {
        Ok(instance) => instance,
        Err(_) => unreachable!(
            "service {} stored under a foreign TypeId",
            std::any::type_name::<S>()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize};
    use std::sync::Barrier;
    use std::thread;

    #[derive(Debug)]
    struct Counter(usize);

    fn counting_collection(lifetime: ServiceLifetime) -> (ServiceCollection, Arc<AtomicUsize>) {
        let created = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&created);
        let mut services = ServiceCollection::new();
        services.add(lifetime, move |_| {
            Ok(Counter(counter.fetch_add(1, Ordering::SeqCst)))
        });
        (services, created)
    }

    #[test]
    fn test_singleton_is_shared_across_scopes() {
        let (services, created) = counting_collection(ServiceLifetime::Singleton);
        let provider = services.build();

        let root = provider.get_required::<Counter>().unwrap();
        let scoped = provider.create_scope().get_required::<Counter>().unwrap();

        assert!(Arc::ptr_eq(&root, &scoped));
        assert_eq!(created.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_scoped_is_shared_within_scope_only() {
        let (services, created) = counting_collection(ServiceLifetime::Scoped);
        let provider = services.build();

        let scope_a = provider.create_scope();
        let scope_b = provider.create_scope();
        let a1 = scope_a.get_required::<Counter>().unwrap();
        let a2 = scope_a.get_required::<Counter>().unwrap();
        let b1 = scope_b.get_required::<Counter>().unwrap();

        assert!(Arc::ptr_eq(&a1, &a2));
        assert!(!Arc::ptr_eq(&a1, &b1));
        assert_eq!(created.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_transient_is_never_cached() {
        let (services, created) = counting_collection(ServiceLifetime::Transient);
        let provider = services.build();

        let first = provider.get_required::<Counter>().unwrap();
        let second = provider.get_required::<Counter>().unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first.0, 0);
        assert_eq!(second.0, 1);
        assert_eq!(created.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unregistered_service_is_none() {
        let provider = ServiceCollection::new().build();
        assert!(provider.get::<Counter>().unwrap().is_none());

        let err = provider.get_required::<Counter>().unwrap_err();
        assert!(matches!(err, HostError::MissingRegistration { .. }));
        assert!(err.to_string().contains("Counter"));
    }

    #[test]
    fn test_factories_can_resolve_dependencies() {
        struct Prefix(&'static str);
        struct Greeting(String);

        let mut services = ServiceCollection::new();
        services.add_instance(Prefix("hello"));
        services.add_transient(|resolver| {
            let prefix = resolver.get_required::<Prefix>()?;
            Ok(Greeting(format!("{} world", prefix.0)))
        });

        let provider = services.build();
        let greeting = provider.get_required::<Greeting>().unwrap();
        assert_eq!(greeting.0, "hello world");
    }

    #[test]
    fn test_self_dependency_is_reported() {
        #[derive(Debug)]
        struct Loop;

        let mut services = ServiceCollection::new();
        services.add_singleton(|resolver| {
            resolver.get_required::<Loop>()?;
            Ok(Loop)
        });

        let provider = services.build();
        let err = provider.get::<Loop>().unwrap_err();
        assert!(matches!(err, HostError::CircularDependency { .. }));
    }

    #[test]
    fn test_cycle_split_across_threads_fails_instead_of_blocking() {
        struct Left;
        struct Right;

        // Both factories park on the barrier on their first run, so each thread
        // owns one slot before asking for the other.
        let start = Arc::new(Barrier::new(2));
        let mut services = ServiceCollection::new();
        {
            let start = Arc::clone(&start);
            let first = AtomicBool::new(true);
            services.add_singleton(move |resolver| {
                if first.swap(false, Ordering::SeqCst) {
                    start.wait();
                }
                resolver.get_required::<Right>()?;
                Ok(Left)
            });
        }
        {
            let start = Arc::clone(&start);
            let first = AtomicBool::new(true);
            services.add_singleton(move |resolver| {
                if first.swap(false, Ordering::SeqCst) {
                    start.wait();
                }
                resolver.get_required::<Left>()?;
                Ok(Right)
            });
        }

        let provider = services.build();
        let left = {
            let provider = provider.clone();
            thread::spawn(move || provider.get::<Left>().map(|_| ()))
        };
        let right = {
            let provider = provider.clone();
            thread::spawn(move || provider.get::<Right>().map(|_| ()))
        };

        for result in [left.join().unwrap(), right.join().unwrap()] {
            assert!(matches!(result, Err(HostError::CircularDependency { .. })));
        }
        // Slots were released, so a later resolution fails the same way.
        assert!(matches!(
            provider.get::<Left>(),
            Err(HostError::CircularDependency { .. })
        ));
    }

    #[test]
    fn test_singleton_cannot_capture_scoped_service() {
        struct RequestContext;
        #[derive(Debug)]
        struct Cache;
        struct Handler;

        let mut services = ServiceCollection::new();
        services.add_scoped(|_| Ok(RequestContext));
        services.add_singleton(|resolver| {
            resolver.get_required::<RequestContext>()?;
            Ok(Cache)
        });
        services.add_transient(|resolver| {
            resolver.get_required::<RequestContext>()?;
            Ok(Handler)
        });

        let provider = services.build();
        let scope = provider.create_scope();

        let err = scope.get::<Cache>().unwrap_err();
        assert!(matches!(err, HostError::CaptiveDependency { .. }));
        assert!(err.to_string().contains("RequestContext"));
        assert!(scope.get_required::<Handler>().is_ok());
    }

    #[test]
    fn test_failed_factory_is_retried_on_next_resolution() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);

        let mut services = ServiceCollection::new();
        services.add_singleton(move |_| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(HostError::factory("not yet"))
            } else {
                Ok(Counter(7))
            }
        });

        let provider = services.build();
        assert!(provider.get::<Counter>().is_err());
        assert_eq!(provider.get_required::<Counter>().unwrap().0, 7);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_reregistration_replaces_lifetime() {
        let mut services = ServiceCollection::new();
        services.add_singleton(|_| Ok(Counter(0)));
        services.add_transient(|_| Ok(Counter(1)));

        assert_eq!(services.len(), 1);
        assert_eq!(
            services.lifetime_of::<Counter>(),
            Some(ServiceLifetime::Transient)
        );
    }
}
