//! Dependency injection container.
//!
//! Services are registered on a [`Container`] at application startup
//! and resolved by type. The container is threaded explicitly through
//! the application — there is no ambient global instance.
//!
//! Three lifetimes are supported:
//!
//! - [`Lifetime::Transient`] — the factory runs on every resolution.
//! - [`Lifetime::Singleton`] — the factory runs once; the instance is
//!   cached for the container's lifetime.
//! - [`Lifetime::Scoped`] — one instance per request, cached in the
//!   [`ScopedContainer`] that dispatch creates for each request.
//!
//! # Example
//!
//! ```rust
//! use portico_core::di::{Container, Lifetime};
//! use std::sync::Arc;
//!
//! struct Database {
//!     connection_string: String,
//! }
//!
//! let mut container = Container::new();
//! container.add_instance(Arc::new(Database {
//!     connection_string: "postgres://localhost/db".to_string(),
//! }));
//!
//! let db: Arc<Database> = container.get().unwrap();
//! assert_eq!(db.connection_string, "postgres://localhost/db");
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

/// Service lifetime controlling how often a factory runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifetime {
    /// A new instance per resolution.
    Transient,
    /// One instance for the container's lifetime, created lazily.
    Singleton,
    /// One instance per request scope.
    Scoped,
}

/// Error when a dependency cannot be resolved.
#[derive(Debug, Clone)]
pub struct InjectionError {
    /// The type name that could not be resolved.
    pub type_name: &'static str,
    /// The reason for the failure.
    pub reason: String,
}

impl fmt::Display for InjectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to inject {}: {}", self.type_name, self.reason)
    }
}

impl std::error::Error for InjectionError {}

impl InjectionError {
    /// Creates an injection error for a missing registration.
    pub fn not_registered<T>() -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            reason: "service not registered".to_string(),
        }
    }

    /// Creates an injection error for a scoped service resolved
    /// without a scope.
    pub fn requires_scope<T>() -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            reason: "scoped service must be resolved through a request scope".to_string(),
        }
    }
}

type BoxedService = Arc<dyn Any + Send + Sync>;
type BoxedFactory = Arc<dyn Fn(&Container) -> BoxedService + Send + Sync>;

enum Registration {
    Instance(BoxedService),
    Factory {
        lifetime: Lifetime,
        factory: BoxedFactory,
    },
}

/// A dependency injection container.
///
/// Registrations happen at startup; resolution is by type. The
/// container is `Send + Sync` and is shared behind an `Arc` by the
/// application.
#[derive(Default)]
pub struct Container {
    registrations: HashMap<TypeId, Registration>,
    /// Lazily created singleton instances.
    singletons: RwLock<HashMap<TypeId, BoxedService>>,
}

impl Container {
    /// Creates a new empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an existing instance as a singleton.
    pub fn add_instance<T: Send + Sync + 'static>(&mut self, service: Arc<T>) {
        self.registrations
            .insert(TypeId::of::<T>(), Registration::Instance(service));
    }

    /// Registers a factory with the given lifetime.
    ///
    /// The factory receives the container so it can resolve its own
    /// dependencies. Scoped factories resolve dependencies at the
    /// root container level.
    ///
    /// # Example
    ///
    /// ```rust
    /// use portico_core::di::{Container, Lifetime};
    /// use std::sync::Arc;
    ///
    /// struct Counter(u32);
    ///
    /// let mut container = Container::new();
    /// container.add_factory(Lifetime::Transient, |_| Arc::new(Counter(0)));
    ///
    /// assert!(container.get::<Counter>().is_some());
    /// ```
    pub fn add_factory<T, F>(&mut self, lifetime: Lifetime, factory: F)
    where
        T: Send + Sync + 'static,
        F: Fn(&Container) -> Arc<T> + Send + Sync + 'static,
    {
        let boxed: BoxedFactory = Arc::new(move |container| factory(container) as BoxedService);
        self.registrations.insert(
            TypeId::of::<T>(),
            Registration::Factory {
                lifetime,
                factory: boxed,
            },
        );
    }

    /// Resolves a service from the container.
    ///
    /// Returns `None` when the type is not registered or when it is
    /// registered with [`Lifetime::Scoped`] — scoped services must be
    /// resolved through a [`ScopedContainer`].
    #[must_use]
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        let key = TypeId::of::<T>();
        match self.registrations.get(&key)? {
            Registration::Instance(service) => service.clone().downcast::<T>().ok(),
            Registration::Factory { lifetime, factory } => match lifetime {
                Lifetime::Transient => factory(self).downcast::<T>().ok(),
                Lifetime::Singleton => {
                    if let Some(cached) = self.singletons.read().get(&key) {
                        return cached.clone().downcast::<T>().ok();
                    }
                    let created = factory(self);
                    self.singletons
                        .write()
                        .entry(key)
                        .or_insert(created)
                        .clone()
                        .downcast::<T>()
                        .ok()
                }
                Lifetime::Scoped => None,
            },
        }
    }

    /// Resolves a service or returns an error.
    ///
    /// # Errors
    ///
    /// Returns [`InjectionError`] when the type is not registered or
    /// is scoped and resolved without a scope.
    pub fn get_required<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, InjectionError> {
        if self.lifetime_of::<T>() == Some(Lifetime::Scoped) {
            return Err(InjectionError::requires_scope::<T>());
        }
        self.get()
            .ok_or_else(InjectionError::not_registered::<T>)
    }

    /// Returns the lifetime a type was registered with.
    #[must_use]
    pub fn lifetime_of<T: Send + Sync + 'static>(&self) -> Option<Lifetime> {
        match self.registrations.get(&TypeId::of::<T>())? {
            Registration::Instance(_) => Some(Lifetime::Singleton),
            Registration::Factory { lifetime, .. } => Some(*lifetime),
        }
    }

    /// Checks if a type is registered.
    #[must_use]
    pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
        self.registrations.contains_key(&TypeId::of::<T>())
    }

    /// Returns the number of registrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Creates a request scope over this container.
    #[must_use]
    pub fn create_scope(self: &Arc<Self>) -> ScopedContainer {
        ScopedContainer {
            container: Arc::clone(self),
            cache: Mutex::new(HashMap::new()),
        }
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("registration_count", &self.registrations.len())
            .finish()
    }
}

/// A per-request resolution scope.
///
/// Scoped services resolve to one cached instance per scope;
/// transient and singleton registrations delegate to the root
/// container. Dispatch creates one scope per request and attaches it
/// to the [`RequestContext`](crate::RequestContext).
pub struct ScopedContainer {
    container: Arc<Container>,
    cache: Mutex<HashMap<TypeId, BoxedService>>,
}

impl ScopedContainer {
    /// Resolves a service within this scope.
    #[must_use]
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        let key = TypeId::of::<T>();
        match self.container.registrations.get(&key)? {
            Registration::Factory {
                lifetime: Lifetime::Scoped,
                factory,
            } => {
                let mut cache = self.cache.lock();
                if let Some(cached) = cache.get(&key) {
                    return cached.clone().downcast::<T>().ok();
                }
                let created = factory(&self.container);
                cache.insert(key, created.clone());
                created.downcast::<T>().ok()
            }
            _ => self.container.get(),
        }
    }

    /// Resolves a service within this scope or returns an error.
    ///
    /// # Errors
    ///
    /// Returns [`InjectionError`] when the type is not registered.
    pub fn get_required<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, InjectionError> {
        self.get()
            .ok_or_else(InjectionError::not_registered::<T>)
    }

    /// Returns the root container.
    #[must_use]
    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }
}

impl fmt::Debug for ScopedContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedContainer")
            .field("cached", &self.cache.lock().len())
            .finish()
    }
}

/// A wrapper for injected dependencies.
///
/// # Example
///
/// ```rust
/// use portico_core::di::{Container, Inject};
/// use std::sync::Arc;
///
/// struct Mailer;
///
/// let mut container = Container::new();
/// container.add_instance(Arc::new(Mailer));
///
/// let mailer: Inject<Mailer> = Inject::from_container(&container).unwrap();
/// ```
#[derive(Clone)]
pub struct Inject<T>(pub Arc<T>);

impl<T> Inject<T> {
    /// Creates a new `Inject` wrapper.
    pub fn new(inner: Arc<T>) -> Self {
        Self(inner)
    }

    /// Returns a reference to the inner service.
    pub fn inner(&self) -> &T {
        &self.0
    }

    /// Converts into the inner `Arc`.
    pub fn into_inner(self) -> Arc<T> {
        self.0
    }
}

impl<T> std::ops::Deref for Inject<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T: fmt::Debug> fmt::Debug for Inject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Inject").field(&self.0).finish()
    }
}

impl<T: Send + Sync + 'static> Inject<T> {
    /// Extracts the service from a container.
    ///
    /// # Errors
    ///
    /// Returns [`InjectionError`] when the service is not registered.
    pub fn from_container(container: &Container) -> Result<Self, InjectionError> {
        container.get_required::<T>().map(Inject)
    }

    /// Extracts the service from a request scope.
    ///
    /// # Errors
    ///
    /// Returns [`InjectionError`] when the service is not registered.
    pub fn from_scope(scope: &ScopedContainer) -> Result<Self, InjectionError> {
        scope.get_required::<T>().map(Inject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct TestService {
        value: String,
    }

    #[test]
    fn test_container_new() {
        let container = Container::new();
        assert!(container.is_empty());
    }

    #[test]
    fn test_instance_registration() {
        let mut container = Container::new();
        container.add_instance(Arc::new(TestService {
            value: "hello".to_string(),
        }));

        let service: Arc<TestService> = container.get().unwrap();
        assert_eq!(service.value, "hello");
        assert_eq!(container.lifetime_of::<TestService>(), Some(Lifetime::Singleton));
    }

    #[test]
    fn test_missing_registration() {
        let container = Container::new();
        assert!(container.get::<TestService>().is_none());

        let err = container.get_required::<TestService>().unwrap_err();
        assert!(err.to_string().contains("not registered"));
    }

    #[test]
    fn test_transient_factory_runs_every_time() {
        static CREATED: AtomicUsize = AtomicUsize::new(0);

        struct Transient;

        let mut container = Container::new();
        container.add_factory(Lifetime::Transient, |_| {
            CREATED.fetch_add(1, Ordering::SeqCst);
            Arc::new(Transient)
        });

        container.get::<Transient>().unwrap();
        container.get::<Transient>().unwrap();
        assert_eq!(CREATED.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_singleton_factory_runs_once() {
        static CREATED: AtomicUsize = AtomicUsize::new(0);

        struct Single;

        let mut container = Container::new();
        container.add_factory(Lifetime::Singleton, |_| {
            CREATED.fetch_add(1, Ordering::SeqCst);
            Arc::new(Single)
        });

        container.get::<Single>().unwrap();
        container.get::<Single>().unwrap();
        assert_eq!(CREATED.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_factory_resolves_dependencies() {
        struct Config {
            url: String,
        }
        struct Database {
            url: String,
        }

        let mut container = Container::new();
        container.add_instance(Arc::new(Config {
            url: "postgres://db".to_string(),
        }));
        container.add_factory(Lifetime::Singleton, |c| {
            let config: Arc<Config> = c.get().expect("config registered");
            Arc::new(Database {
                url: config.url.clone(),
            })
        });

        let db: Arc<Database> = container.get().unwrap();
        assert_eq!(db.url, "postgres://db");
    }

    #[test]
    fn test_scoped_requires_scope() {
        #[derive(Debug)]
        struct PerRequest;

        let mut container = Container::new();
        container.add_factory(Lifetime::Scoped, |_| Arc::new(PerRequest));

        assert!(container.get::<PerRequest>().is_none());
        let err = container.get_required::<PerRequest>().unwrap_err();
        assert!(err.to_string().contains("request scope"));
    }

    #[test]
    fn test_scoped_cached_per_scope() {
        static CREATED: AtomicUsize = AtomicUsize::new(0);

        struct PerRequest;

        let mut container = Container::new();
        container.add_factory(Lifetime::Scoped, |_| {
            CREATED.fetch_add(1, Ordering::SeqCst);
            Arc::new(PerRequest)
        });
        let container = Arc::new(container);

        let scope_a = container.create_scope();
        scope_a.get::<PerRequest>().unwrap();
        scope_a.get::<PerRequest>().unwrap();
        assert_eq!(CREATED.load(Ordering::SeqCst), 1);

        let scope_b = container.create_scope();
        scope_b.get::<PerRequest>().unwrap();
        assert_eq!(CREATED.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_scope_delegates_non_scoped() {
        let mut container = Container::new();
        container.add_instance(Arc::new(TestService {
            value: "shared".to_string(),
        }));
        let container = Arc::new(container);

        let scope = container.create_scope();
        let service: Arc<TestService> = scope.get().unwrap();
        assert_eq!(service.value, "shared");
    }

    #[test]
    fn test_inject_deref() {
        let inject = Inject::new(Arc::new(TestService {
            value: "deref".to_string(),
        }));
        assert_eq!(inject.value, "deref");
    }

    #[test]
    fn test_inject_from_scope() {
        struct PerRequest;

        let mut container = Container::new();
        container.add_factory(Lifetime::Scoped, |_| Arc::new(PerRequest));
        let container = Arc::new(container);

        let scope = container.create_scope();
        assert!(Inject::<PerRequest>::from_scope(&scope).is_ok());
    }
}
