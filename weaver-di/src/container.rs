//! Dependency Injection container and tools

use crate::{
    error::Error,
    key::{DependencyKey, KeyHashBuilder, KeyInfo},
    registration::Registration,
};
use cell::InstanceCell;
use factory::{ArcValue, Construction, FactoryFn};
use futures_util::FutureExt;
use indexmap::IndexMap;
use resolver::ResolutionPath;
use waits::WaitGraph;
use std::{
    fmt,
    sync::Arc,
};

pub use builder::ContainerBuilder;
pub use resolver::Resolver;

mod builder;
mod cell;
mod factory;
mod resolver;
mod waits;

pub(crate) enum ServiceEntry {
    Instance(ArcValue),
    Container(InstanceCell, FactoryFn),
    Transient(FactoryFn),
}

impl ServiceEntry {
    #[inline]
    fn as_scope(&self) -> Self {
        match self {
            ServiceEntry::Instance(instance) => ServiceEntry::Instance(instance.clone()),
            ServiceEntry::Container(_, factory) => ServiceEntry::Container(InstanceCell::new(), factory.clone()),
            ServiceEntry::Transient(factory) => ServiceEntry::Transient(factory.clone()),
        }
    }
}

/// A registration together with its factory and instance cell
pub(crate) struct Service {
    registration: Registration,
    entry: ServiceEntry,
}

impl fmt::Debug for Service {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Service")
            .field("registration", &self.registration)
            .finish_non_exhaustive()
    }
}

impl Service {
    #[inline]
    fn as_scope(&self) -> Self {
        Self {
            registration: self.registration.clone(),
            entry: self.entry.as_scope(),
        }
    }
}

/// Inner map of dependencies in registration order
pub(crate) type ServiceMap = IndexMap<
    KeyInfo,
    Service,
    KeyHashBuilder
>;

/// Registered services shared by a container and its clones
#[derive(Debug)]
pub(crate) struct Services {
    entries: ServiceMap,
    waits: WaitGraph,
}

impl From<ServiceMap> for Services {
    #[inline]
    fn from(entries: ServiceMap) -> Self {
        Self { entries, waits: WaitGraph::default() }
    }
}

/// Represents a DI container, that is able to resolve registered dependencies.
///
/// Cloning is cheap, clones share the same instances.
#[derive(Debug, Clone)]
pub struct Container {
    /// Read-only map of dependencies
    services: Arc<Services>,
}

impl Container {
    /// Creates a new DI container builder
    #[inline]
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    /// Creates a new container that inherits all registrations from its parent:
    ///
    /// - **Pre-built instances** are shared with the parent.
    /// - **Container** scoped dependencies are isolated: they are lazily created
    ///   the first time they are resolved within the new container.
    /// - **Transient** dependencies return a newly constructed value on each resolution.
    #[inline]
    pub fn create_scope(&self) -> Self {
        let entries = self.services.entries.iter()
            .map(|(key, service)| (*key, service.as_scope()))
            .collect::<ServiceMap>();
        Self { services: Arc::new(entries.into()) }
    }

    /// Returns a [`Resolver`] that does not keep this container alive
    #[inline]
    pub fn resolver(&self) -> Resolver {
        Resolver::new(self, ResolutionPath::root())
    }

    /// Resolves a dependency and returns a cloned value.
    /// `K::Value` must implement [`Clone`] otherwise use [`Container::resolve_shared`]
    /// method that returns a shared pointer.
    #[inline]
    pub async fn resolve<K>(&self) -> Result<K::Value, Error>
    where
        K: DependencyKey,
        K::Value: Clone,
    {
        self.resolve_shared::<K>()
            .await
            .map(|value| value.as_ref().clone())
    }

    /// Resolves a dependency and returns a shared pointer
    #[inline]
    pub async fn resolve_shared<K: DependencyKey>(&self) -> Result<Arc<K::Value>, Error> {
        self.resolve_in::<K>(&ResolutionPath::root()).await
    }

    /// Returns `true` if the `K` key is registered
    #[inline]
    pub fn is_registered<K: DependencyKey>(&self) -> bool {
        self.services.entries.contains_key(&KeyInfo::of::<K>())
    }

    /// Returns the registration of the `K` key, if any
    #[inline]
    pub fn registration<K: DependencyKey>(&self) -> Option<&Registration> {
        self.services.entries
            .get(&KeyInfo::of::<K>())
            .map(|service| &service.registration)
    }

    /// Returns an iterator over registrations in registration order
    #[inline]
    pub fn registrations(&self) -> impl Iterator<Item = &Registration> {
        self.services.entries.values().map(|service| &service.registration)
    }

    /// Returns the number of registrations
    #[inline]
    pub fn len(&self) -> usize {
        self.services.entries.len()
    }

    /// Returns `true` if nothing is registered
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.services.entries.is_empty()
    }

    pub(crate) async fn resolve_in<K: DependencyKey>(&self, path: &ResolutionPath) -> Result<Arc<K::Value>, Error> {
        let key = KeyInfo::of::<K>();
        self.resolve_erased(key, path)
            .await?
            .downcast::<K::Value>()
            .map_err(|_| Error::TypeMismatch(key))
    }

    async fn resolve_erased(&self, key: KeyInfo, path: &ResolutionPath) -> Result<ArcValue, Error> {
        let service = self.services.entries
            .get(&key)
            .ok_or(Error::UnregisteredKey(key))?;

        match &service.entry {
            ServiceEntry::Instance(instance) => Ok(instance.clone()),
            ServiceEntry::Container(cell, factory) => {
                if let Some(instance) = cell.get() {
                    #[cfg(feature = "tracing")]
                    tracing::trace!(key = %key, "resolved from cache");
                    return Ok(instance);
                }
                // checked before joining, a construction can't await itself
                let inner = path.enter(key)?;
                cell.get_or_try_init(
                    || self.construct(key, factory, inner),
                    || self.services.waits.wait(path, key)
                ).await
            }
            ServiceEntry::Transient(factory) => {
                let path = path.enter(key)?;
                self.construct(key, factory, path).await
            }
        }
    }

    /// Returns a construction that invokes the factory on first poll
    #[inline]
    fn construct(&self, key: KeyInfo, factory: &FactoryFn, path: ResolutionPath) -> Construction {
        let factory = factory.clone();
        let resolver = Resolver::new(self, path);
        async move {
            #[cfg(feature = "tracing")]
            tracing::debug!(key = %key, depth = resolver.path().len(), "constructing");
            factory::construct(&factory, key, resolver).await
        }
        .boxed()
    }
}
