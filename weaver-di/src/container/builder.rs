//! Container builder and static validation

use super::{
    Container, Service, ServiceEntry, ServiceMap,
    Resolver,
    cell::InstanceCell,
    factory::make_factory_fn,
};
use crate::{
    error::{BoxError, ConfigurationError, Error},
    key::{DependencyKey, KeyHashBuilder, KeyInfo},
    module::Module,
    registration::{Registration, Scope},
};
use std::{
    collections::HashSet,
    future::Future,
    sync::Arc,
};

/// Represents a DI container builder,
/// that is able to register dependencies with a specific scope.
///
/// Each key can be registered once per builder.
#[derive(Debug, Default)]
pub struct ContainerBuilder {
    /// Registrations in registration order
    services: ServiceMap,
}

impl ContainerBuilder {
    /// Creates a new DI container builder
    #[inline]
    pub fn new() -> Self {
        Self { services: ServiceMap::default() }
    }

    /// Registers a factory for the `K` key.
    ///
    /// `dependencies` lists the keys the factory is going to resolve,
    /// they are only used by [`ContainerBuilder::validate`].
    ///
    /// # Example
    /// ```
    /// use weaver_di::{Container, DependencyKey, Scope, keys};
    ///
    /// struct Url;
    /// struct Greeting;
    ///
    /// impl DependencyKey for Url { type Value = String; }
    /// impl DependencyKey for Greeting { type Value = String; }
    ///
    /// let mut builder = Container::builder();
    /// builder
    ///     .register(Url, Scope::Container, keys![], |_| async { Ok("localhost".to_string()) })
    ///     .unwrap()
    ///     .register(Greeting, Scope::Transient, keys![Url], |resolver| async move {
    ///         let url = resolver.resolve::<Url>().await?;
    ///         Ok(format!("hello from {url}"))
    ///     })
    ///     .unwrap();
    /// ```
    pub fn register<K, F, Fut, D>(
        &mut self,
        _key: K,
        scope: Scope,
        dependencies: D,
        factory: F,
    ) -> Result<&mut Self, Error>
    where
        K: DependencyKey,
        F: Fn(Resolver) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<K::Value, BoxError>> + Send + 'static,
        D: IntoIterator<Item = KeyInfo>,
    {
        let factory = make_factory_fn::<K, F, Fut>(factory);
        let entry = match scope {
            Scope::Container => ServiceEntry::Container(InstanceCell::new(), factory),
            Scope::Transient => ServiceEntry::Transient(factory),
        };
        let registration = Registration::new(
            KeyInfo::of::<K>(),
            scope,
            dependencies.into_iter().collect(),
        );
        self.insert(Service { registration, entry })
    }

    /// Registers an already constructed value for the `K` key.
    ///
    /// The value is shared by the container and every scope created from it.
    pub fn register_instance<K: DependencyKey>(&mut self, _key: K, value: K::Value) -> Result<&mut Self, Error> {
        let registration = Registration::new(KeyInfo::of::<K>(), Scope::Container, Vec::new());
        let entry = ServiceEntry::Instance(Arc::new(value));
        self.insert(Service { registration, entry })
    }

    /// Adds registrations of a [`Module`].
    ///
    /// If the module fails, registrations it has made so far are discarded.
    pub fn add_module<M: Module + ?Sized>(&mut self, module: &M) -> Result<&mut Self, Error> {
        let len = self.services.len();
        if let Err(err) = module.configure(self) {
            self.services.truncate(len);
            return Err(err);
        }
        Ok(self)
    }

    /// Returns `true` if the `K` key is registered
    #[inline]
    pub fn contains<K: DependencyKey>(&self) -> bool {
        self.services.contains_key(&KeyInfo::of::<K>())
    }

    /// Returns the number of registrations
    #[inline]
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Returns `true` if nothing is registered
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Returns an iterator over registrations in registration order
    #[inline]
    pub fn registrations(&self) -> impl Iterator<Item = &Registration> {
        self.services.values().map(|service| &service.registration)
    }

    /// Checks declared dependencies: each of them must be registered
    /// and they must not form a cycle.
    pub fn validate(&self) -> Result<(), Error> {
        for registration in self.registrations() {
            let missing = registration
                .dependencies()
                .iter()
                .find(|dependency| !self.services.contains_key(*dependency));

            if let Some(dependency) = missing {
                return Err(ConfigurationError::MissingDependency {
                    key: registration.key(),
                    dependency: *dependency,
                }.into());
            }
        }

        let mut visited = HashSet::with_hasher(KeyHashBuilder::default());
        let mut path = Vec::new();
        for key in self.services.keys() {
            self.visit(*key, &mut path, &mut visited)?;
        }
        Ok(())
    }

    fn visit(
        &self,
        key: KeyInfo,
        path: &mut Vec<KeyInfo>,
        visited: &mut HashSet<KeyInfo, KeyHashBuilder>,
    ) -> Result<(), ConfigurationError> {
        if let Some(start) = path.iter().position(|k| *k == key) {
            let mut cycle = path[start..].to_vec();
            cycle.push(key);
            return Err(ConfigurationError::DependencyCycle(cycle));
        }
        if visited.contains(&key) {
            return Ok(());
        }

        path.push(key);
        if let Some(service) = self.services.get(&key) {
            for dependency in service.registration.dependencies() {
                self.visit(*dependency, path, visited)?;
            }
        }
        path.pop();

        visited.insert(key);
        Ok(())
    }

    /// Builds a DI container.
    ///
    /// Nothing is constructed here, factories run on first resolution.
    #[inline]
    pub fn build(self) -> Container {
        #[cfg(feature = "tracing")]
        tracing::debug!(registrations = self.services.len(), "container built");
        Container {
            services: Arc::new(self.services.into()),
        }
    }

    /// Validates declared dependencies and builds a DI container
    #[inline]
    pub fn build_validated(self) -> Result<Container, Error> {
        self.validate()?;
        Ok(self.build())
    }

    fn insert(&mut self, service: Service) -> Result<&mut Self, Error> {
        let key = service.registration.key();
        if self.services.contains_key(&key) {
            #[cfg(feature = "tracing")]
            tracing::warn!(key = %key, "duplicate registration rejected");
            return Err(ConfigurationError::DuplicateKey(key).into());
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(key = %key, scope = ?service.registration.scope(), "registered");
        self.services.insert(key, service);
        Ok(self)
    }
}
