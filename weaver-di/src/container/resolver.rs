//! Resolver handle passed to factories

use super::{Container, Services};
use crate::{
    error::Error,
    key::{DependencyKey, KeyInfo},
};
use std::{
    fmt,
    sync::{Arc, Weak},
};

/// A handle that factories use to resolve their own dependencies.
///
/// A resolver does not keep its container alive: if the container has been
/// dropped, every resolution fails with [`Error::ContainerMissing`].
///
/// It also carries the keys that are currently being constructed on this
/// call chain, so a key that transitively depends on itself is reported as
/// [`Error::CyclicDependency`] instead of waiting forever.
#[derive(Clone)]
pub struct Resolver {
    services: Weak<Services>,
    path: ResolutionPath,
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("path", &self.path.as_slice())
            .finish()
    }
}

impl Resolver {
    #[inline]
    pub(crate) fn new(container: &Container, path: ResolutionPath) -> Self {
        Self {
            services: Arc::downgrade(&container.services),
            path,
        }
    }

    #[inline]
    fn container(&self) -> Result<Container, Error> {
        self.services
            .upgrade()
            .map(|services| Container { services })
            .ok_or(Error::ContainerMissing)
    }

    /// Resolves a dependency and returns a shared pointer
    pub async fn resolve_shared<K: DependencyKey>(&self) -> Result<Arc<K::Value>, Error> {
        self.container()?
            .resolve_in::<K>(&self.path)
            .await
    }

    /// Resolves a dependency and returns a cloned value.
    /// `K::Value` must implement [`Clone`] otherwise use [`Resolver::resolve_shared`]
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

    /// Returns `true` if the `K` key is registered in the container
    #[inline]
    pub fn is_registered<K: DependencyKey>(&self) -> bool {
        self.container()
            .is_ok_and(|container| container.is_registered::<K>())
    }

    /// Returns the keys under construction on this call chain, root first
    #[inline]
    pub fn path(&self) -> &[KeyInfo] {
        self.path.as_slice()
    }
}

/// Keys under construction on a single resolution chain
#[derive(Debug, Clone)]
pub(crate) struct ResolutionPath(Arc<[KeyInfo]>);

impl ResolutionPath {
    #[inline]
    pub(crate) fn root() -> Self {
        Self(Vec::new().into())
    }

    #[inline]
    pub(crate) fn as_slice(&self) -> &[KeyInfo] {
        &self.0
    }

    #[inline]
    fn contains(&self, key: KeyInfo) -> bool {
        self.0.contains(&key)
    }

    /// Extends the path with `key` or fails if `key` is already on it
    pub(crate) fn enter(&self, key: KeyInfo) -> Result<Self, Error> {
        let mut path = Vec::with_capacity(self.0.len() + 1);
        path.extend_from_slice(&self.0);
        path.push(key);

        if self.contains(key) {
            #[cfg(feature = "tracing")]
            tracing::warn!(key = %key, "cyclic dependency detected");
            return Err(Error::CyclicDependency(path));
        }

        Ok(Self(path.into()))
    }
}
