//! Registration descriptors

use crate::key::KeyInfo;
use std::sync::Arc;

/// Lifecycle policy of a registered dependency
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// One instance per container, created at most once on first resolution
    /// and shared by every resolver of that container
    #[default]
    Container,
    /// A new instance on every resolution, never cached
    Transient,
}

/// Describes a single registration: its key, scope and declared dependencies.
///
/// Declared dependencies are the keys the factory is going to resolve.
/// They are used for static validation and diagnostics only, the resolution
/// engine does not rely on them.
#[derive(Debug, Clone)]
pub struct Registration {
    key: KeyInfo,
    scope: Scope,
    dependencies: Arc<[KeyInfo]>,
}

impl Registration {
    #[inline]
    pub(crate) fn new(key: KeyInfo, scope: Scope, dependencies: Vec<KeyInfo>) -> Self {
        Self {
            key,
            scope,
            dependencies: dependencies.into(),
        }
    }

    /// Returns the registered key
    #[inline]
    pub fn key(&self) -> KeyInfo {
        self.key
    }

    /// Returns the lifecycle policy
    #[inline]
    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Returns the declared dependencies in declaration order
    #[inline]
    pub fn dependencies(&self) -> &[KeyInfo] {
        &self.dependencies
    }
}
