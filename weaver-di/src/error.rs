//! Describes dependency injection errors

use crate::key::KeyInfo;
use std::{
    error::Error as StdError,
    fmt::{self, Display, Formatter},
    sync::Arc,
};

/// An error type that factories may fail with
pub type BoxError = Box<
    dyn StdError
    + Send
    + Sync
>;

/// Shared factory error, so a single failure can be delivered to every waiter
pub type SharedError = Arc<
    dyn StdError
    + Send
    + Sync
>;

/// Container configuration errors
#[derive(Debug, Clone)]
pub enum ConfigurationError {
    /// The key has already been registered on this builder
    DuplicateKey(KeyInfo),
    /// A declared dependency has no registration
    MissingDependency {
        /// A key that declares the dependency
        key: KeyInfo,
        /// A declared dependency that is not registered
        dependency: KeyInfo,
    },
    /// Declared dependencies form a cycle, the repeated key is the last one
    DependencyCycle(Vec<KeyInfo>),
}

/// Dependency injection errors
#[derive(Debug, Clone)]
pub enum Error {
    /// The container could not be configured
    Configuration(ConfigurationError),
    /// The key was resolved but never registered
    UnregisteredKey(KeyInfo),
    /// The key is already being constructed on the current resolution chain
    CyclicDependency(Vec<KeyInfo>),
    /// The factory of the key failed
    FactoryFailed {
        /// A key whose factory failed
        key: KeyInfo,
        /// The factory error
        source: SharedError,
    },
    /// The stored value does not match the key's value type
    TypeMismatch(KeyInfo),
    /// The resolver outlived its container
    ContainerMissing,
}

impl Error {
    /// Returns `true` if this is a configuration error
    #[inline]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Configuration(_))
    }

    /// Returns the key the error is about, if any
    pub fn key(&self) -> Option<KeyInfo> {
        match self {
            Error::Configuration(ConfigurationError::DuplicateKey(key)) => Some(*key),
            Error::Configuration(ConfigurationError::MissingDependency { key, .. }) => Some(*key),
            Error::Configuration(ConfigurationError::DependencyCycle(path)) => path.last().copied(),
            Error::UnregisteredKey(key) => Some(*key),
            Error::CyclicDependency(path) => path.last().copied(),
            Error::FactoryFailed { key, .. } => Some(*key),
            Error::TypeMismatch(key) => Some(*key),
            Error::ContainerMissing => None,
        }
    }

    /// Converts a factory error of `key` into [`Error`].
    ///
    /// Container errors returned by nested resolutions pass through unchanged.
    pub(crate) fn from_factory(key: KeyInfo, err: BoxError) -> Self {
        match err.downcast::<Error>() {
            Ok(err) => *err,
            Err(source) => Error::FactoryFailed { key, source: Arc::from(source) },
        }
    }
}

impl From<ConfigurationError> for Error {
    #[inline]
    fn from(err: ConfigurationError) -> Self {
        Error::Configuration(err)
    }
}

struct Path<'a>(&'a [KeyInfo]);

impl Display for Path<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, key) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" -> ")?;
            }
            write!(f, "{key}")?;
        }
        Ok(())
    }
}

impl Display for ConfigurationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationError::DuplicateKey(key) => write!(f, "key already registered: {key}"),
            ConfigurationError::MissingDependency { key, dependency } => write!(
                f,
                "{key} depends on {dependency} ({}) which is not registered",
                dependency.value_type()
            ),
            ConfigurationError::DependencyCycle(path) => write!(f, "declared dependency cycle: {}", Path(path)),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Error::Configuration(err) => write!(f, "Container Error: {err}"),
            Error::UnregisteredKey(key) => write!(
                f,
                "Container Error: dependency not registered: {key} ({})",
                key.value_type()
            ),
            Error::CyclicDependency(path) => write!(f, "Container Error: cyclic dependency: {}", Path(path)),
            Error::FactoryFailed { key, source } => write!(f, "Container Error: factory of {key} failed: {source}"),
            Error::TypeMismatch(key) => write!(
                f,
                "Container Error: unable to resolve {key} as {}",
                key.value_type()
            ),
            Error::ContainerMissing => write!(f, "Container Error: DI container is missing"),
        }
    }
}

impl StdError for ConfigurationError {}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Configuration(err) => Some(err),
            Error::FactoryFailed { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}
