//! Keys that identify dependency slots in a container

use std::{
    any::{TypeId, type_name},
    fmt,
    hash::{BuildHasherDefault, Hash, Hasher},
};

/// A trait that describes a dependency slot.
///
/// A key is usually a unit struct. The key type is the identity of the slot,
/// so two keys may resolve values of the same type without clashing.
///
/// There is no default value: resolving a key that was never registered fails
/// with [`Error::UnregisteredKey`](crate::error::Error::UnregisteredKey).
///
/// # Example
/// ```
/// use weaver_di::DependencyKey;
///
/// struct Settings {
///     url: String,
/// }
///
/// struct SettingsKey;
///
/// impl DependencyKey for SettingsKey {
///     type Value = Settings;
/// }
/// ```
pub trait DependencyKey: Send + Sync + 'static {
    /// A type of value this key resolves to
    type Value: Send + Sync + 'static;

    /// A human-readable key name used in diagnostics
    ///
    /// Default: the key's type path
    #[inline]
    fn name() -> &'static str {
        type_name::<Self>()
    }
}

/// Type-erased identity of a [`DependencyKey`].
///
/// Equality and hashing use the key's [`TypeId`] only, the names are carried
/// for error messages.
#[derive(Clone, Copy)]
pub struct KeyInfo {
    id: TypeId,
    name: &'static str,
    value_type: &'static str,
}

impl KeyInfo {
    /// Creates a [`KeyInfo`] for the `K` key
    #[inline]
    pub fn of<K: DependencyKey>() -> Self {
        Self {
            id: TypeId::of::<K>(),
            name: K::name(),
            value_type: type_name::<K::Value>(),
        }
    }

    /// Returns the key name
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the name of the value type the key resolves to
    #[inline]
    pub fn value_type(&self) -> &'static str {
        self.value_type
    }

    /// Returns `true` if this is the identity of the `K` key
    #[inline]
    pub fn is<K: DependencyKey>(&self) -> bool {
        self.id == TypeId::of::<K>()
    }
}

impl PartialEq for KeyInfo {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for KeyInfo {}

impl Hash for KeyInfo {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for KeyInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyInfo")
            .field("name", &self.name)
            .field("value_type", &self.value_type)
            .finish()
    }
}

impl fmt::Display for KeyInfo {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Hash builder for maps keyed by [`KeyInfo`]
pub(crate) type KeyHashBuilder = BuildHasherDefault<KeyHasher>;

/// Pass-through hasher, [`TypeId`] is already a hash
#[derive(Default)]
pub(crate) struct KeyHasher(u64);

impl Hasher for KeyHasher {
    #[inline]
    fn finish(&self) -> u64 {
        self.0
    }

    #[cold]
    fn write(&mut self, _: &[u8]) {
        unreachable!("TypeId calls write_u64");
    }

    #[inline]
    fn write_u64(&mut self, id: u64) {
        self.0 = id;
    }
}

/// A `keys!` macro that builds a list of [`KeyInfo`] from key types.
///
/// Used to declare the dependencies a factory is going to resolve.
///
/// # Macro Syntax
/// ```ignore
/// keys![Key1, Key2, …, KeyN]
/// ```
///
/// # Example
/// ```
/// use weaver_di::{DependencyKey, KeyInfo, keys};
///
/// struct A;
/// struct B;
///
/// impl DependencyKey for A { type Value = i32; }
/// impl DependencyKey for B { type Value = String; }
///
/// let deps = keys![A, B];
///
/// assert_eq!(deps, vec![KeyInfo::of::<A>(), KeyInfo::of::<B>()]);
/// assert!(keys![].is_empty());
/// ```
#[macro_export]
macro_rules! keys {
    ($($key:ty),* $(,)?) => {
        ::std::vec::Vec::<$crate::KeyInfo>::from([$($crate::KeyInfo::of::<$key>()),*])
    };
}
