//! Modules that group registrations

use crate::{container::ContainerBuilder, error::Error};

/// A set of registrations that is added to a builder as a whole.
///
/// Any `Fn(&mut ContainerBuilder) -> Result<(), Error>` is a module as well.
///
/// # Example
/// ```
/// use weaver_di::{Container, ContainerBuilder, DependencyKey, Error, Module, Scope, keys};
///
/// struct Port;
///
/// impl DependencyKey for Port {
///     type Value = u16;
/// }
///
/// struct Network {
///     port: u16,
/// }
///
/// impl Module for Network {
///     fn configure(&self, builder: &mut ContainerBuilder) -> Result<(), Error> {
///         let port = self.port;
///         builder.register(Port, Scope::Container, keys![], move |_| async move { Ok(port) })?;
///         Ok(())
///     }
/// }
///
/// let mut builder = Container::builder();
/// builder.add_module(&Network { port: 8080 }).unwrap();
///
/// assert!(builder.contains::<Port>());
/// ```
pub trait Module {
    /// Registers the module's dependencies
    fn configure(&self, builder: &mut ContainerBuilder) -> Result<(), Error>;
}

impl<F> Module for F
where
    F: Fn(&mut ContainerBuilder) -> Result<(), Error>
{
    #[inline]
    fn configure(&self, builder: &mut ContainerBuilder) -> Result<(), Error> {
        self(builder)
    }
}
