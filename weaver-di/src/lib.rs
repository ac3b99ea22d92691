//! Tools for dependency injection
//!
//! A container maps dependency keys to factories and resolves them on demand.
//! Every key is registered with a [`Scope`]: a [`Scope::Container`] value is
//! constructed at most once per container, a [`Scope::Transient`] value is
//! constructed on each resolution. Factories are async, they receive a
//! [`Resolver`] to resolve their own dependencies.
//!
//! # Example
//! ```
//! use weaver_di::{Container, DependencyKey, Scope, keys};
//!
//! struct Url;
//! struct Client;
//!
//! impl DependencyKey for Url {
//!     type Value = String;
//! }
//!
//! impl DependencyKey for Client {
//!     type Value = String;
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), weaver_di::Error> {
//! let mut builder = Container::builder();
//! builder
//!     .register_instance(Url, "https://example.com".to_string())?
//!     .register(Client, Scope::Container, keys![Url], |resolver| async move {
//!         let url = resolver.resolve::<Url>().await?;
//!         Ok(format!("client for {url}"))
//!     })?;
//!
//! let container = builder.build_validated()?;
//! let client = container.resolve::<Client>().await?;
//!
//! assert_eq!(client, "client for https://example.com");
//! # Ok(())
//! # }
//! ```

pub use crate::{
    container::{Container, ContainerBuilder, Resolver},
    error::{BoxError, ConfigurationError, Error},
    key::{DependencyKey, KeyInfo},
    module::Module,
    registration::{Registration, Scope},
};

pub mod error;
pub mod container;
pub mod key;
pub mod module;
pub mod registration;
