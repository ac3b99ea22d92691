//! Type-erased factory functions

use super::Resolver;
use crate::{
    error::{BoxError, Error},
    key::{DependencyKey, KeyInfo},
};
use futures_util::future::{BoxFuture, FutureExt};
use std::{
    any::Any,
    future::Future,
    sync::Arc,
};

/// A resolved value, shared between the cache and every consumer
pub(crate) type ArcValue = Arc<
    dyn Any
    + Send
    + Sync
>;

/// A type-erased factory function
pub(crate) type FactoryFn = Arc<
    dyn Fn(Resolver) -> BoxFuture<'static, Result<ArcValue, BoxError>>
    + Send
    + Sync
>;

/// A single factory invocation with its error already mapped to [`Error`]
pub(crate) type Construction = BoxFuture<'static, Result<ArcValue, Error>>;

#[inline]
pub(crate) fn make_factory_fn<K, F, Fut>(factory: F) -> FactoryFn
where
    K: DependencyKey,
    F: Fn(Resolver) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<K::Value, BoxError>> + Send + 'static,
{
    Arc::new(move |resolver: Resolver| {
        factory(resolver)
            .map(|result| result.map(|value| Arc::new(value) as ArcValue))
            .boxed()
    })
}

/// Invokes the factory of `key` and maps its failure
pub(crate) fn construct(factory: &FactoryFn, key: KeyInfo, resolver: Resolver) -> Construction {
    factory(resolver)
        .map(move |result| result.map_err(|err| {
            let err = Error::from_factory(key, err);
            #[cfg(feature = "tracing")]
            if let Error::FactoryFailed { source, .. } = &err {
                tracing::warn!(key = %key, "factory failed: {source}");
            }
            err
        }))
        .boxed()
}
