#![allow(missing_docs)]

use std::hint::black_box;
use criterion::{criterion_group, criterion_main, Criterion};
use tokio::runtime::Runtime;
use weaver_di::{Container, DependencyKey, Scope, keys};

struct Config;
struct Service;
struct Request;

impl DependencyKey for Config {
    type Value = Vec<u8>;
}

impl DependencyKey for Service {
    type Value = usize;
}

impl DependencyKey for Request {
    type Value = usize;
}

fn container() -> Container {
    let mut builder = Container::builder();
    builder
        .register_instance(Config, vec![0; 64])
        .unwrap()
        .register(Service, Scope::Container, keys![Config], |resolver| async move {
            let config = resolver.resolve_shared::<Config>().await?;
            Ok(config.len())
        })
        .unwrap()
        .register(Request, Scope::Transient, keys![Service], |resolver| async move {
            let service = resolver.resolve::<Service>().await?;
            Ok(service + 1)
        })
        .unwrap();
    builder.build_validated().unwrap()
}

fn benchmark(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let container = container();

    c.bench_function("instance", |b| b.to_async(&rt).iter(|| async {
        black_box(container.resolve_shared::<Config>().await.unwrap());
    }));
    c.bench_function("container_cached", |b| b.to_async(&rt).iter(|| async {
        black_box(container.resolve::<Service>().await.unwrap());
    }));
    c.bench_function("transient", |b| b.to_async(&rt).iter(|| async {
        black_box(container.resolve::<Request>().await.unwrap());
    }));
    c.bench_function("scope", |b| b.to_async(&rt).iter(|| async {
        let scope = container.create_scope();
        black_box(scope.resolve::<Request>().await.unwrap());
    }));
}

criterion_group!(benches, benchmark);
criterion_main!(benches);
