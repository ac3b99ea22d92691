#![allow(missing_docs)]

use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};
use std::time::Duration;
use weaver_di::{BoxError, Container, DependencyKey, Error, Scope, keys};

struct Pool;
struct Left;
struct Right;

impl DependencyKey for Pool {
    type Value = usize;
}

impl DependencyKey for Left {
    type Value = String;
}

impl DependencyKey for Right {
    type Value = String;
}

struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

fn slow_pool(calls: Arc<AtomicUsize>, delay: Duration) -> Container {
    let mut builder = Container::builder();
    builder
        .register(Pool, Scope::Container, keys![], move |_| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                tokio::time::sleep(delay).await;
                Ok(n)
            }
        })
        .unwrap();
    builder.build()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn it_constructs_once_for_concurrent_callers() {
    let calls = Arc::new(AtomicUsize::new(0));
    let container = slow_pool(calls.clone(), Duration::from_millis(20));

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let container = container.clone();
            tokio::spawn(async move { container.resolve_shared::<Pool>().await })
        })
        .collect();

    let mut values = Vec::with_capacity(handles.len());
    for handle in handles {
        values.push(handle.await.unwrap().unwrap());
    }

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(values.iter().all(|value| Arc::ptr_eq(value, &values[0])));
    assert_eq!(*values[0], 0);
}

#[tokio::test]
async fn it_delivers_shared_failure_to_all_waiters() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    let mut builder = Container::builder();
    builder
        .register(Pool, Scope::Container, keys![], move |_| {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                if n == 0 {
                    Err(BoxError::from("pool is exhausted"))
                } else {
                    Ok(n)
                }
            }
        })
        .unwrap();
    let container = builder.build();

    let (first, second, third) = tokio::join!(
        container.resolve::<Pool>(),
        container.resolve::<Pool>(),
        container.resolve::<Pool>()
    );

    for result in [first, second, third] {
        match result {
            Err(Error::FactoryFailed { key, source }) => {
                assert!(key.is::<Pool>());
                assert_eq!(source.to_string(), "pool is exhausted");
            }
            _ => panic!("Expected FactoryFailed error"),
        }
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // failure is not cached
    assert_eq!(container.resolve::<Pool>().await.unwrap(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn it_resets_cell_when_all_waiters_are_cancelled() {
    let calls = Arc::new(AtomicUsize::new(0));
    let dropped = Arc::new(AtomicBool::new(false));
    let counter = calls.clone();
    let flag = dropped.clone();

    let mut builder = Container::builder();
    builder
        .register(Pool, Scope::Container, keys![], move |_| {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            let guard = DropFlag(flag.clone());
            async move {
                if n == 0 {
                    std::future::pending::<()>().await;
                }
                drop(guard);
                Ok(n)
            }
        })
        .unwrap();
    let container = builder.build();

    let cancelled = tokio::time::timeout(
        Duration::from_millis(20),
        container.resolve::<Pool>()
    ).await;

    assert!(cancelled.is_err());
    assert!(dropped.load(Ordering::SeqCst));

    assert_eq!(container.resolve::<Pool>().await.unwrap(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn it_keeps_construction_while_a_waiter_remains() {
    let calls = Arc::new(AtomicUsize::new(0));
    let container = slow_pool(calls.clone(), Duration::from_millis(50));

    let (cancelled, completed) = tokio::join!(
        tokio::time::timeout(Duration::from_millis(10), container.resolve::<Pool>()),
        container.resolve::<Pool>()
    );

    assert!(cancelled.is_err());
    assert_eq!(completed.unwrap(), 0);

    assert_eq!(container.resolve::<Pool>().await.unwrap(), 0);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn it_isolates_concurrent_scopes() {
    let calls = Arc::new(AtomicUsize::new(0));
    let container = slow_pool(calls.clone(), Duration::from_millis(5));

    let first = container.create_scope();
    let second = container.create_scope();

    let (first, second) = tokio::join!(
        tokio::spawn(async move { first.resolve_shared::<Pool>().await }),
        tokio::spawn(async move { second.resolve_shared::<Pool>().await })
    );

    let first = first.unwrap().unwrap();
    let second = second.unwrap().unwrap();

    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn it_reports_cycle_entered_from_both_ends() {
    let mut builder = Container::builder();
    builder
        .register(Left, Scope::Container, keys![Right], |resolver| async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            let right = resolver.resolve::<Right>().await?;
            Ok(format!("left({right})"))
        })
        .unwrap()
        .register(Right, Scope::Container, keys![Left], |resolver| async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            let left = resolver.resolve::<Left>().await?;
            Ok(format!("right({left})"))
        })
        .unwrap();
    let container = builder.build();

    let (left, right) = tokio::time::timeout(Duration::from_secs(2), async {
        tokio::join!(container.resolve::<Left>(), container.resolve::<Right>())
    })
    .await
    .expect("both resolutions must complete");

    assert!(matches!(left, Err(Error::CyclicDependency(_))));
    assert!(matches!(right, Err(Error::CyclicDependency(_))));

    // nothing was cached, a single chain still finds the cycle
    assert!(matches!(container.resolve::<Right>().await, Err(Error::CyclicDependency(_))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn it_reports_cycle_entered_from_both_ends_on_many_threads() {
    let mut builder = Container::builder();
    builder
        .register(Left, Scope::Container, keys![Right], |resolver| async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            resolver.resolve::<Right>().await.map_err(BoxError::from)
        })
        .unwrap()
        .register(Right, Scope::Container, keys![Left], |resolver| async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            resolver.resolve::<Left>().await.map_err(BoxError::from)
        })
        .unwrap();
    let container = builder.build();

    let left = tokio::spawn({
        let container = container.clone();
        async move { container.resolve::<Left>().await }
    });
    let right = tokio::spawn({
        let container = container.clone();
        async move { container.resolve::<Right>().await }
    });

    let (left, right) = tokio::time::timeout(Duration::from_secs(2), async {
        tokio::join!(left, right)
    })
    .await
    .expect("both resolutions must complete");

    assert!(matches!(left.unwrap(), Err(Error::CyclicDependency(_))));
    assert!(matches!(right.unwrap(), Err(Error::CyclicDependency(_))));
}
