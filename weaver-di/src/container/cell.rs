//! A cell that holds a container-scoped instance.
//!
//! The first resolver of an empty cell starts the construction, every other
//! resolver that arrives before it completes awaits the same in-flight
//! future. A failed construction leaves the cell empty, so the next
//! resolution retries. If every waiter is dropped before the construction
//! completes, the construction is dropped as well.

use super::factory::{ArcValue, Construction};
use crate::error::Error;
use futures_util::future::{FutureExt, Shared};
use std::{
    mem,
    sync::{Mutex, MutexGuard, PoisonError},
};

pub(crate) struct InstanceCell {
    inner: Mutex<CellInner>,
}

#[derive(Default)]
struct CellInner {
    state: CellState,
    generation: u64,
}

#[derive(Default)]
enum CellState {
    #[default]
    Empty,
    Pending {
        generation: u64,
        waiters: usize,
        construction: Shared<Construction>,
    },
    Ready(ArcValue),
}

impl CellState {
    #[inline]
    fn is_pending(&self, generation: u64) -> bool {
        matches!(self, CellState::Pending { generation: current, .. } if *current == generation)
    }
}

enum Joined<G> {
    Ready(ArcValue),
    Pending {
        construction: Shared<Construction>,
        generation: u64,
        joined: Option<G>,
    },
}

impl InstanceCell {
    #[inline]
    pub(crate) fn new() -> Self {
        Self { inner: Mutex::default() }
    }

    #[inline]
    fn lock(&self) -> MutexGuard<'_, CellInner> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the cached instance, if any
    #[inline]
    pub(crate) fn get(&self) -> Option<ArcValue> {
        match &self.lock().state {
            CellState::Ready(instance) => Some(instance.clone()),
            _ => None,
        }
    }

    /// Returns the cached instance or joins the in-flight construction,
    /// starting one with `init` if there is none.
    ///
    /// `on_join` runs before joining a construction started by someone else,
    /// it may refuse to wait. Whatever it returns is kept until the
    /// construction completes or this future is dropped.
    pub(crate) async fn get_or_try_init<F, J, G>(&self, init: F, on_join: J) -> Result<ArcValue, Error>
    where
        F: FnOnce() -> Construction,
        J: FnOnce() -> Result<G, Error>,
    {
        let (construction, generation, _joined) = match self.join(init, on_join)? {
            Joined::Ready(instance) => return Ok(instance),
            Joined::Pending { construction, generation, joined } => (construction, generation, joined),
        };

        let mut waiter = Waiter { cell: self, generation, settled: false };
        let result = construction.await;
        waiter.settle(&result);
        result
    }

    fn join<F, J, G>(&self, init: F, on_join: J) -> Result<Joined<G>, Error>
    where
        F: FnOnce() -> Construction,
        J: FnOnce() -> Result<G, Error>,
    {
        let mut guard = self.lock();
        let inner = &mut *guard;

        if let CellState::Ready(instance) = &inner.state {
            return Ok(Joined::Ready(instance.clone()));
        }

        if let CellState::Pending { generation, waiters, construction } = &mut inner.state {
            let joined = on_join()?;
            *waiters += 1;
            return Ok(Joined::Pending {
                construction: construction.clone(),
                generation: *generation,
                joined: Some(joined),
            });
        }

        // lazy, the factory runs on first poll outside of this lock
        inner.generation += 1;
        let generation = inner.generation;
        let construction = init().shared();
        inner.state = CellState::Pending {
            generation,
            waiters: 1,
            construction: construction.clone(),
        };
        Ok(Joined::Pending { construction, generation, joined: None })
    }
}

/// Tracks one resolver awaiting an in-flight construction
struct Waiter<'a> {
    cell: &'a InstanceCell,
    generation: u64,
    settled: bool,
}

impl Waiter<'_> {
    /// Commits the outcome, unless another waiter of the same
    /// construction has already done so
    fn settle(&mut self, result: &Result<ArcValue, Error>) {
        self.settled = true;

        let previous = {
            let mut inner = self.cell.lock();
            if !inner.state.is_pending(self.generation) {
                return;
            }
            let next = match result {
                Ok(instance) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(generation = self.generation, "instance cached");
                    CellState::Ready(instance.clone())
                }
                Err(_) => CellState::Empty,
            };
            mem::replace(&mut inner.state, next)
        };
        drop(previous);
    }
}

impl Drop for Waiter<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }

        let abandoned = {
            let mut guard = self.cell.lock();
            let inner = &mut *guard;
            let last = match &mut inner.state {
                CellState::Pending { generation, waiters, .. } if *generation == self.generation => {
                    *waiters -= 1;
                    *waiters == 0
                }
                _ => false,
            };
            last.then(|| mem::take(&mut inner.state))
        };

        // dropped outside the lock, this drops the construction future
        drop(abandoned);
    }
}
