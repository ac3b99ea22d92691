//! Tracks which call chains wait for in-flight constructions of other chains.
//!
//! A chain's own path only catches cycles it walks into by itself. Two chains
//! entering a cycle from opposite ends each wait for the construction the
//! other one owns, so before a chain joins a construction it follows the
//! recorded waits of the owning chain. If they lead back to a key on the
//! joining chain's path, joining would never complete.

use super::resolver::ResolutionPath;
use crate::{error::Error, key::KeyInfo};
use indexmap::IndexMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
pub(crate) struct WaitGraph {
    inner: Mutex<Waits>,
}

#[derive(Debug, Default)]
struct Waits {
    next_id: u64,
    waits: IndexMap<u64, Wait>,
}

/// A chain with `path` awaiting a construction of `target` owned by another chain
#[derive(Debug)]
struct Wait {
    path: ResolutionPath,
    target: KeyInfo,
}

/// Removes its wait once the joining chain stops awaiting
#[derive(Debug)]
pub(crate) struct WaitGuard<'a> {
    graph: &'a WaitGraph,
    id: Option<u64>,
}

impl Drop for WaitGuard<'_> {
    fn drop(&mut self) {
        if let Some(id) = self.id {
            self.graph.lock().waits.swap_remove(&id);
        }
    }
}

impl WaitGraph {
    #[inline]
    fn lock(&self) -> MutexGuard<'_, Waits> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Records that the chain with `path` is about to await the in-flight
    /// construction of `target`.
    ///
    /// Fails with [`Error::CyclicDependency`] if the owner of that construction
    /// transitively waits for a key on `path`.
    pub(crate) fn wait(&self, path: &ResolutionPath, target: KeyInfo) -> Result<WaitGuard<'_>, Error> {
        // a root caller is not constructing anything, nobody can wait for it
        if path.as_slice().is_empty() {
            return Ok(WaitGuard { graph: self, id: None });
        }

        let mut inner = self.lock();
        let mut trail = vec![target];
        let mut visited = Vec::new();
        if inner.reaches(path.as_slice(), target, &mut trail, &mut visited) {
            let mut cycle = path.as_slice().to_vec();
            cycle.extend(trail);
            #[cfg(feature = "tracing")]
            tracing::warn!(key = %target, "cyclic dependency detected across resolutions");
            return Err(Error::CyclicDependency(cycle));
        }

        let id = inner.next_id;
        inner.next_id += 1;
        inner.waits.insert(id, Wait { path: path.clone(), target });
        Ok(WaitGuard { graph: self, id: Some(id) })
    }
}

impl Waits {
    /// Follows the waits of the chain that constructs `key`, pushing each
    /// awaited key to `trail`, until one of them is on `path`
    fn reaches(
        &self,
        path: &[KeyInfo],
        key: KeyInfo,
        trail: &mut Vec<KeyInfo>,
        visited: &mut Vec<KeyInfo>,
    ) -> bool {
        if visited.contains(&key) {
            return false;
        }
        visited.push(key);

        let owned = self.waits
            .values()
            .filter(|wait| wait.path.as_slice().contains(&key));

        for wait in owned {
            trail.push(wait.target);
            if path.contains(&wait.target) || self.reaches(path, wait.target, trail, visited) {
                return true;
            }
            trail.pop();
        }
        false
    }
}
