use core::future::Future;
use parking_lot::Mutex;
use std::{collections::BTreeMap, sync::Arc};
use tokio::sync::{Mutex as BuildLock, OwnedMutexGuard};

use crate::key::Abstract;

tokio::task_local! {
    /// Abstracts being built by the current task, outermost first
    static BUILD_PATH: Vec<Abstract>;
}

/// Path of the build the current task runs in, empty outside of builds.
/// A constructor resolving from its container parameter continues this path.
#[must_use]
pub(crate) fn current_path() -> Vec<Abstract> {
    BUILD_PATH.try_with(Clone::clone).unwrap_or_default()
}

/// Runs a build of the last abstract of `path`
pub(crate) async fn with_path<F: Future>(path: Vec<Abstract>, build: F) -> F::Output {
    BUILD_PATH.scope(path, build).await
}

/// In-flight builds of a container, one lock per abstract.
///
/// Concurrent resolutions of the same abstract wait for the first build to finish,
/// resolutions of different abstracts don't contend.
/// A lock is removed once nobody holds or waits for it.
#[derive(Default)]
pub(crate) struct BuildLocks {
    locks: Mutex<BTreeMap<Abstract, Arc<BuildLock<()>>>>,
}

impl BuildLocks {
    pub(crate) async fn acquire(&self, abstract_: &Abstract) -> BuildGuard<'_> {
        let lock = self.locks.lock().entry(abstract_.clone()).or_default().clone();

        BuildGuard {
            locks: self,
            abstract_: abstract_.clone(),
            guard: Some(lock.lock_owned().await),
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.lock().len()
    }
}

pub(crate) struct BuildGuard<'a> {
    locks: &'a BuildLocks,
    abstract_: Abstract,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for BuildGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());

        // Clones are only taken under the map lock, so the count can't grow here
        let mut locks = self.locks.locks.lock();
        if locks.get(&self.abstract_).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(&self.abstract_);
        }
    }
}
