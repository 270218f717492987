use std::{collections::BTreeMap, mem, sync::Arc};

use crate::{any::Value, container::Container, key::Abstract, utils::future::BoxFuture};

pub(crate) type SharedTerminating = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;
pub(crate) type AfterResolving = Arc<dyn Fn(&Value, &Container) + Send + Sync>;

pub(crate) enum Terminating {
    /// Teardown of a built instance, run by the container that built it
    Once(BoxFuture<'static, ()>),
    /// Registered callback, it can be copied into scoped containers
    Shared(SharedTerminating),
}

impl Terminating {
    #[inline]
    pub(crate) fn into_future(self) -> BoxFuture<'static, ()> {
        match self {
            Self::Once(future) => future,
            Self::Shared(callback) => callback(),
        }
    }
}

#[derive(Default)]
pub(crate) struct Callbacks {
    terminating: Vec<Terminating>,
    scoped_terminating: Vec<SharedTerminating>,
    after_resolving: BTreeMap<Abstract, Vec<AfterResolving>>,
    scoped_after_resolving: BTreeMap<Abstract, Vec<AfterResolving>>,
    in_scope: bool,
}

impl Callbacks {
    /// Scoped callbacks of a scope's callbacks are run by the scope itself as well
    pub(crate) fn add_terminating(&mut self, callback: SharedTerminating, scoped: bool) {
        if scoped {
            if self.in_scope {
                self.terminating.push(Terminating::Shared(callback.clone()));
            }
            self.scoped_terminating.push(callback);
        } else {
            self.terminating.push(Terminating::Shared(callback));
        }
    }

    #[inline]
    pub(crate) fn add_teardown(&mut self, teardown: BoxFuture<'static, ()>) {
        self.terminating.push(Terminating::Once(teardown));
    }

    #[inline]
    #[must_use]
    pub(crate) fn take_terminating(&mut self) -> Vec<Terminating> {
        mem::take(&mut self.terminating)
    }

    pub(crate) fn add_after_resolving(&mut self, abstract_: Abstract, callback: AfterResolving, scoped: bool) {
        if !scoped || self.in_scope {
            self.after_resolving.entry(abstract_.clone()).or_default().push(callback.clone());
        }
        if scoped {
            self.scoped_after_resolving.entry(abstract_).or_default().push(callback);
        }
    }

    /// Callbacks of the requested abstract, then of the abstract that was actually built if it differs
    #[must_use]
    pub(crate) fn after_resolving_for(&self, abstract_: &Abstract, actual: &Abstract) -> Vec<AfterResolving> {
        let mut callbacks = self.after_resolving.get(abstract_).cloned().unwrap_or_default();
        if abstract_ != actual {
            if let Some(actual_callbacks) = self.after_resolving.get(actual) {
                callbacks.extend(actual_callbacks.iter().cloned());
            }
        }
        callbacks
    }

    /// Callbacks of a scoped container: its terminating list and after-resolving table
    /// are seeded from the scoped partitions of this one
    #[must_use]
    pub(crate) fn child(&self) -> Self {
        Self {
            terminating: self.scoped_terminating.iter().cloned().map(Terminating::Shared).collect(),
            scoped_terminating: self.scoped_terminating.clone(),
            after_resolving: self.scoped_after_resolving.clone(),
            scoped_after_resolving: self.scoped_after_resolving.clone(),
            in_scope: true,
        }
    }
}

/// Runs terminating callbacks one by one, in registration order
pub(crate) async fn run_terminating(terminating: Vec<Terminating>) {
    for callback in terminating {
        callback.into_future().await;
    }
}

#[cfg(test)]
mod tests {
    use super::{run_terminating, Callbacks, SharedTerminating};
    use crate::{any::Value, key::Abstract, utils::future::BoxFuture, Container};

    use parking_lot::Mutex;
    use std::sync::Arc;

    fn recorder(log: &Arc<Mutex<Vec<&'static str>>>, name: &'static str) -> SharedTerminating {
        let log = log.clone();
        Arc::new(move || {
            let log = log.clone();
            Box::pin(async move { log.lock().push(name) }) as BoxFuture<'static, ()>
        })
    }

    #[tokio::test]
    async fn test_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut callbacks = Callbacks::default();

        callbacks.add_terminating(recorder(&log, "first"), false);
        callbacks.add_teardown(Box::pin({
            let log = log.clone();
            async move { log.lock().push("teardown") }
        }));
        callbacks.add_terminating(recorder(&log, "last"), false);

        run_terminating(callbacks.take_terminating()).await;

        assert_eq!(*log.lock(), ["first", "teardown", "last"]);
        assert!(callbacks.take_terminating().is_empty());
    }

    #[tokio::test]
    async fn test_child_seeded_from_scoped() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut callbacks = Callbacks::default();

        callbacks.add_terminating(recorder(&log, "global"), false);
        callbacks.add_terminating(recorder(&log, "scoped"), true);
        callbacks.add_after_resolving(Abstract::name("a"), Arc::new(|_: &Value, _: &Container| {}), true);

        let mut child = callbacks.child();

        assert_eq!(child.after_resolving_for(&Abstract::name("a"), &Abstract::name("a")).len(), 1);
        assert!(callbacks.after_resolving_for(&Abstract::name("a"), &Abstract::name("a")).is_empty());

        run_terminating(child.take_terminating()).await;
        run_terminating(callbacks.child().take_terminating()).await;

        assert_eq!(*log.lock(), ["scoped", "scoped"]);
    }

    #[tokio::test]
    async fn test_scoped_registered_in_child() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut child = Callbacks::default().child();

        child.add_terminating(recorder(&log, "scoped"), true);
        child.add_after_resolving(Abstract::name("a"), Arc::new(|_: &Value, _: &Container| {}), true);

        assert_eq!(child.after_resolving_for(&Abstract::name("a"), &Abstract::name("a")).len(), 1);

        let mut nested = child.child();
        run_terminating(child.take_terminating()).await;
        run_terminating(nested.take_terminating()).await;

        assert_eq!(*log.lock(), ["scoped", "scoped"]);
    }
}
