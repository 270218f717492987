use core::{any::type_name, future::Future};
use std::sync::Arc;
use tracing::{debug, error};

use crate::{
    any::Value,
    service::{service_fn, BoxCloneService, Service as _},
    utils::future::BoxFuture,
};

/// Teardown half of a provider: runs against the built instance when its container terminates
pub trait Finalizer<Dep>: Clone + Send + Sync + 'static {
    fn finalize(&mut self, dependency: Arc<Dep>) -> impl Future<Output = ()> + Send;
}

impl<F, Fut, Dep> Finalizer<Dep> for F
where
    F: FnMut(Arc<Dep>) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send,
{
    #[inline]
    fn finalize(&mut self, dependency: Arc<Dep>) -> impl Future<Output = ()> + Send {
        self(dependency)
    }
}

pub(crate) type BoxedCloneFinalizer = BoxCloneService<Value, (), ()>;

#[must_use]
pub(crate) fn boxed_finalizer<Dep, Fin>(finalizer: Fin) -> BoxedCloneFinalizer
where
    Dep: Send + Sync + 'static,
    Fin: Finalizer<Dep>,
{
    BoxCloneService::new(service_fn(move |dependency: Value| {
        let mut finalizer = finalizer.clone();
        let dependency = dependency.downcast::<Dep>();

        async move {
            match dependency {
                Ok(dependency) => {
                    finalizer.finalize(dependency).await;
                    debug!(dependency = type_name::<Dep>(), "Finalized");
                    Ok(())
                }
                Err(_) => {
                    error!(expected = type_name::<Dep>(), "Incorrect instance type in finalizer");
                    Err(())
                }
            }
        }
    }))
}

/// Binds the finalizer to a built instance, producing the teardown of that instance
pub(crate) fn teardown(mut finalizer: BoxedCloneFinalizer, dependency: Value) -> BoxFuture<'static, ()> {
    let future = finalizer.call(dependency);

    Box::pin(async move {
        let _ = future.await;
    })
}

#[cfg(test)]
mod tests {
    use super::{boxed_finalizer, teardown};
    use crate::any::Value;

    use core::sync::atomic::{AtomicU8, Ordering};
    use std::sync::Arc;
    use tracing_test::traced_test;

    struct Connection(u8);

    #[tokio::test]
    #[traced_test]
    async fn test_teardown_runs_finalizer() {
        let finalized = Arc::new(AtomicU8::new(0));

        let finalizer = boxed_finalizer({
            let finalized = finalized.clone();
            move |connection: Arc<Connection>| {
                let finalized = finalized.clone();
                async move {
                    finalized.fetch_add(connection.0, Ordering::SeqCst);
                }
            }
        });

        let connection: Value = Arc::new(Connection(3));
        let pending = teardown(finalizer.clone(), connection);

        assert_eq!(finalized.load(Ordering::SeqCst), 0);

        pending.await;

        assert_eq!(finalized.load(Ordering::SeqCst), 3);

        teardown(finalizer, Arc::new(1_u8)).await;

        assert_eq!(finalized.load(Ordering::SeqCst), 3);
        assert!(logs_contain("Incorrect instance type in finalizer"));
    }
}
