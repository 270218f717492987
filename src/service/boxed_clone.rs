use super::base::{Service, ServiceExt as _};
use crate::utils::future::BoxFuture;

type BoxCloneServiceInner<Request, Response, Error> = Box<
    dyn CloneService<Request, Response = Response, Error = Error, Future = BoxFuture<'static, Result<Response, Error>>>
        + Send
        + Sync,
>;

/// Type-erased service that can be cloned out of a shared table and called without holding its lock
pub(crate) struct BoxCloneService<Request, Response, Error>(BoxCloneServiceInner<Request, Response, Error>);

impl<Request, Response, Error> BoxCloneService<Request, Response, Error> {
    pub(crate) fn new<S>(inner: S) -> Self
    where
        S: Service<Request, Response = Response, Error = Error> + Clone + Send + Sync + 'static,
        S::Future: Send + 'static,
        Request: 'static,
        Response: 'static,
        Error: 'static,
    {
        Self(Box::new(
            inner.map_future(|future| Box::pin(future) as BoxFuture<'static, Result<Response, Error>>),
        ))
    }
}

trait CloneService<Request>: Service<Request> {
    #[must_use]
    fn clone_box(
        &self,
    ) -> Box<dyn CloneService<Request, Response = Self::Response, Error = Self::Error, Future = Self::Future> + Send + Sync>;
}

impl<Request, T> CloneService<Request> for T
where
    T: Service<Request> + Clone + Send + Sync + 'static,
{
    #[inline]
    fn clone_box(&self) -> Box<dyn CloneService<Request, Response = T::Response, Error = T::Error, Future = T::Future> + Send + Sync> {
        Box::new(self.clone())
    }
}

impl<Request, Response, Error> Clone for BoxCloneService<Request, Response, Error> {
    #[inline]
    fn clone(&self) -> Self {
        Self(self.0.clone_box())
    }
}

impl<Request, Response, Error> Service<Request> for BoxCloneService<Request, Response, Error> {
    type Response = Response;
    type Error = Error;
    type Future = BoxFuture<'static, Result<Response, Error>>;

    #[inline]
    fn call(&mut self, request: Request) -> Self::Future {
        self.0.call(request)
    }
}

#[cfg(test)]
mod tests {
    use super::BoxCloneService;
    use crate::service::{service_fn, Service as _};

    use core::{
        convert::Infallible,
        sync::atomic::{AtomicU8, Ordering},
    };
    use std::sync::Arc;

    #[tokio::test]
    async fn test_clones_share_captured_state() {
        let call_count = Arc::new(AtomicU8::new(0));

        let mut service = BoxCloneService::new(service_fn({
            let call_count = call_count.clone();
            move |value: u8| {
                let call_count = call_count.clone();
                async move {
                    call_count.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, Infallible>(value + 1)
                }
            }
        }));
        let mut cloned = service.clone();

        assert_eq!(service.call(1).await.unwrap(), 2);
        assert_eq!(cloned.call(2).await.unwrap(), 3);
        assert_eq!(call_count.load(Ordering::SeqCst), 2);
    }
}
