use core::future::Future;

use super::MapFuture;

/// Asynchronous function from a request to a response, the unit the container boxes
/// instantiators and finalizers into
pub(crate) trait Service<Request> {
    type Response;
    type Error;
    type Future: Future<Output = Result<Self::Response, Self::Error>>;

    fn call(&mut self, request: Request) -> Self::Future;
}

impl<S, Request> Service<Request> for Box<S>
where
    S: Service<Request> + ?Sized,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    #[inline]
    fn call(&mut self, request: Request) -> S::Future {
        (**self).call(request)
    }
}

pub(crate) trait ServiceExt<Request>: Service<Request> {
    fn map_future<F, Fut, Response, Error>(self, f: F) -> MapFuture<Self, F>
    where
        Self: Sized,
        F: FnMut(Self::Future) -> Fut,
        Error: From<Self::Error>,
        Fut: Future<Output = Result<Response, Error>>,
    {
        MapFuture::new(self, f)
    }
}

impl<T: ?Sized, Request> ServiceExt<Request> for T where T: Service<Request> {}
