mod base;
mod boxed_clone;
mod map_future;
mod service_fn;

use map_future::MapFuture;

pub(crate) use base::Service;
pub(crate) use boxed_clone::BoxCloneService;
pub(crate) use service_fn::service_fn;
