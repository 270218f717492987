use core::{any::type_name, future::Future};
use std::sync::Arc;
use tracing::debug;

use crate::{
    any::Value,
    arguments::Arguments,
    container::Container,
    dependency_resolver::{DependencyResolver, Frame},
    errors::{InstantiateErrorKind, InstantiatorErrorKind, ResolveErrorKind},
    key::Abstract,
    service::{service_fn, BoxCloneService},
    signature::Signature,
};

/// Marker of constructors returning `Result`. They are run on the blocking pool of the runtime.
pub enum Blocking {}

/// Marker of constructors returning a future. They are awaited in place.
pub enum Awaited {}

pub trait Instantiator<Deps, Kind>: Clone + Send + Sync + 'static
where
    Deps: DependencyResolver,
{
    type Provides: Send + Sync + 'static;

    fn instantiate(&mut self, dependencies: Deps) -> impl Future<Output = Result<Self::Provides, InstantiateErrorKind>> + Send;
}

/// Type that knows how to build itself from its dependencies.
///
/// Construction is expected to be cheap, so it runs inline instead of on the blocking pool.
/// Unbound injectable types are built on demand by [`Container::make`] and [`crate::Autowired`].
pub trait Injectable: Sized + Send + Sync + 'static {
    type Deps: DependencyResolver;

    /// # Errors
    /// Returns [`InstantiateErrorKind`] if the instance can't be built from the dependencies
    fn construct(dependencies: Self::Deps) -> Result<Self, InstantiateErrorKind>;

    /// Parameter names and defaults of [`Self::construct`]
    #[inline]
    #[must_use]
    fn signature() -> Signature {
        Signature::default()
    }
}

pub(crate) struct BuildRequest {
    pub(crate) container: Container,
    pub(crate) arguments: Arguments,
    pub(crate) path: Vec<Abstract>,
}

pub(crate) type BoxedCloneInstantiator = BoxCloneService<BuildRequest, Value, InstantiatorErrorKind<ResolveErrorKind, InstantiateErrorKind>>;

#[must_use]
pub(crate) fn boxed_instantiator<Inst, Deps, Kind>(instantiator: Inst, signature: Arc<Signature>) -> BoxedCloneInstantiator
where
    Inst: Instantiator<Deps, Kind>,
    Deps: DependencyResolver,
    Kind: 'static,
{
    let callable = type_name::<Inst>();

    BoxCloneService::new(service_fn(move |BuildRequest { container, arguments, path }| {
        let mut instantiator = instantiator.clone();
        let signature = signature.clone();

        async move {
            let mut frame = Frame::new(container, arguments, signature, callable, path);
            let dependencies = match Deps::resolve(&mut frame).await {
                Ok(dependencies) => dependencies,
                Err(err) => {
                    let err: ResolveErrorKind = err.into();
                    return Err(InstantiatorErrorKind::Deps(err));
                }
            };
            let dependency = match instantiator.instantiate(dependencies).await {
                Ok(dependency) => dependency,
                Err(err) => return Err(InstantiatorErrorKind::Factory(err)),
            };

            debug!("Built");

            Ok(Arc::new(dependency) as Value)
        }
    }))
}

#[must_use]
pub(crate) fn boxed_injectable<T: Injectable>() -> BoxedCloneInstantiator {
    let signature = Arc::new(T::signature());

    BoxCloneService::new(service_fn(move |BuildRequest { container, arguments, path }| {
        let signature = signature.clone();

        async move {
            let mut frame = Frame::new(container, arguments, signature, type_name::<T>(), path);
            let dependencies = match T::Deps::resolve(&mut frame).await {
                Ok(dependencies) => dependencies,
                Err(err) => {
                    let err: ResolveErrorKind = err.into();
                    return Err(InstantiatorErrorKind::Deps(err));
                }
            };
            let dependency = match T::construct(dependencies) {
                Ok(dependency) => dependency,
                Err(err) => return Err(InstantiatorErrorKind::Factory(err)),
            };

            debug!("Constructed");

            Ok(Arc::new(dependency) as Value)
        }
    }))
}

macro_rules! impl_instantiator {
    (
        [$($ty:ident),*]
    ) => {
        #[allow(non_snake_case)]
        impl<F, Response, Err, $($ty,)*> Instantiator<($($ty,)*), Blocking> for F
        where
            F: FnMut($($ty,)*) -> Result<Response, Err> + Clone + Send + Sync + 'static,
            Response: Send + Sync + 'static,
            Err: Into<InstantiateErrorKind> + Send + 'static,
            $( $ty: DependencyResolver, )*
        {
            type Provides = Response;

            fn instantiate(&mut self, ($($ty,)*): ($($ty,)*)) -> impl Future<Output = Result<Self::Provides, InstantiateErrorKind>> + Send {
                let mut f = self.clone();

                async move {
                    match tokio::task::spawn_blocking(move || f($($ty,)*)).await {
                        Ok(result) => result.map_err(Into::into),
                        Err(_) => Err(InstantiateErrorKind::Panicked),
                    }
                }
            }
        }

        #[allow(non_snake_case)]
        impl<F, Fut, Response, Err, $($ty,)*> Instantiator<($($ty,)*), Awaited> for F
        where
            F: FnMut($($ty,)*) -> Fut + Clone + Send + Sync + 'static,
            Fut: Future<Output = Result<Response, Err>> + Send,
            Response: Send + Sync + 'static,
            Err: Into<InstantiateErrorKind>,
            $( $ty: DependencyResolver, )*
        {
            type Provides = Response;

            fn instantiate(&mut self, ($($ty,)*): ($($ty,)*)) -> impl Future<Output = Result<Self::Provides, InstantiateErrorKind>> + Send {
                let future = self($($ty,)*);

                async move { future.await.map_err(Into::into) }
            }
        }
    };
}

all_the_tuples!(impl_instantiator);
