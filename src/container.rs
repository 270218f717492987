use async_recursion::async_recursion;
use core::{any::type_name, future::Future};
use parking_lot::{Mutex, RwLock};
use std::{borrow::Cow, sync::Arc};
use tokio::runtime::Handle;
use tracing::{debug, debug_span, error, warn, Instrument as _};

use crate::{
    any::{downcast, Value},
    arguments::Arguments,
    cache::Cache,
    callbacks::{run_terminating, AfterResolving, Callbacks, SharedTerminating},
    config::Config,
    dependency_resolver::{DependencyResolver, Frame},
    errors::{InstantiatorErrorKind, ResolveErrorKind},
    finalizer::teardown,
    instantiator::{boxed_injectable, BoxedCloneInstantiator, BuildRequest, Injectable, Instantiator},
    key::Abstract,
    lock::{current_path, with_path, BuildLocks},
    registry::{Binding, Concrete, ConcreteKind, Registry},
    service::Service as _,
    signature::Signature,
    utils::future::BoxFuture,
};

/// Async IoC container.
///
/// Clones share the same bindings, instances and callbacks.
/// A scoped container (see [`Self::create_scoped_container`]) is a container with a base:
/// abstracts it doesn't bind itself are delegated to the base, so base singletons are shared across scopes.
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

struct ContainerInner {
    registry: RwLock<Registry>,
    cache: Mutex<Cache>,
    callbacks: Mutex<Callbacks>,
    locks: BuildLocks,
    parent: Option<Container>,
}

impl Container {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::from_parts(Registry::default(), Callbacks::default(), None)
    }

    fn from_parts(registry: Registry, callbacks: Callbacks, parent: Option<Container>) -> Self {
        Self {
            inner: Arc::new(ContainerInner {
                registry: RwLock::new(registry),
                cache: Mutex::new(Cache::default()),
                callbacks: Mutex::new(callbacks),
                locks: BuildLocks::default(),
                parent,
            }),
        }
    }

    #[inline]
    #[must_use]
    pub fn is_scoped(&self) -> bool {
        self.inner.parent.is_some()
    }

    /// Binds the type provided by `instantiator`, building a new instance on every resolution
    pub fn register<Inst, Deps, Kind>(&self, instantiator: Inst) -> &Self
    where
        Inst: Instantiator<Deps, Kind>,
        Deps: DependencyResolver,
        Kind: 'static,
    {
        self.register_concrete(Concrete::new(instantiator), Config::transient())
    }

    /// Binds the type provided by `instantiator`, building it once per container
    pub fn singleton<Inst, Deps, Kind>(&self, instantiator: Inst) -> &Self
    where
        Inst: Instantiator<Deps, Kind>,
        Deps: DependencyResolver,
        Kind: 'static,
    {
        self.register_concrete(Concrete::new(instantiator), Config::singleton())
    }

    /// Binds the type provided by `instantiator` for scoped containers, building it once per scope
    pub fn scoped<Inst, Deps, Kind>(&self, instantiator: Inst) -> &Self
    where
        Inst: Instantiator<Deps, Kind>,
        Deps: DependencyResolver,
        Kind: 'static,
    {
        self.register_concrete(Concrete::new(instantiator), Config::scoped())
    }

    #[inline]
    pub fn register_concrete<T: Send + Sync + 'static>(&self, concrete: Concrete<T>, config: Config) -> &Self {
        self.register_with(Abstract::of::<T>(), concrete, config)
    }

    /// Binds `abstract_` to `concrete`. The last registration of an abstract wins.
    pub fn register_with<T>(&self, abstract_: impl Into<Abstract>, concrete: Concrete<T>, config: Config) -> &Self {
        let abstract_ = abstract_.into();
        debug!(key = %abstract_, ?config, "Registered");

        self.inner.registry.write().insert(abstract_, Binding::new(concrete, config));
        self
    }

    /// Binds `T` to itself, building it through its [`Injectable`] implementation
    #[inline]
    pub fn register_injectable<T: Injectable>(&self, config: Config) -> &Self {
        self.register_concrete(Concrete::<T>::injectable(), config)
    }

    /// Binds `A` to `C`: resolving `A` resolves `C` and converts it with `cast`
    #[inline]
    pub fn bind<A, C, F>(&self, cast: F, config: Config) -> &Self
    where
        A: Send + Sync + 'static,
        C: Send + Sync + 'static,
        F: Fn(Arc<C>) -> A + Send + Sync + 'static,
    {
        self.register_concrete(Concrete::<A>::from_abstract(cast), config)
    }

    #[inline]
    pub fn instance<T: Send + Sync + 'static>(&self, value: T) -> &Self {
        self.instance_with(Abstract::of::<T>(), value)
    }

    /// Pins a built value, resolutions of `abstract_` never build it again
    pub fn instance_with<T: Send + Sync + 'static>(&self, abstract_: impl Into<Abstract>, value: T) -> &Self {
        let abstract_ = abstract_.into();
        debug!(key = %abstract_, "Instance pinned");

        self.inner.cache.lock().pin(abstract_, Arc::new(value));
        self
    }

    pub fn alias(&self, abstract_: impl Into<Abstract>, name: impl Into<Cow<'static, str>>) -> &Self {
        self.inner.registry.write().alias(abstract_.into(), name.into());
        self
    }

    /// Checks whether `abstract_` is bound or pinned in this container or its base
    #[must_use]
    pub fn bound(&self, abstract_: impl Into<Abstract>) -> bool {
        let abstract_ = self.get_alias(abstract_.into());
        self.bound_unaliased(&abstract_)
    }

    #[inline]
    #[must_use]
    pub fn has(&self, abstract_: impl Into<Abstract>) -> bool {
        self.bound(abstract_)
    }

    fn bound_unaliased(&self, abstract_: &Abstract) -> bool {
        let (actual, _) = abstract_.split_tags();
        let bound = self.inner.registry.read().is_bound(&actual);
        let pinned = self.inner.cache.lock().contains(abstract_);

        bound || pinned || self.inner.parent.as_ref().is_some_and(|parent| parent.bound_unaliased(abstract_))
    }

    /// Resolves a string alias to its abstract, looking it up in the base containers too.
    /// Other keys are returned as is.
    fn get_alias(&self, abstract_: Abstract) -> Abstract {
        let Abstract::Name(name) = &abstract_ else {
            return abstract_;
        };

        let target = self.inner.registry.read().get_alias(name);
        match (target, &self.inner.parent) {
            (Some(target), _) => target,
            (None, Some(parent)) => parent.get_alias(abstract_),
            (None, None) => abstract_,
        }
    }

    /// Gets an instance of a bound type
    ///
    /// # Errors
    /// - Returns [`ResolveErrorKind::Unbound`] if `T` isn't bound
    /// - Returns [`ResolveErrorKind::Build`] if the constructor of `T` failed
    /// - Returns [`ResolveErrorKind::Dependency`] if a dependency of `T` can't be resolved
    pub async fn get<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, ResolveErrorKind> {
        self.resolve_typed(Abstract::of::<T>(), None).await
    }

    /// Gets an instance of `T`, building it through its [`Injectable`] implementation if it isn't bound
    #[allow(clippy::missing_errors_doc)]
    pub async fn make<T: Injectable>(&self) -> Result<Arc<T>, ResolveErrorKind> {
        self.resolve_typed(Abstract::of::<T>(), Some(boxed_injectable::<T>())).await
    }

    #[allow(clippy::missing_errors_doc)]
    pub async fn get_named<T: Send + Sync + 'static>(&self, name: impl Into<Cow<'static, str>>) -> Result<Arc<T>, ResolveErrorKind> {
        self.resolve_typed(Abstract::name(name), None).await
    }

    /// Gets an instance of `T` built with `tags` as leading positional arguments and cached under the tags
    #[allow(clippy::missing_errors_doc)]
    pub async fn get_tagged<T, I, S>(&self, tags: I) -> Result<Arc<T>, ResolveErrorKind>
    where
        T: Send + Sync + 'static,
        I: IntoIterator<Item = S>,
        S: Into<Cow<'static, str>>,
    {
        self.resolve_typed(Abstract::tagged::<T, I, S>(tags), None).await
    }

    /// Type-erased resolution of any abstract
    #[allow(clippy::missing_errors_doc)]
    pub async fn resolve_value(&self, abstract_: impl Into<Abstract>) -> Result<Value, ResolveErrorKind> {
        self.resolve_in(abstract_.into(), None, current_path()).await
    }

    async fn resolve_typed<T: Send + Sync + 'static>(
        &self,
        abstract_: Abstract,
        fallback: Option<BoxedCloneInstantiator>,
    ) -> Result<Arc<T>, ResolveErrorKind> {
        let value = self.resolve_in(abstract_, fallback, current_path()).await?;
        downcast(value).inspect_err(|err| error!("{}", err))
    }

    /// Calls `instantiator`, resolving its parameters from `arguments` and the container.
    /// The result isn't cached, only the dependencies are (according to their bindings).
    ///
    /// # Errors
    /// - Returns [`ResolveErrorKind::Build`] if `instantiator` failed
    /// - Returns errors of the parameters resolution
    pub async fn call<Inst, Deps, Kind>(&self, instantiator: Inst, arguments: Arguments) -> Result<Inst::Provides, ResolveErrorKind>
    where
        Inst: Instantiator<Deps, Kind>,
        Deps: DependencyResolver,
    {
        self.call_with_signature(instantiator, Signature::default(), arguments).await
    }

    /// Same as [`Self::call`], keyword arguments and defaults are matched by the names of `signature`
    #[allow(clippy::missing_errors_doc)]
    pub async fn call_with_signature<Inst, Deps, Kind>(
        &self,
        mut instantiator: Inst,
        signature: Signature,
        arguments: Arguments,
    ) -> Result<Inst::Provides, ResolveErrorKind>
    where
        Inst: Instantiator<Deps, Kind>,
        Deps: DependencyResolver,
    {
        let callable = type_name::<Inst>();
        let span = debug_span!("call", callable);

        async move {
            let mut frame = Frame::new(self.clone(), arguments, Arc::new(signature), callable, current_path());
            let dependencies = match Deps::resolve(&mut frame).await {
                Ok(dependencies) => dependencies,
                Err(err) => {
                    let err: ResolveErrorKind = err.into();
                    error!("{}", err);
                    return Err(err);
                }
            };

            match instantiator.instantiate(dependencies).await {
                Ok(provides) => Ok(provides),
                Err(source) => {
                    let err = ResolveErrorKind::Build {
                        abstract_: Abstract::of::<Inst>(),
                        source,
                    };
                    error!("{}", err);
                    Err(err)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Registers a hook called with every freshly built instance of `abstract_`.
    /// Instances returned from the cache don't trigger it.
    pub fn after_resolving<T, F>(&self, abstract_: impl Into<Abstract>, callback: F) -> &Self
    where
        T: Send + Sync + 'static,
        F: Fn(Arc<T>, &Container) + Send + Sync + 'static,
    {
        self.add_after_resolving(abstract_.into(), typed_callback(callback), false)
    }

    /// Same as [`Self::after_resolving`], for scoped containers created afterward.
    /// Called on a scoped container, the hook applies to the container itself too.
    pub fn after_resolving_scoped<T, F>(&self, abstract_: impl Into<Abstract>, callback: F) -> &Self
    where
        T: Send + Sync + 'static,
        F: Fn(Arc<T>, &Container) + Send + Sync + 'static,
    {
        self.add_after_resolving(abstract_.into(), typed_callback(callback), true)
    }

    fn add_after_resolving(&self, abstract_: Abstract, callback: AfterResolving, scoped: bool) -> &Self {
        let abstract_ = self.get_alias(abstract_);
        self.inner.callbacks.lock().add_after_resolving(abstract_, callback, scoped);
        self
    }

    /// Same as [`Self::after_resolving`], but if `abstract_` was already resolved the callback is called right away:
    /// with the cached instance, or with a fresh one if the binding isn't cached.
    ///
    /// # Errors
    /// Returns errors of the fresh resolution
    pub async fn on_resolved<T, F>(&self, abstract_: impl Into<Abstract>, callback: F) -> Result<(), ResolveErrorKind>
    where
        T: Send + Sync + 'static,
        F: Fn(Arc<T>, &Container) + Send + Sync + 'static,
    {
        let abstract_ = self.get_alias(abstract_.into());
        let callback = typed_callback(callback);

        self.add_after_resolving(abstract_.clone(), callback.clone(), false);

        let (actual, _) = abstract_.split_tags();
        let resolved = {
            let cache = self.inner.cache.lock();
            cache.is_resolved(&actual).then(|| cache.get(&abstract_))
        };

        match resolved {
            None => Ok(()),
            Some(Some(value)) => {
                debug!(key = %abstract_, "Already resolved");
                callback(&value, self);
                Ok(())
            }
            // The fresh build fires the callback registered above
            Some(None) => self.resolve_in(abstract_, None, current_path()).await.map(drop),
        }
    }

    /// Registers a callback run on [`Self::terminate`].
    /// Scoped callbacks are run by every scoped container created afterward, and by this container only if it's scoped itself.
    pub fn terminating<F, Fut>(&self, callback: F, scoped: bool) -> &Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let callback: SharedTerminating = Arc::new(move || Box::pin(callback()) as BoxFuture<'static, ()>);
        self.inner.callbacks.lock().add_terminating(callback, scoped);
        self
    }

    #[inline]
    pub fn terminating_sync<F>(&self, callback: F, scoped: bool) -> &Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.terminating(
            move || {
                callback();
                core::future::ready(())
            },
            scoped,
        )
    }

    /// Runs the terminating callbacks of this container in registration order, including finalizers of built instances.
    /// Built instances are forgotten, pinned ones are kept, so the container can be used again.
    pub async fn terminate(&self) {
        let terminating = self.inner.callbacks.lock().take_terminating();
        self.inner.cache.lock().clear_built();

        debug!(callbacks = terminating.len(), scoped = self.is_scoped(), "Terminating");

        run_terminating(terminating).await;
    }

    /// Creates a container with this one as its base.
    /// Scoped bindings and callbacks registered so far are copied into it.
    #[must_use]
    pub fn create_scoped_container(&self) -> Container {
        let registry = self.inner.registry.read().child();
        let callbacks = self.inner.callbacks.lock().child();

        debug!("Scoped container created");

        Self::from_parts(registry, callbacks, Some(self.clone()))
    }

    /// Runs `body` with a new scoped container and terminates the scope after it, whatever `body` returned
    pub async fn scope<F, Fut>(&self, body: F) -> Fut::Output
    where
        F: FnOnce(Container) -> Fut,
        Fut: Future,
    {
        let scoped = self.create_scoped_container();
        let output = body(scoped.clone()).await;
        scoped.terminate().await;
        output
    }

    #[async_recursion]
    pub(crate) async fn resolve_in(
        &self,
        abstract_: Abstract,
        fallback: Option<BoxedCloneInstantiator>,
        path: Vec<Abstract>,
    ) -> Result<Value, ResolveErrorKind> {
        let abstract_ = self.get_alias(abstract_);
        let span = debug_span!("resolve", key = %abstract_);

        self.resolve_unaliased(abstract_, fallback, path).instrument(span).await
    }

    async fn resolve_unaliased(
        &self,
        abstract_: Abstract,
        fallback: Option<BoxedCloneInstantiator>,
        mut path: Vec<Abstract>,
    ) -> Result<Value, ResolveErrorKind> {
        let cached = self.inner.cache.lock().get(&abstract_);
        if let Some(value) = cached {
            debug!("Found in cache");
            return Ok(value);
        }
        debug!("Not found in cache");

        let (actual, tags) = abstract_.split_tags();
        let binding = self.inner.registry.read().get(&actual).cloned();

        if binding.is_none() {
            if let Some(parent) = &self.inner.parent {
                if parent.bound_unaliased(&abstract_) {
                    debug!("Not bound locally, delegating to base container");
                    return parent.resolve_in(abstract_, fallback, path).await;
                }
            }

            let scoped_only = self.inner.registry.read().is_scoped_only(&actual);
            if scoped_only {
                let err = ResolveErrorKind::NoAccessible { abstract_ };
                error!("{}", err);
                return Err(err);
            }
        }

        if path.contains(&abstract_) {
            path.push(abstract_);
            let err = ResolveErrorKind::CyclicDependency { path: path.into() };
            error!("{}", err);
            return Err(err);
        }
        path.push(abstract_.clone());

        let _build_guard = self.inner.locks.acquire(&abstract_).await;

        let cached = self.inner.cache.lock().get(&abstract_);
        if let Some(value) = cached {
            debug!("Built by concurrent resolution");
            return Ok(value);
        }

        let Binding { kind, finalizer, config } = match (binding, fallback) {
            (Some(binding), _) => binding,
            (None, Some(instantiator)) => {
                debug!("Not bound, constructing");
                Binding {
                    kind: ConcreteKind::Instantiator(instantiator),
                    finalizer: None,
                    config: Config::transient(),
                }
            }
            (None, None) => {
                let err = ResolveErrorKind::Unbound { abstract_ };
                error!("{}", err);
                return Err(err);
            }
        };

        let value = match kind {
            ConcreteKind::Instantiator(mut instantiator) => {
                let request = BuildRequest {
                    container: self.clone(),
                    arguments: Arguments::from_tags(tags),
                    path: path.clone(),
                };
                match with_path(path.clone(), instantiator.call(request)).await {
                    Ok(value) => value,
                    Err(InstantiatorErrorKind::Deps(err)) => {
                        error!("{}", err);
                        return Err(err);
                    }
                    Err(InstantiatorErrorKind::Factory(source)) => {
                        let err = ResolveErrorKind::Build {
                            abstract_: abstract_.clone(),
                            source,
                        };
                        error!("{}", err);
                        return Err(err);
                    }
                }
            }
            ConcreteKind::Abstract { target, cast } => {
                debug!(target = %target, "Resolving chained binding");
                let value = self.resolve_in(target, None, path.clone()).await?;
                cast(value).inspect_err(|err| error!("{}", err))?
            }
        };

        {
            let mut cache = self.inner.cache.lock();
            if config.cache_provides {
                cache.insert(abstract_.clone(), value.clone());
                debug!("Cached");
            }
            cache.mark_resolved(actual.clone());
        }
        if let Some(finalizer) = finalizer {
            self.inner.callbacks.lock().add_teardown(teardown(finalizer, value.clone()));
            debug!("Teardown registered");
        }

        let callbacks = self.inner.callbacks.lock().after_resolving_for(&abstract_, &actual);
        for callback in callbacks {
            callback(&value, self);
        }

        Ok(value)
    }
}

impl Default for Container {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

fn typed_callback<T, F>(callback: F) -> AfterResolving
where
    T: Send + Sync + 'static,
    F: Fn(Arc<T>, &Container) + Send + Sync + 'static,
{
    Arc::new(move |value: &Value, container: &Container| match value.clone().downcast::<T>() {
        Ok(instance) => callback(instance, container),
        Err(_) => error!(expected = type_name::<T>(), "Incorrect instance type in after-resolving callback"),
    })
}

impl Drop for ContainerInner {
    fn drop(&mut self) {
        let terminating = self.callbacks.get_mut().take_terminating();
        if terminating.is_empty() {
            return;
        }

        match Handle::try_current() {
            Ok(handle) => {
                debug!(callbacks = terminating.len(), "Container dropped without termination, spawning terminating callbacks");
                handle.spawn(run_terminating(terminating));
            }
            Err(_) => {
                warn!(
                    callbacks = terminating.len(),
                    "Container dropped without termination outside of a runtime, terminating callbacks are skipped"
                );
            }
        }
    }
}
