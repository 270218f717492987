use core::marker::PhantomData;
use std::{borrow::Cow, collections::BTreeMap, sync::Arc};
use tracing::warn;

use crate::{
    any::{downcast, Value},
    config::Config,
    dependency_resolver::DependencyResolver,
    errors::ResolveErrorKind,
    finalizer::{boxed_finalizer, BoxedCloneFinalizer, Finalizer},
    instantiator::{boxed_injectable, boxed_instantiator, BoxedCloneInstantiator, Injectable, Instantiator},
    key::Abstract,
    signature::Signature,
};

pub(crate) type Caster = Arc<dyn Fn(Value) -> Result<Value, ResolveErrorKind> + Send + Sync>;

#[derive(Clone)]
pub(crate) enum ConcreteKind {
    Instantiator(BoxedCloneInstantiator),
    /// Built by resolving another abstract and converting its instance
    Abstract { target: Abstract, cast: Caster },
}

/// Construction strategy of `T` with an optional finalizer
pub struct Concrete<T> {
    pub(crate) kind: ConcreteKind,
    pub(crate) finalizer: Option<BoxedCloneFinalizer>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> Concrete<T> {
    #[inline]
    #[must_use]
    pub fn new<Inst, Deps, Kind>(instantiator: Inst) -> Self
    where
        Inst: Instantiator<Deps, Kind, Provides = T>,
        Deps: DependencyResolver,
        Kind: 'static,
    {
        Self::with_signature(instantiator, Signature::default())
    }

    /// Instantiator with named parameters, so keyword arguments and default values apply to them
    #[must_use]
    pub fn with_signature<Inst, Deps, Kind>(instantiator: Inst, signature: Signature) -> Self
    where
        Inst: Instantiator<Deps, Kind, Provides = T>,
        Deps: DependencyResolver,
        Kind: 'static,
    {
        let parameters = Deps::parameters().len();
        if !signature.is_empty() && signature.len() != parameters {
            warn!(
                instantiator = core::any::type_name::<Inst>(),
                parameters,
                names = signature.len(),
                "Signature doesn't match the parameters of the instantiator"
            );
        }

        Self::from_kind(ConcreteKind::Instantiator(boxed_instantiator(instantiator, Arc::new(signature))))
    }

    /// Built from the dependencies declared by its [`Injectable`] implementation
    #[inline]
    #[must_use]
    pub fn injectable() -> Self
    where
        T: Injectable,
    {
        Self::from_kind(ConcreteKind::Instantiator(boxed_injectable::<T>()))
    }

    /// Built by resolving `C` and converting it with `cast`
    #[inline]
    #[must_use]
    pub fn from_abstract<C, F>(cast: F) -> Self
    where
        C: Send + Sync + 'static,
        F: Fn(Arc<C>) -> T + Send + Sync + 'static,
    {
        Self::chained(Abstract::of::<C>(), cast)
    }

    /// Built by resolving `target` and converting its instance (of type `C`) with `cast`
    #[must_use]
    pub fn chained<C, F>(target: Abstract, cast: F) -> Self
    where
        C: Send + Sync + 'static,
        F: Fn(Arc<C>) -> T + Send + Sync + 'static,
    {
        let cast: Caster = Arc::new(move |value| downcast::<C>(value).map(|value| Arc::new(cast(value)) as Value));
        Self::from_kind(ConcreteKind::Abstract { target, cast })
    }

    #[inline]
    #[must_use]
    pub fn finalizer<Fin: Finalizer<T>>(mut self, finalizer: Fin) -> Self {
        self.finalizer = Some(boxed_finalizer(finalizer));
        self
    }

    #[inline]
    fn from_kind(kind: ConcreteKind) -> Self {
        Self {
            kind,
            finalizer: None,
            _marker: PhantomData,
        }
    }
}

#[derive(Clone)]
pub(crate) struct Binding {
    pub(crate) kind: ConcreteKind,
    pub(crate) finalizer: Option<BoxedCloneFinalizer>,
    pub(crate) config: Config,
}

impl Binding {
    #[inline]
    pub(crate) fn new<T>(concrete: Concrete<T>, config: Config) -> Self {
        Self {
            kind: concrete.kind,
            finalizer: concrete.finalizer,
            config,
        }
    }
}

#[derive(Clone, Default)]
pub(crate) struct Registry {
    bindings: BTreeMap<Abstract, Binding>,
    scoped_bindings: BTreeMap<Abstract, Binding>,
    aliases: BTreeMap<Cow<'static, str>, Abstract>,
    in_scope: bool,
}

impl Registry {
    /// Last write wins, also across the global and scoped tables.
    /// A scoped binding of a scope's registry is also its own binding.
    pub(crate) fn insert(&mut self, abstract_: Abstract, binding: Binding) {
        if binding.config.scoped {
            if self.in_scope {
                self.bindings.insert(abstract_.clone(), binding.clone());
            } else {
                self.bindings.remove(&abstract_);
            }
            self.scoped_bindings.insert(abstract_, binding);
        } else {
            self.scoped_bindings.remove(&abstract_);
            self.bindings.insert(abstract_, binding);
        }
    }

    #[inline]
    #[must_use]
    pub(crate) fn get(&self, abstract_: &Abstract) -> Option<&Binding> {
        self.bindings.get(abstract_)
    }

    #[inline]
    #[must_use]
    pub(crate) fn is_bound(&self, abstract_: &Abstract) -> bool {
        self.bindings.contains_key(abstract_) || self.scoped_bindings.contains_key(abstract_)
    }

    #[inline]
    #[must_use]
    pub(crate) fn is_scoped_only(&self, abstract_: &Abstract) -> bool {
        !self.bindings.contains_key(abstract_) && self.scoped_bindings.contains_key(abstract_)
    }

    #[inline]
    pub(crate) fn alias(&mut self, abstract_: Abstract, name: Cow<'static, str>) {
        self.aliases.insert(name, abstract_);
    }

    #[inline]
    #[must_use]
    pub(crate) fn get_alias(&self, name: &str) -> Option<Abstract> {
        self.aliases.get(name).cloned()
    }

    /// Registry of a scoped container: scoped bindings of this registry become its own bindings
    /// and stay scoped for the containers it creates in turn
    #[must_use]
    pub(crate) fn child(&self) -> Self {
        Self {
            bindings: self.scoped_bindings.clone(),
            scoped_bindings: self.scoped_bindings.clone(),
            aliases: BTreeMap::new(),
            in_scope: true,
        }
    }
}
