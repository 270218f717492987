use core::marker::PhantomData;
use std::{borrow::Cow, collections::BTreeMap, sync::Arc};
use tracing::debug;

use crate::{
    any::{downcast, TypeInfo, Value},
    dependency_resolver::{DependencyResolver, Frame},
    errors::ResolveErrorKind,
    instantiator::{boxed_injectable, BoxedCloneInstantiator, Injectable},
    key::Abstract,
    signature::{Parameter, ParameterKind, Primitive},
};

/// Resolves `abstract_` for the current parameter, falling back to an unconsumed positional argument of type `T`
async fn resolve_dependency<T: Send + Sync + 'static>(
    frame: &mut Frame,
    abstract_: Abstract,
    fallback: Option<BoxedCloneInstantiator>,
) -> Result<Arc<T>, ResolveErrorKind> {
    let resolved = match fallback {
        Some(fallback) => frame.resolve_with_fallback(abstract_.clone(), fallback).await,
        None => frame.resolve(abstract_.clone()).await,
    };

    match resolved.and_then(downcast::<T>) {
        Ok(dependency) => Ok(dependency),
        Err(err) => match frame.arguments_mut().take_positional::<T>() {
            Some(dependency) => {
                debug!(parameter = %frame.parameter_label(), "Resolved from positional argument");
                Ok(dependency)
            }
            None => Err(frame.dependency_error(abstract_, err)),
        },
    }
}

/// Dependency resolved from the container by its type
pub struct Inject<T>(pub Arc<T>);

impl<T: Send + Sync + 'static> DependencyResolver for Inject<T> {
    type Error = ResolveErrorKind;

    async fn resolve(frame: &mut Frame) -> Result<Self, Self::Error> {
        resolve_dependency(frame, Abstract::of::<T>(), None).await.map(Self)
    }

    #[inline]
    fn parameters() -> Vec<Parameter> {
        vec![Parameter::of::<T>(ParameterKind::Dependency)]
    }
}

/// Dependency resolved from the container by its type, built through its [`Injectable`] implementation if it's not bound
pub struct Autowired<T>(pub Arc<T>);

impl<T: Injectable> DependencyResolver for Autowired<T> {
    type Error = ResolveErrorKind;

    async fn resolve(frame: &mut Frame) -> Result<Self, Self::Error> {
        resolve_dependency(frame, Abstract::of::<T>(), Some(boxed_injectable::<T>()))
            .await
            .map(Self)
    }

    #[inline]
    fn parameters() -> Vec<Parameter> {
        vec![Parameter::of::<T>(ParameterKind::Dependency)]
    }
}

/// Tags of an [`Annotated`] dependency
pub trait Metadata: Send + 'static {
    fn tags() -> Vec<Cow<'static, str>>;
}

/// Dependency resolved by its type and tags.
/// The binding of the type builds it, receiving the tags as leading positional arguments.
pub struct Annotated<T, M>(pub Arc<T>, PhantomData<fn() -> M>);

impl<T, M> Annotated<T, M> {
    #[inline]
    #[must_use]
    pub fn into_inner(self) -> Arc<T> {
        self.0
    }
}

impl<T: Send + Sync + 'static, M: Metadata> DependencyResolver for Annotated<T, M> {
    type Error = ResolveErrorKind;

    async fn resolve(frame: &mut Frame) -> Result<Self, Self::Error> {
        let abstract_ = Abstract::Tagged(TypeInfo::of::<T>(), M::tags().into());
        resolve_dependency(frame, abstract_, None)
            .await
            .map(|dependency| Self(dependency, PhantomData))
    }

    #[inline]
    fn parameters() -> Vec<Parameter> {
        vec![Parameter::of::<T>(ParameterKind::Dependency)]
    }
}

/// String key of a [`Named`] dependency
pub trait Name: Send + 'static {
    const NAME: &'static str;
}

/// Dependency resolved by a string key (or an alias)
pub struct Named<T, N>(pub Arc<T>, PhantomData<fn() -> N>);

impl<T, N> Named<T, N> {
    #[inline]
    #[must_use]
    pub fn into_inner(self) -> Arc<T> {
        self.0
    }
}

impl<T: Send + Sync + 'static, N: Name> DependencyResolver for Named<T, N> {
    type Error = ResolveErrorKind;

    async fn resolve(frame: &mut Frame) -> Result<Self, Self::Error> {
        resolve_dependency(frame, Abstract::name(N::NAME), None)
            .await
            .map(|dependency| Self(dependency, PhantomData))
    }

    #[inline]
    fn parameters() -> Vec<Parameter> {
        vec![Parameter::of::<T>(ParameterKind::Dependency)]
    }
}

/// Primitive parameter, filled from (in priority order) a keyword argument with the parameter's name,
/// the first unconsumed positional argument of a matching type, or the parameter's default value
pub struct Arg<T>(pub T);

impl<T: Primitive> DependencyResolver for Arg<T> {
    type Error = ResolveErrorKind;

    async fn resolve(frame: &mut Frame) -> Result<Self, Self::Error> {
        if let Some(name) = frame.parameter_name() {
            if let Some(value) = frame.arguments_mut().take_keyword(&name) {
                return match T::from_value(&value) {
                    Some(value) => Ok(Self(value)),
                    None => Err(ResolveErrorKind::IncorrectType {
                        expected: TypeInfo::of::<T>(),
                        actual: (*value).type_id(),
                    }),
                };
            }
        }

        let positional = frame
            .arguments_mut()
            .take_positional_where(|value| T::from_value(value).is_some())
            .and_then(|value| T::from_value(&value));
        if let Some(value) = positional {
            return Ok(Self(value));
        }

        if let Some(value) = frame.default_value().and_then(|value| T::from_value(&value)) {
            return Ok(Self(value));
        }

        Err(ResolveErrorKind::MissingArgument {
            parameter: frame.parameter_label(),
            position: frame.position(),
            callable: frame.callable(),
            type_name: TypeInfo::of::<T>().name,
        })
    }

    #[inline]
    fn parameters() -> Vec<Parameter> {
        vec![Parameter::of::<T>(ParameterKind::Primitive)]
    }
}

/// Variadic positional parameter.
///
/// Starts from the bound `Vec<Arc<T>>` if there is one, otherwise from the bound `T` as a single element,
/// and extends it with every unconsumed positional argument of type `T`.
pub struct Rest<T>(pub Vec<Arc<T>>);

impl<T: Send + Sync + 'static> DependencyResolver for Rest<T> {
    type Error = ResolveErrorKind;

    async fn resolve(frame: &mut Frame) -> Result<Self, Self::Error> {
        let sequence = Abstract::of::<Vec<Arc<T>>>();
        let single = Abstract::of::<T>();

        let mut values = if frame.container().bound(sequence.clone()) {
            let resolved = frame.resolve(sequence.clone()).await.and_then(downcast::<Vec<Arc<T>>>);
            match resolved {
                Ok(values) => values.as_ref().clone(),
                Err(err) => return Err(frame.dependency_error(sequence, err)),
            }
        } else if frame.container().bound(single.clone()) {
            let resolved = frame.resolve(single.clone()).await.and_then(downcast::<T>);
            match resolved {
                Ok(value) => vec![value],
                Err(err) => return Err(frame.dependency_error(single, err)),
            }
        } else {
            Vec::new()
        };

        values.extend(frame.arguments_mut().drain_positional::<T>());

        Ok(Self(values))
    }

    #[inline]
    fn parameters() -> Vec<Parameter> {
        vec![Parameter::of::<T>(ParameterKind::VariadicPositional)]
    }
}

/// Variadic keyword parameter: every keyword argument no other parameter claimed.
/// Must be the last parameter to see all of them.
pub struct Kwargs(pub BTreeMap<Cow<'static, str>, Value>);

impl DependencyResolver for Kwargs {
    type Error = ResolveErrorKind;

    #[inline]
    async fn resolve(frame: &mut Frame) -> Result<Self, Self::Error> {
        Ok(Self(frame.arguments_mut().take_keywords()))
    }

    #[inline]
    fn parameters() -> Vec<Parameter> {
        vec![Parameter::of::<Value>(ParameterKind::VariadicKeyword)]
    }
}
