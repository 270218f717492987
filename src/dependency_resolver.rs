use core::future::Future;
use std::{borrow::Cow, sync::Arc};

use crate::{
    any::Value,
    arguments::Arguments,
    container::Container,
    errors::ResolveErrorKind,
    instantiator::BoxedCloneInstantiator,
    key::Abstract,
    signature::{Parameter, ParameterKind, Signature},
};

/// State of a single parameter-list resolution: the container, explicit arguments left unconsumed,
/// the callable's signature and the position of the parameter being resolved.
pub struct Frame {
    pub(crate) container: Container,
    pub(crate) arguments: Arguments,
    pub(crate) signature: Arc<Signature>,
    pub(crate) callable: &'static str,
    pub(crate) position: usize,
    pub(crate) path: Vec<Abstract>,
}

impl Frame {
    pub(crate) fn new(
        container: Container,
        arguments: Arguments,
        signature: Arc<Signature>,
        callable: &'static str,
        path: Vec<Abstract>,
    ) -> Self {
        Self {
            container,
            arguments,
            signature,
            callable,
            position: 0,
            path,
        }
    }

    #[inline]
    #[must_use]
    pub fn container(&self) -> &Container {
        &self.container
    }

    #[inline]
    pub fn arguments_mut(&mut self) -> &mut Arguments {
        &mut self.arguments
    }

    #[inline]
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    #[inline]
    #[must_use]
    pub fn callable(&self) -> &'static str {
        self.callable
    }

    /// Name of the current parameter, if the callable was registered with a signature
    #[inline]
    #[must_use]
    pub fn parameter_name(&self) -> Option<Cow<'static, str>> {
        self.signature.name(self.position).cloned()
    }

    #[inline]
    #[must_use]
    pub fn default_value(&self) -> Option<Value> {
        let name = self.signature.name(self.position)?;
        self.signature.default_of(name).cloned()
    }

    /// Resolves `abstract_` in the frame's container as a part of the current resolution path
    ///
    /// # Errors
    /// Returns the error of the nested resolution as is
    pub async fn resolve(&self, abstract_: Abstract) -> Result<Value, ResolveErrorKind> {
        self.container.resolve_in(abstract_, None, self.path.clone()).await
    }

    pub(crate) async fn resolve_with_fallback(
        &self,
        abstract_: Abstract,
        fallback: BoxedCloneInstantiator,
    ) -> Result<Value, ResolveErrorKind> {
        self.container.resolve_in(abstract_, Some(fallback), self.path.clone()).await
    }

    pub(crate) fn parameter_label(&self) -> Cow<'static, str> {
        self.parameter_name()
            .unwrap_or_else(|| Cow::Owned(format!("#{}", self.position)))
    }

    pub(crate) fn dependency_error(&self, abstract_: Abstract, source: ResolveErrorKind) -> ResolveErrorKind {
        ResolveErrorKind::Dependency {
            parameter: self.parameter_label(),
            callable: self.callable,
            abstract_,
            source: Box::new(source),
        }
    }

    #[inline]
    pub(crate) fn advance(&mut self) {
        self.position += 1;
    }
}

pub trait DependencyResolver: Sized + Send + 'static {
    type Error: Into<ResolveErrorKind>;

    fn resolve(frame: &mut Frame) -> impl Future<Output = Result<Self, Self::Error>> + Send;

    fn parameters() -> Vec<Parameter>;
}

impl DependencyResolver for Container {
    type Error = ResolveErrorKind;

    #[inline]
    async fn resolve(frame: &mut Frame) -> Result<Self, Self::Error> {
        Ok(frame.container.clone())
    }

    #[inline]
    fn parameters() -> Vec<Parameter> {
        vec![Parameter::of::<Container>(ParameterKind::Container)]
    }
}

macro_rules! impl_dependency_resolver {
    (
        [$($ty:ident),*]
    ) => {
        #[allow(non_snake_case, unused_mut)]
        impl<$($ty,)*> DependencyResolver for ($($ty,)*)
        where
            $( $ty: DependencyResolver, )*
        {
            type Error = ResolveErrorKind;

            #[inline]
            #[allow(unused_variables)]
            async fn resolve(frame: &mut Frame) -> Result<Self, Self::Error> {
                $(
                    let $ty = $ty::resolve(frame).await.map_err(Into::into)?;
                    frame.advance();
                )*
                Ok(($($ty,)*))
            }

            #[inline]
            fn parameters() -> Vec<Parameter> {
                let mut parameters = Vec::new();
                $( parameters.extend($ty::parameters()); )*
                parameters
            }
        }
    };
}

all_the_tuples!(impl_dependency_resolver);

#[cfg(test)]
mod tests {
    use super::{DependencyResolver, Frame};
    use crate::{
        errors::InstantiateErrorKind, signature::ParameterKind, Arg, Arguments, Container, Inject, Kwargs, Rest, Signature,
    };

    use std::sync::Arc;
    use tracing_test::traced_test;

    struct Request;

    #[test]
    #[allow(dead_code)]
    fn test_dependency_resolver_impls() {
        fn resolver<T: DependencyResolver>() {}
        fn resolver_with_dep<Dep: Send + Sync + 'static>() {
            resolver::<Inject<Dep>>();
            resolver::<Rest<Dep>>();
            resolver::<(Inject<Dep>, Arg<String>, Container, Kwargs)>();
        }
    }

    #[test]
    fn test_parameters() {
        let kinds = <(Inject<Request>, Arg<u8>, Rest<Request>, Kwargs, Container)>::parameters()
            .into_iter()
            .map(|parameter| parameter.kind)
            .collect::<Vec<_>>();

        assert_eq!(
            kinds,
            [
                ParameterKind::Dependency,
                ParameterKind::Primitive,
                ParameterKind::VariadicPositional,
                ParameterKind::VariadicKeyword,
                ParameterKind::Container,
            ]
        );
    }

    #[tokio::test]
    #[traced_test]
    async fn test_tuple_advances_position() {
        let container = Container::new();
        container.singleton(|| Ok::<_, InstantiateErrorKind>(Request));

        let mut frame = Frame::new(
            container,
            Arguments::new().kwarg("port", 8080_u16),
            Arc::new(Signature::new(["request", "port"])),
            "test",
            Vec::new(),
        );

        let (Inject(_request), Arg(port)) = <(Inject<Request>, Arg<u16>)>::resolve(&mut frame).await.unwrap();

        assert_eq!(port, 8080);
        assert_eq!(frame.position(), 2);
    }
}
