use core::any::TypeId;
use std::borrow::Cow;

use super::instantiate::InstantiateErrorKind;
use crate::{any::TypeInfo, key::Abstract};

#[derive(thiserror::Error, Debug)]
pub enum ResolveErrorKind {
    #[error("No binding found for {abstract_}")]
    Unbound { abstract_: Abstract },
    #[error("{abstract_} is bound for scoped containers only. Create a scoped container to resolve it")]
    NoAccessible { abstract_: Abstract },
    #[error(
        "Parameter `{parameter}` (position {position}, {type_name}) of {callable} has no keyword argument, \
        positional argument or default value"
    )]
    MissingArgument {
        parameter: Cow<'static, str>,
        position: usize,
        callable: &'static str,
        type_name: &'static str,
    },
    #[error("Parameter `{parameter}` ({abstract_}) of {callable} can't be resolved: {source}")]
    Dependency {
        parameter: Cow<'static, str>,
        callable: &'static str,
        abstract_: Abstract,
        #[source]
        source: Box<ResolveErrorKind>,
    },
    #[error("Failed to build {abstract_}: {source}")]
    Build {
        abstract_: Abstract,
        #[source]
        source: InstantiateErrorKind,
    },
    #[error("Incorrect instance type. Actual: {actual:?}, expected: {expected}")]
    IncorrectType { expected: TypeInfo, actual: TypeId },
    #[error("Cyclic dependency detected: {}", display_path(path))]
    CyclicDependency { path: Box<[Abstract]> },
}

fn display_path(path: &[Abstract]) -> String {
    path.iter().map(ToString::to_string).collect::<Vec<_>>().join(" -> ")
}

impl ResolveErrorKind {
    /// Returns the innermost error, skipping the parameter context added on each level of the graph
    #[must_use]
    pub fn root_cause(&self) -> &ResolveErrorKind {
        match self {
            Self::Dependency { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
