#[macro_use]
pub(crate) mod macros;

pub(crate) mod any;
pub(crate) mod arguments;
pub(crate) mod cache;
pub(crate) mod callbacks;
pub(crate) mod config;
pub(crate) mod container;
pub(crate) mod dependency_resolver;
pub(crate) mod errors;
pub(crate) mod finalizer;
pub(crate) mod inject;
pub(crate) mod instantiator;
pub(crate) mod key;
pub(crate) mod lock;
pub(crate) mod registry;
pub(crate) mod service;
pub(crate) mod signature;
pub(crate) mod utils;

pub use any::{TypeInfo, Value};
pub use arguments::Arguments;
pub use config::Config;
pub use container::Container;
pub use dependency_resolver::{DependencyResolver, Frame};
pub use errors::{InstantiateErrorKind, InstantiatorErrorKind, ResolveErrorKind};
pub use finalizer::Finalizer;
pub use inject::{Annotated, Arg, Autowired, Inject, Kwargs, Metadata, Name, Named, Rest};
pub use instantiator::{Awaited, Blocking, Injectable, Instantiator};
pub use key::Abstract;
pub use registry::Concrete;
pub use signature::{Parameter, ParameterKind, Primitive, Signature};
