use std::{borrow::Cow, collections::BTreeMap, sync::Arc};

use crate::any::{TypeInfo, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    /// Filled from a keyword argument, a positional argument or a default value
    Primitive,
    /// Resolved through the container
    Dependency,
    VariadicPositional,
    VariadicKeyword,
    /// The container the resolution runs in
    Container,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parameter {
    pub kind: ParameterKind,
    pub type_info: TypeInfo,
}

impl Parameter {
    #[inline]
    #[must_use]
    pub fn of<T: ?Sized + 'static>(kind: ParameterKind) -> Self {
        Self {
            kind,
            type_info: TypeInfo::of::<T>(),
        }
    }
}

/// Names and default values of a callable's parameters, in declaration order.
///
/// Types and kinds of the parameters are known statically from the callable's arguments,
/// names and defaults are not, so they are described once at registration.
#[derive(Clone, Default)]
pub struct Signature {
    names: Vec<Cow<'static, str>>,
    defaults: BTreeMap<Cow<'static, str>, Value>,
}

impl Signature {
    #[must_use]
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Cow<'static, str>>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            defaults: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_default<T: Primitive>(mut self, name: impl Into<Cow<'static, str>>, value: T) -> Self {
        self.defaults.insert(name.into(), Arc::new(value));
        self
    }

    #[inline]
    #[must_use]
    pub fn name(&self, position: usize) -> Option<&Cow<'static, str>> {
        self.names.get(position)
    }

    #[inline]
    #[must_use]
    pub fn default_of(&self, name: &str) -> Option<&Value> {
        self.defaults.get(name)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Static allow-list of types filled from arguments instead of the container
pub trait Primitive: Sized + Send + Sync + 'static {
    fn from_value(value: &Value) -> Option<Self>;
}

macro_rules! impl_primitive {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Primitive for $ty {
                #[inline]
                fn from_value(value: &Value) -> Option<Self> {
                    value.downcast_ref::<$ty>().cloned()
                }
            }
        )*
    };
}

impl_primitive!(
    u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64, bool, char, &'static str, Vec<u8>
);

impl Primitive for String {
    fn from_value(value: &Value) -> Option<Self> {
        value
            .downcast_ref::<String>()
            .cloned()
            .or_else(|| value.downcast_ref::<&'static str>().map(|value| (*value).to_owned()))
    }
}

impl Primitive for Value {
    #[inline]
    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}
