use core::fmt::{self, Display, Formatter};
use std::borrow::Cow;

use crate::any::TypeInfo;

/// Lookup key of a service.
///
/// Types are the usual key. Names are plain string keys, which can also be used as aliases
/// of another key (see [`crate::Container::alias`]).
/// A tagged key carries metadata next to its type: the type is used to find the binding,
/// the tags are passed to the constructor as leading positional arguments and the built instance
/// is cached under the whole tagged key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Abstract {
    Type(TypeInfo),
    Name(Cow<'static, str>),
    Tagged(TypeInfo, Box<[Cow<'static, str>]>),
}

impl Abstract {
    #[inline]
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::Type(TypeInfo::of::<T>())
    }

    #[inline]
    #[must_use]
    pub fn name(name: impl Into<Cow<'static, str>>) -> Self {
        Self::Name(name.into())
    }

    #[must_use]
    pub fn tagged<T, I, S>(tags: I) -> Self
    where
        T: ?Sized + 'static,
        I: IntoIterator<Item = S>,
        S: Into<Cow<'static, str>>,
    {
        Self::Tagged(TypeInfo::of::<T>(), tags.into_iter().map(Into::into).collect())
    }

    #[inline]
    #[must_use]
    pub const fn is_name(&self) -> bool {
        matches!(self, Self::Name(_))
    }

    #[inline]
    #[must_use]
    pub const fn type_info(&self) -> Option<&TypeInfo> {
        match self {
            Self::Type(type_info) | Self::Tagged(type_info, _) => Some(type_info),
            Self::Name(_) => None,
        }
    }

    /// Splits a tagged key into the key of its type and its tags.
    /// Other keys are returned as is with no tags.
    #[must_use]
    pub(crate) fn split_tags(&self) -> (Abstract, &[Cow<'static, str>]) {
        match self {
            Self::Tagged(type_info, tags) => (Self::Type(*type_info), &tags[..]),
            other => (other.clone(), &[][..]),
        }
    }
}

impl Display for Abstract {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type(type_info) => write!(f, "{type_info}"),
            Self::Name(name) => write!(f, "\"{name}\""),
            Self::Tagged(type_info, tags) => {
                write!(f, "{type_info}[")?;
                for (index, tag) in tags.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    f.write_str(tag)?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<TypeInfo> for Abstract {
    #[inline]
    fn from(type_info: TypeInfo) -> Self {
        Self::Type(type_info)
    }
}

impl From<&'static str> for Abstract {
    #[inline]
    fn from(name: &'static str) -> Self {
        Self::Name(Cow::Borrowed(name))
    }
}

impl From<String> for Abstract {
    #[inline]
    fn from(name: String) -> Self {
        Self::Name(Cow::Owned(name))
    }
}

impl From<&Abstract> for Abstract {
    #[inline]
    fn from(abstract_: &Abstract) -> Self {
        abstract_.clone()
    }
}
