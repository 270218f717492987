use core::{
    any::{type_name, Any, TypeId},
    cmp::Ordering,
    fmt::{self, Display, Formatter},
};
use std::sync::Arc;

use crate::errors::ResolveErrorKind;

/// Type-erased instance as stored in the cache and passed as an argument
pub type Value = Arc<dyn Any + Send + Sync>;

pub(crate) fn downcast<T: Send + Sync + 'static>(value: Value) -> Result<Arc<T>, ResolveErrorKind> {
    value.downcast::<T>().map_err(|value| ResolveErrorKind::IncorrectType {
        expected: TypeInfo::of::<T>(),
        actual: (*value).type_id(),
    })
}

#[derive(Debug, Clone, Copy)]
pub struct TypeInfo {
    pub name: &'static str,
    pub id: TypeId,
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeInfo {}

impl PartialOrd for TypeInfo {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TypeInfo {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl Display for TypeInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl TypeInfo {
    #[inline]
    #[must_use]
    pub fn of<T>() -> Self
    where
        T: ?Sized + 'static,
    {
        Self {
            name: type_name::<T>(),
            id: TypeId::of::<T>(),
        }
    }

    #[inline]
    #[must_use]
    pub fn short_name(&self) -> &'static str {
        self.name.rsplit_once("::").map_or(self.name, |(_, name)| name)
    }
}

#[cfg(test)]
mod tests {
    use super::{downcast, TypeInfo, Value};
    use crate::errors::ResolveErrorKind;

    use std::sync::Arc;

    struct Request;

    #[test]
    fn test_type_info_eq_by_id() {
        assert_eq!(TypeInfo::of::<Request>(), TypeInfo::of::<Request>());
        assert_ne!(TypeInfo::of::<Request>(), TypeInfo::of::<u8>());
    }

    #[test]
    fn test_short_name() {
        assert_eq!(TypeInfo::of::<Request>().short_name(), "Request");
        assert_eq!(TypeInfo::of::<u8>().short_name(), "u8");
    }

    #[test]
    fn test_downcast() {
        let value: Value = Arc::new(Request);

        assert!(downcast::<Request>(value.clone()).is_ok());
        assert!(matches!(
            downcast::<u8>(value),
            Err(ResolveErrorKind::IncorrectType { expected, .. }) if expected == TypeInfo::of::<u8>()
        ));
    }
}
