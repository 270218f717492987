use std::{
    borrow::Cow,
    collections::{BTreeMap, VecDeque},
    sync::Arc,
};

use crate::any::Value;

/// Explicit arguments of a call or a build.
///
/// Positional arguments are consumed by primitive parameters of a matching type (in order of appearance),
/// by dependency parameters whose resolution failed and by variadic parameters.
/// Keyword arguments are matched against parameter names of the callable's [`crate::Signature`].
#[derive(Clone, Default)]
pub struct Arguments {
    positional: VecDeque<Value>,
    keyword: BTreeMap<Cow<'static, str>, Value>,
}

impl Arguments {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn arg<T: Send + Sync + 'static>(self, value: T) -> Self {
        self.arg_value(Arc::new(value))
    }

    #[inline]
    #[must_use]
    pub fn arg_value(mut self, value: Value) -> Self {
        self.positional.push_back(value);
        self
    }

    #[inline]
    #[must_use]
    pub fn kwarg<T: Send + Sync + 'static>(self, name: impl Into<Cow<'static, str>>, value: T) -> Self {
        self.kwarg_value(name, Arc::new(value))
    }

    #[inline]
    #[must_use]
    pub fn kwarg_value(mut self, name: impl Into<Cow<'static, str>>, value: Value) -> Self {
        self.keyword.insert(name.into(), value);
        self
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keyword.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn positional_len(&self) -> usize {
        self.positional.len()
    }

    /// Arguments of a tagged build: every tag becomes a leading positional `String`
    pub(crate) fn from_tags(tags: &[Cow<'static, str>]) -> Self {
        Self {
            positional: tags.iter().map(|tag| Arc::new(tag.to_string()) as Value).collect(),
            keyword: BTreeMap::new(),
        }
    }

    pub(crate) fn take_keyword(&mut self, name: &str) -> Option<Value> {
        self.keyword.remove(name)
    }

    pub(crate) fn take_keywords(&mut self) -> BTreeMap<Cow<'static, str>, Value> {
        core::mem::take(&mut self.keyword)
    }

    /// Takes the first unconsumed positional argument accepted by `predicate`
    pub(crate) fn take_positional_where(&mut self, predicate: impl Fn(&Value) -> bool) -> Option<Value> {
        let index = self.positional.iter().position(predicate)?;
        self.positional.remove(index)
    }

    pub(crate) fn take_positional<T: Send + Sync + 'static>(&mut self) -> Option<Arc<T>> {
        self.take_positional_where(|value| value.is::<T>())
            .and_then(|value| value.downcast().ok())
    }

    pub(crate) fn drain_positional<T: Send + Sync + 'static>(&mut self) -> Vec<Arc<T>> {
        let mut drained = Vec::new();
        self.positional.retain(|value| match value.clone().downcast::<T>() {
            Ok(value) => {
                drained.push(value);
                false
            }
            Err(_) => true,
        });
        drained
    }
}
