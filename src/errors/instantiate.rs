/// Error of user construction code
#[derive(thiserror::Error, Debug)]
pub enum InstantiateErrorKind {
    #[error(transparent)]
    Custom(#[from] anyhow::Error),
    #[error("Constructor panicked on the blocking pool")]
    Panicked,
}

impl InstantiateErrorKind {
    #[inline]
    #[must_use]
    pub fn msg<M>(message: M) -> Self
    where
        M: core::fmt::Display + core::fmt::Debug + Send + Sync + 'static,
    {
        Self::Custom(anyhow::Error::msg(message))
    }
}
