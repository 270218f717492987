/// Config for a binding
/// ## Fields
/// - `cache_provides`:
///   If `true`, the instance provided by the binding will be cached and reused
///   for the lifetime of the container that built it.
///
///   This does **not** affect the dependencies of the instance.
///   Only the final result is cached if caching is applicable.
/// - `scoped`:
///   If `true`, the binding isn't used by the container it's registered in,
///   but copied into every scoped container created afterward, so each scope builds its own instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    pub cache_provides: bool,
    pub scoped: bool,
}

impl Config {
    /// New instance on every resolution
    #[inline]
    #[must_use]
    pub const fn transient() -> Self {
        Self {
            cache_provides: false,
            scoped: false,
        }
    }

    /// One instance per container
    #[inline]
    #[must_use]
    pub const fn singleton() -> Self {
        Self {
            cache_provides: true,
            scoped: false,
        }
    }

    /// One instance per scoped container
    #[inline]
    #[must_use]
    pub const fn scoped() -> Self {
        Self {
            cache_provides: true,
            scoped: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::transient()
    }
}
