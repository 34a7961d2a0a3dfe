//! Higher-kinded `Maybe<T>` abstraction for witness values.
//!
//! Synthesis code is written once and run under drivers that either carry
//! witness data (proving) or do not (constraint counting). Instead of
//! threading `Option<T>` through every gadget, each driver picks a kind:
//!
//! - `Always<T>`: transparently wraps `T`, guaranteed to contain a value
//! - `Empty<T>`: zero-sized, never contains a value
//!
//! Closures handed to [`Maybe::just`] are only invoked for `Always`, so
//! witness computation disappears entirely when counting.
//!
//! # Example
//!
//! ```rust,ignore
//! let value: Always<u64> = <Always<()> as Maybe<()>>::just(|| 40 + 2);
//! assert_eq!(value.take(), 42);
//!
//! // Never evaluated.
//! let _: Empty<u64> = <Empty<()> as Maybe<()>>::just(|| unreachable!());
//! ```

use core::marker::PhantomData;

use crate::error::Error;

/// Kind marker for `Maybe<T>` types.
///
/// Emulates a higher-kinded type: the inner type can be rebound while the
/// "always" or "empty" nature of the container is preserved.
pub trait MaybeKind: Copy + Clone {
    /// Rebind this kind to wrap a different type.
    type Rebind<T>: Maybe<T, Kind = Self>;

    /// Whether this kind always contains a value.
    const HAS_VALUE: bool;
}

/// Option-like operations whose variant is fixed at compile time.
pub trait Maybe<T>: Sized {
    /// The kind of this Maybe (Always or Empty).
    type Kind: MaybeKind;

    /// Create a `Maybe<R>` by invoking the closure if the kind is `Always`.
    ///
    /// For `Empty` the closure is never called.
    fn just<R>(f: impl FnOnce() -> R) -> <Self::Kind as MaybeKind>::Rebind<R>;

    /// Like `just` but the closure may fail.
    fn with<R>(
        f: impl FnOnce() -> Result<R, Error>,
    ) -> Result<<Self::Kind as MaybeKind>::Rebind<R>, Error>;

    /// Extract the contained value.
    ///
    /// # Panics
    ///
    /// Panics for `Empty`. Only call inside closures passed to `just`/`with`,
    /// which are never run without a witness.
    fn take(self) -> T;

    /// Map a function over the contained value.
    fn map<U, F>(self, f: F) -> <Self::Kind as MaybeKind>::Rebind<U>
    where
        F: FnOnce(T) -> U;

    /// Borrow the contained value.
    fn view(&self) -> <Self::Kind as MaybeKind>::Rebind<&T>;

    /// Reference to the contained value.
    ///
    /// # Panics
    ///
    /// Panics for `Empty`, see [`Maybe::take`].
    fn snag(&self) -> &T;

    /// Clone the container, cloning the value if there is one.
    fn cloned(&self) -> Self
    where
        T: Clone;

    /// Zip two `Maybe` values of the same kind.
    fn zip<U>(
        self,
        other: <Self::Kind as MaybeKind>::Rebind<U>,
    ) -> <Self::Kind as MaybeKind>::Rebind<(T, U)>;

    /// Convert to a standard `Option<T>`.
    fn into_option(self) -> Option<T>;

    /// Whether this Maybe contains a value (compile-time constant).
    fn has_value() -> bool {
        Self::Kind::HAS_VALUE
    }
}

// =============================================================================
// Always<T> - Contains a value
// =============================================================================

/// A `Maybe<T>` that always contains a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct Always<T>(pub T);

/// Kind marker for `Always<T>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AlwaysKind;

impl MaybeKind for AlwaysKind {
    type Rebind<T> = Always<T>;
    const HAS_VALUE: bool = true;
}

impl<T> Maybe<T> for Always<T> {
    type Kind = AlwaysKind;

    #[inline(always)]
    fn just<R>(f: impl FnOnce() -> R) -> Always<R> {
        Always(f())
    }

    #[inline(always)]
    fn with<R>(f: impl FnOnce() -> Result<R, Error>) -> Result<Always<R>, Error> {
        f().map(Always)
    }

    #[inline(always)]
    fn take(self) -> T {
        self.0
    }

    #[inline(always)]
    fn map<U, F>(self, f: F) -> Always<U>
    where
        F: FnOnce(T) -> U,
    {
        Always(f(self.0))
    }

    #[inline(always)]
    fn view(&self) -> Always<&T> {
        Always(&self.0)
    }

    #[inline(always)]
    fn snag(&self) -> &T {
        &self.0
    }

    #[inline(always)]
    fn cloned(&self) -> Self
    where
        T: Clone,
    {
        Always(self.0.clone())
    }

    #[inline(always)]
    fn zip<U>(self, other: Always<U>) -> Always<(T, U)> {
        Always((self.0, other.0))
    }

    #[inline(always)]
    fn into_option(self) -> Option<T> {
        Some(self.0)
    }
}

impl<T> Always<T> {
    /// Unwrap the inner value.
    #[inline(always)]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> From<T> for Always<T> {
    #[inline(always)]
    fn from(value: T) -> Self {
        Always(value)
    }
}

// =============================================================================
// Empty - Never contains a value
// =============================================================================

/// A `Maybe<T>` that never contains a value.
///
/// Generic over `T` only for type system compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Empty<T>(PhantomData<T>);

/// Kind marker for `Empty`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EmptyKind;

impl MaybeKind for EmptyKind {
    type Rebind<T> = Empty<T>;
    const HAS_VALUE: bool = false;
}

impl<T> Empty<T> {
    /// Create a new empty value.
    #[inline(always)]
    pub const fn new() -> Self {
        Empty(PhantomData)
    }
}

impl<T> Maybe<T> for Empty<T> {
    type Kind = EmptyKind;

    #[inline(always)]
    fn just<R>(_f: impl FnOnce() -> R) -> Empty<R> {
        Empty::new()
    }

    #[inline(always)]
    fn with<R>(_f: impl FnOnce() -> Result<R, Error>) -> Result<Empty<R>, Error> {
        Ok(Empty::new())
    }

    #[inline(always)]
    fn take(self) -> T {
        unreachable!("Empty::take() called outside a witness closure")
    }

    #[inline(always)]
    fn map<U, F>(self, _f: F) -> Empty<U>
    where
        F: FnOnce(T) -> U,
    {
        Empty::new()
    }

    #[inline(always)]
    fn view(&self) -> Empty<&T> {
        Empty::new()
    }

    #[inline(always)]
    fn snag(&self) -> &T {
        unreachable!("Empty::snag() called outside a witness closure")
    }

    #[inline(always)]
    fn cloned(&self) -> Self
    where
        T: Clone,
    {
        Empty::new()
    }

    #[inline(always)]
    fn zip<U>(self, _other: Empty<U>) -> Empty<(T, U)> {
        Empty::new()
    }

    #[inline(always)]
    fn into_option(self) -> Option<T> {
        None
    }
}
