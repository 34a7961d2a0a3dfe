//! Circuit synthesis drivers.
//!
//! A `Driver` is a compile-time specialized context for how a circuit is
//! synthesized at runtime. The same gadget code runs under every driver:
//!
//! - **Proof generation**: the driver records witness values and checks
//!   each constraint as it is added.
//! - **Shape measurement**: the driver counts wires and constraints without
//!   ever touching a witness.
//!
//! # Wire Types
//!
//! `D::W` is an abstract wire. During proving it is a position in the
//! witness vector; while counting it carries nothing at all.
//!
//! # Example
//!
//! ```rust,ignore
//! fn square_plus_one<D: Driver>(dr: &mut D, x: &WireValue<D>) -> Result<WireValue<D>> {
//!     let sq = dr.mul(&x.wire, &x.wire)?;
//!     let out = dr.add(|| [(sq, D::F::ONE), (D::ONE, D::F::ONE)])?;
//!     let value = D::just(|| x.value.snag().square() + D::F::ONE);
//!     Ok(WireValue::new(out, value))
//! }
//! ```

use core::fmt;

use ff::Field;

use crate::error::Result;
use crate::maybe::{Maybe, MaybeKind};

/// Type alias for the witness type of a driver.
///
/// This is `Always<T>` when the driver has witness data, or `Empty<T>` when it doesn't.
pub type Witness<D, T> = <<D as Driver>::MaybeKind as MaybeKind>::Rebind<T>;

/// A circuit synthesis driver.
pub trait Driver: Sized {
    /// The field over which this driver operates.
    type F: Field;

    /// The abstract wire type.
    ///
    /// All you can do with a wire is clone it and hand it back to the driver.
    type W: Clone + fmt::Debug;

    /// The constant ONE wire.
    const ONE: Self::W;

    /// The kind of `Maybe<T>` used for witness values.
    ///
    /// - `AlwaysKind` during proof generation (witnesses are present)
    /// - `EmptyKind` while counting (witnesses are absent)
    type MaybeKind: MaybeKind;

    // =========================================================================
    // Constraint methods
    // =========================================================================

    /// Allocate an unconstrained wire.
    ///
    /// The closure is only invoked when the driver carries witness data.
    fn alloc(&mut self, value: impl FnOnce() -> Result<Self::F>) -> Result<Self::W>;

    /// Create a multiplication gate `a * b = c` over existing wires and
    /// return the output wire `c`.
    fn mul(&mut self, a: &Self::W, b: &Self::W) -> Result<Self::W>;

    /// Create a wire equal to a linear combination of wires.
    ///
    /// The closure yields `(wire, coefficient)` pairs.
    ///
    /// ```rust,ignore
    /// // w = 2*a + 3*b - c
    /// let w = dr.add(|| [
    ///     (a.clone(), F::from(2)),
    ///     (b.clone(), F::from(3)),
    ///     (c.clone(), -F::ONE),
    /// ])?;
    /// ```
    fn add<L: IntoIterator<Item = (Self::W, Self::F)>>(
        &mut self,
        lc: impl FnOnce() -> L,
    ) -> Result<Self::W>;

    /// Enforce that a linear combination of wires equals zero.
    fn enforce_zero<L: IntoIterator<Item = (Self::W, Self::F)>>(
        &mut self,
        lc: impl FnOnce() -> L,
    ) -> Result<()>;

    // =========================================================================
    // Convenience methods
    // =========================================================================

    /// Create a `Maybe<T>` using the provided closure.
    ///
    /// This is a proxy to `Maybe<T>::just` using this driver's `MaybeKind`.
    #[inline(always)]
    fn just<R>(f: impl FnOnce() -> R) -> Witness<Self, R> {
        <Witness<Self, ()> as Maybe<()>>::just(f)
    }

    /// Create a `Maybe<T>` using the provided fallible closure.
    #[inline(always)]
    fn with<R>(f: impl FnOnce() -> Result<R>) -> Result<Witness<Self, R>> {
        <Witness<Self, ()> as Maybe<()>>::with(f)
    }

    /// Check if this driver expects witness values.
    #[inline(always)]
    fn has_witness() -> bool {
        Self::MaybeKind::HAS_VALUE
    }

    /// Allocate a constant wire.
    fn constant(&mut self, value: Self::F) -> Result<Self::W> {
        self.add(|| [(Self::ONE, value)])
    }

    /// Enforce that two wires are equal.
    fn enforce_equal(&mut self, a: &Self::W, b: &Self::W) -> Result<()> {
        self.enforce_zero(|| [(a.clone(), Self::F::ONE), (b.clone(), -Self::F::ONE)])
    }
}

/// A wire together with its witness value (if the driver carries one).
pub struct WireValue<D: Driver> {
    /// The abstract wire handle.
    pub wire: D::W,
    /// The witness value, if available.
    pub value: Witness<D, D::F>,
}

impl<D: Driver> Clone for WireValue<D> {
    fn clone(&self) -> Self {
        WireValue {
            wire: self.wire.clone(),
            value: self.value.cloned(),
        }
    }
}

impl<D: Driver> fmt::Debug for WireValue<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WireValue").field("wire", &self.wire).finish_non_exhaustive()
    }
}

impl<D: Driver> WireValue<D> {
    /// Create a new wire value.
    pub fn new(wire: D::W, value: Witness<D, D::F>) -> Self {
        WireValue { wire, value }
    }

    /// Allocate a witnessed, unconstrained wire.
    pub fn alloc(dr: &mut D, value: Witness<D, D::F>) -> Result<Self> {
        let wire = dr.alloc(|| Ok(*value.snag()))?;
        Ok(WireValue { wire, value })
    }

    /// Allocate a wire fixed to a constant.
    pub fn constant(dr: &mut D, value: D::F) -> Result<Self> {
        let wire = dr.constant(value)?;
        Ok(WireValue {
            wire,
            value: D::just(|| value),
        })
    }

    /// Get a reference to the wire.
    pub fn wire(&self) -> &D::W {
        &self.wire
    }

    /// Get a reference to the value.
    pub fn value(&self) -> &Witness<D, D::F> {
        &self.value
    }
}
