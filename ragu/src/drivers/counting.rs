//! Counting driver for measuring circuit size without allocation.
//!
//! The `CountingDriver` never sees a witness: every `Maybe` is `Empty` and no
//! value closure runs. It is used to pre-compute circuit sizes and to check
//! that a circuit's shape is independent of its inputs.

use core::marker::PhantomData;

use ff::Field;

use super::DriverStats;
use crate::driver::Driver;
use crate::error::Result;
use crate::maybe::EmptyKind;

/// A wire in the counting driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CountingWire;

/// The counting driver tracks circuit statistics without allocating.
#[derive(Debug, Clone)]
pub struct CountingDriver<F> {
    stats: DriverStats,
    _marker: PhantomData<F>,
}

impl<F: Field> CountingDriver<F> {
    /// Create a new counting driver.
    pub const fn new() -> Self {
        CountingDriver {
            stats: DriverStats {
                num_wires: 1, // ONE wire
                num_mul_constraints: 0,
                num_linear_constraints: 0,
            },
            _marker: PhantomData,
        }
    }

    /// Get circuit statistics.
    pub const fn stats(&self) -> DriverStats {
        self.stats
    }
}

impl<F: Field> Default for CountingDriver<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Field> Driver for CountingDriver<F> {
    type F = F;
    type W = CountingWire;
    type MaybeKind = EmptyKind;

    const ONE: Self::W = CountingWire;

    fn alloc(&mut self, _value: impl FnOnce() -> Result<Self::F>) -> Result<Self::W> {
        self.stats.num_wires += 1;
        Ok(CountingWire)
    }

    fn mul(&mut self, _a: &Self::W, _b: &Self::W) -> Result<Self::W> {
        self.stats.num_wires += 1;
        self.stats.num_mul_constraints += 1;
        Ok(CountingWire)
    }

    fn add<L: IntoIterator<Item = (Self::W, Self::F)>>(
        &mut self,
        _lc: impl FnOnce() -> L,
    ) -> Result<Self::W> {
        self.stats.num_wires += 1;
        self.stats.num_linear_constraints += 1;
        Ok(CountingWire)
    }

    fn enforce_zero<L: IntoIterator<Item = (Self::W, Self::F)>>(
        &mut self,
        _lc: impl FnOnce() -> L,
    ) -> Result<()> {
        self.stats.num_linear_constraints += 1;
        Ok(())
    }
}
