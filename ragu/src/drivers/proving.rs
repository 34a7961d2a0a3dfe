//! Proving driver for synthesizing circuits with witness data.
//!
//! The `ProvingDriver`:
//! - Allocates wires as positions in a witness vector
//! - Records multiplication gates and linear constraints
//! - Checks every constraint against the witness when it is added, so an
//!   unsatisfiable circuit fails at the call site that made it so
//!
//! Wire values are `Always<F>` since witnesses are always present.

use ff::Field;

use super::DriverStats;
use crate::driver::Driver;
use crate::error::{Error, Result};
use crate::maybe::AlwaysKind;

/// A wire in the proving driver.
///
/// Represents a position in the witness vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProvingWire {
    /// Index into the witness vector.
    pub index: usize,
}

impl ProvingWire {
    /// The constant ONE wire (always at index 0).
    pub const ONE: Self = ProvingWire { index: 0 };
}

/// A multiplication constraint: a * b = c
#[derive(Debug, Clone)]
pub struct MulConstraint {
    /// Left input wire.
    pub a: usize,
    /// Right input wire.
    pub b: usize,
    /// Output wire.
    pub c: usize,
}

/// A linear constraint: sum of (wire, coefficient) = 0
#[derive(Debug, Clone)]
pub struct LinearConstraint<F> {
    /// Terms in the linear combination.
    pub terms: Vec<(usize, F)>,
}

/// The proving driver collects constraints and witness data.
#[derive(Debug, Clone)]
pub struct ProvingDriver<F: Field> {
    witness: Vec<F>,
    mul_constraints: Vec<MulConstraint>,
    linear_constraints: Vec<LinearConstraint<F>>,
}

impl<F: Field> ProvingDriver<F> {
    /// Create a new proving driver.
    pub fn new() -> Self {
        ProvingDriver {
            // The ONE wire lives at index 0
            witness: vec![F::ONE],
            mul_constraints: Vec::new(),
            linear_constraints: Vec::new(),
        }
    }

    fn alloc_wire(&mut self, value: F) -> ProvingWire {
        let index = self.witness.len();
        self.witness.push(value);
        ProvingWire { index }
    }

    fn evaluate(&self, terms: &[(usize, F)]) -> F {
        terms
            .iter()
            .fold(F::ZERO, |acc, &(index, coeff)| acc + self.witness[index] * coeff)
    }

    /// Get the witness value at the given wire.
    pub fn get_witness(&self, wire: ProvingWire) -> F {
        self.witness[wire.index]
    }

    /// Re-check every recorded constraint against the witness.
    pub fn check_constraints(&self) -> Result<()> {
        for mul in &self.mul_constraints {
            if self.witness[mul.a] * self.witness[mul.b] != self.witness[mul.c] {
                return Err(Error::UnsatisfiedConstraint {
                    message: "multiplication constraint failed",
                });
            }
        }

        for linear in &self.linear_constraints {
            if self.evaluate(&linear.terms) != F::ZERO {
                return Err(Error::UnsatisfiedConstraint {
                    message: "linear constraint failed",
                });
            }
        }

        Ok(())
    }

    /// Get statistics about the constraint system.
    pub fn stats(&self) -> DriverStats {
        DriverStats {
            num_wires: self.witness.len(),
            num_mul_constraints: self.mul_constraints.len(),
            num_linear_constraints: self.linear_constraints.len(),
        }
    }
}

impl<F: Field> Default for ProvingDriver<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Field> Driver for ProvingDriver<F> {
    type F = F;
    type W = ProvingWire;
    type MaybeKind = AlwaysKind;

    const ONE: Self::W = ProvingWire::ONE;

    fn alloc(&mut self, value: impl FnOnce() -> Result<Self::F>) -> Result<Self::W> {
        let value = value()?;
        Ok(self.alloc_wire(value))
    }

    fn mul(&mut self, a: &Self::W, b: &Self::W) -> Result<Self::W> {
        let product = self.witness[a.index] * self.witness[b.index];
        let c = self.alloc_wire(product);
        self.mul_constraints.push(MulConstraint {
            a: a.index,
            b: b.index,
            c: c.index,
        });
        Ok(c)
    }

    fn add<L: IntoIterator<Item = (Self::W, Self::F)>>(
        &mut self,
        lc: impl FnOnce() -> L,
    ) -> Result<Self::W> {
        let mut terms: Vec<_> = lc()
            .into_iter()
            .map(|(wire, coeff)| (wire.index, coeff))
            .collect();
        let sum = self.evaluate(&terms);
        let result = self.alloc_wire(sum);

        // lc - result = 0
        terms.push((result.index, -F::ONE));
        self.linear_constraints.push(LinearConstraint { terms });

        Ok(result)
    }

    fn enforce_zero<L: IntoIterator<Item = (Self::W, Self::F)>>(
        &mut self,
        lc: impl FnOnce() -> L,
    ) -> Result<()> {
        let terms: Vec<_> = lc()
            .into_iter()
            .map(|(wire, coeff)| (wire.index, coeff))
            .collect();

        if self.evaluate(&terms) != F::ZERO {
            return Err(Error::UnsatisfiedConstraint {
                message: "linear constraint failed",
            });
        }

        self.linear_constraints.push(LinearConstraint { terms });
        Ok(())
    }
}
