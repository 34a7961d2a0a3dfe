//! Boolean gadgets.

use ff::Field;

use crate::driver::{Driver, Witness, WireValue};
use crate::error::Result;
use crate::gadgets::arithmetic::{linear_combination, mul};
use crate::maybe::Maybe;

/// A wire value constrained to be 0 or 1.
pub struct Boolean<D: Driver> {
    wire: WireValue<D>,
}

impl<D: Driver> Clone for Boolean<D> {
    fn clone(&self) -> Self {
        Boolean {
            wire: self.wire.clone(),
        }
    }
}

impl<D: Driver> core::fmt::Debug for Boolean<D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("Boolean").field(&self.wire.wire).finish()
    }
}

impl<D: Driver> Boolean<D> {
    /// Wrap a wire that is already known to be boolean.
    pub fn new_unchecked(wire: WireValue<D>) -> Self {
        Boolean { wire }
    }

    /// Allocate a new boolean with the constraint `w * (1 - w) = 0`.
    pub fn alloc(dr: &mut D, value: Witness<D, bool>) -> Result<Self> {
        let field_value = D::just(|| if *value.snag() { D::F::ONE } else { D::F::ZERO });
        let wire = WireValue::alloc(dr, field_value)?;

        let one_minus = linear_combination(dr, &[(&wire, -D::F::ONE)], D::F::ONE)?;
        let should_be_zero = dr.mul(&wire.wire, &one_minus.wire)?;
        dr.enforce_zero(|| [(should_be_zero, D::F::ONE)])?;

        Ok(Boolean { wire })
    }

    /// A boolean fixed to `value`.
    pub fn constant(dr: &mut D, value: bool) -> Result<Self> {
        let field = if value { D::F::ONE } else { D::F::ZERO };
        Ok(Boolean {
            wire: WireValue::constant(dr, field)?,
        })
    }

    /// The underlying wire value.
    pub fn as_wire_value(&self) -> &WireValue<D> {
        &self.wire
    }

    /// Get the underlying wire.
    pub fn wire(&self) -> &D::W {
        &self.wire.wire
    }

    /// Get the value as a field element.
    pub fn value(&self) -> &Witness<D, D::F> {
        &self.wire.value
    }

    /// Get the value as a boolean.
    pub fn get(&self) -> Witness<D, bool> {
        D::just(|| *self.wire.value.snag() == D::F::ONE)
    }
}

/// Boolean NOT: 1 - a
pub fn not<D: Driver>(dr: &mut D, a: &Boolean<D>) -> Result<Boolean<D>> {
    let out = linear_combination(dr, &[(&a.wire, -D::F::ONE)], D::F::ONE)?;
    Ok(Boolean::new_unchecked(out))
}

/// Boolean AND: a * b
pub fn and<D: Driver>(dr: &mut D, a: &Boolean<D>, b: &Boolean<D>) -> Result<Boolean<D>> {
    Ok(Boolean::new_unchecked(mul(dr, &a.wire, &b.wire)?))
}

/// Boolean OR: a + b - a * b
pub fn or<D: Driver>(dr: &mut D, a: &Boolean<D>, b: &Boolean<D>) -> Result<Boolean<D>> {
    let ab = mul(dr, &a.wire, &b.wire)?;
    let out = linear_combination(
        dr,
        &[(&a.wire, D::F::ONE), (&b.wire, D::F::ONE), (&ab, -D::F::ONE)],
        D::F::ZERO,
    )?;
    Ok(Boolean::new_unchecked(out))
}

/// Boolean XOR: a + b - 2 * a * b
pub fn xor<D: Driver>(dr: &mut D, a: &Boolean<D>, b: &Boolean<D>) -> Result<Boolean<D>> {
    let ab = mul(dr, &a.wire, &b.wire)?;
    let out = linear_combination(
        dr,
        &[(&a.wire, D::F::ONE), (&b.wire, D::F::ONE), (&ab, -D::F::ONE.double())],
        D::F::ZERO,
    )?;
    Ok(Boolean::new_unchecked(out))
}

/// Boolean equality: 1 - (a XOR b)
pub fn equals<D: Driver>(dr: &mut D, a: &Boolean<D>, b: &Boolean<D>) -> Result<Boolean<D>> {
    let different = xor(dr, a, b)?;
    not(dr, &different)
}
