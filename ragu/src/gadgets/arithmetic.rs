//! Arithmetic gadgets.

use ff::Field;

use crate::driver::{Driver, WireValue};
use crate::error::Result;
use crate::gadgets::boolean::Boolean;
use crate::maybe::Maybe;

/// Multiply two wire values.
pub fn mul<D: Driver>(dr: &mut D, a: &WireValue<D>, b: &WireValue<D>) -> Result<WireValue<D>> {
    let wire = dr.mul(&a.wire, &b.wire)?;
    let value = D::just(|| *a.value.snag() * *b.value.snag());
    Ok(WireValue::new(wire, value))
}

/// Add two wire values.
pub fn add<D: Driver>(dr: &mut D, a: &WireValue<D>, b: &WireValue<D>) -> Result<WireValue<D>> {
    linear_combination(dr, &[(a, D::F::ONE), (b, D::F::ONE)], D::F::ZERO)
}

/// Subtract two wire values (a - b).
pub fn sub<D: Driver>(dr: &mut D, a: &WireValue<D>, b: &WireValue<D>) -> Result<WireValue<D>> {
    linear_combination(dr, &[(a, D::F::ONE), (b, -D::F::ONE)], D::F::ZERO)
}

/// Compute `constant + sum(coefficient * wire)` as a single new wire.
pub fn linear_combination<D: Driver>(
    dr: &mut D,
    terms: &[(&WireValue<D>, D::F)],
    constant: D::F,
) -> Result<WireValue<D>> {
    let wire = dr.add(move || {
        terms
            .iter()
            .map(|(term, coeff)| (term.wire.clone(), *coeff))
            .chain(core::iter::once((D::ONE, constant)))
    })?;
    let value = D::just(|| {
        terms
            .iter()
            .fold(constant, |acc, (term, coeff)| acc + *term.value.snag() * coeff)
    });
    Ok(WireValue::new(wire, value))
}

/// Enforce `a == b`.
pub fn enforce_equal<D: Driver>(dr: &mut D, a: &WireValue<D>, b: &WireValue<D>) -> Result<()> {
    dr.enforce_equal(&a.wire, &b.wire)
}

/// Returns a boolean that is 1 iff `a` is zero.
///
/// Witnesses `inv = a^-1` (or 0) and constrains
/// `out = 1 - a * inv` together with `a * out = 0`.
pub fn is_zero<D: Driver>(dr: &mut D, a: &WireValue<D>) -> Result<Boolean<D>> {
    let inv = WireValue::alloc(dr, D::just(|| a.value.snag().invert().unwrap_or(D::F::ZERO)))?;
    let product = mul(dr, a, &inv)?;
    let out = linear_combination(dr, &[(&product, -D::F::ONE)], D::F::ONE)?;
    let should_be_zero = dr.mul(&a.wire, &out.wire)?;
    dr.enforce_zero(|| [(should_be_zero, D::F::ONE)])?;
    Ok(Boolean::new_unchecked(out))
}

/// Returns a boolean that is 1 iff `a == b`.
pub fn is_equal<D: Driver>(dr: &mut D, a: &WireValue<D>, b: &WireValue<D>) -> Result<Boolean<D>> {
    let diff = sub(dr, a, b)?;
    is_zero(dr, &diff)
}
