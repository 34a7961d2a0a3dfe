//! Selection gadgets for conditional logic.

use ff::Field;

use crate::driver::{Driver, WireValue};
use crate::error::Result;
use crate::gadgets::arithmetic::{linear_combination, mul, sub};
use crate::gadgets::boolean::Boolean;

/// Conditional selection: if condition then a else b.
///
/// result = condition * (a - b) + b
pub fn select<D: Driver>(
    dr: &mut D,
    condition: &Boolean<D>,
    a: &WireValue<D>,
    b: &WireValue<D>,
) -> Result<WireValue<D>> {
    let diff = sub(dr, a, b)?;
    let scaled = mul(dr, condition.as_wire_value(), &diff)?;
    linear_combination(dr, &[(&scaled, D::F::ONE), (b, D::F::ONE)], D::F::ZERO)
}

/// Conditional selection between two booleans.
pub fn select_boolean<D: Driver>(
    dr: &mut D,
    condition: &Boolean<D>,
    a: &Boolean<D>,
    b: &Boolean<D>,
) -> Result<Boolean<D>> {
    let selected = select(dr, condition, a.as_wire_value(), b.as_wire_value())?;
    Ok(Boolean::new_unchecked(selected))
}

/// Assert that the condition is true (1).
pub fn assert_true<D: Driver>(dr: &mut D, condition: &Boolean<D>) -> Result<()> {
    dr.enforce_zero(|| [(condition.wire().clone(), D::F::ONE), (D::ONE, -D::F::ONE)])
}

/// Assert that the condition is false (0).
pub fn assert_false<D: Driver>(dr: &mut D, condition: &Boolean<D>) -> Result<()> {
    dr.enforce_zero(|| [(condition.wire().clone(), D::F::ONE)])
}

/// If condition, then enforce a == b.
///
/// condition * (a - b) = 0
pub fn conditional_enforce_equal<D: Driver>(
    dr: &mut D,
    condition: &Boolean<D>,
    a: &WireValue<D>,
    b: &WireValue<D>,
) -> Result<()> {
    let diff = sub(dr, a, b)?;
    let product = dr.mul(condition.wire(), &diff.wire)?;
    dr.enforce_zero(|| [(product, D::F::ONE)])
}
