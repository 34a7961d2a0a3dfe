//! The Poseidon permutation, natively and as a circuit gadget.
//!
//! Round constants and the MDS matrix come from a `halo2_gadgets` [`Spec`]
//! of width 3 and rate 2. The in-circuit S-box is `x^5`, which covers the
//! `P128Pow5T3` parameter set.

use ff::Field;
use halo2_gadgets::poseidon::primitives::Spec;

use crate::driver::{Driver, WireValue};
use crate::error::Result;
use crate::gadgets::arithmetic::{linear_combination, mul};

/// Permutation width.
pub const WIDTH: usize = 3;

/// Sponge rate.
pub const RATE: usize = 2;

fn is_full_round<F: Field, S: Spec<F, WIDTH, RATE>>(round: usize) -> bool {
    let half = S::full_rounds() / 2;
    round < half || round >= half + S::partial_rounds()
}

/// Apply the permutation to a native state in place.
pub fn permute_native<F: Field, S: Spec<F, WIDTH, RATE>>(state: &mut [F; WIDTH]) {
    let (round_constants, mds, _) = S::constants();

    for (round, rc) in round_constants.iter().enumerate() {
        if is_full_round::<F, S>(round) {
            for (word, c) in state.iter_mut().zip(rc.iter()) {
                *word = S::sbox(*word + c);
            }
        } else {
            for (word, c) in state.iter_mut().zip(rc.iter()) {
                *word += c;
            }
            state[0] = S::sbox(state[0]);
        }

        let mixed: [F; WIDTH] = core::array::from_fn(|i| {
            (0..WIDTH).fold(F::ZERO, |acc, j| acc + mds[i][j] * state[j])
        });
        *state = mixed;
    }
}

fn pow5<D: Driver>(dr: &mut D, x: &WireValue<D>) -> Result<WireValue<D>> {
    let x2 = mul(dr, x, x)?;
    let x4 = mul(dr, &x2, &x2)?;
    mul(dr, &x4, x)
}

fn round_word<D: Driver>(
    dr: &mut D,
    word: &WireValue<D>,
    constant: D::F,
    sbox: bool,
) -> Result<WireValue<D>> {
    let shifted = linear_combination(dr, &[(word, D::F::ONE)], constant)?;
    if sbox {
        pow5(dr, &shifted)
    } else {
        Ok(shifted)
    }
}

/// Apply the permutation to a state of wires.
///
/// Costs three multiplications per S-box: 240 gates for `P128Pow5T3`.
pub fn permute<D: Driver, S: Spec<D::F, WIDTH, RATE>>(
    dr: &mut D,
    state: &[WireValue<D>; WIDTH],
) -> Result<[WireValue<D>; WIDTH]> {
    let (round_constants, mds, _) = S::constants();
    let mut state = state.clone();

    for (round, rc) in round_constants.iter().enumerate() {
        let full = is_full_round::<D::F, S>(round);
        let words = [
            round_word(dr, &state[0], rc[0], true)?,
            round_word(dr, &state[1], rc[1], full)?,
            round_word(dr, &state[2], rc[2], full)?,
        ];

        let row = |dr: &mut D, i: usize| {
            linear_combination(
                dr,
                &[
                    (&words[0], mds[i][0]),
                    (&words[1], mds[i][1]),
                    (&words[2], mds[i][2]),
                ],
                D::F::ZERO,
            )
        };
        state = [row(dr, 0)?, row(dr, 1)?, row(dr, 2)?];
    }

    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::{CountingDriver, ProvingDriver};
    use crate::maybe::Maybe;
    use ff::PrimeField;
    use halo2_gadgets::poseidon::primitives::{ConstantLength, Hash, P128Pow5T3};
    use pasta_curves::Fp;

    #[test]
    fn native_matches_reference_sponge() {
        // A ConstantLength<2> sponge is a single permutation of
        // [a, b, 2 << 64] read at position 0.
        let (a, b) = (Fp::from(7u64), Fp::from(11u64));
        let mut state = [a, b, Fp::from_u128(2u128 << 64)];
        permute_native::<Fp, P128Pow5T3>(&mut state);

        let expected = Hash::<_, P128Pow5T3, ConstantLength<2>, 3, 2>::init().hash([a, b]);
        assert_eq!(state[0], expected);
    }

    #[test]
    fn circuit_matches_native() {
        let input = [Fp::from(1u64), Fp::from(2u64), Fp::from(3u64)];
        let mut expected = input;
        permute_native::<Fp, P128Pow5T3>(&mut expected);

        let mut dr = ProvingDriver::<Fp>::new();
        let state = [
            WireValue::alloc(&mut dr, ProvingDriver::<Fp>::just(|| input[0])).unwrap(),
            WireValue::alloc(&mut dr, ProvingDriver::<Fp>::just(|| input[1])).unwrap(),
            WireValue::alloc(&mut dr, ProvingDriver::<Fp>::just(|| input[2])).unwrap(),
        ];
        let out = permute::<_, P128Pow5T3>(&mut dr, &state).unwrap();

        for (wire, want) in out.iter().zip(expected.iter()) {
            assert_eq!(*wire.value.snag(), *want);
            assert_eq!(dr.get_witness(wire.wire), *want);
        }
        dr.check_constraints().unwrap();
    }

    #[test]
    fn gate_count_is_fixed() {
        let mut dr = CountingDriver::<Fp>::new();
        let zero = WireValue::constant(&mut dr, Fp::ZERO).unwrap();
        let state = [zero.clone(), zero.clone(), zero];
        permute::<_, P128Pow5T3>(&mut dr, &state).unwrap();
        assert_eq!(dr.stats().num_mul_constraints, (8 * 3 + 56) * 3);
    }
}
