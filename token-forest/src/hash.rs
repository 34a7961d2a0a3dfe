//! Domain-separated Poseidon hashing over the Pallas base field.
//!
//! Every commitment in this crate is `hash_with_prefix(prefix, inputs)`: a
//! rate-2 Poseidon sponge whose initial state absorbs a 20-byte domain
//! prefix. The in-circuit variant starts from the same post-prefix state as
//! a synthesis-time constant, so the two always agree.

use ff::{Field, PrimeField};
use halo2_gadgets::poseidon::primitives::P128Pow5T3;
use pasta_curves::Fp;
use ragu::gadgets::add;
use ragu::gadgets::poseidon::{permute, permute_native, RATE, WIDTH};
use ragu::{Driver, WireValue};

use crate::error::Result;

/// Prefix strings are padded with `*` to this many bytes.
pub const PREFIX_LEN: usize = 20;

/// A hash domain separator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Prefix(&'static str);

impl Prefix {
    /// Create a prefix. Panics at compile time for labels over 20 bytes.
    pub const fn new(label: &'static str) -> Self {
        assert!(label.len() <= PREFIX_LEN, "hash prefix longer than 20 bytes");
        Prefix(label)
    }

    /// The prefix label.
    pub const fn as_str(&self) -> &'static str {
        self.0
    }

    /// The prefix as a field element: the `*`-padded label read little-endian.
    pub fn to_field(&self) -> Fp {
        let mut bytes = [b'*'; PREFIX_LEN];
        bytes[..self.0.len()].copy_from_slice(self.0.as_bytes());

        let mut low = [0u8; 16];
        low.copy_from_slice(&bytes[..16]);
        let mut high = [0u8; 16];
        high[..PREFIX_LEN - 16].copy_from_slice(&bytes[16..]);

        let shift = Fp::from_u128(1u128 << 64).square();
        Fp::from_u128(u128::from_le_bytes(low)) + Fp::from_u128(u128::from_le_bytes(high)) * shift
    }
}

/// Domain separators used across the crate.
pub mod prefixes {
    use super::Prefix;

    /// Cons cell of a call forest.
    pub const ACCOUNT_UPDATE_CONS: Prefix = Prefix::new("MinaAcctUpdateCons");
    /// A call-tree node: account update plus its children.
    pub const ACCOUNT_UPDATE_NODE: Prefix = Prefix::new("MinaAcctUpdateNode");
    /// An account-update body.
    pub const ZKAPP_BODY: Prefix = Prefix::new("MinaZkappBody");
    /// Token id derivation.
    pub const DERIVE_TOKEN_ID: Prefix = Prefix::new("MinaDeriveTokenId");
    /// Cons cell of the iterator's parent-layer stack.
    pub const LAYER_CONS: Prefix = Prefix::new("TokenLayerCons");
    /// A parent layer.
    pub const LAYER_NODE: Prefix = Prefix::new("TokenLayerNode");
}

fn initial_state(prefix: Prefix) -> [Fp; WIDTH] {
    let mut state = [prefix.to_field(), Fp::ZERO, Fp::ZERO];
    permute_native::<Fp, P128Pow5T3>(&mut state);
    state
}

/// Hash `inputs` under the domain `prefix`.
pub fn hash_with_prefix(prefix: Prefix, inputs: &[Fp]) -> Fp {
    let mut state = initial_state(prefix);
    if inputs.is_empty() {
        permute_native::<Fp, P128Pow5T3>(&mut state);
    }
    for chunk in inputs.chunks(RATE) {
        for (word, input) in state.iter_mut().zip(chunk) {
            *word += input;
        }
        permute_native::<Fp, P128Pow5T3>(&mut state);
    }
    state[0]
}

/// In-circuit [`hash_with_prefix`].
pub fn hash_with_prefix_var<D: Driver<F = Fp>>(
    dr: &mut D,
    prefix: Prefix,
    inputs: &[WireValue<D>],
) -> Result<WireValue<D>> {
    let initial = initial_state(prefix);
    let mut state = [
        WireValue::constant(dr, initial[0])?,
        WireValue::constant(dr, initial[1])?,
        WireValue::constant(dr, initial[2])?,
    ];

    if inputs.is_empty() {
        state = permute::<D, P128Pow5T3>(dr, &state)?;
    }
    for chunk in inputs.chunks(RATE) {
        for (i, input) in chunk.iter().enumerate() {
            state[i] = add(dr, &state[i], input)?;
        }
        state = permute::<D, P128Pow5T3>(dr, &state)?;
    }

    let [out, _, _] = state;
    Ok(out)
}
