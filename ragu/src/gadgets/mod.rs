//! Common circuit gadgets.
//!
//! - Arithmetic operations (add, sub, mul, linear combinations)
//! - Zero and equality tests
//! - Boolean operations (and, or, not, xor)
//! - Conditional selection and assertions
//! - The Poseidon permutation

pub mod arithmetic;
pub mod boolean;
pub mod poseidon;
pub mod select;

pub use arithmetic::*;
pub use boolean::*;
pub use select::*;
