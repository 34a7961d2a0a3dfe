//! # ragu - Driver-based Circuit Synthesis
//!
//! `ragu` describes arithmetic circuits once and synthesizes them under
//! different drivers:
//!
//! - **Zero-cost witness abstractions**: The `Maybe<T>` type is `Always<T>`
//!   when a driver carries witness data and the zero-sized `Empty<T>` when it
//!   does not. Witness closures are never invoked for `Empty`.
//!
//! - **Flexible driver architecture**: [`drivers::ProvingDriver`] records the
//!   witness and checks every constraint as it is added, while
//!   [`drivers::CountingDriver`] only measures circuit shape.
//!
//! - **Gadgets**: booleans, conditional selection, equality tests and a
//!   Poseidon permutation parameterized by a `halo2_gadgets` `Spec`.
//!
//! ## Example
//!
//! ```rust,ignore
//! use ragu::drivers::ProvingDriver;
//! use ragu::gadgets::{is_equal, select, Boolean};
//! use ragu::{Driver, WireValue};
//!
//! fn pick<D: Driver>(dr: &mut D, a: &WireValue<D>, b: &WireValue<D>) -> ragu::Result<WireValue<D>> {
//!     let same = is_equal(dr, a, b)?;
//!     select(dr, &same, a, b)
//! }
//! ```

pub mod driver;
pub mod drivers;
pub mod error;
pub mod gadgets;
pub mod maybe;

// Re-exports for convenience
pub use driver::{Driver, Witness, WireValue};
pub use error::{Error, Result};
pub use maybe::{Always, AlwaysKind, Empty, EmptyKind, Maybe, MaybeKind};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::driver::{Driver, Witness, WireValue};
    pub use crate::error::{Error, Result};
    pub use crate::gadgets::Boolean;
    pub use crate::maybe::{Always, Empty, Maybe, MaybeKind};
}
