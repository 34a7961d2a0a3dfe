//! Concrete driver implementations.
//!
//! - [`proving`]: records witness data and checks constraints eagerly
//! - [`counting`]: measures circuit shape without any witness

pub mod counting;
pub mod proving;

pub use counting::{CountingDriver, CountingWire};
pub use proving::{ProvingDriver, ProvingWire};

/// Statistics about a synthesized constraint system.
///
/// Both drivers report the same numbers for the same circuit, which is how
/// callers check that synthesis does not depend on witness data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverStats {
    /// Number of wires allocated, including the ONE wire.
    pub num_wires: usize,
    /// Number of multiplication gates.
    pub num_mul_constraints: usize,
    /// Number of linear constraints.
    pub num_linear_constraints: usize,
}

impl DriverStats {
    /// Total number of constraints.
    pub const fn total_constraints(&self) -> usize {
        self.num_mul_constraints + self.num_linear_constraints
    }
}
