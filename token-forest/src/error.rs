//! Error types for forest construction and token approval.

use thiserror::Error;

/// Error type for provable forests and the token approval combinators.
#[derive(Error, Debug)]
pub enum TokenForestError {
    /// The iterator did not consume the whole forest within its step bound.
    #[error(
        "number of account updates to approve exceeds the supported limit of {max_account_updates}"
    )]
    IncompleteForest {
        /// Number of iteration steps that were performed.
        max_account_updates: usize,
    },

    /// Token balance changes of the approved updates do not sum to zero.
    #[error("balance changes of approved account updates do not sum to zero")]
    NonZeroBalanceChange,

    /// Popped from an exhausted commitment list.
    #[error("pop from an empty commitment list")]
    EmptyListPop,

    /// Tried to modify a forest whose commitment is already fixed.
    #[error("forest under construction is sealed to a fixed commitment")]
    ForestSealed,

    /// Invalid configuration value.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Constraint-system failure.
    #[error("synthesis error: {0}")]
    Synthesis(#[from] ragu::Error),
}

impl From<serde_json::Error> for TokenForestError {
    fn from(err: serde_json::Error) -> Self {
        TokenForestError::InvalidConfig(err.to_string())
    }
}

/// Result type for this crate.
pub type Result<T> = std::result::Result<T, TokenForestError>;

/// Replace an unsatisfied-constraint failure by a domain error, keeping every
/// other synthesis error as is.
pub(crate) fn unsatisfied_as<T>(
    result: ragu::Result<T>,
    error: impl FnOnce() -> TokenForestError,
) -> Result<T> {
    result.map_err(|err| {
        if err.is_unsatisfied() {
            error()
        } else {
            err.into()
        }
    })
}
