//! # token-forest - Provable Account-Update Forests
//!
//! Lets a custom-token contract enumerate and approve exactly the account
//! updates that affect its token, inside an arithmetic circuit built with
//! [`ragu`]. Every step is a fixed sequence of constraints:
//!
//! - **Commitment lists**: hash-consed sequences with a shadow copy of
//!   their contents, supporting push, pop and cursor iteration.
//! - **Call forests**: trees of hashed account updates whose root hash
//!   commits to the whole structure.
//! - **Forest iterator**: a bounded stack machine performing a pre-order
//!   walk that prunes subtrees by permission, never by inspection.
//! - **Token contracts**: `for_each_update`, `check_zero_balance_change`,
//!   `approve_account_update(s)` and `transfer` on top of one required
//!   `approve_base` hook.
//!
//! ## Example
//!
//! ```rust,ignore
//! use ragu::drivers::ProvingDriver;
//! use token_forest::{ForestConfig, PublicKey, TokenContract, ZeroSumToken};
//!
//! let mut dr = ProvingDriver::new();
//! let mut token = ZeroSumToken::new(address, ForestConfig::default());
//! token.transfer(&mut dr, &alice, &bob, 50)?;
//! dr.check_constraints()?;
//! ```

pub mod account_update;
pub mod call_forest;
pub mod commitment_list;
pub mod config;
pub mod error;
pub mod hash;
pub mod hashed;
pub mod iterator;
pub mod token_contract;
pub mod under_construction;

pub use account_update::{
    AccountUpdate, AccountUpdateId, AccountUpdateVar, BalanceChange, MayUseToken, PublicKey,
    TokenId,
};
pub use call_forest::{CallForest, CallForestVar, CallTree, CallTreeVar};
pub use commitment_list::{CommitmentList, CommitmentListVar, ListCursor, ListCursorVar, EMPTY_HASH};
pub use config::{ForestConfig, MAX_ACCOUNT_UPDATES};
pub use error::{Result, TokenForestError};
pub use hashed::{Hashable, Hashed, HashedVar};
pub use iterator::{IteratorStep, Layer, TokenForestIterator};
pub use token_contract::{TokenContract, ZeroSumToken};
pub use under_construction::ForestUnderConstruction;
