//! Call trees and call forests.
//!
//! A call tree is a hashed account update plus the forest of its children.
//! Its node hash commits to the whole subtree:
//!
//! ```text
//! node(tree)   = Hash(MinaAcctUpdateNode, [hash(update), hash(calls)])
//! hash(forest) = hash-consed list of nodes under MinaAcctUpdateCons
//! ```

use pasta_curves::Fp;
use ragu::gadgets::Boolean;
use ragu::{Driver, Maybe, WireValue, Witness};

use crate::account_update::{dummy_hash, AccountUpdate, AccountUpdateVar};
use crate::commitment_list::{Commit, CommitVar, CommitmentList, CommitmentListVar};
use crate::error::Result;
use crate::hash::{hash_with_prefix, hash_with_prefix_var, prefixes, Prefix};
use crate::hashed::{Hashed, HashedVar};

/// An account update and its children.
#[derive(Debug, Clone, PartialEq)]
pub struct CallTree {
    /// The record body. Its `children` are always empty, the subtree lives in `calls`.
    pub account_update: Hashed<AccountUpdate>,
    pub calls: CallForest,
}

/// An ordered forest of call trees.
pub type CallForest = CommitmentList<CallTree>;

/// The filler tree: the dummy record without children.
impl Default for CallTree {
    fn default() -> Self {
        Self {
            account_update: Hashed::from_parts(dummy_hash(), AccountUpdate::default()),
            calls: CallForest::empty(),
        }
    }
}

impl Commit for CallTree {
    const CONS_PREFIX: Prefix = prefixes::ACCOUNT_UPDATE_CONS;

    fn commitment(&self) -> Fp {
        hash_with_prefix(
            prefixes::ACCOUNT_UPDATE_NODE,
            &[self.account_update.commitment(), self.calls.hash()],
        )
    }
}

impl CallTree {
    /// Hash `update` and, recursively, its children.
    pub fn from_account_update(update: &AccountUpdate) -> Self {
        Self {
            account_update: Hashed::hash(update.without_children()),
            calls: CallForest::from_account_updates(&update.children),
        }
    }

    /// The record with its children reattached.
    pub fn to_account_update(&self) -> AccountUpdate {
        self.account_update
            .unhash()
            .clone()
            .with_children(self.calls.to_account_updates())
    }
}

impl CommitmentList<CallTree> {
    /// Build a forest whose roots are `updates`, in order.
    pub fn from_account_updates(updates: &[AccountUpdate]) -> Self {
        updates.iter().map(CallTree::from_account_update).collect()
    }

    /// Rebuild the record trees.
    pub fn to_account_updates(&self) -> Vec<AccountUpdate> {
        self.iter().map(CallTree::to_account_update).collect()
    }
}

/// In-circuit [`CallTree`].
pub struct CallTreeVar<D: Driver<F = Fp>> {
    pub account_update: HashedVar<D, AccountUpdateVar<D>>,
    pub calls: CallForestVar<D>,
}

/// In-circuit [`CallForest`].
pub type CallForestVar<D> = CommitmentListVar<D, CallTreeVar<D>>;

impl<D: Driver<F = Fp>> Clone for CallTreeVar<D> {
    fn clone(&self) -> Self {
        Self {
            account_update: self.account_update.clone(),
            calls: self.calls.clone(),
        }
    }
}

impl<D: Driver<F = Fp>> CommitVar<D> for CallTreeVar<D> {
    type Native = CallTree;

    fn witness(dr: &mut D, value: Witness<D, CallTree>) -> Result<Self> {
        let account_update =
            HashedVar::witness(dr, D::just(|| value.snag().account_update.clone()))?;
        let calls = CallForestVar::witness(dr, D::just(|| value.snag().calls.clone()))?;
        Ok(Self {
            account_update,
            calls,
        })
    }

    fn constant(dr: &mut D, value: &CallTree) -> Result<Self> {
        Ok(Self {
            account_update: HashedVar::constant(dr, &value.account_update)?,
            calls: CallForestVar::constant(dr, &value.calls)?,
        })
    }

    fn commitment(&self, dr: &mut D) -> Result<WireValue<D>> {
        hash_with_prefix_var(
            dr,
            prefixes::ACCOUNT_UPDATE_NODE,
            &[
                self.account_update.commitment().clone(),
                self.calls.hash().clone(),
            ],
        )
    }

    fn select(dr: &mut D, condition: &Boolean<D>, a: &Self, b: &Self) -> Result<Self> {
        Ok(Self {
            account_update: HashedVar::select(dr, condition, &a.account_update, &b.account_update)?,
            calls: CallForestVar::select(dr, condition, &a.calls, &b.calls)?,
        })
    }

    fn native(&self) -> Witness<D, CallTree> {
        D::just(|| CallTree {
            account_update: self.account_update.native().take(),
            calls: self.calls.native().take(),
        })
    }
}
