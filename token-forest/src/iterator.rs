//! Bounded pre-order traversal of a call forest.
//!
//! The iterator is a stack machine. Its state is the layer currently being
//! walked plus a hash-consed stack of parent layers whose siblings are still
//! pending. Each [`TokenForestIterator::next`] step visits exactly one node
//! (or the filler once the forest is exhausted) and costs the same number of
//! constraints no matter which branch the data takes: descending into the
//! children, resuming the current layer, and stepping up to a parent are all
//! computed and then selected.
//!
//! A node's subtree is skipped, without being walked, when its permission tag
//! differs from the one its layer grants or when the node is the token owner
//! itself.

use pasta_curves::Fp;
use ragu::gadgets::{and, assert_true, is_equal, not, or, Boolean};
use ragu::{Driver, Maybe, WireValue, Witness};
use tracing::{debug, trace};

use crate::account_update::{AccountUpdateVar, MayUseToken, MayUseTokenVar};
use crate::call_forest::{CallForestVar, CallTree, CallTreeVar};
use crate::commitment_list::{Commit, CommitVar, CommitmentListVar, ListCursor, ListCursorVar};
use crate::error::{unsatisfied_as, Result, TokenForestError};
use crate::hash::{hash_with_prefix, hash_with_prefix_var, prefixes, Prefix};

fn flag(value: bool) -> Fp {
    Fp::from(u64::from(value))
}

/// The part of a forest still to visit at one depth, with the permission
/// every node in it is granted.
#[derive(Debug, Clone, Default)]
pub struct Layer {
    pub forest: ListCursor<CallTree>,
    pub may_use_token: MayUseToken,
}

impl Commit for Layer {
    const CONS_PREFIX: Prefix = prefixes::LAYER_CONS;

    fn commitment(&self) -> Fp {
        let (parents_own_token, inherit_from_parent) = self.may_use_token.flags();
        hash_with_prefix(
            prefixes::LAYER_NODE,
            &[
                self.forest.list_hash(),
                self.forest.current_hash(),
                flag(parents_own_token),
                flag(inherit_from_parent),
            ],
        )
    }
}

/// In-circuit [`Layer`].
pub struct LayerVar<D: Driver<F = Fp>> {
    pub forest: ListCursorVar<D, CallTreeVar<D>>,
    pub may_use_token: MayUseTokenVar<D>,
}

impl<D: Driver<F = Fp>> Clone for LayerVar<D> {
    fn clone(&self) -> Self {
        Self {
            forest: self.forest.clone(),
            may_use_token: self.may_use_token.clone(),
        }
    }
}

impl<D: Driver<F = Fp>> CommitVar<D> for LayerVar<D> {
    type Native = Layer;

    fn witness(dr: &mut D, value: Witness<D, Layer>) -> Result<Self> {
        Ok(Self {
            forest: ListCursorVar::witness(dr, D::just(|| value.snag().forest.clone()))?,
            may_use_token: MayUseTokenVar::witness(dr, D::just(|| value.snag().may_use_token))?,
        })
    }

    fn constant(dr: &mut D, value: &Layer) -> Result<Self> {
        Ok(Self {
            forest: ListCursorVar::constant(dr, &value.forest)?,
            may_use_token: MayUseTokenVar::constant(dr, value.may_use_token)?,
        })
    }

    fn commitment(&self, dr: &mut D) -> Result<WireValue<D>> {
        hash_with_prefix_var(
            dr,
            prefixes::LAYER_NODE,
            &[
                self.forest.list_hash().clone(),
                self.forest.current_hash().clone(),
                self.may_use_token.parents_own_token.as_wire_value().clone(),
                self.may_use_token.inherit_from_parent.as_wire_value().clone(),
            ],
        )
    }

    fn select(dr: &mut D, condition: &Boolean<D>, a: &Self, b: &Self) -> Result<Self> {
        Ok(Self {
            forest: ListCursorVar::select(dr, condition, &a.forest, &b.forest)?,
            may_use_token: MayUseTokenVar::select(
                dr,
                condition,
                &a.may_use_token,
                &b.may_use_token,
            )?,
        })
    }

    fn native(&self) -> Witness<D, Layer> {
        D::just(|| Layer {
            forest: self.forest.native().take(),
            may_use_token: self.may_use_token.native().take(),
        })
    }
}

/// One visited node.
pub struct IteratorStep<D: Driver<F = Fp>> {
    /// The revealed record, or the dummy record once the forest is exhausted.
    pub account_update: AccountUpdateVar<D>,
    /// Whether the record's token id is the iterator's token.
    pub uses_this_token: Boolean<D>,
}

/// Walks a call forest for the token `self_token`.
pub struct TokenForestIterator<D: Driver<F = Fp>> {
    current_layer: LayerVar<D>,
    unfinished_parent_layers: CommitmentListVar<D, LayerVar<D>>,
    self_token: WireValue<D>,
    steps: usize,
}

impl<D: Driver<F = Fp>> TokenForestIterator<D> {
    /// Start at the first root of `forest`. Roots are granted the
    /// permission to use their parent's own token.
    pub fn create(dr: &mut D, forest: &CallForestVar<D>, self_token: WireValue<D>) -> Result<Self> {
        let current_layer = LayerVar {
            forest: forest.start_iterating(),
            may_use_token: MayUseTokenVar::constant(dr, MayUseToken::ParentsOwnToken)?,
        };
        let unfinished_parent_layers = CommitmentListVar::empty(dr)?;
        debug!(
            forest = ?D::just(|| *forest.hash().value.snag()).into_option(),
            "starting token forest iteration"
        );

        Ok(Self {
            current_layer,
            unfinished_parent_layers,
            self_token,
            steps: 0,
        })
    }

    /// Number of steps taken so far.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// The layer being walked.
    pub fn current_layer(&self) -> &LayerVar<D> {
        &self.current_layer
    }

    /// Visit the next node.
    pub fn next(&mut self, dr: &mut D) -> Result<IteratorStep<D>> {
        let node = self.current_layer.forest.next(dr)?;
        let mut child_forest = node.calls.start_iterating();
        let child_layer_tag = MayUseTokenVar::constant(dr, MayUseToken::InheritFromParent)?;

        let update = node.account_update.unhash_checked(dr)?;

        let can_access_token = update
            .may_use_token
            .equals(dr, &self.current_layer.may_use_token)?;
        let derived = update.derive_token_id(dr)?;
        let is_self = is_equal(dr, &derived, &self.self_token)?;
        let uses_this_token = is_equal(dr, &update.token_id, &self.self_token)?;

        let cannot_access = not(dr, &can_access_token)?;
        let skip_subtree = or(dr, &cannot_access, &is_self)?;
        child_forest.jump_to_end_if(dr, &skip_subtree)?;

        let current_is_finished = self.current_layer.forest.is_at_end(dr)?;
        let child_is_finished = child_forest.is_at_end(dr)?;
        let current_has_more = not(dr, &current_is_finished)?;
        let child_has_more = not(dr, &child_is_finished)?;

        // Descending while siblings remain: remember the current layer.
        let push = and(dr, &current_has_more, &child_has_more)?;
        // Nothing below and nothing beside: resume the nearest parent.
        let pop = and(dr, &current_is_finished, &child_is_finished)?;

        let stack = self
            .unfinished_parent_layers
            .push_if(dr, &push, &self.current_layer)?;
        let (parent_layer, stack) = stack.pop_if(dr, &pop)?;

        let child_layer = LayerVar {
            forest: child_forest,
            may_use_token: child_layer_tag,
        };
        let resumed =
            LayerVar::select(dr, &current_is_finished, &parent_layer, &self.current_layer)?;
        self.current_layer = LayerVar::select(dr, &child_is_finished, &resumed, &child_layer)?;
        self.unfinished_parent_layers = stack;
        self.steps += 1;

        trace!(
            step = self.steps,
            uses_this_token = ?uses_this_token.get().into_option(),
            skip_subtree = ?skip_subtree.get().into_option(),
            descended = ?child_has_more.get().into_option(),
            stepped_up = ?pop.get().into_option(),
            "token forest iterator advanced"
        );

        Ok(IteratorStep {
            account_update: update,
            uses_this_token,
        })
    }

    /// Constrain the whole forest to have been consumed: the current layer is
    /// at its end and no parent layer is pending.
    pub fn assert_finished(&self, dr: &mut D) -> Result<()> {
        let layer_done = self.current_layer.forest.is_at_end(dr)?;
        let stack_done = self.unfinished_parent_layers.is_empty(dr)?;
        let finished = and(dr, &layer_done, &stack_done)?;

        let max_account_updates = self.steps;
        unsatisfied_as(assert_true(dr, &finished), || {
            TokenForestError::IncompleteForest { max_account_updates }
        })?;
        debug!(steps = self.steps, "token forest iteration finished");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account_update::{AccountUpdate, PublicKey, TokenId};
    use crate::call_forest::CallForest;
    use ragu::drivers::ProvingDriver;
    use ragu::Always;

    type Dr = ProvingDriver<Fp>;

    #[test]
    fn layer_commitment_matches_native() {
        let forest = CallForest::from_account_updates(&[AccountUpdate::new(
            PublicKey::new(Fp::from(8u64), true),
            TokenId::DEFAULT,
        )]);
        let layer = Layer {
            forest: forest.start_iterating(),
            may_use_token: MayUseToken::InheritFromParent,
        };

        let mut dr = Dr::new();
        let var = LayerVar::witness(&mut dr, Always(layer.clone())).unwrap();
        let commitment = var.commitment(&mut dr).unwrap();
        assert_eq!(*commitment.value.snag(), layer.commitment());
        dr.check_constraints().unwrap();
    }

    #[test]
    fn empty_forest_is_finished_immediately() {
        let mut dr = Dr::new();
        let forest = CallForestVar::empty(&mut dr).unwrap();
        let token = WireValue::constant(&mut dr, Fp::from(77u64)).unwrap();
        let mut iterator = TokenForestIterator::create(&mut dr, &forest, token).unwrap();
        iterator.assert_finished(&mut dr).unwrap();

        let step = iterator.next(&mut dr).unwrap();
        assert_eq!(step.uses_this_token.get(), Always(false));
        assert_eq!(step.account_update.native().take(), AccountUpdate::default());
        iterator.assert_finished(&mut dr).unwrap();
        assert_eq!(iterator.steps(), 1);
    }
}
