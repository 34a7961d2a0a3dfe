//! A forest staged node by node before it is committed.
//!
//! Trees can be appended as in-circuit records, as already hashed records,
//! straight from native account updates, or as the roots of a committed
//! forest, and removed again by identity. [`ForestUnderConstruction::finalize`]
//! turns the staged trees into a [`CallForestVar`], hashing everything
//! in-circuit unless the forest was sealed to a witnessed commitment first.

use pasta_curves::Fp;
use ragu::gadgets::{assert_true, not, Boolean};
use ragu::{Driver, Maybe, Witness};
use tracing::debug;

use crate::account_update::{AccountUpdate, AccountUpdateId, AccountUpdateVar};
use crate::call_forest::{CallForest, CallForestVar, CallTree, CallTreeVar};
use crate::error::{unsatisfied_as, Result, TokenForestError};
use crate::hashed::{Hashed, HashedVar};

/// How a staged record will be committed.
pub enum PendingUpdate<D: Driver<F = Fp>> {
    /// Hashed in-circuit on finalization.
    Record(AccountUpdateVar<D>),
    /// Committed already.
    Hashed(HashedVar<D, AccountUpdateVar<D>>),
}

impl<D: Driver<F = Fp>> PendingUpdate<D> {
    fn finalize(&self, dr: &mut D) -> Result<HashedVar<D, AccountUpdateVar<D>>> {
        match self {
            PendingUpdate::Record(update) => HashedVar::hash(dr, update),
            PendingUpdate::Hashed(hashed) => Ok(hashed.clone()),
        }
    }

    fn native(&self) -> Hashed<AccountUpdate> {
        match self {
            PendingUpdate::Record(update) => {
                Hashed::hash(update.native().take().without_children())
            }
            PendingUpdate::Hashed(hashed) => hashed.native().take(),
        }
    }
}

/// A staged tree.
pub struct TreeUnderConstruction<D: Driver<F = Fp>> {
    pub id: AccountUpdateId,
    pub update: PendingUpdate<D>,
    pub children: ForestUnderConstruction<D>,
    /// Set for adopted roots: the slot only counts when the flag holds.
    included: Option<Boolean<D>>,
}

impl<D: Driver<F = Fp>> TreeUnderConstruction<D> {
    fn staged(
        id: AccountUpdateId,
        update: PendingUpdate<D>,
        children: ForestUnderConstruction<D>,
    ) -> Self {
        Self {
            id,
            update,
            children,
            included: None,
        }
    }

    /// Whether the slot holds a tree. Only meaningful with a witness.
    fn is_present(&self) -> bool {
        self.included
            .as_ref()
            .map_or(true, |included| *included.get().snag())
    }

    fn from_account_update(dr: &mut D, update: &AccountUpdate) -> Result<Self> {
        let record = AccountUpdateVar::witness(dr, D::just(|| update.without_children()))?;
        let mut children = ForestUnderConstruction::empty();
        for child in &update.children {
            children.push_account_update(dr, child)?;
        }
        Ok(Self::staged(update.id, PendingUpdate::Record(record), children))
    }

    fn finalize(&self, dr: &mut D) -> Result<CallTreeVar<D>> {
        Ok(CallTreeVar {
            account_update: self.update.finalize(dr)?,
            calls: self.children.finalize(dr)?,
        })
    }

    fn native(&self) -> CallTree {
        CallTree {
            account_update: self.update.native(),
            calls: self.children.native_forest(),
        }
    }
}

/// A mutable forest of staged trees.
pub struct ForestUnderConstruction<D: Driver<F = Fp>> {
    trees: Vec<TreeUnderConstruction<D>>,
    sealed: Option<CallForestVar<D>>,
}

impl<D: Driver<F = Fp>> Default for ForestUnderConstruction<D> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<D: Driver<F = Fp>> ForestUnderConstruction<D> {
    /// A forest with nothing staged.
    pub fn empty() -> Self {
        Self {
            trees: Vec::new(),
            sealed: None,
        }
    }

    /// Number of staged top-level slots. Adopted slots past the end of their
    /// forest are counted but hold no tree.
    pub fn len(&self) -> usize {
        self.trees.len()
    }

    /// Whether nothing is staged and no commitment is fixed.
    pub fn is_empty(&self) -> bool {
        self.trees.is_empty() && self.sealed.is_none()
    }

    /// Whether the commitment is fixed.
    pub fn is_sealed(&self) -> bool {
        self.sealed.is_some()
    }

    /// The staged top-level trees, in order.
    pub fn trees(&self) -> &[TreeUnderConstruction<D>] {
        &self.trees
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_sealed() {
            return Err(TokenForestError::ForestSealed);
        }
        Ok(())
    }

    /// Stage a native record and all of its descendants as witnesses.
    pub fn push_account_update(&mut self, dr: &mut D, update: &AccountUpdate) -> Result<()> {
        self.ensure_open()?;
        let tree = TreeUnderConstruction::from_account_update(dr, update)?;
        self.trees.push(tree);
        Ok(())
    }

    /// Stage an in-circuit record with the given children.
    pub fn push_tree(
        &mut self,
        id: AccountUpdateId,
        update: AccountUpdateVar<D>,
        children: ForestUnderConstruction<D>,
    ) -> Result<()> {
        self.ensure_open()?;
        self.trees
            .push(TreeUnderConstruction::staged(id, PendingUpdate::Record(update), children));
        Ok(())
    }

    /// Stage an already committed record with the given children.
    pub fn push_hashed(
        &mut self,
        id: AccountUpdateId,
        update: HashedVar<D, AccountUpdateVar<D>>,
        children: ForestUnderConstruction<D>,
    ) -> Result<()> {
        self.ensure_open()?;
        self.trees
            .push(TreeUnderConstruction::staged(id, PendingUpdate::Hashed(update), children));
        Ok(())
    }

    /// Append the roots of the committed `forest` after the staged trees.
    ///
    /// The forest is split by `max_roots` conditional pops, each constrained
    /// against its hash, so the cost depends only on the bound. Every root
    /// keeps its children as the committed forest they already are, and can
    /// be removed again by identity. Fails with
    /// [`TokenForestError::IncompleteForest`] if roots are left over.
    pub fn adopt_forest(
        &mut self,
        dr: &mut D,
        forest: &CallForestVar<D>,
        max_roots: usize,
    ) -> Result<()> {
        self.ensure_open()?;

        let mut rest = forest.clone();
        let mut adopted = Vec::with_capacity(max_roots);
        for _ in 0..max_roots {
            let at_end = rest.is_empty(dr)?;
            let present = not(dr, &at_end)?;
            let (node, tail) = rest.pop_when(dr, &present)?;
            rest = tail;

            let id = D::just(|| node.account_update.native().take().unhash().id)
                .into_option()
                .unwrap_or(AccountUpdateId::NIL);
            let mut children = ForestUnderConstruction::empty();
            children.set_to_forest(node.calls);
            adopted.push(TreeUnderConstruction {
                id,
                update: PendingUpdate::Hashed(node.account_update),
                children,
                included: Some(present),
            });
        }

        let finished = rest.is_empty(dr)?;
        unsatisfied_as(assert_true(dr, &finished), || {
            TokenForestError::IncompleteForest {
                max_account_updates: max_roots,
            }
        })?;

        self.trees.extend(adopted);
        debug!(max_roots, "adopted committed forest");
        Ok(())
    }

    /// Remove the tree with identity `id`, searching the whole forest.
    ///
    /// Returns whether a tree was removed. Removing from a sealed forest
    /// drops the seal, since the witnessed commitment no longer matches.
    pub fn remove(&mut self, id: AccountUpdateId) -> bool {
        if let Some(index) = self.trees.iter().position(|tree| tree.id == id) {
            self.trees.remove(index);
            self.sealed = None;
            return true;
        }
        for tree in &mut self.trees {
            if tree.children.remove(id) {
                self.sealed = None;
                return true;
            }
        }
        false
    }

    /// Replace the staged trees by an existing forest and its commitment.
    pub fn set_to_forest(&mut self, forest: CallForestVar<D>) {
        self.trees.clear();
        self.sealed = Some(forest);
    }

    /// Witness the commitment of the staged trees instead of hashing them
    /// in-circuit on finalization. The staged trees are kept, so the
    /// commitment is still checked wherever the forest is later popped.
    pub fn witness_hash(&mut self, dr: &mut D) -> Result<()> {
        let forest = CallForestVar::witness(dr, self.to_native())?;
        self.sealed = Some(forest);
        Ok(())
    }

    /// The native forest, built from the shadow records.
    pub fn to_native(&self) -> Witness<D, CallForest> {
        D::just(|| self.native_forest())
    }

    fn native_forest(&self) -> CallForest {
        match &self.sealed {
            Some(forest) => forest.native().take(),
            None => self
                .trees
                .iter()
                .filter(|tree| tree.is_present())
                .map(TreeUnderConstruction::native)
                .collect(),
        }
    }

    /// Commit the staged trees, root order preserved.
    pub fn finalize(&self, dr: &mut D) -> Result<CallForestVar<D>> {
        if let Some(forest) = &self.sealed {
            return Ok(forest.clone());
        }

        let mut forest = CallForestVar::empty(dr)?;
        for tree in self.trees.iter().rev() {
            let node = tree.finalize(dr)?;
            forest = match &tree.included {
                Some(included) => forest.push_if(dr, included, &node)?,
                None => forest.push(dr, &node)?,
            };
        }
        debug!(trees = self.trees.len(), "finalized forest under construction");
        Ok(forest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account_update::{PublicKey, TokenId};
    use ragu::drivers::ProvingDriver;
    use ragu::Always;

    type Dr = ProvingDriver<Fp>;

    fn record(x: u64) -> AccountUpdate {
        AccountUpdate::new(PublicKey::new(Fp::from(x), false), TokenId::DEFAULT)
    }

    #[test]
    fn push_and_remove_nested() {
        let child = record(2);
        let root = record(1).with_children(vec![child.clone()]);

        let mut dr = Dr::new();
        let mut forest = ForestUnderConstruction::empty();
        forest.push_account_update(&mut dr, &root).unwrap();
        assert_eq!(forest.len(), 1);

        assert!(forest.remove(child.id));
        assert!(!forest.remove(child.id));
        assert!(forest.trees()[0].children.is_empty());

        let hash = forest.finalize(&mut dr).unwrap();
        let expected = CallForest::from_account_updates(&[root.without_children()]);
        assert_eq!(*hash.hash().value.snag(), expected.hash());
        dr.check_constraints().unwrap();
    }

    #[test]
    fn adopted_roots_follow_staged_trees() {
        let staged = record(5);
        let roots = [record(6).with_children(vec![record(7)]), record(8)];

        let mut dr = Dr::new();
        let committed =
            CallForestVar::witness(&mut dr, Always(CallForest::from_account_updates(&roots)))
                .unwrap();
        let mut forest = ForestUnderConstruction::empty();
        forest.push_account_update(&mut dr, &staged).unwrap();
        forest.adopt_forest(&mut dr, &committed, 3).unwrap();
        assert_eq!(forest.len(), 4);

        let expected =
            CallForest::from_account_updates(&[staged, roots[0].clone(), roots[1].clone()]);
        assert_eq!(forest.to_native().take().hash(), expected.hash());
        let hash = forest.finalize(&mut dr).unwrap();
        assert_eq!(*hash.hash().value.snag(), expected.hash());
        dr.check_constraints().unwrap();
    }

    #[test]
    fn adopting_more_roots_than_the_bound_fails() {
        let roots = [record(1), record(2), record(3)];
        let mut dr = Dr::new();
        let committed =
            CallForestVar::witness(&mut dr, Always(CallForest::from_account_updates(&roots)))
                .unwrap();
        let mut forest = ForestUnderConstruction::empty();
        assert!(matches!(
            forest.adopt_forest(&mut dr, &committed, 2),
            Err(TokenForestError::IncompleteForest {
                max_account_updates: 2
            })
        ));
        assert!(forest.is_empty());
    }

    #[test]
    fn sealed_forest_rejects_pushes() {
        let mut dr = Dr::new();
        let mut forest = ForestUnderConstruction::empty();
        forest.push_account_update(&mut dr, &record(3)).unwrap();
        forest.witness_hash(&mut dr).unwrap();
        assert!(forest.is_sealed());
        assert!(matches!(
            forest.push_account_update(&mut dr, &record(4)),
            Err(TokenForestError::ForestSealed)
        ));
    }
}
