//! Token approval combinators.
//!
//! A token contract owns the token `derive(address, DEFAULT)` and must
//! approve every forest of account updates that touches it. Concrete
//! contracts supply [`TokenContract::approve_base`]; everything else is
//! provided on top of the bounded [`TokenForestIterator`].

use ff::Field;
use pasta_curves::Fp;
use ragu::gadgets::{add, mul, Boolean};
use ragu::{Driver, WireValue};
use tracing::debug;

use crate::account_update::{
    AccountUpdate, AccountUpdateVar, BalanceChange, MayUseToken, PublicKey, TokenId,
};
use crate::call_forest::{CallForest, CallForestVar};
use crate::config::ForestConfig;
use crate::error::{unsatisfied_as, Result, TokenForestError};
use crate::iterator::TokenForestIterator;
use crate::under_construction::ForestUnderConstruction;

/// A contract that approves account updates using its own token.
pub trait TokenContract<D: Driver<F = Fp>> {
    /// The contract account.
    fn address(&self) -> &PublicKey;

    /// Traversal bound and other settings.
    fn config(&self) -> &ForestConfig;

    /// The children of the contract's own account update.
    fn self_children(&mut self) -> &mut ForestUnderConstruction<D>;

    /// Approve an arbitrary forest of updates.
    fn approve_base(&mut self, dr: &mut D, forest: &CallForestVar<D>) -> Result<()>;

    /// The token this contract owns.
    fn derive_token_id(&self) -> Fp {
        TokenId::derive(self.address(), TokenId::DEFAULT)
    }

    /// Visit `forest` for exactly `max_account_updates` steps, then require it
    /// to be fully consumed.
    ///
    /// `callback` receives every visited record and whether it uses this
    /// contract's token. Filler records never use it. Afterwards the roots of
    /// the forest are appended to the contract's own children, their subtrees
    /// kept as the already committed forests.
    fn for_each_update<F>(
        &mut self,
        dr: &mut D,
        forest: &CallForestVar<D>,
        mut callback: F,
    ) -> Result<()>
    where
        F: FnMut(&mut D, &AccountUpdateVar<D>, &Boolean<D>) -> Result<()>,
    {
        let max_account_updates = self.config().max_account_updates;
        let self_token = WireValue::constant(dr, self.derive_token_id())?;
        let mut iterator = TokenForestIterator::create(dr, forest, self_token)?;

        for _ in 0..max_account_updates {
            let step = iterator.next(dr)?;
            callback(dr, &step.account_update, &step.uses_this_token)?;
        }
        iterator.assert_finished(dr)?;

        self.self_children()
            .adopt_forest(dr, forest, max_account_updates)
    }

    /// Require the balance changes of all updates using this token to sum to zero.
    fn check_zero_balance_change(&mut self, dr: &mut D, forest: &CallForestVar<D>) -> Result<()> {
        let mut total = WireValue::constant(dr, Fp::ZERO)?;
        self.for_each_update(dr, forest, |dr, update, uses_this_token| {
            let amount = update.signed_balance_change(dr)?;
            let counted = mul(dr, uses_this_token.as_wire_value(), &amount)?;
            total = add(dr, &total, &counted)?;
            Ok(())
        })?;

        unsatisfied_as(dr.enforce_zero(|| [(total.wire.clone(), Fp::ONE)]), || {
            TokenForestError::NonZeroBalanceChange
        })
    }

    /// Approve a single update together with its subtree.
    fn approve_account_update(&mut self, dr: &mut D, update: &AccountUpdate) -> Result<()> {
        self.approve_account_updates(dr, std::slice::from_ref(update))
    }

    /// Detach `updates` from the contract's children and approve them as one forest.
    fn approve_account_updates(&mut self, dr: &mut D, updates: &[AccountUpdate]) -> Result<()> {
        for update in updates {
            self.self_children().remove(update.id);
        }
        debug!(count = updates.len(), "approving account updates");

        let records = updates.to_vec();
        let forest = CallForestVar::witness(
            dr,
            D::just(move || CallForest::from_account_updates(&records)),
        )?;
        self.approve_base(dr, &forest)
    }

    /// Move `amount` of this token from `from` to `to`. The debit must be signed.
    /// Both records are roots granted the contract's own token.
    fn transfer(
        &mut self,
        dr: &mut D,
        from: &PublicKey,
        to: &PublicKey,
        amount: u64,
    ) -> Result<()> {
        let token_id = self.derive_token_id();
        let debit = AccountUpdate::new(*from, token_id)
            .with_balance_change(BalanceChange::debit(amount))
            .with_may_use_token(MayUseToken::ParentsOwnToken)
            .requiring_signature();
        let credit = AccountUpdate::new(*to, token_id)
            .with_balance_change(BalanceChange::credit(amount))
            .with_may_use_token(MayUseToken::ParentsOwnToken);

        debug!(amount, "transferring tokens");
        self.approve_account_updates(dr, &[debit, credit])
    }
}

/// A token contract that approves any forest whose token balance is conserved.
pub struct ZeroSumToken<D: Driver<F = Fp>> {
    address: PublicKey,
    config: ForestConfig,
    children: ForestUnderConstruction<D>,
}

impl<D: Driver<F = Fp>> ZeroSumToken<D> {
    /// A contract at `address` with nothing staged.
    pub fn new(address: PublicKey, config: ForestConfig) -> Self {
        Self {
            address,
            config,
            children: ForestUnderConstruction::empty(),
        }
    }

    /// The contract's own children staged so far.
    pub fn children(&self) -> &ForestUnderConstruction<D> {
        &self.children
    }
}

impl<D: Driver<F = Fp>> TokenContract<D> for ZeroSumToken<D> {
    fn address(&self) -> &PublicKey {
        &self.address
    }

    fn config(&self) -> &ForestConfig {
        &self.config
    }

    fn self_children(&mut self) -> &mut ForestUnderConstruction<D> {
        &mut self.children
    }

    fn approve_base(&mut self, dr: &mut D, forest: &CallForestVar<D>) -> Result<()> {
        self.check_zero_balance_change(dr, forest)
    }
}
