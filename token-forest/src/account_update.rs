//! Account-update records, natively and in-circuit.
//!
//! A record is the unit of state change the forest commits to. Only its
//! body is hashed: the opaque [`AccountUpdateId`] is host-side bookkeeping
//! and the children are committed separately by the call forest.

use ff::Field;
use once_cell::sync::Lazy;
use pasta_curves::Fp;
use rand::{Rng, RngCore};
use ragu::gadgets::{
    and, assert_false, equals, linear_combination, mul, select, select_boolean, Boolean,
};
use ragu::{Driver, Maybe, WireValue, Witness};

use crate::error::Result;
use crate::hash::{hash_with_prefix, hash_with_prefix_var, prefixes, Prefix};
use crate::hashed::{Hashable, HashableVar};

/// Opaque identity of an account update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct AccountUpdateId(pub u64);

impl AccountUpdateId {
    /// Identity carried by filler records.
    pub const NIL: Self = AccountUpdateId(0);

    /// A fresh random identity.
    pub fn random() -> Self {
        AccountUpdateId(rand::random())
    }
}

/// A compressed curve point: the x-coordinate and the parity of y.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PublicKey {
    pub x: Fp,
    pub is_odd: bool,
}

impl PublicKey {
    /// A key from its x-coordinate and y parity.
    pub fn new(x: Fp, is_odd: bool) -> Self {
        Self { x, is_odd }
    }

    /// Sample a key for tests and demos. The point is not checked to be on the curve.
    pub fn random(mut rng: impl RngCore) -> Self {
        Self {
            x: Fp::random(&mut rng),
            is_odd: rng.gen(),
        }
    }
}

/// A signed token amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BalanceChange {
    pub magnitude: u64,
    pub is_negative: bool,
}

impl BalanceChange {
    /// No change.
    pub const ZERO: Self = BalanceChange {
        magnitude: 0,
        is_negative: false,
    };

    /// Zero is always non-negative.
    pub fn new(magnitude: u64, is_negative: bool) -> Self {
        Self {
            magnitude,
            is_negative: is_negative && magnitude != 0,
        }
    }

    /// Add `amount`.
    pub fn credit(amount: u64) -> Self {
        Self::new(amount, false)
    }

    /// Remove `amount`.
    pub fn debit(amount: u64) -> Self {
        Self::new(amount, true)
    }

    /// The signed amount as a field element.
    pub fn to_field(&self) -> Fp {
        let magnitude = Fp::from(self.magnitude);
        if self.is_negative {
            -magnitude
        } else {
            magnitude
        }
    }
}

impl From<i64> for BalanceChange {
    fn from(amount: i64) -> Self {
        Self::new(amount.unsigned_abs(), amount < 0)
    }
}

/// Which token an account update may act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MayUseToken {
    /// Neither the parent's token nor an inherited permission.
    #[default]
    No,
    /// May use the token owned by the parent account.
    ParentsOwnToken,
    /// Inherits whatever permission the parent has.
    InheritFromParent,
}

impl MayUseToken {
    /// The `(parents_own_token, inherit_from_parent)` encoding.
    pub fn flags(self) -> (bool, bool) {
        match self {
            MayUseToken::No => (false, false),
            MayUseToken::ParentsOwnToken => (true, false),
            MayUseToken::InheritFromParent => (false, true),
        }
    }

    /// Decode the flag pair. Both flags set is not a valid tag.
    pub fn from_flags(parents_own_token: bool, inherit_from_parent: bool) -> Option<Self> {
        match (parents_own_token, inherit_from_parent) {
            (false, false) => Some(MayUseToken::No),
            (true, false) => Some(MayUseToken::ParentsOwnToken),
            (false, true) => Some(MayUseToken::InheritFromParent),
            (true, true) => None,
        }
    }
}

/// Token identifiers.
pub struct TokenId;

impl TokenId {
    /// The native token.
    pub const DEFAULT: Fp = <Fp as Field>::ONE;

    /// The token owned by `owner` under `parent`.
    pub fn derive(owner: &PublicKey, parent: Fp) -> Fp {
        hash_with_prefix(
            prefixes::DERIVE_TOKEN_ID,
            &[owner.x, bool_to_field(owner.is_odd), parent],
        )
    }

    /// In-circuit [`TokenId::derive`].
    pub fn derive_var<D: Driver<F = Fp>>(
        dr: &mut D,
        owner: &PublicKeyVar<D>,
        parent: &WireValue<D>,
    ) -> Result<WireValue<D>> {
        hash_with_prefix_var(
            dr,
            prefixes::DERIVE_TOKEN_ID,
            &[
                owner.x.clone(),
                owner.is_odd.as_wire_value().clone(),
                parent.clone(),
            ],
        )
    }
}

fn bool_to_field(value: bool) -> Fp {
    if value {
        Fp::ONE
    } else {
        Fp::ZERO
    }
}

/// An account-update record together with its ordered children.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountUpdate {
    pub id: AccountUpdateId,
    pub public_key: PublicKey,
    pub token_id: Fp,
    pub balance_change: BalanceChange,
    pub may_use_token: MayUseToken,
    pub requires_signature: bool,
    pub children: Vec<AccountUpdate>,
}

/// The dummy record used as filler once a forest is exhausted.
impl Default for AccountUpdate {
    fn default() -> Self {
        Self {
            id: AccountUpdateId::NIL,
            public_key: PublicKey::default(),
            token_id: TokenId::DEFAULT,
            balance_change: BalanceChange::ZERO,
            may_use_token: MayUseToken::No,
            requires_signature: false,
            children: Vec::new(),
        }
    }
}

impl AccountUpdate {
    /// A record for `public_key` on `token_id` with a fresh identity.
    pub fn new(public_key: PublicKey, token_id: Fp) -> Self {
        Self {
            id: AccountUpdateId::random(),
            public_key,
            token_id,
            ..Self::default()
        }
    }

    /// Set the signed token amount.
    pub fn with_balance_change(mut self, balance_change: impl Into<BalanceChange>) -> Self {
        self.balance_change = balance_change.into();
        self
    }

    /// Set the permission tag.
    pub fn with_may_use_token(mut self, may_use_token: MayUseToken) -> Self {
        self.may_use_token = may_use_token;
        self
    }

    /// Mark the update as authorized by a signature.
    pub fn requiring_signature(mut self) -> Self {
        self.requires_signature = true;
        self
    }

    /// Replace the children.
    pub fn with_children(mut self, children: Vec<AccountUpdate>) -> Self {
        self.children = children;
        self
    }

    /// Append `child` as the last child.
    pub fn adopt(&mut self, child: AccountUpdate) {
        self.children.push(child);
    }

    /// The token this account owns under its own token id.
    pub fn derived_token_id(&self) -> Fp {
        TokenId::derive(&self.public_key, self.token_id)
    }

    /// The same record with its subtree detached.
    pub fn without_children(&self) -> Self {
        Self {
            children: Vec::new(),
            ..self.clone()
        }
    }
}

impl Hashable for AccountUpdate {
    const PREFIX: Prefix = prefixes::ZKAPP_BODY;

    fn to_fields(&self) -> Vec<Fp> {
        let (parents_own_token, inherit_from_parent) = self.may_use_token.flags();
        vec![
            self.public_key.x,
            bool_to_field(self.public_key.is_odd),
            self.token_id,
            Fp::from(self.balance_change.magnitude),
            bool_to_field(self.balance_change.is_negative),
            bool_to_field(parents_own_token),
            bool_to_field(inherit_from_parent),
            bool_to_field(self.requires_signature),
        ]
    }
}

static DUMMY_HASH: Lazy<Fp> = Lazy::new(|| AccountUpdate::default().canonical_hash());

/// Body hash of the dummy record.
pub fn dummy_hash() -> Fp {
    *DUMMY_HASH
}

// =============================================================================
// In-circuit representations
// =============================================================================

/// In-circuit [`PublicKey`].
pub struct PublicKeyVar<D: Driver<F = Fp>> {
    pub x: WireValue<D>,
    pub is_odd: Boolean<D>,
}

impl<D: Driver<F = Fp>> Clone for PublicKeyVar<D> {
    fn clone(&self) -> Self {
        Self {
            x: self.x.clone(),
            is_odd: self.is_odd.clone(),
        }
    }
}

impl<D: Driver<F = Fp>> PublicKeyVar<D> {
    /// Allocate unconstrained wires for a witnessed key.
    pub fn witness(dr: &mut D, value: Witness<D, PublicKey>) -> Result<Self> {
        Ok(Self {
            x: WireValue::alloc(dr, D::just(|| value.snag().x))?,
            is_odd: Boolean::alloc(dr, D::just(|| value.snag().is_odd))?,
        })
    }

    /// A key fixed at synthesis time.
    pub fn constant(dr: &mut D, value: &PublicKey) -> Result<Self> {
        Ok(Self {
            x: WireValue::constant(dr, value.x)?,
            is_odd: Boolean::constant(dr, value.is_odd)?,
        })
    }
}

/// In-circuit [`BalanceChange`].
///
/// The magnitude is not range checked.
pub struct BalanceChangeVar<D: Driver<F = Fp>> {
    pub magnitude: WireValue<D>,
    pub is_negative: Boolean<D>,
}

impl<D: Driver<F = Fp>> Clone for BalanceChangeVar<D> {
    fn clone(&self) -> Self {
        Self {
            magnitude: self.magnitude.clone(),
            is_negative: self.is_negative.clone(),
        }
    }
}

impl<D: Driver<F = Fp>> BalanceChangeVar<D> {
    /// Allocate wires for a witnessed amount. The sign is constrained boolean.
    pub fn witness(dr: &mut D, value: Witness<D, BalanceChange>) -> Result<Self> {
        Ok(Self {
            magnitude: WireValue::alloc(dr, D::just(|| Fp::from(value.snag().magnitude)))?,
            is_negative: Boolean::alloc(dr, D::just(|| value.snag().is_negative))?,
        })
    }

    /// An amount fixed at synthesis time.
    pub fn constant(dr: &mut D, value: &BalanceChange) -> Result<Self> {
        Ok(Self {
            magnitude: WireValue::constant(dr, Fp::from(value.magnitude))?,
            is_negative: Boolean::constant(dr, value.is_negative)?,
        })
    }

    /// `magnitude * (1 - 2 * is_negative)`
    pub fn signed(&self, dr: &mut D) -> Result<WireValue<D>> {
        let sign = linear_combination(
            dr,
            &[(self.is_negative.as_wire_value(), -Fp::from(2u64))],
            Fp::ONE,
        )?;
        Ok(mul(dr, &self.magnitude, &sign)?)
    }
}

/// In-circuit [`MayUseToken`] as its two flags.
pub struct MayUseTokenVar<D: Driver<F = Fp>> {
    pub parents_own_token: Boolean<D>,
    pub inherit_from_parent: Boolean<D>,
}

impl<D: Driver<F = Fp>> Clone for MayUseTokenVar<D> {
    fn clone(&self) -> Self {
        Self {
            parents_own_token: self.parents_own_token.clone(),
            inherit_from_parent: self.inherit_from_parent.clone(),
        }
    }
}

impl<D: Driver<F = Fp>> MayUseTokenVar<D> {
    /// Witness a tag, constraining the flags to not both be set.
    pub fn witness(dr: &mut D, value: Witness<D, MayUseToken>) -> Result<Self> {
        let parents_own_token = Boolean::alloc(dr, D::just(|| value.snag().flags().0))?;
        let inherit_from_parent = Boolean::alloc(dr, D::just(|| value.snag().flags().1))?;
        let both = and(dr, &parents_own_token, &inherit_from_parent)?;
        assert_false(dr, &both)?;
        Ok(Self {
            parents_own_token,
            inherit_from_parent,
        })
    }

    /// A tag fixed at synthesis time.
    pub fn constant(dr: &mut D, value: MayUseToken) -> Result<Self> {
        let (parents_own_token, inherit_from_parent) = value.flags();
        Ok(Self {
            parents_own_token: Boolean::constant(dr, parents_own_token)?,
            inherit_from_parent: Boolean::constant(dr, inherit_from_parent)?,
        })
    }

    /// Whether both flags agree.
    pub fn equals(&self, dr: &mut D, other: &Self) -> Result<Boolean<D>> {
        let same_parent = equals(dr, &self.parents_own_token, &other.parents_own_token)?;
        let same_inherit = equals(dr, &self.inherit_from_parent, &other.inherit_from_parent)?;
        Ok(and(dr, &same_parent, &same_inherit)?)
    }

    /// `a` if `condition` holds, else `b`.
    pub fn select(dr: &mut D, condition: &Boolean<D>, a: &Self, b: &Self) -> Result<Self> {
        Ok(Self {
            parents_own_token: select_boolean(
                dr,
                condition,
                &a.parents_own_token,
                &b.parents_own_token,
            )?,
            inherit_from_parent: select_boolean(
                dr,
                condition,
                &a.inherit_from_parent,
                &b.inherit_from_parent,
            )?,
        })
    }

    /// The decoded tag. An invalid pair reads as [`MayUseToken::No`].
    pub fn native(&self) -> Witness<D, MayUseToken> {
        D::just(|| {
            let parents_own_token = *self.parents_own_token.get().snag();
            let inherit_from_parent = *self.inherit_from_parent.get().snag();
            MayUseToken::from_flags(parents_own_token, inherit_from_parent).unwrap_or_default()
        })
    }
}

/// In-circuit [`AccountUpdate`] body.
///
/// Only the hashed fields have wires. The shadow record is kept as given,
/// identity and children included, for host-side bookkeeping.
pub struct AccountUpdateVar<D: Driver<F = Fp>> {
    pub public_key: PublicKeyVar<D>,
    pub token_id: WireValue<D>,
    pub balance_change: BalanceChangeVar<D>,
    pub may_use_token: MayUseTokenVar<D>,
    pub requires_signature: Boolean<D>,
    native: Witness<D, AccountUpdate>,
}

impl<D: Driver<F = Fp>> Clone for AccountUpdateVar<D> {
    fn clone(&self) -> Self {
        Self {
            public_key: self.public_key.clone(),
            token_id: self.token_id.clone(),
            balance_change: self.balance_change.clone(),
            may_use_token: self.may_use_token.clone(),
            requires_signature: self.requires_signature.clone(),
            native: self.native.cloned(),
        }
    }
}

impl<D: Driver<F = Fp>> AccountUpdateVar<D> {
    /// Allocate wires for every hashed field of a witnessed record.
    pub fn witness(dr: &mut D, value: Witness<D, AccountUpdate>) -> Result<Self> {
        let public_key = PublicKeyVar::witness(dr, D::just(|| value.snag().public_key))?;
        let token_id = WireValue::alloc(dr, D::just(|| value.snag().token_id))?;
        let balance_change =
            BalanceChangeVar::witness(dr, D::just(|| value.snag().balance_change))?;
        let may_use_token = MayUseTokenVar::witness(dr, D::just(|| value.snag().may_use_token))?;
        let requires_signature = Boolean::alloc(dr, D::just(|| value.snag().requires_signature))?;

        Ok(Self {
            public_key,
            token_id,
            balance_change,
            may_use_token,
            requires_signature,
            native: value,
        })
    }

    /// A record fixed at synthesis time.
    pub fn constant(dr: &mut D, value: &AccountUpdate) -> Result<Self> {
        Ok(Self {
            public_key: PublicKeyVar::constant(dr, &value.public_key)?,
            token_id: WireValue::constant(dr, value.token_id)?,
            balance_change: BalanceChangeVar::constant(dr, &value.balance_change)?,
            may_use_token: MayUseTokenVar::constant(dr, value.may_use_token)?,
            requires_signature: Boolean::constant(dr, value.requires_signature)?,
            native: D::just(|| value.clone()),
        })
    }

    /// Wires in body-hash order.
    pub fn fields(&self) -> Vec<WireValue<D>> {
        vec![
            self.public_key.x.clone(),
            self.public_key.is_odd.as_wire_value().clone(),
            self.token_id.clone(),
            self.balance_change.magnitude.clone(),
            self.balance_change.is_negative.as_wire_value().clone(),
            self.may_use_token.parents_own_token.as_wire_value().clone(),
            self.may_use_token.inherit_from_parent.as_wire_value().clone(),
            self.requires_signature.as_wire_value().clone(),
        ]
    }

    /// The body hash.
    pub fn hash(&self, dr: &mut D) -> Result<WireValue<D>> {
        hash_with_prefix_var(dr, prefixes::ZKAPP_BODY, &self.fields())
    }

    /// The token owned by this account under its token id.
    pub fn derive_token_id(&self, dr: &mut D) -> Result<WireValue<D>> {
        TokenId::derive_var(dr, &self.public_key, &self.token_id)
    }

    /// The balance change as a signed field element.
    pub fn signed_balance_change(&self, dr: &mut D) -> Result<WireValue<D>> {
        self.balance_change.signed(dr)
    }

    /// The shadow record.
    pub fn native(&self) -> Witness<D, AccountUpdate> {
        self.native.cloned()
    }
}

impl<D: Driver<F = Fp>> HashableVar<D> for AccountUpdateVar<D> {
    type Native = AccountUpdate;

    fn witness(dr: &mut D, value: Witness<D, AccountUpdate>) -> Result<Self> {
        Self::witness(dr, value)
    }

    fn constant(dr: &mut D, value: &AccountUpdate) -> Result<Self> {
        Self::constant(dr, value)
    }

    fn fields(&self) -> Vec<WireValue<D>> {
        Self::fields(self)
    }

    fn select(dr: &mut D, condition: &Boolean<D>, a: &Self, b: &Self) -> Result<Self> {
        let public_key = PublicKeyVar {
            x: select(dr, condition, &a.public_key.x, &b.public_key.x)?,
            is_odd: select_boolean(dr, condition, &a.public_key.is_odd, &b.public_key.is_odd)?,
        };
        let token_id = select(dr, condition, &a.token_id, &b.token_id)?;
        let balance_change = BalanceChangeVar {
            magnitude: select(
                dr,
                condition,
                &a.balance_change.magnitude,
                &b.balance_change.magnitude,
            )?,
            is_negative: select_boolean(
                dr,
                condition,
                &a.balance_change.is_negative,
                &b.balance_change.is_negative,
            )?,
        };
        let may_use_token =
            MayUseTokenVar::select(dr, condition, &a.may_use_token, &b.may_use_token)?;
        let requires_signature =
            select_boolean(dr, condition, &a.requires_signature, &b.requires_signature)?;
        let native = D::just(|| {
            if *condition.get().snag() {
                a.native.snag().clone()
            } else {
                b.native.snag().clone()
            }
        });

        Ok(Self {
            public_key,
            token_id,
            balance_change,
            may_use_token,
            requires_signature,
            native,
        })
    }

    fn native(&self) -> Witness<D, AccountUpdate> {
        Self::native(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragu::drivers::ProvingDriver;
    use ragu::Always;

    fn sample() -> AccountUpdate {
        AccountUpdate::new(PublicKey::new(Fp::from(9u64), true), Fp::from(5u64))
            .with_balance_change(-12i64)
            .with_may_use_token(MayUseToken::ParentsOwnToken)
            .requiring_signature()
    }

    #[test]
    fn zero_balance_is_never_negative() {
        assert_eq!(BalanceChange::from(0i64), BalanceChange::ZERO);
        assert_eq!(BalanceChange::debit(0), BalanceChange::ZERO);
        assert_eq!(BalanceChange::from(-3i64).to_field(), -Fp::from(3u64));
    }

    #[test]
    fn tag_flags_round_trip() {
        for tag in [
            MayUseToken::No,
            MayUseToken::ParentsOwnToken,
            MayUseToken::InheritFromParent,
        ] {
            let (a, b) = tag.flags();
            assert_eq!(MayUseToken::from_flags(a, b), Some(tag));
        }
        assert_eq!(MayUseToken::from_flags(true, true), None);
    }

    #[test]
    fn body_hash_ignores_identity_and_children() {
        let update = sample();
        let mut other = update.clone();
        other.id = AccountUpdateId::random();
        other.adopt(AccountUpdate::default());
        assert_eq!(update.canonical_hash(), other.canonical_hash());

        let debit_more = update.clone().with_balance_change(-13i64);
        assert_ne!(update.canonical_hash(), debit_more.canonical_hash());
    }

    #[test]
    fn circuit_record_matches_native() {
        let update = sample();
        let mut dr = ProvingDriver::<Fp>::new();
        let var = AccountUpdateVar::witness(&mut dr, Always(update.clone())).unwrap();

        let hash = var.hash(&mut dr).unwrap();
        assert_eq!(*hash.value.snag(), update.canonical_hash());

        let derived = var.derive_token_id(&mut dr).unwrap();
        assert_eq!(*derived.value.snag(), update.derived_token_id());

        let signed = var.signed_balance_change(&mut dr).unwrap();
        assert_eq!(*signed.value.snag(), -Fp::from(12u64));

        assert_eq!(
            var.may_use_token.native(),
            Always(MayUseToken::ParentsOwnToken)
        );
        dr.check_constraints().unwrap();
    }

    #[test]
    fn dummy_record_is_filler() {
        let dummy = AccountUpdate::default();
        assert_eq!(dummy.id, AccountUpdateId::NIL);
        assert_eq!(dummy.token_id, TokenId::DEFAULT);
        assert_eq!(dummy_hash(), dummy.canonical_hash());
    }
}
