//! Integration tests for the token-forest crate.
//!
//! These tests walk complete forests through the iterator and the token
//! contract combinators under both drivers.

use ff::Field;
use pasta_curves::Fp;
use proptest::prelude::*;
use ragu::drivers::{CountingDriver, ProvingDriver};
use ragu::{Always, Driver, Maybe, WireValue};
use token_forest::{
    AccountUpdate, AccountUpdateId, CallForest, CallForestVar, CommitmentList,
    ForestConfig, ForestUnderConstruction, HashedVar, Layer, MayUseToken, PublicKey,
    TokenContract, TokenForestError, TokenForestIterator, TokenId, ZeroSumToken, EMPTY_HASH,
};
use token_forest::account_update::AccountUpdateVar;

type Dr = ProvingDriver<Fp>;

// === Test Fixtures ===

fn key(x: u64) -> PublicKey {
    PublicKey::new(Fp::from(x), x % 2 == 1)
}

fn contract_address() -> PublicKey {
    key(1_000)
}

fn own_token() -> Fp {
    TokenId::derive(&contract_address(), TokenId::DEFAULT)
}

fn record(x: u64, token_id: Fp, amount: i64, tag: MayUseToken) -> AccountUpdate {
    AccountUpdate::new(key(x), token_id)
        .with_balance_change(amount)
        .with_may_use_token(tag)
}

fn root(x: u64, amount: i64) -> AccountUpdate {
    record(x, own_token(), amount, MayUseToken::ParentsOwnToken)
}

fn inner(x: u64, amount: i64) -> AccountUpdate {
    record(x, own_token(), amount, MayUseToken::InheritFromParent)
}

fn contract(max_account_updates: usize) -> ZeroSumToken<Dr> {
    let config = ForestConfig::new(max_account_updates).unwrap();
    ZeroSumToken::new(contract_address(), config)
}

/// Run the iterator for `steps` steps; returns the visited ids with their
/// token flag and the outcome of the final exhaustiveness check.
fn walk(
    updates: &[AccountUpdate],
    steps: usize,
) -> (Vec<(AccountUpdateId, bool)>, token_forest::Result<()>) {
    let mut dr = Dr::new();
    let forest =
        CallForestVar::witness(&mut dr, Always(CallForest::from_account_updates(updates))).unwrap();
    let token = WireValue::constant(&mut dr, own_token()).unwrap();
    let mut iterator = TokenForestIterator::create(&mut dr, &forest, token).unwrap();

    let visits = (0..steps)
        .map(|_| {
            let step = iterator.next(&mut dr).unwrap();
            (
                step.account_update.native().take().id,
                step.uses_this_token.get().take(),
            )
        })
        .collect();
    let finished = iterator.assert_finished(&mut dr);
    (visits, finished)
}

fn filler(count: usize) -> Vec<(AccountUpdateId, bool)> {
    vec![(AccountUpdateId::NIL, false); count]
}

/// Synthesize one bounded pass over `updates` with a no-op callback.
fn traverse<D: Driver<F = Fp>>(dr: &mut D, updates: &[AccountUpdate], max: usize) {
    let mut token = ZeroSumToken::<D>::new(contract_address(), ForestConfig::new(max).unwrap());
    let records = updates.to_vec();
    let forest =
        CallForestVar::witness(dr, D::just(move || CallForest::from_account_updates(&records)))
            .unwrap();
    token
        .for_each_update(dr, &forest, |_, _, _| Ok(()))
        .unwrap();
}

// === Commitment Tests ===

#[test]
fn test_forest_commitment_is_deterministic() {
    let updates = vec![root(1, -5).with_children(vec![inner(2, 5)]), root(3, 0)];
    let first = CallForest::from_account_updates(&updates);
    let second = CallForest::from_account_updates(&updates);
    assert_eq!(first.hash(), second.hash());

    let reordered = vec![updates[1].clone(), updates[0].clone()];
    assert_ne!(CallForest::from_account_updates(&reordered).hash(), first.hash());

    let mut changed = updates.clone();
    changed[0].children[0] = changed[0].children[0].clone().with_balance_change(6i64);
    assert_ne!(CallForest::from_account_updates(&changed).hash(), first.hash());
}

#[test]
fn test_empty_list_hash_is_h0() {
    assert_eq!(CallForest::empty().hash(), EMPTY_HASH);
    assert_eq!(CommitmentList::<Layer>::empty().hash(), EMPTY_HASH);
    assert_eq!(EMPTY_HASH, Fp::ZERO);
    assert_eq!(CallForest::from_account_updates(&[]).hash(), EMPTY_HASH);
}

proptest! {
    #[test]
    fn prop_forest_hash_is_deterministic(amounts in prop::collection::vec(-1_000i64..1_000, 1..6)) {
        let updates: Vec<_> = amounts
            .iter()
            .enumerate()
            .map(|(i, &amount)| root(i as u64 + 10, amount))
            .collect();
        let a = CallForest::from_account_updates(&updates);
        let b = CallForest::from_account_updates(&updates);
        prop_assert_eq!(a.hash(), b.hash());
        prop_assert_eq!(a.to_account_updates(), updates);
    }

    #[test]
    fn prop_forest_hash_detects_changes(
        amounts in prop::collection::vec(-1_000i64..1_000, 2..6),
        delta in 1i64..50,
    ) {
        let updates: Vec<_> = amounts
            .iter()
            .enumerate()
            .map(|(i, &amount)| root(i as u64 + 10, amount))
            .collect();
        let original = CallForest::from_account_updates(&updates).hash();

        let mut swapped = updates.clone();
        swapped.swap(0, 1);
        prop_assert_ne!(CallForest::from_account_updates(&swapped).hash(), original);

        let mut bumped = updates.clone();
        bumped[0] = bumped[0].clone().with_balance_change(amounts[0] + delta);
        prop_assert_ne!(CallForest::from_account_updates(&bumped).hash(), original);

        let mut nested = updates[1..].to_vec();
        nested[0].adopt(updates[0].clone().with_may_use_token(MayUseToken::InheritFromParent));
        prop_assert_ne!(CallForest::from_account_updates(&nested).hash(), original);
    }
}

// === Iterator Tests ===

#[test]
fn test_exhaustive_preorder_coverage() {
    let c = inner(3, 0);
    let b = inner(2, 0).with_children(vec![c.clone()]);
    let d = inner(4, 0);
    let a = root(1, 0).with_children(vec![b.clone(), d.clone()]);
    let e = root(5, 0);

    let (visits, finished) = walk(&[a.clone(), e.clone()], 8);
    finished.unwrap();

    let mut expected: Vec<_> = [&a, &b, &c, &d, &e]
        .iter()
        .map(|update| (update.id, true))
        .collect();
    expected.extend(filler(3));
    assert_eq!(visits, expected);
}

#[test]
fn test_other_tokens_are_visited_but_not_counted() {
    let foreign = record(7, Fp::from(99u64), 10, MayUseToken::ParentsOwnToken);
    let (visits, finished) = walk(&[foreign.clone(), root(8, 0)], 3);
    finished.unwrap();
    assert_eq!(visits[0], (foreign.id, false));
    assert!(visits[1].1);
    assert_eq!(visits[2], (AccountUpdateId::NIL, false));
}

#[test]
fn test_subtree_pruning() {
    let grandchild = inner(3, 1_000);
    let child = record(2, own_token(), 0, MayUseToken::No).with_children(vec![grandchild.clone()]);
    let parent = root(1, 0).with_children(vec![child.clone()]);

    let (visits, finished) = walk(&[parent.clone()], 5);
    finished.unwrap();
    assert_eq!(visits[0].0, parent.id);
    assert_eq!(visits[1].0, child.id);
    assert_eq!(&visits[2..], &filler(3)[..]);
    assert!(visits.iter().all(|(id, _)| *id != grandchild.id));
}

#[test]
fn test_unpermitted_root_prunes_children() {
    let hidden = inner(2, 5);
    let parent = record(1, own_token(), 0, MayUseToken::InheritFromParent)
        .with_children(vec![hidden.clone()]);

    let (visits, finished) = walk(&[parent.clone()], 3);
    finished.unwrap();
    assert_eq!(visits[0].0, parent.id);
    assert!(visits.iter().all(|(id, _)| *id != hidden.id));
}

#[test]
fn test_self_exclusion() {
    let nested = inner(2, 500);
    let owner = record(1_000, TokenId::DEFAULT, 0, MayUseToken::ParentsOwnToken)
        .with_children(vec![nested.clone()]);
    assert_eq!(owner.derived_token_id(), own_token());

    let follower = root(3, 0);
    let (visits, finished) = walk(&[owner.clone(), follower.clone()], 4);
    finished.unwrap();
    assert_eq!(visits[0], (owner.id, false));
    assert_eq!(visits[1], (follower.id, true));
    assert!(visits.iter().all(|(id, _)| *id != nested.id));
}

#[test]
fn test_concrete_scenario() {
    let child = inner(2, 50);
    let parent = root(1, -50).with_children(vec![child.clone()]);

    let (visits, finished) = walk(&[parent.clone()], 20);
    finished.unwrap();
    assert_eq!(visits[0], (parent.id, true));
    assert_eq!(visits[1], (child.id, true));
    assert_eq!(&visits[2..], &filler(18)[..]);

    let mut dr = Dr::new();
    let mut token = contract(20);
    token.approve_account_update(&mut dr, &parent).unwrap();
    dr.check_constraints().unwrap();
}

#[test]
fn test_bound_overflow() {
    let flat: Vec<_> = (0..21).map(|i| root(i + 1, 0)).collect();
    let (_, finished) = walk(&flat, 20);
    assert!(matches!(
        finished,
        Err(TokenForestError::IncompleteForest {
            max_account_updates: 20
        })
    ));

    let mut dr = Dr::new();
    let mut token = contract(20);
    let result = token.approve_account_updates(&mut dr, &flat);
    assert!(matches!(
        result,
        Err(TokenForestError::IncompleteForest { .. })
    ));
}

#[test]
fn test_nested_overflow_leaves_parent_pending() {
    let parent = root(1, 0).with_children(vec![inner(2, 0), inner(3, 0)]);
    let (_, finished) = walk(&[parent, root(4, 0)], 3);
    assert!(matches!(
        finished,
        Err(TokenForestError::IncompleteForest { .. })
    ));
}

// === Token Contract Tests ===

#[test]
fn test_transfer_balances() {
    let mut dr = Dr::new();
    let mut token = contract(5);
    token.transfer(&mut dr, &key(11), &key(12), 75).unwrap();
    dr.check_constraints().unwrap();

    let approved = token.children().to_native().take().to_account_updates();
    assert_eq!(approved.len(), 2);
    assert!(approved[0].requires_signature);
    assert!(approved[0].balance_change.is_negative);
    assert!(!approved[1].requires_signature);
    assert_eq!(approved[1].balance_change.magnitude, 75);
    assert!(approved
        .iter()
        .all(|update| update.may_use_token == MayUseToken::ParentsOwnToken));
    assert!(approved.iter().all(|update| update.token_id == own_token()));
}

#[test]
fn test_staged_child_survives_approval() {
    let unrelated = record(20, Fp::from(5u64), 0, MayUseToken::No);
    let mut dr = Dr::new();
    let mut token = contract(4);
    token
        .self_children()
        .push_account_update(&mut dr, &unrelated)
        .unwrap();
    token.transfer(&mut dr, &key(11), &key(12), 30).unwrap();

    let children = token.children().to_native().take().to_account_updates();
    assert_eq!(children.len(), 3);
    assert_eq!(children[0], unrelated);
    assert!(children[1].balance_change.is_negative);

    let committed = token.children().finalize(&mut dr).unwrap();
    assert_eq!(
        *committed.hash().value.snag(),
        CallForest::from_account_updates(&children).hash()
    );
    dr.check_constraints().unwrap();
}

#[test]
fn test_two_transfers_leave_four_children() {
    let mut dr = Dr::new();
    let mut token = contract(4);
    token.transfer(&mut dr, &key(11), &key(12), 30).unwrap();
    token.transfer(&mut dr, &key(12), &key(13), 10).unwrap();

    let children = token.children().to_native().take().to_account_updates();
    assert_eq!(children.len(), 4);
    let magnitudes: Vec<_> = children
        .iter()
        .map(|update| update.balance_change.magnitude)
        .collect();
    assert_eq!(magnitudes, vec![30, 30, 10, 10]);

    let committed = token.children().finalize(&mut dr).unwrap();
    assert_eq!(
        *committed.hash().value.snag(),
        CallForest::from_account_updates(&children).hash()
    );
    dr.check_constraints().unwrap();
}

#[test]
fn test_adopted_child_can_be_removed() {
    let nested = inner(2, 7);
    let parent = root(1, -7).with_children(vec![nested]);
    let other = root(3, 0);

    let mut dr = Dr::new();
    let mut token = contract(5);
    token
        .approve_account_updates(&mut dr, &[parent.clone(), other.clone()])
        .unwrap();
    assert_eq!(
        token.children().to_native().take().to_account_updates(),
        vec![parent.clone(), other.clone()]
    );

    assert!(token.self_children().remove(other.id));
    let committed = token.children().finalize(&mut dr).unwrap();
    assert_eq!(
        *committed.hash().value.snag(),
        CallForest::from_account_updates(&[parent]).hash()
    );
    dr.check_constraints().unwrap();
}

#[test]
fn test_zero_balance_round_trip() {
    let mut dr = Dr::new();
    let mut token = contract(4);
    token
        .approve_account_updates(&mut dr, &[root(1, 40), root(2, -40)])
        .unwrap();
    dr.check_constraints().unwrap();
}

#[test]
fn test_unbalanced_forest_rejected() {
    let mut dr = Dr::new();
    let mut token = contract(4);
    let result = token.approve_account_updates(&mut dr, &[root(1, -50), root(2, 49)]);
    assert!(matches!(result, Err(TokenForestError::NonZeroBalanceChange)));
}

#[test]
fn test_foreign_token_does_not_affect_balance() {
    let mut dr = Dr::new();
    let mut token = contract(6);
    let foreign = record(3, Fp::from(5u64), 1_000, MayUseToken::ParentsOwnToken);
    token
        .approve_account_updates(&mut dr, &[root(1, 10), foreign, root(2, -10)])
        .unwrap();
    dr.check_constraints().unwrap();
}

#[test]
fn test_pruned_balance_is_ignored() {
    let hidden = inner(3, 1_000);
    let gate = record(2, own_token(), 0, MayUseToken::No).with_children(vec![hidden]);
    let parent = root(1, 0).with_children(vec![gate]);

    let mut dr = Dr::new();
    let mut token = contract(6);
    token.approve_account_update(&mut dr, &parent).unwrap();
    dr.check_constraints().unwrap();
}

#[test]
fn test_approval_detaches_from_own_children() {
    let pending = root(1, 0);
    let mut dr = Dr::new();
    let mut token = contract(3);
    token
        .self_children()
        .push_account_update(&mut dr, &pending)
        .unwrap();

    token.approve_account_update(&mut dr, &pending).unwrap();
    let adopted = token.children().to_native().take().to_account_updates();
    assert_eq!(adopted, vec![pending]);
}

// === Constraint Shape Tests ===

#[test]
fn test_counting_matches_proving_shape() {
    let max = 6;
    let mut counting = CountingDriver::<Fp>::new();
    traverse(&mut counting, &[], max);

    let forests = vec![
        vec![],
        vec![root(1, 1), root(2, -1), root(3, 0)],
        vec![root(1, 0).with_children(vec![inner(2, 0).with_children(vec![inner(3, 0)])])],
        vec![record(1, own_token(), 0, MayUseToken::No).with_children(vec![inner(2, 0)])],
        vec![
            record(1_000, TokenId::DEFAULT, 0, MayUseToken::ParentsOwnToken)
                .with_children(vec![inner(2, 0)]),
            root(3, 0).with_children(vec![inner(4, 0), inner(5, 0)]),
        ],
    ];

    for updates in forests {
        let mut proving = Dr::new();
        traverse(&mut proving, &updates, max);
        proving.check_constraints().unwrap();
        assert_eq!(proving.stats(), counting.stats());
    }
}

#[test]
fn test_step_cost_is_constant() {
    let mut one = CountingDriver::<Fp>::new();
    traverse(&mut one, &[], 1);
    let mut two = CountingDriver::<Fp>::new();
    traverse(&mut two, &[], 2);
    let mut three = CountingDriver::<Fp>::new();
    traverse(&mut three, &[], 3);

    let first = two.stats().total_constraints() - one.stats().total_constraints();
    let second = three.stats().total_constraints() - two.stats().total_constraints();
    assert_eq!(first, second);
}

// === Forest Under Construction Tests ===

#[test]
fn test_finalize_matches_native_forest() {
    let updates = vec![
        root(1, 0).with_children(vec![inner(2, 0), inner(3, 0)]),
        root(4, 0),
    ];
    let expected = CallForest::from_account_updates(&updates);

    let mut dr = Dr::new();
    let mut staged = ForestUnderConstruction::empty();
    for update in &updates {
        staged.push_account_update(&mut dr, update).unwrap();
    }
    assert_eq!(staged.len(), 2);
    assert_eq!(staged.to_native().take().hash(), expected.hash());

    let forest = staged.finalize(&mut dr).unwrap();
    assert_eq!(*forest.hash().value.snag(), expected.hash());
    dr.check_constraints().unwrap();
}

#[test]
fn test_push_tree_and_push_hashed() {
    let first = root(1, 3);
    let second = root(2, -3);
    let grandchild = inner(3, 0);

    let mut dr = Dr::new();
    let mut children = ForestUnderConstruction::empty();
    children.push_account_update(&mut dr, &grandchild).unwrap();

    let mut staged = ForestUnderConstruction::empty();
    let var = AccountUpdateVar::witness(&mut dr, Always(first.clone())).unwrap();
    staged.push_tree(first.id, var, children).unwrap();

    let var = AccountUpdateVar::witness(&mut dr, Always(second.clone())).unwrap();
    let hashed = HashedVar::hash(&mut dr, &var).unwrap();
    staged
        .push_hashed(second.id, hashed, ForestUnderConstruction::empty())
        .unwrap();

    let expected = CallForest::from_account_updates(&[
        first.clone().with_children(vec![grandchild]),
        second,
    ]);
    let forest = staged.finalize(&mut dr).unwrap();
    assert_eq!(*forest.hash().value.snag(), expected.hash());
    dr.check_constraints().unwrap();
}

#[test]
fn test_witness_hash_seals_until_removal() {
    let kept = root(1, 0);
    let dropped = root(2, 0);

    let mut dr = Dr::new();
    let mut staged = ForestUnderConstruction::empty();
    staged.push_account_update(&mut dr, &kept).unwrap();
    staged.push_account_update(&mut dr, &dropped).unwrap();
    staged.witness_hash(&mut dr).unwrap();

    let sealed = staged.finalize(&mut dr).unwrap();
    assert_eq!(
        *sealed.hash().value.snag(),
        CallForest::from_account_updates(&[kept.clone(), dropped.clone()]).hash()
    );

    assert!(staged.remove(dropped.id));
    assert!(!staged.is_sealed());
    assert!(!staged.remove(AccountUpdateId(12_345)));

    let rebuilt = staged.finalize(&mut dr).unwrap();
    assert_eq!(
        *rebuilt.hash().value.snag(),
        CallForest::from_account_updates(&[kept]).hash()
    );
    dr.check_constraints().unwrap();
}

#[test]
fn test_witnessed_forest_can_be_approved() {
    let updates = [root(1, 8), root(2, -8)];
    let mut dr = Dr::new();
    let mut staged = ForestUnderConstruction::empty();
    for update in &updates {
        staged.push_account_update(&mut dr, update).unwrap();
    }
    staged.witness_hash(&mut dr).unwrap();
    let forest = staged.finalize(&mut dr).unwrap();

    let mut token = contract(3);
    token.approve_base(&mut dr, &forest).unwrap();
    dr.check_constraints().unwrap();
}
