//! Hash-consed lists.
//!
//! A list is represented by a single commitment:
//!
//! ```text
//! hash([])          = H0
//! hash(head :: tail) = Hash(cons_prefix, [commitment(head), hash(tail)])
//! ```
//!
//! where `commitment(head)` is the element's own node hash. Two lists are
//! equal iff their hashes are equal. The native [`CommitmentList`] is a
//! persistent cons list, so clones and pushes share structure. The in-circuit
//! [`CommitmentListVar`] carries only the hash wire plus a shadow copy of the
//! native list, and every branch is expressed as a selection.

use core::fmt;
use core::marker::PhantomData;
use std::rc::Rc;

use ff::Field;
use pasta_curves::Fp;
use ragu::gadgets::{
    and, assert_true, conditional_enforce_equal, enforce_equal, is_zero, not, select, Boolean,
};
use ragu::{Driver, Maybe, WireValue, Witness};

use crate::error::{Result, TokenForestError};
use crate::hash::{hash_with_prefix, hash_with_prefix_var, Prefix};

/// Hash of the empty list.
pub const EMPTY_HASH: Fp = <Fp as Field>::ZERO;

/// An element that can live in a commitment list.
///
/// `Default` is the filler returned when reading past the end.
pub trait Commit: Clone + Default {
    /// Domain separator of the cons cells.
    const CONS_PREFIX: Prefix;

    /// The element's node hash.
    fn commitment(&self) -> Fp;
}

fn cons_hash<T: Commit>(element: &T, tail: Fp) -> Fp {
    hash_with_prefix(T::CONS_PREFIX, &[element.commitment(), tail])
}

struct Cons<T> {
    element: T,
    tail: CommitmentList<T>,
}

/// A hash-consed list with its native contents.
pub struct CommitmentList<T> {
    hash: Fp,
    head: Option<Rc<Cons<T>>>,
}

// Unlinks iteratively so long lists do not overflow the stack on drop.
impl<T> Drop for CommitmentList<T> {
    fn drop(&mut self) {
        let mut head = self.head.take();
        while let Some(cell) = head {
            match Rc::try_unwrap(cell) {
                Ok(mut cons) => head = cons.tail.head.take(),
                Err(_) => break,
            }
        }
    }
}

impl<T> Clone for CommitmentList<T> {
    fn clone(&self) -> Self {
        Self {
            hash: self.hash,
            head: self.head.clone(),
        }
    }
}

impl<T> Default for CommitmentList<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> PartialEq for CommitmentList<T> {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl<T> Eq for CommitmentList<T> {}

impl<T: fmt::Debug> fmt::Debug for CommitmentList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommitmentList")
            .field("hash", &self.hash)
            .field("elements", &self.iter().collect::<Vec<_>>())
            .finish()
    }
}

impl<T> CommitmentList<T> {
    /// The empty list, hashing to [`EMPTY_HASH`].
    pub fn empty() -> Self {
        Self {
            hash: EMPTY_HASH,
            head: None,
        }
    }

    /// The list commitment.
    pub fn hash(&self) -> Fp {
        self.hash
    }

    /// Whether the list has no elements.
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Number of elements. Walks the whole list.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Iterate from the head.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            next: self.head.as_deref(),
        }
    }

    /// The head element, if any.
    pub fn first(&self) -> Option<&T> {
        self.head.as_deref().map(|cons| &cons.element)
    }
}

impl<T: Commit> CommitmentList<T> {
    /// Build a list whose head is `elements[0]`.
    pub fn from_slice(elements: &[T]) -> Self {
        elements.iter().cloned().collect()
    }

    /// Prepend `element`.
    pub fn push(&self, element: T) -> Self {
        Self {
            hash: cons_hash(&element, self.hash),
            head: Some(Rc::new(Cons {
                element,
                tail: self.clone(),
            })),
        }
    }

    /// Prepend `element` if `condition` holds.
    pub fn push_if(&self, condition: bool, element: T) -> Self {
        if condition {
            self.push(element)
        } else {
            self.clone()
        }
    }

    /// Split off the head.
    pub fn pop(&self) -> Result<(T, Self)> {
        match self.head.as_deref() {
            Some(cons) => Ok((cons.element.clone(), cons.tail.clone())),
            None => Err(TokenForestError::EmptyListPop),
        }
    }

    /// Split off the head if `condition` holds and the list is not empty.
    /// Otherwise returns the filler element and the list unchanged.
    pub fn pop_if(&self, condition: bool) -> (T, Self) {
        match self.head.as_deref() {
            Some(cons) if condition => (cons.element.clone(), cons.tail.clone()),
            _ => (T::default(), self.clone()),
        }
    }

    /// Clone the elements out, head first.
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }

    /// A cursor positioned at the head.
    pub fn start_iterating(&self) -> ListCursor<T> {
        ListCursor::new(self.hash, self.clone())
    }
}

impl<T: Commit> FromIterator<T> for CommitmentList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let elements: Vec<T> = iter.into_iter().collect();
        elements
            .into_iter()
            .rev()
            .fold(Self::empty(), |list, element| list.push(element))
    }
}

/// Borrowing iterator over a [`CommitmentList`].
pub struct Iter<'a, T> {
    next: Option<&'a Cons<T>>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let cons = self.next?;
        self.next = cons.tail.head.as_deref();
        Some(&cons.element)
    }
}

impl<'a, T> IntoIterator for &'a CommitmentList<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

/// A non-destructive view of a list: the whole list's hash plus the part
/// still to visit.
pub struct ListCursor<T> {
    list_hash: Fp,
    remaining: CommitmentList<T>,
}

impl<T> Clone for ListCursor<T> {
    fn clone(&self) -> Self {
        Self {
            list_hash: self.list_hash,
            remaining: self.remaining.clone(),
        }
    }
}

impl<T> Default for ListCursor<T> {
    fn default() -> Self {
        Self {
            list_hash: EMPTY_HASH,
            remaining: CommitmentList::empty(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ListCursor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListCursor")
            .field("list_hash", &self.list_hash)
            .field("remaining", &self.remaining)
            .finish()
    }
}

impl<T> ListCursor<T> {
    pub(crate) fn new(list_hash: Fp, remaining: CommitmentList<T>) -> Self {
        Self {
            list_hash,
            remaining,
        }
    }

    /// Hash of the whole list, unchanged while iterating.
    pub fn list_hash(&self) -> Fp {
        self.list_hash
    }

    /// Hash of the part still to visit.
    pub fn current_hash(&self) -> Fp {
        self.remaining.hash()
    }

    /// The elements not yet visited.
    pub fn remaining(&self) -> &CommitmentList<T> {
        &self.remaining
    }

    /// Whether every element has been visited.
    pub fn is_at_end(&self) -> bool {
        self.remaining.is_empty()
    }

    /// Skip everything left.
    pub fn jump_to_end_if(&mut self, condition: bool) {
        if condition {
            self.remaining = CommitmentList::empty();
        }
    }
}

impl<T: Commit> ListCursor<T> {
    /// Advance by one element. Yields the filler once at the end.
    pub fn next(&mut self) -> T {
        let (element, rest) = self.remaining.pop_if(true);
        self.remaining = rest;
        element
    }
}

// =============================================================================
// In-circuit representations
// =============================================================================

/// In-circuit counterpart of a [`Commit`] element.
pub trait CommitVar<D: Driver<F = Fp>>: Sized + Clone {
    type Native: Commit;

    /// Allocate unconstrained wires for a witnessed element.
    fn witness(dr: &mut D, value: Witness<D, Self::Native>) -> Result<Self>;

    /// Allocate fixed wires for a known element.
    fn constant(dr: &mut D, value: &Self::Native) -> Result<Self>;

    /// The element's node hash.
    fn commitment(&self, dr: &mut D) -> Result<WireValue<D>>;

    /// `a` if `condition` holds, else `b`.
    fn select(dr: &mut D, condition: &Boolean<D>, a: &Self, b: &Self) -> Result<Self>;

    /// The shadow element.
    fn native(&self) -> Witness<D, Self::Native>;
}

fn select_shadow<D: Driver, T: Clone>(
    condition: &Boolean<D>,
    a: &Witness<D, T>,
    b: &Witness<D, T>,
) -> Witness<D, T> {
    D::just(|| {
        if *condition.get().snag() {
            a.snag().clone()
        } else {
            b.snag().clone()
        }
    })
}

/// In-circuit [`CommitmentList`].
pub struct CommitmentListVar<D: Driver<F = Fp>, V: CommitVar<D>> {
    hash: WireValue<D>,
    shadow: Witness<D, CommitmentList<V::Native>>,
    _marker: PhantomData<fn() -> V>,
}

impl<D: Driver<F = Fp>, V: CommitVar<D>> Clone for CommitmentListVar<D, V> {
    fn clone(&self) -> Self {
        Self {
            hash: self.hash.clone(),
            shadow: self.shadow.cloned(),
            _marker: PhantomData,
        }
    }
}

impl<D: Driver<F = Fp>, V: CommitVar<D>> fmt::Debug for CommitmentListVar<D, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommitmentListVar")
            .field("hash", &self.hash)
            .finish_non_exhaustive()
    }
}

impl<D: Driver<F = Fp>, V: CommitVar<D>> CommitmentListVar<D, V> {
    /// The empty list as a constant.
    pub fn empty(dr: &mut D) -> Result<Self> {
        Self::constant(dr, &CommitmentList::empty())
    }

    /// Witness a list. Its hash is trusted until elements are popped.
    pub fn witness(dr: &mut D, list: Witness<D, CommitmentList<V::Native>>) -> Result<Self> {
        let hash = WireValue::alloc(dr, D::just(|| list.snag().hash()))?;
        Ok(Self {
            hash,
            shadow: list,
            _marker: PhantomData,
        })
    }

    /// A list fixed at synthesis time.
    pub fn constant(dr: &mut D, list: &CommitmentList<V::Native>) -> Result<Self> {
        Ok(Self {
            hash: WireValue::constant(dr, list.hash())?,
            shadow: D::just(|| list.clone()),
            _marker: PhantomData,
        })
    }

    /// The list commitment wire.
    pub fn hash(&self) -> &WireValue<D> {
        &self.hash
    }

    /// The shadow list.
    pub fn native(&self) -> Witness<D, CommitmentList<V::Native>> {
        self.shadow.cloned()
    }

    /// Whether the hash is `H0`, which is zero.
    pub fn is_empty(&self, dr: &mut D) -> Result<Boolean<D>> {
        Ok(is_zero(dr, &self.hash)?)
    }

    fn cons(&self, dr: &mut D, element: &V) -> Result<WireValue<D>> {
        let commitment = element.commitment(dr)?;
        hash_with_prefix_var(
            dr,
            <V::Native as Commit>::CONS_PREFIX,
            &[commitment, self.hash.clone()],
        )
    }

    /// Prepend `element`.
    pub fn push(&self, dr: &mut D, element: &V) -> Result<Self> {
        let hash = self.cons(dr, element)?;
        let native = element.native();
        Ok(Self {
            hash,
            shadow: D::just(|| self.shadow.snag().push(native.take())),
            _marker: PhantomData,
        })
    }

    /// Prepend `element` if `condition` holds.
    pub fn push_if(&self, dr: &mut D, condition: &Boolean<D>, element: &V) -> Result<Self> {
        let pushed = self.push(dr, element)?;
        Self::select(dr, condition, &pushed, self)
    }

    /// `a` if `condition` holds, else `b`.
    pub fn select(dr: &mut D, condition: &Boolean<D>, a: &Self, b: &Self) -> Result<Self> {
        Ok(Self {
            hash: select(dr, condition, &a.hash, &b.hash)?,
            shadow: select_shadow(condition, &a.shadow, &b.shadow),
            _marker: PhantomData,
        })
    }

    /// Split off the head, constraining `hash == cons(head, tail)`.
    ///
    /// Fails with [`TokenForestError::EmptyListPop`] when the witnessed list
    /// is empty. Guard with [`CommitmentListVar::is_empty`] or use
    /// [`CommitmentListVar::pop_if`].
    pub fn pop(&self, dr: &mut D) -> Result<(V, Self)> {
        let exhausted = D::just(|| self.shadow.snag().is_empty());
        if exhausted.into_option().unwrap_or(false) {
            return Err(TokenForestError::EmptyListPop);
        }

        let (element, tail) = self.witness_split(dr)?;
        let expected = tail.cons(dr, &element)?;
        enforce_equal(dr, &expected, &self.hash)?;
        Ok((element, tail))
    }

    /// Split off the head if `condition` holds and the list is not empty.
    /// Otherwise returns the filler and the list unchanged.
    pub fn pop_if(&self, dr: &mut D, condition: &Boolean<D>) -> Result<(V, Self)> {
        let empty = self.is_empty(dr)?;
        let non_empty = not(dr, &empty)?;
        let effective = and(dr, condition, &non_empty)?;
        self.pop_when(dr, &effective)
    }

    /// Pop under a condition that already implies the list is not empty.
    pub(crate) fn pop_when(&self, dr: &mut D, condition: &Boolean<D>) -> Result<(V, Self)> {
        let (element, tail) = self.witness_split(dr)?;
        let expected = tail.cons(dr, &element)?;
        conditional_enforce_equal(dr, condition, &expected, &self.hash)?;

        let filler = V::constant(dr, &<V::Native as Default>::default())?;
        let element = V::select(dr, condition, &element, &filler)?;
        let rest = Self::select(dr, condition, &tail, self)?;
        Ok((element, rest))
    }

    fn witness_split(&self, dr: &mut D) -> Result<(V, Self)> {
        let parts = D::just(|| self.shadow.snag().pop_if(true));
        let element = V::witness(dr, D::just(|| parts.snag().0.clone()))?;
        let tail = Self::witness(dr, D::just(|| parts.snag().1.clone()))?;
        Ok((element, tail))
    }

    /// A cursor positioned at the head.
    pub fn start_iterating(&self) -> ListCursorVar<D, V> {
        ListCursorVar {
            list_hash: self.hash.clone(),
            current: self.clone(),
        }
    }
}

/// In-circuit [`ListCursor`].
pub struct ListCursorVar<D: Driver<F = Fp>, V: CommitVar<D>> {
    list_hash: WireValue<D>,
    current: CommitmentListVar<D, V>,
}

impl<D: Driver<F = Fp>, V: CommitVar<D>> Clone for ListCursorVar<D, V> {
    fn clone(&self) -> Self {
        Self {
            list_hash: self.list_hash.clone(),
            current: self.current.clone(),
        }
    }
}

impl<D: Driver<F = Fp>, V: CommitVar<D>> ListCursorVar<D, V> {
    /// Witness a cursor. Neither hash is checked against the elements.
    pub fn witness(dr: &mut D, cursor: Witness<D, ListCursor<V::Native>>) -> Result<Self> {
        let list_hash = WireValue::alloc(dr, D::just(|| cursor.snag().list_hash()))?;
        let current =
            CommitmentListVar::witness(dr, D::just(|| cursor.snag().remaining().clone()))?;
        Ok(Self { list_hash, current })
    }

    /// A cursor fixed at synthesis time.
    pub fn constant(dr: &mut D, cursor: &ListCursor<V::Native>) -> Result<Self> {
        Ok(Self {
            list_hash: WireValue::constant(dr, cursor.list_hash())?,
            current: CommitmentListVar::constant(dr, cursor.remaining())?,
        })
    }

    /// `a` if `condition` holds, else `b`.
    pub fn select(dr: &mut D, condition: &Boolean<D>, a: &Self, b: &Self) -> Result<Self> {
        Ok(Self {
            list_hash: select(dr, condition, &a.list_hash, &b.list_hash)?,
            current: CommitmentListVar::select(dr, condition, &a.current, &b.current)?,
        })
    }

    /// Hash of the whole list.
    pub fn list_hash(&self) -> &WireValue<D> {
        &self.list_hash
    }

    /// Hash of the part still to visit.
    pub fn current_hash(&self) -> &WireValue<D> {
        self.current.hash()
    }

    /// Whether every element has been visited.
    pub fn is_at_end(&self, dr: &mut D) -> Result<Boolean<D>> {
        self.current.is_empty(dr)
    }

    /// Constrain the cursor to be exhausted.
    pub fn assert_at_end(&self, dr: &mut D) -> Result<()> {
        let at_end = self.is_at_end(dr)?;
        Ok(assert_true(dr, &at_end)?)
    }

    /// Advance by one element. Yields the filler once at the end.
    pub fn next(&mut self, dr: &mut D) -> Result<V> {
        let at_end = self.is_at_end(dr)?;
        let more = not(dr, &at_end)?;
        let (element, rest) = self.current.pop_when(dr, &more)?;
        self.current = rest;
        Ok(element)
    }

    /// Skip everything left if `condition` holds.
    pub fn jump_to_end_if(&mut self, dr: &mut D, condition: &Boolean<D>) -> Result<()> {
        let end = CommitmentListVar::empty(dr)?;
        self.current = CommitmentListVar::select(dr, condition, &end, &self.current)?;
        Ok(())
    }

    /// The shadow cursor.
    pub fn native(&self) -> Witness<D, ListCursor<V::Native>> {
        D::just(|| {
            ListCursor::new(
                *self.list_hash.value.snag(),
                self.current.shadow.snag().clone(),
            )
        })
    }
}
