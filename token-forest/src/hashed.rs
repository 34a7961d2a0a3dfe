//! Values paired with a cached commitment.

use core::marker::PhantomData;

use pasta_curves::Fp;
use ragu::gadgets::{enforce_equal, select, Boolean};
use ragu::{Driver, Maybe, WireValue, Witness};

use crate::error::Result;
use crate::hash::{hash_with_prefix, hash_with_prefix_var, Prefix};

/// A value with a canonical, domain-separated hash.
pub trait Hashable: Clone {
    /// Domain separator of the canonical hash.
    const PREFIX: Prefix;

    /// The hashed encoding.
    fn to_fields(&self) -> Vec<Fp>;

    fn canonical_hash(&self) -> Fp {
        hash_with_prefix(Self::PREFIX, &self.to_fields())
    }
}

/// In-circuit counterpart of a [`Hashable`] value.
pub trait HashableVar<D: Driver<F = Fp>>: Sized + Clone {
    type Native: Hashable;

    /// Allocate unconstrained wires for a witnessed value.
    fn witness(dr: &mut D, value: Witness<D, Self::Native>) -> Result<Self>;

    fn constant(dr: &mut D, value: &Self::Native) -> Result<Self>;

    /// Wires in the order of [`Hashable::to_fields`].
    fn fields(&self) -> Vec<WireValue<D>>;

    fn select(dr: &mut D, condition: &Boolean<D>, a: &Self, b: &Self) -> Result<Self>;

    fn native(&self) -> Witness<D, Self::Native>;

    fn canonical_hash(&self, dr: &mut D) -> Result<WireValue<D>> {
        hash_with_prefix_var(dr, <Self::Native as Hashable>::PREFIX, &self.fields())
    }
}

/// A value together with its commitment.
#[derive(Debug, Clone, PartialEq)]
pub struct Hashed<T> {
    hash: Fp,
    value: T,
}

impl<T: Hashable> Hashed<T> {
    /// Hash `value` and cache the commitment.
    pub fn hash(value: T) -> Self {
        Self {
            hash: value.canonical_hash(),
            value,
        }
    }

    /// Pair a value with a precomputed commitment. The pair is not checked.
    pub(crate) fn from_parts(hash: Fp, value: T) -> Self {
        Self { hash, value }
    }

    /// The cached commitment.
    pub fn commitment(&self) -> Fp {
        self.hash
    }

    /// The committed value.
    pub fn unhash(&self) -> &T {
        &self.value
    }

    /// Drop the commitment.
    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T: Hashable + Default> Default for Hashed<T> {
    fn default() -> Self {
        Self::hash(T::default())
    }
}

/// In-circuit [`Hashed`]: a commitment wire and the witnessed value behind it.
///
/// Nothing ties the value to the commitment until [`HashedVar::unhash_checked`]
/// is called or the caller hashes the revealed wires itself.
pub struct HashedVar<D: Driver<F = Fp>, V: HashableVar<D>> {
    hash: WireValue<D>,
    value: Witness<D, V::Native>,
    _marker: PhantomData<fn() -> V>,
}

impl<D: Driver<F = Fp>, V: HashableVar<D>> Clone for HashedVar<D, V> {
    fn clone(&self) -> Self {
        Self {
            hash: self.hash.clone(),
            value: self.value.cloned(),
            _marker: PhantomData,
        }
    }
}

impl<D: Driver<F = Fp>, V: HashableVar<D>> HashedVar<D, V> {
    /// Hash `value` in-circuit.
    pub fn hash(dr: &mut D, value: &V) -> Result<Self> {
        Ok(Self {
            hash: value.canonical_hash(dr)?,
            value: value.native(),
            _marker: PhantomData,
        })
    }

    /// Witness both the commitment and the value.
    pub fn witness(dr: &mut D, value: Witness<D, Hashed<V::Native>>) -> Result<Self> {
        let hash = WireValue::alloc(dr, D::just(|| value.snag().commitment()))?;
        Ok(Self {
            hash,
            value: D::just(|| value.snag().unhash().clone()),
            _marker: PhantomData,
        })
    }

    /// A commitment fixed at synthesis time.
    pub fn constant(dr: &mut D, value: &Hashed<V::Native>) -> Result<Self> {
        Ok(Self {
            hash: WireValue::constant(dr, value.commitment())?,
            value: D::just(|| value.unhash().clone()),
            _marker: PhantomData,
        })
    }

    /// The commitment wire.
    pub fn commitment(&self) -> &WireValue<D> {
        &self.hash
    }

    /// Reveal the value as fresh, unconstrained wires.
    pub fn unhash(&self, dr: &mut D) -> Result<V> {
        V::witness(dr, self.value.cloned())
    }

    /// Reveal the value and constrain its canonical hash to the commitment.
    pub fn unhash_checked(&self, dr: &mut D) -> Result<V> {
        let value = self.unhash(dr)?;
        let hash = value.canonical_hash(dr)?;
        enforce_equal(dr, &hash, &self.hash)?;
        Ok(value)
    }

    /// `a` if `condition` holds, else `b`.
    pub fn select(dr: &mut D, condition: &Boolean<D>, a: &Self, b: &Self) -> Result<Self> {
        let hash = select(dr, condition, &a.hash, &b.hash)?;
        let value = D::just(|| {
            if *condition.get().snag() {
                a.value.snag().clone()
            } else {
                b.value.snag().clone()
            }
        });
        Ok(Self {
            hash,
            value,
            _marker: PhantomData,
        })
    }

    /// The shadow value with its commitment.
    pub fn native(&self) -> Witness<D, Hashed<V::Native>> {
        D::just(|| Hashed::from_parts(*self.hash.value.snag(), self.value.snag().clone()))
    }
}
