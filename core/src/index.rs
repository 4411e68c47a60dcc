use alloc::vec::Vec;
use core::{fmt::Debug, iter::Enumerate, marker::PhantomData, ops};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ERRORS
// ================================================================================================

/// Error returned when an arena cannot hand out another handle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexedVecError {
    /// The arena already holds as many items as its handle type can address.
    #[error("arena is full: handle space of {0} items exhausted")]
    TooManyItems(usize),
}

// HANDLES
// ================================================================================================

/// A dense, 0-based, `u32`-backed handle into an [IndexVec].
pub trait Idx: Copy + Eq + Ord + Debug + From<u32> + Into<u32> {
    #[inline]
    fn to_usize(self) -> usize {
        self.into() as usize
    }
}

/// Declares an opaque handle type implementing [Idx].
///
/// Handles print as `Name(n)` in debug output and as `#n` otherwise.
#[macro_export]
macro_rules! newtype_id {
    ($(#[$attr:meta])* $name:ident) => {
        $(#[$attr])*
        #[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Returns the raw position of this handle in its arena.
            #[inline]
            pub const fn as_u32(self) -> u32 {
                self.0
            }
        }

        impl core::fmt::Debug for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "#{}", self.0)
            }
        }

        impl From<u32> for $name {
            fn from(v: u32) -> Self {
                Self(v)
            }
        }

        impl From<$name> for u32 {
            fn from(v: $name) -> Self {
                v.0
            }
        }

        impl $crate::index::Idx for $name {}
    };
}

// INDEX VEC
// ================================================================================================

/// An append-only arena addressed by a typed handle.
///
/// Items are never removed, so a handle stays valid for the lifetime of the arena.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IndexVec<I: Idx, T> {
    raw: Vec<T>,
    #[cfg_attr(feature = "serde", serde(skip))]
    _m: PhantomData<I>,
}

impl<I: Idx, T> Default for IndexVec<I, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: Idx, T> IndexVec<I, T> {
    #[inline]
    pub fn new() -> Self {
        Self { raw: Vec::new(), _m: PhantomData }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Appends `item` and returns its handle.
    ///
    /// Fails once the arena holds `u32::MAX` items.
    pub fn push(&mut self, item: T) -> Result<I, IndexedVecError> {
        let next = self.raw.len();
        if next >= u32::MAX as usize {
            return Err(IndexedVecError::TooManyItems(next));
        }
        self.raw.push(item);
        Ok(I::from(next as u32))
    }

    /// Returns the handle the next call to [Self::push] would produce.
    #[inline]
    pub fn next_id(&self) -> I {
        I::from(self.raw.len() as u32)
    }

    #[inline]
    pub fn contains_id(&self, idx: I) -> bool {
        idx.to_usize() < self.raw.len()
    }

    #[inline]
    pub fn get(&self, idx: I) -> Option<&T> {
        self.raw.get(idx.to_usize())
    }

    #[inline]
    pub fn get_mut(&mut self, idx: I) -> Option<&mut T> {
        self.raw.get_mut(idx.to_usize())
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.raw
    }

    pub fn iter(&self) -> core::slice::Iter<'_, T> {
        self.raw.iter()
    }

    /// Iterates `(handle, item)` pairs in allocation order.
    pub fn iter_enumerated(&self) -> EnumeratedIter<'_, I, T> {
        EnumeratedIter { inner: self.raw.iter().enumerate(), _m: PhantomData }
    }

    /// Iterates every handle in allocation order.
    pub fn ids(&self) -> impl DoubleEndedIterator<Item = I> + ExactSizeIterator + use<I, T> {
        (0..self.raw.len() as u32).map(I::from)
    }
}

impl<I: Idx, T> ops::Index<I> for IndexVec<I, T> {
    type Output = T;

    #[inline]
    fn index(&self, index: I) -> &Self::Output {
        &self.raw[index.to_usize()]
    }
}

impl<I: Idx, T> ops::IndexMut<I> for IndexVec<I, T> {
    #[inline]
    fn index_mut(&mut self, index: I) -> &mut Self::Output {
        &mut self.raw[index.to_usize()]
    }
}

impl<'a, I: Idx, T> IntoIterator for &'a IndexVec<I, T> {
    type Item = &'a T;
    type IntoIter = core::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator returned by [IndexVec::iter_enumerated].
pub struct EnumeratedIter<'a, I, T> {
    inner: Enumerate<core::slice::Iter<'a, T>>,
    _m: PhantomData<I>,
}

impl<'a, I: Idx, T> Iterator for EnumeratedIter<'a, I, T> {
    type Item = (I, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(i, item)| (I::from(i as u32), item))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

// DENSE ID MAP
// ================================================================================================

/// A sparse-tolerant map from one handle space to another, stored densely.
///
/// Lookups and removals are O(1); the backing storage grows to the largest key inserted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DenseIdMap<K: Idx, V: Idx> {
    slots: Vec<Option<V>>,
    len: usize,
    _m: PhantomData<K>,
}

impl<K: Idx, V: Idx> Default for DenseIdMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Idx, V: Idx> DenseIdMap<K, V> {
    pub fn new() -> Self {
        Self { slots: Vec::new(), len: 0, _m: PhantomData }
    }

    /// Creates a map with room for `capacity` keys before reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
            len: 0,
            _m: PhantomData,
        }
    }

    /// Maps `key` to `value`, returning the previous value if there was one.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let idx = key.to_usize();
        if idx >= self.slots.len() {
            self.slots.resize(idx + 1, None);
        }
        let prev = self.slots[idx].replace(value);
        if prev.is_none() {
            self.len += 1;
        }
        prev
    }

    #[inline]
    pub fn get(&self, key: K) -> Option<V> {
        self.slots.get(key.to_usize()).copied().flatten()
    }

    #[inline]
    pub fn contains_key(&self, key: K) -> bool {
        self.get(key).is_some()
    }

    pub fn remove(&mut self, key: K) -> Option<V> {
        let prev = self.slots.get_mut(key.to_usize()).and_then(Option::take);
        if prev.is_some() {
            self.len -= 1;
        }
        prev
    }

    /// Removes every entry whose value is `value`, returning the keys that were unmapped.
    pub fn remove_value(&mut self, value: V) -> Vec<K> {
        let mut removed = Vec::new();
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if *slot == Some(value) {
                *slot = None;
                removed.push(K::from(i as u32));
            }
        }
        self.len -= removed.len();
        removed
    }

    /// Number of mapped keys.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterates the mapped `(key, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (K, V)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.map(|v| (K::from(i as u32), v)))
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::{String, ToString};

    use proptest::prelude::*;

    use super::*;

    newtype_id!(TestId);
    newtype_id!(OtherId);

    #[test]
    fn index_vec_hands_out_sequential_ids() {
        let mut arena = IndexVec::<TestId, String>::new();
        let a = arena.push("a".to_string()).unwrap();
        let b = arena.push("b".to_string()).unwrap();

        assert_eq!(a, TestId::from(0));
        assert_eq!(b, TestId::from(1));
        assert_eq!(arena.next_id(), TestId::from(2));
        assert_eq!(&arena[b], "b");
        assert!(arena.get(TestId::from(2)).is_none());
        assert_eq!(
            arena.iter_enumerated().map(|(id, s)| (id, s.as_str())).collect::<Vec<_>>(),
            vec![(a, "a"), (b, "b")]
        );
    }

    #[test]
    fn dense_map_tracks_len_across_remove() {
        let mut map = DenseIdMap::<TestId, OtherId>::new();
        assert_eq!(map.insert(TestId::from(4), OtherId::from(1)), None);
        assert_eq!(map.insert(TestId::from(4), OtherId::from(2)), Some(OtherId::from(1)));
        map.insert(TestId::from(0), OtherId::from(2));
        assert_eq!(map.len(), 2);

        let removed = map.remove_value(OtherId::from(2));
        assert_eq!(removed, vec![TestId::from(0), TestId::from(4)]);
        assert!(map.is_empty());
        assert_eq!(map.remove(TestId::from(9)), None);
    }

    #[test]
    fn handle_display_is_compact() {
        assert_eq!(TestId::from(7).to_string(), "#7");
        assert_eq!(alloc::format!("{:?}", TestId::from(7)), "TestId(7)");
    }

    proptest! {
        #[test]
        fn dense_map_agrees_with_btree(
            ops in prop::collection::vec((0u32..32, 0u32..8, any::<bool>()), 0..64),
        ) {
            let mut map = DenseIdMap::<TestId, OtherId>::new();
            let mut model = alloc::collections::BTreeMap::new();
            for (k, v, insert) in ops {
                if insert {
                    prop_assert_eq!(
                        map.insert(TestId::from(k), OtherId::from(v)),
                        model.insert(k, OtherId::from(v))
                    );
                } else {
                    prop_assert_eq!(map.remove(TestId::from(k)), model.remove(&k));
                }
                prop_assert_eq!(map.len(), model.len());
            }
            let pairs: Vec<_> = map.iter().map(|(k, v)| (u32::from(k), v)).collect();
            let expected: Vec<_> = model.into_iter().collect();
            prop_assert_eq!(pairs, expected);
        }
    }
}
