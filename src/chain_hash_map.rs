//! ChainHashMap: public facade over the bucket table, growth policy and hasher.

use crate::bucket_table::BucketTable;
use crate::cursor::Cursor;
use crate::error::NotFound;
use crate::iter::{IntoIter, Iter, IterMut, Keys, Values, ValuesMut};
use crate::policy::GrowthPolicy;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::ops::Index;
use std::collections::hash_map::RandomState;

/// A map from unique keys to mutable values, stored in chained buckets.
///
/// **Insert never updates.** [`insert`](Self::insert) of a key that is
/// already present leaves the stored value as it was and returns `false`.
/// Use [`get_mut`](Self::get_mut), [`get_or_default`](Self::get_or_default)
/// or a cursor's [`value_mut`](Cursor::value_mut) to change a value.
///
/// Iteration order is bucket order, most recently inserted first within a
/// bucket. It is not sorted and changes when the table grows.
#[derive(Clone)]
pub struct ChainHashMap<K, V, S = RandomState> {
    hasher: S,
    policy: GrowthPolicy,
    pub(crate) table: BucketTable<K, V>,
    // No occupied bucket sits below this index.
    pub(crate) maybe_begin: usize,
    // Bumped by every rebuild and clear; cursors from older generations are stale.
    pub(crate) generation: u64,
}

impl<K, V> ChainHashMap<K, V, RandomState> {
    pub fn new() -> Self {
        Self::with_hasher(RandomState::new())
    }

    pub fn with_policy(policy: GrowthPolicy) -> Self {
        Self::with_hasher_and_policy(RandomState::new(), policy)
    }
}

impl<K, V, S: Default> Default for ChainHashMap<K, V, S> {
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K, V, S> ChainHashMap<K, V, S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_hasher_and_policy(hasher, GrowthPolicy::default())
    }

    pub fn with_hasher_and_policy(hasher: S, policy: GrowthPolicy) -> Self {
        let buckets = policy.initial_buckets();
        Self {
            hasher,
            policy,
            table: BucketTable::with_buckets(buckets),
            maybe_begin: buckets - 1,
            generation: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.len() == 0
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    pub fn policy(&self) -> &GrowthPolicy {
        &self.policy
    }

    /// Current length of the bucket array. Always a power of two.
    pub fn bucket_count(&self) -> usize {
        self.table.bucket_count()
    }

    pub fn load_factor(&self) -> f64 {
        self.len() as f64 / self.bucket_count() as f64
    }

    /// Drop every record and return to the initial bucket count.
    /// Outstanding cursors become stale.
    pub fn clear(&mut self) {
        tracing::trace!(records = self.len(), "clearing map");
        let buckets = self.policy.initial_buckets();
        self.table = BucketTable::with_buckets(buckets);
        self.maybe_begin = buckets - 1;
        self.generation = self.generation.wrapping_add(1);
    }

    pub fn iter(&self) -> Iter<'_, K, V, S> {
        Iter::new(self)
    }

    /// Mutable iteration in the same order as [`iter`](Self::iter).
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        let start = self.begin_mut().bucket;
        let order = self.table.keys_in_order(start);
        IterMut::new(order, self.table.nodes_mut())
    }

    pub fn keys(&self) -> Keys<'_, K, V, S> {
        Keys { inner: self.iter() }
    }

    pub fn values(&self) -> Values<'_, K, V, S> {
        Values { inner: self.iter() }
    }

    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            inner: self.iter_mut(),
        }
    }

    // Rebuild when the policy says so. Runs after every insert and erase.
    fn grow_if_needed(&mut self) {
        let from = self.table.bucket_count();
        let Some(to) = self.policy.grow_to(self.table.len(), from) else {
            return;
        };
        tracing::debug!(from, to, records = self.len(), "rebuilding bucket table");

        let order = self.table.keys_in_order(self.maybe_begin);
        self.maybe_begin = self.table.rebuild(to, &order);
        self.generation = self.generation.wrapping_add(1);
    }
}

impl<K, V, S> ChainHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// Build a map with `hasher` and insert every pair from `iter`. When a
    /// key repeats, the first occurrence wins.
    pub fn from_iter_with_hasher<I>(iter: I, hasher: S) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let mut map = Self::with_hasher(hasher);
        map.extend(iter);
        map
    }

    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    /// Insert `key -> value` if `key` is absent and return `true`.
    ///
    /// If `key` is already present nothing changes: the stored value is
    /// kept, `value` is dropped and `false` is returned.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        let hash = self.make_hash(&key);
        let inserted = match self.table.insert(hash, key, value) {
            Ok((bucket, _)) => {
                self.maybe_begin = self.maybe_begin.min(bucket);
                true
            }
            Err(_) => {
                tracing::trace!("insert ignored, key already present");
                false
            }
        };
        self.grow_if_needed();
        inserted
    }

    /// Remove the record for `q` and return its value. Removing an absent
    /// key is a no-op. The table never shrinks.
    pub fn remove<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove_entry(q).map(|(_, v)| v)
    }

    pub fn remove_entry<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        let removed = self.table.remove(hash, q);
        self.grow_if_needed();
        removed
    }

    /// Cursor at the record for `q`, or [`end`](Self::end) when absent.
    pub fn find<Q>(&self, q: &Q) -> Cursor
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        match self.table.find(hash, q) {
            Some((bucket, node)) => self.cursor_at(bucket, node),
            None => self.end(),
        }
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        self.table.find(hash, q).is_some()
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get_key_value(q).map(|(_, v)| v)
    }

    pub fn get_key_value<Q>(&self, q: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        let (_, node) = self.table.find(hash, q)?;
        self.table.node(node).map(|n| (&n.key, &n.value))
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        let (_, node) = self.table.find(hash, q)?;
        self.table.node_mut(node).map(|n| &mut n.value)
    }

    /// Checked lookup: the value for `q`, or [`NotFound`].
    pub fn at<Q>(&self, q: &Q) -> Result<&V, NotFound>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get(q).ok_or(NotFound)
    }

    /// Mutable access to the value for `key`, inserting `V::default()` first
    /// when the key is absent.
    pub fn get_or_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        let hash = self.make_hash(&key);
        let node = match self.table.find(hash, &key) {
            Some((_, node)) => node,
            None => {
                let (bucket, node) = self.table.push_front(hash, key, V::default());
                self.maybe_begin = self.maybe_begin.min(bucket);
                // Record handles survive a rebuild.
                self.grow_if_needed();
                node
            }
        };
        &mut self
            .table
            .node_mut(node)
            .expect("record must exist right after lookup or insert")
            .value
    }
}

impl<K, V, S> Extend<(K, V)> for ChainHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// Inserts each pair with [`insert`](ChainHashMap::insert) semantics:
    /// keys already in the map, or seen earlier in `iter`, keep their value.
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for ChainHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_iter_with_hasher(iter, S::default())
    }
}

impl<K, V, S, const N: usize> From<[(K, V); N]> for ChainHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from(arr: [(K, V); N]) -> Self {
        Self::from_iter(arr)
    }
}

impl<K, Q, V, S> Index<&Q> for ChainHashMap<K, V, S>
where
    K: Eq + Hash + Borrow<Q>,
    Q: ?Sized + Eq + Hash,
    S: BuildHasher,
{
    type Output = V;

    /// # Panics
    ///
    /// Panics if the key is not present.
    fn index(&self, key: &Q) -> &V {
        self.get(key).expect("no entry found for key")
    }
}

impl<K, V, S> PartialEq for ChainHashMap<K, V, S>
where
    K: Eq + Hash,
    V: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(k, v)| other.get(k).map_or(false, |ov| v == ov))
    }
}

impl<K, V, S> Eq for ChainHashMap<K, V, S>
where
    K: Eq + Hash,
    V: Eq,
    S: BuildHasher,
{
}

impl<K, V, S> fmt::Debug for ChainHashMap<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, K, V, S> IntoIterator for &'a ChainHashMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a mut ChainHashMap<K, V, S> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<K, V, S> IntoIterator for ChainHashMap<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        let order = self.table.keys_in_order(self.maybe_begin);
        IntoIter::new(order, self.table.into_nodes())
    }
}
