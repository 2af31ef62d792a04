//! Cursor: a detached position in a `ChainHashMap`.
//!
//! A cursor is `(bucket, record)` plus the table generation it was taken in.
//! It borrows nothing; every access goes back through the map, which checks
//! that the cursor still describes the current table.

use crate::bucket_table::Node;
use crate::chain_hash_map::ChainHashMap;
use slotmap::DefaultKey;

/// Position of a record in a [`ChainHashMap`], or the end-marker.
///
/// The end-marker is the tail of the last bucket. Advancing past the last
/// record always lands on that one position, so `c == map.end()` is a
/// reliable termination test, and on an empty map `map.begin() == map.end()`.
///
/// A cursor goes stale when the table is rebuilt by growth, when the map is
/// cleared, or when its own record is removed. A stale cursor resolves to
/// `None` and advances to the end-marker. Inserts that do not trigger growth
/// and removals of other records leave it valid.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Cursor {
    pub(crate) bucket: usize,
    pub(crate) node: Option<DefaultKey>,
    pub(crate) generation: u64,
}

impl Cursor {
    /// True for the end-marker.
    #[inline]
    pub fn is_end(&self) -> bool {
        self.node.is_none()
    }

    /// Bucket index this cursor points into.
    #[inline]
    pub fn bucket(&self) -> usize {
        self.bucket
    }

    pub fn key<'a, K, V, S>(&self, map: &'a ChainHashMap<K, V, S>) -> Option<&'a K> {
        map.resolve(*self).map(|n| &n.key)
    }

    pub fn value<'a, K, V, S>(&self, map: &'a ChainHashMap<K, V, S>) -> Option<&'a V> {
        map.resolve(*self).map(|n| &n.value)
    }

    pub fn value_mut<'a, K, V, S>(
        &self,
        map: &'a mut ChainHashMap<K, V, S>,
    ) -> Option<&'a mut V> {
        map.resolve_mut(*self).map(|n| &mut n.value)
    }

    /// The record under the cursor; `None` at the end-marker or when stale.
    pub fn record<'a, K, V, S>(
        &self,
        map: &'a ChainHashMap<K, V, S>,
    ) -> Option<(&'a K, &'a V)> {
        map.resolve(*self).map(|n| (&n.key, &n.value))
    }

    /// The next position in iteration order.
    pub fn advance<K, V, S>(self, map: &ChainHashMap<K, V, S>) -> Cursor {
        map.advance(self)
    }
}

impl<K, V, S> ChainHashMap<K, V, S> {
    /// Cursor at the first record, or the end-marker when empty.
    ///
    /// Scans forward from the cached first-occupied lower bound without
    /// updating it, so it agrees with [`begin_mut`](Self::begin_mut).
    pub fn begin(&self) -> Cursor {
        match self.table.first_occupied(self.maybe_begin) {
            Some(bucket) => self.head_cursor(bucket),
            None => self.end(),
        }
    }

    /// Like [`begin`](Self::begin), and also tightens the cached lower bound
    /// to the bucket found.
    pub fn begin_mut(&mut self) -> Cursor {
        let c = self.begin();
        self.maybe_begin = c.bucket;
        c
    }

    /// The end-marker: tail of the last bucket.
    pub fn end(&self) -> Cursor {
        Cursor {
            bucket: self.table.bucket_count() - 1,
            node: None,
            generation: self.generation,
        }
    }

    pub(crate) fn cursor_at(&self, bucket: usize, node: DefaultKey) -> Cursor {
        Cursor {
            bucket,
            node: Some(node),
            generation: self.generation,
        }
    }

    fn head_cursor(&self, bucket: usize) -> Cursor {
        match self.table.head(bucket) {
            Some(node) => self.cursor_at(bucket, node),
            None => self.end(),
        }
    }

    pub(crate) fn resolve(&self, c: Cursor) -> Option<&Node<K, V>> {
        if c.generation != self.generation {
            return None;
        }
        self.table.node(c.node?)
    }

    pub(crate) fn resolve_mut(&mut self, c: Cursor) -> Option<&mut Node<K, V>> {
        if c.generation != self.generation {
            return None;
        }
        self.table.node_mut(c.node?)
    }

    pub(crate) fn advance(&self, c: Cursor) -> Cursor {
        if c.generation != self.generation {
            return self.end();
        }
        let Some(node) = c.node else {
            return self.end();
        };
        match self.table.next_in_bucket(node) {
            // Stale record handle.
            None => self.end(),
            Some(Some(next)) => self.cursor_at(c.bucket, next),
            Some(None) => {
                let last = self.table.bucket_count() - 1;
                if c.bucket >= last {
                    return self.end();
                }
                match self.table.first_occupied(c.bucket + 1) {
                    Some(bucket) => self.head_cursor(bucket),
                    None => self.end(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{ChainHashMap, GrowthPolicy};
    use core::hash::{BuildHasher, Hasher};

    // Hashes a u64 key to itself so bucket placement is predictable.
    #[derive(Clone, Default)]
    struct IdentityBuildHasher;
    struct IdentityHasher(u64);
    impl BuildHasher for IdentityBuildHasher {
        type Hasher = IdentityHasher;
        fn build_hasher(&self) -> Self::Hasher {
            IdentityHasher(0)
        }
    }
    impl Hasher for IdentityHasher {
        fn write(&mut self, bytes: &[u8]) {
            for &b in bytes {
                self.0 = (self.0 << 8) | b as u64;
            }
        }
        fn write_u64(&mut self, n: u64) {
            self.0 = n;
        }
        fn finish(&self) -> u64 {
            self.0
        }
    }

    fn identity_map() -> ChainHashMap<u64, &'static str, IdentityBuildHasher> {
        ChainHashMap::with_hasher(IdentityBuildHasher)
    }

    /// Invariant: on an empty map begin and end coincide, through both the
    /// read-only and the caching entry point.
    #[test]
    fn empty_map_begin_is_end() {
        let mut m = identity_map();
        assert_eq!(m.begin(), m.end());
        assert_eq!(m.begin_mut(), m.end());
        assert!(m.end().is_end());
        assert_eq!(m.end().bucket(), 127);
    }

    /// Invariant: advancing walks buckets in index order, records within a
    /// bucket most-recent-first, and ends on the canonical end-marker.
    #[test]
    fn advance_walks_buckets_in_order() {
        let mut m = identity_map();
        m.insert(3, "a");
        m.insert(3 + 128, "b");
        m.insert(90, "c");
        m.insert(127, "d");

        let mut seen = Vec::new();
        let mut c = m.begin();
        while c != m.end() {
            seen.push(*c.value(&m).unwrap());
            c = c.advance(&m);
        }
        assert_eq!(seen, vec!["b", "a", "c", "d"]);
        assert_eq!(c, m.end());
        // Advancing the end-marker stays there.
        assert_eq!(c.advance(&m), m.end());
    }

    /// Invariant: the read-only begin never moves the cache, yet both entry
    /// points resolve to the same record.
    #[test]
    fn begin_and_begin_mut_agree() {
        let mut m = identity_map();
        m.insert(40, "x");
        m.insert(10, "y");
        m.remove(&10);
        let before = m.maybe_begin;
        let c1 = m.begin();
        assert_eq!(m.maybe_begin, before);
        let c2 = m.begin_mut();
        assert_eq!(c1, c2);
        assert_eq!(m.maybe_begin, 40);
        assert_eq!(c2.key(&m), Some(&40));
    }

    /// Invariant: the cached lower bound never sits above an occupied bucket.
    #[test]
    fn cache_is_lowered_by_insert() {
        let mut m = identity_map();
        m.insert(100, "x");
        let _ = m.begin_mut();
        assert_eq!(m.maybe_begin, 100);
        m.insert(5, "y");
        assert_eq!(m.maybe_begin, 5);
        assert_eq!(m.begin().key(&m), Some(&5));
    }

    /// Invariant: a cursor survives inserts into other buckets and removal of
    /// other records, and goes stale when its own record is removed.
    #[test]
    fn cursor_invalidation_rules() {
        let mut m = identity_map();
        m.insert(1, "one");
        m.insert(2, "two");
        let c = m.find(&1);
        m.insert(50, "fifty");
        m.remove(&2);
        assert_eq!(c.value(&m), Some(&"one"));

        m.remove(&1);
        assert_eq!(c.value(&m), None);
        assert_eq!(c.advance(&m), m.end());
    }

    /// Invariant: a rebuild makes every older cursor stale, including the
    /// old end-marker.
    #[test]
    fn growth_makes_cursors_stale() {
        let mut m = identity_map();
        for k in 0..127 {
            m.insert(k, "v");
        }
        let c = m.find(&7);
        let old_end = m.end();
        assert_eq!(m.bucket_count(), 128);
        m.insert(127, "v");
        assert_eq!(m.bucket_count(), 512);
        assert_eq!(c.value(&m), None);
        assert_ne!(old_end, m.end());
        assert_eq!(m.find(&7).value(&m), Some(&"v"));
    }

    /// Invariant: after a rebuild the cache points at the lowest occupied
    /// bucket of the new table.
    #[test]
    fn rebuild_resets_cache_to_lowest_reinserted_bucket() {
        let policy = GrowthPolicy::new().with_initial_buckets(4);
        let mut m: ChainHashMap<u64, u64, IdentityBuildHasher> =
            ChainHashMap::with_hasher_and_policy(IdentityBuildHasher, policy);
        for k in [9u64, 10, 11, 12] {
            m.insert(k, k);
        }
        assert_eq!(m.bucket_count(), 16);
        assert_eq!(m.maybe_begin, 9);
        assert_eq!(m.begin().key(&m), Some(&9));
    }

    /// Invariant: `value_mut` through a cursor writes the stored value.
    #[test]
    fn value_mut_through_cursor() {
        let mut m = identity_map();
        m.insert(8, "old");
        let c = m.find(&8);
        *c.value_mut(&mut m).unwrap() = "new";
        assert_eq!(m.at(&8), Ok(&"new"));
        assert_eq!(c.record(&m), Some((&8, &"new")));
    }
}
