//! BucketTable: power-of-two array of chained buckets.
//!
//! Records live in a `SlotMap` so every record has a stable generational
//! handle; each bucket is a singly linked chain threaded through the records
//! (`head` in the bucket array, `next` in the record). Handles survive a
//! rebuild because a rebuild only relinks chains, it never moves records.

use crate::scan_guard::ScanGuard;
use core::borrow::Borrow;
use slotmap::{DefaultKey, SlotMap};

#[derive(Clone, Debug)]
pub(crate) struct Node<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    hash: u64,
    next: Option<DefaultKey>,
}

impl<K, V> Node<K, V> {
    #[inline]
    pub(crate) fn split_mut(&mut self) -> (&K, &mut V) {
        (&self.key, &mut self.value)
    }

    #[inline]
    pub(crate) fn into_pair(self) -> (K, V) {
        (self.key, self.value)
    }
}

#[derive(Clone)]
pub(crate) struct BucketTable<K, V> {
    heads: Vec<Option<DefaultKey>>,
    nodes: SlotMap<DefaultKey, Node<K, V>>,
    len: usize,
    guard: ScanGuard,
}

impl<K, V> BucketTable<K, V> {
    /// An empty table with `buckets` chains. `buckets` must be a power of two.
    pub(crate) fn with_buckets(buckets: usize) -> Self {
        debug_assert!(buckets.is_power_of_two());
        Self {
            heads: vec![None; buckets],
            nodes: SlotMap::with_key(),
            len: 0,
            guard: ScanGuard::new(),
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        debug_assert_eq!(self.len, self.nodes.len());
        self.len
    }

    #[inline]
    pub(crate) fn bucket_count(&self) -> usize {
        self.heads.len()
    }

    #[inline]
    pub(crate) fn bucket_of(&self, hash: u64) -> usize {
        (hash as usize) & (self.heads.len() - 1)
    }

    #[inline]
    pub(crate) fn head(&self, bucket: usize) -> Option<DefaultKey> {
        self.heads[bucket]
    }

    #[inline]
    pub(crate) fn node(&self, k: DefaultKey) -> Option<&Node<K, V>> {
        self.nodes.get(k)
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, k: DefaultKey) -> Option<&mut Node<K, V>> {
        self.nodes.get_mut(k)
    }

    /// Successor of `k` within its bucket. Outer `None` when `k` is stale,
    /// inner `None` when `k` is the bucket's last record.
    #[inline]
    pub(crate) fn next_in_bucket(&self, k: DefaultKey) -> Option<Option<DefaultKey>> {
        self.nodes.get(k).map(|n| n.next)
    }

    /// Index of the first non-empty bucket at or after `from`.
    pub(crate) fn first_occupied(&self, from: usize) -> Option<usize> {
        let from = from.min(self.heads.len());
        self.heads[from..]
            .iter()
            .position(Option::is_some)
            .map(|i| from + i)
    }

    /// Linear scan of the bucket for `hash`. Returns the bucket index and the
    /// matching record's handle.
    pub(crate) fn find<Q>(&self, hash: u64, q: &Q) -> Option<(usize, DefaultKey)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let _g = self.guard.enter();
        let bucket = self.bucket_of(hash);
        let mut cur = self.heads[bucket];
        while let Some(k) = cur {
            let n = &self.nodes[k];
            if n.hash == hash && n.key.borrow() == q {
                return Some((bucket, k));
            }
            cur = n.next;
        }
        None
    }

    /// Place a record at the front of its bucket without checking for a
    /// duplicate. Callers must have established that `key` is absent.
    pub(crate) fn push_front(&mut self, hash: u64, key: K, value: V) -> (usize, DefaultKey) {
        let bucket = self.bucket_of(hash);
        let next = self.heads[bucket];
        let k = self.nodes.insert(Node {
            key,
            value,
            hash,
            next,
        });
        self.heads[bucket] = Some(k);
        self.len += 1;
        (bucket, k)
    }

    /// Insert unless an equal key is already present. An existing record is
    /// left untouched and the offered pair is handed back.
    pub(crate) fn insert(
        &mut self,
        hash: u64,
        key: K,
        value: V,
    ) -> Result<(usize, DefaultKey), (K, V)>
    where
        K: Eq,
    {
        if self.find(hash, &key).is_some() {
            return Err((key, value));
        }
        Ok(self.push_front(hash, key, value))
    }

    /// Unlink and return the record whose key equals `q`; no-op when absent.
    pub(crate) fn remove<Q>(&mut self, hash: u64, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let (bucket, prev, k) = {
            let _g = self.guard.enter();
            let bucket = self.bucket_of(hash);
            let mut prev: Option<DefaultKey> = None;
            let mut cur = self.heads[bucket];
            loop {
                let k = cur?;
                let n = &self.nodes[k];
                if n.hash == hash && n.key.borrow() == q {
                    break (bucket, prev, k);
                }
                prev = Some(k);
                cur = n.next;
            }
        };

        let node = self.nodes.remove(k)?;
        match prev {
            Some(p) => self.nodes[p].next = node.next,
            None => self.heads[bucket] = node.next,
        }
        self.len -= 1;
        Some((node.key, node.value))
    }

    /// Reallocate the bucket array at `buckets` chains and relink every
    /// record listed in `order`, front-inserting each in turn by its stored
    /// hash. `order` must list every record exactly once. Returns the lowest
    /// occupied bucket index, or `buckets - 1` for an empty table.
    pub(crate) fn rebuild(&mut self, buckets: usize, order: &[DefaultKey]) -> usize {
        debug_assert!(buckets.is_power_of_two());
        debug_assert_eq!(order.len(), self.nodes.len());

        for head in self.heads.iter_mut() {
            *head = None;
        }
        self.heads.resize(buckets, None);

        let mut lowest = buckets - 1;
        for &k in order {
            let bucket = (self.nodes[k].hash as usize) & (buckets - 1);
            self.nodes[k].next = self.heads[bucket];
            self.heads[bucket] = Some(k);
            lowest = lowest.min(bucket);
        }
        lowest
    }

    /// Record handles in bucket order starting at `from`.
    pub(crate) fn keys_in_order(&self, from: usize) -> Vec<DefaultKey> {
        let mut out = Vec::with_capacity(self.len);
        for &head in &self.heads[from.min(self.heads.len())..] {
            let mut cur = head;
            while let Some(k) = cur {
                out.push(k);
                cur = self.nodes[k].next;
            }
        }
        out
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut SlotMap<DefaultKey, Node<K, V>> {
        &mut self.nodes
    }

    pub(crate) fn into_nodes(self) -> SlotMap<DefaultKey, Node<K, V>> {
        self.nodes
    }
}
