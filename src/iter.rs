//! Iterators over a `ChainHashMap`, all in bucket order.

use crate::bucket_table::Node;
use crate::chain_hash_map::ChainHashMap;
use crate::cursor::Cursor;
use core::iter::FusedIterator;
use slotmap::{DefaultKey, SecondaryMap, SlotMap};

/// Iterator over `(&K, &V)`, driven by the map's cursor protocol.
pub struct Iter<'a, K, V, S> {
    map: &'a ChainHashMap<K, V, S>,
    cursor: Cursor,
    remaining: usize,
}

impl<'a, K, V, S> Iter<'a, K, V, S> {
    pub(crate) fn new(map: &'a ChainHashMap<K, V, S>) -> Self {
        Self {
            map,
            cursor: map.begin(),
            remaining: map.len(),
        }
    }
}

impl<K, V, S> Clone for Iter<'_, K, V, S> {
    fn clone(&self) -> Self {
        Self {
            map: self.map,
            cursor: self.cursor,
            remaining: self.remaining,
        }
    }
}

impl<'a, K, V, S> Iterator for Iter<'a, K, V, S> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let map: &'a ChainHashMap<K, V, S> = self.map;
        let item = self.cursor.record(map)?;
        self.cursor = map.advance(self.cursor);
        self.remaining -= 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V, S> ExactSizeIterator for Iter<'_, K, V, S> {}
impl<K, V, S> FusedIterator for Iter<'_, K, V, S> {}

/// Iterator over `(&K, &mut V)`.
///
/// The visiting order is fixed up front from the bucket chains; the mutable
/// borrows are then split out of record storage one per record.
pub struct IterMut<'a, K, V> {
    order: std::vec::IntoIter<DefaultKey>,
    refs: SecondaryMap<DefaultKey, (&'a K, &'a mut V)>,
}

impl<'a, K, V> IterMut<'a, K, V> {
    pub(crate) fn new(
        order: Vec<DefaultKey>,
        nodes: &'a mut SlotMap<DefaultKey, Node<K, V>>,
    ) -> Self {
        let mut refs = SecondaryMap::with_capacity(order.len());
        for (k, node) in nodes.iter_mut() {
            refs.insert(k, node.split_mut());
        }
        Self {
            order: order.into_iter(),
            refs,
        }
    }
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let k = self.order.next()?;
        self.refs.remove(k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.order.size_hint()
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
impl<K, V> FusedIterator for IterMut<'_, K, V> {}

/// Owning iterator over `(K, V)`.
pub struct IntoIter<K, V> {
    order: std::vec::IntoIter<DefaultKey>,
    nodes: SlotMap<DefaultKey, Node<K, V>>,
}

impl<K, V> IntoIter<K, V> {
    pub(crate) fn new(order: Vec<DefaultKey>, nodes: SlotMap<DefaultKey, Node<K, V>>) -> Self {
        Self {
            order: order.into_iter(),
            nodes,
        }
    }
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let k = self.order.next()?;
        self.nodes.remove(k).map(Node::into_pair)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.order.size_hint()
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}
impl<K, V> FusedIterator for IntoIter<K, V> {}

pub struct Keys<'a, K, V, S> {
    pub(crate) inner: Iter<'a, K, V, S>,
}

impl<'a, K, V, S> Iterator for Keys<'a, K, V, S> {
    type Item = &'a K;

    #[inline]
    fn next(&mut self) -> Option<&'a K> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, S> ExactSizeIterator for Keys<'_, K, V, S> {}

pub struct Values<'a, K, V, S> {
    pub(crate) inner: Iter<'a, K, V, S>,
}

impl<'a, K, V, S> Iterator for Values<'a, K, V, S> {
    type Item = &'a V;

    #[inline]
    fn next(&mut self) -> Option<&'a V> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, S> ExactSizeIterator for Values<'_, K, V, S> {}

pub struct ValuesMut<'a, K, V> {
    pub(crate) inner: IterMut<'a, K, V>,
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;

    #[inline]
    fn next(&mut self) -> Option<&'a mut V> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for ValuesMut<'_, K, V> {}

#[cfg(test)]
mod tests {
    use crate::ChainHashMap;

    /// Invariant: `iter`, `iter_mut` and `into_iter` visit records in the
    /// same order.
    #[test]
    fn all_iterators_share_one_order() {
        let mut m: ChainHashMap<u32, u32> = ChainHashMap::new();
        for k in 0..400 {
            m.insert(k, k);
        }
        let shared: Vec<u32> = m.iter().map(|(k, _)| *k).collect();
        let mutable: Vec<u32> = m.iter_mut().map(|(k, _)| *k).collect();
        let owned: Vec<u32> = m.into_iter().map(|(k, _)| k).collect();
        assert_eq!(shared.len(), 400);
        assert_eq!(shared, mutable);
        assert_eq!(shared, owned);
    }

    /// Invariant: size hints count down exactly and iterators stay fused.
    #[test]
    fn size_hint_is_exact_and_fused() {
        let mut m: ChainHashMap<u32, u32> = ChainHashMap::new();
        for k in 0..3 {
            m.insert(k, k);
        }
        let mut it = m.iter();
        assert_eq!(it.size_hint(), (3, Some(3)));
        it.next();
        assert_eq!(it.len(), 2);
        it.next();
        it.next();
        assert_eq!(it.next(), None);
        assert_eq!(it.next(), None);
        assert_eq!(it.len(), 0);
    }

    /// Invariant: a partially consumed owning iterator drops the rest
    /// without leaking or double-dropping.
    #[test]
    fn into_iter_partial_consumption_drops_rest() {
        use std::rc::Rc;
        let token = Rc::new(());
        let mut m: ChainHashMap<u32, Rc<()>> = ChainHashMap::new();
        for k in 0..10 {
            m.insert(k, token.clone());
        }
        assert_eq!(Rc::strong_count(&token), 11);
        let mut it = m.into_iter();
        let first = it.next();
        assert!(first.is_some());
        drop(it);
        assert_eq!(Rc::strong_count(&token), 2);
        drop(first);
        assert_eq!(Rc::strong_count(&token), 1);
    }

    /// Invariant: an empty map yields nothing through every iterator.
    #[test]
    fn empty_map_iterates_nothing() {
        let mut m: ChainHashMap<u32, u32> = ChainHashMap::new();
        assert_eq!(m.iter().count(), 0);
        assert_eq!(m.iter_mut().count(), 0);
        assert_eq!(m.keys().count(), 0);
        assert_eq!(m.into_iter().count(), 0);
    }
}
