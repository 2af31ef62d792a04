//! chain-hashmap: a single-threaded map from unique keys to mutable values,
//! stored in a power-of-two array of chained buckets, with detached cursors
//! for forward iteration.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a small, predictable hash map whose growth, iteration order and
//!   cursor invalidation rules can all be stated exactly.
//! - Layers:
//!   - BucketTable<K, V>: records in a `SlotMap`, one singly linked chain
//!     per bucket threaded through them. Front insertion, linear scan,
//!     single-record unlink, and a relinking rebuild.
//!   - GrowthPolicy: decides after every insert and erase whether to rebuild
//!     and to which bucket count.
//!   - Cursor: `(bucket, record handle, generation)`, resolved against the
//!     map on every access.
//!   - ChainHashMap<K, V, S>: public facade composing the three with a
//!     `BuildHasher`.
//!
//! Constraints
//! - Single-threaded; no internal synchronization. The map is `Send` but
//!   not `Sync`; share it across threads only behind an external lock.
//! - Bucket count is always a power of two and never below the policy's
//!   initial count; the index for a key is `hash & (buckets - 1)`.
//! - Keys are unique. `insert` of a present key is a no-op and never
//!   overwrites the stored value.
//! - No shrink path: removing records never reduces the bucket count.
//!
//! Growth
//! - With the default policy the table starts at 128 buckets. Once the map
//!   holds at least 128 records and `len / buckets >= 0.5`, the next insert
//!   or erase rebuilds the table at `4 × len` buckets.
//! - A rebuild snapshots every record handle in iteration order, empties the
//!   bucket array at the new length, and front-inserts each record again by
//!   its stored hash. Records never move in storage and `K: Hash` is not
//!   called, so a rebuild cannot reenter user code.
//!
//! Iteration and the begin cache
//! - Iteration order is bucket index order, most recent first within a
//!   bucket. The end-marker is the tail of the last bucket and is the single
//!   position every exhausted traversal lands on.
//! - The map caches a lower bound on the first occupied bucket. `begin`
//!   scans forward from it without writing; `begin_mut` and `iter_mut` also
//!   tighten it. Inserts lower it, rebuilds recompute it, removals leave it.
//!
//! Cursor invalidation
//! - A rebuild or `clear` bumps the table generation; cursors from an older
//!   generation resolve to `None`.
//! - Removing a record retires its generational handle; cursors to it
//!   resolve to `None`.
//! - Inserts that do not rebuild and removals of other records keep cursors
//!   valid.
//!
//! Reentrancy
//! - Bucket scans run user `Eq` while walking a chain. A debug-only guard
//!   panics if that `Eq` calls back into the same map.

mod bucket_table;
mod chain_hash_map;
mod chain_hash_map_proptest;
mod cursor;
mod error;
mod iter;
mod policy;
mod scan_guard;

// Public surface
pub use chain_hash_map::ChainHashMap;
pub use cursor::Cursor;
pub use error::NotFound;
pub use iter::{IntoIter, Iter, IterMut, Keys, Values, ValuesMut};
pub use policy::GrowthPolicy;
