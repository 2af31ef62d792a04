//! Debug-only guard around bucket scans.
//!
//! Bucket scans and record links are briefly inconsistent while a chain is
//! being walked or relinked, and the only user code that runs in that window
//! is `K: Eq`/`K: Hash`. The guard catches a key implementation that calls
//! back into the same map from there. Release builds compile it away.

use core::cell::Cell;
use core::marker::PhantomData;

/// Per-table scan depth. Guard each entry point with
/// `let _g = self.guard.enter();`.
#[derive(Debug)]
pub(crate) struct ScanGuard {
    #[cfg(debug_assertions)]
    depth: Cell<u32>,
    // Same auto traits in debug and release: Send, never Sync.
    _nosync: PhantomData<Cell<()>>,
}

impl ScanGuard {
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            depth: Cell::new(0),
            _nosync: PhantomData,
        }
    }

    /// Start a scan. Panics in debug builds if a scan of the same table is
    /// already running.
    #[inline]
    pub(crate) fn enter(&self) -> ScanToken<'_> {
        #[cfg(debug_assertions)]
        {
            let d = self.depth.get();
            assert!(d == 0, "bucket scan re-entered from a key's Eq or Hash");
            self.depth.set(d + 1);
            ScanToken { owner: self }
        }

        #[cfg(not(debug_assertions))]
        {
            ScanToken { _z: PhantomData }
        }
    }
}

impl Default for ScanGuard {
    fn default() -> Self {
        Self::new()
    }
}

// A cloned table starts outside of any scan.
impl Clone for ScanGuard {
    fn clone(&self) -> Self {
        Self::new()
    }
}

/// RAII token returned by `ScanGuard::enter`; ends the scan on drop.
pub(crate) struct ScanToken<'a> {
    #[cfg(debug_assertions)]
    owner: &'a ScanGuard,
    #[cfg(not(debug_assertions))]
    _z: PhantomData<&'a ()>,
}

impl Drop for ScanToken<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        {
            let d = self.owner.depth.get();
            debug_assert!(d > 0);
            self.owner.depth.set(d - 1);
        }
    }
}
