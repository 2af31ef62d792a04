//! GrowthPolicy: when and how far the bucket table grows.
//!
//! The policy is consulted after every insert and every erase, whether or not
//! the call changed anything. It only ever answers "stay" or "grow to N";
//! there is no shrink path.

/// Growth configuration for a [`ChainHashMap`](crate::ChainHashMap).
///
/// The defaults start at 128 buckets and, once the map holds at least 128
/// records at a load factor of 0.5 or more, rebuild to `4 × len` buckets.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GrowthPolicy {
    initial_buckets: usize,
    growth_factor: usize,
    max_load_factor: f64,
}

impl GrowthPolicy {
    pub const DEFAULT_INITIAL_BUCKETS: usize = 128;
    pub const DEFAULT_GROWTH_FACTOR: usize = 4;
    pub const DEFAULT_MAX_LOAD_FACTOR: f64 = 0.5;

    pub const fn new() -> Self {
        Self {
            initial_buckets: Self::DEFAULT_INITIAL_BUCKETS,
            growth_factor: Self::DEFAULT_GROWTH_FACTOR,
            max_load_factor: Self::DEFAULT_MAX_LOAD_FACTOR,
        }
    }

    /// Set the bucket count of a fresh (or cleared) map. Rounded up to a
    /// power of two; zero becomes one.
    pub fn with_initial_buckets(mut self, n: usize) -> Self {
        self.initial_buckets = n.max(1).next_power_of_two();
        self
    }

    /// Set the multiplier applied to the record count on growth. Values below
    /// two are raised to two.
    pub fn with_growth_factor(mut self, factor: usize) -> Self {
        self.growth_factor = factor.max(2);
        self
    }

    /// Set the load factor at which growth fires.
    ///
    /// # Panics
    ///
    /// Panics if `load` is not a finite positive number.
    pub fn with_max_load_factor(mut self, load: f64) -> Self {
        assert!(
            load.is_finite() && load > 0.0,
            "max load factor must be finite and positive, got {load}"
        );
        self.max_load_factor = load;
        self
    }

    pub fn initial_buckets(&self) -> usize {
        self.initial_buckets
    }

    pub fn growth_factor(&self) -> usize {
        self.growth_factor
    }

    pub fn max_load_factor(&self) -> f64 {
        self.max_load_factor
    }

    /// Decide whether a table of `buckets` holding `len` records must be
    /// rebuilt, and to which bucket count.
    ///
    /// Growth needs both the record count and the table length to have
    /// reached the initial minimum, and the load factor to have reached the
    /// threshold. The target is `growth_factor × len` rounded up to a power
    /// of two, and never less than double the current length.
    pub(crate) fn grow_to(&self, len: usize, buckets: usize) -> Option<usize> {
        if len < self.initial_buckets || buckets < self.initial_buckets {
            return None;
        }
        if (len as f64) < self.max_load_factor * buckets as f64 {
            return None;
        }
        let target = len
            .saturating_mul(self.growth_factor)
            .checked_next_power_of_two()
            .unwrap_or(usize::MAX / 2 + 1);
        Some(target.max(buckets.saturating_mul(2)))
    }
}

impl Default for GrowthPolicy {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Invariant: nothing fires below the initial minimum, even when the
    /// load factor is already past the threshold.
    #[test]
    fn no_growth_below_initial_minimum() {
        let p = GrowthPolicy::default();
        assert_eq!(p.grow_to(0, 128), None);
        assert_eq!(p.grow_to(64, 128), None);
        assert_eq!(p.grow_to(127, 128), None);
    }

    /// Invariant: with the defaults the first rebuild happens at 128
    /// records and targets `4 × len`.
    #[test]
    fn default_first_growth_is_four_times_len() {
        let p = GrowthPolicy::default();
        assert_eq!(p.grow_to(128, 128), Some(512));
    }

    /// Invariant: after the first rebuild the threshold is half the table
    /// length and the target is again `4 × len`.
    #[test]
    fn default_growth_tracks_load_factor() {
        let p = GrowthPolicy::default();
        assert_eq!(p.grow_to(255, 512), None);
        assert_eq!(p.grow_to(256, 512), Some(1024));
        assert_eq!(p.grow_to(512, 1024), Some(2048));
    }

    /// Invariant: the target is always a power of two and larger than the
    /// current table, whatever the configuration.
    #[test]
    fn custom_policy_never_shrinks_and_stays_power_of_two() {
        let p = GrowthPolicy::new()
            .with_initial_buckets(8)
            .with_growth_factor(3)
            .with_max_load_factor(0.1);
        assert_eq!(p.initial_buckets(), 8);
        let to = p.grow_to(13, 128).unwrap();
        assert!(to.is_power_of_two());
        assert!(to > 128);

        let to = p.grow_to(100, 128).unwrap();
        assert_eq!(to, 512);
    }

    /// Invariant: builder inputs are normalized to usable values.
    #[test]
    fn builder_normalizes_inputs() {
        let p = GrowthPolicy::new()
            .with_initial_buckets(0)
            .with_growth_factor(0);
        assert_eq!(p.initial_buckets(), 1);
        assert_eq!(p.growth_factor(), 2);

        let p = GrowthPolicy::new().with_initial_buckets(100);
        assert_eq!(p.initial_buckets(), 128);
    }

    #[test]
    #[should_panic]
    fn nan_load_factor_panics() {
        let _ = GrowthPolicy::new().with_max_load_factor(f64::NAN);
    }
}
