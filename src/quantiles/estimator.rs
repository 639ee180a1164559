//! Streaming P² estimator
//!
//! [`PSquare`] wraps a [`P2State`] so callers can feed a stream from its very
//! first value. The first five observations are buffered; once the buffer
//! fills, it seeds the markers and every later value goes through the P²
//! update. Until then, queries are answered exactly from the buffer.

use super::state::MARKERS;
use super::{P2State, Targets};
use crate::math;
use crate::traits::{EstimatorError, QuantileSketch, Sketch};

/// Streaming quantile estimator using the P² algorithm
///
/// Memory use is constant: five markers plus a five-slot warm-up buffer,
/// whatever the stream length.
///
/// - O(1) time per insertion
/// - exact answers for the first five values
/// - marker heights are exact for the three target fractions, and
///   [`quantile`](QuantileSketch::quantile) interpolates linearly between
///   markers for any other rank
///
/// NaN values are ignored to prevent corrupting the marker ordering.
///
/// # Example
///
/// ```
/// use psquare::quantiles::{PSquare, Targets};
/// use psquare::traits::QuantileSketch;
///
/// let mut estimator = PSquare::new(Targets::new(0.5, 0.9, 0.99).unwrap());
///
/// for i in 1..=1000 {
///     estimator.add(i as f64);
/// }
///
/// let p90 = estimator.quantile(0.9).unwrap();
/// assert!(p90 > 850.0 && p90 < 950.0);
/// ```
#[derive(Clone, Debug)]
pub struct PSquare {
    /// Fractions tracked once the markers are seeded
    targets: Targets,
    /// First observations, in arrival order
    warmup: [f64; MARKERS],
    /// Number of filled warm-up slots
    buffered: usize,
    /// Marker state, present once the warm-up buffer filled
    state: Option<P2State>,
}

impl PSquare {
    /// Create an empty estimator for the given target fractions
    pub fn new(targets: Targets) -> Self {
        Self {
            targets,
            warmup: [0.0; MARKERS],
            buffered: 0,
            state: None,
        }
    }

    /// Create an empty estimator centred on quantile `p`
    ///
    /// # Errors
    ///
    /// Returns [`EstimatorError::InvalidQuantiles`] unless `0 < p < 1`.
    pub fn with_quantile(p: f64) -> Result<Self, EstimatorError> {
        Ok(Self::new(Targets::around(p)?))
    }

    pub fn targets(&self) -> Targets {
        self.targets
    }

    /// Marker state, once five observations have been seen
    pub fn state(&self) -> Option<&P2State> {
        self.state.as_ref()
    }

    /// `(fraction, estimate)` pairs for the three target fractions
    ///
    /// During warm-up the estimates are exact order statistics of the
    /// buffered values. Returns `None` before the first observation.
    pub fn estimates(&self) -> Option<[(f64, f64); 3]> {
        if let Some(state) = &self.state {
            return Some(state.estimates());
        }
        let [p1, p2, p3] = self.targets.fractions();
        Some([
            (p1, self.warmup_quantile(p1)?),
            (p2, self.warmup_quantile(p2)?),
            (p3, self.warmup_quantile(p3)?),
        ])
    }

    /// Add a single value (internal)
    ///
    /// NaN values are ignored.
    fn push(&mut self, value: f64) {
        if value.is_nan() {
            return;
        }

        if let Some(state) = &mut self.state {
            *state = state.observe(value);
            return;
        }

        self.warmup[self.buffered] = value;
        self.buffered += 1;
        if self.buffered == MARKERS {
            p2_debug!(targets = ?self.targets.fractions(), "warm-up complete, seeding markers");
            self.state = Some(P2State::new(self.warmup, self.targets));
        }
    }

    /// Buffered values in ascending order
    fn sorted_warmup(&self) -> ([f64; MARKERS], usize) {
        let mut sorted = self.warmup;
        sorted[..self.buffered].sort_by(|a, b| a.total_cmp(b));
        (sorted, self.buffered)
    }

    fn warmup_quantile(&self, q: f64) -> Option<f64> {
        let (sorted, n) = self.sorted_warmup();
        if n == 0 {
            return None;
        }
        Some(sorted[math::nearest_rank(q, n)])
    }

    /// Piecewise-linear anchors `(rank, height)` through the five markers
    fn anchors(state: &P2State) -> [(f64, f64); MARKERS] {
        let [p1, p2, p3] = state.targets().fractions();
        let h = state.heights();
        [(0.0, h[0]), (p1, h[1]), (p2, h[2]), (p3, h[3]), (1.0, h[4])]
    }

    /// Quantile query on the piecewise-linear model through the markers
    fn quantile_impl(state: &P2State, q: f64) -> f64 {
        let q = q.clamp(0.0, 1.0);
        let anchors = Self::anchors(state);

        if q <= 0.0 {
            return state.min();
        }
        if q >= 1.0 {
            return state.max();
        }

        for pair in anchors.windows(2) {
            let (lo_rank, lo_height) = pair[0];
            let (hi_rank, hi_height) = pair[1];
            if q == hi_rank {
                return hi_height;
            }
            if q < hi_rank {
                let t = (q - lo_rank) / (hi_rank - lo_rank);
                return lo_height + t * (hi_height - lo_height);
            }
        }

        state.max()
    }

    /// Rank query, the inverse of `quantile_impl`
    fn rank_impl(state: &P2State, value: f64) -> f64 {
        // Check >= max before <= min so that when min == max (all values equal),
        // we return 1.0 (CDF convention: P(X ≤ x) = 1.0 when x ≥ max).
        if value >= state.max() {
            return 1.0;
        }
        if value <= state.min() {
            return 0.0;
        }

        let anchors = Self::anchors(state);
        for pair in anchors.windows(2) {
            let (lo_rank, lo_height) = pair[0];
            let (hi_rank, hi_height) = pair[1];
            if value < hi_height {
                let denom = hi_height - lo_height;
                if denom <= 0.0 {
                    return lo_rank;
                }
                let t = (value - lo_height) / denom;
                return lo_rank + t * (hi_rank - lo_rank);
            }
        }

        1.0
    }
}

impl Default for PSquare {
    fn default() -> Self {
        Self::new(Targets::default())
    }
}

impl Sketch for PSquare {
    type Item = f64;

    fn update(&mut self, item: &f64) {
        self.push(*item);
    }

    fn clear(&mut self) {
        self.warmup = [0.0; MARKERS];
        self.buffered = 0;
        self.state = None;
    }

    fn size_bytes(&self) -> usize {
        core::mem::size_of::<Self>()
    }

    fn count(&self) -> u64 {
        match &self.state {
            Some(state) => state.count(),
            None => self.buffered as u64,
        }
    }
}

impl QuantileSketch for PSquare {
    type Value = f64;

    fn add(&mut self, value: f64) {
        self.push(value);
    }

    fn quantile(&self, rank: f64) -> Option<f64> {
        match &self.state {
            Some(state) => Some(Self::quantile_impl(state, rank)),
            None => self.warmup_quantile(rank),
        }
    }

    fn rank(&self, value: &f64) -> f64 {
        if let Some(state) = &self.state {
            return Self::rank_impl(state, *value);
        }
        let (sorted, n) = self.sorted_warmup();
        if n == 0 {
            return 0.0;
        }
        let at_or_below = sorted[..n].iter().filter(|&&v| v <= *value).count();
        at_or_below as f64 / n as f64
    }

    fn min(&self) -> Option<f64> {
        match &self.state {
            Some(state) => Some(state.min()),
            None => self.warmup[..self.buffered].iter().copied().reduce(f64::min),
        }
    }

    fn max(&self) -> Option<f64> {
        match &self.state {
            Some(state) => Some(state.max()),
            None => self.warmup[..self.buffered].iter().copied().reduce(f64::max),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // ---- Basic functionality ----

    #[test]
    fn test_basic() {
        let mut estimator = PSquare::default();
        for i in 1..=100 {
            estimator.add(i as f64);
        }
        let median = estimator.median().unwrap();
        assert!(median > 45.0 && median < 55.0, "median={}", median);
        assert_eq!(estimator.count(), 100);
    }

    #[test]
    fn test_empty() {
        let estimator = PSquare::default();
        assert!(estimator.median().is_none());
        assert!(estimator.min().is_none());
        assert!(estimator.max().is_none());
        assert!(estimator.estimates().is_none());
        assert!(estimator.state().is_none());
        assert_eq!(estimator.count(), 0);
        assert!(estimator.is_empty());
        assert_eq!(estimator.rank(&1.0), 0.0);
    }

    #[test]
    fn test_with_quantile() {
        let estimator = PSquare::with_quantile(0.9).unwrap();
        assert!((estimator.targets().middle() - 0.9).abs() < 1e-12);
        assert!(PSquare::with_quantile(1.0).is_err());
    }

    // ---- Warm-up ----

    #[test]
    fn test_single_value() {
        let mut estimator = PSquare::default();
        estimator.add(42.0);
        assert_eq!(estimator.min(), Some(42.0));
        assert_eq!(estimator.max(), Some(42.0));
        assert_eq!(estimator.quantile(0.0), Some(42.0));
        assert_eq!(estimator.quantile(0.5), Some(42.0));
        assert_eq!(estimator.quantile(1.0), Some(42.0));
        assert!(estimator.state().is_none());
    }

    #[test]
    fn test_warmup_is_exact() {
        let mut estimator = PSquare::default();
        for v in [30.0, 10.0, 20.0] {
            estimator.add(v);
        }
        assert_eq!(estimator.quantile(0.0), Some(10.0));
        assert_eq!(estimator.quantile(0.5), Some(20.0));
        assert_eq!(estimator.quantile(1.0), Some(30.0));
        assert_eq!(estimator.rank(&20.0), 2.0 / 3.0);
        assert_eq!(estimator.rank(&5.0), 0.0);
        assert_eq!(
            estimator.estimates(),
            Some([(0.25, 20.0), (0.5, 20.0), (0.75, 30.0)])
        );
    }

    #[test]
    fn test_fifth_value_seeds_state() {
        let mut estimator = PSquare::default();
        for v in [5.0, 4.0, 3.0, 2.0] {
            estimator.add(v);
        }
        assert!(estimator.state().is_none());
        estimator.add(1.0);
        let state = estimator.state().unwrap();
        assert_eq!(state.heights(), &[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(estimator.count(), 5);
        assert_eq!(
            estimator.estimates(),
            Some([(0.25, 2.0), (0.5, 3.0), (0.75, 4.0)])
        );
    }

    #[test]
    fn test_stream_matches_state_threading() {
        let values: [f64; 12] = [
            0.02, 0.15, 0.74, 3.39, 0.83, 22.37, 10.15, 15.43, 38.62, 15.92, 34.60, 10.28,
        ];
        let mut estimator = PSquare::default();
        for v in values {
            estimator.add(v);
        }

        let seed = [values[0], values[1], values[2], values[3], values[4]];
        let state = P2State::new(seed, Targets::default()).observe_all(values[5..].iter().copied());
        assert_eq!(estimator.state(), Some(&state));
    }

    // ---- Queries on seeded state ----

    #[test]
    fn test_quantile_hits_markers_exactly() {
        let mut estimator = PSquare::new(Targets::new(0.1, 0.5, 0.9).unwrap());
        for i in 1..=1000 {
            estimator.add(i as f64);
        }
        let [(p1, h1), (p2, h2), (p3, h3)] = estimator.estimates().unwrap();
        assert_eq!(estimator.quantile(p1), Some(h1));
        assert_eq!(estimator.quantile(p2), Some(h2));
        assert_eq!(estimator.quantile(p3), Some(h3));
    }

    #[test]
    fn test_extremes() {
        let mut estimator = PSquare::default();
        for i in 1..=1000 {
            estimator.add(i as f64);
        }
        assert_eq!(estimator.quantile(0.0).unwrap(), 1.0);
        assert_eq!(estimator.quantile(1.0).unwrap(), 1000.0);
        assert_eq!(estimator.quantile(-0.5).unwrap(), 1.0);
        assert_eq!(estimator.quantile(1.5).unwrap(), 1000.0);
    }

    #[test]
    fn test_quantile_monotonicity() {
        let mut estimator = PSquare::new(Targets::new(0.2, 0.5, 0.8).unwrap());
        for i in 0..10_000u64 {
            estimator.add(((i * 7919) % 10_007) as f64);
        }

        let mut prev = f64::NEG_INFINITY;
        for i in 0..=100 {
            let q = i as f64 / 100.0;
            let val = estimator.quantile(q).unwrap();
            assert!(val >= prev, "monotonicity violation at q={}: {} < {}", q, val, prev);
            assert!(!val.is_nan(), "NaN at q={}", q);
            prev = val;
        }
    }

    #[test]
    fn test_rank() {
        let mut estimator = PSquare::default();
        for i in 1..=100 {
            estimator.add(i as f64);
        }
        let rank = estimator.rank(&50.0);
        assert!(rank > 0.4 && rank < 0.6, "rank={}", rank);
        assert_eq!(estimator.rank(&1.0), 0.0);
        assert_eq!(estimator.rank(&100.0), 1.0);
        assert_eq!(estimator.cdf(&200.0), 1.0);
    }

    #[test]
    fn test_rank_quantile_consistency() {
        let mut estimator = PSquare::default();
        for i in 1..=10_000 {
            estimator.add(i as f64);
        }
        for i in 1..=99 {
            let q = i as f64 / 100.0;
            let val = estimator.quantile(q).unwrap();
            let r = estimator.rank(&val);
            let error = if r > q { r - q } else { q - r };
            assert!(error < 1e-6, "q={}, quantile={}, rank={}", q, val, r);
        }
    }

    #[test]
    fn test_quantiles_batch() {
        let mut estimator = PSquare::default();
        for i in 1..=100 {
            estimator.add(i as f64);
        }
        let qs = estimator.quantiles(&[0.0, 0.5, 1.0]);
        assert_eq!(qs.len(), 3);
        assert_eq!(qs[0], Some(1.0));
        assert_eq!(qs[2], Some(100.0));
    }

    // ---- Degenerate distributions ----

    #[test]
    fn test_all_values_equal() {
        let mut estimator = PSquare::default();
        for _ in 0..1000 {
            estimator.add(42.0);
        }
        for i in 0..=10 {
            let q = i as f64 / 10.0;
            assert_eq!(estimator.quantile(q).unwrap(), 42.0, "q={}", q);
        }
        assert_eq!(estimator.rank(&42.0), 1.0);
        assert_eq!(estimator.rank(&41.0), 0.0);
    }

    #[test]
    fn test_two_point_distribution() {
        let mut estimator = PSquare::default();
        for i in 0..10_000 {
            estimator.add(if i % 2 == 0 { 0.0 } else { 100.0 });
        }
        let r50 = estimator.rank(&50.0);
        assert!(!r50.is_nan());
        let mut prev = f64::NEG_INFINITY;
        for i in 0..=20 {
            let q = i as f64 / 20.0;
            let val = estimator.quantile(q).unwrap();
            assert!(val >= prev, "monotonicity at q={}: {} < {}", q, val, prev);
            assert!(!val.is_nan());
            prev = val;
        }
    }

    // ---- Edge cases ----

    #[test]
    fn test_nan_ignored() {
        let mut estimator = PSquare::default();
        estimator.add(1.0);
        estimator.add(f64::NAN);
        estimator.add(2.0);
        estimator.add(f64::NAN);
        estimator.add(3.0);
        assert_eq!(estimator.count(), 3);
        assert_eq!(estimator.min(), Some(1.0));
        assert_eq!(estimator.max(), Some(3.0));
        assert!(!estimator.median().unwrap().is_nan());
    }

    #[test]
    fn test_update_via_sketch_trait() {
        let mut estimator = PSquare::default();
        for i in 0..10 {
            estimator.update(&(i as f64));
        }
        assert_eq!(estimator.count(), 10);
    }

    #[test]
    fn test_clear() {
        let mut estimator = PSquare::default();
        for i in 1..=100 {
            estimator.add(i as f64);
        }
        estimator.clear();
        assert_eq!(estimator.count(), 0);
        assert!(estimator.median().is_none());
        assert!(estimator.state().is_none());

        for v in [3.0, 1.0] {
            estimator.add(v);
        }
        assert_eq!(estimator.min(), Some(1.0));
    }

    #[test]
    fn test_size_is_constant() {
        let mut estimator = PSquare::default();
        let empty = estimator.size_bytes();
        for i in 0..100_000 {
            estimator.add(i as f64);
        }
        assert_eq!(estimator.size_bytes(), empty);
    }
}
