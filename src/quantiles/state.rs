//! P² marker state
//!
//! Implementation of the piecewise-parabolic (P²) algorithm of Jain and
//! Chlamtac for streaming quantile estimation. Five markers are tracked:
//! the minimum, three target quantiles and the maximum. Each marker keeps a
//! height (the estimate), an integer position (its rank among the
//! observations so far), a desired fractional position and the increment
//! that desired position advances by per observation.
//!
//! # Value Semantics
//!
//! [`P2State`] is a small `Copy` value. [`P2State::observe`] never mutates
//! the receiver; it returns the next state. Callers thread the state
//! themselves, and two owners of a state never interfere with each other.
//! If several producers must feed one estimator, serialize the updates
//! externally (one owning thread, or a `Mutex<P2State>`).

use super::Targets;
use crate::traits::EstimatorError;

/// Number of markers tracked by the algorithm
pub const MARKERS: usize = 5;

/// Interior markers adjusted after every observation, in this exact order
const INTERIOR: [usize; 3] = [1, 2, 3];

/// Which formula produced an adjusted height
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Interpolation {
    Parabolic,
    Linear,
}

/// Estimator state for one P² instance
///
/// Markers are stored in index order: `0` is the minimum, `1..=3` are the
/// three target quantiles in ascending order and `4` is the maximum.
///
/// After every update:
///
/// - heights are non-decreasing
/// - positions are strictly increasing, starting at 1 and ending at the
///   number of observations seen
/// - desired positions start at 1 and end at the number of observations
///
/// # Example
///
/// ```
/// use psquare::quantiles::{P2State, Targets};
///
/// let state = P2State::new([3.0, 1.0, 2.0, 5.0, 4.0], Targets::default());
/// assert_eq!(state.heights(), &[1.0, 2.0, 3.0, 4.0, 5.0]);
///
/// let next = state.observe(2.5);
/// assert_eq!(next.count(), 6);
/// // the original state is untouched
/// assert_eq!(state.count(), 5);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct P2State {
    /// Height estimate at each marker
    heights: [f64; MARKERS],
    /// Number of observations at or below each marker
    positions: [u64; MARKERS],
    /// Ideal fractional position of each marker
    desired: [f64; MARKERS],
    /// Per-observation advance of each desired position
    increments: [f64; MARKERS],
    /// Fractions tracked by markers 1..=3
    targets: Targets,
}

impl P2State {
    /// Seed a state from exactly five observations
    ///
    /// The seed is sorted ascending and becomes the initial marker heights.
    /// NaN seeds sort above every other value under IEEE total ordering.
    pub fn new(seed: [f64; MARKERS], targets: Targets) -> Self {
        let mut heights = seed;
        heights.sort_by(|a, b| a.total_cmp(b));

        let [p1, p2, p3] = targets.fractions();
        Self {
            heights,
            positions: [1, 2, 3, 4, 5],
            desired: [1.0, 1.0 + 4.0 * p1, 1.0 + 4.0 * p2, 1.0 + 4.0 * p3, 5.0],
            increments: [0.0, p1, p2, p3, 1.0],
            targets,
        }
    }

    /// Seed a state from a slice that must hold exactly five observations
    ///
    /// # Errors
    ///
    /// - [`EstimatorError::InsufficientData`] with fewer than five values
    /// - [`EstimatorError::ExcessSeed`] with more than five values
    pub fn from_slice(seed: &[f64], targets: Targets) -> Result<Self, EstimatorError> {
        let seed: [f64; MARKERS] = match seed.len() {
            n if n < MARKERS => {
                p2_debug!(found = n, "seed too short");
                return Err(EstimatorError::InsufficientData {
                    required: MARKERS,
                    found: n,
                });
            }
            n if n > MARKERS => {
                p2_debug!(found = n, "seed too long");
                return Err(EstimatorError::ExcessSeed { found: n });
            }
            _ => [seed[0], seed[1], seed[2], seed[3], seed[4]],
        };
        Ok(Self::new(seed, targets))
    }

    /// Seed a state centred on a single quantile `p`
    ///
    /// Equivalent to `P2State::new(seed, Targets::around(p)?)`.
    pub fn with_quantile(seed: [f64; MARKERS], p: f64) -> Result<Self, EstimatorError> {
        Ok(Self::new(seed, Targets::around(p)?))
    }

    /// Fold one observation into the state, returning the next state
    ///
    /// Runs the three steps of the algorithm: place the value among the
    /// markers, advance actual and desired positions, then adjust the
    /// interior markers in ascending order.
    #[must_use]
    pub fn observe(&self, value: f64) -> Self {
        let mut next = *self;
        let k = next.fit(value);
        next.reposition(k);
        for i in INTERIOR {
            next.adjust(i);
        }
        next
    }

    /// Fold every observation of an iterator into the state, in order
    #[must_use]
    pub fn observe_all<I>(&self, values: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        values
            .into_iter()
            .fold(*self, |state, value| state.observe(value))
    }

    /// Current `(fraction, estimate)` pairs for the three target quantiles
    pub fn estimates(&self) -> [(f64, f64); 3] {
        let [p1, p2, p3] = self.targets.fractions();
        [
            (p1, self.heights[1]),
            (p2, self.heights[2]),
            (p3, self.heights[3]),
        ]
    }

    /// Estimate for the middle target fraction
    pub fn middle_estimate(&self) -> f64 {
        self.heights[2]
    }

    /// Number of observations folded in, seed included
    pub fn count(&self) -> u64 {
        self.positions[MARKERS - 1]
    }

    /// Smallest observation seen
    pub fn min(&self) -> f64 {
        self.heights[0]
    }

    /// Largest observation seen
    pub fn max(&self) -> f64 {
        self.heights[MARKERS - 1]
    }

    pub fn targets(&self) -> Targets {
        self.targets
    }

    pub fn heights(&self) -> &[f64; MARKERS] {
        &self.heights
    }

    pub fn positions(&self) -> &[u64; MARKERS] {
        &self.positions
    }

    pub fn desired_positions(&self) -> &[f64; MARKERS] {
        &self.desired
    }

    pub fn increments(&self) -> &[f64; MARKERS] {
        &self.increments
    }

    /// Locate the first marker whose position the value advances
    ///
    /// A new extremum replaces the minimum or maximum height. The returned
    /// index `k` means markers `k..` sit at or above the value.
    fn fit(&mut self, value: f64) -> usize {
        let last = MARKERS - 1;
        if value < self.heights[0] {
            self.heights[0] = value;
            1
        } else if value > self.heights[last] {
            self.heights[last] = value;
            last
        } else {
            // value <= heights[4] (or NaN) lands in the top cell
            (1..last)
                .find(|&k| value < self.heights[k])
                .unwrap_or(last)
        }
    }

    /// Advance actual positions from marker `k` up, and every desired position
    fn reposition(&mut self, k: usize) {
        for position in &mut self.positions[k..] {
            *position += 1;
        }
        for (desired, increment) in self.desired.iter_mut().zip(self.increments.iter()) {
            *desired += increment;
        }
    }

    /// Move interior marker `i` one step towards its desired position
    ///
    /// The trigger on `d` is non-strict while the neighbour-gap guard is
    /// strict; both follow the published algorithm.
    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    fn adjust(&mut self, i: usize) {
        let d = self.desired[i] - self.positions[i] as f64;
        let gap_up = self.positions[i + 1].saturating_sub(self.positions[i]);
        let gap_down = self.positions[i].saturating_sub(self.positions[i - 1]);

        let s: i64 = if d >= 1.0 && gap_up > 1 {
            1
        } else if d <= -1.0 && gap_down > 1 {
            -1
        } else {
            return;
        };

        let candidate = self.parabolic(i, s as f64);
        let (height, method) =
            if self.heights[i - 1] < candidate && candidate < self.heights[i + 1] {
                (candidate, Interpolation::Parabolic)
            } else {
                (self.linear(i, s), Interpolation::Linear)
            };

        p2_trace!(marker = i, step = s, ?method, height, "adjusted marker");
        self.heights[i] = height;
        self.positions[i] = if s > 0 {
            self.positions[i] + 1
        } else {
            self.positions[i] - 1
        };
    }

    /// Piecewise-parabolic prediction for marker `i` moved by `s`
    fn parabolic(&self, i: usize, s: f64) -> f64 {
        let (h_lo, h, h_hi) = (self.heights[i - 1], self.heights[i], self.heights[i + 1]);
        let n_lo = self.positions[i - 1] as f64;
        let n = self.positions[i] as f64;
        let n_hi = self.positions[i + 1] as f64;

        let span = self.gap(i - 1, i + 1);
        let below = self.gap(i - 1, i);
        let above = self.gap(i, i + 1);

        h + s / span
            * ((n - n_lo + s) * (h_hi - h) / above + (n_hi - n - s) * (h - h_lo) / below)
    }

    /// Linear prediction for marker `i` moved towards its neighbour at `i + s`
    fn linear(&self, i: usize, s: i64) -> f64 {
        let j = if s > 0 { i + 1 } else { i - 1 };
        let dn = if s > 0 {
            self.gap(i, j)
        } else {
            -self.gap(j, i)
        };
        self.heights[i] + s as f64 * (self.heights[j] - self.heights[i]) / dn
    }

    /// Position distance between markers `lo < hi` as a divisor
    ///
    /// # Panics
    ///
    /// Panics if the positions are not strictly increasing. That can only
    /// happen if the state invariants were broken, which is a bug.
    fn gap(&self, lo: usize, hi: usize) -> f64 {
        let (a, b) = (self.positions[lo], self.positions[hi]);
        if b <= a {
            p2_error!(lo, hi, positions = ?self.positions, "marker positions out of order");
            panic!(
                "internal invariant violation: positions[{}]={} >= positions[{}]={}",
                lo, a, hi, b
            );
        }
        (b - a) as f64
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for P2State {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("P2State", 5)?;
        state.serialize_field("heights", &self.heights)?;
        state.serialize_field("positions", &self.positions)?;
        state.serialize_field("desired_positions", &self.desired)?;
        state.serialize_field("increments", &self.increments)?;
        state.serialize_field("targets", &self.targets)?;
        state.end()
    }
}

// ============================================================================
// Tests
// ============================================================================
