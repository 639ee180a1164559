//! Core traits for streaming estimators
//!
//! Every estimator implements the base [`Sketch`] trait, with [`QuantileSketch`]
//! layered on top for percentile queries. Construction failures are reported
//! through [`EstimatorError`].

use core::fmt::Debug;

#[cfg(feature = "std")]
use std::vec::Vec;

#[cfg(not(feature = "std"))]
extern crate alloc;
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

/// Error raised when an estimator is constructed from malformed input
///
/// All variants are precondition failures: they are detected before any
/// state is built, so no partially initialized estimator ever escapes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EstimatorError {
    /// Quantile fractions are not finite or not strictly ascending inside (0, 1)
    InvalidQuantiles {
        lower: f64,
        middle: f64,
        upper: f64,
    },
    /// Fewer observations than the estimator needs to seed its markers
    InsufficientData { required: usize, found: usize },
    /// More seed observations than there are markers
    ExcessSeed { found: usize },
}

impl core::fmt::Display for EstimatorError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            EstimatorError::InvalidQuantiles {
                lower,
                middle,
                upper,
            } => write!(
                f,
                "invalid quantiles ({}, {}, {}): expected 0 < p1 < p2 < p3 < 1",
                lower, middle, upper
            ),
            EstimatorError::InsufficientData { required, found } => {
                write!(
                    f,
                    "insufficient data: need at least {} observations, found {}",
                    required, found
                )
            }
            EstimatorError::ExcessSeed { found } => {
                write!(f, "expected exactly 5 seed observations, found {}", found)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for EstimatorError {}

/// Core trait for all streaming estimators
pub trait Sketch: Clone + Debug {
    /// The type of item this sketch processes
    type Item: ?Sized;

    /// Add an item to the sketch
    fn update(&mut self, item: &Self::Item);

    /// Reset sketch to empty state
    fn clear(&mut self);

    /// Memory usage in bytes
    fn size_bytes(&self) -> usize;

    /// Number of items processed
    fn count(&self) -> u64;

    /// Check if sketch is empty
    fn is_empty(&self) -> bool {
        self.count() == 0
    }
}

/// Quantile estimation sketches
pub trait QuantileSketch: Sketch {
    /// The value type being tracked
    type Value: PartialOrd + Clone;

    /// Add a value to the sketch
    fn add(&mut self, value: Self::Value);

    /// Get quantile value at given rank (0.0 to 1.0)
    ///
    /// rank=0.5 returns the median
    fn quantile(&self, rank: f64) -> Option<Self::Value>;

    /// Get rank of a value (0.0 to 1.0)
    fn rank(&self, value: &Self::Value) -> f64;

    /// Get CDF value at given point
    fn cdf(&self, value: &Self::Value) -> f64 {
        self.rank(value)
    }

    /// Get minimum value seen
    fn min(&self) -> Option<Self::Value>;

    /// Get maximum value seen
    fn max(&self) -> Option<Self::Value>;

    /// Get median (50th percentile)
    fn median(&self) -> Option<Self::Value> {
        self.quantile(0.5)
    }

    /// Get multiple quantiles at once
    fn quantiles(&self, ranks: &[f64]) -> Vec<Option<Self::Value>> {
        ranks.iter().map(|&r| self.quantile(r)).collect()
    }
}
