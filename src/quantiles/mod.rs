//! Quantile estimation with the P² algorithm
//!
//! This module provides memory-bounded estimators for percentiles of a data
//! stream. No observation is stored; five markers summarize the stream.
//!
//! # Types
//!
//! - [`Targets`]: the three ascending quantile fractions an estimator tracks
//! - [`P2State`]: the marker state, threaded by value through [`P2State::observe`]
//! - [`PSquare`]: a streaming wrapper that accepts values from the first one
//!
//! # Example
//!
//! ```
//! use psquare::quantiles::PSquare;
//! use psquare::traits::QuantileSketch;
//!
//! let mut estimator = PSquare::with_quantile(0.5).unwrap();
//!
//! for value in [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0] {
//!     estimator.add(value);
//! }
//!
//! let median = estimator.median();
//! println!("Median: {:?}", median);
//! ```

mod estimator;
mod state;
mod targets;

pub use estimator::PSquare;
pub use state::{P2State, MARKERS};
pub use targets::Targets;

use crate::traits::EstimatorError;

/// Estimate quantile `p` of a whole sequence in one pass
///
/// Seeds the markers with the first five observations, folds in the rest
/// in order, and returns the middle marker's height.
///
/// # Errors
///
/// - [`EstimatorError::InsufficientData`] if fewer than five observations are given
/// - [`EstimatorError::InvalidQuantiles`] unless `0 < p < 1`
///
/// # Example
///
/// ```
/// use psquare::quantiles::estimate;
///
/// let data: Vec<f64> = (0..=10).map(f64::from).collect();
/// assert_eq!(estimate(&data, 0.5).unwrap(), 5.0);
///
/// assert!(estimate(&[1.0, 2.0, 3.0, 4.0], 0.5).is_err());
/// ```
pub fn estimate(observations: &[f64], p: f64) -> Result<f64, EstimatorError> {
    if observations.len() < MARKERS {
        p2_debug!(found = observations.len(), "not enough observations to seed markers");
        return Err(EstimatorError::InsufficientData {
            required: MARKERS,
            found: observations.len(),
        });
    }

    let (seed, rest) = observations.split_at(MARKERS);
    let state = P2State::from_slice(seed, Targets::around(p)?)?;
    Ok(state.observe_all(rest.iter().copied()).middle_estimate())
}
