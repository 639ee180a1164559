//! Target quantile fractions for the three interior markers

use crate::traits::EstimatorError;

/// Three ascending quantile fractions tracked by one estimator
///
/// The fractions are validated once at construction and are immutable
/// afterwards, so every [`P2State`](super::P2State) built from a `Targets`
/// can rely on `0 < lower < middle < upper < 1`.
///
/// # Example
///
/// ```
/// use psquare::quantiles::Targets;
///
/// // Centre the markers on p90: tracks p45, p90 and p95
/// let targets = Targets::around(0.9).unwrap();
/// assert_eq!(targets.fractions(), [0.45, 0.9, 0.95]);
///
/// // Or pick the three fractions directly
/// let targets = Targets::new(0.5, 0.9, 0.99).unwrap();
/// assert_eq!(targets.middle(), 0.9);
///
/// assert!(Targets::new(0.5, 0.3, 0.7).is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Targets {
    fractions: [f64; 3],
}

impl Targets {
    /// Create targets from three explicit fractions
    ///
    /// # Errors
    ///
    /// Returns [`EstimatorError::InvalidQuantiles`] unless
    /// `0 < lower < middle < upper < 1`. NaN fails every comparison and is
    /// rejected too.
    pub fn new(lower: f64, middle: f64, upper: f64) -> Result<Self, EstimatorError> {
        let ascending = 0.0 < lower && lower < middle && middle < upper && upper < 1.0;
        if !ascending {
            p2_debug!(lower, middle, upper, "rejecting quantile targets");
            return Err(EstimatorError::InvalidQuantiles {
                lower,
                middle,
                upper,
            });
        }

        Ok(Self {
            fractions: [lower, middle, upper],
        })
    }

    /// Create targets centred on a single fraction `p`
    ///
    /// The outer markers sit halfway between `p` and the extremes:
    /// `p/2`, `p`, `(1+p)/2`.
    pub fn around(p: f64) -> Result<Self, EstimatorError> {
        Self::new(p / 2.0, p, (1.0 + p) / 2.0)
    }

    /// All three fractions in ascending order
    pub fn fractions(&self) -> [f64; 3] {
        self.fractions
    }

    pub fn lower(&self) -> f64 {
        self.fractions[0]
    }

    /// The fraction a single-quantile estimator reports
    pub fn middle(&self) -> f64 {
        self.fractions[1]
    }

    pub fn upper(&self) -> f64 {
        self.fractions[2]
    }
}

/// Quartiles: 0.25, 0.5, 0.75
impl Default for Targets {
    fn default() -> Self {
        Self {
            fractions: [0.25, 0.5, 0.75],
        }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Targets {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeTuple;
        let mut tuple = serializer.serialize_tuple(3)?;
        for fraction in &self.fractions {
            tuple.serialize_element(fraction)?;
        }
        tuple.end()
    }
}
