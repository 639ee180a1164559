//! # psquare
//!
//! Memory-bounded streaming quantile estimation for Rust.
//!
//! psquare implements the P² (piecewise-parabolic) algorithm of Jain and
//! Chlamtac: five markers track the minimum, three target quantiles and the
//! maximum of a stream, and are nudged towards their ideal ranks as each
//! observation arrives. Every update is O(1) in time and space, and no
//! observation is ever stored.
//!
//! ## Features
//!
//! - **Value-semantics state**: [`P2State`] is a `Copy` value; each observation
//!   produces a new state, so independent owners never interfere
//! - **Streaming wrapper**: [`PSquare`] accepts a stream from its first value and
//!   answers exactly until the markers are seeded
//! - **Batch driver**: [`estimate`] turns a whole slice into a single percentile
//!
//! ## Quick Start
//!
//! ```rust
//! use psquare::prelude::*;
//!
//! // Track p95 latency (markers at p47.5, p95, p97.5)
//! let mut latency = PSquare::with_quantile(0.95).unwrap();
//! for ms in 1..=1000 {
//!     latency.add(ms as f64);
//! }
//! println!("p95 latency: ~{:?}", latency.quantile(0.95));
//! ```
//!
//! ## Threading States By Value
//!
//! ```rust
//! use psquare::quantiles::{P2State, Targets};
//!
//! let targets = Targets::new(0.1, 0.5, 0.9).unwrap();
//! let mut state = P2State::new([5.0, 1.0, 4.0, 2.0, 3.0], targets);
//! for value in 6..=100 {
//!     state = state.observe(value as f64);
//! }
//! let [(_, p10), (_, p50), (_, p90)] = state.estimates();
//! assert!(p10 < p50 && p50 < p90);
//! ```
//!
//! ## Feature Flags
//!
//! - `std` (default): Standard library support
//! - `serde`: Enable serialization of estimator state
//! - `tracing`: Emit marker-adjustment diagnostics through `tracing`

#![cfg_attr(not(feature = "std"), no_std)]
#![cfg_attr(docsrs, feature(doc_cfg))]

#[cfg(not(feature = "std"))]
extern crate alloc;

// Diagnostics compile to nothing unless the `tracing` feature is on.
macro_rules! p2_trace {
    ($($arg:tt)*) => {{
        #[cfg(feature = "tracing")]
        { tracing::trace!($($arg)*); }
    }};
}

macro_rules! p2_debug {
    ($($arg:tt)*) => {{
        #[cfg(feature = "tracing")]
        { tracing::debug!($($arg)*); }
    }};
}

macro_rules! p2_error {
    ($($arg:tt)*) => {{
        #[cfg(feature = "tracing")]
        { tracing::error!($($arg)*); }
    }};
}

// Core traits always available
pub mod traits;

mod math;

pub mod quantiles;

pub mod prelude {
    pub use crate::traits::*;

    pub use crate::quantiles::{estimate, P2State, PSquare, Targets};
}

pub use quantiles::{estimate, P2State, PSquare, Targets};
pub use traits::EstimatorError;
