//! Math function wrappers for std/no_std compatibility
//!
//! Uses standard library math when available, falls back to libm for no_std.

#[cfg(feature = "std")]
#[inline]
pub fn round(x: f64) -> f64 {
    x.round()
}

#[cfg(not(feature = "std"))]
#[inline]
pub fn round(x: f64) -> f64 {
    libm::round(x)
}

/// Nearest-rank index of fraction `q` among `n` sorted values
///
/// `q` is clamped to [0, 1]; `n` must be non-zero.
#[inline]
pub fn nearest_rank(q: f64, n: usize) -> usize {
    let last = n - 1;
    let idx = round(q.clamp(0.0, 1.0) * last as f64) as usize;
    idx.min(last)
}
