//! Linear-interpolation percentile.
//!
//! For ascending `sorted` of length n and percentile p ∈ [0, 100]:
//!   rank = p / 100 · (n − 1)
//!   value = sorted[⌊rank⌋] + (rank − ⌊rank⌋) · (sorted[⌈rank⌉] − sorted[⌊rank⌋])
//!
//! This is the "linear" method of Hyndman & Fan (type 7), the default of most
//! array libraries. Nearest-rank and midpoint variants shift published
//! thresholds, so the method is fixed here.

/// Percentile of already-sorted values. `None` for an empty slice.
/// `p` is clamped into [0, 100].
pub fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    (!sorted.is_empty()).then(|| interpolate(sorted, p))
}

/// [`percentile`] for a slice the caller has already checked is non-empty.
pub(crate) fn interpolate(sorted: &[f64], p: f64) -> f64 {
    let rank = (p.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + frac * (sorted[hi] - sorted[lo])
}
