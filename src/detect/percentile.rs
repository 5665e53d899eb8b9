//! Nearest-rank percentile over byte-valued samples.
//!
//! The adaptive person threshold is the percentile of the current frame's
//! heat-channel distribution, recomputed for every processed frame. Samples
//! are always intensities in [0, 255], so a 256-bin histogram walk gives the
//! exact nearest-rank answer in O(N) without sorting.

use std::error::Error;
use std::fmt;

/// Returned when a percentile is requested over an empty sample set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EmptyInputError;

impl fmt::Display for EmptyInputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "percentile over empty input")
    }
}

impl Error for EmptyInputError {}

/// Value at sorted index `floor(p/100 * N)`, clamped to `[0, N-1]`.
///
/// Nearest-rank method: no interpolation between adjacent ranks. `p` is
/// clamped to [0, 100]. Monotonic in `p` for a fixed sample set.
pub fn percentile(samples: &[u8], p: f64) -> Result<u8, EmptyInputError> {
    if samples.is_empty() {
        return Err(EmptyInputError);
    }

    let mut histogram = [0usize; 256];
    for &sample in samples {
        histogram[sample as usize] += 1;
    }

    let p = p.clamp(0.0, 100.0);
    let rank = ((p / 100.0) * samples.len() as f64).floor() as usize;
    let rank = rank.min(samples.len() - 1);

    let mut seen = 0usize;
    for (value, &count) in histogram.iter().enumerate() {
        seen += count;
        if seen > rank {
            return Ok(value as u8);
        }
    }

    // Unreachable: the histogram counts sum to samples.len() > rank.
    Ok(255)
}
