//! Static gain computation
//!
//! Pure functions of detector level and settings; no state is carried
//! between calls.

use crate::db_to_linear;

/// Gain curve chosen per call
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GainPolicy {
    /// Ordinary compression at `ratio`:1
    Compress { ratio: f32 },
    /// Limiting: slope pushed from `ratio` toward ∞:1 by `sensitivity` (0..=1)
    Limit { ratio: f32, sensitivity: f32 },
}

impl GainPolicy {
    /// Pick the policy for one `process` call
    #[inline]
    pub fn select(ratio: f32, limit_on: bool, sensitivity: f32) -> Self {
        if limit_on {
            Self::Limit { ratio, sensitivity }
        } else {
            Self::Compress { ratio }
        }
    }

    /// Compression slope `1 - 1/ratio`
    ///
    /// 0 means no compression, 1 means ∞:1. For `Limit` the ratio's slope is
    /// interpolated toward 1 by the clamped sensitivity; a non-finite
    /// sensitivity means full limiting.
    #[inline]
    pub fn slope(self) -> f32 {
        match self {
            Self::Compress { ratio } => ratio_slope(ratio),
            Self::Limit { ratio, sensitivity } => {
                let base = ratio_slope(ratio);
                let sensitivity = if sensitivity.is_finite() {
                    sensitivity.clamp(0.0, 1.0)
                } else {
                    1.0
                };
                base + (1.0 - base) * sensitivity
            }
        }
    }

    pub fn is_limiting(self) -> bool {
        matches!(self, Self::Limit { .. })
    }
}

#[inline]
fn ratio_slope(ratio: f32) -> f32 {
    if ratio <= 1.0 {
        0.0
    } else {
        1.0 - 1.0 / ratio
    }
}

/// Gain change in dB (always <= 0) for a detector level
///
/// - below `threshold - knee/2`: 0 dB
/// - inside the knee: quadratic blend `-slope * (x - knee_start)² / (2 * knee)`
/// - above the knee: `slope * (threshold - level)`
#[inline]
pub fn gain_reduction_db(detector_db: f32, threshold_db: f32, slope: f32, knee_db: f32) -> f32 {
    if slope <= 0.0 {
        return 0.0;
    }

    if knee_db > 0.0 {
        let half_knee = knee_db / 2.0;
        let knee_start = threshold_db - half_knee;
        let knee_end = threshold_db + half_knee;

        if detector_db <= knee_start {
            0.0
        } else if detector_db >= knee_end {
            slope * (threshold_db - detector_db)
        } else {
            let x = detector_db - knee_start;
            -slope * x * x / (2.0 * knee_db)
        }
    } else if detector_db <= threshold_db {
        0.0
    } else {
        slope * (threshold_db - detector_db)
    }
}

/// Linear gain multiplier (0..=1) for a detector level
#[inline]
pub fn calc_compressor_gain(
    detector_db: f32,
    threshold_db: f32,
    knee_db: f32,
    policy: GainPolicy,
) -> f32 {
    let gr_db = gain_reduction_db(detector_db, threshold_db, policy.slope(), knee_db);
    db_to_linear(gr_db).min(1.0)
}
