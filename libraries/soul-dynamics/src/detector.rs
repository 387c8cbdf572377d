//! Envelope detector
//!
//! One-pole level follower with separate attack and release coefficients.
//! The attack coefficient is used while the input is above the current
//! estimate, the release coefficient while it is below.

use crate::settings::MIN_TIME_MS;
use crate::{linear_to_db, MAX_INPUT_LEVEL};

/// Estimates below this are flushed to zero to keep denormals out of the loop
const DENORMAL_FLOOR: f32 = 1.0e-25;

/// How the detector measures signal level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DetectMode {
    /// Follow |x|
    #[default]
    Peak,
    /// Follow x², reported as power
    MeanSquare,
    /// Follow x², reported as its square root
    Rms,
}

/// Smoothed level follower
///
/// # Real-Time Safety
/// `update()` does no allocation, locking or logging.
#[derive(Debug, Clone)]
pub struct EnvelopeDetector {
    mode: DetectMode,
    sample_rate: u32,
    attack_ms: f32,
    release_ms: f32,
    attack_coeff: f32,
    release_coeff: f32,
    // Peak: linear magnitude. MeanSquare/Rms: power.
    state: f32,
}

impl EnvelopeDetector {
    /// Create a detector; times below `MIN_TIME_MS` are raised to it
    pub fn new(sample_rate: u32, attack_ms: f32, release_ms: f32, mode: DetectMode) -> Self {
        let mut detector = Self {
            mode,
            sample_rate: sample_rate.max(1),
            attack_ms: 0.0,
            release_ms: 0.0,
            attack_coeff: 0.0,
            release_coeff: 0.0,
            state: 0.0,
        };
        detector.set_times(attack_ms, release_ms);
        detector
    }

    /// Change attack/release times and recompute coefficients
    ///
    /// The current estimate is kept so the output stays continuous.
    pub fn set_times(&mut self, attack_ms: f32, release_ms: f32) {
        self.attack_ms = sanitize_time(attack_ms);
        self.release_ms = sanitize_time(release_ms);
        self.attack_coeff = Self::coefficient(self.attack_ms, self.sample_rate);
        self.release_coeff = Self::coefficient(self.release_ms, self.sample_rate);
    }

    /// `exp(-1 / (time_s * sample_rate))`
    ///
    /// After `time_ms` of a constant input the estimate has covered
    /// 63.2% (1 - 1/e) of the distance to it.
    pub fn coefficient(time_ms: f32, sample_rate: u32) -> f32 {
        let time_samples = sanitize_time(time_ms) * 0.001 * sample_rate.max(1) as f32;
        (-1.0 / time_samples).exp()
    }

    /// Feed one input magnitude, return the level estimate (linear)
    ///
    /// Negative values are treated by magnitude. NaN counts as silence and
    /// anything above `MAX_INPUT_LEVEL` is clamped, so the estimate always
    /// stays finite.
    #[inline]
    pub fn update(&mut self, input_magnitude: f32) -> f32 {
        let magnitude = sanitize_magnitude(input_magnitude);
        let target = match self.mode {
            DetectMode::Peak => magnitude,
            DetectMode::MeanSquare | DetectMode::Rms => magnitude * magnitude,
        };

        let coeff = if target > self.state {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        self.state = target + coeff * (self.state - target);

        if self.state < DENORMAL_FLOOR {
            self.state = 0.0;
        }

        self.level()
    }

    /// Current estimate without advancing (linear)
    #[inline]
    pub fn level(&self) -> f32 {
        match self.mode {
            DetectMode::Peak | DetectMode::MeanSquare => self.state,
            DetectMode::Rms => self.state.sqrt(),
        }
    }

    /// Current estimate in dB
    ///
    /// Mean-square is a power quantity, so it uses 10·log10.
    #[inline]
    pub fn level_db(&self) -> f32 {
        match self.mode {
            DetectMode::MeanSquare => linear_to_db(self.state.sqrt()),
            DetectMode::Peak | DetectMode::Rms => linear_to_db(self.level()),
        }
    }

    /// Clear the estimate to silence
    pub fn reset(&mut self) {
        self.state = 0.0;
    }

    pub fn mode(&self) -> DetectMode {
        self.mode
    }

    pub fn attack_ms(&self) -> f32 {
        self.attack_ms
    }

    pub fn release_ms(&self) -> f32 {
        self.release_ms
    }

    pub fn attack_coeff(&self) -> f32 {
        self.attack_coeff
    }

    pub fn release_coeff(&self) -> f32 {
        self.release_coeff
    }
}

#[inline]
fn sanitize_time(time_ms: f32) -> f32 {
    if time_ms.is_finite() && time_ms >= MIN_TIME_MS {
        time_ms
    } else {
        MIN_TIME_MS
    }
}

#[inline]
pub(crate) fn sanitize_magnitude(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.abs().min(MAX_INPUT_LEVEL)
    }
}
