//! Compressor parameters and construction settings

use tracing::warn;

use crate::detector::DetectMode;
use crate::error::{DynamicsError, Result};

/// Shortest attack/release time accepted, in milliseconds
///
/// Zero or negative times are raised to this value so the coefficient
/// formula never divides by zero.
pub const MIN_TIME_MS: f32 = 0.01;

/// Longest attack/release time accepted, in milliseconds
pub const MAX_TIME_MS: f32 = 5000.0;

/// Lowest threshold accepted, in dB (matches the silence floor)
pub const MIN_THRESHOLD_DB: f32 = -200.0;

/// Highest threshold accepted, in dB
pub const MAX_THRESHOLD_DB: f32 = 200.0;

/// Widest soft knee accepted, in dB
pub const MAX_KNEE_DB: f32 = 24.0;

/// Longest look-ahead accepted, in milliseconds
pub const MAX_LOOKAHEAD_MS: f32 = 100.0;

/// The four tunables that may change while audio is running
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CompressorParameters {
    /// Threshold in dB
    /// Levels above this are compressed
    pub threshold_db: f32,

    /// Ratio (>= 1.0)
    /// 4.0 means 4 dB of input above threshold yields 1 dB of output
    pub ratio: f32,

    /// Attack time in milliseconds
    pub attack_ms: f32,

    /// Release time in milliseconds
    pub release_ms: f32,
}

impl CompressorParameters {
    /// Create a parameter set
    pub fn new(threshold_db: f32, ratio: f32, attack_ms: f32, release_ms: f32) -> Self {
        Self {
            threshold_db,
            ratio,
            attack_ms,
            release_ms,
        }
    }

    /// Validate and clamp parameters in place
    ///
    /// Rejects a non-positive or non-finite ratio. The threshold is clamped
    /// into `MIN_THRESHOLD_DB..=MAX_THRESHOLD_DB` (NaN becomes 0 dB), ratios
    /// below 1:1 are raised to 1:1 and time constants are clamped into
    /// `MIN_TIME_MS..=MAX_TIME_MS`.
    pub fn validate(&mut self) -> Result<()> {
        self.threshold_db = clamp_threshold(self.threshold_db);
        if !self.ratio.is_finite() || self.ratio <= 0.0 {
            return Err(DynamicsError::invalid(format!(
                "ratio must be positive and finite, got {}",
                self.ratio
            )));
        }
        if self.ratio < 1.0 {
            warn!("Compressor ratio {} below 1:1, using 1:1", self.ratio);
            self.ratio = 1.0;
        }
        self.attack_ms = clamp_time("attack", self.attack_ms);
        self.release_ms = clamp_time("release", self.release_ms);
        Ok(())
    }
}

impl Default for CompressorParameters {
    fn default() -> Self {
        CompressorSettings::new().parameters
    }
}

fn clamp_threshold(threshold_db: f32) -> f32 {
    if threshold_db.is_nan() {
        warn!("Compressor threshold is NaN, using 0 dB");
        0.0
    } else if threshold_db < MIN_THRESHOLD_DB {
        warn!("Compressor threshold {} dB out of range, using {} dB", threshold_db, MIN_THRESHOLD_DB);
        MIN_THRESHOLD_DB
    } else if threshold_db > MAX_THRESHOLD_DB {
        warn!("Compressor threshold {} dB out of range, using {} dB", threshold_db, MAX_THRESHOLD_DB);
        MAX_THRESHOLD_DB
    } else {
        threshold_db
    }
}

fn clamp_time(name: &str, time_ms: f32) -> f32 {
    if !time_ms.is_finite() || time_ms < MIN_TIME_MS {
        warn!("Compressor {} time {} ms out of range, using {} ms", name, time_ms, MIN_TIME_MS);
        MIN_TIME_MS
    } else if time_ms > MAX_TIME_MS {
        warn!("Compressor {} time {} ms out of range, using {} ms", name, time_ms, MAX_TIME_MS);
        MAX_TIME_MS
    } else {
        time_ms
    }
}

/// Compressor settings
///
/// `parameters` may be changed later with `Compressor::set_parameters`.
/// `lookahead_ms` and `detect_mode` are fixed once the compressor is built.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CompressorSettings {
    /// Threshold, ratio, attack and release
    pub parameters: CompressorParameters,

    /// Knee width in dB (0 to 24)
    /// Softens the transition at the threshold (0 = hard knee)
    pub knee_db: f32,

    /// Look-ahead time in milliseconds (0 to 100)
    /// Delay applied to the audio path while limiting
    pub lookahead_ms: f32,

    /// How the envelope detector measures level
    pub detect_mode: DetectMode,
}

impl CompressorSettings {
    /// Create default compressor settings
    /// - Threshold: -20 dB
    /// - Ratio: 4:1
    /// - Attack: 5 ms
    /// - Release: 50 ms
    /// - Soft knee: 6 dB
    /// - Look-ahead: 1.5 ms
    /// - Peak detection
    pub fn new() -> Self {
        Self {
            parameters: CompressorParameters::new(-20.0, 4.0, 5.0, 50.0),
            knee_db: 6.0,
            lookahead_ms: 1.5,
            detect_mode: DetectMode::Peak,
        }
    }

    /// Create settings for gentle compression (vocals, acoustic)
    pub fn gentle() -> Self {
        Self {
            parameters: CompressorParameters::new(-15.0, 2.5, 10.0, 100.0),
            knee_db: 8.0,
            ..Self::new()
        }
    }

    /// Create settings for moderate compression (mix bus)
    pub fn moderate() -> Self {
        Self {
            parameters: CompressorParameters::new(-18.0, 4.0, 5.0, 50.0),
            ..Self::new()
        }
    }

    /// Create settings for aggressive compression
    pub fn aggressive() -> Self {
        Self {
            parameters: CompressorParameters::new(-12.0, 10.0, 1.0, 30.0),
            knee_db: 2.0,
            ..Self::new()
        }
    }

    /// Create settings meant to be driven with limiting on
    pub fn brickwall() -> Self {
        Self {
            parameters: CompressorParameters::new(-0.3, 20.0, 0.1, 100.0),
            knee_db: 0.0,
            lookahead_ms: 1.5,
            detect_mode: DetectMode::Peak,
        }
    }

    /// Replace the four tunables, keeping knee, look-ahead and detection
    pub fn with_parameters(mut self, parameters: CompressorParameters) -> Self {
        self.parameters = parameters;
        self
    }

    /// Validate and clamp settings in place
    pub fn validate(&mut self) -> Result<()> {
        self.parameters.validate()?;
        self.knee_db = clamp_knee(self.knee_db);

        if !self.lookahead_ms.is_finite()
            || self.lookahead_ms < 0.0
            || self.lookahead_ms > MAX_LOOKAHEAD_MS
        {
            return Err(DynamicsError::invalid(format!(
                "look-ahead must be within 0..={} ms, got {} ms",
                MAX_LOOKAHEAD_MS, self.lookahead_ms
            )));
        }
        Ok(())
    }
}

impl Default for CompressorSettings {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn clamp_knee(knee_db: f32) -> f32 {
    if !knee_db.is_finite() || knee_db < 0.0 {
        warn!("Knee width {} dB out of range, using hard knee", knee_db);
        0.0
    } else if knee_db > MAX_KNEE_DB {
        warn!("Knee width {} dB out of range, using {} dB", knee_db, MAX_KNEE_DB);
        MAX_KNEE_DB
    } else {
        knee_db
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preset_settings_are_valid() {
        for mut settings in [
            CompressorSettings::new(),
            CompressorSettings::gentle(),
            CompressorSettings::moderate(),
            CompressorSettings::aggressive(),
            CompressorSettings::brickwall(),
        ] {
            let before = settings;
            assert!(settings.validate().is_ok());
            assert_eq!(settings, before, "presets should need no clamping");
        }
    }

    #[test]
    fn preset_ratios() {
        assert_eq!(CompressorSettings::gentle().parameters.ratio, 2.5);
        assert_eq!(CompressorSettings::moderate().parameters.ratio, 4.0);
        assert_eq!(CompressorSettings::aggressive().parameters.ratio, 10.0);
    }

    #[test]
    fn times_are_clamped_not_rejected() {
        let mut params = CompressorParameters::new(-20.0, 4.0, 0.0, -5.0);
        assert!(params.validate().is_ok());
        assert_eq!(params.attack_ms, MIN_TIME_MS);
        assert_eq!(params.release_ms, MIN_TIME_MS);

        let mut params = CompressorParameters::new(-20.0, 4.0, f32::NAN, 1.0e9);
        assert!(params.validate().is_ok());
        assert_eq!(params.attack_ms, MIN_TIME_MS);
        assert_eq!(params.release_ms, MAX_TIME_MS);
    }

    #[test]
    fn non_positive_ratio_rejected() {
        for ratio in [0.0, -2.0, f32::NAN, f32::INFINITY] {
            let mut params = CompressorParameters::new(-20.0, ratio, 5.0, 50.0);
            assert!(
                matches!(params.validate(), Err(DynamicsError::InvalidConfiguration(_))),
                "ratio {} should be rejected",
                ratio
            );
        }
    }

    #[test]
    fn ratio_below_unity_raised() {
        let mut params = CompressorParameters::new(-20.0, 0.5, 5.0, 50.0);
        assert!(params.validate().is_ok());
        assert_eq!(params.ratio, 1.0);
    }

    #[test]
    fn non_finite_threshold_clamped() {
        let mut params = CompressorParameters::new(f32::NEG_INFINITY, 4.0, 5.0, 50.0);
        assert!(params.validate().is_ok());
        assert_eq!(params.threshold_db, MIN_THRESHOLD_DB);

        params.threshold_db = f32::INFINITY;
        assert!(params.validate().is_ok());
        assert_eq!(params.threshold_db, MAX_THRESHOLD_DB);

        params.threshold_db = f32::NAN;
        assert!(params.validate().is_ok());
        assert_eq!(params.threshold_db, 0.0);

        params.threshold_db = -1000.0;
        assert!(params.validate().is_ok());
        assert_eq!(params.threshold_db, MIN_THRESHOLD_DB);
    }

    #[test]
    fn extreme_threshold_accepted() {
        let mut params = CompressorParameters::new(-150.0, 4.0, 5.0, 50.0);
        assert!(params.validate().is_ok());
        assert_eq!(params.threshold_db, -150.0);
    }

    #[test]
    fn knee_clamped() {
        let mut settings = CompressorSettings { knee_db: -3.0, ..CompressorSettings::new() };
        assert!(settings.validate().is_ok());
        assert_eq!(settings.knee_db, 0.0);

        settings.knee_db = 100.0;
        assert!(settings.validate().is_ok());
        assert_eq!(settings.knee_db, MAX_KNEE_DB);
    }

    #[test]
    fn lookahead_out_of_range_rejected() {
        for lookahead_ms in [-1.0, 250.0, f32::NAN] {
            let mut settings = CompressorSettings { lookahead_ms, ..CompressorSettings::new() };
            assert!(settings.validate().is_err());
        }
    }
}
