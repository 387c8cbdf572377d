/// Compressor/limiter
///
/// Per-sample dynamics processor for one channel. Owns its envelope detector
/// and look-ahead delay line; nothing is shared between instances.
///
/// Signal flow for each sample:
/// input -> envelope detector -> gain curve (threshold/ratio/knee, or limiter)
///       -> (look-ahead delay when limiting) -> x gain -> output
use tracing::debug;

use crate::control::ParameterReceiver;
use crate::delay::LookAheadDelay;
use crate::detector::EnvelopeDetector;
use crate::error::{DynamicsError, Result};
use crate::gain::{calc_compressor_gain, GainPolicy};
use crate::settings::{clamp_knee, CompressorParameters, CompressorSettings};
use crate::{db_to_linear, linear_to_db, MAX_INPUT_LEVEL};

/// Compressor with optional look-ahead hard limiting
///
/// # Real-Time Safety
/// - Delay buffer is allocated in the constructor
/// - `process()` and `process_block()` never allocate, lock or log
/// - One instance per channel; `&mut self` keeps parameter updates and
///   processing from overlapping
///
/// # Look-ahead
/// The delay line is written on every call, limiting or not, so it is
/// always primed. With `limit_on` the output is the delayed sample; without
/// it the undelayed sample, so compression alone adds no latency.
pub struct Compressor {
    settings: CompressorSettings,
    sample_rate: u32,
    detector: EnvelopeDetector,
    delay: LookAheadDelay,
    threshold_linear: f32,
    last_gain: f32,
}

impl Compressor {
    /// Create a compressor with default knee, look-ahead and detection
    pub fn new(
        threshold_db: f32,
        ratio: f32,
        attack_ms: f32,
        release_ms: f32,
        sample_rate: u32,
    ) -> Result<Self> {
        let parameters = CompressorParameters::new(threshold_db, ratio, attack_ms, release_ms);
        Self::with_settings(CompressorSettings::new().with_parameters(parameters), sample_rate)
    }

    /// Create a compressor with specific settings
    pub fn with_settings(mut settings: CompressorSettings, sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(DynamicsError::invalid(format!(
                "sample rate must be greater than 0, got {} Hz",
                sample_rate
            )));
        }
        settings.validate()?;

        let parameters = settings.parameters;
        let detector = EnvelopeDetector::new(
            sample_rate,
            parameters.attack_ms,
            parameters.release_ms,
            settings.detect_mode,
        );
        let delay = LookAheadDelay::from_time(settings.lookahead_ms, sample_rate);

        debug!(
            "Compressor at {} Hz: {:.1} dB, {:.1}:1, {:.2}/{:.2} ms, knee {:.1} dB, look-ahead {} samples",
            sample_rate,
            parameters.threshold_db,
            parameters.ratio,
            parameters.attack_ms,
            parameters.release_ms,
            settings.knee_db,
            delay.delay_samples()
        );

        Ok(Self {
            settings,
            sample_rate,
            detector,
            delay,
            threshold_linear: db_to_linear(parameters.threshold_db),
            last_gain: 1.0,
        })
    }

    /// Update threshold, ratio, attack and release
    ///
    /// Takes effect on the next processed sample. Detector state and the
    /// delay buffer are left alone, so there is no discontinuity. On error
    /// nothing changes.
    pub fn set_parameters(
        &mut self,
        threshold_db: f32,
        ratio: f32,
        attack_ms: f32,
        release_ms: f32,
    ) -> Result<()> {
        let mut parameters = CompressorParameters::new(threshold_db, ratio, attack_ms, release_ms);
        parameters.validate()?;
        self.apply_parameters(parameters);

        debug!(
            "Compressor parameters: {:.1} dB, {:.1}:1, {:.2}/{:.2} ms",
            parameters.threshold_db, parameters.ratio, parameters.attack_ms, parameters.release_ms
        );
        Ok(())
    }

    /// Apply the newest parameters sent from another thread
    ///
    /// Call between blocks on the audio thread. Returns `true` if a set was
    /// applied. Lock-free; no allocation or logging.
    pub fn sync_parameters(&mut self, receiver: &ParameterReceiver) -> bool {
        match receiver.latest() {
            Some(parameters) => {
                self.apply_parameters(parameters);
                true
            }
            None => false,
        }
    }

    fn apply_parameters(&mut self, parameters: CompressorParameters) {
        self.settings.parameters = parameters;
        self.detector.set_times(parameters.attack_ms, parameters.release_ms);
        self.threshold_linear = db_to_linear(parameters.threshold_db);
    }

    /// Set knee width in dB (0 = hard knee, clamped to 0..=24)
    pub fn set_knee_width(&mut self, knee_db: f32) {
        self.settings.knee_db = clamp_knee(knee_db);
    }

    /// Process one sample
    ///
    /// `limit_on` switches to the limiter curve for this call only;
    /// `sensitivity` (0..=1) sets how far the ratio is pushed toward ∞:1.
    /// While limiting, output magnitude never exceeds the linear threshold.
    #[inline]
    pub fn process(&mut self, input: f32, limit_on: bool, sensitivity: f32) -> f32 {
        let input = sanitize_sample(input);

        self.detector.update(input);
        let detector_db = self.detector.level_db();

        let parameters = self.settings.parameters;
        let policy = GainPolicy::select(parameters.ratio, limit_on, sensitivity);
        let mut gain = calc_compressor_gain(
            detector_db,
            parameters.threshold_db,
            self.settings.knee_db,
            policy,
        );

        // Always written so switching to limiting never reads an unprimed line
        let delayed = self.delay.push_and_read(input);

        let output = if limit_on {
            let ceiling = self.threshold_linear;
            let magnitude = delayed.abs();
            if magnitude * gain > ceiling {
                gain = ceiling / magnitude;
            }
            (delayed * gain).clamp(-ceiling, ceiling)
        } else {
            input * gain
        };

        self.last_gain = gain;
        output
    }

    /// Process a mono buffer in place, one `process()` call per sample
    pub fn process_block(&mut self, buffer: &mut [f32], limit_on: bool, sensitivity: f32) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample, limit_on, sensitivity);
        }
    }

    /// Gain applied by the last `process()` call (linear, 0..=1)
    pub fn get_comp_gain(&self) -> f32 {
        self.last_gain
    }

    /// Gain applied by the last `process()` call, in dB
    pub fn gain_reduction_db(&self) -> f32 {
        linear_to_db(self.last_gain)
    }

    /// Current detector level in dB
    pub fn detector_level_db(&self) -> f32 {
        self.detector.level_db()
    }

    /// Clear detector and delay line (e.g. on seek)
    pub fn reset(&mut self) {
        self.detector.reset();
        self.delay.reset();
        self.last_gain = 1.0;
        debug!("Compressor reset");
    }

    /// Latency in samples added while limiting
    pub fn latency_samples(&self) -> usize {
        self.delay.delay_samples()
    }

    /// Latency in milliseconds added while limiting
    pub fn latency_ms(&self) -> f32 {
        self.delay.delay_samples() as f32 / self.sample_rate as f32 * 1000.0
    }

    /// Get current settings
    pub fn settings(&self) -> CompressorSettings {
        self.settings
    }

    /// Get current parameters
    pub fn parameters(&self) -> CompressorParameters {
        self.settings.parameters
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// NaN becomes silence and ±inf becomes ±`MAX_INPUT_LEVEL`; finite samples are untouched
#[inline]
fn sanitize_sample(sample: f32) -> f32 {
    if sample.is_finite() {
        sample
    } else if sample.is_nan() {
        0.0
    } else {
        MAX_INPUT_LEVEL.copysign(sample)
    }
}
