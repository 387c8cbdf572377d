//! Dynamics processing for Soul Player
//!
//! This crate provides the per-channel compressor/limiter core:
//! - Envelope detection (peak, mean-square, RMS) with attack/release smoothing
//! - Threshold/ratio gain curve with quadratic soft knee
//! - Hard limiting with a look-ahead delay line, switchable per sample
//! - Parameter updates from a control thread over a bounded channel
//!
//! # Architecture
//!
//! ```text
//!          ┌──────────────────┐     ┌──────────────┐
//! input ─┬►│ EnvelopeDetector │ ──► │  Gain curve  │ ──┐
//!        │ └──────────────────┘     └──────────────┘   │ gain
//!        │ ┌──────────────────┐                        ▼
//!        └►│  LookAheadDelay  │ ── (limiting only) ──► × ──► output
//!          └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use soul_dynamics::Compressor;
//!
//! # fn example() -> soul_dynamics::Result<()> {
//! let mut comp = Compressor::new(-20.0, 4.0, 5.0, 50.0, 44100)?;
//!
//! let output = comp.process(0.5, false, 0.0);
//! println!("out {:.3}, gain {:.2} dB", output, comp.gain_reduction_db());
//!
//! // Limiting: output never exceeds the threshold
//! let limited = comp.process(1.0, true, 1.0);
//! assert!(limited.abs() <= soul_dynamics::db_to_linear(-20.0));
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

#![deny(unsafe_code)]

mod compressor;
mod control;
mod delay;
mod detector;
mod error;
mod gain;
mod settings;

pub use compressor::Compressor;
pub use control::{parameter_channel, ParameterReceiver, ParameterSender, PARAMETER_QUEUE_CAPACITY};
pub use delay::LookAheadDelay;
pub use detector::{DetectMode, EnvelopeDetector};
pub use error::{DynamicsError, Result};
pub use gain::{calc_compressor_gain, gain_reduction_db, GainPolicy};
pub use settings::{
    CompressorParameters, CompressorSettings, MAX_KNEE_DB, MAX_LOOKAHEAD_MS, MAX_THRESHOLD_DB,
    MAX_TIME_MS, MIN_THRESHOLD_DB, MIN_TIME_MS,
};

/// Level reported for silence, in dB
pub const SILENCE_DB: f32 = -200.0;

/// Largest magnitude the envelope detector sees (+80 dBFS)
///
/// Hotter samples are clamped on the detector path only; infinite samples
/// are replaced by this magnitude on the audio path too.
pub const MAX_INPUT_LEVEL: f32 = 10_000.0;

/// Convert dB to linear gain
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Convert linear amplitude to dB, `SILENCE_DB` for anything at or below 1e-10
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    if linear > 1e-10 {
        20.0 * linear.log10()
    } else {
        SILENCE_DB
    }
}
