//! Parameter updates from a control thread to the audio thread
//!
//! The control thread sends whole `CompressorParameters` sets through a
//! bounded crossbeam channel. The audio thread drains it between blocks with
//! `Compressor::sync_parameters()` and applies only the newest set.
//! `try_recv` never blocks or allocates, so the drain is safe on the audio
//! thread.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use tracing::debug;

use crate::error::Result;
use crate::settings::CompressorParameters;

/// Parameter sets that may wait for the audio thread before the oldest is dropped
pub const PARAMETER_QUEUE_CAPACITY: usize = 32;

/// Create a connected sender/receiver pair
pub fn parameter_channel() -> (ParameterSender, ParameterReceiver) {
    let (tx, rx) = bounded(PARAMETER_QUEUE_CAPACITY);
    let sender = ParameterSender {
        tx,
        overflow: rx.clone(),
    };
    (sender, ParameterReceiver { rx })
}

/// Control-thread end of a parameter channel
///
/// Clone it to update one compressor from several threads.
#[derive(Debug, Clone)]
pub struct ParameterSender {
    tx: Sender<CompressorParameters>,
    // Pops the oldest pending set when the queue is full
    overflow: Receiver<CompressorParameters>,
}

impl ParameterSender {
    /// Validate and queue a parameter set
    ///
    /// Invalid sets are rejected here, so the audio thread only ever sees
    /// values that passed validation. Never blocks: if the audio thread has
    /// fallen behind, the oldest pending set is discarded.
    pub fn send(&self, mut parameters: CompressorParameters) -> Result<()> {
        parameters.validate()?;

        let mut pending = parameters;
        loop {
            match self.tx.try_send(pending) {
                Ok(()) => break,
                Err(TrySendError::Full(rejected)) => {
                    self.overflow.try_recv().ok();
                    pending = rejected;
                }
                // `overflow` keeps a receiver alive, so the channel cannot disconnect
                Err(TrySendError::Disconnected(_)) => break,
            }
        }

        debug!(
            "Queued compressor parameters: {:.1} dB, {:.1}:1, {:.2}/{:.2} ms",
            parameters.threshold_db, parameters.ratio, parameters.attack_ms, parameters.release_ms
        );
        Ok(())
    }

    /// Number of sets waiting for the audio thread
    pub fn pending(&self) -> usize {
        self.tx.len()
    }
}

/// Audio-thread end of a parameter channel
#[derive(Debug)]
pub struct ParameterReceiver {
    rx: Receiver<CompressorParameters>,
}

impl ParameterReceiver {
    /// Drain the queue and return the newest set, if any arrived
    #[inline]
    pub fn latest(&self) -> Option<CompressorParameters> {
        let mut latest = None;
        while let Ok(parameters) = self.rx.try_recv() {
            latest = Some(parameters);
        }
        latest
    }
}
