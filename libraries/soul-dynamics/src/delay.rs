//! Look-ahead delay line
//!
//! Fixed-capacity ring buffer that delays the audio path by a whole number
//! of samples. Starts zero-filled, so the first `delay_samples()` reads are
//! silence.

/// Ring buffer delay of constant length
///
/// # Real-Time Safety
/// - Buffer is allocated once in `new()`
/// - `write()`, `read()` and `push_and_read()` never allocate
pub struct LookAheadDelay {
    // delay_samples + 1 slots, so a write followed by a read in the same
    // call can serve a zero-length delay
    buffer: Box<[f32]>,
    write_pos: usize,
    read_pos: usize,
    delay_samples: usize,
}

impl LookAheadDelay {
    /// Create a delay of `delay_samples` samples
    pub fn new(delay_samples: usize) -> Self {
        let capacity = delay_samples + 1;
        Self {
            buffer: vec![0.0; capacity].into_boxed_slice(),
            write_pos: 0,
            read_pos: 1 % capacity,
            delay_samples,
        }
    }

    /// Create a delay sized from a time and sample rate
    ///
    /// Length is `round(time_ms * sample_rate / 1000)`.
    pub fn from_time(time_ms: f32, sample_rate: u32) -> Self {
        Self::new(Self::samples_for(time_ms, sample_rate))
    }

    /// Number of samples a delay of `time_ms` needs at `sample_rate`
    pub fn samples_for(time_ms: f32, sample_rate: u32) -> usize {
        if !time_ms.is_finite() || time_ms <= 0.0 {
            return 0;
        }
        (time_ms * 0.001 * sample_rate as f32).round() as usize
    }

    /// Store one sample at the write cursor and advance it
    #[inline]
    pub fn write(&mut self, sample: f32) {
        self.buffer[self.write_pos] = sample;
        self.write_pos = self.advance(self.write_pos);
    }

    /// Return the sample written `delay_samples()` writes ago and advance
    ///
    /// Call once after each `write()`.
    #[inline]
    pub fn read(&mut self) -> f32 {
        let value = self.buffer[self.read_pos];
        self.read_pos = self.advance(self.read_pos);
        value
    }

    /// `write(sample)` followed by `read()`
    #[inline]
    pub fn push_and_read(&mut self, sample: f32) -> f32 {
        self.write(sample);
        self.read()
    }

    #[inline]
    fn advance(&self, pos: usize) -> usize {
        let next = pos + 1;
        if next == self.buffer.len() {
            0
        } else {
            next
        }
    }

    /// Delay length in samples
    pub fn delay_samples(&self) -> usize {
        self.delay_samples
    }

    /// Refill with silence and realign the cursors
    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
        self.read_pos = 1 % self.buffer.len();
    }
}
