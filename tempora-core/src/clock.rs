//! # Clock and Sink Abstractions
//!
//! The beat scheduler never talks to a live output stream directly. It
//! reads time from an [`AudioClock`] and hands click events to a
//! [`ClickSink`], which lets tests drive it with fakes instead of real
//! audio hardware.

/// A monotonically increasing high-resolution time reference, in seconds.
pub trait AudioClock {
    fn now(&self) -> f64;
}

/// Accepts click events scheduled at an absolute clock time.
///
/// Final timing accuracy is the sink's responsibility: the caller may run
/// on a coarse, jittery cadence as long as it stays ahead of the clock.
pub trait ClickSink {
    fn play_click(&mut self, at: f64, accented: bool);
}

/// The production clock: time derived from the number of frames the
/// output stream has rendered so far.
///
/// Advanced once per stream callback, so it is sample-accurate and immune
/// to wall-clock timer jitter.
#[derive(Debug, Clone, Copy)]
pub struct SampleClock {
    sample_rate: u32,
    samples_elapsed: u64,
}

impl SampleClock {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            samples_elapsed: 0,
        }
    }

    /// Absolute position of the next frame to be rendered.
    pub fn position(&self) -> u64 {
        self.samples_elapsed
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Advances the clock by a rendered buffer's worth of frames.
    pub fn advance(&mut self, frames: u64) {
        self.samples_elapsed += frames;
    }
}

impl AudioClock for SampleClock {
    fn now(&self) -> f64 {
        self.samples_elapsed as f64 / self.sample_rate as f64
    }
}
