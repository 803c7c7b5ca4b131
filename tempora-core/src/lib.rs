// tempora-core/src/lib.rs

//! The core logic for the Tempora metronome and tuner.
//! This crate is responsible for beat scheduling, click synthesis,
//! audio capture, pitch detection and note mapping. It is completely
//! headless and contains no GUI code.

pub mod audio;
pub mod click;
pub mod clock;
pub mod config;
pub mod pitch;
pub mod scheduler;
pub mod session;
pub mod tuning;

/// The result of analyzing a single captured audio frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TunerReading {
    /// The detected fundamental frequency in Hz.
    pub frequency: Option<f32>,
    /// The nearest equal-tempered pitch class ("C", "C#", ...).
    pub note_name: Option<&'static str>,
    /// The deviation from that note in cents (positive = sharp).
    pub cents: Option<f32>,
}

impl TunerReading {
    /// The neutral reading for silence or unreliable frames.
    pub const UNDETECTED: Self = Self {
        frequency: None,
        note_name: None,
        cents: None,
    };

    pub fn is_detected(&self) -> bool {
        self.frequency.is_some()
    }
}
