//! # Configuration Module
//!
//! Runtime configuration for the two subsystems. Values are clamped into
//! their valid ranges on assignment rather than rejected, so the UI can
//! forward raw user input without pre-validating it.

/// Valid metronome tempo range in beats per minute.
pub const BPM_RANGE: std::ops::RangeInclusive<u32> = 40..=240;

/// Metronome settings: tempo and accent period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetronomeConfig {
    /// Tempo in beats per minute, always within [`BPM_RANGE`].
    pub bpm: u32,
    /// Beats per measure; beat 0 of each measure is accented.
    pub beats_per_measure: u32,
}

impl Default for MetronomeConfig {
    fn default() -> Self {
        Self {
            bpm: 120,
            beats_per_measure: 4,
        }
    }
}

impl MetronomeConfig {
    pub fn clamp_bpm(bpm: u32) -> u32 {
        bpm.clamp(*BPM_RANGE.start(), *BPM_RANGE.end())
    }

    pub fn set_bpm(&mut self, bpm: u32) {
        self.bpm = Self::clamp_bpm(bpm);
    }

    pub fn set_beats_per_measure(&mut self, n: u32) {
        self.beats_per_measure = n.max(1);
    }
}

/// Tuner settings: detection thresholds and analysis window size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TunerConfig {
    /// RMS level below which a frame counts as silence.
    pub silence_rms_threshold: f32,
    /// Frequency estimates below this floor are treated as unreliable.
    pub min_frequency_hz: f32,
    /// Half-width of the "in tune" band, in cents.
    pub in_tune_cents: f32,
    /// Analysis window length in samples.
    pub frame_size: usize,
}

impl Default for TunerConfig {
    fn default() -> Self {
        Self {
            silence_rms_threshold: 0.01,
            min_frequency_hz: 50.0,
            in_tune_cents: 5.0,
            frame_size: 2048,
        }
    }
}
