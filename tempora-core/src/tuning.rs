//! # Musical Tuning Module
//!
//! Equal-temperament note mapping for the tuner: nearest-note lookup,
//! cents deviation, and the coarse in-tune/flat/sharp classification the
//! display uses. All math is exact music theory referenced to A4 = 440 Hz
//! (MIDI note 69), never an approximation.

use once_cell::sync::Lazy;

/// The 12 pitch-class names, indexed from C.
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// MIDI note number of A4 in the standard convention.
const A4_MIDI: i32 = 69;
/// Reference pitch for A4, Hz.
const A4_HZ: f32 = 440.0;

/// Reference frequencies for MIDI notes 0..=127, computed once at
/// startup: `440 * 2^((n - 69) / 12)`.
static MIDI_FREQUENCIES: Lazy<[f32; 128]> = Lazy::new(|| {
    let mut table = [0.0f32; 128];
    for (n, frequency) in table.iter_mut().enumerate() {
        *frequency = A4_HZ * 2.0f32.powf((n as f32 - A4_MIDI as f32) / 12.0);
    }
    table
});

/// The nearest equal-tempered MIDI note number to a frequency.
pub fn nearest_midi_note(frequency: f32) -> i32 {
    (12.0 * (frequency / A4_HZ).log2()).round() as i32 + A4_MIDI
}

/// Pitch-class name of a MIDI note.
pub fn note_name(midi: i32) -> &'static str {
    NOTE_NAMES[midi.rem_euclid(12) as usize]
}

/// Exact equal-tempered frequency of a MIDI note.
pub fn note_frequency(midi: i32) -> f32 {
    if (0..128).contains(&midi) {
        MIDI_FREQUENCIES[midi as usize]
    } else {
        A4_HZ * 2.0f32.powf((midi - A4_MIDI) as f32 / 12.0)
    }
}

/// Deviation of `frequency` from `target` in cents.
///
/// 100 cents = one semitone. Positive values indicate sharpness,
/// negative values flatness.
pub fn cents_deviation(frequency: f32, target: f32) -> f32 {
    1200.0 * (frequency / target).log2()
}

/// Maps a detected frequency to the nearest pitch class and its signed
/// cents offset.
pub fn map_frequency(frequency: f32) -> (&'static str, f32) {
    let midi = nearest_midi_note(frequency);
    let offset = cents_deviation(frequency, note_frequency(midi));
    (note_name(midi), offset)
}

/// Coarse tuning classification for display purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TuningZone {
    InTune,
    Flat,
    Sharp,
}

/// Classifies a cents offset against the in-tune tolerance band.
pub fn classify(cents: f32, in_tune_cents: f32) -> TuningZone {
    if cents.abs() < in_tune_cents {
        TuningZone::InTune
    } else if cents < 0.0 {
        TuningZone::Flat
    } else {
        TuningZone::Sharp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concert_a_maps_to_a_with_zero_cents() {
        let (name, cents) = map_frequency(440.0);
        assert_eq!(name, "A");
        assert!(cents.abs() < 1e-3);
    }

    #[test]
    fn a_sharp_maps_to_its_own_pitch_class() {
        let (name, cents) = map_frequency(466.16);
        assert_eq!(name, "A#");
        assert!(cents.abs() < 0.5);
    }

    #[test]
    fn sharp_frequency_has_positive_cents() {
        let (name, cents) = map_frequency(450.0);
        assert_eq!(name, "A");
        assert!((cents - 38.9).abs() < 0.5, "expected ~+39 cents, got {cents}");
    }

    #[test]
    fn flat_frequency_has_negative_cents() {
        let (name, cents) = map_frequency(435.0);
        assert_eq!(name, "A");
        assert!(cents < 0.0);
    }

    #[test]
    fn octave_below_is_still_a() {
        let (name, cents) = map_frequency(220.0);
        assert_eq!(name, "A");
        assert!(cents.abs() < 1e-2);
    }

    #[test]
    fn midi_table_matches_the_closed_form() {
        assert_eq!(note_frequency(A4_MIDI), 440.0);
        assert!((note_frequency(60) - 261.6256).abs() < 0.01); // middle C
        assert!((note_frequency(81) - 880.0).abs() < 0.01); // A5
    }

    #[test]
    fn note_names_wrap_across_octaves() {
        assert_eq!(note_name(60), "C");
        assert_eq!(note_name(72), "C");
        assert_eq!(note_name(69), "A");
        assert_eq!(note_name(70), "A#");
    }

    #[test]
    fn classification_respects_the_tolerance_band() {
        assert_eq!(classify(0.0, 5.0), TuningZone::InTune);
        assert_eq!(classify(4.9, 5.0), TuningZone::InTune);
        assert_eq!(classify(-4.9, 5.0), TuningZone::InTune);
        assert_eq!(classify(5.1, 5.0), TuningZone::Sharp);
        assert_eq!(classify(-5.1, 5.0), TuningZone::Flat);
    }
}
