//! # Click Synthesizer Module
//!
//! Renders the short percussive metronome tones and mixes them into the
//! output stream at their exact sample positions. Accented beats (the
//! first of each measure) use a higher pitch than the rest.

use crate::clock::ClickSink;

/// Length of a single click, seconds.
pub const CLICK_DURATION_SECS: f32 = 0.05;
/// Pitch of the accented (first-of-measure) click.
pub const ACCENT_FREQUENCY_HZ: f32 = 880.0;
/// Pitch of a normal beat click.
pub const BEAT_FREQUENCY_HZ: f32 = 440.0;
/// Gain the exponential decay reaches by the end of the click. Decaying
/// to near-zero instead of truncating avoids an audible pop.
const DECAY_FLOOR: f32 = 0.001;
/// Upper bound on simultaneously sounding clicks; later requests are
/// dropped once it is reached. Far above anything a 240 bpm schedule can
/// produce with 50 ms tones.
const MAX_VOICES: usize = 16;

/// Renders one click: a sine tone at `frequency` with unit gain at onset
/// and an exponential decay to [`DECAY_FLOOR`] over its whole length.
pub fn render_click(sample_rate: u32, frequency: f32) -> Vec<f32> {
    let length = (sample_rate as f32 * CLICK_DURATION_SECS).round() as usize;
    let mut samples = Vec::with_capacity(length);
    for i in 0..length {
        let t = i as f32 / sample_rate as f32;
        let envelope = DECAY_FLOOR.powf(t / CLICK_DURATION_SECS);
        samples.push((std::f32::consts::TAU * frequency * t).sin() * envelope);
    }
    samples
}

/// One sounding click, placed at an absolute sample position.
#[derive(Debug, Clone, Copy)]
struct Voice {
    start_sample: u64,
    accented: bool,
}

/// Sample-accurate click mixer; the production [`ClickSink`].
///
/// Both click variants are rendered once up front. Scheduled clicks
/// become voices that are added into the interleaved output buffer as the
/// stream reaches their position; each voice is independent and retires
/// itself when its samples are exhausted.
pub struct ClickMixer {
    sample_rate: u32,
    accent: Vec<f32>,
    normal: Vec<f32>,
    voices: Vec<Voice>,
}

impl ClickMixer {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            accent: render_click(sample_rate, ACCENT_FREQUENCY_HZ),
            normal: render_click(sample_rate, BEAT_FREQUENCY_HZ),
            voices: Vec::with_capacity(MAX_VOICES),
        }
    }

    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    /// Adds all active voices into an interleaved buffer whose first
    /// frame sits at absolute position `first_sample`, then retires
    /// voices that ended before the buffer did.
    pub fn mix_into(&mut self, out: &mut [f32], channels: usize, first_sample: u64) {
        let frames = out.len() / channels;
        let click_length = self.accent.len() as u64;

        for voice in &self.voices {
            let click = if voice.accented {
                &self.accent
            } else {
                &self.normal
            };
            for frame in 0..frames {
                let position = first_sample + frame as u64;
                if position < voice.start_sample {
                    continue;
                }
                let offset = (position - voice.start_sample) as usize;
                if offset >= click.len() {
                    break;
                }
                let value = click[offset];
                for channel in 0..channels {
                    out[frame * channels + channel] += value;
                }
            }
        }

        let end_sample = first_sample + frames as u64;
        self.voices
            .retain(|voice| voice.start_sample + click_length > end_sample);
    }
}

impl ClickSink for ClickMixer {
    fn play_click(&mut self, at: f64, accented: bool) {
        if self.voices.len() >= MAX_VOICES {
            return;
        }
        let start_sample = (at.max(0.0) * f64::from(self.sample_rate)).round() as u64;
        self.voices.push(Voice {
            start_sample,
            accented,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: u32 = 44100;

    #[test]
    fn click_lasts_fifty_milliseconds() {
        let click = render_click(SAMPLE_RATE, BEAT_FREQUENCY_HZ);
        assert_eq!(click.len(), 2205);
    }

    #[test]
    fn envelope_decays_to_near_zero() {
        let click = render_click(SAMPLE_RATE, BEAT_FREQUENCY_HZ);
        let early_peak = click[..220]
            .iter()
            .fold(0.0f32, |max, &s| max.max(s.abs()));
        let late_peak = click[click.len() - 220..]
            .iter()
            .fold(0.0f32, |max, &s| max.max(s.abs()));
        assert!(early_peak > 0.5, "onset should be near full gain");
        assert!(late_peak < 0.002, "tail should have decayed out");
    }

    #[test]
    fn voice_starts_at_its_exact_sample_position() {
        let mut mixer = ClickMixer::new(SAMPLE_RATE);
        // 0.5 s at 44.1 kHz is sample 22050.
        mixer.play_click(0.5, false);

        let mut out = vec![0.0f32; 1024];
        // Buffer covering samples 22000..23024.
        mixer.mix_into(&mut out, 1, 22000);

        assert!(out[..50].iter().all(|&s| s == 0.0));
        // sin(0) = 0 at the very first click sample; energy follows
        // immediately after.
        assert!(out[50..100].iter().any(|&s| s.abs() > 0.1));
    }

    #[test]
    fn overlapping_voices_mix_additively() {
        let mut mixer = ClickMixer::new(SAMPLE_RATE);
        mixer.play_click(0.0, false);
        mixer.play_click(0.0, false);

        let mut doubled = vec![0.0f32; 256];
        mixer.mix_into(&mut doubled, 1, 0);

        let mut single_mixer = ClickMixer::new(SAMPLE_RATE);
        single_mixer.play_click(0.0, false);
        let mut single = vec![0.0f32; 256];
        single_mixer.mix_into(&mut single, 1, 0);

        for (d, s) in doubled.iter().zip(&single) {
            assert!((d - 2.0 * s).abs() < 1e-6);
        }
    }

    #[test]
    fn finished_voices_retire() {
        let mut mixer = ClickMixer::new(SAMPLE_RATE);
        mixer.play_click(0.0, true);
        assert_eq!(mixer.active_voices(), 1);

        // One second of output, far past the 50 ms click.
        let mut out = vec![0.0f32; SAMPLE_RATE as usize];
        mixer.mix_into(&mut out, 1, 0);
        assert_eq!(mixer.active_voices(), 0);
    }

    #[test]
    fn clicks_are_duplicated_across_channels() {
        let mut mixer = ClickMixer::new(SAMPLE_RATE);
        mixer.play_click(0.0, false);

        let mut out = vec![0.0f32; 512];
        mixer.mix_into(&mut out, 2, 0);
        for frame in out.chunks_exact(2) {
            assert_eq!(frame[0], frame[1]);
        }
    }

    #[test]
    fn voice_list_is_capped() {
        let mut mixer = ClickMixer::new(SAMPLE_RATE);
        for i in 0..100 {
            mixer.play_click(i as f64 * 0.01, false);
        }
        assert!(mixer.active_voices() <= 16);
    }
}
