//! # Pitch Detection Module
//!
//! Autocorrelation pitch detection for the tuner.
//!
//! The detector estimates the fundamental period of a time-domain frame
//! by finding the lag that maximizes the signal's self-similarity, with:
//! - An RMS noise gate to reject silence and noise-floor frames
//! - A first-dip skip so the peak search starts past the trivial
//!   short-lag region, where every signal correlates with itself
//! - Parabolic interpolation for sub-sample accuracy on strong peaks
//! - Finite/positive guards on the final frequency

use crate::config::TunerConfig;

/// Shortest candidate period in samples (~11 kHz at 44.1 kHz).
const MIN_LAG: usize = 4;
/// Longest candidate period in samples (~44 Hz at 44.1 kHz).
const MAX_LAG: usize = 1000;
/// Peak correlation above which parabolic refinement is applied.
///
/// The correlation is unnormalized, so this threshold scales with the
/// signal's own energy rather than being a calibrated confidence; any
/// gated, tonal frame clears it by orders of magnitude.
const REFINE_THRESHOLD: f32 = 0.99;

/// Estimates the dominant fundamental frequency of a frame.
///
/// # Arguments
/// * `frame` - Time-domain samples, nominally in [-1, 1]
/// * `sample_rate` - Sample rate in Hz
/// * `config` - Tuner thresholds (only the silence gate is used here)
///
/// # Returns
/// * `Some(frequency)` - Detected frequency in Hz
/// * `None` - Silence, noise, or a degenerate frame
pub fn detect_pitch(frame: &[f32], sample_rate: u32, config: &TunerConfig) -> Option<f32> {
    let size = frame.len();
    if size <= MIN_LAG {
        return None;
    }

    // --- Noise gate: skip frames below the silence threshold ---
    let rms = (frame.iter().map(|&s| s * s).sum::<f32>() / size as f32).sqrt();
    if rms < config.silence_rms_threshold {
        return None;
    }

    // --- Unnormalized autocorrelation over the candidate lag range ---
    //
    // The raw correlation is near-maximal at the shortest lags for any
    // signal (the overlap is longest and the phase shift tiny), so the
    // peak search only starts once the correlation has dipped to zero:
    // roughly a quarter period into a tonal frame. Past that dip the
    // shrinking overlap works in our favor, ranking the fundamental
    // period above its integer multiples.
    let max_lag = MAX_LAG.min(size - 1);
    let mut correlations = vec![0.0f32; max_lag + 1];
    let mut best_lag = 0;
    let mut best_correlation = 0.0f32;
    let mut past_first_dip = false;

    for lag in MIN_LAG..=max_lag {
        let mut correlation = 0.0f32;
        for i in 0..size - lag {
            correlation += frame[i] * frame[i + lag];
        }
        correlations[lag] = correlation;
        if !past_first_dip {
            past_first_dip = correlation <= 0.0;
            continue;
        }
        if correlation > best_correlation {
            best_correlation = correlation;
            best_lag = lag;
        }
    }

    // Degenerate frame: the correlation never dipped (period longer
    // than the lag range) or never recovered above zero afterwards.
    if best_lag == 0 {
        return None;
    }

    // --- Parabolic interpolation around strong peaks ---
    let refined_lag = if best_correlation > REFINE_THRESHOLD
        && best_lag > MIN_LAG
        && best_lag < max_lag
    {
        let y1 = correlations[best_lag - 1];
        let y2 = correlations[best_lag];
        let y3 = correlations[best_lag + 1];
        let denominator = y1 - 2.0 * y2 + y3;
        if denominator.abs() > f32::EPSILON {
            best_lag as f32 + (y1 - y3) / (2.0 * denominator)
        } else {
            best_lag as f32
        }
    } else {
        best_lag as f32
    };

    let frequency = sample_rate as f32 / refined_lag;
    if frequency.is_finite() && frequency > 0.0 {
        Some(frequency)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: u32 = 44100;

    fn sine(frequency: f32, amplitude: f32, length: usize) -> Vec<f32> {
        (0..length)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                amplitude * (std::f32::consts::TAU * frequency * t).sin()
            })
            .collect()
    }

    fn assert_detects(frame: &[f32], expected_hz: f32) {
        let config = TunerConfig::default();
        let detected = detect_pitch(frame, SAMPLE_RATE, &config)
            .unwrap_or_else(|| panic!("no pitch detected for {expected_hz} Hz"));
        let relative_error = (detected - expected_hz).abs() / expected_hz;
        assert!(
            relative_error < 0.01,
            "detected {detected} Hz for {expected_hz} Hz ({:.2}% off)",
            relative_error * 100.0
        );
    }

    #[test]
    fn all_zero_frame_is_undetected() {
        let config = TunerConfig::default();
        assert_eq!(detect_pitch(&vec![0.0; 2048], SAMPLE_RATE, &config), None);
    }

    #[test]
    fn quiet_signal_below_the_gate_is_undetected() {
        let config = TunerConfig::default();
        let frame = sine(440.0, 0.005, 2048);
        assert_eq!(detect_pitch(&frame, SAMPLE_RATE, &config), None);
    }

    #[test]
    fn too_short_frame_is_undetected() {
        let config = TunerConfig::default();
        assert_eq!(detect_pitch(&[1.0, -1.0, 1.0], SAMPLE_RATE, &config), None);
    }

    #[test]
    fn detects_concert_a() {
        assert_detects(&sine(440.0, 0.5, 2048), 440.0);
    }

    #[test]
    fn detects_a_below_middle_c() {
        assert_detects(&sine(220.0, 0.5, 2048), 220.0);
    }

    #[test]
    fn detects_a_low_note_given_a_longer_window() {
        // Low fundamentals need more cycles in the window before the
        // correlation peak stands out from the shrinking overlap.
        assert_detects(&sine(110.0, 0.5, 4096), 110.0);
    }

    #[test]
    fn detects_the_low_e_string() {
        // Guitar low E, a period of ~535 samples at 44.1 kHz.
        assert_detects(&sine(82.41, 0.5, 4096), 82.41);
    }

    #[test]
    fn detects_a_high_note() {
        assert_detects(&sine(1318.5, 0.5, 2048), 1318.5);
    }

    #[test]
    fn detection_is_not_biased_toward_the_shortest_lag() {
        // The raw correlation at the very first lags is inflated by
        // their longer overlap; if the peak search started there, a
        // 440 Hz tone would resolve to a multi-kHz artifact.
        let config = TunerConfig::default();
        let detected = detect_pitch(&sine(440.0, 0.5, 2048), SAMPLE_RATE, &config)
            .expect("tonal frame");
        assert!(detected < 1000.0, "short-lag artifact: {detected} Hz");
    }

    #[test]
    fn detection_survives_moderate_amplitude_changes() {
        assert_detects(&sine(440.0, 0.1, 2048), 440.0);
        assert_detects(&sine(440.0, 0.9, 2048), 440.0);
    }
}
