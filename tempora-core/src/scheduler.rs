//! # Beat Scheduler Module
//!
//! Lookahead scheduling for drift-free metronome clicks.
//!
//! The scheduler is pumped by a coarse, jittery trigger (in production,
//! the output stream callback). Each pump runs a catch-up loop that emits
//! every beat falling inside the schedule-ahead window, handing each one
//! to the [`ClickSink`] with its exact target time. Click timing accuracy
//! therefore depends on the sink's clock, not on the pump cadence.

use crate::clock::ClickSink;
use crate::config::MetronomeConfig;

/// How far ahead of the clock beats are scheduled, in seconds.
pub const SCHEDULE_AHEAD_SECS: f64 = 0.1;

/// Tempo state plus the schedule cursor for the next unplayed beat.
#[derive(Debug, Clone, Copy)]
pub struct BeatScheduler {
    bpm: u32,
    beats_per_measure: u32,
    /// Index of the next beat to be scheduled, in [0, beats_per_measure).
    current_beat: u32,
    /// Absolute time of the next unplayed beat, seconds.
    next_beat_time: f64,
    schedule_ahead: f64,
}

impl BeatScheduler {
    pub fn new(config: &MetronomeConfig) -> Self {
        Self {
            bpm: MetronomeConfig::clamp_bpm(config.bpm),
            beats_per_measure: config.beats_per_measure.max(1),
            current_beat: 0,
            next_beat_time: 0.0,
            schedule_ahead: SCHEDULE_AHEAD_SECS,
        }
    }

    pub fn bpm(&self) -> u32 {
        self.bpm
    }

    pub fn beats_per_measure(&self) -> u32 {
        self.beats_per_measure
    }

    pub fn current_beat(&self) -> u32 {
        self.current_beat
    }

    /// (Re)starts the schedule: beat index back to 0 and the cursor at
    /// `now`, so the first click is an immediate accent.
    pub fn start(&mut self, now: f64) {
        self.current_beat = 0;
        self.next_beat_time = now;
    }

    /// Changes tempo, taking effect on the next pump.
    ///
    /// The cursor is force-resynced to `now` instead of being left on the
    /// old schedule. This trades long-term periodicity for immediate
    /// responsiveness: a tempo change audibly restarts the bar, and no
    /// stale event fires at the old rate.
    pub fn set_bpm(&mut self, bpm: u32, now: f64) {
        self.bpm = MetronomeConfig::clamp_bpm(bpm);
        self.next_beat_time = now;
    }

    /// Changes the accent period. The beat index is reset along with the
    /// cursor so a shrunk measure cannot leave it out of range.
    pub fn set_beats_per_measure(&mut self, n: u32, now: f64) {
        self.beats_per_measure = n.max(1);
        self.current_beat = 0;
        self.next_beat_time = now;
    }

    /// One scheduling pass: emits every beat due before
    /// `now + schedule_ahead` and advances the cursor by `60/bpm` per
    /// beat. Returns the number of beats emitted, which drives the UI
    /// pulse. Does not allocate.
    pub fn pump<S: ClickSink>(&mut self, now: f64, sink: &mut S) -> usize {
        let seconds_per_beat = 60.0 / f64::from(self.bpm);
        let horizon = now + self.schedule_ahead;
        let mut emitted = 0;

        while self.next_beat_time < horizon {
            sink.play_click(self.next_beat_time, self.current_beat == 0);
            self.current_beat = (self.current_beat + 1) % self.beats_per_measure;
            self.next_beat_time += seconds_per_beat;
            emitted += 1;
        }
        emitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records every scheduled click instead of producing sound.
    #[derive(Default)]
    struct RecordingSink {
        clicks: Vec<(f64, bool)>,
    }

    impl ClickSink for RecordingSink {
        fn play_click(&mut self, at: f64, accented: bool) {
            self.clicks.push((at, accented));
        }
    }

    fn scheduler_at(bpm: u32, beats_per_measure: u32) -> BeatScheduler {
        let mut scheduler = BeatScheduler::new(&MetronomeConfig {
            bpm,
            beats_per_measure,
        });
        scheduler.start(0.0);
        scheduler
    }

    /// Pumps with deliberately irregular cadence and returns the clicks.
    fn pump_with_jitter(scheduler: &mut BeatScheduler, until: f64) -> Vec<(f64, bool)> {
        let mut sink = RecordingSink::default();
        let jitter = [0.021, 0.034, 0.011, 0.029, 0.025, 0.017];
        let mut now = 0.0;
        let mut step = 0;
        while now < until {
            scheduler.pump(now, &mut sink);
            now += jitter[step % jitter.len()];
            step += 1;
        }
        sink.clicks
    }

    #[test]
    fn inter_click_interval_is_exact_for_every_tempo() {
        for bpm in 40..=240 {
            let mut scheduler = scheduler_at(bpm, 4);
            let clicks = pump_with_jitter(&mut scheduler, 4.0);
            let expected = 60.0 / f64::from(bpm);
            assert!(clicks.len() >= 2, "bpm {bpm} produced too few clicks");
            for pair in clicks.windows(2) {
                let interval = pair[1].0 - pair[0].0;
                assert!(
                    (interval - expected).abs() < 1e-9,
                    "bpm {bpm}: interval {interval} != {expected}"
                );
            }
        }
    }

    #[test]
    fn beat_zero_is_always_the_accent() {
        let mut scheduler = scheduler_at(120, 3);
        let clicks = pump_with_jitter(&mut scheduler, 6.0);
        for (i, (_, accented)) in clicks.iter().enumerate() {
            assert_eq!(*accented, i % 3 == 0, "click {i}");
        }
    }

    #[test]
    fn first_click_on_start_is_an_accent_at_now() {
        let mut scheduler = scheduler_at(100, 4);
        scheduler.start(12.5);
        let mut sink = RecordingSink::default();
        scheduler.pump(12.5, &mut sink);
        assert_eq!(sink.clicks[0], (12.5, true));
    }

    #[test]
    fn pump_is_bounded_by_the_lookahead_window() {
        let mut scheduler = scheduler_at(240, 4);
        let mut sink = RecordingSink::default();
        let emitted = scheduler.pump(0.0, &mut sink);
        assert_eq!(emitted, sink.clicks.len());
        for (at, _) in &sink.clicks {
            assert!(*at < SCHEDULE_AHEAD_SECS);
        }
        // 240 bpm = 4 beats/s, so a 100 ms window holds at most one beat
        // beyond the one due at `now`.
        assert!(emitted <= 2);
    }

    #[test]
    fn tempo_change_resyncs_the_cursor_to_now() {
        let mut scheduler = scheduler_at(60, 4);
        let mut sink = RecordingSink::default();
        scheduler.pump(0.0, &mut sink);

        // Next beat under the old tempo would fire at 1.0 s. Change tempo
        // at 0.4 s: the next click must land at 0.4 s, not 1.0 s.
        scheduler.set_bpm(120, 0.4);
        sink.clicks.clear();
        scheduler.pump(0.4, &mut sink);
        scheduler.pump(0.9, &mut sink);

        assert_eq!(sink.clicks[0].0, 0.4);
        let interval = sink.clicks[1].0 - sink.clicks[0].0;
        assert!((interval - 0.5).abs() < 1e-9);
    }

    #[test]
    fn measure_change_restarts_the_bar() {
        let mut scheduler = scheduler_at(120, 4);
        let mut sink = RecordingSink::default();
        scheduler.pump(0.0, &mut sink);
        assert_ne!(scheduler.current_beat(), 0);

        scheduler.set_beats_per_measure(3, 0.2);
        sink.clicks.clear();
        scheduler.pump(0.2, &mut sink);
        // Bar restarts: first click after the change is an accent.
        assert!(sink.clicks[0].1);
    }

    #[test]
    fn restart_resets_beat_index_even_mid_measure() {
        let mut scheduler = scheduler_at(120, 4);
        let mut sink = RecordingSink::default();
        scheduler.pump(0.0, &mut sink);
        scheduler.pump(1.0, &mut sink);
        assert_ne!(scheduler.current_beat(), 0);

        scheduler.start(2.0);
        assert_eq!(scheduler.current_beat(), 0);
        sink.clicks.clear();
        scheduler.pump(2.0, &mut sink);
        assert_eq!(sink.clicks[0], (2.0, true));
    }

    #[test]
    fn out_of_range_config_is_clamped_on_construction() {
        let scheduler = BeatScheduler::new(&MetronomeConfig {
            bpm: 1000,
            beats_per_measure: 0,
        });
        assert_eq!(scheduler.bpm(), 240);
        assert_eq!(scheduler.beats_per_measure(), 1);
    }
}
