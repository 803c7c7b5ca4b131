//! # Tempora - Metronome & Tuner GUI
//!
//! The desktop application for Tempora: a metronome with a lookahead
//! click scheduler and a microphone tuner with live pitch detection.
//!
//! ## Architecture
//! - **Main Thread**: Iced GUI application with dark theme
//! - **Audio Workers**: the core crate's sessions own their own threads
//! - **Communication**: Crossbeam channels for pulses and readings
//! - **Updates**: 60 FPS continuous updates via subscription system
//!
//! The two tools are mutually exclusive: switching enforces that at most
//! one of the playback (speaker) and capture (microphone) sessions is
//! alive at any time.

mod ui;

use std::time::{Duration, Instant};

use iced::{Element, Subscription, Theme};
use tempora_core::config::{MetronomeConfig, TunerConfig};
use tempora_core::session::{CaptureSession, PlaybackSession};
use tempora_core::tuning::{self, TuningZone};
use tempora_core::TunerReading;
use ui::main_display::create_main_view;

/// How long the beat indicator stays lit after a pulse.
pub const FLASH_DURATION: Duration = Duration::from_millis(50);

/// Main entry point for the Tempora application.
pub fn main() -> iced::Result {
    eprintln!("[MAIN] Starting Tempora...");
    let result = iced::application("Tempora", TemporaApp::update, TemporaApp::view)
        .subscription(TemporaApp::subscription)
        .theme(TemporaApp::theme)
        .run();
    eprintln!("[MAIN] Application finished with result: {:?}", result);
    result
}

/// Which of the two tools is visible and allowed to own audio hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveTool {
    Metronome,
    Tuner,
}

/// Application message types for the Iced GUI framework.
#[derive(Debug, Clone)]
pub enum Message {
    // Tool switching
    SwitchTool(ActiveTool),

    // Metronome transport and tempo intents
    StartStop,
    BpmSelected(u32),
    BpmUp,
    BpmDown,
    BeatsPerMeasureSelected(u32),

    // Tuner transport; also how the user retries after a permission
    // denial (no automatic retry)
    TunerStartStop,

    // Continuous update message
    Tick,
}

/// UI-specific data needed for rendering the interface.
#[derive(Debug, Clone)]
pub struct AppDisplayData {
    pub active_tool: ActiveTool,

    // Metronome state
    pub metronome: MetronomeConfig,
    pub metronome_running: bool,
    pub metronome_status: String,
    pub last_pulse: Option<Instant>,

    // Tuner state
    pub tuner_running: bool,
    pub tuner_status: String,
    pub last_reading: Option<TunerReading>,
    pub in_tune_cents: f32,
}

impl AppDisplayData {
    /// Whether the beat indicator should currently be lit.
    pub fn indicator_lit(&self) -> bool {
        self.last_pulse
            .is_some_and(|pulse| pulse.elapsed() < FLASH_DURATION)
    }
}

/// Main application state for Tempora.
struct TemporaApp {
    playback: Option<PlaybackSession>,
    capture: Option<CaptureSession>,
    tuner_config: TunerConfig,
    display_data: AppDisplayData,
}

impl Default for TemporaApp {
    fn default() -> Self {
        Self {
            playback: None,
            capture: None,
            tuner_config: TunerConfig::default(),
            display_data: AppDisplayData {
                active_tool: ActiveTool::Metronome,
                metronome: MetronomeConfig::default(),
                metronome_running: false,
                metronome_status: String::new(),
                last_pulse: None,
                tuner_running: false,
                tuner_status: "Tuner Off".to_string(),
                last_reading: None,
                in_tune_cents: TunerConfig::default().in_tune_cents,
            },
        }
    }
}

impl TemporaApp {
    fn update(&mut self, message: Message) {
        match message {
            Message::SwitchTool(tool) => {
                if tool == self.display_data.active_tool {
                    return;
                }
                self.display_data.active_tool = tool;
                match tool {
                    ActiveTool::Metronome => {
                        // Stop the tuner when switching to the metronome.
                        self.stop_tuner();
                    }
                    ActiveTool::Tuner => {
                        // Stop the metronome, then start the tuner (which
                        // asks for the microphone).
                        self.stop_metronome();
                        self.start_tuner();
                    }
                }
            }
            Message::StartStop => {
                if self.playback.is_some() {
                    self.stop_metronome();
                } else {
                    self.start_metronome();
                }
            }
            Message::BpmSelected(bpm) => self.apply_bpm(bpm),
            Message::BpmUp => self.apply_bpm(self.display_data.metronome.bpm + 1),
            Message::BpmDown => self.apply_bpm(self.display_data.metronome.bpm.saturating_sub(1)),
            Message::BeatsPerMeasureSelected(n) => {
                self.display_data.metronome.set_beats_per_measure(n);
                if let Some(session) = &self.playback {
                    session.set_beats_per_measure(self.display_data.metronome.beats_per_measure);
                }
            }
            Message::TunerStartStop => {
                if self.capture.is_some() {
                    self.stop_tuner();
                } else {
                    self.start_tuner();
                }
            }
            Message::Tick => {
                if let Some(session) = &self.playback {
                    if session.drain_pulses() > 0 {
                        self.display_data.last_pulse = Some(Instant::now());
                    }
                }
                if let Some(session) = &self.capture {
                    if let Some(reading) = session.latest_reading() {
                        self.display_data.tuner_status =
                            tuner_status_line(&reading, self.display_data.in_tune_cents);
                        self.display_data.last_reading = Some(reading);
                    }
                }
            }
        }
    }

    /// Applies a tempo intent: clamp into range, and forward to the live
    /// session if one is running (the bar audibly restarts). Intents the
    /// clamp turns into the current tempo are dropped, so nudging past a
    /// range edge does not restart the bar.
    fn apply_bpm(&mut self, bpm: u32) {
        let Some(bpm) = effective_bpm_change(self.display_data.metronome.bpm, bpm) else {
            return;
        };
        self.display_data.metronome.set_bpm(bpm);
        if let Some(session) = &self.playback {
            session.set_bpm(bpm);
        }
    }

    fn start_metronome(&mut self) {
        match PlaybackSession::start(self.display_data.metronome) {
            Ok(session) => {
                self.playback = Some(session);
                self.display_data.metronome_running = true;
                self.display_data.metronome_status.clear();
            }
            Err(e) => {
                eprintln!("[MAIN] could not start playback: {e:#}");
                self.display_data.metronome_running = false;
                self.display_data.metronome_status = format!("Audio output unavailable: {e}");
            }
        }
    }

    /// No-op when already stopped.
    fn stop_metronome(&mut self) {
        if let Some(session) = self.playback.take() {
            session.stop();
        }
        self.display_data.metronome_running = false;
        self.display_data.last_pulse = None;
    }

    fn start_tuner(&mut self) {
        if self.capture.is_some() {
            return;
        }
        match CaptureSession::start(self.tuner_config) {
            Ok(session) => {
                self.capture = Some(session);
                self.display_data.tuner_running = true;
                self.display_data.tuner_status = "Microphone ON. Start playing...".to_string();
            }
            Err(e) => {
                // The sole propagated failure: surfaced as status text,
                // no automatic retry.
                eprintln!("[MAIN] could not start capture: {e:#}");
                self.display_data.tuner_running = false;
                self.display_data.tuner_status =
                    format!("Microphone permission denied or unavailable: {e}");
            }
        }
    }

    /// No-op when already stopped; releasing the microphone happens on
    /// the session's worker thread.
    fn stop_tuner(&mut self) {
        if let Some(session) = self.capture.take() {
            session.stop();
        }
        self.display_data.tuner_running = false;
        self.display_data.tuner_status = "Tuner Off".to_string();
        self.display_data.last_reading = None;
    }

    /// Renders the main application interface.
    fn view(&self) -> Element<'_, Message> {
        create_main_view(&self.display_data)
    }

    /// Timer subscription firing every 16ms (60 FPS) so beat flashes and
    /// tuner readings render smoothly.
    fn subscription(&self) -> Subscription<Message> {
        iced::time::every(Duration::from_millis(16)).map(|_| Message::Tick)
    }

    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

/// Resolves a tempo intent against the current tempo.
///
/// Returns the clamped tempo when it actually differs, `None` when the
/// intent is a no-op after clamping.
fn effective_bpm_change(current: u32, requested: u32) -> Option<u32> {
    let clamped = MetronomeConfig::clamp_bpm(requested);
    (clamped != current).then_some(clamped)
}

/// One-line status for the tuner panel.
fn tuner_status_line(reading: &TunerReading, in_tune_cents: f32) -> String {
    let Some(cents) = reading.cents else {
        return "No sound detected...".to_string();
    };
    match tuning::classify(cents, in_tune_cents) {
        TuningZone::InTune => "In Tune!".to_string(),
        TuningZone::Flat => format!("{} cents (Flat)", cents.round() as i32),
        TuningZone::Sharp => format!("+{} cents (Sharp)", cents.round() as i32),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tempo_nudges_at_the_range_edges_are_no_ops() {
        assert_eq!(effective_bpm_change(240, 241), None);
        assert_eq!(effective_bpm_change(40, 39), None);
        assert_eq!(effective_bpm_change(120, 120), None);
        assert_eq!(effective_bpm_change(239, 240), Some(240));
        assert_eq!(effective_bpm_change(120, 121), Some(121));
        assert_eq!(effective_bpm_change(120, 500), Some(240));
    }

    #[test]
    fn status_line_reports_each_zone() {
        let reading = |cents| TunerReading {
            frequency: Some(440.0),
            note_name: Some("A"),
            cents: Some(cents),
        };
        assert_eq!(tuner_status_line(&reading(1.0), 5.0), "In Tune!");
        assert_eq!(tuner_status_line(&reading(12.3), 5.0), "+12 cents (Sharp)");
        assert_eq!(tuner_status_line(&reading(-8.7), 5.0), "-9 cents (Flat)");
        assert_eq!(
            tuner_status_line(&TunerReading::UNDETECTED, 5.0),
            "No sound detected..."
        );
    }
}
