//! # Session Module
//!
//! Lifecycles for the two exclusive audio resources: the metronome's
//! [`PlaybackSession`] and the tuner's [`CaptureSession`]. Each session
//! owns a worker thread that creates and drops its CPAL stream
//! (`cpal::Stream` is not `Send`, so the stream must live and die on one
//! thread) and reports startup success or failure back over a bounded
//! channel, so device and permission errors surface synchronously from
//! `start`.
//!
//! Mutual exclusion between the two is the composition layer's job: the
//! GUI keeps at most one session alive at a time.

use std::thread::{self, JoinHandle};

use anyhow::{anyhow, Result};
use cpal::traits::StreamTrait;
use crossbeam_channel::{bounded, select, unbounded, Receiver, Sender};

use crate::audio;
use crate::config::{MetronomeConfig, TunerConfig};
use crate::pitch;
use crate::tuning;
use crate::TunerReading;

/// Control messages applied by the output callback on its next pass.
#[derive(Debug, Clone, Copy)]
pub enum MetronomeCommand {
    SetBpm(u32),
    SetBeatsPerMeasure(u32),
}

/// A running metronome.
///
/// Dropping the session stops the output stream. Clicks that already
/// reached the device buffer play out rather than being retracted, which
/// is at most the lookahead window (~100 ms) of audio.
pub struct PlaybackSession {
    command_tx: Sender<MetronomeCommand>,
    pulse_rx: Receiver<()>,
    shutdown_tx: Sender<()>,
    worker: Option<JoinHandle<()>>,
}

impl PlaybackSession {
    /// Starts playback with beat index 0 and the schedule cursor at
    /// "now"; the first click is an immediate accent.
    pub fn start(config: MetronomeConfig) -> Result<Self> {
        let (command_tx, command_rx) = unbounded();
        let (pulse_tx, pulse_rx) = bounded(64);
        let (startup_tx, startup_rx) = bounded(1);
        let (shutdown_tx, shutdown_rx) = bounded::<()>(1);

        let worker = thread::spawn(move || {
            let stream = match audio::start_click_output(command_rx, pulse_tx, config) {
                Ok((stream, sample_rate)) => {
                    let _ = startup_tx.send(Ok(sample_rate));
                    stream
                }
                Err(e) => {
                    let _ = startup_tx.send(Err(e));
                    return;
                }
            };

            // The stream does its work from the audio callback; this
            // thread only waits for the stop signal.
            let _ = shutdown_rx.recv();

            if let Err(e) = stream.pause() {
                eprintln!("[METRONOME] error pausing output stream: {e}");
            }
            drop(stream);
            eprintln!("[METRONOME] playback stopped");
        });

        match startup_rx.recv() {
            Ok(Ok(sample_rate)) => {
                eprintln!("[METRONOME] playback started at {sample_rate} Hz");
                Ok(Self {
                    command_tx,
                    pulse_rx,
                    shutdown_tx,
                    worker: Some(worker),
                })
            }
            Ok(Err(e)) => {
                let _ = worker.join();
                Err(e)
            }
            Err(_) => Err(anyhow!("audio worker exited before reporting startup")),
        }
    }

    /// Updates the tempo; takes effect on the next scheduling pass, with
    /// the schedule cursor resynced to "now".
    pub fn set_bpm(&self, bpm: u32) {
        let _ = self.command_tx.send(MetronomeCommand::SetBpm(bpm));
    }

    pub fn set_beats_per_measure(&self, n: u32) {
        let _ = self.command_tx.send(MetronomeCommand::SetBeatsPerMeasure(n));
    }

    /// Number of beats scheduled since the last call; drives the UI
    /// beat indicator flash.
    pub fn drain_pulses(&self) -> usize {
        self.pulse_rx.try_iter().count()
    }

    pub fn stop(self) {
        // Teardown happens in Drop.
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(());
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

/// A running tuner capture.
///
/// The worker thread owns the microphone stream, analyzes each captured
/// frame (pitch detection, frequency floor, note mapping) and sends one
/// [`TunerReading`] per frame. Stopping pauses and drops the stream on
/// the worker, releasing the microphone deterministically.
pub struct CaptureSession {
    reading_rx: Receiver<TunerReading>,
    shutdown_tx: Sender<()>,
    worker: Option<JoinHandle<()>>,
}

impl CaptureSession {
    /// Acquires the microphone and starts the analysis worker.
    ///
    /// The single propagated failure of the tuner: if the device is
    /// missing, unsupported, or access is denied, the error is returned
    /// here and no session exists.
    pub fn start(config: TunerConfig) -> Result<Self> {
        let (reading_tx, reading_rx) = unbounded();
        let (startup_tx, startup_rx) = bounded(1);
        let (shutdown_tx, shutdown_rx) = bounded::<()>(1);

        let worker = thread::spawn(move || {
            let (raw_tx, raw_rx) = unbounded::<Vec<f32>>();

            let (stream, sample_rate) = match audio::start_audio_capture(raw_tx, config.frame_size)
            {
                Ok(pair) => {
                    let _ = startup_tx.send(Ok(pair.1));
                    pair
                }
                Err(e) => {
                    let _ = startup_tx.send(Err(e));
                    return;
                }
            };

            loop {
                select! {
                    recv(raw_rx) -> msg => match msg {
                        Ok(frame) => {
                            let reading = analyze_frame(&frame, sample_rate, &config);
                            if reading_tx.send(reading).is_err() {
                                break;
                            }
                        }
                        Err(_) => break,
                    },
                    recv(shutdown_rx) -> _ => break,
                }
            }

            if let Err(e) = stream.pause() {
                eprintln!("[CAPTURE] error pausing input stream: {e}");
            }
            // Dropping the stream releases the microphone.
            drop(stream);
            eprintln!("[CAPTURE] microphone released");
        });

        match startup_rx.recv() {
            Ok(Ok(sample_rate)) => {
                eprintln!("[CAPTURE] capture started at {sample_rate} Hz");
                Ok(Self {
                    reading_rx,
                    shutdown_tx,
                    worker: Some(worker),
                })
            }
            Ok(Err(e)) => {
                let _ = worker.join();
                Err(e)
            }
            Err(_) => Err(anyhow!("capture worker exited before reporting startup")),
        }
    }

    /// The most recent reading, discarding any older queued ones. `None`
    /// when no new frame arrived since the last call.
    pub fn latest_reading(&self) -> Option<TunerReading> {
        self.reading_rx.try_iter().last()
    }

    pub fn stop(self) {
        // Teardown happens in Drop.
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(());
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

/// Full analysis of one captured frame: detection, reliability floor,
/// note mapping.
fn analyze_frame(frame: &[f32], sample_rate: u32, config: &TunerConfig) -> TunerReading {
    let Some(frequency) = pitch::detect_pitch(frame, sample_rate, config) else {
        return TunerReading::UNDETECTED;
    };
    // Estimates below the floor are noise artifacts, not notes.
    if frequency < config.min_frequency_hz {
        return TunerReading::UNDETECTED;
    }
    let (note_name, cents) = tuning::map_frequency(frequency);
    TunerReading {
        frequency: Some(frequency),
        note_name: Some(note_name),
        cents: Some(cents),
    }
}
