//! # Audio Device Module
//!
//! Device I/O for both subsystems via CPAL (Cross-Platform Audio
//! Library): a capture stream that feeds fixed-size frames to the tuner's
//! analysis worker, and an output stream whose callback drives the
//! metronome's lookahead scheduler and click mixer.

use anyhow::{anyhow, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::SupportedStreamConfigRange;
use crossbeam_channel::{Receiver, Sender};

use crate::click::ClickMixer;
use crate::clock::{AudioClock, SampleClock};
use crate::config::MetronomeConfig;
use crate::scheduler::BeatScheduler;
use crate::session::MetronomeCommand;

/// Preferred sample rate for both capture and playback.
const TARGET_SAMPLE_RATE: u32 = 44100;

/// Starts audio capture from the default input device.
///
/// Selects a mono f32 configuration as close to 44.1 kHz as the device
/// supports, accumulates callback chunks into frames of exactly
/// `frame_size` samples, and forwards them to the analysis worker. Frames
/// are sent with `try_send` on purpose: if analysis falls behind, old
/// frames are dropped rather than queued.
///
/// # Returns
/// * `Ok((stream, sample_rate))` - Live stream handle and its sample rate
/// * `Err(e)` - No device, no usable format, or the stream failed to
///   start. On permission-gated systems a denied microphone surfaces
///   here.
pub fn start_audio_capture(
    sender: Sender<Vec<f32>>,
    frame_size: usize,
) -> Result<(cpal::Stream, u32)> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| anyhow!("no microphone available (check input devices and permissions)"))?;

    eprintln!("[AUDIO] Using input device: {}", device.name()?);

    let configs = device.supported_input_configs()?.collect::<Vec<_>>();
    let supported = find_mono_f32_config(configs, TARGET_SAMPLE_RATE)
        .ok_or_else(|| anyhow!("no suitable mono f32 input format found"))?;

    let rate = TARGET_SAMPLE_RATE.clamp(supported.min_sample_rate().0, supported.max_sample_rate().0);
    let config = supported.with_sample_rate(cpal::SampleRate(rate));
    let sample_rate = config.sample_rate().0;
    let config: cpal::StreamConfig = config.into();

    eprintln!("[AUDIO] Capture sample rate: {sample_rate} Hz");

    let err_fn = |err| eprintln!("[AUDIO] input stream error: {err}");

    // Accumulates callback chunks until a full analysis frame is ready.
    let mut pending = Vec::with_capacity(frame_size * 2);

    let stream = device.build_input_stream(
        &config,
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            pending.extend_from_slice(data);
            while pending.len() >= frame_size {
                let frame = pending[..frame_size].to_vec();
                let _ = sender.try_send(frame);
                pending.drain(..frame_size);
            }
        },
        err_fn,
        None,
    )?;

    stream.play()?;

    Ok((stream, sample_rate))
}

/// Finds the mono f32 input configuration closest to the target rate.
fn find_mono_f32_config(
    configs: Vec<SupportedStreamConfigRange>,
    target_rate: u32,
) -> Option<SupportedStreamConfigRange> {
    configs
        .into_iter()
        .filter(|c| c.channels() == 1 && c.sample_format() == cpal::SampleFormat::F32)
        .min_by_key(|c| {
            let min_diff = (c.min_sample_rate().0 as i32 - target_rate as i32).abs();
            let max_diff = (c.max_sample_rate().0 as i32 - target_rate as i32).abs();
            min_diff.min(max_diff)
        })
}

/// Builds and starts the metronome output stream.
///
/// The stream callback is the scheduler's poll: each invocation drains
/// pending control commands (tempo and measure changes resync the
/// schedule cursor to "now"), pumps the scheduler through its lookahead
/// window, forwards one unit pulse per scheduled beat, and mixes pending
/// clicks at their exact sample positions. The callback cadence only
/// affects how early clicks are queued, never when they sound.
pub fn start_click_output(
    command_rx: Receiver<MetronomeCommand>,
    pulse_tx: Sender<()>,
    config: MetronomeConfig,
) -> Result<(cpal::Stream, u32)> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| anyhow!("no audio output device available"))?;

    eprintln!("[AUDIO] Using output device: {}", device.name()?);

    let supported = device.default_output_config()?;
    if supported.sample_format() != cpal::SampleFormat::F32 {
        return Err(anyhow!(
            "output device does not support f32 samples (got {:?})",
            supported.sample_format()
        ));
    }
    let sample_rate = supported.sample_rate().0;
    let channels = supported.channels() as usize;
    let stream_config: cpal::StreamConfig = supported.into();

    eprintln!("[AUDIO] Playback sample rate: {sample_rate} Hz, {channels} channel(s)");

    let mut clock = SampleClock::new(sample_rate);
    let mut scheduler = BeatScheduler::new(&config);
    let mut mixer = ClickMixer::new(sample_rate);
    scheduler.start(clock.now());

    let err_fn = |err| eprintln!("[AUDIO] output stream error: {err}");

    let stream = device.build_output_stream(
        &stream_config,
        move |out: &mut [f32], _: &cpal::OutputCallbackInfo| {
            let now = clock.now();
            while let Ok(command) = command_rx.try_recv() {
                match command {
                    MetronomeCommand::SetBpm(bpm) => scheduler.set_bpm(bpm, now),
                    MetronomeCommand::SetBeatsPerMeasure(n) => {
                        scheduler.set_beats_per_measure(n, now);
                    }
                }
            }

            for _ in 0..scheduler.pump(now, &mut mixer) {
                // Lossy: a missed pulse only costs one indicator flash.
                let _ = pulse_tx.try_send(());
            }

            out.fill(0.0);
            mixer.mix_into(out, channels, clock.position());
            clock.advance((out.len() / channels) as u64);
        },
        err_fn,
        None,
    )?;

    stream.play()?;

    Ok((stream, sample_rate))
}
