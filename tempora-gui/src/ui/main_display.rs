//! # Main Display Module
//!
//! Layout logic for the Tempora application: the tool switcher plus the
//! metronome and tuner panels. Only one panel is visible at a time,
//! matching the one-active-session rule enforced in `main.rs`.

use iced::widget::{button, column, container, pick_list, row, slider, text, Space};
use iced::{Alignment, Element, Length};

use super::beat_indicator::BeatIndicator;
use super::cent_meter::CentMeter;
use crate::{ActiveTool, AppDisplayData, Message};
use tempora_core::config::BPM_RANGE;

/// Selectable accent periods for the metronome.
const BEATS_PER_MEASURE_OPTIONS: [u32; 8] = [1, 2, 3, 4, 5, 6, 7, 8];

/// Creates the complete main application view.
pub fn create_main_view(data: &AppDisplayData) -> Element<'static, Message> {
    let title = text("Tempora").size(28);

    let switcher = create_tool_switcher(data.active_tool);

    let panel = match data.active_tool {
        ActiveTool::Metronome => create_metronome_panel(data),
        ActiveTool::Tuner => create_tuner_panel(data),
    };

    container(
        column![
            title,
            Space::with_height(10),
            switcher,
            Space::with_height(20),
            panel,
        ]
        .align_x(Alignment::Center),
    )
    .width(Length::Fill)
    .height(Length::Fill)
    .center_x(Length::Fill)
    .padding(20)
    .into()
}

/// Two-button tool switcher; the active tool's button is disabled.
fn create_tool_switcher(active: ActiveTool) -> Element<'static, Message> {
    let mut metronome_button = button(text("Metronome").size(16));
    if active != ActiveTool::Metronome {
        metronome_button = metronome_button.on_press(Message::SwitchTool(ActiveTool::Metronome));
    }

    let mut tuner_button = button(text("Tuner").size(16));
    if active != ActiveTool::Tuner {
        tuner_button = tuner_button.on_press(Message::SwitchTool(ActiveTool::Tuner));
    }

    row![metronome_button, Space::with_width(10), tuner_button]
        .align_y(Alignment::Center)
        .into()
}

fn create_metronome_panel(data: &AppDisplayData) -> Element<'static, Message> {
    let bpm_readout = text(format!("{} BPM", data.metronome.bpm)).size(48);

    let tempo_slider = slider(BPM_RANGE, data.metronome.bpm, Message::BpmSelected)
        .width(Length::Fixed(300.0));

    let nudge_row = row![
        button(text("-").size(20)).on_press(Message::BpmDown),
        Space::with_width(10),
        button(text("+").size(20)).on_press(Message::BpmUp),
    ]
    .align_y(Alignment::Center);

    let beats_row = row![
        text("Beats per measure:").size(16),
        Space::with_width(10),
        pick_list(
            BEATS_PER_MEASURE_OPTIONS,
            Some(data.metronome.beats_per_measure),
            Message::BeatsPerMeasureSelected
        ),
    ]
    .align_y(Alignment::Center);

    let transport_label = if data.metronome_running { "STOP" } else { "START" };
    let transport = button(text(transport_label).size(24)).on_press(Message::StartStop);

    let indicator = BeatIndicator::new(data.indicator_lit()).view();

    let mut panel = column![
        bpm_readout,
        tempo_slider,
        nudge_row,
        beats_row,
        Space::with_height(10),
        transport,
        Space::with_height(10),
        indicator,
    ]
    .spacing(10)
    .align_x(Alignment::Center);

    if !data.metronome_status.is_empty() {
        panel = panel.push(text(data.metronome_status.clone()).size(16));
    }

    panel.into()
}

fn create_tuner_panel(data: &AppDisplayData) -> Element<'static, Message> {
    let reading = data.last_reading;

    let note_name = reading.and_then(|r| r.note_name).unwrap_or("--");
    let note_text = text(note_name).size(64);

    let meter = container(CentMeter::new(reading.and_then(|r| r.cents), data.in_tune_cents).view())
        .width(Length::Fixed(400.0));

    let status = text(data.tuner_status.clone()).size(16);

    let transport_label = if data.tuner_running {
        "Stop Tuner"
    } else {
        "Start Tuner"
    };
    let transport = button(text(transport_label).size(16)).on_press(Message::TunerStartStop);

    column![
        note_text,
        Space::with_height(10),
        meter,
        Space::with_height(10),
        status,
        Space::with_height(10),
        transport,
    ]
    .align_x(Alignment::Center)
    .into()
}
