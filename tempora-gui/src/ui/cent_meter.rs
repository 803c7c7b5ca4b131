//! # Cent Meter Widget
//!
//! A visual tuning meter: a needle over a -50..+50 cents range, colored
//! by tuning zone (green in tune, red flat, yellow sharp). With no
//! detected pitch the meter renders only its neutral background and
//! center line.

use iced::widget::canvas::{self, Geometry, Path, Stroke};
use iced::widget::container;
use iced::{mouse, Color, Element, Point, Rectangle, Renderer, Size, Theme};
use tempora_core::tuning::{self, TuningZone};

/// Maximum cent deviation range for the meter display. Larger offsets
/// are clamped for display only.
const METER_RANGE: f32 = 50.0;

/// Cent meter widget for displaying tuning accuracy.
pub struct CentMeter {
    /// Current cent deviation (None if no pitch detected)
    cents: Option<f32>,
    /// Half-width of the "in tune" band, in cents
    in_tune_cents: f32,
}

impl CentMeter {
    pub fn new(cents: Option<f32>, in_tune_cents: f32) -> Self {
        Self {
            cents,
            in_tune_cents,
        }
    }

    /// Creates the view element for the cent meter.
    pub fn view(self) -> Element<'static, crate::Message> {
        container(
            canvas::Canvas::new(self)
                .width(iced::Length::Fill)
                .height(iced::Length::Fixed(80.0)),
        )
        .into()
    }
}

impl<Message> canvas::Program<Message> for CentMeter {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());

        // Meter background
        let background = Path::rectangle(Point::ORIGIN, bounds.size());
        frame.fill(&background, Color::from_rgb8(0x40, 0x40, 0x40));

        // Center line marks zero cents
        let center_x = bounds.width / 2.0;
        let center_line = Path::line(
            Point::new(center_x, 0.0),
            Point::new(center_x, bounds.height),
        );
        frame.stroke(
            &center_line,
            Stroke::default().with_width(2.0).with_color(Color::WHITE),
        );

        // Needle
        if let Some(c) = self.cents {
            let clamped_cents = c.clamp(-METER_RANGE, METER_RANGE);
            let needle_pos = (clamped_cents + METER_RANGE) / (2.0 * METER_RANGE) * bounds.width;

            let color = match tuning::classify(c, self.in_tune_cents) {
                TuningZone::InTune => Color::from_rgb8(0x28, 0xA7, 0x45), // Green
                TuningZone::Flat => Color::from_rgb8(0xDC, 0x35, 0x45),   // Red
                TuningZone::Sharp => Color::from_rgb8(0xFF, 0xC1, 0x07),  // Yellow
            };

            let needle = Path::rectangle(
                Point::new(needle_pos - 2.0, 0.0),
                Size::new(4.0, bounds.height),
            );
            frame.fill(&needle, color);
        }

        vec![frame.into_geometry()]
    }
}
