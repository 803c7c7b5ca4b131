//! # Beat Indicator Widget
//!
//! A circle that flashes for ~50 ms every time the scheduler emits a
//! beat, giving visual confirmation of the click track.

use iced::widget::canvas::{self, Geometry, Path};
use iced::widget::container;
use iced::{mouse, Color, Element, Point, Rectangle, Renderer, Theme};

/// Beat indicator widget: lit briefly after each scheduled beat.
pub struct BeatIndicator {
    lit: bool,
}

impl BeatIndicator {
    pub fn new(lit: bool) -> Self {
        Self { lit }
    }

    /// Creates the view element for the beat indicator.
    pub fn view(self) -> Element<'static, crate::Message> {
        container(
            canvas::Canvas::new(self)
                .width(iced::Length::Fixed(60.0))
                .height(iced::Length::Fixed(60.0)),
        )
        .into()
    }
}

impl<Message> canvas::Program<Message> for BeatIndicator {
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

        let center = Point::new(bounds.width / 2.0, bounds.height / 2.0);
        let radius = bounds.width.min(bounds.height) / 2.0 - 4.0;
        let circle = Path::circle(center, radius);

        let color = if self.lit {
            Color::from_rgb8(0x34, 0xDB, 0x98)
        } else {
            Color::from_rgb8(0x33, 0x33, 0x33)
        };
        frame.fill(&circle, color);

        vec![frame.into_geometry()]
    }
}
