//! Seamless two-track marquee.

use serde::{Deserialize, Serialize};

use crate::applier::StyleSetApplier;
use crate::pipeline::{Drive, FrameContext, Pipeline};
use crate::signal::{ElementReading, ElementSampler};
use crate::transform::Transform;
use crate::types::{ElementId, VisualProps};

pub const SEPARATOR: &str = " • ";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarqueeDirection {
    #[default]
    Left,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarqueeSettings {
    /// Pixels per second.
    pub speed: f32,
    pub direction: MarqueeDirection,
    /// Track width; measured from the first track when absent.
    pub width: Option<f32>,
}

impl Default for MarqueeSettings {
    fn default() -> Self {
        Self {
            speed: 30.0,
            direction: MarqueeDirection::Left,
            width: None,
        }
    }
}

/// `text` followed by `separator`, `count` times.
pub fn repeated_text(text: &str, separator: &str, count: usize) -> String {
    format!("{text}{separator}").repeat(count)
}

/// Offsets of both tracks `elapsed` seconds into the loop. The second track
/// always sits one width behind the first in travel order.
pub fn track_offsets(settings: &MarqueeSettings, width: f32, elapsed: f64) -> (f32, f32) {
    if width <= 0.0 || !width.is_finite() {
        return (0.0, width.max(0.0));
    }
    let travelled = (settings.speed as f64 * elapsed).rem_euclid(width as f64) as f32;
    match settings.direction {
        MarqueeDirection::Left => (-travelled, width - travelled),
        MarqueeDirection::Right => (travelled, travelled - width),
    }
}

pub struct MarqueeTransform {
    pub settings: MarqueeSettings,
    started_at: Option<f64>,
}

impl MarqueeTransform {
    pub fn new(settings: MarqueeSettings) -> Self {
        Self {
            settings,
            started_at: None,
        }
    }

    /// Seconds per loop, zero when the loop cannot move.
    pub fn period(&self, width: f32) -> f64 {
        if self.settings.speed > 0.0 && width > 0.0 {
            (width / self.settings.speed) as f64
        } else {
            0.0
        }
    }
}

impl Transform for MarqueeTransform {
    type Input = ElementReading;
    type Output = Vec<VisualProps>;

    fn transform(&mut self, input: ElementReading, ctx: &FrameContext) -> Vec<VisualProps> {
        let started = *self.started_at.get_or_insert(ctx.now);
        let width = self.settings.width.unwrap_or(input.rect.width);
        let (first, second) = track_offsets(&self.settings, width, ctx.now - started);
        vec![
            VisualProps::IDENTITY.with_translate(first, 0.0),
            VisualProps::IDENTITY.with_translate(second, 0.0),
        ]
    }
}

pub type MarqueeEffect = Pipeline<ElementSampler, MarqueeTransform, StyleSetApplier>;

pub fn marquee(tracks: [ElementId; 2], settings: MarqueeSettings) -> MarqueeEffect {
    Pipeline::new(
        "marquee",
        ElementSampler::new(tracks[0]),
        MarqueeTransform::new(settings),
        StyleSetApplier::new(tracks.to_vec()),
    )
    .driven_by(Drive::EveryFrame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Effect;
    use crate::stage::{ElementTraits, Stage};
    use crate::types::Rect;

    #[test]
    fn left_loop_wraps_seamlessly() {
        let settings = MarqueeSettings::default();
        assert_eq!(track_offsets(&settings, 300.0, 0.0), (0.0, 300.0));
        assert_eq!(track_offsets(&settings, 300.0, 5.0), (-150.0, 150.0));
        assert_eq!(track_offsets(&settings, 300.0, 10.0), (0.0, 300.0));
    }

    #[test]
    fn right_loop_mirrors() {
        let settings = MarqueeSettings {
            direction: MarqueeDirection::Right,
            ..MarqueeSettings::default()
        };
        assert_eq!(track_offsets(&settings, 300.0, 5.0), (150.0, -150.0));
    }

    #[test]
    fn zero_width_stands_still() {
        let settings = MarqueeSettings::default();
        assert_eq!(track_offsets(&settings, 0.0, 12.0), (0.0, 0.0));
        assert_eq!(MarqueeTransform::new(settings).period(0.0), 0.0);
    }

    #[test]
    fn tracks_measure_width_from_the_first() {
        let mut stage = Stage::default();
        let track = |x| Some(Rect::new(x, 0.0, 600.0, 40.0));
        let a = stage.add_element(ElementTraits::default(), track(0.0));
        let b = stage.add_element(ElementTraits::default(), track(600.0));
        let mut effect = marquee([a, b], MarqueeSettings::default());
        assert_eq!(effect.transform.period(600.0), 20.0);

        effect.tick(&mut stage, &FrameContext::at(1.0));
        effect.tick(&mut stage, &FrameContext::at(3.0));
        assert_eq!(stage.style(a).unwrap().translate_x, -60.0);
        assert_eq!(stage.style(b).unwrap().translate_x, 540.0);
    }

    #[test]
    fn text_repeats_with_separator() {
        assert_eq!(repeated_text("Hi", SEPARATOR, 2), "Hi • Hi • ");
    }
}
