//! Scroll-proportional fades: centred statement text and the hero exit.

use crate::applier::{GatedStyleApplier, StyleSetApplier, WriteEpsilon};
use crate::pipeline::{FrameContext, Pipeline};
use crate::signal::{ElementReading, ElementSampler};
use crate::transform::{normalized_center_distance, safe_ratio, FnTransform, Transform};
use crate::types::{ElementId, VisualProps};

/// Fraction of the viewport height over which the text fades.
const TEXT_SPAN: f32 = 0.6;
/// Past this normalized distance the text is fully transparent.
const TEXT_CUTOFF: f32 = 1.25;

/// Opacity, scale and drift of statement text by distance from centre.
pub fn scroll_text_props(reading: &ElementReading) -> VisualProps {
    let n = normalized_center_distance(&reading.rect, &reading.viewport, TEXT_SPAN)
        .clamp(-TEXT_CUTOFF, TEXT_CUTOFF);
    let far = n.abs();
    VisualProps {
        opacity: (1.0 - far * 0.8).clamp(0.0, 1.0),
        scale: 0.95 + (1.0 - far) * 0.05,
        translate_y: n * 30.0,
        ..VisualProps::IDENTITY
    }
}

pub struct ScrollTextTransform;

impl Transform for ScrollTextTransform {
    type Input = ElementReading;
    type Output = VisualProps;

    fn transform(&mut self, input: ElementReading, _ctx: &FrameContext) -> VisualProps {
        scroll_text_props(&input)
    }
}

pub type ScrollFadeEffect = Pipeline<ElementSampler, ScrollTextTransform, GatedStyleApplier>;

/// Statement text that is fully visible at the viewport centre. Writes are
/// dropped unless a property moves past its threshold.
pub fn scroll_fade(target: ElementId) -> ScrollFadeEffect {
    Pipeline::new(
        "scroll_fade",
        ElementSampler::new(target),
        ScrollTextTransform,
        GatedStyleApplier::new(target, WriteEpsilon::SCROLL_TEXT),
    )
}

/// Hero exit progress: 0 at rest, 1 once scrolled half its height.
pub fn hero_progress(reading: &ElementReading) -> f32 {
    safe_ratio(-reading.rect.top, reading.rect.height * 0.5, 0.0).clamp(0.0, 1.0)
}

/// Scroll indicator stays while progress is below this.
pub const INDICATOR_CUTOFF: f32 = 0.3;

pub fn hero_props(progress: f32) -> VisualProps {
    VisualProps::IDENTITY
        .with_opacity(1.0 - progress * 1.5)
        .with_scale(1.0 - progress * 0.1)
        .with_translate(0.0, progress * -50.0)
}

pub type HeroTransform = FnTransform<fn(ElementReading, &FrameContext) -> Vec<VisualProps>, ElementReading>;

fn hero_frame(reading: ElementReading, ctx: &FrameContext) -> Vec<VisualProps> {
    let progress = hero_progress(&reading);
    let indicator = if ctx.intro_complete && progress < INDICATOR_CUTOFF {
        1.0
    } else {
        0.0
    };
    vec![
        hero_props(progress),
        VisualProps::IDENTITY.with_opacity(indicator),
    ]
}

pub type HeroEffect = Pipeline<ElementSampler, HeroTransform, StyleSetApplier>;

/// Fades, shrinks and lifts the hero content as the section scrolls away.
/// The indicator, when present, shows only after the intro and near the top.
pub fn hero_fade(section: ElementId, content: ElementId, indicator: Option<ElementId>) -> HeroEffect {
    let mut targets = vec![content];
    targets.extend(indicator);
    Pipeline::new(
        "hero_fade",
        ElementSampler::new(section),
        FnTransform::new(hero_frame as fn(ElementReading, &FrameContext) -> Vec<VisualProps>),
        StyleSetApplier::new(targets),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Effect;
    use crate::stage::{ElementTraits, Stage};
    use crate::types::{Rect, Viewport};

    fn reading(top: f32, height: f32) -> ElementReading {
        ElementReading {
            rect: Rect::new(0.0, top, 100.0, height),
            viewport: Viewport::new(1000.0, 1000.0),
        }
    }

    #[test]
    fn text_is_clear_at_centre_and_fades_away() {
        let centred = scroll_text_props(&reading(400.0, 200.0));
        assert_eq!(centred.opacity, 1.0);
        assert!((centred.scale - 1.0).abs() < 1e-6);
        assert_eq!(centred.translate_y, 0.0);

        let low = scroll_text_props(&reading(700.0, 200.0));
        assert!((low.opacity - 0.6).abs() < 1e-5);
        assert!((low.translate_y - 15.0).abs() < 1e-4);

        let gone = scroll_text_props(&reading(5000.0, 200.0));
        assert_eq!(gone.opacity, 0.0);
    }

    #[test]
    fn small_scrolls_do_not_write() {
        let mut stage = Stage::new(Viewport::new(1000.0, 1000.0), 5000.0);
        let text = stage.add_element(
            ElementTraits::default(),
            Some(Rect::new(0.0, 1000.0, 800.0, 200.0)),
        );
        let mut effect = scroll_fade(text);
        effect.tick(&mut stage, &FrameContext::at(0.0));
        let writes = stage.get(text).unwrap().writes;

        stage.set_scroll(0.2);
        effect.tick(&mut stage, &FrameContext::at(0.016));
        assert_eq!(stage.get(text).unwrap().writes, writes);

        stage.set_scroll(100.0);
        effect.tick(&mut stage, &FrameContext::at(0.032));
        assert_eq!(stage.get(text).unwrap().writes, writes + 1);
    }

    #[test]
    fn hero_exit_mapping() {
        assert_eq!(hero_progress(&reading(0.0, 800.0)), 0.0);
        assert_eq!(hero_progress(&reading(-200.0, 800.0)), 0.5);
        assert_eq!(hero_progress(&reading(-2000.0, 800.0)), 1.0);
        assert_eq!(hero_progress(&reading(-10.0, 0.0)), 0.0);

        let half = hero_props(0.5);
        assert_eq!(half.opacity, 0.25);
        assert!((half.scale - 0.95).abs() < 1e-6);
        assert_eq!(half.translate_y, -25.0);
        assert_eq!(hero_props(1.0).opacity, 0.0);
    }

    #[test]
    fn indicator_waits_for_intro() {
        let mut stage = Stage::new(Viewport::new(1000.0, 800.0), 3000.0);
        let section = stage.add_element(
            ElementTraits::tag("section"),
            Some(Rect::new(0.0, 0.0, 1000.0, 800.0)),
        );
        let content = stage.add_element(ElementTraits::default(), None);
        let indicator = stage.add_element(ElementTraits::default(), None);
        let mut effect = hero_fade(section, content, Some(indicator));

        let mut loading = FrameContext::at(0.0);
        loading.intro_complete = false;
        effect.tick(&mut stage, &loading);
        assert_eq!(stage.style(indicator).unwrap().opacity, 0.0);

        effect.tick(&mut stage, &FrameContext::at(1.0));
        assert_eq!(stage.style(indicator).unwrap().opacity, 1.0);

        stage.set_scroll(200.0);
        effect.tick(&mut stage, &FrameContext::at(2.0));
        assert_eq!(stage.style(indicator).unwrap().opacity, 0.0);
        assert_eq!(stage.style(content).unwrap().opacity, 0.25);
    }
}
