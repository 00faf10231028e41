//! Per-character staggered text.
//!
//! Text is split into units that become child elements of the container.
//! When enough of the container is visible every unit rises from one line
//! height below while fading in, each one `step` seconds after the last.

use serde::{Deserialize, Serialize};

use crate::animation::{EasingType, Playhead};
use crate::applier::StyleSetApplier;
use crate::pipeline::{Control, FrameContext, Pipeline};
use crate::signal::{ElementReading, ElementSampler};
use crate::stage::{ElementTraits, Stage};
use crate::transform::{IntersectionTrigger, Transform};
use crate::types::{ElementId, VisualProps};

/// Spaces become non-breaking so empty units keep their width.
pub const NBSP: char = '\u{00A0}';

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitMode {
    #[default]
    Chars,
    Words,
}

pub fn split_units(text: &str, mode: SplitMode) -> Vec<String> {
    match mode {
        SplitMode::Chars => text
            .chars()
            .map(|c| if c == ' ' { NBSP } else { c })
            .map(String::from)
            .collect(),
        SplitMode::Words => text
            .split(' ')
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect(),
    }
}

/// Creates one `span` child of `container` per unit, carrying its text.
pub fn mount_units(
    stage: &mut Stage,
    container: ElementId,
    text: &str,
    mode: SplitMode,
) -> Vec<ElementId> {
    split_units(text, mode)
        .into_iter()
        .map(|unit| {
            let id = stage.add_element(ElementTraits::tag("span"), None);
            stage.attach(container, id);
            stage.write_text(id, Some(unit.as_str()));
            id
        })
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaggerSettings {
    /// Delay before the first unit, seconds.
    pub delay: f64,
    /// Extra delay per unit, seconds.
    pub step: f64,
    pub duration: f64,
    pub ease: EasingType,
    /// Visible fraction that starts the animation.
    pub ratio: f32,
    /// Pixels trimmed off the bottom of the viewport for visibility.
    pub bottom_margin: f32,
}

impl Default for StaggerSettings {
    fn default() -> Self {
        Self {
            delay: 0.0,
            step: 0.04,
            duration: 0.5,
            ease: EasingType::EaseOut,
            ratio: 0.1,
            bottom_margin: 50.0,
        }
    }
}

pub struct StaggerTransform {
    settings: StaggerSettings,
    trigger: IntersectionTrigger,
    heads: Vec<Playhead>,
    control: Option<Control>,
}

impl StaggerTransform {
    pub fn new(units: usize, settings: StaggerSettings) -> Self {
        let heads = (0..units)
            .map(|i| Playhead::new(settings.duration, settings.delay + i as f64 * settings.step))
            .collect();
        Self {
            trigger: IntersectionTrigger::new(settings.ratio, settings.bottom_margin),
            settings,
            heads,
            control: None,
        }
    }
}

impl Transform for StaggerTransform {
    type Input = ElementReading;
    type Output = Vec<VisualProps>;

    fn transform(&mut self, input: ElementReading, ctx: &FrameContext) -> Vec<VisualProps> {
        if self.trigger.has_fired() {
            for head in &mut self.heads {
                head.advance(ctx.dt);
            }
        } else if self.trigger.update(&input.rect, &input.viewport) {
            self.heads.iter_mut().for_each(|h| h.play());
        }

        self.control = if self.trigger.has_fired() {
            if self.heads.iter().any(|h| h.is_running()) {
                Some(Control::Detach)
            } else {
                Some(Control::Finished)
            }
        } else {
            None
        };

        let line = input.rect.height;
        let duration = self.settings.duration;
        let fired = self.trigger.has_fired();
        self.heads
            .iter()
            .map(|head| {
                let p = if !fired || (head.time <= 0.0 && duration > 0.0) {
                    0.0
                } else if head.time >= duration {
                    1.0
                } else {
                    self.settings.ease.eval((head.time / duration) as f32)
                };
                VisualProps::IDENTITY
                    .with_opacity(p)
                    .with_translate(0.0, (1.0 - p) * line)
            })
            .collect()
    }

    fn control(&self) -> Option<Control> {
        self.control
    }
}

pub type StaggerTextEffect = Pipeline<ElementSampler, StaggerTransform, StyleSetApplier>;

pub fn stagger_text(
    container: ElementId,
    units: Vec<ElementId>,
    settings: StaggerSettings,
) -> StaggerTextEffect {
    Pipeline::new(
        "stagger_text",
        ElementSampler::new(container),
        StaggerTransform::new(units.len(), settings),
        StyleSetApplier::new(units),
    )
}
