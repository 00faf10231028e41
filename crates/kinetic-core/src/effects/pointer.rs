//! Pointer-following effects: the project hover preview and magnetic hover.

use glam::Vec2;

use crate::animation::{AnimationState, EasingType, Tween};
use crate::applier::{merge_outcomes, Applier, StyleApplier};
use crate::pipeline::{Control, Drive, FrameContext, Pipeline, POINTER_EVENTS};
use crate::signal::{
    ElementPointerSampler, ElementReading, PointerReading, PointerSampler, Sampler,
};
use crate::stage::{Stage, WriteOutcome};
use crate::transform::Transform;
use crate::types::{ElementId, VisualProps};

/// Offset of the preview card from the pointer, both axes.
pub const PREVIEW_OFFSET: f32 = 30.0;
pub const PREVIEW_SMOOTHING: f32 = 0.1;

/// A hoverable project row and the title its preview shows.
#[derive(Clone, Debug, PartialEq)]
pub struct PreviewSource {
    pub element: ElementId,
    pub title: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PreviewReading {
    pub pointer: PointerReading,
    /// Index of the source under the pointer.
    pub active: Option<usize>,
}

pub struct PreviewSampler {
    sources: Vec<ElementId>,
}

impl Sampler for PreviewSampler {
    type Reading = PreviewReading;

    fn sample(&mut self, stage: &Stage, ctx: &FrameContext) -> Option<PreviewReading> {
        let pointer = PointerSampler.sample(stage, ctx)?;
        let active = pointer.hovered.and_then(|hovered| {
            stage
                .ancestors(hovered)
                .find_map(|id| self.sources.iter().position(|&s| s == id))
        });
        Some(PreviewReading { pointer, active })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PreviewFrame {
    /// Position of the outer frame.
    pub frame: VisualProps,
    /// Opacity and scale of the card.
    pub card: VisualProps,
    /// Title to show, only when the active project changed.
    pub title: Option<String>,
}

pub struct PreviewTransform {
    titles: Vec<String>,
    smoothing: f32,
    position: AnimationState<Vec2>,
    opacity: Tween<f32>,
    scale: Tween<f32>,
    active: Option<usize>,
}

impl PreviewTransform {
    pub fn new(titles: Vec<String>, smoothing: f32) -> Self {
        Self {
            titles,
            smoothing,
            position: AnimationState::new(Vec2::ZERO),
            opacity: Tween::settled(0.0),
            scale: Tween::settled(0.8),
            active: None,
        }
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }
}

impl Transform for PreviewTransform {
    type Input = PreviewReading;
    type Output = PreviewFrame;

    fn transform(&mut self, input: PreviewReading, ctx: &FrameContext) -> PreviewFrame {
        let now = ctx.now;
        let mut title = None;
        if input.active != self.active {
            match input.active {
                Some(index) => {
                    let show = EasingType::PowerOut(3);
                    self.opacity.to(now, 1.0, 0.4, show);
                    self.scale.to(now, 1.0, 0.4, show);
                    title = self
                        .titles
                        .get(index)
                        .and_then(|t| t.split(' ').next())
                        .map(str::to_string);
                }
                None => {
                    let hide = EasingType::PowerIn(3);
                    self.opacity.to(now, 0.0, 0.3, hide);
                    self.scale.to(now, 0.8, 0.3, hide);
                }
            }
            self.active = input.active;
        }

        let target = input.pointer.position + Vec2::splat(PREVIEW_OFFSET);
        self.position.retarget(target, now);
        let pos = self.position.smooth(self.smoothing);

        PreviewFrame {
            frame: VisualProps::IDENTITY.with_translate(pos.x, pos.y),
            card: VisualProps::IDENTITY
                .with_opacity(self.opacity.sample(now))
                .with_scale(self.scale.sample(now)),
            title,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct PreviewParts {
    pub frame: ElementId,
    pub card: ElementId,
    pub title: Option<ElementId>,
}

pub struct PreviewApplier {
    pub parts: PreviewParts,
}

impl Applier for PreviewApplier {
    type Value = PreviewFrame;

    fn apply(&mut self, stage: &mut Stage, value: PreviewFrame) -> WriteOutcome {
        let mut outcomes = vec![
            stage.write_style(self.parts.frame, value.frame),
            stage.write_style(self.parts.card, value.card),
        ];
        if let (Some(id), Some(text)) = (self.parts.title, value.title.as_deref()) {
            outcomes.push(stage.write_text(id, Some(text)));
        }
        merge_outcomes(outcomes)
    }
}

pub type HoverPreviewEffect = Pipeline<PreviewSampler, PreviewTransform, PreviewApplier>;

/// A floating preview that trails the pointer and pops in while any of
/// `sources` is hovered.
pub fn hover_preview(
    parts: PreviewParts,
    sources: Vec<PreviewSource>,
    smoothing: f32,
) -> HoverPreviewEffect {
    let (elements, titles): (Vec<ElementId>, Vec<String>) = sources
        .into_iter()
        .map(|s| (s.element, s.title))
        .unzip();
    Pipeline::new(
        "hover_preview",
        PreviewSampler { sources: elements },
        PreviewTransform::new(titles, smoothing),
        PreviewApplier { parts },
    )
    .driven_by(Drive::EveryFrame)
    .listening_to(POINTER_EVENTS)
}

pub const MAGNETIC_STRENGTH: f32 = 0.35;

/// Pulls an element toward the pointer while it is over it and springs
/// back on leave.
pub struct MagneticTransform {
    strength: f32,
    x: Tween<f32>,
    y: Tween<f32>,
    last_pointer: Option<Vec2>,
    control: Option<Control>,
}

impl MagneticTransform {
    pub fn new(strength: f32) -> Self {
        Self {
            strength,
            x: Tween::settled(0.0),
            y: Tween::settled(0.0),
            last_pointer: None,
            control: None,
        }
    }

    fn tween_to(&mut self, now: f64, target: Vec2, duration: f64, ease: EasingType) {
        self.x.to(now, target.x, duration, ease);
        self.y.to(now, target.y, duration, ease);
    }
}

impl Transform for MagneticTransform {
    type Input = (ElementReading, PointerReading);
    type Output = VisualProps;

    fn transform(&mut self, input: Self::Input, ctx: &FrameContext) -> VisualProps {
        let (element, pointer) = input;
        let now = ctx.now;
        let rect = element.rect;
        let over = pointer.inside && rect.contains(pointer.position.x, pointer.position.y);

        if over {
            if self.last_pointer != Some(pointer.position) {
                let centre = Vec2::new(rect.center_x(), rect.center_y());
                let pull = (pointer.position - centre) * self.strength;
                self.tween_to(now, pull, 0.4, EasingType::PowerOut(2));
                self.last_pointer = Some(pointer.position);
            }
        } else if self.last_pointer.take().is_some() {
            self.tween_to(now, Vec2::ZERO, 0.7, EasingType::ELASTIC);
        }

        let animating = !(self.x.is_done(now) && self.y.is_done(now));
        self.control = animating.then_some(Control::Continue);
        VisualProps::IDENTITY.with_translate(self.x.sample(now), self.y.sample(now))
    }

    fn control(&self) -> Option<Control> {
        self.control
    }
}

pub type MagneticEffect = Pipeline<ElementPointerSampler, MagneticTransform, StyleApplier>;

pub fn magnetic(target: ElementId, strength: f32) -> MagneticEffect {
    Pipeline::new(
        "magnetic",
        ElementPointerSampler { target },
        MagneticTransform::new(strength),
        StyleApplier::new(target),
    )
    .listening_to(POINTER_EVENTS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Effect;
    use crate::stage::ElementTraits;
    use crate::types::{Rect, Viewport};

    fn run(effect: &mut impl Effect, stage: &mut Stage, from: f64, to: f64) -> Control {
        let mut t = from;
        let mut control = Control::Idle;
        while t <= to {
            control = effect.tick(stage, &FrameContext::at(t).with_dt(1.0 / 60.0));
            t += 1.0 / 60.0;
        }
        control
    }

    fn point(stage: &mut Stage, x: f32, y: f32) {
        stage.pointer = Vec2::new(x, y);
        stage.pointer_inside = true;
        stage.hovered = stage.hit_test(x, y);
    }

    #[test]
    fn magnetic_pulls_then_springs_back() {
        let mut stage = Stage::new(Viewport::new(1000.0, 800.0), 800.0);
        let button = stage.add_element(
            ElementTraits::tag("button"),
            Some(Rect::new(100.0, 100.0, 200.0, 100.0)),
        );
        let mut effect = magnetic(button, MAGNETIC_STRENGTH);

        point(&mut stage, 250.0, 150.0);
        assert_eq!(effect.tick(&mut stage, &FrameContext::at(0.0)), Control::Continue);
        assert_eq!(run(&mut effect, &mut stage, 0.1, 0.6), Control::Idle);
        let pulled = stage.style(button).unwrap();
        assert!((pulled.translate_x - 17.5).abs() < 1e-4);
        assert!(pulled.translate_y.abs() < 1e-4);

        point(&mut stage, 600.0, 600.0);
        assert_eq!(effect.tick(&mut stage, &FrameContext::at(1.0)), Control::Continue);
        run(&mut effect, &mut stage, 1.1, 2.0);
        assert!(stage.style(button).unwrap().translate_x.abs() < 1e-4);
    }

    #[test]
    fn magnetic_ignores_pointer_elsewhere() {
        let mut stage = Stage::new(Viewport::new(1000.0, 800.0), 800.0);
        let button = stage.add_element(
            ElementTraits::tag("button"),
            Some(Rect::new(100.0, 100.0, 200.0, 100.0)),
        );
        let mut effect = magnetic(button, MAGNETIC_STRENGTH);
        point(&mut stage, 700.0, 700.0);
        assert_eq!(effect.tick(&mut stage, &FrameContext::at(0.0)), Control::Idle);
        assert_eq!(stage.style(button).unwrap(), VisualProps::IDENTITY);
    }

    #[test]
    fn preview_shows_for_hovered_project() {
        let mut stage = Stage::new(Viewport::new(1000.0, 800.0), 800.0);
        let list = stage.add_element(
            ElementTraits::tag("ul"),
            Some(Rect::new(0.0, 0.0, 1000.0, 400.0)),
        );
        let row = stage.add_element(
            ElementTraits::tag("li"),
            Some(Rect::new(0.0, 0.0, 1000.0, 100.0)),
        );
        let cell = stage.add_element(
            ElementTraits::tag("span"),
            Some(Rect::new(0.0, 0.0, 200.0, 100.0)),
        );
        stage.attach(list, row);
        stage.attach(row, cell);
        let frame = stage.add_element(ElementTraits::default(), None);
        let card = stage.add_element(ElementTraits::default(), None);
        let title = stage.add_element(ElementTraits::tag("span"), None);

        let parts = PreviewParts {
            frame,
            card,
            title: Some(title),
        };
        let sources = vec![PreviewSource {
            element: row,
            title: "Orbit Studio".into(),
        }];
        let mut effect = hover_preview(parts, sources, PREVIEW_SMOOTHING);

        point(&mut stage, 50.0, 50.0);
        assert_eq!(stage.hovered, Some(cell));
        run(&mut effect, &mut stage, 0.0, 0.6);
        assert_eq!(effect.transform.active(), Some(0));
        assert_eq!(stage.style(card).unwrap().opacity, 1.0);
        assert_eq!(stage.get(title).unwrap().text.as_deref(), Some("Orbit"));
        let pos = stage.style(frame).unwrap();
        assert!(pos.translate_x > 0.0 && pos.translate_x <= 80.0);

        point(&mut stage, 50.0, 600.0);
        run(&mut effect, &mut stage, 0.7, 1.2);
        assert_eq!(effect.transform.active(), None);
        let hidden = stage.style(card).unwrap();
        assert_eq!(hidden.opacity, 0.0);
        assert!((hidden.scale - 0.8).abs() < 1e-4);
    }
}
