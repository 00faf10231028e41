//! # Custom Cursor
//!
//! Pointer-target classification and the two-part cursor (a smoothed ring
//! and a dot pinned to the pointer).
//!
//! ## Classification
//! A single capability lookup walks the hovered element and its ancestors
//! once and produces a `HoverProfile`; `HoverClass` is its tagged summary.
//! When several capabilities apply the class follows
//! `LabeledInteractive > DarkSurface > LightSurface > Interactive > Default`.

use glam::Vec2;
use serde::Serialize;

use crate::animation::{AnimationState, EasingType, Tween};
use crate::applier::{merge_outcomes, Applier};
use crate::pipeline::{Drive, EventKind, FrameContext, Pipeline, POINTER_EVENTS};
use crate::signal::{PointerReading, PointerSampler, Sampler};
use crate::stage::{Stage, WriteOutcome};
use crate::transform::Transform;
use crate::types::{ElementId, Tone, VisualProps};

const DARK_CLASSES: &[&str] = &["btn-primary", "bg-neutral-900"];
const INTERACTIVE_TAGS: &[&str] = &["a", "button"];

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "class", content = "label", rename_all = "snake_case")]
pub enum HoverClass {
    #[default]
    Default,
    Interactive,
    LabeledInteractive(String),
    DarkSurface,
    LightSurface,
}

impl HoverClass {
    pub fn tone(&self) -> Tone {
        match self {
            HoverClass::DarkSurface => Tone::Inverted,
            HoverClass::LightSurface => Tone::Light,
            _ => Tone::Normal,
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            HoverClass::LabeledInteractive(text) => Some(text),
            _ => None,
        }
    }
}

/// Every capability found on the hovered element's ancestor chain.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct HoverProfile {
    /// Innermost cursor label.
    pub label: Option<String>,
    pub interactive: bool,
    pub dark: bool,
    pub light: bool,
}

impl HoverProfile {
    pub fn class(&self) -> HoverClass {
        if let Some(label) = &self.label {
            HoverClass::LabeledInteractive(label.clone())
        } else if self.dark {
            HoverClass::DarkSurface
        } else if self.light {
            HoverClass::LightSurface
        } else if self.interactive {
            HoverClass::Interactive
        } else {
            HoverClass::Default
        }
    }

    /// Dark surfaces win over light ones.
    pub fn tone(&self) -> Tone {
        if self.dark {
            Tone::Inverted
        } else if self.light {
            Tone::Light
        } else {
            Tone::Normal
        }
    }

    /// Ring diameter in pixels.
    pub fn ring_size(&self) -> f32 {
        if self.label.is_some() {
            80.0
        } else if self.interactive {
            60.0
        } else {
            40.0
        }
    }
}

/// Walks `target` and its ancestors once, collecting capabilities.
pub fn hover_profile(stage: &Stage, target: Option<ElementId>) -> HoverProfile {
    let mut profile = HoverProfile::default();
    let Some(target) = target else {
        return profile;
    };
    for id in stage.ancestors(target) {
        let Some(node) = stage.get(id) else {
            continue;
        };
        let traits = &node.traits;
        if profile.label.is_none() {
            profile.label = traits.cursor_text.clone();
        }
        // `cursor-pointer` only counts on the element itself.
        profile.interactive |= INTERACTIVE_TAGS.contains(&traits.tag.as_str())
            || traits.has_class("btn")
            || (id == target && traits.has_class("cursor-pointer"));
        profile.dark |= DARK_CLASSES.iter().any(|c| traits.has_class(c));
        profile.light |= traits.light_bg;
    }
    profile
}

pub fn classify(stage: &Stage, target: ElementId) -> HoverClass {
    hover_profile(stage, Some(target)).class()
}

/// Tunables of the cursor. Defaults match the site's interaction design.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CursorTuning {
    pub smoothing: f32,
    pub base_size: f32,
    pub resize_duration: f64,
    pub fade_duration: f64,
    pub press_duration: f64,
    pub release_duration: f64,
    pub ring_press_scale: f32,
    pub dot_press_scale: f32,
    pub dot_hover_scale: f32,
}

impl Default for CursorTuning {
    fn default() -> Self {
        Self {
            smoothing: 0.15,
            base_size: 40.0,
            resize_duration: 0.4,
            fade_duration: 0.2,
            press_duration: 0.1,
            release_duration: 0.6,
            ring_press_scale: 0.7,
            dot_press_scale: 0.5,
            dot_hover_scale: 1.5,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CursorReading {
    pub pointer: PointerReading,
    pub profile: HoverProfile,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct CursorSampler;

impl Sampler for CursorSampler {
    type Reading = CursorReading;

    fn sample(&mut self, stage: &Stage, ctx: &FrameContext) -> Option<CursorReading> {
        let pointer = PointerSampler.sample(stage, ctx)?;
        Some(CursorReading {
            profile: hover_profile(stage, pointer.hovered),
            pointer,
        })
    }
}

/// What the cursor parts should look like this frame.
#[derive(Clone, Debug, PartialEq)]
pub struct CursorFrame {
    pub ring: VisualProps,
    pub dot: VisualProps,
    pub label: VisualProps,
    /// New label text, only when it changed.
    pub label_text: Option<String>,
}

pub struct CursorTransform {
    tuning: CursorTuning,
    ring: AnimationState<Vec2>,
    ring_size: Tween<f32>,
    ring_press: Tween<f32>,
    dot_press: Tween<f32>,
    dot_scale: Tween<f32>,
    dot_opacity: Tween<f32>,
    label_opacity: Tween<f32>,
    visibility: Tween<f32>,
    profile: HoverProfile,
    shown_label: Option<String>,
    edges: Vec<EventKind>,
}

impl CursorTransform {
    pub fn new(tuning: CursorTuning) -> Self {
        Self {
            ring: AnimationState::new(Vec2::ZERO),
            ring_size: Tween::settled(tuning.base_size),
            ring_press: Tween::settled(1.0),
            dot_press: Tween::settled(1.0),
            dot_scale: Tween::settled(1.0),
            dot_opacity: Tween::settled(1.0),
            label_opacity: Tween::settled(0.0),
            visibility: Tween::settled(1.0),
            profile: HoverProfile::default(),
            shown_label: None,
            edges: Vec::new(),
            tuning,
        }
    }

    fn on_hover_change(&mut self, now: f64, profile: &HoverProfile) {
        let t = &self.tuning;
        let resize = EasingType::PowerOut(2);
        let fade = EasingType::PowerOut(1);
        self.ring_size
            .to(now, profile.ring_size(), t.resize_duration, resize);
        if profile.label.is_some() {
            self.label_opacity.to(now, 1.0, t.fade_duration, fade);
            self.dot_opacity.to(now, 0.0, t.fade_duration, fade);
        } else {
            self.label_opacity.to(now, 0.0, t.fade_duration, fade);
            self.dot_opacity.to(now, 1.0, t.fade_duration, fade);
            let scale = if profile.interactive {
                t.dot_hover_scale
            } else {
                1.0
            };
            self.dot_scale.to(now, scale, t.fade_duration, fade);
        }
    }

    fn on_edge(&mut self, now: f64, edge: EventKind) {
        let t = self.tuning;
        match edge {
            EventKind::PointerDown => {
                let squeeze = EasingType::PowerOut(2);
                self.ring_press
                    .to(now, t.ring_press_scale, t.press_duration, squeeze);
                self.dot_press
                    .to(now, t.dot_press_scale, t.press_duration, squeeze);
            }
            EventKind::PointerUp => {
                self.ring_press
                    .to(now, 1.0, t.release_duration, EasingType::ELASTIC);
                self.dot_press
                    .to(now, 1.0, t.release_duration, EasingType::ELASTIC);
            }
            EventKind::PointerLeave => {
                self.visibility
                    .to(now, 0.0, t.fade_duration, EasingType::PowerOut(1));
            }
            EventKind::PointerEnter => {
                self.visibility
                    .to(now, 1.0, t.fade_duration, EasingType::PowerOut(1));
            }
            _ => {}
        }
    }
}

impl Transform for CursorTransform {
    type Input = CursorReading;
    type Output = CursorFrame;

    fn observe(&mut self, kind: EventKind) {
        if kind != EventKind::PointerMove {
            self.edges.push(kind);
        }
    }

    fn transform(&mut self, input: CursorReading, ctx: &FrameContext) -> CursorFrame {
        let now = ctx.now;
        for edge in std::mem::take(&mut self.edges) {
            self.on_edge(now, edge);
        }
        if input.profile != self.profile {
            self.on_hover_change(now, &input.profile);
            self.profile = input.profile.clone();
        }

        self.ring.retarget(input.pointer.position, now);
        let ring_pos = self.ring.smooth(self.tuning.smoothing);
        let tone = self.profile.tone();
        let visibility = self.visibility.sample(now);

        let ring = VisualProps {
            translate_x: ring_pos.x,
            translate_y: ring_pos.y,
            scale: self.ring_size.sample(now) / self.tuning.base_size * self.ring_press.sample(now),
            opacity: visibility,
            tone,
            ..VisualProps::IDENTITY
        };
        let dot = VisualProps {
            translate_x: input.pointer.position.x,
            translate_y: input.pointer.position.y,
            scale: self.dot_scale.sample(now) * self.dot_press.sample(now),
            opacity: self.dot_opacity.sample(now) * visibility,
            tone,
            ..VisualProps::IDENTITY
        };
        let label = VisualProps {
            opacity: self.label_opacity.sample(now) * visibility,
            ..ring
        };

        // The text stays while the label fades out.
        let label_text = match &self.profile.label {
            Some(text) if self.shown_label.as_ref() != Some(text) => {
                self.shown_label = Some(text.clone());
                Some(text.clone())
            }
            _ => None,
        };

        CursorFrame {
            ring,
            dot,
            label,
            label_text,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct CursorParts {
    pub ring: ElementId,
    pub dot: ElementId,
    pub label: Option<ElementId>,
}

pub struct CursorApplier {
    pub parts: CursorParts,
}

impl Applier for CursorApplier {
    type Value = CursorFrame;

    fn apply(&mut self, stage: &mut Stage, frame: CursorFrame) -> WriteOutcome {
        let mut outcomes = vec![
            stage.write_style(self.parts.ring, frame.ring),
            stage.write_style(self.parts.dot, frame.dot),
        ];
        if let Some(label) = self.parts.label {
            outcomes.push(stage.write_style(label, frame.label));
            if let Some(text) = frame.label_text.as_deref() {
                outcomes.push(stage.write_text(label, Some(text)));
            }
        }
        merge_outcomes(outcomes)
    }
}

pub type CursorEffect = Pipeline<CursorSampler, CursorTransform, CursorApplier>;

/// The ring-and-dot cursor. Runs every frame; pointer events only feed
/// press and visibility edges.
pub fn cursor(parts: CursorParts, tuning: CursorTuning) -> CursorEffect {
    Pipeline::new(
        "cursor",
        CursorSampler,
        CursorTransform::new(tuning),
        CursorApplier { parts },
    )
    .driven_by(Drive::EveryFrame)
    .listening_to(POINTER_EVENTS)
}
