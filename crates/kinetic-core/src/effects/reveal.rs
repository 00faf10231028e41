//! Scroll-triggered entrance reveals.
//!
//! A trigger element crossing the start line (default `top 85%`) plays a
//! timed tween on one or more targets, optionally staggered. `Once` reveals
//! drop their scroll subscription as soon as they fire; `PlayReverse`
//! reveals rewind when the trigger drops back below the line.

use serde::{Deserialize, Serialize};

use crate::animation::{Animated, EasingType, Playhead};
use crate::applier::StyleSetApplier;
use crate::pipeline::{Control, FrameContext, Pipeline};
use crate::signal::{ElementReading, ElementSampler};
use crate::transform::{
    Transform, ThresholdTrigger, TriggerEdge, TriggerMode, DEFAULT_TRIGGER_FRACTION,
};
use crate::types::{ElementId, VisualProps};

/// Side a directional reveal enters from, named by the direction it moves.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlideDirection {
    #[default]
    Up,
    Down,
    Left,
    Right,
}

fn default_distance() -> f32 {
    60.0
}

/// Starting pose of a reveal. Every preset ends at the identity pose.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevealPreset {
    Fade,
    /// Rises 80px with a slight 5° tilt.
    #[default]
    SlideUp,
    /// Enters from 100px to the right.
    SlideLeft,
    /// Enters from 100px to the left.
    SlideRight,
    /// Grows from 90%.
    Scale,
    /// Sharpens from a 20px blur.
    Blur,
    /// Any offset/tilt, e.g. `{ "offset": { "y": 40, "rotate_x": -40 } }`
    /// for word reveals.
    Offset {
        #[serde(default)]
        x: f32,
        #[serde(default)]
        y: f32,
        #[serde(default)]
        rotate_x: f32,
    },
    /// Fades in while travelling `distance` pixels in `direction`.
    Direction {
        #[serde(default)]
        direction: SlideDirection,
        #[serde(default = "default_distance")]
        distance: f32,
    },
    ScaleFrom {
        scale: f32,
    },
    BlurFrom {
        radius: f32,
    },
}

impl RevealPreset {
    pub fn start_pose(&self) -> VisualProps {
        let hidden = VisualProps::hidden();
        match *self {
            RevealPreset::Fade => hidden,
            RevealPreset::SlideUp => VisualProps {
                translate_y: 80.0,
                rotate_x: 5.0,
                ..hidden
            },
            RevealPreset::SlideLeft => hidden.with_translate(100.0, 0.0),
            RevealPreset::SlideRight => hidden.with_translate(-100.0, 0.0),
            RevealPreset::Scale => hidden.with_scale(0.9),
            RevealPreset::Blur => VisualProps {
                blur: 20.0,
                ..hidden
            },
            RevealPreset::Offset { x, y, rotate_x } => VisualProps {
                rotate_x,
                ..hidden.with_translate(x, y)
            },
            RevealPreset::Direction {
                direction,
                distance,
            } => match direction {
                SlideDirection::Up => hidden.with_translate(0.0, distance),
                SlideDirection::Down => hidden.with_translate(0.0, -distance),
                SlideDirection::Left => hidden.with_translate(distance, 0.0),
                SlideDirection::Right => hidden.with_translate(-distance, 0.0),
            },
            RevealPreset::ScaleFrom { scale } => hidden.with_scale(scale),
            RevealPreset::BlurFrom { radius } => VisualProps {
                blur: radius,
                ..hidden
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealSettings {
    pub preset: RevealPreset,
    pub mode: TriggerMode,
    /// Start line as a fraction of the viewport height.
    pub start: f32,
    pub delay: f64,
    pub duration: f64,
    pub ease: EasingType,
    /// Extra delay per target.
    pub stagger: f64,
}

impl Default for RevealSettings {
    fn default() -> Self {
        Self {
            preset: RevealPreset::default(),
            mode: TriggerMode::Once,
            start: DEFAULT_TRIGGER_FRACTION,
            delay: 0.0,
            duration: 1.0,
            ease: EasingType::PowerOut(3),
            stagger: 0.0,
        }
    }
}

pub struct RevealTransform {
    trigger: ThresholdTrigger,
    heads: Vec<Playhead>,
    tracks: Vec<Animated<VisualProps>>,
    control: Option<Control>,
}

impl RevealTransform {
    pub fn new(targets: usize, settings: &RevealSettings) -> Self {
        let from = settings.preset.start_pose();
        let heads = (0..targets)
            .map(|i| Playhead::new(settings.duration, settings.delay + i as f64 * settings.stagger))
            .collect();
        let tracks = (0..targets)
            .map(|_| Animated::tween(from, VisualProps::IDENTITY, settings.duration, settings.ease))
            .collect();
        Self {
            trigger: ThresholdTrigger::new(settings.start, settings.mode),
            heads,
            tracks,
            control: None,
        }
    }

    pub fn trigger(&self) -> &ThresholdTrigger {
        &self.trigger
    }

    pub fn is_complete(&self) -> bool {
        self.heads.iter().all(Playhead::is_complete)
    }
}

impl Transform for RevealTransform {
    type Input = ElementReading;
    type Output = Vec<VisualProps>;

    fn transform(&mut self, input: ElementReading, ctx: &FrameContext) -> Vec<VisualProps> {
        let edge = self.trigger.update(&input.rect, &input.viewport);
        match edge {
            TriggerEdge::Enter => self.heads.iter_mut().for_each(Playhead::play),
            TriggerEdge::LeaveBack => self.heads.iter_mut().for_each(Playhead::reverse),
            TriggerEdge::None => {
                // Playback starts on the frame after the edge.
                for head in &mut self.heads {
                    head.advance(ctx.dt);
                }
            }
        }

        let running = self.heads.iter().any(Playhead::is_running);
        self.control = match (self.trigger.is_spent(), running) {
            (true, true) => Some(Control::Detach),
            (true, false) => Some(Control::Finished),
            (false, true) => Some(Control::Continue),
            (false, false) => None,
        };

        self.heads
            .iter()
            .zip(&mut self.tracks)
            .map(|(head, track)| *track.update(head.time))
            .collect()
    }

    fn control(&self) -> Option<Control> {
        self.control
    }
}

pub type RevealEffect = Pipeline<ElementSampler, RevealTransform, StyleSetApplier>;

/// Reveals `targets` when `trigger` crosses the start line.
pub fn reveal(trigger: ElementId, targets: Vec<ElementId>, settings: RevealSettings) -> RevealEffect {
    Pipeline::new(
        "reveal",
        ElementSampler::new(trigger),
        RevealTransform::new(targets.len(), &settings),
        StyleSetApplier::new(targets),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Effect;
    use crate::stage::{ElementTraits, Stage};
    use crate::types::{Rect, Viewport};

    fn scene() -> (Stage, ElementId) {
        let mut stage = Stage::new(Viewport::new(1000.0, 800.0), 4000.0);
        let section = stage.add_element(
            ElementTraits::tag("section"),
            Some(Rect::new(0.0, 1200.0, 1000.0, 400.0)),
        );
        (stage, section)
    }

    fn run(effect: &mut RevealEffect, stage: &mut Stage, from: f64, to: f64) -> Control {
        let mut t = from;
        let mut control = Control::Idle;
        while t <= to {
            control = effect.tick(stage, &FrameContext::at(t).with_dt(1.0 / 60.0));
            t += 1.0 / 60.0;
        }
        control
    }

    #[test]
    fn presets_start_hidden() {
        let slide = RevealPreset::SlideUp.start_pose();
        assert_eq!((slide.opacity, slide.translate_y, slide.rotate_x), (0.0, 80.0, 5.0));
        assert_eq!(RevealPreset::SlideRight.start_pose().translate_x, -100.0);
        assert_eq!(RevealPreset::Blur.start_pose().blur, 20.0);
        let down = RevealPreset::Direction {
            direction: SlideDirection::Down,
            distance: 60.0,
        };
        assert_eq!(down.start_pose().translate_y, -60.0);
    }

    #[test]
    fn presets_parse_from_config() {
        let preset: RevealPreset =
            serde_json::from_str(r#"{"direction": {"direction": "left"}}"#).unwrap();
        assert_eq!(preset.start_pose().translate_x, 60.0);
        let fade: RevealPreset = serde_json::from_str(r#""fade""#).unwrap();
        assert_eq!(fade, RevealPreset::Fade);
    }

    #[test]
    fn holds_initial_pose_until_triggered() {
        let (mut stage, section) = scene();
        let mut effect = reveal(section, vec![section], RevealSettings::default());
        let control = effect.tick(&mut stage, &FrameContext::at(0.0));
        assert_eq!(control, Control::Idle);
        assert_eq!(stage.style(section).unwrap().opacity, 0.0);
    }

    #[test]
    fn once_reveal_detaches_then_finishes() {
        let (mut stage, section) = scene();
        let mut effect = reveal(section, vec![section], RevealSettings::default());
        stage.set_scroll(600.0);

        assert_eq!(effect.tick(&mut stage, &FrameContext::at(0.0)), Control::Detach);
        assert_eq!(run(&mut effect, &mut stage, 0.016, 2.0), Control::Finished);
        assert_eq!(stage.style(section).unwrap(), VisualProps::IDENTITY);

        stage.set_scroll(0.0);
        effect.tick(&mut stage, &FrameContext::at(3.0));
        assert_eq!(stage.style(section).unwrap().opacity, 1.0);
    }

    #[test]
    fn play_reverse_rewinds_on_leave_back() {
        let (mut stage, section) = scene();
        let settings = RevealSettings {
            mode: TriggerMode::PlayReverse,
            preset: RevealPreset::Fade,
            ..RevealSettings::default()
        };
        let mut effect = reveal(section, vec![section], settings);
        stage.set_scroll(600.0);
        run(&mut effect, &mut stage, 0.0, 1.5);
        assert_eq!(stage.style(section).unwrap().opacity, 1.0);

        stage.set_scroll(0.0);
        run(&mut effect, &mut stage, 1.6, 3.0);
        assert_eq!(stage.style(section).unwrap().opacity, 0.0);
    }

    #[test]
    fn stagger_delays_later_targets() {
        let (mut stage, section) = scene();
        let words: Vec<_> = (0..3)
            .map(|_| stage.add_element(ElementTraits::tag("span"), None))
            .collect();
        let settings = RevealSettings {
            stagger: 0.05,
            duration: 0.8,
            ..RevealSettings::default()
        };
        let mut effect = reveal(section, words.clone(), settings);
        stage.set_scroll(600.0);
        run(&mut effect, &mut stage, 0.0, 0.2);

        let first = stage.style(words[0]).unwrap().opacity;
        let last = stage.style(words[2]).unwrap().opacity;
        assert!(first > last);
    }
}
