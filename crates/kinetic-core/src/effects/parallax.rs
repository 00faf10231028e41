//! Scroll-linked offsets: free parallax, scrubbed parallax and the pinned
//! horizontal track. All three run as frame loops.

use serde::{Deserialize, Serialize};

use crate::animation::{lag_factor, AnimationState};
use crate::applier::StyleApplier;
use crate::pipeline::{Drive, FrameContext, Pipeline};
use crate::signal::{ElementReading, ElementSampler, Sampler};
use crate::stage::Stage;
use crate::transform::{parallax_offset, pinned_progress, scrub_progress, Transform};
use crate::types::{ElementId, VisualProps};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParallaxDirection {
    #[default]
    Up,
    Down,
}

impl ParallaxDirection {
    pub fn sign(self) -> f32 {
        match self {
            ParallaxDirection::Up => -1.0,
            ParallaxDirection::Down => 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallaxSettings {
    pub speed: f32,
    pub direction: ParallaxDirection,
}

impl Default for ParallaxSettings {
    fn default() -> Self {
        Self {
            speed: 0.1,
            direction: ParallaxDirection::Up,
        }
    }
}

pub struct ParallaxTransform {
    pub settings: ParallaxSettings,
}

impl Transform for ParallaxTransform {
    type Input = ElementReading;
    type Output = VisualProps;

    fn transform(&mut self, input: ElementReading, _ctx: &FrameContext) -> VisualProps {
        let offset = parallax_offset(
            &input.rect,
            &input.viewport,
            self.settings.speed,
            self.settings.direction.sign(),
        );
        VisualProps::IDENTITY.with_translate(0.0, offset)
    }
}

pub type ParallaxEffect = Pipeline<ElementSampler, ParallaxTransform, StyleApplier>;

/// Moves `target` against the scroll in proportion to its distance from the
/// viewport centre.
pub fn parallax(target: ElementId, settings: ParallaxSettings) -> ParallaxEffect {
    Pipeline::new(
        "parallax",
        ElementSampler::new(target),
        ParallaxTransform { settings },
        StyleApplier::new(target),
    )
    .driven_by(Drive::EveryFrame)
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrubSettings {
    pub speed: f32,
    /// Offset in pixels at full progress for `speed = 1`.
    pub range: f32,
    /// Seconds the value trails the scroll position. Zero follows exactly.
    pub lag: f64,
}

impl Default for ScrubSettings {
    fn default() -> Self {
        Self {
            speed: 0.3,
            range: 200.0,
            lag: 1.0,
        }
    }
}

pub struct ScrubTransform {
    pub settings: ScrubSettings,
    state: AnimationState<f32>,
}

impl ScrubTransform {
    pub fn new(settings: ScrubSettings) -> Self {
        Self {
            settings,
            state: AnimationState::new(0.0),
        }
    }
}

impl Transform for ScrubTransform {
    type Input = ElementReading;
    type Output = VisualProps;

    fn transform(&mut self, input: ElementReading, ctx: &FrameContext) -> VisualProps {
        let progress = scrub_progress(&input.rect, &input.viewport);
        let target = progress * self.settings.speed * self.settings.range;
        self.state.retarget(target, ctx.now);
        let y = self.state.smooth(lag_factor(ctx.dt, self.settings.lag));
        VisualProps::IDENTITY.with_translate(0.0, y)
    }
}

pub type ScrubParallaxEffect = Pipeline<ElementSampler, ScrubTransform, StyleApplier>;

/// Drifts `target` down by up to `speed * range` pixels while it crosses the
/// viewport, trailing the scroll by `lag` seconds.
pub fn scrub_parallax(target: ElementId, settings: ScrubSettings) -> ScrubParallaxEffect {
    Pipeline::new(
        "scrub_parallax",
        ElementSampler::new(target),
        ScrubTransform::new(settings),
        StyleApplier::new(target),
    )
    .driven_by(Drive::EveryFrame)
}

/// The pinned container and the width of the track inside it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackReading {
    pub container: ElementReading,
    pub track_width: f32,
}

#[derive(Clone, Copy, Debug)]
pub struct TrackSampler {
    pub container: ElementId,
    pub track: ElementId,
}

impl Sampler for TrackSampler {
    type Reading = TrackReading;

    fn sample(&mut self, stage: &Stage, ctx: &FrameContext) -> Option<TrackReading> {
        let container = ElementSampler::new(self.container).sample(stage, ctx)?;
        let track_width = stage.viewport_rect(self.track)?.width;
        Some(TrackReading {
            container,
            track_width,
        })
    }
}

pub struct TrackTransform {
    lag: f64,
    state: AnimationState<f32>,
}

impl TrackTransform {
    pub fn new(lag: f64) -> Self {
        Self {
            lag,
            state: AnimationState::new(0.0),
        }
    }
}

impl Transform for TrackTransform {
    type Input = TrackReading;
    type Output = VisualProps;

    fn transform(&mut self, input: TrackReading, ctx: &FrameContext) -> VisualProps {
        let distance = (input.track_width - input.container.rect.width).max(0.0);
        let progress = pinned_progress(&input.container.rect, distance);
        self.state.retarget(-distance * progress, ctx.now);
        let x = self.state.smooth(lag_factor(ctx.dt, self.lag));
        VisualProps::IDENTITY.with_translate(x, 0.0)
    }
}

pub type HorizontalTrackEffect = Pipeline<TrackSampler, TrackTransform, StyleApplier>;

/// Slides `track` left by its overflow while `container` scrolls through a
/// span equal to that overflow.
pub fn horizontal_track(container: ElementId, track: ElementId, lag: f64) -> HorizontalTrackEffect {
    Pipeline::new(
        "horizontal_track",
        TrackSampler { container, track },
        TrackTransform::new(lag),
        StyleApplier::new(track),
    )
    .driven_by(Drive::EveryFrame)
}
