//! # Pipeline Module
//!
//! The generic per-component loop: Sampler → Transform → Applier, run in that
//! order once per scheduled cycle.
//!
//! ## Key Types
//! - `Effect`: anything the engine can mount. `Pipeline` is the common
//!   implementation; a few effects with several coupled outputs implement it
//!   by hand.
//! - `FrameContext`: the clock handed to every cycle.
//! - `Control`: what the component wants scheduled after a cycle.
//! - `Drive`: whether a pipeline runs every frame or only after events.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::applier::Applier;
use crate::signal::Sampler;
use crate::stage::Stage;
use crate::transform::Transform;

/// Clock for one refresh tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameContext {
    /// Seconds since the host started the engine.
    pub now: f64,
    /// Seconds since the previous frame; zero on the first one.
    pub dt: f64,
    pub frame: u64,
    /// Whether the intro completion signal has fired.
    pub intro_complete: bool,
}

impl FrameContext {
    /// A standalone context, used by tests and one-off cycles.
    pub fn at(now: f64) -> Self {
        Self {
            now,
            dt: 0.0,
            frame: 0,
            intro_complete: true,
        }
    }

    pub fn with_dt(mut self, dt: f64) -> Self {
        self.dt = dt;
        self
    }
}

/// Scheduling request returned from a cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Control {
    /// Run again on the next frame.
    Continue,
    /// Sleep until a subscribed event arrives.
    Idle,
    /// Drop every event subscription but keep running frames. Used by
    /// play-once effects after their trigger fired.
    Detach,
    /// Nothing left to do: no frames, no subscriptions.
    Finished,
}

/// Raw input kinds a component can subscribe to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Scroll,
    PointerMove,
    PointerDown,
    PointerUp,
    PointerLeave,
    PointerEnter,
    Resize,
}

pub const SCROLL_EVENTS: &[EventKind] = &[EventKind::Scroll, EventKind::Resize];
pub const POINTER_EVENTS: &[EventKind] = &[
    EventKind::PointerMove,
    EventKind::PointerDown,
    EventKind::PointerUp,
    EventKind::PointerLeave,
    EventKind::PointerEnter,
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Drive {
    /// A frame loop that re-requests itself after every cycle.
    EveryFrame,
    /// Runs only on the frame after a subscribed event.
    OnEvent,
}

/// A mountable component.
pub trait Effect {
    fn name(&self) -> &str;

    fn interests(&self) -> &'static [EventKind];

    /// A subscribed event arrived. Returning `true` requests a frame; the
    /// scheduler collapses repeated requests into one.
    fn on_event(&mut self, _kind: EventKind, _stage: &Stage) -> bool {
        true
    }

    /// One Sampler → Transform → Applier cycle.
    fn tick(&mut self, stage: &mut Stage, ctx: &FrameContext) -> Control;
}

/// A sampler, a transform and an applier wired together.
pub struct Pipeline<S, T, A> {
    name: String,
    interests: &'static [EventKind],
    drive: Drive,
    pub sampler: S,
    pub transform: T,
    pub applier: A,
}

impl<S, T, A> Pipeline<S, T, A>
where
    S: Sampler,
    T: Transform<Input = S::Reading>,
    A: Applier<Value = T::Output>,
{
    pub fn new(name: impl Into<String>, sampler: S, transform: T, applier: A) -> Self {
        Self {
            name: name.into(),
            interests: SCROLL_EVENTS,
            drive: Drive::OnEvent,
            sampler,
            transform,
            applier,
        }
    }

    pub fn driven_by(mut self, drive: Drive) -> Self {
        self.drive = drive;
        self
    }

    pub fn listening_to(mut self, interests: &'static [EventKind]) -> Self {
        self.interests = interests;
        self
    }

    pub fn drive(&self) -> Drive {
        self.drive
    }

    fn idle_control(&self) -> Control {
        match self.drive {
            Drive::EveryFrame => Control::Continue,
            Drive::OnEvent => Control::Idle,
        }
    }
}

impl<S, T, A> Effect for Pipeline<S, T, A>
where
    S: Sampler,
    T: Transform<Input = S::Reading>,
    A: Applier<Value = T::Output>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn interests(&self) -> &'static [EventKind] {
        self.interests
    }

    fn on_event(&mut self, kind: EventKind, _stage: &Stage) -> bool {
        self.transform.observe(kind);
        true
    }

    fn tick(&mut self, stage: &mut Stage, ctx: &FrameContext) -> Control {
        let Some(reading) = self.sampler.sample(stage, ctx) else {
            trace!(effect = %self.name, "sampler found no element, skipping cycle");
            return self.idle_control();
        };
        let output = self.transform.transform(reading, ctx);
        self.applier.apply(stage, output);
        self.transform.control().unwrap_or_else(|| self.idle_control())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::applier::{FnApplier, StyleApplier};
    use crate::signal::{ElementSampler, FnSampler};
    use crate::stage::{ElementTraits, WriteOutcome};
    use crate::transform::FnTransform;
    use crate::types::{Rect, Viewport, VisualProps};

    #[test]
    fn cycle_runs_in_order_and_writes() {
        let mut stage = Stage::new(Viewport::new(800.0, 600.0), 1200.0);
        let id = stage.add_element(
            ElementTraits::default(),
            Some(Rect::new(0.0, 300.0, 100.0, 100.0)),
        );
        let mut pipeline = Pipeline::new(
            "opacity-by-top",
            ElementSampler::new(id),
            FnTransform::new(|r: crate::signal::ElementReading, _: &FrameContext| {
                VisualProps::IDENTITY.with_opacity(r.rect.top / r.viewport.height)
            }),
            StyleApplier::new(id),
        );

        assert_eq!(pipeline.tick(&mut stage, &FrameContext::at(0.0)), Control::Idle);
        assert_eq!(stage.style(id).unwrap().opacity, 0.5);
    }

    #[test]
    fn missing_element_short_circuits() {
        let mut stage = Stage::default();
        let mut applied = 0;
        {
            let mut pipeline = Pipeline::new(
                "ghost",
                ElementSampler::new(3),
                FnTransform::new(|_: crate::signal::ElementReading, _: &FrameContext| ()),
                FnApplier::new(|_: &mut Stage, _: ()| {
                    applied += 1;
                    WriteOutcome::Written
                }),
            )
            .driven_by(Drive::EveryFrame);
            assert_eq!(pipeline.tick(&mut stage, &FrameContext::at(0.0)), Control::Continue);
        }
        assert_eq!(applied, 0);
    }

    #[test]
    fn closures_compose_into_a_pipeline() {
        let mut stage = Stage::default();
        let id = stage.add_element(ElementTraits::default(), None);
        let mut pipeline = Pipeline::new(
            "clock",
            FnSampler(|_: &Stage, ctx: &FrameContext| Some(ctx.now as f32)),
            FnTransform::new(|t: f32, _: &FrameContext| VisualProps::IDENTITY.with_translate(t, 0.0)),
            StyleApplier::new(id),
        );
        pipeline.tick(&mut stage, &FrameContext::at(2.0));
        assert_eq!(stage.style(id).unwrap().translate_x, 2.0);
    }
}
