//! # Signal Samplers
//!
//! The first stage of every pipeline: a pure read of one raw signal per
//! cycle. Samplers never write and never fail. A missing element yields
//! `None` and the pipeline skips the rest of the cycle; an element that is
//! not laid out yet measures as a zero rect.

use glam::Vec2;

use crate::pipeline::FrameContext;
use crate::stage::Stage;
use crate::types::{ElementId, Rect, Viewport};

pub trait Sampler {
    type Reading;

    fn sample(&mut self, stage: &Stage, ctx: &FrameContext) -> Option<Self::Reading>;
}

/// An element box relative to the viewport.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ElementReading {
    pub rect: Rect,
    pub viewport: Viewport,
}

#[derive(Clone, Copy, Debug)]
pub struct ElementSampler {
    pub target: ElementId,
}

impl ElementSampler {
    pub fn new(target: ElementId) -> Self {
        Self { target }
    }
}

impl Sampler for ElementSampler {
    type Reading = ElementReading;

    fn sample(&mut self, stage: &Stage, _ctx: &FrameContext) -> Option<ElementReading> {
        let rect = stage.viewport_rect(self.target)?;
        Some(ElementReading {
            rect,
            viewport: stage.viewport,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollReading {
    pub scroll_y: f32,
    pub max_scroll: f32,
    pub viewport: Viewport,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ScrollSampler;

impl Sampler for ScrollSampler {
    type Reading = ScrollReading;

    fn sample(&mut self, stage: &Stage, _ctx: &FrameContext) -> Option<ScrollReading> {
        Some(ScrollReading {
            scroll_y: stage.scroll_y(),
            max_scroll: stage.max_scroll(),
            viewport: stage.viewport,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerReading {
    pub position: Vec2,
    pub inside: bool,
    pub pressed: bool,
    pub hovered: Option<ElementId>,
    pub now: f64,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct PointerSampler;

impl Sampler for PointerSampler {
    type Reading = PointerReading;

    fn sample(&mut self, stage: &Stage, ctx: &FrameContext) -> Option<PointerReading> {
        Some(PointerReading {
            position: stage.pointer,
            inside: stage.pointer_inside,
            pressed: stage.pointer_down,
            hovered: stage.hovered,
            now: ctx.now,
        })
    }
}

/// The frame clock itself, for loops that only depend on time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClockReading {
    pub now: f64,
    pub dt: f64,
    pub frame: u64,
    pub viewport: Viewport,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ClockSampler;

impl Sampler for ClockSampler {
    type Reading = ClockReading;

    fn sample(&mut self, stage: &Stage, ctx: &FrameContext) -> Option<ClockReading> {
        Some(ClockReading {
            now: ctx.now,
            dt: ctx.dt,
            frame: ctx.frame,
            viewport: stage.viewport,
        })
    }
}

/// Samples an element and the pointer together (magnetic hover).
#[derive(Clone, Copy, Debug)]
pub struct ElementPointerSampler {
    pub target: ElementId,
}

impl Sampler for ElementPointerSampler {
    type Reading = (ElementReading, PointerReading);

    fn sample(&mut self, stage: &Stage, ctx: &FrameContext) -> Option<Self::Reading> {
        let element = ElementSampler::new(self.target).sample(stage, ctx)?;
        let pointer = PointerSampler.sample(stage, ctx)?;
        Some((element, pointer))
    }
}

/// Closure-backed sampler.
pub struct FnSampler<F>(pub F);

impl<F, R> Sampler for FnSampler<F>
where
    F: FnMut(&Stage, &FrameContext) -> Option<R>,
{
    type Reading = R;

    fn sample(&mut self, stage: &Stage, ctx: &FrameContext) -> Option<R> {
        (self.0)(stage, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::ElementTraits;

    #[test]
    fn element_sampler_guards_missing_and_unmeasured() {
        let mut stage = Stage::new(Viewport::new(800.0, 600.0), 2000.0);
        let laid_out = stage.add_element(
            ElementTraits::default(),
            Some(Rect::new(0.0, 900.0, 800.0, 200.0)),
        );
        let pending = stage.add_element(ElementTraits::default(), None);
        stage.set_scroll(300.0);
        let ctx = FrameContext::at(0.0);

        let reading = ElementSampler::new(laid_out).sample(&stage, &ctx).unwrap();
        assert_eq!(reading.rect.top, 600.0);

        let fallback = ElementSampler::new(pending).sample(&stage, &ctx).unwrap();
        assert_eq!(fallback.rect, Rect::ZERO);

        assert!(ElementSampler::new(77).sample(&stage, &ctx).is_none());
    }

    #[test]
    fn fn_sampler_wraps_closures() {
        let stage = Stage::default();
        let mut sampler = FnSampler(|stage: &Stage, _: &FrameContext| Some(stage.scroll_y()));
        assert_eq!(sampler.sample(&stage, &FrameContext::at(0.0)), Some(0.0));
    }
}
