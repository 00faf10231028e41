//! Decorative background loops. Both advance a phase by a fixed amount per
//! frame, independent of frame duration.

use crate::applier::PaintApplier;
use crate::pipeline::{Drive, FrameContext, Pipeline};
use crate::signal::{ClockReading, ClockSampler, ElementReading, ElementSampler};
use crate::transform::Transform;
use crate::types::{ElementId, GradientStop, Paint};

pub const GRADIENT_STEP: f32 = 0.002;
pub const BLOB_STEP: f32 = 0.015;
pub const BLOB_POINTS: usize = 12;

/// Gradient stops at phase `t`, in percent of the surface.
pub fn gradient_stops(t: f32) -> Vec<GradientStop> {
    vec![
        GradientStop {
            x: 50.0 + t.sin() * 30.0,
            y: 50.0 + (t * 0.7).cos() * 30.0,
        },
        GradientStop {
            x: 50.0 + (t * 0.8 + 2.0).sin() * 25.0,
            y: 50.0 + (t * 0.5 + 1.0).cos() * 25.0,
        },
        GradientStop { x: 80.0, y: 20.0 },
    ]
}

#[derive(Clone, Debug, Default)]
pub struct GradientTransform {
    phase: f32,
}

impl GradientTransform {
    pub fn phase(&self) -> f32 {
        self.phase
    }
}

impl Transform for GradientTransform {
    type Input = ClockReading;
    type Output = Paint;

    fn transform(&mut self, _input: ClockReading, _ctx: &FrameContext) -> Paint {
        self.phase += GRADIENT_STEP;
        Paint::Gradient {
            stops: gradient_stops(self.phase),
        }
    }
}

pub type GradientEffect = Pipeline<ClockSampler, GradientTransform, PaintApplier>;

pub fn gradient(target: ElementId) -> GradientEffect {
    Pipeline::new(
        "gradient",
        ClockSampler,
        GradientTransform::default(),
        PaintApplier { target },
    )
    .driven_by(Drive::EveryFrame)
}

/// Blob outline centred in a `width` x `height` surface at phase `t`. The
/// extra last point comes back round to angle zero.
pub fn blob_outline(width: f32, height: f32, t: f32) -> Paint {
    let center = (width / 2.0, height / 2.0);
    let radius = width.min(height).max(0.0) * 0.4;
    let points = (0..=BLOB_POINTS)
        .map(|i| {
            let angle = i as f32 / BLOB_POINTS as f32 * std::f32::consts::TAU;
            let r = radius * (1.0 + (t + i as f32 * 0.5).sin() * 0.2);
            (center.0 + angle.cos() * r, center.1 + angle.sin() * r)
        })
        .collect();
    Paint::Blob {
        center,
        radius,
        points,
    }
}

#[derive(Clone, Debug, Default)]
pub struct BlobTransform {
    phase: f32,
}

impl Transform for BlobTransform {
    type Input = ElementReading;
    type Output = Paint;

    fn transform(&mut self, input: ElementReading, _ctx: &FrameContext) -> Paint {
        // An unmeasured canvas fills the viewport.
        let (width, height) = if input.rect.is_empty() {
            (input.viewport.width, input.viewport.height)
        } else {
            (input.rect.width, input.rect.height)
        };
        let paint = blob_outline(width, height, self.phase);
        self.phase += BLOB_STEP;
        paint
    }
}

pub type BlobEffect = Pipeline<ElementSampler, BlobTransform, PaintApplier>;

pub fn blob(target: ElementId) -> BlobEffect {
    Pipeline::new(
        "blob",
        ElementSampler::new(target),
        BlobTransform::default(),
        PaintApplier { target },
    )
    .driven_by(Drive::EveryFrame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{Control, Effect};
    use crate::stage::{ElementTraits, Stage};
    use crate::types::{Rect, Viewport};

    #[test]
    fn gradient_moves_every_frame() {
        let mut stage = Stage::default();
        let surface = stage.add_element(ElementTraits::default(), None);
        let mut effect = gradient(surface);

        assert_eq!(effect.tick(&mut stage, &FrameContext::at(0.0)), Control::Continue);
        let first = stage.get(surface).unwrap().paint.clone();
        effect.tick(&mut stage, &FrameContext::at(0.016));
        let second = stage.get(surface).unwrap().paint.clone();
        assert_ne!(first, second);
        assert!((effect.transform.phase() - 0.004).abs() < 1e-6);

        let Some(Paint::Gradient { stops }) = second else {
            panic!("expected a gradient");
        };
        assert_eq!(stops.len(), 3);
        assert_eq!(stops[2], GradientStop { x: 80.0, y: 20.0 });
    }

    #[test]
    fn blob_outline_wraps_round() {
        let Paint::Blob {
            center,
            radius,
            points,
        } = blob_outline(1000.0, 500.0, 0.0)
        else {
            panic!("expected a blob");
        };
        assert_eq!(center, (500.0, 250.0));
        assert_eq!(radius, 200.0);
        assert_eq!(points.len(), BLOB_POINTS + 1);
        let (first, last) = (points[0], points[BLOB_POINTS]);
        assert!((first.1 - 250.0).abs() < 1e-3);
        assert!((last.1 - 250.0).abs() < 1e-2);
        assert!(last.0 > center.0);
        // Phase 0, point 0: no noise.
        assert!((first.0 - 700.0).abs() < 1e-3);
    }

    #[test]
    fn blob_uses_viewport_until_measured() {
        let mut stage = Stage::new(Viewport::new(800.0, 600.0), 600.0);
        let canvas = stage.add_element(ElementTraits::tag("canvas"), None);
        let mut effect = blob(canvas);
        effect.tick(&mut stage, &FrameContext::at(0.0));
        let Some(Paint::Blob { radius, .. }) = stage.get(canvas).unwrap().paint.clone() else {
            panic!("expected a blob");
        };
        assert_eq!(radius, 240.0);

        stage.set_rect(canvas, Rect::new(0.0, 0.0, 100.0, 100.0));
        effect.tick(&mut stage, &FrameContext::at(0.016));
        let Some(Paint::Blob { radius, .. }) = stage.get(canvas).unwrap().paint.clone() else {
            panic!("expected a blob");
        };
        assert_eq!(radius, 40.0);
    }
}
