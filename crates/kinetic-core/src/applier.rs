//! # Visual Appliers
//!
//! The last stage of a pipeline. Appliers only touch composited properties
//! (`VisualProps`) and decorative paint; identical values are skipped by the
//! stage, so applying twice is harmless.

use std::marker::PhantomData;

use crate::stage::{Stage, WriteOutcome};
use crate::types::{ElementId, Paint, VisualProps};

pub trait Applier {
    type Value;

    fn apply(&mut self, stage: &mut Stage, value: Self::Value) -> WriteOutcome;
}

/// Folds several outcomes: any write wins, then any skip, else missing.
pub fn merge_outcomes(outcomes: impl IntoIterator<Item = WriteOutcome>) -> WriteOutcome {
    outcomes
        .into_iter()
        .fold(WriteOutcome::Missing, |acc, next| match (acc, next) {
            (WriteOutcome::Written, _) | (_, WriteOutcome::Written) => WriteOutcome::Written,
            (WriteOutcome::Unchanged, _) | (_, WriteOutcome::Unchanged) => WriteOutcome::Unchanged,
            _ => WriteOutcome::Missing,
        })
}

#[derive(Clone, Copy, Debug)]
pub struct StyleApplier {
    pub target: ElementId,
}

impl StyleApplier {
    pub fn new(target: ElementId) -> Self {
        Self { target }
    }
}

impl Applier for StyleApplier {
    type Value = VisualProps;

    fn apply(&mut self, stage: &mut Stage, value: VisualProps) -> WriteOutcome {
        stage.write_style(self.target, value)
    }
}

/// Writes one value per target, pairing them by position.
#[derive(Clone, Debug)]
pub struct StyleSetApplier {
    pub targets: Vec<ElementId>,
}

impl StyleSetApplier {
    pub fn new(targets: Vec<ElementId>) -> Self {
        Self { targets }
    }
}

impl Applier for StyleSetApplier {
    type Value = Vec<VisualProps>;

    fn apply(&mut self, stage: &mut Stage, values: Vec<VisualProps>) -> WriteOutcome {
        merge_outcomes(
            self.targets
                .iter()
                .zip(values)
                .map(|(&id, props)| stage.write_style(id, props)),
        )
    }
}

/// Per-property change thresholds below which a write is dropped.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WriteEpsilon {
    pub opacity: f32,
    pub scale: f32,
    pub translate: f32,
}

impl WriteEpsilon {
    /// Thresholds of the scroll-linked text fade.
    pub const SCROLL_TEXT: WriteEpsilon = WriteEpsilon {
        opacity: 0.01,
        scale: 0.001,
        translate: 0.5,
    };

    fn exceeded(&self, last: &VisualProps, next: &VisualProps) -> bool {
        (next.opacity - last.opacity).abs() > self.opacity
            || (next.scale - last.scale).abs() > self.scale
            || (next.scale_x - last.scale_x).abs() > self.scale
            || (next.translate_x - last.translate_x).abs() > self.translate
            || (next.translate_y - last.translate_y).abs() > self.translate
            || next.tone != last.tone
    }
}

/// A style applier that ignores sub-threshold changes.
#[derive(Clone, Debug)]
pub struct GatedStyleApplier {
    pub target: ElementId,
    pub epsilon: WriteEpsilon,
    last: Option<VisualProps>,
}

impl GatedStyleApplier {
    pub fn new(target: ElementId, epsilon: WriteEpsilon) -> Self {
        Self {
            target,
            epsilon,
            last: None,
        }
    }
}

impl Applier for GatedStyleApplier {
    type Value = VisualProps;

    fn apply(&mut self, stage: &mut Stage, value: VisualProps) -> WriteOutcome {
        if let Some(last) = &self.last {
            if !self.epsilon.exceeded(last, &value) {
                return WriteOutcome::Unchanged;
            }
        }
        let outcome = stage.write_style(self.target, value);
        if outcome != WriteOutcome::Missing {
            self.last = Some(value);
        }
        outcome
    }
}

#[derive(Clone, Copy, Debug)]
pub struct PaintApplier {
    pub target: ElementId,
}

impl Applier for PaintApplier {
    type Value = Paint;

    fn apply(&mut self, stage: &mut Stage, value: Paint) -> WriteOutcome {
        stage.write_paint(self.target, value)
    }
}

/// Closure-backed applier.
pub struct FnApplier<F, V> {
    f: F,
    _value: PhantomData<fn(V)>,
}

impl<F, V> FnApplier<F, V>
where
    F: FnMut(&mut Stage, V) -> WriteOutcome,
{
    pub fn new(f: F) -> Self {
        Self {
            f,
            _value: PhantomData,
        }
    }
}

impl<F, V> Applier for FnApplier<F, V>
where
    F: FnMut(&mut Stage, V) -> WriteOutcome,
{
    type Value = V;

    fn apply(&mut self, stage: &mut Stage, value: V) -> WriteOutcome {
        (self.f)(stage, value)
    }
}
