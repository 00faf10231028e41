//! # Transform Functions
//!
//! Pure mappings from a raw reading to a bounded output. Two families cover
//! every effect: threshold reveals (`ThresholdTrigger`,
//! `IntersectionTrigger`) and continuous proportional mappings (the free
//! functions below). Smoothing lives in `animation::AnimationState`.
//!
//! Every ratio goes through `safe_ratio`, so zero extents map to a defined
//! value instead of dividing by zero.

use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

use crate::pipeline::{Control, EventKind, FrameContext};
use crate::types::{Rect, Viewport};

/// Default reveal line: the element's top enters the lowest 15% of the viewport.
pub const DEFAULT_TRIGGER_FRACTION: f32 = 0.85;

pub trait Transform {
    type Input;
    type Output;

    fn transform(&mut self, input: Self::Input, ctx: &FrameContext) -> Self::Output;

    /// Sees every subscribed event before the cycle it wakes. Transforms
    /// that react to edges (press, release, leave) record them here.
    fn observe(&mut self, _kind: EventKind) {}

    /// Scheduling request after the latest cycle. `None` defers to the
    /// pipeline's drive.
    fn control(&self) -> Option<Control> {
        None
    }
}

/// `num / den`, or `fallback` when the denominator is zero or not finite.
pub fn safe_ratio(num: f32, den: f32, fallback: f32) -> f32 {
    if den.abs() <= f32::EPSILON || !den.is_finite() || !num.is_finite() {
        fallback
    } else {
        num / den
    }
}

/// Signed distance between the element centre and the viewport centre,
/// divided by `span * vh`. A degenerate viewport reads as far off-screen.
pub fn normalized_center_distance(rect: &Rect, viewport: &Viewport, span: f32) -> f32 {
    if viewport.is_degenerate() {
        return 1.0;
    }
    let offset = rect.center_y() - viewport.height / 2.0;
    safe_ratio(offset, viewport.height * span, 1.0)
}

/// Whether the element top has reached `fraction * vh`.
pub fn threshold_crossed(rect: &Rect, viewport: &Viewport, fraction: f32) -> bool {
    !viewport.is_degenerate() && rect.top <= viewport.height * fraction
}

/// 0 before the trigger line, 1 once past it.
pub fn reveal_progress(rect: &Rect, viewport: &Viewport, fraction: f32) -> f32 {
    if threshold_crossed(rect, viewport, fraction) {
        1.0
    } else {
        0.0
    }
}

/// Page scroll progress in percent, 0 when nothing can scroll.
pub fn progress_percent(scroll_y: f32, max_scroll: f32) -> f32 {
    (safe_ratio(scroll_y, max_scroll, 0.0) * 100.0).clamp(0.0, 100.0)
}

/// Progress from "element top at viewport bottom" to "element bottom at
/// viewport top", clamped to `[0, 1]`.
pub fn scrub_progress(rect: &Rect, viewport: &Viewport) -> f32 {
    if viewport.is_degenerate() {
        return 0.0;
    }
    safe_ratio(viewport.height - rect.top, viewport.height + rect.height, 0.0).clamp(0.0, 1.0)
}

/// Progress across a pinned span of `distance` pixels starting when the
/// element top reaches the viewport top.
pub fn pinned_progress(rect: &Rect, distance: f32) -> f32 {
    safe_ratio(-rect.top, distance, 0.0).clamp(0.0, 1.0)
}

/// Offset proportional to the element's distance from the viewport centre.
pub fn parallax_offset(rect: &Rect, viewport: &Viewport, speed: f32, direction: f32) -> f32 {
    if viewport.is_degenerate() {
        return 0.0;
    }
    (rect.center_y() - viewport.height / 2.0) * speed * direction
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerMode {
    /// Fires the first time the line is crossed, never reverses.
    #[default]
    Once,
    /// Plays on enter and reverses when the element drops back below the line.
    PlayReverse,
    /// Fires on the first cycle regardless of position (load-triggered).
    Immediate,
}

/// Edge reported by a trigger update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriggerEdge {
    None,
    Enter,
    LeaveBack,
}

/// Scroll trigger with a "top <= fraction * vh" start line.
#[derive(Clone, Debug)]
pub struct ThresholdTrigger {
    pub fraction: f32,
    pub mode: TriggerMode,
    active: bool,
    fired: bool,
}

impl ThresholdTrigger {
    pub fn new(fraction: f32, mode: TriggerMode) -> Self {
        Self {
            fraction,
            mode,
            active: false,
            fired: false,
        }
    }

    pub fn update(&mut self, rect: &Rect, viewport: &Viewport) -> TriggerEdge {
        let crossed = match self.mode {
            TriggerMode::Immediate => true,
            _ => threshold_crossed(rect, viewport, self.fraction),
        };
        match (self.active, crossed) {
            (false, true) => {
                self.active = true;
                self.fired = true;
                TriggerEdge::Enter
            }
            (true, false) if self.mode == TriggerMode::PlayReverse => {
                self.active = false;
                TriggerEdge::LeaveBack
            }
            _ => TriggerEdge::None,
        }
    }

    /// 1 while triggered, 0 otherwise. A fired `Once` trigger stays at 1.
    pub fn output(&self) -> f32 {
        if self.active {
            1.0
        } else {
            0.0
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }

    /// A fired play-once trigger has nothing left to listen for.
    pub fn is_spent(&self) -> bool {
        self.fired && self.mode != TriggerMode::PlayReverse
    }
}

/// Fires once when at least `ratio` of the element is inside the viewport
/// shrunk by `bottom_margin` pixels.
#[derive(Clone, Debug)]
pub struct IntersectionTrigger {
    pub ratio: f32,
    pub bottom_margin: f32,
    fired: bool,
}

impl IntersectionTrigger {
    pub fn new(ratio: f32, bottom_margin: f32) -> Self {
        Self {
            ratio,
            bottom_margin,
            fired: false,
        }
    }

    pub fn visible_ratio(&self, rect: &Rect, viewport: &Viewport) -> f32 {
        let bottom = (viewport.height - self.bottom_margin).max(0.0);
        let overlap = (rect.bottom().min(bottom) - rect.top.max(0.0)).max(0.0);
        safe_ratio(overlap, rect.height, 0.0).clamp(0.0, 1.0)
    }

    /// Returns `true` on the update that first satisfies the ratio.
    pub fn update(&mut self, rect: &Rect, viewport: &Viewport) -> bool {
        if self.fired || viewport.is_degenerate() || rect.is_empty() {
            return false;
        }
        if self.visible_ratio(rect, viewport) >= self.ratio {
            self.fired = true;
            return true;
        }
        false
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }
}

/// Closure-backed transform.
pub struct FnTransform<F, I> {
    f: F,
    _input: PhantomData<fn(I)>,
}

impl<F, I, O> FnTransform<F, I>
where
    F: FnMut(I, &FrameContext) -> O,
{
    pub fn new(f: F) -> Self {
        Self {
            f,
            _input: PhantomData,
        }
    }
}

impl<F, I, O> Transform for FnTransform<F, I>
where
    F: FnMut(I, &FrameContext) -> O,
{
    type Input = I;
    type Output = O;

    fn transform(&mut self, input: I, ctx: &FrameContext) -> O {
        (self.f)(input, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vp() -> Viewport {
        Viewport::new(1000.0, 800.0)
    }

    #[test]
    fn ratios_never_divide_by_zero() {
        assert_eq!(safe_ratio(5.0, 0.0, 0.0), 0.0);
        assert_eq!(progress_percent(10.0, 0.0), 0.0);
        assert_eq!(
            normalized_center_distance(&Rect::ZERO, &Viewport::new(0.0, 0.0), 0.6),
            1.0
        );
        assert_eq!(scrub_progress(&Rect::ZERO, &Viewport::new(100.0, 0.0)), 0.0);
        assert_eq!(pinned_progress(&Rect::new(0.0, -50.0, 10.0, 10.0), 0.0), 0.0);
    }

    #[test]
    fn progress_percent_covers_range() {
        assert_eq!(progress_percent(0.0, 2000.0), 0.0);
        assert_eq!(progress_percent(1000.0, 2000.0), 50.0);
        assert_eq!(progress_percent(2000.0, 2000.0), 100.0);
    }

    #[test]
    fn parallax_sign_follows_direction() {
        let below_centre = Rect::new(0.0, 600.0, 100.0, 200.0);
        assert_eq!(parallax_offset(&below_centre, &vp(), 0.1, -1.0), -30.0);
        assert_eq!(parallax_offset(&below_centre, &vp(), 0.1, 1.0), 30.0);
    }

    #[test]
    fn scrub_progress_spans_enter_to_exit() {
        let h = 200.0;
        assert_eq!(scrub_progress(&Rect::new(0.0, 800.0, 100.0, h), &vp()), 0.0);
        assert_eq!(scrub_progress(&Rect::new(0.0, -h, 100.0, h), &vp()), 1.0);
        assert_eq!(scrub_progress(&Rect::new(0.0, 300.0, 100.0, h), &vp()), 0.5);
    }

    #[test]
    fn once_trigger_never_reverses() {
        let mut trigger = ThresholdTrigger::new(DEFAULT_TRIGGER_FRACTION, TriggerMode::Once);
        let below = Rect::new(0.0, 700.0, 10.0, 10.0);
        let above = Rect::new(0.0, 600.0, 10.0, 10.0);
        assert_eq!(trigger.update(&below, &vp()), TriggerEdge::None);
        assert_eq!(trigger.update(&above, &vp()), TriggerEdge::Enter);
        assert_eq!(trigger.update(&below, &vp()), TriggerEdge::None);
        assert_eq!(trigger.output(), 1.0);
        assert!(trigger.is_spent());
    }

    #[test]
    fn reverse_trigger_leaves_back() {
        let mut trigger = ThresholdTrigger::new(DEFAULT_TRIGGER_FRACTION, TriggerMode::PlayReverse);
        let below = Rect::new(0.0, 700.0, 10.0, 10.0);
        let above = Rect::new(0.0, 100.0, 10.0, 10.0);
        assert_eq!(trigger.update(&above, &vp()), TriggerEdge::Enter);
        assert_eq!(trigger.update(&below, &vp()), TriggerEdge::LeaveBack);
        assert_eq!(trigger.output(), 0.0);
        assert!(!trigger.is_spent());
    }

    #[test]
    fn degenerate_viewport_never_triggers() {
        let mut trigger = ThresholdTrigger::new(DEFAULT_TRIGGER_FRACTION, TriggerMode::Once);
        let rect = Rect::new(0.0, -10.0, 10.0, 10.0);
        assert_eq!(trigger.update(&rect, &Viewport::new(0.0, 0.0)), TriggerEdge::None);
    }

    #[test]
    fn intersection_respects_margin() {
        let mut trigger = IntersectionTrigger::new(0.1, 50.0);
        // Only the 50px margin band is on screen: invisible.
        let in_margin = Rect::new(0.0, 760.0, 100.0, 100.0);
        assert!(!trigger.update(&in_margin, &vp()));
        let tenth_in = Rect::new(0.0, 740.0, 100.0, 100.0);
        assert!(trigger.update(&tenth_in, &vp()));
        assert!(!trigger.update(&tenth_in, &vp()));
    }
}
