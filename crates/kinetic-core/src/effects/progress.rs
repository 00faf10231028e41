//! Page scroll progress bar.

use crate::applier::Applier;
use crate::pipeline::{FrameContext, Pipeline};
use crate::signal::{ScrollReading, ScrollSampler};
use crate::stage::{Stage, WriteOutcome};
use crate::transform::{progress_percent, Transform};
use crate::types::{ElementId, VisualProps};

/// Default smallest percent change that reaches the bar.
pub const PROGRESS_EPSILON: f32 = 0.1;

/// Maps scroll to a percent and drops changes within `epsilon`. Landing on
/// 0 or 100 always reaches the bar.
#[derive(Clone, Debug)]
pub struct ProgressTransform {
    pub epsilon: f32,
    last: Option<f32>,
}

impl ProgressTransform {
    pub fn new(epsilon: f32) -> Self {
        Self {
            epsilon,
            last: None,
        }
    }

    /// The last percent handed to the bar, 0 before the first cycle.
    pub fn percent(&self) -> f32 {
        self.last.unwrap_or(0.0)
    }
}

impl Transform for ProgressTransform {
    type Input = ScrollReading;
    type Output = Option<f32>;

    fn transform(&mut self, input: ScrollReading, _ctx: &FrameContext) -> Option<f32> {
        let percent = progress_percent(input.scroll_y, input.max_scroll);
        let endpoint = percent <= 0.0 || percent >= 100.0;
        match self.last {
            Some(last) if last == percent => None,
            Some(last) if !endpoint && (percent - last).abs() <= self.epsilon => None,
            _ => {
                self.last = Some(percent);
                Some(percent)
            }
        }
    }
}

/// Writes a percent as the bar's horizontal scale.
#[derive(Clone, Copy, Debug)]
pub struct ProgressBarApplier {
    pub bar: ElementId,
}

impl Applier for ProgressBarApplier {
    type Value = Option<f32>;

    fn apply(&mut self, stage: &mut Stage, value: Option<f32>) -> WriteOutcome {
        let Some(percent) = value else {
            return WriteOutcome::Unchanged;
        };
        let Some(current) = stage.style(self.bar) else {
            return WriteOutcome::Missing;
        };
        stage.write_style(
            self.bar,
            VisualProps {
                scale_x: percent / 100.0,
                ..current
            },
        )
    }
}

pub type ProgressEffect = Pipeline<ScrollSampler, ProgressTransform, ProgressBarApplier>;

pub fn progress(bar: ElementId, epsilon: f32) -> ProgressEffect {
    Pipeline::new(
        "progress",
        ScrollSampler,
        ProgressTransform::new(epsilon),
        ProgressBarApplier { bar },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Effect;
    use crate::stage::ElementTraits;
    use crate::types::Viewport;

    #[test]
    fn bar_tracks_scroll_percent() {
        let mut stage = Stage::new(Viewport::new(1000.0, 1000.0), 3000.0);
        let bar = stage.add_element(ElementTraits::default(), None);
        let mut effect = progress(bar, PROGRESS_EPSILON);

        effect.tick(&mut stage, &FrameContext::at(0.0));
        assert_eq!(stage.style(bar).unwrap().scale_x, 0.0);

        stage.set_scroll(1000.0);
        effect.tick(&mut stage, &FrameContext::at(0.1));
        assert_eq!(effect.transform.percent(), 50.0);
        assert_eq!(stage.style(bar).unwrap().scale_x, 0.5);

        stage.set_scroll(2000.0);
        effect.tick(&mut stage, &FrameContext::at(0.2));
        assert_eq!(effect.transform.percent(), 100.0);
    }

    #[test]
    fn tiny_changes_are_dropped() {
        let mut stage = Stage::new(Viewport::new(1000.0, 1000.0), 3000.0);
        let bar = stage.add_element(ElementTraits::default(), None);
        let mut effect = progress(bar, PROGRESS_EPSILON);
        effect.tick(&mut stage, &FrameContext::at(0.0));
        let writes = stage.get(bar).unwrap().writes;

        // 1px of 2000 is 0.05%.
        stage.set_scroll(1.0);
        effect.tick(&mut stage, &FrameContext::at(0.1));
        assert_eq!(stage.get(bar).unwrap().writes, writes);
        assert_eq!(effect.transform.percent(), 0.0);
    }

    #[test]
    fn endpoints_land_through_small_steps() {
        let mut stage = Stage::new(Viewport::new(1000.0, 1000.0), 3000.0);
        let bar = stage.add_element(ElementTraits::default(), None);
        let mut effect = progress(bar, PROGRESS_EPSILON);
        effect.tick(&mut stage, &FrameContext::at(0.0));

        stage.set_scroll(1999.0);
        effect.tick(&mut stage, &FrameContext::at(0.1));
        stage.set_scroll(2000.0);
        effect.tick(&mut stage, &FrameContext::at(0.2));
        assert_eq!(effect.transform.percent(), 100.0);
        assert_eq!(stage.style(bar).unwrap().scale_x, 1.0);

        // Sitting on the endpoint writes nothing more.
        let writes = stage.get(bar).unwrap().writes;
        effect.tick(&mut stage, &FrameContext::at(0.3));
        assert_eq!(stage.get(bar).unwrap().writes, writes);

        stage.set_scroll(1.0);
        effect.tick(&mut stage, &FrameContext::at(0.4));
        stage.set_scroll(0.0);
        effect.tick(&mut stage, &FrameContext::at(0.5));
        assert_eq!(effect.transform.percent(), 0.0);
        assert_eq!(stage.style(bar).unwrap().scale_x, 0.0);
    }

    #[test]
    fn short_document_reads_zero() {
        let mut stage = Stage::new(Viewport::new(1000.0, 1000.0), 400.0);
        let bar = stage.add_element(ElementTraits::default(), None);
        let mut effect = progress(bar, PROGRESS_EPSILON);
        stage.set_scroll(300.0);
        effect.tick(&mut stage, &FrameContext::at(0.0));
        assert_eq!(effect.transform.percent(), 0.0);
        assert_eq!(stage.style(bar).unwrap().scale_x, 0.0);
    }
}
