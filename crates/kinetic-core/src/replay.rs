//! # Trace Replay
//!
//! Drives a built scene with a recorded input trace at a fixed frame rate
//! and reports the final visual state of every element. This is how the
//! `kinetic` CLI and the integration tests exercise whole pages.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::BuiltScene;
use crate::engine::InputEvent;
use crate::errors::{KineticError, Result};
use crate::intro::IntroPhase;
use crate::types::{Paint, VisualProps};

fn default_frame_rate() -> f64 {
    60.0
}

/// What happens at a trace timestamp.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TraceAction {
    Input(InputEvent),
    /// Unmounts the component with this label.
    Unmount { unmount: String },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TraceEntry {
    /// Seconds from the start of the replay.
    pub at: f64,
    pub action: TraceAction,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    #[serde(default = "default_frame_rate")]
    pub frame_rate: f64,
    /// Replay length in seconds; the last event time when absent.
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub events: Vec<TraceEntry>,
}

impl Trace {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let trace: Trace = serde_json::from_str(json)?;
        trace.validate()?;
        Ok(trace)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.frame_rate.is_finite() && self.frame_rate > 0.0) {
            return Err(KineticError::invalid("frame_rate must be positive"));
        }
        if let Some(d) = self.duration {
            if !(d.is_finite() && d >= 0.0) {
                return Err(KineticError::invalid("duration must be non-negative"));
            }
        }
        if let Some(entry) = self.events.iter().find(|e| !(e.at.is_finite() && e.at >= 0.0)) {
            return Err(KineticError::invalid(format!(
                "event time {} is not a non-negative number",
                entry.at
            )));
        }
        Ok(())
    }

    pub fn duration(&self) -> f64 {
        self.duration.unwrap_or_else(|| {
            self.events
                .iter()
                .map(|e| e.at)
                .fold(0.0, f64::max)
        })
    }
}

/// Final state of one element.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ElementSnapshot {
    pub style: VisualProps,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paint: Option<Paint>,
    pub writes: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReplayReport {
    pub frames: u64,
    pub cycles: usize,
    pub writes: u64,
    /// Frames in which no component ran.
    pub idle_frames: u64,
    pub scroll_y: f32,
    pub intro: Vec<IntroPhase>,
    pub mounted: usize,
    pub elements: BTreeMap<String, ElementSnapshot>,
}

/// Replays `trace` against `scene`. Events at or before a frame's time are
/// dispatched before that frame runs.
pub fn replay(scene: &mut BuiltScene, trace: &Trace) -> Result<ReplayReport> {
    trace.validate()?;
    let mut events: Vec<&TraceEntry> = trace.events.iter().collect();
    events.sort_by(|a, b| a.at.total_cmp(&b.at));
    let mut pending = events.into_iter().peekable();

    let step = 1.0 / trace.frame_rate;
    let total_frames = (trace.duration() * trace.frame_rate).ceil() as u64;
    let mut cycles = 0;
    let mut writes = 0;
    let mut idle_frames = 0;

    for index in 0..=total_frames {
        let now = index as f64 * step;
        while let Some(entry) = pending.next_if(|e| e.at <= now) {
            match &entry.action {
                TraceAction::Input(event) => scene.engine.dispatch(event),
                TraceAction::Unmount { unmount } => {
                    let id = scene
                        .component(unmount)
                        .ok_or_else(|| KineticError::UnknownComponent(unmount.clone()))?;
                    scene.engine.unmount(id);
                    debug!(component = %unmount, at = entry.at, "unmounted by trace");
                }
            }
        }
        let report = scene.engine.frame(now);
        cycles += report.cycles;
        writes += report.writes;
        if report.cycles == 0 {
            idle_frames += 1;
        }
    }

    let stage = &scene.engine.stage;
    let elements = scene
        .ids
        .iter()
        .filter_map(|(name, &id)| {
            let node = stage.get(id)?;
            Some((
                name.clone(),
                ElementSnapshot {
                    style: node.style,
                    text: node.text.clone(),
                    paint: node.paint.clone(),
                    writes: node.writes,
                },
            ))
        })
        .collect();

    let report = ReplayReport {
        frames: total_frames + 1,
        cycles,
        writes,
        idle_frames,
        scroll_y: stage.scroll_y(),
        intro: scene.engine.intro_history().to_vec(),
        mounted: scene.engine.mounted_count(),
        elements,
    };
    info!(
        frames = report.frames,
        cycles = report.cycles,
        writes = report.writes,
        "replay finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SceneConfig;
    use serde_json::json;

    fn built() -> BuiltScene {
        let config: SceneConfig = serde_json::from_value(json!({
            "viewport": { "width": 1000, "height": 800 },
            "document_height": 3000,
            "elements": [
                { "id": "bar", "fixed": true },
                { "id": "about", "rect": { "left": 0, "top": 1200, "width": 1000, "height": 600 } }
            ],
            "effects": [
                { "label": "bar", "effect": { "kind": "progress", "bar": "bar" } },
                { "label": "about", "effect": { "kind": "reveal", "trigger": "about", "preset": "fade" } }
            ]
        }))
        .unwrap();
        config.build().unwrap()
    }

    #[test]
    fn parses_inputs_and_unmounts() {
        let trace = Trace::from_json_str(
            r#"{ "events": [
                { "at": 0.5, "action": { "type": "scroll", "y": 1100 } },
                { "at": 1.0, "action": { "unmount": "bar" } }
            ] }"#,
        )
        .unwrap();
        assert_eq!(trace.frame_rate, 60.0);
        assert_eq!(trace.duration(), 1.0);
        assert_eq!(
            trace.events[0].action,
            TraceAction::Input(InputEvent::Scroll { y: 1100.0 })
        );
        assert_eq!(
            trace.events[1].action,
            TraceAction::Unmount {
                unmount: "bar".into()
            }
        );
    }

    #[test]
    fn replays_scroll_and_unmount() {
        let mut scene = built();
        let trace = Trace {
            frame_rate: 60.0,
            duration: Some(3.0),
            events: vec![
                TraceEntry {
                    at: 0.5,
                    action: TraceAction::Input(InputEvent::Scroll { y: 1100.0 }),
                },
                TraceEntry {
                    at: 2.0,
                    action: TraceAction::Unmount {
                        unmount: "bar".into(),
                    },
                },
                TraceEntry {
                    at: 2.5,
                    action: TraceAction::Input(InputEvent::Scroll { y: 0.0 }),
                },
            ],
        };
        let report = replay(&mut scene, &trace).unwrap();

        assert_eq!(report.frames, 181);
        assert_eq!(report.mounted, 1);
        assert_eq!(report.scroll_y, 0.0);
        // The bar froze at its last value when unmounted.
        assert!((report.elements["bar"].style.scale_x - 0.5).abs() < 1e-4);
        // A play-once reveal stays revealed after scrolling back.
        assert_eq!(report.elements["about"].style.opacity, 1.0);
        assert!(report.idle_frames > 0);
    }

    #[test]
    fn unknown_component_is_an_error() {
        let mut scene = built();
        let trace = Trace {
            frame_rate: 60.0,
            duration: None,
            events: vec![TraceEntry {
                at: 0.0,
                action: TraceAction::Unmount {
                    unmount: "nope".into(),
                },
            }],
        };
        assert!(matches!(
            replay(&mut scene, &trace),
            Err(KineticError::UnknownComponent(_))
        ));
    }

    #[test]
    fn rejects_bad_frame_rate() {
        assert!(Trace::from_json_str(r#"{ "frame_rate": 0 }"#).is_err());
    }
}
