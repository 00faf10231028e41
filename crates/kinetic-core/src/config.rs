//! # Scene Configuration
//!
//! Declarative description of a page: viewport, element tree, the effects
//! bound to those elements and the intro. Loaded from JSON, validated, then
//! built into a ready `Engine`.
//!
//! Elements are referred to by string ids in the file and resolved to
//! `ElementId`s at build time.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::animation::EasingType;
use crate::cursor::{cursor, CursorParts, CursorTuning};
use crate::effects::marquee::{repeated_text, SEPARATOR};
use crate::effects::pointer::MAGNETIC_STRENGTH;
use crate::effects::{
    blob, gradient, hero_fade, horizontal_track, hover_preview, magnetic, marquee, mount_units,
    parallax, progress, reveal, scroll_fade, scrub_parallax, stagger_text, MarqueeSettings,
    ParallaxSettings, PreviewParts, PreviewSource, RevealPreset, RevealSettings, ScrubSettings,
    SplitMode, StaggerSettings,
};
use crate::engine::{ComponentId, Engine};
use crate::errors::{KineticError, Result};
use crate::intro::{IntroPhase, IntroTimings};
use crate::pipeline::Effect;
use crate::session::SessionStore;
use crate::stage::{ElementTraits, Stage};
use crate::transform::{TriggerMode, DEFAULT_TRIGGER_FRACTION};
use crate::types::{ElementId, Rect, Viewport};

/// Shared constants, overridable per scene.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineTuning {
    /// Reveal start line as a fraction of the viewport height.
    pub trigger_fraction: f32,
    pub cursor_smoothing: f32,
    pub preview_smoothing: f32,
    /// Smallest progress change, in percent, that reaches the bar.
    pub progress_epsilon: f32,
}

impl Default for EngineTuning {
    fn default() -> Self {
        Self {
            trigger_fraction: DEFAULT_TRIGGER_FRACTION,
            cursor_smoothing: 0.15,
            preview_smoothing: 0.1,
            progress_epsilon: 0.1,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElementConfig {
    pub id: String,
    /// Document-space box. Absent means "not laid out yet".
    #[serde(default)]
    pub rect: Option<Rect>,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(flatten)]
    pub traits: ElementTraits,
    /// Fixed elements ignore scrolling.
    #[serde(default)]
    pub fixed: bool,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PreviewSourceConfig {
    pub element: String,
    pub title: String,
}

fn default_lag() -> f64 {
    1.0
}

fn default_strength() -> f32 {
    MAGNETIC_STRENGTH
}

/// One effect preset bound to element ids.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EffectConfig {
    Reveal {
        trigger: String,
        /// Elements to animate; the trigger itself when empty.
        #[serde(default)]
        targets: Vec<String>,
        #[serde(default)]
        preset: RevealPreset,
        #[serde(default)]
        mode: TriggerMode,
        /// Start line override; the scene's `trigger_fraction` otherwise.
        #[serde(default)]
        start: Option<f32>,
        #[serde(default)]
        delay: f64,
        #[serde(default)]
        duration: Option<f64>,
        #[serde(default)]
        ease: Option<EasingType>,
        #[serde(default)]
        stagger: f64,
    },
    StaggerText {
        container: String,
        /// Text to split; the container's own text otherwise.
        #[serde(default)]
        text: Option<String>,
        #[serde(default)]
        split: SplitMode,
        #[serde(default)]
        settings: StaggerSettings,
    },
    ScrollFade {
        target: String,
    },
    HeroFade {
        section: String,
        content: String,
        #[serde(default)]
        indicator: Option<String>,
    },
    Parallax {
        target: String,
        #[serde(default)]
        settings: ParallaxSettings,
    },
    ScrubParallax {
        target: String,
        #[serde(default)]
        settings: ScrubSettings,
    },
    HorizontalTrack {
        container: String,
        track: String,
        #[serde(default = "default_lag")]
        lag: f64,
    },
    Progress {
        bar: String,
        #[serde(default)]
        epsilon: Option<f32>,
    },
    Cursor {
        ring: String,
        dot: String,
        #[serde(default)]
        label: Option<String>,
        #[serde(default)]
        smoothing: Option<f32>,
    },
    HoverPreview {
        frame: String,
        card: String,
        #[serde(default)]
        title: Option<String>,
        sources: Vec<PreviewSourceConfig>,
        #[serde(default)]
        smoothing: Option<f32>,
    },
    Magnetic {
        target: String,
        #[serde(default = "default_strength")]
        strength: f32,
    },
    Marquee {
        tracks: [String; 2],
        #[serde(default)]
        settings: MarqueeSettings,
        /// Written into both tracks, repeated with a bullet separator.
        #[serde(default)]
        text: Option<String>,
    },
    Gradient {
        target: String,
    },
    Blob {
        target: String,
    },
}

impl EffectConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            EffectConfig::Reveal { .. } => "reveal",
            EffectConfig::StaggerText { .. } => "stagger_text",
            EffectConfig::ScrollFade { .. } => "scroll_fade",
            EffectConfig::HeroFade { .. } => "hero_fade",
            EffectConfig::Parallax { .. } => "parallax",
            EffectConfig::ScrubParallax { .. } => "scrub_parallax",
            EffectConfig::HorizontalTrack { .. } => "horizontal_track",
            EffectConfig::Progress { .. } => "progress",
            EffectConfig::Cursor { .. } => "cursor",
            EffectConfig::HoverPreview { .. } => "hover_preview",
            EffectConfig::Magnetic { .. } => "magnetic",
            EffectConfig::Marquee { .. } => "marquee",
            EffectConfig::Gradient { .. } => "gradient",
            EffectConfig::Blob { .. } => "blob",
        }
    }

    /// Every element id the effect refers to.
    pub fn element_refs(&self) -> Vec<&str> {
        let mut refs: Vec<&str> = Vec::new();
        match self {
            EffectConfig::Reveal {
                trigger, targets, ..
            } => {
                refs.push(trigger);
                refs.extend(targets.iter().map(String::as_str));
            }
            EffectConfig::StaggerText { container, .. } => refs.push(container),
            EffectConfig::ScrollFade { target }
            | EffectConfig::Parallax { target, .. }
            | EffectConfig::ScrubParallax { target, .. }
            | EffectConfig::Magnetic { target, .. }
            | EffectConfig::Gradient { target }
            | EffectConfig::Blob { target } => refs.push(target),
            EffectConfig::HeroFade {
                section,
                content,
                indicator,
            } => {
                refs.push(section);
                refs.push(content);
                refs.extend(indicator.as_deref());
            }
            EffectConfig::HorizontalTrack { container, track, .. } => {
                refs.push(container);
                refs.push(track);
            }
            EffectConfig::Progress { bar, .. } => refs.push(bar),
            EffectConfig::Cursor { ring, dot, label, .. } => {
                refs.push(ring);
                refs.push(dot);
                refs.extend(label.as_deref());
            }
            EffectConfig::HoverPreview {
                frame,
                card,
                title,
                sources,
                ..
            } => {
                refs.push(frame);
                refs.push(card);
                refs.extend(title.as_deref());
                refs.extend(sources.iter().map(|s| s.element.as_str()));
            }
            EffectConfig::Marquee { tracks, .. } => {
                refs.extend(tracks.iter().map(String::as_str));
            }
        }
        refs
    }

    fn validate(&self) -> Result<()> {
        let check_smoothing = |name: &str, value: Option<f32>| match value {
            Some(f) if !(f > 0.0 && f <= 1.0) => Err(KineticError::invalid(format!(
                "{name} smoothing must be in (0, 1], got {f}"
            ))),
            _ => Ok(()),
        };
        let check_finite = |name: &str, value: f32| {
            if value.is_finite() {
                Ok(())
            } else {
                Err(KineticError::invalid(format!("{name} must be finite")))
            }
        };
        let check_time = |name: &str, value: f64| {
            if value.is_finite() && value >= 0.0 {
                Ok(())
            } else {
                Err(KineticError::invalid(format!(
                    "{name} must be a non-negative number of seconds"
                )))
            }
        };

        match self {
            EffectConfig::Reveal {
                start,
                delay,
                duration,
                stagger,
                ..
            } => {
                if let Some(start) = start {
                    check_finite("reveal start", *start)?;
                }
                check_time("reveal delay", *delay)?;
                check_time("reveal duration", duration.unwrap_or(0.0))?;
                check_time("reveal stagger", *stagger)
            }
            EffectConfig::StaggerText { settings, .. } => {
                check_time("stagger delay", settings.delay)?;
                check_time("stagger step", settings.step)?;
                check_time("stagger duration", settings.duration)?;
                check_finite("stagger ratio", settings.ratio)
            }
            EffectConfig::Parallax { settings, .. } => check_finite("parallax speed", settings.speed),
            EffectConfig::ScrubParallax { settings, .. } => {
                check_finite("scrub speed", settings.speed)?;
                check_finite("scrub range", settings.range)?;
                check_time("scrub lag", settings.lag)
            }
            EffectConfig::HorizontalTrack { lag, .. } => check_time("track lag", *lag),
            EffectConfig::Progress { epsilon, .. } => match epsilon {
                Some(e) if !(e.is_finite() && *e >= 0.0) => {
                    Err(KineticError::invalid("progress epsilon must be >= 0"))
                }
                _ => Ok(()),
            },
            EffectConfig::Cursor { smoothing, .. } => check_smoothing("cursor", *smoothing),
            EffectConfig::HoverPreview { smoothing, .. } => {
                check_smoothing("preview", *smoothing)
            }
            EffectConfig::Magnetic { strength, .. } => check_finite("magnetic strength", *strength),
            EffectConfig::Marquee { settings, .. } => {
                check_finite("marquee speed", settings.speed)?;
                if let Some(width) = settings.width {
                    check_finite("marquee width", width)?;
                }
                Ok(())
            }
            EffectConfig::ScrollFade { .. }
            | EffectConfig::HeroFade { .. }
            | EffectConfig::Gradient { .. }
            | EffectConfig::Blob { .. } => Ok(()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EffectEntry {
    /// Name used by traces to unmount the component.
    #[serde(default)]
    pub label: Option<String>,
    /// Wait for the intro completion signal before activating.
    #[serde(default)]
    pub after_intro: bool,
    pub effect: EffectConfig,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IntroConfig {
    pub letters: Vec<String>,
    #[serde(default)]
    pub overlay: Option<String>,
    #[serde(default)]
    pub timings: IntroTimings,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneConfig {
    #[serde(default)]
    pub viewport: Viewport,
    /// Scrollable height; the lowest element bottom when absent.
    #[serde(default)]
    pub document_height: Option<f32>,
    #[serde(default)]
    pub tuning: EngineTuning,
    pub elements: Vec<ElementConfig>,
    #[serde(default)]
    pub effects: Vec<EffectEntry>,
    #[serde(default)]
    pub intro: Option<IntroConfig>,
}

/// A mounted effect and the label it answers to.
#[derive(Clone, Debug, PartialEq)]
pub struct MountedComponent {
    pub label: String,
    pub kind: &'static str,
    pub id: ComponentId,
}

/// The resolved intro bindings, ready for `Engine::begin_intro`.
#[derive(Clone, Debug, PartialEq)]
pub struct IntroBinding {
    pub letters: Vec<ElementId>,
    pub overlay: Option<ElementId>,
    pub timings: IntroTimings,
}

pub struct BuiltScene {
    pub engine: Engine,
    /// Config id to stage id.
    pub ids: HashMap<String, ElementId>,
    pub components: Vec<MountedComponent>,
    pub intro: Option<IntroBinding>,
}

impl BuiltScene {
    pub fn element(&self, id: &str) -> Option<ElementId> {
        self.ids.get(id).copied()
    }

    pub fn component(&self, label: &str) -> Option<ComponentId> {
        self.components
            .iter()
            .find(|c| c.label == label)
            .map(|c| c.id)
    }

    /// Starts the configured intro. Without one, the completion signal
    /// fires at once so gated effects still run.
    pub fn begin_intro(&mut self, store: Box<dyn SessionStore>) -> Option<IntroPhase> {
        match &self.intro {
            Some(binding) => Some(self.engine.begin_intro(
                store,
                binding.letters.clone(),
                binding.overlay,
                binding.timings,
            )),
            None => {
                self.engine.complete_intro();
                None
            }
        }
    }
}

impl SceneConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json_str(&text)?;
        debug!(path = %path.as_ref().display(), elements = config.elements.len(), "loaded scene");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.viewport.width.is_finite() && self.viewport.height.is_finite())
            || self.viewport.width < 0.0
            || self.viewport.height < 0.0
        {
            return Err(KineticError::invalid("viewport must be finite and non-negative"));
        }
        if let Some(h) = self.document_height {
            if !h.is_finite() || h < 0.0 {
                return Err(KineticError::invalid(
                    "document_height must be finite and non-negative",
                ));
            }
        }
        let t = &self.tuning;
        for (name, f) in [
            ("cursor_smoothing", t.cursor_smoothing),
            ("preview_smoothing", t.preview_smoothing),
        ] {
            if !(f > 0.0 && f <= 1.0) {
                return Err(KineticError::invalid(format!(
                    "{name} must be in (0, 1], got {f}"
                )));
            }
        }
        if !t.trigger_fraction.is_finite() || !t.progress_epsilon.is_finite() {
            return Err(KineticError::invalid("tuning values must be finite"));
        }

        let mut known = HashSet::new();
        for element in &self.elements {
            if !known.insert(element.id.as_str()) {
                return Err(KineticError::invalid(format!(
                    "duplicate element id `{}`",
                    element.id
                )));
            }
        }
        let require = |id: &str| {
            if known.contains(id) {
                Ok(())
            } else {
                Err(KineticError::UnknownElement(id.to_string()))
            }
        };
        for element in &self.elements {
            if let Some(parent) = &element.parent {
                require(parent)?;
            }
        }
        for entry in &self.effects {
            for id in entry.effect.element_refs() {
                require(id)?;
            }
            entry.effect.validate()?;
        }
        if let Some(intro) = &self.intro {
            for id in intro.letters.iter().chain(&intro.overlay) {
                require(id)?;
            }
        }
        Ok(())
    }

    fn document_height(&self) -> f32 {
        self.document_height.unwrap_or_else(|| {
            self.elements
                .iter()
                .filter(|e| !e.fixed)
                .filter_map(|e| e.rect.map(|r| r.bottom()))
                .fold(self.viewport.height, f32::max)
        })
    }

    /// Validates, lays out the stage and mounts every effect.
    pub fn build(&self) -> Result<BuiltScene> {
        self.validate()?;

        let mut stage = Stage::new(self.viewport, self.document_height());
        let mut ids = HashMap::new();
        for element in &self.elements {
            let id = stage.add_element(element.traits.clone(), element.rect);
            if let Some(node) = stage.get_mut(id) {
                node.fixed = element.fixed;
            }
            if let Some(text) = &element.text {
                stage.write_text(id, Some(text.as_str()));
            }
            ids.insert(element.id.clone(), id);
        }
        for element in &self.elements {
            if let Some(parent) = &element.parent {
                let child = ids[&element.id];
                if !stage.attach(ids[parent], child) {
                    return Err(KineticError::invalid(format!(
                        "element `{}` cannot be a child of `{parent}`",
                        element.id
                    )));
                }
            }
        }

        let mut engine = Engine::new(stage);
        let mut components = Vec::with_capacity(self.effects.len());
        for (index, entry) in self.effects.iter().enumerate() {
            let effect = self.instantiate(&entry.effect, &ids, &mut engine.stage)?;
            let id = engine.mount_boxed(effect, entry.after_intro);
            let label = entry
                .label
                .clone()
                .unwrap_or_else(|| format!("{}#{index}", entry.effect.kind()));
            components.push(MountedComponent {
                label,
                kind: entry.effect.kind(),
                id,
            });
        }

        let intro = self.intro.as_ref().map(|intro| IntroBinding {
            letters: intro.letters.iter().map(|l| ids[l]).collect(),
            overlay: intro.overlay.as_ref().map(|o| ids[o]),
            timings: intro.timings,
        });

        debug!(
            elements = ids.len(),
            components = components.len(),
            "scene built"
        );
        Ok(BuiltScene {
            engine,
            ids,
            components,
            intro,
        })
    }

    fn instantiate(
        &self,
        config: &EffectConfig,
        ids: &HashMap<String, ElementId>,
        stage: &mut Stage,
    ) -> Result<Box<dyn Effect>> {
        let resolve = |id: &str| {
            ids.get(id)
                .copied()
                .ok_or_else(|| KineticError::UnknownElement(id.to_string()))
        };
        let tuning = &self.tuning;

        let effect: Box<dyn Effect> = match config {
            EffectConfig::Reveal {
                trigger,
                targets,
                preset,
                mode,
                start,
                delay,
                duration,
                ease,
                stagger,
            } => {
                let trigger = resolve(trigger)?;
                let targets = if targets.is_empty() {
                    vec![trigger]
                } else {
                    targets.iter().map(|t| resolve(t)).collect::<Result<_>>()?
                };
                let defaults = RevealSettings::default();
                let settings = RevealSettings {
                    preset: *preset,
                    mode: *mode,
                    start: start.unwrap_or(tuning.trigger_fraction),
                    delay: *delay,
                    duration: duration.unwrap_or(defaults.duration),
                    ease: ease.unwrap_or(defaults.ease),
                    stagger: *stagger,
                };
                Box::new(reveal(trigger, targets, settings))
            }
            EffectConfig::StaggerText {
                container,
                text,
                split,
                settings,
            } => {
                let container = resolve(container)?;
                let text = match text {
                    Some(text) => text.clone(),
                    None => stage
                        .get(container)
                        .and_then(|n| n.text.clone())
                        .unwrap_or_default(),
                };
                // The container's own text moves into the units.
                stage.write_text(container, None);
                let units = mount_units(stage, container, &text, *split);
                Box::new(stagger_text(container, units, *settings))
            }
            EffectConfig::ScrollFade { target } => Box::new(scroll_fade(resolve(target)?)),
            EffectConfig::HeroFade {
                section,
                content,
                indicator,
            } => {
                let indicator = indicator.as_deref().map(resolve).transpose()?;
                Box::new(hero_fade(resolve(section)?, resolve(content)?, indicator))
            }
            EffectConfig::Parallax { target, settings } => {
                Box::new(parallax(resolve(target)?, *settings))
            }
            EffectConfig::ScrubParallax { target, settings } => {
                Box::new(scrub_parallax(resolve(target)?, *settings))
            }
            EffectConfig::HorizontalTrack {
                container,
                track,
                lag,
            } => Box::new(horizontal_track(resolve(container)?, resolve(track)?, *lag)),
            EffectConfig::Progress { bar, epsilon } => Box::new(progress(
                resolve(bar)?,
                epsilon.unwrap_or(tuning.progress_epsilon),
            )),
            EffectConfig::Cursor {
                ring,
                dot,
                label,
                smoothing,
            } => {
                let parts = CursorParts {
                    ring: resolve(ring)?,
                    dot: resolve(dot)?,
                    label: label.as_deref().map(resolve).transpose()?,
                };
                let cursor_tuning = CursorTuning {
                    smoothing: smoothing.unwrap_or(tuning.cursor_smoothing),
                    ..CursorTuning::default()
                };
                Box::new(cursor(parts, cursor_tuning))
            }
            EffectConfig::HoverPreview {
                frame,
                card,
                title,
                sources,
                smoothing,
            } => {
                let parts = PreviewParts {
                    frame: resolve(frame)?,
                    card: resolve(card)?,
                    title: title.as_deref().map(resolve).transpose()?,
                };
                let sources = sources
                    .iter()
                    .map(|s| {
                        Ok(PreviewSource {
                            element: resolve(&s.element)?,
                            title: s.title.clone(),
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Box::new(hover_preview(
                    parts,
                    sources,
                    smoothing.unwrap_or(tuning.preview_smoothing),
                ))
            }
            EffectConfig::Magnetic { target, strength } => {
                Box::new(magnetic(resolve(target)?, *strength))
            }
            EffectConfig::Marquee {
                tracks,
                settings,
                text,
            } => {
                let tracks = [resolve(&tracks[0])?, resolve(&tracks[1])?];
                if let Some(text) = text {
                    let repeated = repeated_text(text, SEPARATOR, 8);
                    for track in tracks {
                        stage.write_text(track, Some(repeated.as_str()));
                    }
                }
                Box::new(marquee(tracks, *settings))
            }
            EffectConfig::Gradient { target } => Box::new(gradient(resolve(target)?)),
            EffectConfig::Blob { target } => Box::new(blob(resolve(target)?)),
        };
        Ok(effect)
    }
}
