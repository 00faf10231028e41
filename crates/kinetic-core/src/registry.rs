//! # Capability Registry
//!
//! Runtime registry of effect kinds and easing curves.
//! Lets the `kinetic` CLI list what a scene file may use without a
//! hand-maintained manifest.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::pipeline::Drive;

/// Metadata about a mountable effect kind.
#[derive(Debug, Clone, Serialize)]
pub struct EffectInfo {
    pub name: &'static str,
    pub description: &'static str,
    /// What wakes the effect.
    pub driver: Drive,
    /// Visual properties the effect writes.
    pub properties: Vec<&'static str>,
    pub params: Vec<(&'static str, &'static str)>, // (name, type)
}

/// Metadata about an easing curve.
#[derive(Debug, Clone, Serialize)]
pub struct EasingInfo {
    pub name: &'static str,
    pub description: &'static str,
}

static REGISTRY: OnceLock<CapabilityRegistry> = OnceLock::new();

pub struct CapabilityRegistry {
    pub effects: HashMap<&'static str, EffectInfo>,
    pub easings: HashMap<&'static str, EasingInfo>,
}

impl CapabilityRegistry {
    /// Get the global registry instance.
    pub fn global() -> &'static Self {
        REGISTRY.get_or_init(Self::build)
    }

    fn build() -> Self {
        let mut reg = Self {
            effects: HashMap::new(),
            easings: HashMap::new(),
        };
        reg.register_builtin_effects();
        reg.register_builtin_easings();
        reg
    }

    fn register_builtin_effects(&mut self) {
        let effects = [
            EffectInfo {
                name: "reveal",
                description: "Tweens targets from a preset pose when the trigger crosses the start line",
                driver: Drive::OnEvent,
                properties: vec!["opacity", "translate_x", "translate_y", "scale", "blur", "rotate_x"],
                params: vec![
                    ("preset", "RevealPreset"),
                    ("mode", "once|play_reverse|immediate"),
                    ("start", "f32"),
                    ("delay", "f64"),
                    ("duration", "f64"),
                    ("ease", "EasingType"),
                    ("stagger", "f64"),
                ],
            },
            EffectInfo {
                name: "stagger_text",
                description: "Splits text into units that rise in one after another once visible",
                driver: Drive::OnEvent,
                properties: vec!["opacity", "translate_y"],
                params: vec![("split", "chars|words"), ("step", "f64"), ("ratio", "f32")],
            },
            EffectInfo {
                name: "scroll_fade",
                description: "Statement text, clearest at the viewport centre",
                driver: Drive::OnEvent,
                properties: vec!["opacity", "scale", "translate_y"],
                params: vec![],
            },
            EffectInfo {
                name: "hero_fade",
                description: "Fades and lifts the hero as it scrolls away; shows the scroll indicator",
                driver: Drive::OnEvent,
                properties: vec!["opacity", "scale", "translate_y"],
                params: vec![("indicator", "element")],
            },
            EffectInfo {
                name: "parallax",
                description: "Offset proportional to the distance from the viewport centre",
                driver: Drive::EveryFrame,
                properties: vec!["translate_y"],
                params: vec![("speed", "f32"), ("direction", "up|down")],
            },
            EffectInfo {
                name: "scrub_parallax",
                description: "Scrubbed drift across the viewport with trailing lag",
                driver: Drive::EveryFrame,
                properties: vec!["translate_y"],
                params: vec![("speed", "f32"), ("range", "f32"), ("lag", "f64")],
            },
            EffectInfo {
                name: "horizontal_track",
                description: "Slides a wide track sideways while its container scrolls",
                driver: Drive::EveryFrame,
                properties: vec!["translate_x"],
                params: vec![("lag", "f64")],
            },
            EffectInfo {
                name: "progress",
                description: "Page scroll progress bar",
                driver: Drive::OnEvent,
                properties: vec!["scale_x"],
                params: vec![("epsilon", "f32")],
            },
            EffectInfo {
                name: "cursor",
                description: "Smoothed ring and pinned dot that react to what is hovered",
                driver: Drive::EveryFrame,
                properties: vec!["translate_x", "translate_y", "scale", "opacity", "tone"],
                params: vec![("smoothing", "f32")],
            },
            EffectInfo {
                name: "hover_preview",
                description: "Floating project preview that trails the pointer",
                driver: Drive::EveryFrame,
                properties: vec!["translate_x", "translate_y", "scale", "opacity"],
                params: vec![("sources", "[{element, title}]"), ("smoothing", "f32")],
            },
            EffectInfo {
                name: "magnetic",
                description: "Pulls an element toward the pointer and springs back on leave",
                driver: Drive::OnEvent,
                properties: vec!["translate_x", "translate_y"],
                params: vec![("strength", "f32")],
            },
            EffectInfo {
                name: "marquee",
                description: "Two text tracks looping seamlessly",
                driver: Drive::EveryFrame,
                properties: vec!["translate_x"],
                params: vec![("speed", "f32"), ("direction", "left|right"), ("width", "f32")],
            },
            EffectInfo {
                name: "gradient",
                description: "Slowly drifting background gradient",
                driver: Drive::EveryFrame,
                properties: vec!["paint"],
                params: vec![],
            },
            EffectInfo {
                name: "blob",
                description: "Breathing blob outline",
                driver: Drive::EveryFrame,
                properties: vec!["paint"],
                params: vec![],
            },
        ];

        for effect in effects {
            self.effects.insert(effect.name, effect);
        }
    }

    fn register_builtin_easings(&mut self) {
        let easings = [
            ("linear", "Constant speed, no acceleration"),
            ("ease_in", "Start slow, accelerate"),
            ("ease_out", "Start fast, decelerate"),
            ("ease_in_out", "Slow start and end, fast middle"),
            ("power1.in", "Quadratic acceleration"),
            ("power2.out", "Cubic deceleration"),
            ("power3.out", "Quartic deceleration"),
            ("power4.out", "Quintic deceleration"),
            ("power3.in", "Quartic acceleration"),
            ("power4.in_out", "Quintic at both ends"),
            ("elastic.out(1, 0.3)", "Springy overshoot that settles at the end"),
        ];

        for (name, description) in easings {
            self.easings.insert(name, EasingInfo { name, description });
        }
    }
}

// ============ Public API ============

/// List all registered effects, sorted by name.
pub fn list_effects() -> Vec<&'static EffectInfo> {
    let mut effects: Vec<_> = CapabilityRegistry::global().effects.values().collect();
    effects.sort_by_key(|e| e.name);
    effects
}

/// Get info for a specific effect.
pub fn get_effect(name: &str) -> Option<&'static EffectInfo> {
    CapabilityRegistry::global().effects.get(name)
}

/// List all registered easings, sorted by name.
pub fn list_easings() -> Vec<&'static EasingInfo> {
    let mut easings: Vec<_> = CapabilityRegistry::global().easings.values().collect();
    easings.sort_by_key(|e| e.name);
    easings
}

/// Check if an effect writes a specific property.
pub fn writes_property(effect: &str, property: &str) -> bool {
    get_effect(effect).is_some_and(|info| info.properties.contains(&property))
}
