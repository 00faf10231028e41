//! # Core Types
//!
//! Geometry and visual value types shared by every layer of the engine.
//!
//! ## Key Types
//! - `ElementId`: index into the `Stage` arena.
//! - `Rect`: an element box, in document or viewport space.
//! - `Viewport`: visible window size.
//! - `VisualProps`: the composited properties an applier may write.
//! - `Paint`: decorative output of the ambient loops (gradient, blob).

use keyframe::CanTween;
use serde::{Deserialize, Serialize};

/// A `usize` index into the `Stage` arena.
pub type ElementId = usize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const ZERO: Rect = Rect {
        left: 0.0,
        top: 0.0,
        width: 0.0,
        height: 0.0,
    };

    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    pub fn center_x(&self) -> f32 {
        self.left + self.width / 2.0
    }

    pub fn center_y(&self) -> f32 {
        self.top + self.height / 2.0
    }

    /// True when the box has no area (not laid out yet, or collapsed).
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.left && x < self.right() && y >= self.top && y < self.bottom()
    }

    pub fn translated(&self, dx: f32, dy: f32) -> Rect {
        Rect {
            left: self.left + dx,
            top: self.top + dy,
            ..*self
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 800.0,
        }
    }
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// A viewport with no height cannot place anything; mappings treat it
    /// as "everything is off-screen".
    pub fn is_degenerate(&self) -> bool {
        !(self.height > 0.0 && self.width > 0.0)
    }
}

/// Blend treatment of the cursor over dark or light surfaces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    #[default]
    Normal,
    Inverted,
    Light,
}

/// Composited visual properties. Writing these never forces layout.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct VisualProps {
    pub translate_x: f32,
    pub translate_y: f32,
    pub scale: f32,
    /// Horizontal-only scale (progress bars).
    pub scale_x: f32,
    pub opacity: f32,
    /// Blur radius in pixels.
    pub blur: f32,
    /// Rotation around the X axis in degrees.
    pub rotate_x: f32,
    pub tone: Tone,
}

impl Default for VisualProps {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl VisualProps {
    pub const IDENTITY: VisualProps = VisualProps {
        translate_x: 0.0,
        translate_y: 0.0,
        scale: 1.0,
        scale_x: 1.0,
        opacity: 1.0,
        blur: 0.0,
        rotate_x: 0.0,
        tone: Tone::Normal,
    };

    pub fn hidden() -> Self {
        Self {
            opacity: 0.0,
            ..Self::IDENTITY
        }
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    pub fn with_translate(mut self, x: f32, y: f32) -> Self {
        self.translate_x = x;
        self.translate_y = y;
        self
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Clamp every bounded property into its legal range.
    pub fn clamped(mut self) -> Self {
        self.opacity = self.opacity.clamp(0.0, 1.0);
        self.scale = self.scale.max(0.0);
        self.scale_x = self.scale_x.max(0.0);
        self.blur = self.blur.max(0.0);
        self
    }

    pub fn lerp(&self, other: &Self, t: f32) -> Self {
        let mix = |a: f32, b: f32| a + (b - a) * t;
        Self {
            translate_x: mix(self.translate_x, other.translate_x),
            translate_y: mix(self.translate_y, other.translate_y),
            scale: mix(self.scale, other.scale),
            scale_x: mix(self.scale_x, other.scale_x),
            opacity: mix(self.opacity, other.opacity),
            blur: mix(self.blur, other.blur),
            rotate_x: mix(self.rotate_x, other.rotate_x),
            tone: if t < 1.0 { self.tone } else { other.tone },
        }
    }

    /// Largest absolute per-property difference, ignoring tone.
    pub fn max_delta(&self, other: &Self) -> f32 {
        [
            self.translate_x - other.translate_x,
            self.translate_y - other.translate_y,
            self.scale - other.scale,
            self.scale_x - other.scale_x,
            self.opacity - other.opacity,
            self.blur - other.blur,
            self.rotate_x - other.rotate_x,
        ]
        .iter()
        .fold(0.0_f32, |acc, d| acc.max(d.abs()))
    }
}

// Tween support so `Animated<VisualProps>` can drive whole property sets.
// The eased time arrives already shaped by the keyframe's easing function.
impl CanTween for VisualProps {
    fn ease(from: Self, to: Self, time: impl keyframe::num_traits::Float) -> Self {
        let t = time.to_f32().unwrap_or(1.0);
        from.lerp(&to, t)
    }
}

/// One radial stop of the animated background gradient, in percent.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct GradientStop {
    pub x: f32,
    pub y: f32,
}

/// Decorative output written by the ambient loops.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Paint {
    Gradient {
        stops: Vec<GradientStop>,
    },
    Blob {
        center: (f32, f32),
        radius: f32,
        points: Vec<(f32, f32)>,
    },
}
