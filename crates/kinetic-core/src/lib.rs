//! # Kinetic Core
//!
//! A scroll and pointer reactive animation engine. Components are
//! sampler → transform → applier pipelines mounted on an [`Engine`], which
//! owns the [`Stage`] (the element tree they read and write), coalesces
//! input into at most one run per component per frame, and gates
//! intro-dependent components until the intro sequence completes.
//!
//! Scenes are usually described as JSON ([`SceneConfig`]) and driven by a
//! recorded input [`Trace`].

pub mod animation;
pub mod applier;
pub mod completion;
pub mod config;
pub mod cursor;
pub mod effects;
pub mod engine;
pub mod errors;
pub mod intro;
pub mod pipeline;
pub mod registry;
pub mod replay;
pub mod scheduler;
pub mod session;
pub mod signal;
pub mod stage;
pub mod transform;
pub mod types;

pub use animation::{Animated, AnimationState, EasingType, Playhead, Tween};
pub use config::{BuiltScene, EffectConfig, EngineTuning, SceneConfig};
pub use engine::{ComponentId, Engine, FrameReport, InputEvent, Lifecycle};
pub use errors::{KineticError, Result};
pub use intro::{IntroPhase, IntroTimings};
pub use pipeline::{Control, Drive, Effect, EventKind, FrameContext, Pipeline};
pub use replay::{replay, ReplayReport, Trace};
pub use session::{FileSessionStore, MemorySessionStore, SessionStore};
pub use stage::{ElementTraits, Stage};
pub use types::{ElementId, Paint, Rect, Viewport, VisualProps};
