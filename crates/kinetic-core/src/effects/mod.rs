//! # Effect Presets
//!
//! Ready-made pipelines for every effect on the site. Each constructor binds
//! element ids and returns a mountable `Effect`.
//!
//! | Module | Effects |
//! |---|---|
//! | `reveal` | `reveal` |
//! | `stagger` | `stagger_text` |
//! | `scroll_fade` | `scroll_fade`, `hero_fade` |
//! | `parallax` | `parallax`, `scrub_parallax`, `horizontal_track` |
//! | `progress` | `progress` |
//! | `pointer` | `hover_preview`, `magnetic` |
//! | `marquee` | `marquee` |
//! | `ambient` | `gradient`, `blob` |

pub mod ambient;
pub mod marquee;
pub mod parallax;
pub mod pointer;
pub mod progress;
pub mod reveal;
pub mod scroll_fade;
pub mod stagger;

pub use ambient::{blob, gradient};
pub use marquee::{marquee, MarqueeDirection, MarqueeSettings};
pub use parallax::{
    horizontal_track, parallax, scrub_parallax, ParallaxDirection, ParallaxSettings, ScrubSettings,
};
pub use pointer::{hover_preview, magnetic, PreviewParts, PreviewSource};
pub use progress::progress;
pub use reveal::{reveal, RevealPreset, RevealSettings, SlideDirection};
pub use scroll_fade::{hero_fade, scroll_fade};
pub use stagger::{mount_units, split_units, stagger_text, SplitMode, StaggerSettings};
