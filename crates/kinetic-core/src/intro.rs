//! # Intro Sequencer
//!
//! The one-time full-page intro: a letter-by-letter name reveal, a hold, a
//! reversed letter fade-out, then completion.
//!
//! `Init → Skip` when the session flag is present, otherwise
//! `Init → Playing → Complete`. Completion sets the flag. A store that
//! cannot be read counts as "flag absent", so the intro plays and rendering
//! is never blocked.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::animation::{Animated, EasingType};
use crate::session::{intro_played, mark_intro_played, SessionStore};
use crate::types::VisualProps;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntroPhase {
    Init,
    Skip,
    Playing,
    Complete,
}

/// Intro timeline, in seconds from the first played frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntroTimings {
    pub reveal_delay: f64,
    pub letter_stagger: f64,
    pub letter_duration: f64,
    pub fade_out_at: f64,
    pub fade_stagger: f64,
    pub fade_duration: f64,
    pub complete_at: f64,
}

impl Default for IntroTimings {
    fn default() -> Self {
        Self {
            reveal_delay: 0.2,
            letter_stagger: 0.06,
            letter_duration: 0.7,
            fade_out_at: 3.0,
            fade_stagger: 0.03,
            fade_duration: 0.7,
            complete_at: 3.8,
        }
    }
}

const LETTER_EASE: EasingType = EasingType::PowerOut(3);

fn letter_waiting() -> VisualProps {
    VisualProps::hidden().with_translate(0.0, 32.0)
}

fn letter_gone() -> VisualProps {
    VisualProps::hidden()
        .with_translate(0.0, 48.0)
        .with_scale(0.75)
}

#[derive(Debug)]
pub struct IntroSequencer {
    phase: IntroPhase,
    timings: IntroTimings,
    started_at: Option<f64>,
    letters: Vec<Animated<VisualProps>>,
    overlay: Animated<VisualProps>,
    history: Vec<IntroPhase>,
}

impl IntroSequencer {
    pub fn new(letter_count: usize) -> Self {
        Self::with_timings(letter_count, IntroTimings::default())
    }

    pub fn with_timings(letter_count: usize, timings: IntroTimings) -> Self {
        let letters = (0..letter_count)
            .map(|i| letter_timeline(i, letter_count, &timings))
            .collect();

        let mut overlay = Animated::new(VisualProps::IDENTITY);
        overlay.add_keyframe(VisualProps::IDENTITY, timings.fade_out_at, EasingType::Linear);
        overlay.add_keyframe(VisualProps::hidden(), timings.fade_duration, LETTER_EASE);

        Self {
            phase: IntroPhase::Init,
            timings,
            started_at: None,
            letters,
            overlay,
            history: vec![IntroPhase::Init],
        }
    }

    /// Reads the session flag and leaves `Init`. Calling it again is a no-op.
    pub fn begin(&mut self, store: &dyn SessionStore) -> IntroPhase {
        if self.phase == IntroPhase::Init {
            let next = if intro_played(store) {
                IntroPhase::Skip
            } else {
                IntroPhase::Playing
            };
            self.transition(next);
        }
        self.phase
    }

    /// Moves the timeline to `now`. Returns `true` on the call that
    /// completes the intro; the flag is written at that moment.
    pub fn advance(&mut self, now: f64, store: &mut dyn SessionStore) -> bool {
        if self.phase != IntroPhase::Playing {
            return false;
        }
        let started = *self.started_at.get_or_insert(now);
        let local = now - started;
        for letter in &mut self.letters {
            letter.update(local);
        }
        self.overlay.update(local);

        if local >= self.timings.complete_at {
            mark_intro_played(store);
            self.transition(IntroPhase::Complete);
            return true;
        }
        false
    }

    fn transition(&mut self, next: IntroPhase) {
        debug!(from = ?self.phase, to = ?next, "intro transition");
        self.phase = next;
        self.history.push(next);
    }

    pub fn phase(&self) -> IntroPhase {
        self.phase
    }

    /// Every phase visited so far, starting with `Init`.
    pub fn history(&self) -> &[IntroPhase] {
        &self.history
    }

    pub fn is_done(&self) -> bool {
        matches!(self.phase, IntroPhase::Skip | IntroPhase::Complete)
    }

    pub fn timings(&self) -> &IntroTimings {
        &self.timings
    }

    pub fn letter_count(&self) -> usize {
        self.letters.len()
    }

    pub fn letter_visual(&self, index: usize) -> Option<VisualProps> {
        self.letters.get(index).map(|l| *l.value())
    }

    /// The full-screen overlay behind the letters.
    pub fn overlay_visual(&self) -> VisualProps {
        match self.phase {
            IntroPhase::Skip | IntroPhase::Complete => VisualProps::hidden(),
            _ => *self.overlay.value(),
        }
    }
}

fn letter_timeline(index: usize, count: usize, timings: &IntroTimings) -> Animated<VisualProps> {
    let reveal_at = timings.reveal_delay + index as f64 * timings.letter_stagger;
    let shown_at = reveal_at + timings.letter_duration;
    // The fade runs right to left.
    let fade_at = timings.fade_out_at + (count - 1 - index) as f64 * timings.fade_stagger;

    let mut anim = Animated::new(letter_waiting());
    if reveal_at > 0.0 {
        anim.add_keyframe(letter_waiting(), reveal_at, EasingType::Linear);
    }
    anim.add_keyframe(VisualProps::IDENTITY, timings.letter_duration, LETTER_EASE);
    if fade_at > shown_at {
        anim.add_keyframe(VisualProps::IDENTITY, fade_at - shown_at, EasingType::Linear);
    }
    anim.add_keyframe(letter_gone(), timings.fade_duration, LETTER_EASE);
    anim
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{MemorySessionStore, UnavailableStore, LOADED_KEY};

    #[test]
    fn fresh_session_plays_and_sets_flag() {
        let mut store = MemorySessionStore::new();
        let mut intro = IntroSequencer::new(8);
        assert_eq!(intro.begin(&store), IntroPhase::Playing);

        assert!(!intro.advance(10.0, &mut store));
        assert!(!intro.advance(12.0, &mut store));
        assert!(intro.advance(13.8, &mut store));
        assert_eq!(
            intro.history(),
            &[IntroPhase::Init, IntroPhase::Playing, IntroPhase::Complete]
        );
        assert_eq!(store.get(LOADED_KEY).unwrap().as_deref(), Some("true"));
        assert!(!intro.advance(20.0, &mut store));
    }

    #[test]
    fn flagged_session_skips() {
        let mut store = MemorySessionStore::with_flag();
        let mut intro = IntroSequencer::new(8);
        assert_eq!(intro.begin(&store), IntroPhase::Skip);
        assert!(!intro.advance(99.0, &mut store));
        assert_eq!(intro.history(), &[IntroPhase::Init, IntroPhase::Skip]);
        assert_eq!(intro.overlay_visual().opacity, 0.0);
    }

    #[test]
    fn unavailable_store_still_plays() {
        let mut store = UnavailableStore;
        let mut intro = IntroSequencer::new(3);
        assert_eq!(intro.begin(&store), IntroPhase::Playing);
        intro.advance(0.0, &mut store);
        assert!(intro.advance(5.0, &mut store));
        assert_eq!(intro.phase(), IntroPhase::Complete);
    }

    #[test]
    fn letters_reveal_in_order_and_fade_in_reverse() {
        let mut store = MemorySessionStore::new();
        let mut intro = IntroSequencer::new(4);
        intro.begin(&store);

        intro.advance(0.0, &mut store);
        assert_eq!(intro.letter_visual(0).unwrap().opacity, 0.0);

        intro.advance(0.4, &mut store);
        let first = intro.letter_visual(0).unwrap().opacity;
        let last = intro.letter_visual(3).unwrap().opacity;
        assert!(first > last, "first letter leads the reveal");

        intro.advance(2.0, &mut store);
        assert!((intro.letter_visual(3).unwrap().opacity - 1.0).abs() < 1e-4);

        intro.advance(3.2, &mut store);
        let first = intro.letter_visual(0).unwrap().opacity;
        let last = intro.letter_visual(3).unwrap().opacity;
        assert!(last < first, "last letter leads the fade-out");
        assert!(intro.overlay_visual().opacity < 1.0);
    }
}
