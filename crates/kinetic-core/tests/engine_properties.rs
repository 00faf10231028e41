use kinetic_core::animation::{exp_smooth, AnimationState};
use kinetic_core::effects::{progress, reveal, RevealPreset, RevealSettings};
use kinetic_core::engine::{Engine, InputEvent, Lifecycle};
use kinetic_core::intro::{IntroPhase, IntroTimings};
use kinetic_core::pipeline::EventKind;
use kinetic_core::session::{MemorySessionStore, SessionStore, LOADED_KEY};
use kinetic_core::stage::{ElementTraits, Stage, WriteOutcome};
use kinetic_core::types::{Rect, Viewport, VisualProps};

const STEP: f64 = 1.0 / 60.0;

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

fn page(document_height: f32) -> Stage {
    Stage::new(Viewport::new(1000.0, 800.0), document_height)
}

/// Runs frames from `start` for `seconds`, returning the time reached.
fn run_frames(engine: &mut Engine, start: f64, seconds: f64) -> f64 {
    let mut now = start;
    let end = start + seconds;
    while now < end {
        now += STEP;
        engine.frame(now);
    }
    now
}

#[test]
fn reveal_opacity_never_drops_and_lands_on_one() {
    init_logging();
    let mut stage = page(4000.0);
    let section = stage.add_element(
        ElementTraits::tag("section"),
        Some(Rect::new(0.0, 1600.0, 1000.0, 600.0)),
    );
    let mut engine = Engine::new(stage);
    let settings = RevealSettings {
        preset: RevealPreset::Fade,
        ..RevealSettings::default()
    };
    engine.mount(reveal(section, vec![section], settings));

    let mut now = 0.0;
    let mut last = 0.0;
    // Approach the start line in small steps, then go past it.
    for step in 0..40 {
        engine.dispatch(&InputEvent::Scroll {
            y: step as f32 * 30.0,
        });
        now += STEP;
        engine.frame(now);
        let opacity = engine.stage.style(section).unwrap().opacity;
        assert!(opacity >= last, "opacity fell from {last} to {opacity}");
        last = opacity;
    }
    run_frames(&mut engine, now, 1.5);
    assert_eq!(engine.stage.style(section).unwrap().opacity, 1.0);

    // Play-once: scrolling back to the top changes nothing.
    engine.dispatch(&InputEvent::Scroll { y: 0.0 });
    run_frames(&mut engine, now + 1.5, 0.2);
    assert_eq!(engine.stage.style(section).unwrap().opacity, 1.0);
}

#[test]
fn identical_writes_are_skipped() {
    let mut stage = page(800.0);
    let id = stage.add_element(ElementTraits::default(), None);
    let props = VisualProps::IDENTITY.with_translate(0.0, 12.0);

    assert_eq!(stage.write_style(id, props), WriteOutcome::Written);
    let before = stage.get(id).unwrap().clone();
    assert_eq!(stage.write_style(id, props), WriteOutcome::Unchanged);

    let after = stage.get(id).unwrap();
    assert_eq!(after.style, before.style);
    assert_eq!(after.writes, before.writes);
    assert_eq!(after.skipped_writes, before.skipped_writes + 1);
}

#[test]
fn smoothing_converges_without_overshoot() {
    for factor in [0.05_f32, 0.1, 0.15, 0.5, 1.0] {
        let mut state = AnimationState::new(0.0_f32);
        state.retarget(100.0, 0.0);
        let mut iterations = 0;
        while !state.is_settled(0.01) {
            let value = state.smooth(factor);
            assert!(value <= 100.0, "overshoot at factor {factor}");
            iterations += 1;
            assert!(iterations < 1000, "no convergence at factor {factor}");
        }
    }
    // Factors past 1 are clamped to a snap.
    assert_eq!(exp_smooth(0.0_f32, 10.0, 3.0), 10.0);
}

#[test]
fn unmounted_component_never_writes_again() {
    init_logging();
    let mut stage = page(3000.0);
    let bar = stage.add_element(ElementTraits::default(), None);
    let mut engine = Engine::new(stage);
    let id = engine.mount(progress(bar, 0.1));

    engine.frame(0.0);
    engine.dispatch(&InputEvent::Scroll { y: 550.0 });
    // The scroll queued a cycle; unmount before it runs.
    assert!(engine.is_scheduled(id));
    assert!(engine.unmount(id));
    assert_eq!(engine.lifecycle(id), Lifecycle::Unmounted);
    assert_eq!(engine.listener_count(EventKind::Scroll), 0);
    assert_eq!(engine.pending_frames(), 0);

    let writes = engine.stage.get(bar).unwrap().writes;
    let cycles = engine.cycles(id);
    for y in [800.0, 1200.0, 2200.0] {
        engine.dispatch(&InputEvent::Scroll { y });
        let report = engine.frame(y as f64);
        assert_eq!(report.cycles, 0);
    }
    assert_eq!(engine.stage.get(bar).unwrap().writes, writes);
    assert_eq!(engine.cycles(id), cycles);
    assert!(!engine.unmount(id));
}

#[test]
fn intro_plays_once_per_session() {
    init_logging();
    let timings = IntroTimings {
        complete_at: 0.5,
        fade_out_at: 0.3,
        ..IntroTimings::default()
    };

    let mut stage = page(800.0);
    let letters: Vec<_> = (0..4)
        .map(|_| stage.add_element(ElementTraits::tag("span"), None))
        .collect();
    let mut engine = Engine::new(stage);

    let phase = engine.begin_intro(
        Box::new(MemorySessionStore::new()),
        letters.clone(),
        None,
        timings,
    );
    assert_eq!(phase, IntroPhase::Playing);
    assert!(!engine.completion().is_fired());
    run_frames(&mut engine, 0.0, 1.0);
    assert_eq!(
        engine.intro_history(),
        &[IntroPhase::Init, IntroPhase::Playing, IntroPhase::Complete]
    );
    assert!(engine.completion().is_fired());

    // A flagged session skips straight to the end with letters hidden.
    let mut engine = Engine::new(page(800.0));
    let mut flagged = MemorySessionStore::new();
    flagged.set(LOADED_KEY, "true").unwrap();
    let phase = engine.begin_intro(Box::new(flagged), vec![], None, timings);
    assert_eq!(phase, IntroPhase::Skip);
    assert_eq!(engine.intro_history(), &[IntroPhase::Init, IntroPhase::Skip]);
    assert!(engine.completion().is_fired());
}

#[test]
fn progress_spans_zero_to_hundred() {
    let mut stage = page(2400.0);
    let bar = stage.add_element(ElementTraits::default(), None);
    let mut engine = Engine::new(stage);
    engine.mount(progress(bar, 0.1));

    engine.frame(0.0);
    assert_eq!(engine.stage.style(bar).unwrap().scale_x, 0.0);

    engine.dispatch(&InputEvent::Scroll { y: 1600.0 });
    engine.frame(STEP);
    assert_eq!(engine.stage.style(bar).unwrap().scale_x, 1.0);

    // A page shorter than the viewport cannot scroll and reads as 0%.
    let mut stage = page(500.0);
    let bar = stage.add_element(ElementTraits::default(), None);
    let mut engine = Engine::new(stage);
    engine.mount(progress(bar, 0.1));
    engine.dispatch(&InputEvent::Scroll { y: 300.0 });
    engine.frame(0.0);
    assert_eq!(engine.stage.scroll_y(), 0.0);
    assert_eq!(engine.stage.style(bar).unwrap().scale_x, 0.0);
}

#[test]
fn progress_reaches_ends_by_single_pixels() {
    // 2400 - 800 leaves 1600px of scroll, so one pixel is 0.0625%.
    let mut stage = page(2400.0);
    let bar = stage.add_element(ElementTraits::default(), None);
    let mut engine = Engine::new(stage);
    engine.mount(progress(bar, 0.1));

    let mut now = 0.0;
    for y in [0.0, 1599.0, 1600.0] {
        engine.dispatch(&InputEvent::Scroll { y });
        now += STEP;
        engine.frame(now);
    }
    assert_eq!(engine.stage.style(bar).unwrap().scale_x, 1.0);

    for y in [1.0, 0.0] {
        engine.dispatch(&InputEvent::Scroll { y });
        now += STEP;
        engine.frame(now);
    }
    assert_eq!(engine.stage.style(bar).unwrap().scale_x, 0.0);
}

#[test]
fn gated_components_wait_for_intro() {
    let mut stage = page(3000.0);
    let bar = stage.add_element(ElementTraits::default(), None);
    let mut engine = Engine::new(stage);
    let id = engine.mount_after_intro(progress(bar, 0.1));

    assert!(engine.is_gated(id));
    engine.dispatch(&InputEvent::Scroll { y: 1100.0 });
    assert_eq!(engine.frame(0.0).cycles, 0);

    engine.complete_intro();
    assert!(!engine.is_gated(id));
    engine.frame(STEP);
    assert!((engine.stage.style(bar).unwrap().scale_x - 0.5).abs() < 1e-4);
}
