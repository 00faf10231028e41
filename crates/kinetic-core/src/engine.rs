//! # Engine Module
//!
//! Owns the stage, the mounted components and the frame scheduler.
//!
//! ## Responsibilities
//! - **Lifecycle**: `mount` puts a component in `Sampling` and schedules its
//!   first cycle; `unmount` cancels its pending frame, drops its event
//!   subscriptions and completion subscription, then frees the slot.
//! - **Events**: `dispatch` updates the stage and wakes subscribers. Wakes
//!   collapse into one cycle per component per frame.
//! - **Frames**: `frame(now)` runs every due cycle once, in request order.
//! - **Intro gating**: components mounted with `mount_after_intro` stay
//!   dormant until the completion signal fires.
//!
//! Component handles are generational, so a stale `ComponentId` from an
//! unmounted component can never reach the slot's next occupant.

use std::collections::HashMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::completion::{CompletionSignal, Subscription, SubscriptionId};
use crate::intro::{IntroPhase, IntroSequencer, IntroTimings};
use crate::pipeline::{Control, Effect, EventKind, FrameContext};
use crate::scheduler::{FrameHandle, FrameScheduler};
use crate::session::SessionStore;
use crate::stage::Stage;
use crate::types::{ElementId, Viewport, VisualProps};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId {
    pub index: usize,
    pub generation: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifecycle {
    Unmounted,
    Sampling,
}

/// Raw input from the host.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    Scroll { y: f32 },
    PointerMove { x: f32, y: f32 },
    PointerDown,
    PointerUp,
    PointerLeave,
    PointerEnter,
    Resize { width: f32, height: f32 },
}

impl InputEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            InputEvent::Scroll { .. } => EventKind::Scroll,
            InputEvent::PointerMove { .. } => EventKind::PointerMove,
            InputEvent::PointerDown => EventKind::PointerDown,
            InputEvent::PointerUp => EventKind::PointerUp,
            InputEvent::PointerLeave => EventKind::PointerLeave,
            InputEvent::PointerEnter => EventKind::PointerEnter,
            InputEvent::Resize { .. } => EventKind::Resize,
        }
    }
}

/// Summary of one `Engine::frame` call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct FrameReport {
    pub frame: u64,
    pub now: f64,
    /// Component cycles run this frame.
    pub cycles: usize,
    /// Style and paint writes that changed something.
    pub writes: u64,
    /// Callbacks already queued for the next frame.
    pub scheduled: usize,
}

struct Mounted {
    effect: Box<dyn Effect>,
    pending: Option<FrameHandle>,
    subscribed: bool,
    gate: Option<SubscriptionId>,
    cycles: u64,
}

struct Slot {
    generation: u32,
    mounted: Option<Mounted>,
}

struct IntroRun {
    sequencer: IntroSequencer,
    store: Box<dyn SessionStore>,
    letters: Vec<ElementId>,
    overlay: Option<ElementId>,
}

pub struct Engine {
    pub stage: Stage,
    slots: Vec<Slot>,
    free_slots: Vec<usize>,
    scheduler: FrameScheduler,
    listeners: HashMap<EventKind, Vec<ComponentId>>,
    completion: CompletionSignal,
    gated: HashMap<SubscriptionId, ComponentId>,
    intro: Option<IntroRun>,
    frame: u64,
    last_now: Option<f64>,
}

impl Engine {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            slots: Vec::new(),
            free_slots: Vec::new(),
            scheduler: FrameScheduler::new(),
            listeners: HashMap::new(),
            completion: CompletionSignal::new(),
            gated: HashMap::new(),
            intro: None,
            frame: 0,
            last_now: None,
        }
    }

    pub fn mount(&mut self, effect: impl Effect + 'static) -> ComponentId {
        self.mount_boxed(Box::new(effect), false)
    }

    /// Mounts a component that stays dormant until the intro completes.
    pub fn mount_after_intro(&mut self, effect: impl Effect + 'static) -> ComponentId {
        self.mount_boxed(Box::new(effect), true)
    }

    pub fn mount_boxed(&mut self, effect: Box<dyn Effect>, after_intro: bool) -> ComponentId {
        let index = match self.free_slots.pop() {
            Some(index) => index,
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    mounted: None,
                });
                self.slots.len() - 1
            }
        };
        let id = ComponentId {
            index,
            generation: self.slots[index].generation,
        };
        debug!(component = effect.name(), ?id, after_intro, "mount");
        self.slots[index].mounted = Some(Mounted {
            effect,
            pending: None,
            subscribed: false,
            gate: None,
            cycles: 0,
        });

        if after_intro {
            if let Subscription::Pending(sub) = self.completion.subscribe() {
                if let Some(m) = self.mounted_mut(id) {
                    m.gate = Some(sub);
                }
                self.gated.insert(sub, id);
                return id;
            }
        }
        self.activate(id);
        id
    }

    /// Subscribes the component to its events and schedules its first cycle.
    fn activate(&mut self, id: ComponentId) {
        let Some(slot) = self.slots.get_mut(id.index) else {
            return;
        };
        let Some(m) = slot.mounted.as_mut() else {
            return;
        };
        m.gate = None;
        for kind in m.effect.interests() {
            self.listeners.entry(*kind).or_default().push(id);
        }
        m.subscribed = true;
        m.pending = Some(self.scheduler.request(id));
    }

    /// Tears a component down. Returns `false` for stale or unknown ids.
    pub fn unmount(&mut self, id: ComponentId) -> bool {
        let Some(slot) = self.slots.get_mut(id.index) else {
            return false;
        };
        if slot.generation != id.generation {
            return false;
        }
        let Some(m) = slot.mounted.take() else {
            return false;
        };
        slot.generation = slot.generation.wrapping_add(1);

        if let Some(handle) = m.pending {
            self.scheduler.cancel(handle);
        }
        drop_listeners(&mut self.listeners, id);
        if let Some(sub) = m.gate {
            self.completion.unsubscribe(sub);
            self.gated.remove(&sub);
        }
        self.free_slots.push(id.index);
        debug!(component = m.effect.name(), ?id, cycles = m.cycles, "unmount");
        true
    }

    pub fn unmount_all(&mut self) {
        for id in self.component_ids() {
            self.unmount(id);
        }
    }

    fn mounted(&self, id: ComponentId) -> Option<&Mounted> {
        self.slots
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.mounted.as_ref())
    }

    fn mounted_mut(&mut self, id: ComponentId) -> Option<&mut Mounted> {
        self.slots
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.mounted.as_mut())
    }

    pub fn lifecycle(&self, id: ComponentId) -> Lifecycle {
        if self.mounted(id).is_some() {
            Lifecycle::Sampling
        } else {
            Lifecycle::Unmounted
        }
    }

    pub fn component_name(&self, id: ComponentId) -> Option<&str> {
        self.mounted(id).map(|m| m.effect.name())
    }

    pub fn component_ids(&self) -> Vec<ComponentId> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.mounted.is_some())
            .map(|(index, slot)| ComponentId {
                index,
                generation: slot.generation,
            })
            .collect()
    }

    pub fn mounted_count(&self) -> usize {
        self.slots.iter().filter(|s| s.mounted.is_some()).count()
    }

    pub fn cycles(&self, id: ComponentId) -> u64 {
        self.mounted(id).map_or(0, |m| m.cycles)
    }

    pub fn is_scheduled(&self, id: ComponentId) -> bool {
        self.mounted(id)
            .and_then(|m| m.pending)
            .is_some_and(|h| self.scheduler.is_pending(h))
    }

    /// Whether the component still holds event subscriptions.
    pub fn is_subscribed(&self, id: ComponentId) -> bool {
        self.mounted(id).is_some_and(|m| m.subscribed)
    }

    pub fn is_gated(&self, id: ComponentId) -> bool {
        self.mounted(id).is_some_and(|m| m.gate.is_some())
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.get(&kind).map_or(0, Vec::len)
    }

    pub fn pending_frames(&self) -> usize {
        self.scheduler.len()
    }

    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    /// Feeds one raw input into the stage and wakes its subscribers.
    pub fn dispatch(&mut self, event: &InputEvent) {
        self.apply_input(event);
        let kind = event.kind();
        let Some(subscribers) = self.listeners.get(&kind) else {
            return;
        };
        for &id in subscribers {
            let Some(m) = self
                .slots
                .get_mut(id.index)
                .filter(|slot| slot.generation == id.generation)
                .and_then(|slot| slot.mounted.as_mut())
            else {
                continue;
            };
            if m.effect.on_event(kind, &self.stage) {
                m.pending = Some(self.scheduler.request(id));
            }
        }
    }

    fn apply_input(&mut self, event: &InputEvent) {
        let stage = &mut self.stage;
        match *event {
            InputEvent::Scroll { y } => {
                stage.set_scroll(y);
                if stage.pointer_inside {
                    stage.hovered = stage.hit_test(stage.pointer.x, stage.pointer.y);
                }
            }
            InputEvent::PointerMove { x, y } => {
                stage.pointer = Vec2::new(x, y);
                stage.pointer_inside = true;
                stage.hovered = stage.hit_test(x, y);
            }
            InputEvent::PointerDown => stage.pointer_down = true,
            InputEvent::PointerUp => stage.pointer_down = false,
            InputEvent::PointerLeave => {
                stage.pointer_inside = false;
                stage.pointer_down = false;
                stage.hovered = None;
            }
            InputEvent::PointerEnter => stage.pointer_inside = true,
            InputEvent::Resize { width, height } => {
                stage.set_viewport(Viewport::new(width, height));
            }
        }
    }

    /// The refresh callback: runs every cycle scheduled for this frame.
    pub fn frame(&mut self, now: f64) -> FrameReport {
        let dt = self.last_now.map_or(0.0, |last| (now - last).max(0.0));
        self.last_now = Some(now);
        self.frame += 1;
        let writes_before = self.stage.total_writes();

        self.advance_intro(now);

        let ctx = FrameContext {
            now,
            dt,
            frame: self.frame,
            intro_complete: self.completion.is_fired(),
        };

        let mut cycles = 0;
        for (handle, id) in self.scheduler.drain() {
            let Some(m) = self
                .slots
                .get_mut(id.index)
                .filter(|slot| slot.generation == id.generation)
                .and_then(|slot| slot.mounted.as_mut())
            else {
                continue;
            };
            if m.pending != Some(handle) {
                trace!(?id, "stale frame callback dropped");
                continue;
            }
            m.pending = None;
            let control = m.effect.tick(&mut self.stage, &ctx);
            m.cycles += 1;
            cycles += 1;

            match control {
                Control::Continue => m.pending = Some(self.scheduler.request(id)),
                Control::Idle => {}
                Control::Detach => {
                    if m.subscribed {
                        drop_listeners(&mut self.listeners, id);
                        m.subscribed = false;
                        debug!(component = m.effect.name(), "trigger spent, unsubscribed");
                    }
                    m.pending = Some(self.scheduler.request(id));
                }
                Control::Finished => {
                    if m.subscribed {
                        drop_listeners(&mut self.listeners, id);
                        m.subscribed = false;
                    }
                    trace!(component = m.effect.name(), "finished");
                }
            }
        }

        FrameReport {
            frame: self.frame,
            now,
            cycles,
            writes: self.stage.total_writes() - writes_before,
            scheduled: self.scheduler.len(),
        }
    }

    /// Starts the intro against `store`, animating `letters` and `overlay`.
    /// A flagged session skips straight to completion.
    pub fn begin_intro(
        &mut self,
        store: Box<dyn SessionStore>,
        letters: Vec<ElementId>,
        overlay: Option<ElementId>,
        timings: IntroTimings,
    ) -> IntroPhase {
        let mut sequencer = IntroSequencer::with_timings(letters.len(), timings);
        let phase = sequencer.begin(store.as_ref());

        let hidden = phase == IntroPhase::Skip;
        for (i, &id) in letters.iter().enumerate() {
            let props = if hidden {
                Some(VisualProps::hidden())
            } else {
                sequencer.letter_visual(i)
            };
            if let Some(props) = props {
                self.stage.write_style(id, props);
            }
        }
        if let Some(id) = overlay {
            self.stage.write_style(id, sequencer.overlay_visual());
        }

        self.intro = Some(IntroRun {
            sequencer,
            store,
            letters,
            overlay,
        });
        if hidden {
            self.complete_intro();
        }
        phase
    }

    fn advance_intro(&mut self, now: f64) {
        let completed = {
            let Some(run) = self.intro.as_mut() else {
                return;
            };
            if run.sequencer.phase() != IntroPhase::Playing {
                return;
            }
            let completed = run.sequencer.advance(now, run.store.as_mut());
            for (i, &id) in run.letters.iter().enumerate() {
                if let Some(props) = run.sequencer.letter_visual(i) {
                    self.stage.write_style(id, props);
                }
            }
            if let Some(id) = run.overlay {
                self.stage.write_style(id, run.sequencer.overlay_visual());
            }
            completed
        };
        if completed {
            self.complete_intro();
        }
    }

    /// Fires the completion signal and wakes every gated component. Safe to
    /// call more than once.
    pub fn complete_intro(&mut self) {
        for sub in self.completion.fire() {
            if let Some(id) = self.gated.remove(&sub) {
                self.activate(id);
            }
        }
    }

    pub fn completion(&self) -> &CompletionSignal {
        &self.completion
    }

    pub fn intro_phase(&self) -> Option<IntroPhase> {
        self.intro.as_ref().map(|run| run.sequencer.phase())
    }

    pub fn intro_history(&self) -> &[IntroPhase] {
        match &self.intro {
            Some(run) => run.sequencer.history(),
            None => &[],
        }
    }
}

fn drop_listeners(listeners: &mut HashMap<EventKind, Vec<ComponentId>>, id: ComponentId) {
    for subscribers in listeners.values_mut() {
        subscribers.retain(|&s| s != id);
    }
    listeners.retain(|_, subscribers| !subscribers.is_empty());
}
