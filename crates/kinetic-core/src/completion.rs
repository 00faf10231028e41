//! Fire-once completion broadcast ("loader complete").
//!
//! Components that must wait for the intro subscribe and get a token back.
//! `fire` hands the waiting tokens to the caller exactly once; anyone who
//! subscribes afterwards is told it already happened.

use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Subscription {
    /// Waiting; keep the id to unsubscribe on teardown.
    Pending(SubscriptionId),
    /// The signal fired before the subscription was made.
    Fired,
}

#[derive(Debug, Default)]
pub struct CompletionSignal {
    fired: bool,
    next: u64,
    waiting: Vec<SubscriptionId>,
}

impl CompletionSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> Subscription {
        if self.fired {
            return Subscription::Fired;
        }
        self.next += 1;
        let id = SubscriptionId(self.next);
        self.waiting.push(id);
        Subscription::Pending(id)
    }

    /// Returns `false` if the id was not waiting.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.waiting.len();
        self.waiting.retain(|w| *w != id);
        self.waiting.len() != before
    }

    /// Fires the signal, returning the subscribers to notify. Later calls
    /// return nothing.
    pub fn fire(&mut self) -> Vec<SubscriptionId> {
        if self.fired {
            return Vec::new();
        }
        self.fired = true;
        let waiting = std::mem::take(&mut self.waiting);
        debug!(subscribers = waiting.len(), "completion signal fired");
        waiting
    }

    pub fn is_fired(&self) -> bool {
        self.fired
    }

    pub fn waiting(&self) -> usize {
        self.waiting.len()
    }
}
