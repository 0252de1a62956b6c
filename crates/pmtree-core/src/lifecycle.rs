//! Per-node lifecycle state machine.
//!
//! The machine only knows how to walk from one state to another; the node
//! decides what each step means (hooks, scopes, propagation).

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::state::{State, StateStream};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifecycleState {
    Initialized,
    Created,
    InForeground,
    Destroyed,
}

impl LifecycleState {
    pub fn is_destroyed(self) -> bool {
        self == LifecycleState::Destroyed
    }

    /// The state a non-visible entry is allowed to reach while the host is in
    /// `self`.
    pub(crate) fn capped_at_created(self) -> LifecycleState {
        match self {
            LifecycleState::InForeground => LifecycleState::Created,
            other => other,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    OnCreate,
    OnForeground,
    OnBackground,
    OnDestroy,
}

impl LifecycleEvent {
    /// State the node is in once this event has been applied.
    pub fn resulting_state(self) -> LifecycleState {
        match self {
            LifecycleEvent::OnCreate => LifecycleState::Created,
            LifecycleEvent::OnForeground => LifecycleState::InForeground,
            LifecycleEvent::OnBackground => LifecycleState::Created,
            LifecycleEvent::OnDestroy => LifecycleState::Destroyed,
        }
    }
}

/// Events needed to walk from `from` to `to`, in order. Empty when the move is
/// a no-op (same state, leaving `Destroyed`, or going back to `Initialized`).
pub fn transition_path(from: LifecycleState, to: LifecycleState) -> &'static [LifecycleEvent] {
    use LifecycleEvent::*;
    use LifecycleState::*;

    match (from, to) {
        (Initialized, Created) => &[OnCreate],
        (Initialized, InForeground) => &[OnCreate, OnForeground],
        (Initialized, Destroyed) => &[OnDestroy],
        (Created, InForeground) => &[OnForeground],
        (Created, Destroyed) => &[OnDestroy],
        (InForeground, Created) => &[OnBackground],
        (InForeground, Destroyed) => &[OnBackground, OnDestroy],
        _ => &[],
    }
}

/// Observable lifecycle of one node: the current state plus a single-slot
/// event channel where a newer event replaces an unread one.
#[derive(Clone)]
pub struct Lifecycle {
    state: State<LifecycleState>,
    events: Arc<watch::Sender<Option<LifecycleEvent>>>,
}

impl Lifecycle {
    pub(crate) fn new() -> Self {
        let (events, _) = watch::channel(None);
        Self {
            state: State::new(LifecycleState::Initialized),
            events: Arc::new(events),
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state.value()
    }

    pub fn state_stream(&self) -> StateStream<LifecycleState> {
        self.state.subscribe()
    }

    pub fn events(&self) -> LifecycleEvents {
        LifecycleEvents {
            receiver: self.events.subscribe(),
        }
    }

    pub(crate) fn apply(&self, event: LifecycleEvent) {
        self.state.set(event.resulting_state());
        self.events.send_replace(Some(event));
    }
}

/// Receiver for lifecycle events emitted after it was created.
pub struct LifecycleEvents {
    receiver: watch::Receiver<Option<LifecycleEvent>>,
}

impl LifecycleEvents {
    pub async fn next(&mut self) -> Option<LifecycleEvent> {
        loop {
            self.receiver.changed().await.ok()?;
            if let Some(event) = *self.receiver.borrow_and_update() {
                return Some(event);
            }
        }
    }

    pub fn try_next(&mut self) -> Option<LifecycleEvent> {
        match self.receiver.has_changed() {
            Ok(true) => *self.receiver.borrow_and_update(),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "tests/lifecycle_tests.rs"]
mod tests;
