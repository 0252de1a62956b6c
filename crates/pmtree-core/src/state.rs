use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;

/// Observable value holder shared by UI bindings and node internals.
///
/// Clones share the same cell. Writes are serialized by the underlying
/// channel, so observers on any thread see them in write order; an observer
/// that falls behind only sees the newest value.
pub struct State<T> {
    sender: Arc<watch::Sender<T>>,
}

impl<T> Clone for State<T> {
    fn clone(&self) -> Self {
        Self {
            sender: Arc::clone(&self.sender),
        }
    }
}

impl<T> PartialEq for State<T> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.sender, &other.sender)
    }
}

impl<T> Eq for State<T> {}

impl<T> State<T> {
    pub fn new(value: T) -> Self {
        let (sender, _) = watch::channel(value);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.sender.borrow())
    }

    pub fn set(&self, value: T) {
        self.sender.send_replace(value);
    }

    /// Mutates the value in place and notifies observers once.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        self.sender.send_modify(f);
    }

    pub fn observer_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl<T: Clone> State<T> {
    pub fn value(&self) -> T {
        self.sender.borrow().clone()
    }

    pub fn get(&self) -> T {
        self.value()
    }

    /// Starts a stream whose first item is the current value.
    pub fn subscribe(&self) -> StateStream<T> {
        let mut receiver = self.sender.subscribe();
        receiver.mark_changed();
        StateStream { receiver }
    }
}

impl<T: fmt::Debug> fmt::Debug for State<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("value", &*self.sender.borrow())
            .finish()
    }
}

impl<T: Default> Default for State<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

pub struct StateStream<T> {
    receiver: watch::Receiver<T>,
}

impl<T: Clone> StateStream<T> {
    /// Waits for the next unseen value. Returns `None` once every [`State`]
    /// handle for the cell has been dropped.
    pub async fn next(&mut self) -> Option<T> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    /// Returns the newest value if it has not been observed yet.
    pub fn try_next(&mut self) -> Option<T> {
        match self.receiver.has_changed() {
            Ok(true) => Some(self.receiver.borrow_and_update().clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "tests/state_tests.rs"]
mod tests;
