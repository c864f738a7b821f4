//! Ordered listener storage backing an observable cell.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

/// Shared callback invoked as `listener(new, old)`.
pub(crate) type Listener<T> = Arc<dyn Fn(&T, &T) + Send + Sync>;

/// Identity of one registration.
///
/// Every call to `on_change` / `subscribe` gets a fresh id, so registering the
/// same closure twice produces two independent entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

struct Entry<T> {
    id: ListenerId,
    listener: Listener<T>,
}

/// Listener sequence plus the bookkeeping for an in-flight notification pass.
///
/// Always accessed under the cell's mutex; user callbacks never run while the
/// registry is borrowed.
pub(crate) struct ListenerRegistry<T> {
    entries: Vec<Entry<T>>,
    next_id: u64,
    pending: VecDeque<T>,
    notifying: bool,
}

impl<T> ListenerRegistry<T> {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 0,
            pending: VecDeque::new(),
            notifying: false,
        }
    }

    /// Append a listener at the end of the notification order.
    pub(crate) fn register(&mut self, listener: Listener<T>) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry { id, listener });
        id
    }

    /// Remove the entry with this id, handing back its listener.
    ///
    /// The caller drops the listener after releasing the lock, since its
    /// captures may unsubscribe on drop.
    pub(crate) fn remove(&mut self, id: ListenerId) -> Option<Listener<T>> {
        let index = self.entries.iter().position(|entry| entry.id == id)?;
        Some(self.entries.remove(index).listener)
    }

    pub(crate) fn contains(&self, id: ListenerId) -> bool {
        self.entries.iter().any(|entry| entry.id == id)
    }

    /// Clone the current listener sequence for a notification pass.
    pub(crate) fn snapshot(&self) -> Vec<Listener<T>> {
        self.entries
            .iter()
            .map(|entry| Arc::clone(&entry.listener))
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Set while a pass runs. The cell's gate keeps every other thread out
    /// for that time, so a caller seeing `true` is one of the pass's listeners.
    pub(crate) fn is_notifying(&self) -> bool {
        self.notifying
    }

    pub(crate) fn begin_pass(&mut self) {
        self.notifying = true;
    }

    pub(crate) fn end_pass(&mut self) {
        self.notifying = false;
    }

    /// Queue a value set while a pass is running.
    pub(crate) fn enqueue(&mut self, value: T) {
        self.pending.push_back(value);
    }

    pub(crate) fn dequeue(&mut self) -> Option<T> {
        self.pending.pop_front()
    }

    /// Take every queued value out of the registry.
    pub(crate) fn take_pending(&mut self) -> VecDeque<T> {
        std::mem::take(&mut self.pending)
    }
}
