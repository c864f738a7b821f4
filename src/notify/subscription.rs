//! Revocable listener registrations.

use super::ListenerId;
use std::fmt;
use std::sync::Weak;

/// Something a [`Subscription`] can remove its listener from.
///
/// Implemented by the shared state of every `ObservableCell<T>`, so the handle
/// does not need to carry the cell's value type.
pub(crate) trait Revoke: Send + Sync {
    /// Remove the registration. Returns `false` if it was already removed.
    fn revoke(&self, id: ListenerId) -> bool;

    /// Whether the registration is still in the listener sequence.
    fn holds(&self, id: ListenerId) -> bool;
}

/// Handle for a revocable listener registration.
///
/// Returned by [`ObservableCell::subscribe`](crate::core::ObservableCell::subscribe).
/// The listener is removed when [`unsubscribe`](Self::unsubscribe) is called
/// or when the handle is dropped, whichever happens first. Only the entry
/// created by that `subscribe` call is removed, even when the same closure was
/// registered several times.
///
/// The handle holds a weak reference to the cell: it never keeps the cell
/// alive, and becomes inert once the cell is gone.
///
/// # Examples
///
/// ```rust
/// use observable_cell::prelude::*;
///
/// let cell = ObservableCell::new(0);
/// let subscription = cell.subscribe(|new, old| println!("{old} -> {new}"));
///
/// assert!(subscription.unsubscribe());
/// assert!(!subscription.unsubscribe()); // second call is a no-op
/// ```
#[must_use = "dropping a Subscription immediately unsubscribes the listener"]
pub struct Subscription {
    id: ListenerId,
    target: Option<Weak<dyn Revoke>>,
}

impl Subscription {
    pub(crate) fn new(id: ListenerId, target: Weak<dyn Revoke>) -> Self {
        Self {
            id,
            target: Some(target),
        }
    }

    /// Identity of the registration this handle controls.
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Remove the listener from its cell.
    ///
    /// Returns `true` if this call removed it. Later calls, calls after the
    /// cell was dropped, and calls on a detached handle return `false` and
    /// never touch any other listener.
    ///
    /// Called from a thread other than the one running a notification pass,
    /// this waits for that pass to finish.
    pub fn unsubscribe(&self) -> bool {
        match self.target.as_ref().and_then(Weak::upgrade) {
            Some(target) => target.revoke(self.id),
            None => false,
        }
    }

    /// Whether the listener is still registered.
    pub fn is_active(&self) -> bool {
        self.target
            .as_ref()
            .and_then(Weak::upgrade)
            .is_some_and(|target| target.holds(self.id))
    }

    /// Give up the ability to unsubscribe.
    ///
    /// The listener stays registered for the rest of the cell's lifetime,
    /// exactly like one added with `on_change`.
    pub fn detach(mut self) -> ListenerId {
        self.target = None;
        self.id
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(target) = self.target.take().and_then(|weak| weak.upgrade()) {
            target.revoke(self.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("detached", &self.target.is_none())
            .finish()
    }
}
