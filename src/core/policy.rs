//! Equality contract and listener fault handling for cells.

use std::fmt;
use std::sync::Arc;

/// Equality check deciding whether a `set` is a change.
pub(crate) type Comparator<T> = Arc<dyn Fn(&T, &T) -> bool + Send + Sync>;

/// Structural equality through `PartialEq`; the default contract.
pub(crate) fn structural<T: PartialEq + 'static>() -> Comparator<T> {
    Arc::new(|current: &T, candidate: &T| current == candidate)
}

/// Identity comparison for reference-counted values.
///
/// Two `Arc`s are equal only when they point at the same allocation, so a
/// freshly built value with identical contents still counts as a change.
///
/// # Examples
///
/// ```rust
/// use observable_cell::core::same_arc;
/// use observable_cell::prelude::*;
/// use std::sync::Arc;
///
/// let first = Arc::new(vec![1, 2, 3]);
/// let cell = ObservableCell::builder()
///     .initial(Arc::clone(&first))
///     .compare_by(same_arc)
///     .build()
///     .unwrap();
///
/// cell.set(Arc::clone(&first)).unwrap();
/// assert_eq!(cell.version(), 0);
///
/// cell.set(Arc::new(vec![1, 2, 3])).unwrap();
/// assert_eq!(cell.version(), 1);
/// ```
pub fn same_arc<U: ?Sized>(current: &Arc<U>, candidate: &Arc<U>) -> bool {
    Arc::ptr_eq(current, candidate)
}

/// What a cell does when a listener panics during notification.
///
/// The initial callback made by `on_change` / `subscribe` is not covered: a
/// panic there always reaches the subscribing caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FaultPolicy {
    /// Let the panic unwind out of `set`.
    ///
    /// Listeners after the faulting one are skipped for that pass, the new
    /// value stays stored, and values queued by re-entrant sets are dropped.
    #[default]
    Propagate,

    /// Catch the panic, keep notifying the remaining listeners, and report
    /// the faults from `set` as [`ObservableError::ListenerFaults`](crate::error::ObservableError::ListenerFaults).
    Isolate,
}

impl fmt::Display for FaultPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Propagate => f.write_str("propagate"),
            Self::Isolate => f.write_str("isolate"),
        }
    }
}

/// Best-effort text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
