//! The observable cell: a value plus its ordered change listeners.

use crate::core::builder::CellBuilder;
use crate::core::policy::{Comparator, FaultPolicy, panic_message, structural};
use crate::error::{ObservableError, Result, ValidationError};
use crate::notify::{Listener, ListenerId, ListenerRegistry, Revoke, Subscription};
use arc_swap::ArcSwap;
use parking_lot::{Mutex, ReentrantMutex};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

#[cfg(feature = "metrics")]
use crate::metrics::CellMetrics;

/// Type alias for validator functions.
pub(crate) type Validator<T> =
    Arc<dyn Fn(&T) -> std::result::Result<(), ValidationError> + Send + Sync>;

/// Settings fixed at construction time.
pub(crate) struct CellOptions<T> {
    pub(crate) name: String,
    pub(crate) comparator: Comparator<T>,
    pub(crate) validator: Option<Validator<T>>,
    pub(crate) fault_policy: FaultPolicy,
    #[cfg(feature = "metrics")]
    pub(crate) metrics: Option<CellMetrics>,
}

impl<T> CellOptions<T> {
    pub(crate) const DEFAULT_NAME: &'static str = "observable";

    fn with_comparator(comparator: Comparator<T>) -> Self {
        Self {
            name: Self::DEFAULT_NAME.to_string(),
            comparator,
            validator: None,
            fault_policy: FaultPolicy::default(),
            #[cfg(feature = "metrics")]
            metrics: None,
        }
    }
}

/// A value holder that synchronously notifies listeners when it changes.
///
/// Listeners are called as `listener(&new, &old)` in the order they were
/// registered, and once more right away when they register (with
/// `new == old == current`), so "subscribed" and "changed" can be handled by
/// the same code.
///
/// Cloning an `ObservableCell` yields another handle to the same value and
/// the same listeners.
///
/// # Notification rules
///
/// - Setting a value equal to the current one (per the cell's equality
///   contract) does nothing.
/// - Each stored value gets one pass over a snapshot of the listeners taken
///   when it was stored. Listeners removed during the pass are still called
///   in that pass; listeners added during the pass are not.
/// - A `set` made by a listener while its pass is running is queued and
///   returns immediately. Queued values are applied in order once the
///   running pass finishes, each checked against the then-current value.
/// - Passes, registrations and unsubscribes are serialized per cell. A `set`,
///   `on_change`, `subscribe` or unsubscribe from another thread waits until
///   the running pass (queued values included) has finished.
/// - Reads through [`get`](Self::get) are lock-free and never block on
///   listeners.
///
/// # Examples
///
/// ```rust
/// use observable_cell::prelude::*;
/// use std::sync::{Arc, Mutex};
///
/// let cell = ObservableCell::new(0);
/// let log = Arc::new(Mutex::new(Vec::new()));
///
/// let sink = Arc::clone(&log);
/// let subscription = cell.subscribe(move |new, old| sink.lock().unwrap().push((*new, *old)));
/// assert_eq!(*log.lock().unwrap(), vec![(0, 0)]);
///
/// cell.set(1)?;
/// cell.set(1)?; // unchanged, nobody is notified
/// assert_eq!(*log.lock().unwrap(), vec![(0, 0), (1, 0)]);
///
/// subscription.unsubscribe();
/// cell.set(2)?;
/// assert_eq!(*log.lock().unwrap(), vec![(0, 0), (1, 0)]);
/// # Ok::<(), ObservableError>(())
/// ```
pub struct ObservableCell<T> {
    shared: Arc<Shared<T>>,
}

struct Shared<T> {
    /// Current value; swapped atomically so readers never see a partial write
    current: ArcSwap<T>,
    /// Held by the thread running a pass or an initial callback; re-entered
    /// by that thread's listeners
    gate: ReentrantMutex<()>,
    /// Listener sequence and pass bookkeeping
    registry: Mutex<ListenerRegistry<T>>,
    /// Number of values stored since construction
    version: AtomicU64,
    options: CellOptions<T>,
}

/// One stored value waiting to be announced.
struct Pass<T> {
    new: Arc<T>,
    old: Arc<T>,
    listeners: Vec<Listener<T>>,
}

#[cfg_attr(not(feature = "metrics"), allow(dead_code))]
enum CellEvent {
    Changed,
    Skipped,
    Queued,
    Delivered(usize),
    Fault,
    Subscribers(usize),
}

impl<T: PartialEq + Send + Sync + 'static> ObservableCell<T> {
    /// Create a cell holding `initial`, compared with `PartialEq`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use observable_cell::prelude::*;
    ///
    /// let cell = ObservableCell::new("ready".to_string());
    /// assert_eq!(*cell.get(), "ready");
    /// assert_eq!(cell.subscriber_count(), 0);
    /// ```
    pub fn new(initial: T) -> Self {
        Self::with_options(initial, CellOptions::with_comparator(structural()))
    }

    /// Start building a cell with custom settings.
    ///
    /// The builder starts out with `PartialEq` as the equality contract.
    pub fn builder() -> CellBuilder<T> {
        CellBuilder::new().with_comparator(structural())
    }
}

impl<T: Send + Sync + 'static> ObservableCell<T> {
    pub(crate) fn with_options(initial: T, options: CellOptions<T>) -> Self {
        let shared = Shared {
            current: ArcSwap::from_pointee(initial),
            gate: ReentrantMutex::new(()),
            registry: Mutex::new(ListenerRegistry::new()),
            version: AtomicU64::new(0),
            options,
        };
        Self {
            shared: Arc::new(shared),
        }
    }

    /// Get a reference-counted handle to the current value.
    ///
    /// Lock-free; safe to call from inside a listener.
    pub fn get(&self) -> Arc<T> {
        self.shared.current.load_full()
    }

    /// Number of values stored since construction.
    ///
    /// Unchanged sets and rejected values do not count. The counter is bumped
    /// just before the value is swapped in, so while a store is in flight a
    /// concurrent reader may see the new version next to the old value. Read
    /// both from a listener to get a consistent pair.
    pub fn version(&self) -> u64 {
        self.shared.version.load(Ordering::Acquire)
    }

    /// Number of registered listeners.
    pub fn subscriber_count(&self) -> usize {
        self.shared.registry.lock().len()
    }

    /// Label used in log fields and metric attributes.
    pub fn name(&self) -> &str {
        &self.shared.options.name
    }

    /// How listener panics are handled.
    pub fn fault_policy(&self) -> FaultPolicy {
        self.shared.options.fault_policy
    }

    /// Set a new value and notify every listener if it differs from the
    /// current one.
    ///
    /// Returns after all listeners have run, including the passes for any
    /// values queued by listeners in the meantime. When called by a listener
    /// during a pass, the value is queued and this returns at once. When
    /// another thread's pass is running, this blocks until that pass is over
    /// and then sets the value normally.
    ///
    /// # Errors
    ///
    /// - [`ObservableError::Validation`] if a validator rejects the value; the
    ///   cell is left untouched.
    /// - [`ObservableError::ListenerFaults`] under [`FaultPolicy::Isolate`] if
    ///   any listener panicked. The value is stored and every other listener
    ///   has run.
    ///
    /// # Panics
    ///
    /// Under [`FaultPolicy::Propagate`], a panicking listener's panic
    /// unwinds out of this call. The value stays stored and the cell remains
    /// usable.
    pub fn set(&self, value: T) -> Result<()> {
        if let Some(validator) = &self.shared.options.validator {
            validator(&value)?;
        }

        let _gate = self.shared.gate.lock();
        let mut registry = self.shared.registry.lock();
        // Only this thread can be notifying while it holds the gate.
        if registry.is_notifying() {
            registry.enqueue(value);
            drop(registry);
            #[cfg(feature = "tracing")]
            tracing::trace!(cell = %self.name(), "set queued behind running notification pass");
            self.shared.emit(CellEvent::Queued);
            return Ok(());
        }

        if self.shared.is_current(&value) {
            drop(registry);
            #[cfg(feature = "tracing")]
            tracing::trace!(cell = %self.name(), "set ignored, value unchanged");
            self.shared.emit(CellEvent::Skipped);
            return Ok(());
        }

        registry.begin_pass();
        let pass = self.shared.store(&registry, value);
        drop(registry);

        let mut guard = PassGuard {
            shared: &self.shared,
            armed: true,
        };
        let mut faults = Faults::default();
        let mut next = Some(pass);
        while let Some(pass) = next {
            self.shared.deliver(pass, &mut faults);
            next = self.shared.next_pass();
        }
        guard.armed = false;

        faults.into_result()
    }

    /// Register a listener for the lifetime of the cell.
    ///
    /// The listener is appended to the notification order and immediately
    /// called once with the current value as both arguments. That initial
    /// call always comes first: a `set` from another thread waits until it
    /// has returned. There is no way to remove it; use
    /// [`subscribe`](Self::subscribe) when the listener should not live as
    /// long as the cell.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use observable_cell::prelude::*;
    ///
    /// let cell = ObservableCell::new(1);
    /// cell.on_change(|new, old| println!("{old} -> {new}"));
    /// assert_eq!(cell.subscriber_count(), 1);
    /// ```
    pub fn on_change<F>(&self, listener: F)
    where
        F: Fn(&T, &T) + Send + Sync + 'static,
    {
        let listener: Listener<T> = Arc::new(listener);
        let _gate = self.shared.gate.lock();
        let (_, current) = self.shared.register(Arc::clone(&listener));
        listener(&current, &current);
    }

    /// Register a listener that can be removed again.
    ///
    /// Behaves like [`on_change`](Self::on_change), including the immediate
    /// initial call, but returns a [`Subscription`] that removes exactly this
    /// registration when unsubscribed or dropped.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&T, &T) + Send + Sync + 'static,
    {
        let listener: Listener<T> = Arc::new(listener);
        let _gate = self.shared.gate.lock();
        let (id, current) = self.shared.register(Arc::clone(&listener));
        let weak: Weak<Shared<T>> = Arc::downgrade(&self.shared);
        let target: Weak<dyn Revoke> = weak;
        // Created before the initial call so a panic there revokes the entry.
        let subscription = Subscription::new(id, target);
        listener(&current, &current);
        subscription
    }
}

impl<T: Send + Sync + 'static> Shared<T> {
    fn is_current(&self, candidate: &T) -> bool {
        let current = self.current.load();
        (self.options.comparator)(&**current, candidate)
    }

    /// Append a listener and read the value its initial call should see.
    /// Caller holds the gate.
    fn register(&self, listener: Listener<T>) -> (ListenerId, Arc<T>) {
        let (id, count, current) = {
            let mut registry = self.registry.lock();
            let id = registry.register(listener);
            (id, registry.len(), self.current.load_full())
        };
        #[cfg(feature = "tracing")]
        tracing::debug!(cell = %self.options.name, listener = %id, "listener registered");
        self.emit(CellEvent::Subscribers(count));
        (id, current)
    }

    /// Swap in a new value. Caller holds the gate and the registry lock.
    fn store(&self, registry: &ListenerRegistry<T>, value: T) -> Pass<T> {
        let new = Arc::new(value);
        self.version.fetch_add(1, Ordering::AcqRel);
        let old = self.current.swap(Arc::clone(&new));
        self.emit(CellEvent::Changed);
        Pass {
            new,
            old,
            listeners: registry.snapshot(),
        }
    }

    fn deliver(&self, pass: Pass<T>, faults: &mut Faults) {
        let Pass {
            new,
            old,
            listeners,
        } = pass;

        for listener in &listeners {
            match self.options.fault_policy {
                FaultPolicy::Propagate => listener(&new, &old),
                FaultPolicy::Isolate => {
                    let outcome = panic::catch_unwind(AssertUnwindSafe(|| listener(&new, &old)));
                    if let Err(payload) = outcome {
                        let message = panic_message(payload.as_ref());
                        #[cfg(feature = "tracing")]
                        tracing::warn!(
                            cell = %self.options.name,
                            error = %message,
                            "listener panicked, notifying remaining listeners"
                        );
                        self.emit(CellEvent::Fault);
                        faults.record(message);
                    }
                }
            }
        }
        self.emit(CellEvent::Delivered(listeners.len()));
    }

    /// Pop queued values until one differs from the current value.
    ///
    /// Ends the pass when the queue is empty.
    fn next_pass(&self) -> Option<Pass<T>> {
        loop {
            let value = {
                let mut registry = self.registry.lock();
                match registry.dequeue() {
                    Some(value) => value,
                    None => {
                        registry.end_pass();
                        return None;
                    }
                }
            };

            // The gate keeps other threads from storing, so comparing
            // without the registry lock cannot race with another store.
            if self.is_current(&value) {
                self.emit(CellEvent::Skipped);
                continue;
            }

            let registry = self.registry.lock();
            return Some(self.store(&registry, value));
        }
    }

    #[cfg(feature = "metrics")]
    fn emit(&self, event: CellEvent) {
        let Some(metrics) = &self.options.metrics else {
            return;
        };
        match event {
            CellEvent::Changed => metrics.record_change(),
            CellEvent::Skipped => metrics.record_skipped_set(),
            CellEvent::Queued => metrics.record_queued_set(),
            CellEvent::Delivered(count) => metrics.record_notifications(count as u64),
            CellEvent::Fault => metrics.record_listener_fault(),
            CellEvent::Subscribers(count) => metrics.update_subscriber_count(count as i64),
        }
    }

    #[cfg(not(feature = "metrics"))]
    fn emit(&self, _event: CellEvent) {}
}

impl<T: Send + Sync + 'static> Revoke for Shared<T> {
    fn revoke(&self, id: ListenerId) -> bool {
        let _gate = self.gate.lock();
        let (removed, count) = {
            let mut registry = self.registry.lock();
            (registry.remove(id), registry.len())
        };
        let Some(_listener) = removed else {
            return false;
        };
        #[cfg(feature = "tracing")]
        tracing::debug!(cell = %self.options.name, listener = %id, "listener unsubscribed");
        self.emit(CellEvent::Subscribers(count));
        true
    }

    fn holds(&self, id: ListenerId) -> bool {
        self.registry.lock().contains(id)
    }
}

/// Ends the pass if a listener unwinds out of `set`.
struct PassGuard<'a, T> {
    shared: &'a Shared<T>,
    armed: bool,
}

impl<T> Drop for PassGuard<'_, T> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let discarded = {
            let mut registry = self.shared.registry.lock();
            registry.end_pass();
            registry.take_pending()
        };
        #[cfg(feature = "tracing")]
        if !discarded.is_empty() {
            tracing::warn!(
                cell = %self.shared.options.name,
                discarded = discarded.len(),
                "listener panicked, dropping queued values"
            );
        }
        drop(discarded);
    }
}

/// Listener panics caught under [`FaultPolicy::Isolate`].
#[derive(Default)]
struct Faults {
    count: usize,
    first: Option<String>,
}

impl Faults {
    fn record(&mut self, message: String) {
        self.count += 1;
        self.first.get_or_insert(message);
    }

    fn into_result(self) -> Result<()> {
        match self.first {
            None => Ok(()),
            Some(first) => Err(ObservableError::ListenerFaults {
                count: self.count,
                first,
            }),
        }
    }
}

impl<T> Clone for ObservableCell<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ObservableCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableCell")
            .field("name", &self.shared.options.name)
            .field("value", &**self.shared.current.load())
            .field("version", &self.shared.version.load(Ordering::Acquire))
            .field("subscribers", &self.shared.registry.lock().len())
            .finish()
    }
}
