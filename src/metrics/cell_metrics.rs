//! Cell activity metrics using OpenTelemetry.

use opentelemetry::KeyValue;
use opentelemetry::metrics::{Counter, Gauge, Meter};
use std::sync::Arc;

/// Metrics collector for one observable cell.
///
/// Every instrument carries a `cell` attribute holding the cell's name.
///
/// # Examples
///
/// ```rust,no_run
/// use observable_cell::metrics::CellMetrics;
/// use opentelemetry::global;
///
/// let meter = global::meter("observable-cell");
/// let metrics = CellMetrics::new(meter, "volume");
///
/// metrics.record_change();
/// metrics.record_notifications(3);
/// ```
#[derive(Clone)]
pub struct CellMetrics {
    changes: Counter<u64>,
    skipped_sets: Counter<u64>,
    queued_sets: Counter<u64>,
    notifications: Counter<u64>,
    listener_faults: Counter<u64>,
    active_subscribers: Gauge<i64>,
    attributes: Arc<[KeyValue]>,
}

impl CellMetrics {
    /// Create a new metrics collector for the cell called `cell`.
    pub fn new(meter: Meter, cell: &str) -> Self {
        let changes = meter
            .u64_counter("observable_cell.changes")
            .with_description("Number of values stored by the cell")
            .build();

        let skipped_sets = meter
            .u64_counter("observable_cell.sets.skipped")
            .with_description("Number of sets ignored because the value was unchanged")
            .build();

        let queued_sets = meter
            .u64_counter("observable_cell.sets.queued")
            .with_description("Number of sets deferred until the running notification pass ended")
            .build();

        let notifications = meter
            .u64_counter("observable_cell.notifications")
            .with_description("Number of listener invocations for value changes")
            .build();

        let listener_faults = meter
            .u64_counter("observable_cell.listener.faults")
            .with_description("Number of listener invocations that panicked")
            .build();

        let active_subscribers = meter
            .i64_gauge("observable_cell.subscribers.active")
            .with_description("Number of registered listeners")
            .build();

        Self {
            changes,
            skipped_sets,
            queued_sets,
            notifications,
            listener_faults,
            active_subscribers,
            attributes: Arc::from(vec![KeyValue::new("cell", cell.to_string())]),
        }
    }

    /// Record a value actually stored by the cell.
    pub fn record_change(&self) {
        self.changes.add(1, &self.attributes);
    }

    /// Record a set that matched the current value.
    pub fn record_skipped_set(&self) {
        self.skipped_sets.add(1, &self.attributes);
    }

    /// Record a set queued behind a running notification pass.
    pub fn record_queued_set(&self) {
        self.queued_sets.add(1, &self.attributes);
    }

    /// Record `count` listener invocations for one pass.
    pub fn record_notifications(&self, count: u64) {
        self.notifications.add(count, &self.attributes);
    }

    /// Record a listener that panicked during notification.
    pub fn record_listener_fault(&self) {
        self.listener_faults.add(1, &self.attributes);
    }

    /// Update the number of registered listeners.
    pub fn update_subscriber_count(&self, count: i64) {
        self.active_subscribers.record(count, &self.attributes);
    }
}
