//! Built-in metrics for observable cells.
//!
//! Provides OpenTelemetry metrics tracking:
//! - Stored changes and idempotent (skipped) sets
//! - Sets queued while a notification pass was running
//! - Listener invocations and listener faults
//! - Active subscribers
//!
//! # Examples
//!
//! ```rust,no_run
//! use observable_cell::prelude::*;
//! use opentelemetry::global;
//!
//! # fn example() -> Result<()> {
//! let meter = global::meter("my-app");
//!
//! let cell = ObservableCell::builder()
//!     .initial(0_u32)
//!     .name("volume")
//!     .with_metrics(meter)
//!     .build()?;
//! # Ok(())
//! # }
//! ```

mod cell_metrics;

pub use cell_metrics::CellMetrics;
