//! # observable-cell
//!
//! A value holder that synchronously notifies its listeners when it changes.
//!
//! ## Overview
//!
//! `observable-cell` provides [`ObservableCell<T>`](core::ObservableCell):
//! - Lock-free reads of the current value using `arc-swap`
//! - Idempotent sets: storing an equal value notifies nobody
//! - Listeners called in registration order with `(new, old)`
//! - An immediate initial callback on registration
//! - Permanent (`on_change`) and revocable (`subscribe`) listeners
//! - A defined order for sets made from inside listeners
//!
//! ## Quick Start
//!
//! ```rust
//! use observable_cell::prelude::*;
//!
//! # fn example() -> Result<()> {
//! let cell = ObservableCell::new(0);
//!
//! let subscription = cell.subscribe(|new, old| {
//!     println!("New value: {new}, Old value: {old}");
//! });
//!
//! cell.set(1)?; // logged
//! cell.set(1)?; // unchanged, not logged
//!
//! drop(subscription);
//! cell.set(2)?; // not logged
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! ## Feature Flags
//!
//! - `tracing` (default): debug/trace/warn events for registrations, skipped
//!   and queued sets, and listener faults
//! - `validation` (default): the [`Validate`](core::Validate) trait
//! - `metrics`: OpenTelemetry instruments via
//!   [`CellBuilder::with_metrics`](core::CellBuilder)

#![warn(missing_docs, rust_2024_compatibility)]
#![deny(unsafe_code)]

pub mod core;
pub mod error;
pub mod notify;

#[cfg(feature = "metrics")]
pub mod metrics;

/// Convenient re-exports for common usage patterns.
pub mod prelude {
    pub use crate::core::{CellBuilder, FaultPolicy, ObservableCell};
    pub use crate::error::{ObservableError, Result, ValidationError};
    pub use crate::notify::{ListenerId, Subscription};

    #[cfg(feature = "validation")]
    pub use crate::core::Validate;
}
