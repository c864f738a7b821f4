//! Example demonstrating permanent and revocable listeners.
//!
//! This example shows how to:
//! - Log every change of a cell with a revocable subscription
//! - Stop logging by unsubscribing
//! - Keep a permanent listener for the lifetime of the cell
//!
//! Run with: RUST_LOG=observable_cell=debug cargo run --example unsubscribe

use observable_cell::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Unsubscribe Example ===\n");

    let cell = ObservableCell::builder()
        .initial("count".to_string())
        .name("counter")
        .build()?;

    // Permanent listener: counts every notification, never removed.
    let notifications = Arc::new(AtomicUsize::new(0));
    let notifications_clone = Arc::clone(&notifications);
    cell.on_change(move |_, _| {
        notifications_clone.fetch_add(1, Ordering::SeqCst);
    });

    // Revocable logger; the initial call logs the current value twice.
    let unsubscribe = cell.subscribe(|new, old| {
        println!("New value:  {new}, Old value: {old}");
    });

    let mut count = 0;
    cell.set(count.to_string())?;
    count += 1;
    cell.set(count.to_string())?;
    count += 1;

    println!("\n--- Unsubscribing logger ---");
    unsubscribe.unsubscribe();

    cell.set(count.to_string())?; // won't log anything

    println!("\nFinal value: {}", cell.get());
    println!(
        "Permanent listener saw {} notification(s)",
        notifications.load(Ordering::SeqCst)
    );

    Ok(())
}
