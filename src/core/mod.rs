//! Core cell types.

mod builder;
mod cell;
mod policy;

#[cfg(feature = "validation")]
mod validation;

pub use builder::CellBuilder;
pub use cell::ObservableCell;
pub use policy::{FaultPolicy, same_arc};

#[cfg(feature = "validation")]
pub use validation::Validate;
