//! Value validation support.

use crate::error::ValidationError;

/// Trait for values that can check their own invariants.
///
/// A cell built with [`CellBuilder::validated`](crate::core::CellBuilder::validated)
/// runs this before storing any new value; rejected values never reach the
/// listeners.
///
/// # Examples
///
/// ```rust
/// use observable_cell::core::Validate;
/// use observable_cell::error::ValidationError;
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct Volume {
///     level: u8,
/// }
///
/// impl Validate for Volume {
///     fn validate(&self) -> Result<(), ValidationError> {
///         if self.level > 100 {
///             return Err(ValidationError::invalid_field("level", "must be <= 100"));
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Validate {
    /// Validate the value.
    ///
    /// # Errors
    ///
    /// Should return a `ValidationError` describing what check failed.
    fn validate(&self) -> Result<(), ValidationError>;
}
