//! Builder for constructing ObservableCell instances.

use crate::core::cell::{CellOptions, ObservableCell, Validator};
use crate::core::policy::{Comparator, FaultPolicy};
use crate::error::{ObservableError, Result, ValidationError};
use std::sync::Arc;

#[cfg(feature = "validation")]
use crate::core::Validate;

#[cfg(feature = "metrics")]
use crate::metrics::CellMetrics;

/// Builder for constructing an `ObservableCell` instance.
///
/// Provides a fluent interface for the settings a cell keeps for its whole
/// lifetime: initial value, equality contract, validation, fault policy and
/// observability.
///
/// # Examples
///
/// ```rust
/// use observable_cell::prelude::*;
///
/// # fn example() -> Result<()> {
/// let cell = ObservableCell::builder()
///     .initial(20_u8)
///     .name("volume")
///     .fault_policy(FaultPolicy::Isolate)
///     .validate_with(|level: &u8| {
///         if *level > 100 {
///             return Err(ValidationError::invalid_field("level", "must be <= 100"));
///         }
///         Ok(())
///     })
///     .build()?;
///
/// assert!(cell.set(120).is_err());
/// assert_eq!(*cell.get(), 20);
/// # Ok(())
/// # }
/// # example().unwrap();
/// ```
pub struct CellBuilder<T> {
    initial: Option<T>,
    comparator: Option<Comparator<T>>,
    validator: Option<Validator<T>>,
    fault_policy: FaultPolicy,
    name: Option<String>,
    #[cfg(feature = "metrics")]
    meter: Option<opentelemetry::metrics::Meter>,
}

impl<T: Send + Sync + 'static> CellBuilder<T> {
    /// Create a builder with no initial value and no equality contract.
    ///
    /// Use this for value types without `PartialEq` and supply
    /// [`compare_by`](Self::compare_by); otherwise prefer
    /// [`ObservableCell::builder`].
    pub fn new() -> Self {
        Self {
            initial: None,
            comparator: None,
            validator: None,
            fault_policy: FaultPolicy::default(),
            name: None,
            #[cfg(feature = "metrics")]
            meter: None,
        }
    }

    pub(crate) fn with_comparator(mut self, comparator: Comparator<T>) -> Self {
        self.comparator = Some(comparator);
        self
    }

    /// Set the initial value. Required.
    pub fn initial(mut self, value: T) -> Self {
        self.initial = Some(value);
        self
    }

    /// Decide when a `set` counts as a change.
    ///
    /// `equal(current, candidate)` returning `true` makes the set a no-op.
    /// Use [`same_arc`](crate::core::same_arc) for identity semantics on
    /// `Arc` values.
    pub fn compare_by<F>(self, equal: F) -> Self
    where
        F: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        self.with_comparator(Arc::new(equal))
    }

    /// Choose how listener panics are handled. Defaults to
    /// [`FaultPolicy::Propagate`].
    pub fn fault_policy(mut self, policy: FaultPolicy) -> Self {
        self.fault_policy = policy;
        self
    }

    /// Label the cell in log fields and metric attributes.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Reject values before they are stored.
    ///
    /// Replaces any previously configured validator. The initial value is
    /// checked too when the cell is built.
    pub fn validate_with<F>(mut self, validator: F) -> Self
    where
        F: Fn(&T) -> std::result::Result<(), ValidationError> + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Validate values with their [`Validate`] implementation.
    #[cfg(feature = "validation")]
    pub fn validated(self) -> Self
    where
        T: Validate,
    {
        self.validate_with(|value: &T| value.validate())
    }

    /// Record cell activity with OpenTelemetry.
    #[cfg(feature = "metrics")]
    pub fn with_metrics(mut self, meter: opentelemetry::metrics::Meter) -> Self {
        self.meter = Some(meter);
        self
    }

    /// Build the cell.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No initial value was given ([`ObservableError::MissingInitialValue`])
    /// - No equality contract is known ([`ObservableError::MissingComparator`])
    /// - The validator rejects the initial value
    pub fn build(self) -> Result<ObservableCell<T>> {
        let initial = self.initial.ok_or(ObservableError::MissingInitialValue)?;
        let comparator = self.comparator.ok_or(ObservableError::MissingComparator)?;

        if let Some(validator) = &self.validator {
            validator(&initial)?;
        }

        let name = self
            .name
            .unwrap_or_else(|| CellOptions::<T>::DEFAULT_NAME.to_string());

        #[cfg(feature = "metrics")]
        let metrics = self.meter.map(|meter| CellMetrics::new(meter, &name));

        let options = CellOptions {
            name,
            comparator,
            validator: self.validator,
            fault_policy: self.fault_policy,
            #[cfg(feature = "metrics")]
            metrics,
        };

        Ok(ObservableCell::with_options(initial, options))
    }
}

impl<T: Send + Sync + 'static> Default for CellBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_requires_initial_value() {
        let result = ObservableCell::<i32>::builder().build();
        assert_eq!(result.err(), Some(ObservableError::MissingInitialValue));
    }

    #[test]
    fn test_build_requires_comparator_without_partial_eq() {
        struct Opaque;

        let result = CellBuilder::new().initial(Opaque).build();
        assert_eq!(result.err(), Some(ObservableError::MissingComparator));

        let cell = CellBuilder::new()
            .initial(Opaque)
            .compare_by(|_: &Opaque, _: &Opaque| false)
            .build()
            .unwrap();
        assert_eq!(cell.version(), 0);
    }

    #[test]
    fn test_build_applies_settings() {
        let cell = ObservableCell::builder()
            .initial(1)
            .name("counter")
            .fault_policy(FaultPolicy::Isolate)
            .build()
            .unwrap();

        assert_eq!(cell.name(), "counter");
        assert_eq!(cell.fault_policy(), FaultPolicy::Isolate);
        assert_eq!(*cell.get(), 1);
    }

    #[test]
    fn test_build_validates_initial_value() {
        let result = ObservableCell::builder()
            .initial(-1)
            .validate_with(|value: &i32| {
                if *value < 0 {
                    Err(ValidationError::custom("negative"))
                } else {
                    Ok(())
                }
            })
            .build();

        assert_eq!(
            result.err(),
            Some(ObservableError::Validation("negative".to_string()))
        );
    }

    #[test]
    fn test_compare_by_overrides_partial_eq() {
        // Case-insensitive contract: "A" and "a" are the same value.
        let cell = ObservableCell::builder()
            .initial("a".to_string())
            .compare_by(|current: &String, candidate: &String| {
                current.eq_ignore_ascii_case(candidate)
            })
            .build()
            .unwrap();

        cell.set("A".to_string()).unwrap();
        assert_eq!(cell.version(), 0);
        assert_eq!(*cell.get(), "a");
    }

    #[cfg(feature = "validation")]
    #[test]
    fn test_validated_uses_trait() {
        #[derive(Debug, PartialEq)]
        struct Percent(u8);

        impl Validate for Percent {
            fn validate(&self) -> std::result::Result<(), ValidationError> {
                if self.0 > 100 {
                    return Err(ValidationError::invalid_field("percent", "must be <= 100"));
                }
                Ok(())
            }
        }

        let cell = ObservableCell::builder()
            .initial(Percent(50))
            .validated()
            .build()
            .unwrap();

        assert_eq!(
            cell.set(Percent(150)),
            Err(ObservableError::Validation(
                "field 'percent' must be <= 100".to_string()
            ))
        );
        assert_eq!(cell.get().0, 50);
    }

    #[cfg(feature = "metrics")]
    #[test]
    fn test_build_with_metrics() {
        let cell = ObservableCell::builder()
            .initial(0)
            .name("metered")
            .with_metrics(opentelemetry::global::meter("test"))
            .build()
            .unwrap();

        cell.on_change(|_, _| {});
        cell.set(1).unwrap();
        cell.set(1).unwrap();
        assert_eq!(cell.version(), 1);
    }
}
