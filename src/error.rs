//! Error types for observable-cell.

use std::fmt;

/// Result type alias for observable-cell operations.
pub type Result<T> = std::result::Result<T, ObservableError>;

/// Errors that can occur when building or updating an observable cell.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ObservableError {
    /// The builder was finished without an initial value.
    #[error("Observable cell requires an initial value")]
    MissingInitialValue,

    /// The builder has no equality contract for the value type.
    #[error("Observable cell requires an equality contract (call `compare_by`)")]
    MissingComparator,

    /// A validator rejected the new value; the cell was left unchanged.
    #[error("Value rejected by validator: {0}")]
    Validation(String),

    /// One or more listeners panicked while being notified.
    ///
    /// Only produced under [`FaultPolicy::Isolate`](crate::core::FaultPolicy::Isolate).
    #[error("{count} listener(s) panicked during notification; first: {first}")]
    ListenerFaults {
        /// Number of listener invocations that panicked
        count: usize,
        /// Panic message of the first fault
        first: String,
    },
}

/// Reason a validator refused a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Free-form rejection message.
    Custom(String),

    /// A specific field of the value is out of range.
    InvalidField {
        /// The field name/path
        field: String,
        /// Why the field was refused
        reason: String,
    },

    /// Several checks failed at once.
    Multiple(Vec<ValidationError>),
}

impl ValidationError {
    /// Create a custom validation error.
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }

    /// Create an invalid field error.
    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Custom(msg) => f.write_str(msg),
            Self::InvalidField { field, reason } => write!(f, "field '{field}' {reason}"),
            Self::Multiple(errors) => {
                let joined: Vec<String> = errors.iter().map(ToString::to_string).collect();
                write!(f, "{}", joined.join("; "))
            }
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<ValidationError> for ObservableError {
    fn from(err: ValidationError) -> Self {
        ObservableError::Validation(err.to_string())
    }
}
