//! Error types for the pong-sarsa crate

use thiserror::Error;

/// Main error type for the pong-sarsa crate
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("legal action set is empty")]
    EmptyActionSet,

    #[error("state feature '{feature}' enumerated no states")]
    EmptyStateEnumeration { feature: String },

    #[error("state feature '{feature}' enumerated value {value} more than once")]
    DuplicateState { feature: String, value: String },

    #[error("table shape mismatch: expected {expected:?}, got {actual:?} for {table}")]
    TableShapeMismatch {
        table: String,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("raw frame has shape {actual:?}, expected {expected:?}")]
    FrameShape {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("feature value {value} is outside the enumerated state domain of '{feature}'")]
    StateOutOfDomain { feature: String, value: String },

    #[error("action index {index} is out of range for {len} legal actions")]
    ActionOutOfRange { index: usize, len: usize },

    #[error("exactly one of episode count and frame budget must be set (episodes={episodes:?}, frames={frames:?})")]
    InvalidRunLength {
        episodes: Option<usize>,
        frames: Option<u64>,
    },

    #[error("invalid trace rule '{input}'. Expected one of: {expected}")]
    ParseTraceRule { input: String, expected: String },

    #[error("invalid state feature '{input}'. Expected one of: {expected}")]
    ParseFeatureKind { input: String, expected: String },

    #[error("invalid epsilon schedule '{input}': {reason}")]
    ParseSchedule { input: String, reason: String },

    #[error("failed to {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to {operation}: {message}")]
    SerializationContext { operation: String, message: String },

    #[error("progress bar template error: {message}")]
    ProgressBarTemplate { message: String },
}

impl Error {
    /// Whether the error belongs to the setup-time configuration family.
    ///
    /// These are raised before any learning happens and are never recovered.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::EmptyActionSet
                | Error::EmptyStateEnumeration { .. }
                | Error::DuplicateState { .. }
                | Error::TableShapeMismatch { .. }
                | Error::InvalidConfiguration { .. }
                | Error::FrameShape { .. }
                | Error::InvalidRunLength { .. }
                | Error::ParseTraceRule { .. }
                | Error::ParseFeatureKind { .. }
                | Error::ParseSchedule { .. }
        )
    }
}

/// Convenience type alias for Results using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::Io {
            operation: "IO operation".to_string(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_classification() {
        assert!(Error::EmptyActionSet.is_configuration());
        assert!(
            Error::TableShapeMismatch {
                table: "eligibility".to_string(),
                expected: (5, 2),
                actual: (5, 3),
            }
            .is_configuration()
        );
        assert!(
            !Error::StateOutOfDomain {
                feature: "relative-ball".to_string(),
                value: "400".to_string(),
            }
            .is_configuration()
        );
    }

    #[test]
    fn test_out_of_domain_message_names_value() {
        let err = Error::StateOutOfDomain {
            feature: "ball-intercept".to_string(),
            value: "-3".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("-3"));
        assert!(text.contains("ball-intercept"));
    }
}
