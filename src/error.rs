//! Error types for lap-time modelling and strategy simulation.
//!
//! Row-level defects in historical telemetry are reported as
//! [`StrategyError::MalformedLapRecord`] by the per-row conversion and then
//! dropped by feature preparation. Compound and data-sufficiency errors are
//! surfaced to the caller unchanged.

use thiserror::Error;

/// Result type alias for strategy operations.
pub type Result<T, E = StrategyError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum StrategyError {
    #[error("unknown tyre compound '{value}' (expected Soft, Medium or Hard)")]
    InvalidCompound { value: String },

    #[error("not enough usable laps to train: found {found}, need at least {required}")]
    InsufficientData { found: usize, required: usize },

    #[error("malformed lap record: {reason}")]
    MalformedLapRecord { reason: String },

    #[error("failed to read lap CSV")]
    Csv(#[from] csv::Error),

    #[error("I/O error")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration")]
    Config(#[from] serde_json::Error),

    #[error("invalid configuration value for `{field}`: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("feature table shape error")]
    Shape(#[from] ndarray::ShapeError),

    #[error(transparent)]
    Linfa(#[from] linfa::Error),

    #[error(transparent)]
    LinearFit(#[from] linfa_linear::LinearError<f64>),
}

impl StrategyError {
    pub fn invalid_compound(value: impl Into<String>) -> Self {
        StrategyError::InvalidCompound { value: value.into() }
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        StrategyError::MalformedLapRecord { reason: reason.into() }
    }

    pub fn invalid_config(field: &'static str, reason: impl Into<String>) -> Self {
        StrategyError::InvalidConfig { field, reason: reason.into() }
    }

    /// Only I/O failures can succeed on retry; everything else is a property of
    /// the input and fails the same way again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StrategyError::Io(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_context() {
        let err = StrategyError::invalid_compound("Wet");
        assert!(err.to_string().contains("Wet"));

        let err = StrategyError::InsufficientData { found: 3, required: 10 };
        let msg = err.to_string();
        assert!(msg.contains('3'));
        assert!(msg.contains("10"));

        let err = StrategyError::invalid_config("model.test_ratio", "must be in (0, 1), got 1.5");
        let msg = err.to_string();
        assert!(msg.contains("model.test_ratio"));
        assert!(msg.contains("1.5"));
    }

    #[test]
    fn only_io_is_retryable() {
        assert!(!StrategyError::invalid_compound("X").is_retryable());
        assert!(!StrategyError::InsufficientData { found: 0, required: 10 }.is_retryable());
        assert!(!StrategyError::malformed("no lap number").is_retryable());
        assert!(!StrategyError::invalid_config("simulation.race_laps", "zero").is_retryable());

        let io = std::io::Error::new(std::io::ErrorKind::Interrupted, "again");
        assert!(StrategyError::from(io).is_retryable());
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync_static<T: Send + Sync + 'static>() {}
        assert_send_sync_static::<StrategyError>();
    }
}
