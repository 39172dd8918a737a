//! Error taxonomy for the filing pipeline.

use std::path::PathBuf;

use crate::model::AnalysisKind;

/// Pipeline errors.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Filing or its Item 2 section could not be obtained.
    #[error("acquisition failed: {message}")]
    Acquisition { message: String },

    /// Generator model call failed or its output did not fit the report schema.
    #[error("{kind} generation failed: {message}")]
    Generation { kind: AnalysisKind, message: String },

    /// Judge model call failed or returned no JSON.
    #[error("{kind} judge failed: {message}")]
    Judge { kind: AnalysisKind, message: String },

    /// Judge outcome was not exactly `pass` or `fail`.
    #[error("{kind} schema violation: {detail}")]
    SchemaViolation { kind: AnalysisKind, detail: String },

    /// Report or filing cache could not be read or written.
    #[error("store error at {}: {message}", .path.display())]
    Store { path: PathBuf, message: String },

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// A kind's state machine received an event its current stage does not accept.
    #[error("{kind} pipeline error: {message}")]
    Transition { kind: AnalysisKind, message: String },

    /// Operator input closed or unreadable. Ends the run loop.
    #[error("operator input unavailable: {message}")]
    Operator { message: String },
}

impl PipelineError {
    pub fn acquisition(message: impl Into<String>) -> Self {
        Self::Acquisition {
            message: message.into(),
        }
    }

    pub fn operator(message: impl ToString) -> Self {
        Self::Operator {
            message: message.to_string(),
        }
    }

    pub fn store(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Store {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Whether the run loop must stop instead of starting another iteration.
    pub fn stops_run_loop(&self) -> bool {
        matches!(self, Self::Operator { .. })
    }

    /// Exit code for CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config { .. } | Self::Transition { .. } => 2,
            Self::Acquisition { .. } => 3,
            Self::Generation { .. } | Self::Judge { .. } => 4,
            Self::SchemaViolation { .. } => 5,
            Self::Store { .. } => 6,
            Self::Operator { .. } => 7,
        }
    }
}

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_the_taxonomy() {
        let schema = PipelineError::SchemaViolation {
            kind: AnalysisKind::Debt,
            detail: "maybe".into(),
        };
        let judge = PipelineError::Judge {
            kind: AnalysisKind::Debt,
            message: "timeout".into(),
        };
        assert_eq!(PipelineError::acquisition("no filing").exit_code(), 3);
        assert_eq!(judge.exit_code(), 4);
        assert_eq!(schema.exit_code(), 5);
        assert_eq!(PipelineError::store("/tmp/x", "denied").exit_code(), 6);
        assert!(!schema.stops_run_loop());
    }

    #[test]
    fn only_operator_errors_stop_the_loop() {
        assert!(PipelineError::operator("stdin closed").stops_run_loop());
        assert!(!PipelineError::acquisition("unknown ticker").stops_run_loop());
        assert_eq!(PipelineError::operator("eof").exit_code(), 7);
    }

    #[test]
    fn messages_name_the_kind() {
        let err = PipelineError::Judge {
            kind: AnalysisKind::Cashflow,
            message: "timeout".into(),
        };
        assert_eq!(err.to_string(), "cashflow judge failed: timeout");
    }
}
