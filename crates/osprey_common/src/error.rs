use thiserror::Error;

/// Convenience alias for `Result<T, OspreyError>`.
pub type OspreyResult<T> = Result<T, OspreyError>;

/// Error classification for reporting decisions.
///
/// - `UserError`   — bad input: unknown setting value, malformed request
/// - `InternalBug` — should never happen; a planner invariant was violated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UserError,
    InternalBug,
}

/// Top-level error type that all crate-specific errors convert into.
#[derive(Error, Debug)]
pub enum OspreyError {
    #[error("Planner error: {0}")]
    Planner(#[from] PlannerError),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl OspreyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OspreyError::Planner(e) => e.kind(),
            OspreyError::Settings(_) => ErrorKind::UserError,
            OspreyError::Internal(_) => ErrorKind::InternalBug,
        }
    }
}

/// Plan-construction errors. All are surfaced synchronously at build time;
/// construction is pure and deterministic, so a retry would reproduce the
/// same error and none is attempted.
#[derive(Error, Debug)]
pub enum PlannerError {
    /// The session's shuffle-mode setting holds an unrecognized value.
    #[error("Unsupported configuration: {0}")]
    UnsupportedConfiguration(String),

    /// Malformed logical aggregation request (e.g. duplicate group-by columns).
    #[error("Invalid aggregation request: {0}")]
    InvalidAggregationRequest(String),

    /// A built tree violates a structural invariant. Fatal, never expected
    /// in correct operation.
    #[error("Inconsistent plan shape: {0}")]
    InconsistentPlanShape(String),
}

impl PlannerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PlannerError::UnsupportedConfiguration(_)
            | PlannerError::InvalidAggregationRequest(_) => ErrorKind::UserError,
            PlannerError::InconsistentPlanShape(_) => ErrorKind::InternalBug,
        }
    }
}

/// Session settings errors.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Unknown setting: {0}")]
    UnknownSetting(String),
}
