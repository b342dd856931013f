use serde::Serialize;
use thiserror::Error;

/// Failure taxonomy of a dispatch optimization run.
///
/// Every variant carries the raw status or backend text so callers can report
/// why a configuration could not be optimized. No variant is ever downgraded
/// to a fallback schedule.
#[derive(Debug, Clone, Error, PartialEq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum DispatchError {
    /// Empty horizon or an input outside its documented domain.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The backend reported the problem as infeasible or unbounded.
    #[error("Infeasible problem: {0}")]
    Infeasible(String),

    /// The backend failed, panicked, or is not available in this build.
    #[error("Solver error: {0}")]
    Solver(String),

    /// The backend reported success but the values are missing or unusable.
    #[error("Numeric error: {0}")]
    Numeric(String),
}

impl DispatchError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Stable tag for logs and API payloads
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Infeasible(_) => "infeasible",
            Self::Solver(_) => "solver",
            Self::Numeric(_) => "numeric",
        }
    }
}

pub type DispatchResult<T> = Result<T, DispatchError>;
