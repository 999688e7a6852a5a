use std::path::PathBuf;

/// Errors related to configuration loading and parsing.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error reading {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config at {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid config value for `{key}`: {message}")]
    Invalid { key: &'static str, message: String },
}

/// Errors raised while validating the trip form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TripError {
    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },
}

/// Errors from the hosted language model.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Missing API key: environment variable `{var}` is not set")]
    MissingCredentials { var: String },

    #[error("Model '{model}' request failed: {message}")]
    RequestFailed { model: String, message: String },
}

/// Errors raised by the crew runner and the per-task agent loop.
#[derive(Debug, thiserror::Error)]
pub enum CrewError {
    #[error("Invalid crew definition: {0}")]
    InvalidCrew(String),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("Task '{task}' produced an empty final answer")]
    EmptyOutput { task: String },

    #[error("Failed to write output of task '{task}' to {path}: {source}")]
    OutputWrite {
        task: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Run logging error: {0}")]
    LoggingError(String),
}

/// Top-level error for a single planning run.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error(transparent)]
    Trip(#[from] TripError),

    #[error(transparent)]
    Crew(#[from] CrewError),
}

impl PlanError {
    /// True when the run failed because the model provider key is missing.
    pub fn is_missing_credentials(&self) -> bool {
        matches!(
            self,
            PlanError::Crew(CrewError::Llm(LlmError::MissingCredentials { .. }))
        )
    }
}
