//! Error types for pipeline domain

use thiserror::Error;

/// Errors that can occur during pipeline operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// Validation failed with specified reason
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Command execution failed
    #[error("Command failed with exit code {code}: {stderr}")]
    CommandFailed {
        /// Exit code returned by the command.
        code: i32,
        /// Standard error output from the command (secrets masked).
        stderr: String,
    },

    /// A step referenced a secret that the store does not hold
    #[error("Secret '{name}' is not available")]
    MissingSecret {
        /// Name of the missing secret.
        name: String,
    },

    /// The provisioned runtime does not match the pinned version
    #[error("Runtime '{language}' reports version '{found}', expected '{expected}'")]
    RuntimeMismatch {
        /// Runtime executable.
        language: String,
        /// Pinned version.
        expected: String,
        /// Version reported by the runtime.
        found: String,
    },

    /// The directory to publish does not exist
    #[error("Build output directory not found: {0}")]
    BuildDirMissing(String),

    /// Another run holds the lock on the working directory
    #[error("Another run is in progress (lock file: {0})")]
    RunInProgress(String),

    /// The pipeline definition could not be read or parsed
    #[error("Invalid pipeline definition: {0}")]
    Definition(String),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_yaml::Error> for PipelineError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Definition(err.to_string())
    }
}

/// Validation errors for pipeline components
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Name cannot be empty
    #[error("Name cannot be empty")]
    EmptyName,

    /// Name too long
    #[error("Name too long: max {max} characters, got {len}")]
    NameTooLong {
        /// Maximum allowed length.
        max: usize,
        /// Actual length of the name.
        len: usize,
    },

    /// Two steps share a name
    #[error("Duplicate step name: '{0}'")]
    DuplicateStep(String),

    /// Invalid characters in name
    #[error("Invalid characters in name: '{name}'")]
    InvalidNameChars {
        /// The invalid name.
        name: String,
    },

    /// Pipeline must have at least one step
    #[error("Pipeline must have at least one step")]
    EmptyPipeline,

    /// Trigger must name at least one branch
    #[error("Push trigger must name at least one branch")]
    EmptyTrigger,

    /// Step is missing a required field
    #[error("Step '{step}': {reason}")]
    InvalidStep {
        /// Name of the offending step.
        step: String,
        /// What is wrong with it.
        reason: String,
    },
}
