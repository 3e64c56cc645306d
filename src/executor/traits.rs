//! Pipeline execution traits
//!
//! This module defines traits and interfaces for pipeline execution.
//! [`StepRunner`] and [`Publisher`] are the seams where the opaque external
//! tools are invoked.

use super::report::{RunPlan, RunReport};
use crate::pipeline::{
    DeployConfig, Pipeline, PipelineError, PushEvent, SecretMask, Step, StepResult,
    ValidationError,
};
use std::collections::HashMap;
use std::path::PathBuf;

/// Trait for executing pipelines
#[allow(clippy::missing_errors_doc)]
pub trait PipelineExecutor: Send + Sync {
    /// Evaluates the trigger and, if it matches, runs the steps in order
    ///
    /// Step failures are recorded in the report; an `Err` means the run
    /// could not start at all.
    fn execute(&self, pipeline: &Pipeline, event: &PushEvent)
    -> Result<RunReport, PipelineError>;

    /// Validates a pipeline without executing it
    fn validate(&self, pipeline: &Pipeline) -> Result<(), ValidationError>;

    /// Describes what a run would do, without side effects
    fn dry_run(&self, pipeline: &Pipeline, event: &PushEvent) -> Result<RunPlan, PipelineError>;

    /// Performs a health check
    fn health_check(&self) -> HealthStatus;
}

/// Runs the external command behind a single step
pub trait StepRunner: Send + Sync {
    /// Runs the step to completion; `Ok` means exit code zero
    #[allow(clippy::missing_errors_doc)]
    fn run(&self, step: &Step, context: &StepContext) -> StepResult;
}

/// Publishes a build directory to a hosting branch
pub trait Publisher: Send + Sync {
    /// Publishes according to `config`, authenticating from the step's env
    #[allow(clippy::missing_errors_doc)]
    fn publish(&self, config: &DeployConfig, context: &StepContext) -> StepResult;
}

/// Health status of an executor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Executor is healthy
    Healthy,

    /// Executor is degraded (some features unavailable)
    Degraded {
        /// Reason for degradation
        reason: String,
    },

    /// Executor is unhealthy
    Unhealthy {
        /// Reason for being unhealthy
        reason: String,
    },
}

impl HealthStatus {
    /// Returns true if executor is healthy or degraded
    #[must_use]
    pub fn is_operational(&self) -> bool {
        !matches!(self, Self::Unhealthy { .. })
    }
}

/// Everything a single step sees while it runs
#[derive(Debug, Clone)]
pub struct StepContext {
    /// Identifier of the run this step belongs to
    pub run_id: String,

    /// The event that triggered the run
    pub event: PushEvent,

    /// Working directory (the checked-out source tree)
    pub cwd: PathBuf,

    /// Complete environment of the step, declared secrets included
    pub env: HashMap<String, String>,

    /// Shell used to run commands
    pub shell: String,

    /// Echo command output while it runs
    pub streaming: bool,

    /// Masks every secret known to the run
    pub mask: SecretMask,
}

impl StepContext {
    /// Gets an environment variable
    #[must_use]
    pub fn get_env(&self, key: &str) -> Option<&String> {
        self.env.get(key)
    }

    /// Shell configuration matching this context
    #[must_use]
    pub fn shell_config(&self) -> super::ShellConfig {
        super::ShellConfig {
            cwd: self.cwd.clone(),
            env: self.env.clone(),
            shell: self.shell.clone(),
            streaming: self.streaming,
            mask: self.mask.clone(),
        }
    }
}
