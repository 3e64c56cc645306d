//! Pipeline execution layer
//!
//! This module contains traits and implementations for executing pipelines.

mod local;
mod lock;
mod report;
mod runner;
mod shell;
mod traits;

pub use local::{ExecutorConfig, LocalExecutor};
pub use lock::{LOCK_FILE, RunLock};
pub use report::{PlannedStep, RunPlan, RunReport, RunStatus, StepRecord};
pub use runner::CommandRunner;
pub use shell::{ShellCommand, ShellConfig, ShellResult};
pub use traits::{HealthStatus, PipelineExecutor, Publisher, StepContext, StepRunner};
