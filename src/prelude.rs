//! Prelude module for common imports

// Re-export all pipeline types with full paths
pub use crate::pipeline::condition::RunCondition;
pub use crate::pipeline::errors::{PipelineError, ValidationError};
pub use crate::pipeline::pipeline_def::{Pipeline, PipelineBuilder};
pub use crate::pipeline::secrets::{EnvValue, SecretStore};
pub use crate::pipeline::steps::{DeployConfig, Step, StepKind};
pub use crate::pipeline::trigger::{PushEvent, Trigger};
pub use crate::pipeline::types::{StepOutcome, StepResult, Validate};
pub use crate::pipeline::Environment;

// Re-export executor types
pub use crate::executor::{
    ExecutorConfig, HealthStatus, LocalExecutor, PipelineExecutor, RunReport, RunStatus,
    StepContext, StepRunner,
};
