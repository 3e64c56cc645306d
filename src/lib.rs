//! # relnotes - release-notes documentation pipeline
//!
//! relnotes runs the pipeline that keeps a project's published release
//! notes current. On a push to `main` it checks out the pushed commit,
//! verifies the pinned Python runtime, installs dependencies, generates a
//! changelog entry for the latest commit, builds the HTML documentation and
//! publishes `build/html` to the `gh-pages` branch.
//!
//! ## Quick Start
//!
//! ```no_run
//! use relnotes::prelude::*;
//!
//! let pipeline = Pipeline::release_notes();
//! let secrets = SecretStore::from_env(pipeline.secret_names());
//! let report = LocalExecutor::new()
//!     .with_secrets(secrets)
//!     .execute(&pipeline, &PushEvent::branch("main"))?;
//! println!("{}", report.summary());
//! # Ok::<(), relnotes::pipeline::PipelineError>(())
//! ```
//!
//! ## Features
//!
//! - **Strict ordering**: steps run one at a time; a failure skips every
//!   later step unless it is gated `always` or `failure`
//! - **Scoped secrets**: a secret reaches only the step that declares it and
//!   is masked in captured output
//! - **Definitions**: pipelines load from `relnotes.yml` or use the built-in
//!   release-notes pipeline
//! - **Export**: pipelines translate to GitHub Actions workflows

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod executor;
pub mod infrastructure;
pub mod pipeline;

// Prelude module for common imports
pub mod prelude;

// Re-export commonly used types
pub use executor::{
    CommandRunner, HealthStatus, LocalExecutor, PipelineExecutor, RunPlan, RunReport, RunStatus,
    ShellCommand, ShellConfig, ShellResult, StepContext, StepRunner,
};
pub use infrastructure::{Config, GitHubActionsBackend, GitPagesPublisher};
pub use pipeline::{
    DeployConfig, Environment, Pipeline, PipelineBuilder, PipelineError, PushEvent, RunCondition,
    SecretStore, Step, StepKind, StepOutcome, Trigger, Validate,
};

/// Version of the relnotes crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
