//! `relnotes run` and `relnotes plan`
//!
//! ## Usage
//!
//! ```bash
//! relnotes run --branch main --sha "$(git rev-parse HEAD)"
//! relnotes plan --ref refs/heads/main --json
//! ```
//!
//! A push to a branch outside the trigger is not an error: the run reports
//! `NOT TRIGGERED` and exits 0. A failed step exits 1 after the report.

use anyhow::{Context, Result};
use relnotes::executor::{PipelineExecutor, RunStatus};
use relnotes::pipeline::{Pipeline, PushEvent};

/// Executes the pipeline and prints its report
pub fn run_pipeline(
    executor: &dyn PipelineExecutor,
    pipeline: &Pipeline,
    event: &PushEvent,
    json: bool,
) -> Result<()> {
    let report = executor
        .execute(pipeline, event)
        .with_context(|| format!("Run of '{}' could not start", pipeline.name))?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialize run report")?
        );
    } else {
        print!("{}", report.summary());
    }

    match report.status {
        RunStatus::Failed { step } => anyhow::bail!("Run failed at step '{step}'"),
        RunStatus::NotTriggered | RunStatus::Succeeded => Ok(()),
    }
}

/// Renders the plan for an event
pub fn plan_pipeline(
    executor: &dyn PipelineExecutor,
    pipeline: &Pipeline,
    event: &PushEvent,
    json: bool,
) -> Result<String> {
    let plan = executor.dry_run(pipeline, event)?;
    if json {
        serde_json::to_string_pretty(&plan).context("Failed to serialize plan")
    } else {
        Ok(plan.to_string().trim_end().to_string())
    }
}
