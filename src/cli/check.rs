//! `relnotes check` - Validate the pipeline and the host
//!
//! Reports problems that would stop a run (an invalid definition, a missing
//! shell) and warnings for things that would make it fail later, such as
//! a secret that is not set in the environment.
//!
//! ## Usage
//!
//! ```bash
//! relnotes check
//! # Exit code 0: No problems found
//! # Exit code 1: Problems found
//! ```

use relnotes::executor::{HealthStatus, PipelineExecutor};
use relnotes::pipeline::{Pipeline, RunCondition, SecretStore, StepKind};
use std::fmt;

/// Findings of a check
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckReport {
    /// Pipeline name
    pub pipeline: String,
    /// Problems that prevent a run
    pub errors: Vec<String>,
    /// Problems a run would hit later
    pub warnings: Vec<String>,
}

impl CheckReport {
    /// Returns true when nothing prevents a run
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for CheckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for error in &self.errors {
            writeln!(f, "error: {error}")?;
        }
        for warning in &self.warnings {
            writeln!(f, "warning: {warning}")?;
        }
        if self.is_ok() {
            write!(f, "'{}' is valid", self.pipeline)?;
        } else {
            write!(f, "'{}' has {} problem(s)", self.pipeline, self.errors.len())?;
        }
        Ok(())
    }
}

/// Validates `pipeline` and checks that its secrets and tools are available
pub fn check_pipeline(
    pipeline: &Pipeline,
    secrets: &SecretStore,
    executor: &dyn PipelineExecutor,
) -> CheckReport {
    let mut report = CheckReport {
        pipeline: pipeline.name.clone(),
        ..CheckReport::default()
    };

    tracing::debug!(pipeline = %pipeline.name, "Checking pipeline");

    if let Err(e) = executor.validate(pipeline) {
        report.errors.push(e.to_string());
    }

    for name in pipeline.secret_names() {
        if !secrets.contains(name) {
            report
                .warnings
                .push(format!("Secret '{name}' is not set; steps using it will fail"));
        }
    }

    for step in &pipeline.steps {
        if matches!(step.kind, StepKind::Deploy(_)) && step.condition != RunCondition::Success {
            report.warnings.push(format!(
                "Deploy step '{}' runs {}, so it may publish after a failed build",
                step.name, step.condition
            ));
        }
    }

    match executor.health_check() {
        HealthStatus::Healthy => {}
        HealthStatus::Degraded { reason } => report.warnings.push(reason),
        HealthStatus::Unhealthy { reason } => report.errors.push(reason),
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use relnotes::executor::LocalExecutor;
    use relnotes::pipeline::{DeployConfig, Step};

    fn secrets() -> SecretStore {
        SecretStore::new()
            .with("AUTH_TOKEN", "a")
            .with("GITHUB_TOKEN", "g")
    }

    #[test]
    fn test_builtin_pipeline_is_valid() {
        let report = check_pipeline(&Pipeline::release_notes(), &secrets(), &LocalExecutor::new());
        assert!(report.is_ok(), "{report}");
        assert!(report.to_string().ends_with("'release-notes' is valid"));
    }

    #[test]
    fn test_missing_secrets_are_warnings() {
        let report = check_pipeline(
            &Pipeline::release_notes(),
            &SecretStore::new(),
            &LocalExecutor::new(),
        );
        assert!(report.is_ok());
        assert!(
            report
                .warnings
                .contains(&"Secret 'AUTH_TOKEN' is not set; steps using it will fail".to_string())
        );
    }

    #[test]
    fn test_invalid_pipeline_is_error() {
        let pipeline = Pipeline::builder()
            .name("docs")
            .step(Step::run("build", ["make html"]))
            .step(Step::run("build", ["make latexpdf"]))
            .build_unchecked();
        let report = check_pipeline(&pipeline, &secrets(), &LocalExecutor::new());
        assert!(!report.is_ok());
        assert!(report.errors[0].contains("build"));
    }

    #[test]
    fn test_ungated_deploy_is_warned() {
        let pipeline = Pipeline::builder()
            .name("docs")
            .step(Step::run("build", ["make html"]))
            .step(Step::deploy("deploy", DeployConfig::default()).when(RunCondition::Always))
            .build_unchecked();
        let report = check_pipeline(&pipeline, &secrets(), &LocalExecutor::new());
        assert!(report.warnings.iter().any(|w| w.starts_with("Deploy step 'deploy'")));
    }

    #[test]
    fn test_missing_shell_is_error() {
        let executor = LocalExecutor::new().with_shell("/nonexistent/shell");
        let report = check_pipeline(&Pipeline::release_notes(), &secrets(), &executor);
        assert!(!report.is_ok());
    }
}
