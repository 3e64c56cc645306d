use super::lock::RunLock;
use super::report::{PlannedStep, RunPlan, RunReport, RunStatus, StepRecord};
use super::runner::CommandRunner;
use super::traits::{HealthStatus, PipelineExecutor, StepContext, StepRunner};
use crate::pipeline::{
    EnvValue, Environment, Pipeline, PipelineError, PushEvent, SecretMask, SecretStore, Step,
    StepOutcome, Validate, ValidationError,
};
use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use std::process::Command;
use std::sync::Arc;
use std::time::Instant;

/// Local executor that runs steps on the host system, one at a time
#[derive(Clone)]
pub struct LocalExecutor {
    /// Configuration for executor
    config: ExecutorConfig,

    /// Runs each step's external command
    runner: Arc<dyn StepRunner>,

    /// Secrets available to steps that declare them
    secrets: SecretStore,
}

/// Configuration for local executor
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Working directory (the checked-out source tree)
    pub cwd: PathBuf,

    /// Shell to use (default: sh)
    pub shell: String,

    /// Start steps from the parent process environment
    pub inherit_env: bool,

    /// Echo command output while it runs
    pub streaming: bool,

    /// Hold a lock file in the working directory for the whole run
    pub lock: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            cwd: std::env::current_dir().unwrap_or_default(),
            shell: "sh".to_string(),
            inherit_env: true,
            streaming: true,
            lock: true,
        }
    }
}

impl LocalExecutor {
    /// Creates a local executor that publishes with git
    #[must_use]
    pub fn new() -> Self {
        let publisher = crate::infrastructure::GitPagesPublisher::default();
        Self::with_runner(Arc::new(CommandRunner::new(Arc::new(publisher))))
    }

    /// Creates a local executor around a custom step runner
    #[must_use]
    pub fn with_runner(runner: Arc<dyn StepRunner>) -> Self {
        Self {
            config: ExecutorConfig::default(),
            runner,
            secrets: SecretStore::new(),
        }
    }

    /// Sets current working directory
    #[must_use]
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.config.cwd = cwd.into();
        self
    }

    /// Sets shell to use
    #[must_use]
    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.config.shell = shell.into();
        self
    }

    /// Sets the secret store
    #[must_use]
    pub fn with_secrets(mut self, secrets: SecretStore) -> Self {
        self.secrets = secrets;
        self
    }

    /// Replaces the whole configuration
    #[must_use]
    pub fn with_config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the configuration
    #[must_use]
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }
}

impl Default for LocalExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LocalExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalExecutor")
            .field("config", &self.config)
            .field("secrets", &self.secrets)
            .finish_non_exhaustive()
    }
}

impl PipelineExecutor for LocalExecutor {
    fn execute(
        &self,
        pipeline: &Pipeline,
        event: &PushEvent,
    ) -> Result<RunReport, PipelineError> {
        pipeline.validate()?;

        let run_id = uuid::Uuid::new_v4().to_string();

        if !pipeline.is_triggered_by(event) {
            tracing::info!(
                run_id = %run_id,
                pipeline = %pipeline.name,
                git_ref = %event.git_ref,
                "Event does not match trigger, nothing to do"
            );
            return Ok(RunReport::not_triggered(run_id, &pipeline.name, event));
        }

        tracing::info!(
            run_id = %run_id,
            pipeline = %pipeline.name,
            git_ref = %event.git_ref,
            steps_count = pipeline.steps.len(),
            "Starting pipeline run"
        );

        let _lock = if self.config.lock {
            Some(RunLock::acquire(&self.config.cwd, &run_id)?)
        } else {
            None
        };

        let started = Instant::now();
        let base_env = self.base_env(pipeline);
        let mask = self.secrets.mask();
        let mut first_failure: Option<String> = None;
        let mut records = Vec::with_capacity(pipeline.steps.len());

        for step in &pipeline.steps {
            if !step.condition.should_run(first_failure.is_some()) {
                tracing::info!(step = %step.name, condition = %step.condition, "Step skipped");
                records.push(StepRecord {
                    name: step.name.clone(),
                    outcome: StepOutcome::Skipped,
                    duration: std::time::Duration::ZERO,
                    error: None,
                });
                continue;
            }

            tracing::info!(step = %step.name, kind = %step.kind, "Executing step");
            let start = Instant::now();

            let result = self.step_env(step, &base_env).and_then(|env| {
                let context = StepContext {
                    run_id: run_id.clone(),
                    event: event.clone(),
                    cwd: self.config.cwd.clone(),
                    env,
                    shell: self.config.shell.clone(),
                    streaming: self.config.streaming,
                    mask: mask.clone(),
                };
                self.runner.run(step, &context)
            });

            let duration = start.elapsed();
            let (outcome, error) = match result {
                Ok(()) => (StepOutcome::Success, None),
                Err(e) => (StepOutcome::Failure, Some(mask.apply(&e.to_string()))),
            };

            tracing::info!(
                step = %step.name,
                outcome = %outcome,
                duration_ms = duration.as_millis(),
                "Step completed"
            );

            if let Some(ref message) = error {
                tracing::error!(step = %step.name, error = %message, "Step failed");
                if first_failure.is_none() {
                    first_failure = Some(step.name.clone());
                }
            }

            records.push(StepRecord {
                name: step.name.clone(),
                outcome,
                duration,
                error,
            });
        }

        let status = match first_failure {
            Some(step) => RunStatus::Failed { step },
            None => RunStatus::Succeeded,
        };

        tracing::info!(run_id = %run_id, status = %status, "Pipeline run finished");

        Ok(RunReport {
            run_id,
            pipeline: pipeline.name.clone(),
            event: event.clone(),
            status,
            steps: records,
            duration: started.elapsed(),
        })
    }

    fn validate(&self, pipeline: &Pipeline) -> Result<(), ValidationError> {
        pipeline.validate()
    }

    fn dry_run(&self, pipeline: &Pipeline, event: &PushEvent) -> Result<RunPlan, PipelineError> {
        pipeline.validate()?;

        let triggered = pipeline.is_triggered_by(event);
        let steps = if triggered {
            pipeline
                .steps
                .iter()
                .map(|step| PlannedStep {
                    name: step.name.clone(),
                    kind: step.kind.label().to_string(),
                    condition: step.condition,
                    commands: step.describe(event),
                    secrets: step.secret_names().map(str::to_string).collect(),
                })
                .collect()
        } else {
            Vec::new()
        };

        for step in &steps {
            tracing::debug!(step = %step.name, "Would execute step");
        }

        Ok(RunPlan {
            pipeline: pipeline.name.clone(),
            event: event.clone(),
            triggered,
            steps,
        })
    }

    fn health_check(&self) -> HealthStatus {
        let shell_ok = Command::new(&self.config.shell)
            .arg("-c")
            .arg("true")
            .status()
            .is_ok_and(|s| s.success());
        if !shell_ok {
            return HealthStatus::Unhealthy {
                reason: format!("Shell not available: {}", self.config.shell),
            };
        }

        let git_ok = Command::new("git")
            .arg("--version")
            .output()
            .is_ok_and(|o| o.status.success());
        if !git_ok {
            return HealthStatus::Degraded {
                reason: "git not available: checkout and deploy steps will fail".to_string(),
            };
        }

        HealthStatus::Healthy
    }
}

impl LocalExecutor {
    /// Environment shared by every step: the parent environment without any
    /// secret names, plus the pipeline-level variables
    fn base_env(&self, pipeline: &Pipeline) -> HashMap<String, String> {
        let hidden: BTreeSet<&str> = pipeline.secret_names();

        let mut env: HashMap<String, String> = if self.config.inherit_env {
            std::env::vars()
                .filter(|(k, _)| !hidden.contains(k.as_str()) && !self.secrets.contains(k))
                .collect()
        } else {
            HashMap::new()
        };

        for (key, value) in &pipeline.env.vars {
            let resolved = Environment::resolve(value, |name| env.get(name).cloned());
            env.insert(key.clone(), resolved);
        }

        env
    }

    /// Base environment plus the step's own variables and secrets
    fn step_env(
        &self,
        step: &Step,
        base: &HashMap<String, String>,
    ) -> Result<HashMap<String, String>, PipelineError> {
        let mut env = base.clone();
        for (key, value) in &step.env {
            let resolved = match value {
                EnvValue::Literal(literal) => {
                    Environment::resolve(literal, |name| base.get(name).cloned())
                }
                EnvValue::Secret(name) => self
                    .secrets
                    .get(name)
                    .ok_or_else(|| PipelineError::MissingSecret { name: name.clone() })?
                    .expose()
                    .to_string(),
            };
            env.insert(key.clone(), resolved);
        }
        Ok(env)
    }

    /// Masker for the configured secrets
    #[must_use]
    pub fn mask(&self) -> SecretMask {
        self.secrets.mask()
    }
}
