//! Pipeline definition and builder

#![allow(clippy::must_use_candidate, clippy::return_self_not_must_use)]

use crate::pipeline::errors::{PipelineError, ValidationError};
use crate::pipeline::steps::{DeployConfig, Step};
use crate::pipeline::trigger::{PushEvent, Trigger};
use crate::pipeline::types::Validate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::path::Path;

/// Main pipeline structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pipeline {
    /// Pipeline name
    #[serde(default = "default_name")]
    pub name: String,

    /// Events that start a run
    #[serde(rename = "on", default)]
    pub trigger: Trigger,

    /// Variables visible to every step
    #[serde(default, skip_serializing_if = "crate::pipeline::Environment::is_empty")]
    pub env: crate::pipeline::Environment,

    /// Steps in execution order
    pub steps: Vec<Step>,
}

fn default_name() -> String {
    "release-notes".to_string()
}

impl Validate for Pipeline {
    type Error = ValidationError;

    fn validate(&self) -> Result<(), Self::Error> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName);
        }

        self.trigger.validate()?;

        if self.steps.is_empty() {
            return Err(ValidationError::EmptyPipeline);
        }

        let mut seen = HashSet::new();
        for step in &self.steps {
            step.validate()?;
            if !seen.insert(step.name.as_str()) {
                return Err(ValidationError::DuplicateStep(step.name.clone()));
            }
        }

        Ok(())
    }
}

impl Pipeline {
    /// Creates a new pipeline builder
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// The canonical release-notes pipeline
    ///
    /// On push to `main`: checkout, Python 3.8, dependency install, changelog
    /// for the most recent commit, `make html`, then publish `build/html` to
    /// `gh-pages` with Jekyll disabled.
    pub fn release_notes() -> Self {
        Self::builder()
            .name("release-notes")
            .trigger(Trigger::main())
            .step(Step::checkout("checkout"))
            .step(Step::setup_runtime("setup python", "python", "3.8"))
            .step(Step::run(
                "install dependencies",
                ["pip install --upgrade pip", "pip install -r requirements.txt"],
            ))
            .step(
                Step::changelog("generate changelog", "git_changelog.py", 1)
                    .with_secret("AUTH_TOKEN", "AUTH_TOKEN"),
            )
            .step(Step::run("build docs", ["make html"]))
            .step(
                Step::deploy("deploy", DeployConfig::default())
                    .with_secret("GITHUB_TOKEN", "GITHUB_TOKEN"),
            )
            .build_unchecked()
    }

    /// Parses a pipeline from YAML and validates it
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Definition`] for malformed YAML and
    /// [`PipelineError::Validation`] for an invalid pipeline.
    pub fn from_yaml(source: &str) -> Result<Self, PipelineError> {
        let pipeline: Self = serde_yaml::from_str(source)?;
        pipeline.validate()?;
        Ok(pipeline)
    }

    /// Reads and parses a pipeline definition file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid pipeline.
    pub fn from_file(path: &Path) -> Result<Self, PipelineError> {
        let source = std::fs::read_to_string(path)
            .map_err(|e| PipelineError::Definition(format!("{}: {e}", path.display())))?;
        Self::from_yaml(&source)
    }

    /// Serializes the pipeline back to its YAML definition form
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Definition`] if serialization fails.
    pub fn to_yaml(&self) -> Result<String, PipelineError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Returns true if the event starts a run of this pipeline
    pub fn is_triggered_by(&self, event: &PushEvent) -> bool {
        self.trigger.matches(event)
    }

    /// Every secret referenced by any step, sorted and deduplicated
    pub fn secret_names(&self) -> BTreeSet<&str> {
        self.steps.iter().flat_map(Step::secret_names).collect()
    }

    /// Looks up a step by name
    pub fn step(&self, name: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.name == name)
    }

    /// Returns number of steps
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pipeline({}): {} steps", self.name, self.steps.len())
    }
}

/// Builder for creating pipelines
#[derive(Debug, Clone)]
pub struct PipelineBuilder {
    pipeline: Pipeline,
}

impl PipelineBuilder {
    /// Creates a new pipeline builder
    pub fn new() -> Self {
        Self {
            pipeline: Pipeline {
                name: default_name(),
                trigger: Trigger::default(),
                env: crate::pipeline::Environment::new(),
                steps: Vec::new(),
            },
        }
    }

    /// Sets pipeline name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.pipeline.name = name.into();
        self
    }

    /// Sets the trigger
    pub fn trigger(mut self, trigger: Trigger) -> Self {
        self.pipeline.trigger = trigger;
        self
    }

    /// Appends a step
    pub fn step(mut self, step: Step) -> Self {
        self.pipeline.steps.push(step);
        self
    }

    /// Appends multiple steps
    pub fn steps(mut self, steps: impl IntoIterator<Item = Step>) -> Self {
        self.pipeline.steps.extend(steps);
        self
    }

    /// Configures environment with a closure
    pub fn environment<F>(mut self, f: F) -> Self
    where
        F: FnOnce(crate::pipeline::Environment) -> crate::pipeline::Environment,
    {
        self.pipeline.env = f(self.pipeline.env);
        self
    }

    /// Builds pipeline
    #[allow(clippy::missing_errors_doc)]
    pub fn build(self) -> Result<Pipeline, ValidationError> {
        self.pipeline.validate()?;
        Ok(self.pipeline)
    }

    /// Builds pipeline without validation (for internal use)
    #[must_use]
    pub fn build_unchecked(self) -> Pipeline {
        self.pipeline
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{RunCondition, StepKind};

    const DEFINITION: &str = r#"
name: release-notes
on:
  push:
    branches: [main]
steps:
  - name: checkout
    checkout: {}
  - name: setup python
    setup_runtime: { language: python, version: "3.8" }
  - name: install dependencies
    run: ["pip install --upgrade pip", "pip install -r requirements.txt"]
  - name: generate changelog
    changelog: { script: git_changelog.py, commits: 1 }
    env:
      AUTH_TOKEN: ${{ secrets.AUTH_TOKEN }}
  - name: build docs
    run: ["make html"]
  - name: deploy
    deploy: { target_branch: gh-pages, build_dir: build/html, jekyll: false }
    env:
      GITHUB_TOKEN: ${{ secrets.GITHUB_TOKEN }}
"#;

    #[test]
    fn test_release_notes_is_valid() {
        assert!(Pipeline::release_notes().validate().is_ok());
    }

    #[test]
    fn test_release_notes_step_order() {
        let pipeline = Pipeline::release_notes();
        let labels: Vec<_> = pipeline.steps.iter().map(|s| s.kind.label()).collect();
        assert_eq!(
            labels,
            vec!["checkout", "setup-runtime", "run", "changelog", "run", "deploy"]
        );
    }

    #[test]
    fn test_release_notes_deploy_is_success_gated() {
        let pipeline = Pipeline::release_notes();
        let deploy = pipeline.step("deploy").unwrap();
        assert_eq!(deploy.condition, RunCondition::Success);
        assert_eq!(
            deploy.kind,
            StepKind::Deploy(DeployConfig {
                target_branch: "gh-pages".to_string(),
                build_dir: "build/html".to_string(),
                jekyll: false,
                token_env: "GITHUB_TOKEN".to_string(),
            })
        );
    }

    #[test]
    fn test_definition_file_matches_builtin() {
        let parsed = Pipeline::from_yaml(DEFINITION).unwrap();
        assert_eq!(parsed, Pipeline::release_notes());
    }

    #[test]
    fn test_yaml_roundtrip() {
        let pipeline = Pipeline::release_notes();
        let yaml = pipeline.to_yaml().unwrap();
        assert_eq!(Pipeline::from_yaml(&yaml).unwrap(), pipeline);
    }

    #[test]
    fn test_secret_names() {
        let pipeline = Pipeline::release_notes();
        assert_eq!(
            pipeline.secret_names().into_iter().collect::<Vec<_>>(),
            vec!["AUTH_TOKEN", "GITHUB_TOKEN"]
        );
    }

    #[test]
    fn test_empty_pipeline_rejected() {
        let result = Pipeline::builder().build();
        assert_eq!(result, Err(ValidationError::EmptyPipeline));
    }

    #[test]
    fn test_duplicate_step_rejected() {
        let result = Pipeline::builder()
            .step(Step::run("build", ["make html"]))
            .step(Step::run("build", ["make html"]))
            .build();
        assert_eq!(
            result,
            Err(ValidationError::DuplicateStep("build".to_string()))
        );
    }

    #[test]
    fn test_malformed_yaml_is_definition_error() {
        let result = Pipeline::from_yaml("steps: [");
        assert!(matches!(result, Err(PipelineError::Definition(_))));
    }

    #[test]
    fn test_invalid_definition_is_validation_error() {
        let result = Pipeline::from_yaml("steps: []\n");
        assert_eq!(
            result,
            Err(PipelineError::Validation(ValidationError::EmptyPipeline))
        );
    }

    #[test]
    fn test_triggered_by() {
        let pipeline = Pipeline::release_notes();
        assert!(pipeline.is_triggered_by(&PushEvent::branch("main")));
        assert!(!pipeline.is_triggered_by(&PushEvent::branch("dev")));
    }
}
