//! Step types for pipeline execution
//!
//! This module defines step types that represent atomic units of work.
//! Every step maps to one external command or action; the tools behind
//! those commands are opaque to the pipeline.

#![allow(clippy::must_use_candidate, clippy::return_self_not_must_use)]

use super::Validate;
use super::condition::RunCondition;
use super::errors::ValidationError;
use super::secrets::EnvValue;
use super::trigger::PushEvent;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Where and how the documentation build output is published
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployConfig {
    /// Hosting branch receiving the build output
    #[serde(default = "default_target_branch")]
    pub target_branch: String,

    /// Directory to publish, relative to the working directory
    #[serde(default = "default_build_dir")]
    pub build_dir: String,

    /// Whether the host should run Jekyll over the published files
    #[serde(default)]
    pub jekyll: bool,

    /// Environment variable holding the push token
    #[serde(default = "default_token_env")]
    pub token_env: String,
}

fn default_target_branch() -> String {
    "gh-pages".to_string()
}

fn default_build_dir() -> String {
    "build/html".to_string()
}

fn default_token_env() -> String {
    "GITHUB_TOKEN".to_string()
}

fn default_commits() -> u32 {
    1
}

fn default_interpreter() -> String {
    "python".to_string()
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            target_branch: default_target_branch(),
            build_dir: default_build_dir(),
            jekyll: false,
            token_env: default_token_env(),
        }
    }
}

impl fmt::Display for DeployConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "publish {} -> {} (jekyll: {})",
            self.build_dir, self.target_branch, self.jekyll
        )
    }
}

/// Kinds of steps available in pipelines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// Check out the pushed commit
    Checkout {
        /// Commit or ref to check out; defaults to the event's head commit
        #[serde(skip_serializing_if = "Option::is_none", default)]
        reference: Option<String>,
    },

    /// Verify the language runtime is at the pinned version
    SetupRuntime {
        /// Runtime executable, e.g. `python`
        language: String,
        /// Pinned version prefix, e.g. `3.8`
        version: String,
    },

    /// Shell commands run one after another
    Run(Vec<String>),

    /// Changelog generator covering the most recent commits
    Changelog {
        /// Generator script
        script: String,
        /// Number of commits to cover (`-n`)
        #[serde(default = "default_commits")]
        commits: u32,
        /// Interpreter used to invoke the script
        #[serde(default = "default_interpreter")]
        interpreter: String,
    },

    /// Publish a build directory to a hosting branch
    Deploy(DeployConfig),
}

impl StepKind {
    /// Short label for logs and plans
    pub fn label(&self) -> &'static str {
        match self {
            Self::Checkout { .. } => "checkout",
            Self::SetupRuntime { .. } => "setup-runtime",
            Self::Run(_) => "run",
            Self::Changelog { .. } => "changelog",
            Self::Deploy(_) => "deploy",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single step in the pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Step name, unique within the pipeline
    pub name: String,

    /// What the step does
    #[serde(flatten)]
    pub kind: StepKind,

    /// Variables injected into this step only
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub env: BTreeMap<String, EnvValue>,

    /// Gate evaluated before the step runs
    #[serde(
        rename = "if",
        skip_serializing_if = "RunCondition::is_default",
        default
    )]
    pub condition: RunCondition,
}

impl Step {
    /// Creates a step
    pub fn new(name: impl Into<String>, kind: StepKind) -> Self {
        Self {
            name: name.into(),
            kind,
            env: BTreeMap::new(),
            condition: RunCondition::Success,
        }
    }

    /// Creates a checkout step for the event's head commit
    pub fn checkout(name: impl Into<String>) -> Self {
        Self::new(name, StepKind::Checkout { reference: None })
    }

    /// Creates a runtime provisioning step
    pub fn setup_runtime(
        name: impl Into<String>,
        language: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self::new(
            name,
            StepKind::SetupRuntime {
                language: language.into(),
                version: version.into(),
            },
        )
    }

    /// Creates a step running shell commands in order
    pub fn run<I, S>(name: impl Into<String>, commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            name,
            StepKind::Run(commands.into_iter().map(Into::into).collect()),
        )
    }

    /// Creates a changelog step
    pub fn changelog(name: impl Into<String>, script: impl Into<String>, commits: u32) -> Self {
        Self::new(
            name,
            StepKind::Changelog {
                script: script.into(),
                commits,
                interpreter: default_interpreter(),
            },
        )
    }

    /// Creates a deploy step
    pub fn deploy(name: impl Into<String>, config: DeployConfig) -> Self {
        Self::new(name, StepKind::Deploy(config))
    }

    /// Adds a plain environment variable
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), EnvValue::literal(value));
        self
    }

    /// Exposes a secret to this step under `key`
    pub fn with_secret(mut self, key: impl Into<String>, secret_name: impl Into<String>) -> Self {
        self.env.insert(key.into(), EnvValue::secret(secret_name));
        self
    }

    /// Sets the run condition
    pub fn when(mut self, condition: RunCondition) -> Self {
        self.condition = condition;
        self
    }

    /// Names of the secrets this step needs
    pub fn secret_names(&self) -> impl Iterator<Item = &str> {
        self.env.values().filter_map(EnvValue::secret_name)
    }

    /// Shell commands this step runs for the given event
    ///
    /// Deploy steps return an empty list: publishing is handled by a
    /// publisher rather than a fixed command line.
    pub fn commands(&self, event: &PushEvent) -> Vec<String> {
        match &self.kind {
            StepKind::Checkout { reference } => {
                match reference.as_deref().or(event.sha.as_deref()) {
                    Some(rev) => vec![shell_words::join(["git", "checkout", "--detach", rev])],
                    None => vec!["git rev-parse --verify HEAD".to_string()],
                }
            }
            StepKind::SetupRuntime { language, .. } => {
                vec![shell_words::join([language.as_str(), "--version"])]
            }
            StepKind::Run(commands) => commands.clone(),
            StepKind::Changelog {
                script,
                commits,
                interpreter,
            } => {
                let commits = commits.to_string();
                vec![shell_words::join([
                    interpreter.as_str(),
                    script.as_str(),
                    "-n",
                    commits.as_str(),
                ])]
            }
            StepKind::Deploy(_) => Vec::new(),
        }
    }

    /// Human readable description of what the step will do
    pub fn describe(&self, event: &PushEvent) -> Vec<String> {
        match &self.kind {
            StepKind::Deploy(config) => vec![config.to_string()],
            _ => self.commands(event),
        }
    }

    fn invalid(&self, reason: impl Into<String>) -> ValidationError {
        ValidationError::InvalidStep {
            step: self.name.clone(),
            reason: reason.into(),
        }
    }
}

impl Validate for Step {
    type Error = ValidationError;

    fn validate(&self) -> Result<(), Self::Error> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }

        if self.name.len() > 100 {
            return Err(ValidationError::NameTooLong {
                max: 100,
                len: self.name.len(),
            });
        }

        for key in self.env.keys() {
            let valid = !key.is_empty()
                && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
                && !key.starts_with(|c: char| c.is_ascii_digit());
            if !valid {
                return Err(ValidationError::InvalidNameChars { name: key.clone() });
            }
        }

        if self.secret_names().any(|name| name.trim().is_empty()) {
            return Err(self.invalid("secret reference must name a secret"));
        }

        match &self.kind {
            StepKind::Checkout { reference } => {
                if reference.as_deref().is_some_and(str::is_empty) {
                    return Err(self.invalid("checkout reference cannot be empty"));
                }
            }
            StepKind::SetupRuntime { language, version } => {
                if language.is_empty() || version.is_empty() {
                    return Err(self.invalid("runtime language and version are required"));
                }
            }
            StepKind::Run(commands) => {
                if commands.is_empty() || commands.iter().any(|c| c.trim().is_empty()) {
                    return Err(self.invalid("run needs at least one non-empty command"));
                }
            }
            StepKind::Changelog {
                script,
                commits,
                interpreter,
            } => {
                if script.is_empty() || interpreter.is_empty() {
                    return Err(self.invalid("changelog script and interpreter are required"));
                }
                if *commits == 0 {
                    return Err(self.invalid("changelog must cover at least one commit"));
                }
            }
            StepKind::Deploy(config) => {
                if config.target_branch.is_empty() || config.build_dir.is_empty() {
                    return Err(self.invalid("deploy target branch and build dir are required"));
                }
                if config.token_env.is_empty() {
                    return Err(self.invalid("deploy token variable cannot be empty"));
                }
            }
        }

        Ok(())
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_changelog_command_requests_one_commit() {
        let step = Step::changelog("changelog", "git_changelog.py", 1);
        assert_eq!(
            step.commands(&PushEvent::branch("main")),
            vec!["python git_changelog.py -n 1".to_string()]
        );
    }

    #[test]
    fn test_checkout_uses_event_sha() {
        let step = Step::checkout("checkout");
        let event = PushEvent::branch("main").with_sha("abc123");
        assert_eq!(
            step.commands(&event),
            vec!["git checkout --detach abc123".to_string()]
        );
        assert_eq!(
            step.commands(&PushEvent::branch("main")),
            vec!["git rev-parse --verify HEAD".to_string()]
        );
    }

    #[test]
    fn test_commands_are_quoted() {
        let step = Step::changelog("changelog", "scripts/my changelog.py", 2);
        assert_eq!(
            step.commands(&PushEvent::branch("main")),
            vec!["python 'scripts/my changelog.py' -n 2".to_string()]
        );
    }

    #[test]
    fn test_deploy_has_no_commands() {
        let step = Step::deploy("deploy", DeployConfig::default());
        let event = PushEvent::branch("main");
        assert!(step.commands(&event).is_empty());
        assert_eq!(
            step.describe(&event),
            vec!["publish build/html -> gh-pages (jekyll: false)".to_string()]
        );
    }

    #[test]
    fn test_deploy_defaults() {
        let config = DeployConfig::default();
        assert_eq!(config.target_branch, "gh-pages");
        assert_eq!(config.build_dir, "build/html");
        assert!(!config.jekyll);
        assert_eq!(config.token_env, "GITHUB_TOKEN");
    }

    #[test]
    fn test_secret_names() {
        let step = Step::changelog("changelog", "git_changelog.py", 1)
            .with_secret("AUTH_TOKEN", "AUTH_TOKEN")
            .with_env("LANG", "C");
        assert_eq!(step.secret_names().collect::<Vec<_>>(), vec!["AUTH_TOKEN"]);
    }

    #[test]
    fn test_validate_rejects_zero_commits() {
        let step = Step::changelog("changelog", "git_changelog.py", 0);
        assert!(matches!(
            step.validate(),
            Err(ValidationError::InvalidStep { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_empty_run() {
        let step = Step::run("build", Vec::<String>::new());
        assert!(step.validate().is_err());
        let step = Step::run("build", ["  "]);
        assert!(step.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_env_key() {
        let step = Step::run("build", ["make html"]).with_env("BAD KEY", "x");
        assert_eq!(
            step.validate(),
            Err(ValidationError::InvalidNameChars {
                name: "BAD KEY".to_string()
            })
        );
    }

    #[test]
    fn test_validate_rejects_unnamed_secret() {
        let step = Step::changelog("changelog", "git_changelog.py", 1).with_secret("AUTH_TOKEN", "");
        assert!(matches!(
            step.validate(),
            Err(ValidationError::InvalidStep { .. })
        ));
    }

    #[test]
    fn test_validate_name_length() {
        let step = Step::run("a".repeat(101), ["true"]);
        assert_eq!(
            step.validate(),
            Err(ValidationError::NameTooLong { max: 100, len: 101 })
        );
    }

    #[test]
    fn test_step_from_yaml() {
        let yaml = r#"
name: generate changelog
changelog:
  script: git_changelog.py
env:
  AUTH_TOKEN: ${{ secrets.AUTH_TOKEN }}
"#;
        let step: Step = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            step,
            Step::changelog("generate changelog", "git_changelog.py", 1)
                .with_secret("AUTH_TOKEN", "AUTH_TOKEN")
        );
    }

    #[test]
    fn test_step_condition_from_yaml() {
        let yaml = "name: notify\nrun: [\"echo failed\"]\nif: failure\n";
        let step: Step = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(step.condition, RunCondition::Failure);
        assert_eq!(step.kind, StepKind::Run(vec!["echo failed".to_string()]));
    }
}
