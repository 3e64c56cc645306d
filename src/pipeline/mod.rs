//! Pipeline domain types and logic

pub mod condition;
pub mod errors;
pub mod pipeline_def;
pub mod secrets;
pub mod steps;
pub mod trigger;
pub mod types;

#[cfg(test)]
mod types_tests;

pub use serde::{Deserialize, Serialize};

pub use condition::RunCondition;
pub use errors::{PipelineError, ValidationError};
pub use pipeline_def::{Pipeline, PipelineBuilder};
pub use secrets::{EnvValue, Secret, SecretMask, SecretStore};
pub use steps::{DeployConfig, Step, StepKind};
pub use trigger::{PushEvent, Trigger};
pub use types::{StepOutcome, StepResult, Validate};

/// Defines environment variables shared by every step.
///
/// Variables can be resolved using the [`resolve`][Environment::resolve] method
/// which supports `${VAR}` syntax.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Environment {
    /// Environment variables as key-value pairs.
    #[serde(flatten)]
    pub vars: std::collections::BTreeMap<String, String>,
}

impl Environment {
    /// Creates a new empty environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an environment variable.
    #[must_use]
    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    /// Gets an environment variable by name.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&String> {
        self.vars.get(key)
    }

    /// Returns true if no variables are defined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Resolves `${VAR}` references in `value` against `lookup`.
    ///
    /// Unknown variables are left untouched.
    #[must_use]
    pub fn resolve<F>(value: &str, lookup: F) -> String
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut result = value.to_string();
        let mut start = 0;

        while let Some(offset) = result[start..].find("${") {
            let var_start = start + offset + 2;
            let Some(len) = result[var_start..].find('}') else {
                break;
            };
            let var_end = var_start + len;
            let name = result[var_start..var_end].to_string();

            match lookup(&name) {
                Some(replacement) => {
                    result.replace_range(start + offset..=var_end, &replacement);
                    start += offset + replacement.len();
                }
                None => start = var_end + 1,
            }
        }

        result
    }
}
