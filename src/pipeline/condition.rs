//! Run conditions for steps
//!
//! Every step carries an explicit gate that the executor evaluates before
//! running it. The gate only looks at whether any earlier step failed.

#![allow(clippy::must_use_candidate)]

use serde::{Deserialize, Serialize};
use std::fmt;

/// When a step is allowed to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunCondition {
    /// Run only if every earlier step succeeded
    #[default]
    Success,

    /// Run regardless of earlier failures
    Always,

    /// Run only if an earlier step failed
    Failure,
}

impl RunCondition {
    /// Returns true if the step should run given the state of the run so far
    pub fn should_run(self, prior_failure: bool) -> bool {
        match self {
            Self::Success => !prior_failure,
            Self::Always => true,
            Self::Failure => prior_failure,
        }
    }

    /// Returns true for the default gate
    pub fn is_default(&self) -> bool {
        *self == Self::Success
    }

    /// Expression used for this gate in GitHub Actions workflows
    pub fn workflow_expression(self) -> &'static str {
        match self {
            Self::Success => "success()",
            Self::Always => "always()",
            Self::Failure => "failure()",
        }
    }
}

impl fmt::Display for RunCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Always => write!(f, "always"),
            Self::Failure => write!(f, "failure"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_gate() {
        assert!(RunCondition::Success.should_run(false));
        assert!(!RunCondition::Success.should_run(true));
    }

    #[test]
    fn test_always_gate() {
        assert!(RunCondition::Always.should_run(false));
        assert!(RunCondition::Always.should_run(true));
    }

    #[test]
    fn test_failure_gate() {
        assert!(!RunCondition::Failure.should_run(false));
        assert!(RunCondition::Failure.should_run(true));
    }

    #[test]
    fn test_default_is_success() {
        assert_eq!(RunCondition::default(), RunCondition::Success);
        assert!(RunCondition::default().is_default());
        assert!(!RunCondition::Always.is_default());
    }

    #[test]
    fn test_deserialize_lowercase() {
        let cond: RunCondition = serde_yaml::from_str("always").unwrap();
        assert_eq!(cond, RunCondition::Always);
    }
}
