//! Push events and pipeline triggers
//!
//! A run starts from a [`PushEvent`]. The pipeline's [`Trigger`] decides
//! whether that event starts the step sequence at all; an event that does
//! not match is a no-op, never a failure.

use super::errors::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;

const BRANCH_PREFIX: &str = "refs/heads/";
const TAG_PREFIX: &str = "refs/tags/";

/// A notification that new commits were added to a ref
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushEvent {
    /// Full ref (`refs/heads/main`) or bare branch name
    #[serde(rename = "ref")]
    pub git_ref: String,

    /// Head commit of the push, when known
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub sha: Option<String>,
}

impl PushEvent {
    /// Creates an event for a ref
    pub fn new(git_ref: impl Into<String>) -> Self {
        Self {
            git_ref: git_ref.into(),
            sha: None,
        }
    }

    /// Creates an event for a branch name
    pub fn branch(name: &str) -> Self {
        Self::new(format!("{BRANCH_PREFIX}{name}"))
    }

    /// Sets the head commit
    #[must_use]
    pub fn with_sha(mut self, sha: impl Into<String>) -> Self {
        self.sha = Some(sha.into());
        self
    }

    /// Returns the target branch, or `None` for tag pushes
    #[must_use]
    pub fn target_branch(&self) -> Option<&str> {
        if let Some(branch) = self.git_ref.strip_prefix(BRANCH_PREFIX) {
            return Some(branch);
        }
        if self.git_ref.starts_with(TAG_PREFIX) || self.git_ref.starts_with("refs/") {
            return None;
        }
        Some(self.git_ref.as_str())
    }
}

impl fmt::Display for PushEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sha {
            Some(sha) => write!(f, "push {} @ {}", self.git_ref, sha),
            None => write!(f, "push {}", self.git_ref),
        }
    }
}

/// Triggers for pipeline execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trigger {
    /// Run on pushes to any of the listed branches
    Push {
        /// Branch names, compared exactly
        branches: Vec<String>,
    },
}

impl Trigger {
    /// Creates a push trigger for the given branches
    pub fn push<I, S>(branches: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Push {
            branches: branches.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates a push trigger for `main`
    #[must_use]
    pub fn main() -> Self {
        Self::push(["main"])
    }

    /// Returns true if the event should start a run
    #[must_use]
    pub fn matches(&self, event: &PushEvent) -> bool {
        match self {
            Self::Push { branches } => event
                .target_branch()
                .is_some_and(|branch| branches.iter().any(|b| b == branch)),
        }
    }

    /// Branches this trigger listens on
    #[must_use]
    pub fn branches(&self) -> &[String] {
        match self {
            Self::Push { branches } => branches,
        }
    }
}

impl Default for Trigger {
    fn default() -> Self {
        Self::main()
    }
}

impl super::Validate for Trigger {
    type Error = ValidationError;

    fn validate(&self) -> Result<(), Self::Error> {
        match self {
            Self::Push { branches } => {
                if branches.is_empty() || branches.iter().any(String::is_empty) {
                    return Err(ValidationError::EmptyTrigger);
                }
                Ok(())
            }
        }
    }
}
