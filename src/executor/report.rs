//! Run reports and plans
//!
//! A [`RunReport`] records what happened to every step of one run; a
//! [`RunPlan`] records what would happen, without running anything.

use crate::pipeline::{PushEvent, RunCondition, StepOutcome};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Overall status of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunStatus {
    /// The event did not match the trigger; nothing ran
    NotTriggered,
    /// Every executed step succeeded
    Succeeded,
    /// A step failed
    Failed {
        /// First step that failed
        step: String,
    },
}

impl RunStatus {
    /// Returns true unless a step failed
    #[must_use]
    pub fn is_ok(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotTriggered => write!(f, "NOT TRIGGERED"),
            Self::Succeeded => write!(f, "SUCCEEDED"),
            Self::Failed { step } => write!(f, "FAILED at '{step}'"),
        }
    }
}

/// What happened to one step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Step name
    pub name: String,

    /// Outcome
    pub outcome: StepOutcome,

    /// Wall time spent in the step
    #[serde(with = "millis")]
    pub duration: Duration,

    /// Error message, secrets masked
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}

/// Result of one pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Run identifier
    pub run_id: String,

    /// Pipeline name
    pub pipeline: String,

    /// Triggering event
    pub event: PushEvent,

    /// Overall status
    #[serde(flatten)]
    pub status: RunStatus,

    /// Per-step records, in declaration order
    pub steps: Vec<StepRecord>,

    /// Total wall time
    #[serde(with = "millis")]
    pub duration: Duration,
}

impl RunReport {
    /// Report for an event that did not match the trigger
    #[must_use]
    pub fn not_triggered(run_id: String, pipeline: &str, event: &PushEvent) -> Self {
        Self {
            run_id,
            pipeline: pipeline.to_string(),
            event: event.clone(),
            status: RunStatus::NotTriggered,
            steps: Vec::new(),
            duration: Duration::ZERO,
        }
    }

    /// Returns true if the run did not fail
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_ok()
    }

    /// Outcome of a named step, if it was recorded
    #[must_use]
    pub fn outcome(&self, step: &str) -> Option<StepOutcome> {
        self.steps.iter().find(|r| r.name == step).map(|r| r.outcome)
    }

    /// Number of steps with the given outcome
    #[must_use]
    pub fn count(&self, outcome: StepOutcome) -> usize {
        self.steps.iter().filter(|r| r.outcome == outcome).count()
    }

    /// Multi-line human readable summary
    #[must_use]
    pub fn summary(&self) -> String {
        let mut out = format!(
            "Run {} of '{}' ({}): {}\n",
            self.run_id, self.pipeline, self.event, self.status
        );
        for record in &self.steps {
            out.push_str(&format!(
                "  [{}] {} ({} ms)\n",
                record.outcome,
                record.name,
                record.duration.as_millis()
            ));
            if let Some(error) = &record.error {
                out.push_str(&format!("            {error}\n"));
            }
        }
        if !self.steps.is_empty() {
            out.push_str(&format!(
                "  {} succeeded, {} failed, {} skipped in {} ms\n",
                self.count(StepOutcome::Success),
                self.count(StepOutcome::Failure),
                self.count(StepOutcome::Skipped),
                self.duration.as_millis()
            ));
        }
        out
    }
}

/// One step of a dry run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedStep {
    /// Step name
    pub name: String,

    /// Step kind label
    pub kind: String,

    /// Gate the step runs under
    pub condition: RunCondition,

    /// Commands or action the step would run
    pub commands: Vec<String>,

    /// Secrets the step would receive (names only)
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub secrets: Vec<String>,
}

/// What a run would do for an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunPlan {
    /// Pipeline name
    pub pipeline: String,

    /// Event the plan was made for
    pub event: PushEvent,

    /// Whether the event matches the trigger
    pub triggered: bool,

    /// Steps in execution order; empty when not triggered
    pub steps: Vec<PlannedStep>,
}

impl fmt::Display for RunPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.triggered {
            return writeln!(f, "'{}' is not triggered by {}", self.pipeline, self.event);
        }
        writeln!(f, "'{}' on {}:", self.pipeline, self.event)?;
        for (index, step) in self.steps.iter().enumerate() {
            write!(f, "{}. {} [{}, if {}]", index + 1, step.name, step.kind, step.condition)?;
            if !step.secrets.is_empty() {
                write!(f, " secrets: {}", step.secrets.join(", "))?;
            }
            writeln!(f)?;
            for command in &step.commands {
                writeln!(f, "     $ {command}")?;
            }
        }
        Ok(())
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, outcome: StepOutcome) -> StepRecord {
        StepRecord {
            name: name.to_string(),
            outcome,
            duration: Duration::from_millis(5),
            error: None,
        }
    }

    fn report() -> RunReport {
        RunReport {
            run_id: "run-1".to_string(),
            pipeline: "release-notes".to_string(),
            event: PushEvent::branch("main"),
            status: RunStatus::Failed {
                step: "build docs".to_string(),
            },
            steps: vec![
                record("checkout", StepOutcome::Success),
                StepRecord {
                    error: Some("Command failed with exit code 2: ".to_string()),
                    ..record("build docs", StepOutcome::Failure)
                },
                record("deploy", StepOutcome::Skipped),
            ],
            duration: Duration::from_millis(15),
        }
    }

    #[test]
    fn test_counts_and_lookup() {
        let report = report();
        assert!(!report.is_success());
        assert_eq!(report.count(StepOutcome::Success), 1);
        assert_eq!(report.count(StepOutcome::Skipped), 1);
        assert_eq!(report.outcome("deploy"), Some(StepOutcome::Skipped));
        assert_eq!(report.outcome("missing"), None);
    }

    #[test]
    fn test_summary_mentions_every_step() {
        let summary = report().summary();
        assert!(summary.contains("FAILED at 'build docs'"));
        assert!(summary.contains("[SKIPPED] deploy"));
        assert!(summary.contains("1 succeeded, 1 failed, 1 skipped"));
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(report()).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["step"], "build docs");
        assert_eq!(json["steps"][0]["duration"], 5);
        assert_eq!(json["steps"][2]["outcome"], "skipped");
        assert!(json["steps"][0].get("error").is_none());
    }

    #[test]
    fn test_not_triggered_is_success() {
        let report = RunReport::not_triggered("r".to_string(), "p", &PushEvent::branch("dev"));
        assert!(report.is_success());
        assert!(report.steps.is_empty());
        assert_eq!(report.status, RunStatus::NotTriggered);
    }

    #[test]
    fn test_plan_display() {
        let plan = RunPlan {
            pipeline: "release-notes".to_string(),
            event: PushEvent::branch("main"),
            triggered: true,
            steps: vec![PlannedStep {
                name: "generate changelog".to_string(),
                kind: "changelog".to_string(),
                condition: RunCondition::Success,
                commands: vec!["python git_changelog.py -n 1".to_string()],
                secrets: vec!["AUTH_TOKEN".to_string()],
            }],
        };
        let text = plan.to_string();
        assert!(text.contains("1. generate changelog [changelog, if success] secrets: AUTH_TOKEN"));
        assert!(text.contains("$ python git_changelog.py -n 1"));
    }
}
