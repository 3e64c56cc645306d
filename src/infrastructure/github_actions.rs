//! GitHub Actions backend
//!
//! Translates release-notes pipelines to GitHub Actions workflows.

use crate::pipeline::{Pipeline, PipelineError, PushEvent, RunCondition, Step, StepKind};
use std::fmt::Write as _;

/// Publishing action used for deploy steps
pub const PAGES_ACTION: &str = "crazy-max/ghaction-github-pages@v4";

/// Checkout action
pub const CHECKOUT_ACTION: &str = "actions/checkout@v4";

/// Backend for generating GitHub Actions workflows
pub struct GitHubActionsBackend {
    runs_on: String,
}

impl Default for GitHubActionsBackend {
    fn default() -> Self {
        Self::new("ubuntu-latest")
    }
}

impl GitHubActionsBackend {
    /// Creates a backend whose job runs on `runs_on`
    pub fn new(runs_on: impl Into<String>) -> Self {
        Self {
            runs_on: runs_on.into(),
        }
    }

    /// Translates a pipeline to GitHub Actions workflow YAML
    ///
    /// The whole pipeline becomes a single job so steps keep their order
    /// and share a work tree.
    #[allow(clippy::missing_errors_doc)]
    pub fn translate(&self, pipeline: &Pipeline) -> Result<String, PipelineError> {
        let mut yaml = String::new();

        let _ = writeln!(yaml, "name: {}\n", quote(&pipeline.name));
        yaml.push_str("on:\n  push:\n    branches:\n");
        for branch in pipeline.trigger.branches() {
            let _ = writeln!(yaml, "      - {}", quote(branch));
        }
        yaml.push('\n');

        if !pipeline.env.is_empty() {
            yaml.push_str("env:\n");
            for (key, value) in &pipeline.env.vars {
                let _ = writeln!(yaml, "  {key}: {}", quote(value));
            }
            yaml.push('\n');
        }

        yaml.push_str("jobs:\n");
        let _ = writeln!(yaml, "  {}:", sanitize_job_name(&pipeline.name));
        let _ = writeln!(yaml, "    runs-on: {}", self.runs_on);
        yaml.push_str("    steps:\n");

        // changelog commands do not depend on the event
        let event = PushEvent::branch(
            pipeline
                .trigger
                .branches()
                .first()
                .map_or("main", String::as_str),
        );
        for step in &pipeline.steps {
            yaml.push_str(&translate_step(step, &event));
        }

        Ok(yaml)
    }
}

/// Translates a step to a GitHub Actions step
fn translate_step(step: &Step, event: &PushEvent) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "      - name: {}", quote(&step.name));

    let deploy = matches!(step.kind, StepKind::Deploy(_));
    if deploy || step.condition != RunCondition::Success {
        let _ = writeln!(out, "        if: {}", step.condition.workflow_expression());
    }

    match &step.kind {
        StepKind::Checkout { reference } => {
            let _ = writeln!(out, "        uses: {CHECKOUT_ACTION}");
            if let Some(reference) = reference {
                write_with(&mut out, [("ref", reference.as_str())]);
            }
        }
        StepKind::SetupRuntime { language, version } => {
            let _ = writeln!(out, "        uses: actions/setup-{language}@v5");
            let key = format!("{language}-version");
            write_with(&mut out, [(key.as_str(), version.as_str())]);
        }
        StepKind::Run(_) | StepKind::Changelog { .. } => {
            let commands = step.commands(event);
            if let [command] = commands.as_slice() {
                let _ = writeln!(out, "        run: {}", quote(command));
            } else {
                out.push_str("        run: |\n");
                for command in &commands {
                    let _ = writeln!(out, "          {command}");
                }
            }
        }
        StepKind::Deploy(config) => {
            let _ = writeln!(out, "        uses: {PAGES_ACTION}");
            write_with(
                &mut out,
                [
                    ("target_branch", config.target_branch.as_str()),
                    ("build_dir", config.build_dir.as_str()),
                ],
            );
            let _ = writeln!(out, "          jekyll: {}", config.jekyll);
        }
    }

    if !step.env.is_empty() {
        out.push_str("        env:\n");
        for (key, value) in &step.env {
            let _ = writeln!(out, "          {key}: {}", quote(&value.to_string()));
        }
    }

    out
}

/// Writes a `with:` block of string inputs
fn write_with<'a>(out: &mut String, inputs: impl IntoIterator<Item = (&'a str, &'a str)>) {
    out.push_str("        with:\n");
    for (key, value) in inputs {
        let _ = writeln!(out, "          {key}: {}", quote(value));
    }
}

/// Quotes a scalar when plain YAML would misread it
fn quote(value: &str) -> String {
    let reserved = matches!(
        value,
        "true" | "false" | "yes" | "no" | "on" | "off" | "null" | "~"
    );
    let needs_quotes = value.is_empty()
        || reserved
        || value.parse::<f64>().is_ok()
        || value.contains(": ")
        || value.contains(" #")
        || value.ends_with(':')
        || value.starts_with(|c: char| "!&*-?{}[]|>'\"%@`#,".contains(c) || c.is_whitespace())
        || value.ends_with(char::is_whitespace);

    if needs_quotes {
        format!("'{}'", value.replace('\'', "''"))
    } else {
        value.to_string()
    }
}

/// Sanitizes job name for GitHub Actions
fn sanitize_job_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}
