//! Command-backed step runner
//!
//! Maps each step kind onto the external command that implements it. The
//! commands themselves come from [`Step::commands`]; this module adds the
//! runtime version check and hands deploy steps to a [`Publisher`].

use super::shell::ShellCommand;
use super::traits::{Publisher, StepContext, StepRunner};
use crate::pipeline::{PipelineError, Step, StepKind, StepResult};
use std::sync::Arc;

/// Runs steps as shell commands on the host
#[derive(Clone)]
pub struct CommandRunner {
    publisher: Arc<dyn Publisher>,
}

impl CommandRunner {
    /// Creates a runner that publishes through `publisher`
    pub fn new(publisher: Arc<dyn Publisher>) -> Self {
        Self { publisher }
    }
}

impl std::fmt::Debug for CommandRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRunner").finish_non_exhaustive()
    }
}

impl StepRunner for CommandRunner {
    fn run(&self, step: &Step, context: &StepContext) -> StepResult {
        let shell = context.shell_config();

        match &step.kind {
            StepKind::Deploy(config) => self.publisher.publish(config, context),
            StepKind::SetupRuntime { language, version } => {
                for command in step.commands(&context.event) {
                    let output = ShellCommand::new(&shell).execute(&command)?;
                    let found = reported_version(&output.combined_output())
                        .unwrap_or_default()
                        .to_string();
                    if !version_matches(&found, version) {
                        return Err(PipelineError::RuntimeMismatch {
                            language: language.clone(),
                            expected: version.clone(),
                            found,
                        });
                    }
                    tracing::info!(runtime = %language, version = %found, "Runtime provisioned");
                }
                Ok(())
            }
            _ => {
                for command in step.commands(&context.event) {
                    ShellCommand::new(&shell).execute(&command)?;
                }
                Ok(())
            }
        }
    }
}

/// First whitespace-separated token that starts with a digit
///
/// `Python 3.8.10` yields `3.8.10`.
fn reported_version(output: &str) -> Option<&str> {
    output
        .split_whitespace()
        .find(|token| token.starts_with(|c: char| c.is_ascii_digit()))
}

/// `3.8.10` matches the pin `3.8`; `3.80` does not
fn version_matches(found: &str, pinned: &str) -> bool {
    found == pinned
        || found
            .strip_prefix(pinned)
            .is_some_and(|rest| rest.starts_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{DeployConfig, PushEvent, SecretMask};
    use parking_lot::Mutex;
    use std::collections::HashMap;

    #[derive(Default)]
    struct FakePublisher {
        calls: Mutex<Vec<DeployConfig>>,
    }

    impl Publisher for FakePublisher {
        fn publish(&self, config: &DeployConfig, _context: &StepContext) -> StepResult {
            self.calls.lock().push(config.clone());
            Ok(())
        }
    }

    fn context(dir: &std::path::Path) -> StepContext {
        StepContext {
            run_id: "run-1".to_string(),
            event: PushEvent::branch("main"),
            cwd: dir.to_path_buf(),
            env: HashMap::from([("PATH".to_string(), std::env::var("PATH").unwrap_or_default())]),
            shell: "sh".to_string(),
            streaming: false,
            mask: SecretMask::default(),
        }
    }

    #[test]
    fn test_version_parsing() {
        assert_eq!(reported_version("Python 3.8.10\n"), Some("3.8.10"));
        assert_eq!(reported_version("no version here"), None);
        assert!(version_matches("3.8.10", "3.8"));
        assert!(version_matches("3.8", "3.8"));
        assert!(!version_matches("3.80.1", "3.8"));
        assert!(!version_matches("3.9.1", "3.8"));
    }

    #[test]
    fn test_run_step_executes_commands_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let runner = CommandRunner::new(Arc::new(FakePublisher::default()));
        let step = Step::run("build", ["echo one > out.txt", "echo two >> out.txt"]);

        runner.run(&step, &context(dir.path())).unwrap();

        let content = std::fs::read_to_string(dir.path().join("out.txt")).unwrap();
        assert_eq!(content, "one\ntwo\n");
    }

    #[test]
    fn test_run_step_stops_at_first_failing_command() {
        let dir = tempfile::tempdir().unwrap();
        let runner = CommandRunner::new(Arc::new(FakePublisher::default()));
        let step = Step::run("build", ["exit 2", "touch never.txt"]);

        let result = runner.run(&step, &context(dir.path()));

        assert!(matches!(result, Err(PipelineError::CommandFailed { code: 2, .. })));
        assert!(!dir.path().join("never.txt").exists());
    }

    #[test]
    fn test_setup_runtime_checks_version() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("fakepy");
        std::fs::write(&script, "#!/bin/sh\necho \"Python 3.8.10\"\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        let runner = CommandRunner::new(Arc::new(FakePublisher::default()));
        let language = script.display().to_string();
        let ctx = context(dir.path());

        let pinned = Step::setup_runtime("setup", language.clone(), "3.8");
        let wrong = Step::setup_runtime("setup", language, "3.9");

        assert!(runner.run(&pinned, &ctx).is_ok());
        assert!(matches!(
            runner.run(&wrong, &ctx),
            Err(PipelineError::RuntimeMismatch { .. })
        ));
    }

    #[test]
    fn test_deploy_goes_to_publisher() {
        let dir = tempfile::tempdir().unwrap();
        let publisher = Arc::new(FakePublisher::default());
        let runner = CommandRunner::new(publisher.clone());
        let step = Step::deploy("deploy", DeployConfig::default());

        runner.run(&step, &context(dir.path())).unwrap();

        assert_eq!(publisher.calls.lock().clone(), vec![DeployConfig::default()]);
    }
}
