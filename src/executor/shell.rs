//! Shell execution module
//!
//! Runs one command line through `sh -c` in the step's working directory,
//! with exactly the environment the executor prepared for that step. The
//! child does not inherit the parent's environment, so a secret reaches only
//! the steps that declare it.
//!
//! Output is echoed to the terminal as it arrives (streaming mode) or only
//! kept in the result (captured mode). Either way, every known secret value
//! is replaced with `***` before it is printed, logged or returned.

use crate::pipeline::{PipelineError, SecretMask};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shell execution configuration
#[derive(Debug, Clone)]
pub struct ShellConfig {
    /// Working directory
    pub cwd: PathBuf,

    /// Complete environment of the child process
    pub env: HashMap<String, String>,

    /// Shell to use (default: sh)
    pub shell: String,

    /// Echo output line by line while the command runs
    pub streaming: bool,

    /// Secret values to hide in output and errors
    pub mask: SecretMask,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            cwd: std::env::current_dir().unwrap_or_default(),
            env: HashMap::new(),
            shell: "sh".to_string(),
            streaming: false,
            mask: SecretMask::default(),
        }
    }
}

/// Result of shell command execution
#[derive(Debug, Clone)]
pub struct ShellResult {
    /// Standard output (secrets masked)
    pub stdout: String,

    /// Standard error (secrets masked)
    pub stderr: String,

    /// Exit code
    pub exit_code: i32,

    /// Duration of execution
    pub duration: Duration,
}

impl ShellResult {
    /// Returns true if command succeeded (exit code 0)
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }

    /// Combined stdout and stderr
    #[must_use]
    pub fn combined_output(&self) -> String {
        format!("{}{}", self.stdout, self.stderr)
    }
}

/// Builder for shell commands
#[derive(Debug, Clone)]
pub struct ShellCommand<'a> {
    config: &'a ShellConfig,
}

impl<'a> ShellCommand<'a> {
    /// Creates a new shell command builder
    #[must_use]
    pub fn new(config: &'a ShellConfig) -> Self {
        Self { config }
    }

    /// Executes a shell command
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Io`] if the shell cannot be started and
    /// [`PipelineError::CommandFailed`] if the command exits non-zero.
    pub fn execute(&self, command: &str) -> Result<ShellResult, PipelineError> {
        tracing::debug!(
            command = %self.config.mask.apply(command),
            cwd = %self.config.cwd.display(),
            "Executing shell command"
        );

        let mut cmd = Command::new(&self.config.shell);
        cmd.arg("-c")
            .arg(command)
            .current_dir(&self.config.cwd)
            .env_clear()
            .envs(&self.config.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let start = Instant::now();
        let (stdout, stderr, exit_code) = if self.config.streaming {
            self.execute_streaming(cmd)?
        } else {
            self.execute_captured(cmd)?
        };

        let result = ShellResult {
            stdout,
            stderr,
            exit_code,
            duration: start.elapsed(),
        };

        tracing::debug!(
            exit_code = result.exit_code,
            duration_ms = result.duration.as_millis(),
            "Shell command finished"
        );

        if !result.is_success() {
            return Err(PipelineError::CommandFailed {
                code: result.exit_code,
                stderr: result.stderr,
            });
        }

        Ok(result)
    }

    /// Executes command with captured output
    fn execute_captured(&self, mut cmd: Command) -> Result<(String, String, i32), PipelineError> {
        let output = cmd
            .output()
            .map_err(|e| PipelineError::Io(format!("failed to start {}: {e}", self.config.shell)))?;

        let stdout = self
            .config
            .mask
            .apply(&String::from_utf8_lossy(&output.stdout));
        let stderr = self
            .config
            .mask
            .apply(&String::from_utf8_lossy(&output.stderr));

        // stdout stays clean for machine readable output
        if !stdout.is_empty() {
            tracing::debug!(output = %stdout.trim_end(), "Command stdout");
        }
        if !stderr.is_empty() {
            tracing::debug!(output = %stderr.trim_end(), "Command stderr");
        }

        Ok((stdout, stderr, output.status.code().unwrap_or(-1)))
    }

    /// Executes command with streaming output
    fn execute_streaming(&self, mut cmd: Command) -> Result<(String, String, i32), PipelineError> {
        let mut child = cmd
            .spawn()
            .map_err(|e| PipelineError::Io(format!("failed to start {}: {e}", self.config.shell)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| PipelineError::Io("child stdout not captured".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| PipelineError::Io("child stderr not captured".to_string()))?;

        let stdout_buf = Arc::new(Mutex::new(String::new()));
        let stderr_buf = Arc::new(Mutex::new(String::new()));

        let stdout_thread = spawn_reader(stdout, Arc::clone(&stdout_buf), self.config.mask.clone(), false);
        let stderr_thread = spawn_reader(stderr, Arc::clone(&stderr_buf), self.config.mask.clone(), true);

        let status = child.wait().map_err(|e| PipelineError::Io(e.to_string()))?;
        let _ = stdout_thread.join();
        let _ = stderr_thread.join();

        let stdout = stdout_buf.lock().clone();
        let stderr = stderr_buf.lock().clone();

        Ok((stdout, stderr, status.code().unwrap_or(-1)))
    }
}

fn spawn_reader<R: Read + Send + 'static>(
    source: R,
    buffer: Arc<Mutex<String>>,
    mask: SecretMask,
    to_stderr: bool,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        let mut reader = BufReader::new(source);
        let mut raw = Vec::new();
        // drain to EOF so the child never sees a closed pipe
        loop {
            raw.clear();
            match reader.read_until(b'\n', &mut raw) {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to read command output");
                    break;
                }
            }
            let decoded = String::from_utf8_lossy(&raw);
            let line = mask.apply(decoded.trim_end_matches(['\n', '\r']));
            if to_stderr {
                eprintln!("{line}");
            } else {
                println!("{line}");
            }
            let mut guard = buffer.lock();
            guard.push_str(&line);
            guard.push('\n');
        }
    })
}
