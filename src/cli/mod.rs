//! Command line interface for relnotes
//!
//! - `run`: Execute the pipeline for a push event
//! - `plan`: Show what a run would do without running anything
//! - `check`: Validate the pipeline definition and the host
//! - `export`: Write the pipeline as a GitHub Actions workflow or definition
//! - `completions`: Generate shell completions

pub mod check;
pub mod completions;
pub mod export;
pub mod run;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use relnotes::executor::{CommandRunner, ExecutorConfig, LocalExecutor};
use relnotes::infrastructure::{Config, GitPagesPublisher, init_logging};
use relnotes::pipeline::{Pipeline, PushEvent, SecretStore};
use std::path::{Path, PathBuf};
use std::process::Command as Process;
use std::sync::Arc;

/// CLI arguments for relnotes
#[derive(Parser, Debug)]
#[command(name = "relnotes")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Working directory (the checked-out source tree)
    #[arg(short = 'C', long, global = true, default_value = ".")]
    workdir: PathBuf,

    /// Pipeline definition file; overrides the configured one
    #[arg(short, long, global = true)]
    file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the pipeline for a push event
    Run {
        #[command(flatten)]
        event: EventArgs,
        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
        /// Do not take the run lock
        #[arg(long)]
        no_lock: bool,
        /// Capture command output instead of echoing it
        #[arg(short, long)]
        quiet: bool,
    },

    /// Show the steps a run would execute
    Plan {
        #[command(flatten)]
        event: EventArgs,
        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate the pipeline definition and the host tools
    Check,

    /// Export the pipeline
    Export {
        /// Export format
        #[arg(long, value_enum, default_value_t = ExportFormatArg::Github)]
        format: ExportFormatArg,
        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate shell completions
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: ShellArg,
        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Push event selection
#[derive(clap::Args, Debug, Clone, Default)]
struct EventArgs {
    /// Pushed branch
    #[arg(short, long, conflicts_with = "git_ref")]
    branch: Option<String>,
    /// Full pushed ref, e.g. refs/heads/main
    #[arg(long = "ref")]
    git_ref: Option<String>,
    /// Pushed commit
    #[arg(long)]
    sha: Option<String>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ExportFormatArg {
    Github,
    Definition,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ShellArg {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

/// Build the CLI command for completion generation
pub fn build_cli() -> clap::Command {
    Args::command()
}

/// Parse and execute CLI arguments
pub fn run() -> Result<()> {
    let args = Args::parse();
    let workdir = args.workdir.clone();
    let config = Config::load(&workdir)
        .with_context(|| format!("Failed to load config in {}", workdir.display()))?;

    init_logging(&config.log_level);

    match args.command {
        Command::Run {
            event,
            json,
            no_lock,
            quiet,
        } => {
            let pipeline = load_pipeline(&workdir, args.file.as_deref(), &config)?;
            let event = resolve_event(&event, &workdir, |key| std::env::var(key).ok())?;
            let secrets = SecretStore::from_env(pipeline.secret_names());
            let executor = executor(&workdir, &config)
                .with_config(ExecutorConfig {
                    cwd: workdir.clone(),
                    shell: config.shell.clone(),
                    inherit_env: true,
                    streaming: config.streaming && !quiet && !json,
                    lock: config.lock && !no_lock,
                })
                .with_secrets(secrets);
            run::run_pipeline(&executor, &pipeline, &event, json)?;
        }
        Command::Plan { event, json } => {
            let pipeline = load_pipeline(&workdir, args.file.as_deref(), &config)?;
            let event = resolve_event(&event, &workdir, |key| std::env::var(key).ok())?;
            let output = run::plan_pipeline(&executor(&workdir, &config), &pipeline, &event, json)?;
            println!("{output}");
        }
        Command::Check => {
            let pipeline = load_pipeline(&workdir, args.file.as_deref(), &config)?;
            let secrets = SecretStore::from_env(pipeline.secret_names());
            let report = check::check_pipeline(&pipeline, &secrets, &executor(&workdir, &config));
            println!("{report}");
            if !report.is_ok() {
                anyhow::bail!("{} problem(s) found", report.errors.len());
            }
        }
        Command::Export { format, output } => {
            let pipeline = load_pipeline(&workdir, args.file.as_deref(), &config)?;
            let format = match format {
                ExportFormatArg::Github => export::ExportFormat::GitHubActions,
                ExportFormatArg::Definition => export::ExportFormat::Definition,
            };
            let exported = export::export_pipeline(&pipeline, format)?;

            if let Some(output_path) = output {
                export::save_export(&exported, &output_path)?;
            } else {
                print!("{exported}");
            }
        }
        Command::Completions { shell, output } => {
            use clap_complete::Shell;

            let shell_enum = match shell {
                ShellArg::Bash => Shell::Bash,
                ShellArg::Zsh => Shell::Zsh,
                ShellArg::Fish => Shell::Fish,
                ShellArg::PowerShell => Shell::PowerShell,
            };

            let completions = completions::generate_completions(shell_enum)?;

            if let Some(output_path) = output {
                completions::save_completions(&completions, &output_path)?;
            } else {
                print!("{completions}");
            }
        }
    }

    Ok(())
}

/// Renders an error with its whole cause chain
pub fn error_message(err: &anyhow::Error) -> String {
    format!("Error: {err:#}")
}

fn executor(workdir: &Path, config: &Config) -> LocalExecutor {
    let publisher = GitPagesPublisher {
        remote: config.remote.clone(),
        author_name: config.commit_author.clone(),
        author_email: config.commit_email.clone(),
    };
    LocalExecutor::with_runner(Arc::new(CommandRunner::new(Arc::new(publisher))))
        .with_cwd(workdir)
        .with_shell(config.shell.clone())
}

/// Loads the pipeline to run
///
/// An explicit `--file` must exist. Otherwise the configured definition is
/// used when present, falling back to the built-in release-notes pipeline.
fn load_pipeline(workdir: &Path, file: Option<&Path>, config: &Config) -> Result<Pipeline> {
    if let Some(file) = file {
        let path = workdir.join(file);
        return Pipeline::from_file(&path)
            .with_context(|| format!("Failed to load pipeline: {}", path.display()));
    }

    let path = config.definition_path(workdir);
    if path.exists() {
        tracing::debug!(path = %path.display(), "Loading pipeline definition");
        return Pipeline::from_file(&path)
            .with_context(|| format!("Failed to load pipeline: {}", path.display()));
    }

    tracing::debug!("No pipeline definition found, using the built-in pipeline");
    Ok(Pipeline::release_notes())
}

/// Determines the push event
///
/// Explicit flags win, then `GITHUB_REF`/`GITHUB_SHA`, then the branch
/// checked out in `workdir`.
fn resolve_event<F>(args: &EventArgs, workdir: &Path, env: F) -> Result<PushEvent>
where
    F: Fn(&str) -> Option<String>,
{
    let git_ref = match (&args.git_ref, &args.branch) {
        (Some(git_ref), _) => git_ref.clone(),
        (None, Some(branch)) => format!("refs/heads/{branch}"),
        (None, None) => match env("GITHUB_REF").filter(|r| !r.is_empty()) {
            Some(git_ref) => git_ref,
            None => current_ref(workdir).context(
                "Cannot determine the pushed ref; pass --branch or --ref, or set GITHUB_REF",
            )?,
        },
    };

    let mut event = PushEvent::new(git_ref);
    if let Some(sha) = args.sha.clone().or_else(|| env("GITHUB_SHA")) {
        event = event.with_sha(sha);
    }
    Ok(event)
}

fn current_ref(workdir: &Path) -> Result<String> {
    let output = Process::new("git")
        .args(["symbolic-ref", "-q", "HEAD"])
        .current_dir(workdir)
        .output()
        .context("Failed to execute git")?;
    if !output.status.success() {
        anyhow::bail!("HEAD is not on a branch");
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
