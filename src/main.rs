//! relnotes - run the release-notes documentation pipeline
//!
//! ## Commands
//!
//! - `relnotes run` - Run the pipeline for a push event
//! - `relnotes plan` - Show what a run would do
//! - `relnotes check` - Validate the pipeline definition and host tools
//! - `relnotes export` - Convert the pipeline to a GitHub Actions workflow
//! - `relnotes completions` - Generate shell completions
//!
//! ## Quick Start
//!
//! ```bash
//! # Run for the branch checked out in the current directory
//! relnotes run
//!
//! # Run as CI would for a push to main
//! AUTH_TOKEN=... GITHUB_TOKEN=... relnotes run --branch main --sha "$(git rev-parse HEAD)"
//!
//! # Inspect the steps without running them
//! relnotes plan --branch main
//!
//! # Export to GitHub Actions
//! relnotes export --format github -o .github/workflows/release-notes.yml
//! ```
//!
//! Logging is controlled with `RELNOTES_LOG` (e.g. `RELNOTES_LOG=debug`).

use std::process::ExitCode;

mod cli;

fn main() -> ExitCode {
    match cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", cli::error_message(&e));
            if std::env::var("RELNOTES_VERBOSE").is_ok() {
                eprintln!("{e:?}");
            }
            ExitCode::FAILURE
        }
    }
}
