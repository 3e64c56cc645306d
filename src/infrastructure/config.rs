//! Configuration management
//!
//! Settings are read from `.relnotes/config.yml` in the working directory.
//! Every field is optional; a missing file yields the defaults.

use crate::pipeline::PipelineError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Location of the config file, relative to the working directory
pub const CONFIG_FILE: &str = ".relnotes/config.yml";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Pipeline definition file; the built-in pipeline is used when absent
    pub definition: PathBuf,
    /// Shell used to run step commands
    pub shell: String,
    /// Remote that receives the published build output
    pub remote: String,
    /// Log level used when `RELNOTES_LOG` is unset
    pub log_level: String,
    /// Echo command output while it runs
    pub streaming: bool,
    /// Refuse to start while another run holds the working directory
    pub lock: bool,
    /// Author of the publish commit
    pub commit_author: String,
    /// Email of the publish commit author
    pub commit_email: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            definition: PathBuf::from("relnotes.yml"),
            shell: "sh".to_string(),
            remote: "origin".to_string(),
            log_level: "info".to_string(),
            streaming: true,
            lock: true,
            commit_author: "relnotes".to_string(),
            commit_email: "relnotes@users.noreply.github.com".to_string(),
        }
    }
}

impl Config {
    /// Loads the config for a working directory
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Definition`] if the file exists but is not
    /// valid YAML, and [`PipelineError::Io`] if it cannot be read.
    pub fn load(workdir: &Path) -> Result<Self, PipelineError> {
        let path = workdir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let source = std::fs::read_to_string(&path)?;
        if source.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&source)
            .map_err(|e| PipelineError::Definition(format!("{}: {e}", path.display())))
    }

    /// Definition file resolved against the working directory
    #[must_use]
    pub fn definition_path(&self, workdir: &Path) -> PathBuf {
        workdir.join(&self.definition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.shell, "sh");
        assert_eq!(config.remote, "origin");
        assert_eq!(config.log_level, "info");
        assert!(config.lock);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Config::load(dir.path()).unwrap(), Config::default());
    }

    #[test]
    fn test_partial_file_overrides() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".relnotes")).unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "remote: upstream\nlog_level: debug\nstreaming: false\n",
        )
        .unwrap();

        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.remote, "upstream");
        assert_eq!(config.log_level, "debug");
        assert!(!config.streaming);
        assert_eq!(config.shell, "sh");
    }

    #[test]
    fn test_invalid_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".relnotes")).unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "lock: [not, a, bool]\n").unwrap();

        assert!(matches!(
            Config::load(dir.path()),
            Err(PipelineError::Definition(_))
        ));
    }

    #[test]
    fn test_definition_path() {
        let config = Config::default();
        assert_eq!(
            config.definition_path(Path::new("/work")),
            PathBuf::from("/work/relnotes.yml")
        );
    }
}
