//! `relnotes export` - Write the pipeline in other formats

use anyhow::{Context, Result};
use relnotes::infrastructure::GitHubActionsBackend;
use relnotes::pipeline::Pipeline;
use std::fs;
use std::path::Path;

/// Export targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// GitHub Actions workflow
    GitHubActions,
    /// The pipeline's own YAML definition
    Definition,
}

/// Renders `pipeline` in `format`
pub fn export_pipeline(pipeline: &Pipeline, format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::GitHubActions => GitHubActionsBackend::default()
            .translate(pipeline)
            .context("Failed to translate pipeline to GitHub Actions"),
        ExportFormat::Definition => pipeline
            .to_yaml()
            .context("Failed to serialize pipeline definition"),
    }
}

/// Writes exported content, creating parent directories as needed
pub fn save_export(content: &str, output_path: &Path) -> Result<()> {
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    fs::write(output_path, content)
        .with_context(|| format!("Failed to write export to: {}", output_path.display()))?;
    Ok(())
}
