use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::EvalError;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub schema_version: u32,

    // Inputs
    pub references_dir: PathBuf,
    pub reference_extensions: Vec<String>,
    pub results_dir: PathBuf,

    // Transcript format
    pub markers: Markers,
    pub required_fields: Vec<String>,
    pub document_field: String,
    /// Extract documents from the raw block, so drafts written inside
    /// reasoning traces are scored too
    pub score_reasoning_drafts: bool,

    // Outputs
    pub score_output: PathBuf,
    pub timing_output: PathBuf,
    pub tee_base_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: 1,
            references_dir: PathBuf::from("doctorNotes"),
            reference_extensions: vec!["txt".to_string()],
            results_dir: PathBuf::from("results"),
            markers: Markers::default(),
            required_fields: vec![
                "original_document".to_string(),
                "diagnostic_codes".to_string(),
                "diagnoses".to_string(),
            ],
            document_field: "original_document".to_string(),
            score_reasoning_drafts: true,
            score_output: PathBuf::from("results.csv"),
            timing_output: PathBuf::from("times.csv"),
            tee_base_name: "output".to_string(),
        }
    }
}

impl Config {
    /// Load config from file, or create default
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .context("Failed to read config file")?;
            let config = serde_json::from_str(&content)
                .map_err(|e| EvalError::Config(format!("{}: {}", path.display(), e)))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .context("Failed to serialize config")?;
        std::fs::write(path, content)
            .context("Failed to write config file")
    }

    /// Get the default config directory
    pub fn default_config_dir() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .context("Failed to get home directory")?;
        Ok(home.join(".medcode-eval"))
    }

    /// Get the default config file path
    pub fn default_config_path() -> Result<PathBuf> {
        Ok(Self::default_config_dir()?.join("config.json"))
    }

    /// Resolve a transcript name typed at the prompt against the results directory
    pub fn resolve_result_path(&self, name: &str) -> PathBuf {
        self.results_dir.join(name)
    }
}

/// Textual markers that delimit model invocations inside a transcript.
///
/// Zero-shot and RAG transcripts share one schema; only these tokens differ
/// between log shapes, so they live in config rather than in the parsers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Markers {
    /// Any of these opens a block for the completion-marker strategy
    pub block_start: Vec<String>,
    /// Closes a block for the completion-marker strategy
    pub block_end: String,
    /// Text before the model name in a query header
    pub query_prefix: String,
    /// Text after the model name in a query header
    pub query_suffix: String,
    /// Closes a block for the model-header strategy
    pub time_marker: String,
    /// Unit word that follows the elapsed time
    pub time_unit: String,
    pub reasoning_open: String,
    pub reasoning_close: String,
}

impl Default for Markers {
    fn default() -> Self {
        Self {
            block_start: vec!["</think>".to_string(), "please wait...".to_string()],
            block_end: "Time to completion".to_string(),
            query_prefix: "Starting query using model".to_string(),
            query_suffix: "please wait...".to_string(),
            time_marker: "Time:".to_string(),
            time_unit: "seconds".to_string(),
            reasoning_open: "<think>".to_string(),
            reasoning_close: "</think>".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.schema_version, 1);
        assert_eq!(config.document_field, "original_document");
        assert_eq!(config.required_fields.len(), 3);
        assert_eq!(config.markers.block_end, "Time to completion");
        assert!(config.score_reasoning_drafts);
    }

    #[test]
    fn test_load_missing_file_gives_default() {
        let dir = tempdir().unwrap();
        let config = Config::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config.references_dir, PathBuf::from("doctorNotes"));
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"references_dir": "notes", "markers": {"time_marker": "Elapsed:"}}"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.references_dir, PathBuf::from("notes"));
        assert_eq!(config.markers.time_marker, "Elapsed:");
        assert_eq!(config.markers.reasoning_open, "<think>");
        assert_eq!(config.tee_base_name, "output");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut config = Config::default();
        config.required_fields = vec!["original_document".to_string()];
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.required_fields, vec!["original_document".to_string()]);
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err.downcast_ref::<EvalError>(), Some(EvalError::Config(_))));
    }

    #[test]
    fn test_resolve_result_path() {
        let config = Config::default();
        assert_eq!(
            config.resolve_result_path("zeroshot/output001.txt"),
            PathBuf::from("results/zeroshot/output001.txt")
        );
    }
}
