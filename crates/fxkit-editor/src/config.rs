//! Editor Configuration

use std::path::{Path, PathBuf};

use fxkit_fxom::SaveOptions;
use fxkit_metadata::FormatVersion;
use serde::{Deserialize, Serialize};

use crate::{EditorError, EditorResult};

/// Editor configuration options
///
/// Read from JSON; fields left out take their default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Format version documents are saved for
    pub target_version: String,

    /// Save without comments and formatting whitespace
    pub compact: bool,

    /// Regenerate import instructions on save
    pub update_imports: bool,

    /// Undo depth, 0 for unbounded
    pub history_limit: usize,

    /// Directories scanned for components in the background
    pub library_paths: Vec<PathBuf>,

    /// Component catalogs loaded into the registry at startup
    pub catalogs: Vec<PathBuf>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            target_version: "8".to_string(),
            compact: false,
            update_imports: false,
            history_limit: fxkit_job::DEFAULT_HISTORY_LIMIT,
            library_paths: Vec::new(),
            catalogs: Vec::new(),
        }
    }
}

impl EditorConfig {
    /// Load a JSON configuration file
    pub fn load(path: impl AsRef<Path>) -> EditorResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| EditorError::io(path, e))?;
        let config = Self::from_json(&text)?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_json(json: &str) -> EditorResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> EditorResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn target_version(&self) -> EditorResult<FormatVersion> {
        Ok(self.target_version.parse()?)
    }

    /// Save settings for this configuration
    pub fn save_options(&self) -> EditorResult<SaveOptions> {
        Ok(SaveOptions::for_version(self.target_version()?)
            .compact(self.compact)
            .update_imports(self.update_imports))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EditorConfig::default();
        assert_eq!(config.target_version, "8");
        assert!(!config.compact);
        assert!(!config.update_imports);
        assert_eq!(config.history_limit, 200);
        assert!(config.library_paths.is_empty());
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let config = EditorConfig::from_json(r#"{ "compact": true, "library_paths": ["lib"] }"#).unwrap();
        assert!(config.compact);
        assert_eq!(config.target_version, "8");
        assert_eq!(config.library_paths, vec![PathBuf::from("lib")]);
    }

    #[test]
    fn test_save_options() {
        let config = EditorConfig {
            target_version: "2.1".into(),
            update_imports: true,
            ..EditorConfig::default()
        };
        let options = config.save_options().unwrap();
        assert_eq!(options.target_version.unwrap().to_string(), "2.1");
        assert!(options.update_imports);
        assert!(!options.compact);
    }

    #[test]
    fn test_invalid_version() {
        let config = EditorConfig {
            target_version: "eight".into(),
            ..EditorConfig::default()
        };
        assert!(matches!(config.save_options(), Err(EditorError::Metadata(_))));
    }

    #[test]
    fn test_json_round_trip() {
        let config = EditorConfig {
            history_limit: 0,
            ..EditorConfig::default()
        };
        let back = EditorConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_load_missing_file() {
        let result = EditorConfig::load("/nonexistent/fxkit.json");
        assert!(matches!(result, Err(EditorError::Io { .. })));
    }
}
