//! Project configuration.
//!
//! Configuration lives in `include.toml` next to the documentation it
//! serves. Every field is optional.
//!
//! # Example Configuration
//!
//! ```toml
//! # Project root, relative to this file
//! root = ".."
//!
//! # Only index these extensions (empty = every file)
//! extensions = ["rs", "py", "toml"]
//!
//! # Paths to skip, matched relative to the root
//! ignore = ["target/**", "node_modules/**"]
//!
//! # Indexed, but not checked for anchors by `docinclude check`
//! skip_anchor_check = ["docs/**/*.md"]
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::audit::AuditOptions;
use crate::project::ScanOptions;

/// Name of the configuration file looked up by [`IncludeConfig::discover`].
pub const CONFIG_FILE_NAME: &str = "include.toml";

/// Environment variable that overrides the configured root.
pub const ROOT_ENV_VAR: &str = "DOCINCLUDE_ROOT";

/// Errors that can occur when loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct IncludeConfig {
    /// Project root. Relative roots are resolved against the config file's directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,

    /// Extensions to index, without the leading dot.
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Glob patterns of paths to skip.
    #[serde(default)]
    pub ignore: Vec<String>,

    /// Glob patterns of paths the anchor audit leaves out.
    #[serde(default)]
    pub skip_anchor_check: Vec<String>,

    /// Directory the configuration was loaded from.
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

impl IncludeConfig {
    /// Load configuration from a specific path.
    ///
    /// Returns defaults if the file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.validate()?;
        config.base_dir = path.parent().map(Path::to_path_buf);

        Ok(config)
    }

    /// Load `include.toml` from `dir`, or defaults if there is none.
    pub fn discover(dir: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(&dir.join(CONFIG_FILE_NAME))?;
        if config.base_dir.is_none() {
            config.base_dir = Some(dir.to_path_buf());
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for ext in &self.extensions {
            if ext.is_empty() {
                return Err(ConfigError::Validation(
                    "Extension entries cannot be empty".into(),
                ));
            }
            if ext.starts_with('.') {
                return Err(ConfigError::Validation(format!(
                    "Extension '{ext}' must not start with '.'"
                )));
            }
        }

        compile_globs(&self.ignore)?;
        compile_globs(&self.skip_anchor_check)?;

        Ok(())
    }

    /// The effective project root.
    ///
    /// Precedence: `DOCINCLUDE_ROOT`, then `root` from the file, then the
    /// directory the configuration was loaded from.
    pub fn resolved_root(&self) -> PathBuf {
        if let Ok(root) = dotenvy::var(ROOT_ENV_VAR) {
            return PathBuf::from(root);
        }

        let base = self
            .base_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));
        match &self.root {
            Some(root) if root.is_absolute() => root.clone(),
            Some(root) => base.join(root),
            None => base,
        }
    }

    pub fn scan_options(&self) -> Result<ScanOptions, ConfigError> {
        Ok(ScanOptions {
            extensions: self.extensions.clone(),
            ignore: compile_globs(&self.ignore)?,
        })
    }

    pub fn audit_options(&self) -> Result<AuditOptions, ConfigError> {
        Ok(AuditOptions {
            skip_anchor_check: compile_globs(&self.skip_anchor_check)?,
        })
    }
}

fn compile_globs(patterns: &[String]) -> Result<Vec<glob::Pattern>, ConfigError> {
    patterns
        .iter()
        .map(|p| {
            glob::Pattern::new(p)
                .map_err(|e| ConfigError::Validation(format!("Invalid glob pattern '{p}': {e}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = IncludeConfig::load_from(&tmp.path().join("include.toml")).unwrap();
        assert!(config.extensions.is_empty());
        assert!(config.ignore.is_empty());
        assert!(config.root.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("include.toml");
        std::fs::write(
            &path,
            "root = \"src\"\nextensions = [\"rs\", \"py\"]\nignore = [\"target/**\"]\n",
        )
        .unwrap();

        let config = IncludeConfig::load_from(&path).unwrap();
        assert_eq!(config.extensions, vec!["rs", "py"]);
        assert_eq!(config.root, Some(PathBuf::from("src")));

        let options = config.scan_options().unwrap();
        assert_eq!(options.ignore.len(), 1);
        assert_eq!(options.extensions, vec!["rs", "py"]);
    }

    #[test]
    fn test_validation_rejects_dotted_extension() {
        let config = IncludeConfig {
            extensions: vec![".rs".into()],
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_validation_rejects_bad_glob() {
        let config = IncludeConfig {
            ignore: vec!["[unclosed".into()],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_relative_root_resolves_against_config_dir() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("docs").join("include.toml");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "root = \"sub\"\n").unwrap();

        let config = IncludeConfig::load_from(&path).unwrap();
        assert_eq!(config.resolved_root(), tmp.path().join("docs").join("sub"));
    }

    #[test]
    fn test_root_defaults_to_discovery_dir() {
        let tmp = TempDir::new().unwrap();
        let config = IncludeConfig::discover(tmp.path()).unwrap();
        assert_eq!(config.resolved_root(), tmp.path());

        let absolute = IncludeConfig {
            root: Some(tmp.path().join("abs")),
            ..Default::default()
        };
        assert_eq!(absolute.resolved_root(), tmp.path().join("abs"));
    }

    #[test]
    fn test_skip_anchor_check_patterns() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("include.toml");
        std::fs::write(&path, "skip_anchor_check = [\"docs/*.md\"]\n").unwrap();
        let options = IncludeConfig::load_from(&path)
            .unwrap()
            .audit_options()
            .unwrap();
        assert_eq!(options.skip_anchor_check.len(), 1);

        std::fs::write(&path, "skip_anchor_check = [\"[oops\"]\n").unwrap();
        assert!(matches!(
            IncludeConfig::load_from(&path),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_parse_error_surfaces() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("include.toml");
        std::fs::write(&path, "extensions = 3\n").unwrap();
        assert!(matches!(
            IncludeConfig::load_from(&path),
            Err(ConfigError::Parse(_))
        ));
    }
}
