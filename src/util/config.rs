//! Configuration file support for depfinder.
//!
//! Two configuration file locations are read:
//! - Global: `<config dir>/depfinder/config.toml` - User-wide defaults
//! - Project: `.depfinder/config.toml` - Overrides for the working directory
//!
//! Project config takes precedence over global config.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::solution::DEFAULT_PROJECT_EXTENSIONS;
use crate::index::lexical::{DEFAULT_SKIP_DIRS, DEFAULT_SOURCE_EXTENSIONS};
use crate::ops::scan::{DEFAULT_EXCLUDES, DEFAULT_SOLUTION_EXTENSIONS};

/// depfinder configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Filesystem scan settings
    pub scan: ScanConfig,

    /// Source indexing settings
    pub index: IndexConfig,

    /// Reference search settings
    pub search: SearchConfig,
}

/// Scan-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Extensions of solution descriptors (default: `sln`)
    pub solution_extensions: Option<Vec<String>>,

    /// Extensions of project descriptors (default: `csproj`, `vbproj`, `fsproj`)
    pub project_extensions: Option<Vec<String>>,

    /// Glob patterns of directories to skip while walking
    pub exclude: Option<Vec<String>>,

    /// Follow symbolic links while walking
    pub follow_links: Option<bool>,
}

/// Indexer-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Extensions of source files to index (default: `cs`)
    pub source_extensions: Option<Vec<String>>,

    /// Directory names skipped inside a project (default: `bin`, `obj`)
    pub exclude_dirs: Option<Vec<String>>,
}

/// Search-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Abort a reference search after this many seconds
    pub timeout_secs: Option<u64>,
}

fn owned(defaults: &[&str]) -> Vec<String> {
    defaults.iter().map(|s| s.to_string()).collect()
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.scan.solution_extensions.is_some() {
            self.scan.solution_extensions = other.scan.solution_extensions;
        }
        if other.scan.project_extensions.is_some() {
            self.scan.project_extensions = other.scan.project_extensions;
        }
        if other.scan.exclude.is_some() {
            self.scan.exclude = other.scan.exclude;
        }
        if other.scan.follow_links.is_some() {
            self.scan.follow_links = other.scan.follow_links;
        }

        if other.index.source_extensions.is_some() {
            self.index.source_extensions = other.index.source_extensions;
        }
        if other.index.exclude_dirs.is_some() {
            self.index.exclude_dirs = other.index.exclude_dirs;
        }

        if other.search.timeout_secs.is_some() {
            self.search.timeout_secs = other.search.timeout_secs;
        }
    }

    pub fn solution_extensions(&self) -> Vec<String> {
        self.scan
            .solution_extensions
            .clone()
            .unwrap_or_else(|| owned(DEFAULT_SOLUTION_EXTENSIONS))
    }

    pub fn project_extensions(&self) -> Vec<String> {
        self.scan
            .project_extensions
            .clone()
            .unwrap_or_else(|| owned(DEFAULT_PROJECT_EXTENSIONS))
    }

    pub fn exclude(&self) -> Vec<String> {
        self.scan
            .exclude
            .clone()
            .unwrap_or_else(|| owned(DEFAULT_EXCLUDES))
    }

    pub fn follow_links(&self) -> bool {
        self.scan.follow_links.unwrap_or(false)
    }

    pub fn source_extensions(&self) -> Vec<String> {
        self.index
            .source_extensions
            .clone()
            .unwrap_or_else(|| owned(DEFAULT_SOURCE_EXTENSIONS))
    }

    pub fn index_exclude_dirs(&self) -> Vec<String> {
        self.index
            .exclude_dirs
            .clone()
            .unwrap_or_else(|| owned(DEFAULT_SKIP_DIRS))
    }

    /// Configured search timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.search.timeout_secs.map(Duration::from_secs)
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.depfinder/config.toml)
/// 2. Global config
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        if global_path.exists() {
            config.merge(Config::load_or_default(global_path));
        }
    }

    if project_path.exists() {
        config.merge(Config::load_or_default(project_path));
    }

    config
}

/// Get the global config path.
pub fn global_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("com", "depfinder", "depfinder")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Get the project config path (.depfinder/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".depfinder").join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.solution_extensions(), vec!["sln"]);
        assert_eq!(config.project_extensions(), vec!["csproj", "vbproj", "fsproj"]);
        assert_eq!(config.source_extensions(), vec!["cs"]);
        assert!(config.exclude().contains(&"node_modules".to_string()));
        assert!(!config.follow_links());
        assert!(config.timeout().is_none());
    }

    #[test]
    fn test_config_load() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");

        std::fs::write(
            &config_path,
            r#"
[scan]
solution_extensions = ["sln", "slnf"]
exclude = ["archive"]

[index]
source_extensions = ["cs", "vb"]

[search]
timeout_secs = 30
"#,
        )
        .unwrap();

        let config = Config::load(&config_path).unwrap();
        assert_eq!(config.solution_extensions(), vec!["sln", "slnf"]);
        assert_eq!(config.exclude(), vec!["archive"]);
        assert_eq!(config.source_extensions(), vec!["cs", "vb"]);
        assert_eq!(config.timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_config_merge() {
        let mut base = Config::default();
        base.scan.exclude = Some(vec!["a".to_string()]);
        base.search.timeout_secs = Some(10);

        let mut override_cfg = Config::default();
        override_cfg.search.timeout_secs = Some(60);

        base.merge(override_cfg);

        assert_eq!(base.search.timeout_secs, Some(60));
        assert_eq!(base.scan.exclude, Some(vec!["a".to_string()])); // Not overridden
    }

    #[test]
    fn test_invalid_config_falls_back_to_default() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        std::fs::write(&config_path, "[search]\ntimeout_secs = \"soon\"\n").unwrap();

        assert!(Config::load(&config_path).is_err());
        let config = Config::load_or_default(&config_path);
        assert!(config.timeout().is_none());
    }

    #[test]
    fn test_load_config_precedence() {
        let tmp = TempDir::new().unwrap();
        let global_path = tmp.path().join("global.toml");
        let project_path = tmp.path().join("project.toml");

        std::fs::write(
            &global_path,
            "[scan]\nfollow_links = true\n\n[search]\ntimeout_secs = 5\n",
        )
        .unwrap();
        std::fs::write(&project_path, "[search]\ntimeout_secs = 120\n").unwrap();

        let config = load_config(Some(&global_path), &project_path);

        assert!(config.follow_links());
        assert_eq!(config.timeout(), Some(Duration::from_secs(120)));
    }
}
