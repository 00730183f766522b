//! Global context for depfinder operations.
//!
//! Provides centralized access to the working directory and the merged
//! configuration, and builds per-call options from them.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};

use crate::index::lexical::LexicalIndexer;
use crate::ops::open::OpenOptions;
use crate::ops::scan::ScanOptions;
use crate::resolver::FindOptions;
use crate::util::cancel::CancelToken;
use crate::util::config::{global_config_path, load_config, project_config_path, Config};

/// Global context containing configuration and paths.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Merged global + project configuration
    config: Config,
}

impl GlobalContext {
    /// Create a new GlobalContext for the process working directory.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Ok(Self::with_cwd(cwd))
    }

    /// Create a GlobalContext with a specific working directory.
    pub fn with_cwd(cwd: PathBuf) -> Self {
        let global = global_config_path();
        let config = load_config(global.as_deref(), &project_config_path(&cwd));

        GlobalContext { cwd, config }
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Get the current working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Resolve a user-supplied path against the working directory.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }

    /// Get the merged configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Scan options from configuration.
    pub fn scan_options(&self, cancel: CancelToken) -> ScanOptions {
        ScanOptions {
            solution_extensions: self.config.solution_extensions(),
            project_extensions: self.config.project_extensions(),
            exclude: self.config.exclude(),
            follow_links: self.config.follow_links(),
            cancel,
        }
    }

    /// Open options from configuration.
    pub fn open_options(&self, cancel: CancelToken) -> OpenOptions {
        OpenOptions {
            project_extensions: self.config.project_extensions(),
            cancel,
        }
    }

    /// Reference search options; `timeout` overrides the configured one.
    pub fn find_options(&self, timeout: Option<Duration>) -> FindOptions {
        let mut cancel = CancelToken::new();
        if let Some(timeout) = timeout.or_else(|| self.config.timeout()) {
            cancel = cancel.timeout(timeout);
        }

        FindOptions {
            scan: self.scan_options(cancel.clone()),
            open: self.open_options(cancel.clone()),
            cancel,
        }
    }

    /// The bundled source indexer, configured.
    pub fn indexer(&self) -> LexicalIndexer {
        LexicalIndexer::new()
            .with_source_extensions(self.config.source_extensions())
            .with_skip_dirs(self.config.index_exclude_dirs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_context_paths() {
        let ctx = GlobalContext::new().unwrap();
        assert!(ctx.cwd().is_absolute());
        assert_eq!(
            ctx.resolve_path(Path::new("sub")),
            ctx.cwd().join("sub")
        );
    }

    #[test]
    fn test_project_config_is_loaded() {
        let tmp = TempDir::new().unwrap();
        let config_dir = tmp.path().join(".depfinder");
        std::fs::create_dir_all(&config_dir).unwrap();
        std::fs::write(
            config_dir.join("config.toml"),
            "[scan]\nexclude = [\"legacy\"]\n\n[search]\ntimeout_secs = 9\n",
        )
        .unwrap();

        let ctx = GlobalContext::with_cwd(tmp.path().to_path_buf());
        assert_eq!(ctx.scan_options(CancelToken::new()).exclude, vec!["legacy"]);
        assert_eq!(ctx.config().timeout(), Some(Duration::from_secs(9)));
    }

    #[test]
    fn test_find_options_share_cancel_token() {
        let ctx = GlobalContext::with_cwd(PathBuf::from("/")).with_config(Config::default());
        let opts = ctx.find_options(None);

        opts.cancel.cancel();
        assert!(opts.scan.cancel.is_cancelled());
        assert!(opts.open.cancel.is_cancelled());
    }
}
