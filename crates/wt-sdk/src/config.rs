use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;
use wt_diff::{DiffOptions, DEFAULT_BINARY_PROBE, DEFAULT_CONTEXT_LINES};
use wt_index::{ScanOptions, DEFAULT_MAX_DEPTH};

use crate::error::{SdkError, SdkResult};

/// Name of the control directory under the working root.
pub const DEFAULT_CONTROL_DIR: &str = ".wt";

/// Name of the config file inside the control directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Per-repository settings. Fixed once a [`crate::Repository`] is open.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepoConfig {
    pub control_dir: String,
    /// Ignore file at the working root.
    pub ignore_file: String,
    /// Extra ignore globs applied after the ignore file.
    pub extra_ignore: Vec<String>,
    pub max_tree_depth: usize,
    pub binary_probe_len: usize,
    pub context_lines: usize,
    pub follow_symlinks: bool,
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            control_dir: DEFAULT_CONTROL_DIR.into(),
            ignore_file: ".wtignore".into(),
            extra_ignore: Vec::new(),
            max_tree_depth: DEFAULT_MAX_DEPTH,
            binary_probe_len: DEFAULT_BINARY_PROBE,
            context_lines: DEFAULT_CONTEXT_LINES,
            follow_symlinks: true,
        }
    }
}

impl RepoConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml(text: &str) -> SdkResult<Self> {
        toml::from_str(text).map_err(|e| SdkError::Config(e.to_string()))
    }

    /// Read `config.toml` from `control` if it exists.
    pub fn load(control: &Path) -> SdkResult<Self> {
        let path = control.join(CONFIG_FILE);
        match fs::read_to_string(&path) {
            Ok(text) => Self::from_toml(&text),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            max_depth: self.max_tree_depth,
            follow_symlinks: self.follow_symlinks,
        }
    }

    pub fn diff_options(&self) -> DiffOptions {
        DiffOptions {
            context_lines: self.context_lines,
            binary_probe_len: self.binary_probe_len,
            max_depth: self.max_tree_depth,
        }
    }
}
