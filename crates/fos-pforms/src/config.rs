//! Rules file configuration
//!
//! Where [`Context::add_file`](crate::Context::add_file) looks for rules
//! files. Search directories are tried in order, then the default directory.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Directory searched last when no search directory holds the file
pub const DEFAULT_RULES_DIR: &str = "/usr/share/fos-pforms/rules";

/// Rules file search configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Directories tried first, in order
    pub search_dirs: Vec<PathBuf>,
    /// Directory tried after all search directories
    pub default_dir: Option<PathBuf>,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            search_dirs: Vec::new(),
            default_dir: Some(PathBuf::from(DEFAULT_RULES_DIR)),
        }
    }
}

impl RulesConfig {
    /// Build a configuration from a colon-separated directory list
    ///
    /// Empty entries are skipped; the default directory is kept.
    pub fn from_search_path(path: &str) -> Self {
        Self {
            search_dirs: path
                .split(':')
                .filter(|dir| !dir.is_empty())
                .map(PathBuf::from)
                .collect(),
            ..Self::default()
        }
    }

    /// Directories to try, in order
    pub(crate) fn candidate_dirs(&self) -> impl Iterator<Item = PathBuf> + '_ {
        self.search_dirs.iter().cloned().chain(self.default_dir.clone())
    }
}
