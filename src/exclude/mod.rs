//! Exclusion matching.
//!
//! Directory and file names are checked against two independent ordered
//! lists of shell-glob patterns, each loaded from a JSON document carrying a
//! platform-common list and per-OS extras. A directory match prunes the
//! whole subtree; a file match excludes only that file. Hidden names are a
//! baseline rule, independent of the lists.

use anyhow::{Context, Result};
use globset::{Glob, GlobMatcher};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::warn;

pub mod defaults;

/// On-disk shape of an exclusion document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExclusionConfig {
    #[serde(default)]
    pub common: Vec<String>,
    #[serde(default)]
    pub os_specific: BTreeMap<String, Vec<String>>,
}

impl ExclusionConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read exclusion document {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("invalid exclusion document {}", path.display()))
    }

    /// Union of the common list and the running platform's extras, keeping
    /// list order (common first).
    pub fn for_platform(&self, os_key: &str) -> Vec<String> {
        let mut patterns = self.common.clone();
        if let Some(extra) = self.os_specific.get(os_key) {
            patterns.extend(extra.iter().cloned());
        }
        patterns
    }
}

/// An ordered list of compiled glob patterns.
///
/// Patterns are compiled one by one so a malformed entry skips only itself;
/// evaluation preserves list order and stops at the first match.
#[derive(Debug, Clone, Default)]
pub struct PatternList {
    patterns: Vec<(String, GlobMatcher)>,
}

impl PatternList {
    pub fn compile(raw: &[String]) -> Self {
        let mut patterns = Vec::with_capacity(raw.len());
        for pattern in raw {
            match Glob::new(pattern) {
                Ok(glob) => patterns.push((pattern.clone(), glob.compile_matcher())),
                Err(e) => warn!(pattern = %pattern, "skipping malformed exclusion pattern: {e}"),
            }
        }
        PatternList { patterns }
    }

    /// First pattern matching the name, if any.
    pub fn first_match(&self, name: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|(_, matcher)| matcher.is_match(name))
            .map(|(pattern, _)| pattern.as_str())
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Directory- and file-name exclusions merged for the running platform.
#[derive(Debug, Clone)]
pub struct ExclusionSet {
    pub directories: PatternList,
    pub files: PatternList,
}

impl ExclusionSet {
    /// Load both exclusion documents and compile them for `os_key`.
    ///
    /// A missing or unreadable document is not fatal: the built-in defaults
    /// stand in for it, with a warning. Only the taxonomy is allowed to
    /// abort a run at startup.
    pub fn load(dir_doc: &Path, file_doc: &Path, os_key: &str) -> Self {
        ExclusionSet {
            directories: Self::load_list(dir_doc, os_key, defaults::directory_defaults),
            files: Self::load_list(file_doc, os_key, defaults::file_defaults),
        }
    }

    fn load_list(path: &Path, os_key: &str, fallback: fn() -> ExclusionConfig) -> PatternList {
        let config = match ExclusionConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("{e:#}; using built-in exclusion defaults");
                fallback()
            }
        };
        PatternList::compile(&config.for_platform(os_key))
    }

    pub fn from_configs(dirs: &ExclusionConfig, files: &ExclusionConfig, os_key: &str) -> Self {
        ExclusionSet {
            directories: PatternList::compile(&dirs.for_platform(os_key)),
            files: PatternList::compile(&files.for_platform(os_key)),
        }
    }

    /// Baseline safety rule: hidden entries are excluded independently of
    /// the explicit pattern lists.
    pub fn is_hidden(name: &str) -> bool {
        name.starts_with('.')
    }

    pub fn match_directory(&self, name: &str) -> Option<&str> {
        self.directories.first_match(name)
    }

    pub fn match_file(&self, name: &str) -> Option<&str> {
        self.files.first_match(name)
    }
}
