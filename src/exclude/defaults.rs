//! Built-in exclusion tables.
//!
//! These stand in when the exclusion documents are absent, and seed the
//! documents written by `config init`. Grouped roughly by what generates
//! them: language build output, dependency caches, VCS metadata, OS junk.

use super::ExclusionConfig;
use std::collections::BTreeMap;

const COMMON_DIRECTORIES: &[&str] = &[
    "node_modules",
    "target",
    "__pycache__",
    "venv",
    "dist",
    "build",
    "out",
    "vendor",
    "coverage",
    "tmp",
    "temp",
    "cache",
];

const COMMON_FILES: &[&str] = &[
    "*.tmp",
    "*.temp",
    "*.part",
    "*.partial",
    "*.crdownload",
    "*.download",
    "*.swp",
    "*.lock",
];

const WINDOWS_DIRECTORIES: &[&str] = &["$RECYCLE.BIN", "System Volume Information"];
const WINDOWS_FILES: &[&str] = &["Thumbs.db", "desktop.ini", "ehthumbs.db"];

const MACOS_DIRECTORIES: &[&str] = &["Network Trash Folder", "Temporary Items"];
const MACOS_FILES: &[&str] = &["Icon\r"];

const LINUX_DIRECTORIES: &[&str] = &["lost+found"];
const LINUX_FILES: &[&str] = &["*~"];

fn strings(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|s| s.to_string()).collect()
}

fn os_specific(windows: &[&str], macos: &[&str], linux: &[&str]) -> BTreeMap<String, Vec<String>> {
    let mut map = BTreeMap::new();
    map.insert("windows".to_string(), strings(windows));
    map.insert("macos".to_string(), strings(macos));
    map.insert("linux".to_string(), strings(linux));
    map
}

/// Default directory-name exclusions.
pub fn directory_defaults() -> ExclusionConfig {
    ExclusionConfig {
        common: strings(COMMON_DIRECTORIES),
        os_specific: os_specific(WINDOWS_DIRECTORIES, MACOS_DIRECTORIES, LINUX_DIRECTORIES),
    }
}

/// Default file-name exclusions.
pub fn file_defaults() -> ExclusionConfig {
    ExclusionConfig {
        common: strings(COMMON_FILES),
        os_specific: os_specific(WINDOWS_FILES, MACOS_FILES, LINUX_FILES),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_the_usual_suspects() {
        let dirs = directory_defaults();
        assert!(dirs.common.iter().any(|p| p == "node_modules"));
        assert!(dirs.for_platform("windows").iter().any(|p| p == "$RECYCLE.BIN"));

        let files = file_defaults();
        assert!(files.for_platform("windows").iter().any(|p| p == "Thumbs.db"));
        assert!(files.for_platform("linux").iter().any(|p| p == "*~"));
    }

    #[test]
    fn defaults_serialize_as_valid_documents() {
        let json = serde_json::to_string_pretty(&directory_defaults()).unwrap();
        let parsed = serde_json::from_str::<ExclusionConfig>(&json).unwrap();
        assert_eq!(parsed.common, directory_defaults().common);
    }
}
