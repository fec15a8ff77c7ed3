//! Extension taxonomy.
//!
//! A hierarchical category configuration is flattened once at startup into a
//! single lookup from normalized file extension to destination sub-path. The
//! lookup is total: anything not listed falls back to a synthesized
//! `Miscellaneous/<EXTENSION>` category, so every file is classifiable.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

/// Reserved lookup key for files with no extension. Configuration authors
/// can list it under a group to give such files a home; otherwise they take
/// the miscellaneous fallback.
pub const NO_EXTENSION_KEY: &str = "no_extension";

/// Reserved lookup key for platform metadata sidecar files (`._*`). This is
/// what a dot-underscore name normalizes to once the leading dots are
/// stripped.
pub const SIDECAR_KEY: &str = "_";

/// Fixed destination for sidecar files; always present in the flattened map.
pub const SIDECAR_CATEGORY: &str = "System/Attribute_Files";

/// Root of the synthesized categories for unmapped extensions.
pub const FALLBACK_CATEGORY: &str = "Miscellaneous";

/// One node of the category tree: the extensions claimed at this level plus
/// named child groups underneath it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryGroup {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub subcategories: BTreeMap<String, CategoryGroup>,
}

/// On-disk shape of the taxonomy document: named top-level groups.
pub type TaxonomyConfig = BTreeMap<String, CategoryGroup>;

/// Flat, immutable lookup from lower-cased extension to destination
/// sub-path, computed once at startup.
#[derive(Debug, Clone)]
pub struct ExtensionMap {
    map: HashMap<String, String>,
}

impl ExtensionMap {
    /// Load and flatten a taxonomy document.
    ///
    /// A missing or malformed document is fatal: the engine cannot classify
    /// anything meaningfully without one.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read taxonomy document {}", path.display()))?;
        let config: TaxonomyConfig = serde_json::from_str(&content)
            .with_context(|| format!("invalid taxonomy document {}", path.display()))?;
        Ok(Self::from_config(&config))
    }

    /// Flatten the group tree depth-first. Each subgroup's destination path
    /// is its parent's path joined with the subgroup name.
    ///
    /// An extension listed in two branches is assigned to whichever branch
    /// is visited last; that is a configuration-authoring responsibility,
    /// not a runtime error.
    pub fn from_config(config: &TaxonomyConfig) -> Self {
        let mut map = HashMap::new();
        for (name, group) in config {
            flatten_group(name, group, &mut map);
        }
        // Sidecar files carry no meaningful extension of their own; they
        // always have a fixed system category.
        map.insert(SIDECAR_KEY.to_string(), SIDECAR_CATEGORY.to_string());
        ExtensionMap { map }
    }

    /// Resolve a file extension to its category sub-path.
    ///
    /// Extensions are case-insensitive and may carry a leading dot. Never
    /// fails: unmapped extensions fall back to
    /// `Miscellaneous/<EXTENSION-UPPERCASED>`.
    pub fn resolve(&self, extension: &str) -> String {
        let lowered = extension.to_lowercase();
        let mut key = lowered.trim_start_matches('.');
        if key.is_empty() {
            key = NO_EXTENSION_KEY;
        }
        match self.map.get(key) {
            Some(path) => path.clone(),
            None => format!("{}/{}", FALLBACK_CATEGORY, key.to_uppercase()),
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

fn flatten_group(path: &str, group: &CategoryGroup, map: &mut HashMap<String, String>) {
    for ext in &group.extensions {
        map.insert(ext.trim_start_matches('.').to_lowercase(), path.to_string());
    }
    for (name, sub) in &group.subcategories {
        let sub_path = format!("{}/{}", path, name);
        flatten_group(&sub_path, sub, map);
    }
}

/// Starter taxonomy written by `config init`.
pub fn starter_config() -> TaxonomyConfig {
    fn group(extensions: &[&str]) -> CategoryGroup {
        CategoryGroup {
            extensions: extensions.iter().map(|e| e.to_string()).collect(),
            subcategories: BTreeMap::new(),
        }
    }

    let mut documents = group(&["doc", "docx", "odt", "rtf", "txt", "md"]);
    documents.subcategories.insert("PDF".to_string(), group(&["pdf"]));
    documents
        .subcategories
        .insert("Spreadsheets".to_string(), group(&["xls", "xlsx", "ods", "csv"]));
    documents
        .subcategories
        .insert("Presentations".to_string(), group(&["ppt", "pptx", "odp"]));

    let mut media = CategoryGroup::default();
    media
        .subcategories
        .insert("Images".to_string(), group(&["jpg", "jpeg", "png", "gif", "bmp", "webp", "svg"]));
    media
        .subcategories
        .insert("Videos".to_string(), group(&["mp4", "mkv", "mov", "avi", "webm"]));
    media
        .subcategories
        .insert("Audio".to_string(), group(&["mp3", "flac", "wav", "ogg", "m4a"]));

    let mut config = TaxonomyConfig::new();
    config.insert("Documents".to_string(), documents);
    config.insert("Media".to_string(), media);
    config.insert(
        "Archives".to_string(),
        group(&["zip", "tar", "gz", "bz2", "xz", "7z", "rar"]),
    );
    config.insert(
        "Code".to_string(),
        group(&["rs", "go", "py", "js", "ts", "c", "h", "cpp", "java", "sh", "json", "yml", "yaml", "toml"]),
    );
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn sample() -> TaxonomyConfig {
        serde_json::from_str(
            r#"{
                "Documents": {
                    "extensions": ["doc", "TXT"],
                    "subcategories": {
                        "PDF": { "extensions": ["pdf"] }
                    }
                },
                "Media": {
                    "subcategories": {
                        "Images": { "extensions": [".jpg", "png"] }
                    }
                }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn nested_groups_flatten_to_joined_paths() {
        let map = ExtensionMap::from_config(&sample());
        assert_eq!(map.resolve("pdf"), "Documents/PDF");
        assert_eq!(map.resolve("doc"), "Documents");
        assert_eq!(map.resolve("jpg"), "Media/Images");
    }

    #[test]
    fn resolution_is_case_insensitive_and_dot_tolerant() {
        let map = ExtensionMap::from_config(&sample());
        assert_eq!(map.resolve("PDF"), "Documents/PDF");
        assert_eq!(map.resolve(".pdf"), "Documents/PDF");
        assert_eq!(map.resolve("txt"), "Documents");
    }

    #[test]
    fn unmapped_extensions_fall_back_to_miscellaneous() {
        let map = ExtensionMap::from_config(&sample());
        assert_eq!(map.resolve("xyz"), "Miscellaneous/XYZ");
    }

    #[test]
    fn missing_extension_uses_reserved_key() {
        let mut config = sample();
        config.insert(
            "System".to_string(),
            CategoryGroup {
                extensions: vec![NO_EXTENSION_KEY.to_string()],
                subcategories: BTreeMap::new(),
            },
        );
        let map = ExtensionMap::from_config(&config);
        assert_eq!(map.resolve(""), "System");

        // Unconfigured, the reserved key takes the fallback like any other.
        let bare = ExtensionMap::from_config(&sample());
        assert_eq!(bare.resolve(""), "Miscellaneous/NO_EXTENSION");
    }

    #[test]
    fn sidecar_key_is_always_mapped() {
        let map = ExtensionMap::from_config(&TaxonomyConfig::new());
        assert_eq!(map.resolve(SIDECAR_KEY), SIDECAR_CATEGORY);
    }

    #[test]
    fn duplicate_extension_last_branch_wins() {
        let config: TaxonomyConfig = serde_json::from_str(
            r#"{
                "Alpha": { "extensions": ["dat"] },
                "Beta": { "extensions": ["dat"] }
            }"#,
        )
        .unwrap();
        let map = ExtensionMap::from_config(&config);
        assert_eq!(map.resolve("dat"), "Beta");
    }

    #[test]
    fn load_rejects_malformed_documents() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("extensions.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(ExtensionMap::load(&path).is_err());
        assert!(ExtensionMap::load(&temp_dir.path().join("absent.json")).is_err());
    }

    #[test]
    fn starter_config_round_trips() {
        let json = serde_json::to_string_pretty(&starter_config()).unwrap();
        let parsed: TaxonomyConfig = serde_json::from_str(&json).unwrap();
        let map = ExtensionMap::from_config(&parsed);
        assert_eq!(map.resolve("pdf"), "Documents/PDF");
        assert_eq!(map.resolve("flac"), "Media/Audio");
    }
}
