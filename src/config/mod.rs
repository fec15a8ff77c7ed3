//! Configuration management for tidybox.
//!
//! Configuration is layered: embedded defaults, then the user config under
//! `~/.config/tidybox/`, then a repository/working-directory config file,
//! then `TIDYBOX_*` environment variables. The taxonomy and exclusion
//! documents referenced here are loaded separately by their own modules.

use anyhow::{bail, Context, Result};
use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::parallel::RunMode;

pub mod platform;
pub use platform::Platform;

/// Main configuration structure for tidybox.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TidyboxConfig {
    /// Source, destination, and quarantine roots
    pub roots: RootsConfig,

    /// Taxonomy and exclusion document locations
    pub documents: DocumentsConfig,

    /// Intake engine tuning
    pub engine: EngineConfig,
}

/// Filesystem roots. Relative entries resolve against `base`; absolute
/// entries stand alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootsConfig {
    /// Base directory; unset means the platform default (`~/sort`)
    #[serde(default)]
    pub base: Option<PathBuf>,

    /// Directory scanned for incoming files
    #[serde(default = "default_inbox")]
    pub inbox: PathBuf,

    /// Destination tree for classified files
    #[serde(default = "default_sorted")]
    pub sorted: PathBuf,

    /// Destination for recognized duplicates
    #[serde(default = "default_quarantine")]
    pub quarantine: PathBuf,
}

fn default_inbox() -> PathBuf {
    PathBuf::from("inbox")
}

fn default_sorted() -> PathBuf {
    PathBuf::from("sorted")
}

fn default_quarantine() -> PathBuf {
    PathBuf::from("delete")
}

impl Default for RootsConfig {
    fn default() -> Self {
        Self {
            base: None,
            inbox: default_inbox(),
            sorted: default_sorted(),
            quarantine: default_quarantine(),
        }
    }
}

/// Locations of the taxonomy and exclusion documents. Relative paths are
/// used as-is, so they resolve against the working directory — the
/// documents normally live next to the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentsConfig {
    #[serde(default = "default_taxonomy")]
    pub taxonomy: PathBuf,

    #[serde(default = "default_dir_exclusions")]
    pub dir_exclusions: PathBuf,

    #[serde(default = "default_file_exclusions")]
    pub file_exclusions: PathBuf,
}

fn default_taxonomy() -> PathBuf {
    PathBuf::from("extensions.json")
}

fn default_dir_exclusions() -> PathBuf {
    PathBuf::from("dir_exclusions.json")
}

fn default_file_exclusions() -> PathBuf {
    PathBuf::from("file_exclusions.json")
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            taxonomy: default_taxonomy(),
            dir_exclusions: default_dir_exclusions(),
            file_exclusions: default_file_exclusions(),
        }
    }
}

/// Intake engine tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Processing mode: auto (threshold-based), sequential, or parallel
    #[serde(default)]
    pub mode: RunMode,

    /// Maximum worker threads (0 = derive from CPU count)
    #[serde(default)]
    pub max_threads: usize,

    /// Percentage of CPU cores to use (1-100)
    #[serde(default = "default_thread_percentage")]
    pub thread_percentage: u8,

    /// Minimum candidate count before auto mode goes parallel
    #[serde(default = "default_parallel_threshold")]
    pub parallel_threshold: usize,
}

fn default_thread_percentage() -> u8 {
    75
}

fn default_parallel_threshold() -> usize {
    50
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mode: RunMode::default(),
            max_threads: 0,
            thread_percentage: default_thread_percentage(),
            parallel_threshold: default_parallel_threshold(),
        }
    }
}

/// Roots with `base` applied, as used by the engine.
#[derive(Debug, Clone)]
pub struct ResolvedRoots {
    pub inbox: PathBuf,
    pub sorted: PathBuf,
    pub quarantine: PathBuf,
}

impl ResolvedRoots {
    /// The three roots must be distinct, and neither destination may sit
    /// inside the inbox (a later run would re-ingest its own output).
    pub fn ensure_distinct(&self) -> Result<()> {
        if self.inbox == self.sorted || self.inbox == self.quarantine {
            bail!(
                "inbox root {} must be distinct from the destination roots",
                self.inbox.display()
            );
        }
        if self.sorted == self.quarantine {
            bail!(
                "sorted root {} and quarantine root must be distinct",
                self.sorted.display()
            );
        }
        for dest in [&self.sorted, &self.quarantine] {
            if dest.starts_with(&self.inbox) {
                bail!(
                    "destination root {} must not be inside the inbox {}",
                    dest.display(),
                    self.inbox.display()
                );
            }
        }
        Ok(())
    }
}

impl RootsConfig {
    pub fn resolve(&self, platform: &Platform) -> ResolvedRoots {
        let base = self.base.clone().unwrap_or_else(|| platform.default_base.clone());
        ResolvedRoots {
            inbox: base.join(&self.inbox),
            sorted: base.join(&self.sorted),
            quarantine: base.join(&self.quarantine),
        }
    }
}

impl TidyboxConfig {
    /// Load configuration with the standard layering.
    pub fn load(custom_path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(TidyboxConfig::default()));

        if let Some(path) = custom_path {
            // An explicit config file replaces the discovery chain; format
            // follows the extension, YAML when in doubt.
            figment = match path.extension().and_then(|e| e.to_str()) {
                Some("toml") => figment.merge(Toml::file(path)),
                Some("json") => figment.merge(Json::file(path)),
                _ => figment.merge(Yaml::file(path)),
            };
        } else {
            if let Some(user) = Self::user_config_path() {
                figment = figment.merge(Yaml::file(user));
            }
            figment = figment
                .merge(Toml::file("tidybox.toml"))
                .merge(Json::file("tidybox.json"))
                .merge(Yaml::file("tidybox.yaml"))
                .merge(Yaml::file("tidybox.yml"))
                .merge(Yaml::file(".tidybox.yml"));
        }

        // Environment variables always win.
        figment = figment.merge(Env::prefixed("TIDYBOX_").split("__"));

        let config: TidyboxConfig = figment.extract().context("failed to load configuration")?;
        config.validate()?;
        Ok(config)
    }

    fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tidybox").join("config.yml"))
    }

    /// Validate tuning values that serde cannot range-check.
    pub fn validate(&self) -> Result<()> {
        if self.engine.thread_percentage == 0 || self.engine.thread_percentage > 100 {
            bail!(
                "engine.thread_percentage must be between 1 and 100, got {}",
                self.engine.thread_percentage
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_platform() -> Platform {
        Platform {
            os_key: "linux",
            classify_sidecars: false,
            default_base: PathBuf::from("/home/nobody/sort"),
        }
    }

    #[test]
    fn defaults_mirror_the_classic_layout() {
        let config = TidyboxConfig::default();
        let roots = config.roots.resolve(&test_platform());
        assert_eq!(roots.inbox, PathBuf::from("/home/nobody/sort/inbox"));
        assert_eq!(roots.sorted, PathBuf::from("/home/nobody/sort/sorted"));
        assert_eq!(roots.quarantine, PathBuf::from("/home/nobody/sort/delete"));
    }

    #[test]
    fn absolute_roots_ignore_the_base() {
        let mut config = TidyboxConfig::default();
        config.roots.inbox = PathBuf::from("/srv/drop");
        let roots = config.roots.resolve(&test_platform());
        assert_eq!(roots.inbox, PathBuf::from("/srv/drop"));
        assert_eq!(roots.sorted, PathBuf::from("/home/nobody/sort/sorted"));
    }

    #[test]
    fn coinciding_roots_are_rejected() {
        let roots = ResolvedRoots {
            inbox: PathBuf::from("/data/inbox"),
            sorted: PathBuf::from("/data/inbox"),
            quarantine: PathBuf::from("/data/delete"),
        };
        assert!(roots.ensure_distinct().is_err());

        let nested = ResolvedRoots {
            inbox: PathBuf::from("/data/inbox"),
            sorted: PathBuf::from("/data/inbox/sorted"),
            quarantine: PathBuf::from("/data/delete"),
        };
        assert!(nested.ensure_distinct().is_err());

        let fine = ResolvedRoots {
            inbox: PathBuf::from("/data/inbox"),
            sorted: PathBuf::from("/data/sorted"),
            quarantine: PathBuf::from("/data/delete"),
        };
        assert!(fine.ensure_distinct().is_ok());
    }

    #[test]
    fn thread_percentage_is_range_checked() {
        let mut config = TidyboxConfig::default();
        config.engine.thread_percentage = 0;
        assert!(config.validate().is_err());
        config.engine.thread_percentage = 101;
        assert!(config.validate().is_err());
        config.engine.thread_percentage = 100;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_round_trips_through_yaml() {
        let config = TidyboxConfig::default();
        let yaml = serde_yml::to_string(&config).unwrap();
        let parsed: TidyboxConfig = serde_yml::from_str(&yaml).unwrap();
        assert_eq!(parsed.engine.thread_percentage, config.engine.thread_percentage);
        assert_eq!(parsed.roots.quarantine, config.roots.quarantine);
    }
}
