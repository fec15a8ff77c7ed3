//! Platform capabilities.
//!
//! OS-conditional behavior (default roots, exclusion-list merge key,
//! metadata sidecar routing) is resolved once at startup into this struct
//! and injected where needed, never branched on inline.

use std::path::PathBuf;

/// Name prefix of macOS AppleDouble attribute-carrier files.
pub const SIDECAR_PREFIX: &str = "._";

#[derive(Debug, Clone)]
pub struct Platform {
    /// Key selecting `os_specific` exclusion lists ("linux", "macos",
    /// "windows", ...).
    pub os_key: &'static str,
    /// Route `._*` sidecar files to the attribute-file category instead of
    /// skipping them as hidden.
    pub classify_sidecars: bool,
    /// Default base directory holding the inbox/sorted/quarantine roots.
    pub default_base: PathBuf,
}

impl Platform {
    /// Capabilities of the running platform.
    pub fn current() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Platform {
            os_key: std::env::consts::OS,
            classify_sidecars: cfg!(target_os = "macos"),
            default_base: home.join("sort"),
        }
    }

    /// Whether `name` is a metadata sidecar file by naming convention.
    pub fn is_sidecar(name: &str) -> bool {
        name.starts_with(SIDECAR_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_platform_has_a_usable_base() {
        let platform = Platform::current();
        assert!(!platform.os_key.is_empty());
        assert!(platform.default_base.ends_with("sort"));
    }

    #[test]
    fn sidecar_naming_convention() {
        assert!(Platform::is_sidecar("._photo.jpg"));
        assert!(!Platform::is_sidecar(".hidden"));
        assert!(!Platform::is_sidecar("photo.jpg"));
    }
}
