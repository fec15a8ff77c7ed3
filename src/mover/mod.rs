//! Physical relocation of accepted files.
//!
//! Moves are plain renames: a failure (cross-device link, permissions, full
//! destination) is reported for that file and the source stays where it
//! was, never partially moved. Collisions are resolved by renaming the
//! incoming file, never by overwriting what is already there.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

use crate::hash::ContentDigest;

/// Marker appended to every quarantined filename.
pub const QUARANTINE_TAG: &str = "processed_delete";

/// Upper bound on numbered rename attempts before giving up on a file.
const MAX_RENAME_ATTEMPTS: u32 = 100;

/// Moves files into the sorted and quarantine trees.
///
/// Every placement runs its occupied-name probe and rename under one lock:
/// two concurrent placements may otherwise pick the same free name and the
/// later rename would clobber the earlier file.
#[derive(Debug)]
pub struct Mover {
    sorted_root: PathBuf,
    quarantine_root: PathBuf,
    placement_lock: Mutex<()>,
}

impl Mover {
    pub fn new(sorted_root: PathBuf, quarantine_root: PathBuf) -> Self {
        Mover {
            sorted_root,
            quarantine_root,
            placement_lock: Mutex::new(()),
        }
    }

    /// Move a novel file into its category folder under the sorted root.
    ///
    /// The original filename is kept when free; an occupied name gets a
    /// short digest prefix appended instead.
    pub fn place(&self, src: &Path, category: &str, digest: &ContentDigest) -> Result<PathBuf> {
        let dest_dir = self.sorted_root.join(category);
        self.relocate(src, &dest_dir, digest, false)
    }

    /// Move a recognized duplicate into quarantine.
    ///
    /// Quarantined names always carry the digest fragment and the marker
    /// tag, collision or not, so the files are self-describing.
    pub fn quarantine(&self, src: &Path, digest: &ContentDigest) -> Result<PathBuf> {
        self.relocate(src, &self.quarantine_root, digest, true)
    }

    fn relocate(
        &self,
        src: &Path,
        dest_dir: &Path,
        digest: &ContentDigest,
        quarantine: bool,
    ) -> Result<PathBuf> {
        let name = src
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("source {} has no usable file name", src.display()))?;

        fs::create_dir_all(dest_dir).with_context(|| {
            format!("failed to create destination directory {}", dest_dir.display())
        })?;

        let (stem, ext) = split_name(name);

        let _guard = self.placement_lock.lock().unwrap_or_else(|e| e.into_inner());
        let dest = pick_destination(dest_dir, &stem, &ext, digest, quarantine)?;
        fs::rename(src, &dest).with_context(|| {
            format!(
                "failed to move {} to {} (source left in place)",
                src.display(),
                dest.display()
            )
        })?;
        debug!(from = %src.display(), to = %dest.display(), "moved");
        Ok(dest)
    }
}

/// First free destination name, probed in deterministic order.
fn pick_destination(
    dir: &Path,
    stem: &str,
    ext: &str,
    digest: &ContentDigest,
    quarantine: bool,
) -> Result<PathBuf> {
    let short = digest.short();
    let base = if quarantine {
        format!("{stem}_{short}_{QUARANTINE_TAG}{ext}")
    } else {
        format!("{stem}{ext}")
    };

    let candidate = dir.join(&base);
    if !candidate.exists() {
        return Ok(candidate);
    }

    if !quarantine {
        let disambiguated = dir.join(format!("{stem}_{short}{ext}"));
        if !disambiguated.exists() {
            return Ok(disambiguated);
        }
    }

    // Identical content quarantined repeatedly produces the same tagged
    // name; number the stragglers rather than overwrite.
    for n in 2..=MAX_RENAME_ATTEMPTS {
        let numbered = if quarantine {
            dir.join(format!("{stem}_{short}_{QUARANTINE_TAG}_{n}{ext}"))
        } else {
            dir.join(format!("{stem}_{short}_{n}{ext}"))
        };
        if !numbered.exists() {
            return Ok(numbered);
        }
    }

    bail!(
        "no free destination name for {} in {} after {} attempts",
        base,
        dir.display(),
        MAX_RENAME_ATTEMPTS
    );
}

/// Split a filename into stem and extension (dot included).
fn split_name(name: &str) -> (String, String) {
    let path = Path::new(name);
    match (path.file_stem().and_then(|s| s.to_str()), path.extension().and_then(|e| e.to_str())) {
        (Some(stem), Some(ext)) => (stem.to_string(), format!(".{ext}")),
        _ => (name.to_string(), String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash;
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Mover) {
        let temp_dir = TempDir::new().unwrap();
        let mover = Mover::new(
            temp_dir.path().join("sorted"),
            temp_dir.path().join("delete"),
        );
        (temp_dir, mover)
    }

    fn write_inbox(temp_dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
        let inbox = temp_dir.path().join("inbox");
        fs::create_dir_all(&inbox).unwrap();
        let path = inbox.join(name);
        fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn place_keeps_the_original_name_when_free() {
        let (temp_dir, mover) = setup();
        let src = write_inbox(&temp_dir, "report.pdf", b"pdf");
        let digest = hash::hash_file(&src).unwrap();

        let dest = mover.place(&src, "Documents/PDF", &digest).unwrap();
        assert_eq!(dest, temp_dir.path().join("sorted/Documents/PDF/report.pdf"));
        assert!(dest.is_file());
        assert!(!src.exists());
    }

    #[test]
    fn occupied_names_get_a_digest_prefix_never_overwritten() {
        let (temp_dir, mover) = setup();
        let dest_dir = temp_dir.path().join("sorted/Documents");
        fs::create_dir_all(&dest_dir).unwrap();
        fs::write(dest_dir.join("notes.txt"), b"older, unrelated").unwrap();

        let src = write_inbox(&temp_dir, "notes.txt", b"incoming");
        let digest = hash::hash_file(&src).unwrap();
        let dest = mover.place(&src, "Documents", &digest).unwrap();

        let expected = dest_dir.join(format!("notes_{}.txt", digest.short()));
        assert_eq!(dest, expected);

        // Both files stay retrievable by name with their own content.
        assert_eq!(fs::read(dest_dir.join("notes.txt")).unwrap(), b"older, unrelated");
        assert_eq!(fs::read(&expected).unwrap(), b"incoming");
    }

    #[test]
    fn quarantine_names_are_always_tagged() {
        let (temp_dir, mover) = setup();
        let src = write_inbox(&temp_dir, "b.pdf", b"duplicate bytes");
        let digest = hash::hash_file(&src).unwrap();

        let dest = mover.quarantine(&src, &digest).unwrap();
        let expected = temp_dir
            .path()
            .join("delete")
            .join(format!("b_{}_processed_delete.pdf", digest.short()));
        assert_eq!(dest, expected);
        assert!(!src.exists());
    }

    #[test]
    fn repeated_identical_quarantines_are_numbered() {
        let (temp_dir, mover) = setup();
        let first = write_inbox(&temp_dir, "copy.dat", b"same bytes");
        let digest = hash::hash_file(&first).unwrap();
        let dest1 = mover.quarantine(&first, &digest).unwrap();

        let second = write_inbox(&temp_dir, "copy.dat", b"same bytes");
        let dest2 = mover.quarantine(&second, &digest).unwrap();

        assert_ne!(dest1, dest2);
        assert!(dest2
            .file_name()
            .unwrap()
            .to_str()
            .unwrap()
            .ends_with("_processed_delete_2.dat"));
        assert!(dest1.is_file());
        assert!(dest2.is_file());
    }

    #[test]
    fn extensionless_names_survive_renaming() {
        let (temp_dir, mover) = setup();
        let src = write_inbox(&temp_dir, "README", b"no extension");
        let digest = hash::hash_file(&src).unwrap();

        let dest = mover.quarantine(&src, &digest).unwrap();
        let name = dest.file_name().unwrap().to_str().unwrap().to_string();
        assert_eq!(name, format!("README_{}_processed_delete", digest.short()));
    }

    #[test]
    fn failed_moves_leave_the_source_in_place() {
        let (temp_dir, mover) = setup();
        let src = write_inbox(&temp_dir, "gone.txt", b"bytes");
        let digest = hash::hash_file(&src).unwrap();
        fs::remove_file(&src).unwrap();

        assert!(mover.place(&src, "Documents", &digest).is_err());
    }
}
