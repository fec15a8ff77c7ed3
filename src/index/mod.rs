//! Content-hash index of the sorted tree, and the shared digest store the
//! intake pass consults.
//!
//! The index is rebuilt from scratch on every run: a full pass over the
//! destination tree keeps it correct against external changes, at a
//! one-time O(existing files) cost. There is no incremental mode.

use anyhow::Result;
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::hash::{self, ContentDigest};

/// Result of seeding the index from the sorted tree.
#[derive(Debug, Default)]
pub struct IndexBuild {
    /// digest → first path observed holding that content
    pub index: HashMap<ContentDigest, PathBuf>,
    /// Files successfully hashed
    pub files_indexed: usize,
    /// Per-file failures; those files are simply absent from the index
    pub warnings: Vec<String>,
}

/// Hash every file under the sorted root into a digest → path map.
///
/// Directories are traversed, never hashed. Read or hash failures on an
/// individual file drop that file from the index with a warning: the risk
/// is a future false-negative duplicate check, never a false positive, and
/// never an aborted run. A missing root means a first run — empty index.
pub fn build_index(sorted_root: &Path) -> IndexBuild {
    let mut build = IndexBuild::default();
    if !sorted_root.is_dir() {
        debug!(root = %sorted_root.display(), "sorted root absent, starting with an empty index");
        return build;
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(sorted_root) {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_file() {
                    files.push(entry.into_path());
                }
            }
            Err(e) => build.warnings.push(format!("index walk error: {e}")),
        }
    }

    // Hash in parallel, then insert in walk order so "first occurrence
    // wins" stays deterministic for a given tree.
    let hashed: Vec<(PathBuf, Result<ContentDigest>)> = files
        .into_par_iter()
        .map(|path| {
            let digest = hash::hash_file(&path);
            (path, digest)
        })
        .collect();

    for (path, digest) in hashed {
        match digest {
            Ok(digest) => {
                build.files_indexed += 1;
                build.index.entry(digest).or_insert(path);
            }
            Err(e) => {
                warn!("omitting file from index: {e:#}");
                build.warnings.push(format!("{e:#}"));
            }
        }
    }
    build
}

/// Outcome of an atomic digest check during intake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DigestStatus {
    /// First sighting of this content anywhere.
    Novel,
    /// Observed earlier in this run, before any copy finished moving.
    DuplicateInRun,
    /// Content already held under the sorted tree, either pre-existing or
    /// placed earlier this run.
    DuplicateInTree { existing: PathBuf },
}

#[derive(Debug, Default)]
struct StoreInner {
    index: HashMap<ContentDigest, PathBuf>,
    seen_in_run: HashSet<ContentDigest>,
}

/// Shared digest state for one run: the hash index plus the seen-in-run
/// set, behind a single lock.
///
/// `observe` does the in-run check, the index check, and the seen-mark in
/// one critical section, so a read and a later write for the same digest
/// can never interleave with another file's — two identical candidates
/// cannot both come back `Novel`. Discarded at run end; nothing persists
/// across runs beyond the sorted tree itself.
#[derive(Debug, Default)]
pub struct DigestStore {
    inner: Mutex<StoreInner>,
}

impl DigestStore {
    pub fn new(index: HashMap<ContentDigest, PathBuf>) -> Self {
        DigestStore {
            inner: Mutex::new(StoreInner {
                index,
                seen_in_run: HashSet::new(),
            }),
        }
    }

    /// Atomic check-and-mark for one candidate's digest.
    ///
    /// The in-run set is consulted before the index, and the digest is
    /// marked seen on every path through here, so a third identical copy in
    /// the same batch is still caught.
    pub fn observe(&self, digest: ContentDigest) -> DigestStatus {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if !inner.seen_in_run.insert(digest) {
            return DigestStatus::DuplicateInRun;
        }
        if let Some(existing) = inner.index.get(&digest) {
            return DigestStatus::DuplicateInTree {
                existing: existing.clone(),
            };
        }
        DigestStatus::Novel
    }

    /// Record a placed file so later candidates in the same run see it as
    /// already present. First writer wins on digest collision.
    pub fn record_placed(&self, digest: ContentDigest, path: PathBuf) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.index.entry(digest).or_insert(path);
    }

    pub fn indexed_entries(&self) -> usize {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.index.len()
    }
}
