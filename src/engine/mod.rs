//! Intake decision engine.
//!
//! Walks the inbox, decides each candidate file's fate, and drives the
//! mover. Decisions for distinct files are independent except through the
//! shared digest store, so traversal order only determines which *copy* of
//! duplicate content becomes the canonical kept file: first encountered, in
//! whatever order the walker yields. That order is not stabilized.

use anyhow::{bail, Result};
use ignore::WalkBuilder;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::platform::Platform;
use crate::config::{EngineConfig, ResolvedRoots};
use crate::exclude::ExclusionSet;
use crate::hash::{self, ContentDigest};
use crate::index::{self, DigestStatus, DigestStore};
use crate::mover::Mover;
use crate::parallel::{ExecutionStrategy, ParallelProcessor};
use crate::taxonomy::{self, ExtensionMap};

/// Characters that make a filename unsafe to carry across platforms.
const UNSAFE_NAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Why a candidate was passed over without side effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Name begins with the hidden marker
    Hidden,
    /// Matched a file exclusion pattern
    ExcludedPattern(String),
    /// Zero-length content
    Empty,
    /// Name carries characters unsafe for cross-platform paths, or is not
    /// representable
    InvalidName,
    /// Symbolic link
    Symlink,
}

impl SkipReason {
    pub fn describe(&self) -> String {
        match self {
            SkipReason::Hidden => "hidden".to_string(),
            SkipReason::ExcludedPattern(pattern) => format!("excluded by pattern {pattern}"),
            SkipReason::Empty => "empty file".to_string(),
            SkipReason::InvalidName => "invalid characters in name".to_string(),
            SkipReason::Symlink => "symbolic link".to_string(),
        }
    }
}

/// Where a duplicate's canonical copy was first seen.
#[derive(Debug, Clone)]
pub enum DuplicateOrigin {
    /// Another copy earlier in this same run
    SameRun,
    /// A file already under the sorted tree
    SortedTree { existing: PathBuf },
}

/// Terminal outcome for one candidate file.
#[derive(Debug)]
pub enum Outcome {
    /// Skipped with no side effects
    Skipped { path: PathBuf, reason: SkipReason },
    /// Hash computation failed; file left untouched
    DigestFailed { path: PathBuf, error: String },
    /// Novel content, moved into its category folder
    Classified {
        from: PathBuf,
        to: PathBuf,
        category: String,
    },
    /// Duplicate content, moved into quarantine
    Quarantined {
        from: PathBuf,
        to: PathBuf,
        origin: DuplicateOrigin,
    },
    /// Relocation failed; file left untouched at its source
    MoveFailed { path: PathBuf, error: String },
}

/// Aggregate counts for one run.
#[derive(Debug, Default, Clone, serde::Serialize)]
pub struct RunStats {
    /// Files hashed while seeding the index from the sorted tree
    pub files_indexed: usize,
    /// Candidate files evaluated in the inbox
    pub candidates: usize,
    pub classified: usize,
    pub quarantined: usize,
    pub skipped: usize,
    pub errors: usize,
    pub duration_ms: u64,
}

/// Everything a run produced: one outcome per candidate, aggregate stats,
/// and non-fatal warnings (walk errors, unindexable files).
#[derive(Debug)]
pub struct RunReport {
    pub outcomes: Vec<Outcome>,
    pub stats: RunStats,
    pub warnings: Vec<String>,
}

/// The classification-and-deduplication engine for one configured set of
/// roots.
pub struct IntakeEngine {
    roots: ResolvedRoots,
    taxonomy: ExtensionMap,
    exclusions: ExclusionSet,
    platform: Platform,
    options: EngineConfig,
    mover: Mover,
}

impl IntakeEngine {
    pub fn new(
        roots: ResolvedRoots,
        taxonomy: ExtensionMap,
        exclusions: ExclusionSet,
        platform: Platform,
        options: EngineConfig,
    ) -> Result<Self> {
        roots.ensure_distinct()?;
        let mover = Mover::new(roots.sorted.clone(), roots.quarantine.clone());
        Ok(IntakeEngine {
            roots,
            taxonomy,
            exclusions,
            platform,
            options,
            mover,
        })
    }

    /// Run one full pass: seed the index from the sorted tree, walk the
    /// inbox, decide and move each candidate.
    ///
    /// `on_progress` receives (done, total) after each evaluated candidate.
    pub fn run<F>(&self, on_progress: F) -> Result<RunReport>
    where
        F: Fn(usize, usize) + Send + Sync,
    {
        let start = Instant::now();

        if !self.roots.inbox.is_dir() {
            bail!("inbox root {} is not a directory", self.roots.inbox.display());
        }

        // The index build completes fully before intake begins.
        let build = index::build_index(&self.roots.sorted);
        info!(
            files = build.files_indexed,
            entries = build.index.len(),
            "seeded index from sorted tree"
        );
        let mut warnings = build.warnings;
        let files_indexed = build.files_indexed;
        let store = DigestStore::new(build.index);

        let candidates = self.collect_candidates(&mut warnings);
        let total = candidates.len();
        debug!(candidates = total, "inbox walk complete");

        let max_workers = ExecutionStrategy::calculate_max_workers(
            self.options.max_threads,
            self.options.thread_percentage,
        );
        let strategy = ExecutionStrategy::for_mode(
            self.options.mode,
            total,
            self.options.parallel_threshold,
            max_workers,
        );

        let outcomes = match strategy {
            ExecutionStrategy::Sequential => {
                let mut outcomes = Vec::with_capacity(total);
                for (done, path) in candidates.into_iter().enumerate() {
                    outcomes.push(self.process_candidate(path, &store));
                    on_progress(done + 1, total);
                }
                outcomes
            }
            ExecutionStrategy::Parallel { workers } => {
                debug!(workers, "dispatching candidates to worker pool");
                ParallelProcessor::new(workers).process(
                    candidates,
                    |path| self.process_candidate(path, &store),
                    |done| on_progress(done, total),
                )?
            }
        };

        let mut stats = RunStats {
            files_indexed,
            candidates: total,
            duration_ms: start.elapsed().as_millis() as u64,
            ..RunStats::default()
        };
        for outcome in &outcomes {
            match outcome {
                Outcome::Skipped { .. } => stats.skipped += 1,
                Outcome::Classified { .. } => stats.classified += 1,
                Outcome::Quarantined { .. } => stats.quarantined += 1,
                Outcome::DigestFailed { .. } | Outcome::MoveFailed { .. } => stats.errors += 1,
            }
        }

        Ok(RunReport {
            outcomes,
            stats,
            warnings,
        })
    }

    /// Walk the inbox and collect candidate files.
    ///
    /// Directory-level exclusions and hidden directories are pruned here so
    /// an excluded subtree is never descended, not even to look at its
    /// children. File-level rules run later, per candidate. Candidates are
    /// collected before any move so relocation cannot disturb the walk.
    fn collect_candidates(&self, warnings: &mut Vec<String>) -> Vec<PathBuf> {
        let dir_patterns = self.exclusions.directories.clone();
        let walker = WalkBuilder::new(&self.roots.inbox)
            .standard_filters(false)
            .follow_links(false)
            .filter_entry(move |entry| {
                if entry.depth() == 0 {
                    return true;
                }
                let is_dir = entry.file_type().map_or(false, |ft| ft.is_dir());
                if !is_dir {
                    return true;
                }
                let name = entry.file_name().to_string_lossy();
                if ExclusionSet::is_hidden(&name) {
                    debug!(path = %entry.path().display(), "skipping hidden directory");
                    return false;
                }
                if let Some(pattern) = dir_patterns.first_match(&name) {
                    debug!(path = %entry.path().display(), pattern, "skipping excluded directory");
                    return false;
                }
                true
            })
            .build();

        let mut candidates = Vec::new();
        for entry in walker {
            match entry {
                Ok(entry) => {
                    let is_dir = entry.file_type().map_or(false, |ft| ft.is_dir());
                    if !is_dir && entry.depth() > 0 {
                        candidates.push(entry.into_path());
                    }
                }
                Err(e) => warnings.push(format!("inbox walk error: {e}")),
            }
        }
        candidates
    }

    /// Decide one candidate's fate. Never returns an error: every failure
    /// mode is a terminal outcome, so one bad file cannot sink the run.
    fn process_candidate(&self, path: PathBuf, store: &DigestStore) -> Outcome {
        let name = match path.file_name().and_then(OsStr::to_str) {
            Some(name) => name.to_string(),
            None => {
                return Outcome::Skipped {
                    path,
                    reason: SkipReason::InvalidName,
                }
            }
        };

        // Sidecars get routed to their own category where the platform says
        // so; everywhere else they fall to the hidden rule below.
        let sidecar = self.platform.classify_sidecars && Platform::is_sidecar(&name);

        if !sidecar && ExclusionSet::is_hidden(&name) {
            debug!(path = %path.display(), "skipping hidden file");
            return Outcome::Skipped {
                path,
                reason: SkipReason::Hidden,
            };
        }
        if let Some(pattern) = self.exclusions.match_file(&name) {
            debug!(path = %path.display(), pattern, "skipping excluded file");
            let reason = SkipReason::ExcludedPattern(pattern.to_string());
            return Outcome::Skipped { path, reason };
        }

        let metadata = match fs::symlink_metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) => {
                return Outcome::DigestFailed {
                    path,
                    error: format!("failed to stat: {e}"),
                }
            }
        };
        if metadata.file_type().is_symlink() {
            return Outcome::Skipped {
                path,
                reason: SkipReason::Symlink,
            };
        }
        if metadata.len() == 0 {
            debug!(path = %path.display(), "skipping empty file");
            return Outcome::Skipped {
                path,
                reason: SkipReason::Empty,
            };
        }
        if name.chars().any(|c| UNSAFE_NAME_CHARS.contains(&c)) {
            return Outcome::Skipped {
                path,
                reason: SkipReason::InvalidName,
            };
        }

        let digest = match hash::hash_file(&path) {
            Ok(digest) => digest,
            Err(e) => {
                warn!("{e:#}");
                return Outcome::DigestFailed {
                    path,
                    error: format!("{e:#}"),
                };
            }
        };

        match store.observe(digest) {
            DigestStatus::DuplicateInRun => {
                debug!(path = %path.display(), "duplicate within run");
                self.quarantine(path, digest, DuplicateOrigin::SameRun)
            }
            DigestStatus::DuplicateInTree { existing } => {
                debug!(path = %path.display(), existing = %existing.display(), "duplicate of sorted file");
                self.quarantine(path, digest, DuplicateOrigin::SortedTree { existing })
            }
            DigestStatus::Novel => self.classify(path, &name, sidecar, digest, store),
        }
    }

    fn classify(
        &self,
        path: PathBuf,
        name: &str,
        sidecar: bool,
        digest: ContentDigest,
        store: &DigestStore,
    ) -> Outcome {
        let key = if sidecar {
            taxonomy::SIDECAR_KEY
        } else {
            extension_of(&path)
        };
        let category = self.taxonomy.resolve(key);
        match self.mover.place(&path, &category, &digest) {
            Ok(dest) => {
                store.record_placed(digest, dest.clone());
                info!(file = name, category = %category, "classified");
                Outcome::Classified {
                    from: path,
                    to: dest,
                    category,
                }
            }
            Err(e) => Outcome::MoveFailed {
                path,
                error: format!("{e:#}"),
            },
        }
    }

    fn quarantine(&self, path: PathBuf, digest: ContentDigest, origin: DuplicateOrigin) -> Outcome {
        match self.mover.quarantine(&path, &digest) {
            Ok(dest) => Outcome::Quarantined {
                from: path,
                to: dest,
                origin,
            },
            Err(e) => Outcome::MoveFailed {
                path,
                error: format!("{e:#}"),
            },
        }
    }
}

fn extension_of(path: &Path) -> &str {
    path.extension().and_then(OsStr::to_str).unwrap_or("")
}
