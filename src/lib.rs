//! # tidybox - Content-Addressed Inbox Sorting
//!
//! tidybox classifies incoming files into a destination tree by content
//! category and eliminates duplicates using content-addressed hashing. It is
//! built for unattended, repeated runs over a growing inbox: each file is
//! moved exactly once, into either a category folder (first-seen content) or
//! a quarantine folder (content already held).
//!
//! ## Guarantees
//!
//! - A file is never lost: moves are plain renames that either succeed or
//!   leave the source untouched.
//! - Nothing is overwritten: name collisions rename the incoming file.
//! - Identical content is admitted exactly once per run, even with the
//!   parallel worker pool enabled.
//!
//! ## Quick Start
//!
//! ```bash
//! # Install tidybox
//! cargo install tidybox
//!
//! # Write starter configuration and taxonomy documents
//! tidybox config init
//!
//! # Sort the inbox
//! tidybox sort
//! ```

pub mod cli;
pub mod config;
pub mod engine;
pub mod exclude;
pub mod hash;
pub mod index;
pub mod mover;
pub mod parallel;
pub mod taxonomy;

pub use cli::{Cli, Output};
pub use config::TidyboxConfig;

/// Result type alias for tidybox operations
pub type Result<T> = anyhow::Result<T>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
