//! Console output for tidybox.
//!
//! Consistent styled messages with verbose/quiet modes, plus a progress bar
//! for the intake pass.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output handler for consistent CLI formatting.
pub struct Output {
    verbose: bool,
    quiet: bool,
}

impl Output {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self { verbose, quiet }
    }

    /// Print a success message.
    pub fn success(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", style("✔").green(), message);
        }
    }

    /// Print an error message. Errors are always shown, even in quiet mode.
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", style("✖").red(), message);
    }

    /// Print a warning message.
    pub fn warning(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", style("⚠").yellow(), message);
        }
    }

    /// Print an info message.
    pub fn info(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", style("ℹ").blue(), message);
        }
    }

    /// Print a verbose message (only if verbose mode is enabled).
    pub fn verbose(&self, message: &str) {
        if self.verbose {
            println!("{} {}", style("ℹ").dim(), style(message).dim());
        }
    }

    /// Print a section header.
    pub fn header(&self, title: &str) {
        if !self.quiet {
            println!("\n{}", style(title).bold().cyan());
        }
    }

    /// Print a labelled count line under a header.
    pub fn stat(&self, label: &str, value: impl std::fmt::Display) {
        if !self.quiet {
            println!("  {}: {}", label, style(value).cyan());
        }
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// Progress bar for a pass over `len` items; hidden in quiet mode or
    /// when stdout is not a terminal.
    pub fn progress_bar(&self, len: u64, message: &str) -> ProgressBar {
        if self.quiet || !atty::is(atty::Stream::Stdout) {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len);
        pb.set_style(
            ProgressStyle::with_template("{msg} [{bar:30.cyan/dim}] {pos}/{len}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        pb.set_message(message.to_string());
        pb
    }
}
