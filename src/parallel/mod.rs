//! Generic parallel execution.
//!
//! Worker-pool infrastructure with no knowledge of what the work items are.
//! The intake engine decides *whether* a batch goes parallel; this module
//! decides how many workers the system affords and runs the pool.

pub mod processor;

pub use processor::ParallelProcessor;

use serde::{Deserialize, Serialize};

/// Processing mode requested by configuration or the CLI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Threshold decision: small batches sequential, large ones parallel
    #[default]
    Auto,
    /// One file at a time, no worker threads
    Sequential,
    /// Always use the worker pool
    Parallel,
}

/// How a batch of work items is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStrategy {
    Sequential,
    Parallel { workers: usize },
}

impl ExecutionStrategy {
    /// Resource-based worker ceiling: CPU cores scaled by the configured
    /// percentage, optionally capped by an absolute thread limit.
    pub fn calculate_max_workers(max_threads: usize, thread_percentage: u8) -> usize {
        let cores = num_cpus::get();
        let by_percentage = std::cmp::max(1, cores * thread_percentage as usize / 100);
        if max_threads > 0 {
            by_percentage.min(max_threads)
        } else {
            by_percentage
        }
    }

    /// Threshold decision for auto mode: below `threshold` items the pool
    /// overhead outweighs the win.
    pub fn auto(work_count: usize, threshold: usize, workers: usize) -> Self {
        if work_count < threshold || workers <= 1 {
            ExecutionStrategy::Sequential
        } else {
            ExecutionStrategy::Parallel { workers }
        }
    }

    /// Map a requested mode onto a strategy for a concrete batch size.
    pub fn for_mode(mode: RunMode, work_count: usize, threshold: usize, workers: usize) -> Self {
        match mode {
            RunMode::Sequential => ExecutionStrategy::Sequential,
            RunMode::Parallel => ExecutionStrategy::Parallel {
                workers: workers.max(1),
            },
            RunMode::Auto => ExecutionStrategy::auto(work_count, threshold, workers),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_workers_respects_caps() {
        let unlimited = ExecutionStrategy::calculate_max_workers(0, 100);
        assert!(unlimited >= 1);

        let capped = ExecutionStrategy::calculate_max_workers(2, 100);
        assert!(capped <= 2);
        assert!(capped >= 1);

        // Percentage never rounds down to zero workers.
        assert!(ExecutionStrategy::calculate_max_workers(0, 1) >= 1);
    }

    #[test]
    fn auto_switches_on_threshold() {
        assert_eq!(ExecutionStrategy::auto(10, 50, 8), ExecutionStrategy::Sequential);
        assert_eq!(
            ExecutionStrategy::auto(100, 50, 8),
            ExecutionStrategy::Parallel { workers: 8 }
        );
        // A single worker never pays for the pool.
        assert_eq!(ExecutionStrategy::auto(100, 50, 1), ExecutionStrategy::Sequential);
    }

    #[test]
    fn explicit_modes_override_the_threshold() {
        assert_eq!(
            ExecutionStrategy::for_mode(RunMode::Sequential, 1000, 50, 8),
            ExecutionStrategy::Sequential
        );
        assert_eq!(
            ExecutionStrategy::for_mode(RunMode::Parallel, 1, 50, 8),
            ExecutionStrategy::Parallel { workers: 8 }
        );
    }
}
