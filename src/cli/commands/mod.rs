//! Command implementations for the tidybox CLI.

pub mod config;
pub mod sort;
pub mod status;
