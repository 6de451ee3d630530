//! Options for file finding
//!
//! This module provides options for configuring the traversal.

use crate::cli::Cli;

/// Default number of directory listings / stat calls kept in flight per level
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Names starting with this marker are never listed, at any level
pub const HIDDEN_MARKER: char = '.';

/// Options for configuring the traversal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindOptions {
    /// Whether to descend into discovered directories
    pub recursive: bool,

    /// Maximum in-flight I/O operations per level
    pub concurrency: usize,
}

impl FindOptions {
    /// Create a new FindOptions with default values
    pub fn new() -> Self {
        Self {
            recursive: false,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Set whether to recurse into subdirectories
    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Set the per-level concurrency cap (0 is treated as 1)
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Create FindOptions from CLI arguments
    pub fn from_cli(cli: &Cli) -> Self {
        Self::new().with_recursive(cli.recursive)
    }
}

impl Default for FindOptions {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_options_defaults() {
        let options = FindOptions::new();
        assert!(!options.recursive);
        assert_eq!(options.concurrency, 10);
        assert_eq!(options, FindOptions::default());
    }

    #[test]
    fn test_find_options_with_recursive() {
        let options = FindOptions::new().with_recursive(true);
        assert!(options.recursive);
    }

    #[test]
    fn test_find_options_zero_concurrency_clamped() {
        let options = FindOptions::new().with_concurrency(0);
        assert_eq!(options.concurrency, 1);
    }
}
