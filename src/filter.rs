//! Include/exclude path filtering
//!
//! Glob-pattern filter deciding which style files the transform touches.
//! An empty include list means "everything"; exclusions always win.

use crate::preprocess::normalize_path;
use glob::Pattern;
use std::path::Path;

/// Compiled include/exclude filter.
#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
}

impl PathFilter {
    /// Compile a filter from glob pattern strings.
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self, glob::PatternError> {
        Ok(Self { include: compile(include)?, exclude: compile(exclude)? })
    }

    /// Whether `path` passes the filter.
    pub fn matches(&self, path: &Path) -> bool {
        let normalized = normalize_path(path);
        if self.exclude.iter().any(|pattern| pattern.matches(&normalized)) {
            return false;
        }
        self.include.is_empty()
            || self.include.iter().any(|pattern| pattern.matches(&normalized))
    }
}

fn compile(patterns: &[String]) -> Result<Vec<Pattern>, glob::PatternError> {
    patterns.iter().map(|pattern| Pattern::new(pattern)).collect()
}
