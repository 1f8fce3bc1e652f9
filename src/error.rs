//! Error types for the scan pipeline.
//!
//! Structured errors via thiserror. Unindexed and conflicting-unit errors
//! surface immediately after unit enumeration, before any heavy work; index
//! read failures abort the run; per-file syntax failures degrade to
//! "treated as live" and never reach this type.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    /// Source files with no compilation unit in any index store.
    #[error("{} source file(s) have no compilation unit in any index store: {}", .files.len(), format_paths(.files))]
    UnindexedFiles { files: Vec<PathBuf> },

    #[error("file '{file}' appears in multiple index units that disagree on module name: {}", .modules.join(", "))]
    ConflictingIndexUnits { file: PathBuf, modules: Vec<String> },

    #[error("failed to read index store '{path}': {reason}")]
    IndexRead { path: PathBuf, reason: String },

    #[error("syntax parsing failed for '{path}': {reason}")]
    Syntax { path: PathBuf, reason: String },

    #[error("invalid configuration: {reason}")]
    Config { reason: String },

    #[error("i/o error on '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

fn format_paths(paths: &[PathBuf]) -> String {
    let mut shown: Vec<String> = paths.iter().take(5).map(|p| p.display().to_string()).collect();
    if paths.len() > 5 {
        shown.push(format!("… ({} more)", paths.len() - 5));
    }
    shown.join(", ")
}

impl ScanError {
    pub fn index_read(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        Self::IndexRead {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for scan operations
pub type ScanResult<T> = Result<T, ScanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unindexed_message_truncates() {
        let files: Vec<PathBuf> = (0..8).map(|i| PathBuf::from(format!("/src/F{i}.swift"))).collect();
        let err = ScanError::UnindexedFiles { files };
        let msg = err.to_string();
        assert!(msg.contains("8 source file(s)"));
        assert!(msg.contains("/src/F0.swift"));
        assert!(msg.contains("(3 more)"));
        assert!(!msg.contains("/src/F6.swift"));
    }

    #[test]
    fn test_conflicting_units_message() {
        let err = ScanError::ConflictingIndexUnits {
            file: PathBuf::from("/src/A.swift"),
            modules: vec!["App".into(), "Kit".into()],
        };
        assert!(err.to_string().contains("App, Kit"));
    }
}
