//! The syntax-provider boundary.
//!
//! Parsing is an external collaborator; the core consumes its results
//! through [`SyntaxProvider`]. Per file the provider yields one
//! [`FileSyntax`]: an enrichment record per declaration location, the
//! imports the file declares, leading trivia, and the parameters the parser
//! found unread per function body.

mod commands;
mod enrich;

pub use commands::CommentCommand;
pub use enrich::{EnrichOutcome, apply_file_syntax, assign_reference_roles};

use crate::decl::Accessibility;
use crate::error::{ScanError, ScanResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// A (line, column) pair inside one file. The provider never knows file
/// ids, so its records carry bare points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourcePoint {
    pub line: u32,
    pub column: u32,
}

impl SourcePoint {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportStatement {
    pub module: Box<str>,
    pub line: u32,
    #[serde(default)]
    pub column: u32,
}

/// Enrichment record for one declaration, keyed by its location.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeclSyntax {
    pub line: u32,
    pub column: u32,

    /// Accessibility written in source, if any.
    #[serde(default)]
    pub accessibility: Option<Accessibility>,
    #[serde(default)]
    pub attributes: Vec<String>,
    #[serde(default)]
    pub modifiers: Vec<String>,
    /// Raw comment trivia attached to the declaration; the core parses the
    /// command grammar out of these.
    #[serde(default)]
    pub comment_lines: Vec<String>,
    #[serde(default)]
    pub declared_type: Option<String>,

    #[serde(default)]
    pub inherited_types: Vec<SourcePoint>,
    #[serde(default)]
    pub variable_types: Vec<SourcePoint>,
    #[serde(default)]
    pub return_types: Vec<SourcePoint>,
    #[serde(default)]
    pub parameter_types: Vec<SourcePoint>,
    #[serde(default)]
    pub generic_parameters: Vec<SourcePoint>,
    #[serde(default)]
    pub generic_requirements: Vec<SourcePoint>,
    #[serde(default)]
    pub variable_init_calls: Vec<SourcePoint>,
    #[serde(default)]
    pub metatype_arguments: Vec<SourcePoint>,

    #[serde(default)]
    pub let_shorthand_identifiers: Vec<String>,
    #[serde(default)]
    pub has_capital_self_function_call: bool,
    #[serde(default)]
    pub has_generic_function_returned_metatype_parameters: bool,
}

/// Parameters the parser found unread inside one function body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FunctionParams {
    pub line: u32,
    pub column: u32,
    pub unused: Vec<String>,
}

/// Everything the provider reports for one source file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileSyntax {
    /// Comment lines before the first declaration; `ignore-all` lives here.
    #[serde(default)]
    pub leading_comment_lines: Vec<String>,
    #[serde(default)]
    pub imports: Vec<ImportStatement>,
    #[serde(default)]
    pub declarations: Vec<DeclSyntax>,
    #[serde(default)]
    pub unused_parameters: Vec<FunctionParams>,
}

pub trait SyntaxProvider: Send + Sync {
    fn file_syntax(&self, path: &Path) -> ScanResult<FileSyntax>;
}

/// Reads a single JSON document mapping file paths to their syntax records,
/// as emitted by the external visitor.
pub struct JsonSyntaxProvider {
    records: HashMap<PathBuf, FileSyntax>,
}

impl JsonSyntaxProvider {
    pub fn open(path: &Path) -> ScanResult<Self> {
        let data = std::fs::read_to_string(path).map_err(|e| ScanError::io(path, e))?;
        let records: HashMap<PathBuf, FileSyntax> =
            serde_json::from_str(&data).map_err(|e| ScanError::Syntax {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        Ok(Self { records })
    }
}

impl SyntaxProvider for JsonSyntaxProvider {
    fn file_syntax(&self, path: &Path) -> ScanResult<FileSyntax> {
        self.records.get(path).cloned().ok_or_else(|| ScanError::Syntax {
            path: path.to_path_buf(),
            reason: "no syntax record for file".to_string(),
        })
    }
}

/// In-memory provider for fixtures and tests.
#[derive(Default)]
pub struct MemorySyntaxProvider {
    records: HashMap<PathBuf, FileSyntax>,
    failing: Vec<PathBuf>,
}

impl MemorySyntaxProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, syntax: FileSyntax) {
        self.records.insert(path.into(), syntax);
    }

    /// Make `file_syntax` fail for a path, to exercise the treated-as-live
    /// degradation.
    pub fn fail_for(&mut self, path: impl Into<PathBuf>) {
        self.failing.push(path.into());
    }
}

impl SyntaxProvider for MemorySyntaxProvider {
    fn file_syntax(&self, path: &Path) -> ScanResult<FileSyntax> {
        if self.failing.iter().any(|p| p == path) {
            return Err(ScanError::Syntax {
                path: path.to_path_buf(),
                reason: "simulated parser failure".to_string(),
            });
        }
        Ok(self.records.get(path).cloned().unwrap_or_default())
    }
}

/// Provider used when no syntax output is available: every file yields an
/// empty record, so declarations keep their defaults.
pub struct EmptySyntaxProvider;

impl SyntaxProvider for EmptySyntaxProvider {
    fn file_syntax(&self, _path: &Path) -> ScanResult<FileSyntax> {
        Ok(FileSyntax::default())
    }
}
