//! File system walker for discovering Swift sources to analyze.
//!
//! Respects .gitignore rules, honors the configured ignore patterns, and
//! skips hidden files.

use crate::config::Settings;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

pub struct FileWalker {
    settings: Arc<Settings>,
}

impl FileWalker {
    pub fn new(settings: Arc<Settings>) -> Self {
        Self { settings }
    }

    /// Walk a directory and return the Swift source files beneath it,
    /// sorted so discovery order never depends on directory order.
    pub fn walk(&self, root: &Path) -> Vec<PathBuf> {
        let mut builder = WalkBuilder::new(root);
        builder
            .hidden(false)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .follow_links(false)
            .require_git(false);

        let mut override_builder = ignore::overrides::OverrideBuilder::new(root);
        for pattern in &self.settings.scan.ignore_patterns {
            if let Err(e) = override_builder.add(&format!("!{pattern}")) {
                warn!("invalid ignore pattern '{pattern}': {e}");
            }
        }
        if let Ok(overrides) = override_builder.build() {
            builder.overrides(overrides);
        }

        let mut files: Vec<PathBuf> = builder
            .build()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
            .filter_map(|entry| {
                let path = entry.path();
                let name = path.file_name()?.to_str()?;
                if name.starts_with('.') {
                    return None;
                }
                if path.extension().is_some_and(|ext| ext == "swift") {
                    Some(path.to_path_buf())
                } else {
                    None
                }
            })
            .collect();
        files.sort();
        files
    }
}
