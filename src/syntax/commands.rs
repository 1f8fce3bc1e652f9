//! The in-source comment command grammar:
//! `// periphery:<command>[:<args>]` with comma-separated identifier args.

use crate::types::CompactString;
use serde::{Deserialize, Serialize};
use tracing::warn;

const MARKER: &str = "periphery:";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommentCommand {
    /// Retain the annotated declaration and all descendants.
    Ignore,
    /// Retain every declaration in the file.
    IgnoreAll,
    /// Retain the named parameters of the annotated function.
    IgnoreParameters(Vec<CompactString>),
}

impl CommentCommand {
    /// Parse a single comment line. Returns None for ordinary comments.
    pub fn parse_line(line: &str) -> Option<Self> {
        let trimmed = line.trim_start();
        let body = trimmed.strip_prefix("//")?.trim_start();
        let rest = body.strip_prefix(MARKER)?;

        let (command, args) = match rest.split_once(':') {
            Some((command, args)) => (command.trim(), Some(args)),
            None => (rest.trim(), None),
        };

        match command {
            "ignore" => Some(Self::Ignore),
            "ignore-all" => Some(Self::IgnoreAll),
            "ignore-parameters" => {
                let names: Vec<CompactString> = args
                    .unwrap_or_default()
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(Into::into)
                    .collect();
                if names.is_empty() {
                    warn!("ignore-parameters command without parameter names");
                    return None;
                }
                Some(Self::IgnoreParameters(names))
            }
            other => {
                warn!("unknown comment command '{other}'");
                None
            }
        }
    }

    /// Parse every command out of a block of comment lines.
    pub fn parse_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Vec<Self> {
        lines.into_iter().filter_map(Self::parse_line).collect()
    }

    pub fn ignores_parameter(&self, name: &str) -> bool {
        match self {
            Self::IgnoreParameters(names) => names.iter().any(|n| &**n == name),
            _ => false,
        }
    }
}
