//! Finding records and the formatter boundary.
//!
//! The analyzer produces a flat, sorted sequence of findings; rendering is
//! the only responsibility left here. Two formats ship: a compiler-style
//! text diagnostic per line, and a JSON array for tooling.

use crate::decl::DeclKind;
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FindingCategory {
    UnusedDeclaration,
    RedundantPublicAccessibility,
    UnusedParameter,
    RedundantConformance,
    UnusedImport,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub usrs: Vec<String>,
    pub kind: DeclKind,
    pub name: Option<String>,
    pub path: PathBuf,
    pub line: u32,
    pub column: u32,
    pub category: FindingCategory,
}

impl Finding {
    fn description(&self) -> String {
        let name = self.name.as_deref().unwrap_or("<anonymous>");
        match self.category {
            FindingCategory::UnusedDeclaration => {
                format!("{} '{}' is unused", self.kind.display_name(), name)
            }
            FindingCategory::RedundantPublicAccessibility => {
                format!(
                    "{} '{}' is public, but not referenced outside its module",
                    self.kind.display_name(),
                    name
                )
            }
            FindingCategory::UnusedParameter => format!("Parameter '{name}' is unused"),
            FindingCategory::RedundantConformance => {
                format!("Conformance to '{name}' is redundant")
            }
            FindingCategory::UnusedImport => format!("Import of '{name}' is unused"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

pub fn write_findings(
    findings: &[Finding],
    format: OutputFormat,
    writer: &mut impl Write,
) -> io::Result<()> {
    match format {
        OutputFormat::Text => write_text(findings, writer),
        OutputFormat::Json => write_json(findings, writer),
    }
}

fn write_text(findings: &[Finding], writer: &mut impl Write) -> io::Result<()> {
    for finding in findings {
        writeln!(
            writer,
            "{}:{}:{}: warning: {}",
            finding.path.display(),
            finding.line,
            finding.column,
            finding.description()
        )?;
    }
    Ok(())
}

fn write_json(findings: &[Finding], writer: &mut impl Write) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, findings)?;
    writeln!(writer)
}
