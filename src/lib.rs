pub mod analyze;
pub mod config;
pub mod decl;
pub mod driver;
pub mod error;
pub mod graph;
pub mod index;
pub mod logging;
pub mod reconcile;
pub mod report;
pub mod syntax;
pub mod types;

pub use config::Settings;
pub use decl::{Accessibility, DeclKind, Declaration, RefRole, Reference};
pub use driver::Driver;
pub use error::{ScanError, ScanResult};
pub use graph::SourceGraph;
pub use report::{Finding, FindingCategory, OutputFormat};
pub use types::{DeclId, FileId, Location, RefId, UsrId};
