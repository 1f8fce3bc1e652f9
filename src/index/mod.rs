//! Phase one: reading compiler index stores and committing per-file states
//! into the source graph.

pub mod ingest;
pub mod pipeline;
pub mod store;
pub mod walker;

pub use ingest::{FileIngest, RawDecl, RawRef, ingest_file};
pub use pipeline::{FileJob, IngestPipeline, IngestStats, PendingRelations};
pub use store::{
    IndexStore, JsonIndexStore, MemoryIndexStore, OccurrenceRecord, RelationRecord, RoleName,
    Roles, SymbolRecord, UnitHandle, UnitRecord,
};
pub use walker::FileWalker;
