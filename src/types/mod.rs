use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::num::NonZeroU32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeclId(NonZeroU32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RefId(NonZeroU32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileId(NonZeroU32);

/// Interned form of a compiler USR string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UsrId(NonZeroU32);

macro_rules! impl_id {
    ($name:ident) => {
        impl $name {
            pub fn new(value: u32) -> Option<Self> {
                NonZeroU32::new(value).map(Self)
            }

            pub fn value(&self) -> u32 {
                self.0.get()
            }

            /// Zero-based index into the arena that owns this id.
            pub(crate) fn index(&self) -> usize {
                (self.0.get() - 1) as usize
            }

            pub(crate) fn from_index(index: usize) -> Self {
                Self(NonZeroU32::new(index as u32 + 1).expect("arena index overflow"))
            }
        }
    };
}

impl_id!(DeclId);
impl_id!(RefId);
impl_id!(FileId);
impl_id!(UsrId);

/// A point in a source file. Ordering is (file, line, column) so location
/// sorts are stable across runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    pub file: FileId,
    pub line: u32,
    pub column: u32,
}

impl Location {
    pub fn new(file: FileId, line: u32, column: u32) -> Self {
        Self { file, line, column }
    }

    /// The (line, column) pair, for matching against parser-reported points
    /// that carry no file id.
    pub fn point(&self) -> (u32, u32) {
        (self.line, self.column)
    }
}

pub type CompactString = Box<str>;

pub fn compact_string(s: &str) -> CompactString {
    s.into()
}

/// Interns USR strings so graph indexes key on a u32 instead of a heap
/// string. Resolution back to the string form is only needed when rendering
/// findings.
#[derive(Debug, Default)]
pub struct UsrInterner {
    names: Vec<CompactString>,
    ids: HashMap<CompactString, UsrId>,
}

impl UsrInterner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, usr: &str) -> UsrId {
        if let Some(&id) = self.ids.get(usr) {
            return id;
        }
        let id = UsrId::from_index(self.names.len());
        self.names.push(compact_string(usr));
        self.ids.insert(compact_string(usr), id);
        id
    }

    pub fn get(&self, usr: &str) -> Option<UsrId> {
        self.ids.get(usr).copied()
    }

    pub fn resolve(&self, id: UsrId) -> &str {
        &self.names[id.index()]
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
