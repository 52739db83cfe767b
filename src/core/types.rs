use std::fmt;
use serde::{Serialize, Deserialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocId(pub u64);

impl DocId {
    pub const MAX: DocId = DocId(u64::MAX);

    pub fn new(id: u64) -> Self {
        DocId(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    /// The smallest id strictly greater than this one, if any
    pub fn checked_next(&self) -> Option<DocId> {
        self.0.checked_add(1).map(DocId)
    }
}

impl From<u64> for DocId {
    fn from(id: u64) -> Self {
        DocId(id)
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Half-open span of token positions inside one document
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Extent {
    pub begin: u32,
    pub end: u32,
}

impl Extent {
    pub fn new(begin: u32, end: u32) -> Self {
        Extent { begin, end }
    }

    /// Single-token occurrence at `position`
    pub fn point(position: u32) -> Self {
        Extent { begin: position, end: position.saturating_add(1) }
    }

    pub fn width(&self) -> u32 {
        self.end - self.begin
    }
}

/// One document's entry in a postings list.
/// `count == extents.len()`, extents sorted by begin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub count: u32,
    pub extents: Vec<Extent>,
}

impl Posting {
    pub fn new(doc_id: DocId, extents: Vec<Extent>) -> Self {
        Posting {
            doc_id,
            count: extents.len() as u32,
            extents,
        }
    }

    /// Posting whose occurrences are single positions
    pub fn from_positions(doc_id: DocId, positions: &[u32]) -> Self {
        Self::new(doc_id, positions.iter().map(|&p| Extent::point(p)).collect())
    }
}
