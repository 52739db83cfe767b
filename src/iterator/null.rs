use crate::core::error::Result;
use crate::core::stats::{CollectionStatistics, NodeStatistics};
use crate::core::types::{DocId, Extent};
use crate::iterator::{exhausted, Capabilities, Cursor};

/// Cursor with no postings: stands in for keys missing from the index
pub struct NullCursor {
    key: String,
}

impl NullCursor {
    pub fn new(key: impl Into<String>) -> Self {
        NullCursor { key: key.into() }
    }
}

impl Cursor for NullCursor {
    fn capabilities(&self) -> Capabilities {
        Capabilities::COUNT | Capabilities::EXTENTS | Capabilities::AGGREGATE
    }

    fn key(&self) -> &str {
        &self.key
    }

    fn is_done(&self) -> bool {
        true
    }

    fn current_candidate(&self) -> Result<DocId> {
        Err(exhausted(&self.key))
    }

    fn has_match(&self, _candidate: DocId) -> bool {
        false
    }

    fn move_to(&mut self, _candidate: DocId) -> Result<()> {
        Ok(())
    }

    fn exhaust(&mut self) {}

    fn count(&self) -> Result<u32> {
        Err(exhausted(&self.key))
    }

    fn extents(&self) -> Result<&[Extent]> {
        Err(exhausted(&self.key))
    }

    fn statistics(&self, collection: CollectionStatistics) -> Option<NodeStatistics> {
        Some(NodeStatistics::new(self.key.clone(), collection))
    }
}
