use crate::core::error::{Error, Result};
use crate::core::stats::{CollectionStatistics, NodeStatistics};
use crate::core::types::{DocId, Extent};
use crate::index::posting::{BlockSummary, PostingsCursor};
use crate::iterator::{exhausted, Capabilities, Cursor};
use crate::mmap::mmap_file::MmapSlice;

/// Leaf cursor exposing (document, count) without touching extents
pub struct CountSource {
    key: String,
    postings: PostingsCursor<MmapSlice>,
    floor: DocId,   // Highest target requested so far
}

impl CountSource {
    pub fn open(key: impl Into<String>, block: MmapSlice) -> Result<Self> {
        Ok(CountSource {
            key: key.into(),
            postings: PostingsCursor::open(block, false)?,
            floor: DocId(0),
        })
    }
}

/// Leaf cursor that also decodes each document's extent list
pub struct ExtentSource {
    key: String,
    postings: PostingsCursor<MmapSlice>,
    floor: DocId,
}

impl ExtentSource {
    pub fn open(key: impl Into<String>, block: MmapSlice) -> Result<Self> {
        Ok(ExtentSource {
            key: key.into(),
            postings: PostingsCursor::open(block, true)?,
            floor: DocId(0),
        })
    }
}

fn block_statistics(key: &str, summary: BlockSummary, collection: CollectionStatistics) -> NodeStatistics {
    NodeStatistics {
        node_frequency: summary.total_count,
        node_document_count: summary.doc_count,
        maximum_count: summary.max_count,
        ..NodeStatistics::new(key, collection)
    }
}

// Both sources walk one block the same way; only capabilities and extent
// decoding differ.
macro_rules! postings_cursor {
    () => {
        fn key(&self) -> &str {
            &self.key
        }

        fn is_done(&self) -> bool {
            self.postings.is_done()
        }

        fn current_candidate(&self) -> Result<DocId> {
            self.postings.current().ok_or_else(|| exhausted(&self.key))
        }

        fn has_match(&self, candidate: DocId) -> bool {
            self.postings.current() == Some(candidate)
        }

        // A target below one already requested is a caller bug
        fn move_to(&mut self, candidate: DocId) -> Result<()> {
            if self.postings.is_done() {
                return Ok(());
            }
            if candidate < self.floor {
                return Err(Error::invalid_cursor_state(format!(
                    "{} cannot move back to {} after a move to {}",
                    self.key, candidate.0, self.floor.0
                )));
            }
            self.floor = candidate;
            self.postings.skip_to(candidate)
        }

        fn exhaust(&mut self) {
            self.postings.exhaust();
        }

        fn count(&self) -> Result<u32> {
            if self.postings.is_done() {
                return Err(exhausted(&self.key));
            }
            Ok(self.postings.count())
        }

        fn statistics(&self, collection: CollectionStatistics) -> Option<NodeStatistics> {
            Some(block_statistics(&self.key, self.postings.summary(), collection))
        }
    };
}

impl Cursor for CountSource {
    fn capabilities(&self) -> Capabilities {
        Capabilities::COUNT | Capabilities::AGGREGATE
    }

    postings_cursor!();
}

impl Cursor for ExtentSource {
    fn capabilities(&self) -> Capabilities {
        Capabilities::COUNT | Capabilities::EXTENTS | Capabilities::AGGREGATE
    }

    postings_cursor!();

    fn extents(&self) -> Result<&[Extent]> {
        match self.postings.current() {
            Some(_) => Ok(self.postings.extents()),
            None => Err(exhausted(&self.key)),
        }
    }
}
