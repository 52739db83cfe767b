//! Cursors over postings and over combinations of other cursors.
//!
//! Every node of a compiled query is a [`Cursor`]. What a cursor can do beyond
//! plain iteration is declared up front through [`Capabilities`] and checked
//! when the tree is built, so evaluation never checks for a type at runtime.
//!
//! ```text
//!   Unpositioned ──move_to/move_past──▶ Positioned(candidate) ──▶ Done
//! ```
//!
//! Candidates only move forward. Composite cursors treat a move aimed at or
//! behind their current candidate as a no-op, which is what lets one parent
//! drive identical siblings through a single cursor. Index-backed leaves fail
//! with `InvalidCursorState` when asked for a target below one they were
//! already moved to.

use std::cell::RefCell;
use std::rc::Rc;
use bitflags::bitflags;
use crate::core::error::{Error, Result};
use crate::core::stats::{CollectionStatistics, NodeStatistics};
use crate::core::types::{DocId, Extent};

pub mod boolean;
pub mod feature;
pub mod null;
pub mod synonym;
pub mod window;

bitflags! {
    /// Operations a cursor supports beyond iteration
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Capabilities: u8 {
        const COUNT = 1;             // count() per matching document
        const EXTENTS = 1 << 1;      // extents() per matching document
        const AGGREGATE = 1 << 2;    // statistics() without scanning
        const ESTIMATOR = 1 << 3;    // accepts injected score bounds
    }
}

/// Identity under which an estimator's bound accumulators are stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EstimatorId(pub u64);

pub trait Cursor {
    fn capabilities(&self) -> Capabilities;

    /// Textual key: the index key for leaves, the node signature otherwise
    fn key(&self) -> &str;

    fn is_done(&self) -> bool;

    /// Next document this cursor may report on
    fn current_candidate(&self) -> Result<DocId>;

    fn has_match(&self, candidate: DocId) -> bool;

    /// Advance to the first candidate >= `candidate`
    fn move_to(&mut self, candidate: DocId) -> Result<()>;

    /// Jump straight to Done
    fn exhaust(&mut self);

    /// Advance strictly beyond `candidate`
    fn move_past(&mut self, candidate: DocId) -> Result<()> {
        match candidate.checked_next() {
            Some(next) => self.move_to(next),
            None => {
                self.exhaust();
                Ok(())
            }
        }
    }

    /// Occurrences in the current candidate; only valid on a match
    fn count(&self) -> Result<u32> {
        Err(Error::unsupported_node(format!("{} does not produce counts", self.key())))
    }

    /// Extents in the current candidate, borrowed until the cursor moves
    fn extents(&self) -> Result<&[Extent]> {
        Err(Error::unsupported_node(format!("{} does not produce extents", self.key())))
    }

    /// Precomputed statistics for aggregate-capable cursors
    fn statistics(&self, _collection: CollectionStatistics) -> Option<NodeStatistics> {
        None
    }

    fn estimator_id(&self) -> Option<EstimatorId> {
        None
    }
}

/// Handle to a cursor that may be shared by several parents
pub type CursorRef = Rc<RefCell<dyn Cursor>>;

pub fn shared<C: Cursor + 'static>(cursor: C) -> CursorRef {
    Rc::new(RefCell::new(cursor))
}

pub(crate) fn exhausted(key: &str) -> Error {
    Error::invalid_cursor_state(format!("Cursor {} is exhausted", key))
}

/// Fail unless every child declares `needed`
pub fn require(children: &[CursorRef], needed: Capabilities, operator: &str) -> Result<()> {
    for child in children {
        let child = child.borrow();
        if !child.capabilities().contains(needed) {
            return Err(Error::unsupported_node(format!(
                "#{} needs {:?} from {}, which only offers {:?}",
                operator, needed, child.key(), child.capabilities()
            )));
        }
    }
    Ok(())
}

/// Smallest current candidate among children that are not done
pub(crate) fn min_candidate(children: &[CursorRef]) -> Result<Option<DocId>> {
    let mut min: Option<DocId> = None;
    for child in children {
        let child = child.borrow();
        if child.is_done() {
            continue;
        }
        let candidate = child.current_candidate()?;
        min = Some(min.map_or(candidate, |m| m.min(candidate)));
    }
    Ok(min)
}

/// Largest current candidate, or None as soon as any child is done
pub(crate) fn max_candidate(children: &[CursorRef]) -> Result<Option<DocId>> {
    let mut max = DocId(0);
    for child in children {
        let child = child.borrow();
        if child.is_done() {
            return Ok(None);
        }
        max = max.max(child.current_candidate()?);
    }
    Ok(Some(max))
}

/// Move every child to `target`, then leapfrog until all sit on one
/// document. None once any child is done.
pub(crate) fn align_all(children: &[CursorRef], target: DocId) -> Result<Option<DocId>> {
    let mut target = target;
    loop {
        for child in children {
            child.borrow_mut().move_to(target)?;
        }
        match max_candidate(children)? {
            None => return Ok(None),
            Some(max) if max == target => return Ok(Some(target)),
            Some(max) => target = max,
        }
    }
}

/// Move every child to `target` and return the smallest candidate left
pub(crate) fn union_at(children: &[CursorRef], target: DocId) -> Result<Option<DocId>> {
    for child in children {
        child.borrow_mut().move_to(target)?;
    }
    min_candidate(children)
}

/// Whether `child` sits on `candidate` with a real match
pub(crate) fn matches_at(child: &CursorRef, candidate: DocId) -> Result<bool> {
    let child = child.borrow();
    if child.is_done() {
        return Ok(false);
    }
    Ok(child.current_candidate()? == candidate && child.has_match(candidate))
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory cursor used by unit tests across the iterator modules.

    use super::*;
    use crate::core::types::Posting;

    pub struct VecCursor {
        key: String,
        postings: Vec<Posting>,
        position: usize,
    }

    impl VecCursor {
        pub fn new(key: &str, postings: Vec<Posting>) -> Self {
            VecCursor { key: key.to_string(), postings, position: 0 }
        }

        /// Documents with single-position occurrences
        pub fn positions(key: &str, docs: &[(u64, &[u32])]) -> CursorRef {
            let postings = docs
                .iter()
                .map(|(doc, positions)| Posting::from_positions(DocId(*doc), positions))
                .collect();
            shared(VecCursor::new(key, postings))
        }

        fn current(&self) -> Option<&Posting> {
            self.postings.get(self.position)
        }
    }

    impl Cursor for VecCursor {
        fn capabilities(&self) -> Capabilities {
            Capabilities::COUNT | Capabilities::EXTENTS
        }

        fn key(&self) -> &str {
            &self.key
        }

        fn is_done(&self) -> bool {
            self.position >= self.postings.len()
        }

        fn current_candidate(&self) -> Result<DocId> {
            self.current().map(|p| p.doc_id).ok_or_else(|| exhausted(&self.key))
        }

        fn has_match(&self, candidate: DocId) -> bool {
            self.current().is_some_and(|p| p.doc_id == candidate)
        }

        fn move_to(&mut self, candidate: DocId) -> Result<()> {
            while self.current().is_some_and(|p| p.doc_id < candidate) {
                self.position += 1;
            }
            Ok(())
        }

        fn exhaust(&mut self) {
            self.position = self.postings.len();
        }

        fn count(&self) -> Result<u32> {
            self.current().map(|p| p.count).ok_or_else(|| exhausted(&self.key))
        }

        fn extents(&self) -> Result<&[Extent]> {
            self.current().map(|p| p.extents.as_slice()).ok_or_else(|| exhausted(&self.key))
        }
    }

    /// Drain a counting cursor into (doc, count) pairs
    pub fn drain_counts(cursor: &CursorRef) -> Vec<(u64, u32)> {
        let mut out = Vec::new();
        let mut cursor = cursor.borrow_mut();
        while !cursor.is_done() {
            let candidate = cursor.current_candidate().unwrap();
            if cursor.has_match(candidate) {
                out.push((candidate.0, cursor.count().unwrap()));
            }
            cursor.move_past(candidate).unwrap();
        }
        out
    }
}
