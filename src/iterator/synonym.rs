use crate::core::error::{Error, Result};
use crate::core::types::{DocId, Extent};
use crate::iterator::{exhausted, matches_at, require, union_at, Capabilities, Cursor, CursorRef};

/// Treats several extent-bearing children as one term: a document matches
/// when any child does, with the children's extents merged by position.
pub struct SynonymCursor {
    key: String,
    children: Vec<CursorRef>,
    current: Option<DocId>,
    extents: Vec<Extent>,
}

impl SynonymCursor {
    pub fn new(key: impl Into<String>, children: Vec<CursorRef>) -> Result<Self> {
        if children.is_empty() {
            return Err(Error::unsupported_node("#syn needs at least one child"));
        }
        require(&children, Capabilities::EXTENTS, "syn")?;

        let mut cursor = SynonymCursor {
            key: key.into(),
            children,
            current: None,
            extents: Vec::new(),
        };
        cursor.seek(DocId(0))?;
        Ok(cursor)
    }

    fn seek(&mut self, target: DocId) -> Result<()> {
        let mut target = target;
        loop {
            let Some(doc) = union_at(&self.children, target)? else {
                self.exhaust();
                return Ok(());
            };

            let mut merged = Vec::new();
            for child in &self.children {
                if matches_at(child, doc)? {
                    merged.extend_from_slice(child.borrow().extents()?);
                }
            }
            if !merged.is_empty() {
                merged.sort();
                merged.dedup();
                self.current = Some(doc);
                self.extents = merged;
                return Ok(());
            }

            match doc.checked_next() {
                Some(next) => target = next,
                None => {
                    self.exhaust();
                    return Ok(());
                }
            }
        }
    }
}

impl Cursor for SynonymCursor {
    fn capabilities(&self) -> Capabilities {
        Capabilities::COUNT | Capabilities::EXTENTS
    }

    fn key(&self) -> &str {
        &self.key
    }

    fn is_done(&self) -> bool {
        self.current.is_none()
    }

    fn current_candidate(&self) -> Result<DocId> {
        self.current.ok_or_else(|| exhausted(&self.key))
    }

    fn has_match(&self, candidate: DocId) -> bool {
        self.current == Some(candidate)
    }

    fn move_to(&mut self, candidate: DocId) -> Result<()> {
        match self.current {
            Some(doc) if doc < candidate => self.seek(candidate),
            _ => Ok(()),
        }
    }

    fn exhaust(&mut self) {
        self.current = None;
        self.extents.clear();
    }

    fn count(&self) -> Result<u32> {
        match self.current {
            Some(_) => Ok(self.extents.len() as u32),
            None => Err(exhausted(&self.key)),
        }
    }

    fn extents(&self) -> Result<&[Extent]> {
        match self.current {
            Some(_) => Ok(&self.extents),
            None => Err(exhausted(&self.key)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iterator::shared;
    use crate::iterator::testing::{drain_counts, VecCursor};

    #[test]
    fn merges_children_by_document_and_position() {
        let car = VecCursor::positions("car", &[(1, &[4]), (3, &[0, 9])]);
        let auto = VecCursor::positions("auto", &[(2, &[1]), (3, &[5])]);
        let syn = shared(SynonymCursor::new("#syn( car auto )", vec![car, auto]).unwrap());

        assert_eq!(drain_counts(&syn), vec![(1, 1), (2, 1), (3, 3)]);
    }

    #[test]
    fn extents_are_sorted() {
        let a = VecCursor::positions("a", &[(7, &[10, 30])]);
        let b = VecCursor::positions("b", &[(7, &[20])]);
        let mut syn = SynonymCursor::new("s", vec![a, b]).unwrap();

        let begins: Vec<u32> = syn.extents().unwrap().iter().map(|e| e.begin).collect();
        assert_eq!(begins, vec![10, 20, 30]);

        syn.move_past(DocId(7)).unwrap();
        assert!(syn.is_done());
        assert!(syn.extents().is_err());
    }
}
