use crate::core::error::{Error, Result};
use crate::core::types::DocId;
use crate::iterator::{
    align_all, exhausted, matches_at, require, union_at, Capabilities, Cursor, CursorRef,
};

/// Documents matched by every child; counts 1 per matching document
pub struct Conjunction {
    key: String,
    children: Vec<CursorRef>,
    current: Option<DocId>,
}

impl Conjunction {
    pub fn new(key: impl Into<String>, children: Vec<CursorRef>) -> Result<Self> {
        if children.is_empty() {
            return Err(Error::unsupported_node("#band needs at least one child"));
        }
        let mut cursor = Conjunction { key: key.into(), children, current: None };
        cursor.seek(DocId(0))?;
        Ok(cursor)
    }

    fn seek(&mut self, target: DocId) -> Result<()> {
        let mut target = target;
        loop {
            let Some(doc) = align_all(&self.children, target)? else {
                self.current = None;
                return Ok(());
            };
            let mut all = true;
            for child in &self.children {
                all &= matches_at(child, doc)?;
            }
            if all {
                self.current = Some(doc);
                return Ok(());
            }
            match doc.checked_next() {
                Some(next) => target = next,
                None => {
                    self.current = None;
                    return Ok(());
                }
            }
        }
    }
}

impl Cursor for Conjunction {
    fn capabilities(&self) -> Capabilities {
        Capabilities::COUNT
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
    }

    fn count(&self) -> Result<u32> {
        self.current.map(|_| 1).ok_or_else(|| exhausted(&self.key))
    }
}

/// Documents matched by any child.
///
/// As `#bor` it counts the sum of the matching children's counts; as
/// `#combine` it only iterates, leaving scores to the children.
pub struct Disjunction {
    key: String,
    children: Vec<CursorRef>,
    counting: bool,
    current: Option<DocId>,
    count: u32,
}

impl Disjunction {
    /// Counting union; every child must produce counts
    pub fn counting(key: impl Into<String>, children: Vec<CursorRef>) -> Result<Self> {
        require(&children, Capabilities::COUNT, "bor")?;
        Self::new(key, children, true)
    }

    /// Iteration-only union used by `#combine`
    pub fn combine(key: impl Into<String>, children: Vec<CursorRef>) -> Result<Self> {
        Self::new(key, children, false)
    }

    fn new(key: impl Into<String>, children: Vec<CursorRef>, counting: bool) -> Result<Self> {
        if children.is_empty() {
            return Err(Error::unsupported_node("Union needs at least one child"));
        }
        let mut cursor = Disjunction {
            key: key.into(),
            children,
            counting,
            current: None,
            count: 0,
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

            let mut matched = false;
            let mut count = 0u32;
            for child in &self.children {
                if matches_at(child, doc)? {
                    matched = true;
                    if self.counting {
                        count = count.saturating_add(child.borrow().count()?);
                    }
                }
            }
            if matched {
                self.current = Some(doc);
                self.count = count;
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

impl Cursor for Disjunction {
    fn capabilities(&self) -> Capabilities {
        if self.counting {
            Capabilities::COUNT
        } else {
            Capabilities::empty()
        }
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
        self.count = 0;
    }

    fn count(&self) -> Result<u32> {
        if !self.counting {
            return Err(Error::unsupported_node(format!("{} does not produce counts", self.key)));
        }
        self.current.map(|_| self.count).ok_or_else(|| exhausted(&self.key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;
    use crate::iterator::shared;
    use crate::iterator::testing::{drain_counts, VecCursor};

    fn sample() -> (CursorRef, CursorRef) {
        (
            VecCursor::positions("a", &[(1, &[0]), (4, &[1, 2]), (9, &[5])]),
            VecCursor::positions("b", &[(2, &[3]), (4, &[7]), (9, &[1, 2, 3])]),
        )
    }

    #[test]
    fn conjunction_counts_one_per_document() {
        let (a, b) = sample();
        let band = shared(Conjunction::new("#band( a b )", vec![a, b]).unwrap());
        assert_eq!(drain_counts(&band), vec![(4, 1), (9, 1)]);
    }

    #[test]
    fn disjunction_sums_matching_children() {
        let (a, b) = sample();
        let bor = shared(Disjunction::counting("#bor( a b )", vec![a, b]).unwrap());
        assert_eq!(drain_counts(&bor), vec![(1, 1), (2, 1), (4, 3), (9, 4)]);
    }

    #[test]
    fn combine_iterates_without_counts() {
        let (a, b) = sample();
        let mut combine = Disjunction::combine("#combine( a b )", vec![a, b]).unwrap();
        assert!(combine.capabilities().is_empty());
        assert_eq!(combine.count().unwrap_err().kind(), ErrorKind::UnsupportedNode);

        let mut seen = Vec::new();
        while !combine.is_done() {
            let doc = combine.current_candidate().unwrap();
            seen.push(doc.0);
            combine.move_past(doc).unwrap();
        }
        assert_eq!(seen, vec![1, 2, 4, 9]);
    }

    #[test]
    fn move_to_lands_on_next_match() {
        let (a, b) = sample();
        let mut band = Conjunction::new("#band( a b )", vec![a, b]).unwrap();
        band.move_to(DocId(5)).unwrap();
        assert_eq!(band.current_candidate().unwrap(), DocId(9));
        band.move_to(DocId(10)).unwrap();
        assert!(band.is_done());
        // Moving a done cursor is a no-op
        band.move_past(DocId(20)).unwrap();
        assert!(band.is_done());
    }
}
