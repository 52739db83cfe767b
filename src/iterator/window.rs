//! Proximity windows over extent-bearing children.
//!
//! Both windows are conjunctions: a document is a candidate only when every
//! child matches it, and a match only when at least one window is found in
//! the children's extents. The window extents become this cursor's extents.

use crate::core::error::{Error, Result};
use crate::core::types::{DocId, Extent};
use crate::iterator::{align_all, exhausted, require, Capabilities, Cursor, CursorRef};

/// Windows where children occur in order, each starting less than `width`
/// positions after the previous one ends
pub fn ordered_extents<L: AsRef<[Extent]>>(lists: &[L], width: u32) -> Vec<Extent> {
    let mut windows = Vec::new();
    if lists.is_empty() || lists.iter().any(|list| list.as_ref().is_empty()) {
        return windows;
    }

    let mut next = vec![0usize; lists.len()];
    'first: for first in lists[0].as_ref() {
        let mut end = first.end;
        let mut valid = true;
        for (i, list) in lists.iter().enumerate().skip(1) {
            let list = list.as_ref();
            while list[next[i]].begin < end {
                next[i] += 1;
                if next[i] == list.len() {
                    break 'first;
                }
            }
            let extent = list[next[i]];
            if extent.begin - end >= width {
                valid = false;
                break;
            }
            end = extent.end;
        }
        if valid {
            windows.push(Extent::new(first.begin, end));
        }
    }
    windows
}

/// Windows covering one extent of every child, in any order, spanning at
/// most `width` positions
pub fn unordered_extents<L: AsRef<[Extent]>>(lists: &[L], width: u32) -> Vec<Extent> {
    let mut windows = Vec::new();
    if lists.is_empty() || lists.iter().any(|list| list.as_ref().is_empty()) {
        return windows;
    }

    let mut next = vec![0usize; lists.len()];
    loop {
        let mut begin = u32::MAX;
        let mut end = 0u32;
        let mut earliest = 0;
        for (i, list) in lists.iter().enumerate() {
            let extent = list.as_ref()[next[i]];
            if extent.begin < begin {
                begin = extent.begin;
                earliest = i;
            }
            end = end.max(extent.end);
        }
        if end - begin <= width {
            windows.push(Extent::new(begin, end));
        }

        next[earliest] += 1;
        if next[earliest] == lists[earliest].as_ref().len() {
            return windows;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowKind {
    Ordered,
    Unordered,
}

impl WindowKind {
    fn operator(&self) -> &'static str {
        match self {
            WindowKind::Ordered => "od",
            WindowKind::Unordered => "uw",
        }
    }

    fn windows(&self, lists: &[&[Extent]], width: u32) -> Vec<Extent> {
        match self {
            WindowKind::Ordered => ordered_extents(lists, width),
            WindowKind::Unordered => unordered_extents(lists, width),
        }
    }
}

/// Cursor over the documents where the children form at least one window
pub struct WindowCursor {
    key: String,
    kind: WindowKind,
    width: u32,
    children: Vec<CursorRef>,
    current: Option<DocId>,
    extents: Vec<Extent>,
}

impl WindowCursor {
    pub fn new(
        key: impl Into<String>,
        kind: WindowKind,
        width: u32,
        children: Vec<CursorRef>,
    ) -> Result<Self> {
        if children.is_empty() {
            return Err(Error::unsupported_node(format!(
                "#{} needs at least one child", kind.operator()
            )));
        }
        require(&children, Capabilities::EXTENTS, kind.operator())?;

        let mut cursor = WindowCursor {
            key: key.into(),
            kind,
            width,
            children,
            current: None,
            extents: Vec::new(),
        };
        cursor.seek(DocId(0))?;
        Ok(cursor)
    }

    pub fn ordered(key: impl Into<String>, width: u32, children: Vec<CursorRef>) -> Result<Self> {
        Self::new(key, WindowKind::Ordered, width, children)
    }

    pub fn unordered(key: impl Into<String>, width: u32, children: Vec<CursorRef>) -> Result<Self> {
        Self::new(key, WindowKind::Unordered, width, children)
    }

    pub fn kind(&self) -> WindowKind {
        self.kind
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    fn seek(&mut self, target: DocId) -> Result<()> {
        let mut target = target;
        loop {
            let Some(doc) = align_all(&self.children, target)? else {
                self.exhaust();
                return Ok(());
            };

            let windows = {
                let guards: Vec<_> =
                    self.children.iter().map(|child| child.borrow()).collect();
                let mut lists: Vec<&[Extent]> = Vec::with_capacity(guards.len());
                for child in &guards {
                    lists.push(if child.has_match(doc) { child.extents()? } else { &[] });
                }
                self.kind.windows(&lists, self.width)
            };
            if !windows.is_empty() {
                self.current = Some(doc);
                self.extents = windows;
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

impl Cursor for WindowCursor {
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
