use std::collections::HashMap;
use log::warn;
use crate::core::error::Result;
use crate::index::disk_reader::DiskIndexReader;
use crate::iterator::{Capabilities, CursorRef};
use crate::query::node::Node;
use crate::retrieval::context::ScoringContext;
use crate::retrieval::registry::{BuildInput, OperatorRegistry};
use crate::retrieval::synthetic::{is_window_operator, SyntheticCounts};

/// Per-call compilation switches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileOptions {
    pub share_nodes: bool,   // Reuse cursors of identical trees and siblings
}

/// Root cursors compiled for one evaluation, addressable by the canonical
/// text of their node.
///
/// Only whole trees are recorded. A subtree nested under two different
/// parents is driven by each of them separately, so handing both the same
/// cursor would let one parent skip documents the other still needs.
#[derive(Default)]
pub struct CursorArena {
    handles: HashMap<String, usize>,
    cursors: Vec<CursorRef>,
}

impl CursorArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.cursors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cursors.is_empty()
    }

    pub fn handle(&self, structure: &str) -> Option<usize> {
        self.handles.get(structure).copied()
    }

    pub fn cursor(&self, handle: usize) -> Option<&CursorRef> {
        self.cursors.get(handle)
    }

    pub fn get(&self, structure: &str) -> Option<CursorRef> {
        self.handle(structure).and_then(|h| self.cursor(h)).cloned()
    }

    pub fn insert(&mut self, structure: String, cursor: CursorRef) -> usize {
        let handle = self.cursors.len();
        self.cursors.push(cursor);
        self.handles.insert(structure, handle);
        handle
    }
}

/// Compiles node trees into cursor trees, children first
pub struct CursorCompiler<'a> {
    index: &'a DiskIndexReader,
    registry: &'a OperatorRegistry,
    synthetic: Option<&'a SyntheticCounts>,
    scorer: &'a str,
    options: CompileOptions,
}

impl<'a> CursorCompiler<'a> {
    pub fn new(
        index: &'a DiskIndexReader,
        registry: &'a OperatorRegistry,
        synthetic: Option<&'a SyntheticCounts>,
        scorer: &'a str,
        options: CompileOptions,
    ) -> Self {
        CursorCompiler { index, registry, synthetic, scorer, options }
    }

    /// Compile `node`. With sharing on, a tree structurally identical to one
    /// already in `arena` returns that cursor, and identical siblings under
    /// one parent share a single child cursor.
    pub fn compile(
        &self,
        node: &Node,
        context: &mut ScoringContext,
        arena: &mut CursorArena,
    ) -> Result<CursorRef> {
        if !self.options.share_nodes {
            return self.build(node, context);
        }

        let structure = node.to_string();
        if let Some(cursor) = arena.get(&structure) {
            return Ok(cursor);
        }
        let cursor = self.build(node, context)?;
        arena.insert(structure, cursor.clone());
        Ok(cursor)
    }

    fn build(&self, node: &Node, context: &mut ScoringContext) -> Result<CursorRef> {
        // Siblings are always moved to the same target by their parent
        let mut siblings: HashMap<String, CursorRef> = HashMap::new();
        let mut children = Vec::with_capacity(node.children.len());
        for child in &node.children {
            if !self.options.share_nodes {
                children.push(self.build(child, context)?);
                continue;
            }
            let structure = child.to_string();
            let cursor = match siblings.get(&structure) {
                Some(cursor) => cursor.clone(),
                None => {
                    let cursor = self.build(child, context)?;
                    siblings.insert(structure, cursor.clone());
                    cursor
                }
            };
            children.push(cursor);
        }

        let cursor = self.registry.build(BuildInput {
            node,
            signature: node.signature(),
            children,
            index: self.index,
            estimator: context.allocate_estimator(),
            scorer: self.scorer,
        })?;
        self.seed_bounds(node, &cursor, context);
        Ok(cursor)
    }

    /// Copy a window child's synthetic count into the estimator's bounds
    fn seed_bounds(&self, node: &Node, cursor: &CursorRef, context: &mut ScoringContext) {
        let Some(synthetic) = self.synthetic else { return };
        if !context.supports_bounds() {
            return;
        }
        let cursor = cursor.borrow();
        if !cursor.capabilities().contains(Capabilities::ESTIMATOR) {
            return;
        }
        let Some(id) = cursor.estimator_id() else { return };
        let Some(window) = node.child(0).filter(|child| is_window_operator(&child.operator)) else {
            return;
        };

        let signature = window.signature();
        let Some(stats) = synthetic.get(&signature) else {
            warn!("No synthetic count for {}, bounds left unset", signature);
            return;
        };
        let cached = if self.scorer == "bm25" {
            stats.node_document_count
        } else {
            stats.node_frequency
        };
        let bound = cached.max(1);

        if let Some(bounds) = context.bounds_mut() {
            bounds.set(id, bound, bound);
        }
    }
}
