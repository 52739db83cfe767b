use std::path::Path;
use std::sync::Arc;
use log::{debug, info};
use roaring::RoaringTreemap;
use crate::core::config::{CompletionMode, RetrievalConfig};
use crate::core::error::{Error, Result};
use crate::core::stats::{CollectionStatistics, NodeStatistics};
use crate::core::types::DocId;
use crate::index::disk_reader::DiskIndexReader;
use crate::iterator::{Capabilities, CursorRef};
use crate::query::node::Node;
use crate::retrieval::cache::OccurrenceCache;
use crate::retrieval::compile::{CompileOptions, CursorArena, CursorCompiler};
use crate::retrieval::context::ScoringContext;
use crate::retrieval::registry::OperatorRegistry;
use crate::retrieval::statistics::{full_scan, onepass_scan, sampled_scan};
use crate::retrieval::synthetic::{is_window_operator, SyntheticCounts};

/// One retrieval session over an open index.
///
/// Owns everything that lives as long as the session: the operator registry,
/// the synthetic-count table, the candidate sets and the occurrence cache.
/// Cursors are created per call and never stored here, so a session can be
/// shared by threads evaluating different queries.
pub struct Retrieval {
    index: Arc<DiskIndexReader>,
    config: RetrievalConfig,
    registry: OperatorRegistry,
    collection: CollectionStatistics,
    synthetic: Option<SyntheticCounts>,
    candidates: Option<RoaringTreemap>,       // Consulted by onepass
    sorted_candidates: Option<Vec<DocId>>,    // Visited by sampled
    occurrences: OccurrenceCache,
}

impl Retrieval {
    pub fn open<P: AsRef<Path>>(path: P, config: RetrievalConfig) -> Result<Self> {
        let index = Arc::new(DiskIndexReader::open(path)?);
        Self::new(index, config)
    }

    /// Start a session; a synthetic-count file that fails to load aborts it
    pub fn new(index: Arc<DiskIndexReader>, config: RetrievalConfig) -> Result<Self> {
        let header = index.collection_statistics();
        let collection = CollectionStatistics {
            collection_length: config.collection_length.unwrap_or(header.collection_length),
            document_count: config.document_count.unwrap_or(header.document_count),
        };

        let synthetic = match &config.synthetic_counts {
            Some(path) => Some(SyntheticCounts::load(path, collection)?),
            None => None,
        };
        let registry = OperatorRegistry::with_overrides(&config.operators);

        info!(
            "Retrieval session on {} ({:?} completion, sharing {})",
            index.path().display(), config.completion, config.share_nodes
        );

        Ok(Retrieval {
            index,
            config,
            registry,
            collection,
            synthetic,
            candidates: None,
            sorted_candidates: None,
            occurrences: OccurrenceCache::new(),
        })
    }

    pub fn index(&self) -> &Arc<DiskIndexReader> {
        &self.index
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    pub fn registry(&self) -> &OperatorRegistry {
        &self.registry
    }

    /// For registering custom constructors
    pub fn registry_mut(&mut self) -> &mut OperatorRegistry {
        &mut self.registry
    }

    pub fn collection_statistics(&self) -> CollectionStatistics {
        self.collection
    }

    pub fn synthetic_counts(&self) -> Option<&SyntheticCounts> {
        self.synthetic.as_ref()
    }

    pub fn occurrence_cache(&self) -> &OccurrenceCache {
        &self.occurrences
    }

    /// Candidate set whose counts onepass passes record
    pub fn set_candidates(&mut self, ids: impl IntoIterator<Item = DocId>) {
        self.candidates = Some(ids.into_iter().map(|id| id.0).collect());
    }

    pub fn candidates(&self) -> Option<&RoaringTreemap> {
        self.candidates.as_ref()
    }

    /// Candidate list visited by sampled passes; sorted and deduplicated here
    pub fn set_sorted_candidates(&mut self, mut ids: Vec<DocId>) {
        ids.sort_unstable();
        ids.dedup();
        self.sorted_candidates = Some(ids);
    }

    pub fn sorted_candidates(&self) -> Option<&[DocId]> {
        self.sorted_candidates.as_deref()
    }

    pub fn compiler(&self, options: CompileOptions) -> CursorCompiler<'_> {
        CursorCompiler::new(
            &self.index,
            &self.registry,
            self.synthetic.as_ref(),
            &self.config.scorer,
            options,
        )
    }

    /// Compile `node` with the session's sharing setting
    pub fn create_cursor(
        &self,
        node: &Node,
        context: &mut ScoringContext,
        arena: &mut CursorArena,
    ) -> Result<CursorRef> {
        let options = CompileOptions { share_nodes: self.config.share_nodes };
        self.compiler(options).compile(node, context, arena)
    }

    pub fn node_statistics(&self, node: &Node) -> Result<NodeStatistics> {
        self.node_statistics_with(node, self.config.completion)
    }

    /// Statistics for `node`, from the cheapest source available: the
    /// cursor's own aggregate, the synthetic table, or a scan in `mode`.
    /// Compiles with sharing off so the scan sees a fresh cursor.
    pub fn node_statistics_with(&self, node: &Node, mode: CompletionMode) -> Result<NodeStatistics> {
        let signature = node.signature();
        let mut stats = NodeStatistics::new(signature.clone(), self.collection);

        let compiler = self.compiler(CompileOptions { share_nodes: false });
        let cursor = compiler.compile(node, &mut ScoringContext::new(), &mut CursorArena::new())?;
        let mut cursor = cursor.borrow_mut();

        if cursor.capabilities().contains(Capabilities::AGGREGATE) {
            if let Some(aggregate) = cursor.statistics(self.collection) {
                return Ok(NodeStatistics { node: signature, ..aggregate });
            }
        }

        if let Some(synthetic) = &self.synthetic {
            if is_window_operator(&node.operator) {
                if let Some(cached) = synthetic.get(&signature) {
                    debug!("Synthetic statistics for {}", signature);
                    return Ok(NodeStatistics { node: signature, ..cached.clone() });
                }
            }
        }

        if !cursor.capabilities().contains(Capabilities::COUNT) {
            return Err(Error::unsupported_node(format!(
                "Statistics need a counting cursor, {} offers {:?}",
                signature, cursor.capabilities()
            )));
        }

        debug!("Computing {:?} statistics for {}", mode, signature);
        match mode {
            CompletionMode::Default => full_scan(&mut *cursor, &mut stats)?,
            CompletionMode::Onepass => {
                let candidates = self.candidates.as_ref().ok_or_else(|| {
                    Error::invalid_argument("Onepass statistics need a candidate set")
                })?;
                let occurrences = onepass_scan(&mut *cursor, &mut stats, candidates)?;
                self.occurrences.publish(cursor.key(), occurrences);
            }
            CompletionMode::Sampled => {
                let sample = self.sorted_candidates.as_deref().ok_or_else(|| {
                    Error::invalid_argument("Sampled statistics need a sorted candidate list")
                })?;
                let occurrences = sampled_scan(&mut *cursor, &mut stats, sample)?;
                self.occurrences.publish(cursor.key(), occurrences);
            }
        }
        Ok(stats)
    }

    /// Copy of a `#feature` node annotated with its child's statistics
    pub fn annotate_feature(&self, node: &Node) -> Result<Node> {
        if self.registry.implementation_for(node) != Some("feature") {
            return Err(Error::invalid_argument(format!("{} is not a feature node", node)));
        }
        let child = node.child(0).ok_or_else(|| {
            Error::unsupported_node(format!("{} has no child to annotate from", node))
        })?;
        let stats = self.node_statistics(child)?;

        let mut annotated = node.clone();
        annotated.set_param("nodeFrequency", stats.node_frequency);
        annotated.set_param("nodeDocumentCount", stats.node_document_count);
        annotated.set_param("maximumCount", stats.maximum_count);
        annotated.set_param("collectionLength", stats.collection_length);
        annotated.set_param("documentCount", stats.document_count);
        annotated.set_param("collectionProbability", stats.collection_probability());
        Ok(annotated)
    }
}
