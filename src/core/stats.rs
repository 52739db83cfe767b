use serde::{Serialize, Deserialize};

/// Collection-wide figures seeded into every statistics record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionStatistics {
    pub collection_length: u64,
    pub document_count: u64,
}

/// Aggregate statistics for a query (sub)tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStatistics {
    pub node: String,
    pub node_frequency: u64,       // Sum of counts over matching documents
    pub node_document_count: u64,  // Documents with at least one match
    pub maximum_count: u64,        // Largest single-document count
    pub collection_length: u64,
    pub document_count: u64,
}

impl NodeStatistics {
    pub fn new(node: impl Into<String>, collection: CollectionStatistics) -> Self {
        NodeStatistics {
            node: node.into(),
            node_frequency: 0,
            node_document_count: 0,
            maximum_count: 0,
            collection_length: collection.collection_length,
            document_count: collection.document_count,
        }
    }

    /// Fold one matching document's count into the aggregate
    pub fn add_match(&mut self, count: u32) {
        let count = count as u64;
        self.maximum_count = self.maximum_count.max(count);
        self.node_frequency += count;
        self.node_document_count += 1;
    }

    pub fn is_consistent(&self) -> bool {
        self.node_frequency >= self.node_document_count
            && self.maximum_count <= self.node_frequency
            && (self.maximum_count == 0) == (self.node_document_count == 0)
    }

    /// Fraction of the collection covered by this node's occurrences
    pub fn collection_probability(&self) -> f64 {
        if self.collection_length == 0 {
            0.0
        } else {
            self.node_frequency as f64 / self.collection_length as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_match_keeps_invariants() {
        let mut stats = NodeStatistics::new("#counts:a()", CollectionStatistics::default());
        assert!(stats.is_consistent());

        stats.add_match(3);
        stats.add_match(1);
        stats.add_match(7);

        assert_eq!(stats.node_frequency, 11);
        assert_eq!(stats.node_document_count, 3);
        assert_eq!(stats.maximum_count, 7);
        assert!(stats.is_consistent());
    }

    #[test]
    fn collection_probability_handles_empty_collection() {
        let mut stats = NodeStatistics::new("x", CollectionStatistics::default());
        stats.add_match(4);
        assert_eq!(stats.collection_probability(), 0.0);

        stats.collection_length = 1000;
        assert!((stats.collection_probability() - 0.004).abs() < 1e-12);
    }
}
