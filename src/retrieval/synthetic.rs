use std::collections::HashMap;
use std::fs;
use std::path::Path;
use log::info;
use crate::core::error::{Error, Result};
use crate::core::stats::{CollectionStatistics, NodeStatistics};

/// Operators whose statistics may come from a synthetic-count table
pub const WINDOW_OPERATORS: [&str; 4] = ["od", "uw", "ordered", "unordered"];

pub fn is_window_operator(operator: &str) -> bool {
    WINDOW_OPERATORS.contains(&operator)
}

/// Precomputed statistics keyed by node signature, loaded once per session.
///
/// File format, one entry per line:
/// `key \t nodeFrequency \t maximumCount \t nodeDocumentCount`
#[derive(Debug, Clone, Default)]
pub struct SyntheticCounts {
    entries: HashMap<String, NodeStatistics>,
}

impl SyntheticCounts {
    pub fn load<P: AsRef<Path>>(path: P, collection: CollectionStatistics) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            Error::config_load(format!("Cannot read synthetic counts {}: {}", path.display(), e))
        })?;
        let counts = Self::parse(&text, collection)
            .map_err(|e| Error::config_load(format!("{}: {}", path.display(), e.context)))?;
        info!("Loaded {} synthetic counts from {}", counts.len(), path.display());
        Ok(counts)
    }

    pub fn parse(text: &str, collection: CollectionStatistics) -> Result<Self> {
        let mut entries = HashMap::new();
        for (number, line) in text.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }

            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() != 4 {
                return Err(Error::config_load(format!(
                    "line {}: expected 4 tab-separated fields, found {}", number + 1, fields.len()
                )));
            }
            let field = |i: usize| -> Result<u64> {
                fields[i].trim().parse::<u64>().map_err(|_| {
                    Error::config_load(format!(
                        "line {}: {:?} is not a count", number + 1, fields[i]
                    ))
                })
            };

            let key = fields[0].to_string();
            let stats = NodeStatistics {
                node_frequency: field(1)?,
                maximum_count: field(2)?,
                node_document_count: field(3)?,
                ..NodeStatistics::new(key.clone(), collection)
            };
            if !stats.is_consistent() {
                return Err(Error::config_load(format!(
                    "line {}: counts for {} are inconsistent (frequency {}, maximum {}, documents {})",
                    number + 1, key, stats.node_frequency, stats.maximum_count, stats.node_document_count
                )));
            }
            entries.insert(key, stats);
        }
        Ok(SyntheticCounts { entries })
    }

    pub fn get(&self, signature: &str) -> Option<&NodeStatistics> {
        self.entries.get(signature)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;
    use std::io::Write;

    #[test]
    fn parses_entries_and_skips_blank_lines() {
        let collection = CollectionStatistics { collection_length: 500, document_count: 20 };
        let counts = SyntheticCounts::parse("windowA\t45\t10\t13\n\nwindowB\t1\t1\t1\r\n", collection).unwrap();
        assert_eq!(counts.len(), 2);

        let a = counts.get("windowA").unwrap();
        assert_eq!(a.node_frequency, 45);
        assert_eq!(a.maximum_count, 10);
        assert_eq!(a.node_document_count, 13);
        assert_eq!(a.collection_length, 500);
        assert!(counts.get("windowC").is_none());
    }

    #[test]
    fn malformed_lines_are_load_errors() {
        let collection = CollectionStatistics::default();
        for text in ["windowA\t45\t10", "windowA\t45\tten\t13", "windowA\t-1\t1\t1"] {
            let err = SyntheticCounts::parse(text, collection).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ConfigLoad);
            assert!(err.context.contains("line 1"));
        }
    }

    #[test]
    fn counts_breaking_statistics_invariants_are_rejected() {
        let collection = CollectionStatistics::default();
        // maximum above frequency, documents above frequency, maximum without documents
        for text in ["w\t3\t10\t5", "w\t2\t1\t5", "w\t4\t2\t0"] {
            let err = SyntheticCounts::parse(text, collection).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ConfigLoad);
            assert!(err.context.contains("line 1"));
        }
    }

    #[test]
    fn missing_file_is_load_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = SyntheticCounts::load(dir.path().join("absent.tsv"), CollectionStatistics::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigLoad);

        let path = dir.path().join("counts.tsv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "#od:1( #extents:a() #extents:b() )\t3\t2\t2").unwrap();
        let counts = SyntheticCounts::load(&path, CollectionStatistics::default()).unwrap();
        assert_eq!(counts.get("#od:1( #extents:a() #extents:b() )").unwrap().node_frequency, 3);
    }

    #[test]
    fn recognizes_window_operators() {
        assert!(is_window_operator("od"));
        assert!(is_window_operator("unordered"));
        assert!(!is_window_operator("syn"));
    }
}
