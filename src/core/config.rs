use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use serde::{Serialize, Deserialize};
use crate::core::error::{Error, Result};

/// Strategy used when statistics must be computed by scanning
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionMode {
    #[default]
    Default,   // Full sequential scan
    Onepass,   // Full scan, caching counts of session candidates
    Sampled,   // move_to over the sorted candidate list only
}

/// Per-session retrieval options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetrievalConfig {
    pub operators: HashMap<String, String>,   // operator name -> implementation id
    pub synthetic_counts: Option<PathBuf>,
    pub completion: CompletionMode,
    pub share_nodes: bool,
    pub scorer: String,
    pub collection_length: Option<u64>,       // Overrides the index header
    pub document_count: Option<u64>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        RetrievalConfig {
            operators: HashMap::new(),
            synthetic_counts: None,
            completion: CompletionMode::Default,
            share_nodes: false,
            scorer: "dirichlet".to_string(),
            collection_length: None,
            document_count: None,
        }
    }
}

impl RetrievalConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            Error::config_load(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&text)
    }
}

#[derive(Debug, Clone)]
pub struct WriterConfig {
    pub skip_interval: usize,   // Documents between skip entries
}

impl Default for WriterConfig {
    fn default() -> Self {
        WriterConfig {
            skip_interval: 128,
        }
    }
}
