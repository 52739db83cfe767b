use std::fs::File;
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use crc32fast::Hasher;
use fst::MapBuilder;
use log::{debug, info};
use crate::core::config::WriterConfig;
use crate::core::error::{Error, Result};
use crate::core::stats::CollectionStatistics;
use crate::core::types::{DocId, Extent};
use crate::index::header::IndexHeader;
use crate::index::posting::PostingsBlockBuilder;

const FLUSH_THRESHOLD: usize = 1024 * 1024; // 1MB buffer

/// What a finished writer produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSummary {
    pub key_count: u64,
    pub postings_bytes: u64,
    pub file_bytes: u64,
}

/// Single-writer, append-only builder of a disk index.
///
/// Protocol: `begin_key`, then per document `begin_document` followed by
/// `add_occurrence`/`add_extent` calls, and finally `finish`. Keys and
/// documents must strictly increase; violations are rejected immediately.
pub struct DiskIndexWriter {
    path: PathBuf,
    file: File,
    buffer: Vec<u8>,
    hasher: Hasher,
    config: WriterConfig,
    postings_len: u64,
    keys: MapBuilder<Vec<u8>>,
    key_count: u64,
    last_key: Option<Vec<u8>>,
    block: Option<PostingsBlockBuilder>,
    document: Option<(DocId, Vec<Extent>)>,  // Buffered until the next document
    last_doc: Option<DocId>,
    collection: CollectionStatistics,
}

impl DiskIndexWriter {
    pub fn create<P: AsRef<Path>>(path: P, config: WriterConfig) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = File::create(&path)?;
        // Reserve the header; it is rewritten by finish()
        file.write_all(&[0u8; IndexHeader::SIZE])?;

        Ok(DiskIndexWriter {
            path,
            file,
            buffer: Vec::with_capacity(FLUSH_THRESHOLD),
            hasher: Hasher::new(),
            config,
            postings_len: 0,
            keys: MapBuilder::memory(),
            key_count: 0,
            last_key: None,
            block: None,
            document: None,
            last_doc: None,
            collection: CollectionStatistics::default(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn set_collection_statistics(&mut self, collection: CollectionStatistics) {
        self.collection = collection;
    }

    pub fn begin_key(&mut self, key: &[u8]) -> Result<()> {
        if let Some(last) = &self.last_key {
            if key <= last.as_slice() {
                return Err(Error::invalid_argument(format!(
                    "Key {:?} is not after {:?}",
                    String::from_utf8_lossy(key),
                    String::from_utf8_lossy(last)
                )));
            }
        }
        self.finish_key()?;

        self.keys.insert(key, self.postings_len)?;
        self.key_count += 1;
        self.last_key = Some(key.to_vec());
        self.block = Some(PostingsBlockBuilder::new(self.config.skip_interval));
        self.last_doc = None;
        Ok(())
    }

    pub fn begin_document(&mut self, doc_id: DocId) -> Result<()> {
        if self.block.is_none() {
            return Err(Error::invalid_argument("begin_document called before begin_key"));
        }
        if let Some(last) = self.last_doc {
            if doc_id <= last {
                return Err(Error::invalid_argument(format!(
                    "Document {} is not after {}", doc_id, last
                )));
            }
        }
        self.flush_document()?;
        self.document = Some((doc_id, Vec::new()));
        self.last_doc = Some(doc_id);
        Ok(())
    }

    /// Record a single-token occurrence at `position`
    pub fn add_occurrence(&mut self, position: u32) -> Result<()> {
        self.add_extent(position, position.saturating_add(1))
    }

    pub fn add_extent(&mut self, begin: u32, end: u32) -> Result<()> {
        let (doc_id, extents) = self
            .document
            .as_mut()
            .ok_or_else(|| Error::invalid_argument("Occurrence added before begin_document"))?;
        let out_of_order = extents.last().is_some_and(|last| last.begin > begin);
        if end < begin || out_of_order {
            return Err(Error::invalid_argument(format!(
                "Extent ({}, {}) out of order in document {}", begin, end, doc_id
            )));
        }
        extents.push(Extent::new(begin, end));
        Ok(())
    }

    fn flush_document(&mut self) -> Result<()> {
        if let Some((doc_id, extents)) = self.document.take() {
            if extents.is_empty() {
                debug!("Dropping document {} with no occurrences", doc_id);
                return Ok(());
            }
            if let Some(block) = self.block.as_mut() {
                block.add_posting(doc_id, &extents)?;
            }
        }
        Ok(())
    }

    fn finish_key(&mut self) -> Result<()> {
        self.flush_document()?;
        if let Some(block) = self.block.take() {
            let bytes = block.finish();
            self.hasher.update(&bytes);
            self.buffer.extend_from_slice(&bytes);
            self.postings_len += bytes.len() as u64;

            // Flush if buffer is large
            if self.buffer.len() > FLUSH_THRESHOLD {
                self.flush()?;
            }
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if !self.buffer.is_empty() {
            self.file.write_all(&self.buffer)?;
            self.buffer.clear();
        }
        Ok(())
    }

    /// Close the last key, append the key dictionary and write the header.
    /// The file is immutable afterwards.
    pub fn finish(mut self) -> Result<IndexSummary> {
        self.finish_key()?;
        self.flush()?;

        let keys = self.keys.into_inner()?;
        self.file.write_all(&keys)?;

        let header = IndexHeader {
            key_count: self.key_count,
            postings_len: self.postings_len,
            keys_offset: IndexHeader::SIZE as u64 + self.postings_len,
            keys_len: keys.len() as u64,
            checksum: self.hasher.finalize(),
            collection_length: self.collection.collection_length,
            document_count: self.collection.document_count,
            ..IndexHeader::new()
        };
        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(&header.encode()?)?;
        self.file.sync_all()?;

        let file_bytes = self.file.metadata()?.len();
        info!(
            "Wrote index {} with {} keys ({} bytes)",
            self.path.display(), self.key_count, file_bytes
        );

        Ok(IndexSummary {
            key_count: self.key_count,
            postings_bytes: self.postings_len,
            file_bytes,
        })
    }
}
