use std::path::{Path, PathBuf};
use std::sync::Arc;
use crc32fast::Hasher;
use fst::{IntoStreamer, Map, Streamer};
use log::debug;
use crate::core::error::{Error, Result};
use crate::core::stats::CollectionStatistics;
use crate::index::header::IndexHeader;
use crate::index::sources::{CountSource, ExtentSource};
use crate::mmap::mmap_file::{MmapFile, MmapSlice};

/// Read-only view of a finished index file.
///
/// The file is mapped once; every cursor handed out holds its own `Arc` to
/// the map, so one reader can serve any number of concurrent queries.
pub struct DiskIndexReader {
    path: PathBuf,
    file: Arc<MmapFile>,
    header: IndexHeader,
    keys: Map<MmapSlice>,
}

impl DiskIndexReader {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, true)
    }

    /// Open, optionally skipping the postings checksum
    pub fn open_with<P: AsRef<Path>>(path: P, verify: bool) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = Arc::new(MmapFile::open_read_only(&path)?);
        let header = IndexHeader::decode(file.data())?;

        let postings = header.postings_range()?;
        let keys_range = header.keys_range()?;
        if keys_range.end != file.len {
            return Err(Error::corrupt_index(format!(
                "Index {} is {} bytes, header expects {}",
                path.display(), file.len, keys_range.end
            )));
        }

        if verify {
            let mut hasher = Hasher::new();
            hasher.update(&file.data()[postings]);
            if hasher.finalize() != header.checksum {
                return Err(Error::corrupt_index(format!(
                    "Checksum mismatch in {}", path.display()
                )));
            }
        }

        let keys = Map::new(MmapSlice::new(file.clone(), keys_range)?)?;
        if keys.len() as u64 != header.key_count {
            return Err(Error::corrupt_index(format!(
                "Key dictionary holds {} keys, header says {}", keys.len(), header.key_count
            )));
        }

        debug!("Opened index {} ({} keys)", path.display(), header.key_count);
        Ok(DiskIndexReader { path, file, header, keys })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &IndexHeader {
        &self.header
    }

    pub fn key_count(&self) -> u64 {
        self.header.key_count
    }

    pub fn collection_statistics(&self) -> CollectionStatistics {
        self.header.collection_statistics()
    }

    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.keys.contains_key(key)
    }

    /// Count-only cursor for `key`, or None if the key is absent
    pub fn count_source(&self, key: &[u8]) -> Result<Option<CountSource>> {
        match self.keys.get(key) {
            Some(offset) => Ok(Some(CountSource::open(
                String::from_utf8_lossy(key),
                self.block(key, offset)?,
            )?)),
            None => Ok(None),
        }
    }

    /// Extent-bearing cursor for `key`, or None if the key is absent
    pub fn extent_source(&self, key: &[u8]) -> Result<Option<ExtentSource>> {
        match self.keys.get(key) {
            Some(offset) => Ok(Some(ExtentSource::open(
                String::from_utf8_lossy(key),
                self.block(key, offset)?,
            )?)),
            None => Ok(None),
        }
    }

    pub fn key_iterator(self: &Arc<Self>) -> KeyIterator {
        let current = self.next_entry(None);
        KeyIterator { reader: Arc::clone(self), current }
    }

    /// First key strictly after `after`, or the first key overall
    fn next_entry(&self, after: Option<&[u8]>) -> Option<(Vec<u8>, u64)> {
        let builder = self.keys.range();
        let mut stream = match after {
            Some(key) => builder.gt(key).into_stream(),
            None => builder.into_stream(),
        };
        let entry = stream.next().map(|(key, offset)| (key.to_vec(), offset));
        entry
    }

    /// A key's block runs from its offset to the next key's offset
    fn block(&self, key: &[u8], offset: u64) -> Result<MmapSlice> {
        let end = match self.next_entry(Some(key)) {
            Some((_, next)) => next,
            None => self.header.postings_len,
        };
        if offset > end || end > self.header.postings_len {
            return Err(Error::corrupt_index(format!(
                "Block of {:?} spans {}..{} outside the postings region",
                String::from_utf8_lossy(key), offset, end
            )));
        }
        let base = IndexHeader::SIZE as u64;
        let start = usize::try_from(base + offset)
            .map_err(|_| Error::corrupt_index("Block offset too large"))?;
        let end = usize::try_from(base + end)
            .map_err(|_| Error::corrupt_index("Block offset too large"))?;
        MmapSlice::new(self.file.clone(), start..end)
    }
}

/// Ascending walk over every key of an index
pub struct KeyIterator {
    reader: Arc<DiskIndexReader>,
    current: Option<(Vec<u8>, u64)>,
}

impl KeyIterator {
    pub fn is_done(&self) -> bool {
        self.current.is_none()
    }

    pub fn key(&self) -> Option<&[u8]> {
        self.current.as_ref().map(|(key, _)| key.as_slice())
    }

    pub fn key_string(&self) -> Option<String> {
        self.key().map(|key| String::from_utf8_lossy(key).into_owned())
    }

    /// Move to the next key; returns false once the iterator is done
    pub fn next_key(&mut self) -> bool {
        if let Some((key, _)) = self.current.take() {
            self.current = self.reader.next_entry(Some(&key));
        }
        self.current.is_some()
    }

    pub fn count_source(&self) -> Result<CountSource> {
        let (key, offset) = self.entry()?;
        CountSource::open(String::from_utf8_lossy(key), self.reader.block(key, *offset)?)
    }

    /// Extent-bearing cursor over the current key
    pub fn value_source(&self) -> Result<ExtentSource> {
        let (key, offset) = self.entry()?;
        ExtentSource::open(String::from_utf8_lossy(key), self.reader.block(key, *offset)?)
    }

    fn entry(&self) -> Result<(&[u8], &u64)> {
        self.current
            .as_ref()
            .map(|(key, offset)| (key.as_slice(), offset))
            .ok_or_else(|| Error::invalid_cursor_state("Key iterator is exhausted"))
    }
}
