use std::ops::Range;
use serde::{Deserialize, Serialize};
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::stats::CollectionStatistics;

/// Index file header, fixed size at byte 0
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexHeader {
    pub magic: u32,
    pub version: u32,            // Format version
    pub key_count: u64,
    pub postings_len: u64,       // Postings region starts right after the header
    pub keys_offset: u64,        // FST key dictionary: key -> block offset
    pub keys_len: u64,
    pub checksum: u32,           // CRC32 of the postings region
    pub collection_length: u64,
    pub document_count: u64,
}

// [ HEADER ]                       <- byte 0, written last
// [ BLOCK key 1 ][ BLOCK key 2 ]…  <- postings region
// [ FST key dictionary ]
impl IndexHeader {
    pub const MAGIC: u32 = 0x5844_4958;
    pub const VERSION: u32 = 1;
    pub const SIZE: usize = 60; // Fixed header size

    pub fn new() -> Self {
        IndexHeader {
            magic: Self::MAGIC,
            version: Self::VERSION,
            key_count: 0,
            postings_len: 0,
            keys_offset: 0,
            keys_len: 0,
            checksum: 0,
            collection_length: 0,
            document_count: 0,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let bytes = bincode::serialize(self)?;
        if bytes.len() != Self::SIZE {
            return Err(Error::new(
                ErrorKind::Internal,
                format!("Header encoded to {} bytes, expected {}", bytes.len(), Self::SIZE),
            ));
        }
        Ok(bytes)
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(Error::corrupt_index(format!(
                "File of {} bytes is shorter than the header", data.len()
            )));
        }
        let header: IndexHeader = bincode::deserialize(&data[..Self::SIZE])?;
        if header.magic != Self::MAGIC {
            return Err(Error::corrupt_index("Not an index file"));
        }
        // Verify version
        if header.version != Self::VERSION {
            return Err(Error::corrupt_index(format!(
                "Incompatible index version {}", header.version
            )));
        }
        Ok(header)
    }

    pub fn postings_range(&self) -> Result<Range<usize>> {
        let len = usize::try_from(self.postings_len)
            .map_err(|_| Error::corrupt_index("Postings region too large"))?;
        let end = Self::SIZE
            .checked_add(len)
            .ok_or_else(|| Error::corrupt_index("Postings region length overflows"))?;
        Ok(Self::SIZE..end)
    }

    pub fn keys_range(&self) -> Result<Range<usize>> {
        let start = usize::try_from(self.keys_offset)
            .map_err(|_| Error::corrupt_index("Key dictionary offset too large"))?;
        let len = usize::try_from(self.keys_len)
            .map_err(|_| Error::corrupt_index("Key dictionary too large"))?;
        if Some(self.keys_offset) != (Self::SIZE as u64).checked_add(self.postings_len) {
            return Err(Error::corrupt_index("Key dictionary does not follow the postings"));
        }
        let end = start
            .checked_add(len)
            .ok_or_else(|| Error::corrupt_index("Key dictionary length overflows"))?;
        Ok(start..end)
    }

    pub fn collection_statistics(&self) -> CollectionStatistics {
        CollectionStatistics {
            collection_length: self.collection_length,
            document_count: self.document_count,
        }
    }
}

impl Default for IndexHeader {
    fn default() -> Self {
        Self::new()
    }
}
