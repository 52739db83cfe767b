use std::fs::File;
use std::ops::Range;
use std::path::Path;
use std::sync::Arc;
use memmap2::{Mmap, MmapOptions};
use crate::core::error::{Error, Result};

/// Memory-mapped file for zero-copy reads.
/// Immutable once mapped, so one map can back any number of cursors.
pub struct MmapFile {
    pub mmap: Mmap,
    pub len: usize,
}

impl MmapFile {
    pub fn open_read_only<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(&path)?;
        let metadata = file.metadata()?;
        let len = metadata.len() as usize;

        let mmap = unsafe { MmapOptions::new().len(len).map(&file)? };

        Ok(MmapFile { mmap, len })
    }

    pub fn data(&self) -> &[u8] {
        &self.mmap[..]
    }
}

/// Cheaply clonable window into a shared map
#[derive(Clone)]
pub struct MmapSlice {
    file: Arc<MmapFile>,
    range: Range<usize>,
}

impl MmapSlice {
    pub fn new(file: Arc<MmapFile>, range: Range<usize>) -> Result<Self> {
        if range.start > range.end || range.end > file.len {
            return Err(Error::corrupt_index(format!(
                "Range {:?} outside file of {} bytes", range, file.len
            )));
        }
        Ok(MmapSlice { file, range })
    }

    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

impl AsRef<[u8]> for MmapSlice {
    fn as_ref(&self) -> &[u8] {
        &self.file.data()[self.range.clone()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn slices_share_one_map() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"header|payload").unwrap();
        tmp.flush().unwrap();

        let file = Arc::new(MmapFile::open_read_only(tmp.path()).unwrap());
        let head = MmapSlice::new(Arc::clone(&file), 0..6).unwrap();
        let tail = MmapSlice::new(Arc::clone(&file), 7..14).unwrap();
        assert_eq!(head.as_ref(), b"header");
        assert_eq!(tail.as_ref(), b"payload");
        assert_eq!(Arc::strong_count(&file), 3);

        assert!(MmapSlice::new(file, 10..20).is_err());
    }
}
