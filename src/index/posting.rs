use std::ops::Range;
use crate::compression::delta::{DeltaDecoder, DeltaEncoder};
use crate::compression::vbyte::VByteEncoder;
use crate::core::error::{Error, Result};
use crate::core::types::{DocId, Extent, Posting};

/// Aggregate figures stored at the head of every postings block
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockSummary {
    pub doc_count: u64,
    pub total_count: u64,
    pub max_count: u64,
}

/// Entry point into a group of `skip_interval` documents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkipEntry {
    pub last_doc: DocId,       // Last document before the group
    pub docs_offset: usize,    // Where the group starts in each stream
    pub counts_offset: usize,
    pub extents_offset: usize,
}

// Block layout, all integers vbyte:
// [ doc_count | total_count | max_count | skip_interval | skip_count ]
// [ skips_len | docs_len | counts_len | extents_len ]
// [ SKIPS ][ DOC GAPS ][ COUNTS ][ EXTENTS: (begin gap, width) x count ]
//
// Doc ids, counts and extents live in separate streams so a count-only
// reader never touches extent bytes.

/// Accumulates one key's postings into an encoded block
pub struct PostingsBlockBuilder {
    skip_interval: usize,
    summary: BlockSummary,
    doc_encoder: DeltaEncoder,
    docs: Vec<u8>,
    counts: Vec<u8>,
    extents: Vec<u8>,
    skips: Vec<u8>,
    skip_count: u64,
    last_skip: SkipEntry,
}

impl PostingsBlockBuilder {
    pub fn new(skip_interval: usize) -> Self {
        PostingsBlockBuilder {
            skip_interval: skip_interval.max(1),
            summary: BlockSummary::default(),
            doc_encoder: DeltaEncoder::new(),
            docs: Vec::new(),
            counts: Vec::new(),
            extents: Vec::new(),
            skips: Vec::new(),
            skip_count: 0,
            last_skip: SkipEntry {
                last_doc: DocId(0),
                docs_offset: 0,
                counts_offset: 0,
                extents_offset: 0,
            },
        }
    }

    pub fn summary(&self) -> BlockSummary {
        self.summary
    }

    pub fn is_empty(&self) -> bool {
        self.summary.doc_count == 0
    }

    pub fn last_doc(&self) -> Option<DocId> {
        self.doc_encoder.last().map(DocId)
    }

    /// Append one document. Documents must arrive in strictly increasing order
    /// and carry at least one extent.
    pub fn add_posting(&mut self, doc_id: DocId, extents: &[Extent]) -> Result<()> {
        if extents.is_empty() {
            return Err(Error::invalid_argument(format!(
                "Posting for document {} has no occurrences", doc_id
            )));
        }
        if let Some(last) = self.last_doc() {
            if doc_id <= last {
                return Err(Error::invalid_argument(format!(
                    "Document {} is not after {}", doc_id, last
                )));
            }
        }
        let mut prev_begin = 0u32;
        for extent in extents {
            if extent.end < extent.begin || extent.begin < prev_begin {
                return Err(Error::invalid_argument(format!(
                    "Extents of document {} are not ordered", doc_id
                )));
            }
            prev_begin = extent.begin;
        }

        if let Some(last) = self.last_doc() {
            if self.summary.doc_count % self.skip_interval as u64 == 0 {
                self.push_skip(last);
            }
        }

        self.doc_encoder.push(&mut self.docs, doc_id.0)?;
        VByteEncoder::encode_u32(&mut self.counts, extents.len() as u32);
        let mut prev_begin = 0u32;
        for extent in extents {
            VByteEncoder::encode_u32(&mut self.extents, extent.begin - prev_begin);
            VByteEncoder::encode_u32(&mut self.extents, extent.width());
            prev_begin = extent.begin;
        }

        let count = extents.len() as u64;
        self.summary.doc_count += 1;
        self.summary.total_count += count;
        self.summary.max_count = self.summary.max_count.max(count);
        Ok(())
    }

    fn push_skip(&mut self, last_doc: DocId) {
        let entry = SkipEntry {
            last_doc,
            docs_offset: self.docs.len(),
            counts_offset: self.counts.len(),
            extents_offset: self.extents.len(),
        };
        let prev = self.last_skip;
        VByteEncoder::encode_u64(&mut self.skips, entry.last_doc.0 - prev.last_doc.0);
        VByteEncoder::encode_u64(&mut self.skips, (entry.docs_offset - prev.docs_offset) as u64);
        VByteEncoder::encode_u64(&mut self.skips, (entry.counts_offset - prev.counts_offset) as u64);
        VByteEncoder::encode_u64(&mut self.skips, (entry.extents_offset - prev.extents_offset) as u64);
        self.last_skip = entry;
        self.skip_count += 1;
    }

    pub fn finish(self) -> Vec<u8> {
        let mut output = Vec::with_capacity(
            32 + self.skips.len() + self.docs.len() + self.counts.len() + self.extents.len(),
        );
        VByteEncoder::encode_u64(&mut output, self.summary.doc_count);
        VByteEncoder::encode_u64(&mut output, self.summary.total_count);
        VByteEncoder::encode_u64(&mut output, self.summary.max_count);
        VByteEncoder::encode_u64(&mut output, self.skip_interval as u64);
        VByteEncoder::encode_u64(&mut output, self.skip_count);
        VByteEncoder::encode_u64(&mut output, self.skips.len() as u64);
        VByteEncoder::encode_u64(&mut output, self.docs.len() as u64);
        VByteEncoder::encode_u64(&mut output, self.counts.len() as u64);
        VByteEncoder::encode_u64(&mut output, self.extents.len() as u64);
        output.extend_from_slice(&self.skips);
        output.extend_from_slice(&self.docs);
        output.extend_from_slice(&self.counts);
        output.extend_from_slice(&self.extents);
        output
    }
}

/// Encode a complete postings list into one block
pub fn encode_postings(postings: &[Posting], skip_interval: usize) -> Result<Vec<u8>> {
    let mut builder = PostingsBlockBuilder::new(skip_interval);
    for posting in postings {
        if posting.count as usize != posting.extents.len() {
            return Err(Error::invalid_argument(format!(
                "Document {} declares count {} but has {} extents",
                posting.doc_id, posting.count, posting.extents.len()
            )));
        }
        builder.add_posting(posting.doc_id, &posting.extents)?;
    }
    Ok(builder.finish())
}

/// Decoded block header with absolute stream ranges
#[derive(Debug, Clone)]
pub struct BlockLayout {
    pub summary: BlockSummary,
    pub skip_interval: u64,
    pub skips: Vec<SkipEntry>,
    pub docs: Range<usize>,
    pub counts: Range<usize>,
    pub extents: Range<usize>,
}

fn read_len(data: &[u8], pos: &mut usize) -> Result<usize> {
    let value = VByteEncoder::read_u64(data, pos)?;
    usize::try_from(value).map_err(|_| Error::corrupt_index("Stream length exceeds address space"))
}

fn stream_after(start: usize, len: usize) -> Result<Range<usize>> {
    let end = start
        .checked_add(len)
        .ok_or_else(|| Error::corrupt_index("Stream length overflows"))?;
    Ok(start..end)
}

impl BlockLayout {
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut pos = 0;
        let summary = BlockSummary {
            doc_count: VByteEncoder::read_u64(data, &mut pos)?,
            total_count: VByteEncoder::read_u64(data, &mut pos)?,
            max_count: VByteEncoder::read_u64(data, &mut pos)?,
        };
        let skip_interval = VByteEncoder::read_u64(data, &mut pos)?;
        let skip_count = VByteEncoder::read_u64(data, &mut pos)?;

        if summary.total_count < summary.doc_count
            || summary.max_count > summary.total_count
            || (summary.doc_count == 0) != (summary.total_count == 0)
            || skip_interval == 0
        {
            return Err(Error::corrupt_index("Inconsistent block summary"));
        }
        let expected_skips = summary.doc_count.saturating_sub(1) / skip_interval;
        if skip_count != expected_skips {
            return Err(Error::corrupt_index(format!(
                "Expected {} skip entries, found {}", expected_skips, skip_count
            )));
        }

        let skips_len = read_len(data, &mut pos)?;
        let docs_len = read_len(data, &mut pos)?;
        let counts_len = read_len(data, &mut pos)?;
        let extents_len = read_len(data, &mut pos)?;

        let skips_range = stream_after(pos, skips_len)?;
        let docs = stream_after(skips_range.end, docs_len)?;
        let counts = stream_after(docs.end, counts_len)?;
        let extents = stream_after(counts.end, extents_len)?;
        if extents.end != data.len() {
            return Err(Error::corrupt_index(format!(
                "Block is {} bytes but its streams cover {}", data.len(), extents.end
            )));
        }

        let skip_data = &data[..skips_range.end];
        let mut skip_pos = skips_range.start;
        let mut prev = SkipEntry {
            last_doc: DocId(0),
            docs_offset: 0,
            counts_offset: 0,
            extents_offset: 0,
        };
        let mut skips = Vec::with_capacity(skip_count as usize);
        for _ in 0..skip_count {
            let doc_gap = VByteEncoder::read_u64(skip_data, &mut skip_pos)?;
            let entry = SkipEntry {
                last_doc: DocId(prev.last_doc.0.checked_add(doc_gap)
                    .ok_or_else(|| Error::corrupt_index("Skip document id overflows"))?),
                docs_offset: prev.docs_offset + read_len(skip_data, &mut skip_pos)?,
                counts_offset: prev.counts_offset + read_len(skip_data, &mut skip_pos)?,
                extents_offset: prev.extents_offset + read_len(skip_data, &mut skip_pos)?,
            };
            if entry.docs_offset > docs_len
                || entry.counts_offset > counts_len
                || entry.extents_offset > extents_len
                || (!skips.is_empty() && entry.last_doc <= prev.last_doc)
            {
                return Err(Error::corrupt_index("Skip entry points outside its block"));
            }
            prev = entry;
            skips.push(entry);
        }

        // Stored offsets are stream-relative
        for entry in &mut skips {
            entry.docs_offset += docs.start;
            entry.counts_offset += counts.start;
            entry.extents_offset += extents.start;
        }

        Ok(BlockLayout {
            summary,
            skip_interval,
            skips,
            docs,
            counts,
            extents,
        })
    }
}

/// Forward-only decoder positioned on one posting of a block.
/// With `with_extents == false` the extent stream is never read.
pub struct PostingsCursor<D> {
    data: D,
    layout: BlockLayout,
    with_extents: bool,
    docs_pos: usize,
    counts_pos: usize,
    extents_pos: usize,
    decoder: DeltaDecoder,
    read: u64,                // Postings decoded so far, current included
    current: Option<DocId>,
    count: u32,
    extents: Vec<Extent>,
}

impl<D: AsRef<[u8]>> PostingsCursor<D> {
    /// Parse the block header and position on the first posting
    pub fn open(data: D, with_extents: bool) -> Result<Self> {
        let layout = BlockLayout::parse(data.as_ref())?;
        let mut cursor = PostingsCursor {
            docs_pos: layout.docs.start,
            counts_pos: layout.counts.start,
            extents_pos: layout.extents.start,
            data,
            layout,
            with_extents,
            decoder: DeltaDecoder::new(),
            read: 0,
            current: None,
            count: 0,
            extents: Vec::new(),
        };
        cursor.advance()?;
        Ok(cursor)
    }

    pub fn summary(&self) -> BlockSummary {
        self.layout.summary
    }

    pub fn current(&self) -> Option<DocId> {
        self.current
    }

    pub fn is_done(&self) -> bool {
        self.current.is_none()
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Extents of the current posting; empty for count-only cursors
    pub fn extents(&self) -> &[Extent] {
        &self.extents
    }

    /// Drop to the done state without decoding further
    pub fn exhaust(&mut self) {
        self.current = None;
        self.count = 0;
        self.extents.clear();
    }

    /// Decode the next posting, or become done after the last one
    pub fn advance(&mut self) -> Result<()> {
        if self.read == self.layout.summary.doc_count {
            self.check_exhausted()?;
            self.current = None;
            self.count = 0;
            self.extents.clear();
            return Ok(());
        }

        let data = self.data.as_ref();
        let doc = self.decoder.read(&data[..self.layout.docs.end], &mut self.docs_pos)?;
        let count = VByteEncoder::read_u32(&data[..self.layout.counts.end], &mut self.counts_pos)?;
        if count == 0 {
            return Err(Error::corrupt_index(format!("Zero count stored for document {}", doc)));
        }

        if self.with_extents {
            let stream = &data[..self.layout.extents.end];
            self.extents.clear();
            let mut begin = 0u32;
            for _ in 0..count {
                if self.extents_pos >= stream.len() {
                    return Err(Error::corrupt_index(format!(
                        "Document {} declares {} extents but the extent stream ended", doc, count
                    )));
                }
                let gap = VByteEncoder::read_u32(stream, &mut self.extents_pos)?;
                let width = VByteEncoder::read_u32(stream, &mut self.extents_pos)?;
                begin = begin
                    .checked_add(gap)
                    .ok_or_else(|| Error::corrupt_index("Extent begin overflows"))?;
                let end = begin
                    .checked_add(width)
                    .ok_or_else(|| Error::corrupt_index("Extent end overflows"))?;
                self.extents.push(Extent { begin, end });
            }
        }

        self.read += 1;
        self.current = Some(DocId(doc));
        self.count = count;
        Ok(())
    }

    /// Advance to the first posting with id >= `target`, jumping whole
    /// skip groups where possible
    pub fn skip_to(&mut self, target: DocId) -> Result<()> {
        match self.current {
            None => return Ok(()),
            Some(doc) if doc >= target => return Ok(()),
            Some(_) => {}
        }

        let reachable = self.layout.skips.partition_point(|s| s.last_doc < target);
        if reachable > 0 {
            let group_start = reachable as u64 * self.layout.skip_interval;
            if group_start >= self.read {
                let entry = self.layout.skips[reachable - 1];
                self.docs_pos = entry.docs_offset;
                self.counts_pos = entry.counts_offset;
                self.extents_pos = entry.extents_offset;
                self.decoder = DeltaDecoder::with_base(Some(entry.last_doc.0));
                self.read = group_start;
                self.advance()?;
            }
        }

        while let Some(doc) = self.current {
            if doc >= target {
                break;
            }
            self.advance()?;
        }
        Ok(())
    }

    fn check_exhausted(&self) -> Result<()> {
        let extents_clean = !self.with_extents || self.extents_pos == self.layout.extents.end;
        if self.docs_pos != self.layout.docs.end
            || self.counts_pos != self.layout.counts.end
            || !extents_clean
        {
            return Err(Error::corrupt_index("Postings streams hold trailing data"));
        }
        Ok(())
    }
}

/// Lazy sequence of postings decoded from one block
pub struct PostingsIter<'a> {
    cursor: PostingsCursor<&'a [u8]>,
    started: bool,
    failed: bool,
}

/// Decode a block produced by [`encode_postings`] or the disk writer
pub fn decode_postings(bytes: &[u8]) -> Result<PostingsIter<'_>> {
    Ok(PostingsIter {
        cursor: PostingsCursor::open(bytes, true)?,
        started: false,
        failed: false,
    })
}

impl<'a> Iterator for PostingsIter<'a> {
    type Item = Result<Posting>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        if self.started {
            if let Err(e) = self.cursor.advance() {
                self.failed = true;
                return Some(Err(e));
            }
        }
        self.started = true;

        let doc_id = self.cursor.current()?;
        Some(Ok(Posting {
            doc_id,
            count: self.cursor.count(),
            extents: self.cursor.extents().to_vec(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;
    use rand::Rng;

    fn incrementing(ids: &[u64]) -> Vec<Posting> {
        ids.iter()
            .enumerate()
            .map(|(k, &id)| {
                let positions: Vec<u32> = (0..=k as u32).collect();
                Posting::from_positions(DocId(id), &positions)
            })
            .collect()
    }

    fn decode_all(bytes: &[u8]) -> Vec<Posting> {
        decode_postings(bytes).unwrap().map(|p| p.unwrap()).collect()
    }

    #[test]
    fn round_trips_ids_beyond_u32() {
        let ids = [
            0,
            2_147_483_646,
            2_147_483_647,
            2_147_483_648,
            2_000_000_000,
            5_940_594_059,
            7_994_059_405,
        ];
        let mut sorted = ids.to_vec();
        sorted.sort();
        let postings = incrementing(&sorted);
        let encoded = encode_postings(&postings, 2).unwrap();
        assert_eq!(decode_all(&encoded), postings);
    }

    #[test]
    fn round_trips_random_lists() {
        let mut rng = rand::thread_rng();
        for _ in 0..20 {
            let mut doc = rng.gen_range(0..1_000u64);
            let mut postings = Vec::new();
            for _ in 0..rng.gen_range(1..300) {
                doc += rng.gen_range(1..10_000_000_000u64);
                let mut begin = 0u32;
                let mut extents = Vec::new();
                for _ in 0..rng.gen_range(1..6) {
                    begin += rng.gen_range(0..50);
                    extents.push(Extent::new(begin, begin + rng.gen_range(0..4)));
                }
                postings.push(Posting::new(DocId(doc), extents));
            }
            let encoded = encode_postings(&postings, rng.gen_range(1..64)).unwrap();
            assert_eq!(decode_all(&encoded), postings);
        }
    }

    #[test]
    fn summary_tracks_counts() {
        let postings = incrementing(&[3, 9, 27]);
        let encoded = encode_postings(&postings, 128).unwrap();
        let cursor = PostingsCursor::open(&encoded[..], false).unwrap();
        assert_eq!(
            cursor.summary(),
            BlockSummary { doc_count: 3, total_count: 6, max_count: 3 }
        );
    }

    #[test]
    fn empty_block_is_immediately_done() {
        let encoded = encode_postings(&[], 16).unwrap();
        let cursor = PostingsCursor::open(&encoded[..], true).unwrap();
        assert!(cursor.is_done());
        assert_eq!(decode_all(&encoded).len(), 0);
    }

    #[test]
    fn skip_to_lands_on_first_id_at_or_after_target() {
        let ids: Vec<u64> = (0..1000).map(|i| i * 10).collect();
        let postings = incrementing(&ids);
        let encoded = encode_postings(&postings, 8).unwrap();

        for with_extents in [false, true] {
            let mut cursor = PostingsCursor::open(&encoded[..], with_extents).unwrap();
            cursor.skip_to(DocId(35)).unwrap();
            assert_eq!(cursor.current(), Some(DocId(40)));
            assert_eq!(cursor.count(), 5);

            cursor.skip_to(DocId(5_000)).unwrap();
            assert_eq!(cursor.current(), Some(DocId(5_000)));
            assert_eq!(cursor.count(), 501);
            if with_extents {
                assert_eq!(cursor.extents().len(), 501);
                assert_eq!(cursor.extents()[500], Extent::point(500));
            }

            // Behind the cursor: no movement
            cursor.skip_to(DocId(100)).unwrap();
            assert_eq!(cursor.current(), Some(DocId(5_000)));

            cursor.advance().unwrap();
            assert_eq!(cursor.current(), Some(DocId(5_010)));

            cursor.skip_to(DocId(9_991)).unwrap();
            assert!(cursor.is_done());
        }
    }

    #[test]
    fn builder_rejects_out_of_order_input() {
        let mut builder = PostingsBlockBuilder::new(4);
        builder.add_posting(DocId(10), &[Extent::point(1)]).unwrap();

        let err = builder.add_posting(DocId(10), &[Extent::point(1)]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        let err = builder.add_posting(DocId(11), &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        let err = builder
            .add_posting(DocId(12), &[Extent::point(5), Extent::point(2)])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let mismatched = Posting { doc_id: DocId(1), count: 2, extents: vec![Extent::point(0)] };
        let err = encode_postings(&[mismatched], 4).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    fn raw_block(summary: [u64; 3], docs: &[u64], counts: &[u64], extents: &[u64]) -> Vec<u8> {
        let encode = |values: &[u64]| {
            let mut out = Vec::new();
            for &v in values {
                VByteEncoder::encode_u64(&mut out, v);
            }
            out
        };
        let (docs, counts, extents) = (encode(docs), encode(counts), encode(extents));
        let mut block = encode(&[
            summary[0], summary[1], summary[2], 128, 0,
            0, docs.len() as u64, counts.len() as u64, extents.len() as u64,
        ]);
        block.extend(docs);
        block.extend(counts);
        block.extend(extents);
        block
    }

    #[test]
    fn count_extent_mismatch_is_corrupt() {
        let block = raw_block([1, 2, 2], &[5], &[2], &[0, 1]);
        let err = PostingsCursor::open(&block[..], true).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::CorruptIndex);

        // Too few declared: trailing extents surface at the end of the list
        let block = raw_block([1, 1, 1], &[5], &[1], &[0, 1, 3, 1]);
        let results: Vec<_> = decode_postings(&block).unwrap().collect();
        assert!(results[0].is_ok());
        assert_eq!(results[1].as_ref().unwrap_err().kind(), ErrorKind::CorruptIndex);
    }

    #[test]
    fn non_increasing_ids_are_corrupt() {
        let block = raw_block([2, 2, 1], &[5, 0], &[1, 1], &[0, 1, 0, 1]);
        let results: Vec<_> = decode_postings(&block).unwrap().collect();
        assert_eq!(results.len(), 2);
        assert_eq!(results[1].as_ref().unwrap_err().kind(), ErrorKind::CorruptIndex);
    }

    #[test]
    fn zero_count_and_bad_lengths_are_corrupt() {
        let block = raw_block([1, 1, 1], &[5], &[0], &[]);
        assert_eq!(
            PostingsCursor::open(&block[..], false).err().unwrap().kind(),
            ErrorKind::CorruptIndex
        );

        let mut block = raw_block([1, 1, 1], &[5], &[1], &[0, 1]);
        block.push(0);
        assert_eq!(BlockLayout::parse(&block).unwrap_err().kind(), ErrorKind::CorruptIndex);

        let block = raw_block([1, 1, 1], &[5], &[1], &[0, 1]);
        assert_eq!(
            BlockLayout::parse(&block[..block.len() - 1]).unwrap_err().kind(),
            ErrorKind::CorruptIndex
        );
    }
}
