//! Scan strategies that fold a counting cursor into [`NodeStatistics`].
//!
//! Each strategy leaves the cursor exhausted or at an arbitrary position;
//! a cursor is never reused across computations.

use roaring::RoaringTreemap;
use crate::core::error::Result;
use crate::core::stats::NodeStatistics;
use crate::core::types::DocId;
use crate::iterator::Cursor;

/// Sequential scan over every candidate
pub fn full_scan(cursor: &mut dyn Cursor, stats: &mut NodeStatistics) -> Result<()> {
    while !cursor.is_done() {
        let candidate = cursor.current_candidate()?;
        if cursor.has_match(candidate) {
            stats.add_match(cursor.count()?);
        }
        cursor.move_past(candidate)?;
    }
    Ok(())
}

/// Full scan that also records (candidate, count) for every match that is
/// in `candidates`. The recorded pairs are in document order.
pub fn onepass_scan(
    cursor: &mut dyn Cursor,
    stats: &mut NodeStatistics,
    candidates: &RoaringTreemap,
) -> Result<Vec<(DocId, u32)>> {
    let mut occurrences = Vec::new();
    while !cursor.is_done() {
        let candidate = cursor.current_candidate()?;
        if cursor.has_match(candidate) {
            let count = cursor.count()?;
            stats.add_match(count);
            if candidates.contains(candidate.0) {
                occurrences.push((candidate, count));
            }
        }
        cursor.move_past(candidate)?;
    }
    Ok(occurrences)
}

/// Visit only the supplied ids, in ascending order, stopping once the
/// cursor is done. Undercounts matches outside the sample.
pub fn sampled_scan(
    cursor: &mut dyn Cursor,
    stats: &mut NodeStatistics,
    sorted_candidates: &[DocId],
) -> Result<Vec<(DocId, u32)>> {
    let mut occurrences = Vec::new();
    for &candidate in sorted_candidates {
        cursor.move_to(candidate)?;
        if cursor.is_done() {
            break;
        }
        if cursor.current_candidate()? == candidate && cursor.has_match(candidate) {
            let count = cursor.count()?;
            stats.add_match(count);
            occurrences.push((candidate, count));
        }
    }
    Ok(occurrences)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::stats::CollectionStatistics;
    use crate::iterator::testing::VecCursor;
    use crate::iterator::CursorRef;

    fn cursor() -> CursorRef {
        VecCursor::positions("t", &[(1, &[0]), (3, &[0, 1, 2]), (8, &[4, 5]), (20, &[1])])
    }

    fn empty_stats() -> NodeStatistics {
        NodeStatistics::new("t", CollectionStatistics { collection_length: 100, document_count: 30 })
    }

    #[test]
    fn full_scan_folds_every_match() {
        let mut stats = empty_stats();
        full_scan(&mut *cursor().borrow_mut(), &mut stats).unwrap();
        assert_eq!(stats.node_frequency, 7);
        assert_eq!(stats.node_document_count, 4);
        assert_eq!(stats.maximum_count, 3);
        assert!(stats.is_consistent());
    }

    #[test]
    fn onepass_matches_full_scan_and_records_candidates() {
        let mut full = empty_stats();
        full_scan(&mut *cursor().borrow_mut(), &mut full).unwrap();

        let candidates: RoaringTreemap = [3u64, 4, 20].into_iter().collect();
        let mut stats = empty_stats();
        let recorded = onepass_scan(&mut *cursor().borrow_mut(), &mut stats, &candidates).unwrap();
        assert_eq!(stats, full);
        assert_eq!(recorded, vec![(DocId(3), 3), (DocId(20), 1)]);
    }

    #[test]
    fn sampled_scan_undercounts_and_stops_early() {
        let mut stats = empty_stats();
        let sample = [DocId(2), DocId(3), DocId(8), DocId(50), DocId(60)];
        let recorded = sampled_scan(&mut *cursor().borrow_mut(), &mut stats, &sample).unwrap();

        assert_eq!(recorded, vec![(DocId(3), 3), (DocId(8), 2)]);
        assert_eq!(stats.node_document_count, 2);
        assert_eq!(stats.node_frequency, 5);
        assert!(stats.is_consistent());
    }

    #[test]
    fn sample_covering_all_matches_equals_full_scan() {
        let mut full = empty_stats();
        full_scan(&mut *cursor().borrow_mut(), &mut full).unwrap();

        let sample: Vec<DocId> = [1u64, 3, 8, 20].into_iter().map(DocId).collect();
        let mut stats = empty_stats();
        sampled_scan(&mut *cursor().borrow_mut(), &mut stats, &sample).unwrap();
        assert_eq!(stats, full);
    }
}
