use criterion::{black_box, criterion_group, criterion_main, Criterion, BenchmarkId};
use stagedex::core::config::WriterConfig;
use stagedex::core::stats::{CollectionStatistics, NodeStatistics};
use stagedex::core::types::DocId;
use stagedex::index::{DiskIndexReader, DiskIndexWriter};
use stagedex::iterator::Cursor;
use stagedex::retrieval::statistics::{full_scan, sampled_scan};
use std::path::Path;

// One key with `doc_count` documents, three occurrences each
fn create_test_index(path: &Path, doc_count: u64) {
    let mut writer = DiskIndexWriter::create(path, WriterConfig::default()).unwrap();
    writer.begin_key(b"rust").unwrap();
    for doc in 0..doc_count {
        writer.begin_document(DocId(doc * 3)).unwrap();
        for position in [5, 10, 15] {
            writer.add_occurrence(position).unwrap();
        }
    }
    writer.finish().unwrap();
}

fn bench_scans(c: &mut Criterion) {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("bench.idx");
    create_test_index(&path, 100_000);
    let reader = DiskIndexReader::open(&path).unwrap();

    let mut group = c.benchmark_group("postings_scan");

    group.bench_function("extent_scan", |b| {
        b.iter(|| {
            let mut source = reader.extent_source(b"rust").unwrap().unwrap();
            let mut total = 0usize;
            while !source.is_done() {
                let doc = source.current_candidate().unwrap();
                total += source.extents().unwrap().len();
                source.move_past(doc).unwrap();
            }
            black_box(total);
        });
    });

    group.bench_function("count_scan", |b| {
        b.iter(|| {
            let mut source = reader.count_source(b"rust").unwrap().unwrap();
            let mut stats = NodeStatistics::new("rust", CollectionStatistics::default());
            full_scan(&mut source, &mut stats).unwrap();
            black_box(stats);
        });
    });

    for step in [10u64, 1000] {
        let sample: Vec<DocId> = (0..300_000).step_by(step as usize).map(DocId).collect();
        group.bench_with_input(BenchmarkId::new("sampled_move_to", step), &sample, |b, sample| {
            b.iter(|| {
                let mut source = reader.count_source(b"rust").unwrap().unwrap();
                let mut stats = NodeStatistics::new("rust", CollectionStatistics::default());
                black_box(sampled_scan(&mut source, &mut stats, sample).unwrap());
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_scans);
criterion_main!(benches);
