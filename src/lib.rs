pub mod core;
pub mod compression;
pub mod mmap;
pub mod index;
pub mod iterator;
pub mod query;
pub mod retrieval;

/*
┌──────────────────────────────────────────────────────────────────────────────┐
│                          STAGEDEX STRUCT ARCHITECTURE                         │
└──────────────────────────────────────────────────────────────────────────────┘

┌─────────────────────────────── RETRIEVAL LAYER ──────────────────────────────┐
│                                                                              │
│  ┌────────────────────────────────────────────────────────────────────────┐ │
│  │                           struct Retrieval                              │ │
│  │ index: Arc<DiskIndexReader>          // Shared immutable map             │ │
│  │ config: RetrievalConfig              // completion, shareNodes, scorer   │ │
│  │ registry: OperatorRegistry           // operator -> constructor          │ │
│  │ collection: CollectionStatistics                                          │ │
│  │ synthetic: Option<SyntheticCounts>   // signature -> NodeStatistics      │ │
│  │ candidates / sorted_candidates       // onepass / sampled inputs         │ │
│  │ occurrences: OccurrenceCache         // key -> [(doc, count)]            │ │
│  └────────────────────────────────────────────────────────────────────────┘ │
│                │ node_statistics(node)             │ create_cursor(node)     │
│                ▼                                   ▼                         │
│  ┌──────────────────────────────┐    ┌──────────────────────────────────┐   │
│  │ statistics::{full_scan,      │    │ CursorCompiler                    │   │
│  │   onepass_scan, sampled_scan}│    │  children first, CursorArena      │   │
│  └──────────────────────────────┘    │  when sharing, bound seeding      │   │
│                                      └──────────────────────────────────┘   │
└──────────────────────────────────────────────────────────────────────────────┘

┌─────────────────────────────── ITERATOR LAYER ───────────────────────────────┐
│  trait Cursor + Capabilities { COUNT, EXTENTS, AGGREGATE, ESTIMATOR }        │
│  WindowCursor (od/uw)  SynonymCursor  Conjunction  Disjunction               │
│  FeatureCursor  NullCursor            CountSource / ExtentSource (leaves)    │
└──────────────────────────────────────────────────────────────────────────────┘

┌──────────────────────────────── STORAGE LAYER ───────────────────────────────┐
│  [ IndexHeader ][ postings block per key ... ][ fst::Map key -> offset ]     │
│  DiskIndexWriter (append-only)   DiskIndexReader (MmapFile + MmapSlice)      │
│  PostingsBlockBuilder / PostingsCursor   VByteEncoder / DeltaEncoder         │
└──────────────────────────────────────────────────────────────────────────────┘
*/
