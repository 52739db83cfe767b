pub mod disk_reader;
pub mod disk_writer;
pub mod header;
pub mod posting;
pub mod sources;

pub use disk_reader::{DiskIndexReader, KeyIterator};
pub use disk_writer::{DiskIndexWriter, IndexSummary};
pub use sources::{CountSource, ExtentSource};
