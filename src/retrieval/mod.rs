pub mod cache;
pub mod compile;
pub mod context;
pub mod registry;
pub mod session;
pub mod statistics;
pub mod synthetic;

pub use compile::{CompileOptions, CursorArena, CursorCompiler};
pub use context::{BoundAccumulators, ScoringContext};
pub use registry::{BuildInput, Constructor, OperatorRegistry};
pub use session::Retrieval;
pub use synthetic::SyntheticCounts;
