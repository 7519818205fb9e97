pub mod indexer;
pub mod paginate;

pub use indexer::*;
pub use paginate::*;
