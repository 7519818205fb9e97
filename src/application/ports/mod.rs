pub mod provider;
pub mod snapshot_store;
pub use provider::*;
pub use snapshot_store::*;
