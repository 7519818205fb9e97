pub mod inbound;
pub mod sinks;

pub use inbound::{HttpProvider, InMemoryProvider};
pub use sinks::PostgresStore;
