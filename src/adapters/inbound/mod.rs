pub mod http_provider;
pub mod memory_provider;

pub use http_provider::HttpProvider;
pub use memory_provider::InMemoryProvider;
