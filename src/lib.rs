//! Pocket Snapshot Indexer Library
//!
//! Indexes height-scoped snapshots of a Pocket ledger into PostgreSQL,
//! following hexagonal architecture:
//!
//! - `domain`: Snapshot records, raw ledger records, normalization
//! - `application`: Use cases (pagination, indexing), ports (traits), and error types
//! - `adapters`: Implementations (ledger RPC provider, PostgreSQL snapshot store)
//! - `infrastructure`: Cross-cutting concerns (configuration, logging)

pub mod adapters;
pub mod application;
pub mod domain;
pub mod infrastructure;
