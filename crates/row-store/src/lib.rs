//! Row store capability for rowstore-verify.
//!
//! The verification engine only depends on the [`RowStore`] trait: point
//! lookups by key and an ordered key scan. This crate defines that trait and
//! ships two implementations:
//!
//! - [`MemoryStore`] - In-memory table, for library users and tests
//! - [`JsonlStore`] - Read-only table loaded from a JSONL snapshot directory
//!
//! Remote stores (HBase over Thrift, etc.) plug in by implementing the same
//! trait; the engine never sees their protocol.
//!
//! # Snapshot layout
//!
//! ```text
//! <snapshot_dir>/
//!   orders.jsonl        {"key": "r1", "columns": {"cf:amount": "12.50"}}
//!   ns:customers.jsonl  {"key": "base64:AP8=", "columns": {}}
//! ```

mod error;
mod jsonl;
mod memory;
pub mod store;

pub use error::StoreError;
pub use jsonl::{JsonlStore, SnapshotLine};
pub use memory::MemoryStore;
pub use store::{RowStore, StoreDescriptor};
