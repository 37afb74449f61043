//! Core types for the rowstore-verify workspace.
//!
//! This crate provides the foundational types shared by the store and
//! verification crates:
//!
//! - [`RowKey`] - Opaque byte-sequence row key
//! - [`Row`] - Column map of one row, ordered by raw column bytes
//! - [`encoding`] - Lossless text rendering of raw bytes for JSON output
//!
//! # Architecture
//!
//! ```text
//! row-types (this crate)
//!    │
//!    ├─── row-store   (RowStore trait + memory / JSONL snapshot stores)
//!    │
//!    └─── row-verify  (hashing, classification, aggregation, orchestration)
//! ```
//!
//! # Example
//!
//! ```rust
//! use row_types::{Row, RowKey};
//!
//! let key = RowKey::from("order-0001");
//! let row: Row = [("cf:status", "paid"), ("cf:amount", "12.50")]
//!     .into_iter()
//!     .collect();
//!
//! assert_eq!(key.as_bytes(), b"order-0001");
//! assert_eq!(row.get(b"cf:status"), Some(&b"paid"[..]));
//! ```

pub mod encoding;
pub mod row;

pub use encoding::{decode_bytes, encode_bytes, DecodeError};
pub use row::{Row, RowKey};
