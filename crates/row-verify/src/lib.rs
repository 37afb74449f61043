//! Concurrent validation of row stores.
//!
//! Given a source and a target [`RowStore`](row_store::RowStore) and a set of
//! row keys, the [`Verifier`] fetches every key from both stores, classifies
//! the pair into an [`Outcome`] and accumulates the outcomes into a
//! [`ValidationResult`]. A [`Report`] turns a result into a serializable
//! document.
//!
//! ```text
//!  keys ──► Verifier ──► tasks (≤ concurrency) ──► get_row(source) ┐
//!                                                  get_row(target) ┴► classify ──► aggregate
//!                                                                                     │
//!                            Report ◄── ValidationResult ◄── finish ◄─────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use row_verify::{NoopProgress, Report, Verifier};
//!
//! let verifier = Verifier::new(source, target).with_concurrency(20);
//! let result = verifier.verify_all(None, &NoopProgress).await?;
//! let report = Report::assemble(&result, verifier.source(), verifier.target());
//! ```

pub mod aggregate;
pub mod args;
pub mod compare;
pub mod digest;
pub mod error;
pub mod events;
pub mod progress;
pub mod report;
pub mod verifier;

pub use aggregate::{
    DetailRecord, OutcomeCounts, RecordDetails, ValidationAggregate, ValidationResult,
};
pub use args::VerifyArgs;
pub use compare::{classify, Classification, DiffDetail, Outcome, ValueDifference};
pub use digest::digest;
pub use error::VerifyError;
pub use events::{EventSink, Side, TracingSink, VerifyEvent};
pub use progress::{NoopProgress, ProgressSink};
pub use report::{Report, Summary, Verdict};
pub use verifier::{CancelHandle, DrainPolicy, Verifier};
