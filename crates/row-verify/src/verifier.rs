//! Concurrent source/target verification.

use crate::aggregate::{RecordDetails, ValidationAggregate, ValidationResult};
use crate::compare::{classify, Classification, Outcome};
use crate::error::VerifyError;
use crate::events::{EventSink, Side, TracingSink, VerifyEvent};
use crate::progress::ProgressSink;
use futures::FutureExt;
use row_store::{RowStore, StoreDescriptor};
use row_types::{Row, RowKey};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, Semaphore};
use tokio::task::{JoinError, JoinSet};

pub const DEFAULT_CONCURRENCY: usize = 10;
pub const DEFAULT_PROGRESS_INTERVAL: usize = 100;
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_DETAIL_RECORDS: usize = 1000;

/// What happens to in-flight tasks once a run is cancelled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrainPolicy {
    /// Let in-flight keys finish and record them.
    #[default]
    Wait,
    /// Abort in-flight keys; they are not recorded.
    Abandon,
}

/// Requests cancellation of a running verification.
///
/// Cloning is cheap; all clones control the same verifier. Cancellation is
/// sticky: once cancelled, later runs of the same verifier stop immediately.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Compares rows of a source and a target store key by key.
///
/// # Example
///
/// ```ignore
/// let verifier = Verifier::new(source, target)
///     .with_concurrency(20)
///     .with_progress_interval(500);
///
/// let result = verifier.verify_keys(&keys, &NoopProgress).await?;
/// println!("{:.2}% matched", result.success_rate());
/// ```
pub struct Verifier {
    source: Arc<dyn RowStore>,
    target: Arc<dyn RowStore>,
    concurrency: usize,
    progress_interval: usize,
    fetch_timeout: Option<Duration>,
    max_detail_records: usize,
    drain: DrainPolicy,
    events: Arc<dyn EventSink>,
    cancel: CancelHandle,
}

impl Verifier {
    pub fn new(source: Arc<dyn RowStore>, target: Arc<dyn RowStore>) -> Self {
        Self {
            source,
            target,
            concurrency: DEFAULT_CONCURRENCY,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            fetch_timeout: Some(DEFAULT_FETCH_TIMEOUT),
            max_detail_records: DEFAULT_MAX_DETAIL_RECORDS,
            drain: DrainPolicy::default(),
            events: Arc::new(TracingSink),
            cancel: CancelHandle::new(),
        }
    }

    /// Maximum number of keys verified at the same time.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Report progress after every `interval` completed keys.
    pub fn with_progress_interval(mut self, interval: usize) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Per-lookup timeout; `None` waits forever.
    pub fn with_fetch_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_max_detail_records(mut self, max: usize) -> Self {
        self.max_detail_records = max;
        self
    }

    pub fn with_drain_policy(mut self, drain: DrainPolicy) -> Self {
        self.drain = drain;
        self
    }

    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Share an existing cancel handle, e.g. one wired to a signal handler.
    pub fn with_cancel_handle(mut self, cancel: CancelHandle) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn source(&self) -> &StoreDescriptor {
        self.source.descriptor()
    }

    pub fn target(&self) -> &StoreDescriptor {
        self.target.descriptor()
    }

    /// List keys from the source store and verify them.
    ///
    /// A failing scan aborts the run with [`VerifyError::Scan`].
    pub async fn verify_all(
        &self,
        limit: Option<usize>,
        progress: &dyn ProgressSink,
    ) -> Result<ValidationResult, VerifyError> {
        self.events.emit(&VerifyEvent::KeyScanStarted { limit });
        let keys = self
            .source
            .list_keys(limit)
            .await
            .map_err(VerifyError::Scan)?;

        if keys.is_empty() {
            self.events.emit(&VerifyEvent::NoKeys);
        }
        self.verify_keys(&keys, progress).await
    }

    /// Verify every key in `keys`.
    ///
    /// Each occurrence of a key is verified and counted independently. At
    /// most `concurrency` keys are in flight. Failures of a single key are
    /// recorded as [`Outcome::Error`] and never abort the run.
    pub async fn verify_keys(
        &self,
        keys: &[RowKey],
        progress: &dyn ProgressSink,
    ) -> Result<ValidationResult, VerifyError> {
        if self.concurrency == 0 {
            return Err(VerifyError::Config(
                "concurrency must be at least 1".to_string(),
            ));
        }
        if self.progress_interval == 0 {
            return Err(VerifyError::Config(
                "progress interval must be at least 1".to_string(),
            ));
        }

        let total = keys.len();
        let aggregate = Arc::new(ValidationAggregate::new(self.max_detail_records));
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let task = KeyTask {
            source: Arc::clone(&self.source),
            target: Arc::clone(&self.target),
            aggregate: Arc::clone(&aggregate),
            events: Arc::clone(&self.events),
            fetch_timeout: self.fetch_timeout,
        };

        let mut cancel_rx = self.cancel.subscribe();
        let mut tasks = JoinSet::new();
        let mut completed = 0usize;
        let mut submitted = 0usize;
        let mut cancelled = false;

        self.events.emit(&VerifyEvent::RunStarted {
            keys: total,
            concurrency: self.concurrency,
        });
        let start = Instant::now();

        for key in keys {
            if *cancel_rx.borrow() {
                cancelled = true;
                break;
            }

            let permit = tokio::select! {
                biased;
                _ = cancellation(&mut cancel_rx) => {
                    cancelled = true;
                    break;
                }
                permit = Arc::clone(&semaphore).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    // The semaphore is never closed.
                    Err(_) => break,
                },
            };

            while let Some(joined) = tasks.try_join_next() {
                self.reap(joined, &mut completed, total, progress);
            }

            let task = task.clone();
            let key = key.clone();
            tasks.spawn(async move {
                let _permit = permit;
                task.run(key).await;
            });
            submitted += 1;
        }

        if cancelled {
            self.on_cancel(&mut tasks, submitted, total);
        }

        loop {
            let joined = if cancelled || self.drain == DrainPolicy::Wait {
                tasks.join_next().await
            } else {
                tokio::select! {
                    biased;
                    _ = cancellation(&mut cancel_rx) => {
                        cancelled = true;
                        self.on_cancel(&mut tasks, submitted, total);
                        continue;
                    }
                    joined = tasks.join_next() => joined,
                }
            };

            match joined {
                Some(joined) => self.reap(joined, &mut completed, total, progress),
                None => break,
            }
        }

        let result = aggregate.finish(start.elapsed(), cancelled);
        self.events.emit(&VerifyEvent::RunFinished {
            counts: result.counts,
            elapsed: result.elapsed,
            cancelled,
        });
        Ok(result)
    }

    fn on_cancel(&self, tasks: &mut JoinSet<()>, submitted: usize, total: usize) {
        self.events
            .emit(&VerifyEvent::Cancelled { submitted, total });
        if self.drain == DrainPolicy::Abandon {
            tasks.abort_all();
        }
    }

    fn reap(
        &self,
        joined: Result<(), JoinError>,
        completed: &mut usize,
        total: usize,
        progress: &dyn ProgressSink,
    ) {
        match joined {
            Ok(()) => {}
            Err(e) if e.is_cancelled() => return,
            Err(e) => self.events.emit(&VerifyEvent::TaskPanicked {
                key: None,
                message: e.to_string(),
            }),
        }

        *completed += 1;
        if *completed % self.progress_interval == 0 {
            progress.on_progress(*completed, total);
        }
    }
}

/// Resolves once cancellation is requested.
async fn cancellation(rx: &mut watch::Receiver<bool>) {
    if rx.wait_for(|cancelled| *cancelled).await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Everything one per-key task needs, owned so it can be spawned.
#[derive(Clone)]
struct KeyTask {
    source: Arc<dyn RowStore>,
    target: Arc<dyn RowStore>,
    aggregate: Arc<ValidationAggregate>,
    events: Arc<dyn EventSink>,
    fetch_timeout: Option<Duration>,
}

impl KeyTask {
    async fn run(self, key: RowKey) {
        let (outcome, details) = match AssertUnwindSafe(self.compare(&key)).catch_unwind().await {
            Ok(Ok(classified)) => classified,
            Ok(Err(message)) => (Outcome::Error, RecordDetails::Message { message }),
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                self.events.emit(&VerifyEvent::TaskPanicked {
                    key: Some(key.clone()),
                    message: message.clone(),
                });
                (
                    Outcome::Error,
                    RecordDetails::Message {
                        message: format!("Validation error: {message}"),
                    },
                )
            }
        };
        self.aggregate.record(key, outcome, details);
    }

    async fn compare(&self, key: &RowKey) -> Result<(Outcome, RecordDetails), String> {
        let (source, target) = tokio::join!(
            self.fetch(Side::Source, self.source.as_ref(), key),
            self.fetch(Side::Target, self.target.as_ref(), key),
        );
        let source = source?;
        let target = target?;
        Ok(describe(source.as_ref(), target.as_ref()))
    }

    async fn fetch(
        &self,
        side: Side,
        store: &dyn RowStore,
        key: &RowKey,
    ) -> Result<Option<Row>, String> {
        let lookup = store.get_row(key);
        let result = match self.fetch_timeout {
            Some(limit) => match tokio::time::timeout(limit, lookup).await {
                Ok(result) => result.map_err(|e| e.to_string()),
                Err(_) => Err(format!("timed out after {}ms", limit.as_millis())),
            },
            None => lookup.await.map_err(|e| e.to_string()),
        };

        result.map_err(|error| {
            self.events.emit(&VerifyEvent::FetchFailed {
                key: key.clone(),
                side,
                error: error.clone(),
            });
            format!("Validation error: {side} fetch failed: {error}")
        })
    }
}

/// Classify a row pair and build its detail payload.
fn describe(source: Option<&Row>, target: Option<&Row>) -> (Outcome, RecordDetails) {
    let Classification {
        outcome,
        diff,
        digests,
    } = classify(source, target);
    let (source_hash, target_hash) = digests.unwrap_or_default();

    let details = match outcome {
        Outcome::Matched => RecordDetails::Matched {
            message: "Row data is identical".to_string(),
            columns_count: source.map_or(0, Row::len),
            data_hash: source_hash,
        },
        Outcome::MissingInSource => RecordDetails::MissingInSource {
            message: "Row exists in target but not in source".to_string(),
            target_columns: target.map_or(0, Row::len),
        },
        Outcome::MissingInTarget => RecordDetails::MissingInTarget {
            message: "Row exists in source but not in target".to_string(),
            source_columns: source.map_or(0, Row::len),
        },
        Outcome::BothMissing => RecordDetails::Message {
            message: "Row exists in neither source nor target".to_string(),
        },
        Outcome::DataMismatch => RecordDetails::DataMismatch {
            message: "Row data differs".to_string(),
            source_hash,
            target_hash,
            mismatches: diff.unwrap_or_default(),
        },
        Outcome::Error => RecordDetails::Message {
            message: "Validation error".to_string(),
        },
    };
    (outcome, details)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "task panicked".to_string()
    }
}
