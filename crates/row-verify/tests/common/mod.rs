#![allow(dead_code)]

use async_trait::async_trait;
use row_store::{MemoryStore, RowStore, StoreDescriptor, StoreError};
use row_types::{Row, RowKey};
use row_verify::{EventSink, VerifyEvent};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn row(pairs: &[(&str, &str)]) -> Row {
    pairs.iter().copied().collect()
}

pub fn keys(names: &[&str]) -> Vec<RowKey> {
    names.iter().map(|n| RowKey::from(*n)).collect()
}

/// Source and target of the five-key reference scenario.
pub fn scenario_stores() -> (Arc<dyn RowStore>, Arc<dyn RowStore>) {
    let source = MemoryStore::new("source").with_rows([
        ("r1", row(&[("c1", "x")])),
        ("r2", row(&[("c1", "y")])),
        ("r3", row(&[("c1", "z")])),
    ]);
    let target = MemoryStore::new("target").with_rows([
        ("r1", row(&[("c1", "x")])),
        ("r3", row(&[("c1", "w")])),
        ("r4", row(&[("c1", "q")])),
    ]);
    (Arc::new(source), Arc::new(target))
}

/// How a [`FaultyStore`] misbehaves for a key.
#[derive(Clone, Copy, Debug)]
pub enum Fault {
    Fail,
    Panic,
    Hang,
    Delay(Duration),
}

/// Wraps a store and injects faults for selected keys.
pub struct FaultyStore {
    inner: MemoryStore,
    faults: Vec<(RowKey, Fault)>,
    fail_scan: bool,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub lookups: AtomicUsize,
}

impl FaultyStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            faults: Vec::new(),
            fail_scan: false,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            lookups: AtomicUsize::new(0),
        }
    }

    pub fn with_fault(mut self, key: &str, fault: Fault) -> Self {
        self.faults.push((key.into(), fault));
        self
    }

    pub fn with_failing_scan(mut self) -> Self {
        self.fail_scan = true;
        self
    }

    fn fault_for(&self, key: &RowKey) -> Option<Fault> {
        self.faults
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, fault)| *fault)
    }
}

#[async_trait]
impl RowStore for FaultyStore {
    fn descriptor(&self) -> &StoreDescriptor {
        self.inner.descriptor()
    }

    async fn get_row(&self, key: &RowKey) -> Result<Option<Row>, StoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let result = match self.fault_for(key) {
            Some(Fault::Fail) => Err(StoreError::Fetch {
                key: key.to_string(),
                message: "connection reset".to_string(),
            }),
            Some(Fault::Panic) => panic!("store exploded on {key}"),
            Some(Fault::Hang) => {
                std::future::pending::<()>().await;
                unreachable!()
            }
            Some(Fault::Delay(delay)) => {
                tokio::time::sleep(delay).await;
                self.inner.get_row(key).await
            }
            None => {
                tokio::task::yield_now().await;
                self.inner.get_row(key).await
            }
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn list_keys(&self, limit: Option<usize>) -> Result<Vec<RowKey>, StoreError> {
        if self.fail_scan {
            return Err(StoreError::Scan("region server offline".to_string()));
        }
        self.inner.list_keys(limit).await
    }
}

/// Collects every event it receives.
#[derive(Default)]
pub struct RecordingSink {
    pub events: Mutex<Vec<VerifyEvent>>,
}

impl RecordingSink {
    pub fn fetch_failures(&self) -> HashSet<RowKey> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                VerifyEvent::FetchFailed { key, .. } => Some(key.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&VerifyEvent) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &VerifyEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
