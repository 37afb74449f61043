mod common;

use common::{keys, row, scenario_stores, Fault, FaultyStore, RecordingSink};
use row_store::{MemoryStore, RowStore};
use row_types::RowKey;
use row_verify::{
    NoopProgress, Outcome, RecordDetails, Report, Side, ValidationResult, Verifier, VerifyError,
    VerifyEvent,
};
use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn outcome_by_key(result: &ValidationResult) -> HashMap<RowKey, Outcome> {
    result
        .details
        .iter()
        .map(|d| (d.rowkey.clone(), d.status))
        .collect()
}

#[tokio::test]
async fn test_reference_scenario() {
    let (source, target) = scenario_stores();
    let verifier = Verifier::new(source, target);

    let result = verifier
        .verify_keys(&keys(&["r1", "r2", "r3", "r4", "r5"]), &NoopProgress)
        .await
        .unwrap();

    let c = result.counts;
    assert_eq!(c.total, 5);
    assert_eq!(c.matched, 1);
    assert_eq!(c.missing_in_target, 1);
    assert_eq!(c.missing_in_source, 1);
    assert_eq!(c.data_mismatch, 1);
    assert_eq!(c.error, 0);
    assert_eq!(result.both_missing(), 1);
    assert_eq!(result.success_rate(), 20.0);

    let outcomes = outcome_by_key(&result);
    assert_eq!(outcomes[&RowKey::from("r1")], Outcome::Matched);
    assert_eq!(outcomes[&RowKey::from("r2")], Outcome::MissingInTarget);
    assert_eq!(outcomes[&RowKey::from("r3")], Outcome::DataMismatch);
    assert_eq!(outcomes[&RowKey::from("r4")], Outcome::MissingInSource);
    assert_eq!(outcomes[&RowKey::from("r5")], Outcome::BothMissing);

    let r3 = result
        .details
        .iter()
        .find(|d| d.rowkey == RowKey::from("r3"))
        .unwrap();
    match &r3.details {
        RecordDetails::DataMismatch { mismatches, .. } => {
            assert_eq!(mismatches.value_differences.len(), 1);
            let diff = &mismatches.value_differences[0];
            assert_eq!(diff.column, b"c1".to_vec());
            assert_eq!(diff.source_value, b"z".to_vec());
            assert_eq!(diff.target_value, b"w".to_vec());
            assert!(mismatches.only_in_source.is_empty());
            assert!(mismatches.only_in_target.is_empty());
        }
        other => panic!("unexpected details: {other:?}"),
    }
}

#[tokio::test]
async fn test_counter_identity_with_duplicates() {
    let (source, target) = scenario_stores();
    let verifier = Verifier::new(source, target);
    let list = keys(&["r1", "r1", "r2", "r5", "r5", "r5", "r3"]);

    let result = verifier.verify_keys(&list, &NoopProgress).await.unwrap();
    let c = result.counts;

    assert_eq!(c.total, list.len() as u64);
    assert_eq!(c.matched, 2);
    assert_eq!(result.both_missing(), 3);
    assert!(
        c.matched + c.missing_in_target + c.missing_in_source + c.data_mismatch + c.error
            <= c.total
    );
}

#[tokio::test]
async fn test_empty_key_set() {
    let (source, target) = scenario_stores();
    let verifier = Verifier::new(source, target);

    let result = verifier.verify_keys(&[], &NoopProgress).await.unwrap();
    assert_eq!(result.total(), 0);
    assert_eq!(result.success_rate(), 0.0);
    assert!(result.details.is_empty());
    assert!(!result.cancelled);
}

#[tokio::test]
async fn test_idempotent_runs() {
    let (source, target) = scenario_stores();
    let verifier = Verifier::new(source, target);
    let list = keys(&["r1", "r2", "r3", "r4", "r5"]);

    let first = verifier.verify_keys(&list, &NoopProgress).await.unwrap();
    let second = verifier.verify_keys(&list, &NoopProgress).await.unwrap();
    assert_eq!(first.counts, second.counts);
    assert_eq!(outcome_by_key(&first), outcome_by_key(&second));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrency_does_not_change_counts() {
    let source = MemoryStore::new("s");
    let target = MemoryStore::new("t");
    let mut list = Vec::new();
    for i in 0..500 {
        let key = format!("k{i:04}");
        match i % 5 {
            0 => {
                source.insert(key.as_str(), row(&[("c", "1")]));
                target.insert(key.as_str(), row(&[("c", "1")]));
            }
            1 => source.insert(key.as_str(), row(&[("c", "1")])),
            2 => target.insert(key.as_str(), row(&[("c", "1")])),
            3 => {
                source.insert(key.as_str(), row(&[("c", "1")]));
                target.insert(key.as_str(), row(&[("c", "2")]));
            }
            _ => {}
        }
        list.push(RowKey::from(key));
    }
    let source: Arc<dyn RowStore> = Arc::new(source);
    let target: Arc<dyn RowStore> = Arc::new(target);

    let serial = Verifier::new(Arc::clone(&source), Arc::clone(&target))
        .with_concurrency(1)
        .verify_keys(&list, &NoopProgress)
        .await
        .unwrap();
    let parallel = Verifier::new(source, target)
        .with_concurrency(20)
        .verify_keys(&list, &NoopProgress)
        .await
        .unwrap();

    assert_eq!(serial.counts, parallel.counts);
    assert_eq!(serial.counts.total, 500);
    assert_eq!(serial.counts.matched, 100);
    assert_eq!(serial.both_missing(), 100);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrency_bound() {
    let mut inner = MemoryStore::new("s");
    let mut faulty_keys = Vec::new();
    for i in 0..40 {
        let key = format!("k{i}");
        inner = inner.with_rows([(key.as_str(), row(&[("c", "1")]))]);
        faulty_keys.push(key);
    }
    let mut source = FaultyStore::new(inner);
    for key in &faulty_keys {
        source = source.with_fault(key, Fault::Delay(Duration::from_millis(5)));
    }
    let source = Arc::new(source);
    let target: Arc<dyn RowStore> = Arc::new(MemoryStore::new("t"));

    let list: Vec<RowKey> = faulty_keys.iter().map(|k| RowKey::from(k.as_str())).collect();
    let result = Verifier::new(source.clone(), target)
        .with_concurrency(3)
        .verify_keys(&list, &NoopProgress)
        .await
        .unwrap();

    assert_eq!(result.counts.missing_in_target, 40);
    assert!(source.max_in_flight.load(Ordering::SeqCst) <= 3);
    assert_eq!(source.lookups.load(Ordering::SeqCst), 40);
}

#[tokio::test]
async fn test_fetch_failure_is_isolated() {
    let (_, target) = scenario_stores();
    let inner = MemoryStore::new("source").with_rows([
        ("r1", row(&[("c1", "x")])),
        ("r2", row(&[("c1", "y")])),
        ("r3", row(&[("c1", "z")])),
    ]);
    let source = Arc::new(FaultyStore::new(inner).with_fault("r2", Fault::Fail));
    let events = Arc::new(RecordingSink::default());

    let result = Verifier::new(source, target)
        .with_event_sink(events.clone())
        .verify_keys(&keys(&["r1", "r2", "r3", "r4", "r5"]), &NoopProgress)
        .await
        .unwrap();

    let c = result.counts;
    assert_eq!(c.total, 5);
    assert_eq!(c.error, 1);
    assert_eq!(c.matched, 1);
    assert_eq!(c.data_mismatch, 1);
    assert_eq!(c.missing_in_source, 1);
    assert_eq!(c.missing_in_target, 0);

    let outcomes = outcome_by_key(&result);
    assert_eq!(outcomes[&RowKey::from("r2")], Outcome::Error);

    let failed = events.fetch_failures();
    assert_eq!(failed.len(), 1);
    assert!(failed.contains(&RowKey::from("r2")));
    assert_eq!(
        events.count(|e| matches!(
            e,
            VerifyEvent::FetchFailed {
                side: Side::Source,
                ..
            }
        )),
        1
    );

    let r2 = result
        .details
        .iter()
        .find(|d| d.rowkey == RowKey::from("r2"))
        .unwrap();
    assert!(r2.details.message().contains("connection reset"));
}

#[tokio::test]
async fn test_target_fetch_failure_is_isolated() {
    let (source, _) = scenario_stores();
    let inner = MemoryStore::new("target").with_rows([
        ("r1", row(&[("c1", "x")])),
        ("r2", row(&[("c1", "y")])),
    ]);
    let target = Arc::new(FaultyStore::new(inner).with_fault("r2", Fault::Fail));
    let events = Arc::new(RecordingSink::default());

    let result = Verifier::new(source, target)
        .with_event_sink(events.clone())
        .verify_keys(&keys(&["r1", "r2"]), &NoopProgress)
        .await
        .unwrap();

    assert_eq!(result.total(), 2);
    assert_eq!(result.counts.matched, 1);
    assert_eq!(result.counts.error, 1);

    let outcomes = outcome_by_key(&result);
    assert_eq!(outcomes[&RowKey::from("r1")], Outcome::Matched);
    assert_eq!(outcomes[&RowKey::from("r2")], Outcome::Error);

    let failed = events.fetch_failures();
    assert_eq!(failed.len(), 1);
    assert!(failed.contains(&RowKey::from("r2")));
    assert_eq!(
        events.count(|e| matches!(
            e,
            VerifyEvent::FetchFailed {
                side: Side::Target,
                ..
            }
        )),
        1
    );
    assert_eq!(
        events.count(|e| matches!(
            e,
            VerifyEvent::FetchFailed {
                side: Side::Source,
                ..
            }
        )),
        0
    );

    let r2 = result
        .details
        .iter()
        .find(|d| d.rowkey == RowKey::from("r2"))
        .unwrap();
    assert!(r2.details.message().contains("target fetch failed"));
}

#[tokio::test]
async fn test_panic_is_isolated() {
    let (_, target) = scenario_stores();
    let inner = MemoryStore::new("source").with_rows([
        ("r1", row(&[("c1", "x")])),
        ("r3", row(&[("c1", "z")])),
    ]);
    let source = Arc::new(FaultyStore::new(inner).with_fault("r3", Fault::Panic));
    let events = Arc::new(RecordingSink::default());

    let result = Verifier::new(source, target)
        .with_event_sink(events.clone())
        .verify_keys(&keys(&["r1", "r3", "r4"]), &NoopProgress)
        .await
        .unwrap();

    assert_eq!(result.total(), 3);
    assert_eq!(result.counts.error, 1);
    assert_eq!(result.counts.matched, 1);
    assert_eq!(result.counts.missing_in_source, 1);
    assert_eq!(
        events.count(|e| matches!(e, VerifyEvent::TaskPanicked { key: Some(_), .. })),
        1
    );
}

#[tokio::test(start_paused = true)]
async fn test_fetch_timeout_maps_to_error() {
    let (_, target) = scenario_stores();
    let inner = MemoryStore::new("source").with_rows([("r1", row(&[("c1", "x")]))]);
    let source = Arc::new(FaultyStore::new(inner).with_fault("r2", Fault::Hang));

    let result = Verifier::new(source, target)
        .with_fetch_timeout(Some(Duration::from_secs(1)))
        .verify_keys(&keys(&["r1", "r2"]), &NoopProgress)
        .await
        .unwrap();

    assert_eq!(result.total(), 2);
    assert_eq!(result.counts.matched, 1);
    assert_eq!(result.counts.error, 1);
    let outcomes = outcome_by_key(&result);
    assert_eq!(outcomes[&RowKey::from("r2")], Outcome::Error);
}

#[tokio::test(start_paused = true)]
async fn test_target_fetch_timeout_maps_to_error() {
    let (source, _) = scenario_stores();
    let inner = MemoryStore::new("target").with_rows([
        ("r1", row(&[("c1", "x")])),
        ("r2", row(&[("c1", "y")])),
    ]);
    let target = Arc::new(FaultyStore::new(inner).with_fault("r2", Fault::Hang));
    let events = Arc::new(RecordingSink::default());

    let result = Verifier::new(source, target)
        .with_event_sink(events.clone())
        .with_fetch_timeout(Some(Duration::from_secs(1)))
        .verify_keys(&keys(&["r1", "r2"]), &NoopProgress)
        .await
        .unwrap();

    assert_eq!(result.total(), 2);
    assert_eq!(result.counts.matched, 1);
    assert_eq!(result.counts.error, 1);
    assert_eq!(
        events.count(|e| matches!(
            e,
            VerifyEvent::FetchFailed {
                side: Side::Target,
                ..
            }
        )),
        1
    );

    let r2 = result
        .details
        .iter()
        .find(|d| d.rowkey == RowKey::from("r2"))
        .unwrap();
    assert!(r2.details.message().contains("timed out after 1000ms"));
}

#[tokio::test]
async fn test_progress_cadence() {
    let source = MemoryStore::new("s");
    let list: Vec<RowKey> = (0..250).map(|i| RowKey::from(format!("k{i}"))).collect();
    let source: Arc<dyn RowStore> = Arc::new(source);
    let target: Arc<dyn RowStore> = Arc::new(MemoryStore::new("t"));

    let calls = Mutex::new(Vec::new());
    let progress = |completed: usize, total: usize| calls.lock().unwrap().push((completed, total));

    let result = Verifier::new(source, target)
        .with_concurrency(8)
        .with_progress_interval(100)
        .verify_keys(&list, &progress)
        .await
        .unwrap();

    assert_eq!(result.total(), 250);
    assert_eq!(calls.into_inner().unwrap(), vec![(100, 250), (200, 250)]);
}

#[tokio::test]
async fn test_detail_log_cap() {
    let (source, target) = scenario_stores();
    let list = keys(&["r1", "r2", "r3", "r4", "r5", "r1", "r2"]);

    let result = Verifier::new(source, target)
        .with_max_detail_records(3)
        .verify_keys(&list, &NoopProgress)
        .await
        .unwrap();

    assert_eq!(result.total(), 7);
    assert_eq!(result.details.len(), 3);
    assert_eq!(result.dropped_details, 4);
}

#[tokio::test]
async fn test_verify_all_scans_source() {
    let (source, target) = scenario_stores();
    let verifier = Verifier::new(source, target);

    let result = verifier.verify_all(None, &NoopProgress).await.unwrap();
    assert_eq!(result.total(), 3);
    assert_eq!(result.counts.matched, 1);
    assert_eq!(result.counts.missing_in_target, 1);
    assert_eq!(result.counts.data_mismatch, 1);

    let limited = verifier.verify_all(Some(2), &NoopProgress).await.unwrap();
    assert_eq!(limited.total(), 2);
}

#[tokio::test]
async fn test_verify_all_empty_source() {
    let source: Arc<dyn RowStore> = Arc::new(MemoryStore::new("s"));
    let target: Arc<dyn RowStore> = Arc::new(MemoryStore::new("t"));
    let events = Arc::new(RecordingSink::default());

    let result = Verifier::new(source, target)
        .with_event_sink(events.clone())
        .verify_all(None, &NoopProgress)
        .await
        .unwrap();

    assert_eq!(result.total(), 0);
    assert_eq!(events.count(|e| matches!(e, VerifyEvent::NoKeys)), 1);
}

#[tokio::test]
async fn test_scan_failure_is_fatal() {
    let source = Arc::new(FaultyStore::new(MemoryStore::new("s")).with_failing_scan());
    let target: Arc<dyn RowStore> = Arc::new(MemoryStore::new("t"));

    let err = Verifier::new(source, target)
        .verify_all(None, &NoopProgress)
        .await
        .unwrap_err();
    assert!(matches!(err, VerifyError::Scan(_)));
}

#[tokio::test]
async fn test_report_from_run() {
    let (source, target) = scenario_stores();
    let verifier = Verifier::new(source, target);
    let result = verifier
        .verify_keys(&keys(&["r1", "r2", "r3", "r4", "r5"]), &NoopProgress)
        .await
        .unwrap();

    let report = Report::assemble(&result, verifier.source(), verifier.target());
    assert_eq!(report.configuration.source.table, "source");
    assert_eq!(report.configuration.target.table, "target");
    assert_eq!(report.summary.success_rate, 20.0);
    assert_eq!(report.summary.both_missing, 1);
    assert_eq!(report.details.len(), 5);
}
