//! Contract Test: Reconciliation Reaches the Target
//!
//! Constraints verified:
//! - Applying a plan leaves the record set holding exactly its target values
//! - Replacements keep the position of the value they replace
//! - A second pass over a reconciled record changes nothing
//! - Dry runs compute plans without touching the provider

mod common;

use common::*;
use dashkit_core::config::{RecordConfig, RecordKey, RecordType};
use dashkit_core::provider::MemoryRecordProvider;
use dashkit_core::reconcile::{PlanSummary, ReconcileEvent, RecordChange};
use dashkit_core::traits::RecordProvider;
use dashkit_core::Reconciler;

#[tokio::test]
async fn nameservers_are_replaced_in_place() {
    let memory = MemoryRecordProvider::new();
    memory
        .set_values(
            &ns_key(),
            ["ns1.other.com", "ns2.wordpress.com", "ns3.other.com"],
        )
        .await;

    let (reconciler, mut events) = Reconciler::new(
        Box::new(FlakyProvider::reliable(memory.clone())),
        fast_config(vec![wpcom_nameservers()], 0),
    )
    .expect("reconciler construction succeeds");

    let report = reconciler.reconcile_all().await;

    assert!(report.is_success());
    assert_eq!(report.applied(), 2);
    assert_eq!(
        memory.list_values(&ns_key()).await.unwrap(),
        vec!["ns1.wordpress.com", "ns2.wordpress.com", "ns3.wordpress.com"]
    );

    assert_eq!(
        events.recv().await,
        Some(ReconcileEvent::Started { records_count: 1 })
    );
    assert_eq!(
        events.recv().await,
        Some(ReconcileEvent::PlanComputed {
            record: ns_key(),
            summary: PlanSummary {
                keep: 1,
                replace: 2,
                add: 0,
                remove: 0
            },
        })
    );
    assert_eq!(
        events.recv().await,
        Some(ReconcileEvent::ChangeApplied {
            record: ns_key(),
            change: RecordChange::Replace {
                from: "ns1.other.com".to_string(),
                to: "ns1.wordpress.com".to_string(),
            },
        })
    );
}

#[tokio::test]
async fn second_pass_is_a_noop() {
    let memory = MemoryRecordProvider::new();
    memory.set_values(&ns_key(), ["ns9.other.com"]).await;

    let provider = FlakyProvider::reliable(memory.clone());
    let (reconciler, _events) = Reconciler::new(
        Box::new(FlakyProvider::sharing_counters_with(&provider)),
        fast_config(vec![wpcom_nameservers()], 0),
    )
    .expect("reconciler construction succeeds");

    let first = reconciler.reconcile_all().await;
    assert_eq!(first.applied(), 3);
    let calls_after_first = provider.mutation_calls();

    let second = reconciler.reconcile_all().await;
    assert_eq!(second.applied(), 0);
    assert!(second.outcomes[0].plan.as_ref().unwrap().is_noop());
    assert_eq!(provider.mutation_calls(), calls_after_first);
}

#[tokio::test]
async fn surplus_addresses_are_removed() {
    let key = RecordKey::new("example.com", RecordType::A);
    let memory = MemoryRecordProvider::new();
    memory
        .set_values(&key, ["185.230.63.186", "185.230.63.107", "185.230.63.171"])
        .await;

    let record = RecordConfig::new("example.com", RecordType::A)
        .with_target(["192.0.78.24", "192.0.78.25"]);
    let (reconciler, _events) = Reconciler::new(
        Box::new(FlakyProvider::reliable(memory.clone())),
        fast_config(vec![record], 0),
    )
    .expect("reconciler construction succeeds");

    let report = reconciler.reconcile_all().await;

    assert_eq!(report.applied(), 3);
    let summary = report.outcomes[0].plan.as_ref().unwrap().summary();
    assert_eq!((summary.replace, summary.remove), (2, 1));
    assert_eq!(
        memory.list_values(&key).await.unwrap(),
        vec!["192.0.78.24", "192.0.78.25"]
    );
}

#[tokio::test]
async fn missing_record_set_is_created() {
    let memory = MemoryRecordProvider::new();

    let (reconciler, _events) = Reconciler::new(
        Box::new(FlakyProvider::reliable(memory.clone())),
        fast_config(vec![wpcom_nameservers()], 0),
    )
    .expect("reconciler construction succeeds");

    let report = reconciler.reconcile_all().await;

    assert_eq!(report.outcomes[0].plan.as_ref().unwrap().summary().add, 3);
    assert_eq!(
        memory.list_values(&ns_key()).await.unwrap(),
        vec!["ns1.wordpress.com", "ns2.wordpress.com", "ns3.wordpress.com"]
    );
}

#[tokio::test]
async fn dry_run_leaves_provider_untouched() {
    let memory = MemoryRecordProvider::new();
    memory.set_values(&ns_key(), ["ns1.other.com"]).await;

    let provider = FlakyProvider::reliable(memory.clone());
    let mut config = fast_config(vec![wpcom_nameservers()], 0);
    config.engine.dry_run = true;

    let (reconciler, _events) = Reconciler::new(
        Box::new(FlakyProvider::sharing_counters_with(&provider)),
        config,
    )
    .expect("reconciler construction succeeds");

    let report = reconciler.reconcile_all().await;

    assert_eq!(report.applied(), 0);
    assert_eq!(provider.mutation_calls(), 0);
    assert_eq!(
        report.outcomes[0].plan.as_ref().unwrap().summary().mutations(),
        3
    );
    assert_eq!(
        memory.list_values(&ns_key()).await.unwrap(),
        vec!["ns1.other.com"]
    );
}

#[tokio::test]
async fn duplicate_values_are_removed() {
    let key = RecordKey::new("example.com", RecordType::A);
    let memory = MemoryRecordProvider::new();
    memory.set_values(&key, ["192.0.78.24", "192.0.78.24"]).await;

    let record = RecordConfig::new("example.com", RecordType::A).with_target(["192.0.78.24"]);
    let (reconciler, _events) = Reconciler::new(
        Box::new(FlakyProvider::reliable(memory.clone())),
        fast_config(vec![record], 0),
    )
    .expect("reconciler construction succeeds");

    let report = reconciler.reconcile_all().await;

    assert!(report.is_success());
    assert_eq!(report.applied(), 1);
    assert_eq!(memory.list_values(&key).await.unwrap(), vec!["192.0.78.24"]);

    let second = reconciler.reconcile_all().await;
    assert_eq!(second.applied(), 0);
}
