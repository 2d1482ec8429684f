//! Record reconciliation
//!
//! The Reconciler is responsible for:
//! - Reading the current values of each configured record set
//! - Matching them against the target values into a [`ChangePlan`]
//! - Applying the plan through a RecordProvider, with retries
//! - Reporting progress as events
//!
//! ## Flow
//!
//! ```text
//! ┌────────────────┐   list_values   ┌──────────────┐
//! │ RecordProvider │ ──────────────▶ │  Reconciler  │
//! └────────────────┘                 └──────────────┘
//!         ▲                                  │
//!         │ create / replace / delete        │ match_records
//!         │                                  ▼
//!         │                          ┌──────────────┐      ┌──────────┐
//!         └───────────────────────── │  ChangePlan  │ ───▶ │  Events  │
//!                                    └──────────────┘      └──────────┘
//! ```
//!
//! One record failing does not stop the others; its errors end up in the
//! [`ReconcileReport`].

pub mod plan;

pub use plan::{ChangePlan, PlanSummary, RecordChange};

use crate::config::{RecordConfig, RecordKey, ReconcileConfig};
use crate::error::{Error, Result};
use crate::traits::RecordProvider;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Events emitted by the Reconciler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileEvent {
    /// Reconciliation pass started
    Started { records_count: usize },

    /// Plan computed for a record set
    PlanComputed {
        record: RecordKey,
        summary: PlanSummary,
    },

    /// A change was applied
    ChangeApplied {
        record: RecordKey,
        change: RecordChange,
    },

    /// A change failed after all retries
    ChangeFailed {
        record: RecordKey,
        change: RecordChange,
        error: String,
        retry_count: usize,
    },

    /// Record skipped (disabled, unsupported or already correct)
    RecordSkipped { record: RecordKey, reason: String },

    /// Reconciliation pass finished
    Finished { applied: usize, failed: usize },
}

/// Outcome of reconciling one record set
#[derive(Debug, Clone)]
pub struct RecordOutcome {
    /// The plan that was computed (empty when the record was skipped)
    pub plan: Option<ChangePlan>,
    /// The record set
    pub record: RecordKey,
    /// Number of changes applied
    pub applied: usize,
    /// Error messages for changes or reads that failed
    pub errors: Vec<String>,
}

impl RecordOutcome {
    fn skipped(record: RecordKey) -> Self {
        Self {
            plan: None,
            record,
            applied: 0,
            errors: Vec::new(),
        }
    }

    /// True when nothing failed for this record
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Result of a reconciliation pass
#[derive(Debug, Clone, Default)]
pub struct ReconcileReport {
    /// One outcome per configured record, in configuration order
    pub outcomes: Vec<RecordOutcome>,
}

impl ReconcileReport {
    /// Total number of changes applied
    pub fn applied(&self) -> usize {
        self.outcomes.iter().map(|outcome| outcome.applied).sum()
    }

    /// Total number of failures
    pub fn failed(&self) -> usize {
        self.outcomes.iter().map(|outcome| outcome.errors.len()).sum()
    }

    /// True when every record reconciled without errors
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(RecordOutcome::is_success)
    }
}

/// Record reconciler
///
/// Drives a [`RecordProvider`] until every enabled, supported record set
/// holds exactly its target values.
///
/// ## Lifecycle
///
/// 1. Create with [`Reconciler::new()`]
/// 2. Inspect plans with [`Reconciler::plan()`] or apply them with
///    [`Reconciler::reconcile_all()`]
/// 3. Consume events from the returned receiver
pub struct Reconciler {
    /// Provider holding the record sets
    provider: Box<dyn RecordProvider>,

    /// Records to reconcile
    records: Vec<RecordConfig>,

    /// Maximum retry attempts per change
    max_retries: usize,

    /// Delay between retries
    retry_delay: Duration,

    /// Compute plans without applying them
    dry_run: bool,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<ReconcileEvent>,
}

impl Reconciler {
    /// Create a new reconciler
    ///
    /// Returns the reconciler and a receiver yielding its events.
    pub fn new(
        provider: Box<dyn RecordProvider>,
        config: ReconcileConfig,
    ) -> Result<(Self, mpsc::Receiver<ReconcileEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.engine.event_channel_capacity);

        let reconciler = Self {
            provider,
            records: config.records,
            max_retries: config.engine.max_retries,
            retry_delay: Duration::from_millis(config.engine.retry_delay_ms),
            dry_run: config.engine.dry_run,
            event_tx: tx,
        };

        Ok((reconciler, rx))
    }

    /// The configured records
    pub fn records(&self) -> &[RecordConfig] {
        &self.records
    }

    /// Why a record will not be reconciled, if it won't be
    pub fn skip_reason(&self, record: &RecordConfig) -> Option<&'static str> {
        if !record.enabled {
            Some("disabled")
        } else if !self.provider.supports_record(&record.key()) {
            Some("unsupported by provider")
        } else {
            None
        }
    }

    /// Compute the change plan for one configured record
    pub async fn plan(&self, record: &RecordConfig) -> Result<ChangePlan> {
        let key = record.key();
        let current = self
            .provider
            .list_values(&key)
            .await
            .map_err(|e| Error::provider(self.provider.provider_name(), e.to_string()))?;

        let plan = ChangePlan::build(key, &current, &record.target);
        debug!("Plan for {}: {}", plan.record, plan.summary());
        Ok(plan)
    }

    /// Reconcile every enabled record
    ///
    /// Errors for individual records are collected in the report rather
    /// than returned.
    pub async fn reconcile_all(&self) -> ReconcileReport {
        self.emit_event(ReconcileEvent::Started {
            records_count: self.records.len(),
        });

        let mut report = ReconcileReport::default();
        for record in &self.records {
            report.outcomes.push(self.reconcile_record(record).await);
        }

        info!(
            "Reconciliation finished: {} change(s) applied, {} failure(s)",
            report.applied(),
            report.failed()
        );
        self.emit_event(ReconcileEvent::Finished {
            applied: report.applied(),
            failed: report.failed(),
        });

        report
    }

    /// Reconcile a single record
    async fn reconcile_record(&self, record: &RecordConfig) -> RecordOutcome {
        let key = record.key();

        if let Some(reason) = self.skip_reason(record) {
            if record.enabled {
                warn!(
                    "Provider {} does not support record {}",
                    self.provider.provider_name(),
                    key
                );
            } else {
                debug!("Record {} is disabled, skipping", key);
            }
            self.skip(&key, reason);
            return RecordOutcome::skipped(key);
        }

        let plan = match self.plan(record).await {
            Ok(plan) => plan,
            Err(e) => {
                error!("Failed to read record {}: {}", key, e);
                let mut outcome = RecordOutcome::skipped(key);
                outcome.errors.push(e.to_string());
                return outcome;
            }
        };

        self.emit_event(ReconcileEvent::PlanComputed {
            record: key.clone(),
            summary: plan.summary(),
        });

        let mut outcome = RecordOutcome {
            plan: None,
            record: key.clone(),
            applied: 0,
            errors: Vec::new(),
        };

        if plan.is_noop() {
            debug!("Record {} already matches its target", key);
            self.skip(&key, "already up to date");
        } else if self.dry_run {
            info!("Dry run: {} would change ({})", key, plan.summary());
            self.skip(&key, "dry run");
        } else {
            for change in plan.changes.iter().filter(|change| change.is_mutation()) {
                match self.apply_with_retry(&key, change).await {
                    Ok(()) => outcome.applied += 1,
                    Err(e) => {
                        error!("Failed to {} on {}: {}", change, key, e);
                        outcome.errors.push(e.to_string());
                    }
                }
            }
        }

        outcome.plan = Some(plan);
        outcome
    }

    /// Apply one change, retrying on failure
    async fn apply_with_retry(&self, record: &RecordKey, change: &RecordChange) -> Result<()> {
        let mut last_error = None;
        for attempt in 0..=self.max_retries {
            match self.apply(record, change).await {
                Ok(()) => {
                    info!("Applied on {}: {}", record, change);
                    self.emit_event(ReconcileEvent::ChangeApplied {
                        record: record.clone(),
                        change: change.clone(),
                    });
                    return Ok(());
                }
                Err(e) => {
                    warn!("Attempt {} to {} on {} failed: {}", attempt, change, record, e);
                    last_error = Some(e);

                    if attempt < self.max_retries {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
            }
        }

        let error = last_error.unwrap_or_else(|| Error::Other("Unknown error".to_string()));
        self.emit_event(ReconcileEvent::ChangeFailed {
            record: record.clone(),
            change: change.clone(),
            error: error.to_string(),
            retry_count: self.max_retries,
        });
        Err(error)
    }

    /// Perform a single provider call
    async fn apply(&self, record: &RecordKey, change: &RecordChange) -> Result<()> {
        let result = match change {
            RecordChange::Keep(_) => Ok(()),
            RecordChange::Replace { from, to } => {
                self.provider.replace_value(record, from, to).await
            }
            RecordChange::Add(value) => self.provider.create_value(record, value).await,
            RecordChange::Remove(value) => self.provider.delete_value(record, value).await,
        };

        result.map_err(|e| Error::provider(self.provider.provider_name(), e.to_string()))
    }

    fn skip(&self, record: &RecordKey, reason: &str) {
        self.emit_event(ReconcileEvent::RecordSkipped {
            record: record.clone(),
            reason: reason.to_string(),
        });
    }

    /// Emit a reconciler event
    fn emit_event(&self, event: ReconcileEvent) {
        // Never block on a slow consumer; drop the event instead
        if self.event_tx.try_send(event).is_err() {
            warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RecordType;
    use crate::provider::MemoryRecordProvider;

    fn config(record: RecordConfig) -> ReconcileConfig {
        let mut config = ReconcileConfig::new().with_record(record);
        config.engine.retry_delay_ms = 0;
        config
    }

    #[tokio::test]
    async fn test_plan_reads_provider_values() {
        let provider = MemoryRecordProvider::new();
        let key = RecordKey::new("example.com", RecordType::A);
        provider.set_values(&key, ["192.0.78.24", "185.230.63.186"]).await;

        let record = RecordConfig::new("example.com", RecordType::A)
            .with_target(["192.0.78.24", "192.0.78.25"]);
        let (reconciler, _rx) = Reconciler::new(Box::new(provider), config(record.clone())).unwrap();

        let plan = reconciler.plan(&record).await.unwrap();
        assert_eq!(plan.summary().keep, 1);
        assert_eq!(plan.summary().replace, 1);
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let result = Reconciler::new(Box::new(MemoryRecordProvider::new()), ReconcileConfig::new());
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_skip_reason() {
        let enabled = RecordConfig::new("example.com", RecordType::A).with_target(["192.0.78.24"]);
        let disabled = enabled.clone().with_enabled(false);
        let (reconciler, _rx) =
            Reconciler::new(Box::new(MemoryRecordProvider::new()), config(enabled.clone())).unwrap();

        assert_eq!(reconciler.skip_reason(&enabled), None);
        assert_eq!(reconciler.skip_reason(&disabled), Some("disabled"));
    }

    #[tokio::test]
    async fn test_disabled_record_is_skipped() {
        let record = RecordConfig::new("example.com", RecordType::A)
            .with_target(["192.0.78.24"])
            .with_enabled(false);
        let (reconciler, mut rx) =
            Reconciler::new(Box::new(MemoryRecordProvider::new()), config(record)).unwrap();

        let report = reconciler.reconcile_all().await;
        assert_eq!(report.applied(), 0);
        assert!(report.outcomes[0].plan.is_none());

        assert!(matches!(rx.recv().await, Some(ReconcileEvent::Started { records_count: 1 })));
        assert!(matches!(
            rx.recv().await,
            Some(ReconcileEvent::RecordSkipped { ref reason, .. }) if reason == "disabled"
        ));
    }
}
