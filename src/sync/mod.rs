//! Sync Client
//!
//! One best-effort delivery attempt per queued survey: no background
//! timer, no automatic retry. A failed attempt leaves the record PENDING,
//! which is the normal steady state for offline operation and is surfaced
//! to the operator as "saved locally", not as an error. The only
//! re-delivery path is the operator-triggered [`SyncClient::sweep_pending`].

mod http;

pub use http::{HttpConnectivityProbe, HttpSubmissionClient};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::error::SurveyResult;
use crate::record::SurveyRecord;
use crate::store::SurveyQueue;

/// Cheap reachability check run before an attempt.
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    async fn is_reachable(&self) -> bool;
}

/// The remote submission endpoint, consumed as an external collaborator.
/// The caller treats any non-success response or transport error
/// identically and never infers partial success.
#[async_trait]
pub trait SubmissionClient: Send + Sync {
    async fn submit(
        &self,
        enumerator_id: &str,
        record: &SurveyRecord,
    ) -> SurveyResult<SubmitResponse>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub remote_id: Option<String>,
}

/// Outcome of one delivery attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    Synced { remote_id: Option<String> },
    /// Still on the device; `reason` is for the operator and the log.
    Pending { reason: String },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SweepReport {
    pub synced: u64,
    pub still_pending: u64,
}

pub struct SyncClient {
    probe: Arc<dyn ConnectivityProbe>,
    client: Arc<dyn SubmissionClient>,
    attempt_timeout: Duration,
}

impl SyncClient {
    pub fn new(
        probe: Arc<dyn ConnectivityProbe>,
        client: Arc<dyn SubmissionClient>,
        attempt_timeout: Duration,
    ) -> Self {
        Self {
            probe,
            client,
            attempt_timeout,
        }
    }

    /// One best-effort attempt under a bounded timeout. Every failure mode
    /// maps to `Pending`; a timeout is a delivery failure, not an
    /// indeterminate state.
    pub async fn deliver(&self, enumerator_id: &str, record: &SurveyRecord) -> SyncOutcome {
        if !self.probe.is_reachable().await {
            debug!(survey_id = %record.survey_id, "device offline, keeping record local");
            return SyncOutcome::Pending {
                reason: "device offline".to_string(),
            };
        }

        match timeout(self.attempt_timeout, self.client.submit(enumerator_id, record)).await {
            Ok(Ok(response)) if response.success => {
                info!(
                    survey_id = %record.survey_id,
                    remote_id = ?response.remote_id,
                    "survey delivered"
                );
                SyncOutcome::Synced {
                    remote_id: response.remote_id,
                }
            }
            Ok(Ok(_)) => {
                warn!(survey_id = %record.survey_id, "endpoint rejected submission");
                SyncOutcome::Pending {
                    reason: "endpoint rejected submission".to_string(),
                }
            }
            Ok(Err(err)) => {
                warn!(survey_id = %record.survey_id, %err, "delivery failed");
                SyncOutcome::Pending {
                    reason: err.to_string(),
                }
            }
            Err(_) => {
                warn!(survey_id = %record.survey_id, "delivery timed out");
                SyncOutcome::Pending {
                    reason: "delivery timed out".to_string(),
                }
            }
        }
    }

    /// Operator-triggered pass over every PENDING record: one attempt
    /// each, same retry-less contract as the enqueue-time attempt.
    pub async fn sweep_pending(
        &self,
        enumerator_id: &str,
        queue: &dyn SurveyQueue,
    ) -> SurveyResult<SweepReport> {
        let pending = queue.pending().await?;
        info!(count = pending.len(), "sweeping pending surveys");

        let mut report = SweepReport::default();
        for record in &pending {
            match self.deliver(enumerator_id, record).await {
                SyncOutcome::Synced { .. } => {
                    queue.mark_synced(&record.survey_id).await?;
                    report.synced += 1;
                }
                SyncOutcome::Pending { .. } => report.still_pending += 1,
            }
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eligibility::Verdict;
    use crate::record::{
        mask_identity, Beneficiary, Evidence, Financials, GeoPoint, PhotoReference, SyncStatus,
    };
    use chrono::Utc;
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct StaticProbe(bool);

    #[async_trait]
    impl ConnectivityProbe for StaticProbe {
        async fn is_reachable(&self) -> bool {
            self.0
        }
    }

    struct MockSubmission {
        succeed: bool,
        calls: AtomicU32,
    }

    impl MockSubmission {
        fn new(succeed: bool) -> Self {
            Self {
                succeed,
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl SubmissionClient for MockSubmission {
        async fn submit(
            &self,
            _enumerator_id: &str,
            _record: &SurveyRecord,
        ) -> SurveyResult<SubmitResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(SubmitResponse {
                success: self.succeed,
                remote_id: self.succeed.then(|| "survey-remote-1".to_string()),
            })
        }
    }

    struct StalledSubmission;

    #[async_trait]
    impl SubmissionClient for StalledSubmission {
        async fn submit(
            &self,
            _enumerator_id: &str,
            _record: &SurveyRecord,
        ) -> SurveyResult<SubmitResponse> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            unreachable!("the attempt timeout fires first");
        }
    }

    fn record() -> SurveyRecord {
        SurveyRecord {
            survey_id: "s-1".to_string(),
            beneficiary: Beneficiary {
                display_identity: mask_identity("123456789012"),
                display_name: "Sunita Devi".to_string(),
                phone: "9876543210".to_string(),
                identity_verified: true,
            },
            financials: Financials {
                annual_income: 30_000.0,
                caste_category: Some(crate::record::CasteCategory::Sc),
                occupation: String::new(),
                skills: BTreeSet::new(),
                assets: BTreeSet::new(),
                bank_account: String::new(),
                bank_verified: None,
            },
            evidence: Evidence {
                photo_reference: PhotoReference::new("photos/p1.png"),
                location: GeoPoint { lat: 25.59, lng: 85.13 },
            },
            eligibility_verdict: Verdict::HighPriority,
            sync_status: SyncStatus::Pending,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn offline_probe_skips_the_attempt() {
        let submission = Arc::new(MockSubmission::new(true));
        let client = SyncClient::new(
            Arc::new(StaticProbe(false)),
            submission.clone(),
            Duration::from_secs(5),
        );

        let outcome = client.deliver("enumerator-001", &record()).await;
        assert!(matches!(outcome, SyncOutcome::Pending { .. }));
        assert_eq!(submission.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn reachable_and_accepted_is_synced() {
        let client = SyncClient::new(
            Arc::new(StaticProbe(true)),
            Arc::new(MockSubmission::new(true)),
            Duration::from_secs(5),
        );

        let outcome = client.deliver("enumerator-001", &record()).await;
        assert_eq!(
            outcome,
            SyncOutcome::Synced {
                remote_id: Some("survey-remote-1".to_string())
            }
        );
    }

    #[tokio::test]
    async fn non_success_response_stays_pending() {
        let client = SyncClient::new(
            Arc::new(StaticProbe(true)),
            Arc::new(MockSubmission::new(false)),
            Duration::from_secs(5),
        );

        let outcome = client.deliver("enumerator-001", &record()).await;
        assert!(matches!(outcome, SyncOutcome::Pending { .. }));
    }

    #[tokio::test]
    async fn stalled_endpoint_times_out_to_pending() {
        let client = SyncClient::new(
            Arc::new(StaticProbe(true)),
            Arc::new(StalledSubmission),
            Duration::from_millis(100),
        );

        let outcome = client.deliver("enumerator-001", &record()).await;
        assert!(matches!(outcome, SyncOutcome::Pending { .. }));
    }
}
