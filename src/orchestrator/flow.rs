//! Flow interpreter
//!
//! Owns the in-flight draft across the four stages; the queue owns
//! everything persisted. Stages are awaited strictly in order, never
//! concurrently for the same survey.

use chrono::{Local, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use super::stage::{advance, Stage, StageEvent};
use crate::config::Config;
use crate::eligibility::{self, Assessment};
use crate::error::{SurveyError, SurveyResult};
use crate::evidence::{CameraProvider, EvidenceCapturer, LocationProvider};
use crate::gamification::{EnumeratorStats, Tracker, POINTS_PER_SURVEY};
use crate::identity::{IdentityGate, VerifiedIdentity};
use crate::record::{mask_identity, Beneficiary, Evidence, Financials, SurveyRecord, SyncStatus};
use crate::store::{IdentityLedger, SqliteStore, StatsRepository, SurveyQueue};
use crate::sync::{HttpConnectivityProbe, HttpSubmissionClient, SyncClient, SyncOutcome};

const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// What the operator sees on the completion screen.
#[derive(Debug, Clone)]
pub struct CompletionReport {
    pub survey_id: String,
    pub queue_position: u64,
    pub assessment: Assessment,
    pub sync_status: SyncStatus,
    /// "Uploaded" vs "saved locally"; a PENDING outcome is not an error.
    pub status_line: String,
    pub remote_id: Option<String>,
    pub points_awarded: u64,
    pub stats: Option<EnumeratorStats>,
}

struct Draft {
    identity: VerifiedIdentity,
    financials: Option<Financials>,
    assessment: Option<Assessment>,
}

pub struct SurveyOrchestrator {
    gate: IdentityGate,
    queue: Arc<dyn SurveyQueue>,
    tracker: Tracker,
    sync: SyncClient,
    location: Arc<dyn LocationProvider>,
    camera: Arc<dyn CameraProvider>,
    enumerator_id: String,
    stage: Stage,
    draft: Option<Draft>,
}

impl SurveyOrchestrator {
    pub fn new(
        queue: Arc<dyn SurveyQueue>,
        ledger: Arc<dyn IdentityLedger>,
        stats: Arc<dyn StatsRepository>,
        sync: SyncClient,
        location: Arc<dyn LocationProvider>,
        camera: Arc<dyn CameraProvider>,
        enumerator_id: impl Into<String>,
    ) -> Self {
        Self {
            gate: IdentityGate::new(ledger),
            queue,
            tracker: Tracker::new(stats),
            sync,
            location,
            camera,
            enumerator_id: enumerator_id.into(),
            stage: Stage::Identity,
            draft: None,
        }
    }

    /// Wire the production stack: SQLite store plus HTTP sync, from config.
    pub async fn bootstrap(
        config: &Config,
        location: Arc<dyn LocationProvider>,
        camera: Arc<dyn CameraProvider>,
    ) -> SurveyResult<Self> {
        let store = Arc::new(SqliteStore::open(config.db_path()).await?);
        let probe = Arc::new(HttpConnectivityProbe::new(&config.api_base, PROBE_TIMEOUT));
        let client = Arc::new(HttpSubmissionClient::new(
            &config.api_base,
            config.submit_timeout,
        ));
        let sync = SyncClient::new(probe, client, config.submit_timeout);

        Ok(Self::new(
            store.clone(),
            store.clone(),
            store,
            sync,
            location,
            camera,
            config.enumerator_id.clone(),
        ))
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// The advisory assessment from the form stage, once computed.
    pub fn assessment(&self) -> Option<&Assessment> {
        self.draft.as_ref().and_then(|d| d.assessment.as_ref())
    }

    /// Reset for a fresh survey.
    pub fn begin_survey(&mut self) {
        self.stage = Stage::Identity;
        self.draft = None;
    }

    /// Abandon the in-flight survey. Nothing is persisted; a dedup slot
    /// claimed at the gate stays consumed.
    pub fn abandon(&mut self) {
        if self.draft.take().is_some() {
            info!("survey abandoned mid-flow, dedup slot stays consumed");
        }
        self.stage = Stage::Identity;
    }

    fn ensure_stage(&self, expected: Stage) -> SurveyResult<()> {
        if self.stage == expected {
            Ok(())
        } else {
            Err(SurveyError::StageMismatch {
                expected: expected.name(),
                actual: self.stage.name(),
            })
        }
    }

    /// Stage 1: validate the identity and claim its dedup slot.
    pub async fn submit_identity(
        &mut self,
        raw_identity: &str,
        display_name: &str,
        phone: &str,
    ) -> SurveyResult<()> {
        self.ensure_stage(Stage::Identity)?;

        let identity = self.gate.verify(raw_identity, display_name, phone).await?;
        self.draft = Some(Draft {
            identity,
            financials: None,
            assessment: None,
        });
        self.stage = advance(self.stage, StageEvent::IdentityAccepted)?;
        Ok(())
    }

    /// Stage 2: record the socio-economic form and return the advisory
    /// verdict. The verdict never blocks the flow.
    pub fn submit_form(&mut self, financials: Financials) -> SurveyResult<Assessment> {
        self.ensure_stage(Stage::Form)?;
        let Some(draft) = self.draft.as_mut() else {
            return Err(SurveyError::StageMismatch {
                expected: Stage::Identity.name(),
                actual: self.stage.name(),
            });
        };

        let assessment = eligibility::score_financials(&financials);
        draft.financials = Some(financials);
        draft.assessment = Some(assessment.clone());
        self.stage = advance(self.stage, StageEvent::FormSubmitted)?;
        Ok(assessment)
    }

    /// Stage 3, one-shot: one location fix, one shot, confirm. UIs that
    /// need the retake loop drive an [`EvidenceCapturer`] themselves and
    /// hand the confirmed payload to [`Self::complete`].
    pub async fn capture_evidence(&mut self) -> SurveyResult<Evidence> {
        self.ensure_stage(Stage::Evidence)?;

        let mut capturer = EvidenceCapturer::new(self.location.clone(), self.camera.clone());
        capturer.acquire_location().await?;
        capturer.capture().await?;
        capturer.confirm()
    }

    /// Stage 4: persist, then best-effort sync, then award points.
    ///
    /// Once confirmed evidence reaches this method the record goes to the
    /// durable queue unconditionally; no sync or gamification failure can
    /// prevent persistence.
    pub async fn complete(&mut self, evidence: Evidence) -> SurveyResult<CompletionReport> {
        self.ensure_stage(Stage::Evidence)?;
        let Some(draft) = self.draft.as_ref() else {
            return Err(SurveyError::StageMismatch {
                expected: Stage::Identity.name(),
                actual: self.stage.name(),
            });
        };
        let Some(financials) = draft.financials.clone() else {
            return Err(SurveyError::StageMismatch {
                expected: Stage::Form.name(),
                actual: self.stage.name(),
            });
        };
        let assessment = draft
            .assessment
            .clone()
            .unwrap_or_else(|| eligibility::score_financials(&financials));

        let record = SurveyRecord {
            survey_id: Uuid::new_v4().to_string(),
            beneficiary: Beneficiary {
                display_identity: mask_identity(draft.identity.full_number()),
                display_name: draft.identity.display_name.clone(),
                phone: draft.identity.phone.clone(),
                identity_verified: draft.identity.identity_verified,
            },
            financials,
            evidence,
            eligibility_verdict: assessment.verdict,
            sync_status: SyncStatus::Pending,
            created_at: Utc::now(),
        };

        let queue_position = self.queue.enqueue(&record).await?;
        self.stage = advance(self.stage, StageEvent::EvidenceConfirmed)?;
        self.draft = None;

        let outcome = self.sync.deliver(&self.enumerator_id, &record).await;
        let (sync_status, status_line, remote_id) = match outcome {
            SyncOutcome::Synced { remote_id } => {
                if let Err(err) = self.queue.mark_synced(&record.survey_id).await {
                    // Delivered but the local flip failed; the record is
                    // safe either way, so report what the store says.
                    warn!(%err, survey_id = %record.survey_id, "failed to mark record synced");
                    (
                        SyncStatus::Pending,
                        "Saved locally on device".to_string(),
                        remote_id,
                    )
                } else {
                    (
                        SyncStatus::Synced,
                        "Uploaded to central authority".to_string(),
                        remote_id,
                    )
                }
            }
            SyncOutcome::Pending { reason } => {
                info!(survey_id = %record.survey_id, %reason, "survey saved locally");
                (SyncStatus::Pending, "Saved locally on device".to_string(), None)
            }
        };

        let stats = self.tracker.record_survey(Local::now().date_naive()).await;

        Ok(CompletionReport {
            survey_id: record.survey_id,
            queue_position,
            assessment,
            sync_status,
            status_line,
            remote_id,
            points_awarded: POINTS_PER_SURVEY,
            stats,
        })
    }
}
