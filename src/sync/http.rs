//! HTTP implementations of the sync seams
//!
//! A thin reqwest client for the submission contract and a health-check
//! connectivity probe. Both carry their own request timeout so a dead link
//! can never hang the flow.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use super::{ConnectivityProbe, SubmissionClient, SubmitResponse};
use crate::error::{SurveyError, SurveyResult};
use crate::record::SurveyRecord;

#[derive(Serialize)]
struct SubmitRequest<'a> {
    enumerator_id: &'a str,
    record: &'a SurveyRecord,
}

pub struct HttpSubmissionClient {
    client: Client,
    submit_url: String,
}

impl HttpSubmissionClient {
    pub fn new(base_url: impl AsRef<str>, request_timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(request_timeout)
                .build()
                .unwrap_or_default(),
            submit_url: format!("{}/surveys", base_url.as_ref().trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl SubmissionClient for HttpSubmissionClient {
    async fn submit(
        &self,
        enumerator_id: &str,
        record: &SurveyRecord,
    ) -> SurveyResult<SubmitResponse> {
        debug!(url = %self.submit_url, survey_id = %record.survey_id, "submitting survey");

        let response = self
            .client
            .post(&self.submit_url)
            .json(&SubmitRequest {
                enumerator_id,
                record,
            })
            .send()
            .await
            .map_err(|e| SurveyError::DeliveryFailure(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SurveyError::DeliveryFailure(format!(
                "endpoint returned {}",
                response.status()
            )));
        }

        response
            .json::<SubmitResponse>()
            .await
            .map_err(|e| SurveyError::DeliveryFailure(e.to_string()))
    }
}

/// Probes the endpoint's health route. Any response other than a timely
/// 2xx counts as unreachable.
pub struct HttpConnectivityProbe {
    client: Client,
    health_url: String,
}

impl HttpConnectivityProbe {
    pub fn new(base_url: impl AsRef<str>, probe_timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(probe_timeout)
                .build()
                .unwrap_or_default(),
            health_url: format!("{}/health", base_url.as_ref().trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl ConnectivityProbe for HttpConnectivityProbe {
    async fn is_reachable(&self) -> bool {
        match self.client.get(&self.health_url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}
