//! Survey record and wire types
//!
//! `SurveyRecord` is the unit of work handed from the orchestrator to the
//! durable queue. The full identity number is never a field of the record:
//! `Beneficiary::display_identity` is produced by [`mask_identity`] before
//! the record exists, so nothing downstream of the gate can leak it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::eligibility::Verdict;

/// Caste category options offered on the survey form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CasteCategory {
    #[serde(rename = "SC")]
    Sc,
    #[serde(rename = "ST")]
    St,
    #[serde(rename = "OBC")]
    Obc,
    #[serde(rename = "General")]
    General,
}

impl CasteCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            CasteCategory::Sc => "SC",
            CasteCategory::St => "ST",
            CasteCategory::Obc => "OBC",
            CasteCategory::General => "General",
        }
    }
}

/// Delivery lifecycle of a persisted record. `ERROR` is part of the wire
/// contract but the base pipeline only ever writes `PENDING` and `SYNCED`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncStatus {
    Pending,
    Synced,
    Error,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Pending => "PENDING",
            SyncStatus::Synced => "SYNCED",
            SyncStatus::Error => "ERROR",
        }
    }
}

impl From<&str> for SyncStatus {
    fn from(s: &str) -> Self {
        match s {
            "SYNCED" => SyncStatus::Synced,
            "ERROR" => SyncStatus::Error,
            _ => SyncStatus::Pending,
        }
    }
}

/// Opaque handle to a captured photo (a file path or platform URI).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhotoReference(String);

impl PhotoReference {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// Geotagged proof of in-person capture. A `location` always exists here:
/// the capturer refuses to confirm a photo without one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub photo_reference: PhotoReference,
    pub location: GeoPoint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Beneficiary {
    /// Masked form only (`"XXXX-XXXX-" + last4`); see [`mask_identity`].
    pub display_identity: String,
    pub display_name: String,
    pub phone: String,
    pub identity_verified: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Financials {
    pub annual_income: f64,
    pub caste_category: Option<CasteCategory>,
    pub occupation: String,
    pub skills: BTreeSet<String>,
    pub assets: BTreeSet<String>,
    pub bank_account: String,
    /// `None` until the penny-drop check has run.
    pub bank_verified: Option<bool>,
}

/// The persisted unit of work. Immutable once enqueued, except for the
/// one-way `sync_status` flip owned by the queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyRecord {
    pub survey_id: String,
    pub beneficiary: Beneficiary,
    pub financials: Financials,
    pub evidence: Evidence,
    pub eligibility_verdict: Verdict,
    pub sync_status: SyncStatus,
    pub created_at: DateTime<Utc>,
}

/// Irreversibly mask an identity number, retaining the last four digits.
pub fn mask_identity(full: &str) -> String {
    let mut start = full.len().saturating_sub(4);
    while !full.is_char_boundary(start) {
        start -= 1;
    }
    format!("XXXX-XXXX-{}", &full[start..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_keeps_only_last_four() {
        assert_eq!(mask_identity("123456789012"), "XXXX-XXXX-9012");
        assert!(!mask_identity("123456789012").contains("12345678"));
    }

    #[test]
    fn sync_status_round_trips_through_text() {
        for status in [SyncStatus::Pending, SyncStatus::Synced, SyncStatus::Error] {
            assert_eq!(SyncStatus::from(status.as_str()), status);
        }
        // Unknown text degrades to Pending, never to a false Synced.
        assert_eq!(SyncStatus::from("garbage"), SyncStatus::Pending);
    }

    #[test]
    fn verdict_and_status_use_upstream_wire_casing() {
        assert_eq!(
            serde_json::to_string(&SyncStatus::Pending).unwrap(),
            "\"PENDING\""
        );
        assert_eq!(
            serde_json::to_string(&CasteCategory::General).unwrap(),
            "\"General\""
        );
    }
}
