//! Sahayak Field Survey Engine
//!
//! An offline-first capture-to-sync pipeline for welfare-scheme field
//! surveys:
//! - Identity dedup gate (12-digit format + device-local ledger)
//! - Deterministic, advisory eligibility scoring
//! - Geotag-gated photographic evidence capture
//! - Durable offline queue with a best-effort, retry-less sync client
//! - Enumerator points and streak tracking

pub mod config;
pub mod eligibility;
pub mod error;
pub mod evidence;
pub mod gamification;
pub mod identity;
pub mod orchestrator;
pub mod record;
pub mod store;
pub mod sync;
pub mod telemetry;

// Re-exports for convenience
pub use config::Config;
pub use error::{SurveyError, SurveyResult};
pub use orchestrator::{CompletionReport, SurveyOrchestrator};
pub use record::SurveyRecord;
pub use store::SqliteStore;
