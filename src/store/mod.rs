//! Durable device-local storage
//!
//! One SQLite database, three tables mirroring the device's persisted
//! state: `pending_surveys` (masked records), `surveyed_identities`
//! (unmasked dedup index), `enumerator_stats` (singleton counters). Access
//! goes through narrow repository traits so every flow is testable against
//! in-memory fakes.
//!
//! The dedup index keeps unmasked numbers with no expiry. Whether it needs
//! the same retention policy as the masked records is a product decision
//! this layer deliberately does not make.

mod sqlite;

pub use sqlite::SqliteStore;

use async_trait::async_trait;

use crate::error::SurveyResult;
use crate::gamification::EnumeratorStats;
use crate::record::{SurveyRecord, SyncStatus};

/// Append-only queue of completed surveys, write-before-acknowledge: when
/// `enqueue` returns, the record survives process death.
#[async_trait]
pub trait SurveyQueue: Send + Sync {
    /// Durably persist `record` and return its position in the queue.
    async fn enqueue(&self, record: &SurveyRecord) -> SurveyResult<u64>;

    /// Every persisted record, oldest first.
    async fn all(&self) -> SurveyResult<Vec<SurveyRecord>>;

    /// Records still awaiting delivery, oldest first.
    async fn pending(&self) -> SurveyResult<Vec<SurveyRecord>>;

    /// One-way `PENDING -> SYNCED` flip; a no-op for any other state.
    async fn mark_synced(&self, survey_id: &str) -> SurveyResult<()>;

    async fn count(&self, status: SyncStatus) -> SurveyResult<u64>;
}

/// Device-local dedup index of unmasked identity numbers.
#[async_trait]
pub trait IdentityLedger: Send + Sync {
    /// Atomic check-then-append: `true` when `number` was absent and is now
    /// claimed, `false` when it already held a slot.
    async fn claim(&self, number: &str) -> SurveyResult<bool>;

    async fn contains(&self, number: &str) -> SurveyResult<bool>;
}

/// Singleton enumerator stats with atomic replace.
#[async_trait]
pub trait StatsRepository: Send + Sync {
    async fn read(&self) -> SurveyResult<EnumeratorStats>;

    /// Compare-and-swap: writes `next` only while the stored value still
    /// equals `expected`; returns `false` (writing nothing) otherwise.
    async fn compare_and_swap(
        &self,
        expected: &EnumeratorStats,
        next: &EnumeratorStats,
    ) -> SurveyResult<bool>;
}
