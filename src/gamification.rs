//! Gamification Tracker
//!
//! Points and daily streak for the enumerator. Queuing, not syncing, is the
//! rewarded event, and every enqueue adds points: the award is deliberately
//! not idempotent per day. Stats never block the pipeline; a persistent
//! update failure is logged and swallowed.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use crate::error::SurveyResult;
use crate::store::StatsRepository;

/// Fixed award per successfully queued survey.
pub const POINTS_PER_SURVEY: u64 = 50;

const MAX_CAS_RETRIES: usize = 4;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumeratorStats {
    pub points: u64,
    pub streak: u32,
    pub last_survey_date: Option<NaiveDate>,
}

/// Pure streak rule over one award event: yesterday extends the streak, a
/// repeat today leaves it unchanged, anything else resets it to 1.
pub fn apply_award(stats: &EnumeratorStats, today: NaiveDate) -> EnumeratorStats {
    let mut next = stats.clone();
    next.points += POINTS_PER_SURVEY;

    let yesterday = today.pred_opt();
    if stats.last_survey_date.is_some() && stats.last_survey_date == yesterday {
        next.streak += 1;
    } else if stats.last_survey_date != Some(today) {
        next.streak = 1;
    }

    next.last_survey_date = Some(today);
    next
}

pub struct Tracker {
    stats: Arc<dyn StatsRepository>,
}

impl Tracker {
    pub fn new(stats: Arc<dyn StatsRepository>) -> Self {
        Self { stats }
    }

    /// Award for one queued survey. Returns the updated stats, or `None`
    /// when the update could not be applied (never an error to the caller).
    pub async fn record_survey(&self, today: NaiveDate) -> Option<EnumeratorStats> {
        for _ in 0..MAX_CAS_RETRIES {
            match self.try_award(today).await {
                Ok(Some(next)) => return Some(next),
                Ok(None) => continue,
                Err(err) => {
                    warn!(%err, "gamification update failed");
                    return None;
                }
            }
        }
        warn!("gamification update contended, giving up");
        None
    }

    async fn try_award(&self, today: NaiveDate) -> SurveyResult<Option<EnumeratorStats>> {
        let current = self.stats.read().await?;
        let next = apply_award(&current, today);
        if self.stats.compare_and_swap(&current, &next).await? {
            Ok(Some(next))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn first_survey_starts_the_streak() {
        let next = apply_award(&EnumeratorStats::default(), day(2024, 3, 2));
        assert_eq!(next.points, POINTS_PER_SURVEY);
        assert_eq!(next.streak, 1);
        assert_eq!(next.last_survey_date, Some(day(2024, 3, 2)));
    }

    #[test]
    fn consecutive_day_extends_the_streak() {
        let stats = EnumeratorStats {
            points: 100,
            streak: 2,
            last_survey_date: Some(day(2024, 3, 1)),
        };
        let next = apply_award(&stats, day(2024, 3, 2));
        assert_eq!(next.streak, 3);
        assert_eq!(next.points, 150);
    }

    #[test]
    fn second_survey_same_day_adds_points_but_not_streak() {
        let stats = EnumeratorStats {
            points: 50,
            streak: 3,
            last_survey_date: Some(day(2024, 3, 2)),
        };
        let next = apply_award(&stats, day(2024, 3, 2));
        assert_eq!(next.streak, 3);
        assert_eq!(next.points, 100);
    }

    #[test]
    fn gap_resets_the_streak() {
        let stats = EnumeratorStats {
            points: 200,
            streak: 4,
            last_survey_date: Some(day(2024, 2, 27)),
        };
        let next = apply_award(&stats, day(2024, 3, 2));
        assert_eq!(next.streak, 1);
    }
}
