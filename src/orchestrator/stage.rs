//! Survey flow stage machine
//!
//! Pure transition function over the four operator-facing stages, free of
//! I/O so the sequencing is testable without any rendering.

use serde::{Deserialize, Serialize};

use crate::error::{SurveyError, SurveyResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Identity,
    Form,
    Evidence,
    Complete,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Identity => "identity",
            Stage::Form => "form",
            Stage::Evidence => "evidence",
            Stage::Complete => "complete",
        }
    }
}

/// Events that move the flow forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageEvent {
    IdentityAccepted,
    FormSubmitted,
    EvidenceConfirmed,
}

impl StageEvent {
    /// The stage this event is valid in.
    pub fn expected_stage(&self) -> Stage {
        match self {
            StageEvent::IdentityAccepted => Stage::Identity,
            StageEvent::FormSubmitted => Stage::Form,
            StageEvent::EvidenceConfirmed => Stage::Evidence,
        }
    }
}

/// `(Stage, Event) -> Stage`; any other pairing is a `StageMismatch`.
pub fn advance(stage: Stage, event: StageEvent) -> SurveyResult<Stage> {
    match (stage, event) {
        (Stage::Identity, StageEvent::IdentityAccepted) => Ok(Stage::Form),
        (Stage::Form, StageEvent::FormSubmitted) => Ok(Stage::Evidence),
        (Stage::Evidence, StageEvent::EvidenceConfirmed) => Ok(Stage::Complete),
        (stage, event) => Err(SurveyError::StageMismatch {
            expected: event.expected_stage().name(),
            actual: stage.name(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_walks_all_four_stages() {
        let mut stage = Stage::Identity;
        stage = advance(stage, StageEvent::IdentityAccepted).unwrap();
        stage = advance(stage, StageEvent::FormSubmitted).unwrap();
        stage = advance(stage, StageEvent::EvidenceConfirmed).unwrap();
        assert_eq!(stage, Stage::Complete);
    }

    #[test]
    fn out_of_order_events_are_rejected() {
        for event in [
            StageEvent::FormSubmitted,
            StageEvent::EvidenceConfirmed,
        ] {
            let err = advance(Stage::Identity, event).unwrap_err();
            assert!(matches!(err, SurveyError::StageMismatch { .. }));
        }
        assert!(advance(Stage::Complete, StageEvent::IdentityAccepted).is_err());
    }
}
