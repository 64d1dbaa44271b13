//! Eligibility Scorer
//!
//! Pure decision table over annual income and caste category. The verdict
//! is advisory: it guides the operator during the form stage and is stored
//! on the record, but it never blocks capture or submission.

use serde::{Deserialize, Serialize};

use crate::record::{CasteCategory, Financials};

/// Annual income above this puts the household out of scheme scope.
pub const INCOME_LIMIT: f64 = 250_000.0;

/// Below this the household is fast-tracked.
pub const HIGH_PRIORITY_INCOME: f64 = 50_000.0;

/// The single category the scheme covers.
pub const ELIGIBLE_CATEGORY: CasteCategory = CasteCategory::Sc;

/// Advisory classification. `Pending` is the not-yet-scored value on
/// drafts; [`score`] itself never returns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Rejected,
    HighPriority,
    Eligible,
    Pending,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Rejected => "REJECTED",
            Verdict::HighPriority => "HIGH_PRIORITY",
            Verdict::Eligible => "ELIGIBLE",
            Verdict::Pending => "PENDING",
        }
    }
}

/// A verdict plus the guidance line shown to the operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub verdict: Verdict,
    pub message: String,
}

/// Score a household. First matching rule wins; the table is total and
/// deterministic, so identical inputs always produce the identical verdict.
pub fn score(annual_income: f64, caste_category: Option<CasteCategory>) -> Assessment {
    if annual_income > INCOME_LIMIT {
        return Assessment {
            verdict: Verdict::Rejected,
            message: "Income exceeds limit (2.5L). Not Eligible.".to_string(),
        };
    }

    // Category rule fires before the income-priority rule.
    if let Some(caste) = caste_category {
        if caste != ELIGIBLE_CATEGORY {
            return Assessment {
                verdict: Verdict::Rejected,
                message: "Scheme applicable for SC category only.".to_string(),
            };
        }
    }

    if annual_income < HIGH_PRIORITY_INCOME {
        Assessment {
            verdict: Verdict::HighPriority,
            message: "High Probability of Selection (Income < 50k)".to_string(),
        }
    } else {
        Assessment {
            verdict: Verdict::Eligible,
            message: "Eligible for consideration.".to_string(),
        }
    }
}

pub fn score_financials(financials: &Financials) -> Assessment {
    score(financials.annual_income, financials.caste_category)
}
