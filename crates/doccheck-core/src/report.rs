//! Report builder: pure aggregation of rule outcomes.

use crate::types::{Report, RuleOutcome, RuleStatus, Summary};
use chrono::{DateTime, Utc};

impl Summary {
    /// Computes counts and pass rate for a sequence of outcomes.
    ///
    /// Deterministic: the same outcomes always yield the same summary.
    #[must_use]
    pub fn from_outcomes(outcomes: &[RuleOutcome]) -> Self {
        let count = |status: RuleStatus| outcomes.iter().filter(|o| o.status() == status).count();
        let total = outcomes.len();
        let pass_count = count(RuleStatus::Pass);
        #[allow(clippy::cast_precision_loss)] // rule counts are far below 2^52
        let pass_rate = if total == 0 {
            0.0
        } else {
            pass_count as f64 / total as f64
        };
        Self {
            total,
            pass_count,
            partial_count: count(RuleStatus::Partial),
            fail_count: count(RuleStatus::Fail),
            pass_rate,
        }
    }
}

/// Builds a [`Report`] from outcomes in rule-set order.
#[derive(Debug, Default, Clone)]
pub struct ReportBuilder {
    generated_at: Option<DateTime<Utc>>,
}

impl ReportBuilder {
    /// Creates a builder stamping reports with the current time.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a fixed timestamp instead of the current time.
    #[must_use]
    pub fn generated_at(mut self, at: DateTime<Utc>) -> Self {
        self.generated_at = Some(at);
        self
    }

    /// Consumes the outcomes and produces the report.
    #[must_use]
    pub fn build(self, outcomes: Vec<RuleOutcome>) -> Report {
        let summary = Summary::from_outcomes(&outcomes);
        let generated_at = self.generated_at.unwrap_or_else(Utc::now);
        tracing::info!("Report built: {}", summary);
        Report::new(outcomes, summary, generated_at)
    }
}
