//! Core types for match results, rule outcomes and reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Inclusive, 1-indexed line range inside a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    /// First line of the range.
    pub start: usize,
    /// Last line of the range (inclusive).
    pub end: usize,
}

impl Span {
    /// Creates a new span. `end` is clamped so it is never before `start`.
    #[must_use]
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    /// Creates a span covering a single line.
    #[must_use]
    pub fn line(line: usize) -> Self {
        Self::new(line, line)
    }

    /// Number of lines covered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    /// Spans always cover at least one line.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Returns true if `line` falls inside this span.
    #[must_use]
    pub fn contains(&self, line: usize) -> bool {
        (self.start..=self.end).contains(&line)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "L{}", self.start)
        } else {
            write!(f, "L{}-L{}", self.start, self.end)
        }
    }
}

/// Outcome of evaluating one matcher against one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Human-readable description of the matcher (e.g., `heading "Usage"`).
    pub matcher: String,
    /// Whether the matcher found its content.
    pub matched: bool,
    /// Line range where the match was found.
    pub span: Option<Span>,
    /// Matched text, truncated for reporting. Empty when nothing matched.
    pub snippet: String,
}

impl MatchResult {
    /// Creates a successful match.
    #[must_use]
    pub fn found(matcher: impl Into<String>, span: Span, snippet: impl Into<String>) -> Self {
        Self {
            matcher: matcher.into(),
            matched: true,
            span: Some(span),
            snippet: snippet.into(),
        }
    }

    /// Creates a failed match.
    #[must_use]
    pub fn missing(matcher: impl Into<String>) -> Self {
        Self {
            matcher: matcher.into(),
            matched: false,
            span: None,
            snippet: String::new(),
        }
    }
}

/// Status of a single check rule.
///
/// Ordered by badness so `>=` comparisons express thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleStatus {
    /// Every matcher succeeded.
    Pass,
    /// Optional rule with mixed matcher success.
    Partial,
    /// Anything else.
    Fail,
}

impl RuleStatus {
    /// Applies the pass/partial/fail policy.
    ///
    /// - `Pass` iff every matcher matched (and there was at least one).
    /// - `Partial` iff the rule is optional and at least one matcher matched.
    /// - `Fail` otherwise.
    #[must_use]
    pub fn decide(required: bool, matched: usize, total: usize) -> Self {
        if total > 0 && matched == total {
            Self::Pass
        } else if !required && matched > 0 {
            Self::Partial
        } else {
            Self::Fail
        }
    }
}

impl fmt::Display for RuleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass => write!(f, "pass"),
            Self::Partial => write!(f, "partial"),
            Self::Fail => write!(f, "fail"),
        }
    }
}

impl FromStr for RuleStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pass" => Ok(Self::Pass),
            "partial" => Ok(Self::Partial),
            "fail" => Ok(Self::Fail),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Returned when parsing an unknown status name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status `{0}`, expected: pass, partial, fail")]
pub struct UnknownStatus(pub String);

/// Aggregated result for one check rule. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleOutcome {
    rule_id: String,
    description: String,
    document: String,
    status: RuleStatus,
    evidence: Vec<MatchResult>,
    missing: Vec<String>,
}

impl RuleOutcome {
    /// Builds an outcome from per-matcher results, applying the status policy.
    ///
    /// Successful results become evidence (in matcher order); failed ones
    /// contribute their matcher description to `missing`.
    #[must_use]
    pub fn from_results(
        rule_id: impl Into<String>,
        description: impl Into<String>,
        document: impl Into<String>,
        required: bool,
        results: Vec<MatchResult>,
    ) -> Self {
        let total = results.len();
        let (evidence, failed): (Vec<_>, Vec<_>) = results.into_iter().partition(|r| r.matched);
        let status = RuleStatus::decide(required, evidence.len(), total);
        Self {
            rule_id: rule_id.into(),
            description: description.into(),
            document: document.into(),
            status,
            evidence,
            missing: failed.into_iter().map(|r| r.matcher).collect(),
        }
    }

    /// Identifier of the rule this outcome belongs to.
    #[must_use]
    pub fn rule_id(&self) -> &str {
        &self.rule_id
    }

    /// Requirement text of the rule.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Logical name of the document that was searched.
    #[must_use]
    pub fn document(&self) -> &str {
        &self.document
    }

    /// Status after applying the policy.
    #[must_use]
    pub fn status(&self) -> RuleStatus {
        self.status
    }

    /// Results of matchers that succeeded, in matcher order.
    #[must_use]
    pub fn evidence(&self) -> &[MatchResult] {
        &self.evidence
    }

    /// Descriptions of matchers that failed, in matcher order.
    #[must_use]
    pub fn missing(&self) -> &[String] {
        &self.missing
    }

    /// Formats the outcome for terminal output.
    #[must_use]
    pub fn format(&self) -> String {
        use std::fmt::Write;
        let mut output = format!(
            "{} [{}] {}: {}\n",
            self.rule_id, self.status, self.document, self.description
        );
        for e in &self.evidence {
            if let Some(span) = e.span {
                let _ = writeln!(output, "  + {} at {span}: {}", e.matcher, e.snippet);
            }
        }
        for m in &self.missing {
            let _ = writeln!(output, "  - missing {m}");
        }
        output
    }
}

impl fmt::Display for RuleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} [{}] {}",
            self.document, self.status, self.rule_id, self.description
        )?;
        if let Some(span) = self.evidence.first().and_then(|e| e.span) {
            write!(f, " ({span})")?;
        }
        Ok(())
    }
}

/// Summary statistics over a sequence of outcomes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Number of rules evaluated.
    pub total: usize,
    /// Rules that passed.
    pub pass_count: usize,
    /// Rules with a partial outcome.
    pub partial_count: usize,
    /// Rules that failed.
    pub fail_count: usize,
    /// `pass_count / total`, or 0 when there are no rules.
    pub pass_rate: f64,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} passed, {} partial, {} failed of {} rule(s) (pass rate {:.1}%)",
            self.pass_count,
            self.partial_count,
            self.fail_count,
            self.total,
            self.pass_rate * 100.0
        )
    }
}

/// The full result of one validation run.
///
/// Built once by [`crate::ReportBuilder`]; there is no way to mutate it afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    outcomes: Vec<RuleOutcome>,
    summary: Summary,
    generated_at: DateTime<Utc>,
}

impl Report {
    pub(crate) fn new(
        outcomes: Vec<RuleOutcome>,
        summary: Summary,
        generated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            outcomes,
            summary,
            generated_at,
        }
    }

    /// Outcomes in rule-set order.
    #[must_use]
    pub fn outcomes(&self) -> &[RuleOutcome] {
        &self.outcomes
    }

    /// Summary statistics.
    #[must_use]
    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    /// When the report was built.
    #[must_use]
    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    /// Returns true if any rule failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.summary.fail_count > 0
    }

    /// Checks if any outcome meets or exceeds the given status threshold.
    #[must_use]
    pub fn has_outcomes_at(&self, status: RuleStatus) -> bool {
        self.outcomes.iter().any(|o| o.status >= status)
    }

    /// Returns outcomes with exactly the given status.
    #[must_use]
    pub fn by_status(&self, status: RuleStatus) -> Vec<&RuleOutcome> {
        self.outcomes.iter().filter(|o| o.status == status).collect()
    }

    /// Serializes the report as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Renders every outcome with its evidence, then the summary line.
    #[must_use]
    pub fn format_text(&self) -> String {
        use std::fmt::Write;

        let mut out = String::new();
        for o in &self.outcomes {
            let _ = writeln!(out, "{}", o.format());
        }
        let _ = writeln!(out, "{}", self.summary);
        out
    }

    /// One line per outcome, without evidence details.
    #[must_use]
    pub fn format_compact(&self) -> String {
        use std::fmt::Write;

        self.outcomes.iter().fold(String::new(), |mut out, o| {
            let _ = writeln!(out, "{o}");
            out
        })
    }

    /// Renders the report as a markdown table followed by a summary line.
    #[must_use]
    pub fn format_markdown(&self) -> String {
        use std::fmt::Write;

        let mut out = String::from("| Rule | Document | Status | Evidence | Missing |\n");
        out.push_str("|------|----------|--------|----------|---------|\n");
        for o in &self.outcomes {
            let evidence = o
                .evidence
                .iter()
                .filter_map(|e| e.span.map(|s| s.to_string()))
                .collect::<Vec<_>>()
                .join(", ");
            let missing = o.missing.join("; ");
            let _ = writeln!(
                out,
                "| {} | {} | {} | {} | {} |",
                o.rule_id,
                o.document,
                o.status,
                escape_cell(&evidence),
                escape_cell(&missing)
            );
        }
        let _ = writeln!(out, "\n{}", self.summary);
        out
    }

    /// Formats outcomes as a test failure report.
    ///
    /// Produces a human-readable multi-line report suitable for `panic!()`
    /// messages in `cargo test` integration.
    #[must_use]
    pub fn format_test_report(&self, fail_on: RuleStatus) -> String {
        use std::fmt::Write;

        let failing: Vec<&RuleOutcome> = self
            .outcomes
            .iter()
            .filter(|o| o.status >= fail_on)
            .collect();

        let mut report = String::new();
        let _ = writeln!(
            report,
            "\n=== doccheck: {} rule(s) at or above {fail_on} ===\n",
            failing.len()
        );

        for o in &failing {
            let _ = writeln!(report, "{}", o.format());
        }

        let _ = writeln!(report, "Total: {}", self.summary);
        report
    }
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}
