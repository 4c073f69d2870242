//! Evidence matcher: evaluates a rule's matchers against its document.
//!
//! Every matcher works inside a region of the document: the whole text,
//! or the section discovered by its `within` heading. Spans never leave
//! that region, so text from an unrelated section cannot satisfy a match.

use crate::declarative::model::{CheckRule, HeadingMatcher, KeywordSet, Matcher, MatcherKind};
use crate::document::Document;
use crate::types::{MatchResult, RuleOutcome, Span};
use crate::utils::{fold, truncate};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Tunables for span discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOptions {
    /// Lines captured after a matched heading (N).
    pub section_lines: usize,
    /// Sliding window size for keyword sets (W).
    pub window_lines: usize,
    /// Maximum snippet length in characters.
    pub snippet_chars: usize,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            section_lines: 20,
            window_lines: 10,
            snippet_chars: 120,
        }
    }
}

/// Evaluates every matcher of `rule` in order and aggregates the outcome.
///
/// Never fails: absent content is a fail or partial outcome, not an error.
#[must_use]
pub fn evaluate_rule(rule: &CheckRule, document: &Document, options: &MatchOptions) -> RuleOutcome {
    let results: Vec<MatchResult> = rule
        .matchers()
        .iter()
        .map(|m| evaluate_matcher(m, document, options))
        .collect();

    let outcome = RuleOutcome::from_results(
        rule.id().as_str(),
        rule.description(),
        document.name(),
        rule.required(),
        results,
    );
    tracing::debug!(
        "Rule {} on {}: {} ({} evidence, {} missing)",
        outcome.rule_id(),
        outcome.document(),
        outcome.status(),
        outcome.evidence().len(),
        outcome.missing().len()
    );
    outcome
}

/// Evaluates one matcher against a document.
#[must_use]
pub fn evaluate_matcher(matcher: &Matcher, document: &Document, options: &MatchOptions) -> MatchResult {
    let description = matcher.describe();

    let region = match matcher.scope() {
        Some(section) => match section_region(document, section) {
            Some(span) => span,
            None => return MatchResult::missing(description),
        },
        None => document.full_span(),
    };

    let found = match matcher.kind() {
        MatcherKind::Heading(h) => match_heading(h, document, options),
        MatcherKind::Keywords(k) => match_keywords(k, document, region, options),
        MatcherKind::CodeFence(languages) => match_code_fence(languages, document, region),
        MatcherKind::Pattern(re) => match_pattern(re, document, region),
    };

    match found {
        Some((span, text)) => {
            MatchResult::found(description, span, truncate(&text, options.snippet_chars))
        }
        None => MatchResult::missing(description),
    }
}

/// Full (uncapped) section body of the first heading containing `section`.
fn section_region(document: &Document, section: &str) -> Option<Span> {
    let heading = document
        .heading(section)
        .or_else(|| document.find_headings(section).next())?;
    Some(document.section_span(heading, None))
}

/// An exact title match (via the index) wins over an earlier substring
/// match; otherwise the first heading containing the pattern is used.
fn match_heading(
    matcher: &HeadingMatcher,
    document: &Document,
    options: &MatchOptions,
) -> Option<(Span, String)> {
    let level_ok = |level: usize| matcher.level().map_or(true, |l| l == level);

    let heading = document
        .heading(matcher.pattern())
        .filter(|h| level_ok(h.level))
        .or_else(|| {
            document
                .find_headings(matcher.pattern())
                .find(|h| level_ok(h.level))
        })?;

    let lines = matcher.lines().unwrap_or(options.section_lines);
    let span = document.section_span(heading, Some(lines));
    let text = document
        .line(heading.line)
        .unwrap_or(heading.text.as_str())
        .trim()
        .to_string();
    Some((span, text))
}

/// Earliest window of W lines (inside `region`) whose text contains every keyword.
fn match_keywords(
    set: &KeywordSet,
    document: &Document,
    region: Span,
    options: &MatchOptions,
) -> Option<(Span, String)> {
    let window = set.window().unwrap_or(options.window_lines).max(1);
    let last_start = region.end.saturating_sub(window - 1).max(region.start);

    (region.start..=last_start).find_map(|start| {
        let span = Span::new(start, (start + window - 1).min(region.end));
        let lines = document.lines_in(span);
        let text = fold(
            &lines
                .iter()
                .map(|l| l.text.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
        );
        if set.keywords().iter().all(|k| text.contains(k.as_str())) {
            Some((span, snippet_of(document, span)))
        } else {
            None
        }
    })
}

/// First fence tagged with an accepted language that opens inside `region`.
/// The span is clipped to the region.
fn match_code_fence(
    languages: &[String],
    document: &Document,
    region: Span,
) -> Option<(Span, String)> {
    let fence = document.fences().iter().find(|f| {
        region.contains(f.start)
            && f.language.as_ref().is_some_and(|l| languages.contains(l))
    })?;
    let span = Span::new(fence.start, fence.end.min(region.end));
    let text = document.line(fence.start).unwrap_or_default().trim().to_string();
    Some((span, text))
}

/// First line inside `region` matching the regex.
fn match_pattern(re: &Regex, document: &Document, region: Span) -> Option<(Span, String)> {
    document
        .lines_in(region)
        .iter()
        .find(|l| re.is_match(&l.text))
        .map(|l| (Span::line(l.number), l.text.trim().to_string()))
}

/// Non-blank lines of a span, trimmed and joined.
fn snippet_of(document: &Document, span: Span) -> String {
    document
        .lines_in(span)
        .iter()
        .map(|l| l.text.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" / ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declarative::model::{DocumentName, RuleId};
    use crate::types::RuleStatus;

    const README: &str = "\
# Platform

Intro mentioning docker once.

## Prerequisites

- Python 3.11
- PostgreSQL 15
- Redis 7

## Deployment

Run kubectl apply with the manifests below.

```yaml
apiVersion: apps/v1
kind: Deployment
```

## Troubleshooting

Check kubectl logs for errors.
";

    fn doc() -> Document {
        Document::parse("README", README).unwrap()
    }

    fn heading(pattern: &str) -> Matcher {
        Matcher::heading(HeadingMatcher::new(pattern).unwrap())
    }

    fn keywords(words: &[&str]) -> Matcher {
        Matcher::keywords(KeywordSet::new(words).unwrap())
    }

    fn rule(required: bool, matchers: Vec<Matcher>) -> CheckRule {
        CheckRule::new(
            RuleId::new("AC-1").unwrap(),
            "test rule",
            DocumentName::new("README").unwrap(),
            matchers,
            required,
        )
        .unwrap()
    }

    fn eval(m: &Matcher) -> MatchResult {
        evaluate_matcher(m, &doc(), &MatchOptions::default())
    }

    // -- Heading --

    #[test]
    fn heading_span_covers_section_body() {
        let r = eval(&heading("prerequisites"));
        assert!(r.matched);
        assert_eq!(r.span, Some(Span::new(5, 10)));
        assert_eq!(r.snippet, "## Prerequisites");
    }

    #[test]
    fn heading_is_case_and_whitespace_insensitive() {
        let a = eval(&heading("  PREREQUISITES "));
        let b = eval(&heading("Prerequisites"));
        assert_eq!(a.span, b.span);
    }

    #[test]
    fn heading_substring_match() {
        let r = eval(&heading("trouble"));
        assert_eq!(r.span, Some(Span::new(20, 22)));
    }

    #[test]
    fn heading_span_capped_by_lines() {
        let m = Matcher::heading(HeadingMatcher::new("Deployment").unwrap().with_lines(2));
        assert_eq!(eval(&m).span, Some(Span::new(11, 13)));
    }

    #[test]
    fn heading_level_filter_uses_scan() {
        let doc = Document::parse("notes", "# Setup\n\ntext\n\n## Setup\n\nmore\n").unwrap();
        let m = Matcher::heading(HeadingMatcher::new("setup").unwrap().with_level(2).unwrap());
        let r = evaluate_matcher(&m, &doc, &MatchOptions::default());
        assert_eq!(r.span, Some(Span::new(5, 7)));
    }

    #[test]
    fn exact_heading_preferred_over_earlier_substring() {
        let doc = Document::parse("notes", "# Install notes\n\n# Install\n\nsteps\n").unwrap();
        let r = evaluate_matcher(&heading("install"), &doc, &MatchOptions::default());
        assert_eq!(r.span.map(|s| s.start), Some(3));
    }

    #[test]
    fn missing_heading() {
        let r = eval(&heading("Monitoring"));
        assert!(!r.matched);
        assert!(r.span.is_none());
        assert!(r.snippet.is_empty());
    }

    // -- Keywords --

    #[test]
    fn keywords_earliest_window() {
        let r = eval(&keywords(&["kubectl", "manifests"]));
        assert!(r.matched);
        assert_eq!(r.span.map(|s| s.start), Some(4));
        assert!(r.span.unwrap().contains(13));
    }

    #[test]
    fn keywords_order_independent() {
        let a = eval(&keywords(&["postgresql", "redis", "python"]));
        let b = eval(&keywords(&["python", "redis", "postgresql"]));
        assert!(a.matched);
        assert_eq!(a.span, b.span);
    }

    #[test]
    fn keywords_must_share_a_window() {
        let m = Matcher::keywords(KeywordSet::new(["docker", "troubleshooting"]).unwrap());
        assert!(!eval(&m).matched);
    }

    #[test]
    fn keywords_window_override() {
        let m = Matcher::keywords(
            KeywordSet::new(["python", "redis"])
                .unwrap()
                .with_window(3)
                .unwrap(),
        );
        assert_eq!(eval(&m).span, Some(Span::new(7, 9)));
        let narrow = Matcher::keywords(
            KeywordSet::new(["python", "redis"])
                .unwrap()
                .with_window(2)
                .unwrap(),
        );
        assert!(!eval(&narrow).matched);
    }

    #[test]
    fn keywords_short_document_uses_single_window() {
        let doc = Document::parse("tiny", "alpha\nbeta\n").unwrap();
        let r = evaluate_matcher(&keywords(&["beta", "alpha"]), &doc, &MatchOptions::default());
        assert_eq!(r.span, Some(Span::new(1, 2)));
    }

    #[test]
    fn keywords_within_section_ignore_other_sections() {
        let scoped = keywords(&["kubectl", "logs"]).within("Deployment").unwrap();
        assert!(!eval(&scoped).matched);
        let global = keywords(&["kubectl", "logs"]);
        assert!(eval(&global).matched);
    }

    // -- Code fence --

    #[test]
    fn code_fence_span_is_open_to_close() {
        let r = eval(&Matcher::code_fence("yaml").unwrap());
        assert_eq!(r.span, Some(Span::new(15, 18)));
        assert_eq!(r.snippet, "```yaml");
    }

    #[test]
    fn code_fence_language_must_match() {
        assert!(!eval(&Matcher::code_fence("bash").unwrap()).matched);
    }

    #[test]
    fn code_fence_accepts_any_listed_language() {
        let m = Matcher::code_fence_any(["json", "yml", "yaml"]).unwrap();
        let r = eval(&m);
        assert_eq!(r.span, Some(Span::new(15, 18)));
        assert_eq!(r.matcher, "code fence `json` or `yml` or `yaml`");
    }

    #[test]
    fn code_fence_within_other_section_fails() {
        let m = Matcher::code_fence("yaml").unwrap().within("Troubleshooting").unwrap();
        assert!(!eval(&m).matched);
    }

    #[test]
    fn within_missing_section_fails() {
        let m = Matcher::code_fence("yaml").unwrap().within("Appendix").unwrap();
        assert!(!eval(&m).matched);
    }

    // -- Pattern --

    #[test]
    fn pattern_matches_first_line() {
        let r = eval(&Matcher::pattern(r"PostgreSQL \d+").unwrap());
        assert_eq!(r.span, Some(Span::line(8)));
        assert_eq!(r.snippet, "- PostgreSQL 15");
    }

    // -- Snippets --

    #[test]
    fn snippets_are_truncated() {
        let options = MatchOptions {
            snippet_chars: 8,
            ..MatchOptions::default()
        };
        let r = evaluate_matcher(&heading("Prerequisites"), &doc(), &options);
        assert_eq!(r.snippet, "## Pr...");
    }

    // -- Rule status policy --

    #[test]
    fn all_matchers_pass() {
        let outcome = evaluate_rule(
            &rule(true, vec![heading("Deployment"), Matcher::code_fence("yaml").unwrap()]),
            &doc(),
            &MatchOptions::default(),
        );
        assert_eq!(outcome.status(), RuleStatus::Pass);
        assert_eq!(outcome.evidence().len(), 2);
        assert!(outcome.missing().is_empty());
    }

    #[test]
    fn required_rule_with_missing_matcher_fails() {
        let outcome = evaluate_rule(
            &rule(true, vec![heading("Deployment"), Matcher::code_fence("bash").unwrap()]),
            &doc(),
            &MatchOptions::default(),
        );
        assert_eq!(outcome.status(), RuleStatus::Fail);
        assert_eq!(outcome.missing(), ["code fence `bash`".to_string()]);
    }

    #[test]
    fn optional_rule_with_mixed_results_is_partial() {
        let outcome = evaluate_rule(
            &rule(
                false,
                vec![keywords(&["kubectl", "apply"]), Matcher::code_fence("bash").unwrap()],
            ),
            &doc(),
            &MatchOptions::default(),
        );
        assert_eq!(outcome.status(), RuleStatus::Partial);
        assert_eq!(outcome.evidence().len(), 1);
        assert_eq!(outcome.missing().len(), 1);
    }

    #[test]
    fn optional_rule_with_nothing_matched_fails() {
        let outcome = evaluate_rule(
            &rule(false, vec![heading("Monitoring"), Matcher::code_fence("bash").unwrap()]),
            &doc(),
            &MatchOptions::default(),
        );
        assert_eq!(outcome.status(), RuleStatus::Fail);
    }
}
