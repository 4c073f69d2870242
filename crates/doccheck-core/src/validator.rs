//! Validator: runs a rule set against loaded documents and builds a report.

use crate::config::Config;
use crate::declarative::loader::LoadError;
use crate::declarative::model::{CheckRule, RuleSet};
use crate::document::{Document, DocumentError, HeadingStyle};
use crate::matcher::{evaluate_rule, MatchOptions};
use crate::report::ReportBuilder;
use crate::source::{DocumentManifest, SourceError};
use crate::types::{Report, RuleOutcome};

use chrono::{DateTime, Utc};
use miette::Diagnostic;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Errors that abort a validation run before any report exists.
#[derive(Debug, Error, Diagnostic)]
pub enum ValidateError {
    /// The rule definition is structurally invalid.
    #[error("malformed rule: {source}")]
    #[diagnostic(
        code(doccheck::malformed_rule),
        help("every check needs an id, a declared document and at least one matcher")
    )]
    MalformedRule {
        /// The loader error.
        #[source]
        source: LoadError,
    },

    /// Two rules share an id.
    #[error("duplicate rule id `{id}`")]
    #[diagnostic(
        code(doccheck::duplicate_rule_id),
        help("rule ids must be unique across presets and project checks")
    )]
    DuplicateRuleId {
        /// The duplicated id.
        id: String,
    },

    /// A document has no content.
    #[error("document `{name}` is empty")]
    #[diagnostic(code(doccheck::empty_document))]
    EmptyDocument {
        /// Logical document name.
        name: String,
    },

    /// A rule targets a document absent from the manifest.
    #[error("rule `{rule}` targets unknown document `{document}`")]
    #[diagnostic(
        code(doccheck::unknown_target_document),
        help("declare the document under [[documents]] or disable the rule")
    )]
    UnknownTargetDocument {
        /// The rule id.
        rule: String,
        /// The missing document name.
        document: String,
    },

    /// A document did not load within the timeout.
    #[error("timed out after {timeout:?} loading document `{name}`")]
    #[diagnostic(
        code(doccheck::document_load_timeout),
        help("raise [validator] load_timeout_ms or check the document source")
    )]
    DocumentLoadTimeout {
        /// Logical document name.
        name: String,
        /// The timeout that elapsed.
        timeout: Duration,
    },

    /// A document could not be loaded.
    #[error("{0}")]
    #[diagnostic(code(doccheck::document_load))]
    DocumentLoad(#[source] SourceError),
}

impl From<LoadError> for ValidateError {
    fn from(error: LoadError) -> Self {
        match error {
            LoadError::DuplicateRuleId { id } => Self::DuplicateRuleId { id },
            other => Self::MalformedRule { source: other },
        }
    }
}

impl From<DocumentError> for ValidateError {
    fn from(error: DocumentError) -> Self {
        match error {
            DocumentError::Empty { name } => Self::EmptyDocument { name },
        }
    }
}

impl From<SourceError> for ValidateError {
    fn from(error: SourceError) -> Self {
        match error {
            SourceError::Timeout { name, timeout } => Self::DocumentLoadTimeout { name, timeout },
            other => Self::DocumentLoad(other),
        }
    }
}

/// Builder for configuring a [`Validator`].
#[derive(Debug, Default)]
pub struct ValidatorBuilder {
    rules: Vec<CheckRule>,
    manifest: DocumentManifest,
    options: Option<MatchOptions>,
    heading_style: Option<HeadingStyle>,
    parallelism: Option<usize>,
    config: Option<Config>,
    generated_at: Option<DateTime<Utc>>,
}

impl ValidatorBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule.
    #[must_use]
    pub fn rule(mut self, rule: CheckRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Adds rules in order.
    #[must_use]
    pub fn rules<I>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = CheckRule>,
    {
        self.rules.extend(rules);
        self
    }

    /// Adds every rule of a loaded rule set.
    #[must_use]
    pub fn rule_set(self, set: RuleSet) -> Self {
        let (_, rules) = set.into_parts();
        self.rules(rules)
    }

    /// Adds one document's raw text.
    #[must_use]
    pub fn document(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.manifest.insert(name, text);
        self
    }

    /// Adds every document of a manifest.
    #[must_use]
    pub fn manifest(mut self, manifest: DocumentManifest) -> Self {
        for (name, text) in manifest.iter() {
            self.manifest.insert(name, text);
        }
        self
    }

    /// Sets matcher options, overriding the config.
    #[must_use]
    pub fn options(mut self, options: MatchOptions) -> Self {
        self.options = Some(options);
        self
    }

    /// Sets the heading style, overriding the config.
    #[must_use]
    pub fn heading_style(mut self, style: HeadingStyle) -> Self {
        self.heading_style = Some(style);
        self
    }

    /// Sets the number of worker threads, overriding the config.
    #[must_use]
    pub fn parallelism(mut self, workers: usize) -> Self {
        self.parallelism = Some(workers);
        self
    }

    /// Sets the configuration (rule overrides and defaults).
    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Stamps the report with a fixed time.
    #[must_use]
    pub fn generated_at(mut self, at: DateTime<Utc>) -> Self {
        self.generated_at = Some(at);
        self
    }

    /// Builds the validator.
    ///
    /// Duplicate ids are checked first, before any document is parsed.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateRuleId`, `EmptyDocument` or `UnknownTargetDocument`.
    pub fn build(self) -> Result<Validator, ValidateError> {
        let mut seen = HashSet::new();
        for rule in &self.rules {
            if !seen.insert(rule.id().as_str()) {
                return Err(ValidateError::DuplicateRuleId {
                    id: rule.id().as_str().to_string(),
                });
            }
        }

        let config = self.config.unwrap_or_default();
        let rules: Vec<CheckRule> = self
            .rules
            .into_iter()
            .filter(|r| {
                let enabled = config.is_rule_enabled(r.id().as_str());
                if !enabled {
                    debug!("Rule {} disabled by config", r.id());
                }
                enabled
            })
            .map(|r| match config.required_override(r.id().as_str()) {
                Some(required) => r.with_required(required),
                None => r,
            })
            .collect();

        let style = self
            .heading_style
            .unwrap_or_else(|| config.matcher.heading_style());
        let mut documents = HashMap::with_capacity(self.manifest.len());
        for (name, text) in self.manifest.iter() {
            let document = Document::parse_with(name, text, style)?;
            debug!(
                "Parsed document `{}`: {} lines, {} headings",
                name,
                document.line_count(),
                document.headings().len()
            );
            documents.insert(name.to_string(), document);
        }

        for rule in &rules {
            let target = rule.target_document().as_str();
            if !documents.contains_key(target) {
                return Err(ValidateError::UnknownTargetDocument {
                    rule: rule.id().as_str().to_string(),
                    document: target.to_string(),
                });
            }
        }

        Ok(Validator {
            rules,
            documents,
            options: self.options.unwrap_or_else(|| config.matcher.options()),
            workers: self
                .parallelism
                .unwrap_or_else(|| config.validator.workers())
                .max(1),
            generated_at: self.generated_at,
        })
    }
}

/// Evaluates a fixed rule set against fixed documents.
///
/// Use [`Validator::builder()`] to construct an instance. Construction
/// performs every fallible step, so [`Validator::validate`] cannot fail.
#[derive(Debug)]
pub struct Validator {
    rules: Vec<CheckRule>,
    documents: HashMap<String, Document>,
    options: MatchOptions,
    workers: usize,
    generated_at: Option<DateTime<Utc>>,
}

impl Validator {
    /// Creates a new builder for configuring a validator.
    #[must_use]
    pub fn builder() -> ValidatorBuilder {
        ValidatorBuilder::new()
    }

    /// Returns the number of rules that will be evaluated.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Returns the number of worker threads used for evaluation.
    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Runs every rule and returns the report.
    #[must_use]
    pub fn validate(&self) -> Report {
        info!(
            "Validating {} rule(s) against {} document(s)",
            self.rules.len(),
            self.documents.len()
        );
        let outcomes = self.evaluate();
        let builder = match self.generated_at {
            Some(at) => ReportBuilder::new().generated_at(at),
            None => ReportBuilder::new(),
        };
        builder.build(outcomes)
    }

    /// Evaluates rules on a bounded pool of scoped threads.
    ///
    /// Worker `w` takes rules `w, w + n, w + 2n, ...` and results land in
    /// a slot array indexed by rule position, so completion order never
    /// affects outcome order.
    fn evaluate(&self) -> Vec<RuleOutcome> {
        let workers = self.workers.min(self.rules.len());
        if workers <= 1 {
            return self.rules.iter().filter_map(|r| self.evaluate_one(r)).collect();
        }

        let mut slots: Vec<Option<RuleOutcome>> = Vec::new();
        slots.resize_with(self.rules.len(), || None);

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|worker| {
                    scope.spawn(move || {
                        self.rules
                            .iter()
                            .enumerate()
                            .skip(worker)
                            .step_by(workers)
                            .filter_map(|(index, rule)| {
                                self.evaluate_one(rule).map(|outcome| (index, outcome))
                            })
                            .collect::<Vec<_>>()
                    })
                })
                .collect();

            for handle in handles {
                match handle.join() {
                    Ok(results) => {
                        for (index, outcome) in results {
                            slots[index] = Some(outcome);
                        }
                    }
                    Err(panic) => std::panic::resume_unwind(panic),
                }
            }
        });

        slots.into_iter().flatten().collect()
    }

    fn evaluate_one(&self, rule: &CheckRule) -> Option<RuleOutcome> {
        // Targets are checked in `build`, so this lookup always hits.
        self.documents
            .get(rule.target_document().as_str())
            .map(|document| evaluate_rule(rule, document, &self.options))
    }
}

/// Validates a rule set against a manifest in one call.
///
/// # Errors
///
/// Returns any setup error; see [`ValidatorBuilder::build`].
pub fn validate(
    rules: RuleSet,
    manifest: DocumentManifest,
    options: MatchOptions,
) -> Result<Report, ValidateError> {
    let validator = Validator::builder()
        .rule_set(rules)
        .manifest(manifest)
        .options(options)
        .build()?;
    Ok(validator.validate())
}
