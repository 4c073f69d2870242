//! Pure domain model for check rules.
//!
//! This module contains no serde and no I/O dependencies.
//! All invariants are enforced at construction time via validated newtypes.

use crate::utils::{fold, normalize};
use regex::Regex;
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

// ────────────────────────────────────────────
// Newtypes with validation
// ────────────────────────────────────────────

/// A validated rule identifier (non-empty, no whitespace).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RuleId(String);

impl RuleId {
    /// Creates a new rule id.
    ///
    /// # Errors
    ///
    /// Returns error if the id is empty or contains whitespace.
    pub fn new(id: &str) -> Result<Self, ModelError> {
        if id.is_empty() {
            return Err(ModelError::EmptyRuleId);
        }
        if id.chars().any(char::is_whitespace) {
            return Err(ModelError::InvalidRuleId { id: id.to_string() });
        }
        Ok(Self(id.to_string()))
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated logical document name (non-empty, trimmed).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentName(String);

impl DocumentName {
    /// Creates a new document name.
    ///
    /// # Errors
    ///
    /// Returns error if the name is blank.
    pub fn new(name: &str) -> Result<Self, ModelError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ModelError::EmptyDocumentName);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ────────────────────────────────────────────
// Matchers
// ────────────────────────────────────────────

/// Matches a section title and captures its body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingMatcher {
    pattern: String,
    level: Option<usize>,
    lines: Option<usize>,
}

impl HeadingMatcher {
    /// Creates a heading matcher.
    ///
    /// # Errors
    ///
    /// Returns error if the pattern is blank or the level is out of range.
    pub fn new(pattern: &str) -> Result<Self, ModelError> {
        let pattern = normalize(pattern);
        if pattern.is_empty() {
            return Err(ModelError::EmptyHeadingPattern);
        }
        Ok(Self {
            pattern,
            level: None,
            lines: None,
        })
    }

    /// Restricts matches to headings of exactly this level.
    ///
    /// # Errors
    ///
    /// Returns error if the level is outside `1..=6`.
    pub fn with_level(mut self, level: usize) -> Result<Self, ModelError> {
        if !(1..=crate::document::MAX_HEADING_LEVEL).contains(&level) {
            return Err(ModelError::InvalidHeadingLevel { level });
        }
        self.level = Some(level);
        Ok(self)
    }

    /// Overrides the section length.
    #[must_use]
    pub fn with_lines(mut self, lines: usize) -> Self {
        self.lines = Some(lines);
        self
    }

    /// Normalized pattern.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Required heading level, if any.
    #[must_use]
    pub fn level(&self) -> Option<usize> {
        self.level
    }

    /// Section length override, if any.
    #[must_use]
    pub fn lines(&self) -> Option<usize> {
        self.lines
    }
}

/// Keywords that must all appear within a window of consecutive lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordSet {
    keywords: Vec<String>,
    window: Option<usize>,
}

impl KeywordSet {
    /// Creates a keyword set. Keywords are case-folded; duplicates are dropped.
    ///
    /// # Errors
    ///
    /// Returns error if no non-blank keyword remains.
    pub fn new<I, S>(keywords: I) -> Result<Self, ModelError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let keywords: Vec<String> = keywords
            .into_iter()
            .map(|k| fold(k.as_ref().trim()))
            .filter(|k| !k.is_empty() && seen.insert(k.clone()))
            .collect();
        if keywords.is_empty() {
            return Err(ModelError::EmptyKeywordSet);
        }
        Ok(Self {
            keywords,
            window: None,
        })
    }

    /// Overrides the window size.
    ///
    /// # Errors
    ///
    /// Returns error if the window is zero.
    pub fn with_window(mut self, window: usize) -> Result<Self, ModelError> {
        if window == 0 {
            return Err(ModelError::ZeroWindow);
        }
        self.window = Some(window);
        Ok(self)
    }

    /// Case-folded keywords in declaration order.
    #[must_use]
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Window size override, if any.
    #[must_use]
    pub fn window(&self) -> Option<usize> {
        self.window
    }
}

/// The content test a matcher performs.
#[derive(Debug, Clone)]
pub enum MatcherKind {
    /// Section title containing a pattern.
    Heading(HeadingMatcher),
    /// Co-occurring keywords.
    Keywords(KeywordSet),
    /// Fenced code block tagged with one of the accepted languages.
    CodeFence(Vec<String>),
    /// Regular expression matched line by line.
    Pattern(Regex),
}

/// One atomic content-presence test.
#[derive(Debug, Clone)]
pub struct Matcher {
    kind: MatcherKind,
    within: Option<String>,
}

impl Matcher {
    /// Creates a heading matcher.
    #[must_use]
    pub fn heading(matcher: HeadingMatcher) -> Self {
        Self {
            kind: MatcherKind::Heading(matcher),
            within: None,
        }
    }

    /// Creates a keyword-set matcher.
    #[must_use]
    pub fn keywords(set: KeywordSet) -> Self {
        Self {
            kind: MatcherKind::Keywords(set),
            within: None,
        }
    }

    /// Creates a code-fence matcher for one language.
    ///
    /// # Errors
    ///
    /// Returns error if the language is blank.
    pub fn code_fence(language: &str) -> Result<Self, ModelError> {
        Self::code_fence_any([language])
    }

    /// Creates a code-fence matcher satisfied by any of `accepted`
    /// (e.g. `sh`, `bash` and `shell` for a shell snippet).
    ///
    /// # Errors
    ///
    /// Returns error if the list is empty or any language is blank.
    pub fn code_fence_any<I, S>(accepted: I) -> Result<Self, ModelError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut languages: Vec<String> = Vec::new();
        for language in accepted {
            let language = fold(language.as_ref().trim());
            if language.is_empty() {
                return Err(ModelError::EmptyFenceLanguage);
            }
            if !languages.contains(&language) {
                languages.push(language);
            }
        }
        if languages.is_empty() {
            return Err(ModelError::EmptyFenceLanguage);
        }
        Ok(Self {
            kind: MatcherKind::CodeFence(languages),
            within: None,
        })
    }

    /// Creates a regular-expression matcher.
    ///
    /// # Errors
    ///
    /// Returns error if the pattern is empty or fails to compile.
    pub fn pattern(pattern: &str) -> Result<Self, ModelError> {
        if pattern.is_empty() {
            return Err(ModelError::EmptyPattern);
        }
        let regex = Regex::new(pattern).map_err(|e| ModelError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            kind: MatcherKind::Pattern(regex),
            within: None,
        })
    }

    /// Bounds the search to the section under a heading.
    ///
    /// # Errors
    ///
    /// Returns error for heading matchers (they define sections themselves)
    /// or a blank heading.
    pub fn within(mut self, heading: &str) -> Result<Self, ModelError> {
        if matches!(self.kind, MatcherKind::Heading(_)) {
            return Err(ModelError::NestedHeadingScope);
        }
        let heading = normalize(heading);
        if heading.is_empty() {
            return Err(ModelError::EmptyHeadingPattern);
        }
        self.within = Some(heading);
        Ok(self)
    }

    /// The content test.
    #[must_use]
    pub fn kind(&self) -> &MatcherKind {
        &self.kind
    }

    /// Normalized heading bounding the search, if any.
    #[must_use]
    pub fn scope(&self) -> Option<&str> {
        self.within.as_deref()
    }

    /// Human-readable description, used for evidence and `missing` entries.
    #[must_use]
    pub fn describe(&self) -> String {
        let base = match &self.kind {
            MatcherKind::Heading(h) => match h.level {
                Some(level) => format!("heading \"{}\" (level {level})", h.pattern),
                None => format!("heading \"{}\"", h.pattern),
            },
            MatcherKind::Keywords(k) => {
                let words = k.keywords.join(", ");
                match k.window {
                    Some(w) => format!("keywords [{words}] within {w} lines"),
                    None => format!("keywords [{words}]"),
                }
            }
            MatcherKind::CodeFence(languages) => {
                let accepted: Vec<String> = languages.iter().map(|l| format!("`{l}`")).collect();
                format!("code fence {}", accepted.join(" or "))
            }
            MatcherKind::Pattern(re) => format!("pattern /{}/", re.as_str()),
        };
        match &self.within {
            Some(section) => format!("{base} in section \"{section}\""),
            None => base,
        }
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe())
    }
}

// ────────────────────────────────────────────
// Domain entities
// ────────────────────────────────────────────

/// One required piece of documentation content.
#[derive(Debug, Clone)]
pub struct CheckRule {
    id: RuleId,
    description: String,
    target_document: DocumentName,
    matchers: Vec<Matcher>,
    required: bool,
}

impl CheckRule {
    /// Creates a check rule.
    ///
    /// # Errors
    ///
    /// Returns error if `matchers` is empty.
    pub fn new(
        id: RuleId,
        description: impl Into<String>,
        target_document: DocumentName,
        matchers: Vec<Matcher>,
        required: bool,
    ) -> Result<Self, ModelError> {
        if matchers.is_empty() {
            return Err(ModelError::EmptyMatchers { rule: id });
        }
        Ok(Self {
            id,
            description: description.into(),
            target_document,
            matchers,
            required,
        })
    }

    /// Returns the rule id.
    #[must_use]
    pub fn id(&self) -> &RuleId {
        &self.id
    }

    /// Returns the requirement text.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the document this rule searches.
    #[must_use]
    pub fn target_document(&self) -> &DocumentName {
        &self.target_document
    }

    /// Returns the matchers in evaluation order.
    #[must_use]
    pub fn matchers(&self) -> &[Matcher] {
        &self.matchers
    }

    /// Whether absence fails (rather than partially passes) the rule.
    #[must_use]
    pub fn required(&self) -> bool {
        self.required
    }

    /// Returns a copy with a different `required` flag.
    #[must_use]
    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }
}

/// A document declared in a rule set's manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentDecl {
    name: DocumentName,
    path: PathBuf,
}

impl DocumentDecl {
    /// Creates a document declaration.
    #[must_use]
    pub fn new(name: DocumentName, path: impl Into<PathBuf>) -> Self {
        Self {
            name,
            path: path.into(),
        }
    }

    /// Logical name.
    #[must_use]
    pub fn name(&self) -> &DocumentName {
        &self.name
    }

    /// Path as declared (relative to the config file).
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

// ────────────────────────────────────────────
// Aggregate root
// ────────────────────────────────────────────

/// Validated rule set: unique ids, declared targets.
///
/// This is the aggregate root: all queries go through here.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    documents: Vec<DocumentDecl>,
    rules: Vec<CheckRule>,
}

impl RuleSet {
    /// Creates a rule set with full validation.
    ///
    /// Duplicate ids are reported before target references so the
    /// duplicate error wins when both are present.
    ///
    /// # Errors
    ///
    /// Returns the first duplicate document, duplicate rule id, or rule
    /// referencing an undeclared document.
    pub fn new(documents: Vec<DocumentDecl>, rules: Vec<CheckRule>) -> Result<Self, ModelError> {
        let mut names = HashSet::new();
        for doc in &documents {
            if !names.insert(doc.name.clone()) {
                return Err(ModelError::DuplicateDocument {
                    name: doc.name.clone(),
                });
            }
        }

        let mut ids = HashSet::new();
        for rule in &rules {
            if !ids.insert(rule.id.clone()) {
                return Err(ModelError::DuplicateRuleId {
                    id: rule.id.clone(),
                });
            }
        }

        for rule in &rules {
            if !names.contains(&rule.target_document) {
                return Err(ModelError::UndeclaredDocument {
                    rule: rule.id.clone(),
                    document: rule.target_document.clone(),
                });
            }
        }

        Ok(Self { documents, rules })
    }

    /// Creates an empty rule set.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns true if no rules are defined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Declared documents in declaration order.
    #[must_use]
    pub fn documents(&self) -> &[DocumentDecl] {
        &self.documents
    }

    /// Rules in declaration order.
    #[must_use]
    pub fn rules(&self) -> &[CheckRule] {
        &self.rules
    }

    /// Gets a rule by id.
    #[must_use]
    pub fn rule(&self, id: &str) -> Option<&CheckRule> {
        self.rules.iter().find(|r| r.id.as_str() == id)
    }

    /// Declared documents referenced by at least one rule.
    #[must_use]
    pub fn referenced_documents(&self) -> Vec<&DocumentDecl> {
        self.documents
            .iter()
            .filter(|d| self.rules.iter().any(|r| r.target_document == d.name))
            .collect()
    }

    /// Keeps only the rules accepted by `keep`, preserving order.
    #[must_use]
    pub fn retain<F>(mut self, keep: F) -> Self
    where
        F: FnMut(&CheckRule) -> bool,
    {
        self.rules.retain(keep);
        self
    }

    /// Consumes the rule set, returning documents and rules.
    #[must_use]
    pub fn into_parts(self) -> (Vec<DocumentDecl>, Vec<CheckRule>) {
        (self.documents, self.rules)
    }
}

// ────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────

/// Errors in domain model construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// Rule id is empty.
    #[error("rule id must not be empty")]
    EmptyRuleId,

    /// Rule id contains whitespace.
    #[error("invalid rule id `{id}`: must not contain whitespace")]
    InvalidRuleId {
        /// The invalid id.
        id: String,
    },

    /// Document name is blank.
    #[error("document name must not be empty")]
    EmptyDocumentName,

    /// A rule has no matchers.
    #[error("rule `{rule}` has no matchers")]
    EmptyMatchers {
        /// The rule without matchers.
        rule: RuleId,
    },

    /// Heading pattern is blank.
    #[error("heading pattern must not be empty")]
    EmptyHeadingPattern,

    /// Heading level out of range.
    #[error("heading level {level} is out of range 1..=6")]
    InvalidHeadingLevel {
        /// The invalid level.
        level: usize,
    },

    /// Keyword set has no keywords.
    #[error("keyword set must contain at least one keyword")]
    EmptyKeywordSet,

    /// Window of zero lines.
    #[error("keyword window must be at least 1 line")]
    ZeroWindow,

    /// Code fence language is blank.
    #[error("code fence language must not be empty")]
    EmptyFenceLanguage,

    /// Regular expression is empty.
    #[error("pattern must not be empty")]
    EmptyPattern,

    /// Regular expression fails to compile.
    #[error("invalid pattern `{pattern}`: {reason}")]
    InvalidPattern {
        /// The invalid pattern.
        pattern: String,
        /// Why it's invalid.
        reason: String,
    },

    /// `within` used on a heading matcher.
    #[error("`within` cannot be combined with a heading matcher")]
    NestedHeadingScope,

    /// Two documents share a name.
    #[error("document `{name}` is declared more than once")]
    DuplicateDocument {
        /// The duplicated name.
        name: DocumentName,
    },

    /// Two rules share an id.
    #[error("duplicate rule id `{id}`")]
    DuplicateRuleId {
        /// The duplicated id.
        id: RuleId,
    },

    /// A rule references a document missing from the manifest.
    #[error("rule `{rule}` targets undeclared document `{document}`")]
    UndeclaredDocument {
        /// The referencing rule.
        rule: RuleId,
        /// The missing document.
        document: DocumentName,
    },
}

// ────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────
