//! DTO → Domain model conversion with validation.

use super::config_dto::{CheckDto, DocumentDto, MatcherDto, RuleSetDto};
use super::model::{
    CheckRule, DocumentDecl, DocumentName, HeadingMatcher, KeywordSet, Matcher, ModelError,
    RuleId, RuleSet,
};

/// Errors during DTO → Domain conversion.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    /// A rule (or document) is structurally invalid.
    #[error("{context}: {source}")]
    MalformedRule {
        /// Where the error occurred (e.g., "checks[0].matchers[1]").
        context: String,
        /// The underlying model error.
        source: ModelError,
    },

    /// A required field is missing.
    #[error("{context}: missing required field `{field}`")]
    MissingField {
        /// Where the error occurred.
        context: String,
        /// The missing field.
        field: &'static str,
    },

    /// A matcher sets zero or several of its kind fields.
    #[error("{context}: exactly one of `heading`, `keywords`, `code-fence` or `pattern` must be set")]
    AmbiguousMatcher {
        /// Where the error occurred.
        context: String,
    },

    /// Two rules share an id.
    #[error("duplicate rule id `{id}`")]
    DuplicateRuleId {
        /// The duplicated id.
        id: String,
    },

    /// Two documents share a name.
    #[error("document `{name}` is declared more than once")]
    DuplicateDocument {
        /// The duplicated name.
        name: String,
    },
}

impl LoadError {
    /// Converts an aggregate-level model error, keeping duplicates typed.
    fn from_rule_set(error: ModelError) -> Self {
        match error {
            ModelError::DuplicateRuleId { id } => Self::DuplicateRuleId {
                id: id.as_str().to_string(),
            },
            ModelError::DuplicateDocument { name } => Self::DuplicateDocument {
                name: name.as_str().to_string(),
            },
            ModelError::UndeclaredDocument { rule, document } => Self::MalformedRule {
                context: format!("check '{rule}'"),
                source: ModelError::UndeclaredDocument { rule, document },
            },
            other => Self::MalformedRule {
                context: "rule set".to_string(),
                source: other,
            },
        }
    }
}

/// Converts a `RuleSetDto` to a validated `RuleSet`.
///
/// # Errors
///
/// Returns the first error encountered during conversion.
pub fn load(dto: RuleSetDto) -> Result<RuleSet, LoadError> {
    let documents = dto
        .documents
        .iter()
        .enumerate()
        .map(|(i, d)| convert_document(d, i))
        .collect::<Result<Vec<_>, _>>()?;

    let rules = dto
        .checks
        .into_iter()
        .enumerate()
        .map(|(i, c)| convert_check(c, i))
        .collect::<Result<Vec<_>, _>>()?;

    RuleSet::new(documents, rules).map_err(LoadError::from_rule_set)
}

fn convert_document(dto: &DocumentDto, index: usize) -> Result<DocumentDecl, LoadError> {
    let name = DocumentName::new(&dto.name).map_err(|e| LoadError::MalformedRule {
        context: format!("documents[{index}].name"),
        source: e,
    })?;
    if dto.path.trim().is_empty() {
        return Err(LoadError::MissingField {
            context: format!("documents[{index}]"),
            field: "path",
        });
    }
    Ok(DocumentDecl::new(name, dto.path.trim()))
}

fn convert_check(dto: CheckDto, index: usize) -> Result<CheckRule, LoadError> {
    let ctx = format!("checks[{index}]");

    let raw_id = dto.id.ok_or_else(|| LoadError::MissingField {
        context: ctx.clone(),
        field: "id",
    })?;
    let id = RuleId::new(&raw_id).map_err(|e| LoadError::MalformedRule {
        context: format!("{ctx}.id"),
        source: e,
    })?;

    let ctx = format!("check '{id}'");
    let raw_document = dto.document.ok_or_else(|| LoadError::MissingField {
        context: ctx.clone(),
        field: "document",
    })?;
    let document = DocumentName::new(&raw_document).map_err(|e| LoadError::MalformedRule {
        context: format!("{ctx}.document"),
        source: e,
    })?;

    let matchers = dto
        .matchers
        .iter()
        .enumerate()
        .map(|(i, m)| convert_matcher(m, &format!("{ctx}.matchers[{i}]")))
        .collect::<Result<Vec<_>, _>>()?;

    CheckRule::new(id, dto.description, document, matchers, dto.required).map_err(|e| {
        LoadError::MalformedRule {
            context: ctx,
            source: e,
        }
    })
}

fn convert_matcher(dto: &MatcherDto, context: &str) -> Result<Matcher, LoadError> {
    let malformed = |e: ModelError| LoadError::MalformedRule {
        context: context.to_string(),
        source: e,
    };

    let matcher = match (
        dto.heading.as_deref(),
        dto.keywords.as_ref(),
        dto.code_fence.as_ref(),
        dto.pattern.as_deref(),
    ) {
        (Some(heading), None, None, None) => {
            let mut h = HeadingMatcher::new(heading).map_err(malformed)?;
            if let Some(level) = dto.level {
                h = h.with_level(level).map_err(malformed)?;
            }
            if let Some(lines) = dto.lines {
                h = h.with_lines(lines);
            }
            Matcher::heading(h)
        }
        (None, Some(keywords), None, None) => {
            let mut set = KeywordSet::new(keywords).map_err(malformed)?;
            if let Some(window) = dto.window {
                set = set.with_window(window).map_err(malformed)?;
            }
            Matcher::keywords(set)
        }
        (None, None, Some(languages), None) => {
            Matcher::code_fence_any(languages.as_slice()).map_err(malformed)?
        }
        (None, None, None, Some(pattern)) => Matcher::pattern(pattern).map_err(malformed)?,
        _ => {
            return Err(LoadError::AmbiguousMatcher {
                context: context.to_string(),
            })
        }
    };

    match dto.within.as_deref() {
        Some(section) => matcher.within(section).map_err(malformed),
        None => Ok(matcher),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_and_load(toml_str: &str) -> Result<RuleSet, LoadError> {
        let dto: RuleSetDto = toml::from_str(toml_str).unwrap();
        load(dto)
    }

    // -- Happy path --

    #[test]
    fn load_empty_rule_set() {
        let set = parse_and_load("").unwrap();
        assert!(set.is_empty());
        assert!(set.documents().is_empty());
    }

    #[test]
    fn load_full_rule_set() {
        let set = parse_and_load(
            r#"
[[documents]]
name = "README"
path = "README.md"

[[documents]]
name = "DEPLOYMENT"
path = "docs/deployment.md"

[[checks]]
id = "AC-1"
description = "Prerequisites documented"
document = "README"
matchers = [{ heading = "Prerequisites", level = 2, lines = 10 }]

[[checks]]
id = "AC-2"
description = "Kubernetes rollout"
document = "DEPLOYMENT"
required = false
matchers = [
    { keywords = ["kubectl", "rollout"], window = 4 },
    { code-fence = ["yaml", "yml"], within = "Manifests" },
    { pattern = "helm (install|upgrade)" },
]
"#,
        )
        .unwrap();

        assert_eq!(set.documents().len(), 2);
        assert_eq!(set.rules().len(), 2);
        let ac2 = set.rule("AC-2").unwrap();
        assert!(!ac2.required());
        assert_eq!(ac2.matchers().len(), 3);
        assert_eq!(ac2.matchers()[1].scope(), Some("manifests"));
        assert_eq!(
            ac2.matchers()[1].describe(),
            "code fence `yaml` or `yml` in section \"manifests\""
        );
    }

    // -- Error cases --

    #[test]
    fn load_rejects_missing_id() {
        let result = parse_and_load(
            r#"
[[documents]]
name = "README"
path = "README.md"

[[checks]]
document = "README"
matchers = [{ heading = "Usage" }]
"#,
        );
        assert!(matches!(
            result,
            Err(LoadError::MissingField { field: "id", .. })
        ));
    }

    #[test]
    fn load_rejects_empty_matchers() {
        let result = parse_and_load(
            r#"
[[documents]]
name = "README"
path = "README.md"

[[checks]]
id = "AC-1"
document = "README"
"#,
        );
        assert!(matches!(
            result,
            Err(LoadError::MalformedRule {
                source: ModelError::EmptyMatchers { .. },
                ..
            })
        ));
    }

    #[test]
    fn load_rejects_undeclared_target() {
        let result = parse_and_load(
            r#"
[[checks]]
id = "AC-1"
document = "README"
matchers = [{ heading = "Usage" }]
"#,
        );
        assert!(matches!(
            result,
            Err(LoadError::MalformedRule {
                source: ModelError::UndeclaredDocument { .. },
                ..
            })
        ));
    }

    #[test]
    fn load_rejects_duplicate_ids() {
        let result = parse_and_load(
            r#"
[[documents]]
name = "README"
path = "README.md"

[[checks]]
id = "AC-1"
document = "README"
matchers = [{ heading = "Usage" }]

[[checks]]
id = "AC-1"
document = "README"
matchers = [{ heading = "Install" }]
"#,
        );
        assert_eq!(
            result.unwrap_err(),
            LoadError::DuplicateRuleId {
                id: "AC-1".to_string()
            }
        );
    }

    #[test]
    fn load_rejects_ambiguous_matcher() {
        let result = parse_and_load(
            r#"
[[documents]]
name = "README"
path = "README.md"

[[checks]]
id = "AC-1"
document = "README"
matchers = [{ heading = "Usage", code-fence = "bash" }]
"#,
        );
        assert!(matches!(result, Err(LoadError::AmbiguousMatcher { .. })));
    }

    #[test]
    fn load_rejects_empty_matcher_table() {
        let result = parse_and_load(
            r#"
[[documents]]
name = "README"
path = "README.md"

[[checks]]
id = "AC-1"
document = "README"
matchers = [{}]
"#,
        );
        assert!(matches!(result, Err(LoadError::AmbiguousMatcher { .. })));
    }

    #[test]
    fn load_rejects_zero_window() {
        let result = parse_and_load(
            r#"
[[documents]]
name = "README"
path = "README.md"

[[checks]]
id = "AC-1"
document = "README"
matchers = [{ keywords = ["a"], window = 0 }]
"#,
        );
        assert!(matches!(
            result,
            Err(LoadError::MalformedRule {
                source: ModelError::ZeroWindow,
                ..
            })
        ));
    }

    #[test]
    fn load_rejects_document_without_path() {
        let result = parse_and_load(
            r#"
[[documents]]
name = "README"
path = " "
"#,
        );
        assert!(matches!(
            result,
            Err(LoadError::MissingField { field: "path", .. })
        ));
    }
}
