//! TOML deserialization types (DTO layer).
//!
//! These types exist solely for serde deserialization.
//! They are converted to domain model types via the loader.

use serde::{Deserialize, Serialize};

/// Raw TOML representation of a rule set.
///
/// Shares the config file with [`crate::Config`]; only the `[[documents]]`
/// and `[[checks]]` sections are read here.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RuleSetDto {
    /// Document manifest: logical names and their paths.
    #[serde(default)]
    pub documents: Vec<DocumentDto>,

    /// Ordered check rules.
    #[serde(default)]
    pub checks: Vec<CheckDto>,
}

impl RuleSetDto {
    /// Merges `overlay` on top of `self`.
    ///
    /// Documents with the same name are replaced in place (so a project can
    /// point a preset's `README` somewhere else); new documents and all
    /// checks are appended in order.
    #[must_use]
    pub fn merge(mut self, overlay: Self) -> Self {
        for doc in overlay.documents {
            match self.documents.iter_mut().find(|d| d.name == doc.name) {
                Some(existing) => *existing = doc,
                None => self.documents.push(doc),
            }
        }
        self.checks.extend(overlay.checks);
        self
    }
}

/// TOML representation of a declared document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DocumentDto {
    /// Logical name (e.g., "README").
    pub name: String,
    /// Path relative to the config file.
    pub path: String,
}

/// TOML representation of a check rule.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CheckDto {
    /// Stable identifier (e.g., "AC-1").
    #[serde(default)]
    pub id: Option<String>,
    /// Requirement text.
    #[serde(default)]
    pub description: String,
    /// Target document name.
    #[serde(default)]
    pub document: Option<String>,
    /// Whether absence fails the rule (default: true).
    #[serde(default = "default_true")]
    pub required: bool,
    /// Ordered matchers.
    #[serde(default)]
    pub matchers: Vec<MatcherDto>,
}

/// TOML representation of a matcher.
///
/// Exactly one of `heading`, `keywords`, `code-fence` or `pattern` must be set.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct MatcherDto {
    /// Heading substring to look for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
    /// Restrict heading matches to one level.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<usize>,
    /// Section length override for heading matches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lines: Option<usize>,
    /// Keywords that must co-occur.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    /// Window size override for keyword sets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window: Option<usize>,
    /// Accepted code fence language(s).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_fence: Option<FenceLanguages>,
    /// Regular expression matched per line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Heading whose section bounds the search.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub within: Option<String>,
}

/// `code-fence = "yaml"` or `code-fence = ["sh", "bash"]`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum FenceLanguages {
    /// A single language.
    One(String),
    /// Any of several languages.
    Any(Vec<String>),
}

impl FenceLanguages {
    /// The accepted languages in declaration order.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        match self {
            Self::One(language) => std::slice::from_ref(language),
            Self::Any(languages) => languages,
        }
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_empty() {
        let dto: RuleSetDto = toml::from_str("").unwrap();
        assert!(dto.documents.is_empty());
        assert!(dto.checks.is_empty());
    }

    #[test]
    fn deserialize_full_rule_set() {
        let toml_str = r#"
preset = "minimal"

[[documents]]
name = "README"
path = "README.md"

[[checks]]
id = "AC-1"
description = "README lists prerequisites"
document = "README"
matchers = [{ heading = "Prerequisites" }]

[[checks]]
id = "AC-2"
description = "Deployment covers kubernetes"
document = "README"
required = false
matchers = [
    { keywords = ["kubectl", "apply"], window = 5 },
    { code-fence = "yaml", within = "Deployment" },
]
"#;
        let dto: RuleSetDto = toml::from_str(toml_str).unwrap();
        assert_eq!(dto.documents.len(), 1);
        assert_eq!(dto.checks.len(), 2);
        assert!(dto.checks[0].required);
        assert!(!dto.checks[1].required);
        assert_eq!(dto.checks[1].matchers[0].window, Some(5));
        assert_eq!(
            dto.checks[1].matchers[1].code_fence,
            Some(FenceLanguages::One("yaml".to_string()))
        );
    }

    #[test]
    fn code_fence_accepts_a_language_list() {
        let dto: MatcherDto = toml::from_str(r#"code-fence = ["sh", "bash"]"#).unwrap();
        let languages = dto.code_fence.unwrap();
        assert_eq!(languages.as_slice(), ["sh".to_string(), "bash".to_string()]);
    }

    #[test]
    fn missing_id_still_deserializes() {
        let dto: RuleSetDto = toml::from_str(
            r#"
[[checks]]
document = "README"
matchers = [{ heading = "Usage" }]
"#,
        )
        .unwrap();
        assert!(dto.checks[0].id.is_none());
    }

    #[test]
    fn merge_replaces_documents_and_appends_checks() {
        let base: RuleSetDto = toml::from_str(
            r#"
[[documents]]
name = "README"
path = "README.md"

[[checks]]
id = "A"
document = "README"
matchers = [{ heading = "Usage" }]
"#,
        )
        .unwrap();
        let overlay: RuleSetDto = toml::from_str(
            r#"
[[documents]]
name = "README"
path = "docs/index.md"

[[documents]]
name = "GUIDE"
path = "GUIDE.md"

[[checks]]
id = "B"
document = "GUIDE"
matchers = [{ heading = "Intro" }]
"#,
        )
        .unwrap();

        let merged = base.merge(overlay);
        assert_eq!(merged.documents.len(), 2);
        assert_eq!(merged.documents[0].path, "docs/index.md");
        let ids: Vec<_> = merged.checks.iter().filter_map(|c| c.id.as_deref()).collect();
        assert_eq!(ids, vec!["A", "B"]);
    }
}
