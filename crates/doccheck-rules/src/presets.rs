//! Checklist presets for common configurations.

use crate::checklists::{Checklist, ARCHITECTURE, DEPLOYMENT, README};
use doccheck_core::declarative::config_dto::RuleSetDto;
use doccheck_core::declarative::load_merged;
use doccheck_core::declarative::loader::LoadError;
use doccheck_core::declarative::model::RuleSet;

/// README checks kept by [`Preset::Minimal`].
const MINIMAL_CHECKS: [&str; 4] = ["README-001", "README-002", "README-003", "README-004"];

/// Preset configurations for doccheck.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// README and deployment checklists as written.
    Recommended,
    /// Every checklist, with every check required.
    Strict,
    /// README core checks for gradual adoption.
    Minimal,
}

impl Preset {
    /// All presets, in display order.
    pub const ALL: [Self; 3] = [Self::Recommended, Self::Strict, Self::Minimal];

    /// Parses a preset name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "recommended" => Some(Self::Recommended),
            "strict" => Some(Self::Strict),
            "minimal" => Some(Self::Minimal),
            _ => None,
        }
    }

    /// Preset name as used in configuration.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Recommended => "recommended",
            Self::Strict => "strict",
            Self::Minimal => "minimal",
        }
    }

    /// Checklists included in this preset.
    #[must_use]
    pub fn checklists(self) -> Vec<Checklist> {
        match self {
            Self::Recommended => vec![README, DEPLOYMENT],
            Self::Strict => vec![README, DEPLOYMENT, ARCHITECTURE],
            Self::Minimal => vec![README],
        }
    }

    /// Returns the merged checks of this preset.
    ///
    /// # Errors
    ///
    /// Returns an error if an embedded checklist is invalid.
    pub fn rule_set(self) -> Result<RuleSetDto, toml::de::Error> {
        let mut merged = RuleSetDto::default();
        for list in self.checklists() {
            merged = merged.merge(list.dto()?);
        }

        match self {
            Self::Recommended => {}
            Self::Strict => {
                for check in &mut merged.checks {
                    check.required = true;
                }
            }
            Self::Minimal => merged.checks.retain(|c| {
                c.id
                    .as_deref()
                    .is_some_and(|id| MINIMAL_CHECKS.contains(&id))
            }),
        }

        tracing::debug!(
            "Preset {} contributes {} check(s)",
            self.name(),
            merged.checks.len()
        );
        Ok(merged)
    }
}

/// Errors while assembling presets and project checks into one rule set.
#[derive(Debug, thiserror::Error)]
pub enum PresetError {
    /// The preset name is not recognized.
    #[error("unknown preset `{0}`. Valid presets: recommended, strict, minimal")]
    Unknown(String),

    /// An embedded checklist failed to parse.
    #[error("built-in checklist is invalid: {0}")]
    Checklist(#[from] toml::de::Error),

    /// The merged rule set is invalid.
    #[error(transparent)]
    Load(#[from] LoadError),
}

/// Builds the effective rule set from an optional preset name and the
/// project's own declarative sections.
///
/// A named preset is always applied. Without one, `recommended` is used
/// only when the project declares no checks of its own. Project documents
/// replace preset documents of the same name, so a project can point a
/// checklist at a different path.
///
/// # Errors
///
/// Returns `Unknown` for a bad preset name, or `Load` when the merged
/// rule set is invalid (e.g., a project check reuses a preset id).
pub fn resolve_rule_set(preset: Option<&str>, project: RuleSetDto) -> Result<RuleSet, PresetError> {
    let preset = match preset {
        Some(name) => {
            Some(Preset::from_name(name).ok_or_else(|| PresetError::Unknown(name.to_string()))?)
        }
        None if project.checks.is_empty() => Some(Preset::Recommended),
        None => None,
    };

    let presets = match preset {
        Some(p) => vec![p.rule_set()?],
        None => Vec::new(),
    };
    Ok(load_merged(presets, project)?)
}

impl std::fmt::Display for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doccheck_core::declarative::loader;

    #[test]
    fn test_preset_rule_sets() {
        for preset in Preset::ALL {
            let dto = preset.rule_set().unwrap();
            assert!(!dto.checks.is_empty(), "{preset} is empty");
            loader::load(dto).unwrap();
        }
    }

    #[test]
    fn strict_requires_everything() {
        let dto = Preset::Strict.rule_set().unwrap();
        assert!(dto.checks.iter().all(|c| c.required));
        assert_eq!(dto.documents.len(), 3);
    }

    #[test]
    fn recommended_keeps_optional_checks() {
        let dto = Preset::Recommended.rule_set().unwrap();
        assert!(dto.checks.iter().any(|c| !c.required));
        assert_eq!(dto.documents.len(), 2);
    }

    #[test]
    fn minimal_is_readme_core() {
        let ids: Vec<String> = Preset::Minimal
            .rule_set()
            .unwrap()
            .checks
            .into_iter()
            .filter_map(|c| c.id)
            .collect();
        assert_eq!(ids, MINIMAL_CHECKS);
    }

    #[test]
    fn project_without_checks_gets_recommended() {
        let set = resolve_rule_set(None, RuleSetDto::default()).unwrap();
        assert!(set.rule("README-001").is_some());
        assert!(set.rule("DEPLOY-005").is_some());
        assert!(set.rule("ARCH-001").is_none());
    }

    #[test]
    fn project_checks_without_preset_stand_alone() {
        let project = doccheck_core::declarative::parse_dto(
            r#"
[[documents]]
name = "GUIDE"
path = "GUIDE.md"

[[checks]]
id = "GUIDE-1"
document = "GUIDE"
matchers = [{ heading = "Setup" }]
"#,
        )
        .unwrap();
        let set = resolve_rule_set(None, project).unwrap();
        assert_eq!(set.rules().len(), 1);
    }

    #[test]
    fn project_document_overrides_preset_path() {
        let project = doccheck_core::declarative::parse_dto(
            r#"
[[documents]]
name = "README"
path = "docs/README.md"
"#,
        )
        .unwrap();
        let set = resolve_rule_set(Some("minimal"), project).unwrap();
        assert_eq!(set.documents().len(), 1);
        assert_eq!(set.documents()[0].path(), std::path::Path::new("docs/README.md"));
    }

    #[test]
    fn duplicate_preset_id_is_rejected() {
        let project = doccheck_core::declarative::parse_dto(
            r#"
[[checks]]
id = "README-001"
document = "README"
matchers = [{ heading = "Intro" }]
"#,
        )
        .unwrap();
        let err = resolve_rule_set(Some("minimal"), project).unwrap_err();
        assert!(matches!(err, PresetError::Load(LoadError::DuplicateRuleId { .. })));
    }

    #[test]
    fn unknown_preset_is_rejected() {
        let err = resolve_rule_set(Some("paranoid"), RuleSetDto::default()).unwrap_err();
        assert!(matches!(err, PresetError::Unknown(ref name) if name == "paranoid"));
    }

    #[test]
    fn preset_names_round_trip() {
        for preset in Preset::ALL {
            assert_eq!(Preset::from_name(preset.name()), Some(preset));
        }
        assert_eq!(Preset::from_name(" Strict "), Some(Preset::Strict));
        assert_eq!(Preset::from_name("paranoid"), None);
    }
}
