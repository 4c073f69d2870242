//! Built-in checklists, written in the same TOML as project rule sets.

use doccheck_core::declarative::config_dto::RuleSetDto;
use doccheck_core::declarative::parse_dto;

/// A named, built-in set of checks for one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checklist {
    /// Checklist name (e.g., "readme").
    pub name: &'static str,
    /// Logical document the checks target.
    pub document: &'static str,
    /// Default path of the document, relative to the project root.
    pub default_path: &'static str,
    source: &'static str,
}

impl Checklist {
    /// Raw TOML source of the checklist.
    #[must_use]
    pub fn source(&self) -> &'static str {
        self.source
    }

    /// Parses the checklist into a DTO ready for merging.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded TOML is invalid.
    pub fn dto(&self) -> Result<RuleSetDto, toml::de::Error> {
        parse_dto(self.source)
    }
}

/// README: overview, prerequisites, installation, usage, configuration.
pub const README: Checklist = Checklist {
    name: "readme",
    document: "README",
    default_path: "README.md",
    source: include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/checklists/readme.toml")),
};

/// Deployment guide: prerequisites, platform, manifests, environment, rollback.
pub const DEPLOYMENT: Checklist = Checklist {
    name: "deployment",
    document: "DEPLOYMENT",
    default_path: "docs/deployment.md",
    source: include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/checklists/deployment.toml")),
};

/// Architecture document: overview, components, data flow, diagram.
pub const ARCHITECTURE: Checklist = Checklist {
    name: "architecture",
    document: "ARCHITECTURE",
    default_path: "docs/architecture.md",
    source: include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/checklists/architecture.toml")),
};

/// Returns all built-in checklists.
#[must_use]
pub fn all_checklists() -> [Checklist; 3] {
    [README, DEPLOYMENT, ARCHITECTURE]
}

/// Finds a checklist by name.
#[must_use]
pub fn checklist(name: &str) -> Option<Checklist> {
    all_checklists()
        .into_iter()
        .find(|c| c.name.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use doccheck_core::declarative::loader;
    use doccheck_core::RuleStatus;

    #[test]
    fn every_checklist_loads() {
        for list in all_checklists() {
            let dto = list.dto().unwrap();
            assert_eq!(dto.documents.len(), 1, "{}", list.name);
            assert_eq!(dto.documents[0].name, list.document);
            assert_eq!(dto.documents[0].path, list.default_path);

            let set = loader::load(dto).unwrap();
            assert!(!set.is_empty(), "{} has no checks", list.name);
            assert!(set
                .rules()
                .iter()
                .all(|r| r.target_document().as_str() == list.document));
        }
    }

    #[test]
    fn checklist_lookup_is_case_insensitive() {
        assert_eq!(checklist("README"), Some(README));
        assert_eq!(checklist("deployment"), Some(DEPLOYMENT));
        assert_eq!(checklist("changelog"), None);
    }

    #[test]
    fn readme_check_ids() {
        let ids: Vec<String> = README
            .dto()
            .unwrap()
            .checks
            .into_iter()
            .filter_map(|c| c.id)
            .collect();
        insta::assert_snapshot!(ids.join("\n"), @r"
        README-001
        README-002
        README-003
        README-004
        README-005
        ");
    }

    fn outcome(list: Checklist, id: &str, text: &str) -> doccheck_core::RuleOutcome {
        let set = loader::load(list.dto().unwrap()).unwrap();
        let rule = set.rule(id).unwrap();
        let document = doccheck_core::Document::parse(list.document, text).unwrap();
        doccheck_core::evaluate_rule(rule, &document, &doccheck_core::MatchOptions::default())
    }

    #[test]
    fn installation_accepts_common_shell_fences() {
        for language in ["sh", "bash", "shell", "console"] {
            let readme = format!(
                "# Tool\n\n## Installation\n\n```{language}\ncargo install tool\n```\n"
            );
            let status = outcome(README, "README-003", &readme).status();
            assert_eq!(status, RuleStatus::Pass, "{language}");
        }
        let python = "# Tool\n\n## Installation\n\n```python\nimport tool\n```\n";
        assert_eq!(outcome(README, "README-003", python).status(), RuleStatus::Fail);
    }

    #[test]
    fn diagram_section_without_diagram_is_partial() {
        let doc = "# Arch\n\n## Diagram\n\nSee the wiki.\n";
        assert_eq!(outcome(ARCHITECTURE, "ARCH-004", doc).status(), RuleStatus::Partial);

        let doc = "# Arch\n\n## Diagram\n\n```mermaid\ngraph TD\n```\n";
        assert_eq!(outcome(ARCHITECTURE, "ARCH-004", doc).status(), RuleStatus::Pass);
    }
}
