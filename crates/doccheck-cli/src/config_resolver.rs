//! Configuration file resolution with global fallback.
//!
//! Resolves the configuration file path using a deterministic priority order:
//!
//! 1. `--config` flag (explicit path)
//! 2. `{project}/doccheck.toml` or `.doccheck.toml`
//! 3. `$DOCCHECK_CONFIG_DIR/config.toml` or `~/.doccheck/config.toml`
//! 4. No config found → defaults (recommended preset)
//!
//! Relative `[[documents]]` paths resolve against the directory of an
//! explicit or project config, and against the project directory otherwise.

use std::path::{Path, PathBuf};

/// Where the configuration was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly specified via `--config` flag.
    Explicit(PathBuf),
    /// Found in the project directory.
    Project(PathBuf),
    /// Loaded from the global config directory (`~/.doccheck/`).
    Global(PathBuf),
    /// No config found; defaults will be used.
    Default,
}

impl ConfigSource {
    /// Returns the resolved path, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Explicit(p) | Self::Project(p) | Self::Global(p) => Some(p),
            Self::Default => None,
        }
    }

    /// Returns `true` if the config was loaded from the global directory.
    #[must_use]
    pub fn is_global(&self) -> bool {
        matches!(self, Self::Global(_))
    }

    /// Directory that relative document paths are resolved against.
    #[must_use]
    pub fn base_dir(&self, project_dir: &Path) -> PathBuf {
        match self {
            Self::Explicit(p) | Self::Project(p) => p
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .map_or_else(|| project_dir.to_path_buf(), Path::to_path_buf),
            Self::Global(_) | Self::Default => project_dir.to_path_buf(),
        }
    }

    /// Reads the raw TOML content; empty for [`ConfigSource::Default`].
    ///
    /// # Errors
    ///
    /// Returns an error if the resolved file cannot be read.
    pub fn read(&self) -> std::io::Result<String> {
        match self.path() {
            Some(p) => std::fs::read_to_string(p),
            None => Ok(String::new()),
        }
    }
}

/// Project-level config file names, checked in order.
const PROJECT_CONFIG_NAMES: &[&str] = &["doccheck.toml", ".doccheck.toml"];

/// Config file name within the global config directory.
const GLOBAL_CONFIG_NAME: &str = "config.toml";

/// Resolves the configuration file path.
///
/// See module-level docs for resolution order.
#[must_use]
pub fn resolve(project_dir: &Path, explicit: Option<&Path>) -> ConfigSource {
    resolve_inner(project_dir, explicit, global_config_dir())
}

/// Testable core: accepts `global_dir` as parameter to avoid env var races.
fn resolve_inner(
    project_dir: &Path,
    explicit: Option<&Path>,
    global_dir: Option<PathBuf>,
) -> ConfigSource {
    if let Some(p) = explicit {
        return ConfigSource::Explicit(p.to_path_buf());
    }

    for name in PROJECT_CONFIG_NAMES {
        let candidate = project_dir.join(name);
        if candidate.exists() {
            tracing::debug!("Found project config: {}", candidate.display());
            return ConfigSource::Project(candidate);
        }
    }

    if let Some(dir) = global_dir {
        let candidate = dir.join(GLOBAL_CONFIG_NAME);
        if candidate.exists() {
            tracing::debug!("Found global config: {}", candidate.display());
            return ConfigSource::Global(candidate);
        }
    }

    ConfigSource::Default
}

/// Returns the global config directory path.
///
/// Resolution: `$DOCCHECK_CONFIG_DIR` > `~/.doccheck/`
#[must_use]
pub fn global_config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("DOCCHECK_CONFIG_DIR") {
        return Some(PathBuf::from(dir));
    }
    home::home_dir().map(|h| h.join(".doccheck"))
}
