//! User-level scope defaults
//!
//! Records the last-used `{project, dataset}` pair in a JSON file under the
//! user config directory so tool calls can omit the scope.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use ccx_domain::scope::Scope;
use ccx_domain::{Error, Result};

/// File name inside the config directory
const DEFAULTS_FILENAME: &str = "defaults.json";

/// Persisted defaults
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScopeDefaults {
    /// Default project name
    pub project: String,
    /// Default dataset name
    pub dataset: String,
}

impl ScopeDefaults {
    /// View as a scope
    pub fn scope(&self) -> Scope {
        Scope::new(self.project.clone(), self.dataset.clone())
    }
}

/// Well-known path of the defaults file
pub fn defaults_path() -> Result<PathBuf> {
    let config_dir =
        dirs::config_dir().ok_or_else(|| Error::io("unable to determine config directory"))?;
    Ok(config_dir.join("claude-context").join(DEFAULTS_FILENAME))
}

/// Load the defaults, if any were stored
pub fn load_defaults() -> Result<Option<ScopeDefaults>> {
    load_defaults_from(&defaults_path()?)
}

/// Load defaults from an explicit path
pub fn load_defaults_from(path: &std::path::Path) -> Result<Option<ScopeDefaults>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::io(format!("failed to read defaults file: {e}")))?;
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| Error::io(format!("failed to parse defaults file: {e}")))
}

/// Persist the defaults
pub fn save_defaults(defaults: &ScopeDefaults) -> Result<()> {
    save_defaults_to(&defaults_path()?, defaults)
}

/// Persist defaults to an explicit path
pub fn save_defaults_to(path: &std::path::Path, defaults: &ScopeDefaults) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| Error::io(format!("failed to create config directory: {e}")))?;
    }
    let json = serde_json::to_string_pretty(defaults)?;
    std::fs::write(path, json).map_err(|e| Error::io(format!("failed to write defaults file: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("defaults.json");

        assert_eq!(load_defaults_from(&path).unwrap(), None);

        let defaults = ScopeDefaults {
            project: "8x1hQk2a-acme-Zp3mW9Lt".to_string(),
            dataset: "local".to_string(),
        };
        save_defaults_to(&path, &defaults).unwrap();

        let loaded = load_defaults_from(&path).unwrap().unwrap();
        assert_eq!(loaded, defaults);
        assert_eq!(loaded.scope().dataset, "local");
    }
}
