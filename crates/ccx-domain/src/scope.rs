//! Scope model
//!
//! Deterministic naming of vector collections from (project, dataset) pairs,
//! auto-scoping of filesystem paths, and dataset selector parsing. Collection
//! names are idempotent and reversible only through the registry; callers
//! never parse them.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

use crate::constants::DEFAULT_DATASET;

/// A (project, dataset) pair identifying a retrieval scope
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Scope {
    /// Project name
    pub project: String,
    /// Dataset name
    pub dataset: String,
}

impl Scope {
    /// Create a scope
    pub fn new<P: Into<String>, D: Into<String>>(project: P, dataset: D) -> Self {
        Self {
            project: project.into(),
            dataset: dataset.into(),
        }
    }

    /// Canonical collection name for this scope
    pub fn collection_name(&self) -> String {
        collection_name(&self.project, &self.dataset)
    }

    /// Progress key used for indexing runs in this scope
    pub fn progress_key(&self) -> String {
        format!("index:{}/{}", self.project, self.dataset)
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.project, self.dataset)
    }
}

/// Replace every character outside `[A-Za-z0-9]` with `_`
pub fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Canonical collection name: `project_{sanitized}_dataset_{sanitized}`
pub fn collection_name(project: &str, dataset: &str) -> String {
    format!("project_{}_dataset_{}", sanitize(project), sanitize(dataset))
}

/// First eight Base58 characters of a SHA-256 digest
fn short_hash(input: &[u8]) -> String {
    let digest = Sha256::digest(input);
    let encoded = bs58::encode(digest).into_string();
    encoded.chars().take(8).collect()
}

/// Derive a project name from a filesystem path
///
/// Shape: `{h1}-{basename}-{h2}` where `h1` and `h2` are 8-character Base58
/// renderings of two independent SHA-256 hashes over the absolute path.
pub fn auto_scope_project_name(path: &Path) -> String {
    let absolute = path.to_string_lossy();
    let basename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "root".to_string());
    let basename: String = basename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();

    let h1 = short_hash(absolute.as_bytes());
    let h2 = short_hash(format!("claude-context:{absolute}").as_bytes());
    format!("{h1}-{basename}-{h2}")
}

/// Derive the full default scope for a filesystem path
pub fn auto_scope(path: &Path) -> Scope {
    Scope::new(auto_scope_project_name(path), DEFAULT_DATASET)
}

/// Dataset selector accepted by query and clear operations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum DatasetSelector {
    /// A single literal dataset name
    One(String),
    /// An explicit list of dataset names
    Many(Vec<String>),
    /// A glob over dataset names (`github-*`)
    Glob(String),
    /// Every dataset in the project
    All,
    /// A semantic alias resolved through dataset tags (`env:dev`, `src:docs`)
    Alias {
        /// Tag key
        key: String,
        /// Tag value
        value: String,
    },
}

impl DatasetSelector {
    /// Parse a single selector string
    pub fn parse(raw: &str) -> DatasetSelector {
        let raw = raw.trim();
        if raw == "*" {
            return DatasetSelector::All;
        }
        if let Some((key, value)) = raw.split_once(':') {
            if !key.is_empty() && !value.is_empty() && !raw.contains('*') {
                return DatasetSelector::Alias {
                    key: key.to_string(),
                    value: value.to_string(),
                };
            }
        }
        if raw.contains('*') {
            return DatasetSelector::Glob(raw.to_string());
        }
        DatasetSelector::One(raw.to_string())
    }

    /// Build a selector from a list of literal names
    pub fn from_names(names: Vec<String>) -> DatasetSelector {
        match names.len() {
            1 => DatasetSelector::parse(&names[0]),
            _ => DatasetSelector::Many(names),
        }
    }
}

/// Translate a glob into a SQL `LIKE` pattern
///
/// `*` becomes `%`; literal `%`, `_` and `\` are escaped with `\` so the
/// pattern must be used with `ESCAPE '\'`.
pub fn glob_to_like(glob: &str) -> String {
    let mut pattern = String::with_capacity(glob.len());
    for c in glob.chars() {
        match c {
            '*' => pattern.push('%'),
            '%' | '_' | '\\' => {
                pattern.push('\\');
                pattern.push(c);
            }
            other => pattern.push(other),
        }
    }
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_every_non_alphanumeric() {
        assert_eq!(sanitize("my-project.v2"), "my_project_v2");
        assert_eq!(sanitize("plain"), "plain");
        assert_eq!(sanitize("a b/c"), "a_b_c");
    }

    #[test]
    fn collection_names_are_canonical() {
        let name = collection_name("my-project", "github-main");
        assert_eq!(name, "project_my_project_dataset_github_main");

        // idempotent: sanitizing a sanitized name changes nothing
        assert_eq!(sanitize(&sanitize("my-project")), sanitize("my-project"));

        let re_ok = name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
        assert!(re_ok && name.starts_with("project_") && name.contains("_dataset_"));
    }

    #[test]
    fn auto_scope_shape_and_determinism() {
        let a = auto_scope_project_name(Path::new("/tmp/acme"));
        let b = auto_scope_project_name(Path::new("/tmp/acme"));
        assert_eq!(a, b);

        let parts: Vec<&str> = a.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].len(), 8);
        assert_eq!(parts[1], "acme");
        assert_eq!(parts[2].len(), 8);
        // the two hashes are independent
        assert_ne!(parts[0], parts[2]);

        let other = auto_scope_project_name(Path::new("/tmp/other"));
        assert_ne!(a, other);
    }

    #[test]
    fn auto_scope_defaults_dataset_to_local() {
        let scope = auto_scope(Path::new("/tmp/acme"));
        assert_eq!(scope.dataset, "local");
    }

    #[test]
    fn selector_parsing() {
        assert_eq!(DatasetSelector::parse("*"), DatasetSelector::All);
        assert_eq!(
            DatasetSelector::parse("docs"),
            DatasetSelector::One("docs".into())
        );
        assert_eq!(
            DatasetSelector::parse("github-*"),
            DatasetSelector::Glob("github-*".into())
        );
        assert_eq!(
            DatasetSelector::parse("env:dev"),
            DatasetSelector::Alias {
                key: "env".into(),
                value: "dev".into()
            }
        );
    }

    #[test]
    fn glob_translation_escapes_sql_wildcards() {
        assert_eq!(glob_to_like("github-*"), "github-%");
        assert_eq!(glob_to_like("a_b*"), "a\\_b%");
        assert_eq!(glob_to_like("100%*"), "100\\%%");
    }
}
