//! TOML-based merge policy configuration.
//!
//! The engine is stateless; every knob it honours lives in [`MergePolicy`],
//! which callers either build directly or load from the `[merge]` table of a
//! TOML file via [`MergeConfig::load_from_file`].

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::ConfigError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MergeConfig {
    /// Merge semantics.
    #[serde(default)]
    pub merge: MergePolicy,
}

// ---------------------------------------------------------------------------
// Merge policy
// ---------------------------------------------------------------------------

/// How field values are compared.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LineEndings {
    /// Values are equal only when byte-for-byte identical.
    #[default]
    Exact,
    /// `\r\n` and `\n` compare equal. Stored values are never rewritten.
    Normalize,
}

/// What happens when local and remote independently create the same key.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BothAddedPolicy {
    /// Compare the two new records field by field, as if base had an empty
    /// record under that key.
    #[default]
    FieldMerge,
    /// Any difference between the two new records is a conflict.
    Conflict,
}

/// Merge semantics shared by the detector and the analyzer.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MergePolicy {
    /// Value comparison mode.
    #[serde(default)]
    pub line_endings: LineEndings,

    /// Tie-break for records created on both sides.
    #[serde(default)]
    pub both_added: BothAddedPolicy,
}

impl MergePolicy {
    /// Compare two optional field values under this policy.
    ///
    /// Absence only ever equals absence.
    pub fn values_equal(&self, a: Option<&str>, b: Option<&str>) -> bool {
        match (a, b) {
            (None, None) => true,
            (Some(a), Some(b)) => match self.line_endings {
                LineEndings::Exact => a == b,
                LineEndings::Normalize => {
                    a == b || a.replace("\r\n", "\n") == b.replace("\r\n", "\n")
                }
            },
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl MergeConfig {
    /// Load a [`MergeConfig`] from a TOML file at the given path.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading merge configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;

        debug!(policy = ?config.merge, "merge configuration parsed");
        Ok(config)
    }

    /// Parse a [`MergeConfig`] from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_toml() -> &'static str {
        r#"
[merge]
line_endings = "normalize"
both_added = "conflict"
"#
    }

    #[test]
    fn test_parse_full_config() {
        let config = MergeConfig::from_toml_str(sample_toml()).expect("failed to parse toml");
        assert_eq!(config.merge.line_endings, LineEndings::Normalize);
        assert_eq!(config.merge.both_added, BothAddedPolicy::Conflict);
    }

    #[test]
    fn test_defaults() {
        let config = MergeConfig::from_toml_str("").unwrap();
        assert_eq!(config, MergeConfig::default());
        assert_eq!(config.merge.line_endings, LineEndings::Exact);
        assert_eq!(config.merge.both_added, BothAddedPolicy::FieldMerge);

        let config = MergeConfig::from_toml_str("[merge]\n").unwrap();
        assert_eq!(config.merge, MergePolicy::default());
    }

    #[test]
    fn test_rejects_unknown_variant() {
        let result = MergeConfig::from_toml_str("[merge]\nline_endings = \"crlf\"\n");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bibmerge.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(sample_toml().as_bytes()).unwrap();

        let config = MergeConfig::load_from_file(&path).expect("load_from_file failed");
        assert_eq!(config.merge.both_added, BothAddedPolicy::Conflict);
    }

    #[test]
    fn test_file_not_found() {
        let result = MergeConfig::load_from_file("/nonexistent/bibmerge.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_values_equal() {
        let exact = MergePolicy::default();
        assert!(exact.values_equal(None, None));
        assert!(exact.values_equal(Some("x"), Some("x")));
        assert!(!exact.values_equal(Some(""), None));
        assert!(!exact.values_equal(Some("a\r\nb"), Some("a\nb")));

        let normalize = MergePolicy {
            line_endings: LineEndings::Normalize,
            ..MergePolicy::default()
        };
        assert!(normalize.values_equal(Some("a\r\nb"), Some("a\nb")));
        assert!(!normalize.values_equal(Some("a\nb"), Some("a b")));
        assert!(!normalize.values_equal(Some(""), None));
    }
}
