//! Compile options.
//!
//! Options can be built in code or read from a YAML file:
//!
//! ```yaml
//! strict: false
//! max-macro-depth: 32
//! max-events: 100000
//! max-nesting-depth: 64
//! ```

use crate::error::OmniError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_MAX_MACRO_DEPTH: usize = 32;
pub const DEFAULT_MAX_EVENTS: usize = 100_000;
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct CompileOptions {
    /// Turn the first diagnostic into a `ParseError`
    pub strict: bool,
    /// Nesting limit for macro invocations
    pub max_macro_depth: usize,
    /// Limit on emitted events; later events are dropped
    pub max_events: usize,
    /// Nesting limit for `omniscore` and `group` blocks
    pub max_nesting_depth: usize,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            strict: false,
            max_macro_depth: DEFAULT_MAX_MACRO_DEPTH,
            max_events: DEFAULT_MAX_EVENTS,
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
        }
    }
}

impl CompileOptions {
    pub fn from_yaml_str(content: &str) -> Result<Self, OmniError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| OmniError::ConfigError(e.to_string()))
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self, OmniError> {
        let content = fs::read_to_string(path).map_err(|e| {
            OmniError::ConfigError(format!("cannot read '{}': {}", path.display(), e))
        })?;
        Self::from_yaml_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let options = CompileOptions::from_yaml_str("strict: true\n").unwrap();
        assert!(options.strict);
        assert_eq!(options.max_macro_depth, DEFAULT_MAX_MACRO_DEPTH);
        assert_eq!(options.max_events, DEFAULT_MAX_EVENTS);
        assert_eq!(options.max_nesting_depth, DEFAULT_MAX_NESTING_DEPTH);
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(
            CompileOptions::from_yaml_str("  \n").unwrap(),
            CompileOptions::default()
        );
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = CompileOptions::from_yaml_str("max-depth: 3\n").unwrap_err();
        assert!(matches!(err, OmniError::ConfigError(_)));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max-macro-depth: 4\nmax-events: 10\nmax-nesting-depth: 2").unwrap();
        let options = CompileOptions::from_yaml_file(file.path()).unwrap();
        assert_eq!(options.max_macro_depth, 4);
        assert_eq!(options.max_events, 10);
        assert_eq!(options.max_nesting_depth, 2);
        assert!(!options.strict);
    }

    #[test]
    fn test_missing_file() {
        let err = CompileOptions::from_yaml_file(Path::new("/nonexistent/omniscore.yaml"))
            .unwrap_err();
        assert!(err.to_string().contains("cannot read"));
    }
}
