//! Generator configuration.
//!
//! Loaded from YAML; every field has a default, so an empty file (or no
//! file at all) yields [`GeneratorConfig::default`].
//!
//! # Example YAML
//!
//! ```yaml
//! severity:
//!   UNC003: error
//!   UNC007: info
//! emit:
//!   runtime_path: "::clap"
//!   header: true
//!   derive_run: true
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use optforge_core::{DiagnosticCode, Severity};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::format::rust_identifier;

/// Per-code severity overrides applied by the validation stage.
///
/// # Examples
///
/// ```
/// use optforge_codegen::config::SeverityTable;
/// use optforge_core::{DiagnosticCode, Severity};
///
/// let mut table = SeverityTable::default();
/// table.set(DiagnosticCode::RequiredNullable, Severity::Error);
/// assert_eq!(table.resolve(DiagnosticCode::RequiredNullable, Severity::Warning), Severity::Error);
/// assert_eq!(table.resolve(DiagnosticCode::DuplicateFlag, Severity::Warning), Severity::Warning);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeverityTable {
    overrides: BTreeMap<DiagnosticCode, Severity>,
}

impl SeverityTable {
    pub fn set(&mut self, code: DiagnosticCode, severity: Severity) {
        self.overrides.insert(code, severity);
    }

    pub fn get(&self, code: DiagnosticCode) -> Option<Severity> {
        self.overrides.get(&code).copied()
    }

    /// Override for `code`, or `default` when none is configured.
    pub fn resolve(&self, code: DiagnosticCode, default: Severity) -> Severity {
        self.get(code).unwrap_or(default)
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DiagnosticCode, Severity)> + '_ {
        self.overrides.iter().map(|(code, severity)| (*code, *severity))
    }
}

/// Settings that shape the generated source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmitOptions {
    /// Path of the argument-parsing crate as seen from generated code.
    pub runtime_path: String,
    /// Emit the `@generated` header.
    pub header: bool,
    /// Emit the `run()` entry point for each command.
    pub derive_run: bool,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            runtime_path: "::clap".to_string(),
            header: true,
            derive_run: true,
        }
    }
}

/// Top-level generator configuration.
///
/// # Examples
///
/// ```
/// use optforge_codegen::config::GeneratorConfig;
/// use optforge_core::{DiagnosticCode, Severity};
///
/// let config = GeneratorConfig::from_yaml_str("severity:\n  UNC003: error\n").unwrap();
/// assert_eq!(config.severity.get(DiagnosticCode::ConstraintTypeMismatch), Some(Severity::Error));
/// assert_eq!(config.emit.runtime_path, "::clap");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    pub severity: SeverityTable,
    pub emit: EmitOptions,
}

impl GeneratorConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if parsing fails, or
    /// [`ConfigError::InvalidRuntimePath`] for a malformed runtime path.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Parses configuration from YAML text.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Option<Self> = serde_yaml::from_str(text)?;
        let config = config.unwrap_or_default();
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<(), ConfigError> {
        let path = self.emit.runtime_path.trim();
        let segments = path.strip_prefix("::").unwrap_or(path);
        let valid = !segments.is_empty()
            && segments
                .split("::")
                .all(|segment| rust_identifier(segment).is_ok_and(|ident| ident == segment));
        if valid {
            Ok(())
        } else {
            Err(ConfigError::InvalidRuntimePath(self.emit.runtime_path.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(GeneratorConfig::from_yaml_str("").unwrap(), GeneratorConfig::default());
        assert_eq!(GeneratorConfig::from_yaml_str("{}").unwrap(), GeneratorConfig::default());
    }

    #[test]
    fn test_partial_emit_section_keeps_defaults() {
        let config = GeneratorConfig::from_yaml_str("emit:\n  derive_run: false\n").unwrap();
        assert!(!config.emit.derive_run);
        assert!(config.emit.header);
        assert_eq!(config.emit.runtime_path, "::clap");
        assert!(config.severity.is_empty());
    }

    #[test]
    fn test_unknown_code_is_rejected() {
        let err = GeneratorConfig::from_yaml_str("severity:\n  UNC999: error\n").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)), "{err}");
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let err = GeneratorConfig::from_yaml_str("emit:\n  timestamp: true\n").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)), "{err}");
    }

    #[test]
    fn test_runtime_path_must_be_a_path() {
        for path in ["clap", "::clap", "vendored::clap"] {
            let yaml = format!("emit:\n  runtime_path: \"{path}\"\n");
            assert!(GeneratorConfig::from_yaml_str(&yaml).is_ok(), "{path}");
        }
        for path in ["", "::", "clap::", "my-clap", "r#fn"] {
            let yaml = format!("emit:\n  runtime_path: \"{path}\"\n");
            let err = GeneratorConfig::from_yaml_str(&yaml).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidRuntimePath(_)), "{path}: {err}");
        }
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "severity:\n  UNC004: error\n  UNC007: info").unwrap();

        let config = GeneratorConfig::load(file.path()).unwrap();
        let overrides: Vec<_> = config.severity.iter().collect();
        assert_eq!(
            overrides,
            vec![
                (DiagnosticCode::RequiredNullable, Severity::Error),
                (DiagnosticCode::DuplicateFlag, Severity::Info),
            ]
        );
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = GeneratorConfig::load(dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
