//! Diagnostics reported by extraction and validation.
//!
//! Diagnostics are plain values collected alongside pipeline output; they
//! are never raised as errors. Codes are stable and documented.

use serde::{Deserialize, Serialize};

use crate::descriptor::Location;

/// Stable diagnostic codes.
///
/// # Examples
///
/// ```
/// use optforge_core::DiagnosticCode;
///
/// assert_eq!(DiagnosticCode::ConstraintTypeMismatch.as_str(), "UNC003");
/// assert_eq!("UNC003".parse::<DiagnosticCode>(), Ok(DiagnosticCode::ConstraintTypeMismatch));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DiagnosticCode {
    /// Option annotation on a member of a type that is not a command container.
    #[serde(rename = "UNC001")]
    MisplacedOption,
    /// Constraint annotation on a member without the option annotation.
    #[serde(rename = "UNC002")]
    OrphanedConstraint,
    /// Constraint annotation on a member of an incompatible type.
    #[serde(rename = "UNC003")]
    ConstraintTypeMismatch,
    /// `required = true` on a nullable member.
    #[serde(rename = "UNC004")]
    RequiredNullable,
    /// Declared arity outside the backing type's natural cardinality.
    #[serde(rename = "UNC005")]
    ArityTypeMismatch,
    /// Annotation arguments that could not be read.
    #[serde(rename = "UNC006")]
    MalformedAnnotation,
    /// Flag or alias registered twice within one command.
    #[serde(rename = "UNC007")]
    DuplicateFlag,
    /// Flag or alias that is neither `-x` nor `--name`.
    #[serde(rename = "UNC008")]
    InvalidFlagSyntax,
}

impl DiagnosticCode {
    pub const ALL: [Self; 8] = [
        Self::MisplacedOption,
        Self::OrphanedConstraint,
        Self::ConstraintTypeMismatch,
        Self::RequiredNullable,
        Self::ArityTypeMismatch,
        Self::MalformedAnnotation,
        Self::DuplicateFlag,
        Self::InvalidFlagSyntax,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::MisplacedOption => "UNC001",
            Self::OrphanedConstraint => "UNC002",
            Self::ConstraintTypeMismatch => "UNC003",
            Self::RequiredNullable => "UNC004",
            Self::ArityTypeMismatch => "UNC005",
            Self::MalformedAnnotation => "UNC006",
            Self::DuplicateFlag => "UNC007",
            Self::InvalidFlagSyntax => "UNC008",
        }
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DiagnosticCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|code| code.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown diagnostic code: {s}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// One finding about a declaration member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub severity: Severity,
    pub message: String,
    pub location: Location,
}

impl Diagnostic {
    pub fn new(
        code: DiagnosticCode,
        severity: Severity,
        message: impl Into<String>,
        location: Location,
    ) -> Self {
        Self {
            code,
            severity,
            message: message.into(),
            location,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}[{}]: {}: {}",
            self.severity, self.code, self.location, self.message
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_display_matches_serde() {
        for code in DiagnosticCode::ALL {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{code}\""));
        }
    }

    #[test]
    fn test_code_parse_is_case_insensitive() {
        assert_eq!(
            "unc005".parse::<DiagnosticCode>(),
            Ok(DiagnosticCode::ArityTypeMismatch)
        );
        assert!("UNC999".parse::<DiagnosticCode>().is_err());
    }

    #[test]
    fn test_diagnostic_display() {
        let diagnostic = Diagnostic::new(
            DiagnosticCode::RequiredNullable,
            Severity::Warning,
            "required option is nullable",
            Location::member("BuildOptions", "force"),
        );
        assert_eq!(
            diagnostic.to_string(),
            "warning[UNC004]: BuildOptions.force: required option is nullable"
        );
    }
}
