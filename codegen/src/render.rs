//! Output formatting for diagnostics.

use optforge_core::{Diagnostic, Severity};

/// Supported diagnostic output formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum DiagnosticFormat {
    #[default]
    Human,
    Json,
    Yaml,
}

/// Formats diagnostics in the requested output format.
///
/// # Examples
///
/// ```
/// use optforge_codegen::render::{DiagnosticFormat, format_diagnostics};
/// use optforge_core::{Diagnostic, DiagnosticCode, Location, Severity};
///
/// let diagnostics = vec![Diagnostic::new(
///     DiagnosticCode::ConstraintTypeMismatch,
///     Severity::Warning,
///     "`directory` constraint requires a directory path member, found String",
///     Location::member("BuildOptions", "target"),
/// )];
/// let text = format_diagnostics(&diagnostics, DiagnosticFormat::Human).unwrap();
/// assert!(text.starts_with("warning[UNC003]: BuildOptions.target: "));
/// ```
pub fn format_diagnostics(diagnostics: &[Diagnostic], format: DiagnosticFormat) -> Result<String, String> {
    match format {
        DiagnosticFormat::Human => Ok(diagnostics_to_human(diagnostics)),
        DiagnosticFormat::Json => serde_json::to_string_pretty(diagnostics)
            .map_err(|e| format!("JSON serialization failed: {e}")),
        DiagnosticFormat::Yaml => {
            serde_yaml::to_string(diagnostics).map_err(|e| format!("YAML serialization failed: {e}"))
        }
    }
}

fn diagnostics_to_human(diagnostics: &[Diagnostic]) -> String {
    let mut out = String::new();
    for diagnostic in diagnostics {
        out.push_str(&diagnostic.to_string());
        out.push('\n');
    }
    if !diagnostics.is_empty() {
        out.push_str(&summary_line(diagnostics));
        out.push('\n');
    }
    out
}

/// `"2 warnings, 1 error"` style summary; zero counts are left out.
pub fn summary_line(diagnostics: &[Diagnostic]) -> String {
    let count = |severity: Severity| diagnostics.iter().filter(|d| d.severity == severity).count();
    let parts: Vec<String> = [
        (count(Severity::Error), "error"),
        (count(Severity::Warning), "warning"),
        (count(Severity::Info), "note"),
    ]
    .into_iter()
    .filter(|(n, _)| *n > 0)
    .map(|(n, label)| format!("{n} {label}{}", if n == 1 { "" } else { "s" }))
    .collect();

    if parts.is_empty() {
        "no diagnostics".to_string()
    } else {
        parts.join(", ")
    }
}
