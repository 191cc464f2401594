//! Semantic validation of annotated declarations.
//!
//! Every rule in [`RULES`] is an independent pure function over the
//! declaration set and the extracted descriptor tree. All rules always
//! run and their findings are concatenated, so several diagnostics can
//! coexist on one member. Nothing here mutates the descriptor tree.
//!
//! Rules that judge annotation placement (UNC001-UNC003) read the raw
//! declarations, since misplaced annotations never reach the tree; rules
//! about option semantics (UNC004, UNC005, UNC007, UNC008) read the tree.

use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use optforge_core::{
    CommandDescriptor, DeclarationSet, Diagnostic, DiagnosticCode, Location, OPTION_ANNOTATION,
    Severity,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cancel::CancellationToken;
use crate::config::SeverityTable;
use crate::error::Result;
use crate::extract::Extraction;
use crate::flag::{FlagSpelling, registered_spellings};

static SHORT_FLAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-[A-Za-z0-9]$").expect("static regex must compile"));
static LONG_FLAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^--[A-Za-z0-9]+(-[A-Za-z0-9]+)*$").expect("static regex must compile")
});

/// Read-only view handed to every rule.
#[derive(Debug, Clone, Copy)]
pub struct RuleInput<'a> {
    pub declarations: &'a DeclarationSet,
    pub commands: &'a [CommandDescriptor],
}

/// A rule's finding before a severity is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub location: Location,
    pub message: String,
}

impl Finding {
    fn new(location: Location, message: String) -> Self {
        Self { location, message }
    }
}

/// One entry of the rule catalogue.
#[derive(Debug, Clone, Copy)]
pub struct RuleDescriptor {
    pub code: DiagnosticCode,
    pub title: &'static str,
    pub default_severity: Severity,
    pub check: fn(RuleInput<'_>) -> Vec<Finding>,
}

/// Every semantic rule, in reporting order.
pub const RULES: &[RuleDescriptor] = &[
    RuleDescriptor {
        code: DiagnosticCode::MisplacedOption,
        title: "option annotation outside a command container",
        default_severity: Severity::Warning,
        check: misplaced_option,
    },
    RuleDescriptor {
        code: DiagnosticCode::OrphanedConstraint,
        title: "constraint annotation without an option annotation",
        default_severity: Severity::Warning,
        check: orphaned_constraint,
    },
    RuleDescriptor {
        code: DiagnosticCode::ConstraintTypeMismatch,
        title: "constraint annotation on a member of the wrong type",
        default_severity: Severity::Warning,
        check: constraint_type_mismatch,
    },
    RuleDescriptor {
        code: DiagnosticCode::RequiredNullable,
        title: "required option backed by a nullable member",
        default_severity: Severity::Warning,
        check: required_nullable,
    },
    RuleDescriptor {
        code: DiagnosticCode::ArityTypeMismatch,
        title: "arity outside the backing type's cardinality",
        default_severity: Severity::Warning,
        check: arity_type_mismatch,
    },
    RuleDescriptor {
        code: DiagnosticCode::DuplicateFlag,
        title: "flag or alias registered twice in one command",
        default_severity: Severity::Warning,
        check: duplicate_flag,
    },
    RuleDescriptor {
        code: DiagnosticCode::InvalidFlagSyntax,
        title: "flag or alias is neither -x nor --name",
        default_severity: Severity::Warning,
        check: invalid_flag_syntax,
    },
];

/// Severity used for malformed-annotation diagnostics raised by extraction.
pub const MALFORMED_ANNOTATION_SEVERITY: Severity = Severity::Error;

/// Title of a diagnostic code, including the extraction-only `UNC006`.
pub fn describe(code: DiagnosticCode) -> (&'static str, Severity) {
    RULES
        .iter()
        .find(|rule| rule.code == code)
        .map(|rule| (rule.title, rule.default_severity))
        .unwrap_or(("malformed annotation arguments", MALFORMED_ANNOTATION_SEVERITY))
}

/// Error codes keyed by the member they keep out of generated code.
pub type BlockedMembers = BTreeMap<Location, Vec<DiagnosticCode>>;

/// Output of the validation stage: every diagnostic of the run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validation {
    pub diagnostics: Vec<Diagnostic>,
}

impl Validation {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// Members carrying at least one Error diagnostic, with the codes that
    /// block them. Type-level diagnostics never block a member.
    pub fn blocked_members(&self) -> BlockedMembers {
        let mut blocked = BlockedMembers::new();
        for diagnostic in self.diagnostics.iter().filter(|d| d.is_error()) {
            if diagnostic.location.member.is_none() {
                continue;
            }
            let codes = blocked.entry(diagnostic.location.clone()).or_default();
            if !codes.contains(&diagnostic.code) {
                codes.push(diagnostic.code);
                codes.sort();
            }
        }
        blocked
    }
}

/// Runs every rule and merges the findings with the extraction
/// diagnostics, applying severity overrides from `severities`.
pub fn validate(
    declarations: &DeclarationSet,
    extraction: &Extraction,
    severities: &SeverityTable,
    cancel: &CancellationToken,
) -> Result<Validation> {
    let input = RuleInput {
        declarations,
        commands: &extraction.commands,
    };

    let mut diagnostics: Vec<Diagnostic> = extraction
        .diagnostics
        .iter()
        .map(|diagnostic| Diagnostic {
            severity: severities.resolve(diagnostic.code, diagnostic.severity),
            ..diagnostic.clone()
        })
        .collect();

    for rule in RULES {
        cancel.check()?;
        let findings = (rule.check)(input);
        debug!(code = %rule.code, findings = findings.len(), "rule finished");
        let severity = severities.resolve(rule.code, rule.default_severity);
        diagnostics.extend(
            findings
                .into_iter()
                .map(|finding| Diagnostic::new(rule.code, severity, finding.message, finding.location)),
        );
    }

    Ok(Validation { diagnostics })
}

fn misplaced_option(input: RuleInput<'_>) -> Vec<Finding> {
    let mut findings = Vec::new();
    for decl in &input.declarations.declarations {
        if decl.is_command_container() {
            continue;
        }
        for member in decl.members.iter().filter(|m| m.has_option()) {
            findings.push(Finding::new(
                Location::member(&decl.name, &member.name),
                format!(
                    "`{OPTION_ANNOTATION}` annotation has no effect: `{}` is not marked as a command container",
                    decl.name
                ),
            ));
        }
    }
    findings
}

fn orphaned_constraint(input: RuleInput<'_>) -> Vec<Finding> {
    let mut findings = Vec::new();
    for decl in &input.declarations.declarations {
        for member in &decl.members {
            if member.has_option() {
                continue;
            }
            let names: Vec<&str> = member
                .constraint_annotations()
                .map(|(kind, _)| kind.annotation_name())
                .collect();
            if names.is_empty() {
                continue;
            }
            findings.push(Finding::new(
                Location::member(&decl.name, &member.name),
                format!(
                    "`{}` constraint has no effect without an `{OPTION_ANNOTATION}` annotation",
                    names.join("`, `")
                ),
            ));
        }
    }
    findings
}

fn constraint_type_mismatch(input: RuleInput<'_>) -> Vec<Finding> {
    let mut findings = Vec::new();
    for decl in &input.declarations.declarations {
        for member in &decl.members {
            for (kind, _) in member.constraint_annotations() {
                if member.ty.shape.path_kind() == Some(kind) {
                    continue;
                }
                findings.push(Finding::new(
                    Location::member(&decl.name, &member.name),
                    format!(
                        "`{}` constraint requires a {} member, found {}",
                        kind.annotation_name(),
                        kind.label(),
                        member.ty
                    ),
                ));
            }
        }
    }
    findings
}

fn required_nullable(input: RuleInput<'_>) -> Vec<Finding> {
    input
        .commands
        .iter()
        .flat_map(|command| &command.options)
        .filter(|option| option.required && option.backing_type.is_nullable())
        .map(|option| {
            Finding::new(
                option.location.clone(),
                format!(
                    "option `{}` is required but backed by a {}; required and nullable together are undefined",
                    option.primary_flag,
                    option.backing_type.label()
                ),
            )
        })
        .collect()
}

fn arity_type_mismatch(input: RuleInput<'_>) -> Vec<Finding> {
    input
        .commands
        .iter()
        .flat_map(|command| &command.options)
        .filter_map(|option| {
            let natural = option.backing_type.natural_arity();
            if option.arity.fits_within(&natural) {
                return None;
            }
            let reason = if option.arity.is_ordered() {
                format!("natural arity is {natural}")
            } else {
                "minimum exceeds maximum".to_string()
            };
            Some(Finding::new(
                option.location.clone(),
                format!(
                    "arity {} is incompatible with {}: {reason}",
                    option.arity,
                    option.backing_type.label()
                ),
            ))
        })
        .collect()
}

/// Compares flags as the emitter registers them, so `dry-run`, `--dry-run`
/// and an empty primary on `dry_run` all collide.
fn duplicate_flag(input: RuleInput<'_>) -> Vec<Finding> {
    let mut findings = Vec::new();
    for command in input.commands {
        let mut owners: HashMap<FlagSpelling, &str> = HashMap::new();
        for option in &command.options {
            for spelling in registered_spellings(option) {
                match owners.get(&spelling) {
                    Some(owner) => findings.push(Finding::new(
                        option.location.clone(),
                        format!("flag `{spelling}` is already registered by `{owner}`"),
                    )),
                    None => {
                        owners.insert(spelling, &option.member);
                    }
                }
            }
        }
    }
    findings
}

fn invalid_flag_syntax(input: RuleInput<'_>) -> Vec<Finding> {
    input
        .commands
        .iter()
        .flat_map(|command| &command.options)
        .flat_map(|option| {
            option
                .all_flags()
                .filter(|flag| !flag.is_empty() && !is_valid_flag(flag))
                .map(|flag| {
                    Finding::new(
                        option.location.clone(),
                        format!("flag `{flag}` must look like `-x` or `--name`"),
                    )
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Returns `true` for `-x` and `--name` style flags.
///
/// # Examples
///
/// ```
/// use optforge_codegen::validate::is_valid_flag;
///
/// assert!(is_valid_flag("-o"));
/// assert!(is_valid_flag("--output-dir"));
/// assert!(!is_valid_flag("output"));
/// assert!(!is_valid_flag("--trailing-"));
/// ```
pub fn is_valid_flag(flag: &str) -> bool {
    SHORT_FLAG.is_match(flag) || LONG_FLAG.is_match(flag)
}

#[cfg(test)]
mod tests {
    use optforge_core::{
        Annotation, COMMAND_ANNOTATION, DIRECTORY_ANNOTATION, DeclaredType, FILE_ANNOTATION,
        MemberDeclaration, TypeDeclaration, ValueShape,
    };

    use super::*;
    use crate::extract::extract;

    fn option(flag: &str) -> Annotation {
        Annotation::new(OPTION_ANNOTATION).with_positional(flag)
    }

    fn container(name: &str) -> TypeDeclaration {
        TypeDeclaration::new(name).with_annotation(Annotation::new(COMMAND_ANNOTATION))
    }

    fn diagnostics(decls: Vec<TypeDeclaration>) -> Vec<Diagnostic> {
        diagnostics_with(decls, &SeverityTable::default())
    }

    fn diagnostics_with(decls: Vec<TypeDeclaration>, severities: &SeverityTable) -> Vec<Diagnostic> {
        let set = DeclarationSet::new(decls);
        let cancel = CancellationToken::new();
        let extraction = extract(&set, &cancel).unwrap();
        validate(&set, &extraction, severities, &cancel)
            .unwrap()
            .diagnostics
    }

    fn codes(diagnostics: &[Diagnostic]) -> Vec<DiagnosticCode> {
        diagnostics.iter().map(|d| d.code).collect()
    }

    #[test]
    fn test_misplaced_option_reported_once_per_member() {
        let diagnostics = diagnostics(vec![
            TypeDeclaration::new("Helper")
                .with_member(
                    MemberDeclaration::new("verbose", DeclaredType::new(ValueShape::Bool))
                        .with_annotation(option("--verbose")),
                )
                .with_member(MemberDeclaration::new("plain", DeclaredType::new(ValueShape::Text))),
        ]);

        assert_eq!(codes(&diagnostics), vec![DiagnosticCode::MisplacedOption]);
        assert_eq!(diagnostics[0].location, Location::member("Helper", "verbose"));
        assert_eq!(diagnostics[0].severity, Severity::Warning);
    }

    #[test]
    fn test_orphaned_constraint_in_any_type() {
        let orphan = || {
            MemberDeclaration::new("root", DeclaredType::new(ValueShape::Directory))
                .with_annotation(Annotation::new(DIRECTORY_ANNOTATION))
        };
        let diagnostics = diagnostics(vec![
            container("Options").with_member(orphan()),
            TypeDeclaration::new("Helper").with_member(orphan()),
        ]);

        assert_eq!(
            codes(&diagnostics),
            vec![DiagnosticCode::OrphanedConstraint, DiagnosticCode::OrphanedConstraint]
        );
        assert_eq!(diagnostics[0].location, Location::member("Options", "root"));
        assert_eq!(diagnostics[1].location, Location::member("Helper", "root"));
    }

    #[test]
    fn test_orphan_with_two_constraints_is_one_diagnostic() {
        let diagnostics = diagnostics(vec![container("Options").with_member(
            MemberDeclaration::new("root", DeclaredType::new(ValueShape::Directory))
                .with_annotation(Annotation::new(DIRECTORY_ANNOTATION))
                .with_annotation(Annotation::new(FILE_ANNOTATION)),
        )]);

        let orphans = diagnostics
            .iter()
            .filter(|d| d.code == DiagnosticCode::OrphanedConstraint)
            .count();
        assert_eq!(orphans, 1);
    }

    #[test]
    fn test_directory_constraint_on_text_member() {
        let diagnostics = diagnostics(vec![container("Options").with_member(
            MemberDeclaration::new("target", DeclaredType::new(ValueShape::Text))
                .with_annotation(option("--target"))
                .with_annotation(Annotation::new(DIRECTORY_ANNOTATION)),
        )]);

        assert_eq!(codes(&diagnostics), vec![DiagnosticCode::ConstraintTypeMismatch]);
        assert!(diagnostics[0].message.contains("directory path"), "{}", diagnostics[0].message);
    }

    #[test]
    fn test_correctly_typed_constraints_are_silent() {
        let diagnostics = diagnostics(vec![container("Options")
            .with_member(
                MemberDeclaration::new("target", DeclaredType::new(ValueShape::Directory))
                    .with_annotation(option("--target"))
                    .with_annotation(Annotation::new(DIRECTORY_ANNOTATION)),
            )
            .with_member(
                MemberDeclaration::new("inputs", DeclaredType::new(ValueShape::File).sequence())
                    .with_annotation(option("--input"))
                    .with_annotation(Annotation::new(FILE_ANNOTATION)),
            )]);

        assert!(diagnostics.is_empty(), "{diagnostics:?}");
    }

    #[test]
    fn test_orphan_and_mismatch_coexist() {
        let diagnostics = diagnostics(vec![container("Options").with_member(
            MemberDeclaration::new("target", DeclaredType::new(ValueShape::Text))
                .with_annotation(Annotation::new(FILE_ANNOTATION)),
        )]);

        assert_eq!(
            codes(&diagnostics),
            vec![
                DiagnosticCode::OrphanedConstraint,
                DiagnosticCode::ConstraintTypeMismatch
            ]
        );
        assert!(diagnostics.iter().all(|d| d.location == Location::member("Options", "target")));
    }

    #[test]
    fn test_required_nullable_boolean() {
        let required = || option("--force").with_named("required", true);
        let flagged = diagnostics(vec![container("Options").with_member(
            MemberDeclaration::new("force", DeclaredType::new(ValueShape::Bool).nullable())
                .with_annotation(required()),
        )]);
        assert_eq!(codes(&flagged), vec![DiagnosticCode::RequiredNullable]);
        assert_eq!(flagged[0].severity, Severity::Warning);

        let clean = diagnostics(vec![container("Options").with_member(
            MemberDeclaration::new("force", DeclaredType::new(ValueShape::Bool))
                .with_annotation(required()),
        )]);
        assert!(clean.is_empty(), "{clean:?}");
    }

    #[test]
    fn test_required_nullable_sequence() {
        let flagged = diagnostics(vec![container("Options").with_member(
            MemberDeclaration::new("inputs", DeclaredType::new(ValueShape::File).sequence().nullable())
                .with_annotation(option("--input").with_named("required", true)),
        )]);
        assert_eq!(codes(&flagged), vec![DiagnosticCode::RequiredNullable]);
        assert!(flagged[0].message.contains("nullable sequence of file path"));

        let clean = diagnostics(vec![container("Options").with_member(
            MemberDeclaration::new("inputs", DeclaredType::new(ValueShape::File).sequence())
                .with_annotation(option("--input").with_named("required", true)),
        )]);
        assert!(clean.is_empty(), "{clean:?}");
    }

    #[test]
    fn test_boolean_with_wide_arity() {
        let flagged = diagnostics(vec![container("Options").with_member(
            MemberDeclaration::new("force", DeclaredType::new(ValueShape::Bool)).with_annotation(
                option("--force")
                    .with_named("arity_min", 3_i64)
                    .with_named("arity_max", 5_i64),
            ),
        )]);
        assert_eq!(codes(&flagged), vec![DiagnosticCode::ArityTypeMismatch]);
        assert!(flagged[0].message.contains("(3, 5)"));
        assert!(flagged[0].message.contains("bool"));
    }

    #[test]
    fn test_default_and_sequence_arity_are_silent() {
        let clean = diagnostics(vec![container("Options")
            .with_member(
                MemberDeclaration::new("force", DeclaredType::new(ValueShape::Bool))
                    .with_annotation(option("--force")),
            )
            .with_member(
                MemberDeclaration::new("inputs", DeclaredType::new(ValueShape::File).sequence())
                    .with_annotation(option("--input").with_named("arity_min", 0_i64)),
            )
            .with_member(
                MemberDeclaration::new("tags", DeclaredType::new(ValueShape::Text).sequence())
                    .with_annotation(
                        option("--tag")
                            .with_named("arity_min", 2_i64)
                            .with_named("arity_max", 9_i64),
                    ),
            )]);
        assert!(clean.is_empty(), "{clean:?}");
    }

    #[test]
    fn test_inverted_arity() {
        let flagged = diagnostics(vec![container("Options")
            .with_member(
                MemberDeclaration::new("tags", DeclaredType::new(ValueShape::Text).sequence())
                    .with_annotation(
                        option("--tag")
                            .with_named("arity_min", 4_i64)
                            .with_named("arity_max", 2_i64),
                    ),
            )
            .with_member(
                MemberDeclaration::new("name", DeclaredType::new(ValueShape::Text))
                    .with_annotation(option("--name").with_named("arity_max", 0_i64)),
            )]);
        assert_eq!(
            codes(&flagged),
            vec![DiagnosticCode::ArityTypeMismatch, DiagnosticCode::ArityTypeMismatch]
        );
        assert!(flagged.iter().all(|d| d.message.contains("minimum exceeds maximum")));
    }

    #[test]
    fn test_duplicate_flags_reported_on_later_member() {
        let diagnostics = diagnostics(vec![container("Options")
            .with_member(
                MemberDeclaration::new("output", DeclaredType::new(ValueShape::Directory))
                    .with_annotation(option("--output").with_named("aliases", vec!["-o"])),
            )
            .with_member(
                MemberDeclaration::new("overwrite", DeclaredType::new(ValueShape::Bool))
                    .with_annotation(option("-o")),
            )]);

        assert_eq!(codes(&diagnostics), vec![DiagnosticCode::DuplicateFlag]);
        assert_eq!(diagnostics[0].location, Location::member("Options", "overwrite"));
        assert!(diagnostics[0].message.contains("`output`"));
    }

    #[test]
    fn test_duplicate_flags_compare_normalized_spelling() {
        let diagnostics = diagnostics(vec![container("Options")
            .with_member(
                MemberDeclaration::new("dry_run", DeclaredType::new(ValueShape::Bool))
                    .with_annotation(Annotation::new(OPTION_ANNOTATION)),
            )
            .with_member(
                MemberDeclaration::new("simulate", DeclaredType::new(ValueShape::Bool))
                    .with_annotation(option("--dry-run")),
            )
            .with_member(
                MemberDeclaration::new("preview", DeclaredType::new(ValueShape::Bool))
                    .with_annotation(option("--preview").with_named("aliases", vec!["dry-run"])),
            )]);

        let duplicates: Vec<&Diagnostic> = diagnostics
            .iter()
            .filter(|d| d.code == DiagnosticCode::DuplicateFlag)
            .collect();
        assert_eq!(duplicates.len(), 2, "{diagnostics:?}");
        assert_eq!(duplicates[0].location, Location::member("Options", "simulate"));
        assert_eq!(duplicates[1].location, Location::member("Options", "preview"));
        for duplicate in duplicates {
            assert!(duplicate.message.contains("`--dry-run`"), "{}", duplicate.message);
            assert!(duplicate.message.contains("`dry_run`"), "{}", duplicate.message);
        }
    }

    #[test]
    fn test_invalid_flag_syntax() {
        let diagnostics = diagnostics(vec![container("Options").with_member(
            MemberDeclaration::new("output", DeclaredType::new(ValueShape::Text))
                .with_annotation(option("output").with_named("aliases", vec!["-out", "--ok"])),
        )]);

        assert_eq!(
            codes(&diagnostics),
            vec![DiagnosticCode::InvalidFlagSyntax, DiagnosticCode::InvalidFlagSyntax]
        );
    }

    #[test]
    fn test_all_rules_run_on_one_member() {
        let diagnostics = diagnostics(vec![container("Options").with_member(
            MemberDeclaration::new("cache", DeclaredType::new(ValueShape::Text).nullable())
                .with_annotation(
                    option("cache")
                        .with_named("required", true)
                        .with_named("arity_min", 2_i64),
                )
                .with_annotation(Annotation::new(DIRECTORY_ANNOTATION)),
        )]);

        assert_eq!(
            codes(&diagnostics),
            vec![
                DiagnosticCode::ConstraintTypeMismatch,
                DiagnosticCode::RequiredNullable,
                DiagnosticCode::ArityTypeMismatch,
                DiagnosticCode::InvalidFlagSyntax,
            ]
        );
    }

    #[test]
    fn test_severity_overrides_apply() {
        let mut severities = SeverityTable::default();
        severities.set(DiagnosticCode::ConstraintTypeMismatch, Severity::Error);
        severities.set(DiagnosticCode::MalformedAnnotation, Severity::Warning);

        let diagnostics = diagnostics_with(
            vec![container("Options").with_member(
                MemberDeclaration::new("target", DeclaredType::new(ValueShape::Text))
                    .with_annotation(option("--target").with_named("hidden", "maybe"))
                    .with_annotation(Annotation::new(FILE_ANNOTATION)),
            )],
            &severities,
        );

        assert_eq!(
            codes(&diagnostics),
            vec![
                DiagnosticCode::MalformedAnnotation,
                DiagnosticCode::ConstraintTypeMismatch
            ]
        );
        assert_eq!(diagnostics[0].severity, Severity::Warning);
        assert_eq!(diagnostics[1].severity, Severity::Error);
    }

    #[test]
    fn test_blocked_members_only_for_member_errors() {
        let validation = Validation {
            diagnostics: vec![
                Diagnostic::new(
                    DiagnosticCode::MalformedAnnotation,
                    Severity::Error,
                    "bad",
                    Location::member("Options", "b"),
                ),
                Diagnostic::new(
                    DiagnosticCode::MalformedAnnotation,
                    Severity::Error,
                    "bad again",
                    Location::member("Options", "b"),
                ),
                Diagnostic::new(
                    DiagnosticCode::MalformedAnnotation,
                    Severity::Error,
                    "type level",
                    Location::type_level("Options"),
                ),
                Diagnostic::new(
                    DiagnosticCode::MisplacedOption,
                    Severity::Warning,
                    "warn",
                    Location::member("Helper", "a"),
                ),
            ],
        };
        assert!(validation.has_errors());
        let blocked = validation.blocked_members();
        assert_eq!(blocked.len(), 1);
        assert_eq!(
            blocked.get(&Location::member("Options", "b")),
            Some(&vec![DiagnosticCode::MalformedAnnotation])
        );
    }

    #[test]
    fn test_validation_does_not_touch_extraction() {
        let set = DeclarationSet::new(vec![container("Options").with_member(
            MemberDeclaration::new("force", DeclaredType::new(ValueShape::Bool).nullable())
                .with_annotation(option("--force").with_named("required", true)),
        )]);
        let cancel = CancellationToken::new();
        let extraction = extract(&set, &cancel).unwrap();
        let before = extraction.clone();

        let first = validate(&set, &extraction, &SeverityTable::default(), &cancel).unwrap();
        let second = validate(&set, &extraction, &SeverityTable::default(), &cancel).unwrap();

        assert_eq!(extraction, before);
        assert_eq!(first, second);
    }
}
