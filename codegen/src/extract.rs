//! Schema extraction: annotated declarations to descriptor tree.
//!
//! Only declarations carrying the command-container annotation produce a
//! [`CommandDescriptor`]; within one, only members carrying the option
//! annotation produce an [`OptionDescriptor`]. Everything else is left for
//! the validator to judge. Malformed annotation arguments are reported as
//! `UNC006` diagnostics and the member is still extracted with defaults
//! for the fields that could not be read.
//!
//! Type and member names become Rust identifiers in the generated code. A
//! name that cannot be spelled as one (`out-dir`, `self`) is reported as
//! `UNC006` and its declaration is left out of the tree, whatever severity
//! the code is configured with.

use optforge_core::{
    Annotation, Arity, BackingType, COMMAND_ANNOTATION, CommandDescriptor, DeclarationSet,
    Diagnostic, DiagnosticCode, Location, MemberDeclaration, OPTION_ANNOTATION,
    OptionDescriptor, PathKind, Severity, TypeDeclaration, ValidationConstraint,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::annotation::{self, OptionArgs};
use crate::cancel::CancellationToken;
use crate::error::Result;
use crate::format::rust_identifier;

/// Output of the extraction stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extraction {
    /// One descriptor per command container, in declaration order.
    pub commands: Vec<CommandDescriptor>,
    /// Malformed-annotation diagnostics.
    pub diagnostics: Vec<Diagnostic>,
}

/// Extracts the descriptor tree from a declaration set.
///
/// Cancellation is polled before each member.
///
/// # Examples
///
/// ```
/// use optforge_codegen::{CancellationToken, extract::extract};
/// use optforge_core::*;
///
/// let set = DeclarationSet::new(vec![
///     TypeDeclaration::new("Options")
///         .with_annotation(Annotation::new(COMMAND_ANNOTATION))
///         .with_member(
///             MemberDeclaration::new("force", DeclaredType::new(ValueShape::Bool))
///                 .with_annotation(Annotation::new(OPTION_ANNOTATION).with_positional("--force")),
///         )
///         .with_member(MemberDeclaration::new("cache", DeclaredType::new(ValueShape::Text))),
///     TypeDeclaration::new("NotACommand"),
/// ]);
///
/// let extraction = extract(&set, &CancellationToken::new()).unwrap();
/// assert_eq!(extraction.commands.len(), 1);
/// assert_eq!(extraction.commands[0].options.len(), 1);
/// assert!(extraction.diagnostics.is_empty());
/// ```
pub fn extract(set: &DeclarationSet, cancel: &CancellationToken) -> Result<Extraction> {
    let mut extraction = Extraction::default();

    for decl in &set.declarations {
        let Some(command_annotation) = decl.annotation(COMMAND_ANNOTATION) else {
            continue;
        };
        if let Err(err) = rust_identifier(&decl.name) {
            debug!(type_name = %decl.name, "command type name is not an identifier");
            report(
                &mut extraction.diagnostics,
                &Location::type_level(&decl.name),
                vec![format!("type `{}` cannot name the generated impl: {err}", decl.name)],
            );
            continue;
        }
        let command = extract_command(decl, command_annotation, cancel, &mut extraction.diagnostics)?;
        debug!(
            command = %command.name,
            options = command.options.len(),
            "extracted command descriptor"
        );
        extraction.commands.push(command);
    }

    Ok(extraction)
}

fn extract_command(
    decl: &TypeDeclaration,
    command_annotation: &Annotation,
    cancel: &CancellationToken,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<CommandDescriptor> {
    let location = Location::type_level(&decl.name);

    let parsed = annotation::read_command(command_annotation);
    report(diagnostics, &location, parsed.problems);
    if decl
        .annotations
        .iter()
        .filter(|a| a.name == COMMAND_ANNOTATION)
        .count()
        > 1
    {
        report(
            diagnostics,
            &location,
            vec![format!(
                "malformed `{COMMAND_ANNOTATION}` annotation: annotation repeated; only the first is used"
            )],
        );
    }

    let mut options = Vec::new();
    for member in &decl.members {
        cancel.check()?;
        if let Some(option) = extract_option(decl, member, diagnostics) {
            options.push(option);
        }
    }

    Ok(CommandDescriptor {
        type_name: decl.name.clone(),
        name: parsed.value.name.unwrap_or_else(|| decl.name.clone()),
        description: parsed.value.description,
        options,
        location,
    })
}

fn extract_option(
    decl: &TypeDeclaration,
    member: &MemberDeclaration,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<OptionDescriptor> {
    let mut option_annotations = member.annotations_named(OPTION_ANNOTATION);
    let option_annotation = option_annotations.next()?;
    let location = Location::member(&decl.name, &member.name);
    let mut problems = Vec::new();

    if option_annotations.next().is_some() {
        problems.push(format!(
            "malformed `{OPTION_ANNOTATION}` annotation: annotation repeated; only the first is used"
        ));
    }

    let parsed = annotation::read_option(option_annotation);
    problems.extend(parsed.problems);
    let args = parsed.value;

    let bindable = match rust_identifier(&member.name) {
        Ok(_) => true,
        Err(err) => {
            problems.push(format!("member `{}` cannot be bound to a field: {err}", member.name));
            false
        }
    };

    let backing_type = BackingType::classify(&member.ty);
    let constraints = extract_constraints(member, backing_type, &mut problems);
    let arity = resolve_arity(&args, backing_type);
    let primary_flag = args.primary_flag.clone().unwrap_or_default();
    let aliases = dedup_aliases(&primary_flag, args.aliases);

    report(diagnostics, &location, problems);
    if !bindable {
        return None;
    }

    Some(OptionDescriptor {
        member: member.name.clone(),
        primary_flag,
        aliases,
        description: args.description,
        help_name: args.help_name,
        required: args.required,
        hidden: args.hidden,
        arity,
        backing_type,
        element_type: member.ty.element_type().to_string(),
        constraints,
        location,
    })
}

/// Reads constraint annotations, keeping only those compatible with the
/// backing type. Incompatible ones are judged by the validator.
fn extract_constraints(
    member: &MemberDeclaration,
    backing_type: BackingType,
    problems: &mut Vec<String>,
) -> Vec<ValidationConstraint> {
    let mut constraints = Vec::new();
    let mut seen: Vec<PathKind> = Vec::new();

    for (kind, constraint_annotation) in member.constraint_annotations() {
        if seen.contains(&kind) {
            problems.push(format!(
                "malformed `{}` annotation: annotation repeated; only the first is used",
                kind.annotation_name()
            ));
            continue;
        }
        seen.push(kind);

        let parsed = annotation::read_constraint(kind, constraint_annotation);
        problems.extend(parsed.problems);
        if backing_type.path_kind() != Some(kind) {
            continue;
        }
        if let Some(constraint) = parsed.value {
            constraints.push(constraint);
        }
    }

    constraints
}

fn resolve_arity(args: &OptionArgs, backing_type: BackingType) -> Arity {
    let default = backing_type.default_arity();
    Arity {
        min: args.arity_min.unwrap_or(default.min),
        max: args.arity_max.or(default.max),
    }
}

fn dedup_aliases(primary_flag: &str, aliases: Vec<String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(aliases.len());
    for alias in aliases {
        if alias != primary_flag && !unique.contains(&alias) {
            unique.push(alias);
        }
    }
    unique
}

fn report(diagnostics: &mut Vec<Diagnostic>, location: &Location, problems: Vec<String>) {
    diagnostics.extend(problems.into_iter().map(|message| {
        Diagnostic::new(
            DiagnosticCode::MalformedAnnotation,
            Severity::Error,
            message,
            location.clone(),
        )
    }));
}
