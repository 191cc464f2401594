//! Code emission: descriptor tree to Rust source using the `clap` builder API.
//!
//! For every command the emitter writes one inherent `impl` block with
//! `command()`, `from_matches()` and, unless disabled, `run()`. Options are
//! emitted in declaration order. A member carrying an Error diagnostic is
//! replaced by a comment naming the blocking codes; Warning diagnostics do
//! not affect emission, so e.g. a mismatched arity is emitted as declared.
//!
//! Output is a pure function of the descriptor tree, the blocked members
//! and the [`EmitOptions`]; nothing time- or address-dependent is written.

use optforge_core::{
    BackingType, CommandDescriptor, DirectoryMode, FileMode, OptionDescriptor, ValidationConstraint,
    ValueShape,
};
use tracing::debug;

use crate::cancel::CancellationToken;
use crate::config::EmitOptions;
use crate::error::{PipelineError, Result};
use crate::flag::{FlagSpelling, alias_spellings, primary_spelling};
use crate::format::{
    SourceWriter, attribute, bool_literal, char_literal, count_range, doc_comment_lines, line_comment,
    rust_identifier, string_literal,
};
use crate::validate::BlockedMembers;

/// Name and version stamped into the generated header.
pub const GENERATOR: &str = concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION"));

/// Checks run on each bound path value, keyed by constraint.
///
/// `{rt}` expands to the runtime path and `{flag}` to the option's flag as
/// a string literal. The value is in scope as `path: &Path`.
const CONSTRAINT_CHECKS: &[(ValidationConstraint, &[&str])] = &[
    (
        ValidationConstraint::Directory(DirectoryMode::ExistingOnly),
        &[
            "if !path.is_dir() {",
            "    return ::std::result::Result::Err({rt}::Error::raw(",
            "        {rt}::error::ErrorKind::ValueValidation,",
            "        ::std::format!(\"{}: directory does not exist: {}\\n\", {flag}, path.display()),",
            "    ));",
            "}",
        ],
    ),
    (
        ValidationConstraint::Directory(DirectoryMode::CreateIfMissing),
        &[
            "if !path.is_dir() {",
            "    ::std::fs::create_dir_all(path).map_err(|err| {",
            "        {rt}::Error::raw(",
            "            {rt}::error::ErrorKind::Io,",
            "            ::std::format!(\"{}: cannot create directory {}: {}\\n\", {flag}, path.display(), err),",
            "        )",
            "    })?;",
            "}",
        ],
    ),
    (
        ValidationConstraint::File(FileMode::ExistingOnly),
        &[
            "if !path.is_file() {",
            "    return ::std::result::Result::Err({rt}::Error::raw(",
            "        {rt}::error::ErrorKind::ValueValidation,",
            "        ::std::format!(\"{}: file does not exist: {}\\n\", {flag}, path.display()),",
            "    ));",
            "}",
        ],
    ),
];

/// Renders a whole file: header followed by every command.
///
/// Cancellation is polled before each command.
pub fn emit(
    commands: &[CommandDescriptor],
    blocked: &BlockedMembers,
    options: &EmitOptions,
    cancel: &CancellationToken,
) -> Result<String> {
    let mut fragments = Vec::with_capacity(commands.len());
    for command in commands {
        cancel.check()?;
        fragments.push(render_command(command, blocked, options)?);
    }
    Ok(assemble(&fragments, options))
}

/// Joins rendered commands under the optional header.
pub fn assemble<S: AsRef<str>>(fragments: &[S], options: &EmitOptions) -> String {
    let mut out = String::new();
    if options.header {
        out.push_str(&render_header());
    }
    for fragment in fragments {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(fragment.as_ref());
    }
    out
}

/// The `@generated` banner.
///
/// # Examples
///
/// ```
/// use optforge_codegen::emit::render_header;
///
/// assert!(render_header().starts_with("// @generated by optforge-codegen "));
/// ```
pub fn render_header() -> String {
    format!("// @generated by {GENERATOR}\n// Option parsers for annotated command types. Do not edit.\n")
}

/// Blocked members that belong to `command`.
pub fn blocked_for(command: &CommandDescriptor, blocked: &BlockedMembers) -> BlockedMembers {
    blocked
        .iter()
        .filter(|(location, _)| location.type_name == command.type_name)
        .map(|(location, codes)| (location.clone(), codes.clone()))
        .collect()
}

/// Renders the `impl` block for one command.
pub fn render_command(
    command: &CommandDescriptor,
    blocked: &BlockedMembers,
    options: &EmitOptions,
) -> Result<String> {
    let rt = options.runtime_path.as_str();
    let type_name = rust_identifier(&command.type_name)?;

    let mut entries: Vec<Entry<'_>> = Vec::with_capacity(command.options.len());
    for option in &command.options {
        match blocked.get(&option.location) {
            Some(codes) => {
                let codes: Vec<&str> = codes.iter().map(|code| code.as_str()).collect();
                debug!(member = %option.location, codes = ?codes, "member omitted from generated code");
                entries.push(Entry::Omitted(line_comment(&format!(
                    "`{}` omitted: blocked by {}",
                    option.member,
                    codes.join(", ")
                ))?));
            }
            None => {
                check_invariants(option)?;
                entries.push(Entry::Emitted(option));
            }
        }
    }

    let mut out = SourceWriter::new();
    out.line(&attribute("allow", Some("unused_mut, unused_variables, clippy::clone_on_copy")));
    out.line(&format!("impl {type_name} {{"));
    out.indent();

    let emitted: Vec<&OptionDescriptor> = entries
        .iter()
        .filter_map(|entry| match entry {
            Entry::Emitted(option) => Some(*option),
            Entry::Omitted(_) => None,
        })
        .collect();

    write_command_fn(&mut out, command, &entries, rt);
    out.blank();
    write_from_matches(&mut out, &emitted, rt)?;
    if options.derive_run {
        out.blank();
        write_run(&mut out);
    }

    out.dedent();
    out.line("}");

    debug!(
        command = %command.name,
        emitted = emitted.len(),
        omitted = entries.len() - emitted.len(),
        "rendered command"
    );
    Ok(out.finish())
}

fn check_invariants(option: &OptionDescriptor) -> Result<()> {
    if let BackingType::Scalar(shape @ (ValueShape::Bool | ValueShape::File | ValueShape::Directory)) =
        option.backing_type
    {
        return Err(invariant(
            option,
            format!("scalar backing type carries the {} shape", shape.label()),
        ));
    }
    if option.element_type.trim().is_empty() {
        return Err(invariant(option, "element type is empty".to_string()));
    }
    for constraint in &option.constraints {
        if option.backing_type.path_kind() != Some(constraint.path_kind()) {
            return Err(invariant(
                option,
                format!(
                    "{} constraint attached to a {}",
                    constraint.path_kind().annotation_name(),
                    option.backing_type.label()
                ),
            ));
        }
    }
    Ok(())
}

fn invariant(option: &OptionDescriptor, message: String) -> PipelineError {
    PipelineError::Invariant {
        location: option.location.to_string(),
        message,
    }
}

/// One member slot of a command, in declaration order.
enum Entry<'a> {
    Emitted(&'a OptionDescriptor),
    /// Comment standing in for a blocked member.
    Omitted(String),
}

fn write_command_fn(out: &mut SourceWriter, command: &CommandDescriptor, entries: &[Entry<'_>], rt: &str) {
    if let Some(description) = &command.description {
        out.lines(doc_comment_lines(description));
    }
    out.line(&format!("pub fn command() -> {rt}::Command {{"));
    out.indent();
    out.line(&format!("{rt}::Command::new({})", string_literal(&command.name)));
    out.indent();
    if let Some(description) = &command.description {
        out.line(&format!(".about({})", string_literal(description)));
    }
    for entry in entries {
        let option = match entry {
            Entry::Emitted(option) => option,
            Entry::Omitted(comment) => {
                out.line(comment);
                continue;
            }
        };
        out.line(".arg(");
        out.indent();
        out.line(&format!("{rt}::Arg::new({})", string_literal(&option.member)));
        out.indent();
        out.lines(arg_settings(option, rt));
        out.dedent();
        out.dedent();
        out.line(")");
    }
    out.dedent();
    out.dedent();
    out.line("}");
}

fn arg_settings(option: &OptionDescriptor, rt: &str) -> Vec<String> {
    let mut settings = Vec::new();

    match primary_spelling(option) {
        FlagSpelling::Long(name) => settings.push(format!(".long({})", string_literal(&name))),
        FlagSpelling::Short(c) => settings.push(format!(".short({})", char_literal(c))),
    }
    for alias in alias_spellings(option) {
        match alias {
            FlagSpelling::Long(name) => {
                settings.push(format!(".visible_alias({})", string_literal(&name)))
            }
            FlagSpelling::Short(c) => settings.push(format!(".visible_short_alias({})", char_literal(c))),
        }
    }

    if let Some(description) = &option.description {
        settings.push(format!(".help({})", string_literal(description)));
    }
    if let Some(help_name) = &option.help_name {
        settings.push(format!(".value_name({})", string_literal(help_name)));
    }
    if option.required {
        settings.push(format!(".required({})", bool_literal(true)));
    }
    if option.hidden {
        settings.push(format!(".hide({})", bool_literal(true)));
    }
    settings.push(format!(
        ".num_args({})",
        count_range(option.arity.min, option.arity.max)
    ));
    if option.backing_type.is_boolean() {
        settings.push(format!(".default_missing_value({})", string_literal("true")));
    }
    settings.push(format!(
        ".value_parser({rt}::value_parser!({}))",
        option.element_type
    ));
    let action = if option.backing_type.is_sequence() {
        "Append"
    } else {
        "Set"
    };
    settings.push(format!(".action({rt}::ArgAction::{action}),"));

    settings
}

fn write_from_matches(out: &mut SourceWriter, emitted: &[&OptionDescriptor], rt: &str) -> Result<()> {
    out.line(&format!(
        "pub fn from_matches(matches: &{rt}::ArgMatches) -> ::std::result::Result<Self, {rt}::Error> {{"
    ));
    out.indent();
    out.line("let mut options = <Self as ::std::default::Default>::default();");
    for option in emitted {
        write_binding(out, option, rt)?;
    }
    out.line("::std::result::Result::Ok(options)");
    out.dedent();
    out.line("}");
    Ok(())
}

fn write_binding(out: &mut SourceWriter, option: &OptionDescriptor, rt: &str) -> Result<()> {
    let field = rust_identifier(&option.member)?;
    let id = string_literal(&option.member);
    let element = option.element_type.as_str();
    let checks = constraint_checks(option, rt)?;

    if option.backing_type.is_sequence() {
        out.line(&format!(
            "if let ::std::option::Option::Some(values) = matches.get_many::<{element}>({id}) {{"
        ));
        out.indent();
        if !checks.is_empty() {
            out.line("for value in values.clone() {");
            out.indent();
            out.line("let path: &::std::path::Path = value.as_ref();");
            out.lines(&checks);
            out.dedent();
            out.line("}");
        }
        if option.backing_type.is_nullable() {
            out.line(&format!(
                "options.{field} = ::std::option::Option::Some(values.cloned().collect());"
            ));
        } else {
            out.line(&format!("options.{field} = values.cloned().collect();"));
        }
    } else {
        out.line(&format!(
            "if let ::std::option::Option::Some(value) = matches.get_one::<{element}>({id}) {{"
        ));
        out.indent();
        if !checks.is_empty() {
            out.line("let path: &::std::path::Path = value.as_ref();");
            out.lines(&checks);
        }
        if option.backing_type.is_nullable() {
            out.line(&format!(
                "options.{field} = ::std::option::Option::Some(value.clone());"
            ));
        } else {
            out.line(&format!("options.{field} = value.clone();"));
        }
    }
    out.dedent();
    out.line("}");
    Ok(())
}

/// Expands the check template of every constraint on `option`.
fn constraint_checks(option: &OptionDescriptor, rt: &str) -> Result<Vec<String>> {
    let flag = string_literal(&primary_spelling(option).to_string());
    let mut lines = Vec::new();
    for constraint in &option.constraints {
        let template = CONSTRAINT_CHECKS
            .iter()
            .find(|(known, _)| known == constraint)
            .map(|(_, template)| *template)
            .ok_or_else(|| invariant(option, format!("no check template for {constraint:?}")))?;
        lines.extend(
            template
                .iter()
                .map(|line| line.replace("{rt}", rt).replace("{flag}", &flag)),
        );
    }
    Ok(lines)
}

fn write_run(out: &mut SourceWriter) {
    out.line("pub fn run<I, T, F>(args: I, cancel: &::std::sync::atomic::AtomicBool, handler: F) -> i32");
    out.line("where");
    out.indent();
    out.lines([
        "I: ::std::iter::IntoIterator<Item = T>,",
        "T: ::std::convert::Into<::std::ffi::OsString> + ::std::clone::Clone,",
        "F: ::std::ops::FnOnce(Self, &::std::sync::atomic::AtomicBool) -> i32,",
    ]);
    out.dedent();
    out.block("{", "}", |out| {
        out.line("let bound = Self::command()");
        out.indent();
        out.line(".try_get_matches_from(args)");
        out.line(".and_then(|matches| Self::from_matches(&matches));");
        out.dedent();
        out.block("match bound {", "}", |out| {
            out.line("::std::result::Result::Ok(options) => handler(options, cancel),");
            out.block("::std::result::Result::Err(err) => {", "}", |out| {
                out.line("let _ = err.print();");
                out.line("err.exit_code()");
            });
        });
    });
}
