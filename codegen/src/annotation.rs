//! Typed reading of the recognized annotation vocabulary.
//!
//! Raw arguments are bound to the fields of each annotation (positional
//! arguments bind in field order, named arguments by key) and converted to
//! typed values. Every problem is collected as a message instead of
//! stopping at the first one; the extractor turns messages into
//! malformed-annotation diagnostics.

use optforge_core::{
    Annotation, DirectoryMode, FileMode, Literal, PathKind, ValidationConstraint,
};

/// Fields of the command-container annotation, in positional order.
const COMMAND_FIELDS: &[&str] = &["description", "name"];

/// Fields of the option annotation, in positional order.
const OPTION_FIELDS: &[&str] = &[
    "primary_flag",
    "aliases",
    "description",
    "help_name",
    "required",
    "hidden",
    "arity_min",
    "arity_max",
];

const CONSTRAINT_FIELDS: &[&str] = &["mode"];

/// Typed value plus the problems met while reading it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parsed<T> {
    pub value: T,
    pub problems: Vec<String>,
}

/// Arguments of the command-container annotation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandArgs {
    pub description: Option<String>,
    pub name: Option<String>,
}

/// Arguments of the option annotation, before defaults are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionArgs {
    pub primary_flag: Option<String>,
    pub aliases: Vec<String>,
    pub description: Option<String>,
    pub help_name: Option<String>,
    pub required: bool,
    pub hidden: bool,
    pub arity_min: Option<u32>,
    pub arity_max: Option<u32>,
}

/// Reads a command-container annotation.
pub fn read_command(annotation: &Annotation) -> Parsed<CommandArgs> {
    let mut reader = ArgReader::bind(annotation, COMMAND_FIELDS);
    let value = CommandArgs {
        description: reader.string("description"),
        name: reader.string("name"),
    };
    reader.finish(value)
}

/// Reads an option annotation.
///
/// # Examples
///
/// ```
/// use optforge_codegen::annotation::read_option;
/// use optforge_core::{Annotation, OPTION_ANNOTATION};
///
/// let annotation = Annotation::new(OPTION_ANNOTATION)
///     .with_positional("--output")
///     .with_named("aliases", vec!["-o"])
///     .with_named("arity_max", "two");
///
/// let parsed = read_option(&annotation);
/// assert_eq!(parsed.value.primary_flag.as_deref(), Some("--output"));
/// assert_eq!(parsed.value.aliases, vec!["-o".to_string()]);
/// assert_eq!(parsed.problems.len(), 1);
/// ```
pub fn read_option(annotation: &Annotation) -> Parsed<OptionArgs> {
    let mut reader = ArgReader::bind(annotation, OPTION_FIELDS);
    let primary_flag = reader.string("primary_flag");
    if reader.get("primary_flag").is_none() {
        reader.problem("missing required argument `primary_flag`".to_string());
    }
    let value = OptionArgs {
        primary_flag,
        aliases: reader.strings("aliases"),
        description: reader.string("description"),
        help_name: reader.string("help_name"),
        required: reader.boolean("required").unwrap_or(false),
        hidden: reader.boolean("hidden").unwrap_or(false),
        arity_min: reader.count("arity_min"),
        arity_max: reader.count("arity_max"),
    };
    reader.finish(value)
}

/// Reads a directory- or file-constraint annotation.
///
/// A constraint without a mode means `ExistingOnly`. `None` is returned
/// when the mode is not valid for the path kind.
pub fn read_constraint(kind: PathKind, annotation: &Annotation) -> Parsed<Option<ValidationConstraint>> {
    let mut reader = ArgReader::bind(annotation, CONSTRAINT_FIELDS);
    let mode = reader.string("mode");
    let constraint = match (kind, mode.as_deref()) {
        (PathKind::Directory, None | Some("ExistingOnly")) => {
            Some(ValidationConstraint::Directory(DirectoryMode::ExistingOnly))
        }
        (PathKind::Directory, Some("CreateIfMissing")) => {
            Some(ValidationConstraint::Directory(DirectoryMode::CreateIfMissing))
        }
        (PathKind::File, None | Some("ExistingOnly")) => {
            Some(ValidationConstraint::File(FileMode::ExistingOnly))
        }
        (_, Some(other)) => {
            let expected = match kind {
                PathKind::Directory => "`ExistingOnly` or `CreateIfMissing`",
                PathKind::File => "`ExistingOnly`",
            };
            reader.problem(format!(
                "unknown {} constraint mode `{other}`; expected {expected}",
                kind.annotation_name()
            ));
            None
        }
    };
    reader.finish(constraint)
}

struct ArgReader<'a> {
    annotation: &'a str,
    bound: Vec<(&'static str, &'a Literal)>,
    problems: Vec<String>,
}

impl<'a> ArgReader<'a> {
    fn bind(annotation: &'a Annotation, fields: &[&'static str]) -> Self {
        let mut reader = Self {
            annotation: &annotation.name,
            bound: Vec::new(),
            problems: Vec::new(),
        };
        let mut position = 0;

        for arg in &annotation.args {
            let field = match &arg.name {
                Some(name) => match fields.iter().find(|field| **field == name.as_str()) {
                    Some(field) => *field,
                    None => {
                        reader.problem(format!("unknown argument `{name}`"));
                        continue;
                    }
                },
                None => {
                    let Some(field) = fields.get(position) else {
                        reader.problem(format!(
                            "too many positional arguments; expected at most {}",
                            fields.len()
                        ));
                        continue;
                    };
                    position += 1;
                    *field
                }
            };

            if reader.is_bound(field) {
                reader.problem(format!("argument `{field}` given more than once"));
                continue;
            }
            reader.bound.push((field, &arg.value));
        }

        reader
    }

    fn is_bound(&self, field: &str) -> bool {
        self.bound.iter().any(|(name, _)| *name == field)
    }

    fn get(&self, field: &str) -> Option<&'a Literal> {
        self.bound
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, value)| *value)
            .filter(|value| !matches!(value, Literal::Null))
    }

    fn problem(&mut self, message: String) {
        self.problems.push(message);
    }

    fn mismatch(&mut self, field: &str, expected: &str, found: &Literal) {
        self.problem(format!(
            "argument `{field}` expects {expected}, found {}",
            found.kind()
        ));
    }

    fn string(&mut self, field: &str) -> Option<String> {
        match self.get(field)? {
            Literal::String(value) => Some(value.clone()),
            other => {
                self.mismatch(field, "a string", other);
                None
            }
        }
    }

    fn strings(&mut self, field: &str) -> Vec<String> {
        let Some(value) = self.get(field) else {
            return Vec::new();
        };
        match value {
            Literal::String(single) => vec![single.clone()],
            Literal::List(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Literal::String(s) => values.push(s.clone()),
                        other => self.mismatch(field, "a list of strings", other),
                    }
                }
                values
            }
            other => {
                self.mismatch(field, "a list of strings", other);
                Vec::new()
            }
        }
    }

    fn boolean(&mut self, field: &str) -> Option<bool> {
        match self.get(field)? {
            Literal::Bool(value) => Some(*value),
            Literal::String(text) => match text.trim() {
                "true" => Some(true),
                "false" => Some(false),
                _ => {
                    self.problem(format!(
                        "argument `{field}` has unparseable boolean `{text}`"
                    ));
                    None
                }
            },
            other => {
                self.mismatch(field, "a boolean", other);
                None
            }
        }
    }

    fn count(&mut self, field: &str) -> Option<u32> {
        match self.get(field)? {
            Literal::Integer(value) => {
                if *value < 0 {
                    self.problem(format!("argument `{field}` must not be negative, found {value}"));
                    return None;
                }
                match u32::try_from(*value) {
                    Ok(count) => Some(count),
                    Err(_) => {
                        self.problem(format!("argument `{field}` is out of range: {value}"));
                        None
                    }
                }
            }
            Literal::String(text) => match text.trim().parse::<u32>() {
                Ok(count) => Some(count),
                Err(_) => {
                    self.problem(format!(
                        "argument `{field}` has unparseable count `{text}`"
                    ));
                    None
                }
            },
            other => {
                self.mismatch(field, "a non-negative integer", other);
                None
            }
        }
    }

    fn finish<T>(self, value: T) -> Parsed<T> {
        let annotation = self.annotation;
        Parsed {
            value,
            problems: self
                .problems
                .into_iter()
                .map(|problem| format!("malformed `{annotation}` annotation: {problem}"))
                .collect(),
        }
    }
}
