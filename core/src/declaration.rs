//! Raw annotated declarations: the input of the generator.
//!
//! A [`DeclarationSet`] is the already-resolved structural description of
//! a set of type declarations together with the metadata annotations
//! attached to the types and their members. Nothing here interprets the
//! annotations; the extractor and the validator do that.
//!
//! The model round-trips through JSON and YAML, which is the wire format
//! accepted by the `optforge` binary.
//!
//! # Examples
//!
//! ```
//! use optforge_core::*;
//!
//! let set = DeclarationSet::new(vec![
//!     TypeDeclaration::new("BuildOptions")
//!         .with_annotation(Annotation::new(COMMAND_ANNOTATION))
//!         .with_member(
//!             MemberDeclaration::new("verbose", DeclaredType::new(ValueShape::Bool))
//!                 .with_annotation(
//!                     Annotation::new(OPTION_ANNOTATION).with_positional("--verbose"),
//!                 ),
//!         ),
//! ]);
//!
//! assert_eq!(set.declarations.len(), 1);
//! assert!(set.declarations[0].is_command_container());
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Name of the command-container annotation.
pub const COMMAND_ANNOTATION: &str = "command";
/// Name of the option annotation.
pub const OPTION_ANNOTATION: &str = "option";
/// Name of the directory-constraint annotation.
pub const DIRECTORY_ANNOTATION: &str = "directory";
/// Name of the file-constraint annotation.
pub const FILE_ANNOTATION: &str = "file";

/// Ordered set of type declarations handed to the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclarationSet {
    pub declarations: Vec<TypeDeclaration>,
}

impl DeclarationSet {
    pub fn new(declarations: Vec<TypeDeclaration>) -> Self {
        Self { declarations }
    }
}

/// One type declaration and its members, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDeclaration {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub members: Vec<MemberDeclaration>,
}

impl TypeDeclaration {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            annotations: Vec::new(),
            members: Vec::new(),
        }
    }

    /// Attaches a type-level annotation.
    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Appends a member.
    pub fn with_member(mut self, member: MemberDeclaration) -> Self {
        self.members.push(member);
        self
    }

    /// Returns the first type-level annotation with the given name.
    pub fn annotation(&self, name: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.name == name)
    }

    /// Returns `true` if the type carries the command-container annotation.
    pub fn is_command_container(&self) -> bool {
        self.annotation(COMMAND_ANNOTATION).is_some()
    }
}

/// A field or property of a type declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberDeclaration {
    pub name: String,
    pub ty: DeclaredType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
}

impl MemberDeclaration {
    pub fn new(name: &str, ty: DeclaredType) -> Self {
        Self {
            name: name.to_string(),
            ty,
            annotations: Vec::new(),
        }
    }

    /// Attaches a member-level annotation.
    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Iterates over the annotations with the given name.
    pub fn annotations_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Annotation> {
        self.annotations.iter().filter(move |a| a.name == name)
    }

    /// Returns `true` if the member carries the option annotation.
    pub fn has_option(&self) -> bool {
        self.annotations_named(OPTION_ANNOTATION).next().is_some()
    }

    /// Iterates over directory- and file-constraint annotations, in order.
    pub fn constraint_annotations(&self) -> impl Iterator<Item = (PathKind, &Annotation)> {
        self.annotations.iter().filter_map(|a| {
            PathKind::from_annotation_name(&a.name).map(|kind| (kind, a))
        })
    }
}

/// Primitive shape of a member's declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueShape {
    Bool,
    Text,
    Integer,
    Float,
    File,
    Directory,
}

impl ValueShape {
    /// Default Rust element type used when a declaration does not name one.
    pub fn default_element(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Text => "String",
            Self::Integer => "i64",
            Self::Float => "f64",
            Self::File | Self::Directory => "::std::path::PathBuf",
        }
    }

    /// Path kind carried by path-shaped values.
    pub fn path_kind(self) -> Option<PathKind> {
        match self {
            Self::File => Some(PathKind::File),
            Self::Directory => Some(PathKind::Directory),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::File => "file path",
            Self::Directory => "directory path",
        }
    }
}

/// Declared type of a member.
///
/// # Examples
///
/// ```
/// use optforge_core::{DeclaredType, ValueShape};
///
/// let ty = DeclaredType::new(ValueShape::Directory).sequence();
/// assert!(ty.sequence);
/// assert_eq!(ty.element_type(), "::std::path::PathBuf");
/// assert_eq!(ty.to_string(), "Vec<directory path>");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredType {
    pub shape: ValueShape,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub sequence: bool,
    /// Rust element type spelled in generated code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<String>,
}

impl DeclaredType {
    pub fn new(shape: ValueShape) -> Self {
        Self {
            shape,
            nullable: false,
            sequence: false,
            element: None,
        }
    }

    /// Marks the type as nullable (`Option<T>`).
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Marks the type as a sequence (`Vec<T>`).
    pub fn sequence(mut self) -> Self {
        self.sequence = true;
        self
    }

    /// Overrides the element type spelled in generated code.
    pub fn with_element(mut self, element: &str) -> Self {
        self.element = Some(element.to_string());
        self
    }

    pub fn element_type(&self) -> &str {
        self.element
            .as_deref()
            .unwrap_or_else(|| self.shape.default_element())
    }
}

impl std::fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.shape.label();
        match (self.sequence, self.nullable) {
            (true, true) => write!(f, "Option<Vec<{inner}>>"),
            (true, false) => write!(f, "Vec<{inner}>"),
            (false, true) => write!(f, "Option<{inner}>"),
            (false, false) => write!(f, "{inner}"),
        }
    }
}

/// Kind of filesystem path a constraint annotation applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathKind {
    File,
    Directory,
}

impl PathKind {
    /// Maps a constraint annotation name to the path kind it requires.
    pub fn from_annotation_name(name: &str) -> Option<Self> {
        match name {
            FILE_ANNOTATION => Some(Self::File),
            DIRECTORY_ANNOTATION => Some(Self::Directory),
            _ => None,
        }
    }

    pub fn annotation_name(self) -> &'static str {
        match self {
            Self::File => FILE_ANNOTATION,
            Self::Directory => DIRECTORY_ANNOTATION,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::File => "file path",
            Self::Directory => "directory path",
        }
    }
}

/// One metadata annotation with its raw, uninterpreted arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<AnnotationArg>,
}

impl Annotation {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            args: Vec::new(),
        }
    }

    /// Appends a positional argument.
    pub fn with_positional(mut self, value: impl Into<Literal>) -> Self {
        self.args.push(AnnotationArg {
            name: None,
            value: value.into(),
        });
        self
    }

    /// Appends a named argument.
    pub fn with_named(mut self, name: &str, value: impl Into<Literal>) -> Self {
        self.args.push(AnnotationArg {
            name: Some(name.to_string()),
            value: value.into(),
        });
        self
    }
}

/// A positional (`name == None`) or named annotation argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationArg {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub value: Literal,
}

/// Literal value written in an annotation argument.
///
/// Every JSON or YAML value parses into some variant, so an argument the
/// generator cannot use is reported against its member instead of failing
/// the whole declaration set. Integers outside the `i64` range land in
/// [`Literal::Float`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Null,
    Bool(bool),
    Integer(i64),
    Float(FloatLiteral),
    String(String),
    List(Vec<Literal>),
    Map(BTreeMap<String, Literal>),
}

impl Literal {
    /// Short label of the literal kind, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }
}

/// Floating-point literal, compared bit for bit so [`Literal`] stays `Eq`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FloatLiteral(pub f64);

impl PartialEq for FloatLiteral {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for FloatLiteral {}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Self::Float(FloatLiteral(value))
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl<T: Into<Literal>> From<Vec<T>> for Literal {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}
