//! Descriptor tree produced by extraction.
//!
//! A [`CommandDescriptor`] exists for every declaration marked as a command
//! container; its [`OptionDescriptor`]s follow member declaration order,
//! which is observable in help output and parser registration order.
//! Descriptors are immutable once extracted and only point back at their
//! source through an opaque [`Location`].

use serde::{Deserialize, Serialize};

use crate::declaration::{DeclaredType, PathKind, ValueShape};

/// Opaque reference to a declaration or one of its members.
///
/// # Examples
///
/// ```
/// use optforge_core::Location;
///
/// assert_eq!(Location::member("BuildOptions", "output").to_string(), "BuildOptions.output");
/// assert_eq!(Location::type_level("BuildOptions").to_string(), "BuildOptions");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Location {
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member: Option<String>,
}

impl Location {
    pub fn type_level(type_name: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            member: None,
        }
    }

    pub fn member(type_name: &str, member: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            member: Some(member.to_string()),
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.member {
            Some(member) => write!(f, "{}.{}", self.type_name, member),
            None => write!(f, "{}", self.type_name),
        }
    }
}

/// Compiled form of one command container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandDescriptor {
    /// Name of the backing type.
    pub type_name: String,
    /// Command name registered with the runtime.
    pub name: String,
    pub description: Option<String>,
    pub options: Vec<OptionDescriptor>,
    pub location: Location,
}

impl CommandDescriptor {
    /// Finds an option by the name of its backing member.
    pub fn find_option(&self, member: &str) -> Option<&OptionDescriptor> {
        self.options.iter().find(|o| o.member == member)
    }
}

/// Compiled form of one annotated member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionDescriptor {
    /// Name of the backing member; also the runtime argument id.
    pub member: String,
    pub primary_flag: String,
    /// Aliases in declaration order, without duplicates.
    pub aliases: Vec<String>,
    pub description: Option<String>,
    pub help_name: Option<String>,
    pub required: bool,
    pub hidden: bool,
    pub arity: Arity,
    pub backing_type: BackingType,
    /// Rust element type bound by the generated parser.
    pub element_type: String,
    pub constraints: Vec<ValidationConstraint>,
    pub location: Location,
}

impl OptionDescriptor {
    /// Primary flag followed by aliases.
    pub fn all_flags(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.primary_flag.as_str()).chain(self.aliases.iter().map(String::as_str))
    }
}

/// Minimum and maximum number of values an option accepts.
///
/// `max == None` means unbounded.
///
/// # Examples
///
/// ```
/// use optforge_core::Arity;
///
/// assert!(Arity::new(0, Some(1)).fits_within(&Arity::new(0, Some(1))));
/// assert!(!Arity::new(3, Some(5)).fits_within(&Arity::new(0, Some(1))));
/// assert!(Arity::new(2, None).fits_within(&Arity::unbounded(0)));
/// assert_eq!(Arity::new(3, Some(5)).to_string(), "(3, 5)");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Arity {
    pub min: u32,
    pub max: Option<u32>,
}

impl Arity {
    pub const EXACTLY_ONE: Self = Self {
        min: 1,
        max: Some(1),
    };
    pub const OPTIONAL_ONE: Self = Self {
        min: 0,
        max: Some(1),
    };

    pub const fn new(min: u32, max: Option<u32>) -> Self {
        Self { min, max }
    }

    pub const fn unbounded(min: u32) -> Self {
        Self { min, max: None }
    }

    /// `min <= max` (always true when unbounded).
    pub fn is_ordered(&self) -> bool {
        self.max.is_none_or(|max| self.min <= max)
    }

    /// Returns `true` if this range is ordered and lies inside `natural`.
    pub fn fits_within(&self, natural: &Arity) -> bool {
        if !self.is_ordered() || self.min < natural.min {
            return false;
        }
        match (self.max, natural.max) {
            (_, None) => true,
            (None, Some(_)) => false,
            (Some(max), Some(limit)) => max <= limit,
        }
    }
}

impl std::fmt::Display for Arity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.max {
            Some(max) => write!(f, "({}, {})", self.min, max),
            None => write!(f, "({}, unbounded)", self.min),
        }
    }
}

/// Semantic tag of a member's backing type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "shape", rename_all = "snake_case")]
pub enum BackingType {
    Boolean,
    /// Non-nullable text or number.
    Scalar(ValueShape),
    NullableScalar(ValueShape),
    FilePath,
    DirectoryPath,
    /// Any sequence; path shapes make it a sequence-of-path.
    Sequence(ValueShape),
    NullableSequence(ValueShape),
}

impl BackingType {
    /// Classifies a declared type.
    ///
    /// # Examples
    ///
    /// ```
    /// use optforge_core::{BackingType, DeclaredType, ValueShape};
    ///
    /// let ty = DeclaredType::new(ValueShape::Bool).nullable();
    /// assert_eq!(BackingType::classify(&ty), BackingType::NullableScalar(ValueShape::Bool));
    ///
    /// let ty = DeclaredType::new(ValueShape::File).sequence();
    /// assert_eq!(BackingType::classify(&ty), BackingType::Sequence(ValueShape::File));
    ///
    /// let ty = DeclaredType::new(ValueShape::Text).sequence().nullable();
    /// assert_eq!(BackingType::classify(&ty), BackingType::NullableSequence(ValueShape::Text));
    /// ```
    pub fn classify(ty: &DeclaredType) -> Self {
        match (ty.sequence, ty.nullable) {
            (true, true) => return Self::NullableSequence(ty.shape),
            (true, false) => return Self::Sequence(ty.shape),
            _ => {}
        }
        if ty.nullable {
            return Self::NullableScalar(ty.shape);
        }
        match ty.shape {
            ValueShape::Bool => Self::Boolean,
            ValueShape::File => Self::FilePath,
            ValueShape::Directory => Self::DirectoryPath,
            shape => Self::Scalar(shape),
        }
    }

    pub fn shape(&self) -> ValueShape {
        match self {
            Self::Boolean => ValueShape::Bool,
            Self::FilePath => ValueShape::File,
            Self::DirectoryPath => ValueShape::Directory,
            Self::Scalar(shape)
            | Self::NullableScalar(shape)
            | Self::Sequence(shape)
            | Self::NullableSequence(shape) => *shape,
        }
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self, Self::NullableScalar(_) | Self::NullableSequence(_))
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self, Self::Sequence(_) | Self::NullableSequence(_))
    }

    pub fn is_boolean(&self) -> bool {
        self.shape() == ValueShape::Bool
    }

    /// Path kind of the values held by this type, if any.
    pub fn path_kind(&self) -> Option<PathKind> {
        self.shape().path_kind()
    }

    /// Arity used when the annotation does not declare one.
    pub fn default_arity(&self) -> Arity {
        if self.is_sequence() {
            Arity::unbounded(0)
        } else if self.is_boolean() {
            Arity::OPTIONAL_ONE
        } else {
            Arity::EXACTLY_ONE
        }
    }

    /// Widest arity range the type can hold.
    pub fn natural_arity(&self) -> Arity {
        if self.is_sequence() {
            Arity::unbounded(0)
        } else {
            Arity::OPTIONAL_ONE
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::Boolean => "bool".to_string(),
            Self::Scalar(shape) => shape.label().to_string(),
            Self::NullableScalar(shape) => format!("nullable {}", shape.label()),
            Self::FilePath => "file path".to_string(),
            Self::DirectoryPath => "directory path".to_string(),
            Self::Sequence(shape) => format!("sequence of {}", shape.label()),
            Self::NullableSequence(shape) => format!("nullable sequence of {}", shape.label()),
        }
    }
}

/// Existence or creation policy for a path-typed option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "target", content = "mode", rename_all = "snake_case")]
pub enum ValidationConstraint {
    Directory(DirectoryMode),
    File(FileMode),
}

impl ValidationConstraint {
    pub fn path_kind(&self) -> PathKind {
        match self {
            Self::Directory(_) => PathKind::Directory,
            Self::File(_) => PathKind::File,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DirectoryMode {
    ExistingOnly,
    CreateIfMissing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileMode {
    ExistingOnly,
}
