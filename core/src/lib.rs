//! Core types for annotated option schemas.
//!
//! This crate defines the data model shared by every stage of the
//! `optforge` generator:
//!
//! - [`DeclarationSet`]: the annotated type declarations handed to the
//!   generator (types, members, annotations and their raw arguments).
//! - [`CommandDescriptor`] / [`OptionDescriptor`]: the descriptor tree
//!   built by extraction and consumed by validation and emission.
//! - [`Diagnostic`]: a coded, located finding with a [`Severity`].
//!
//! # Example
//!
//! ```
//! use optforge_core::*;
//!
//! let member = MemberDeclaration::new("output", DeclaredType::new(ValueShape::Directory))
//!     .with_annotation(Annotation::new(OPTION_ANNOTATION).with_positional("--output"))
//!     .with_annotation(Annotation::new(DIRECTORY_ANNOTATION).with_positional("CreateIfMissing"));
//!
//! assert!(member.has_option());
//! assert_eq!(member.constraint_annotations().count(), 1);
//! assert_eq!(BackingType::classify(&member.ty), BackingType::DirectoryPath);
//! ```

mod declaration;
mod descriptor;
mod diagnostic;

pub use declaration::*;
pub use descriptor::*;
pub use diagnostic::*;
