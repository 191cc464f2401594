//! Compiles annotated declarations into `clap`-based option parsers.
//!
//! The generator runs three stages over a [`DeclarationSet`]:
//!
//! - [`extract::extract`] builds the descriptor tree and reports malformed
//!   annotations.
//! - [`validate::validate`] runs every rule in [`validate::RULES`] over the
//!   declarations and the tree.
//! - [`emit::emit`] renders Rust source for every command, leaving out
//!   members blocked by Error diagnostics.
//!
//! [`Pipeline`] wraps the three stages in fingerprint-keyed caches, so a
//! repeated run on unchanged input computes nothing.
//!
//! # Example
//!
//! ```
//! use optforge_codegen::{CancellationToken, Pipeline};
//! use optforge_core::*;
//!
//! let set = DeclarationSet::new(vec![
//!     TypeDeclaration::new("BuildOptions")
//!         .with_annotation(Annotation::new(COMMAND_ANNOTATION).with_named("name", "build"))
//!         .with_member(
//!             MemberDeclaration::new("out_dir", DeclaredType::new(ValueShape::Directory))
//!                 .with_annotation(Annotation::new(OPTION_ANNOTATION).with_positional("--out-dir"))
//!                 .with_annotation(Annotation::new(DIRECTORY_ANNOTATION).with_positional("CreateIfMissing")),
//!         ),
//! ]);
//!
//! let output = Pipeline::default().run(&set, &CancellationToken::new()).unwrap();
//! assert!(output.diagnostics().is_empty());
//! assert!(output.source.contains("::clap::Command::new(\"build\")"));
//! assert!(output.source.contains("create_dir_all"));
//! ```
//!
//! [`DeclarationSet`]: optforge_core::DeclarationSet

pub mod annotation;
pub mod cache;
pub mod cancel;
pub mod config;
pub mod emit;
pub mod error;
pub mod extract;
pub mod fingerprint;
pub mod flag;
pub mod format;
pub mod pipeline;
pub mod render;
pub mod validate;

pub use cancel::CancellationToken;
pub use config::GeneratorConfig;
pub use error::{ConfigError, PipelineError};
pub use pipeline::{Pipeline, PipelineOutput, RunReport};
