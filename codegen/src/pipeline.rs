//! The memoized extract, validate, emit pipeline.
//!
//! Each stage is cached under a fingerprint of its input:
//!
//! | stage      | key                                                     |
//! |------------|---------------------------------------------------------|
//! | extraction | declaration set                                         |
//! | validation | declaration set, extraction, severity table             |
//! | emission   | descriptor tree, blocked members, emit options          |
//!
//! Emission additionally caches one fragment per command, so editing one
//! command only re-renders that command.

use std::sync::Arc;

use optforge_core::{CommandDescriptor, DeclarationSet, Diagnostic, DiagnosticCode, Location};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cache::{CacheStats, CacheStatus, StageCache};
use crate::cancel::CancellationToken;
use crate::config::GeneratorConfig;
use crate::emit::{assemble, blocked_for, render_command};
use crate::error::Result;
use crate::extract::{Extraction, extract};
use crate::fingerprint::Fingerprint;
use crate::validate::{BlockedMembers, Validation, validate};

/// How each stage of one run was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub extraction: CacheStatus,
    pub validation: CacheStatus,
    pub emission: CacheStatus,
}

impl RunReport {
    /// `true` when no stage computed anything.
    pub fn fully_cached(&self) -> bool {
        [self.extraction, self.validation, self.emission]
            .iter()
            .all(|status| *status == CacheStatus::Cached)
    }
}

/// Result of one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub extraction: Arc<Extraction>,
    pub validation: Arc<Validation>,
    pub source: Arc<String>,
    pub report: RunReport,
}

impl PipelineOutput {
    /// Extraction and rule diagnostics, with severities resolved.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.validation.diagnostics
    }

    pub fn has_errors(&self) -> bool {
        self.validation.has_errors()
    }
}

/// Counters of every cache owned by a pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStats {
    pub extraction: CacheStats,
    pub validation: CacheStats,
    pub emission: CacheStats,
    pub fragments: CacheStats,
}

/// Generator pipeline with its stage caches.
///
/// A pipeline is `Send + Sync`; hosts share one instance across threads
/// so that every run benefits from earlier results.
///
/// Cache entries are never evicted: every distinct input adds entries
/// that live as long as the pipeline. A long-lived host that feeds a
/// stream of changing declarations calls [`Pipeline::clear`] at points of
/// its choosing, or drops the pipeline and starts a new one.
///
/// # Examples
///
/// ```
/// use optforge_codegen::{CancellationToken, Pipeline};
/// use optforge_codegen::config::GeneratorConfig;
/// use optforge_core::*;
///
/// let set = DeclarationSet::new(vec![
///     TypeDeclaration::new("Options")
///         .with_annotation(Annotation::new(COMMAND_ANNOTATION))
///         .with_member(
///             MemberDeclaration::new("force", DeclaredType::new(ValueShape::Bool))
///                 .with_annotation(Annotation::new(OPTION_ANNOTATION).with_positional("--force")),
///         ),
/// ]);
///
/// let pipeline = Pipeline::new(GeneratorConfig::default());
/// let cancel = CancellationToken::new();
/// let first = pipeline.run(&set, &cancel).unwrap();
/// let second = pipeline.run(&set, &cancel).unwrap();
///
/// assert!(first.diagnostics().is_empty());
/// assert!(!first.report.fully_cached());
/// assert!(second.report.fully_cached());
/// assert_eq!(first.source, second.source);
/// ```
#[derive(Debug, Default)]
pub struct Pipeline {
    config: GeneratorConfig,
    extraction: StageCache<Extraction>,
    validation: StageCache<Validation>,
    emission: StageCache<String>,
    fragments: StageCache<String>,
}

impl Pipeline {
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Runs every stage, reusing cached results where the input is unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Cancelled`](crate::PipelineError::Cancelled)
    /// when `cancel` fires between two units of work, and
    /// [`PipelineError::Invariant`](crate::PipelineError::Invariant) when a
    /// descriptor reaches the emitter in an inconsistent state. In both
    /// cases no partial result is cached.
    pub fn run(&self, set: &DeclarationSet, cancel: &CancellationToken) -> Result<PipelineOutput> {
        let set_key = Fingerprint::of(set)?;

        let (extraction, extraction_status) = self
            .extraction
            .get_or_compute(&set_key, || extract(set, cancel))?;
        debug!(key = set_key.short(), status = ?extraction_status, "extraction stage");

        let validation_key = Fingerprint::combine(&[
            &set_key,
            &Fingerprint::of(extraction.as_ref())?,
            &Fingerprint::of(&self.config.severity)?,
        ]);
        let (validation, validation_status) = self.validation.get_or_compute(&validation_key, || {
            validate(set, &extraction, &self.config.severity, cancel)
        })?;
        debug!(key = validation_key.short(), status = ?validation_status, "validation stage");

        let blocked = validation.blocked_members();
        let emission_key = Fingerprint::combine(&[
            &Fingerprint::of(&extraction.commands)?,
            &Fingerprint::of(&blocked_entries(&blocked))?,
            &Fingerprint::of(&self.config.emit)?,
        ]);
        let (source, emission_status) = self.emission.get_or_compute(&emission_key, || {
            self.emit_commands(&extraction.commands, &blocked, cancel)
        })?;
        debug!(key = emission_key.short(), status = ?emission_status, "emission stage");

        let report = RunReport {
            extraction: extraction_status,
            validation: validation_status,
            emission: emission_status,
        };
        info!(
            commands = extraction.commands.len(),
            diagnostics = validation.diagnostics.len(),
            blocked = blocked.len(),
            fully_cached = report.fully_cached(),
            "pipeline run finished"
        );

        Ok(PipelineOutput {
            extraction,
            validation,
            source,
            report,
        })
    }

    fn emit_commands(
        &self,
        commands: &[CommandDescriptor],
        blocked: &BlockedMembers,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let options_key = Fingerprint::of(&self.config.emit)?;
        let mut fragments = Vec::with_capacity(commands.len());

        for command in commands {
            cancel.check()?;
            let own_blocked = blocked_for(command, blocked);
            let key = Fingerprint::combine(&[
                &Fingerprint::of(command)?,
                &Fingerprint::of(&blocked_entries(&own_blocked))?,
                &options_key,
            ]);
            let (fragment, status) = self.fragments.get_or_compute(&key, || {
                render_command(command, &own_blocked, &self.config.emit)
            })?;
            debug!(command = %command.name, status = ?status, "command fragment");
            fragments.push(fragment);
        }

        let texts: Vec<&str> = fragments.iter().map(|fragment| fragment.as_str()).collect();
        Ok(assemble(&texts, &self.config.emit))
    }

    /// Drops every cached entry. Hit and miss counters are kept.
    pub fn clear(&self) {
        self.extraction.clear();
        self.validation.clear();
        self.emission.clear();
        self.fragments.clear();
        debug!("pipeline caches cleared");
    }

    pub fn stats(&self) -> PipelineStats {
        PipelineStats {
            extraction: self.extraction.stats(),
            validation: self.validation.stats(),
            emission: self.emission.stats(),
            fragments: self.fragments.stats(),
        }
    }
}

/// Blocked members as a sequence; locations are not valid JSON map keys.
fn blocked_entries(blocked: &BlockedMembers) -> Vec<(&Location, &Vec<DiagnosticCode>)> {
    blocked.iter().collect()
}
