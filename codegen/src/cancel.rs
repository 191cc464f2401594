//! Cooperative cancellation for pipeline runs.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{PipelineError, Result};

/// Shared flag polled between members and commands.
///
/// Clones observe the same flag, so a host can keep one handle and give
/// another to the pipeline.
///
/// # Examples
///
/// ```
/// use optforge_codegen::CancellationToken;
///
/// let token = CancellationToken::new();
/// let handle = token.clone();
/// assert!(token.check().is_ok());
/// handle.cancel();
/// assert!(token.is_cancelled());
/// assert!(token.check().is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Returns [`PipelineError::Cancelled`] once cancellation was requested.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(PipelineError::Cancelled)
        } else {
            Ok(())
        }
    }
}
