//! Error types for `buildcast-command`.

use thiserror::Error;

/// A failed user or channel lookup. Never fatal to a command; the
/// orchestrator logs it and degrades the output.
#[derive(Debug, Error)]
pub enum IdentityError {
  #[error("not found: {0}")]
  NotFound(String),
}
