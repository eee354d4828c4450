//! Invocation context and the collaborator traits the orchestrator consumes.

use std::{fmt, future::Future};

use crate::error::IdentityError;

/// Base URL for project links in rendered messages.
const PIPELINES_URL: &str = "https://app.circleci.com/pipelines/github";

// ─── Invocation ──────────────────────────────────────────────────────────────

/// Who invoked a command, and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandContext {
  pub channel_id: String,
  pub user_id:    String,
}

impl CommandContext {
  pub fn new(channel_id: impl Into<String>, user_id: impl Into<String>) -> Self {
    Self { channel_id: channel_id.into(), user_id: user_id.into() }
  }
}

// ─── Project ─────────────────────────────────────────────────────────────────

/// An `(owner, repository)` project as selected by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRef {
  pub owner:      String,
  pub repository: String,
}

impl ProjectRef {
  pub fn new(owner: impl Into<String>, repository: impl Into<String>) -> Self {
    Self { owner: owner.into(), repository: repository.into() }
  }

  /// Parse `owner/repository`. Both halves must be non-empty and the
  /// repository may not contain another `/`.
  pub fn parse(s: &str) -> Option<Self> {
    let (owner, repository) = s.split_once('/')?;
    if owner.is_empty() || repository.is_empty() || repository.contains('/') {
      return None;
    }
    Some(Self::new(owner, repository))
  }

  /// Markdown link to the project's pipelines page.
  pub fn to_markdown(&self) -> String {
    format!(
      "[`{}/{}`]({PIPELINES_URL}/{}/{})",
      self.owner, self.repository, self.owner, self.repository
    )
  }
}

impl fmt::Display for ProjectRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}/{}", self.owner, self.repository)
  }
}

// ─── Collaborators ───────────────────────────────────────────────────────────

/// Resolves opaque user and channel IDs to display names.
pub trait IdentityResolver: Send + Sync {
  /// Username for `user_id`, without the leading `@`.
  fn resolve_user<'a>(
    &'a self,
    user_id: &'a str,
  ) -> impl Future<Output = Result<String, IdentityError>> + Send + 'a;

  /// Channel name for `channel_id`, without the leading `~`.
  fn resolve_channel<'a>(
    &'a self,
    channel_id: &'a str,
  ) -> impl Future<Output = Result<String, IdentityError>> + Send + 'a;
}

/// Supplies the project currently selected for the invoking channel.
pub trait ProjectContextProvider: Send + Sync {
  fn current_project(&self, ctx: &CommandContext) -> Option<ProjectRef>;
}

/// Supplies the inbound webhook URL shown after subscribing.
pub trait WebhookUrlProvider: Send + Sync {
  fn webhook_url(&self) -> String;
}
