//! Config-backed collaborators: a static user/channel directory, the
//! per-channel project selection, and the webhook URL.

use std::collections::HashMap;

use buildcast_command::{
  CommandContext, IdentityError, IdentityResolver, ProjectContextProvider,
  ProjectRef, WebhookUrlProvider,
};

use crate::{ChannelEntry, UserEntry};

// ─── Identity ────────────────────────────────────────────────────────────────

/// User and channel names known from configuration.
#[derive(Debug, Default)]
pub struct Directory {
  users:    HashMap<String, String>,
  channels: HashMap<String, String>,
}

impl Directory {
  pub fn new(users: &[UserEntry], channels: &[ChannelEntry]) -> Self {
    Self {
      users:    users.iter().map(|u| (u.id.clone(), u.name.clone())).collect(),
      channels: channels
        .iter()
        .map(|c| (c.id.clone(), c.name.clone()))
        .collect(),
    }
  }
}

impl IdentityResolver for Directory {
  async fn resolve_user(&self, user_id: &str) -> Result<String, IdentityError> {
    self
      .users
      .get(user_id)
      .cloned()
      .ok_or_else(|| IdentityError::NotFound(format!("user {user_id}")))
  }

  async fn resolve_channel(&self, channel_id: &str) -> Result<String, IdentityError> {
    self
      .channels
      .get(channel_id)
      .cloned()
      .ok_or_else(|| IdentityError::NotFound(format!("channel {channel_id}")))
  }
}

// ─── Project selection ───────────────────────────────────────────────────────

/// The project selected for each configured channel.
#[derive(Debug, Default)]
pub struct ChannelProjects {
  projects: HashMap<String, ProjectRef>,
}

impl ChannelProjects {
  /// Entries whose `project` is not `owner/repository` are skipped with a
  /// warning.
  pub fn new(channels: &[ChannelEntry]) -> Self {
    let mut projects = HashMap::new();
    for channel in channels {
      let Some(raw) = channel.project.as_deref() else {
        continue;
      };
      match ProjectRef::parse(raw) {
        Some(project) => {
          projects.insert(channel.id.clone(), project);
        }
        None => {
          tracing::warn!(channel_id = %channel.id, project = raw, "ignoring malformed project");
        }
      }
    }
    Self { projects }
  }
}

impl ProjectContextProvider for ChannelProjects {
  fn current_project(&self, ctx: &CommandContext) -> Option<ProjectRef> {
    self.projects.get(&ctx.channel_id).cloned()
  }
}

// ─── Webhook ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct WebhookUrl(pub String);

impl WebhookUrl {
  /// Join `base_url` and `path` with exactly one `/` between them.
  pub fn new(base_url: &str, path: &str) -> Self {
    Self(format!(
      "{}/{}",
      base_url.trim_end_matches('/'),
      path.trim_start_matches('/')
    ))
  }
}

impl WebhookUrlProvider for WebhookUrl {
  fn webhook_url(&self) -> String { self.0.clone() }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn channel(id: &str, project: Option<&str>) -> ChannelEntry {
    ChannelEntry {
      id:      id.into(),
      name:    format!("name-{id}"),
      project: project.map(Into::into),
    }
  }

  #[test]
  fn webhook_url_joins_cleanly() {
    assert_eq!(
      WebhookUrl::new("https://x.example/", "/hooks/circleci").0,
      "https://x.example/hooks/circleci"
    );
  }

  #[test]
  fn malformed_projects_are_skipped() {
    let projects = ChannelProjects::new(&[
      channel("C1", Some("acme/app")),
      channel("C2", Some("nope")),
      channel("C3", None),
    ]);
    let ctx = |id: &str| CommandContext::new(id, "U1");
    assert_eq!(projects.current_project(&ctx("C1")), Some(ProjectRef::new("acme", "app")));
    assert_eq!(projects.current_project(&ctx("C2")), None);
    assert_eq!(projects.current_project(&ctx("C3")), None);
  }

  #[tokio::test]
  async fn directory_resolves_known_ids_only() {
    let dir = Directory::new(
      &[UserEntry { id: "U1".into(), name: "alice".into() }],
      &[channel("C1", None)],
    );
    assert_eq!(dir.resolve_user("U1").await.unwrap(), "alice");
    assert!(dir.resolve_user("U2").await.is_err());
    assert_eq!(dir.resolve_channel("C1").await.unwrap(), "name-C1");
    assert!(dir.resolve_channel("C2").await.is_err());
  }
}
