//! Subscription: one channel bound to one `(owner, repository)` project.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  event::BuildEvent,
  flag::{Flag, FlagSet},
};

// ─── Key ─────────────────────────────────────────────────────────────────────

/// Identity of a subscription. At most one subscription exists per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionKey {
  pub channel_id: String,
  pub owner:      String,
  pub repository: String,
}

impl SubscriptionKey {
  pub fn new(
    channel_id: impl Into<String>,
    owner: impl Into<String>,
    repository: impl Into<String>,
  ) -> Self {
    Self {
      channel_id: channel_id.into(),
      owner:      owner.into(),
      repository: repository.into(),
    }
  }
}

impl fmt::Display for SubscriptionKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}/{} in channel {}", self.owner, self.repository, self.channel_id)
  }
}

// ─── Subscription ────────────────────────────────────────────────────────────

/// A binding of one channel to one project, with its delivery flags.
///
/// Immutable once built: the only way to change a subscription is to remove
/// it and add a new one. `channel_id`, `owner` and `repository` are never
/// empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SubscriptionRecord", into = "SubscriptionRecord")]
pub struct Subscription {
  channel_id: String,
  /// Who created the subscription; informational only.
  creator_id: String,
  owner:      String,
  repository: String,
  flags:      FlagSet,
}

impl Subscription {
  /// Build a subscription with no flags.
  pub fn new(
    channel_id: impl Into<String>,
    owner: impl Into<String>,
    repository: impl Into<String>,
    creator_id: impl Into<String>,
  ) -> Result<Self> {
    let sub = Self {
      channel_id: channel_id.into(),
      creator_id: creator_id.into(),
      owner:      owner.into(),
      repository: repository.into(),
      flags:      FlagSet::default(),
    };
    sub.validate()?;
    Ok(sub)
  }

  pub fn with_flags(mut self, flags: FlagSet) -> Self {
    self.flags = flags;
    self
  }

  fn validate(&self) -> Result<()> {
    if self.channel_id.is_empty() {
      return Err(Error::EmptyField("channel_id"));
    }
    if self.owner.is_empty() {
      return Err(Error::EmptyField("owner"));
    }
    if self.repository.is_empty() {
      return Err(Error::EmptyField("repository"));
    }
    Ok(())
  }

  pub fn channel_id(&self) -> &str { &self.channel_id }

  pub fn creator_id(&self) -> &str { &self.creator_id }

  pub fn owner(&self) -> &str { &self.owner }

  pub fn repository(&self) -> &str { &self.repository }

  pub fn flags(&self) -> &FlagSet { &self.flags }

  pub fn key(&self) -> SubscriptionKey {
    SubscriptionKey::new(&self.channel_id, &self.owner, &self.repository)
  }

  /// `owner/repository`, as shown to users.
  pub fn project(&self) -> String {
    format!("{}/{}", self.owner, self.repository)
  }

  /// Exact, case-sensitive match on the project.
  pub fn is_for_project(&self, owner: &str, repository: &str) -> bool {
    self.owner == owner && self.repository == repository
  }

  /// Exact, case-sensitive match on the full key.
  pub fn matches(&self, channel_id: &str, owner: &str, repository: &str) -> bool {
    self.channel_id == channel_id && self.is_for_project(owner, repository)
  }

  /// Whether this subscription's flags let `event` through. Does not check
  /// that the event is for this subscription's project.
  pub fn accepts(&self, event: &BuildEvent) -> bool {
    !(self.flags.contains(Flag::OnlyFailedBuilds) && !event.status.is_failure())
  }
}

// ─── Persisted form ──────────────────────────────────────────────────────────

/// The on-disk shape of a [`Subscription`]. The aliases accept snapshots
/// written with capitalised field names.
#[derive(Serialize, Deserialize)]
struct SubscriptionRecord {
  #[serde(alias = "Owner")]
  owner:      String,
  #[serde(alias = "Repository")]
  repository: String,
  #[serde(alias = "ChannelID")]
  channel_id: String,
  #[serde(alias = "CreatorID", default)]
  creator_id: String,
  #[serde(alias = "Flags", default)]
  flags:      Option<FlagSet>,
}

impl TryFrom<SubscriptionRecord> for Subscription {
  type Error = Error;

  fn try_from(raw: SubscriptionRecord) -> Result<Self> {
    Ok(
      Self::new(raw.channel_id, raw.owner, raw.repository, raw.creator_id)?
        .with_flags(raw.flags.unwrap_or_default()),
    )
  }
}

impl From<Subscription> for SubscriptionRecord {
  fn from(sub: Subscription) -> Self {
    Self {
      owner:      sub.owner,
      repository: sub.repository,
      channel_id: sub.channel_id,
      creator_id: sub.creator_id,
      flags:      Some(sub.flags),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::event::BuildStatus;

  fn sub() -> Subscription {
    Subscription::new("C1", "acme", "app", "U1").unwrap()
  }

  #[test]
  fn empty_identity_fields_are_rejected() {
    assert!(matches!(
      Subscription::new("", "acme", "app", "U1"),
      Err(Error::EmptyField("channel_id"))
    ));
    assert!(matches!(
      Subscription::new("C1", "", "app", "U1"),
      Err(Error::EmptyField("owner"))
    ));
    assert!(matches!(
      Subscription::new("C1", "acme", "", "U1"),
      Err(Error::EmptyField("repository"))
    ));
    // The creator is informational and may be unknown.
    assert!(Subscription::new("C1", "acme", "app", "").is_ok());
  }

  #[test]
  fn matching_is_exact_and_case_sensitive() {
    let s = sub();
    assert!(s.matches("C1", "acme", "app"));
    assert!(!s.matches("C1", "Acme", "app"));
    assert!(!s.matches("c1", "acme", "app"));
    assert!(!s.is_for_project("acme", "App"));
    assert_eq!(s.key(), SubscriptionKey::new("C1", "acme", "app"));
    assert_eq!(s.project(), "acme/app");
  }

  #[test]
  fn only_failed_builds_filters_non_failures() {
    let plain = sub();
    let failed_only =
      sub().with_flags([Flag::OnlyFailedBuilds].into_iter().collect());

    let ok = BuildEvent::new("acme", "app", BuildStatus::Success);
    let failed = BuildEvent::new("acme", "app", BuildStatus::Failed);
    let other = BuildEvent::new("acme", "app", BuildStatus::Other);

    assert!(plain.accepts(&ok));
    assert!(plain.accepts(&failed));
    assert!(!failed_only.accepts(&ok));
    assert!(!failed_only.accepts(&other));
    assert!(failed_only.accepts(&failed));
  }

  #[test]
  fn persisted_form_round_trips() {
    let s = sub().with_flags([Flag::OnlyFailedBuilds].into_iter().collect());
    let json = serde_json::to_value(&s).unwrap();
    assert_eq!(
      json,
      serde_json::json!({
        "owner": "acme",
        "repository": "app",
        "channel_id": "C1",
        "creator_id": "U1",
        "flags": { "only-failed-builds": true },
      })
    );
    let back: Subscription = serde_json::from_value(json).unwrap();
    assert_eq!(back, s);
  }

  #[test]
  fn capitalised_records_are_accepted() {
    let raw = r#"{
      "ChannelID": "C1",
      "CreatorID": "U1",
      "Owner": "acme",
      "Repository": "app",
      "Flags": {"only-failed-builds": true}
    }"#;
    let s: Subscription = serde_json::from_str(raw).unwrap();
    assert_eq!(s.key(), SubscriptionKey::new("C1", "acme", "app"));
    assert!(s.flags().contains(Flag::OnlyFailedBuilds));
  }

  #[test]
  fn records_with_empty_identity_fail_to_load() {
    let raw = r#"{"owner":"","repository":"app","channel_id":"C1"}"#;
    assert!(serde_json::from_str::<Subscription>(raw).is_err());
  }

  #[test]
  fn missing_flags_load_as_empty() {
    let raw = r#"{"owner":"acme","repository":"app","channel_id":"C1","flags":null}"#;
    let s: Subscription = serde_json::from_str(raw).unwrap();
    assert!(s.flags().is_empty());
  }
}
