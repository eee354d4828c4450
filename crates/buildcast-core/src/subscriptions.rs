//! [`Subscriptions`]: every subscription of the installation, as one
//! in-memory aggregate.
//!
//! The collection is loaded as a whole, queried or mutated in memory, and
//! written back as a whole (see [`crate::repository`]). Entries keep their
//! insertion order, which is also the order of every query result.
//!
//! All operations are linear scans. Subscription counts are small compared
//! to event traffic, so no secondary index is kept.

use crate::{Error, Result, event::BuildEvent, subscription::Subscription};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subscriptions {
  entries: Vec<Subscription>,
}

impl Subscriptions {
  /// Rebuild a collection from persisted records, keeping the first record
  /// for each key. Returns the collection and the number of records dropped.
  pub fn from_records(records: Vec<Subscription>) -> (Self, usize) {
    let total = records.len();
    let mut subs = Self::default();
    for record in records {
      if subs
        .get(record.channel_id(), record.owner(), record.repository())
        .is_none()
      {
        subs.entries.push(record);
      }
    }
    let dropped = total - subs.len();
    (subs, dropped)
  }

  pub fn len(&self) -> usize { self.entries.len() }

  pub fn is_empty(&self) -> bool { self.entries.is_empty() }

  pub fn iter(&self) -> std::slice::Iter<'_, Subscription> { self.entries.iter() }

  pub fn as_slice(&self) -> &[Subscription] { &self.entries }

  // ── Mutations ─────────────────────────────────────────────────────────

  /// Append `sub`. Fails with [`Error::AlreadySubscribed`] if a subscription
  /// with the same key exists; the collection is unchanged in that case.
  pub fn add_subscription(&mut self, sub: Subscription) -> Result<()> {
    if self.get(sub.channel_id(), sub.owner(), sub.repository()).is_some() {
      return Err(Error::AlreadySubscribed(sub.key()));
    }
    self.entries.push(sub);
    Ok(())
  }

  /// Remove the subscription with the given key. Returns whether one was
  /// removed; the relative order of the remaining entries is preserved.
  pub fn remove_subscription(
    &mut self,
    channel_id: &str,
    owner: &str,
    repository: &str,
  ) -> bool {
    match self
      .entries
      .iter()
      .position(|s| s.matches(channel_id, owner, repository))
    {
      Some(index) => {
        self.entries.remove(index);
        true
      }
      None => false,
    }
  }

  // ── Queries ───────────────────────────────────────────────────────────

  pub fn get(
    &self,
    channel_id: &str,
    owner: &str,
    repository: &str,
  ) -> Option<&Subscription> {
    self
      .entries
      .iter()
      .find(|s| s.matches(channel_id, owner, repository))
  }

  /// All subscriptions of one channel, in insertion order.
  pub fn get_subscriptions_by_channel(
    &self,
    channel_id: &str,
  ) -> Vec<&Subscription> {
    self
      .entries
      .iter()
      .filter(|s| s.channel_id() == channel_id)
      .collect()
  }

  /// All subscriptions to one project, in insertion order.
  pub fn get_subscriptions_for_repository(
    &self,
    owner: &str,
    repository: &str,
  ) -> Vec<&Subscription> {
    self
      .entries
      .iter()
      .filter(|s| s.is_for_project(owner, repository))
      .collect()
  }

  /// Channel IDs subscribed to one project, in insertion order. This is the
  /// fan-out list for an incoming event before flag filtering.
  pub fn get_subscribed_channels_for_repository(
    &self,
    owner: &str,
    repository: &str,
  ) -> Vec<&str> {
    self
      .get_subscriptions_for_repository(owner, repository)
      .into_iter()
      .map(Subscription::channel_id)
      .collect()
  }

  /// Channel IDs that should receive `event`, with each subscription's flags
  /// applied.
  pub fn channels_for_event(&self, event: &BuildEvent) -> Vec<&str> {
    self
      .get_subscriptions_for_repository(&event.owner, &event.repository)
      .into_iter()
      .filter(|s| s.accepts(event))
      .map(Subscription::channel_id)
      .collect()
  }
}

impl<'a> IntoIterator for &'a Subscriptions {
  type Item = &'a Subscription;
  type IntoIter = std::slice::Iter<'a, Subscription>;

  fn into_iter(self) -> Self::IntoIter { self.entries.iter() }
}
