//! Snapshot codec shared by every store backend.
//!
//! A snapshot is the whole collection serialised as one JSON array of
//! subscription records, in insertion order. There is no version field.

use crate::{Result, subscription::Subscription, subscriptions::Subscriptions};

/// Well-known key the snapshot is stored under in key-value backends.
pub const SNAPSHOT_KEY: &str = "subscriptions";

pub fn encode_snapshot(subs: &Subscriptions) -> Result<Vec<u8>> {
  Ok(serde_json::to_vec(subs.as_slice())?)
}

/// Decode a snapshot. Records repeating an earlier key are dropped with a
/// warning; the first one wins.
pub fn decode_snapshot(bytes: &[u8]) -> Result<Subscriptions> {
  let records: Vec<Subscription> = serde_json::from_slice(bytes)?;
  let (subs, dropped) = Subscriptions::from_records(records);
  if dropped > 0 {
    tracing::warn!(dropped, "dropped duplicate subscriptions from snapshot");
  }
  Ok(subs)
}
