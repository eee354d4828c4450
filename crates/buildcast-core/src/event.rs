//! Build events as seen by the routing path.
//!
//! Ingestion (webhook transport, payload parsing) lives outside this crate;
//! it hands over a [`BuildEvent`] and asks the collection which channels
//! should receive it.

use serde::{Deserialize, Serialize};

/// Outcome of the build an event reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildStatus {
  Success,
  Failed,
  /// Anything else the CI reports (cancelled, on hold, ...).
  Other,
}

impl BuildStatus {
  pub fn is_failure(self) -> bool { matches!(self, Self::Failed) }
}

/// An inbound build notification for one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildEvent {
  pub owner:      String,
  pub repository: String,
  pub status:     BuildStatus,
}

impl BuildEvent {
  pub fn new(
    owner: impl Into<String>,
    repository: impl Into<String>,
    status: BuildStatus,
  ) -> Self {
    Self { owner: owner.into(), repository: repository.into(), status }
  }
}
