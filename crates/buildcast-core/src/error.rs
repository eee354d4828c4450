//! Error types for `buildcast-core`.

use thiserror::Error;

use crate::subscription::SubscriptionKey;

#[derive(Debug, Error)]
pub enum Error {
  /// A flag name outside the known vocabulary. Carries the name as given.
  #[error("unknown subscription flag: {0:?}")]
  UnknownFlag(String),

  #[error("already subscribed: {0}")]
  AlreadySubscribed(SubscriptionKey),

  #[error("subscription field `{0}` must not be empty")]
  EmptyField(&'static str),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
