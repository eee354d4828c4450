//! The `SubscriptionStore` trait: the persistence contract.
//!
//! A store holds exactly one thing: the latest snapshot of the whole
//! collection. There is no per-record API. Implemented by
//! `buildcast-store-sqlite` and by [`crate::memory::MemoryStore`].

use std::future::Future;

use crate::subscriptions::Subscriptions;

/// Abstraction over a durable subscription snapshot.
///
/// The store does no locking of its own: a load followed by a store is not
/// atomic. Callers that mutate go through
/// [`SubscriptionRepository`](crate::repository::SubscriptionRepository).
pub trait SubscriptionStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Load the whole snapshot. Returns an empty collection if nothing has
  /// ever been stored.
  fn get_subscriptions(
    &self,
  ) -> impl Future<Output = Result<Subscriptions, Self::Error>> + Send + '_;

  /// Overwrite the whole snapshot. On failure the previously stored snapshot
  /// must still be readable unchanged.
  fn store_subscriptions<'a>(
    &'a self,
    subs: &'a Subscriptions,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}
