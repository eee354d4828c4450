//! [`SubscriptionRepository`]: the transaction boundary around a
//! [`SubscriptionStore`].
//!
//! Every mutation is a load-mutate-store cycle over the whole snapshot. Two
//! such cycles running at once would each write back a snapshot missing the
//! other's change. The repository serialises all cycles behind one async
//! mutex, so within a process no update is lost. Writers in other processes
//! are not coordinated; one process owns the store.

use thiserror::Error;
use tokio::sync::Mutex;

use crate::{event::BuildEvent, store::SubscriptionStore, subscriptions::Subscriptions};

/// What an [`update`](SubscriptionRepository::update) closure decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change<T> {
  /// The collection was changed; persist it, then return the value.
  Commit(T),
  /// Nothing to persist; return the value without writing.
  Abort(T),
}

/// Which half of a transaction failed.
#[derive(Debug, Error)]
pub enum TransactionError<E: std::error::Error + 'static> {
  #[error("unable to load subscriptions: {0}")]
  Load(#[source] E),

  #[error("unable to store subscriptions: {0}")]
  Store(#[source] E),
}

pub struct SubscriptionRepository<S> {
  store: S,
  lock:  Mutex<()>,
}

impl<S: SubscriptionStore> SubscriptionRepository<S> {
  pub fn new(store: S) -> Self { Self { store, lock: Mutex::new(()) } }

  /// The wrapped store. Writing through it directly bypasses the lock.
  pub fn store(&self) -> &S { &self.store }

  /// Load the current snapshot and run a query over it.
  pub async fn read<T, F>(&self, query: F) -> Result<T, TransactionError<S::Error>>
  where
    F: FnOnce(&Subscriptions) -> T + Send,
  {
    let subs = self
      .store
      .get_subscriptions()
      .await
      .map_err(TransactionError::Load)?;
    Ok(query(&subs))
  }

  /// Run one load-mutate-store transaction.
  ///
  /// The closure sees the freshly loaded collection. If it returns
  /// [`Change::Commit`] the collection is written back before the value is
  /// returned; on [`Change::Abort`] nothing is written. If the write fails,
  /// the in-memory changes are discarded and the stored snapshot is the one
  /// from before the transaction.
  pub async fn update<T, F>(&self, mutate: F) -> Result<T, TransactionError<S::Error>>
  where
    F: FnOnce(&mut Subscriptions) -> Change<T> + Send,
    T: Send,
  {
    let _guard = self.lock.lock().await;

    let mut subs = self
      .store
      .get_subscriptions()
      .await
      .map_err(TransactionError::Load)?;

    match mutate(&mut subs) {
      Change::Commit(value) => {
        self
          .store
          .store_subscriptions(&subs)
          .await
          .map_err(TransactionError::Store)?;
        Ok(value)
      }
      Change::Abort(value) => Ok(value),
    }
  }

  /// Channel IDs subscribed to `owner/repository`, in subscription order.
  pub async fn route_event(
    &self,
    owner: &str,
    repository: &str,
  ) -> Result<Vec<String>, TransactionError<S::Error>> {
    self
      .read(|subs| {
        subs
          .get_subscribed_channels_for_repository(owner, repository)
          .into_iter()
          .map(str::to_owned)
          .collect()
      })
      .await
  }

  /// Channel IDs that should be notified of `event`, flags applied.
  pub async fn route_build_event(
    &self,
    event: &BuildEvent,
  ) -> Result<Vec<String>, TransactionError<S::Error>> {
    self
      .read(|subs| {
        subs
          .channels_for_event(event)
          .into_iter()
          .map(str::to_owned)
          .collect()
      })
      .await
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use super::*;
  use crate::{
    Error,
    event::BuildStatus,
    flag::Flag,
    memory::{MemoryStore, MemoryStoreError},
    subscription::Subscription,
  };

  fn sub(channel: &str, repo: &str) -> Subscription {
    Subscription::new(channel, "acme", repo, "U1").unwrap()
  }

  fn repo() -> SubscriptionRepository<MemoryStore> {
    SubscriptionRepository::new(MemoryStore::new())
  }

  #[tokio::test]
  async fn commit_persists_and_abort_does_not() {
    let r = repo();

    let added = r
      .update(|subs| match subs.add_subscription(sub("C1", "app")) {
        Ok(()) => Change::Commit(true),
        Err(_) => Change::Abort(false),
      })
      .await
      .unwrap();
    assert!(added);
    assert!(r.store().has_snapshot().await);

    let duplicate = r
      .update(|subs| match subs.add_subscription(sub("C1", "app")) {
        Ok(()) => Change::Commit(None),
        Err(e) => Change::Abort(Some(e)),
      })
      .await
      .unwrap();
    assert!(matches!(duplicate, Some(Error::AlreadySubscribed(_))));

    let count = r.read(Subscriptions::len).await.unwrap();
    assert_eq!(count, 1);
  }

  #[tokio::test]
  async fn load_and_store_failures_are_distinguished() {
    let r = repo();

    r.store().fail_next_load();
    let err = r.update(|_| Change::Commit(())).await.unwrap_err();
    assert!(matches!(err, TransactionError::Load(MemoryStoreError::LoadFailed)));

    r.store().fail_next_store();
    let err = r
      .update(|subs| {
        subs.add_subscription(sub("C1", "app")).unwrap();
        Change::Commit(())
      })
      .await
      .unwrap_err();
    assert!(matches!(err, TransactionError::Store(MemoryStoreError::StoreFailed)));

    // The failed write left nothing behind.
    assert!(r.read(Subscriptions::is_empty).await.unwrap());
  }

  #[tokio::test]
  async fn concurrent_updates_lose_nothing() {
    let r = Arc::new(repo());

    let mut tasks = Vec::new();
    for i in 0..32 {
      let r = Arc::clone(&r);
      tasks.push(tokio::spawn(async move {
        r.update(move |subs| {
          subs
            .add_subscription(sub(&format!("C{i}"), "app"))
            .unwrap();
          Change::Commit(())
        })
        .await
        .unwrap();
      }));
    }
    for task in tasks {
      task.await.unwrap();
    }

    let channels = r.route_event("acme", "app").await.unwrap();
    assert_eq!(channels.len(), 32);
    for i in 0..32 {
      assert!(channels.contains(&format!("C{i}")));
    }
  }

  #[tokio::test]
  async fn routing_reads_through_the_store() {
    let r = repo();
    r.update(|subs| {
      subs.add_subscription(sub("C1", "app")).unwrap();
      subs
        .add_subscription(
          sub("C2", "app").with_flags([Flag::OnlyFailedBuilds].into_iter().collect()),
        )
        .unwrap();
      subs.add_subscription(sub("C3", "other")).unwrap();
      Change::Commit(())
    })
    .await
    .unwrap();

    assert_eq!(r.route_event("acme", "app").await.unwrap(), ["C1", "C2"]);

    let ok = BuildEvent::new("acme", "app", BuildStatus::Success);
    assert_eq!(r.route_build_event(&ok).await.unwrap(), ["C1"]);
    let failed = BuildEvent::new("acme", "app", BuildStatus::Failed);
    assert_eq!(r.route_build_event(&failed).await.unwrap(), ["C1", "C2"]);
  }
}
