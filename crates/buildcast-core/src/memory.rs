//! [`MemoryStore`]: a process-local [`SubscriptionStore`].
//!
//! Keeps the encoded snapshot bytes rather than the live collection, so every
//! load hands out an independent copy just like a durable backend would.
//! Every load also yields to the scheduler once, so concurrent
//! load-mutate-store cycles interleave the way they do against a database.
//! Used by tests across the workspace.

use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tokio::sync::RwLock;

use crate::{
  snapshot::{decode_snapshot, encode_snapshot},
  store::SubscriptionStore,
  subscriptions::Subscriptions,
};

#[derive(Debug, Error)]
pub enum MemoryStoreError {
  #[error("injected load failure")]
  LoadFailed,

  #[error("injected store failure")]
  StoreFailed,

  #[error("snapshot error: {0}")]
  Snapshot(#[from] crate::Error),
}

#[derive(Debug, Default)]
pub struct MemoryStore {
  snapshot:        RwLock<Option<Vec<u8>>>,
  fail_next_load:  AtomicBool,
  fail_next_store: AtomicBool,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  /// Make the next `get_subscriptions` call fail.
  pub fn fail_next_load(&self) {
    self.fail_next_load.store(true, Ordering::SeqCst);
  }

  /// Make the next `store_subscriptions` call fail without touching the
  /// stored snapshot.
  pub fn fail_next_store(&self) {
    self.fail_next_store.store(true, Ordering::SeqCst);
  }

  /// Whether a snapshot has ever been written.
  pub async fn has_snapshot(&self) -> bool { self.snapshot.read().await.is_some() }
}

impl SubscriptionStore for MemoryStore {
  type Error = MemoryStoreError;

  async fn get_subscriptions(&self) -> Result<Subscriptions, MemoryStoreError> {
    if self.fail_next_load.swap(false, Ordering::SeqCst) {
      return Err(MemoryStoreError::LoadFailed);
    }
    let subs = match self.snapshot.read().await.as_deref() {
      Some(bytes) => decode_snapshot(bytes)?,
      None => Subscriptions::default(),
    };
    // Suspend between load and the caller's store, as a real backend would.
    tokio::task::yield_now().await;
    Ok(subs)
  }

  async fn store_subscriptions(
    &self,
    subs: &Subscriptions,
  ) -> Result<(), MemoryStoreError> {
    if self.fail_next_store.swap(false, Ordering::SeqCst) {
      return Err(MemoryStoreError::StoreFailed);
    }
    let bytes = encode_snapshot(subs)?;
    *self.snapshot.write().await = Some(bytes);
    Ok(())
  }
}
