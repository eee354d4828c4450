//! Integration tests for `SqliteStore` against in-memory and on-disk
//! databases.

use std::sync::Arc;

use buildcast_core::{
  flag::Flag,
  repository::{Change, SubscriptionRepository},
  store::SubscriptionStore,
  subscription::Subscription,
  subscriptions::Subscriptions,
};

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn sub(channel: &str, repo: &str) -> Subscription {
  Subscription::new(channel, "acme", repo, "U1").unwrap()
}

fn sample() -> Subscriptions {
  let mut subs = Subscriptions::default();
  subs.add_subscription(sub("C2", "app")).unwrap();
  subs
    .add_subscription(
      sub("C1", "app").with_flags([Flag::OnlyFailedBuilds].into_iter().collect()),
    )
    .unwrap();
  subs.add_subscription(sub("C1", "api")).unwrap();
  subs
}

// ─── Snapshot ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn empty_store_loads_empty_collection() {
  let s = store().await;
  let subs = s.get_subscriptions().await.unwrap();
  assert!(subs.is_empty());
}

#[tokio::test]
async fn store_then_load_round_trips_in_order() {
  let s = store().await;
  let subs = sample();

  s.store_subscriptions(&subs).await.unwrap();
  let loaded = s.get_subscriptions().await.unwrap();

  assert_eq!(loaded, subs);
  let keys: Vec<_> = loaded
    .iter()
    .map(|s| (s.channel_id(), s.repository(), s.flags().to_string()))
    .collect();
  assert_eq!(
    keys,
    [
      ("C2", "app", "none".to_string()),
      ("C1", "app", "only-failed-builds".to_string()),
      ("C1", "api", "none".to_string()),
    ]
  );
}

#[tokio::test]
async fn store_overwrites_previous_snapshot() {
  let s = store().await;
  s.store_subscriptions(&sample()).await.unwrap();

  let mut smaller = Subscriptions::default();
  smaller.add_subscription(sub("C9", "web")).unwrap();
  s.store_subscriptions(&smaller).await.unwrap();

  assert_eq!(s.get_subscriptions().await.unwrap(), smaller);
}

#[tokio::test]
async fn storing_an_empty_collection_clears_everything() {
  let s = store().await;
  s.store_subscriptions(&sample()).await.unwrap();
  s.store_subscriptions(&Subscriptions::default()).await.unwrap();
  assert!(s.get_subscriptions().await.unwrap().is_empty());
}

#[tokio::test]
async fn snapshot_survives_reopen() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("buildcast.db");

  {
    let s = SqliteStore::open(&path).await.unwrap();
    s.store_subscriptions(&sample()).await.unwrap();
  }

  let reopened = SqliteStore::open(&path).await.unwrap();
  assert_eq!(reopened.get_subscriptions().await.unwrap(), sample());
}

#[tokio::test]
async fn corrupt_snapshot_is_an_error() {
  let s = store().await;
  s.set_value("subscriptions", b"{oops".to_vec()).await.unwrap();
  assert!(matches!(
    s.get_subscriptions().await,
    Err(crate::Error::Core(_))
  ));
}

#[tokio::test]
async fn legacy_duplicates_are_dropped_on_load() {
  let s = store().await;
  let raw = br#"[
    {"owner":"acme","repository":"app","channel_id":"C1","creator_id":"U1","flags":{}},
    {"owner":"acme","repository":"app","channel_id":"C1","creator_id":"U2","flags":{"only-failed-builds":true}}
  ]"#;
  s.set_value("subscriptions", raw.to_vec()).await.unwrap();

  let loaded = s.get_subscriptions().await.unwrap();
  assert_eq!(loaded.len(), 1);
  assert_eq!(loaded.as_slice()[0].creator_id(), "U1");
}

#[tokio::test]
async fn rejected_write_keeps_previous_snapshot() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("buildcast.db");
  let s = SqliteStore::open(&path).await.unwrap();
  s.store_subscriptions(&sample()).await.unwrap();

  // Make every further write to the snapshot row fail.
  let other = rusqlite::Connection::open(&path).unwrap();
  other
    .execute_batch(
      "CREATE TRIGGER kv_frozen BEFORE UPDATE ON kv
       BEGIN SELECT RAISE(ABORT, 'kv is frozen'); END;",
    )
    .unwrap();
  drop(other);

  let mut changed = sample();
  changed.add_subscription(sub("C7", "web")).unwrap();
  assert!(matches!(
    s.store_subscriptions(&changed).await,
    Err(crate::Error::Database(_))
  ));

  assert_eq!(s.get_subscriptions().await.unwrap(), sample());
}

// ─── Repository over SQLite ──────────────────────────────────────────────────

#[tokio::test]
async fn concurrent_repository_updates_are_all_persisted() {
  let repo = Arc::new(SubscriptionRepository::new(store().await));

  let tasks: Vec<_> = (0..16)
    .map(|i| {
      let repo = Arc::clone(&repo);
      tokio::spawn(async move {
        repo
          .update(move |subs| {
            subs.add_subscription(sub(&format!("C{i}"), "app")).unwrap();
            Change::Commit(())
          })
          .await
          .unwrap();
      })
    })
    .collect();
  for task in tasks {
    task.await.unwrap();
  }

  let loaded = repo.store().get_subscriptions().await.unwrap();
  assert_eq!(loaded.len(), 16);
}
