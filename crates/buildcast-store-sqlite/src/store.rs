//! [`SqliteStore`]: the SQLite implementation of [`SubscriptionStore`].

use std::path::Path;

use buildcast_core::{
  snapshot::{SNAPSHOT_KEY, decode_snapshot, encode_snapshot},
  store::SubscriptionStore,
  subscriptions::Subscriptions,
};
use chrono::Utc;
use rusqlite::OptionalExtension as _;

use crate::{Result, schema::SCHEMA};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A subscription store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Read the raw value stored under `key`, if any.
  pub(crate) async fn get_value(&self, key: &'static str) -> Result<Option<Vec<u8>>> {
    let value = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT value FROM kv WHERE key = ?1",
              rusqlite::params![key],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;
    Ok(value)
  }

  /// Replace the value stored under `key`. A single UPSERT statement, so a
  /// failure leaves the previous value in place.
  pub(crate) async fn set_value(&self, key: &'static str, value: Vec<u8>) -> Result<()> {
    let at_str = Utc::now().to_rfc3339();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
           ON CONFLICT(key) DO UPDATE SET
             value      = excluded.value,
             updated_at = excluded.updated_at",
          rusqlite::params![key, value, at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── SubscriptionStore impl ──────────────────────────────────────────────────

impl SubscriptionStore for SqliteStore {
  type Error = crate::Error;

  async fn get_subscriptions(&self) -> Result<Subscriptions> {
    match self.get_value(SNAPSHOT_KEY).await? {
      Some(bytes) => Ok(decode_snapshot(&bytes)?),
      None => Ok(Subscriptions::default()),
    }
  }

  async fn store_subscriptions(&self, subs: &Subscriptions) -> Result<()> {
    // Encode before touching the database so a bad snapshot never reaches it.
    let bytes = encode_snapshot(subs)?;
    tracing::debug!(count = subs.len(), bytes = bytes.len(), "storing subscriptions");
    self.set_value(SNAPSHOT_KEY, bytes).await
  }
}
