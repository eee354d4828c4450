//! Error type for `buildcast-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Encoding or decoding the snapshot failed.
  #[error("snapshot error: {0}")]
  Core(#[from] buildcast_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
