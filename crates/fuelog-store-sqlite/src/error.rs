//! Error type for `fuelog-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] fuelog_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("vehicle not found: {0}")]
  VehicleNotFound(uuid::Uuid),

  #[error("fill-up not found: {0}")]
  EventNotFound(uuid::Uuid),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
