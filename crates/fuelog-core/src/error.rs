//! Error types for `fuelog-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("vehicle not found: {0}")]
  VehicleNotFound(Uuid),

  #[error("fill-up not found: {0}")]
  EventNotFound(Uuid),

  #[error("unknown fill-up kind: {0:?}")]
  UnknownFillKind(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
