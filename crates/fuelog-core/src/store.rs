//! The `FuelStore` trait for persisting vehicles, fill-ups and their caches.
//!
//! Implemented by storage backends (e.g. `fuelog-store-sqlite`). Cached
//! statistics are persisted next to the data they summarise, so a cold start
//! only rebuilds when the freshness check fails.
//!
//! Every write goes through the matching [`crate::vehicle::Vehicle`] method,
//! so backends inherit the refresh policy: appends are incremental; imports,
//! edits and deletions rebuild in full.

use std::future::Future;

use uuid::Uuid;

use crate::{
  aggregate::Aggregate,
  event::{EventPatch, FuelEvent, NewEvent},
  vehicle::Vehicle,
};

/// Abstraction over a fuelog storage backend.
///
/// All methods return `Send` futures so the trait can be used from
/// multi-threaded async runtimes.
pub trait FuelStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Vehicles ──────────────────────────────────────────────────────────

  /// Create and persist a vehicle with an empty history.
  fn add_vehicle(
    &self,
    name: String,
  ) -> impl Future<Output = Result<Vehicle, Self::Error>> + Send + '_;

  /// Load a vehicle with its events and statistics. Stale statistics are
  /// rebuilt and written back before returning. `None` if not found.
  fn get_vehicle(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Vehicle>, Self::Error>> + Send + '_;

  /// Load every vehicle, each checked for freshness as in
  /// [`FuelStore::get_vehicle`].
  fn list_vehicles(
    &self,
  ) -> impl Future<Output = Result<Vec<Vehicle>, Self::Error>> + Send + '_;

  // ── Fill-ups ──────────────────────────────────────────────────────────

  /// Append one fill-up.
  fn record_event(
    &self,
    vehicle_id: Uuid,
    input: NewEvent,
  ) -> impl Future<Output = Result<FuelEvent, Self::Error>> + Send + '_;

  /// Append many fill-ups in one go.
  fn import_events(
    &self,
    vehicle_id: Uuid,
    inputs: Vec<NewEvent>,
  ) -> impl Future<Output = Result<Vec<FuelEvent>, Self::Error>> + Send + '_;

  /// Change the user-entered fields of a fill-up.
  fn edit_event(
    &self,
    event_id: Uuid,
    patch: EventPatch,
  ) -> impl Future<Output = Result<FuelEvent, Self::Error>> + Send + '_;

  /// Remove a fill-up, returning it as it was last stored.
  fn delete_event(
    &self,
    event_id: Uuid,
  ) -> impl Future<Output = Result<FuelEvent, Self::Error>> + Send + '_;

  /// Unconditionally rebuild and persist a vehicle's statistics.
  fn recalculate(
    &self,
    vehicle_id: Uuid,
  ) -> impl Future<Output = Result<Aggregate, Self::Error>> + Send + '_;
}
