//! A vehicle owns a fill-up history and its cached statistics.
//!
//! The mutation methods here are the supported way to change a history:
//! each one routes through the [`engine`] entry point that keeps the caches
//! correct for that kind of change.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  aggregate::Aggregate,
  engine::{self, Refresh},
  event::{EventPatch, FuelEvent, NewEvent},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
  pub vehicle_id: Uuid,
  pub name:       String,
  pub created_at: DateTime<Utc>,
  /// Chronological after any engine refresh.
  pub events:     Vec<FuelEvent>,
  pub aggregate:  Aggregate,
  /// Insertion sequence number for the next pushed event.
  next_seq:       u64,
}

impl Vehicle {
  /// A new vehicle with an empty history and a cleared aggregate.
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      vehicle_id: Uuid::new_v4(),
      name:       name.into(),
      created_at: Utc::now(),
      events:     Vec::new(),
      aggregate:  Aggregate::default(),
      next_seq:   0,
    }
  }

  /// Reassemble a stored vehicle. The insertion sequence resumes after the
  /// highest `seq` in `events`.
  pub fn from_parts(
    vehicle_id: Uuid,
    name: String,
    created_at: DateTime<Utc>,
    events: Vec<FuelEvent>,
    aggregate: Aggregate,
  ) -> Self {
    let next_seq = events.iter().map(|e| e.seq + 1).max().unwrap_or(0);
    Self { vehicle_id, name, created_at, events, aggregate, next_seq }
  }

  pub fn event(&self, event_id: Uuid) -> Option<&FuelEvent> {
    self.events.iter().find(|e| e.event_id == event_id)
  }

  fn position(&self, event_id: Uuid) -> Result<usize> {
    self
      .events
      .iter()
      .position(|e| e.event_id == event_id)
      .ok_or(Error::EventNotFound(event_id))
  }

  /// Append an unannotated event without touching any cache.
  ///
  /// The caller is responsible for refreshing afterwards, either with
  /// [`engine::update_for_new_event`] or [`engine::recalculate`].
  pub fn push_event(&mut self, input: NewEvent) -> Uuid {
    let event = FuelEvent {
      event_id:    Uuid::new_v4(),
      vehicle_id:  self.vehicle_id,
      seq:         self.next_seq,
      occurred_at: input.occurred_at,
      odometer:    input.odometer,
      price:       input.price,
      quantity:    input.quantity,
      cost:        input.cost,
      kind:        input.kind,
      note:        input.note,
      cache:       None,
    };
    let event_id = event.event_id;
    self.next_seq += 1;
    self.events.push(event);
    event_id
  }

  /// Record a single fill-up and refresh the caches incrementally.
  pub fn add_event(&mut self, input: NewEvent) -> Result<(FuelEvent, Refresh)> {
    let event_id = self.push_event(input);
    let refresh = engine::update_for_new_event(self, event_id);
    let event = self.event(event_id).cloned().ok_or(Error::EventNotFound(event_id))?;
    Ok((event, refresh))
  }

  /// Record many fill-ups at once, then rebuild all caches.
  pub fn import_events(
    &mut self,
    inputs: impl IntoIterator<Item = NewEvent>,
  ) -> Vec<Uuid> {
    let ids = inputs.into_iter().map(|input| self.push_event(input)).collect();
    engine::recalculate(self);
    ids
  }

  /// Apply `patch` to an event, then rebuild all caches.
  pub fn edit_event(&mut self, event_id: Uuid, patch: &EventPatch) -> Result<FuelEvent> {
    let index = self.position(event_id)?;
    patch.apply_to(&mut self.events[index]);
    engine::recalculate(self);
    self.event(event_id).cloned().ok_or(Error::EventNotFound(event_id))
  }

  /// Remove an event, then rebuild all caches.
  pub fn delete_event(&mut self, event_id: Uuid) -> Result<FuelEvent> {
    let index = self.position(event_id)?;
    let removed = self.events.remove(index);
    engine::recalculate(self);
    Ok(removed)
  }

  pub fn is_fresh(&self) -> bool { engine::is_fresh(self) }

  /// The cached statistics, rebuilt first if they are stale.
  pub fn statistics(&mut self) -> &Aggregate {
    engine::ensure_fresh(self);
    &self.aggregate
  }
}
