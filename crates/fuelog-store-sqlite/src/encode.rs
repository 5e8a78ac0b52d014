//! Encoding and decoding helpers between domain types and the plain values
//! stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, UUIDs hyphenated lowercase strings, fill
//! kinds their lowercase discriminant. Numeric fields map directly to REAL.

use chrono::{DateTime, Utc};
use fuelog_core::{
  aggregate::Aggregate,
  event::{EventCache, FillKind, FuelEvent},
  vehicle::Vehicle,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column values of an `events` row.
#[derive(Debug, Clone)]
pub struct RawEvent {
  pub event_id:                String,
  pub vehicle_id:              String,
  pub seq:                     i64,
  pub occurred_at:             String,
  pub odometer:                f64,
  pub price:                   f64,
  pub quantity:                f64,
  pub cost:                    f64,
  pub fill_kind:               String,
  pub note:                    Option<String>,
  pub cache_computed:          bool,
  pub cache_previous_odometer: Option<f64>,
  pub cache_distance:          Option<f64>,
  pub cache_efficiency:        Option<f64>,
  pub cache_cost_per_distance: Option<f64>,
}

/// Column list matching [`RawEvent::from_row`].
pub const EVENT_COLUMNS: &str = "event_id, vehicle_id, seq, occurred_at, odometer, price, \
   quantity, cost, fill_kind, note, cache_computed, cache_previous_odometer, \
   cache_distance, cache_efficiency, cache_cost_per_distance";

impl RawEvent {
  pub fn from_event(event: &FuelEvent) -> Self {
    let cache = event.cache;
    Self {
      event_id:                encode_uuid(event.event_id),
      vehicle_id:              encode_uuid(event.vehicle_id),
      seq:                     event.seq as i64,
      occurred_at:             encode_dt(event.occurred_at),
      odometer:                event.odometer,
      price:                   event.price,
      quantity:                event.quantity,
      cost:                    event.cost,
      fill_kind:               event.kind.as_ref().to_owned(),
      note:                    event.note.clone(),
      cache_computed:          cache.is_some(),
      cache_previous_odometer: cache.and_then(|c| c.previous_odometer),
      cache_distance:          cache.map(|c| c.distance),
      cache_efficiency:        cache.and_then(|c| c.efficiency),
      cache_cost_per_distance: cache.and_then(|c| c.cost_per_distance),
    }
  }

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      event_id:                row.get(0)?,
      vehicle_id:              row.get(1)?,
      seq:                     row.get(2)?,
      occurred_at:             row.get(3)?,
      odometer:                row.get(4)?,
      price:                   row.get(5)?,
      quantity:                row.get(6)?,
      cost:                    row.get(7)?,
      fill_kind:               row.get(8)?,
      note:                    row.get(9)?,
      cache_computed:          row.get(10)?,
      cache_previous_odometer: row.get(11)?,
      cache_distance:          row.get(12)?,
      cache_efficiency:        row.get(13)?,
      cache_cost_per_distance: row.get(14)?,
    })
  }

  pub fn into_event(self) -> Result<FuelEvent> {
    let cache = self.cache_computed.then(|| EventCache {
      previous_odometer: self.cache_previous_odometer,
      distance:          self.cache_distance.unwrap_or(0.0),
      efficiency:        self.cache_efficiency,
      cost_per_distance: self.cache_cost_per_distance,
    });

    Ok(FuelEvent {
      event_id: decode_uuid(&self.event_id)?,
      vehicle_id: decode_uuid(&self.vehicle_id)?,
      seq: self.seq.max(0) as u64,
      occurred_at: decode_dt(&self.occurred_at)?,
      odometer: self.odometer,
      price: self.price,
      quantity: self.quantity,
      cost: self.cost,
      kind: FillKind::parse(&self.fill_kind)?,
      note: self.note,
      cache,
    })
  }
}

/// Column values of an `aggregates` row.
#[derive(Debug, Clone)]
pub struct RawAggregate {
  pub total_cost:                Option<f64>,
  pub total_distance:            Option<f64>,
  pub total_quantity:            Option<f64>,
  pub record_count:              i64,
  pub average_efficiency:        Option<f64>,
  pub average_cost_per_distance: Option<f64>,
  pub average_cost_per_event:    Option<f64>,
  pub average_price:             Option<f64>,
  pub best_efficiency:           Option<f64>,
  pub worst_efficiency:          Option<f64>,
  pub highest_price:             Option<f64>,
  pub lowest_price:              Option<f64>,
  pub last_updated:              Option<String>,
}

/// Column list matching [`RawAggregate::from_row`].
pub const AGGREGATE_COLUMNS: &str = "total_cost, total_distance, total_quantity, \
   record_count, average_efficiency, average_cost_per_distance, \
   average_cost_per_event, average_price, best_efficiency, worst_efficiency, \
   highest_price, lowest_price, last_updated";

impl RawAggregate {
  pub fn from_aggregate(agg: &Aggregate) -> Self {
    Self {
      total_cost:                agg.total_cost,
      total_distance:            agg.total_distance,
      total_quantity:            agg.total_quantity,
      record_count:              agg.record_count as i64,
      average_efficiency:        agg.average_efficiency,
      average_cost_per_distance: agg.average_cost_per_distance,
      average_cost_per_event:    agg.average_cost_per_event,
      average_price:             agg.average_price,
      best_efficiency:           agg.best_efficiency,
      worst_efficiency:          agg.worst_efficiency,
      highest_price:             agg.highest_price,
      lowest_price:              agg.lowest_price,
      last_updated:              agg.last_updated.map(encode_dt),
    }
  }

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      total_cost:                row.get(0)?,
      total_distance:            row.get(1)?,
      total_quantity:            row.get(2)?,
      record_count:              row.get(3)?,
      average_efficiency:        row.get(4)?,
      average_cost_per_distance: row.get(5)?,
      average_cost_per_event:    row.get(6)?,
      average_price:             row.get(7)?,
      best_efficiency:           row.get(8)?,
      worst_efficiency:          row.get(9)?,
      highest_price:             row.get(10)?,
      lowest_price:              row.get(11)?,
      last_updated:              row.get(12)?,
    })
  }

  pub fn into_aggregate(self) -> Result<Aggregate> {
    Ok(Aggregate {
      total_cost:                self.total_cost,
      total_distance:            self.total_distance,
      total_quantity:            self.total_quantity,
      record_count:              self.record_count.max(0) as usize,
      average_efficiency:        self.average_efficiency,
      average_cost_per_distance: self.average_cost_per_distance,
      average_cost_per_event:    self.average_cost_per_event,
      average_price:             self.average_price,
      best_efficiency:           self.best_efficiency,
      worst_efficiency:          self.worst_efficiency,
      highest_price:             self.highest_price,
      lowest_price:              self.lowest_price,
      last_updated:              self.last_updated.as_deref().map(decode_dt).transpose()?,
    })
  }
}

/// A `vehicles` row together with its aggregate and events.
pub struct RawVehicle {
  pub vehicle_id: String,
  pub name:       String,
  pub created_at: String,
  /// `None` when the aggregate row is missing.
  pub aggregate:  Option<RawAggregate>,
  pub events:     Vec<RawEvent>,
}

impl RawVehicle {
  pub fn into_vehicle(self) -> Result<Vehicle> {
    let mut events = self
      .events
      .into_iter()
      .map(RawEvent::into_event)
      .collect::<Result<Vec<_>>>()?;
    events.sort_by_key(FuelEvent::order_key);

    let aggregate = self
      .aggregate
      .map(RawAggregate::into_aggregate)
      .transpose()?
      .unwrap_or_default();

    Ok(Vehicle::from_parts(
      decode_uuid(&self.vehicle_id)?,
      self.name,
      decode_dt(&self.created_at)?,
      events,
      aggregate,
    ))
  }
}
