//! Fill-up events, one per recorded fueling of a vehicle.
//!
//! The user-entered fields of an event are plain data. The derived
//! [`EventCache`] is written only by the [`crate::engine`] and is either
//! wholly present or wholly absent.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Fill-up kind ────────────────────────────────────────────────────────────

/// How the tank was filled. Governs whether an event produces, anchors or
/// blocks an efficiency figure; see [`crate::efficiency`].
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum FillKind {
  /// The tank was filled to the brim.
  Full,
  /// The tank was topped up but not filled.
  Partial,
  /// One or more fill-ups before this one were never recorded.
  Reset,
}

impl FillKind {
  /// Parse the lowercase discriminant stored in databases and import files.
  pub fn parse(s: &str) -> Result<Self> {
    Self::from_str(s).map_err(|_| Error::UnknownFillKind(s.to_owned()))
  }
}

// ─── Cache ───────────────────────────────────────────────────────────────────

/// Per-event statistics derived from the event and its chronological
/// predecessor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EventCache {
  /// Odometer of the predecessor; `None` for the first event.
  pub previous_odometer: Option<f64>,
  /// `odometer - previous_odometer`, or `0.0` for the first event.
  pub distance:          f64,
  /// Distance per unit of fuel, when the efficiency rule allows it.
  pub efficiency:        Option<f64>,
  /// Cost per unit of distance, whenever the distance is positive.
  pub cost_per_distance: Option<f64>,
}

// ─── FuelEvent ───────────────────────────────────────────────────────────────

/// A persisted fill-up belonging to exactly one vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuelEvent {
  pub event_id:    Uuid,
  pub vehicle_id:  Uuid,
  /// Per-vehicle insertion sequence; breaks ties between equal timestamps.
  pub seq:         u64,
  pub occurred_at: DateTime<Utc>,
  pub odometer:    f64,
  /// Price per unit of fuel.
  pub price:       f64,
  /// Units of fuel bought.
  pub quantity:    f64,
  /// Total amount paid.
  pub cost:        f64,
  pub kind:        FillKind,
  pub note:        Option<String>,
  /// `None` until the engine has annotated this event.
  pub cache:       Option<EventCache>,
}

impl FuelEvent {
  /// The chronological sort key: timestamp, then insertion sequence.
  pub fn order_key(&self) -> (DateTime<Utc>, u64) { (self.occurred_at, self.seq) }

  pub fn efficiency(&self) -> Option<f64> {
    self.cache.and_then(|c| c.efficiency)
  }

  pub fn cost_per_distance(&self) -> Option<f64> {
    self.cache.and_then(|c| c.cost_per_distance)
  }
}

// ─── NewEvent ────────────────────────────────────────────────────────────────

/// Input for appending a fill-up. Identity, sequence and cache are assigned
/// by the owning [`crate::vehicle::Vehicle`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEvent {
  pub occurred_at: DateTime<Utc>,
  pub odometer:    f64,
  pub price:       f64,
  pub quantity:    f64,
  pub cost:        f64,
  pub kind:        FillKind,
  #[serde(default)]
  pub note:        Option<String>,
}

impl NewEvent {
  /// Convenience constructor; `cost` is derived as `price * quantity`.
  pub fn new(
    occurred_at: DateTime<Utc>,
    odometer: f64,
    price: f64,
    quantity: f64,
    kind: FillKind,
  ) -> Self {
    Self {
      occurred_at,
      odometer,
      price,
      quantity,
      cost: price * quantity,
      kind,
      note: None,
    }
  }

  pub fn with_cost(mut self, cost: f64) -> Self {
    self.cost = cost;
    self
  }

  pub fn with_note(mut self, note: impl Into<String>) -> Self {
    self.note = Some(note.into());
    self
  }
}

// ─── EventPatch ──────────────────────────────────────────────────────────────

/// Replacement values for an existing event. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventPatch {
  pub occurred_at: Option<DateTime<Utc>>,
  pub odometer:    Option<f64>,
  pub price:       Option<f64>,
  pub quantity:    Option<f64>,
  pub cost:        Option<f64>,
  pub kind:        Option<FillKind>,
  /// `Some(None)` clears the note.
  pub note:        Option<Option<String>>,
}

impl EventPatch {
  pub fn is_empty(&self) -> bool { *self == Self::default() }

  /// Overwrite the user-entered fields of `event`. The cache is left alone;
  /// callers must run a full recalculation afterwards.
  pub fn apply_to(&self, event: &mut FuelEvent) {
    if let Some(at) = self.occurred_at {
      event.occurred_at = at;
    }
    if let Some(odometer) = self.odometer {
      event.odometer = odometer;
    }
    if let Some(price) = self.price {
      event.price = price;
    }
    if let Some(quantity) = self.quantity {
      event.quantity = quantity;
    }
    if let Some(cost) = self.cost {
      event.cost = cost;
    }
    if let Some(kind) = self.kind {
      event.kind = kind;
    }
    if let Some(note) = &self.note {
      event.note = note.clone();
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn fill_kind_parses_case_insensitively() {
    assert_eq!(FillKind::parse("full").unwrap(), FillKind::Full);
    assert_eq!(FillKind::parse("Partial").unwrap(), FillKind::Partial);
    assert_eq!(FillKind::parse("RESET").unwrap(), FillKind::Reset);
    assert_eq!(FillKind::Partial.as_ref(), "partial");
    assert_eq!(FillKind::Reset.to_string(), "reset");
  }

  #[test]
  fn fill_kind_rejects_unknown() {
    let err = FillKind::parse("half").unwrap_err();
    assert!(matches!(err, Error::UnknownFillKind(s) if s == "half"));
  }

  #[test]
  fn new_event_derives_cost() {
    let at = Utc.timestamp_opt(0, 0).unwrap();
    let e = NewEvent::new(at, 100.0, 3.5, 10.0, FillKind::Full);
    assert_eq!(e.cost, 35.0);
    assert_eq!(e.clone().with_cost(30.0).cost, 30.0);
  }

  #[test]
  fn patch_overwrites_only_given_fields() {
    let at = Utc.timestamp_opt(0, 0).unwrap();
    let mut event = FuelEvent {
      event_id:    Uuid::nil(),
      vehicle_id:  Uuid::nil(),
      seq:         0,
      occurred_at: at,
      odometer:    1000.0,
      price:       3.0,
      quantity:    10.0,
      cost:        30.0,
      kind:        FillKind::Full,
      note:        Some("first".into()),
      cache:       None,
    };

    let patch = EventPatch {
      odometer: Some(1200.0),
      kind: Some(FillKind::Partial),
      note: Some(None),
      ..EventPatch::default()
    };
    assert!(!patch.is_empty());
    patch.apply_to(&mut event);

    assert_eq!(event.odometer, 1200.0);
    assert_eq!(event.kind, FillKind::Partial);
    assert_eq!(event.price, 3.0);
    assert!(event.note.is_none());
  }
}
