//! The statistics cache engine.
//!
//! Three entry points keep a [`Vehicle`]'s [`Aggregate`] and per-event
//! [`EventCache`]s consistent with its event history:
//!
//! - [`recalculate`] rebuilds everything from scratch in one sorted pass.
//! - [`update_for_new_event`] patches the caches when the appended event is
//!   the chronologically latest one, and falls back to [`recalculate`]
//!   otherwise.
//! - [`ensure_fresh`] is the read-side gate: it rebuilds when the aggregate
//!   is unstamped or its record count disagrees with the live event count.
//!
//! The count check cannot see edits that keep the population unchanged.
//! Anything that edits or deletes an event must call [`recalculate`].

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::{
  aggregate::{Aggregate, fold_max, fold_min},
  efficiency::{Predecessor, annotate},
  event::{EventCache, FuelEvent},
  vehicle::Vehicle,
};

/// Which path refreshed the caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
  /// Only the appended event and the aggregate changed.
  Incremental,
  /// Every event's cache and the aggregate were rewritten.
  Full,
}

// ─── Running sums ────────────────────────────────────────────────────────────

/// Sums that feed the two averages the incremental path cannot patch.
#[derive(Debug, Default)]
struct AverageSums {
  /// Distance over events that carry an efficiency figure.
  eligible_distance: f64,
  /// Quantity over events that carry an efficiency figure.
  eligible_quantity: f64,
  total_distance:    f64,
  total_quantity:    f64,
  price_sum:         f64,
}

impl AverageSums {
  fn fold(&mut self, event: &FuelEvent, cache: &EventCache) {
    if cache.efficiency.is_some() {
      self.eligible_distance += cache.distance;
      self.eligible_quantity += event.quantity;
    }
    if cache.distance > 0.0 {
      self.total_distance += cache.distance;
    }
    self.total_quantity += event.quantity;
    self.price_sum += event.price;
  }

  fn scan(events: &[FuelEvent]) -> Self {
    let mut sums = Self::default();
    for event in events {
      if let Some(cache) = &event.cache {
        sums.fold(event, cache);
      } else {
        sums.total_quantity += event.quantity;
        sums.price_sum += event.price;
      }
    }
    sums
  }

  /// Distance over quantity for the eligible events; when no event is
  /// eligible, the same ratio over all events.
  fn average_efficiency(&self) -> f64 {
    if self.eligible_quantity > 0.0 {
      self.eligible_distance / self.eligible_quantity
    } else if self.total_quantity > 0.0 {
      self.total_distance / self.total_quantity
    } else {
      0.0
    }
  }

  fn average_price(&self, count: usize) -> f64 { self.price_sum / count as f64 }
}

fn ratio_or_zero(numerator: f64, denominator: f64) -> f64 {
  if denominator > 0.0 { numerator / denominator } else { 0.0 }
}

// ─── Full recalculation ──────────────────────────────────────────────────────

/// Rebuild every cache field of `vehicle` from its full event set.
///
/// Events are sorted in place by `(occurred_at, seq)`.
pub fn recalculate(vehicle: &mut Vehicle) -> Refresh {
  let now = Utc::now();
  let Vehicle { vehicle_id, events, aggregate, .. } = vehicle;

  if events.is_empty() {
    aggregate.clear();
    debug_assert!(aggregate.is_cleared());
    aggregate.last_updated = Some(now);
    debug!(%vehicle_id, "recalculated empty history");
    return Refresh::Full;
  }

  events.sort_by_key(FuelEvent::order_key);

  let mut sums = AverageSums::default();
  let mut total_cost = 0.0;
  let mut best_efficiency = None;
  let mut worst_efficiency = None;
  let mut highest_price = None;
  let mut lowest_price = None;
  let mut predecessor = Predecessor::None;

  for (index, event) in events.iter_mut().enumerate() {
    let cache = annotate(event, predecessor);
    event.cache = Some(cache);

    sums.fold(event, &cache);
    total_cost += event.cost;
    if let Some(efficiency) = cache.efficiency {
      fold_max(&mut best_efficiency, efficiency);
      fold_min(&mut worst_efficiency, efficiency);
    }
    fold_max(&mut highest_price, event.price);
    fold_min(&mut lowest_price, event.price);

    predecessor = Predecessor::from_event(event, index == 0);
  }

  let count = events.len();
  *aggregate = Aggregate {
    total_cost: Some(total_cost),
    total_distance: Some(sums.total_distance),
    total_quantity: Some(sums.total_quantity),
    record_count: count,
    average_efficiency: Some(sums.average_efficiency()),
    average_cost_per_distance: Some(ratio_or_zero(total_cost, sums.total_distance)),
    average_cost_per_event: Some(total_cost / count as f64),
    average_price: Some(sums.average_price(count)),
    best_efficiency,
    worst_efficiency,
    highest_price,
    lowest_price,
    last_updated: Some(now),
  };

  debug!(%vehicle_id, count, "recalculated statistics");
  Refresh::Full
}

// ─── Incremental append ──────────────────────────────────────────────────────

/// Refresh caches after `event_id` was appended to `vehicle.events`.
///
/// Takes the fast path only when the vehicle already had at least two
/// events, the aggregate was fresh for them, and the new event sorts last.
/// Otherwise this is a full [`recalculate`].
pub fn update_for_new_event(vehicle: &mut Vehicle, event_id: Uuid) -> Refresh {
  let position = vehicle.events.iter().position(|e| e.event_id == event_id);
  let Some(position) = position else {
    debug!(%event_id, "appended event missing from history, recalculating");
    return recalculate(vehicle);
  };

  let prior_count = vehicle.events.len() - 1;
  if prior_count <= 1 {
    return recalculate(vehicle);
  }

  let key = vehicle.events[position].order_key();
  let is_latest = vehicle
    .events
    .iter()
    .enumerate()
    .all(|(i, e)| i == position || e.order_key() < key);
  if !is_latest {
    debug!(%event_id, "appended event is not the latest, recalculating");
    return recalculate(vehicle);
  }

  let aggregate = &vehicle.aggregate;
  if aggregate.last_updated.is_none() || aggregate.record_count != prior_count {
    debug!(%event_id, "aggregate was stale before append, recalculating");
    return recalculate(vehicle);
  }

  // Keep the history in chronological order: the new event goes last.
  let event = vehicle.events.remove(position);
  vehicle.events.push(event);

  // At least two prior events exist, so the predecessor is never the first.
  let last = vehicle.events.len() - 1;
  let predecessor = vehicle.events[..last]
    .iter()
    .max_by_key(|e| e.order_key())
    .map_or(Predecessor::None, |previous| Predecessor::from_event(previous, false));

  let event = &mut vehicle.events[last];
  let cache = annotate(event, predecessor);
  event.cache = Some(cache);
  let (cost, quantity, price) = (event.cost, event.quantity, event.price);

  let aggregate = &mut vehicle.aggregate;
  let total_cost = aggregate.total_cost.unwrap_or(0.0) + cost;
  let mut total_distance = aggregate.total_distance.unwrap_or(0.0);
  if cache.distance > 0.0 {
    total_distance += cache.distance;
  }
  let count = prior_count + 1;

  aggregate.total_cost = Some(total_cost);
  aggregate.total_distance = Some(total_distance);
  aggregate.total_quantity = Some(aggregate.total_quantity.unwrap_or(0.0) + quantity);
  aggregate.record_count = count;
  aggregate.average_cost_per_distance = Some(ratio_or_zero(total_cost, total_distance));
  aggregate.average_cost_per_event = Some(total_cost / count as f64);
  fold_max(&mut aggregate.highest_price, price);
  fold_min(&mut aggregate.lowest_price, price);
  if let Some(efficiency) = cache.efficiency {
    fold_max(&mut aggregate.best_efficiency, efficiency);
    fold_min(&mut aggregate.worst_efficiency, efficiency);
  }

  // Average efficiency depends on which events are eligible; rescan.
  let sums = AverageSums::scan(&vehicle.events);
  aggregate.average_efficiency = Some(sums.average_efficiency());
  aggregate.average_price = Some(sums.average_price(count));
  aggregate.last_updated = Some(Utc::now());

  debug!(vehicle_id = %vehicle.vehicle_id, %event_id, count, "patched statistics");
  Refresh::Incremental
}

// ─── Freshness ───────────────────────────────────────────────────────────────

/// True when the aggregate is stamped and counts the live events.
pub fn is_fresh(vehicle: &Vehicle) -> bool {
  vehicle.aggregate.last_updated.is_some()
    && vehicle.aggregate.record_count == vehicle.events.len()
}

/// Rebuild the caches unless they are already fresh. Returns the refresh
/// that ran, if any.
pub fn ensure_fresh(vehicle: &mut Vehicle) -> Option<Refresh> {
  if is_fresh(vehicle) {
    return None;
  }
  debug!(
    vehicle_id = %vehicle.vehicle_id,
    cached = vehicle.aggregate.record_count,
    live = vehicle.events.len(),
    "statistics stale, recalculating"
  );
  Some(recalculate(vehicle))
}
