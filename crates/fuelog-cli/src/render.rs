//! Plain-text rendering of vehicles, fill-ups and statistics.
//!
//! Nothing here computes a statistic; every figure comes from the cached
//! fields the engine wrote.

use std::fmt::Write as _;

use fuelog_core::{aggregate::Aggregate, event::FuelEvent, vehicle::Vehicle};

/// Format an optional figure, using `-` when absent.
pub fn opt(value: Option<f64>, decimals: usize) -> String {
  value.map_or_else(|| "-".to_string(), |v| format!("{v:.decimals$}"))
}

pub fn vehicle_line(vehicle: &Vehicle) -> String {
  format!(
    "{}  {:<20}  {:>4} fill-ups  avg {}",
    vehicle.vehicle_id,
    vehicle.name,
    vehicle.aggregate.record_count,
    opt(vehicle.aggregate.average_efficiency, 2),
  )
}

pub fn event_table(events: &[FuelEvent]) -> String {
  let mut out = format!(
    "{:<36}  {:<16}  {:<7}  {:>10}  {:>8}  {:>7}  {:>8}  {:>8}  {:>7}  {:>7}\n",
    "id", "date", "kind", "odometer", "quantity", "price", "cost", "distance", "eff", "cpd",
  );
  for e in events {
    let cache = e.cache;
    let _ = writeln!(
      out,
      "{:<36}  {:<16}  {:<7}  {:>10.1}  {:>8.3}  {:>7.3}  {:>8.2}  {:>8}  {:>7}  {:>7}{}",
      e.event_id,
      e.occurred_at.format("%Y-%m-%d %H:%M"),
      e.kind.as_ref(),
      e.odometer,
      e.quantity,
      e.price,
      e.cost,
      opt(cache.map(|c| c.distance), 1),
      opt(e.efficiency(), 2),
      opt(e.cost_per_distance(), 3),
      e.note.as_deref().map(|n| format!("  {n}")).unwrap_or_default(),
    );
  }
  out
}

pub fn statistics(name: &str, agg: &Aggregate) -> String {
  let rows = [
    ("fill-ups", agg.record_count.to_string()),
    ("total cost", opt(agg.total_cost, 2)),
    ("total distance", opt(agg.total_distance, 1)),
    ("total fuel", opt(agg.total_quantity, 3)),
    ("average efficiency", opt(agg.average_efficiency, 2)),
    ("best efficiency", opt(agg.best_efficiency, 2)),
    ("worst efficiency", opt(agg.worst_efficiency, 2)),
    ("cost per distance", opt(agg.average_cost_per_distance, 3)),
    ("cost per fill-up", opt(agg.average_cost_per_event, 2)),
    ("average price", opt(agg.average_price, 3)),
    ("highest price", opt(agg.highest_price, 3)),
    ("lowest price", opt(agg.lowest_price, 3)),
    (
      "updated",
      agg
        .last_updated
        .map_or_else(|| "never".to_string(), |t| t.to_rfc3339()),
    ),
  ];

  let mut out = format!("{name}\n");
  for (label, value) in rows {
    let _ = writeln!(out, "  {label:<20} {value}");
  }
  out
}
