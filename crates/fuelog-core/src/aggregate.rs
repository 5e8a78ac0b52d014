//! Per-vehicle summary statistics, cached alongside the vehicle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cached statistics over a vehicle's whole event history.
///
/// Every statistic is `None` in the cleared state. A present `last_updated`
/// together with a `record_count` matching the live event count marks the
/// cache as fresh; see [`crate::engine::is_fresh`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
  pub total_cost:                Option<f64>,
  pub total_distance:            Option<f64>,
  pub total_quantity:            Option<f64>,
  pub record_count:              usize,
  pub average_efficiency:        Option<f64>,
  pub average_cost_per_distance: Option<f64>,
  pub average_cost_per_event:    Option<f64>,
  pub average_price:             Option<f64>,
  pub best_efficiency:           Option<f64>,
  pub worst_efficiency:          Option<f64>,
  pub highest_price:             Option<f64>,
  pub lowest_price:              Option<f64>,
  pub last_updated:              Option<DateTime<Utc>>,
}

impl Aggregate {
  /// Reset to the cleared state.
  pub fn clear(&mut self) { *self = Self::default(); }

  pub fn is_cleared(&self) -> bool { *self == Self::default() }

  /// Equality over the statistics only, ignoring `last_updated`.
  pub fn same_statistics(&self, other: &Self) -> bool {
    Self { last_updated: None, ..self.clone() }
      == Self { last_updated: None, ..other.clone() }
  }
}

/// Fold `value` into an optional running maximum.
pub(crate) fn fold_max(slot: &mut Option<f64>, value: f64) {
  *slot = Some(slot.map_or(value, |current| current.max(value)));
}

/// Fold `value` into an optional running minimum.
pub(crate) fn fold_min(slot: &mut Option<f64>, value: f64) {
  *slot = Some(slot.map_or(value, |current| current.min(value)));
}
