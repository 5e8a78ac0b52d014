//! The fuel-efficiency rule and the single annotation step built on it.
//!
//! An efficiency figure is attributed to a `Full` fill-up only when the
//! chronologically preceding fill-up left the tank in a known state: it was
//! itself `Full`, it was a `Reset`, or it is the very first event. A `Partial`
//! fill-up anywhere else breaks the chain for its successor.
//!
//! Both the full recalculation and the incremental append path go through
//! [`annotate`], so the two can never disagree on policy.

use crate::event::{EventCache, FillKind, FuelEvent};

/// What precedes an event in chronological order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Predecessor {
  /// The event is the first of its vehicle.
  None,
  /// The predecessor can anchor an efficiency computation.
  Anchor { odometer: f64 },
  /// The predecessor was a partial fill and blocks efficiency for its
  /// successor.
  Blocking { odometer: f64 },
}

impl Predecessor {
  /// Classify `event` as the predecessor of whatever follows it.
  /// `is_first` is true when `event` has no predecessor of its own.
  pub fn from_event(event: &FuelEvent, is_first: bool) -> Self {
    let odometer = event.odometer;
    match event.kind {
      FillKind::Full | FillKind::Reset => Self::Anchor { odometer },
      FillKind::Partial if is_first => Self::Anchor { odometer },
      FillKind::Partial => Self::Blocking { odometer },
    }
  }

  pub fn odometer(&self) -> Option<f64> {
    match *self {
      Self::None => None,
      Self::Anchor { odometer } | Self::Blocking { odometer } => Some(odometer),
    }
  }
}

/// Whether an event of `kind` may carry an efficiency figure.
pub fn is_computable(
  kind: FillKind,
  predecessor: Predecessor,
  distance: f64,
  quantity: f64,
) -> bool {
  match kind {
    FillKind::Full => {
      matches!(predecessor, Predecessor::Anchor { .. })
        && distance > 0.0
        && quantity > 0.0
    }
    FillKind::Partial | FillKind::Reset => false,
  }
}

/// Compute the four cache fields of `event` given its predecessor.
pub fn annotate(event: &FuelEvent, predecessor: Predecessor) -> EventCache {
  let previous_odometer = predecessor.odometer();
  let distance = previous_odometer.map_or(0.0, |prev| event.odometer - prev);

  let efficiency = is_computable(event.kind, predecessor, distance, event.quantity)
    .then(|| distance / event.quantity);
  let cost_per_distance = (distance > 0.0).then(|| event.cost / distance);

  EventCache {
    previous_odometer,
    distance,
    efficiency,
    cost_per_distance,
  }
}
