//! Subcommands and their dispatch against any [`FuelStore`].

use std::path::PathBuf;

use anyhow::{Context as _, Result, bail};
use chrono::{DateTime, Utc};
use clap::Subcommand;
use fuelog_core::{
  event::{EventPatch, FillKind, NewEvent},
  store::FuelStore,
  vehicle::Vehicle,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::render;

// ─── CLI shape ───────────────────────────────────────────────────────────────

#[derive(Subcommand, Debug)]
pub enum Command {
  /// Manage vehicles.
  #[command(subcommand)]
  Vehicle(VehicleCommand),

  /// Record, change and inspect fill-ups.
  #[command(subcommand)]
  Fill(FillCommand),

  /// Import fill-ups from a JSON array.
  Import {
    vehicle: Uuid,
    file:    PathBuf,
  },

  /// Show cached statistics for a vehicle.
  Stats {
    vehicle: Uuid,
    /// Print the statistics as JSON.
    #[arg(long)]
    json:    bool,
  },

  /// Rebuild every cached statistic for a vehicle.
  Rebuild { vehicle: Uuid },
}

#[derive(Subcommand, Debug)]
pub enum VehicleCommand {
  /// Add a vehicle with an empty history.
  Add { name: String },
  /// List vehicles with their record count and average efficiency.
  List,
}

#[derive(Subcommand, Debug)]
pub enum FillCommand {
  /// Record a fill-up.
  Add {
    vehicle:  Uuid,
    #[arg(long)]
    odometer: f64,
    /// Price per unit of fuel.
    #[arg(long)]
    price:    f64,
    /// Units of fuel bought.
    #[arg(long)]
    quantity: f64,
    /// Total paid; defaults to price × quantity.
    #[arg(long)]
    cost:     Option<f64>,
    /// full, partial or reset.
    #[arg(long, default_value = "full")]
    kind:     FillKind,
    #[arg(long)]
    note:     Option<String>,
    /// RFC 3339 timestamp; defaults to now.
    #[arg(long)]
    at:       Option<DateTime<Utc>>,
  },

  /// Change fields of an existing fill-up.
  Edit {
    event:      Uuid,
    #[arg(long)]
    odometer:   Option<f64>,
    #[arg(long)]
    price:      Option<f64>,
    #[arg(long)]
    quantity:   Option<f64>,
    #[arg(long)]
    cost:       Option<f64>,
    #[arg(long)]
    kind:       Option<FillKind>,
    #[arg(long, conflicts_with = "clear_note")]
    note:       Option<String>,
    #[arg(long)]
    clear_note: bool,
    #[arg(long)]
    at:         Option<DateTime<Utc>>,
  },

  /// Delete a fill-up.
  Delete { event: Uuid },

  /// List a vehicle's fill-ups with their cached figures.
  List { vehicle: Uuid },
}

// ─── Import format ───────────────────────────────────────────────────────────

/// One element of an import file.
#[derive(Debug, Deserialize)]
struct ImportRecord {
  occurred_at: DateTime<Utc>,
  odometer:    f64,
  price:       f64,
  quantity:    f64,
  #[serde(default)]
  cost:        Option<f64>,
  kind:        FillKind,
  #[serde(default)]
  note:        Option<String>,
}

impl From<ImportRecord> for NewEvent {
  fn from(r: ImportRecord) -> Self {
    let mut event = NewEvent::new(r.occurred_at, r.odometer, r.price, r.quantity, r.kind);
    if let Some(cost) = r.cost {
      event = event.with_cost(cost);
    }
    event.note = r.note;
    event
  }
}

fn parse_import(raw: &str) -> Result<Vec<NewEvent>> {
  let records: Vec<ImportRecord> =
    serde_json::from_str(raw).context("import file is not a JSON array of fill-ups")?;
  Ok(records.into_iter().map(NewEvent::from).collect())
}

// ─── Dispatch ────────────────────────────────────────────────────────────────

async fn load_vehicle<S: FuelStore>(store: &S, id: Uuid) -> Result<Vehicle> {
  store
    .get_vehicle(id)
    .await?
    .with_context(|| format!("no vehicle with id {id}"))
}

pub async fn run<S: FuelStore>(store: &S, command: Command) -> Result<()> {
  match command {
    Command::Vehicle(VehicleCommand::Add { name }) => {
      let v = store.add_vehicle(name).await?;
      println!("{}", v.vehicle_id);
    }
    Command::Vehicle(VehicleCommand::List) => {
      for v in store.list_vehicles().await? {
        println!("{}", render::vehicle_line(&v));
      }
    }

    Command::Fill(FillCommand::Add {
      vehicle,
      odometer,
      price,
      quantity,
      cost,
      kind,
      note,
      at,
    }) => {
      let mut input = NewEvent::new(at.unwrap_or_else(Utc::now), odometer, price, quantity, kind);
      if let Some(cost) = cost {
        input = input.with_cost(cost);
      }
      input.note = note;
      let event = store.record_event(vehicle, input).await?;
      println!("{}", event.event_id);
    }
    Command::Fill(FillCommand::Edit {
      event,
      odometer,
      price,
      quantity,
      cost,
      kind,
      note,
      clear_note,
      at,
    }) => {
      let patch = EventPatch {
        occurred_at: at,
        odometer,
        price,
        quantity,
        cost,
        kind,
        note: if clear_note { Some(None) } else { note.map(Some) },
      };
      if patch.is_empty() {
        bail!("nothing to change; pass at least one field to edit");
      }
      let edited = store.edit_event(event, patch).await?;
      print!("{}", render::event_table(std::slice::from_ref(&edited)));
    }
    Command::Fill(FillCommand::Delete { event }) => {
      let removed = store.delete_event(event).await?;
      println!("deleted {}", removed.event_id);
    }
    Command::Fill(FillCommand::List { vehicle: id }) => {
      let v = load_vehicle(store, id).await?;
      print!("{}", render::event_table(&v.events));
    }

    Command::Import { vehicle, file } => {
      let raw = std::fs::read_to_string(&file)
        .with_context(|| format!("reading import file {}", file.display()))?;
      let inputs = parse_import(&raw)?;
      let imported = store.import_events(vehicle, inputs).await?;
      println!("imported {} fill-ups", imported.len());
    }
    Command::Stats { vehicle: id, json } => {
      let v = load_vehicle(store, id).await?;
      if json {
        println!("{}", serde_json::to_string_pretty(&v.aggregate)?);
      } else {
        print!("{}", render::statistics(&v.name, &v.aggregate));
      }
    }
    Command::Rebuild { vehicle } => {
      let aggregate = store.recalculate(vehicle).await?;
      tracing::info!(%vehicle, records = aggregate.record_count, "rebuilt statistics");
    }
  }
  Ok(())
}
