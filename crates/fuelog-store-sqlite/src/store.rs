//! [`SqliteStore`], the SQLite implementation of [`FuelStore`].

use std::path::Path;

use rusqlite::OptionalExtension as _;
use tracing::{debug, info};
use uuid::Uuid;

use fuelog_core::{
  aggregate::Aggregate,
  engine::{self, Refresh},
  event::{EventPatch, FuelEvent, NewEvent},
  store::FuelStore,
  vehicle::Vehicle,
};

use crate::{
  Error, Result,
  encode::{
    AGGREGATE_COLUMNS, EVENT_COLUMNS, RawAggregate, RawEvent, RawVehicle, encode_dt,
    encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Write-back ──────────────────────────────────────────────────────────────

/// Everything one store operation needs to write, applied in a single
/// transaction.
#[derive(Default)]
struct WriteBack {
  vehicle_id: String,
  inserted:   Vec<RawEvent>,
  edited:     Vec<RawEvent>,
  deleted:    Vec<String>,
  /// Events whose cache columns must be rewritten.
  recached:   Vec<RawEvent>,
  aggregate:  Option<RawAggregate>,
}

impl WriteBack {
  /// Start a write-back for `vehicle` after `refresh`. A full refresh
  /// touched every event's cache, so all of them are rewritten.
  fn after(vehicle: &Vehicle, refresh: Refresh) -> Self {
    let recached = match refresh {
      Refresh::Full => vehicle.events.iter().map(RawEvent::from_event).collect(),
      Refresh::Incremental => Vec::new(),
    };
    Self {
      vehicle_id: encode_uuid(vehicle.vehicle_id),
      recached,
      aggregate: Some(RawAggregate::from_aggregate(&vehicle.aggregate)),
      ..Self::default()
    }
  }

  fn apply(self, conn: &mut rusqlite::Connection) -> rusqlite::Result<()> {
    let tx = conn.transaction()?;

    for raw in &self.inserted {
      tx.execute(
        &format!(
          "INSERT INTO events ({EVENT_COLUMNS})
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"
        ),
        rusqlite::params![
          raw.event_id,
          raw.vehicle_id,
          raw.seq,
          raw.occurred_at,
          raw.odometer,
          raw.price,
          raw.quantity,
          raw.cost,
          raw.fill_kind,
          raw.note,
          raw.cache_computed,
          raw.cache_previous_odometer,
          raw.cache_distance,
          raw.cache_efficiency,
          raw.cache_cost_per_distance,
        ],
      )?;
    }

    for raw in &self.edited {
      tx.execute(
        "UPDATE events SET
           occurred_at = ?2, odometer = ?3, price = ?4, quantity = ?5,
           cost = ?6, fill_kind = ?7, note = ?8
         WHERE event_id = ?1",
        rusqlite::params![
          raw.event_id,
          raw.occurred_at,
          raw.odometer,
          raw.price,
          raw.quantity,
          raw.cost,
          raw.fill_kind,
          raw.note,
        ],
      )?;
    }

    for event_id in &self.deleted {
      tx.execute(
        "DELETE FROM events WHERE event_id = ?1",
        rusqlite::params![event_id],
      )?;
    }

    for raw in &self.recached {
      tx.execute(
        "UPDATE events SET
           cache_computed = ?2, cache_previous_odometer = ?3,
           cache_distance = ?4, cache_efficiency = ?5, cache_cost_per_distance = ?6
         WHERE event_id = ?1",
        rusqlite::params![
          raw.event_id,
          raw.cache_computed,
          raw.cache_previous_odometer,
          raw.cache_distance,
          raw.cache_efficiency,
          raw.cache_cost_per_distance,
        ],
      )?;
    }

    if let Some(agg) = &self.aggregate {
      tx.execute(
        &format!(
          "INSERT OR REPLACE INTO aggregates (vehicle_id, {AGGREGATE_COLUMNS})
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)"
        ),
        rusqlite::params![
          self.vehicle_id,
          agg.total_cost,
          agg.total_distance,
          agg.total_quantity,
          agg.record_count,
          agg.average_efficiency,
          agg.average_cost_per_distance,
          agg.average_cost_per_event,
          agg.average_price,
          agg.best_efficiency,
          agg.worst_efficiency,
          agg.highest_price,
          agg.lowest_price,
          agg.last_updated,
        ],
      )?;
    }

    tx.commit()
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A fuelog store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run raw SQL against the underlying connection.
  #[cfg(test)]
  pub(crate) async fn execute_batch(&self, sql: &'static str) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Load a vehicle exactly as stored, without a freshness check.
  async fn load_vehicle(&self, id: Uuid) -> Result<Option<Vehicle>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawVehicle> = self
      .conn
      .call(move |conn| {
        let head: Option<(String, String, String)> = conn
          .query_row(
            "SELECT vehicle_id, name, created_at FROM vehicles WHERE vehicle_id = ?1",
            rusqlite::params![id_str],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
          )
          .optional()?;

        let Some((vehicle_id, name, created_at)) = head else {
          return Ok(None);
        };

        let aggregate = conn
          .query_row(
            &format!("SELECT {AGGREGATE_COLUMNS} FROM aggregates WHERE vehicle_id = ?1"),
            rusqlite::params![id_str],
            RawAggregate::from_row,
          )
          .optional()?;

        let mut stmt = conn.prepare(&format!(
          "SELECT {EVENT_COLUMNS} FROM events WHERE vehicle_id = ?1 ORDER BY seq"
        ))?;
        let events = stmt
          .query_map(rusqlite::params![id_str], RawEvent::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Some(RawVehicle { vehicle_id, name, created_at, aggregate, events }))
      })
      .await?;

    raw.map(RawVehicle::into_vehicle).transpose()
  }

  async fn require_vehicle(&self, id: Uuid) -> Result<Vehicle> {
    self.load_vehicle(id).await?.ok_or(Error::VehicleNotFound(id))
  }

  /// The vehicle owning `event_id`.
  async fn vehicle_of(&self, event_id: Uuid) -> Result<Uuid> {
    let id_str = encode_uuid(event_id);

    let owner: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT vehicle_id FROM events WHERE event_id = ?1",
              rusqlite::params![id_str],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    let owner = owner.ok_or(Error::EventNotFound(event_id))?;
    Ok(Uuid::parse_str(&owner)?)
  }

  async fn write_back(&self, write: WriteBack) -> Result<()> {
    debug!(
      vehicle_id = %write.vehicle_id,
      inserted = write.inserted.len(),
      edited = write.edited.len(),
      deleted = write.deleted.len(),
      recached = write.recached.len(),
      "writing back fuel log changes"
    );
    self
      .conn
      .call(move |conn| {
        write.apply(conn)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run the freshness check and persist any rebuilt caches.
  async fn refresh_if_stale(&self, vehicle: &mut Vehicle) -> Result<()> {
    if let Some(refresh) = engine::ensure_fresh(vehicle) {
      info!(
        vehicle_id = %vehicle.vehicle_id,
        events = vehicle.events.len(),
        "rebuilt stale statistics"
      );
      self.write_back(WriteBack::after(vehicle, refresh)).await?;
    }
    Ok(())
  }
}

// ─── FuelStore impl ──────────────────────────────────────────────────────────

impl FuelStore for SqliteStore {
  type Error = Error;

  // ── Vehicles ──────────────────────────────────────────────────────────────

  async fn add_vehicle(&self, name: String) -> Result<Vehicle> {
    let mut vehicle = Vehicle::new(name);
    engine::recalculate(&mut vehicle);

    let id_str = encode_uuid(vehicle.vehicle_id);
    let name_str = vehicle.name.clone();
    let at_str = encode_dt(vehicle.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO vehicles (vehicle_id, name, created_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, name_str, at_str],
        )?;
        Ok(())
      })
      .await?;
    self.write_back(WriteBack::after(&vehicle, Refresh::Full)).await?;

    info!(vehicle_id = %vehicle.vehicle_id, name = %vehicle.name, "added vehicle");
    Ok(vehicle)
  }

  async fn get_vehicle(&self, id: Uuid) -> Result<Option<Vehicle>> {
    let Some(mut vehicle) = self.load_vehicle(id).await? else {
      return Ok(None);
    };
    self.refresh_if_stale(&mut vehicle).await?;
    Ok(Some(vehicle))
  }

  async fn list_vehicles(&self) -> Result<Vec<Vehicle>> {
    let ids: Vec<String> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare("SELECT vehicle_id FROM vehicles ORDER BY created_at, name")?;
        let rows = stmt
          .query_map([], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let mut vehicles = Vec::with_capacity(ids.len());
    for id in ids {
      let id = Uuid::parse_str(&id)?;
      if let Some(vehicle) = self.get_vehicle(id).await? {
        vehicles.push(vehicle);
      }
    }
    Ok(vehicles)
  }

  // ── Fill-ups ──────────────────────────────────────────────────────────────

  async fn record_event(&self, vehicle_id: Uuid, input: NewEvent) -> Result<FuelEvent> {
    let mut vehicle = self.require_vehicle(vehicle_id).await?;
    let (event, refresh) = vehicle.add_event(input)?;

    let inserted = RawEvent::from_event(&event);
    let mut write = WriteBack::after(&vehicle, refresh);
    write.recached.retain(|raw| raw.event_id != inserted.event_id);
    write.inserted.push(inserted);
    self.write_back(write).await?;

    debug!(%vehicle_id, event_id = %event.event_id, ?refresh, "recorded fill-up");
    Ok(event)
  }

  async fn import_events(
    &self,
    vehicle_id: Uuid,
    inputs: Vec<NewEvent>,
  ) -> Result<Vec<FuelEvent>> {
    let mut vehicle = self.require_vehicle(vehicle_id).await?;
    let ids = vehicle.import_events(inputs);

    let imported: Vec<FuelEvent> = ids
      .iter()
      .filter_map(|id| vehicle.event(*id).cloned())
      .collect();

    let mut write = WriteBack::after(&vehicle, Refresh::Full);
    let fresh: Vec<String> = ids.iter().copied().map(encode_uuid).collect();
    write.recached.retain(|raw| !fresh.contains(&raw.event_id));
    write.inserted = imported.iter().map(RawEvent::from_event).collect();
    self.write_back(write).await?;

    info!(%vehicle_id, count = imported.len(), "imported fill-ups");
    Ok(imported)
  }

  async fn edit_event(&self, event_id: Uuid, patch: EventPatch) -> Result<FuelEvent> {
    let vehicle_id = self.vehicle_of(event_id).await?;
    let mut vehicle = self.require_vehicle(vehicle_id).await?;
    let event = vehicle.edit_event(event_id, &patch)?;

    let mut write = WriteBack::after(&vehicle, Refresh::Full);
    write.edited.push(RawEvent::from_event(&event));
    self.write_back(write).await?;

    debug!(%vehicle_id, %event_id, "edited fill-up");
    Ok(event)
  }

  async fn delete_event(&self, event_id: Uuid) -> Result<FuelEvent> {
    let vehicle_id = self.vehicle_of(event_id).await?;
    let mut vehicle = self.require_vehicle(vehicle_id).await?;
    let removed = vehicle.delete_event(event_id)?;

    let mut write = WriteBack::after(&vehicle, Refresh::Full);
    write.deleted.push(encode_uuid(event_id));
    self.write_back(write).await?;

    debug!(%vehicle_id, %event_id, "deleted fill-up");
    Ok(removed)
  }

  async fn recalculate(&self, vehicle_id: Uuid) -> Result<Aggregate> {
    let mut vehicle = self.require_vehicle(vehicle_id).await?;
    let refresh = engine::recalculate(&mut vehicle);
    self.write_back(WriteBack::after(&vehicle, refresh)).await?;
    Ok(vehicle.aggregate)
  }
}
