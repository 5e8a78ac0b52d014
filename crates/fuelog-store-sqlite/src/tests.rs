//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{DateTime, Duration, TimeZone, Utc};
use fuelog_core::{
  event::{EventPatch, FillKind, NewEvent},
  store::FuelStore,
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn at(day: i64) -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2024, 5, 1, 18, 0, 0).unwrap() + Duration::days(day)
}

fn fill(day: i64, odometer: f64, kind: FillKind) -> NewEvent {
  NewEvent::new(at(day), odometer, 3.25, 10.0, kind)
}

// ─── Vehicles ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_and_get_vehicle() {
  let s = store().await;

  let vehicle = s.add_vehicle("Civic".into()).await.unwrap();
  assert_eq!(vehicle.name, "Civic");
  assert!(vehicle.is_fresh());

  let fetched = s.get_vehicle(vehicle.vehicle_id).await.unwrap().unwrap();
  assert_eq!(fetched.vehicle_id, vehicle.vehicle_id);
  assert_eq!(fetched.name, "Civic");
  assert!(fetched.events.is_empty());
  assert_eq!(fetched.aggregate.record_count, 0);
  assert!(fetched.aggregate.last_updated.is_some());
}

#[tokio::test]
async fn get_vehicle_missing_returns_none() {
  let s = store().await;
  assert!(s.get_vehicle(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn list_vehicles_all() {
  let s = store().await;
  s.add_vehicle("Civic".into()).await.unwrap();
  s.add_vehicle("Transit".into()).await.unwrap();

  let all = s.list_vehicles().await.unwrap();
  assert_eq!(all.len(), 2);
}

// ─── Recording ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn record_events_persists_caches() {
  let s = store().await;
  let v = s.add_vehicle("Civic".into()).await.unwrap();

  s.record_event(v.vehicle_id, fill(0, 10_000.0, FillKind::Full)).await.unwrap();
  s.record_event(v.vehicle_id, fill(1, 10_300.0, FillKind::Full)).await.unwrap();
  let third = s
    .record_event(v.vehicle_id, fill(2, 10_600.0, FillKind::Full).with_note("highway"))
    .await
    .unwrap();
  assert_eq!(third.efficiency(), Some(30.0));

  let loaded = s.get_vehicle(v.vehicle_id).await.unwrap().unwrap();
  assert_eq!(loaded.events.len(), 3);
  assert!(loaded.is_fresh());
  assert_eq!(loaded.aggregate.average_efficiency, Some(30.0));
  assert_eq!(loaded.aggregate.total_distance, Some(600.0));

  let stored = loaded.event(third.event_id).unwrap();
  assert_eq!(stored, &third);
  assert_eq!(stored.note.as_deref(), Some("highway"));
  assert_eq!(loaded.events[0].cache.unwrap().previous_odometer, None);
}

#[tokio::test]
async fn record_event_for_missing_vehicle_errors() {
  let s = store().await;
  let err = s
    .record_event(Uuid::new_v4(), fill(0, 1.0, FillKind::Full))
    .await
    .unwrap_err();
  assert!(matches!(err, crate::Error::VehicleNotFound(_)));
}

#[tokio::test]
async fn backdated_record_rewrites_successor_caches() {
  let s = store().await;
  let v = s.add_vehicle("Civic".into()).await.unwrap();
  s.record_event(v.vehicle_id, fill(0, 10_000.0, FillKind::Full)).await.unwrap();
  let last = s
    .record_event(v.vehicle_id, fill(2, 10_600.0, FillKind::Full))
    .await
    .unwrap();
  assert_eq!(last.efficiency(), Some(60.0));

  s.record_event(v.vehicle_id, fill(1, 10_300.0, FillKind::Partial)).await.unwrap();

  let loaded = s.get_vehicle(v.vehicle_id).await.unwrap().unwrap();
  let last = loaded.event(last.event_id).unwrap();
  assert_eq!(last.efficiency(), None);
  assert_eq!(last.cache.unwrap().distance, 300.0);
}

#[tokio::test]
async fn import_events_rebuilds_in_order() {
  let s = store().await;
  let v = s.add_vehicle("Transit".into()).await.unwrap();

  let imported = s
    .import_events(v.vehicle_id, vec![
      fill(2, 10_600.0, FillKind::Full),
      fill(0, 10_000.0, FillKind::Full),
      fill(1, 10_300.0, FillKind::Reset),
    ])
    .await
    .unwrap();
  assert_eq!(imported.len(), 3);

  let loaded = s.get_vehicle(v.vehicle_id).await.unwrap().unwrap();
  let kinds: Vec<FillKind> = loaded.events.iter().map(|e| e.kind).collect();
  assert_eq!(kinds, [FillKind::Full, FillKind::Reset, FillKind::Full]);
  assert_eq!(loaded.events[1].efficiency(), None);
  assert_eq!(loaded.events[2].efficiency(), Some(30.0));
  assert_eq!(loaded.aggregate.record_count, 3);
}

#[tokio::test]
async fn record_after_reload_continues_sequence() {
  let s = store().await;
  let v = s.add_vehicle("Transit".into()).await.unwrap();
  s.import_events(v.vehicle_id, vec![
    fill(0, 10_000.0, FillKind::Full),
    fill(1, 10_300.0, FillKind::Full),
  ])
  .await
  .unwrap();

  let third = s
    .record_event(v.vehicle_id, fill(2, 10_600.0, FillKind::Full))
    .await
    .unwrap();
  assert_eq!(third.seq, 2);

  let loaded = s.get_vehicle(v.vehicle_id).await.unwrap().unwrap();
  let seqs: Vec<u64> = loaded.events.iter().map(|e| e.seq).collect();
  assert_eq!(seqs, [0, 1, 2]);
}

// ─── Edit and delete ─────────────────────────────────────────────────────────

#[tokio::test]
async fn edit_event_recalculates_everything() {
  let s = store().await;
  let v = s.add_vehicle("Civic".into()).await.unwrap();
  let events = s
    .import_events(v.vehicle_id, vec![
      fill(0, 10_000.0, FillKind::Full),
      fill(1, 10_300.0, FillKind::Full),
      fill(2, 10_600.0, FillKind::Full),
    ])
    .await
    .unwrap();

  let patch = EventPatch { kind: Some(FillKind::Partial), ..EventPatch::default() };
  let edited = s.edit_event(events[1].event_id, patch).await.unwrap();
  assert_eq!(edited.kind, FillKind::Partial);

  let loaded = s.get_vehicle(v.vehicle_id).await.unwrap().unwrap();
  assert_eq!(loaded.event(events[1].event_id).unwrap().kind, FillKind::Partial);
  assert_eq!(loaded.event(events[2].event_id).unwrap().efficiency(), None);
  assert_eq!(loaded.aggregate.best_efficiency, None);
  assert_eq!(loaded.aggregate.average_efficiency, Some(600.0 / 30.0));
}

#[tokio::test]
async fn delete_event_recalculates_everything() {
  let s = store().await;
  let v = s.add_vehicle("Civic".into()).await.unwrap();
  let events = s
    .import_events(v.vehicle_id, vec![
      fill(0, 10_000.0, FillKind::Full),
      fill(1, 10_300.0, FillKind::Partial),
      fill(2, 10_600.0, FillKind::Full),
    ])
    .await
    .unwrap();

  let removed = s.delete_event(events[1].event_id).await.unwrap();
  assert_eq!(removed.event_id, events[1].event_id);

  let loaded = s.get_vehicle(v.vehicle_id).await.unwrap().unwrap();
  assert_eq!(loaded.events.len(), 2);
  assert_eq!(loaded.aggregate.record_count, 2);
  assert_eq!(loaded.event(events[2].event_id).unwrap().efficiency(), Some(60.0));
}

#[tokio::test]
async fn delete_missing_event_errors() {
  let s = store().await;
  let err = s.delete_event(Uuid::new_v4()).await.unwrap_err();
  assert!(matches!(err, crate::Error::EventNotFound(_)));
}

// ─── Freshness ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn out_of_band_change_is_rebuilt_on_read() {
  let s = store().await;
  let v = s.add_vehicle("Civic".into()).await.unwrap();
  s.import_events(v.vehicle_id, vec![
    fill(0, 10_000.0, FillKind::Full),
    fill(1, 10_300.0, FillKind::Full),
  ])
  .await
  .unwrap();

  // An out-of-band write leaves the cached count disagreeing with the rows.
  s.execute_batch("UPDATE aggregates SET record_count = 7")
    .await
    .unwrap();

  let loaded = s.get_vehicle(v.vehicle_id).await.unwrap().unwrap();
  assert_eq!(loaded.aggregate.record_count, 2);

  // The rebuilt aggregate was written back.
  let reloaded = s.get_vehicle(v.vehicle_id).await.unwrap().unwrap();
  assert_eq!(reloaded.aggregate.last_updated, loaded.aggregate.last_updated);
}

#[tokio::test]
async fn missing_aggregate_row_is_rebuilt() {
  let s = store().await;
  let v = s.add_vehicle("Civic".into()).await.unwrap();
  s.import_events(v.vehicle_id, vec![
    fill(0, 10_000.0, FillKind::Full),
    fill(1, 10_250.0, FillKind::Full),
  ])
  .await
  .unwrap();
  s.execute_batch("DELETE FROM aggregates").await.unwrap();

  let loaded = s.get_vehicle(v.vehicle_id).await.unwrap().unwrap();
  assert!(loaded.is_fresh());
  assert_eq!(loaded.aggregate.average_efficiency, Some(25.0));
}

#[tokio::test]
async fn explicit_recalculate_returns_aggregate() {
  let s = store().await;
  let v = s.add_vehicle("Civic".into()).await.unwrap();
  s.import_events(v.vehicle_id, vec![
    fill(0, 10_000.0, FillKind::Full),
    fill(1, 10_400.0, FillKind::Full),
  ])
  .await
  .unwrap();

  let aggregate = s.recalculate(v.vehicle_id).await.unwrap();
  assert_eq!(aggregate.record_count, 2);
  assert_eq!(aggregate.best_efficiency, Some(40.0));
  assert_eq!(aggregate.total_cost, Some(65.0));
}
