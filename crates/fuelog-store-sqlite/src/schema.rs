//! SQL schema for the fuelog SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS vehicles (
    vehicle_id  TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

-- One row per fill-up. The cache_* columns are derived by the engine and
-- are all NULL while cache_computed = 0.
CREATE TABLE IF NOT EXISTS events (
    event_id                TEXT PRIMARY KEY,
    vehicle_id              TEXT NOT NULL REFERENCES vehicles(vehicle_id) ON DELETE CASCADE,
    seq                     INTEGER NOT NULL,
    occurred_at             TEXT NOT NULL,   -- RFC 3339 UTC
    odometer                REAL NOT NULL,
    price                   REAL NOT NULL,
    quantity                REAL NOT NULL,
    cost                    REAL NOT NULL,
    fill_kind               TEXT NOT NULL,   -- 'full' | 'partial' | 'reset'
    note                    TEXT,
    cache_computed          INTEGER NOT NULL DEFAULT 0,
    cache_previous_odometer REAL,
    cache_distance          REAL,
    cache_efficiency        REAL,
    cache_cost_per_distance REAL
);

-- Cached per-vehicle statistics. A NULL last_updated means never computed.
CREATE TABLE IF NOT EXISTS aggregates (
    vehicle_id                TEXT PRIMARY KEY REFERENCES vehicles(vehicle_id) ON DELETE CASCADE,
    total_cost                REAL,
    total_distance            REAL,
    total_quantity            REAL,
    record_count              INTEGER NOT NULL DEFAULT 0,
    average_efficiency        REAL,
    average_cost_per_distance REAL,
    average_cost_per_event    REAL,
    average_price             REAL,
    best_efficiency           REAL,
    worst_efficiency          REAL,
    highest_price             REAL,
    lowest_price              REAL,
    last_updated              TEXT
);

CREATE INDEX IF NOT EXISTS events_vehicle_idx ON events(vehicle_id);

PRAGMA user_version = 1;
";
