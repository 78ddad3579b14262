// ==========================================
// Production Output Core - SQLite connection setup
// ==========================================
// Goals:
// - Unify PRAGMA behavior across every Connection::open call so that
//   foreign keys are enforced on all connections, not just some
// - Unify busy_timeout to reduce sporadic busy errors under concurrent writes
// ==========================================

use rusqlite::Connection;
use std::time::Duration;

/// Default busy_timeout (milliseconds)
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Apply the unified PRAGMA set to a SQLite connection
///
/// Note:
/// - foreign_keys must be enabled per connection
/// - busy_timeout must be configured per connection
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// Open a SQLite connection with the unified configuration applied
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// Create the production-core schema if it does not exist.
///
/// Five tables: work_orders, wo_material_reservations, license_plates,
/// wo_consumptions, lp_genealogy. Counters (`output_qty`, `consumed_qty`)
/// are guarded optimistically by the registration write set; genealogy rows
/// are append-only by design (no UPDATE path exists in this crate).
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS work_orders (
            id              TEXT PRIMARY KEY,
            org_id          TEXT NOT NULL,
            wo_number       TEXT NOT NULL,
            status          TEXT NOT NULL,
            product_id      TEXT NOT NULL,
            planned_qty     REAL NOT NULL,
            output_qty      REAL NOT NULL DEFAULT 0,
            uom             TEXT NOT NULL,
            batch_number    TEXT,
            created_at      TEXT NOT NULL,
            updated_at      TEXT NOT NULL,
            UNIQUE(org_id, wo_number)
        );

        CREATE TABLE IF NOT EXISTS license_plates (
            id                           TEXT PRIMARY KEY,
            org_id                       TEXT NOT NULL,
            lp_number                    TEXT NOT NULL UNIQUE,
            product_id                   TEXT NOT NULL,
            quantity                     REAL NOT NULL,
            uom                          TEXT NOT NULL,
            qa_status                    TEXT NOT NULL,
            batch_number                 TEXT,
            source_wo_id                 TEXT REFERENCES work_orders(id),
            is_over_production           INTEGER NOT NULL DEFAULT 0,
            over_production_parent_lp_id TEXT REFERENCES license_plates(id),
            created_at                   TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS wo_material_reservations (
            id              TEXT PRIMARY KEY,
            org_id          TEXT NOT NULL,
            wo_id           TEXT NOT NULL REFERENCES work_orders(id) ON DELETE CASCADE,
            lp_id           TEXT NOT NULL REFERENCES license_plates(id),
            reserved_qty    REAL NOT NULL,
            consumed_qty    REAL NOT NULL DEFAULT 0,
            uom             TEXT NOT NULL,
            sequence_number INTEGER NOT NULL,
            status          TEXT NOT NULL,
            created_at      TEXT NOT NULL,
            updated_at      TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_reservations_wo
            ON wo_material_reservations(wo_id, sequence_number);

        CREATE TABLE IF NOT EXISTS wo_consumptions (
            id             TEXT PRIMARY KEY,
            org_id         TEXT NOT NULL,
            wo_id          TEXT NOT NULL REFERENCES work_orders(id),
            reservation_id TEXT NOT NULL REFERENCES wo_material_reservations(id),
            input_lp_id    TEXT NOT NULL REFERENCES license_plates(id),
            output_lp_id   TEXT NOT NULL REFERENCES license_plates(id),
            qty_drawn      REAL NOT NULL,
            consumed_at    TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_consumptions_output
            ON wo_consumptions(output_lp_id);

        CREATE TABLE IF NOT EXISTS lp_genealogy (
            id           TEXT PRIMARY KEY,
            org_id       TEXT NOT NULL,
            parent_lp_id TEXT NOT NULL REFERENCES license_plates(id),
            child_lp_id  TEXT NOT NULL REFERENCES license_plates(id),
            wo_id        TEXT NOT NULL REFERENCES work_orders(id),
            created_at   TEXT NOT NULL,
            UNIQUE(parent_lp_id, child_lp_id)
        );

        CREATE INDEX IF NOT EXISTS idx_genealogy_child
            ON lp_genealogy(child_lp_id);
        "#,
    )
}
