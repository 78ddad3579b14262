// ==========================================
// Test helpers
// ==========================================
// Temp-file databases, repository wiring, and row seeding shared by the
// integration tests.
// ==========================================

#![allow(dead_code)]

use production_core::api::OutputApi;
use production_core::db;
use production_core::repository::{
    GenealogyRepository, LicensePlateRepository, RegistrationRepository, ReservationRepository,
    WorkOrderRepository,
};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

pub const ORG: &str = "org-a";
pub const OTHER_ORG: &str = "org-b";

/// Create a temp database with the schema applied.
/// The NamedTempFile must stay alive for the duration of the test.
pub fn create_test_db() -> (NamedTempFile, String) {
    let temp_file = NamedTempFile::new().unwrap();
    let db_path = temp_file.path().to_str().unwrap().to_string();

    let conn = db::open_sqlite_connection(&db_path).unwrap();
    db::init_schema(&conn).unwrap();

    (temp_file, db_path)
}

pub fn open_shared_conn(db_path: &str) -> Arc<Mutex<Connection>> {
    Arc::new(Mutex::new(db::open_sqlite_connection(db_path).unwrap()))
}

/// Wire a full OutputApi over one shared connection.
pub fn build_api(conn: &Arc<Mutex<Connection>>) -> OutputApi {
    OutputApi::new(
        Arc::new(WorkOrderRepository::new(conn.clone())),
        Arc::new(ReservationRepository::new(conn.clone())),
        Arc::new(LicensePlateRepository::new(conn.clone())),
        Arc::new(GenealogyRepository::new(conn.clone())),
        Arc::new(RegistrationRepository::new(conn.clone())),
    )
}

// ==========================================
// Row seeding
// ==========================================

pub const TS: &str = "2026-08-01 08:00:00";

pub fn insert_work_order(
    conn: &Arc<Mutex<Connection>>,
    id: &str,
    org_id: &str,
    status: &str,
    planned_qty: f64,
    output_qty: f64,
) {
    let conn = conn.lock().unwrap();
    conn.execute(
        r#"
        INSERT INTO work_orders
            (id, org_id, wo_number, status, product_id, planned_qty, output_qty,
             uom, batch_number, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, 'prod-1', ?5, ?6, 'kg', 'BATCH-01', ?7, ?7)
        "#,
        params![id, org_id, format!("WO-{}", id), status, planned_qty, output_qty, TS],
    )
    .unwrap();
}

pub fn insert_lp(conn: &Arc<Mutex<Connection>>, id: &str, org_id: &str, quantity: f64) {
    insert_lp_at(conn, id, org_id, quantity, TS);
}

/// Seed a lot with an explicit lp_number (for daily-sequence collisions)
pub fn insert_lp_numbered(
    conn: &Arc<Mutex<Connection>>,
    id: &str,
    org_id: &str,
    lp_number: &str,
    quantity: f64,
) {
    let conn = conn.lock().unwrap();
    conn.execute(
        r#"
        INSERT INTO license_plates
            (id, org_id, lp_number, product_id, quantity, uom, qa_status,
             batch_number, source_wo_id, is_over_production,
             over_production_parent_lp_id, created_at)
        VALUES (?1, ?2, ?3, 'mat-1', ?4, 'kg', 'approved', NULL, NULL, 0, NULL, ?5)
        "#,
        params![id, org_id, lp_number, quantity, TS],
    )
    .unwrap();
}

pub fn insert_lp_at(
    conn: &Arc<Mutex<Connection>>,
    id: &str,
    org_id: &str,
    quantity: f64,
    created_at: &str,
) {
    let conn = conn.lock().unwrap();
    conn.execute(
        r#"
        INSERT INTO license_plates
            (id, org_id, lp_number, product_id, quantity, uom, qa_status,
             batch_number, source_wo_id, is_over_production,
             over_production_parent_lp_id, created_at)
        VALUES (?1, ?2, ?3, 'mat-1', ?4, 'kg', 'approved', NULL, NULL, 0, NULL, ?5)
        "#,
        params![id, org_id, format!("IN-{}", id), quantity, created_at],
    )
    .unwrap();
}

#[allow(clippy::too_many_arguments)]
pub fn insert_reservation(
    conn: &Arc<Mutex<Connection>>,
    id: &str,
    org_id: &str,
    wo_id: &str,
    lp_id: &str,
    reserved_qty: f64,
    consumed_qty: f64,
    sequence_number: i64,
    status: &str,
) {
    let conn = conn.lock().unwrap();
    conn.execute(
        r#"
        INSERT INTO wo_material_reservations
            (id, org_id, wo_id, lp_id, reserved_qty, consumed_qty, uom,
             sequence_number, status, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'kg', ?7, ?8, ?9, ?9)
        "#,
        params![id, org_id, wo_id, lp_id, reserved_qty, consumed_qty, sequence_number, status, TS],
    )
    .unwrap();
}

// ==========================================
// Assertion helpers
// ==========================================

pub fn count_rows(conn: &Arc<Mutex<Connection>>, table: &str) -> i64 {
    let conn = conn.lock().unwrap();
    conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
        row.get(0)
    })
    .unwrap()
}

pub fn reservation_consumed(conn: &Arc<Mutex<Connection>>, id: &str) -> f64 {
    let conn = conn.lock().unwrap();
    conn.query_row(
        "SELECT consumed_qty FROM wo_material_reservations WHERE id = ?1",
        params![id],
        |row| row.get(0),
    )
    .unwrap()
}

pub fn reservation_status(conn: &Arc<Mutex<Connection>>, id: &str) -> String {
    let conn = conn.lock().unwrap();
    conn.query_row(
        "SELECT status FROM wo_material_reservations WHERE id = ?1",
        params![id],
        |row| row.get(0),
    )
    .unwrap()
}

pub fn wo_output_qty(conn: &Arc<Mutex<Connection>>, id: &str) -> f64 {
    let conn = conn.lock().unwrap();
    conn.query_row(
        "SELECT output_qty FROM work_orders WHERE id = ?1",
        params![id],
        |row| row.get(0),
    )
    .unwrap()
}

/// Standard fixture: one in_progress work order with a three-entry
/// reservation queue (reserved 30 / 20 / 50 in sequence order).
pub fn seed_standard_wo(conn: &Arc<Mutex<Connection>>, wo_id: &str) {
    insert_work_order(conn, wo_id, ORG, "in_progress", 100.0, 0.0);
    insert_lp(conn, "lp-1", ORG, 30.0);
    insert_lp(conn, "lp-2", ORG, 20.0);
    insert_lp(conn, "lp-3", ORG, 50.0);
    insert_reservation(conn, "res-1", ORG, wo_id, "lp-1", 30.0, 0.0, 10, "active");
    insert_reservation(conn, "res-2", ORG, wo_id, "lp-2", 20.0, 0.0, 20, "active");
    insert_reservation(conn, "res-3", ORG, wo_id, "lp-3", 50.0, 0.0, 30, "active");
}
