// ==========================================
// Production Output Core - registration write set
// ==========================================
// The one place that mutates reservation consumed quantities and the
// work order output counter. Everything happens in a single transaction:
// output lot insert, consumption debits, guarded reservation updates,
// genealogy edges, guarded counter update. Any failure rolls the whole
// set back; nothing above this layer can observe a partial registration.
//
// Concurrency: optimistic. Every counter mutation carries a
// WHERE <counter> = <expected> guard; zero affected rows aborts with
// StaleCounter and the caller re-plans against fresh state.
// ==========================================

use crate::domain::consumption::ConsumptionRecord;
use crate::domain::license_plate::LicensePlate;
use crate::domain::types::ReservationStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::license_plate_repo::{insert_lp, next_lp_number};
use crate::repository::fmt_ts;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};
use tracing::debug;
use uuid::Uuid;

/// One reservation drawdown within a registration.
///
/// `expected_consumed_qty` is the consumed counter the allocation plan was
/// computed against; the update is guarded on it.
#[derive(Debug, Clone)]
pub struct ReservationDraw {
    pub reservation_id: String,
    pub input_lp_id: String,
    pub qty_drawn: f64,
    pub expected_consumed_qty: f64,
    pub new_consumed_qty: f64,
    pub new_status: ReservationStatus,
}

/// The full write set of one output registration.
#[derive(Debug, Clone)]
pub struct RegistrationWriteSet {
    pub org_id: String,
    pub wo_id: String,
    /// Output lot to insert. `lp_number` is assigned inside the transaction.
    pub output: LicensePlate,
    pub draws: Vec<ReservationDraw>,
    /// Distinct parent lot ids, one genealogy edge each
    pub genealogy_parents: Vec<String>,
    /// Work order output counter the plan was computed against (guard)
    pub expected_output_qty: f64,
    pub registered_qty: f64,
}

/// What a committed registration wrote.
#[derive(Debug, Clone)]
pub struct CommittedRegistration {
    pub output: LicensePlate,
    pub consumption_records: Vec<ConsumptionRecord>,
    pub genealogy_written: usize,
}

pub struct RegistrationRepository {
    conn: Arc<Mutex<Connection>>,
}

impl RegistrationRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// Commit a registration write set atomically.
    ///
    /// # Errors
    /// - `StaleCounter`: a guarded counter moved since the plan was computed;
    ///   the caller should reload state, re-plan and retry
    /// - `NotFound`: a referenced work order or reservation is gone
    /// - any storage error: the transaction is rolled back in full
    pub fn commit(
        &self,
        write_set: &RegistrationWriteSet,
        now: DateTime<Utc>,
    ) -> RepositoryResult<CommittedRegistration> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        // 1. Output lot, with its number assigned in-transaction
        let mut output = write_set.output.clone();
        output.lp_number = next_lp_number(&tx, &now)?;
        insert_lp(&tx, &output)?;

        // 2. Consumption debits + guarded reservation updates
        let mut consumption_records = Vec::with_capacity(write_set.draws.len());
        for draw in &write_set.draws {
            let record = ConsumptionRecord {
                id: Uuid::new_v4().to_string(),
                org_id: write_set.org_id.clone(),
                wo_id: write_set.wo_id.clone(),
                reservation_id: draw.reservation_id.clone(),
                input_lp_id: draw.input_lp_id.clone(),
                output_lp_id: output.id.clone(),
                qty_drawn: draw.qty_drawn,
                consumed_at: now,
            };

            tx.execute(
                r#"INSERT INTO wo_consumptions (
                    id, org_id, wo_id, reservation_id, input_lp_id,
                    output_lp_id, qty_drawn, consumed_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
                params![
                    &record.id,
                    &record.org_id,
                    &record.wo_id,
                    &record.reservation_id,
                    &record.input_lp_id,
                    &record.output_lp_id,
                    record.qty_drawn,
                    fmt_ts(&record.consumed_at),
                ],
            )?;

            let rows_affected = tx.execute(
                r#"UPDATE wo_material_reservations
                   SET consumed_qty = ?, status = ?, updated_at = ?
                   WHERE id = ? AND org_id = ? AND consumed_qty = ?"#,
                params![
                    draw.new_consumed_qty,
                    draw.new_status.to_db_str(),
                    fmt_ts(&now),
                    &draw.reservation_id,
                    &write_set.org_id,
                    draw.expected_consumed_qty,
                ],
            )?;

            if rows_affected == 0 {
                return Err(Self::diagnose_stale(
                    &tx,
                    "MaterialReservation",
                    &draw.reservation_id,
                    "SELECT consumed_qty FROM wo_material_reservations WHERE id = ?",
                    draw.expected_consumed_qty,
                ));
            }

            consumption_records.push(record);
        }

        // 3. Genealogy edges, one per distinct parent lot
        for parent_lp_id in &write_set.genealogy_parents {
            tx.execute(
                r#"INSERT INTO lp_genealogy (
                    id, org_id, parent_lp_id, child_lp_id, wo_id, created_at
                ) VALUES (?, ?, ?, ?, ?, ?)"#,
                params![
                    Uuid::new_v4().to_string(),
                    &write_set.org_id,
                    parent_lp_id,
                    &output.id,
                    &write_set.wo_id,
                    fmt_ts(&now),
                ],
            )?;
        }

        // 4. Guarded cumulative counter update; also re-checks in_progress
        let rows_affected = tx.execute(
            r#"UPDATE work_orders
               SET output_qty = output_qty + ?, updated_at = ?
               WHERE id = ? AND org_id = ?
                 AND output_qty = ? AND status = 'in_progress'"#,
            params![
                write_set.registered_qty,
                fmt_ts(&now),
                &write_set.wo_id,
                &write_set.org_id,
                write_set.expected_output_qty,
            ],
        )?;

        if rows_affected == 0 {
            return Err(Self::diagnose_stale(
                &tx,
                "WorkOrder",
                &write_set.wo_id,
                "SELECT output_qty FROM work_orders WHERE id = ?",
                write_set.expected_output_qty,
            ));
        }

        tx.commit()?;

        debug!(
            wo_id = %write_set.wo_id,
            output_lp = %output.lp_number,
            draws = consumption_records.len(),
            genealogy = write_set.genealogy_parents.len(),
            "registration committed"
        );

        Ok(CommittedRegistration {
            output,
            consumption_records,
            genealogy_written: write_set.genealogy_parents.len(),
        })
    }

    /// Zero rows affected on a guarded update: distinguish a moved counter
    /// from a vanished row. The open transaction is rolled back on drop.
    fn diagnose_stale(
        tx: &rusqlite::Transaction<'_>,
        entity: &str,
        id: &str,
        probe_sql: &str,
        expected: f64,
    ) -> RepositoryError {
        match tx.query_row(probe_sql, params![id], |row| row.get::<_, f64>(0)) {
            Ok(actual) => RepositoryError::StaleCounter {
                entity: entity.to_string(),
                id: id.to_string(),
                expected,
                actual,
            },
            Err(_) => RepositoryError::NotFound {
                entity: entity.to_string(),
                id: id.to_string(),
            },
        }
    }
}
