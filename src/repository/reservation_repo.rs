// ==========================================
// Production Output Core - material reservation repository
// ==========================================
// The reservation queue is the single shared mutable resource of the
// registration path. This repository only reads it and seeds it; all
// consumed_qty mutations go through the registration write set.
// ==========================================

use crate::domain::reservation::MaterialReservation;
use crate::domain::types::ReservationStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{fmt_ts, parse_ts};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// Reservation joined with its lot's label, in consumption order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationWithLot {
    pub reservation: MaterialReservation,
    pub lp_number: String,
}

pub struct ReservationRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ReservationRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// Load the consumption queue for a work order.
    ///
    /// Includes `active` and `exhausted` reservations (`released` rows are
    /// never part of the queue), ordered by ascending sequence number.
    /// Equal sequence numbers are tie-broken by lot creation time, then by
    /// reservation id, so the walk order is deterministic.
    pub fn load_queue(&self, wo_id: &str, org_id: &str) -> RepositoryResult<Vec<ReservationWithLot>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT r.id, r.org_id, r.wo_id, r.lp_id, r.reserved_qty,
                      r.consumed_qty, r.uom, r.sequence_number, r.status,
                      r.created_at, r.updated_at, lp.lp_number
               FROM wo_material_reservations r
               JOIN license_plates lp ON lp.id = r.lp_id
               WHERE r.wo_id = ? AND r.org_id = ?
                 AND r.status IN ('active', 'exhausted')
               ORDER BY r.sequence_number ASC, lp.created_at ASC, r.id ASC"#,
        )?;

        let rows = stmt
            .query_map(params![wo_id, org_id], |row| {
                let status_str: String = row.get(8)?;
                Ok(ReservationWithLot {
                    reservation: MaterialReservation {
                        id: row.get(0)?,
                        org_id: row.get(1)?,
                        wo_id: row.get(2)?,
                        lp_id: row.get(3)?,
                        reserved_qty: row.get(4)?,
                        consumed_qty: row.get(5)?,
                        uom: row.get(6)?,
                        sequence_number: row.get(7)?,
                        status: ReservationStatus::from_str(&status_str),
                        created_at: parse_ts(9, &row.get::<_, String>(9)?)?,
                        updated_at: parse_ts(10, &row.get::<_, String>(10)?)?,
                    },
                    lp_number: row.get(11)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Create a reservation with the next sequence number for the work order.
    ///
    /// Sequence assignment happens in the same transaction as the insert so
    /// concurrent reservers cannot be handed the same number. Reservation
    /// creation itself belongs to the planning side; registration only reads.
    pub fn create_with_next_sequence(
        &self,
        reservation: &mut MaterialReservation,
    ) -> RepositoryResult<String> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let max_seq: Option<i64> = tx.query_row(
            "SELECT MAX(sequence_number) FROM wo_material_reservations WHERE wo_id = ?",
            params![&reservation.wo_id],
            |row| row.get(0),
        )?;

        reservation.sequence_number = max_seq.unwrap_or(0) + 1;

        tx.execute(
            r#"INSERT INTO wo_material_reservations (
                id, org_id, wo_id, lp_id, reserved_qty, consumed_qty,
                uom, sequence_number, status, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &reservation.id,
                &reservation.org_id,
                &reservation.wo_id,
                &reservation.lp_id,
                reservation.reserved_qty,
                reservation.consumed_qty,
                &reservation.uom,
                reservation.sequence_number,
                reservation.status.to_db_str(),
                fmt_ts(&reservation.created_at),
                fmt_ts(&reservation.updated_at),
            ],
        )?;

        tx.commit()?;
        Ok(reservation.id.clone())
    }

    /// Find one reservation by id (org-scoped)
    pub fn find_by_id(
        &self,
        reservation_id: &str,
        org_id: &str,
    ) -> RepositoryResult<Option<MaterialReservation>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            r#"SELECT id, org_id, wo_id, lp_id, reserved_qty, consumed_qty,
                      uom, sequence_number, status, created_at, updated_at
               FROM wo_material_reservations
               WHERE id = ? AND org_id = ?"#,
            params![reservation_id, org_id],
            Self::map_row,
        ) {
            Ok(r) => Ok(Some(r)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<MaterialReservation> {
        let status_str: String = row.get(8)?;
        Ok(MaterialReservation {
            id: row.get(0)?,
            org_id: row.get(1)?,
            wo_id: row.get(2)?,
            lp_id: row.get(3)?,
            reserved_qty: row.get(4)?,
            consumed_qty: row.get(5)?,
            uom: row.get(6)?,
            sequence_number: row.get(7)?,
            status: ReservationStatus::from_str(&status_str),
            created_at: parse_ts(9, &row.get::<_, String>(9)?)?,
            updated_at: parse_ts(10, &row.get::<_, String>(10)?)?,
        })
    }
}
