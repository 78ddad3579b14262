// ==========================================
// Production Output Core - license plate repository
// ==========================================
// Lot lookups and inserts. LP numbers follow LP-YYYYMMDD-NNNN with a
// per-day sequence; the number for a production output is assigned
// inside the registration transaction, not here.
// ==========================================

use crate::domain::license_plate::LicensePlate;
use crate::domain::types::QaStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{fmt_ts, parse_ts};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

pub struct LicensePlateRepository {
    conn: Arc<Mutex<Connection>>,
}

impl LicensePlateRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// Insert a lot (stock intake / test seeding; production outputs are
    /// inserted by the registration write set)
    pub fn create(&self, lp: &LicensePlate) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        insert_lp(&conn, lp)?;
        Ok(lp.id.clone())
    }

    /// Find a lot by id within the caller's organization
    pub fn find_by_id(&self, lp_id: &str, org_id: &str) -> RepositoryResult<Option<LicensePlate>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            r#"SELECT id, org_id, lp_number, product_id, quantity, uom,
                      qa_status, batch_number, source_wo_id,
                      is_over_production, over_production_parent_lp_id, created_at
               FROM license_plates
               WHERE id = ? AND org_id = ?"#,
            params![lp_id, org_id],
            map_lp_row,
        ) {
            Ok(lp) => Ok(Some(lp)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List production outputs registered for a work order, newest first.
    pub fn list_outputs_for_wo(&self, wo_id: &str, org_id: &str) -> RepositoryResult<Vec<LicensePlate>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT id, org_id, lp_number, product_id, quantity, uom,
                      qa_status, batch_number, source_wo_id,
                      is_over_production, over_production_parent_lp_id, created_at
               FROM license_plates
               WHERE source_wo_id = ? AND org_id = ?
               ORDER BY created_at DESC, lp_number DESC"#,
        )?;

        let lots = stmt
            .query_map(params![wo_id, org_id], map_lp_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(lots)
    }
}

/// Insert helper shared with the registration write set (runs on whatever
/// connection/transaction the caller already holds).
pub(crate) fn insert_lp(conn: &Connection, lp: &LicensePlate) -> rusqlite::Result<()> {
    conn.execute(
        r#"INSERT INTO license_plates (
            id, org_id, lp_number, product_id, quantity, uom,
            qa_status, batch_number, source_wo_id,
            is_over_production, over_production_parent_lp_id, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        params![
            &lp.id,
            &lp.org_id,
            &lp.lp_number,
            &lp.product_id,
            lp.quantity,
            &lp.uom,
            lp.qa_status.to_db_str(),
            &lp.batch_number,
            &lp.source_wo_id,
            lp.is_over_production as i64,
            &lp.over_production_parent_lp_id,
            fmt_ts(&lp.created_at),
        ],
    )?;
    Ok(())
}

/// Next LP number for the given day: LP-YYYYMMDD-NNNN.
///
/// Counts existing same-day numbers on the caller's connection so that,
/// when called inside the registration transaction, assignment and insert
/// are atomic (the UNIQUE constraint backstops racing connections).
pub(crate) fn next_lp_number(conn: &Connection, now: &DateTime<Utc>) -> rusqlite::Result<String> {
    let day = now.format("%Y%m%d").to_string();
    let prefix = format!("LP-{day}-");

    let existing: i64 = conn.query_row(
        "SELECT COUNT(*) FROM license_plates WHERE lp_number LIKE ?",
        params![format!("{prefix}%")],
        |row| row.get(0),
    )?;

    Ok(format!("{prefix}{:04}", existing + 1))
}

pub(crate) fn map_lp_row(row: &rusqlite::Row) -> rusqlite::Result<LicensePlate> {
    let qa_str: String = row.get(6)?;
    let over_prod: i64 = row.get(9)?;
    Ok(LicensePlate {
        id: row.get(0)?,
        org_id: row.get(1)?,
        lp_number: row.get(2)?,
        product_id: row.get(3)?,
        quantity: row.get(4)?,
        uom: row.get(5)?,
        qa_status: QaStatus::from_str(&qa_str),
        batch_number: row.get(7)?,
        source_wo_id: row.get(8)?,
        is_over_production: over_prod != 0,
        over_production_parent_lp_id: row.get(10)?,
        created_at: parse_ts(11, &row.get::<_, String>(11)?)?,
    })
}
