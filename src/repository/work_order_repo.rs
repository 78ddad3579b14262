// ==========================================
// Production Output Core - work order repository
// ==========================================
// Lookups are org-scoped: a work order belonging to another organization
// behaves exactly like an absent one (returns None). The core never
// distinguishes "forbidden" from "absent".
// ==========================================

use crate::domain::types::WoStatus;
use crate::domain::work_order::WorkOrder;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{fmt_ts, parse_ts};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

pub struct WorkOrderRepository {
    conn: Arc<Mutex<Connection>>,
}

impl WorkOrderRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// Create a work order (planning-side seeding; not part of registration)
    pub fn create(&self, wo: &WorkOrder) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO work_orders (
                id, org_id, wo_number, status, product_id,
                planned_qty, output_qty, uom, batch_number,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &wo.id,
                &wo.org_id,
                &wo.wo_number,
                wo.status.to_db_str(),
                &wo.product_id,
                wo.planned_qty,
                wo.output_qty,
                &wo.uom,
                &wo.batch_number,
                fmt_ts(&wo.created_at),
                fmt_ts(&wo.updated_at),
            ],
        )?;

        Ok(wo.id.clone())
    }

    /// Find a work order by id within the caller's organization
    ///
    /// # Returns
    /// - `Ok(Some(WorkOrder))`: found and org-visible
    /// - `Ok(None)`: absent, or belongs to another organization
    pub fn find_by_id(&self, wo_id: &str, org_id: &str) -> RepositoryResult<Option<WorkOrder>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            r#"SELECT id, org_id, wo_number, status, product_id,
                      planned_qty, output_qty, uom, batch_number,
                      created_at, updated_at
               FROM work_orders
               WHERE id = ? AND org_id = ?"#,
            params![wo_id, org_id],
            Self::map_row,
        ) {
            Ok(wo) => Ok(Some(wo)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Update work order status (lifecycle transitions owned by planning)
    pub fn update_status(&self, wo_id: &str, org_id: &str, status: WoStatus) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let rows_affected = conn.execute(
            "UPDATE work_orders SET status = ?, updated_at = datetime('now') WHERE id = ? AND org_id = ?",
            params![status.to_db_str(), wo_id, org_id],
        )?;

        if rows_affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "WorkOrder".to_string(),
                id: wo_id.to_string(),
            });
        }

        Ok(())
    }

    /// Count production output lots registered for a work order
    pub fn count_outputs(&self, wo_id: &str, org_id: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM license_plates WHERE source_wo_id = ? AND org_id = ?",
            params![wo_id, org_id],
            |row| row.get(0),
        )?;

        Ok(count)
    }

    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<WorkOrder> {
        let status_str: String = row.get(3)?;
        Ok(WorkOrder {
            id: row.get(0)?,
            org_id: row.get(1)?,
            wo_number: row.get(2)?,
            status: WoStatus::from_str(&status_str),
            product_id: row.get(4)?,
            planned_qty: row.get(5)?,
            output_qty: row.get(6)?,
            uom: row.get(7)?,
            batch_number: row.get(8)?,
            created_at: parse_ts(9, &row.get::<_, String>(9)?)?,
            updated_at: parse_ts(10, &row.get::<_, String>(10)?)?,
        })
    }
}
