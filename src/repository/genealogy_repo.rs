// ==========================================
// Production Output Core - lot genealogy repository
// ==========================================
// Genealogy edges are append-only; this repository reads the graph.
// Edge writes happen exclusively inside the registration write set.
// ==========================================

use crate::domain::genealogy::GenealogyLink;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::parse_ts;
use rusqlite::{params, Connection};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

pub struct GenealogyRepository {
    conn: Arc<Mutex<Connection>>,
}

impl GenealogyRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// Direct parents of a lot
    pub fn find_parents(&self, child_lp_id: &str, org_id: &str) -> RepositoryResult<Vec<GenealogyLink>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT id, org_id, parent_lp_id, child_lp_id, wo_id, created_at
               FROM lp_genealogy
               WHERE child_lp_id = ? AND org_id = ?
               ORDER BY created_at ASC, id ASC"#,
        )?;

        let links = stmt
            .query_map(params![child_lp_id, org_id], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(links)
    }

    /// All edges written for a work order
    pub fn find_by_wo(&self, wo_id: &str, org_id: &str) -> RepositoryResult<Vec<GenealogyLink>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT id, org_id, parent_lp_id, child_lp_id, wo_id, created_at
               FROM lp_genealogy
               WHERE wo_id = ? AND org_id = ?
               ORDER BY created_at ASC, id ASC"#,
        )?;

        let links = stmt
            .query_map(params![wo_id, org_id], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(links)
    }

    /// Transitive upstream trace: every ancestor lot id that contributed to
    /// the given lot, walking parent edges breadth-first. The starting lot
    /// itself is not included. Cycles cannot occur in well-formed data
    /// (children are always created after their parents) but the visited
    /// set keeps the walk terminating regardless.
    pub fn trace_ancestors(&self, lp_id: &str, org_id: &str) -> RepositoryResult<Vec<String>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            "SELECT parent_lp_id FROM lp_genealogy WHERE child_lp_id = ? AND org_id = ?",
        )?;

        let mut visited: HashSet<String> = HashSet::new();
        let mut frontier: Vec<String> = vec![lp_id.to_string()];
        let mut ancestors: Vec<String> = Vec::new();

        while let Some(current) = frontier.pop() {
            let parents = stmt
                .query_map(params![&current, org_id], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;

            for parent in parents {
                if visited.insert(parent.clone()) {
                    ancestors.push(parent.clone());
                    frontier.push(parent);
                }
            }
        }

        Ok(ancestors)
    }

    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<GenealogyLink> {
        Ok(GenealogyLink {
            id: row.get(0)?,
            org_id: row.get(1)?,
            parent_lp_id: row.get(2)?,
            child_lp_id: row.get(3)?,
            wo_id: row.get(4)?,
            created_at: parse_ts(5, &row.get::<_, String>(5)?)?,
        })
    }
}
