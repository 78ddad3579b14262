// ==========================================
// Production Output Core - work order entity
// ==========================================
// Invariant: output_qty is monotonically non-decreasing and is only
// mutated by the output registrar while status is in_progress.
// ==========================================

use crate::domain::types::WoStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A unit of planned production.
///
/// Created by planning; moves to `in_progress` when production starts and
/// to `completed` when closed (not necessarily at planned quantity).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkOrder {
    pub id: String,
    pub org_id: String,
    pub wo_number: String,
    pub status: WoStatus,
    pub product_id: String,
    pub planned_qty: f64,
    /// Cumulative registered output across all committed registrations
    pub output_qty: f64,
    pub uom: String,
    /// Default batch for output lots when the caller supplies none
    pub batch_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkOrder {
    /// Whether output registration is currently legal for this work order
    pub fn accepts_output(&self) -> bool {
        self.status == WoStatus::InProgress
    }

    /// Progress percentage against planned quantity. May exceed 100 when
    /// over-production has been registered.
    pub fn progress_percent(&self) -> f64 {
        if self.planned_qty <= 0.0 {
            return 0.0;
        }
        (self.output_qty / self.planned_qty * 100.0 * 100.0).round() / 100.0
    }

    /// Quantity still to produce; clamps at zero for over-production.
    pub fn remaining_qty(&self) -> f64 {
        (self.planned_qty - self.output_qty).max(0.0)
    }
}
