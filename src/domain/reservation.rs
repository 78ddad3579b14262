// ==========================================
// Production Output Core - material reservation entity
// ==========================================
// One row per input lot earmarked for a work order. sequence_number
// establishes the consumption order (ascending). consumed_qty is mutated
// only by the committed result of the allocation calculator.
// ==========================================

use crate::domain::types::ReservationStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An earmarking of a specific lot's quantity for a specific work order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialReservation {
    pub id: String,
    pub org_id: String,
    pub wo_id: String,
    pub lp_id: String,
    pub reserved_qty: f64,
    /// Total drawn so far across all committed registrations.
    /// May exceed reserved_qty only after an explicitly confirmed over-draw.
    pub consumed_qty: f64,
    pub uom: String,
    pub sequence_number: i64,
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MaterialReservation {
    /// Quantity still available to draw from this reservation
    pub fn available_qty(&self) -> f64 {
        (self.reserved_qty - self.consumed_qty).max(0.0)
    }
}
