// ==========================================
// Production Output Core - license plate (lot) entity
// ==========================================
// A uniquely identified, quantity-bearing unit of physical inventory.
// Quantity is immutable once created; corrections are new transactions.
// ==========================================

use crate::domain::types::QaStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LicensePlate {
    pub id: String,
    pub org_id: String,
    pub lp_number: String,
    pub product_id: String,
    pub quantity: f64,
    pub uom: String,
    pub qa_status: QaStatus,
    pub batch_number: Option<String>,
    /// Work order that produced this lot, when source is production
    pub source_wo_id: Option<String>,
    pub is_over_production: bool,
    /// Parent lot this over-production output is attributed to
    pub over_production_parent_lp_id: Option<String>,
    pub created_at: DateTime<Utc>,
}
