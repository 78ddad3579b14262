// ==========================================
// Production Output Core - consumption record entity
// ==========================================
// Immutable debit entry linking one reservation (hence one input lot)
// to one output lot. Written only by the output registrar, atomically
// with the output lot it references.
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumptionRecord {
    pub id: String,
    pub org_id: String,
    pub wo_id: String,
    pub reservation_id: String,
    pub input_lp_id: String,
    pub output_lp_id: String,
    pub qty_drawn: f64,
    pub consumed_at: DateTime<Utc>,
}
