// ==========================================
// Production Output Core - genealogy link entity
// ==========================================
// Immutable parent->child lot edge. Never mutated or deleted
// (regulatory/audit requirement). One edge per distinct input lot an
// output consumed from, independent of quantity.
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenealogyLink {
    pub id: String,
    pub org_id: String,
    pub parent_lp_id: String,
    pub child_lp_id: String,
    pub wo_id: String,
    pub created_at: DateTime<Utc>,
}
