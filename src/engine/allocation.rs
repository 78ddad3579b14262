// ==========================================
// Production Output Core - allocation calculator
// ==========================================
// Pure sequence-order waterfall over a reservation queue snapshot.
// No side effects: the same computation backs the read-only preview
// and the commit path. The registrar persists the result; this engine
// never touches storage.
// ==========================================

use crate::repository::reservation_repo::ReservationWithLot;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

#[derive(Error, Debug)]
pub enum AllocationError {
    #[error("quantity must be greater than 0, got {0}")]
    InvalidQuantity(f64),
}

/// One drawdown proposed against one reservation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationLine {
    pub reservation_id: String,
    pub lp_id: String,
    pub lp_number: String,
    pub qty_drawn: f64,
}

/// Outcome of the waterfall over a queue snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationPlan {
    pub lines: Vec<AllocationLine>,
    pub requested_qty: f64,
    /// Sum of the queue's original reserved quantities
    pub total_reserved: f64,
    /// Work-order-wide consumption if this plan commits
    pub cumulative_after: f64,
    /// > 0 only when the request exceeded total availability
    pub remaining_unallocated: f64,
    pub is_over_consumption: bool,
}

impl AllocationPlan {
    /// Total quantity the plan draws across all lines
    pub fn total_drawn(&self) -> f64 {
        self.lines.iter().map(|l| l.qty_drawn).sum()
    }
}

// ==========================================
// AllocationCalculator
// ==========================================
pub struct AllocationCalculator;

impl AllocationCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Walk the queue in sequence order, drawing min(available, remaining)
    /// from each reservation until the request is covered or the queue is
    /// exhausted. Zero-quantity draws are not emitted.
    ///
    /// The queue must already be ordered (sequence number ascending, lot
    /// creation time then reservation id as tie-breaks); the repository
    /// guarantees this, which keeps the walk deterministic.
    #[instrument(skip(self, queue), fields(queue_len = queue.len()))]
    pub fn allocate(
        &self,
        queue: &[ReservationWithLot],
        requested_qty: f64,
    ) -> Result<AllocationPlan, AllocationError> {
        if requested_qty <= 0.0 {
            return Err(AllocationError::InvalidQuantity(requested_qty));
        }

        let total_reserved: f64 = queue.iter().map(|q| q.reservation.reserved_qty).sum();
        let already_consumed: f64 = queue.iter().map(|q| q.reservation.consumed_qty).sum();

        let mut lines = Vec::new();
        let mut remaining = requested_qty;

        for entry in queue {
            if remaining <= 0.0 {
                break;
            }
            let available = entry.reservation.available_qty();
            if available <= 0.0 {
                continue;
            }
            let draw = available.min(remaining);
            lines.push(AllocationLine {
                reservation_id: entry.reservation.id.clone(),
                lp_id: entry.reservation.lp_id.clone(),
                lp_number: entry.lp_number.clone(),
                qty_drawn: draw,
            });
            remaining -= draw;
        }

        Ok(AllocationPlan {
            lines,
            requested_qty,
            total_reserved,
            cumulative_after: already_consumed + requested_qty,
            remaining_unallocated: remaining,
            is_over_consumption: remaining > 0.0,
        })
    }

    /// Fold a confirmed over-draw into the plan so every requested unit is
    /// recorded as consumption.
    ///
    /// Policy (documented in DESIGN.md): the excess is logged against the
    /// last reservation in sequence order. If the waterfall produced no
    /// lines at all (queue fully exhausted), a fresh line against the last
    /// queue entry carries the entire over-draw. After absorption the
    /// plan's lines sum to the requested quantity exactly.
    pub fn absorb_confirmed_overdraw(
        &self,
        plan: &mut AllocationPlan,
        queue: &[ReservationWithLot],
    ) {
        if plan.remaining_unallocated <= 0.0 {
            return;
        }

        let overdraw = plan.remaining_unallocated;
        if let Some(last) = plan.lines.last_mut() {
            last.qty_drawn += overdraw;
        } else if let Some(entry) = queue.last() {
            plan.lines.push(AllocationLine {
                reservation_id: entry.reservation.id.clone(),
                lp_id: entry.reservation.lp_id.clone(),
                lp_number: entry.lp_number.clone(),
                qty_drawn: overdraw,
            });
        }
        plan.remaining_unallocated = 0.0;
    }
}

impl Default for AllocationCalculator {
    fn default() -> Self {
        Self::new()
    }
}
