// ==========================================
// Production Output Core - registration policy engine
// ==========================================
// Stateless gate in front of the registrar. The rules are evaluated in
// a fixed order; the first rule that fires decides the request. Callers
// translate the decision into their own error surface.
// ==========================================

use crate::engine::allocation::AllocationPlan;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Shortfall detail returned when a request needs explicit confirmation
/// before drawing past the reserved total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverConsumptionDetail {
    pub total_reserved: f64,
    pub cumulative_after: f64,
    pub remaining_unallocated: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RejectReason {
    InvalidQuantity(f64),
    NoReservations,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Decision {
    Approve,
    /// Allocation would exceed the reserved total; caller must resubmit
    /// with the over-consumption flag set.
    RequireConfirmation(OverConsumptionDetail),
    /// Over-production registration without a parent lot to link to.
    RequireParentLot,
    Reject(RejectReason),
}

/// Everything the policy needs to know about one registration attempt.
#[derive(Debug, Clone)]
pub struct PolicyRequest {
    pub quantity: f64,
    pub is_over_production: bool,
    pub has_parent_lot: bool,
    pub over_consumption_confirmed: bool,
    pub queue_is_empty: bool,
}

// ==========================================
// PolicyEngine
// ==========================================
pub struct PolicyEngine;

impl PolicyEngine {
    pub fn new() -> Self {
        Self
    }

    /// Rule order:
    ///   1. quantity must be positive
    ///   2. a normal registration needs a non-empty reservation queue
    ///   3. an over-production registration needs a parent lot
    ///   4. an over-drawing plan needs explicit confirmation
    ///   5. otherwise approve
    ///
    /// `plan` is None on the over-production path, which bypasses
    /// allocation entirely.
    #[instrument(skip(self, request, plan), fields(quantity = request.quantity, over_production = request.is_over_production))]
    pub fn evaluate(&self, request: &PolicyRequest, plan: Option<&AllocationPlan>) -> Decision {
        if request.quantity <= 0.0 {
            return Decision::Reject(RejectReason::InvalidQuantity(request.quantity));
        }

        if !request.is_over_production && request.queue_is_empty {
            return Decision::Reject(RejectReason::NoReservations);
        }

        if request.is_over_production && !request.has_parent_lot {
            return Decision::RequireParentLot;
        }

        if let Some(plan) = plan {
            if plan.is_over_consumption && !request.over_consumption_confirmed {
                return Decision::RequireConfirmation(OverConsumptionDetail {
                    total_reserved: plan.total_reserved,
                    cumulative_after: plan.cumulative_after,
                    remaining_unallocated: plan.remaining_unallocated,
                });
            }
        }

        Decision::Approve
    }
}

impl Default for PolicyEngine {
    fn default() -> Self {
        Self::new()
    }
}
