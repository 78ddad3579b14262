// ==========================================
// Production Output Core - output registration api
// ==========================================
// Orchestration over the repositories and engines. Reads a snapshot,
// plans allocation, evaluates policy, then commits the whole write set
// in one transaction. A stale counter at commit time triggers a full
// re-read, re-plan and re-evaluate, up to MAX_COMMIT_ATTEMPTS.
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::{LicensePlate, QaStatus, ReservationStatus, WorkOrder};
use crate::engine::{
    AllocationCalculator, AllocationPlan, Decision, GenealogyTracker, PolicyEngine, PolicyRequest,
    RejectReason,
};
use crate::repository::{
    GenealogyRepository, LicensePlateRepository, RegistrationRepository, RegistrationWriteSet,
    ReservationDraw, ReservationRepository, ReservationWithLot, WorkOrderRepository,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// Commit attempts before giving up on a contended work order
const MAX_COMMIT_ATTEMPTS: u32 = 3;

// ==========================================
// Request / response types
// ==========================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterOutputInput {
    pub wo_id: String,
    pub quantity: f64,
    pub qa_status: QaStatus,
    /// Batch for the output lot; falls back to the work order's batch
    pub batch_number: Option<String>,
    /// Extra output beyond the production plan, attributed to an existing
    /// lot instead of drawing from the reservation queue
    pub is_over_production: bool,
    pub over_production_parent_lp_id: Option<String>,
    /// Caller accepts drawing past the reserved total
    pub over_consumption_confirmed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterOutputResponse {
    pub output: LicensePlate,
    pub consumption_records: Vec<crate::domain::ConsumptionRecord>,
    pub genealogy_records_written: usize,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewAllocationLine {
    pub reservation_id: String,
    pub lp_id: String,
    pub lp_number: String,
    pub qty_to_consume: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewAllocationResponse {
    pub allocations: Vec<PreviewAllocationLine>,
    pub total_reserved: f64,
    pub cumulative_after: f64,
    pub remaining_unallocated: f64,
    pub is_over_consumption: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WoProgress {
    pub wo_id: String,
    pub wo_number: String,
    pub status: String,
    pub planned_qty: f64,
    pub output_qty: f64,
    pub remaining_qty: f64,
    pub progress_percent: f64,
    pub output_count: i64,
    /// Planned quantity reached (the order may still be open in the
    /// status sense)
    pub is_complete: bool,
}

/// Count and quantity for one QA bucket
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QaBucket {
    pub count: i64,
    pub qty: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputsSummary {
    pub total_outputs: i64,
    pub total_qty: f64,
    pub pending: QaBucket,
    pub approved: QaBucket,
    pub rejected: QaBucket,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputsListResponse {
    pub outputs: Vec<LicensePlate>,
    pub summary: OutputsSummary,
}

// ==========================================
// OutputApi
// ==========================================

pub struct OutputApi {
    wo_repo: Arc<WorkOrderRepository>,
    reservation_repo: Arc<ReservationRepository>,
    lp_repo: Arc<LicensePlateRepository>,
    genealogy_repo: Arc<GenealogyRepository>,
    registration_repo: Arc<RegistrationRepository>,
    calculator: AllocationCalculator,
    policy: PolicyEngine,
    tracker: GenealogyTracker,
}

impl OutputApi {
    pub fn new(
        wo_repo: Arc<WorkOrderRepository>,
        reservation_repo: Arc<ReservationRepository>,
        lp_repo: Arc<LicensePlateRepository>,
        genealogy_repo: Arc<GenealogyRepository>,
        registration_repo: Arc<RegistrationRepository>,
    ) -> Self {
        Self {
            wo_repo,
            reservation_repo,
            lp_repo,
            genealogy_repo,
            registration_repo,
            calculator: AllocationCalculator::new(),
            policy: PolicyEngine::new(),
            tracker: GenealogyTracker::new(),
        }
    }

    /// Read-only dry run of the waterfall against the current queue.
    /// Shows the same lines a registration of `quantity` would commit,
    /// without writing anything.
    #[instrument(skip(self))]
    pub fn preview_allocation(
        &self,
        org_id: &str,
        wo_id: &str,
        quantity: f64,
    ) -> ApiResult<PreviewAllocationResponse> {
        if quantity <= 0.0 {
            return Err(ApiError::InvalidQuantity(quantity));
        }

        self.load_wo(wo_id, org_id)?;
        let queue = self.reservation_repo.load_queue(wo_id, org_id)?;
        let plan = self.calculator.allocate(&queue, quantity)?;

        Ok(PreviewAllocationResponse {
            allocations: plan
                .lines
                .iter()
                .map(|l| PreviewAllocationLine {
                    reservation_id: l.reservation_id.clone(),
                    lp_id: l.lp_id.clone(),
                    lp_number: l.lp_number.clone(),
                    qty_to_consume: l.qty_drawn,
                })
                .collect(),
            total_reserved: plan.total_reserved,
            cumulative_after: plan.cumulative_after,
            remaining_unallocated: plan.remaining_unallocated,
            is_over_consumption: plan.is_over_consumption,
        })
    }

    /// Register one production output against a work order.
    ///
    /// Normal path: allocates material from the reservation queue in
    /// sequence order and records one consumption per drawdown, plus one
    /// genealogy edge per distinct input lot. Over-production path: skips
    /// allocation and links the output to its parent lot only.
    #[instrument(skip(self, input), fields(wo_id = %input.wo_id, quantity = input.quantity))]
    pub fn register_output(
        &self,
        org_id: &str,
        input: &RegisterOutputInput,
    ) -> ApiResult<RegisterOutputResponse> {
        // Quantity is rejected before any read
        if input.quantity <= 0.0 {
            return Err(ApiError::InvalidQuantity(input.quantity));
        }

        for attempt in 1..=MAX_COMMIT_ATTEMPTS {
            let wo = self.load_wo(&input.wo_id, org_id)?;
            if !wo.accepts_output() {
                return Err(ApiError::WONotInProgress {
                    wo_id: wo.id,
                    status: wo.status.to_string(),
                });
            }

            match self.try_register(org_id, input, &wo) {
                Ok(response) => return Ok(response),
                // StaleCounter surfaces here as ConcurrencyConflict
                Err(ApiError::ConcurrencyConflict(detail)) if attempt < MAX_COMMIT_ATTEMPTS => {
                    warn!(attempt, %detail, "registration lost a race, replanning");
                    continue;
                }
                Err(other) => return Err(other),
            }
        }

        Err(ApiError::ConcurrencyConflict(format!(
            "work order {} stayed contended for {} attempts",
            input.wo_id, MAX_COMMIT_ATTEMPTS
        )))
    }

    /// One plan-evaluate-commit attempt against a fresh snapshot.
    fn try_register(
        &self,
        org_id: &str,
        input: &RegisterOutputInput,
        wo: &WorkOrder,
    ) -> ApiResult<RegisterOutputResponse> {
        let queue = self.reservation_repo.load_queue(&input.wo_id, org_id)?;

        let mut plan = if input.is_over_production {
            None
        } else {
            Some(self.calculator.allocate(&queue, input.quantity)?)
        };

        let request = PolicyRequest {
            quantity: input.quantity,
            is_over_production: input.is_over_production,
            has_parent_lot: input.over_production_parent_lp_id.is_some(),
            over_consumption_confirmed: input.over_consumption_confirmed,
            queue_is_empty: queue.is_empty(),
        };
        match self.policy.evaluate(&request, plan.as_ref()) {
            Decision::Approve => {}
            Decision::RequireConfirmation(detail) => {
                return Err(ApiError::OverConsumptionDenied(detail));
            }
            Decision::RequireParentLot => return Err(ApiError::MissingParentLot),
            Decision::Reject(RejectReason::InvalidQuantity(qty)) => {
                return Err(ApiError::InvalidQuantity(qty));
            }
            Decision::Reject(RejectReason::NoReservations) => {
                return Err(ApiError::NoReservations {
                    wo_id: input.wo_id.clone(),
                });
            }
        }

        let mut warnings = Vec::new();

        let (draws, genealogy_parents) = if input.is_over_production {
            // Parent must exist in the caller's org before anything is written
            let parent_id = input
                .over_production_parent_lp_id
                .as_deref()
                .ok_or(ApiError::MissingParentLot)?;
            self.lp_repo
                .find_by_id(parent_id, org_id)?
                .ok_or_else(|| ApiError::NotFound(format!("license plate {}", parent_id)))?;
            (Vec::new(), vec![parent_id.to_string()])
        } else {
            let plan = match plan.as_mut() {
                Some(plan) => plan,
                None => {
                    return Err(ApiError::InternalError(
                        "allocation plan missing on the normal registration path".into(),
                    ));
                }
            };
            if plan.is_over_consumption {
                self.calculator.absorb_confirmed_overdraw(plan, &queue);
                warnings.push("over-consumption confirmed by caller".to_string());
            }
            let draws = build_draws(plan, &queue)?;
            let parents = self.tracker.derive_parents(plan);
            (draws, parents)
        };
        self.tracker.validate(&genealogy_parents)?;

        if !input.is_over_production && wo.output_qty + input.quantity > wo.planned_qty {
            warnings.push("planned quantity exceeded".to_string());
        }

        let now = Utc::now();
        let output = LicensePlate {
            id: Uuid::new_v4().to_string(),
            org_id: org_id.to_string(),
            // Assigned inside the commit transaction
            lp_number: String::new(),
            product_id: wo.product_id.clone(),
            quantity: input.quantity,
            uom: wo.uom.clone(),
            qa_status: input.qa_status,
            batch_number: input.batch_number.clone().or_else(|| wo.batch_number.clone()),
            source_wo_id: Some(wo.id.clone()),
            is_over_production: input.is_over_production,
            over_production_parent_lp_id: input.over_production_parent_lp_id.clone(),
            created_at: now,
        };

        let write_set = RegistrationWriteSet {
            org_id: org_id.to_string(),
            wo_id: wo.id.clone(),
            output,
            draws,
            genealogy_parents,
            expected_output_qty: wo.output_qty,
            registered_qty: input.quantity,
        };

        let committed = self.registration_repo.commit(&write_set, now)?;
        debug!(
            wo_id = %wo.id,
            lp_number = %committed.output.lp_number,
            draws = committed.consumption_records.len(),
            "output registered"
        );

        Ok(RegisterOutputResponse {
            output: committed.output,
            consumption_records: committed.consumption_records,
            genealogy_records_written: committed.genealogy_written,
            warnings,
        })
    }

    /// Current progress of a work order against its plan.
    #[instrument(skip(self))]
    pub fn get_progress(&self, org_id: &str, wo_id: &str) -> ApiResult<WoProgress> {
        let wo = self.load_wo(wo_id, org_id)?;
        let output_count = self.wo_repo.count_outputs(wo_id, org_id)?;

        Ok(WoProgress {
            wo_id: wo.id.clone(),
            wo_number: wo.wo_number.clone(),
            status: wo.status.to_string(),
            planned_qty: wo.planned_qty,
            output_qty: wo.output_qty,
            remaining_qty: wo.remaining_qty(),
            progress_percent: wo.progress_percent(),
            output_count,
            is_complete: wo.planned_qty > 0.0 && wo.output_qty >= wo.planned_qty,
        })
    }

    /// Output lots of a work order, newest first, with a QA status tally.
    #[instrument(skip(self))]
    pub fn list_outputs(&self, org_id: &str, wo_id: &str) -> ApiResult<OutputsListResponse> {
        self.load_wo(wo_id, org_id)?;
        let outputs = self.lp_repo.list_outputs_for_wo(wo_id, org_id)?;

        let mut summary = OutputsSummary::default();
        for lp in &outputs {
            summary.total_outputs += 1;
            summary.total_qty += lp.quantity;
            let bucket = match lp.qa_status {
                QaStatus::Pending => &mut summary.pending,
                QaStatus::Approved => &mut summary.approved,
                QaStatus::Rejected => &mut summary.rejected,
            };
            bucket.count += 1;
            bucket.qty += lp.quantity;
        }

        Ok(OutputsListResponse { outputs, summary })
    }

    /// Every ancestor lot id reachable from `lp_id` through genealogy
    /// edges, breadth-first. The starting lot is not included.
    #[instrument(skip(self))]
    pub fn trace_ancestors(&self, org_id: &str, lp_id: &str) -> ApiResult<Vec<String>> {
        self.lp_repo
            .find_by_id(lp_id, org_id)?
            .ok_or_else(|| ApiError::NotFound(format!("license plate {}", lp_id)))?;
        Ok(self.genealogy_repo.trace_ancestors(lp_id, org_id)?)
    }

    // A work order outside the caller's org behaves exactly like an
    // absent one.
    fn load_wo(&self, wo_id: &str, org_id: &str) -> ApiResult<WorkOrder> {
        self.wo_repo
            .find_by_id(wo_id, org_id)?
            .ok_or_else(|| ApiError::NotFound(format!("work order {}", wo_id)))
    }
}

/// Translate plan lines into guarded reservation drawdowns. The guard is
/// the consumed counter each line was computed against; exhaustion is
/// decided on the post-draw value.
fn build_draws(
    plan: &AllocationPlan,
    queue: &[ReservationWithLot],
) -> ApiResult<Vec<ReservationDraw>> {
    let mut draws = Vec::with_capacity(plan.lines.len());
    for line in &plan.lines {
        let entry = queue
            .iter()
            .find(|q| q.reservation.id == line.reservation_id)
            .ok_or_else(|| {
                ApiError::InternalError(format!(
                    "plan references reservation {} not present in the queue snapshot",
                    line.reservation_id
                ))
            })?;
        let new_consumed = entry.reservation.consumed_qty + line.qty_drawn;
        draws.push(ReservationDraw {
            reservation_id: line.reservation_id.clone(),
            input_lp_id: line.lp_id.clone(),
            qty_drawn: line.qty_drawn,
            expected_consumed_qty: entry.reservation.consumed_qty,
            new_consumed_qty: new_consumed,
            new_status: if new_consumed >= entry.reservation.reserved_qty {
                ReservationStatus::Exhausted
            } else {
                ReservationStatus::Active
            },
        });
    }
    Ok(draws)
}
