// ==========================================
// Production Output Core - engine layer
// ==========================================
// Stateless business engines. They take snapshots read by the
// repository layer and produce plans and decisions; the api layer
// persists the results.
// ==========================================

pub mod allocation;
pub mod genealogy;
pub mod policy;

pub use allocation::{AllocationCalculator, AllocationError, AllocationLine, AllocationPlan};
pub use genealogy::{GenealogyError, GenealogyTracker};
pub use policy::{Decision, OverConsumptionDetail, PolicyEngine, PolicyRequest, RejectReason};
