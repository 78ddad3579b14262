// ==========================================
// Production Output Core - library root
// ==========================================
// Output registration engine for manufacturing work orders: allocates
// consumed material across reservation queues, records lot genealogy,
// and keeps work order progress counters consistent under concurrency.
// ==========================================

// ==========================================
// Module declarations
// ==========================================

// Domain layer - entities and types
pub mod domain;

// Repository layer - data access
pub mod repository;

// Engine layer - business rules
pub mod engine;

// Database infrastructure (connection setup, PRAGMAs, schema)
pub mod db;

// Logging
pub mod logging;

// API layer - orchestration surface
pub mod api;

// ==========================================
// Core type re-exports
// ==========================================

// Domain types
pub use domain::types::{QaStatus, ReservationStatus, WoStatus};

// Domain entities
pub use domain::{ConsumptionRecord, GenealogyLink, LicensePlate, MaterialReservation, WorkOrder};

// Engines
pub use engine::{AllocationCalculator, AllocationPlan, Decision, GenealogyTracker, PolicyEngine};

// API surface
pub use api::{ApiError, ApiResult, OutputApi, RegisterOutputInput, RegisterOutputResponse};
