// ==========================================
// Production Output Core - api layer
// ==========================================
// Orchestration surface. Holds the repositories behind Arc, wires the
// engines in, and owns the retry loop around contended commits.
// ==========================================

pub mod error;
pub mod output_api;

pub use error::{ApiError, ApiResult};
pub use output_api::{
    OutputApi, OutputsListResponse, OutputsSummary, PreviewAllocationLine,
    PreviewAllocationResponse, QaBucket, RegisterOutputInput, RegisterOutputResponse, WoProgress,
};
