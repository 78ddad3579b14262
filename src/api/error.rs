// ==========================================
// Production Output Core - api error types
// ==========================================

use crate::engine::policy::OverConsumptionDetail;
use crate::engine::{AllocationError, GenealogyError};
use crate::repository::RepositoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("quantity must be greater than 0, got {0}")]
    InvalidQuantity(f64),

    #[error("work order {wo_id} is in status '{status}', output registration requires 'in_progress'")]
    WONotInProgress { wo_id: String, status: String },

    #[error("work order {wo_id} has no material reservations to consume from")]
    NoReservations { wo_id: String },

    #[error("over-production registration requires a parent lot")]
    MissingParentLot,

    #[error(
        "allocation exceeds reserved total: reserved {}, would reach {}, short by {}",
        .0.total_reserved, .0.cumulative_after, .0.remaining_unallocated
    )]
    OverConsumptionDenied(OverConsumptionDetail),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("concurrent registration conflict: {0}")]
    ConcurrencyConflict(String),

    #[error("internal error: {0}")]
    InternalError(String),

    #[error("repository error: {0}")]
    Repository(RepositoryError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{} {}", entity, id))
            }
            RepositoryError::StaleCounter { entity, id, .. } => ApiError::ConcurrencyConflict(
                format!("{} {} changed during registration", entity, id),
            ),
            // Daily lot-number sequence slot taken by a racing connection;
            // a retry recounts against the committed row and moves on
            RepositoryError::UniqueConstraintViolation(msg)
                if msg.contains("license_plates.lp_number") =>
            {
                ApiError::ConcurrencyConflict(format!("lot number already taken: {}", msg))
            }
            other => ApiError::Repository(other),
        }
    }
}

impl From<AllocationError> for ApiError {
    fn from(err: AllocationError) -> Self {
        match err {
            AllocationError::InvalidQuantity(qty) => ApiError::InvalidQuantity(qty),
        }
    }
}

impl From<GenealogyError> for ApiError {
    fn from(err: GenealogyError) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
