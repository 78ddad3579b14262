// ==========================================
// Production Output Core - domain type definitions
// ==========================================
// Status enums stored as snake_case strings, matching the
// database column values exactly.
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// Work order status
// ==========================================
// Output registration is only legal in InProgress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WoStatus {
    Draft,
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl fmt::Display for WoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl WoStatus {
    /// Parse from the database string form
    pub fn from_str(s: &str) -> Self {
        match s {
            "draft" => WoStatus::Draft,
            "pending" => WoStatus::Pending,
            "in_progress" => WoStatus::InProgress,
            "completed" => WoStatus::Completed,
            "cancelled" => WoStatus::Cancelled,
            _ => WoStatus::Draft,
        }
    }

    /// String form stored in the database
    pub fn to_db_str(&self) -> &'static str {
        match self {
            WoStatus::Draft => "draft",
            WoStatus::Pending => "pending",
            WoStatus::InProgress => "in_progress",
            WoStatus::Completed => "completed",
            WoStatus::Cancelled => "cancelled",
        }
    }
}

// ==========================================
// Reservation status
// ==========================================
// active    - has remaining reservable quantity
// exhausted - consumed_qty reached reserved_qty (still part of the queue)
// released  - returned to stock, never loaded for allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Active,
    Exhausted,
    Released,
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl ReservationStatus {
    pub fn from_str(s: &str) -> Self {
        match s {
            "active" => ReservationStatus::Active,
            "exhausted" => ReservationStatus::Exhausted,
            "released" => ReservationStatus::Released,
            _ => ReservationStatus::Active,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            ReservationStatus::Active => "active",
            ReservationStatus::Exhausted => "exhausted",
            ReservationStatus::Released => "released",
        }
    }
}

// ==========================================
// QA status of a license plate
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QaStatus {
    Pending,
    Approved,
    Rejected,
}

impl fmt::Display for QaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl QaStatus {
    pub fn from_str(s: &str) -> Self {
        match s {
            "pending" => QaStatus::Pending,
            "approved" => QaStatus::Approved,
            "rejected" => QaStatus::Rejected,
            _ => QaStatus::Pending,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            QaStatus::Pending => "pending",
            QaStatus::Approved => "approved",
            QaStatus::Rejected => "rejected",
        }
    }
}
