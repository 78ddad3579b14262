// ==========================================
// Production Output Core - domain layer
// ==========================================
// Entities and types only. No data access, no engine logic.
// ==========================================

pub mod consumption;
pub mod genealogy;
pub mod license_plate;
pub mod reservation;
pub mod types;
pub mod work_order;

pub use consumption::ConsumptionRecord;
pub use genealogy::GenealogyLink;
pub use license_plate::LicensePlate;
pub use reservation::MaterialReservation;
pub use types::{QaStatus, ReservationStatus, WoStatus};
pub use work_order::WorkOrder;
