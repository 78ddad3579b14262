// ==========================================
// Production Output Core - repository layer
// ==========================================
// Data access only. No business rules live here; the engines decide,
// the repositories read and write.
// ==========================================

pub mod error;
pub mod genealogy_repo;
pub mod license_plate_repo;
pub mod registration_repo;
pub mod reservation_repo;
pub mod work_order_repo;

pub use error::{RepositoryError, RepositoryResult};
pub use genealogy_repo::GenealogyRepository;
pub use license_plate_repo::LicensePlateRepository;
pub use registration_repo::{
    CommittedRegistration, RegistrationRepository, RegistrationWriteSet, ReservationDraw,
};
pub use reservation_repo::{ReservationRepository, ReservationWithLot};
pub use work_order_repo::WorkOrderRepository;

use chrono::{DateTime, NaiveDateTime, Utc};

/// Timestamp format stored in the database
pub(crate) const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub(crate) fn fmt_ts(ts: &DateTime<Utc>) -> String {
    ts.format(TS_FORMAT).to_string()
}

pub(crate) fn parse_ts(idx: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, TS_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}
