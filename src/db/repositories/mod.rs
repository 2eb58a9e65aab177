//! Repository traits the lifecycle core talks to, plus their Postgres
//! implementations. The traits keep the ledger and the payment lifecycle
//! testable against in-memory stores; the database remains the authority
//! for uniqueness and atomicity.

mod payment_repository;
mod registration_repository;
mod school_repository;
mod workshop_repository;

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::models::{
    ExportRow, NewPayment, NewRegistration, NewSchool, NewWorkshop, Payment, PaymentStatus,
    Registration, RegistrationFilter, RegistrationStatus, School, StatusBreakdown,
    UpdateWorkshop, Workshop,
};
use super::DatabaseError;

pub use payment_repository::PgPaymentRepository;
pub use registration_repository::PgRegistrationRepository;
pub use school_repository::PgSchoolRepository;
pub use workshop_repository::PgWorkshopRepository;

#[async_trait]
pub trait WorkshopRepository: Send + Sync {
    async fn find(&self, id: Uuid) -> Result<Option<Workshop>, DatabaseError>;
    async fn list_active(&self) -> Result<Vec<Workshop>, DatabaseError>;
    async fn count_active(&self) -> Result<i64, DatabaseError>;
    async fn create(&self, new: &NewWorkshop) -> Result<Workshop, DatabaseError>;
    async fn update(&self, id: Uuid, update: &UpdateWorkshop) -> Result<Workshop, DatabaseError>;
    /// Registrations occupying a slot: status in {completed, free}.
    async fn confirmed_count(&self, workshop_id: Uuid) -> Result<i64, DatabaseError>;
    /// Registrations holding a pending payment row. Only consulted in
    /// strict mode, where an initiated checkout reserves a slot.
    async fn reserved_count(&self, workshop_id: Uuid) -> Result<i64, DatabaseError>;
}

#[async_trait]
pub trait SchoolRepository: Send + Sync {
    async fn find(&self, id: Uuid) -> Result<Option<School>, DatabaseError>;
    async fn list_active(&self) -> Result<Vec<School>, DatabaseError>;
    async fn create(&self, new: &NewSchool) -> Result<School, DatabaseError>;
    /// Used by the one-time school backfill: resolve a free-text name to a
    /// School row, creating it on first sight.
    async fn get_or_create(&self, name: &str) -> Result<School, DatabaseError>;
}

#[async_trait]
pub trait RegistrationRepository: Send + Sync {
    /// Insert a new registration. A `(email, workshop_id)` or registration
    /// number collision surfaces as [`DatabaseError::Duplicate`].
    async fn insert(&self, new: &NewRegistration) -> Result<Registration, DatabaseError>;
    async fn find(&self, id: Uuid) -> Result<Option<Registration>, DatabaseError>;
    async fn email_registered(&self, workshop_id: Uuid, email: &str)
        -> Result<bool, DatabaseError>;
    async fn set_status(
        &self,
        id: Uuid,
        status: RegistrationStatus,
    ) -> Result<(), DatabaseError>;
    async fn list(&self, filter: &RegistrationFilter) -> Result<Vec<Registration>, DatabaseError>;
    async fn export_rows(&self, filter: &RegistrationFilter)
        -> Result<Vec<ExportRow>, DatabaseError>;
    async fn count_all(&self) -> Result<i64, DatabaseError>;
    async fn status_breakdown(&self) -> Result<StatusBreakdown, DatabaseError>;
    /// Administrative bulk override; bypasses amount verification by design.
    async fn mark_completed_bulk(&self, ids: &[Uuid]) -> Result<u64, DatabaseError>;
    /// Registrations still carrying only a transitional free-text school
    /// name (backfill input).
    async fn list_unresolved_schools(&self) -> Result<Vec<Registration>, DatabaseError>;
    async fn set_school(&self, id: Uuid, school_id: Uuid) -> Result<(), DatabaseError>;
}

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Insert a new pending payment. A transaction id collision or a second
    /// payment for the same registration surfaces as `Duplicate`.
    async fn insert(&self, new: &NewPayment) -> Result<Payment, DatabaseError>;
    async fn find_by_transaction_id(
        &self,
        transaction_id: &str,
    ) -> Result<Option<Payment>, DatabaseError>;
    async fn find_by_registration(
        &self,
        registration_id: Uuid,
    ) -> Result<Option<Payment>, DatabaseError>;
    /// Apply a status transition to the payment and mirror it onto the
    /// parent registration in one atomic unit. Completion stamps
    /// `completed_at`; an optional payload replaces the stored gateway
    /// response.
    async fn transition(
        &self,
        payment_id: Uuid,
        status: PaymentStatus,
        gateway_payload: Option<serde_json::Value>,
    ) -> Result<Payment, DatabaseError>;
    async fn completed_revenue(&self) -> Result<Decimal, DatabaseError>;
}
