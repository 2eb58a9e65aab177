use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::db::models::{
    generate_registration_number, NewRegistration, Registration, RegistrationForm,
    RegistrationStatus, Workshop, BD_MOBILE_RE, GRADE_MAX, GRADE_MIN,
};
use crate::db::repositories::{
    PaymentRepository, RegistrationRepository, SchoolRepository, WorkshopRepository,
};
use crate::db::DatabaseError;
use crate::error::{AppError, AppResult, RegistrationError};
use crate::providers::{Notifier, ReceiptContext, ReceiptRenderer};

/// A rendered receipt ready to be served as a download.
#[derive(Debug)]
pub struct ReceiptDocument {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub content_type: &'static str,
}

/// The registration ledger: the single entry point for taking, reading and
/// documenting registrations. All submission preconditions are checked here
/// in a fixed order, so a request failing several of them always gets the
/// same rejection.
pub struct RegistrationLedger {
    workshops: Arc<dyn WorkshopRepository>,
    schools: Arc<dyn SchoolRepository>,
    registrations: Arc<dyn RegistrationRepository>,
    payments: Arc<dyn PaymentRepository>,
    notifier: Arc<dyn Notifier>,
    receipts: Arc<dyn ReceiptRenderer>,
    /// Strict lifecycle mode counts initiated checkouts against capacity.
    strict: bool,
}

impl RegistrationLedger {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        workshops: Arc<dyn WorkshopRepository>,
        schools: Arc<dyn SchoolRepository>,
        registrations: Arc<dyn RegistrationRepository>,
        payments: Arc<dyn PaymentRepository>,
        notifier: Arc<dyn Notifier>,
        receipts: Arc<dyn ReceiptRenderer>,
        strict: bool,
    ) -> Self {
        Self {
            workshops,
            schools,
            registrations,
            payments,
            notifier,
            receipts,
            strict,
        }
    }

    /// Submit a registration for a workshop.
    ///
    /// Precondition order: workshop open, capacity, grade, phone, email,
    /// duplicate, terms. A free workshop confirms instantly with status
    /// `free`; a paid one starts out `pending` until its payment resolves.
    pub async fn submit(
        &self,
        workshop_id: Uuid,
        form: &RegistrationForm,
    ) -> AppResult<Registration> {
        let workshop = self
            .workshops
            .find(workshop_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Workshop not found".to_string()))?;

        if !workshop.is_active {
            return Err(RegistrationError::WorkshopClosed.into());
        }

        let occupied = self.occupied_slots(&workshop).await?;
        if workshop.is_full(occupied) {
            return Err(RegistrationError::WorkshopFull {
                capacity: workshop.capacity,
            }
            .into());
        }

        if !(GRADE_MIN..=GRADE_MAX).contains(&form.grade) {
            return Err(RegistrationError::InvalidGrade.into());
        }

        if !BD_MOBILE_RE.is_match(form.contact_number.trim()) {
            return Err(RegistrationError::InvalidPhone.into());
        }

        let email = form.email.trim().to_lowercase();
        if !validator::validate_email(email.as_str()) {
            return Err(RegistrationError::InvalidEmail.into());
        }

        if self
            .registrations
            .email_registered(workshop_id, &email)
            .await?
        {
            return Err(RegistrationError::DuplicateRegistration.into());
        }

        if !form.terms_agreed {
            return Err(RegistrationError::TermsNotAccepted.into());
        }

        // A referenced school must exist; the free-text name is only a
        // fallback for schools not yet in the catalogue.
        if let Some(school_id) = form.school_id {
            if self.schools.find(school_id).await?.is_none() {
                return Err(AppError::Validation("Unknown school".to_string()));
            }
        }

        let status = if workshop.is_free() {
            RegistrationStatus::Free
        } else {
            RegistrationStatus::Pending
        };

        let new = NewRegistration {
            registration_number: generate_registration_number(),
            workshop_id,
            student_name: form.student_name.trim().to_string(),
            grade: form.grade,
            school_id: form.school_id,
            school_name: form.school_name.trim().to_string(),
            contact_number: form.contact_number.trim().to_string(),
            email,
            payment_status: status,
        };

        // The unique (email, workshop) index is the authority; the pre-check
        // above only covers the common case.
        let registration = match self.registrations.insert(&new).await {
            Ok(registration) => registration,
            Err(DatabaseError::Duplicate) => {
                return Err(RegistrationError::DuplicateRegistration.into())
            }
            Err(err) => return Err(err.into()),
        };

        info!(
            registration_number = %registration.registration_number,
            workshop = %workshop.name,
            status = ?registration.payment_status,
            "registration accepted"
        );

        // Confirmation email is best effort; a delivery failure never rolls
        // back an accepted registration.
        if let Err(err) = self
            .notifier
            .send_confirmation(&registration, &workshop)
            .await
        {
            warn!(
                registration_number = %registration.registration_number,
                error = %err,
                "confirmation email failed"
            );
        }

        Ok(registration)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Registration> {
        self.registrations
            .find(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Registration not found".to_string()))
    }

    /// Render the receipt for a confirmed registration. Pending, failed and
    /// cancelled registrations have no receipt.
    pub async fn receipt(&self, id: Uuid) -> AppResult<ReceiptDocument> {
        let registration = self.get(id).await?;

        if !registration.payment_status.consumes_slot() {
            return Err(AppError::NotFound(
                "Receipt is only available for confirmed registrations".to_string(),
            ));
        }

        let workshop = self
            .workshops
            .find(registration.workshop_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Workshop not found".to_string()))?;

        let school = match registration.school_id {
            Some(school_id) => self
                .schools
                .find(school_id)
                .await?
                .map(|s| s.name)
                .unwrap_or_else(|| registration.school_name.clone()),
            None => registration.school_name.clone(),
        };

        let payment = self.payments.find_by_registration(registration.id).await?;

        let ctx = ReceiptContext {
            registration,
            workshop,
            school,
            payment,
        };

        let bytes = self
            .receipts
            .render(&ctx)
            .map_err(|e| AppError::Internal(e.to_string()))?;

        Ok(ReceiptDocument {
            filename: self.receipts.filename(&ctx),
            content_type: self.receipts.content_type(),
            bytes,
        })
    }

    async fn occupied_slots(&self, workshop: &Workshop) -> AppResult<i64> {
        let confirmed = self.workshops.confirmed_count(workshop.id).await?;
        if self.strict {
            let reserved = self.workshops.reserved_count(workshop.id).await?;
            Ok(confirmed + reserved)
        } else {
            Ok(confirmed)
        }
    }
}
