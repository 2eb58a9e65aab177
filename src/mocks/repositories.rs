use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rust_decimal::Decimal;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::db::models::{
    ExportRow, NewPayment, NewRegistration, NewSchool, NewWorkshop, Payment, PaymentStatus,
    Registration, RegistrationFilter, RegistrationStatus, School, StatusBreakdown,
    UpdateWorkshop, Workshop,
};
use crate::db::DatabaseError;
use crate::db::repositories::{
    PaymentRepository, RegistrationRepository, SchoolRepository, WorkshopRepository,
};

#[derive(Default)]
struct Tables {
    workshops: HashMap<Uuid, Workshop>,
    schools: HashMap<Uuid, School>,
    registrations: HashMap<Uuid, Registration>,
    payments: HashMap<Uuid, Payment>,
}

/// In-memory stand-in for all four Postgres repositories. Uniqueness and
/// the payment/registration mirror are enforced under one lock, matching
/// what the database guarantees in production.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a workshop directly, bypassing validation.
    pub fn add_workshop(&self, workshop: Workshop) {
        let mut tables = self.tables.lock().unwrap();
        tables.workshops.insert(workshop.id, workshop);
    }

    pub fn add_school(&self, school: School) {
        let mut tables = self.tables.lock().unwrap();
        tables.schools.insert(school.id, school);
    }

    pub fn registration(&self, id: Uuid) -> Option<Registration> {
        self.tables.lock().unwrap().registrations.get(&id).cloned()
    }

    pub fn payment(&self, id: Uuid) -> Option<Payment> {
        self.tables.lock().unwrap().payments.get(&id).cloned()
    }

    pub fn registration_count(&self) -> usize {
        self.tables.lock().unwrap().registrations.len()
    }

    pub fn payment_count(&self) -> usize {
        self.tables.lock().unwrap().payments.len()
    }
}

fn matches_filter(r: &Registration, filter: &RegistrationFilter) -> bool {
    if let Some(workshop_id) = filter.workshop_id {
        if r.workshop_id != workshop_id {
            return false;
        }
    }
    if let Some(status) = filter.status {
        if r.payment_status != status {
            return false;
        }
    }
    if let Some(search) = &filter.search {
        let needle = search.to_lowercase();
        let hit = r.student_name.to_lowercase().contains(&needle)
            || r.email.to_lowercase().contains(&needle)
            || r.registration_number.to_lowercase().contains(&needle);
        if !hit {
            return false;
        }
    }
    true
}

#[async_trait]
impl WorkshopRepository for InMemoryStore {
    async fn find(&self, id: Uuid) -> Result<Option<Workshop>, DatabaseError> {
        Ok(self.tables.lock().unwrap().workshops.get(&id).cloned())
    }

    async fn list_active(&self) -> Result<Vec<Workshop>, DatabaseError> {
        let tables = self.tables.lock().unwrap();
        let mut workshops: Vec<Workshop> = tables
            .workshops
            .values()
            .filter(|w| w.is_active)
            .cloned()
            .collect();
        workshops.sort_by(|a, b| {
            (a.workshop_date.as_str(), a.name.as_str())
                .cmp(&(b.workshop_date.as_str(), b.name.as_str()))
        });
        Ok(workshops)
    }

    async fn count_active(&self) -> Result<i64, DatabaseError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.workshops.values().filter(|w| w.is_active).count() as i64)
    }

    async fn create(&self, new: &NewWorkshop) -> Result<Workshop, DatabaseError> {
        let now = OffsetDateTime::now_utc();
        let workshop = Workshop {
            id: Uuid::new_v4(),
            name: new.name.clone(),
            description: new.description.clone(),
            workshop_date: new.workshop_date.clone(),
            workshop_time: new.workshop_time.clone(),
            duration: new.duration.clone(),
            venue: new.venue.clone(),
            organizer: new.organizer.clone(),
            fee: new.fee,
            capacity: new.capacity,
            is_active: new.is_active,
            created_at: now,
            updated_at: now,
        };
        self.add_workshop(workshop.clone());
        Ok(workshop)
    }

    async fn update(&self, id: Uuid, update: &UpdateWorkshop) -> Result<Workshop, DatabaseError> {
        let mut tables = self.tables.lock().unwrap();
        let workshop = tables.workshops.get_mut(&id).ok_or(DatabaseError::NotFound)?;
        if let Some(name) = &update.name {
            workshop.name = name.clone();
        }
        if let Some(description) = &update.description {
            workshop.description = description.clone();
        }
        if let Some(date) = &update.workshop_date {
            workshop.workshop_date = date.clone();
        }
        if let Some(time_str) = &update.workshop_time {
            workshop.workshop_time = time_str.clone();
        }
        if let Some(duration) = &update.duration {
            workshop.duration = duration.clone();
        }
        if let Some(venue) = &update.venue {
            workshop.venue = venue.clone();
        }
        if let Some(organizer) = &update.organizer {
            workshop.organizer = organizer.clone();
        }
        if let Some(fee) = update.fee {
            workshop.fee = fee;
        }
        if let Some(capacity) = update.capacity {
            workshop.capacity = capacity;
        }
        if let Some(is_active) = update.is_active {
            workshop.is_active = is_active;
        }
        workshop.updated_at = OffsetDateTime::now_utc();
        Ok(workshop.clone())
    }

    async fn confirmed_count(&self, workshop_id: Uuid) -> Result<i64, DatabaseError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .registrations
            .values()
            .filter(|r| r.workshop_id == workshop_id && r.payment_status.consumes_slot())
            .count() as i64)
    }

    async fn reserved_count(&self, workshop_id: Uuid) -> Result<i64, DatabaseError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .payments
            .values()
            .filter(|p| p.payment_status == PaymentStatus::Pending)
            .filter(|p| {
                tables
                    .registrations
                    .get(&p.registration_id)
                    .is_some_and(|r| r.workshop_id == workshop_id)
            })
            .count() as i64)
    }
}

#[async_trait]
impl SchoolRepository for InMemoryStore {
    async fn find(&self, id: Uuid) -> Result<Option<School>, DatabaseError> {
        Ok(self.tables.lock().unwrap().schools.get(&id).cloned())
    }

    async fn list_active(&self) -> Result<Vec<School>, DatabaseError> {
        let tables = self.tables.lock().unwrap();
        let mut schools: Vec<School> = tables
            .schools
            .values()
            .filter(|s| s.is_active)
            .cloned()
            .collect();
        schools.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(schools)
    }

    async fn create(&self, new: &NewSchool) -> Result<School, DatabaseError> {
        let mut tables = self.tables.lock().unwrap();
        if tables.schools.values().any(|s| s.name == new.name) {
            return Err(DatabaseError::Duplicate);
        }
        let now = OffsetDateTime::now_utc();
        let school = School {
            id: Uuid::new_v4(),
            name: new.name.clone(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        tables.schools.insert(school.id, school.clone());
        Ok(school)
    }

    async fn get_or_create(&self, name: &str) -> Result<School, DatabaseError> {
        let mut tables = self.tables.lock().unwrap();
        if let Some(existing) = tables.schools.values().find(|s| s.name == name) {
            return Ok(existing.clone());
        }
        let now = OffsetDateTime::now_utc();
        let school = School {
            id: Uuid::new_v4(),
            name: name.to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        tables.schools.insert(school.id, school.clone());
        Ok(school)
    }
}

#[async_trait]
impl RegistrationRepository for InMemoryStore {
    async fn insert(&self, new: &NewRegistration) -> Result<Registration, DatabaseError> {
        let mut tables = self.tables.lock().unwrap();
        let duplicate = tables.registrations.values().any(|r| {
            r.registration_number == new.registration_number
                || (r.workshop_id == new.workshop_id && r.email == new.email)
        });
        if duplicate {
            return Err(DatabaseError::Duplicate);
        }
        let now = OffsetDateTime::now_utc();
        let registration = Registration {
            id: Uuid::new_v4(),
            registration_number: new.registration_number.clone(),
            workshop_id: new.workshop_id,
            student_name: new.student_name.clone(),
            grade: new.grade,
            school_id: new.school_id,
            school_name: new.school_name.clone(),
            contact_number: new.contact_number.clone(),
            email: new.email.clone(),
            payment_status: new.payment_status,
            registered_at: now,
            updated_at: now,
        };
        tables
            .registrations
            .insert(registration.id, registration.clone());
        Ok(registration)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Registration>, DatabaseError> {
        Ok(self.tables.lock().unwrap().registrations.get(&id).cloned())
    }

    async fn email_registered(
        &self,
        workshop_id: Uuid,
        email: &str,
    ) -> Result<bool, DatabaseError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .registrations
            .values()
            .any(|r| r.workshop_id == workshop_id && r.email == email))
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: RegistrationStatus,
    ) -> Result<(), DatabaseError> {
        let mut tables = self.tables.lock().unwrap();
        let registration = tables
            .registrations
            .get_mut(&id)
            .ok_or(DatabaseError::NotFound)?;
        registration.payment_status = status;
        registration.updated_at = OffsetDateTime::now_utc();
        Ok(())
    }

    async fn list(
        &self,
        filter: &RegistrationFilter,
    ) -> Result<Vec<Registration>, DatabaseError> {
        let tables = self.tables.lock().unwrap();
        let mut registrations: Vec<Registration> = tables
            .registrations
            .values()
            .filter(|r| matches_filter(r, filter))
            .cloned()
            .collect();
        registrations.sort_by(|a, b| b.registered_at.cmp(&a.registered_at));
        Ok(registrations)
    }

    async fn export_rows(
        &self,
        filter: &RegistrationFilter,
    ) -> Result<Vec<ExportRow>, DatabaseError> {
        let tables = self.tables.lock().unwrap();
        let mut rows = Vec::new();
        for r in tables.registrations.values().filter(|r| matches_filter(r, filter)) {
            let workshop = tables
                .workshops
                .get(&r.workshop_id)
                .ok_or(DatabaseError::NotFound)?;
            let school = r
                .school_id
                .and_then(|id| tables.schools.get(&id))
                .map(|s| s.name.clone())
                .unwrap_or_else(|| r.school_name.clone());
            rows.push(ExportRow {
                registration_number: r.registration_number.clone(),
                workshop_name: workshop.name.clone(),
                workshop_date: workshop.workshop_date.clone(),
                student_name: r.student_name.clone(),
                grade: r.grade,
                school,
                contact_number: r.contact_number.clone(),
                email: r.email.clone(),
                payment_status: r.payment_status,
                fee: workshop.fee,
                registered_at: r.registered_at,
            });
        }
        rows.sort_by(|a, b| b.registered_at.cmp(&a.registered_at));
        Ok(rows)
    }

    async fn count_all(&self) -> Result<i64, DatabaseError> {
        Ok(self.tables.lock().unwrap().registrations.len() as i64)
    }

    async fn status_breakdown(&self) -> Result<StatusBreakdown, DatabaseError> {
        let tables = self.tables.lock().unwrap();
        let mut breakdown = StatusBreakdown::default();
        for r in tables.registrations.values() {
            match r.payment_status {
                RegistrationStatus::Pending => breakdown.pending += 1,
                RegistrationStatus::Completed => breakdown.completed += 1,
                RegistrationStatus::Failed => breakdown.failed += 1,
                RegistrationStatus::Cancelled => breakdown.cancelled += 1,
                RegistrationStatus::Free => breakdown.free += 1,
            }
        }
        Ok(breakdown)
    }

    async fn mark_completed_bulk(&self, ids: &[Uuid]) -> Result<u64, DatabaseError> {
        let mut tables = self.tables.lock().unwrap();
        let mut updated = 0;
        for id in ids {
            if let Some(registration) = tables.registrations.get_mut(id) {
                registration.payment_status = RegistrationStatus::Completed;
                registration.updated_at = OffsetDateTime::now_utc();
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn list_unresolved_schools(&self) -> Result<Vec<Registration>, DatabaseError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .registrations
            .values()
            .filter(|r| r.school_id.is_none() && !r.school_name.is_empty())
            .cloned()
            .collect())
    }

    async fn set_school(&self, id: Uuid, school_id: Uuid) -> Result<(), DatabaseError> {
        let mut tables = self.tables.lock().unwrap();
        let registration = tables
            .registrations
            .get_mut(&id)
            .ok_or(DatabaseError::NotFound)?;
        registration.school_id = Some(school_id);
        registration.updated_at = OffsetDateTime::now_utc();
        Ok(())
    }
}

#[async_trait]
impl PaymentRepository for InMemoryStore {
    async fn insert(&self, new: &NewPayment) -> Result<Payment, DatabaseError> {
        let mut tables = self.tables.lock().unwrap();
        let duplicate = tables.payments.values().any(|p| {
            p.transaction_id == new.transaction_id || p.registration_id == new.registration_id
        });
        if duplicate {
            return Err(DatabaseError::Duplicate);
        }
        let payment = Payment {
            id: Uuid::new_v4(),
            registration_id: new.registration_id,
            transaction_id: new.transaction_id.clone(),
            amount: new.amount,
            currency: new.currency.clone(),
            payment_status: PaymentStatus::Pending,
            payment_method: new.payment_method,
            gateway_payload: new.gateway_payload.clone(),
            initiated_at: OffsetDateTime::now_utc(),
            completed_at: None,
        };
        tables.payments.insert(payment.id, payment.clone());
        Ok(payment)
    }

    async fn find_by_transaction_id(
        &self,
        transaction_id: &str,
    ) -> Result<Option<Payment>, DatabaseError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .payments
            .values()
            .find(|p| p.transaction_id == transaction_id)
            .cloned())
    }

    async fn find_by_registration(
        &self,
        registration_id: Uuid,
    ) -> Result<Option<Payment>, DatabaseError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .payments
            .values()
            .find(|p| p.registration_id == registration_id)
            .cloned())
    }

    async fn transition(
        &self,
        payment_id: Uuid,
        status: PaymentStatus,
        gateway_payload: Option<serde_json::Value>,
    ) -> Result<Payment, DatabaseError> {
        let mut tables = self.tables.lock().unwrap();
        let payment = tables
            .payments
            .get_mut(&payment_id)
            .ok_or(DatabaseError::NotFound)?;
        payment.payment_status = status;
        if status == PaymentStatus::Completed {
            payment.completed_at = Some(OffsetDateTime::now_utc());
        }
        if let Some(payload) = gateway_payload {
            payment.gateway_payload = Some(payload);
        }
        let payment = payment.clone();
        let registration = tables
            .registrations
            .get_mut(&payment.registration_id)
            .ok_or(DatabaseError::NotFound)?;
        registration.payment_status = status.registration_status();
        registration.updated_at = OffsetDateTime::now_utc();
        Ok(payment)
    }

    async fn completed_revenue(&self) -> Result<Decimal, DatabaseError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .payments
            .values()
            .filter(|p| p.payment_status == PaymentStatus::Completed)
            .map(|p| p.amount)
            .sum())
    }
}
