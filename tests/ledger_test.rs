mod common;

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal_macros::dec;
use uuid::Uuid;

use common::{form, harness, workshop};
use workshop_registration::db::models::{
    ExportRow, NewRegistration, Registration, RegistrationFilter, RegistrationStatus,
    StatusBreakdown,
};
use workshop_registration::db::repositories::RegistrationRepository;
use workshop_registration::db::DatabaseError;
use workshop_registration::error::{AppError, RegistrationError};
use workshop_registration::mocks::{InMemoryStore, RecordingNotifier};
use workshop_registration::modules::registrations::RegistrationLedger;
use workshop_registration::providers::TextReceiptRenderer;

#[tokio::test]
async fn free_workshop_confirms_instantly() {
    let h = harness(false);
    let w = workshop(dec!(0.00), 40);
    h.store.add_workshop(w.clone());

    let registration = h.ledger.submit(w.id, &form("a@example.com")).await.unwrap();

    assert_eq!(registration.payment_status, RegistrationStatus::Free);
    assert!(registration.registration_number.starts_with("REG-"));
    assert_eq!(h.notifier.confirmations(), vec!["a@example.com"]);
    assert_eq!(h.store.payment_count(), 0);
}

#[tokio::test]
async fn paid_workshop_starts_pending() {
    let h = harness(false);
    let w = workshop(dec!(200.00), 40);
    h.store.add_workshop(w.clone());

    let registration = h.ledger.submit(w.id, &form("a@example.com")).await.unwrap();

    assert_eq!(registration.payment_status, RegistrationStatus::Pending);
    assert_eq!(h.notifier.confirmations().len(), 1);
}

#[tokio::test]
async fn inactive_workshop_rejects_registration() {
    let h = harness(false);
    let mut w = workshop(dec!(200.00), 40);
    w.is_active = false;
    h.store.add_workshop(w.clone());

    let err = h.ledger.submit(w.id, &form("a@example.com")).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Registration(RegistrationError::WorkshopClosed)
    ));
}

#[tokio::test]
async fn closed_workshop_wins_over_bad_grade() {
    // Precondition order is fixed: the open check runs before field checks.
    let h = harness(false);
    let mut w = workshop(dec!(200.00), 40);
    w.is_active = false;
    h.store.add_workshop(w.clone());

    let mut bad = form("a@example.com");
    bad.grade = 1;

    let err = h.ledger.submit(w.id, &bad).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Registration(RegistrationError::WorkshopClosed)
    ));
}

#[tokio::test]
async fn full_workshop_rejects_registration() {
    let h = harness(false);
    let w = workshop(dec!(0.00), 1);
    h.store.add_workshop(w.clone());

    h.ledger.submit(w.id, &form("a@example.com")).await.unwrap();
    let err = h.ledger.submit(w.id, &form("b@example.com")).await.unwrap_err();

    assert!(matches!(
        err,
        AppError::Registration(RegistrationError::WorkshopFull { capacity: 1 })
    ));
}

#[tokio::test]
async fn pending_registrations_do_not_hold_slots_in_relaxed_mode() {
    // The long-standing oversell gap: while a payment is unresolved the
    // slot stays open for everyone else.
    let h = harness(false);
    let w = workshop(dec!(200.00), 1);
    h.store.add_workshop(w.clone());

    h.ledger.submit(w.id, &form("a@example.com")).await.unwrap();
    let second = h.ledger.submit(w.id, &form("b@example.com")).await;
    assert!(second.is_ok());
}

#[tokio::test]
async fn strict_mode_counts_initiated_checkouts_against_capacity() {
    let h = harness(true);
    let w = workshop(dec!(200.00), 1);
    h.store.add_workshop(w.clone());

    let first = h.ledger.submit(w.id, &form("a@example.com")).await.unwrap();
    h.lifecycle.initiate(first.id).await.unwrap();

    let err = h.ledger.submit(w.id, &form("b@example.com")).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Registration(RegistrationError::WorkshopFull { .. })
    ));
}

#[tokio::test]
async fn grade_must_be_in_range() {
    let h = harness(false);
    let w = workshop(dec!(200.00), 40);
    h.store.add_workshop(w.clone());

    for grade in [1, 13, 0, -3] {
        let mut bad = form("a@example.com");
        bad.grade = grade;
        let err = h.ledger.submit(w.id, &bad).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Registration(RegistrationError::InvalidGrade)
        ));
    }
}

#[tokio::test]
async fn contact_number_must_be_bd_mobile() {
    let h = harness(false);
    let w = workshop(dec!(200.00), 40);
    h.store.add_workshop(w.clone());

    let mut bad = form("a@example.com");
    bad.contact_number = "12345".to_string();
    let err = h.ledger.submit(w.id, &bad).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Registration(RegistrationError::InvalidPhone)
    ));
}

#[tokio::test]
async fn email_must_be_well_formed() {
    let h = harness(false);
    let w = workshop(dec!(200.00), 40);
    h.store.add_workshop(w.clone());

    let err = h.ledger.submit(w.id, &form("not-an-email")).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Registration(RegistrationError::InvalidEmail)
    ));
}

#[tokio::test]
async fn duplicate_email_per_workshop_is_rejected() {
    let h = harness(false);
    let w = workshop(dec!(200.00), 40);
    h.store.add_workshop(w.clone());

    h.ledger.submit(w.id, &form("a@example.com")).await.unwrap();
    let err = h.ledger.submit(w.id, &form("a@example.com")).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Registration(RegistrationError::DuplicateRegistration)
    ));

    // Email comparison is case-insensitive via lowercasing on intake.
    let err = h.ledger.submit(w.id, &form("A@Example.COM")).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Registration(RegistrationError::DuplicateRegistration)
    ));
}

/// Registration store that never sees a duplicate at pre-check time, like
/// a second request racing the first past the existence check. The unique
/// index still rejects the insert.
struct RacingRegistrations(InMemoryStore);

#[async_trait]
impl RegistrationRepository for RacingRegistrations {
    async fn insert(&self, new: &NewRegistration) -> Result<Registration, DatabaseError> {
        RegistrationRepository::insert(&self.0, new).await
    }

    async fn find(&self, id: Uuid) -> Result<Option<Registration>, DatabaseError> {
        RegistrationRepository::find(&self.0, id).await
    }

    async fn email_registered(
        &self,
        _workshop_id: Uuid,
        _email: &str,
    ) -> Result<bool, DatabaseError> {
        Ok(false)
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: workshop_registration::db::models::RegistrationStatus,
    ) -> Result<(), DatabaseError> {
        self.0.set_status(id, status).await
    }

    async fn list(
        &self,
        filter: &RegistrationFilter,
    ) -> Result<Vec<Registration>, DatabaseError> {
        self.0.list(filter).await
    }

    async fn export_rows(
        &self,
        filter: &RegistrationFilter,
    ) -> Result<Vec<ExportRow>, DatabaseError> {
        self.0.export_rows(filter).await
    }

    async fn count_all(&self) -> Result<i64, DatabaseError> {
        RegistrationRepository::count_all(&self.0).await
    }

    async fn status_breakdown(&self) -> Result<StatusBreakdown, DatabaseError> {
        self.0.status_breakdown().await
    }

    async fn mark_completed_bulk(&self, ids: &[Uuid]) -> Result<u64, DatabaseError> {
        self.0.mark_completed_bulk(ids).await
    }

    async fn list_unresolved_schools(&self) -> Result<Vec<Registration>, DatabaseError> {
        self.0.list_unresolved_schools().await
    }

    async fn set_school(&self, id: Uuid, school_id: Uuid) -> Result<(), DatabaseError> {
        self.0.set_school(id, school_id).await
    }
}

#[tokio::test]
async fn unique_index_backstops_the_duplicate_pre_check() {
    let store = InMemoryStore::new();
    let w = workshop(dec!(200.00), 40);
    store.add_workshop(w.clone());

    let notifier = RecordingNotifier::new();
    let ledger = RegistrationLedger::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(RacingRegistrations(store.clone())),
        Arc::new(store.clone()),
        Arc::new(notifier.clone()),
        Arc::new(TextReceiptRenderer),
        false,
    );

    ledger.submit(w.id, &form("a@example.com")).await.unwrap();
    // The pre-check reports no duplicate, so the request reaches the
    // insert; the store's uniqueness rule maps back to the same rejection.
    let err = ledger.submit(w.id, &form("a@example.com")).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Registration(RegistrationError::DuplicateRegistration)
    ));
    assert_eq!(store.registration_count(), 1);
}

#[tokio::test]
async fn same_email_may_register_for_another_workshop() {
    let h = harness(false);
    let w1 = workshop(dec!(200.00), 40);
    let w2 = workshop(dec!(200.00), 40);
    h.store.add_workshop(w1.clone());
    h.store.add_workshop(w2.clone());

    h.ledger.submit(w1.id, &form("a@example.com")).await.unwrap();
    assert!(h.ledger.submit(w2.id, &form("a@example.com")).await.is_ok());
}

#[tokio::test]
async fn terms_must_be_accepted() {
    let h = harness(false);
    let w = workshop(dec!(200.00), 40);
    h.store.add_workshop(w.clone());

    let mut bad = form("a@example.com");
    bad.terms_agreed = false;
    let err = h.ledger.submit(w.id, &bad).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Registration(RegistrationError::TermsNotAccepted)
    ));
}

#[tokio::test]
async fn unknown_workshop_is_not_found() {
    let h = harness(false);
    let err = h
        .ledger
        .submit(Uuid::new_v4(), &form("a@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn failed_confirmation_email_does_not_block_registration() {
    let h = harness(false);
    let w = workshop(dec!(0.00), 40);
    h.store.add_workshop(w.clone());
    h.notifier.fail_sends();

    let registration = h.ledger.submit(w.id, &form("a@example.com")).await.unwrap();
    assert_eq!(registration.payment_status, RegistrationStatus::Free);
    assert!(h.notifier.confirmations().is_empty());
}

#[tokio::test]
async fn receipt_only_for_confirmed_registrations() {
    let h = harness(false);
    let w = workshop(dec!(200.00), 40);
    h.store.add_workshop(w.clone());

    let pending = h.ledger.submit(w.id, &form("a@example.com")).await.unwrap();
    let err = h.ledger.receipt(pending.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn free_registration_gets_a_receipt() {
    let h = harness(false);
    let w = workshop(dec!(0.00), 40);
    h.store.add_workshop(w.clone());

    let registration = h.ledger.submit(w.id, &form("a@example.com")).await.unwrap();
    let receipt = h.ledger.receipt(registration.id).await.unwrap();

    let text = String::from_utf8(receipt.bytes).unwrap();
    assert!(text.contains(&registration.registration_number));
    assert!(text.contains("FREE WORKSHOP"));
    assert!(text.contains("Model School"));
    assert_eq!(
        receipt.filename,
        format!("receipt_{}.txt", registration.registration_number)
    );
}
