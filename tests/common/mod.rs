#![allow(dead_code)]

use std::sync::Arc;

use rust_decimal::Decimal;
use time::OffsetDateTime;
use uuid::Uuid;

use workshop_registration::db::models::{RegistrationForm, Workshop};
use workshop_registration::db::repositories::{
    PaymentRepository, RegistrationRepository, SchoolRepository, WorkshopRepository,
};
use workshop_registration::mocks::{InMemoryStore, MockGateway, RecordingNotifier};
use workshop_registration::modules::payments::PaymentLifecycle;
use workshop_registration::modules::registrations::RegistrationLedger;
use workshop_registration::providers::TextReceiptRenderer;

pub const BASE_URL: &str = "http://localhost:8000";

pub struct Harness {
    pub store: InMemoryStore,
    pub gateway: MockGateway,
    pub notifier: RecordingNotifier,
    pub ledger: RegistrationLedger,
    pub lifecycle: PaymentLifecycle,
}

pub fn harness(strict: bool) -> Harness {
    let store = InMemoryStore::new();
    let gateway = MockGateway::new();
    let notifier = RecordingNotifier::new();

    let workshops: Arc<dyn WorkshopRepository> = Arc::new(store.clone());
    let schools: Arc<dyn SchoolRepository> = Arc::new(store.clone());
    let registrations: Arc<dyn RegistrationRepository> = Arc::new(store.clone());
    let payments: Arc<dyn PaymentRepository> = Arc::new(store.clone());

    let ledger = RegistrationLedger::new(
        workshops.clone(),
        schools,
        registrations.clone(),
        payments.clone(),
        Arc::new(notifier.clone()),
        Arc::new(TextReceiptRenderer),
        strict,
    );

    let lifecycle = PaymentLifecycle::new(
        workshops,
        registrations,
        payments,
        Arc::new(gateway.clone()),
        Arc::new(notifier.clone()),
        "BDT".to_string(),
        BASE_URL.to_string(),
        strict,
    );

    Harness {
        store,
        gateway,
        notifier,
        ledger,
        lifecycle,
    }
}

pub fn workshop(fee: Decimal, capacity: i32) -> Workshop {
    let now = OffsetDateTime::now_utc();
    Workshop {
        id: Uuid::new_v4(),
        name: "Robotics 101".to_string(),
        description: "Build and program a line follower".to_string(),
        workshop_date: "2026-09-01".to_string(),
        workshop_time: "10:00 AM".to_string(),
        duration: "3 hours".to_string(),
        venue: "Main Hall".to_string(),
        organizer: "STEM Club".to_string(),
        fee,
        capacity,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

pub fn form(email: &str) -> RegistrationForm {
    RegistrationForm {
        student_name: "Rahim Uddin".to_string(),
        grade: 7,
        school_id: None,
        school_name: "Model School".to_string(),
        contact_number: "01712345678".to_string(),
        email: email.to_string(),
        terms_agreed: true,
    }
}
