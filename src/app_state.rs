use std::sync::Arc;

use sqlx::PgPool;

use crate::db::repositories::{
    PaymentRepository, RegistrationRepository, SchoolRepository, WorkshopRepository,
};
use crate::modules::payments::PaymentLifecycle;
use crate::modules::registrations::RegistrationLedger;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub ledger: Arc<RegistrationLedger>,
    pub lifecycle: Arc<PaymentLifecycle>,
    pub workshops: Arc<dyn WorkshopRepository>,
    pub schools: Arc<dyn SchoolRepository>,
    pub registrations: Arc<dyn RegistrationRepository>,
    pub payments: Arc<dyn PaymentRepository>,
}
