use async_trait::async_trait;
use tracing::info;

use crate::db::models::{Payment, Registration, Workshop};

use super::{Notifier, NotifyError};

/// Notifier used when SMTP is not configured: confirmations go to the log.
#[derive(Debug, Clone, Default)]
pub struct ConsoleNotifier;

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn send_confirmation(
        &self,
        registration: &Registration,
        workshop: &Workshop,
    ) -> Result<(), NotifyError> {
        info!(
            registration_number = %registration.registration_number,
            email = %registration.email,
            workshop = %workshop.name,
            "registration confirmation (console notifier)"
        );
        Ok(())
    }

    async fn send_payment_confirmation(
        &self,
        registration: &Registration,
        workshop: &Workshop,
        payment: &Payment,
    ) -> Result<(), NotifyError> {
        info!(
            registration_number = %registration.registration_number,
            transaction_id = %payment.transaction_id,
            amount = %payment.amount,
            workshop = %workshop.name,
            "payment confirmation (console notifier)"
        );
        Ok(())
    }
}
