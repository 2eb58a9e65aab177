use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::db::models::{Payment, Registration, Workshop};
use crate::providers::{Notifier, NotifyError};

/// Records every confirmation instead of sending it.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    confirmations: Arc<Mutex<Vec<String>>>,
    payment_confirmations: Arc<Mutex<Vec<String>>>,
    fail: Arc<Mutex<bool>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every send fail, for exercising the fire-and-forget paths.
    pub fn fail_sends(&self) {
        *self.fail.lock().unwrap() = true;
    }

    /// Recipient emails of recorded registration confirmations.
    pub fn confirmations(&self) -> Vec<String> {
        self.confirmations.lock().unwrap().clone()
    }

    /// Recipient emails of recorded payment confirmations.
    pub fn payment_confirmations(&self) -> Vec<String> {
        self.payment_confirmations.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_confirmation(
        &self,
        registration: &Registration,
        _workshop: &Workshop,
    ) -> Result<(), NotifyError> {
        if *self.fail.lock().unwrap() {
            return Err(NotifyError::Email("send failed".to_string()));
        }
        self.confirmations
            .lock()
            .unwrap()
            .push(registration.email.clone());
        Ok(())
    }

    async fn send_payment_confirmation(
        &self,
        registration: &Registration,
        _workshop: &Workshop,
        _payment: &Payment,
    ) -> Result<(), NotifyError> {
        if *self.fail.lock().unwrap() {
            return Err(NotifyError::Email("send failed".to_string()));
        }
        self.payment_confirmations
            .lock()
            .unwrap()
            .push(registration.email.clone());
        Ok(())
    }
}
