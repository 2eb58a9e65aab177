use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use crate::providers::{
    GatewayError, InitiateRequest, InitiateSuccess, PaymentGateway, ValidationSuccess,
};

/// Configurable gateway double. Defaults to accepting everything and
/// echoing back the amount the checkout was initiated with.
#[derive(Clone, Default)]
pub struct MockGateway {
    initiate_error: Arc<Mutex<Option<GatewayError>>>,
    validate_error: Arc<Mutex<Option<GatewayError>>>,
    validated_amount: Arc<Mutex<Option<String>>>,
    initiate_calls: Arc<AtomicUsize>,
    validate_calls: Arc<AtomicUsize>,
    last_request: Arc<Mutex<Option<InitiateRequest>>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next initiations fail with the given error.
    pub fn fail_initiate(&self, error: GatewayError) {
        *self.initiate_error.lock().unwrap() = Some(error);
    }

    pub fn fail_validate(&self, error: GatewayError) {
        *self.validate_error.lock().unwrap() = Some(error);
    }

    /// Override the amount the provider reports on validation.
    pub fn report_amount(&self, amount: &str) {
        *self.validated_amount.lock().unwrap() = Some(amount.to_string());
    }

    pub fn initiate_calls(&self) -> usize {
        self.initiate_calls.load(Ordering::SeqCst)
    }

    pub fn validate_calls(&self) -> usize {
        self.validate_calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<InitiateRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn initiate(&self, request: &InitiateRequest) -> Result<InitiateSuccess, GatewayError> {
        self.initiate_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());
        if let Some(error) = self.initiate_error.lock().unwrap().clone() {
            return Err(error);
        }
        // Remember the amount so a default validation echoes it back.
        let mut amount = self.validated_amount.lock().unwrap();
        if amount.is_none() {
            *amount = Some(request.amount.to_string());
        }
        Ok(InitiateSuccess {
            redirect_url: format!(
                "https://sandbox.example.com/checkout/{}",
                request.transaction_id
            ),
            raw_response: json!({ "status": "SUCCESS" }),
        })
    }

    async fn validate(
        &self,
        val_id: &str,
        _transaction_id: &str,
    ) -> Result<ValidationSuccess, GatewayError> {
        self.validate_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.validate_error.lock().unwrap().clone() {
            return Err(error);
        }
        let amount = self
            .validated_amount
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_default();
        Ok(ValidationSuccess {
            amount,
            currency: Some("BDT".to_string()),
            raw_response: json!({ "status": "VALID", "val_id": val_id }),
        })
    }
}
