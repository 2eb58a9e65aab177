//! Collaborator traits the lifecycle core depends on: the hosted payment
//! gateway, the notification sender and the receipt renderer. Each has a
//! production implementation here and an in-memory counterpart under
//! `mocks` for tests.

mod console_notifier;
mod receipt;
mod smtp_notifier;
mod sslcommerz;

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::db::models::{Payment, Registration, Workshop};

pub use console_notifier::ConsoleNotifier;
pub use receipt::{ReceiptContext, TextReceiptRenderer};
pub use smtp_notifier::SmtpNotifier;
pub use sslcommerz::SslCommerzGateway;

/// Failure of a gateway operation. Transport errors and provider-reported
/// declines are ordinary outcomes for callers, never panics.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("gateway connection error: {0}")]
    Transport(String),

    #[error("gateway declined: {0}")]
    Declined(String),
}

#[derive(Debug, Clone)]
pub struct CustomerInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

#[derive(Debug, Clone)]
pub struct InitiateRequest {
    pub amount: Decimal,
    pub currency: String,
    pub transaction_id: String,
    pub customer: CustomerInfo,
    pub product_name: String,
    pub success_url: String,
    pub fail_url: String,
    pub cancel_url: String,
    /// Passthrough carrying the registration number back on callbacks.
    pub value_a: String,
    /// Passthrough carrying the workshop id.
    pub value_b: String,
}

#[derive(Debug, Clone)]
pub struct InitiateSuccess {
    pub redirect_url: String,
    pub raw_response: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct ValidationSuccess {
    /// Amount as reported by the provider, still a string; compared with
    /// [`amounts_match`].
    pub amount: String,
    pub currency: Option<String>,
    pub raw_response: serde_json::Value,
}

/// Contract with the hosted payment provider. Polymorphic over providers;
/// only the SSLCommerz variant is implemented.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn initiate(&self, request: &InitiateRequest) -> Result<InitiateSuccess, GatewayError>;

    async fn validate(
        &self,
        val_id: &str,
        transaction_id: &str,
    ) -> Result<ValidationSuccess, GatewayError>;
}

/// Exact decimal comparison after normalizing scale. "200" and "200.00"
/// match; "150.00" against 200.00 does not; unparseable input never does.
pub fn amounts_match(received: &str, expected: Decimal) -> bool {
    match Decimal::from_str_exact(received.trim()) {
        Ok(received) => received.normalize() == expected.normalize(),
        Err(_) => false,
    }
}

#[derive(Debug, Clone, Error)]
pub enum NotifyError {
    #[error("email error: {0}")]
    Email(String),
}

/// Outbound notifications. Failures are logged and swallowed at every call
/// site; a lost email never blocks a registration or a payment transition.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_confirmation(
        &self,
        registration: &Registration,
        workshop: &Workshop,
    ) -> Result<(), NotifyError>;

    async fn send_payment_confirmation(
        &self,
        registration: &Registration,
        workshop: &Workshop,
        payment: &Payment,
    ) -> Result<(), NotifyError>;
}

#[derive(Debug, Clone, Error)]
pub enum ReceiptError {
    #[error("receipt rendering failed: {0}")]
    Render(String),
}

/// Receipt document renderer. The lifecycle core only decides *whether* a
/// receipt may be issued; how the bytes look is this collaborator's problem.
pub trait ReceiptRenderer: Send + Sync {
    fn render(&self, ctx: &ReceiptContext) -> Result<Vec<u8>, ReceiptError>;

    fn filename(&self, ctx: &ReceiptContext) -> String;

    fn content_type(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn amounts_match_is_decimal_exact() {
        assert!(amounts_match("200.00", dec!(200.00)));
        assert!(amounts_match("200", dec!(200.00)));
        assert!(amounts_match("200.0", dec!(200)));
        assert!(amounts_match(" 200.00 ", dec!(200.00)));
    }

    #[test]
    fn amounts_match_rejects_mismatch_and_garbage() {
        assert!(!amounts_match("150.00", dec!(200.00)));
        assert!(!amounts_match("200.01", dec!(200.00)));
        assert!(!amounts_match("199.999", dec!(200.00)));
        assert!(!amounts_match("", dec!(200.00)));
        assert!(!amounts_match("abc", dec!(200.00)));
    }
}
