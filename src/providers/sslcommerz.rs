use async_trait::async_trait;
use secrecy::ExposeSecret;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::GatewayConfig;

use super::{
    GatewayError, InitiateRequest, InitiateSuccess, PaymentGateway, ValidationSuccess,
};

const GATEWAY_TIMEOUT: Duration = Duration::from_secs(30);

/// SSLCommerz hosted-checkout adapter. Credentials and endpoints are
/// injected at construction; the adapter holds no other state than its
/// HTTP client.
pub struct SslCommerzGateway {
    config: GatewayConfig,
    client: reqwest::Client,
}

impl SslCommerzGateway {
    pub fn new(config: GatewayConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(GATEWAY_TIMEOUT)
            .build()
            .expect("failed to build gateway HTTP client");
        Self { config, client }
    }
}

#[async_trait]
impl PaymentGateway for SslCommerzGateway {
    async fn initiate(&self, request: &InitiateRequest) -> Result<InitiateSuccess, GatewayError> {
        let form: Vec<(&str, String)> = vec![
            ("store_id", self.config.store_id.clone()),
            (
                "store_passwd",
                self.config.store_password.expose_secret().to_string(),
            ),
            ("total_amount", request.amount.to_string()),
            ("currency", request.currency.clone()),
            ("tran_id", request.transaction_id.clone()),
            ("success_url", request.success_url.clone()),
            ("fail_url", request.fail_url.clone()),
            ("cancel_url", request.cancel_url.clone()),
            ("cus_name", request.customer.name.clone()),
            ("cus_email", request.customer.email.clone()),
            ("cus_add1", request.customer.address.clone()),
            ("cus_city", "Dhaka".to_string()),
            ("cus_country", "Bangladesh".to_string()),
            ("cus_phone", request.customer.phone.clone()),
            ("product_name", request.product_name.clone()),
            ("product_category", "Workshop Registration".to_string()),
            ("product_profile", "general".to_string()),
            ("shipping_method", "NO".to_string()),
            ("num_of_item", "1".to_string()),
            ("value_a", request.value_a.clone()),
            ("value_b", request.value_b.clone()),
        ];

        let response = self
            .client
            .post(&self.config.api_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| GatewayError::Transport(format!("invalid gateway response: {e}")))?;

        debug!(tran_id = %request.transaction_id, "gateway initiate response received");

        if body.get("status").and_then(|v| v.as_str()) == Some("SUCCESS") {
            let redirect_url = body
                .get("GatewayPageURL")
                .and_then(|v| v.as_str())
                .ok_or_else(|| {
                    GatewayError::Declined("gateway returned no redirect URL".to_string())
                })?
                .to_string();
            Ok(InitiateSuccess {
                redirect_url,
                raw_response: body,
            })
        } else {
            let reason = body
                .get("failedreason")
                .and_then(|v| v.as_str())
                .unwrap_or("Payment initiation failed")
                .to_string();
            warn!(tran_id = %request.transaction_id, reason = %reason, "gateway initiate declined");
            Err(GatewayError::Declined(reason))
        }
    }

    async fn validate(
        &self,
        val_id: &str,
        transaction_id: &str,
    ) -> Result<ValidationSuccess, GatewayError> {
        let response = self
            .client
            .get(&self.config.validation_url)
            .query(&[
                ("val_id", val_id),
                ("store_id", self.config.store_id.as_str()),
                ("store_passwd", self.config.store_password.expose_secret()),
            ])
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| GatewayError::Transport(format!("invalid validation response: {e}")))?;

        let status = body.get("status").and_then(|v| v.as_str()).unwrap_or("");
        if status == "VALID" || status == "VALIDATED" {
            let amount = match body.get("amount") {
                Some(serde_json::Value::String(s)) => s.clone(),
                Some(serde_json::Value::Number(n)) => n.to_string(),
                _ => String::new(),
            };
            let currency = body
                .get("currency_type")
                .and_then(|v| v.as_str())
                .map(str::to_string);
            Ok(ValidationSuccess {
                amount,
                currency,
                raw_response: body,
            })
        } else {
            warn!(tran_id = %transaction_id, status = %status, "gateway validation rejected");
            Err(GatewayError::Declined("Payment validation failed".to_string()))
        }
    }
}
