use rust_decimal_macros::dec;
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use workshop_registration::config::GatewayConfig;
use workshop_registration::providers::{
    CustomerInfo, GatewayError, InitiateRequest, PaymentGateway, SslCommerzGateway,
};

fn gateway_for(server: &MockServer) -> SslCommerzGateway {
    SslCommerzGateway::new(GatewayConfig {
        store_id: "teststore".to_string(),
        store_password: SecretString::from("testpass".to_string()),
        api_url: format!("{}/gwprocess/v4/api.php", server.uri()),
        validation_url: format!("{}/validator/api/validationserverAPI.php", server.uri()),
        is_sandbox: true,
    })
}

fn initiate_request() -> InitiateRequest {
    InitiateRequest {
        amount: dec!(200.00),
        currency: "BDT".to_string(),
        transaction_id: "TXN-REG-20260824-A1B2C-DEADBEEF".to_string(),
        customer: CustomerInfo {
            name: "Rahim Uddin".to_string(),
            email: "a@example.com".to_string(),
            phone: "01712345678".to_string(),
            address: "Model School".to_string(),
        },
        product_name: "Robotics 101".to_string(),
        success_url: "http://localhost:8000/payments/callback/success".to_string(),
        fail_url: "http://localhost:8000/payments/callback/fail".to_string(),
        cancel_url: "http://localhost:8000/payments/callback/cancel".to_string(),
        value_a: "REG-20260824-A1B2C".to_string(),
        value_b: "11111111-2222-3333-4444-555555555555".to_string(),
    }
}

#[tokio::test]
async fn initiate_posts_credentials_and_parses_redirect() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/gwprocess/v4/api.php"))
        .and(body_string_contains("store_id=teststore"))
        .and(body_string_contains("tran_id=TXN-REG-20260824-A1B2C-DEADBEEF"))
        .and(body_string_contains("total_amount=200.00"))
        .and(body_string_contains("value_a=REG-20260824-A1B2C"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "SUCCESS",
            "GatewayPageURL": "https://sandbox.sslcommerz.com/EasyCheckOut/abc123",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    let session = gateway.initiate(&initiate_request()).await.unwrap();
    assert_eq!(
        session.redirect_url,
        "https://sandbox.sslcommerz.com/EasyCheckOut/abc123"
    );
}

#[tokio::test]
async fn initiate_failure_reports_the_providers_reason() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/gwprocess/v4/api.php"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "FAILED",
            "failedreason": "Store Credential Error Or Store is De-active",
        })))
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    let err = gateway.initiate(&initiate_request()).await.unwrap_err();
    match err {
        GatewayError::Declined(reason) => assert!(reason.contains("Store Credential")),
        other => panic!("expected decline, got {other:?}"),
    }
}

#[tokio::test]
async fn validate_accepts_valid_and_validated() {
    for status in ["VALID", "VALIDATED"] {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/validator/api/validationserverAPI.php"))
            .and(query_param("val_id", "VAL-1"))
            .and(query_param("store_id", "teststore"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": status,
                "amount": "200.00",
                "currency_type": "BDT",
            })))
            .mount(&server)
            .await;

        let gateway = gateway_for(&server);
        let validation = gateway.validate("VAL-1", "TXN-X").await.unwrap();
        assert_eq!(validation.amount, "200.00");
        assert_eq!(validation.currency.as_deref(), Some("BDT"));
    }
}

#[tokio::test]
async fn validate_handles_numeric_amount() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/validator/api/validationserverAPI.php"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "VALID",
            "amount": 200.0,
        })))
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    let validation = gateway.validate("VAL-1", "TXN-X").await.unwrap();
    assert_eq!(validation.amount, "200.0");
}

#[tokio::test]
async fn validate_rejects_other_statuses() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/validator/api/validationserverAPI.php"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "INVALID_TRANSACTION",
        })))
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    let err = gateway.validate("VAL-1", "TXN-X").await.unwrap_err();
    assert!(matches!(err, GatewayError::Declined(_)));
}
