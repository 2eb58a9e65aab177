mod common;

use rust_decimal_macros::dec;

use common::{form, harness, workshop, BASE_URL};
use workshop_registration::db::models::{PaymentStatus, RegistrationStatus};
use workshop_registration::error::{AppError, RegistrationError};
use workshop_registration::modules::payments::CallbackOutcome;
use workshop_registration::providers::GatewayError;

#[tokio::test]
async fn initiate_opens_checkout_and_records_pending_payment() {
    let h = harness(false);
    let w = workshop(dec!(200.00), 40);
    h.store.add_workshop(w.clone());
    let registration = h.ledger.submit(w.id, &form("a@example.com")).await.unwrap();

    let session = h.lifecycle.initiate(registration.id).await.unwrap();

    assert!(session
        .transaction_id
        .starts_with(&format!("TXN-{}", registration.registration_number)));
    assert!(session.redirect_url.contains(&session.transaction_id));
    assert_eq!(h.store.payment_count(), 1);

    let request = h.gateway.last_request().unwrap();
    assert_eq!(request.amount, dec!(200.00));
    assert_eq!(request.currency, "BDT");
    assert_eq!(request.value_a, registration.registration_number);
    assert_eq!(
        request.success_url,
        format!("{BASE_URL}/payments/callback/success")
    );
    assert_eq!(request.fail_url, format!("{BASE_URL}/payments/callback/fail"));
    assert_eq!(
        request.cancel_url,
        format!("{BASE_URL}/payments/callback/cancel")
    );
}

#[tokio::test]
async fn initiate_rejects_free_workshop() {
    let h = harness(false);
    let w = workshop(dec!(0.00), 40);
    h.store.add_workshop(w.clone());
    let registration = h.ledger.submit(w.id, &form("a@example.com")).await.unwrap();

    let err = h.lifecycle.initiate(registration.id).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(h.store.payment_count(), 0);
}

#[tokio::test]
async fn gateway_outage_leaves_no_payment_row() {
    let h = harness(false);
    let w = workshop(dec!(200.00), 40);
    h.store.add_workshop(w.clone());
    let registration = h.ledger.submit(w.id, &form("a@example.com")).await.unwrap();

    h.gateway
        .fail_initiate(GatewayError::Transport("connection refused".to_string()));

    let err = h.lifecycle.initiate(registration.id).await.unwrap_err();
    assert!(matches!(err, AppError::Gateway(_)));
    assert_eq!(h.store.payment_count(), 0);
    // The registration stays pending and can retry.
    assert_eq!(
        h.store.registration(registration.id).unwrap().payment_status,
        RegistrationStatus::Pending
    );
}

#[tokio::test]
async fn reinitiating_reuses_the_open_checkout() {
    let h = harness(false);
    let w = workshop(dec!(200.00), 40);
    h.store.add_workshop(w.clone());
    let registration = h.ledger.submit(w.id, &form("a@example.com")).await.unwrap();

    let first = h.lifecycle.initiate(registration.id).await.unwrap();
    let second = h.lifecycle.initiate(registration.id).await.unwrap();

    assert_eq!(first.transaction_id, second.transaction_id);
    assert_eq!(h.store.payment_count(), 1);
    assert_eq!(h.gateway.initiate_calls(), 2);
}

#[tokio::test]
async fn successful_callback_completes_payment_and_registration() {
    let h = harness(false);
    let w = workshop(dec!(200.00), 40);
    h.store.add_workshop(w.clone());
    let registration = h.ledger.submit(w.id, &form("a@example.com")).await.unwrap();
    let session = h.lifecycle.initiate(registration.id).await.unwrap();

    let outcome = h
        .lifecycle
        .handle_success(&session.transaction_id, "VAL-1")
        .await
        .unwrap();

    assert_eq!(outcome, CallbackOutcome::Completed);
    assert_eq!(
        h.store.registration(registration.id).unwrap().payment_status,
        RegistrationStatus::Completed
    );

    let payment = {
        use workshop_registration::db::repositories::PaymentRepository;
        h.store
            .find_by_transaction_id(&session.transaction_id)
            .await
            .unwrap()
            .unwrap()
    };
    assert_eq!(payment.payment_status, PaymentStatus::Completed);
    assert!(payment.completed_at.is_some());
    assert!(payment.gateway_payload.is_some());

    assert_eq!(h.notifier.payment_confirmations(), vec!["a@example.com"]);
}

#[tokio::test]
async fn completed_at_set_only_when_completed() {
    let h = harness(false);
    let w = workshop(dec!(200.00), 40);
    h.store.add_workshop(w.clone());
    let registration = h.ledger.submit(w.id, &form("a@example.com")).await.unwrap();
    let session = h.lifecycle.initiate(registration.id).await.unwrap();

    h.lifecycle
        .handle_fail(&session.transaction_id)
        .await
        .unwrap();

    let payment = {
        use workshop_registration::db::repositories::PaymentRepository;
        h.store
            .find_by_transaction_id(&session.transaction_id)
            .await
            .unwrap()
            .unwrap()
    };
    assert_eq!(payment.payment_status, PaymentStatus::Failed);
    assert!(payment.completed_at.is_none());
}

#[tokio::test]
async fn amount_mismatch_fails_the_payment() {
    let h = harness(false);
    let w = workshop(dec!(200.00), 40);
    h.store.add_workshop(w.clone());
    let registration = h.ledger.submit(w.id, &form("a@example.com")).await.unwrap();

    h.gateway.report_amount("150.00");
    let session = h.lifecycle.initiate(registration.id).await.unwrap();

    let outcome = h
        .lifecycle
        .handle_success(&session.transaction_id, "VAL-1")
        .await
        .unwrap();

    assert_eq!(outcome, CallbackOutcome::AmountMismatch);
    assert_eq!(
        h.store.registration(registration.id).unwrap().payment_status,
        RegistrationStatus::Failed
    );
    assert!(h.notifier.payment_confirmations().is_empty());
}

#[tokio::test]
async fn validation_decline_fails_the_payment() {
    let h = harness(false);
    let w = workshop(dec!(200.00), 40);
    h.store.add_workshop(w.clone());
    let registration = h.ledger.submit(w.id, &form("a@example.com")).await.unwrap();
    let session = h.lifecycle.initiate(registration.id).await.unwrap();

    h.gateway
        .fail_validate(GatewayError::Declined("not valid".to_string()));

    let outcome = h
        .lifecycle
        .handle_success(&session.transaction_id, "VAL-1")
        .await
        .unwrap();

    assert_eq!(outcome, CallbackOutcome::ValidationFailed);
    assert_eq!(
        h.store.registration(registration.id).unwrap().payment_status,
        RegistrationStatus::Failed
    );
}

#[tokio::test]
async fn validation_transport_error_keeps_payment_pending() {
    let h = harness(false);
    let w = workshop(dec!(200.00), 40);
    h.store.add_workshop(w.clone());
    let registration = h.ledger.submit(w.id, &form("a@example.com")).await.unwrap();
    let session = h.lifecycle.initiate(registration.id).await.unwrap();

    h.gateway
        .fail_validate(GatewayError::Transport("timeout".to_string()));

    let err = h
        .lifecycle
        .handle_success(&session.transaction_id, "VAL-1")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Gateway(_)));
    assert_eq!(
        h.store.registration(registration.id).unwrap().payment_status,
        RegistrationStatus::Pending
    );
}

#[tokio::test]
async fn unknown_transaction_is_an_outcome_not_an_error() {
    let h = harness(false);

    let outcome = h.lifecycle.handle_cancel("TXN-UNKNOWN").await.unwrap();
    assert_eq!(outcome, CallbackOutcome::PaymentNotFound);

    let outcome = h
        .lifecycle
        .handle_success("TXN-UNKNOWN", "VAL-1")
        .await
        .unwrap();
    assert_eq!(outcome, CallbackOutcome::PaymentNotFound);
    assert_eq!(h.gateway.validate_calls(), 0);
}

#[tokio::test]
async fn cancel_callback_mirrors_onto_registration() {
    let h = harness(false);
    let w = workshop(dec!(200.00), 40);
    h.store.add_workshop(w.clone());
    let registration = h.ledger.submit(w.id, &form("a@example.com")).await.unwrap();
    let session = h.lifecycle.initiate(registration.id).await.unwrap();

    let outcome = h
        .lifecycle
        .handle_cancel(&session.transaction_id)
        .await
        .unwrap();

    assert_eq!(outcome, CallbackOutcome::Cancelled);
    assert_eq!(
        h.store.registration(registration.id).unwrap().payment_status,
        RegistrationStatus::Cancelled
    );
}

#[tokio::test]
async fn relaxed_mode_reprocesses_duplicate_success_callbacks() {
    // Original behavior: a replayed success callback re-validates and sends
    // the confirmation again.
    let h = harness(false);
    let w = workshop(dec!(200.00), 40);
    h.store.add_workshop(w.clone());
    let registration = h.ledger.submit(w.id, &form("a@example.com")).await.unwrap();
    let session = h.lifecycle.initiate(registration.id).await.unwrap();

    h.lifecycle
        .handle_success(&session.transaction_id, "VAL-1")
        .await
        .unwrap();
    let outcome = h
        .lifecycle
        .handle_success(&session.transaction_id, "VAL-1")
        .await
        .unwrap();

    assert_eq!(outcome, CallbackOutcome::Completed);
    assert_eq!(h.notifier.payment_confirmations().len(), 2);
    assert_eq!(h.gateway.validate_calls(), 2);
    // Even when reprocessed, no second payment row appears.
    assert_eq!(h.store.payment_count(), 1);
}

#[tokio::test]
async fn strict_mode_deduplicates_success_callbacks() {
    let h = harness(true);
    let w = workshop(dec!(200.00), 40);
    h.store.add_workshop(w.clone());
    let registration = h.ledger.submit(w.id, &form("a@example.com")).await.unwrap();
    let session = h.lifecycle.initiate(registration.id).await.unwrap();

    h.lifecycle
        .handle_success(&session.transaction_id, "VAL-1")
        .await
        .unwrap();

    let completed_at = {
        use workshop_registration::db::repositories::PaymentRepository;
        h.store
            .find_by_transaction_id(&session.transaction_id)
            .await
            .unwrap()
            .unwrap()
            .completed_at
    };

    let outcome = h
        .lifecycle
        .handle_success(&session.transaction_id, "VAL-1")
        .await
        .unwrap();

    assert_eq!(outcome, CallbackOutcome::AlreadyCompleted);
    assert_eq!(h.notifier.payment_confirmations().len(), 1);
    assert_eq!(h.gateway.validate_calls(), 1);
    assert_eq!(h.store.payment_count(), 1);

    let after = {
        use workshop_registration::db::repositories::PaymentRepository;
        h.store
            .find_by_transaction_id(&session.transaction_id)
            .await
            .unwrap()
            .unwrap()
            .completed_at
    };
    assert_eq!(after, completed_at);
}

#[tokio::test]
async fn strict_mode_initiate_respects_capacity() {
    let h = harness(true);
    let w = workshop(dec!(200.00), 1);
    h.store.add_workshop(w.clone());

    // Both registrations fit while no checkout is open.
    let first = h.ledger.submit(w.id, &form("a@example.com")).await.unwrap();
    let second = h.ledger.submit(w.id, &form("b@example.com")).await;
    // In strict mode a plain pending registration holds no slot yet.
    let second = second.unwrap();

    h.lifecycle.initiate(first.id).await.unwrap();
    let err = h.lifecycle.initiate(second.id).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Registration(RegistrationError::WorkshopFull { .. })
    ));
}

#[tokio::test]
async fn failed_payment_email_does_not_block_completion() {
    let h = harness(false);
    let w = workshop(dec!(200.00), 40);
    h.store.add_workshop(w.clone());
    let registration = h.ledger.submit(w.id, &form("a@example.com")).await.unwrap();
    let session = h.lifecycle.initiate(registration.id).await.unwrap();

    h.notifier.fail_sends();

    let outcome = h
        .lifecycle
        .handle_success(&session.transaction_id, "VAL-1")
        .await
        .unwrap();
    assert_eq!(outcome, CallbackOutcome::Completed);
    assert_eq!(
        h.store.registration(registration.id).unwrap().payment_status,
        RegistrationStatus::Completed
    );
}
