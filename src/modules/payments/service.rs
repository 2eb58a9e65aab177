use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::models::{
    generate_transaction_id, NewPayment, Payment, PaymentMethod, PaymentStatus, Registration,
    RegistrationStatus, Workshop,
};
use crate::db::repositories::{PaymentRepository, RegistrationRepository, WorkshopRepository};
use crate::error::{AppError, AppResult, RegistrationError};
use crate::providers::{
    amounts_match, CustomerInfo, GatewayError, InitiateRequest, Notifier, PaymentGateway,
};

/// Result of a checkout initiation: where to send the payer.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutSession {
    pub redirect_url: String,
    pub transaction_id: String,
}

/// Terminal result of processing a gateway callback. Every variant is an
/// ordinary outcome; the callback endpoints report all of them with a 200
/// so the provider never retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackOutcome {
    Completed,
    /// Strict mode only: a repeated success callback for an already
    /// completed payment changes nothing and sends nothing.
    AlreadyCompleted,
    ValidationFailed,
    AmountMismatch,
    Failed,
    Cancelled,
    /// The transaction id matches no payment we issued.
    PaymentNotFound,
}

/// Drives a payment from initiation through the gateway callbacks to a
/// terminal state, mirroring every transition onto the registration.
pub struct PaymentLifecycle {
    workshops: Arc<dyn WorkshopRepository>,
    registrations: Arc<dyn RegistrationRepository>,
    payments: Arc<dyn PaymentRepository>,
    gateway: Arc<dyn PaymentGateway>,
    notifier: Arc<dyn Notifier>,
    currency: String,
    /// Public base URL the gateway sends the payer back to.
    base_url: String,
    strict: bool,
}

impl PaymentLifecycle {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        workshops: Arc<dyn WorkshopRepository>,
        registrations: Arc<dyn RegistrationRepository>,
        payments: Arc<dyn PaymentRepository>,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn Notifier>,
        currency: String,
        base_url: String,
        strict: bool,
    ) -> Self {
        Self {
            workshops,
            registrations,
            payments,
            gateway,
            notifier,
            currency,
            base_url,
            strict,
        }
    }

    /// Start a hosted checkout for a pending registration.
    ///
    /// The payment row is only written once the gateway has accepted the
    /// session, so a gateway outage leaves no dangling pending payments.
    /// Re-initiating an unresolved checkout reuses its transaction id.
    pub async fn initiate(&self, registration_id: Uuid) -> AppResult<CheckoutSession> {
        let registration = self
            .registrations
            .find(registration_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Registration not found".to_string()))?;

        let workshop = self
            .workshops
            .find(registration.workshop_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Workshop not found".to_string()))?;

        if workshop.is_free() || registration.payment_status == RegistrationStatus::Free {
            return Err(AppError::Conflict(
                "This workshop is free; no payment is required".to_string(),
            ));
        }

        if registration.payment_status == RegistrationStatus::Completed {
            return Err(AppError::Conflict(
                "Payment has already been completed".to_string(),
            ));
        }

        let existing = self.payments.find_by_registration(registration.id).await?;

        if let Some(payment) = &existing {
            if payment.payment_status == PaymentStatus::Completed {
                return Err(AppError::Conflict(
                    "Payment has already been completed".to_string(),
                ));
            }
        }

        // In strict mode an initiated checkout holds a slot, so the capacity
        // check repeats here with reservations included. A fresh initiation
        // may no longer fit even though the registration was accepted.
        if self.strict && existing.is_none() {
            let confirmed = self.workshops.confirmed_count(workshop.id).await?;
            let reserved = self.workshops.reserved_count(workshop.id).await?;
            if workshop.is_full(confirmed + reserved) {
                return Err(RegistrationError::WorkshopFull {
                    capacity: workshop.capacity,
                }
                .into());
            }
        }

        let transaction_id = match &existing {
            Some(payment) => payment.transaction_id.clone(),
            None => generate_transaction_id(&registration.registration_number),
        };

        let request = self.build_initiate_request(&registration, &workshop, &transaction_id);

        let session = match self.gateway.initiate(&request).await {
            Ok(session) => session,
            Err(err) => {
                warn!(
                    transaction_id = %transaction_id,
                    error = %err,
                    "checkout initiation failed"
                );
                return Err(AppError::Gateway(err.to_string()));
            }
        };

        if existing.is_none() {
            let new = NewPayment {
                registration_id: registration.id,
                transaction_id: transaction_id.clone(),
                amount: workshop.fee,
                currency: self.currency.clone(),
                payment_method: PaymentMethod::Gateway,
                gateway_payload: Some(session.raw_response.clone()),
            };
            self.payments.insert(&new).await?;
        }

        info!(
            transaction_id = %transaction_id,
            registration_number = %registration.registration_number,
            "checkout session opened"
        );

        Ok(CheckoutSession {
            redirect_url: session.redirect_url,
            transaction_id,
        })
    }

    /// Process a success callback: validate with the gateway, verify the
    /// amount, then complete the payment and notify the payer.
    pub async fn handle_success(
        &self,
        transaction_id: &str,
        val_id: &str,
    ) -> AppResult<CallbackOutcome> {
        let Some(payment) = self.payments.find_by_transaction_id(transaction_id).await? else {
            warn!(transaction_id = %transaction_id, "success callback for unknown transaction");
            return Ok(CallbackOutcome::PaymentNotFound);
        };

        if self.strict && payment.payment_status == PaymentStatus::Completed {
            info!(transaction_id = %transaction_id, "duplicate success callback ignored");
            return Ok(CallbackOutcome::AlreadyCompleted);
        }

        let validation = match self.gateway.validate(val_id, transaction_id).await {
            Ok(validation) => validation,
            Err(GatewayError::Declined(reason)) => {
                warn!(transaction_id = %transaction_id, reason = %reason, "validation declined");
                self.payments
                    .transition(payment.id, PaymentStatus::Failed, None)
                    .await?;
                return Ok(CallbackOutcome::ValidationFailed);
            }
            Err(err @ GatewayError::Transport(_)) => {
                // The payment stays pending; the outcome is unknown, not
                // failed.
                return Err(AppError::Gateway(err.to_string()));
            }
        };

        if !amounts_match(&validation.amount, payment.amount) {
            warn!(
                transaction_id = %transaction_id,
                reported = %validation.amount,
                expected = %payment.amount,
                "validated amount does not match"
            );
            self.payments
                .transition(
                    payment.id,
                    PaymentStatus::Failed,
                    Some(validation.raw_response),
                )
                .await?;
            return Ok(CallbackOutcome::AmountMismatch);
        }

        let payment = self
            .payments
            .transition(
                payment.id,
                PaymentStatus::Completed,
                Some(validation.raw_response),
            )
            .await?;

        info!(transaction_id = %transaction_id, "payment completed");

        self.notify_completed(&payment).await;

        Ok(CallbackOutcome::Completed)
    }

    /// Process a failure callback from the gateway.
    pub async fn handle_fail(&self, transaction_id: &str) -> AppResult<CallbackOutcome> {
        self.resolve(transaction_id, PaymentStatus::Failed, CallbackOutcome::Failed)
            .await
    }

    /// Process a cancellation callback: the payer abandoned the checkout.
    pub async fn handle_cancel(&self, transaction_id: &str) -> AppResult<CallbackOutcome> {
        self.resolve(
            transaction_id,
            PaymentStatus::Cancelled,
            CallbackOutcome::Cancelled,
        )
        .await
    }

    async fn resolve(
        &self,
        transaction_id: &str,
        status: PaymentStatus,
        outcome: CallbackOutcome,
    ) -> AppResult<CallbackOutcome> {
        let Some(payment) = self.payments.find_by_transaction_id(transaction_id).await? else {
            warn!(transaction_id = %transaction_id, "callback for unknown transaction");
            return Ok(CallbackOutcome::PaymentNotFound);
        };

        if self.strict && payment.payment_status == status {
            return Ok(outcome);
        }

        self.payments.transition(payment.id, status, None).await?;
        info!(transaction_id = %transaction_id, status = ?status, "payment resolved");
        Ok(outcome)
    }

    fn build_initiate_request(
        &self,
        registration: &Registration,
        workshop: &Workshop,
        transaction_id: &str,
    ) -> InitiateRequest {
        InitiateRequest {
            amount: workshop.fee,
            currency: self.currency.clone(),
            transaction_id: transaction_id.to_string(),
            customer: CustomerInfo {
                name: registration.student_name.clone(),
                email: registration.email.clone(),
                phone: registration.contact_number.clone(),
                address: registration.school_name.clone(),
            },
            product_name: workshop.name.clone(),
            success_url: format!("{}/payments/callback/success", self.base_url),
            fail_url: format!("{}/payments/callback/fail", self.base_url),
            cancel_url: format!("{}/payments/callback/cancel", self.base_url),
            value_a: registration.registration_number.clone(),
            value_b: workshop.id.to_string(),
        }
    }

    async fn notify_completed(&self, payment: &Payment) {
        let registration = match self.registrations.find(payment.registration_id).await {
            Ok(Some(registration)) => registration,
            Ok(None) => return,
            Err(err) => {
                warn!(error = %err, "could not load registration for payment email");
                return;
            }
        };
        let workshop = match self.workshops.find(registration.workshop_id).await {
            Ok(Some(workshop)) => workshop,
            Ok(None) => return,
            Err(err) => {
                warn!(error = %err, "could not load workshop for payment email");
                return;
            }
        };
        if let Err(err) = self
            .notifier
            .send_payment_confirmation(&registration, &workshop, payment)
            .await
        {
            warn!(
                transaction_id = %payment.transaction_id,
                error = %err,
                "payment confirmation email failed"
            );
        }
    }
}
