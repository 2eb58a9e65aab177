use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use secrecy::ExposeSecret;
use time::macros::format_description;

use crate::config::EmailConfig;
use crate::db::models::{Payment, Registration, Workshop};

use super::{Notifier, NotifyError};

/// SMTP notifier sending plain-text confirmations via Lettre.
#[derive(Clone)]
pub struct SmtpNotifier {
    smtp_server: String,
    smtp_port: u16,
    credentials: Credentials,
    from_email: String,
    from_name: String,
}

impl SmtpNotifier {
    pub fn new(config: &EmailConfig) -> Self {
        Self {
            smtp_server: config.smtp_server.clone(),
            smtp_port: config.smtp_port,
            credentials: Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.expose_secret().to_string(),
            ),
            from_email: config.from_email.clone(),
            from_name: config.from_name.clone(),
        }
    }

    fn build_transport(&self) -> Result<SmtpTransport, NotifyError> {
        Ok(SmtpTransport::relay(&self.smtp_server)
            .map_err(|e| NotifyError::Email(format!("SMTP relay error: {e}")))?
            .port(self.smtp_port)
            .credentials(self.credentials.clone())
            .build())
    }

    fn from_header(&self) -> String {
        format!("{} <{}>", self.from_name, self.from_email)
    }

    async fn send(&self, to: &str, subject: &str, body: String) -> Result<(), NotifyError> {
        let email = Message::builder()
            .from(
                self.from_header()
                    .parse()
                    .map_err(|e| NotifyError::Email(format!("Invalid from address: {e}")))?,
            )
            .to(to
                .parse()
                .map_err(|e| NotifyError::Email(format!("Invalid to address: {e}")))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| NotifyError::Email(format!("Failed to build email: {e}")))?;

        let mailer = self.build_transport()?;

        tokio::task::spawn_blocking(move || {
            mailer
                .send(&email)
                .map_err(|e| NotifyError::Email(format!("Failed to send email: {e}")))
        })
        .await
        .map_err(|e| NotifyError::Email(format!("Email task failed: {e}")))?
        .map(|_| ())
    }
}

fn fee_line(workshop: &Workshop) -> String {
    if workshop.is_free() {
        "FREE".to_string()
    } else {
        format!("{} BDT", workshop.fee)
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send_confirmation(
        &self,
        registration: &Registration,
        workshop: &Workshop,
    ) -> Result<(), NotifyError> {
        let subject = format!("Workshop Registration Confirmed - {}", workshop.name);
        let body = format!(
            "Dear {student},\n\n\
             Your registration for the workshop \"{workshop}\" has been confirmed!\n\n\
             Registration Details:\n\
             - Registration Number: {number}\n\
             - Workshop: {workshop}\n\
             - Date: {date}\n\
             - Time: {time}\n\
             - Venue: {venue}\n\
             - Fee: {fee}\n\n\
             Please save your registration number for future reference.\n",
            student = registration.student_name,
            workshop = workshop.name,
            number = registration.registration_number,
            date = workshop.workshop_date,
            time = workshop.workshop_time,
            venue = workshop.venue,
            fee = fee_line(workshop),
        );
        self.send(&registration.email, &subject, body).await
    }

    async fn send_payment_confirmation(
        &self,
        registration: &Registration,
        workshop: &Workshop,
        payment: &Payment,
    ) -> Result<(), NotifyError> {
        let fmt = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
        let completed = payment
            .completed_at
            .and_then(|t| t.format(&fmt).ok())
            .unwrap_or_else(|| "N/A".to_string());

        let subject = format!("Payment Confirmed - {}", workshop.name);
        let body = format!(
            "Dear {student},\n\n\
             Your payment for the workshop \"{workshop}\" has been successfully processed!\n\n\
             Payment Details:\n\
             - Transaction ID: {tran_id}\n\
             - Amount: {amount} {currency}\n\
             - Status: Completed\n\
             - Date: {completed}\n\n\
             Registration Details:\n\
             - Registration Number: {number}\n\
             - Workshop: {workshop}\n\
             - Date: {date}\n\
             - Time: {time}\n\
             - Venue: {venue}\n\n\
             You can download your receipt from the website using your registration number.\n",
            student = registration.student_name,
            workshop = workshop.name,
            tran_id = payment.transaction_id,
            amount = payment.amount,
            currency = payment.currency,
            completed = completed,
            number = registration.registration_number,
            date = workshop.workshop_date,
            time = workshop.workshop_time,
            venue = workshop.venue,
        );
        self.send(&registration.email, &subject, body).await
    }
}
