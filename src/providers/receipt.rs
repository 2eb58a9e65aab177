use time::macros::format_description;
use time::OffsetDateTime;

use crate::db::models::{Payment, Registration, Workshop};

use super::{ReceiptError, ReceiptRenderer};

/// Everything a receipt shows, assembled by the ledger before rendering.
#[derive(Debug, Clone)]
pub struct ReceiptContext {
    pub registration: Registration,
    pub workshop: Workshop,
    /// Resolved school name, falling back to the transitional free text.
    pub school: String,
    pub payment: Option<Payment>,
}

/// Plain-text receipt renderer. The document layout mirrors the mailed
/// confirmation; a PDF backend can replace this behind the same trait.
#[derive(Debug, Clone, Default)]
pub struct TextReceiptRenderer;

impl ReceiptRenderer for TextReceiptRenderer {
    fn render(&self, ctx: &ReceiptContext) -> Result<Vec<u8>, ReceiptError> {
        let fmt = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
        let registered_at = ctx
            .registration
            .registered_at
            .format(&fmt)
            .map_err(|e| ReceiptError::Render(e.to_string()))?;
        let generated_at = OffsetDateTime::now_utc()
            .format(&fmt)
            .map_err(|e| ReceiptError::Render(e.to_string()))?;

        let (payment_status, amount) = if ctx.workshop.is_free() {
            ("FREE WORKSHOP".to_string(), "0.00 BDT".to_string())
        } else {
            (
                format!("{:?}", ctx.registration.payment_status),
                format!("{} BDT", ctx.workshop.fee),
            )
        };

        let mut doc = String::new();
        doc.push_str("WORKSHOP REGISTRATION RECEIPT\n");
        doc.push_str("=============================\n\n");
        doc.push_str(&format!(
            "Registration No: {}\n\n",
            ctx.registration.registration_number
        ));
        doc.push_str("Workshop Details\n----------------\n");
        doc.push_str(&format!("Workshop Name:  {}\n", ctx.workshop.name));
        doc.push_str(&format!("Date:           {}\n", ctx.workshop.workshop_date));
        doc.push_str(&format!("Time:           {}\n", ctx.workshop.workshop_time));
        doc.push_str(&format!("Duration:       {}\n", ctx.workshop.duration));
        doc.push_str(&format!("Venue:          {}\n", ctx.workshop.venue));
        doc.push_str(&format!("Organizer:      {}\n\n", ctx.workshop.organizer));
        doc.push_str("Student Information\n-------------------\n");
        doc.push_str(&format!("Student Name:   {}\n", ctx.registration.student_name));
        doc.push_str(&format!("Grade:          {}\n", ctx.registration.grade));
        doc.push_str(&format!("School:         {}\n", ctx.school));
        doc.push_str(&format!("Contact Number: {}\n", ctx.registration.contact_number));
        doc.push_str(&format!("Email:          {}\n\n", ctx.registration.email));
        doc.push_str("Payment Information\n-------------------\n");
        doc.push_str(&format!("Workshop Fee:      {amount}\n"));
        doc.push_str(&format!("Payment Status:    {payment_status}\n"));
        doc.push_str(&format!("Registration Date: {registered_at}\n"));

        if let Some(payment) = &ctx.payment {
            doc.push_str(&format!("Transaction ID:    {}\n", payment.transaction_id));
            if let Some(completed_at) = payment.completed_at {
                if let Ok(completed) = completed_at.format(&fmt) {
                    doc.push_str(&format!("Payment Date:      {completed}\n"));
                }
            }
        }

        doc.push_str("\nThis is a computer-generated receipt and does not require a signature.\n");
        doc.push_str(&format!("Generated on: {generated_at}\n"));

        Ok(doc.into_bytes())
    }

    fn filename(&self, ctx: &ReceiptContext) -> String {
        format!("receipt_{}.txt", ctx.registration.registration_number)
    }

    fn content_type(&self) -> &'static str {
        "text/plain; charset=utf-8"
    }
}
