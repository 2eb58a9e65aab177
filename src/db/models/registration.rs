use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::OffsetDateTime;
use uuid::Uuid;

/// Bangladesh mobile numbers: `+8801XXXXXXXXX` or `01XXXXXXXXX`, operator
/// digit 3 through 9.
pub static BD_MOBILE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\+8801|01)[3-9]\d{8}$").expect("valid phone regex")
});

pub const GRADE_MIN: i16 = 2;
pub const GRADE_MAX: i16 = 12;

/// Registration status mirrors the payment lifecycle, with `Free` for
/// zero-fee workshops that never enter it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "registration_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    Pending,
    Completed,
    Failed,
    Cancelled,
    Free,
}

impl RegistrationStatus {
    /// Whether the registration occupies a capacity slot.
    pub fn consumes_slot(self) -> bool {
        matches!(self, Self::Completed | Self::Free)
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Registration {
    pub id: Uuid,
    pub registration_number: String,
    pub workshop_id: Uuid,
    pub student_name: String,
    pub grade: i16,
    pub school_id: Option<Uuid>,
    /// Transitional free-text school name; resolved to `school_id` by the
    /// backfill tool.
    pub school_name: String,
    pub contact_number: String,
    pub email: String,
    pub payment_status: RegistrationStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub registered_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Public registration submission. Field checks run in the ledger in a
/// fixed order so the caller always sees the most relevant rejection.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationForm {
    pub student_name: String,
    pub grade: i16,
    pub school_id: Option<Uuid>,
    #[serde(default)]
    pub school_name: String,
    pub contact_number: String,
    pub email: String,
    #[serde(default)]
    pub terms_agreed: bool,
}

#[derive(Debug, Clone)]
pub struct NewRegistration {
    pub registration_number: String,
    pub workshop_id: Uuid,
    pub student_name: String,
    pub grade: i16,
    pub school_id: Option<Uuid>,
    pub school_name: String,
    pub contact_number: String,
    pub email: String,
    pub payment_status: RegistrationStatus,
}

/// `REG-YYYYMMDD-XXXXX` where the suffix is five uppercase hex characters
/// from a fresh UUID. Uniqueness is enforced by the database; a collision
/// inside one day's 16^5 space surfaces as a duplicate-key error.
pub fn generate_registration_number() -> String {
    let date_fmt = format_description!("[year][month][day]");
    let today = OffsetDateTime::now_utc()
        .date()
        .format(&date_fmt)
        .unwrap_or_else(|_| "00000000".to_string());
    let suffix = Uuid::new_v4().simple().to_string()[..5].to_uppercase();
    format!("REG-{today}-{suffix}")
}

/// Admin list/export filter. All fields optional and combined with AND.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrationFilter {
    pub workshop_id: Option<Uuid>,
    pub status: Option<RegistrationStatus>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StatusBreakdown {
    pub pending: i64,
    pub completed: i64,
    pub failed: i64,
    pub cancelled: i64,
    pub free: i64,
}

/// One row of the admin export, already joined with the workshop and the
/// resolved school name.
#[derive(Debug, Clone, Serialize)]
pub struct ExportRow {
    pub registration_number: String,
    pub workshop_name: String,
    pub workshop_date: String,
    pub student_name: String,
    pub grade: i16,
    pub school: String,
    pub contact_number: String,
    pub email: String,
    pub payment_status: RegistrationStatus,
    pub fee: Decimal,
    #[serde(with = "time::serde::rfc3339")]
    pub registered_at: OffsetDateTime,
}
