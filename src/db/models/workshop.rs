use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;
use validator::Validate;

/// A scheduled workshop open for registration. `capacity` counts paid or
/// free slots only; a registration with a pending payment does not occupy
/// one unless strict lifecycle mode is on.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Workshop {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub workshop_date: String,
    pub workshop_time: String,
    pub duration: String,
    pub venue: String,
    pub organizer: String,
    pub fee: Decimal,
    pub capacity: i32,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Workshop {
    /// A zero fee makes the workshop free; registrations confirm instantly
    /// without touching the payment gateway.
    pub fn is_free(&self) -> bool {
        self.fee.is_zero()
    }

    pub fn available_slots(&self, confirmed: i64) -> i64 {
        (i64::from(self.capacity) - confirmed).max(0)
    }

    pub fn is_full(&self, confirmed: i64) -> bool {
        confirmed >= i64::from(self.capacity)
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewWorkshop {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub workshop_date: String,
    #[serde(default)]
    pub workshop_time: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub venue: String,
    #[serde(default)]
    pub organizer: String,
    pub fee: Decimal,
    #[validate(range(min = 0))]
    pub capacity: i32,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateWorkshop {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub workshop_date: Option<String>,
    pub workshop_time: Option<String>,
    pub duration: Option<String>,
    pub venue: Option<String>,
    pub organizer: Option<String>,
    pub fee: Option<Decimal>,
    #[validate(range(min = 0))]
    pub capacity: Option<i32>,
    pub is_active: Option<bool>,
}

/// Workshop listing entry with derived occupancy figures.
#[derive(Debug, Clone, Serialize)]
pub struct WorkshopSummary {
    #[serde(flatten)]
    pub workshop: Workshop,
    pub is_free: bool,
    pub confirmed_count: i64,
    pub available_slots: i64,
    pub is_full: bool,
}

impl WorkshopSummary {
    pub fn new(workshop: Workshop, confirmed: i64) -> Self {
        let is_free = workshop.is_free();
        let available_slots = workshop.available_slots(confirmed);
        let is_full = workshop.is_full(confirmed);
        Self {
            workshop,
            is_free,
            confirmed_count: confirmed,
            available_slots,
            is_full,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn workshop(fee: Decimal, capacity: i32) -> Workshop {
        Workshop {
            id: Uuid::new_v4(),
            name: "Robotics 101".to_string(),
            description: String::new(),
            workshop_date: "2026-09-01".to_string(),
            workshop_time: "10:00 AM".to_string(),
            duration: "3 hours".to_string(),
            venue: "Main Hall".to_string(),
            organizer: "STEM Club".to_string(),
            fee,
            capacity,
            is_active: true,
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn zero_fee_is_free() {
        assert!(workshop(dec!(0.00), 40).is_free());
        assert!(!workshop(dec!(200.00), 40).is_free());
    }

    #[test]
    fn available_slots_never_negative() {
        let w = workshop(dec!(200.00), 2);
        assert_eq!(w.available_slots(0), 2);
        assert_eq!(w.available_slots(2), 0);
        assert_eq!(w.available_slots(5), 0);
    }

    #[test]
    fn zero_capacity_is_always_full() {
        let w = workshop(dec!(200.00), 0);
        assert!(w.is_full(0));
    }
}
