pub mod admin;
pub mod payments;
pub mod registrations;
pub mod schools;
pub mod workshops;
