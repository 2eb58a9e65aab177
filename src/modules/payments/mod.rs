pub mod handlers;
pub mod routes;
pub mod service;

pub use service::{CallbackOutcome, PaymentLifecycle};
