//! Payments domain actions - business logic functions

mod record_payment;

pub use record_payment::{record_payment, PaymentOutcome, PaymentRequest};
