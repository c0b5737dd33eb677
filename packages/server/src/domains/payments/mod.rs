//! Payments domain - transaction records against registrations
//!
//! Responsibilities:
//! - Recording completed payments with a generated transaction reference
//! - Keeping the registration's denormalized payment columns in sync,
//!   atomically with the transaction insert

pub mod actions;
pub mod models;

pub use actions::*;
pub use models::*;
