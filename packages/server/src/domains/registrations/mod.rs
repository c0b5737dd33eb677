//! Registrations domain - the multi-step form aggregate
//!
//! Responsibilities:
//! - Creating registrations from a verified first step (OTP-gated)
//! - Merging per-section form payloads into the stored document
//! - Promoting denormalized columns at steps 1, 3 and 8

pub mod actions;
pub mod models;

pub use actions::*;
pub use models::*;

/// Highest valid form step. Steps run 1..=MAX_STEP.
pub const MAX_STEP: i32 = 8;
