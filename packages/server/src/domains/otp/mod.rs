//! OTP domain - identity verification for registration
//!
//! Responsibilities:
//! - Issuing one-time codes over email and WhatsApp
//! - Verifying codes with attempt counting and expiry
//! - Gating registration creation on a verified identity

pub mod actions;
pub mod models;

pub use actions::*;
pub use models::*;

/// Number of digits in a generated OTP code.
pub const OTP_LENGTH: usize = 6;

/// Minutes before an issued code expires. Applies to verified rows too:
/// the verified flag is only honored within this window.
pub const OTP_TTL_MINUTES: i64 = 5;

/// Wrong guesses allowed per issued code before it is invalidated.
pub const MAX_ATTEMPTS: i32 = 5;
