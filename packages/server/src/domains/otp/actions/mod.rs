//! OTP domain actions - business logic functions
//!
//! Actions own the workflow semantics and the error messages; route handlers
//! stay thin adapters over them.

mod send_otp;
mod verify_otp;

pub use send_otp::{send_otp, SendOtpResult};
pub use verify_otp::{verify_otp, VerifyOtpResult};
