pub mod otp_verification;

pub use otp_verification::*;
