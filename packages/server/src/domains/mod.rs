// Business domains
pub mod otp;
pub mod payments;
pub mod registrations;
