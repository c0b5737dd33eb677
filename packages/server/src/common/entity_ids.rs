//! Typed ID definitions for all domain entities.
//!
//! One type alias per entity, so IDs of different entities are incompatible
//! at compile time.

// Re-export the core Id type and version marker
pub use super::id::{Id, V4};

// ============================================================================
// Entity marker types
// ============================================================================

/// Marker type for OtpVerification entities (active OTP rows).
pub struct OtpVerification;

/// Marker type for Registration entities (the form aggregate).
pub struct Registration;

/// Marker type for Transaction entities (payment records).
pub struct Transaction;

// ============================================================================
// Type aliases - the primary API
// ============================================================================

/// Typed ID for OtpVerification entities.
pub type OtpId = Id<OtpVerification>;

/// Typed ID for Registration entities.
pub type RegistrationId = Id<Registration>;

/// Typed ID for Transaction entities. This is the row's primary key, not the
/// human-readable `transaction_id` reference string.
pub type TransactionId = Id<Transaction>;
