//! Verify OTP action

use tracing::info;

use crate::common::{ApiError, RegistrationId};
use crate::domains::otp::models::{
    generate_verification_token, non_empty, normalize_contact_number, normalize_email,
    OtpVerification,
};
use crate::domains::otp::MAX_ATTEMPTS;
use crate::domains::registrations::models::Registration;
use crate::kernel::ServerDeps;

/// Result of a successful verification
#[derive(Debug)]
pub struct VerifyOtpResult {
    /// Opaque token the client holds as proof of verification.
    pub verification_token: String,
    /// Existing registration for this identity, if any. Lets the client
    /// resume a draft instead of starting over.
    pub existing_registration_id: Option<RegistrationId>,
}

/// Check a submitted code against the active row for an identity pair.
///
/// Every guess consumes an attempt. Expired and exhausted rows are deleted
/// on sight so the next send_otp starts clean.
pub async fn verify_otp(
    email: Option<String>,
    contact_number: Option<String>,
    otp: Option<String>,
    deps: &ServerDeps,
) -> Result<VerifyOtpResult, ApiError> {
    // 1. All three fields are mandatory
    let (Some(email), Some(contact_number), Some(otp)) =
        (non_empty(email), non_empty(contact_number), non_empty(otp))
    else {
        return Err(ApiError::Validation(
            "Email, contact number and OTP are required".to_string(),
        ));
    };
    let email = normalize_email(&email);
    let contact_number = normalize_contact_number(&contact_number);

    // 2. Look up the active row for this identity pair
    let Some(row) =
        OtpVerification::find_by_identity(&email, &contact_number, &deps.db_pool).await?
    else {
        return Err(ApiError::NotFound(
            "No OTP verification found with this email or contact number".to_string(),
        ));
    };

    // 3. Expired rows are deleted on sight
    if row.is_expired() {
        OtpVerification::delete(row.id, &deps.db_pool).await?;
        return Err(ApiError::Auth("OTP has expired".to_string()));
    }

    // 4. Consume an attempt before comparing, in the database, so concurrent
    //    guesses each burn a distinct attempt
    let row = OtpVerification::increment_attempts(row.id, &deps.db_pool).await?;
    if row.attempts > MAX_ATTEMPTS {
        OtpVerification::delete(row.id, &deps.db_pool).await?;
        return Err(ApiError::Auth(
            "Maximum attempts exceeded. Please request a new OTP.".to_string(),
        ));
    }

    if row.otp != otp {
        return Err(ApiError::Auth(format!(
            "Invalid OTP. {} attempts remaining.",
            row.attempts_remaining()
        )));
    }

    // 5. Match: mark verified and hand back a token, plus any registration
    //    already tied to either half of the identity
    OtpVerification::mark_verified(row.id, &deps.db_pool).await?;

    let existing =
        Registration::find_by_email_or_contact(&email, &contact_number, &deps.db_pool).await?;

    info!("OTP verified for {}", email);

    Ok(VerifyOtpResult {
        verification_token: generate_verification_token(),
        existing_registration_id: existing.map(|r| r.id),
    })
}
