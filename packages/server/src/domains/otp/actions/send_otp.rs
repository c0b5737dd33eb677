//! Send OTP action

use anyhow::anyhow;
use tracing::{info, warn};

use crate::common::{ApiError, OtpId};
use crate::domains::otp::models::{
    generate_otp_code, non_empty, normalize_contact_number, normalize_email, OtpVerification,
};
use crate::domains::otp::OTP_TTL_MINUTES;
use crate::kernel::ServerDeps;

/// Result of issuing an OTP
#[derive(Debug)]
pub struct SendOtpResult {
    /// Id of the active OTP row for this identity pair.
    pub otp_id: OtpId,
    /// Generated code, echoed in the response only when the deployment
    /// enables it (non-production environments).
    pub otp_echo: Option<String>,
}

/// Issue a fresh OTP for an identity pair and deliver it over email and
/// WhatsApp.
///
/// The code is written to the database before delivery is attempted, and
/// delivery counts as successful when at least one channel accepts the
/// message.
pub async fn send_otp(
    email: Option<String>,
    contact_number: Option<String>,
    ip_address: Option<String>,
    user_agent: Option<String>,
    deps: &ServerDeps,
) -> Result<SendOtpResult, ApiError> {
    // 1. Both halves of the identity pair are mandatory
    let (Some(email), Some(contact_number)) = (non_empty(email), non_empty(contact_number)) else {
        return Err(ApiError::Validation(
            "Email and contact number are required".to_string(),
        ));
    };
    let email = normalize_email(&email);
    let contact_number = normalize_contact_number(&contact_number);

    // 2. Write the fresh code. The upsert replaces any existing row for this
    //    identity pair in one statement, expired or not.
    let code = generate_otp_code();
    let row = OtpVerification::upsert(
        &email,
        &contact_number,
        &code,
        ip_address.as_deref(),
        user_agent.as_deref(),
        &deps.db_pool,
    )
    .await?;

    // 3. Deliver on both channels concurrently. One healthy channel is
    //    enough; only a double failure bubbles up as an error.
    let subject = format!("OTP Verification for {} Registration", deps.event_name);
    let body = format!(
        "<p>Your OTP for {} registration is <strong>{}</strong>. It will expire in {} minutes.</p>",
        deps.event_name, code, OTP_TTL_MINUTES
    );

    let (email_sent, whatsapp_sent) = tokio::join!(
        deps.email.send(&email, &subject, &body),
        deps.whatsapp.send_otp(&contact_number, &code),
    );

    match (email_sent, whatsapp_sent) {
        (Err(email_err), Err(whatsapp_err)) => {
            return Err(anyhow!(
                "OTP delivery failed on both channels: email: {:#}; whatsapp: {:#}",
                email_err,
                whatsapp_err
            )
            .into());
        }
        (Err(email_err), Ok(())) => {
            warn!(
                "Email OTP delivery to {} failed, WhatsApp succeeded: {:#}",
                email, email_err
            );
        }
        (Ok(()), Err(whatsapp_err)) => {
            warn!(
                "WhatsApp OTP delivery to {} failed, email succeeded: {:#}",
                contact_number, whatsapp_err
            );
        }
        (Ok(()), Ok(())) => {}
    }

    info!("OTP sent to {} and {}", email, contact_number);

    Ok(SendOtpResult {
        otp_id: row.id,
        otp_echo: deps.otp_echo_enabled.then_some(code),
    })
}
