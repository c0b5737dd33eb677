//! Test fixtures for creating test data.
//!
//! These fixtures use the model and action methods directly to create test
//! data. Emails and contact numbers must be unique per test; tests run in
//! parallel against one shared database.

use anyhow::Result;
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use sqlx::PgPool;

use server_core::common::{OtpId, RegistrationId};
use server_core::domains::otp::models::OtpVerification;
use server_core::domains::registrations::{save_step, StepData};
use server_core::kernel::ServerDeps;

/// Store a verified, unexpired OTP row for an identity pair, as if the
/// client had just passed verification.
pub async fn create_verified_otp(
    pool: &PgPool,
    email: &str,
    contact_number: &str,
) -> Result<OtpId> {
    let row = OtpVerification::upsert(email, contact_number, "123456", None, None, pool).await?;
    let row = OtpVerification::mark_verified(row.id, pool).await?;
    Ok(row.id)
}

/// Backdate the OTP row for an email so its TTL has elapsed.
pub async fn backdate_otp(pool: &PgPool, email: &str, minutes: i64) -> Result<()> {
    let created_at = Utc::now() - Duration::minutes(minutes);
    sqlx::query("UPDATE otp_verifications SET created_at = $2 WHERE email = $1")
        .bind(email)
        .bind(created_at)
        .execute(pool)
        .await?;
    Ok(())
}

/// Build a StepData payload from a formDataStructured JSON value, the way
/// it arrives on the wire.
pub fn step_data(form_data_structured: Value) -> StepData {
    serde_json::from_value(json!({ "formDataStructured": form_data_structured }))
        .expect("fixture step data must deserialize")
}

/// Step-1 payload carrying the minimum the create path requires.
pub fn step1_data(name: &str, email: &str, contact_number: &str) -> StepData {
    step_data(json!({
        "personalInfo": {
            "name": name,
            "email": email,
            "contactNumber": contact_number,
        }
    }))
}

/// Create a registration through the step-1 action, passing the OTP gate.
pub async fn create_test_registration(
    deps: &ServerDeps,
    name: &str,
    email: &str,
    contact_number: &str,
) -> Result<RegistrationId> {
    create_verified_otp(&deps.db_pool, email, contact_number).await?;
    let outcome = save_step(
        None,
        Some(1),
        Some(step1_data(name, email, contact_number)),
        None,
        deps,
    )
    .await?;
    Ok(outcome.registration.id)
}
