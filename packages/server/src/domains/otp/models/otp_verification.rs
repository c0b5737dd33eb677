use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::OtpId;
use crate::domains::otp::{MAX_ATTEMPTS, OTP_LENGTH, OTP_TTL_MINUTES};

/// OtpVerification - one active code per (email, contact number) identity
///
/// At most one row exists per identity pair; re-requesting a code replaces
/// the old row in place. Rows older than the TTL are garbage wherever found,
/// whether verified or not.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OtpVerification {
    pub id: OtpId,
    pub email: String,
    pub contact_number: String,
    pub otp: String,
    pub created_at: DateTime<Utc>,
    pub verified: bool,
    pub verified_at: Option<DateTime<Utc>>,
    pub purpose: String,
    pub attempts: i32,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl OtpVerification {
    /// True once the row has outlived the TTL.
    pub fn is_expired(&self) -> bool {
        self.created_at < expiry_cutoff()
    }

    /// Wrong guesses left before the row is invalidated.
    pub fn attempts_remaining(&self) -> i32 {
        MAX_ATTEMPTS - self.attempts
    }
}

/// Oldest created_at an OTP row may carry and still be honored.
fn expiry_cutoff() -> DateTime<Utc> {
    Utc::now() - Duration::minutes(OTP_TTL_MINUTES)
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl OtpVerification {
    /// Insert a fresh code for an identity pair, replacing any existing row
    /// in a single statement. The replacement resets verification state and
    /// the attempt counter, so concurrent re-requests cannot leave a row
    /// half-updated.
    pub async fn upsert(
        email: &str,
        contact_number: &str,
        otp: &str,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
        pool: &PgPool,
    ) -> Result<Self> {
        let row = sqlx::query_as::<_, OtpVerification>(
            r#"
            INSERT INTO otp_verifications (email, contact_number, otp, ip_address, user_agent)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (email, contact_number) DO UPDATE SET
                otp = EXCLUDED.otp,
                created_at = now(),
                verified = false,
                verified_at = NULL,
                attempts = 0,
                ip_address = EXCLUDED.ip_address,
                user_agent = EXCLUDED.user_agent
            RETURNING *
            "#,
        )
        .bind(email)
        .bind(contact_number)
        .bind(otp)
        .bind(ip_address)
        .bind(user_agent)
        .fetch_one(pool)
        .await?;
        Ok(row)
    }

    /// Find the active row for an identity pair, expired or not.
    pub async fn find_by_identity(
        email: &str,
        contact_number: &str,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        let row = sqlx::query_as::<_, OtpVerification>(
            "SELECT * FROM otp_verifications WHERE email = $1 AND contact_number = $2",
        )
        .bind(email)
        .bind(contact_number)
        .fetch_optional(pool)
        .await?;
        Ok(row)
    }

    /// Find a verified, unexpired row for an identity pair. This is the gate
    /// a first registration step must pass.
    pub async fn find_verified(
        email: &str,
        contact_number: &str,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        let row = sqlx::query_as::<_, OtpVerification>(
            r#"
            SELECT * FROM otp_verifications
            WHERE email = $1 AND contact_number = $2
              AND verified = true
              AND created_at >= $3
            "#,
        )
        .bind(email)
        .bind(contact_number)
        .bind(expiry_cutoff())
        .fetch_optional(pool)
        .await?;
        Ok(row)
    }

    /// Consume one verification attempt and return the updated row. The
    /// increment happens in the database so concurrent guesses each consume
    /// a distinct attempt.
    pub async fn increment_attempts(id: OtpId, pool: &PgPool) -> Result<Self> {
        let row = sqlx::query_as::<_, OtpVerification>(
            "UPDATE otp_verifications SET attempts = attempts + 1 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_one(pool)
        .await?;
        Ok(row)
    }

    /// Mark the row verified and stamp the verification time.
    pub async fn mark_verified(id: OtpId, pool: &PgPool) -> Result<Self> {
        let row = sqlx::query_as::<_, OtpVerification>(
            r#"
            UPDATE otp_verifications
            SET verified = true, verified_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_one(pool)
        .await?;
        Ok(row)
    }

    /// Delete a single row.
    pub async fn delete(id: OtpId, pool: &PgPool) -> Result<()> {
        sqlx::query("DELETE FROM otp_verifications WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }
}

// =============================================================================
// Utility Functions
// =============================================================================

/// Generate a random numeric code of OTP_LENGTH digits.
///
/// Digits are drawn independently, so leading zeros are possible and the
/// code must always be handled as a string.
pub fn generate_otp_code() -> String {
    let mut rng = rand::thread_rng();
    (0..OTP_LENGTH)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

/// Generate an opaque 64-character hex token handed back on successful
/// verification.
pub fn generate_verification_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill(&mut bytes[..]);
    hex::encode(bytes)
}

/// Canonical form of an email address: trimmed and lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Canonical form of a contact number: trimmed, digits and any leading +
/// left untouched.
pub fn normalize_contact_number(number: &str) -> String {
    number.trim().to_string()
}

/// Treat missing and blank request fields the same way.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
