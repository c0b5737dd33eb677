//! Integration tests for the OTP lifecycle.
//!
//! Covers issuance (dual-channel delivery, upsert refresh), verification
//! (attempt counting, expiry, exhaustion) and the interplay between the two:
//! a re-request invalidates the previous code, a verified row is consumed by
//! the registration gate elsewhere.

mod common;

use crate::common::{fixtures, TestHarness};
use server_core::common::ApiError;
use server_core::domains::otp::models::OtpVerification;
use server_core::domains::otp::{send_otp, verify_otp};
use server_core::kernel::{MockEmailSender, MockWhatsAppSender, TestDependencies};
use test_context::test_context;

/// A six-digit code guaranteed to differ from `code`.
fn wrong_guess(code: &str) -> String {
    if code == "000000" {
        "111111".to_string()
    } else {
        "000000".to_string()
    }
}

async fn issue(ctx: &TestHarness, email: &str, contact: &str) -> String {
    let deps = ctx.deps();
    let result = send_otp(
        Some(email.to_string()),
        Some(contact.to_string()),
        None,
        None,
        &deps,
    )
    .await
    .expect("send_otp failed");
    result.otp_echo.expect("echo is enabled in test deps")
}

// =============================================================================
// Issuance
// =============================================================================

#[test_context(TestHarness)]
#[tokio::test]
async fn send_otp_stores_code_and_delivers_on_both_channels(ctx: &TestHarness) {
    let test_deps = TestDependencies::new().with_otp_echo();
    let email_mock = test_deps.email.clone();
    let whatsapp_mock = test_deps.whatsapp.clone();
    let deps = test_deps.into_deps(ctx.db_pool.clone());

    let result = send_otp(
        Some("asha.menon@example.com".to_string()),
        Some("+919000000001".to_string()),
        Some("203.0.113.7".to_string()),
        Some("integration-test".to_string()),
        &deps,
    )
    .await
    .expect("send_otp failed");

    let code = result.otp_echo.clone().expect("echo enabled");
    assert_eq!(code.len(), 6);
    assert!(code.chars().all(|c| c.is_ascii_digit()));

    // Both channels were handed the same code
    let emails = email_mock.sent();
    assert_eq!(emails.len(), 1);
    assert_eq!(emails[0].to, "asha.menon@example.com");
    assert!(emails[0].html_body.contains(&code));
    assert!(emails[0].subject.contains("UNMA 2025"));

    let messages = whatsapp_mock.sent();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].phone_number, "+919000000001");
    assert_eq!(messages[0].code, code);

    // The stored row starts with a clean attempt budget
    let row = OtpVerification::find_by_identity(
        "asha.menon@example.com",
        "+919000000001",
        &ctx.db_pool,
    )
    .await
    .expect("lookup failed")
    .expect("row should exist");
    assert_eq!(row.id, result.otp_id);
    assert_eq!(row.otp, code);
    assert_eq!(row.attempts, 0);
    assert!(!row.verified);
    assert_eq!(row.ip_address.as_deref(), Some("203.0.113.7"));
    assert_eq!(row.user_agent.as_deref(), Some("integration-test"));
    assert_eq!(row.purpose, "registration");
}

#[test_context(TestHarness)]
#[tokio::test]
async fn send_otp_requires_email_and_contact_number(ctx: &TestHarness) {
    let deps = ctx.deps();

    let err = send_otp(None, Some("+919000000002".to_string()), None, None, &deps)
        .await
        .expect_err("missing email should fail");
    assert!(matches!(err, ApiError::Validation(_)));
    assert_eq!(err.to_string(), "Email and contact number are required");

    // Whitespace-only values count as missing
    let err = send_otp(
        Some("someone@example.com".to_string()),
        Some("   ".to_string()),
        None,
        None,
        &deps,
    )
    .await
    .expect_err("blank contact number should fail");
    assert!(matches!(err, ApiError::Validation(_)));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn send_otp_normalizes_the_identity_pair(ctx: &TestHarness) {
    let deps = ctx.deps();

    send_otp(
        Some("  MiXeD.Case@Example.COM  ".to_string()),
        Some("  +919000000003  ".to_string()),
        None,
        None,
        &deps,
    )
    .await
    .expect("send_otp failed");

    let row = OtpVerification::find_by_identity(
        "mixed.case@example.com",
        "+919000000003",
        &ctx.db_pool,
    )
    .await
    .expect("lookup failed")
    .expect("row stored under the normalized pair");
    assert_eq!(row.email, "mixed.case@example.com");
    assert_eq!(row.contact_number, "+919000000003");
}

#[test_context(TestHarness)]
#[tokio::test]
async fn resend_replaces_the_previous_code(ctx: &TestHarness) {
    let deps = ctx.deps();
    let email = "resend@example.com";
    let contact = "+919000000004";

    // Seed a known code with a burnt attempt and a verified flag, then
    // re-request
    let row = OtpVerification::upsert(email, contact, "135790", None, None, &ctx.db_pool)
        .await
        .expect("seed upsert failed");
    OtpVerification::increment_attempts(row.id, &ctx.db_pool)
        .await
        .expect("increment failed");
    OtpVerification::mark_verified(row.id, &ctx.db_pool)
        .await
        .expect("mark failed");

    let new_code = issue(ctx, email, contact).await;

    // Same row, fresh state
    let row = OtpVerification::find_by_identity(email, contact, &ctx.db_pool)
        .await
        .expect("lookup failed")
        .expect("row should exist");
    assert_eq!(row.otp, new_code);
    assert_eq!(row.attempts, 0);
    assert!(!row.verified);
    assert!(row.verified_at.is_none());

    // The old code no longer verifies (a guess is consumed doing so)
    let err = verify_otp(
        Some(email.to_string()),
        Some(contact.to_string()),
        Some("135790".to_string()),
        &deps,
    )
    .await
    .expect_err("stale code should be rejected");
    assert!(matches!(err, ApiError::Auth(_)));

    // The new one does
    verify_otp(
        Some(email.to_string()),
        Some(contact.to_string()),
        Some(new_code),
        &deps,
    )
    .await
    .expect("fresh code should verify");
}

#[test_context(TestHarness)]
#[tokio::test]
async fn send_otp_succeeds_when_one_channel_fails(ctx: &TestHarness) {
    // WhatsApp down, email up
    let deps = TestDependencies::new()
        .with_otp_echo()
        .mock_whatsapp(MockWhatsAppSender::new().failing())
        .into_deps(ctx.db_pool.clone());
    send_otp(
        Some("one.channel@example.com".to_string()),
        Some("+919000000005".to_string()),
        None,
        None,
        &deps,
    )
    .await
    .expect("email alone should carry the code");

    // Email down, WhatsApp up
    let deps = TestDependencies::new()
        .with_otp_echo()
        .mock_email(MockEmailSender::new().failing())
        .into_deps(ctx.db_pool.clone());
    send_otp(
        Some("other.channel@example.com".to_string()),
        Some("+919000000006".to_string()),
        None,
        None,
        &deps,
    )
    .await
    .expect("WhatsApp alone should carry the code");
}

#[test_context(TestHarness)]
#[tokio::test]
async fn send_otp_fails_when_both_channels_fail(ctx: &TestHarness) {
    let deps = TestDependencies::new()
        .with_otp_echo()
        .mock_email(MockEmailSender::new().failing())
        .mock_whatsapp(MockWhatsAppSender::new().failing())
        .into_deps(ctx.db_pool.clone());

    let err = send_otp(
        Some("no.channel@example.com".to_string()),
        Some("+919000000007".to_string()),
        None,
        None,
        &deps,
    )
    .await
    .expect_err("double delivery failure should error");
    assert!(matches!(err, ApiError::Internal(_)));

    // The code was written before delivery was attempted, so the row exists
    // and the client can retry verification after a resend
    let row = OtpVerification::find_by_identity(
        "no.channel@example.com",
        "+919000000007",
        &ctx.db_pool,
    )
    .await
    .expect("lookup failed");
    assert!(row.is_some());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn otp_echo_is_absent_unless_enabled(ctx: &TestHarness) {
    // Production-shaped deps: no echo
    let deps = TestDependencies::new().into_deps(ctx.db_pool.clone());

    let result = send_otp(
        Some("no.echo@example.com".to_string()),
        Some("+919000000008".to_string()),
        None,
        None,
        &deps,
    )
    .await
    .expect("send_otp failed");
    assert!(result.otp_echo.is_none());
}

// =============================================================================
// Verification
// =============================================================================

#[test_context(TestHarness)]
#[tokio::test]
async fn verify_otp_success_marks_row_and_returns_token(ctx: &TestHarness) {
    let deps = ctx.deps();
    let email = "verify.ok@example.com";
    let contact = "+919000000010";
    let code = issue(ctx, email, contact).await;

    let result = verify_otp(
        Some(email.to_string()),
        Some(contact.to_string()),
        Some(code),
        &deps,
    )
    .await
    .expect("verify_otp failed");

    assert_eq!(result.verification_token.len(), 64);
    assert!(result
        .verification_token
        .chars()
        .all(|c| c.is_ascii_hexdigit()));
    assert!(result.existing_registration_id.is_none());

    // The row survives, marked verified, with the successful guess counted
    let row = OtpVerification::find_by_identity(email, contact, &ctx.db_pool)
        .await
        .expect("lookup failed")
        .expect("verified row should remain");
    assert!(row.verified);
    assert!(row.verified_at.is_some());
    assert_eq!(row.attempts, 1);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn verify_otp_accepts_unnormalized_identity_input(ctx: &TestHarness) {
    let deps = ctx.deps();
    let code = issue(ctx, "casing@example.com", "+919000000011").await;

    verify_otp(
        Some("  CASING@Example.Com ".to_string()),
        Some(" +919000000011 ".to_string()),
        Some(code),
        &deps,
    )
    .await
    .expect("normalization should make the identities line up");
}

#[test_context(TestHarness)]
#[tokio::test]
async fn verify_otp_requires_all_fields(ctx: &TestHarness) {
    let deps = ctx.deps();

    let err = verify_otp(
        Some("fields@example.com".to_string()),
        Some("+919000000012".to_string()),
        None,
        &deps,
    )
    .await
    .expect_err("missing otp should fail");
    assert!(matches!(err, ApiError::Validation(_)));
    assert_eq!(err.to_string(), "Email, contact number and OTP are required");
}

#[test_context(TestHarness)]
#[tokio::test]
async fn verify_otp_unknown_identity_is_not_found(ctx: &TestHarness) {
    let deps = ctx.deps();

    let err = verify_otp(
        Some("nobody@example.com".to_string()),
        Some("+919000000013".to_string()),
        Some("123456".to_string()),
        &deps,
    )
    .await
    .expect_err("no row should mean not found");
    assert!(matches!(err, ApiError::NotFound(_)));
    assert_eq!(
        err.to_string(),
        "No OTP verification found with this email or contact number"
    );
}

#[test_context(TestHarness)]
#[tokio::test]
async fn verify_otp_wrong_code_counts_down_attempts(ctx: &TestHarness) {
    let deps = ctx.deps();
    let email = "countdown@example.com";
    let contact = "+919000000014";
    let code = issue(ctx, email, contact).await;
    let wrong = wrong_guess(&code);

    let err = verify_otp(
        Some(email.to_string()),
        Some(contact.to_string()),
        Some(wrong.clone()),
        &deps,
    )
    .await
    .expect_err("wrong code should fail");
    assert!(matches!(err, ApiError::Auth(_)));
    assert_eq!(err.to_string(), "Invalid OTP. 4 attempts remaining.");

    let err = verify_otp(
        Some(email.to_string()),
        Some(contact.to_string()),
        Some(wrong),
        &deps,
    )
    .await
    .expect_err("wrong code should fail");
    assert_eq!(err.to_string(), "Invalid OTP. 3 attempts remaining.");

    // Wrong guesses leave the row in place for further tries
    let row = OtpVerification::find_by_identity(email, contact, &ctx.db_pool)
        .await
        .expect("lookup failed")
        .expect("row should remain");
    assert_eq!(row.attempts, 2);
    assert!(!row.verified);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn verify_otp_exhausts_attempts_and_deletes_the_row(ctx: &TestHarness) {
    let deps = ctx.deps();
    let email = "exhausted@example.com";
    let contact = "+919000000015";
    let code = issue(ctx, email, contact).await;
    let wrong = wrong_guess(&code);

    // Five wrong guesses run the counter to zero
    for remaining in (0..=4).rev() {
        let err = verify_otp(
            Some(email.to_string()),
            Some(contact.to_string()),
            Some(wrong.clone()),
            &deps,
        )
        .await
        .expect_err("wrong code should fail");
        assert_eq!(
            err.to_string(),
            format!("Invalid OTP. {} attempts remaining.", remaining)
        );
    }

    // The sixth guess is over budget even with the right code
    let err = verify_otp(
        Some(email.to_string()),
        Some(contact.to_string()),
        Some(code),
        &deps,
    )
    .await
    .expect_err("budget is spent");
    assert!(matches!(err, ApiError::Auth(_)));
    assert_eq!(
        err.to_string(),
        "Maximum attempts exceeded. Please request a new OTP."
    );

    // Exhaustion deletes the row, so the next try reports nothing to verify
    let row = OtpVerification::find_by_identity(email, contact, &ctx.db_pool)
        .await
        .expect("lookup failed");
    assert!(row.is_none());

    let err = verify_otp(
        Some(email.to_string()),
        Some(contact.to_string()),
        Some("123456".to_string()),
        &deps,
    )
    .await
    .expect_err("row is gone");
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn verify_otp_expired_code_is_rejected_and_deleted(ctx: &TestHarness) {
    let deps = ctx.deps();
    let email = "expired@example.com";
    let contact = "+919000000016";
    let code = issue(ctx, email, contact).await;

    // Push the row past its five-minute TTL
    fixtures::backdate_otp(&ctx.db_pool, email, 6)
        .await
        .expect("backdate failed");

    let err = verify_otp(
        Some(email.to_string()),
        Some(contact.to_string()),
        Some(code),
        &deps,
    )
    .await
    .expect_err("expired code should be rejected");
    assert!(matches!(err, ApiError::Auth(_)));
    assert_eq!(err.to_string(), "OTP has expired");

    // Expired rows are deleted on sight
    let row = OtpVerification::find_by_identity(email, contact, &ctx.db_pool)
        .await
        .expect("lookup failed");
    assert!(row.is_none());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn verify_otp_reports_an_existing_registration(ctx: &TestHarness) {
    let deps = ctx.deps();
    let email = "returning@example.com";
    let contact = "+919000000017";

    let registration_id =
        fixtures::create_test_registration(&deps, "Returning Alumna", email, contact)
            .await
            .expect("fixture registration failed");

    // The same person verifies again later, e.g. from a new device
    let code = issue(ctx, email, contact).await;
    let result = verify_otp(
        Some(email.to_string()),
        Some(contact.to_string()),
        Some(code),
        &deps,
    )
    .await
    .expect("verify_otp failed");

    assert_eq!(result.existing_registration_id, Some(registration_id));
}
