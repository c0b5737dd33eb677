// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Business logic (like "issue a registration OTP") should be domain functions
// that use these traits.
//
// Naming convention: Base* for trait names (e.g., BaseEmailSender)

use anyhow::Result;
use async_trait::async_trait;

// =============================================================================
// Email Trait (Infrastructure - transactional mail)
// =============================================================================

#[async_trait]
pub trait BaseEmailSender: Send + Sync {
    /// Send a single transactional email with an HTML body
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<()>;
}

// =============================================================================
// WhatsApp Trait (Infrastructure - template messages)
// =============================================================================

#[async_trait]
pub trait BaseWhatsAppSender: Send + Sync {
    /// Send the deployment's OTP template message to a phone number
    async fn send_otp(&self, phone_number: &str, code: &str) -> Result<()>;
}
