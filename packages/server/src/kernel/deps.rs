//! Server dependencies for effects (using traits for testability)
//!
//! This module provides the central dependency container used by all domain
//! actions. All external services use trait abstractions to enable testing.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use whatsapp::WhatsAppService;

use crate::kernel::{BaseEmailSender, BaseWhatsAppSender};

// =============================================================================
// WhatsAppService Adapter (implements BaseWhatsAppSender trait)
// =============================================================================

/// Wrapper around WhatsAppService that implements BaseWhatsAppSender, fixing
/// the template name and language the deployment uses.
pub struct WhatsAppAdapter {
    service: Arc<WhatsAppService>,
    template_name: String,
    language_code: String,
}

impl WhatsAppAdapter {
    pub fn new(service: Arc<WhatsAppService>, template_name: String) -> Self {
        Self {
            service,
            template_name,
            language_code: "en_US".to_string(),
        }
    }
}

#[async_trait]
impl BaseWhatsAppSender for WhatsAppAdapter {
    async fn send_otp(&self, phone_number: &str, code: &str) -> Result<()> {
        self.service
            .send_otp_template(phone_number, &self.template_name, &self.language_code, code)
            .await?;
        Ok(())
    }
}

// =============================================================================
// ServerDeps
// =============================================================================

/// Server dependencies accessible to actions (using traits for testability)
#[derive(Clone)]
pub struct ServerDeps {
    pub db_pool: PgPool,
    pub email: Arc<dyn BaseEmailSender>,
    pub whatsapp: Arc<dyn BaseWhatsAppSender>,
    /// Event name substituted into OTP subject lines and message bodies.
    pub event_name: String,
    /// When true, OTP issuance responses echo the generated code.
    /// Development environments only - never enable in production.
    pub otp_echo_enabled: bool,
}

impl ServerDeps {
    /// Create new ServerDeps with the given dependencies
    pub fn new(
        db_pool: PgPool,
        email: Arc<dyn BaseEmailSender>,
        whatsapp: Arc<dyn BaseWhatsAppSender>,
        event_name: String,
        otp_echo_enabled: bool,
    ) -> Self {
        Self {
            db_pool,
            email,
            whatsapp,
            event_name,
            otp_echo_enabled,
        }
    }
}
