// TestDependencies - mock implementations for testing
//
// Provides mock services that can be injected into ServerDeps for tests.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::{Arc, Mutex};

use super::{BaseEmailSender, BaseWhatsAppSender, ServerDeps};

// =============================================================================
// Mock Email Sender
// =============================================================================

/// Arguments captured from a send call
#[derive(Debug, Clone)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

pub struct MockEmailSender {
    calls: Arc<Mutex<Vec<SentEmail>>>,
    fail: Arc<Mutex<bool>>,
}

impl MockEmailSender {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            fail: Arc::new(Mutex::new(false)),
        }
    }

    /// Make every subsequent send return an error
    pub fn failing(self) -> Self {
        *self.fail.lock().unwrap() = true;
        self
    }

    /// Get all send calls that were attempted (including failed ones)
    pub fn sent(&self) -> Vec<SentEmail> {
        self.calls.lock().unwrap().clone()
    }

    /// Check if a send was attempted to an address
    pub fn was_sent_to(&self, to: &str) -> bool {
        self.calls.lock().unwrap().iter().any(|e| e.to == to)
    }
}

impl Default for MockEmailSender {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseEmailSender for MockEmailSender {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<()> {
        // Record the call before deciding the outcome
        self.calls.lock().unwrap().push(SentEmail {
            to: to.to_string(),
            subject: subject.to_string(),
            html_body: html_body.to_string(),
        });

        if *self.fail.lock().unwrap() {
            anyhow::bail!("mock email sender configured to fail");
        }
        Ok(())
    }
}

// =============================================================================
// Mock WhatsApp Sender
// =============================================================================

/// Arguments captured from a send_otp call
#[derive(Debug, Clone)]
pub struct SentWhatsAppOtp {
    pub phone_number: String,
    pub code: String,
}

pub struct MockWhatsAppSender {
    calls: Arc<Mutex<Vec<SentWhatsAppOtp>>>,
    fail: Arc<Mutex<bool>>,
}

impl MockWhatsAppSender {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            fail: Arc::new(Mutex::new(false)),
        }
    }

    /// Make every subsequent send return an error
    pub fn failing(self) -> Self {
        *self.fail.lock().unwrap() = true;
        self
    }

    /// Get all send calls that were attempted (including failed ones)
    pub fn sent(&self) -> Vec<SentWhatsAppOtp> {
        self.calls.lock().unwrap().clone()
    }

    /// Check if a send was attempted to a phone number
    pub fn was_sent_to(&self, phone_number: &str) -> bool {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .any(|c| c.phone_number == phone_number)
    }
}

impl Default for MockWhatsAppSender {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseWhatsAppSender for MockWhatsAppSender {
    async fn send_otp(&self, phone_number: &str, code: &str) -> Result<()> {
        // Record the call before deciding the outcome
        self.calls.lock().unwrap().push(SentWhatsAppOtp {
            phone_number: phone_number.to_string(),
            code: code.to_string(),
        });

        if *self.fail.lock().unwrap() {
            anyhow::bail!("mock WhatsApp sender configured to fail");
        }
        Ok(())
    }
}

// =============================================================================
// TestDependencies
// =============================================================================

/// Builder for a ServerDeps backed entirely by mocks.
///
/// Clone the mock Arcs you want to assert on before calling into_deps:
///
/// ```ignore
/// let test_deps = TestDependencies::new();
/// let email = test_deps.email.clone();
/// let deps = test_deps.into_deps(pool);
/// // ... run the action, then assert on email.sent()
/// ```
pub struct TestDependencies {
    pub email: Arc<MockEmailSender>,
    pub whatsapp: Arc<MockWhatsAppSender>,
    pub event_name: String,
    pub otp_echo_enabled: bool,
}

impl TestDependencies {
    pub fn new() -> Self {
        Self {
            email: Arc::new(MockEmailSender::new()),
            whatsapp: Arc::new(MockWhatsAppSender::new()),
            event_name: "UNMA 2025".to_string(),
            otp_echo_enabled: false,
        }
    }

    /// Set a mock email sender
    pub fn mock_email(mut self, sender: MockEmailSender) -> Self {
        self.email = Arc::new(sender);
        self
    }

    /// Set a mock WhatsApp sender
    pub fn mock_whatsapp(mut self, sender: MockWhatsAppSender) -> Self {
        self.whatsapp = Arc::new(sender);
        self
    }

    /// Echo generated OTPs in issuance responses, like a development env
    pub fn with_otp_echo(mut self) -> Self {
        self.otp_echo_enabled = true;
        self
    }

    /// Convert into ServerDeps for testing
    pub fn into_deps(self, db_pool: PgPool) -> ServerDeps {
        ServerDeps::new(
            db_pool,
            self.email,
            self.whatsapp,
            self.event_name,
            self.otp_echo_enabled,
        )
    }
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}
