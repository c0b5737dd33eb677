//! HTTP client for the transactional email API (Brevo-compatible).

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::kernel::BaseEmailSender;

/// Client for a Brevo-compatible transactional email endpoint.
///
/// Authenticates with an `api-key` header and posts one message per call.
pub struct EmailClient {
    http: Client,
    api_url: String,
    api_key: String,
    from_email: String,
    from_name: String,
}

#[derive(Serialize)]
struct SendEmailRequest<'a> {
    sender: EmailParty<'a>,
    to: Vec<EmailAddress<'a>>,
    subject: &'a str,
    #[serde(rename = "htmlContent")]
    html_content: &'a str,
}

#[derive(Serialize)]
struct EmailParty<'a> {
    name: &'a str,
    email: &'a str,
}

#[derive(Serialize)]
struct EmailAddress<'a> {
    email: &'a str,
}

impl EmailClient {
    pub fn new(api_url: String, api_key: String, from_email: String, from_name: String) -> Self {
        Self {
            http: Client::new(),
            api_url,
            api_key,
            from_email,
            from_name,
        }
    }
}

#[async_trait]
impl BaseEmailSender for EmailClient {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<()> {
        let request = SendEmailRequest {
            sender: EmailParty {
                name: &self.from_name,
                email: &self.from_email,
            },
            to: vec![EmailAddress { email: to }],
            subject,
            html_content: html_body,
        };

        let response = self
            .http
            .post(&self.api_url)
            .header("api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to reach email API")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Email API returned {}: {}", status, body);
        }

        Ok(())
    }
}
