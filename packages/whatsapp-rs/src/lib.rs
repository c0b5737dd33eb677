//! Minimal WhatsApp Cloud API client for template messages.
//!
//! Covers the single call this backend needs: sending a pre-approved
//! template message (OTP delivery) through a Cloud-API-compatible provider.

pub mod models;

use reqwest::Client;
use thiserror::Error;

use crate::models::{
    Component, Language, MessageResponse, Parameter, Template, TemplateMessageRequest,
};

#[derive(Debug, Error)]
pub enum WhatsAppError {
    #[error("request to WhatsApp API failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("WhatsApp API returned {status}: {body}")]
    Api { status: u16, body: String },
}

#[derive(Debug, Clone)]
pub struct WhatsAppOptions {
    /// Base URL of the Cloud-API-compatible endpoint, without trailing slash.
    pub api_base: String,
    /// Sender phone number id assigned by the provider.
    pub phone_number_id: String,
    /// Bearer token.
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct WhatsAppService {
    options: WhatsAppOptions,
    client: Client,
}

impl WhatsAppService {
    pub fn new(options: WhatsAppOptions) -> Self {
        Self {
            options,
            client: Client::new(),
        }
    }

    /// Send a template message with one body text parameter and one
    /// URL-button parameter (the shape used by one-time-code templates,
    /// where the code appears in the body and in a copy-code button).
    pub async fn send_otp_template(
        &self,
        to: &str,
        template_name: &str,
        language_code: &str,
        code: &str,
    ) -> Result<MessageResponse, WhatsAppError> {
        let request = TemplateMessageRequest {
            messaging_product: "whatsapp".to_string(),
            to: to.to_string(),
            message_type: "template".to_string(),
            template: Template {
                name: template_name.to_string(),
                language: Language {
                    code: language_code.to_string(),
                },
                components: vec![
                    Component {
                        component_type: "body".to_string(),
                        sub_type: None,
                        index: None,
                        parameters: vec![Parameter::text(code)],
                    },
                    Component {
                        component_type: "button".to_string(),
                        sub_type: Some("url".to_string()),
                        index: Some(0),
                        parameters: vec![Parameter::text(code)],
                    },
                ],
            },
        };

        self.send(request).await
    }

    async fn send(
        &self,
        request: TemplateMessageRequest,
    ) -> Result<MessageResponse, WhatsAppError> {
        let url = format!(
            "{}/{}/messages",
            self.options.api_base, self.options.phone_number_id
        );

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.options.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WhatsAppError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<MessageResponse>().await?)
    }
}
