use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

/// Deployment environment. Controls whether responses echo generated OTPs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn parse(value: &str) -> Self {
        match value {
            "production" => Environment::Production,
            _ => Environment::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub environment: Environment,
    pub event_name: String,
    pub email_api_url: String,
    pub email_api_key: String,
    pub email_from: String,
    pub email_from_name: String,
    pub whatsapp_api_base: String,
    pub whatsapp_phone_number_id: String,
    pub whatsapp_api_key: String,
    pub whatsapp_otp_template: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .context("DATABASE_URL must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            environment: Environment::parse(
                &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            ),
            event_name: env::var("EVENT_NAME")
                .unwrap_or_else(|_| "Alumni Meet 2026".to_string()),
            email_api_url: env::var("EMAIL_API_URL")
                .unwrap_or_else(|_| "https://api.brevo.com/v3/smtp/email".to_string()),
            email_api_key: env::var("EMAIL_API_KEY")
                .context("EMAIL_API_KEY must be set")?,
            email_from: env::var("EMAIL_FROM")
                .unwrap_or_else(|_| "noreply@reunite.events".to_string()),
            email_from_name: env::var("EMAIL_FROM_NAME")
                .unwrap_or_else(|_| "Reunite".to_string()),
            whatsapp_api_base: env::var("WHATSAPP_API_BASE")
                .unwrap_or_else(|_| "https://graph.facebook.com/v19.0".to_string()),
            whatsapp_phone_number_id: env::var("WHATSAPP_PHONE_NUMBER_ID")
                .context("WHATSAPP_PHONE_NUMBER_ID must be set")?,
            whatsapp_api_key: env::var("WHATSAPP_API_KEY")
                .context("WHATSAPP_API_KEY must be set")?,
            whatsapp_otp_template: env::var("WHATSAPP_OTP_TEMPLATE")
                .unwrap_or_else(|_| "registration_otp".to_string()),
        })
    }
}
