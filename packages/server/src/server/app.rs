//! Application setup and server configuration.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{header::CONTENT_TYPE, Method},
    middleware,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use whatsapp::{WhatsAppOptions, WhatsAppService};

use crate::config::Config;
use crate::kernel::{EmailClient, ServerDeps, WhatsAppAdapter};
use crate::server::middleware::extract_client_ip;
use crate::server::routes::{
    get_registration_handler, health_handler, record_payment_handler, save_step_handler,
    save_step_with_id_handler, send_otp_handler, verify_otp_handler,
};

/// Wire the real delivery channels from configuration and build the router.
pub fn build_app(pool: PgPool, config: &Config) -> Router {
    let email = Arc::new(EmailClient::new(
        config.email_api_url.clone(),
        config.email_api_key.clone(),
        config.email_from.clone(),
        config.email_from_name.clone(),
    ));

    let whatsapp_service = Arc::new(WhatsAppService::new(WhatsAppOptions {
        api_base: config.whatsapp_api_base.clone(),
        phone_number_id: config.whatsapp_phone_number_id.clone(),
        api_key: config.whatsapp_api_key.clone(),
    }));
    let whatsapp = Arc::new(WhatsAppAdapter::new(
        whatsapp_service,
        config.whatsapp_otp_template.clone(),
    ));

    let deps = ServerDeps::new(
        pool,
        email,
        whatsapp,
        config.event_name.clone(),
        // Production never echoes OTP codes in responses
        !config.environment.is_production(),
    );

    build_router(deps)
}

/// Assemble the route table and middleware stack over a set of dependencies.
pub fn build_router(deps: ServerDeps) -> Router {
    // CORS configuration - the registration form is served from another origin
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        // Health check
        .route("/health", get(health_handler))
        // Registration flow
        .route("/registrations/send-otp", post(send_otp_handler))
        .route("/registrations/verify-otp", post(verify_otp_handler))
        .route("/registrations/step", post(save_step_handler))
        .route("/registrations/step/:id", post(save_step_with_id_handler))
        .route("/registrations/:id/payment", post(record_payment_handler))
        .route("/registrations/:id", get(get_registration_handler))
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(middleware::from_fn(extract_client_ip))
        .layer(Extension(deps)) // Shared dependencies (must wrap the handlers)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
