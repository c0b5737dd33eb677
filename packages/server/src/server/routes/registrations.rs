//! Registration flow endpoints.
//!
//! Handlers stay thin: deserialize, pull request metadata (client IP, user
//! agent), call the domain action, shape the success envelope. Error
//! envelopes come from `ApiError`.

use axum::extract::{Extension, Path};
use axum::http::{header, HeaderMap, StatusCode};
use axum::Json;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::common::{ApiError, OtpId, RegistrationId};
use crate::domains::otp::{send_otp, verify_otp};
use crate::domains::payments::{record_payment, PaymentRequest, TransactionStatus};
use crate::domains::registrations::{
    get_registration, save_step, RegistrationDetails, SaveStepOutcome, StepData,
};
use crate::kernel::ServerDeps;
use crate::server::middleware::ClientIp;

// =============================================================================
// Request bodies
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOtpRequest {
    pub email: Option<String>,
    pub contact_number: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpRequest {
    pub email: Option<String>,
    pub contact_number: Option<String>,
    pub otp: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveStepRequest {
    pub step: Option<i32>,
    pub step_data: Option<StepData>,
}

// =============================================================================
// Response envelopes
// =============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOtpResponse {
    status: &'static str,
    message: &'static str,
    otp_id: OtpId,
    /// Echo of the generated code, development environments only.
    #[serde(skip_serializing_if = "Option::is_none")]
    otp: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpResponse {
    status: &'static str,
    message: &'static str,
    verified: bool,
    verification_token: String,
    existing_registration: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    registration_id: Option<RegistrationId>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveStepResponse {
    status: &'static str,
    message: String,
    data: SaveStepData,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SaveStepData {
    registration_id: RegistrationId,
    current_step: i32,
    is_complete: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPaymentResponse {
    status: &'static str,
    message: &'static str,
    data: PaymentData,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PaymentData {
    transaction_id: String,
    registration_id: RegistrationId,
    amount: Decimal,
    status: TransactionStatus,
    completed_at: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
pub struct GetRegistrationResponse {
    status: &'static str,
    data: RegistrationDetails,
}

// =============================================================================
// Handlers
// =============================================================================

pub async fn send_otp_handler(
    Extension(deps): Extension<ServerDeps>,
    client_ip: Option<Extension<ClientIp>>,
    headers: HeaderMap,
    Json(request): Json<SendOtpRequest>,
) -> Result<Json<SendOtpResponse>, ApiError> {
    let ip_address = client_ip.map(|Extension(ClientIp(ip))| ip.to_string());
    let user_agent = user_agent_from(&headers);

    let result = send_otp(
        request.email,
        request.contact_number,
        ip_address,
        user_agent,
        &deps,
    )
    .await?;

    Ok(Json(SendOtpResponse {
        status: "success",
        message: "OTP sent successfully",
        otp_id: result.otp_id,
        otp: result.otp_echo,
    }))
}

pub async fn verify_otp_handler(
    Extension(deps): Extension<ServerDeps>,
    Json(request): Json<VerifyOtpRequest>,
) -> Result<Json<VerifyOtpResponse>, ApiError> {
    let result = verify_otp(request.email, request.contact_number, request.otp, &deps).await?;

    Ok(Json(VerifyOtpResponse {
        status: "success",
        message: "OTP verified successfully",
        verified: true,
        verification_token: result.verification_token,
        existing_registration: result.existing_registration_id.is_some(),
        registration_id: result.existing_registration_id,
    }))
}

/// POST /registrations/step - id-less saves (first step: create or resume by email)
pub async fn save_step_handler(
    Extension(deps): Extension<ServerDeps>,
    headers: HeaderMap,
    Json(request): Json<SaveStepRequest>,
) -> Result<(StatusCode, Json<SaveStepResponse>), ApiError> {
    let user_agent = user_agent_from(&headers);
    let outcome = save_step(None, request.step, request.step_data, user_agent, &deps).await?;
    Ok(step_response(outcome))
}

/// POST /registrations/step/:id - saves against a known registration
pub async fn save_step_with_id_handler(
    Extension(deps): Extension<ServerDeps>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<SaveStepRequest>,
) -> Result<(StatusCode, Json<SaveStepResponse>), ApiError> {
    let id = parse_registration_id(&id)?;
    let user_agent = user_agent_from(&headers);
    let outcome = save_step(Some(id), request.step, request.step_data, user_agent, &deps).await?;
    Ok(step_response(outcome))
}

pub async fn record_payment_handler(
    Extension(deps): Extension<ServerDeps>,
    Path(id): Path<String>,
    Json(request): Json<PaymentRequest>,
) -> Result<Json<RecordPaymentResponse>, ApiError> {
    let id = parse_registration_id(&id)?;
    let outcome = record_payment(id, request, &deps).await?;

    Ok(Json(RecordPaymentResponse {
        status: "success",
        message: "Payment processed successfully",
        data: PaymentData {
            transaction_id: outcome.transaction.transaction_id,
            registration_id: outcome.registration.id,
            amount: outcome.transaction.amount,
            status: outcome.transaction.status,
            completed_at: outcome.transaction.completed_at,
        },
    }))
}

pub async fn get_registration_handler(
    Extension(deps): Extension<ServerDeps>,
    Path(id): Path<String>,
) -> Result<Json<GetRegistrationResponse>, ApiError> {
    let id = parse_registration_id(&id)?;
    let details = get_registration(id, &deps).await?;

    Ok(Json(GetRegistrationResponse {
        status: "success",
        data: details,
    }))
}

// =============================================================================
// Helpers
// =============================================================================

fn user_agent_from(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

fn parse_registration_id(raw: &str) -> Result<RegistrationId, ApiError> {
    RegistrationId::parse(raw)
        .map_err(|_| ApiError::Validation("Invalid registration ID".to_string()))
}

fn step_response(outcome: SaveStepOutcome) -> (StatusCode, Json<SaveStepResponse>) {
    let status_code = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    let message = if outcome.created {
        "Registration created and first step saved successfully".to_string()
    } else {
        format!("Step {} saved successfully", outcome.step)
    };

    (
        status_code,
        Json(SaveStepResponse {
            status: "success",
            message,
            data: SaveStepData {
                registration_id: outcome.registration.id,
                current_step: outcome.registration.current_step,
                is_complete: outcome.registration.form_submission_complete,
            },
        }),
    )
}
