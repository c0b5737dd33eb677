//! Record payment action - one settled payment against a registration
//!
//! The transaction insert and the registration's denormalized payment
//! columns are written in a single database transaction, so a failure
//! part-way leaves no orphaned transaction row.

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::common::{ApiError, RegistrationId};
use crate::domains::payments::models::{
    generate_reference, NewTransaction, PaymentMethod, PaymentPurpose, Transaction,
};
use crate::domains::registrations::models::Registration;
use crate::kernel::ServerDeps;

/// Body of a payment recording. Amount and method are mandatory; the rest
/// defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentRequest {
    pub amount: Option<Decimal>,
    pub payment_method: Option<PaymentMethod>,
    pub payment_gateway_response: Option<Value>,
    pub purpose: Option<PaymentPurpose>,
    pub is_anonymous: Option<bool>,
    pub notes: Option<String>,
}

/// Result of recording a payment.
#[derive(Debug)]
pub struct PaymentOutcome {
    pub transaction: Transaction,
    pub registration: Registration,
}

pub async fn record_payment(
    registration_id: RegistrationId,
    request: PaymentRequest,
    deps: &ServerDeps,
) -> Result<PaymentOutcome, ApiError> {
    // 1. Required fields
    let (Some(amount), Some(payment_method)) = (request.amount, request.payment_method) else {
        return Err(ApiError::Validation(
            "Amount and payment method are required".to_string(),
        ));
    };
    if amount < Decimal::ZERO {
        return Err(ApiError::Validation(
            "Amount cannot be negative".to_string(),
        ));
    }

    // 2. Lock the registration; both writes ride the same transaction
    let mut tx = deps.db_pool.begin().await?;
    let Some(registration) =
        Registration::find_by_id_for_update(registration_id, &mut *tx).await?
    else {
        return Err(ApiError::NotFound("Registration not found".to_string()));
    };

    // 3. Insert the settled transaction with a payer snapshot
    let reference = generate_reference();
    let payment_details = request
        .payment_gateway_response
        .as_ref()
        .map(|response| response.to_string());

    let transaction = Transaction::create_completed(
        NewTransaction {
            transaction_id: reference.clone(),
            registration_id,
            name: Some(registration.name.clone()),
            email: Some(registration.email.clone()),
            contact_number: Some(registration.contact_number.clone()),
            amount,
            payment_method,
            payment_gateway_response: request.payment_gateway_response,
            purpose: request.purpose.unwrap_or_default(),
            is_anonymous: request.is_anonymous.unwrap_or(false),
            notes: request.notes,
        },
        &mut *tx,
    )
    .await?;

    // 4. Denormalized payment columns on the registration
    let registration = Registration::apply_payment(
        registration_id,
        &reference,
        payment_details.as_deref(),
        amount,
        &mut *tx,
    )
    .await?;

    tx.commit().await?;

    info!(
        "Payment {} recorded for registration {}",
        reference, registration_id
    );

    Ok(PaymentOutcome {
        transaction,
        registration,
    })
}
