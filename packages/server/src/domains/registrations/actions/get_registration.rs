//! Fetch a registration together with its payment history.

use serde::Serialize;

use crate::common::{ApiError, RegistrationId};
use crate::domains::payments::Transaction;
use crate::domains::registrations::models::Registration;
use crate::kernel::ServerDeps;

/// Registration plus every transaction recorded against it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationDetails {
    pub registration: Registration,
    pub transactions: Vec<Transaction>,
}

pub async fn get_registration(
    id: RegistrationId,
    deps: &ServerDeps,
) -> Result<RegistrationDetails, ApiError> {
    let Some(registration) = Registration::find_by_id(id, &deps.db_pool).await? else {
        return Err(ApiError::NotFound("Registration not found".to_string()));
    };

    let transactions = Transaction::find_by_registration(id, &deps.db_pool).await?;

    Ok(RegistrationDetails {
        registration,
        transactions,
    })
}
