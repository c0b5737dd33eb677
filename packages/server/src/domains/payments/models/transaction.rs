use anyhow::Result;
use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};

use crate::common::{RegistrationId, TransactionId};

/// How the payment reached us.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_method", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Razorpay,
    Cash,
    BankTransfer,
    Upi,
    Other,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "transaction_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    #[default]
    Pending,
    Completed,
    Failed,
    Refunded,
    Cancelled,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_purpose", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentPurpose {
    #[default]
    Registration,
    Donation,
    Sponsorship,
    Merchandise,
    Other,
}

/// Payment transaction record. `transaction_id` is the human-readable
/// reference quoted in receipts; `id` is the row key.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TransactionId,
    pub transaction_id: String,
    pub registration_id: RegistrationId,
    pub name: Option<String>,
    pub email: Option<String>,
    pub contact_number: Option<String>,
    pub amount: Decimal,
    pub currency: String,
    pub payment_method: PaymentMethod,
    pub payment_gateway_response: Option<Json<serde_json::Value>>,
    pub status: TransactionStatus,
    pub purpose: PaymentPurpose,
    pub is_anonymous: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Insert payload for a recorded payment. Currency stays at its schema
/// default.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub transaction_id: String,
    pub registration_id: RegistrationId,
    pub name: Option<String>,
    pub email: Option<String>,
    pub contact_number: Option<String>,
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    pub payment_gateway_response: Option<serde_json::Value>,
    pub purpose: PaymentPurpose,
    pub is_anonymous: bool,
    pub notes: Option<String>,
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl Transaction {
    /// Insert a transaction that is completed on arrival, stamping
    /// completed_at. Payments recorded through the API are settled by the
    /// time we hear about them, so rows never pass through 'pending'. Runs
    /// on the caller's transaction so the insert commits or rolls back
    /// together with the registration update.
    pub async fn create_completed(new: NewTransaction, conn: &mut PgConnection) -> Result<Self> {
        let row = sqlx::query_as::<_, Transaction>(
            r#"
            INSERT INTO transactions (
                transaction_id, registration_id, name, email, contact_number,
                amount, payment_method, payment_gateway_response,
                status, purpose, is_anonymous, notes, completed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'completed', $9, $10, $11, now())
            RETURNING *
            "#,
        )
        .bind(&new.transaction_id)
        .bind(new.registration_id)
        .bind(&new.name)
        .bind(&new.email)
        .bind(&new.contact_number)
        .bind(new.amount)
        .bind(new.payment_method)
        .bind(new.payment_gateway_response.as_ref().map(Json))
        .bind(new.purpose)
        .bind(new.is_anonymous)
        .bind(&new.notes)
        .fetch_one(conn)
        .await?;
        Ok(row)
    }

    /// All transactions recorded against a registration, newest first.
    pub async fn find_by_registration(
        registration_id: RegistrationId,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let rows = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT * FROM transactions
            WHERE registration_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(registration_id)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }
}

// =============================================================================
// Utilities
// =============================================================================

/// Generate a payment reference: TXN-{unix millis}-{random suffix below
/// 10000, unpadded}.
pub fn generate_reference() -> String {
    let mut rng = rand::thread_rng();
    format!(
        "TXN-{}-{}",
        Utc::now().timestamp_millis(),
        rng.gen_range(0..10_000)
    )
}
