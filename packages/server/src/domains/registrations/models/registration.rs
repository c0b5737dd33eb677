use anyhow::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};

use crate::common::RegistrationId;

use super::form_data::{Attendees, FormData};

/// Registration category. The same person may hold one registration per
/// type, enforced by the (email, type) and (contact_number, type) unique
/// indexes.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "registration_type")]
pub enum RegistrationType {
    #[default]
    Alumni,
    Staff,
    Other,
}

/// Registration - the form aggregate
///
/// `form_data` is the canonical nine-section document; the flat columns are
/// denormalized copies of the fields admin queries filter on, refreshed by
/// the step promotions.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub id: RegistrationId,
    pub registration_type: RegistrationType,
    pub name: String,
    pub email: String,
    pub contact_number: String,
    pub whatsapp_number: Option<String>,
    pub email_verified: bool,
    pub captcha_verified: bool,
    pub quiz_passed: bool,
    pub country: Option<String>,
    pub school: Option<String>,
    pub year_of_passing: Option<String>,
    pub is_attending: bool,
    pub attendees: Option<Json<Attendees>>,
    pub will_contribute: bool,
    pub contribution_amount: Option<Decimal>,
    pub payment_status: Option<String>,
    pub payment_id: Option<String>,
    pub payment_details: Option<String>,
    pub form_data: Json<FormData>,
    pub form_submission_complete: bool,
    pub step1_complete: bool,
    pub step2_complete: bool,
    pub step3_complete: bool,
    pub step4_complete: bool,
    pub step5_complete: bool,
    pub step6_complete: bool,
    pub step7_complete: bool,
    pub step8_complete: bool,
    pub current_step: i32,
    pub registration_date: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub last_updated_by: Option<String>,
    pub user_agent: Option<String>,
}

impl Registration {
    /// Flip the completion flag for a step. Steps outside 1..=8 are rejected
    /// by the action layer before this is reached.
    pub fn set_step_complete(&mut self, step: i32) {
        match step {
            1 => self.step1_complete = true,
            2 => self.step2_complete = true,
            3 => self.step3_complete = true,
            4 => self.step4_complete = true,
            5 => self.step5_complete = true,
            6 => self.step6_complete = true,
            7 => self.step7_complete = true,
            8 => self.step8_complete = true,
            _ => {}
        }
    }

    pub fn is_step_complete(&self, step: i32) -> bool {
        match step {
            1 => self.step1_complete,
            2 => self.step2_complete,
            3 => self.step3_complete,
            4 => self.step4_complete,
            5 => self.step5_complete,
            6 => self.step6_complete,
            7 => self.step7_complete,
            8 => self.step8_complete,
            _ => false,
        }
    }
}

/// Insert payload for the create path (first saved step). Everything not
/// listed here takes its schema default.
#[derive(Debug, Clone)]
pub struct NewRegistration {
    pub registration_type: RegistrationType,
    pub name: String,
    pub email: String,
    pub contact_number: String,
    pub whatsapp_number: Option<String>,
    pub country: Option<String>,
    pub school: Option<String>,
    pub year_of_passing: Option<String>,
    pub captcha_verified: bool,
    pub quiz_passed: bool,
    pub form_data: FormData,
    pub user_agent: Option<String>,
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl Registration {
    pub async fn find_by_id(id: RegistrationId, pool: &PgPool) -> Result<Option<Self>> {
        let row = sqlx::query_as::<_, Registration>("SELECT * FROM registrations WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(row)
    }

    /// Load a registration by id holding a row lock for the remainder of the
    /// surrounding transaction. Serializes concurrent read-merge-write
    /// cycles on the same registration.
    pub async fn find_by_id_for_update(
        id: RegistrationId,
        conn: &mut PgConnection,
    ) -> Result<Option<Self>> {
        let row = sqlx::query_as::<_, Registration>(
            "SELECT * FROM registrations WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(conn)
        .await?;
        Ok(row)
    }

    /// Load the most recent registration for an email address, with a row
    /// lock. Used by the id-less step-1 path to resume a draft.
    pub async fn find_by_email_for_update(
        email: &str,
        conn: &mut PgConnection,
    ) -> Result<Option<Self>> {
        let row = sqlx::query_as::<_, Registration>(
            r#"
            SELECT * FROM registrations
            WHERE email = $1
            ORDER BY registration_date DESC
            LIMIT 1
            FOR UPDATE
            "#,
        )
        .bind(email)
        .fetch_optional(conn)
        .await?;
        Ok(row)
    }

    /// Most recent registration matching either half of an identity pair.
    /// Informational lookup used by OTP verification.
    pub async fn find_by_email_or_contact(
        email: &str,
        contact_number: &str,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        let row = sqlx::query_as::<_, Registration>(
            r#"
            SELECT * FROM registrations
            WHERE email = $1 OR contact_number = $2
            ORDER BY registration_date DESC
            LIMIT 1
            "#,
        )
        .bind(email)
        .bind(contact_number)
        .fetch_optional(pool)
        .await?;
        Ok(row)
    }

    /// Create a registration from a verified first step. email_verified is
    /// always true here: creation is gated on a verified OTP row.
    pub async fn create(new: NewRegistration, pool: &PgPool) -> Result<Self> {
        let row = sqlx::query_as::<_, Registration>(
            r#"
            INSERT INTO registrations (
                registration_type, name, email, contact_number, whatsapp_number,
                email_verified, captcha_verified, quiz_passed,
                country, school, year_of_passing,
                form_data, step1_complete, current_step, user_agent
            )
            VALUES ($1, $2, $3, $4, $5, true, $6, $7, $8, $9, $10, $11, true, 1, $12)
            RETURNING *
            "#,
        )
        .bind(new.registration_type)
        .bind(&new.name)
        .bind(&new.email)
        .bind(&new.contact_number)
        .bind(&new.whatsapp_number)
        .bind(new.captcha_verified)
        .bind(new.quiz_passed)
        .bind(&new.country)
        .bind(&new.school)
        .bind(&new.year_of_passing)
        .bind(Json(&new.form_data))
        .bind(&new.user_agent)
        .fetch_one(pool)
        .await?;
        Ok(row)
    }

    /// Persist the columns a step save may touch, from the in-memory state
    /// mutated under the row lock. Stamps last_updated.
    pub async fn save_form_state(&self, conn: &mut PgConnection) -> Result<Self> {
        let row = sqlx::query_as::<_, Registration>(
            r#"
            UPDATE registrations SET
                name = $2,
                email = $3,
                contact_number = $4,
                whatsapp_number = $5,
                captcha_verified = $6,
                quiz_passed = $7,
                country = $8,
                school = $9,
                year_of_passing = $10,
                is_attending = $11,
                attendees = $12,
                will_contribute = $13,
                contribution_amount = $14,
                form_data = $15,
                form_submission_complete = $16,
                step1_complete = $17,
                step2_complete = $18,
                step3_complete = $19,
                step4_complete = $20,
                step5_complete = $21,
                step6_complete = $22,
                step7_complete = $23,
                step8_complete = $24,
                current_step = $25,
                last_updated = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(self.id)
        .bind(&self.name)
        .bind(&self.email)
        .bind(&self.contact_number)
        .bind(&self.whatsapp_number)
        .bind(self.captcha_verified)
        .bind(self.quiz_passed)
        .bind(&self.country)
        .bind(&self.school)
        .bind(&self.year_of_passing)
        .bind(self.is_attending)
        .bind(&self.attendees)
        .bind(self.will_contribute)
        .bind(self.contribution_amount)
        .bind(&self.form_data)
        .bind(self.form_submission_complete)
        .bind(self.step1_complete)
        .bind(self.step2_complete)
        .bind(self.step3_complete)
        .bind(self.step4_complete)
        .bind(self.step5_complete)
        .bind(self.step6_complete)
        .bind(self.step7_complete)
        .bind(self.step8_complete)
        .bind(self.current_step)
        .fetch_one(conn)
        .await?;
        Ok(row)
    }

    /// Denormalized payment columns, written together with the transaction
    /// row inside the payment transaction.
    pub async fn apply_payment(
        id: RegistrationId,
        payment_id: &str,
        payment_details: Option<&str>,
        amount: Decimal,
        conn: &mut PgConnection,
    ) -> Result<Self> {
        let row = sqlx::query_as::<_, Registration>(
            r#"
            UPDATE registrations SET
                payment_status = 'Completed',
                payment_id = $2,
                payment_details = $3,
                will_contribute = true,
                contribution_amount = $4,
                last_updated = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(payment_id)
        .bind(payment_details)
        .bind(amount)
        .fetch_one(conn)
        .await?;
        Ok(row)
    }
}

/// In-memory registration as it looks right after creation. Shared by the
/// unit tests in this module and in the step actions.
#[cfg(test)]
pub(crate) fn test_registration() -> Registration {
    Registration {
        id: RegistrationId::new(),
        registration_type: RegistrationType::Alumni,
        name: "Anita Menon".to_string(),
        email: "anita@example.com".to_string(),
        contact_number: "+919876543210".to_string(),
        whatsapp_number: None,
        email_verified: true,
        captcha_verified: false,
        quiz_passed: false,
        country: Some("India".to_string()),
        school: None,
        year_of_passing: None,
        is_attending: false,
        attendees: None,
        will_contribute: false,
        contribution_amount: None,
        payment_status: None,
        payment_id: None,
        payment_details: None,
        form_data: Json(FormData::default()),
        form_submission_complete: false,
        step1_complete: true,
        step2_complete: false,
        step3_complete: false,
        step4_complete: false,
        step5_complete: false,
        step6_complete: false,
        step7_complete: false,
        step8_complete: false,
        current_step: 1,
        registration_date: Utc::now(),
        last_updated: Utc::now(),
        last_updated_by: None,
        user_agent: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_registration() -> Registration {
        test_registration()
    }

    #[test]
    fn test_registration_type_wire_names() {
        assert_eq!(
            serde_json::to_value(RegistrationType::Alumni).unwrap(),
            "Alumni"
        );
        assert_eq!(
            serde_json::to_value(RegistrationType::Staff).unwrap(),
            "Staff"
        );
        assert_eq!(
            serde_json::from_value::<RegistrationType>("Other".into()).unwrap(),
            RegistrationType::Other
        );
        assert_eq!(RegistrationType::default(), RegistrationType::Alumni);
    }

    #[test]
    fn test_step_flag_mapping() {
        let mut reg = sample_registration();
        for step in 2..=8 {
            assert!(!reg.is_step_complete(step));
            reg.set_step_complete(step);
            assert!(reg.is_step_complete(step));
        }
        // Out-of-range steps are never complete
        assert!(!reg.is_step_complete(0));
        assert!(!reg.is_step_complete(9));
    }

    #[test]
    fn test_serializes_with_camel_case_wire_names() {
        let reg = sample_registration();
        let json = serde_json::to_value(&reg).unwrap();

        assert_eq!(json["registrationType"], "Alumni");
        assert_eq!(json["contactNumber"], "+919876543210");
        assert_eq!(json["emailVerified"], true);
        assert_eq!(json["step1Complete"], true);
        assert_eq!(json["currentStep"], 1);
        assert_eq!(json["formSubmissionComplete"], false);
        assert!(json["formData"].is_object());
        assert!(json.get("form_data").is_none());
    }
}
