//! Save step action - create or update one step of the multi-step form
//!
//! The step payload is merged per section into the stored form document,
//! step flags and current_step are advanced, and steps 1, 3 and 8 refresh
//! the denormalized root columns. A first step with no resumable
//! registration creates one, gated on a verified OTP row.

use serde::Deserialize;
use sqlx::types::Json;
use sqlx::{Postgres, Transaction};
use tracing::info;

use crate::common::{is_unique_violation, ApiError, RegistrationId};
use crate::domains::otp::models::{non_empty, normalize_contact_number, normalize_email};
use crate::domains::otp::OtpVerification;
use crate::domains::registrations::models::{FormData, NewRegistration, Registration};
use crate::domains::registrations::MAX_STEP;
use crate::kernel::ServerDeps;

/// Body of a step save. Root-level fields other than the structured form
/// document are ignored; promotions alone decide what reaches the root
/// columns.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StepData {
    pub form_data_structured: FormData,
}

/// Result of a step save
#[derive(Debug)]
pub struct SaveStepOutcome {
    pub registration: Registration,
    pub step: i32,
    /// True when this save created the registration (first step).
    pub created: bool,
}

/// Save one step of the form.
///
/// With an explicit id the registration must exist. Without one, only the
/// first step may proceed: a draft is resumed by the submitted personalInfo
/// email when possible, and creation requires a verified OTP row for exactly
/// the submitted (email, contact number) pair.
pub async fn save_step(
    registration_id: Option<RegistrationId>,
    step: Option<i32>,
    step_data: Option<StepData>,
    user_agent: Option<String>,
    deps: &ServerDeps,
) -> Result<SaveStepOutcome, ApiError> {
    // 1. Step number and payload are checked before any lookups
    let step = match step {
        Some(s) if (1..=MAX_STEP).contains(&s) => s,
        _ => return Err(ApiError::Validation("Invalid step number".to_string())),
    };
    let Some(step_data) = step_data else {
        return Err(ApiError::Validation(
            "No data provided for this step".to_string(),
        ));
    };
    let incoming = step_data.form_data_structured;

    // 2. Explicit id: the registration must exist
    if let Some(id) = registration_id {
        let mut tx = deps.db_pool.begin().await?;
        let Some(registration) = Registration::find_by_id_for_update(id, &mut *tx).await? else {
            return Err(ApiError::NotFound("Registration not found".to_string()));
        };
        return merge_and_save(registration, step, incoming, tx).await;
    }

    // 3. No id: only the first step may proceed. Later steps must carry the
    //    id handed back when the registration was created.
    if step != 1 {
        return Err(ApiError::Validation(
            "Cannot create registration starting from step other than 1".to_string(),
        ));
    }

    // 4. Resume a draft by the submitted email when one exists
    let lookup_email =
        non_empty(incoming.personal_info.email.clone()).map(|e| normalize_email(&e));
    if let Some(email) = &lookup_email {
        let mut tx = deps.db_pool.begin().await?;
        if let Some(registration) =
            Registration::find_by_email_for_update(email, &mut *tx).await?
        {
            return merge_and_save(registration, step, incoming, tx).await;
        }
    }

    create_first_step(incoming, user_agent, deps).await
}

/// Merge path: apply the step to the locked row and persist inside the
/// caller's transaction.
async fn merge_and_save(
    mut registration: Registration,
    step: i32,
    incoming: FormData,
    mut tx: Transaction<'_, Postgres>,
) -> Result<SaveStepOutcome, ApiError> {
    apply_step(&mut registration, step, incoming);
    let updated = registration
        .save_form_state(&mut *tx)
        .await
        .map_err(conflict_or_internal)?;
    tx.commit().await?;

    info!("Step {} saved for registration {}", step, updated.id);

    Ok(SaveStepOutcome {
        registration: updated,
        step,
        created: false,
    })
}

/// Create path: first step with no resumable registration.
async fn create_first_step(
    incoming: FormData,
    user_agent: Option<String>,
    deps: &ServerDeps,
) -> Result<SaveStepOutcome, ApiError> {
    // Identity pair is mandatory; it is what the OTP gate keys on
    let (Some(email), Some(contact_number)) = (
        non_empty(incoming.personal_info.email.clone()),
        non_empty(incoming.personal_info.contact_number.clone()),
    ) else {
        return Err(ApiError::Validation(
            "Email and contact number are required for the first step".to_string(),
        ));
    };
    let email = normalize_email(&email);
    let contact_number = normalize_contact_number(&contact_number);

    // The gate: a verified, unexpired OTP row for exactly this pair
    let verified = OtpVerification::find_verified(&email, &contact_number, &deps.db_pool).await?;
    if verified.is_none() {
        return Err(ApiError::Auth(
            "OTP verification required before creating registration".to_string(),
        ));
    }

    let Some(name) = non_empty(incoming.personal_info.name.clone()) else {
        return Err(ApiError::Validation(
            "Name is required for the first step".to_string(),
        ));
    };

    let new = NewRegistration {
        registration_type: incoming.personal_info.registration_type.unwrap_or_default(),
        name,
        email,
        contact_number,
        whatsapp_number: incoming.personal_info.whatsapp_number.clone(),
        country: incoming.personal_info.country.clone(),
        school: incoming.personal_info.school.clone(),
        year_of_passing: incoming.personal_info.year_of_passing.clone(),
        captcha_verified: incoming.verification.captcha_verified.unwrap_or(false),
        quiz_passed: incoming.verification.quiz_passed.unwrap_or(false),
        form_data: incoming,
        user_agent,
    };

    let registration = Registration::create(new, &deps.db_pool)
        .await
        .map_err(conflict_or_internal)?;

    info!("Registration {} created from first step", registration.id);

    Ok(SaveStepOutcome {
        registration,
        step: 1,
        created: true,
    })
}

/// A duplicate key on (email, type) or (contact_number, type) is a client
/// conflict, not a server fault.
fn conflict_or_internal(err: anyhow::Error) -> ApiError {
    if is_unique_violation(&err) {
        ApiError::Conflict(
            "A registration with this email or contact number already exists".to_string(),
        )
    } else {
        ApiError::Internal(err)
    }
}

// =============================================================================
// Step application (pure; runs while the row lock is held)
// =============================================================================

/// Everything a step save changes on the aggregate.
fn apply_step(registration: &mut Registration, step: i32, incoming: FormData) {
    registration.form_data.0.merge(incoming);
    registration.set_step_complete(step);
    // current_step never moves backwards
    registration.current_step = registration.current_step.max(step);

    match step {
        1 => promote_identity(registration),
        3 => promote_attendance(registration),
        8 => promote_financial(registration),
        _ => {}
    }
}

/// Step 1 refreshes the root identity columns from the merged document.
fn promote_identity(registration: &mut Registration) {
    let info = registration.form_data.0.personal_info.clone();
    if let Some(name) = info.name {
        registration.name = name;
    }
    if let Some(email) = info.email {
        registration.email = normalize_email(&email);
    }
    if let Some(contact) = info.contact_number {
        registration.contact_number = normalize_contact_number(&contact);
    }
    if info.whatsapp_number.is_some() {
        registration.whatsapp_number = info.whatsapp_number;
    }
    if info.country.is_some() {
        registration.country = info.country;
    }
    if info.school.is_some() {
        registration.school = info.school;
    }
    if info.year_of_passing.is_some() {
        registration.year_of_passing = info.year_of_passing;
    }

    let verification = &registration.form_data.0.verification;
    if let Some(captcha) = verification.captcha_verified {
        registration.captcha_verified = captcha;
    }
    if let Some(quiz) = verification.quiz_passed {
        registration.quiz_passed = quiz;
    }
    // email_verified is never touched here: it records the OTP gate passed
    // at creation
}

/// Step 3 promotes attendance and the head-count grid.
fn promote_attendance(registration: &mut Registration) {
    let attendance = registration.form_data.0.event_attendance.clone();
    if let Some(attending) = attendance.is_attending {
        registration.is_attending = attending;
    }
    if let Some(attendees) = attendance.attendees {
        registration.attendees = Some(Json(attendees));
    }
}

/// Step 8 promotes the contribution fields and closes the form.
fn promote_financial(registration: &mut Registration) {
    let financial = registration.form_data.0.financial.clone();
    if let Some(will_contribute) = financial.will_contribute {
        registration.will_contribute = will_contribute;
    }
    if financial.contribution_amount.is_some() {
        registration.contribution_amount = financial.contribution_amount;
    }
    registration.form_submission_complete = true;
}
