//! Structured form document stored on each registration.
//!
//! Nine sections, one per form page. Every field is an Option so a section
//! payload can carry just the fields the page touched; merge semantics are
//! "Some overwrites, None leaves the stored value". Each section's merge
//! destructures the incoming value exhaustively, so adding a field without
//! wiring it into the merge fails to compile.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::registration::RegistrationType;

/// Overwrite the slot only when the incoming payload carried a value.
/// JSON null and an absent field both arrive as None and change nothing,
/// so a merge can never clear a stored field.
fn merge_field<T>(slot: &mut Option<T>, incoming: Option<T>) {
    if incoming.is_some() {
        *slot = incoming;
    }
}

// =============================================================================
// Attendee head counts
// =============================================================================

/// Veg/non-veg split for one age bracket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MealCount {
    pub veg: i32,
    pub non_veg: i32,
}

/// Head counts by age bracket. Replaced wholesale on merge: the form always
/// submits the complete grid, never a delta.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Attendees {
    pub adults: MealCount,
    pub teens: MealCount,
    pub children: MealCount,
    pub toddlers: MealCount,
}

impl Attendees {
    /// Total heads across all brackets and meal choices.
    pub fn total(&self) -> i32 {
        [&self.adults, &self.teens, &self.children, &self.toddlers]
            .iter()
            .map(|m| m.veg + m.non_veg)
            .sum()
    }
}

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Verification {
    pub email_verified: Option<bool>,
    pub captcha_verified: Option<bool>,
    pub quiz_passed: Option<bool>,
    pub email: Option<String>,
    pub contact_number: Option<String>,
}

impl Verification {
    fn merge(&mut self, incoming: Verification) {
        let Verification {
            email_verified,
            captcha_verified,
            quiz_passed,
            email,
            contact_number,
        } = incoming;
        merge_field(&mut self.email_verified, email_verified);
        merge_field(&mut self.captcha_verified, captcha_verified);
        merge_field(&mut self.quiz_passed, quiz_passed);
        merge_field(&mut self.email, email);
        merge_field(&mut self.contact_number, contact_number);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonalInfo {
    pub registration_type: Option<RegistrationType>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub contact_number: Option<String>,
    pub whatsapp_number: Option<String>,
    pub school: Option<String>,
    pub year_of_passing: Option<String>,
    pub country: Option<String>,
    #[serde(rename = "stateUT")]
    pub state_ut: Option<String>,
    pub district: Option<String>,
    pub blood_group: Option<String>,
}

impl PersonalInfo {
    fn merge(&mut self, incoming: PersonalInfo) {
        let PersonalInfo {
            registration_type,
            name,
            email,
            contact_number,
            whatsapp_number,
            school,
            year_of_passing,
            country,
            state_ut,
            district,
            blood_group,
        } = incoming;
        merge_field(&mut self.registration_type, registration_type);
        merge_field(&mut self.name, name);
        merge_field(&mut self.email, email);
        merge_field(&mut self.contact_number, contact_number);
        merge_field(&mut self.whatsapp_number, whatsapp_number);
        merge_field(&mut self.school, school);
        merge_field(&mut self.year_of_passing, year_of_passing);
        merge_field(&mut self.country, country);
        merge_field(&mut self.state_ut, state_ut);
        merge_field(&mut self.district, district);
        merge_field(&mut self.blood_group, blood_group);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Professional {
    pub profession: Option<String>,
    pub professional_details: Option<String>,
    pub area_of_expertise: Option<String>,
    pub key_skills: Option<String>,
}

impl Professional {
    fn merge(&mut self, incoming: Professional) {
        let Professional {
            profession,
            professional_details,
            area_of_expertise,
            key_skills,
        } = incoming;
        merge_field(&mut self.profession, profession);
        merge_field(&mut self.professional_details, professional_details);
        merge_field(&mut self.area_of_expertise, area_of_expertise);
        merge_field(&mut self.key_skills, key_skills);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventAttendance {
    pub is_attending: Option<bool>,
    pub attendees: Option<Attendees>,
    pub event_contribution: Option<Vec<String>>,
    pub contribution_details: Option<String>,
    pub event_participation: Option<Vec<String>>,
    pub participation_details: Option<String>,
}

impl EventAttendance {
    fn merge(&mut self, incoming: EventAttendance) {
        let EventAttendance {
            is_attending,
            attendees,
            event_contribution,
            contribution_details,
            event_participation,
            participation_details,
        } = incoming;
        merge_field(&mut self.is_attending, is_attending);
        merge_field(&mut self.attendees, attendees);
        merge_field(&mut self.event_contribution, event_contribution);
        merge_field(&mut self.contribution_details, contribution_details);
        merge_field(&mut self.event_participation, event_participation);
        merge_field(&mut self.participation_details, participation_details);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Sponsorship {
    pub interested_in_sponsorship: Option<bool>,
    pub sponsorship_tier: Option<String>,
    pub sponsorship_details: Option<String>,
}

impl Sponsorship {
    fn merge(&mut self, incoming: Sponsorship) {
        let Sponsorship {
            interested_in_sponsorship,
            sponsorship_tier,
            sponsorship_details,
        } = incoming;
        merge_field(&mut self.interested_in_sponsorship, interested_in_sponsorship);
        merge_field(&mut self.sponsorship_tier, sponsorship_tier);
        merge_field(&mut self.sponsorship_details, sponsorship_details);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Transportation {
    pub start_pincode: Option<String>,
    pub pin_district: Option<String>,
    pub pin_state: Option<String>,
    pub pin_taluk: Option<String>,
    pub sub_post_office: Option<String>,
    pub origin_area: Option<String>,
    pub nearest_landmark: Option<String>,
    pub travel_date: Option<String>,
    pub travel_time: Option<String>,
    pub mode_of_transport: Option<String>,
    pub ready_for_ride_share: Option<String>,
    pub ride_share_capacity: Option<i32>,
    pub need_parking: Option<String>,
    pub want_ride_share: Option<String>,
    pub ride_share_group_size: Option<i32>,
    pub travel_special_requirements: Option<String>,
}

impl Transportation {
    fn merge(&mut self, incoming: Transportation) {
        let Transportation {
            start_pincode,
            pin_district,
            pin_state,
            pin_taluk,
            sub_post_office,
            origin_area,
            nearest_landmark,
            travel_date,
            travel_time,
            mode_of_transport,
            ready_for_ride_share,
            ride_share_capacity,
            need_parking,
            want_ride_share,
            ride_share_group_size,
            travel_special_requirements,
        } = incoming;
        merge_field(&mut self.start_pincode, start_pincode);
        merge_field(&mut self.pin_district, pin_district);
        merge_field(&mut self.pin_state, pin_state);
        merge_field(&mut self.pin_taluk, pin_taluk);
        merge_field(&mut self.sub_post_office, sub_post_office);
        merge_field(&mut self.origin_area, origin_area);
        merge_field(&mut self.nearest_landmark, nearest_landmark);
        merge_field(&mut self.travel_date, travel_date);
        merge_field(&mut self.travel_time, travel_time);
        merge_field(&mut self.mode_of_transport, mode_of_transport);
        merge_field(&mut self.ready_for_ride_share, ready_for_ride_share);
        merge_field(&mut self.ride_share_capacity, ride_share_capacity);
        merge_field(&mut self.need_parking, need_parking);
        merge_field(&mut self.want_ride_share, want_ride_share);
        merge_field(&mut self.ride_share_group_size, ride_share_group_size);
        merge_field(&mut self.travel_special_requirements, travel_special_requirements);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Accommodation {
    pub accommodation: Option<String>,
    pub accommodation_capacity: Option<i32>,
    pub accommodation_location: Option<String>,
    pub accommodation_remarks: Option<String>,
    pub accommodation_pincode: Option<String>,
    pub accommodation_district: Option<String>,
    pub accommodation_state: Option<String>,
    pub accommodation_taluk: Option<String>,
    pub accommodation_landmark: Option<String>,
    pub accommodation_sub_post_office: Option<String>,
    pub accommodation_area: Option<String>,
}

impl Accommodation {
    fn merge(&mut self, incoming: Accommodation) {
        let Accommodation {
            accommodation,
            accommodation_capacity,
            accommodation_location,
            accommodation_remarks,
            accommodation_pincode,
            accommodation_district,
            accommodation_state,
            accommodation_taluk,
            accommodation_landmark,
            accommodation_sub_post_office,
            accommodation_area,
        } = incoming;
        merge_field(&mut self.accommodation, accommodation);
        merge_field(&mut self.accommodation_capacity, accommodation_capacity);
        merge_field(&mut self.accommodation_location, accommodation_location);
        merge_field(&mut self.accommodation_remarks, accommodation_remarks);
        merge_field(&mut self.accommodation_pincode, accommodation_pincode);
        merge_field(&mut self.accommodation_district, accommodation_district);
        merge_field(&mut self.accommodation_state, accommodation_state);
        merge_field(&mut self.accommodation_taluk, accommodation_taluk);
        merge_field(&mut self.accommodation_landmark, accommodation_landmark);
        merge_field(
            &mut self.accommodation_sub_post_office,
            accommodation_sub_post_office,
        );
        merge_field(&mut self.accommodation_area, accommodation_area);
    }
}

/// Optional programs: mentorship, training, seminars, merchandise.
/// The t-shirt size map is replaced wholesale, like attendees.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OptionalInfo {
    pub spouse_alumni: Option<String>,
    pub family_groups: Option<String>,
    pub mentorship_options: Option<Vec<String>>,
    pub training_options: Option<Vec<String>>,
    pub seminar_options: Option<Vec<String>>,
    pub tshirt_interest: Option<String>,
    pub tshirt_sizes: Option<HashMap<String, i32>>,
}

impl OptionalInfo {
    fn merge(&mut self, incoming: OptionalInfo) {
        let OptionalInfo {
            spouse_alumni,
            family_groups,
            mentorship_options,
            training_options,
            seminar_options,
            tshirt_interest,
            tshirt_sizes,
        } = incoming;
        merge_field(&mut self.spouse_alumni, spouse_alumni);
        merge_field(&mut self.family_groups, family_groups);
        merge_field(&mut self.mentorship_options, mentorship_options);
        merge_field(&mut self.training_options, training_options);
        merge_field(&mut self.seminar_options, seminar_options);
        merge_field(&mut self.tshirt_interest, tshirt_interest);
        merge_field(&mut self.tshirt_sizes, tshirt_sizes);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Financial {
    pub will_contribute: Option<bool>,
    pub contribution_amount: Option<Decimal>,
    pub proposed_amount: Option<Decimal>,
    pub payment_status: Option<String>,
    pub payment_id: Option<String>,
    pub payment_details: Option<String>,
    pub payment_remarks: Option<String>,
}

impl Financial {
    fn merge(&mut self, incoming: Financial) {
        let Financial {
            will_contribute,
            contribution_amount,
            proposed_amount,
            payment_status,
            payment_id,
            payment_details,
            payment_remarks,
        } = incoming;
        merge_field(&mut self.will_contribute, will_contribute);
        merge_field(&mut self.contribution_amount, contribution_amount);
        merge_field(&mut self.proposed_amount, proposed_amount);
        merge_field(&mut self.payment_status, payment_status);
        merge_field(&mut self.payment_id, payment_id);
        merge_field(&mut self.payment_details, payment_details);
        merge_field(&mut self.payment_remarks, payment_remarks);
    }
}

// =============================================================================
// The document
// =============================================================================

/// The full nine-section form document. A payload may carry any subset of
/// sections; absent sections deserialize to their empty form and merge as
/// no-ops.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormData {
    pub verification: Verification,
    pub personal_info: PersonalInfo,
    pub professional: Professional,
    pub event_attendance: EventAttendance,
    pub sponsorship: Sponsorship,
    pub transportation: Transportation,
    pub accommodation: Accommodation,
    pub optional: OptionalInfo,
    pub financial: Financial,
}

impl FormData {
    /// Merge an incoming payload section by section.
    pub fn merge(&mut self, incoming: FormData) {
        let FormData {
            verification,
            personal_info,
            professional,
            event_attendance,
            sponsorship,
            transportation,
            accommodation,
            optional,
            financial,
        } = incoming;
        self.verification.merge(verification);
        self.personal_info.merge(personal_info);
        self.professional.merge(professional);
        self.event_attendance.merge(event_attendance);
        self.sponsorship.merge(sponsorship);
        self.transportation.merge(transportation);
        self.accommodation.merge(accommodation);
        self.optional.merge(optional);
        self.financial.merge(financial);
    }
}
