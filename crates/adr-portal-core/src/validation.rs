//! Input validation: turns loose `*Input` payloads into typed `New*` records, or a
//! `ValidationErrors` naming every offending field.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ValidationErrors;
use crate::models::{
    AdrReportInput, AiChatRequest, CalendarEventInput, ChatRequest, ConversationTurn, EventType,
    NewAdrReport, NewCalendarEvent, Outcome, Seriousness, SuspectedMedication,
};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex"));

pub trait Validate {
    type Output;

    fn validate(self) -> Result<Self::Output, ValidationErrors>;
}

/// Trimmed, with empty strings collapsed to `None`.
fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn required(errors: &mut ValidationErrors, field: &str, label: &str, value: &str) -> String {
    let v = value.trim();
    if v.is_empty() {
        errors.push(field, format!("{} is required", label));
    }
    v.to_string()
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

/// RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS` (read as UTC), or a bare date (midnight UTC).
pub fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    let v = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(v) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(v, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    parse_date(v)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn required_date(
    errors: &mut ValidationErrors,
    field: &str,
    label: &str,
    value: &str,
) -> Option<NaiveDate> {
    if value.trim().is_empty() {
        errors.push(field, format!("{} is required", label));
        return None;
    }
    let parsed = parse_date(value);
    if parsed.is_none() {
        errors.push(field, format!("{} must be a date in YYYY-MM-DD format", label));
    }
    parsed
}

fn optional_date(errors: &mut ValidationErrors, field: &str, value: &Option<String>) -> Option<NaiveDate> {
    let v = value.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
    let parsed = parse_date(v);
    if parsed.is_none() {
        errors.push(field, "must be a date in YYYY-MM-DD format");
    }
    parsed
}

/// Trims one medication row in place, collapsing blank optionals, and checks its dates.
fn validate_medication(errors: &mut ValidationErrors, index: usize, med: &mut SuspectedMedication) {
    let field = |name: &str| format!("suspectedMedications[{}].{}", index, name);

    med.name = med.name.trim().to_string();
    if med.name.is_empty() {
        errors.push(&field("name"), "Medication name is required");
    }
    for value in [
        &mut med.manufacturer,
        &mut med.batch_number,
        &mut med.expiry_date,
        &mut med.dose_used,
        &mut med.route_used,
        &mut med.frequency,
        &mut med.therapy_start_date,
        &mut med.therapy_end_date,
        &mut med.indication,
        &mut med.action_taken,
        &mut med.reintroduction_result,
    ] {
        *value = optional(value.take());
    }

    optional_date(errors, &field("expiryDate"), &med.expiry_date);
    let start = optional_date(errors, &field("therapyStartDate"), &med.therapy_start_date);
    let end = optional_date(errors, &field("therapyEndDate"), &med.therapy_end_date);
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            errors.push(&field("therapyEndDate"), "Therapy end date is before the start date");
        }
    }
}

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value.trim())
}

impl Validate for AdrReportInput {
    type Output = NewAdrReport;

    fn validate(self) -> Result<NewAdrReport, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let patient_initials =
            required(&mut errors, "patientInitials", "Patient initials", &self.patient_initials);
        let age_at_event = required(
            &mut errors,
            "ageAtEvent",
            "Age at event",
            self.age_at_event.as_deref().unwrap_or_default(),
        );

        let reaction_start_date = required_date(
            &mut errors,
            "reactionStartDate",
            "Event/Reaction start date",
            &self.reaction_start_date,
        );
        let reaction_stop_date = optional_date(&mut errors, "reactionStopDate", &self.reaction_stop_date);
        if let (Some(start), Some(stop)) = (reaction_start_date, reaction_stop_date) {
            if stop < start {
                errors.push("reactionStopDate", "Reaction stop date is before the start date");
            }
        }
        let reaction_description = required(
            &mut errors,
            "reactionDescription",
            "Event/Reaction description",
            &self.reaction_description,
        );

        let mut seriousness: Vec<Seriousness> = Vec::new();
        for raw in &self.seriousness {
            match Seriousness::parse(raw) {
                Some(s) if !seriousness.contains(&s) => seriousness.push(s),
                Some(_) => {}
                None => errors.push("seriousness", format!("unknown seriousness criterion '{}'", raw)),
            }
        }
        let outcome = match optional(self.outcome) {
            None => None,
            Some(raw) => {
                let parsed = Outcome::parse(&raw);
                if parsed.is_none() {
                    errors.push("outcome", format!("unknown outcome '{}'", raw));
                }
                parsed
            }
        };

        let mut suspected_medications = self.suspected_medications;
        for (i, med) in suspected_medications.iter_mut().enumerate() {
            validate_medication(&mut errors, i, med);
        }
        // The legacy single-drug field mirrors the first medication row when omitted.
        let suspected_medication_name = optional(self.suspected_medication_name)
            .or_else(|| {
                suspected_medications
                    .first()
                    .map(|m| m.name.clone())
                    .filter(|n| !n.is_empty())
            })
            .unwrap_or_default();
        if suspected_medication_name.is_empty() && !errors.has_field("suspectedMedications[0].name") {
            errors.push(
                "suspectedMedicationName",
                "At least one suspected medication name is required",
            );
        }

        let reporter_name = required(&mut errors, "reporterName", "Reporter name", &self.reporter_name);
        let reporter_email = self.reporter_email.trim().to_string();
        if reporter_email.is_empty() {
            errors.push("reporterEmail", "Reporter email is required");
        } else if !is_valid_email(&reporter_email) {
            errors.push("reporterEmail", "Please enter a valid email address");
        }
        let reporter_occupation = required(
            &mut errors,
            "reporterOccupation",
            "Reporter occupation",
            &self.reporter_occupation,
        );
        let report_date = required_date(&mut errors, "reportDate", "Report date", &self.report_date);

        let (Some(reaction_start_date), Some(report_date)) = (reaction_start_date, report_date) else {
            return Err(errors);
        };

        errors.into_result(NewAdrReport {
            patient_initials,
            age_at_event,
            gender: optional(self.gender),
            weight: optional(self.weight),
            registration_number: optional(self.registration_number),
            reaction_start_date,
            reaction_stop_date,
            reaction_description,
            relevant_tests: optional(self.relevant_tests),
            medical_history: optional(self.medical_history),
            seriousness,
            outcome,
            suspected_medications,
            suspected_medication_name,
            reintroduction_dose: optional(self.reintroduction_dose),
            concomitant_medications: optional(self.concomitant_medications),
            additional_information: optional(self.additional_information),
            reporter_name,
            reporter_address: optional(self.reporter_address),
            reporter_address_line2: optional(self.reporter_address_line2),
            pin_code: optional(self.pin_code),
            reporter_email,
            reporter_phone: optional(self.reporter_phone),
            reporter_occupation,
            report_date,
        })
    }
}

impl Validate for CalendarEventInput {
    type Output = NewCalendarEvent;

    fn validate(self) -> Result<NewCalendarEvent, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let title = required(&mut errors, "title", "Title", &self.title);

        let event_date = if self.event_date.trim().is_empty() {
            errors.push("eventDate", "Event date is required");
            None
        } else {
            let parsed = parse_instant(&self.event_date);
            if parsed.is_none() {
                errors.push("eventDate", "Event date must be an RFC 3339 timestamp or YYYY-MM-DD");
            }
            parsed
        };

        let event_type = if self.event_type.trim().is_empty() {
            errors.push("eventType", "Event type is required");
            None
        } else {
            let parsed = EventType::parse(&self.event_type);
            if parsed.is_none() {
                errors.push(
                    "eventType",
                    "Event type must be one of primary, secondary, accent, muted",
                );
            }
            parsed
        };

        let (Some(event_date), Some(event_type)) = (event_date, event_type) else {
            return Err(errors);
        };

        errors.into_result(NewCalendarEvent {
            title,
            event_date,
            event_type,
            description: optional(self.description),
        })
    }
}

impl Validate for ChatRequest {
    type Output = String;

    fn validate(self) -> Result<String, ValidationErrors> {
        if self.message.is_empty() {
            return Err(ValidationErrors::single("message", "Invalid message format"));
        }
        Ok(self.message)
    }
}

impl Validate for AiChatRequest {
    type Output = (String, Vec<ConversationTurn>);

    fn validate(self) -> Result<Self::Output, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let message = match self.message {
            Some(serde_json::Value::String(m)) if !m.trim().is_empty() => m,
            _ => {
                errors.push("message", "Message is required");
                String::new()
            }
        };

        let history = match self.conversation_history {
            None | Some(serde_json::Value::Null) => Vec::new(),
            Some(raw) => serde_json::from_value::<Vec<ConversationTurn>>(raw).unwrap_or_else(|e| {
                errors.push(
                    "conversationHistory",
                    format!("Conversation history must be a list of role/content turns: {}", e),
                );
                Vec::new()
            }),
        };

        errors.into_result((message, history))
    }
}
