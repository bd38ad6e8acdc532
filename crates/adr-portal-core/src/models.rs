//! Portal records: ADR reports, calendar events, chat log entries and users.
//!
//! `*Input` types are what the HTTP layer deserializes; they are deliberately loose
//! (missing fields default to empty) so validation can report every offending field at
//! once. `New*` types are validated and ready for the store; the stored records flatten
//! them next to the store-assigned `id` and `createdAt`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Seriousness criteria attachable to a reaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Seriousness {
    Death,
    LifeThreatening,
    Hospitalization,
    Disability,
    CongenitalAnomaly,
    OtherImportant,
}

impl Seriousness {
    pub const ALL: [Seriousness; 6] = [
        Seriousness::Death,
        Seriousness::LifeThreatening,
        Seriousness::Hospitalization,
        Seriousness::Disability,
        Seriousness::CongenitalAnomaly,
        Seriousness::OtherImportant,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Seriousness::Death => "death",
            Seriousness::LifeThreatening => "life-threatening",
            Seriousness::Hospitalization => "hospitalization",
            Seriousness::Disability => "disability",
            Seriousness::CongenitalAnomaly => "congenital-anomaly",
            Seriousness::OtherImportant => "other-important",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let v = value.trim();
        Self::ALL.iter().copied().find(|s| s.as_str().eq_ignore_ascii_case(v))
    }
}

/// Reaction outcome as offered by the reporting form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Outcome {
    Recovered,
    Recovering,
    NotRecovered,
    Fatal,
    Sequelae,
    Unknown,
}

impl Outcome {
    pub const ALL: [Outcome; 6] = [
        Outcome::Recovered,
        Outcome::Recovering,
        Outcome::NotRecovered,
        Outcome::Fatal,
        Outcome::Sequelae,
        Outcome::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Recovered => "recovered",
            Outcome::Recovering => "recovering",
            Outcome::NotRecovered => "not-recovered",
            Outcome::Fatal => "fatal",
            Outcome::Sequelae => "sequelae",
            Outcome::Unknown => "unknown",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let v = value.trim();
        Self::ALL.iter().copied().find(|o| o.as_str().eq_ignore_ascii_case(v))
    }
}

/// One suspected medication row of the report form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuspectedMedication {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dose_used: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_used: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub therapy_start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub therapy_end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indication: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_taken: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reintroduction_result: Option<String>,
}

impl SuspectedMedication {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }
}

/// Raw ADR submission as posted by the form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdrReportInput {
    #[serde(default)]
    pub patient_initials: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub age_at_event: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub weight: Option<String>,
    #[serde(default)]
    pub registration_number: Option<String>,

    #[serde(default)]
    pub reaction_start_date: String,
    #[serde(default)]
    pub reaction_stop_date: Option<String>,
    #[serde(default)]
    pub reaction_description: String,
    #[serde(default)]
    pub relevant_tests: Option<String>,
    #[serde(default)]
    pub medical_history: Option<String>,
    #[serde(default)]
    pub seriousness: Vec<String>,
    #[serde(default)]
    pub outcome: Option<String>,

    #[serde(default)]
    pub suspected_medications: Vec<SuspectedMedication>,
    #[serde(default)]
    pub suspected_medication_name: Option<String>,
    #[serde(default)]
    pub reintroduction_dose: Option<String>,
    #[serde(default)]
    pub concomitant_medications: Option<String>,
    #[serde(default)]
    pub additional_information: Option<String>,

    #[serde(default)]
    pub reporter_name: String,
    #[serde(default)]
    pub reporter_address: Option<String>,
    #[serde(default)]
    pub reporter_address_line2: Option<String>,
    #[serde(default)]
    pub pin_code: Option<String>,
    #[serde(default)]
    pub reporter_email: String,
    #[serde(default)]
    pub reporter_phone: Option<String>,
    #[serde(default)]
    pub reporter_occupation: String,
    #[serde(default)]
    pub report_date: String,
}

/// Validated ADR report, ready to be stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAdrReport {
    pub patient_initials: String,
    pub age_at_event: String,
    pub gender: Option<String>,
    pub weight: Option<String>,
    pub registration_number: Option<String>,

    pub reaction_start_date: NaiveDate,
    pub reaction_stop_date: Option<NaiveDate>,
    pub reaction_description: String,
    pub relevant_tests: Option<String>,
    pub medical_history: Option<String>,
    pub seriousness: Vec<Seriousness>,
    pub outcome: Option<Outcome>,

    pub suspected_medications: Vec<SuspectedMedication>,
    pub suspected_medication_name: String,
    pub reintroduction_dose: Option<String>,
    pub concomitant_medications: Option<String>,
    pub additional_information: Option<String>,

    pub reporter_name: String,
    pub reporter_address: Option<String>,
    pub reporter_address_line2: Option<String>,
    pub pin_code: Option<String>,
    pub reporter_email: String,
    pub reporter_phone: Option<String>,
    pub reporter_occupation: String,
    pub report_date: NaiveDate,
}

impl NewAdrReport {
    pub fn is_serious(&self) -> bool {
        !self.seriousness.is_empty()
    }

    /// Distinct suspected drug names, first spelling wins. Falls back to the legacy
    /// single-drug field when the list is empty.
    pub fn drug_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for med in &self.suspected_medications {
            let name = med.name.trim();
            if !name.is_empty() && !names.iter().any(|n| n.eq_ignore_ascii_case(name)) {
                names.push(name);
            }
        }
        if names.is_empty() {
            names.push(self.suspected_medication_name.trim());
        }
        names
    }
}

/// Stored ADR report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdrReport {
    pub id: u64,
    #[serde(flatten)]
    pub report: NewAdrReport,
    pub created_at: DateTime<Utc>,
}

/// Priority label shown as a colour dot on the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Primary,
    Secondary,
    Accent,
    Muted,
}

impl EventType {
    pub const ALL: [EventType; 4] = [
        EventType::Primary,
        EventType::Secondary,
        EventType::Accent,
        EventType::Muted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Primary => "primary",
            EventType::Secondary => "secondary",
            EventType::Accent => "accent",
            EventType::Muted => "muted",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let v = value.trim();
        Self::ALL.iter().copied().find(|t| t.as_str().eq_ignore_ascii_case(v))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEventInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub event_date: String,
    #[serde(default)]
    pub event_type: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCalendarEvent {
    pub title: String,
    pub event_date: DateTime<Utc>,
    pub event_type: EventType,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: u64,
    #[serde(flatten)]
    pub event: NewCalendarEvent,
    pub created_at: DateTime<Utc>,
}

/// Append-only chat log entry: what was asked and exactly what was answered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: u64,
    pub message: String,
    pub response: String,
    pub created_at: DateTime<Utc>,
}

/// Quick-reply suggestion attached to a chat answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatOption {
    pub id: String,
    pub text: String,
    pub query: String,
}

impl ChatOption {
    pub fn new(id: &str, text: &str, query: &str) -> Self {
        Self {
            id: id.to_string(),
            text: text.to_string(),
            query: query.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// Raw AI chat request. Both fields stay untyped so a wrong message type and a malformed
/// history can be reported separately; a missing or null history means no history.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiChatRequest {
    #[serde(default)]
    pub message: Option<serde_json::Value>,
    #[serde(default)]
    pub conversation_history: Option<serde_json::Value>,
}

/// Account record. Kept in the store for parity with the schema; no portal flow reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub password: String,
}

/// Accepts `"42"`, `42` or `42.5` for free-text numeric fields.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(D::Error::custom(format!(
            "expected a string or number, found {}",
            other
        ))),
    }
}
