//! Chat intent router: ordered substring rules over the lower-cased message, first match wins.
//!
//! The deadline rule is the only one that reads live data; every other rule returns a fixed
//! answer with its quick replies. Messages that match nothing get the main menu.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::calendar::DeadlineCalendar;
use crate::models::{CalendarEvent, ChatOption};
use crate::store::PortalStore;

/// A rule fires when any of its triggers matches.
pub enum Trigger {
    /// At least one substring is present.
    Any(&'static [&'static str]),
    /// Every substring is present.
    All(&'static [&'static str]),
}

impl Trigger {
    fn matches(&self, query: &str) -> bool {
        match self {
            Trigger::Any(words) => words.iter().any(|w| query.contains(w)),
            Trigger::All(words) => words.iter().all(|w| query.contains(w)),
        }
    }
}

pub struct QuickReply {
    pub id: &'static str,
    pub text: &'static str,
    pub query: &'static str,
}

impl QuickReply {
    const fn new(id: &'static str, text: &'static str, query: &'static str) -> Self {
        Self { id, text, query }
    }

    fn to_option(&self) -> ChatOption {
        ChatOption::new(self.id, self.text, self.query)
    }
}

pub enum Reply {
    Fixed {
        text: &'static str,
        options: &'static [QuickReply],
    },
    /// Live list of the next calendar deadlines.
    Deadlines,
}

pub struct IntentRule {
    pub name: &'static str,
    pub triggers: &'static [Trigger],
    pub reply: Reply,
}

impl IntentRule {
    pub fn matches(&self, query: &str) -> bool {
        self.triggers.iter().any(|t| t.matches(query))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatReply {
    pub message: String,
    pub options: Vec<ChatOption>,
}

pub const DEFAULT_REPLY: &str =
    "Thank you for your query about pharmacovigilance. How else can I assist you with ADR reporting?";

const NO_DEADLINES: &str =
    "You don't have any upcoming deadlines. Would you like to add some to your calendar?";

pub static DEFAULT_OPTIONS: &[QuickReply] = &[
    QuickReply::new("start_over", "Main menu", "show main menu"),
    QuickReply::new("adr_def", "What is an ADR?", "what is adr"),
    QuickReply::new("deadlines", "Upcoming deadlines", "upcoming deadlines"),
    QuickReply::new("pv_system", "Pharmacovigilance system", "pharmacovigilance system"),
    QuickReply::new("help", "Contact support", "contact support"),
];

static DEADLINE_OPTIONS: &[QuickReply] = &[
    QuickReply::new("report_details", "Reporting requirements", "reporting requirements"),
    QuickReply::new("add_calendar", "Add to my calendar", "how to add to calendar"),
];

pub static INTENT_RULES: &[IntentRule] = &[
    IntentRule {
        name: "deadlines",
        triggers: &[Trigger::Any(&["upcoming deadline", "next deadline", "calendar"])],
        reply: Reply::Deadlines,
    },
    IntentRule {
        name: "adr_definition",
        triggers: &[
            Trigger::Any(&["what is adr", "define adr"]),
            Trigger::All(&["adr", "mean"]),
        ],
        reply: Reply::Fixed {
            text: "ADR stands for Adverse Drug Reaction. It's an unwanted or harmful effect that occurs after a medication is administered at normal doses during clinical use. These reactions may be:\n\n\
• Type A (Augmented): Dose-dependent, predictable reactions\n\
• Type B (Bizarre): Dose-independent, unpredictable reactions\n\
• Type C (Chronic): Long-term use reactions\n\
• Type D (Delayed): Delayed onset reactions",
            options: &[
                QuickReply::new("report_adr", "How to report an ADR", "how to report adr"),
                QuickReply::new("examples", "Examples of ADRs", "adr examples"),
            ],
        },
    },
    IntentRule {
        name: "reporting_process",
        triggers: &[Trigger::Any(&["adr reporting", "how to report", "submission process"])],
        reply: Reply::Fixed {
            text: "To report an Adverse Drug Reaction (ADR), follow these steps:\n\n\
1. Complete all mandatory fields in the ADR form (marked with *)\n\
2. Include detailed description of the reaction\n\
3. List all medications taken by the patient\n\
4. Provide your contact information as the reporter\n\
5. Submit the form through the system\n\n\
All reports are reviewed by our pharmacovigilance team and may require follow-up.",
            options: &[
                QuickReply::new("mandatory", "Mandatory fields", "mandatory fields"),
                QuickReply::new("timeline", "Reporting timeline", "reporting timeline"),
                QuickReply::new("psur", "PSUR requirements", "psur requirements"),
            ],
        },
    },
    IntentRule {
        name: "mandatory_fields",
        triggers: &[Trigger::Any(&["mandatory field", "required field", "must fill"])],
        reply: Reply::Fixed {
            text: "The mandatory fields in the ADR form (marked with *) are:\n\n\
• Patient information: Initials, age, gender\n\
• Reaction details: Description, onset date, outcome\n\
• Medication details: Name, dose, route, therapy dates\n\
• Reporter information: Name, profession, contact details\n\n\
Incomplete reports may be returned for additional information.",
            options: &[
                QuickReply::new("patient_confidentiality", "Patient confidentiality", "patient confidentiality"),
                QuickReply::new("form_sections", "Form sections explained", "explain form sections"),
            ],
        },
    },
    IntentRule {
        name: "confidentiality",
        triggers: &[Trigger::Any(&["confidential", "privacy", "patient data"])],
        reply: Reply::Fixed {
            text: "Patient confidentiality is maintained throughout the ADR reporting process:\n\n\
• Use patient initials instead of full names\n\
• Include only relevant medical history\n\
• All data is protected according to data protection regulations\n\
• Access to reports is restricted to authorized personnel only",
            options: &[QuickReply::new("data_usage", "How data is used", "how is adr data used")],
        },
    },
    IntentRule {
        name: "adr_examples",
        triggers: &[Trigger::Any(&["adr example", "example of adverse"])],
        reply: Reply::Fixed {
            text: "Common examples of Adverse Drug Reactions (ADRs) include:\n\n\
• Rash, itching or hives (cutaneous reactions)\n\
• Nausea, vomiting, diarrhea (gastrointestinal)\n\
• Headache, dizziness (neurological)\n\
• Shortness of breath, cough (respiratory)\n\
• Liver or kidney function abnormalities\n\
• Unexpected therapeutic failure",
            options: &[QuickReply::new("serious_adrs", "What are serious ADRs?", "serious adr definition")],
        },
    },
    IntentRule {
        name: "reporting_timeline",
        triggers: &[Trigger::Any(&["timeline", "when to report", "how soon"])],
        reply: Reply::Fixed {
            text: "ADR reporting timelines:\n\n\
• Serious ADRs: Report within 24 hours of awareness\n\
• Non-Serious ADRs: Report within 90 calendar days\n\
• Quarterly summary submissions: Due 15 days after quarter end\n\
• PSUR submissions: Due every 6 months or annually",
            options: &[
                QuickReply::new("serious_def", "What is a serious ADR?", "serious adr definition"),
                QuickReply::new("psur_timeline", "PSUR submission schedule", "psur submission schedule"),
            ],
        },
    },
    IntentRule {
        name: "serious_adr",
        triggers: &[Trigger::Any(&["serious adr", "severe reaction"])],
        reply: Reply::Fixed {
            text: "A serious Adverse Drug Reaction is one that:\n\n\
• Results in death\n\
• Is life-threatening\n\
• Requires hospitalization or prolongs existing hospitalization\n\
• Results in persistent or significant disability/incapacity\n\
• Is a congenital anomaly/birth defect\n\
• Requires intervention to prevent permanent impairment",
            options: &[QuickReply::new("report_serious", "How to report serious ADRs", "reporting serious adrs")],
        },
    },
    IntentRule {
        name: "form_sections",
        triggers: &[Trigger::Any(&["form section", "section explain"])],
        reply: Reply::Fixed {
            text: "The ADR reporting form has these main sections:\n\n\
1. Patient Information: Demographics and medical history\n\
2. Adverse Reaction Details: Description, dates, severity\n\
3. Suspected Medications: All drugs, including OTC and herbals\n\
4. Concomitant Medications: Other medications taken\n\
5. Relevant Tests/Laboratory Data: Test results\n\
6. Reporter Information: Your contact details",
            options: &[QuickReply::new(
                "multiple_meds",
                "Reporting multiple medications",
                "how to report multiple medications",
            )],
        },
    },
    IntentRule {
        name: "multiple_medications",
        triggers: &[Trigger::Any(&["multiple medication", "more than one drug"])],
        reply: Reply::Fixed {
            text: "To report multiple suspected medications:\n\n\
1. Click 'Add Another Medication' in the form\n\
2. Enter details for each medication separately\n\
3. Indicate the likelihood of causality for each\n\
4. List start and end dates for each medication\n\
5. You can remove medications using the 'Remove' button",
            options: &[QuickReply::new("causality", "Assessing causality", "how to assess causality")],
        },
    },
    IntentRule {
        name: "psur_schedule",
        triggers: &[Trigger::Any(&["psur submission schedule", "psur timeline"])],
        reply: Reply::Fixed {
            text: "PSUR submission schedule according to the Pharmacovigilance Guidance Document:\n\n\
• Every 6 months for first 2 years after marketing approval\n\
• Annually for the subsequent 2 years\n\
• Thereafter once in 3 years or as per conditions of approval\n\
• PSUR should be submitted within 30 calendar days of the data lock point\n\
• Special reports may be requested by regulatory authorities",
            options: &[
                QuickReply::new("psur_content", "PSUR content requirements", "psur content"),
                QuickReply::new("psur_submission", "How to submit PSURs", "psur submission"),
            ],
        },
    },
    IntentRule {
        name: "psur_content",
        triggers: &[Trigger::Any(&["psur content", "what should psur contain"])],
        reply: Reply::Fixed {
            text: "A Periodic Safety Update Report (PSUR) should contain:\n\n\
1. Executive Summary\n\
2. Worldwide Marketing Authorization Status\n\
3. Safety Actions Taken in the Reporting Interval\n\
4. Changes to Reference Safety Information\n\
5. Exposure Estimation\n\
6. Summary Tabulations of Adverse Events\n\
7. Summaries of Safety Signals\n\
8. Signal and Risk Evaluation\n\
9. Benefit Evaluation and Integrated Benefit-Risk Analysis",
            options: &[
                QuickReply::new("psur_timeline", "PSUR submission schedule", "psur submission schedule"),
                QuickReply::new("reporting_req", "Other reporting requirements", "reporting requirements"),
            ],
        },
    },
    IntentRule {
        name: "psur_submission",
        triggers: &[Trigger::Any(&["psur submission", "how to submit psur"])],
        reply: Reply::Fixed {
            text: "How to submit PSURs:\n\n\
• Submit to the CDSCO within 30 calendar days of the data lock point\n\
• Use the specified electronic format\n\
• Include all required sections as per guidance document\n\
• Ensure proper documentation of all adverse events\n\
• Include detailed evaluation of benefit-risk assessment\n\
• Submit to National Coordination Centre-Pharmacovigilance Programme of India (NCC-PvPI)",
            options: &[
                QuickReply::new("psur_content", "PSUR content requirements", "psur content"),
                QuickReply::new("reporting_req", "General reporting requirements", "reporting requirements"),
            ],
        },
    },
    IntentRule {
        name: "psur_overview",
        triggers: &[Trigger::Any(&["psur", "periodic safety", "safety update"])],
        reply: Reply::Fixed {
            text: "Periodic Safety Update Report (PSUR) is a pharmacovigilance document intended to provide a safety update resulting in the evaluation of the risk-benefit balance of a medicinal product.\n\n\
PSUR requirements include:\n\n\
• Evaluation of relevant safety, efficacy and effectiveness information\n\
• Summary of safety data with critical analysis\n\
• Examination of whether the safety profile has changed\n\
• Risk-benefit evaluation",
            options: &[
                QuickReply::new("psur_timeline", "PSUR submission schedule", "psur submission schedule"),
                QuickReply::new("psur_content", "PSUR content requirements", "psur content"),
            ],
        },
    },
    IntentRule {
        name: "pv_system",
        triggers: &[Trigger::Any(&["pharmacovigilance system", "pv system"])],
        reply: Reply::Fixed {
            text: "Marketing Authorization Holders (MAHs) must establish a pharmacovigilance system that includes:\n\n\
• A Pharmacovigilance System Master File (PSMF)\n\
• A qualified Pharmacovigilance Officer In-Charge (PVOIC)\n\
• Procedures for collecting and processing adverse event reports\n\
• A quality management system for pharmacovigilance activities\n\
• Risk management planning\n\
• Regular audits and inspections of the pharmacovigilance system",
            options: &[
                QuickReply::new("psmf", "What is a PSMF?", "what is psmf"),
                QuickReply::new("reporting_req", "Reporting requirements", "reporting requirements"),
            ],
        },
    },
    IntentRule {
        name: "psmf",
        triggers: &[Trigger::Any(&["psmf", "system master file"])],
        reply: Reply::Fixed {
            text: "A Pharmacovigilance System Master File (PSMF) is a detailed description of the pharmacovigilance system used by an MAH for their marketed products.\n\n\
It should include:\n\n\
• Information about the PVOIC (Pharmacovigilance Officer In-Charge)\n\
• Description of computerized systems and databases\n\
• Process descriptions (collection, evaluation & reporting of safety data)\n\
• Quality system for pharmacovigilance activities\n\
• Documentation of qualification and training of personnel",
            options: &[
                QuickReply::new("pv_system", "Pharmacovigilance system", "pharmacovigilance system"),
                QuickReply::new("reporting_req", "Reporting requirements", "reporting requirements"),
            ],
        },
    },
];

/// First rule matching `message` (lower-cased here), if any.
pub fn classify(message: &str) -> Option<&'static IntentRule> {
    let query = message.to_lowercase();
    INTENT_RULES.iter().find(|rule| rule.matches(&query))
}

/// Bullet list of deadlines as quoted in chat.
pub fn format_deadlines(events: &[CalendarEvent]) -> String {
    if events.is_empty() {
        return NO_DEADLINES.to_string();
    }
    let mut text = String::from("Here are your upcoming deadlines:\n\n");
    for e in events {
        text.push_str(&format!(
            "• {}: {}\n",
            e.event.event_date.format("%-d %b %Y"),
            e.event.title
        ));
        if let Some(desc) = e.event.description.as_deref().filter(|d| !d.is_empty()) {
            text.push_str(&format!("  {}\n", desc));
        }
    }
    text.push_str("\nWould you like to see more details about reporting requirements?");
    text
}

fn options(replies: &[QuickReply]) -> Vec<ChatOption> {
    replies.iter().map(QuickReply::to_option).collect()
}

pub struct ChatRouter {
    calendar: Arc<DeadlineCalendar>,
    store: Arc<PortalStore>,
    deadline_preview: usize,
}

impl ChatRouter {
    pub fn new(calendar: Arc<DeadlineCalendar>, store: Arc<PortalStore>, deadline_preview: usize) -> Self {
        Self {
            calendar,
            store,
            deadline_preview,
        }
    }

    fn render(&self, rule: &IntentRule, now: DateTime<Utc>) -> ChatReply {
        match &rule.reply {
            Reply::Fixed { text, options: replies } => ChatReply {
                message: text.to_string(),
                options: options(replies),
            },
            Reply::Deadlines => ChatReply {
                message: format_deadlines(&self.calendar.upcoming(now, self.deadline_preview)),
                options: options(DEADLINE_OPTIONS),
            },
        }
    }

    /// Reply from a matching rule only; `None` when the message would get the main menu.
    pub fn answer_if_matched(&self, message: &str, now: DateTime<Utc>) -> Option<ChatReply> {
        classify(message).map(|rule| self.render(rule, now))
    }

    /// Reply for `message` without touching the chat log.
    pub fn answer(&self, message: &str, now: DateTime<Utc>) -> ChatReply {
        self.answer_if_matched(message, now).unwrap_or_else(|| ChatReply {
            message: DEFAULT_REPLY.to_string(),
            options: options(DEFAULT_OPTIONS),
        })
    }

    /// Answer and append the exchange to the chat log.
    pub fn route(&self, message: &str) -> ChatReply {
        let reply = self.answer(message, Utc::now());
        let logged = self.store.create_chat_message(message, &reply.message);
        tracing::debug!(
            id = logged.id,
            intent = classify(message).map_or("default", |r| r.name),
            "[chat] message routed"
        );
        reply
    }
}
